use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;
use url::Url;

use crate::errors::DeobfuscateError;

pub const DEFAULT_MODEL: &str = "Qwen/Qwen2.5-Coder-32B-Instruct";
pub const DEFAULT_API_BASE: &str = "https://api.siliconflow.cn/v1";

/// Sampling parameters used for a single run.
///
/// Always fully populated: merging falls through to [`ModelParams::default`].
#[derive(Debug, Clone, PartialEq)]
pub struct ModelParams {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
    pub top_p: f64,
    pub top_k: u32,
    pub frequency_penalty: f64,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 4096,
            temperature: 0.2,
            top_p: 0.9,
            top_k: 50,
            frequency_penalty: 0.0,
        }
    }
}

/// Values given explicitly on the command line. `None` means the flag was absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub top_k: Option<u32>,
    pub frequency_penalty: Option<f64>,
}

/// Record persisted in `~/.ai-js-anti-obfuscation/config.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub silicon_flow_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub top_k: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
}

/// Reads a count written as any JSON number. Values that are not a whole
/// number in `u32` range (`-1`, `12.5`) are dropped rather than failing the
/// whole file, so the stored API key stays usable.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<f64>::deserialize(deserializer)? else {
        return Ok(None);
    };

    if raw.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(&raw) {
        return Ok(Some(raw as u32));
    }

    warn!("Ignoring stored count {raw}: not a non-negative whole number");
    Ok(None)
}

impl StoredConfig {
    /// Stored API key, ignoring an empty string left in the file.
    #[must_use]
    pub fn api_key(&self) -> Option<&str> {
        self.silicon_flow_api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
    }

    /// # Errors
    ///
    /// Returns an error if `api_base` is present but is not an absolute URL.
    pub fn api_base(&self) -> Result<Url, DeobfuscateError> {
        let raw = self
            .api_base
            .as_deref()
            .filter(|base| !base.trim().is_empty())
            .unwrap_or(DEFAULT_API_BASE);

        Url::parse(raw).map_err(|e| DeobfuscateError::InvalidApiBase {
            url: raw.to_string(),
            message: e.to_string(),
        })
    }
}

/// A layer value counts as provided only when it is not the type's natural zero.
///
/// This keeps the historical policy of the config file: a stored `0` or `""`
/// behaves as if the field were missing. The catch is that a real zero (say a
/// frequency penalty of 0.0 over a non-zero stored value) cannot be expressed
/// on the command line or in the file; it always falls back to the default.
trait Unset {
    fn is_unset(&self) -> bool;
}

impl Unset for String {
    fn is_unset(&self) -> bool {
        self.trim().is_empty()
    }
}

impl Unset for u32 {
    fn is_unset(&self) -> bool {
        *self == 0
    }
}

impl Unset for f64 {
    fn is_unset(&self) -> bool {
        *self == 0.0
    }
}

fn pick<T: Unset>(explicit: Option<T>, stored: Option<T>, default: T) -> T {
    explicit
        .filter(|v| !v.is_unset())
        .or_else(|| stored.filter(|v| !v.is_unset()))
        .unwrap_or(default)
}

/// Resolves each field independently: explicit flag, then stored file, then default.
#[must_use]
pub fn merge(
    explicit: &ConfigOverrides,
    stored: &StoredConfig,
    defaults: ModelParams,
) -> ModelParams {
    ModelParams {
        model: pick(explicit.model.clone(), stored.model.clone(), defaults.model),
        max_tokens: pick(explicit.max_tokens, stored.max_tokens, defaults.max_tokens),
        temperature: pick(explicit.temperature, stored.temperature, defaults.temperature),
        top_p: pick(explicit.top_p, stored.top_p, defaults.top_p),
        top_k: pick(explicit.top_k, stored.top_k, defaults.top_k),
        frequency_penalty: pick(
            explicit.frequency_penalty,
            stored.frequency_penalty,
            defaults.frequency_penalty,
        ),
    }
}
