use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::ai::{SiliconFlowClient, Transport};
use crate::core::{
    ConfigOverrides, ConfigStore, DeobfuscateTask, DeobfuscationReport, ModelParams,
    StoredConfig, merge,
};
use crate::errors::DeobfuscateError;
use crate::response::clean_output;
use crate::secret::SecretProvider;

/// Runs one task: key, input, request, reply, output.
///
/// Transport and API errors are returned as produced so the user sees the
/// original API detail.
///
/// # Errors
///
/// Returns the first failure of any step; nothing is retried.
pub async fn deobfuscate_task<T, S>(
    task: &DeobfuscateTask,
    store: &ConfigStore,
    secrets: &mut S,
    transport: T,
) -> Result<DeobfuscationReport, DeobfuscateError>
where
    T: Transport,
    S: SecretProvider + ?Sized,
{
    let mut stored = store.load()?;
    let api_key = ensure_api_key(&task.overrides, &mut stored, store, secrets)?;

    let bytes = fs::read(&task.input).map_err(|source| DeobfuscateError::InputRead {
        path: task.input.clone(),
        source,
    })?;
    // Legacy-encoded bundles still go out; invalid bytes become U+FFFD
    let source = String::from_utf8_lossy(&bytes).into_owned();
    info!("Read {} bytes from {}", bytes.len(), task.input.display());

    let params = merge(&task.overrides, &stored, ModelParams::default());
    info!(
        "Using model {} (max_tokens={}, temperature={}, top_p={}, top_k={}, frequency_penalty={})",
        params.model,
        params.max_tokens,
        params.temperature,
        params.top_p,
        params.top_k,
        params.frequency_penalty
    );

    let client = SiliconFlowClient::new(transport, api_key, &stored.api_base()?)?;
    let generated = client.deobfuscate(&params, &source).await?;
    let cleaned = clean_output(&generated);

    if cleaned.is_empty() {
        warn!("Model returned no code; writing an empty file");
    }

    write_output(&task.output, &cleaned)?;
    info!("Wrote {} bytes to {}", cleaned.len(), task.output.display());

    Ok(DeobfuscationReport {
        output: task.output.clone(),
        model: params.model,
        input_bytes: bytes.len(),
        output_bytes: cleaned.len(),
    })
}

/// Explicit key first, then the stored one. Otherwise the user is asked once
/// and the answer is saved; a failed save aborts the run.
///
/// # Errors
///
/// Returns an error if the prompt fails or the config cannot be saved.
pub fn ensure_api_key<S>(
    overrides: &ConfigOverrides,
    stored: &mut StoredConfig,
    store: &ConfigStore,
    secrets: &mut S,
) -> Result<String, DeobfuscateError>
where
    S: SecretProvider + ?Sized,
{
    if let Some(key) = overrides
        .api_key
        .as_deref()
        .map(str::trim)
        .filter(|key| !key.is_empty())
    {
        return Ok(key.to_string());
    }

    if let Some(key) = stored.api_key() {
        return Ok(key.to_string());
    }

    info!("No API key configured, prompting");
    let key = secrets.api_key()?;
    stored.silicon_flow_api_key = Some(key.clone());
    store.save(stored)?;
    Ok(key)
}

fn write_output(path: &Path, contents: &str) -> Result<(), DeobfuscateError> {
    let io_err = |source: std::io::Error| DeobfuscateError::OutputWrite {
        path: path.to_path_buf(),
        source,
    };

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(io_err)?;
    }
    fs::write(path, contents).map_err(io_err)
}
