//! Command-line surface

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;

use crate::ai::client::DEFAULT_TIMEOUT;
use crate::core::{ConfigOverrides, DeobfuscateTask};
use crate::errors::DeobfuscateError;

#[derive(Debug, Parser)]
#[command(name = "ai-js-anti-obfuscation", version)]
#[command(about = "AI JavaScript Anti-obfuscation Tool")]
#[command(long_about = "A tool to deobfuscate JavaScript code using AI")]
pub struct Cli {
    /// Input file path
    #[arg(short, long, value_name = "PATH")]
    pub input: PathBuf,

    /// Output file path (defaults to <input>_output.<ext>)
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Model name
    #[arg(long)]
    pub model: Option<String>,

    /// Maximum number of tokens to generate
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Sampling temperature
    #[arg(long)]
    pub temperature: Option<f64>,

    /// Top-p sampling parameter
    #[arg(long)]
    pub top_p: Option<f64>,

    /// Top-k sampling parameter
    #[arg(long)]
    pub top_k: Option<u32>,

    /// Frequency penalty parameter
    #[arg(long)]
    pub frequency_penalty: Option<f64>,

    /// API key for this run only; never written to the config file
    #[arg(long, env = "SILICONFLOW_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Seconds to wait for the API before giving up
    #[arg(
        long,
        default_value_t = DEFAULT_TIMEOUT.as_secs(),
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout_secs: u64,

    /// Log progress to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    #[must_use]
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            api_key: self.api_key.clone(),
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            top_p: self.top_p,
            top_k: self.top_k,
            frequency_penalty: self.frequency_penalty,
        }
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Checks the input path and resolves the output path.
    ///
    /// # Errors
    ///
    /// Returns `Usage` if the input file does not exist or is not a file.
    pub fn into_task(self) -> Result<DeobfuscateTask, DeobfuscateError> {
        if !self.input.exists() {
            return Err(DeobfuscateError::Usage(format!(
                "input file does not exist: {}",
                self.input.display()
            )));
        }
        if !self.input.is_file() {
            return Err(DeobfuscateError::Usage(format!(
                "input path is not a file: {}",
                self.input.display()
            )));
        }

        let overrides = self.overrides();
        let output = self
            .output
            .unwrap_or_else(|| default_output_path(&self.input));

        Ok(DeobfuscateTask {
            input: self.input,
            output,
            overrides,
        })
    }
}

/// `dir/name.js` becomes `dir/name_output.js`; a file without extension gets `_output` appended.
#[must_use]
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = match input.extension() {
        Some(ext) => format!("{stem}_output.{}", ext.to_string_lossy()),
        None => format!("{stem}_output"),
    };
    input.with_file_name(file_name)
}
