use std::path::PathBuf;

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeobfuscateError {
    #[error("{0}")]
    Usage(String),

    #[error("Failed to access config file {}: {source}", path.display())]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {}: {message}", path.display())]
    ConfigParse { path: PathBuf, message: String },

    #[error("Invalid API base URL {url}: {message}")]
    InvalidApiBase { url: String, message: String },

    #[error("No SiliconFlow API key provided")]
    MissingApiKey,

    #[error("Failed to read API key from terminal: {0}")]
    SecretPrompt(#[source] std::io::Error),

    #[error("error reading input file {}: {source}", path.display())]
    InputRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error writing output file {}: {source}", path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to send HTTP request: {0}")]
    Transport(String),

    /// Structured error body returned by the API, kept as sent.
    #[error("SiliconFlow API error (code={code}): {message}")]
    Api {
        code: i64,
        message: String,
        data: Option<Value>,
    },

    #[error("API error (status={status}): {body}")]
    ApiStatus { status: u16, body: String },

    #[error("Failed to parse response: {0}")]
    InvalidResponse(String),

    #[error("empty response from API")]
    EmptyResponse,
}

impl DeobfuscateError {
    /// Argument problems get the usage text; everything else is printed bare.
    #[must_use]
    pub fn is_usage(&self) -> bool {
        matches!(self, DeobfuscateError::Usage(_))
    }
}

impl From<reqwest::Error> for DeobfuscateError {
    fn from(error: reqwest::Error) -> Self {
        DeobfuscateError::Transport(error.to_string())
    }
}

impl From<serde_json::Error> for DeobfuscateError {
    fn from(error: serde_json::Error) -> Self {
        DeobfuscateError::InvalidResponse(error.to_string())
    }
}
