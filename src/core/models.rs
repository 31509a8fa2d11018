use std::path::PathBuf;

use super::config::ConfigOverrides;

/// One deobfuscation run as requested on the command line.
#[derive(Debug, Clone)]
pub struct DeobfuscateTask {
    pub input: PathBuf,
    pub output: PathBuf,
    pub overrides: ConfigOverrides,
}

/// What a finished run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct DeobfuscationReport {
    pub output: PathBuf,
    pub model: String,
    pub input_bytes: usize,
    pub output_bytes: usize,
}
