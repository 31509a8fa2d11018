//! ai-js-anti-obfuscation - renames the identifiers of obfuscated JavaScript
//! with a SiliconFlow-hosted code model.
//!
//! One run reads a source file, merges the command line, the per-user config
//! file and the compiled-in defaults into one parameter set, sends a single
//! chat-completion request and writes the cleaned reply next to the input.
//!
//! # Architecture
//!
//! - `core` holds the configuration layers, the merge and the config store
//! - `ai` builds the request and talks to the API through a `Transport`
//! - `response` interprets the reply and strips code fences
//! - `worker` sequences one run
//! - `cli` is the `clap` front-end used by the binary
//!
//! # Example
//!
//! ```no_run
//! use ai_js_anti_obfuscation::ai::HttpTransport;
//! use ai_js_anti_obfuscation::ai::client::DEFAULT_TIMEOUT;
//! use ai_js_anti_obfuscation::core::{ConfigOverrides, ConfigStore, DeobfuscateTask};
//! use ai_js_anti_obfuscation::secret::TerminalPrompt;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     ai_js_anti_obfuscation::setup_logging(false);
//!
//!     let task = DeobfuscateTask {
//!         input: "bundle.js".into(),
//!         output: "bundle_output.js".into(),
//!         overrides: ConfigOverrides::default(),
//!     };
//!
//!     let report = ai_js_anti_obfuscation::worker::deobfuscate_task(
//!         &task,
//!         &ConfigStore::default_location(),
//!         &mut TerminalPrompt,
//!         HttpTransport::new(DEFAULT_TIMEOUT)?,
//!     )
//!     .await?;
//!
//!     println!("Saved to {}", report.output.display());
//!     Ok(())
//! }
//! ```

pub mod ai;
pub mod cli;
pub mod core;
pub mod errors;
pub mod prompt;
pub mod response;
pub mod secret;
pub mod worker;

pub use errors::DeobfuscateError;

/// Configure logging to stderr so stdout stays free for the user-facing lines.
///
/// `RUST_LOG` wins when set; otherwise only warnings are shown, or this
/// crate's debug output when `verbose` is on. Calling it twice is harmless.
///
/// # Example
///
/// ```
/// ai_js_anti_obfuscation::setup_logging(false);
/// ```
pub fn setup_logging(verbose: bool) {
    use tracing_subscriber::{EnvFilter, prelude::*};

    let default_directive = if verbose {
        "ai_js_anti_obfuscation=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}
