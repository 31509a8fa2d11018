use std::process::ExitCode;

use ai_js_anti_obfuscation::ai::HttpTransport;
use ai_js_anti_obfuscation::cli::Cli;
use ai_js_anti_obfuscation::core::{ConfigStore, DeobfuscationReport};
use ai_js_anti_obfuscation::secret::TerminalPrompt;
use ai_js_anti_obfuscation::worker::deobfuscate_task;
use ai_js_anti_obfuscation::{DeobfuscateError, setup_logging};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use tracing::debug;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // clap's message already carries the usage line
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
        }
    };

    setup_logging(cli.verbose);

    match run(cli).await {
        Ok(report) => {
            println!(
                "Successfully deobfuscated code and saved to: {}",
                report.output.display()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            debug!("Run failed: {e:?}");
            eprintln!("{e}");
            if e.is_usage() {
                eprintln!("\n{}", Cli::command().render_help());
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<DeobfuscationReport, DeobfuscateError> {
    let timeout = cli.timeout();
    let task = cli.into_task()?;
    let transport = HttpTransport::new(timeout)?;
    let store = ConfigStore::default_location();

    deobfuscate_task(&task, &store, &mut TerminalPrompt, transport).await
}
