use std::process::ExitCode;

use clap::Parser;
use medikal::cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let result = match cli.command {
        Some(command) => medikal::run_command(command),
        None => medikal::run().await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("medikal: {e}");
            ExitCode::FAILURE
        }
    }
}
