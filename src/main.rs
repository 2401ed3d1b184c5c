//! srcgen entry point
//!
//! Parses the command line, runs the single generation command and turns
//! failures into a readable message with exit code 1.

use anyhow::Result;
use clap::Parser;
use srcgen_cli::cli;
use srcgen_cli::core::user_friendly_error;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = match cli::Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version are not failures
            let code = i32::from(e.use_stderr());
            let _ = e.print();
            std::process::exit(code);
        }
    };

    // Set up colored output for Windows
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute().await {
        Ok(()) => Ok(()),
        Err(e) => {
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            std::process::exit(1);
        }
    }
}
