//! vsix-fetch CLI entry point
//!
//! Parses arguments, runs the download pipeline and maps the outcome to the
//! exit status: 0 when everything was fetched, 1 on any failure.

use anyhow::Result;
use clap::Parser;
use vsix_fetch::cli;
use vsix_fetch::core::error::user_friendly_error;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = cli::Cli::parse();

    // Set up colored output for Windows
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute().await {
        Ok(true) => Ok(()),
        Ok(false) => std::process::exit(1),
        Err(e) => {
            // Convert to user-friendly error with context and suggestions
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            std::process::exit(1);
        }
    }
}
