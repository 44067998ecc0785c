//! dwflatten CLI entry point
//!
//! Parses arguments, runs the selected command and renders errors with
//! context and suggestions:
//! - `resolve` - flatten a workspace file and print it
//! - `check` - flatten a workspace file and check editor compatibility

use anyhow::Result;
use clap::Parser;
use devfile_flatten::cli;
use devfile_flatten::core::user_friendly_error;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

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
