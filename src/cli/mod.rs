//! Command-line interface for `dwflatten`.
//!
//! # Available Commands
//!
//! - `resolve` - flatten a DevWorkspace, DevWorkspaceTemplate or devfile and
//!   print the result
//! - `check` - flatten a workspace, run the editor compatibility check and
//!   print the plugin import tree
//!
//! # Global Options
//!
//! - `--verbose` - debug logging
//! - `--quiet` - errors only
//! - `--config <PATH>` - configuration file (see [`crate::config`])
//!
//! Without `--verbose` or `--quiet` the log filter comes from `RUST_LOG`,
//! falling back to `warn`. Logs go to stderr so the flattened output on
//! stdout can be piped.
//!
//! ```bash
//! dwflatten resolve workspace.yaml --format json
//! dwflatten --verbose resolve workspace.yaml --templates-dir ./templates --namespace user-ns
//! dwflatten check workspace.yaml
//! ```

mod check;
mod resolve;

pub use check::CheckCommand;
pub use resolve::{OutputFormat, ResolveArgs, ResolveCommand, WorkspaceInput};

use crate::config::Config;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Flatten DevWorkspace templates by resolving their parents and plugins.
#[derive(Parser, Debug)]
#[command(name = "dwflatten", version, about = "Flatten DevWorkspace templates")]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to the configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Flatten a workspace and print the result
    Resolve(ResolveCommand),
    /// Flatten a workspace and check editor compatibility of its plugins
    Check(CheckCommand),
}

impl Cli {
    /// Install logging, load the configuration and run the subcommand.
    pub async fn execute(self) -> Result<()> {
        self.init_logging();
        let config = Config::load(self.config.as_deref())?;

        match self.command {
            Commands::Resolve(cmd) => cmd.execute(config).await,
            Commands::Check(cmd) => cmd.execute(config).await,
        }
    }

    /// Log filter selected by the verbosity flags.
    #[must_use]
    pub fn log_filter(&self) -> EnvFilter {
        if self.verbose {
            EnvFilter::new("debug")
        } else if self.quiet {
            EnvFilter::new("error")
        } else {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
        }
    }

    fn init_logging(&self) {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(self.log_filter())
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }
}
