//! `dwflatten check`: editor compatibility of a workspace's plugins.

use super::resolve::{ResolveArgs, print_warnings};
use crate::config::Config;
use crate::resolver::check_plugins_compatibility;
use anyhow::Result;
use clap::Args;
use colored::Colorize;

/// Flatten a workspace, check editor compatibility and print the import tree.
#[derive(Args, Debug)]
pub struct CheckCommand {
    #[command(flatten)]
    pub args: ResolveArgs,
}

impl CheckCommand {
    pub async fn execute(self, config: Config) -> Result<()> {
        let resolved = self.args.resolve(config).await?;
        if let Some(warnings) = &resolved.warnings {
            print_warnings(warnings);
        }

        print!("{}", resolved.tree.to_tree_string());
        check_plugins_compatibility(&resolved.tree)?;

        println!(
            "{} {} plugin(s) compatible",
            "✓".green(),
            resolved.tree.plugin_count()
        );
        Ok(())
    }
}
