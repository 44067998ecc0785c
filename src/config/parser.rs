//! Generic configuration parsing utilities.
//!
//! Reads a TOML file into any `DeserializeOwned` type, with the file path in
//! the error context:
//!
//! ```text
//! Failed to parse config file: /path/to/config.toml
//! Caused by:
//!     invalid type: string "x", expected u64
//! ```

use anyhow::{Context, Result};
use std::path::Path;

/// Parse a TOML configuration file into `T`.
///
/// # Examples
///
/// ```rust,no_run
/// use devfile_flatten::config::{Config, parse_config};
/// use std::path::Path;
///
/// # fn example() -> anyhow::Result<()> {
/// let config: Config = parse_config(Path::new("dwflatten.toml"))?;
/// println!("Default namespace: {}", config.namespace);
/// # Ok(())
/// # }
/// ```
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not valid TOML, or does
/// not match the structure of `T`.
pub fn parse_config<T>(path: &Path) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: T = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    Ok(config)
}
