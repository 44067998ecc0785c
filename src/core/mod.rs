//! Core types shared by every part of the flattening library
//!
//! At the moment this is the error system:
//! - [`FlattenError`] - one variant per way resolution can fail
//! - [`ErrorContext`] - user-facing wrapper with details and suggestions
//! - [`user_friendly_error`] - turn any `anyhow::Error` into an [`ErrorContext`]
//!
//! Library functions return [`Result`], the CLI layer works with
//! `anyhow::Result` and converts to [`ErrorContext`] right before exiting.
//!
//! # Examples
//!
//! ```rust,no_run
//! use devfile_flatten::core::{FlattenError, user_friendly_error};
//!
//! fn run() -> anyhow::Result<()> {
//!     Err(FlattenError::Config {
//!         message: "namespace is required".to_string(),
//!     }
//!     .into())
//! }
//!
//! if let Err(e) = run() {
//!     user_friendly_error(e).display();
//! }
//! ```

pub mod error;

pub use error::{ErrorContext, FlattenError, Result, user_friendly_error};
