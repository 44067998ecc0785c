//! Integration test suite for devfile-flatten
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **flatten**: data-driven resolution cases from `tests/fixtures/testdata`,
//!   plus end-to-end properties of `resolve`
//! - **cli**: the `dwflatten` binary against files in a temporary directory

mod cli;
mod flatten;
