//! Common utilities for docwright
//!
//! This crate provides the error type shared by all docwright crates.

pub mod error;

pub use error::{DocwrightError, Result};
