//! # OCR Mate Common Library
//!
//! Shared code for the OCR Mate verification tools:
//! - Error and result types
//! - TOML configuration model and config-file resolution
//! - Logging configuration

pub mod config;
pub mod error;

pub use error::{Error, Result};
