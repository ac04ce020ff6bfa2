//! Core utilities for the QR scanner build tools
//!
//! This crate provides shared functionality used by the Android tooling:
//!
//! - **Error handling**: Structured errors with codes, context, and recovery suggestions
//! - **Configuration**: TOML-based configuration with defaults and validation
//! - **Process execution**: Command execution for the external build backend
//!
//! # Example
//!
//! ```rust,no_run
//! use qrscanner_core::config::Config;
//!
//! let config = Config::load(None).expect("invalid configuration");
//! println!("credentials: {}", config.schema.signing.properties_file);
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod process;

pub use error::{Error, ErrorCode, Result};
