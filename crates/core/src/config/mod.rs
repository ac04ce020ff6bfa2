//! Configuration loading and schema definitions
//!
//! Tool configuration lives in `.qrscanner.toml`; every key has a default.

mod loader;
mod schema;

pub use loader::Config;
pub use schema::*;
