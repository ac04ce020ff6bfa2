//! Configuration file loading

use super::schema::ConfigSchema;
use crate::error::{Error, ErrorCode, Result};
use std::path::{Path, PathBuf};

/// Standard configuration file names, searched in order
const CANDIDATES: [&str; 3] = [
    ".qrscanner.toml",
    "qrscanner.toml",
    ".config/qrscanner.toml",
];

/// Configuration wrapper
#[derive(Debug, Clone)]
pub struct Config {
    pub schema: ConfigSchema,
    pub path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from an explicit path, or search the current directory
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_from(path, Path::new("."))
    }

    /// Load configuration from an explicit path, or search `search_dir`
    ///
    /// An explicit path must exist; a missing search result means defaults.
    pub fn load_from(path: Option<&Path>, search_dir: &Path) -> Result<Self> {
        let config_path = match path {
            Some(p) if !p.exists() => return Err(Error::config_not_found(p)),
            Some(p) => Some(p.to_path_buf()),
            None => find_config_file(search_dir),
        };

        let schema = match config_path {
            Some(ref p) => load_config_file(p)?,
            None => ConfigSchema::default(),
        };

        let problems = schema.validate();
        if !problems.is_empty() {
            let mut err = Error::config_validation(problems.join("; "));
            if let Some(ref p) = config_path {
                err = err.with_context(format!("In {}", p.display()));
            }
            return Err(err);
        }

        tracing::debug!(
            path = ?config_path,
            "Configuration loaded"
        );

        Ok(Self {
            schema,
            path: config_path,
        })
    }

    /// Load with defaults only (no file)
    pub fn defaults() -> Self {
        Self {
            schema: ConfigSchema::default(),
            path: None,
        }
    }
}

/// Find configuration file in standard locations
fn find_config_file(dir: &Path) -> Option<PathBuf> {
    CANDIDATES
        .iter()
        .map(|candidate| dir.join(candidate))
        .find(|p| p.is_file())
}

/// Load and parse a TOML configuration file
fn load_config_file(path: &Path) -> Result<ConfigSchema> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::new(
            ErrorCode::ConfigError,
            format!("Failed to read config file {}: {}", path.display(), e),
        )
        .with_source(e)
    })?;

    toml::from_str(&content).map_err(|e| {
        Error::new(
            ErrorCode::ConfigParseError,
            format!("Failed to parse config file {}: {}", path.display(), e),
        )
        .with_source(e)
    })
}
