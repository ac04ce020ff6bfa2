//! Errors shared by the QR scanner build tools
//!
//! An [`Error`] is a code plus a message, with optional context and a hint
//! for fixing it. Codes are grouped by thousands and the group decides the
//! process exit code (see [`Error::exit_code`]).

use serde::Serialize;
use std::fmt;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Tool configuration and Flutter local properties (3xxx)
    ConfigError = 3000,
    ConfigNotFound = 3001,
    ConfigParseError = 3002,
    ConfigValidationError = 3003,
    InvalidConfigValue = 3004,

    // Spawning external programs (5xxx)
    ProcessError = 5000,
    CommandNotFound = 5001,

    // Bad command-line input (6xxx)
    ValidationError = 6000,

    // Build backend (8xxx)
    GradleError = 8000,

    // Release signing credentials (9xxx)
    CredentialsUnreadable = 9001,
    CredentialsMalformed = 9002,
}

impl ErrorCode {
    pub fn code(&self) -> u32 {
        *self as u32
    }

    pub fn category(&self) -> &'static str {
        match self.code() / 1000 {
            3 => "Configuration",
            5 => "Process",
            6 => "Validation",
            8 => "Build",
            _ => "Signing",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:04}", self.code())
    }
}

#[derive(Error, Debug)]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    /// What was being done when it failed
    pub context: Option<String>,
    /// How to fix it
    pub suggestion: Option<String>,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(ctx) = &self.context {
            write!(f, "\n  Context: {}", ctx)?;
        }
        if let Some(suggestion) = &self.suggestion {
            write!(f, "\n  Suggestion: {}", suggestion)?;
        }
        Ok(())
    }
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: None,
            suggestion: None,
            source: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Serializable form for `--json` output
    pub fn to_report(&self) -> ErrorReport {
        ErrorReport {
            code: self.code,
            code_str: self.code.to_string(),
            category: self.code.category(),
            message: self.message.clone(),
            context: self.context.clone(),
            suggestion: self.suggestion.clone(),
            source: self.source.as_ref().map(|e| e.to_string()),
        }
    }

    /// Exit code a CLI should terminate with for this error
    ///
    /// Configuration and credential failures share `CONFIG_ERROR`: both stop a
    /// build before the backend runs.
    pub fn exit_code(&self) -> i32 {
        match self.code {
            ErrorCode::CommandNotFound => exit_codes::COMMAND_NOT_FOUND,
            ErrorCode::ValidationError => exit_codes::VALIDATION_ERROR,
            code if matches!(code.code() / 1000, 3 | 9) => exit_codes::CONFIG_ERROR,
            _ => exit_codes::FAILURE,
        }
    }

    pub fn config_not_found(path: impl AsRef<Path>) -> Self {
        Self::new(
            ErrorCode::ConfigNotFound,
            format!("Configuration file not found: {}", path.as_ref().display()),
        )
        .with_suggestion("Create a .qrscanner.toml file or drop --config to use defaults")
    }

    pub fn config_validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigValidationError, message)
    }

    pub fn process(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ProcessError, message)
    }

    pub fn command_not_found(cmd: &str) -> Self {
        Self::new(ErrorCode::CommandNotFound, format!("Command not found: {}", cmd))
            .with_suggestion(format!("Install {} and ensure it's in your PATH", cmd))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }

    pub fn gradle(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::GradleError, message)
    }

    /// The credential source exists but could not be read
    pub fn credentials_unreadable(path: impl AsRef<Path>, reason: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::CredentialsUnreadable,
            format!(
                "Cannot read signing credentials {}: {}",
                path.as_ref().display(),
                reason
            ),
        )
        .with_suggestion("Fix the file permissions or remove the file to build with the debug key")
    }

    /// The credential source exists but is not valid key/value text
    pub fn credentials_malformed(path: impl AsRef<Path>, line: usize, reason: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::CredentialsMalformed,
            format!(
                "Malformed signing credentials {} (line {}): {}",
                path.as_ref().display(),
                line,
                reason
            ),
        )
        .with_suggestion("Fix the entry or remove the file to build with the debug key")
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorReport {
    pub code: ErrorCode,
    pub code_str: String,
    pub category: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

pub type Result<T> = std::result::Result<T, Error>;

/// Process exit codes of the CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const FAILURE: i32 = 1;
    pub const VALIDATION_ERROR: i32 = 2;
    pub const CONFIG_ERROR: i32 = 3;
    pub const COMMAND_NOT_FOUND: i32 = 127;
}
