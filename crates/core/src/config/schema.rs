//! Configuration schema definitions
//!
//! Every section and key is optional; defaults mirror the app's Android build.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Android package name: two or more dot-separated Java identifiers
static PACKAGE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]*(\.[A-Za-z][A-Za-z0-9_]*)+$").unwrap());

/// Root configuration schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ConfigSchema {
    #[serde(default)]
    pub signing: SigningConfig,

    #[serde(default)]
    pub release: ReleaseConfig,

    #[serde(default)]
    pub app: AppConfig,
}

impl ConfigSchema {
    /// Check values that deserialize fine but are unusable
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if !PACKAGE_NAME.is_match(&self.app.namespace) {
            problems.push(format!(
                "app.namespace '{}' is not a valid Android package name",
                self.app.namespace
            ));
        }
        if !PACKAGE_NAME.is_match(&self.app.application_id) {
            problems.push(format!(
                "app.application_id '{}' is not a valid Android package name",
                self.app.application_id
            ));
        }
        if self.app.java_version < 8 {
            problems.push(format!(
                "app.java_version {} is too old (minimum 8)",
                self.app.java_version
            ));
        }
        if self.signing.properties_file.trim().is_empty() {
            problems.push("signing.properties_file must not be empty".to_string());
        }

        problems
    }
}

/// Where the release credentials live
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SigningConfig {
    /// Credential source, relative to the Android project directory
    #[serde(default = "default_properties_file")]
    pub properties_file: String,

    /// App module directory; `storeFile` is resolved against it
    #[serde(default = "default_module_dir")]
    pub module_dir: String,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            properties_file: default_properties_file(),
            module_dir: default_module_dir(),
        }
    }
}

fn default_properties_file() -> String {
    "key.properties".to_string()
}

fn default_module_dir() -> String {
    "app".to_string()
}

/// Native debug symbol level packaged with a release build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DebugSymbolLevel {
    #[default]
    None,
    SymbolTable,
    Full,
}

impl DebugSymbolLevel {
    /// Spelling understood by the Android Gradle Plugin
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::SymbolTable => "SYMBOL_TABLE",
            Self::Full => "FULL",
        }
    }
}

impl fmt::Display for DebugSymbolLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DebugSymbolLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "NONE" => Ok(Self::None),
            "SYMBOL_TABLE" => Ok(Self::SymbolTable),
            "FULL" => Ok(Self::Full),
            other => Err(format!(
                "unknown debug symbol level '{}' (expected NONE, SYMBOL_TABLE or FULL)",
                other
            )),
        }
    }
}

/// Release build-type flags, passed through to the build backend unchanged
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseConfig {
    /// Enable code shrinking and obfuscation
    #[serde(default = "default_true")]
    pub minify_enabled: bool,

    /// Strip unused resources
    #[serde(default = "default_true")]
    pub shrink_resources: bool,

    #[serde(default)]
    pub debug_symbol_level: DebugSymbolLevel,

    /// Proguard rule files, in order
    #[serde(default = "default_proguard_files")]
    pub proguard_files: Vec<String>,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            minify_enabled: true,
            shrink_resources: true,
            debug_symbol_level: DebugSymbolLevel::None,
            proguard_files: default_proguard_files(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_proguard_files() -> Vec<String> {
    vec!["proguard-android-optimize.txt", "proguard-rules.pro"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// App module identity and toolchain levels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_package")]
    pub namespace: String,

    #[serde(default = "default_package")]
    pub application_id: String,

    /// Java source/target compatibility and Kotlin JVM target
    #[serde(default = "default_java_version")]
    pub java_version: u8,

    /// Flutter project root, relative to the app module
    #[serde(default = "default_flutter_source")]
    pub flutter_source: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            namespace: default_package(),
            application_id: default_package(),
            java_version: default_java_version(),
            flutter_source: default_flutter_source(),
        }
    }
}

fn default_package() -> String {
    "com.qrscanner.qr_scanner".to_string()
}

fn default_java_version() -> u8 {
    17
}

fn default_flutter_source() -> String {
    "../..".to_string()
}
