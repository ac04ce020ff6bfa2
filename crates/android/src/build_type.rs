//! Build types and the static values handed to the build backend
//!
//! Nothing here is decided at build time: minification, resource shrinking,
//! symbol level and app identity are read from configuration and forwarded
//! as `-Pqrscanner.*` project properties.

use qrscanner_core::config::{AppConfig, DebugSymbolLevel, ReleaseConfig};
use std::fmt;
use std::str::FromStr;

/// Prefix of every project property this tool forwards
pub const PROPERTY_PREFIX: &str = "qrscanner";

/// Gradle build variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildType {
    Debug,
    Release,
}

impl BuildType {
    /// Capitalised variant name used in Gradle task names
    pub fn task_suffix(&self) -> &'static str {
        match self {
            Self::Debug => "Debug",
            Self::Release => "Release",
        }
    }

    /// Only release builds go through the signing resolver
    pub fn needs_signing_resolution(&self) -> bool {
        matches!(self, Self::Release)
    }
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Debug => f.write_str("debug"),
            Self::Release => f.write_str("release"),
        }
    }
}

impl FromStr for BuildType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "release" => Ok(Self::Release),
            other => Err(format!("unknown build type '{}' (expected debug or release)", other)),
        }
    }
}

/// Release build-type options, forwarded without interpretation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseOptions {
    pub minify_enabled: bool,
    pub shrink_resources: bool,
    pub debug_symbol_level: DebugSymbolLevel,
    pub proguard_files: Vec<String>,
}

impl From<&ReleaseConfig> for ReleaseOptions {
    fn from(config: &ReleaseConfig) -> Self {
        Self {
            minify_enabled: config.minify_enabled,
            shrink_resources: config.shrink_resources,
            debug_symbol_level: config.debug_symbol_level,
            proguard_files: config.proguard_files.clone(),
        }
    }
}

impl ReleaseOptions {
    /// Project properties for the release build type
    pub fn gradle_properties(&self) -> Vec<(String, String)> {
        vec![
            prop("release.minifyEnabled", self.minify_enabled),
            prop("release.shrinkResources", self.shrink_resources),
            prop("release.debugSymbolLevel", self.debug_symbol_level),
            prop("release.proguardFiles", self.proguard_files.join(",")),
        ]
    }
}

/// App module values that the build file would otherwise read from globals
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppSettings {
    pub namespace: String,
    pub application_id: String,
    pub java_version: u8,
    pub flutter_source: String,
}

impl From<&AppConfig> for AppSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            namespace: config.namespace.clone(),
            application_id: config.application_id.clone(),
            java_version: config.java_version,
            flutter_source: config.flutter_source.clone(),
        }
    }
}

impl AppSettings {
    /// `VERSION_17`-style constant for source/target compatibility
    pub fn java_version_constant(&self) -> String {
        format!("VERSION_{}", self.java_version)
    }

    pub fn gradle_properties(&self) -> Vec<(String, String)> {
        vec![
            prop("namespace", &self.namespace),
            prop("applicationId", &self.application_id),
            prop("javaVersion", self.java_version),
            prop("jvmTarget", self.java_version),
            prop("flutterSource", &self.flutter_source),
        ]
    }
}

fn prop(name: &str, value: impl fmt::Display) -> (String, String) {
    (format!("{}.{}", PROPERTY_PREFIX, name), value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_type_parse() {
        assert_eq!("release".parse::<BuildType>().unwrap(), BuildType::Release);
        assert_eq!("Debug".parse::<BuildType>().unwrap(), BuildType::Debug);
        assert!("profile".parse::<BuildType>().is_err());
        assert_eq!(BuildType::Release.task_suffix(), "Release");
        assert!(BuildType::Release.needs_signing_resolution());
        assert!(!BuildType::Debug.needs_signing_resolution());
    }

    #[test]
    fn test_default_release_options() {
        let options = ReleaseOptions::from(&ReleaseConfig::default());
        let props = options.gradle_properties();

        assert!(props.contains(&("qrscanner.release.minifyEnabled".into(), "true".into())));
        assert!(props.contains(&("qrscanner.release.shrinkResources".into(), "true".into())));
        assert!(props.contains(&("qrscanner.release.debugSymbolLevel".into(), "NONE".into())));
        assert!(props.contains(&(
            "qrscanner.release.proguardFiles".into(),
            "proguard-android-optimize.txt,proguard-rules.pro".into()
        )));
    }

    #[test]
    fn test_options_are_forwarded_unchanged() {
        let config = ReleaseConfig {
            minify_enabled: false,
            shrink_resources: false,
            debug_symbol_level: DebugSymbolLevel::Full,
            proguard_files: vec!["rules.pro".to_string()],
        };
        let options = ReleaseOptions::from(&config);

        assert!(!options.minify_enabled);
        assert_eq!(options.debug_symbol_level, DebugSymbolLevel::Full);
        assert!(options
            .gradle_properties()
            .contains(&("qrscanner.release.debugSymbolLevel".into(), "FULL".into())));
    }

    #[test]
    fn test_app_settings() {
        let app = AppSettings::from(&AppConfig::default());
        assert_eq!(app.java_version_constant(), "VERSION_17");

        let props = app.gradle_properties();
        assert!(props.contains(&(
            "qrscanner.applicationId".into(),
            "com.qrscanner.qr_scanner".into()
        )));
        assert!(props.contains(&("qrscanner.jvmTarget".into(), "17".into())));
        assert!(props.contains(&("qrscanner.flutterSource".into(), "../..".into())));
    }
}
