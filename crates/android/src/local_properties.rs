//! Flutter's `local.properties`
//!
//! Written by `flutter pub get` next to `settings.gradle`; supplies the SDK
//! locations and the version the Flutter tool stamps into the build.

use crate::properties::{Properties, PropertiesError};
use qrscanner_core::error::{Error, ErrorCode, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const FILE_NAME: &str = "local.properties";

/// Values read from `local.properties`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LocalProperties {
    /// `sdk.dir`
    pub android_sdk: Option<PathBuf>,
    /// `flutter.sdk`
    pub flutter_sdk: Option<PathBuf>,
    /// `flutter.buildMode`
    pub build_mode: Option<String>,
    /// `flutter.versionName`
    pub version_name: Option<String>,
    /// `flutter.versionCode`
    pub version_code: Option<u32>,
}

impl LocalProperties {
    /// Load from an Android project directory, `Ok(None)` if the file is absent
    pub fn load(project_dir: &Path) -> Result<Option<Self>> {
        let path = project_dir.join(FILE_NAME);
        if !path.exists() {
            return Ok(None);
        }

        let props = Properties::load(&path).map_err(|e| local_error(&path, e))?;
        Self::from_properties(&props)
            .map(Some)
            .map_err(|e| local_error(&path, e))
    }

    pub fn from_properties(props: &Properties) -> std::result::Result<Self, PropertiesError> {
        Ok(Self {
            android_sdk: props.get("sdk.dir").map(PathBuf::from),
            flutter_sdk: props.get("flutter.sdk").map(PathBuf::from),
            build_mode: props.get("flutter.buildMode").map(str::to_string),
            version_name: props.get("flutter.versionName").map(str::to_string),
            version_code: props.get_parsed("flutter.versionCode")?,
        })
    }

    /// Path to the `flutter` executable inside the configured SDK
    pub fn flutter_executable(&self) -> Option<PathBuf> {
        let name = if cfg!(windows) { "flutter.bat" } else { "flutter" };
        self.flutter_sdk.as_ref().map(|sdk| sdk.join("bin").join(name))
    }
}

fn local_error(path: &Path, err: PropertiesError) -> Error {
    let code = match err {
        PropertiesError::InvalidValue { .. } => ErrorCode::InvalidConfigValue,
        PropertiesError::MalformedUnicodeEscape { .. } => ErrorCode::ConfigParseError,
        PropertiesError::Io { .. } => ErrorCode::ConfigError,
    };
    Error::new(code, format!("{}: {}", path.display(), err))
        .with_suggestion("Run `flutter pub get` to regenerate local.properties")
        .with_source(err)
}
