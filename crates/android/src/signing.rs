//! Release signing configuration
//!
//! Decides whether a release build is signed with the upload key described by
//! `key.properties` or falls back to the backend's debug identity.
//!
//! Resolution rules:
//! - no credential file: debug identity, not an error
//! - credential file present but unreadable or malformed: fatal
//! - no `storeFile` entry, or it does not name an existing file: debug identity
//! - otherwise: release identity, fields copied verbatim
//!
//! Alias and passwords are not checked here. A release identity missing them
//! fails later, in the backend's signing step.

use crate::properties::{Properties, PropertiesError};
use qrscanner_core::config::SigningConfig;
use qrscanner_core::error::{Error, Result};
use std::fmt;
use std::path::{Path, PathBuf};

pub const KEY_ALIAS: &str = "keyAlias";
pub const KEY_PASSWORD: &str = "keyPassword";
pub const STORE_FILE: &str = "storeFile";
pub const STORE_PASSWORD: &str = "storePassword";

const REDACTED: &str = "<redacted>";

fn redact(value: &Option<String>) -> Option<&'static str> {
    value.as_ref().map(|_| REDACTED)
}

/// The four recognised entries of a credential file
#[derive(Clone, Default, PartialEq, Eq)]
pub struct CredentialSource {
    pub key_alias: Option<String>,
    pub key_password: Option<String>,
    pub store_file: Option<String>,
    pub store_password: Option<String>,
}

impl CredentialSource {
    /// Extract the recognised keys; anything else in the file is ignored
    pub fn from_properties(props: &Properties) -> Self {
        let field = |key: &str| props.get(key).map(str::to_string);
        Self {
            key_alias: field(KEY_ALIAS),
            key_password: field(KEY_PASSWORD),
            store_file: field(STORE_FILE),
            store_password: field(STORE_PASSWORD),
        }
    }

    /// Load a credential file, `Ok(None)` when it does not exist
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        Self::read(path).map(Some)
    }

    /// Read an existing credential file; every failure is fatal
    fn read(path: &Path) -> Result<Self> {
        let props = Properties::load(path).map_err(|e| credentials_error(path, e))?;
        Ok(Self::from_properties(&props))
    }
}

impl fmt::Debug for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialSource")
            .field("key_alias", &self.key_alias)
            .field("key_password", &redact(&self.key_password))
            .field("store_file", &self.store_file)
            .field("store_password", &redact(&self.store_password))
            .finish()
    }
}

fn credentials_error(path: &Path, err: PropertiesError) -> Error {
    match err {
        PropertiesError::MalformedUnicodeEscape { line } => {
            Error::credentials_malformed(path, line, "malformed \\uxxxx encoding").with_source(err)
        }
        other => Error::credentials_unreadable(path, &other).with_source(other),
    }
}

/// Dedicated release key material
#[derive(Clone, PartialEq, Eq)]
pub struct ReleaseIdentity {
    pub key_alias: Option<String>,
    pub key_password: Option<String>,
    /// Absolute path of the keystore
    pub store_file: PathBuf,
    pub store_password: Option<String>,
}

impl ReleaseIdentity {
    /// Credential keys absent from the source file
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.key_alias.is_none() {
            missing.push(KEY_ALIAS);
        }
        if self.key_password.is_none() {
            missing.push(KEY_PASSWORD);
        }
        if self.store_password.is_none() {
            missing.push(STORE_PASSWORD);
        }
        missing
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }
}

impl fmt::Debug for ReleaseIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReleaseIdentity")
            .field("key_alias", &self.key_alias)
            .field("key_password", &redact(&self.key_password))
            .field("store_file", &self.store_file)
            .field("store_password", &redact(&self.store_password))
            .finish()
    }
}

/// Signing identity selected for a release build
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SigningIdentity {
    /// Sign with the upload key
    Release(ReleaseIdentity),
    /// Sign with whatever identity the backend uses by default (its debug key)
    Default,
}

impl SigningIdentity {
    pub fn is_release(&self) -> bool {
        matches!(self, Self::Release(_))
    }

    pub fn release(&self) -> Option<&ReleaseIdentity> {
        match self {
            Self::Release(identity) => Some(identity),
            Self::Default => None,
        }
    }

    /// Name of the backend signing config this identity maps to
    pub fn config_name(&self) -> &'static str {
        match self {
            Self::Release(_) => "release",
            Self::Default => "debug",
        }
    }
}

/// Resolves the release signing identity from filesystem state
#[derive(Debug, Clone)]
pub struct SigningConfigResolver {
    properties_path: PathBuf,
    base_dir: PathBuf,
}

impl SigningConfigResolver {
    /// `base_dir` is where a relative `storeFile` is resolved
    pub fn new(properties_path: impl Into<PathBuf>, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            properties_path: properties_path.into(),
            base_dir: base_dir.into(),
        }
    }

    /// Resolver for an Android project directory and its signing settings
    pub fn for_project(project_dir: &Path, config: &SigningConfig) -> Self {
        Self::new(
            project_dir.join(&config.properties_file),
            project_dir.join(&config.module_dir),
        )
    }

    pub fn properties_path(&self) -> &Path {
        &self.properties_path
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Select the signing identity
    ///
    /// Only a present-but-unusable credential file is an error.
    pub fn resolve(&self) -> Result<SigningIdentity> {
        let Some(source) = CredentialSource::load(&self.properties_path)? else {
            tracing::debug!(
                properties = %self.properties_path.display(),
                "No credential file, using default signing"
            );
            return Ok(SigningIdentity::Default);
        };

        let Some(store_file) = source.store_file.as_deref() else {
            tracing::debug!(
                properties = %self.properties_path.display(),
                "Credential file has no {} entry, using default signing",
                STORE_FILE
            );
            return Ok(SigningIdentity::Default);
        };

        let candidate = self.base_dir.join(store_file);
        let resolved = std::path::absolute(&candidate).unwrap_or(candidate);

        if !resolved.is_file() {
            tracing::debug!(
                store_file = %resolved.display(),
                "Keystore not found, using default signing"
            );
            return Ok(SigningIdentity::Default);
        }

        let identity = ReleaseIdentity {
            key_alias: source.key_alias,
            key_password: source.key_password,
            store_file: resolved,
            store_password: source.store_password,
        };

        tracing::debug!(
            store_file = %identity.store_file.display(),
            complete = identity.is_complete(),
            "Using release signing"
        );

        Ok(SigningIdentity::Release(identity))
    }
}

/// Resolve with an explicit credential file and keystore base directory
pub fn resolve(properties_path: &Path, base_dir: &Path) -> Result<SigningIdentity> {
    SigningConfigResolver::new(properties_path, base_dir).resolve()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use qrscanner_core::error::ErrorCode;
    use std::fs;
    use tempfile::TempDir;

    const FULL: &str = "keyAlias=upload\nkeyPassword=kp\nstoreFile=release.jks\nstorePassword=sp\n";

    /// Android project dir with an `app/` module
    fn project() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("app")).unwrap();
        dir
    }

    fn write(dir: &TempDir, rel: &str, content: &str) {
        fs::write(dir.path().join(rel), content).unwrap();
    }

    fn resolver(dir: &TempDir) -> SigningConfigResolver {
        SigningConfigResolver::for_project(dir.path(), &SigningConfig::default())
    }

    #[test]
    fn test_no_credential_file_is_default() {
        let dir = project();
        write(&dir, "app/release.jks", "keystore");

        assert_eq!(resolver(&dir).resolve().unwrap(), SigningIdentity::Default);
    }

    #[test]
    fn test_existing_keystore_is_release() {
        let dir = project();
        write(&dir, "key.properties", FULL);
        write(&dir, "app/release.jks", "keystore");

        let identity = resolver(&dir).resolve().unwrap();
        let release = identity.release().expect("release identity");

        assert_eq!(release.key_alias.as_deref(), Some("upload"));
        assert_eq!(release.key_password.as_deref(), Some("kp"));
        assert_eq!(release.store_password.as_deref(), Some("sp"));
        assert_eq!(release.store_file, dir.path().join("app").join("release.jks"));
        assert!(release.store_file.is_absolute());
        assert!(release.is_complete());
        assert_eq!(identity.config_name(), "release");
    }

    #[test]
    fn test_missing_keystore_is_default() {
        let dir = project();
        write(&dir, "key.properties", FULL);

        let identity = resolver(&dir).resolve().unwrap();
        assert_eq!(identity, SigningIdentity::Default);
        assert_eq!(identity.config_name(), "debug");
    }

    #[test]
    fn test_keystore_outside_module_dir_is_not_found() {
        let dir = project();
        write(&dir, "key.properties", FULL);
        write(&dir, "release.jks", "keystore");

        assert_eq!(resolver(&dir).resolve().unwrap(), SigningIdentity::Default);
    }

    #[test]
    fn test_missing_store_file_entry_is_default() {
        let dir = project();
        write(&dir, "key.properties", "keyAlias=upload\nkeyPassword=kp\n");
        write(&dir, "app/release.jks", "keystore");

        assert_eq!(resolver(&dir).resolve().unwrap(), SigningIdentity::Default);
    }

    #[test]
    fn test_store_file_naming_a_directory_is_default() {
        let dir = project();
        write(&dir, "key.properties", "storeFile=\n");

        assert_eq!(resolver(&dir).resolve().unwrap(), SigningIdentity::Default);
    }

    #[test]
    fn test_absolute_store_file() {
        let dir = project();
        let keys = TempDir::new().unwrap();
        let keystore = keys.path().join("upload.jks");
        fs::write(&keystore, "keystore").unwrap();
        write(
            &dir,
            "key.properties",
            &format!("storeFile={}\n", keystore.display()).replace('\\', "\\\\"),
        );

        let identity = resolver(&dir).resolve().unwrap();
        assert_eq!(identity.release().unwrap().store_file, keystore);
    }

    #[test]
    fn test_incomplete_release_identity_is_not_rejected() {
        let dir = project();
        write(&dir, "key.properties", "storeFile=release.jks\nkeyAlias=upload\n");
        write(&dir, "app/release.jks", "keystore");

        let identity = resolver(&dir).resolve().unwrap();
        let release = identity.release().unwrap();
        assert!(!release.is_complete());
        assert_eq!(release.missing_fields(), vec![KEY_PASSWORD, STORE_PASSWORD]);
        assert_eq!(release.key_alias.as_deref(), Some("upload"));
    }

    #[test]
    fn test_malformed_credential_file_is_fatal() {
        let dir = project();
        write(&dir, "key.properties", "keyAlias=upload\nstorePassword=\\uZZZZ\n");
        write(&dir, "app/release.jks", "keystore");

        let err = resolver(&dir).resolve().unwrap_err();
        assert_eq!(err.code, ErrorCode::CredentialsMalformed);
        assert!(err.message.contains("line 2"));
        assert_eq!(err.exit_code(), qrscanner_core::error::exit_codes::CONFIG_ERROR);
    }

    #[test]
    fn test_unreadable_credential_file_is_fatal() {
        let dir = project();
        fs::create_dir(dir.path().join("key.properties")).unwrap();

        let err = resolver(&dir).resolve().unwrap_err();
        assert_eq!(err.code, ErrorCode::CredentialsUnreadable);
    }

    #[test]
    fn test_custom_locations() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("signing")).unwrap();
        fs::create_dir_all(dir.path().join("mobile")).unwrap();
        write(&dir, "signing/upload.properties", "storeFile=upload.jks\n");
        write(&dir, "mobile/upload.jks", "keystore");

        let config = SigningConfig {
            properties_file: "signing/upload.properties".to_string(),
            module_dir: "mobile".to_string(),
        };
        let resolver = SigningConfigResolver::for_project(dir.path(), &config);
        assert_eq!(resolver.base_dir(), dir.path().join("mobile"));

        let identity = resolver.resolve().unwrap();
        assert_eq!(
            identity.release().unwrap().store_file,
            dir.path().join("mobile").join("upload.jks")
        );
    }

    #[test]
    fn test_free_function_matches_resolver() {
        let dir = project();
        write(&dir, "key.properties", FULL);
        write(&dir, "app/release.jks", "keystore");

        let via_fn = resolve(&dir.path().join("key.properties"), &dir.path().join("app")).unwrap();
        assert_eq!(via_fn, resolver(&dir).resolve().unwrap());
    }

    #[test]
    fn test_debug_output_redacts_passwords() {
        let identity = ReleaseIdentity {
            key_alias: Some("upload".to_string()),
            key_password: Some("hunter2".to_string()),
            store_file: PathBuf::from("/keys/release.jks"),
            store_password: Some("swordfish".to_string()),
        };
        let rendered = format!("{:?}", SigningIdentity::Release(identity));

        assert!(rendered.contains("upload"));
        assert!(rendered.contains(REDACTED));
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("swordfish"));

        let source = CredentialSource {
            key_password: Some("hunter2".to_string()),
            ..CredentialSource::default()
        };
        assert!(!format!("{:?}", source).contains("hunter2"));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn release_fields_are_copied_verbatim(
            alias in "[a-zA-Z0-9_]{1,16}",
            key_password in "[a-zA-Z0-9_!@]{1,24}",
            store_password in "[a-zA-Z0-9_!@]{1,24}",
        ) {
            let dir = project();
            write(
                &dir,
                "key.properties",
                &format!(
                    "keyAlias={}\nkeyPassword={}\nstoreFile=release.jks\nstorePassword={}\n",
                    alias, key_password, store_password
                ),
            );
            write(&dir, "app/release.jks", "keystore");

            let first = resolver(&dir).resolve().unwrap();
            let second = resolver(&dir).resolve().unwrap();
            prop_assert_eq!(&first, &second);

            let release = first.release().unwrap();
            prop_assert_eq!(release.key_alias.as_deref(), Some(alias.as_str()));
            prop_assert_eq!(release.key_password.as_deref(), Some(key_password.as_str()));
            prop_assert_eq!(release.store_password.as_deref(), Some(store_password.as_str()));
        }

        #[test]
        fn missing_keystore_is_default_whatever_the_fields(
            alias in proptest::option::of("[a-z]{1,8}"),
            store_file in "[a-z]{1,8}\\.jks",
        ) {
            let dir = project();
            let mut text = format!("storeFile={}\n", store_file);
            if let Some(alias) = alias {
                text.push_str(&format!("keyAlias={}\n", alias));
            }
            write(&dir, "key.properties", &text);

            prop_assert_eq!(resolver(&dir).resolve().unwrap(), SigningIdentity::Default);
        }
    }
}
