//! Gradle build system integration
//!
//! Builds the Gradle command line for a build: tasks, `-P` project
//! properties, and the `qrscanner*` signing properties the app module's
//! release signing config reads. Passwords travel as `ORG_GRADLE_PROJECT_*`
//! environment variables so they never show up in the process argument list.
//!
//! `gradlew` is a `/bin/sh` script, and shells such as dash drop environment
//! entries whose names are not identifiers. Every variable name handed to the
//! wrapper is therefore `[A-Za-z_][A-Za-z0-9_]*`.

use crate::build_type::{AppSettings, BuildType, ReleaseOptions};
use crate::signing::SigningIdentity;
use qrscanner_core::error::{Error, Result};
use qrscanner_core::process::run_command_streaming_in_dir;
use std::fmt;
use std::path::{Path, PathBuf};

pub const SIGNING_STORE_FILE: &str = "qrscannerStoreFile";
pub const SIGNING_STORE_PASSWORD: &str = "qrscannerStorePassword";
pub const SIGNING_KEY_ALIAS: &str = "qrscannerKeyAlias";
pub const SIGNING_KEY_PASSWORD: &str = "qrscannerKeyPassword";

/// Environment prefix Gradle maps onto project properties
const PROJECT_ENV_PREFIX: &str = "ORG_GRADLE_PROJECT_";

/// Wrapper script name for this platform
pub fn wrapper_name() -> &'static str {
    if cfg!(windows) {
        "gradlew.bat"
    } else {
        "gradlew"
    }
}

pub fn wrapper_path(project_dir: &Path) -> PathBuf {
    project_dir.join(wrapper_name())
}

pub fn has_wrapper(project_dir: &Path) -> bool {
    wrapper_path(project_dir).is_file()
}

/// Whether `name` survives a POSIX shell's environment handling
pub fn is_portable_env_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Packaging format of a build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    Apk,
    Bundle,
}

impl Artifact {
    fn task_prefix(&self) -> &'static str {
        match self {
            Self::Apk => "assemble",
            Self::Bundle => "bundle",
        }
    }

    /// Gradle task producing this artifact for `build_type`
    pub fn task(&self, build_type: BuildType) -> String {
        format!("{}{}", self.task_prefix(), build_type.task_suffix())
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Apk => f.write_str("APK"),
            Self::Bundle => f.write_str("bundle"),
        }
    }
}

/// A single Gradle run
#[derive(Clone, Default)]
pub struct GradleInvocation {
    tasks: Vec<String>,
    properties: Vec<(String, String)>,
    secret_env: Vec<(String, String)>,
}

impl GradleInvocation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invocation for one artifact of one build type
    ///
    /// `identity` is only consulted for release builds.
    pub fn for_build(
        build_type: BuildType,
        artifact: Artifact,
        identity: &SigningIdentity,
        release: &ReleaseOptions,
        app: &AppSettings,
    ) -> Self {
        let mut invocation = Self::new()
            .task(artifact.task(build_type))
            .properties(app.gradle_properties());

        if build_type == BuildType::Release {
            invocation = invocation
                .properties(release.gradle_properties())
                .signing(identity);
        }

        invocation
    }

    pub fn task(mut self, task: impl Into<String>) -> Self {
        self.tasks.push(task.into());
        self
    }

    pub fn property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.push((key.into(), value.into()));
        self
    }

    pub fn properties(mut self, props: impl IntoIterator<Item = (String, String)>) -> Self {
        self.properties.extend(props);
        self
    }

    /// Project property passed through the environment
    ///
    /// `key` must be an identifier; `run` rejects names a shell would drop.
    pub fn secret_property(mut self, key: &str, value: impl Into<String>) -> Self {
        self.secret_env
            .push((format!("{}{}", PROJECT_ENV_PREFIX, key), value.into()));
        self
    }

    /// Inject a signing identity
    ///
    /// `Default` injects nothing and the backend keeps its debug identity.
    /// Absent alias or passwords are left out and fail in the signing step.
    pub fn signing(mut self, identity: &SigningIdentity) -> Self {
        let SigningIdentity::Release(release) = identity else {
            return self;
        };

        self = self.property(SIGNING_STORE_FILE, release.store_file.display().to_string());
        if let Some(alias) = &release.key_alias {
            self = self.property(SIGNING_KEY_ALIAS, alias.clone());
        }
        if let Some(password) = &release.store_password {
            self = self.secret_property(SIGNING_STORE_PASSWORD, password.clone());
        }
        if let Some(password) = &release.key_password {
            self = self.secret_property(SIGNING_KEY_PASSWORD, password.clone());
        }
        self
    }

    pub fn tasks(&self) -> &[String] {
        &self.tasks
    }

    /// Command-line arguments: tasks followed by `-Pkey=value`
    pub fn args(&self) -> Vec<String> {
        self.tasks
            .iter()
            .cloned()
            .chain(
                self.properties
                    .iter()
                    .map(|(k, v)| format!("-P{}={}", k, v)),
            )
            .collect()
    }

    pub fn env(&self) -> &[(String, String)] {
        &self.secret_env
    }

    /// Run through the project's wrapper, streaming output; returns the exit code
    pub fn run(&self, project_dir: &Path) -> Result<i32> {
        if self.tasks.is_empty() {
            return Err(Error::gradle("No Gradle task given"));
        }
        if let Some((name, _)) = self.secret_env.iter().find(|(k, _)| !is_portable_env_name(k)) {
            return Err(Error::gradle(format!(
                "Environment variable name {} would be dropped by the wrapper's shell",
                name
            )));
        }
        if !has_wrapper(project_dir) {
            return Err(Error::gradle(format!(
                "Gradle wrapper not found: {}",
                wrapper_path(project_dir).display()
            ))
            .with_suggestion("Run from the Flutter app's android/ directory or pass --project-dir"));
        }

        let wrapper = wrapper_path(project_dir);
        tracing::info!(tasks = ?self.tasks, "Running Gradle");
        run_command_streaming_in_dir(
            &wrapper.to_string_lossy(),
            &self.args(),
            project_dir,
            &self.secret_env,
        )
    }
}

impl fmt::Debug for GradleInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GradleInvocation")
            .field("tasks", &self.tasks)
            .field("properties", &self.properties)
            .field(
                "secret_env",
                &self.secret_env.iter().map(|(k, _)| k).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Clean build artifacts
pub fn clean(project_dir: &Path) -> Result<i32> {
    GradleInvocation::new().task("clean").run(project_dir)
}
