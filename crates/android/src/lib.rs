//! Android build tooling for the QR scanner app
//!
//! This crate provides:
//! - Java `.properties` parsing
//! - Release signing resolution from `key.properties`
//! - Build-type options passed through to Gradle
//! - Flutter `local.properties` values
//! - Gradle invocation carrying the signing identity

pub mod build_type;
pub mod gradle;
pub mod local_properties;
pub mod properties;
pub mod signing;

pub use build_type::{AppSettings, BuildType, ReleaseOptions};
pub use gradle::{Artifact, GradleInvocation};
pub use local_properties::LocalProperties;
pub use properties::{Properties, PropertiesError};
pub use signing::{
    resolve, CredentialSource, ReleaseIdentity, SigningConfigResolver, SigningIdentity,
};
