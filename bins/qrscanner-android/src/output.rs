//! Terminal output
//!
//! Status lines and the signing report. Secrets are never printed, only
//! whether they are set.

use owo_colors::OwoColorize;
use qrscanner_android::signing::{SigningConfigResolver, SigningIdentity};
use std::sync::atomic::{AtomicBool, Ordering};

static QUIET: AtomicBool = AtomicBool::new(false);

/// Status message helpers
pub struct Status;

impl Status {
    /// Suppress success/info/step output (errors and warnings still print)
    pub fn set_quiet(quiet: bool) {
        QUIET.store(quiet, Ordering::Relaxed);
    }

    fn quiet() -> bool {
        QUIET.load(Ordering::Relaxed)
    }

    pub fn success(message: &str) {
        if !Self::quiet() {
            println!("{} {}", "✓".green(), message);
        }
    }

    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    pub fn warning(message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    pub fn info(message: &str) {
        if !Self::quiet() {
            println!("{} {}", "ℹ".blue(), message);
        }
    }

    /// Unadorned output, suppressed by `--quiet`
    pub fn plain(message: &str) {
        if !Self::quiet() {
            println!("{}", message);
        }
    }

    pub fn blank() {
        Self::plain("");
    }

    /// Print a header
    pub fn header(message: &str) {
        if !Self::quiet() {
            println!();
            println!("{}", message.bold());
            println!("{}", "─".repeat(message.chars().count()));
        }
    }

    /// Print an aligned `label: value` line
    pub fn field(label: &str, value: &str) {
        if !Self::quiet() {
            println!("  {:<16} {}", format!("{}:", label).dimmed(), value);
        }
    }
}

/// Format a duration for display
pub fn format_duration(duration: std::time::Duration) -> String {
    let secs = duration.as_secs_f32();
    if secs < 1.0 {
        format!("{:.0}ms", secs * 1000.0)
    } else if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        let mins = (secs / 60.0).floor();
        let remaining_secs = secs % 60.0;
        format!("{}m {:.0}s", mins, remaining_secs)
    }
}

/// `set` / `missing`, never the value itself
pub fn secret_state(value: &Option<String>) -> &'static str {
    if value.is_some() {
        "set"
    } else {
        "missing"
    }
}

/// Label/value rows describing a resolved identity
pub fn identity_rows(
    resolver: &SigningConfigResolver,
    identity: &SigningIdentity,
) -> Vec<(&'static str, String)> {
    let mut rows = vec![
        ("Credentials", resolver.properties_path().display().to_string()),
        ("Signing config", identity.config_name().to_string()),
    ];

    if let SigningIdentity::Release(release) = identity {
        rows.push(("Keystore", release.store_file.display().to_string()));
        rows.push((
            "Key alias",
            release
                .key_alias
                .clone()
                .unwrap_or_else(|| "missing".to_string()),
        ));
        rows.push(("Key password", secret_state(&release.key_password).to_string()));
        rows.push(("Store password", secret_state(&release.store_password).to_string()));
    }

    rows
}

/// JSON form of the signing report
pub fn identity_json(
    resolver: &SigningConfigResolver,
    identity: &SigningIdentity,
) -> serde_json::Value {
    match identity {
        SigningIdentity::Release(release) => serde_json::json!({
            "identity": "release",
            "signing_config": identity.config_name(),
            "properties_file": resolver.properties_path().display().to_string(),
            "store_file": release.store_file.display().to_string(),
            "key_alias": release.key_alias,
            "key_password": secret_state(&release.key_password),
            "store_password": secret_state(&release.store_password),
            "missing_fields": release.missing_fields(),
        }),
        SigningIdentity::Default => serde_json::json!({
            "identity": "default",
            "signing_config": identity.config_name(),
            "properties_file": resolver.properties_path().display().to_string(),
        }),
    }
}

/// Warn about identities that will not produce a release-signed artifact
pub fn warn_about_identity(identity: &SigningIdentity) {
    match identity {
        SigningIdentity::Release(release) if !release.is_complete() => {
            Status::warning(&format!(
                "Release credentials are missing {}; signing will fail",
                release.missing_fields().join(", ")
            ));
        }
        SigningIdentity::Release(_) => {}
        SigningIdentity::Default => {
            Status::warning("No release keystore found; release build will be signed with the debug key");
        }
    }
}
