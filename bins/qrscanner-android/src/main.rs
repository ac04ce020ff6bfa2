//! QR scanner Android CLI
//!
//! Release signing and build tools for the QR scanner Android app.

mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use output::{format_duration, Status};
use qrscanner_android::gradle::{self, Artifact, GradleInvocation};
use qrscanner_android::{
    AppSettings, BuildType, LocalProperties, ReleaseOptions, SigningConfigResolver,
    SigningIdentity,
};
use qrscanner_core::config::Config;
use qrscanner_core::error::{exit_codes, Error};
use qrscanner_core::process::{command_exists, which_command};
use qrscanner_telemetry::{TelemetryConfig, Timer};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "qrscanner-android")]
#[command(about = "Release signing and build tools for the QR scanner Android app")]
#[command(version)]
struct Cli {
    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Android project directory, also searched for .qrscanner.toml
    #[arg(short = 'C', long, global = true, default_value = ".")]
    project_dir: PathBuf,

    /// Increase output verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Emit log events as JSON lines on stderr
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show which identity a release build will be signed with
    Signing {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Build project
    Build {
        /// Build configuration: debug, release
        #[arg(long, default_value = "debug")]
        configuration: String,
        /// Clean before building
        #[arg(long)]
        clean: bool,
        /// Build bundle (AAB) instead of APK
        #[arg(long)]
        bundle: bool,
    },

    /// Print effective configuration
    Config {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose environment
    Doctor,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        owo_colors::set_override(false);
    }
    Status::set_quiet(cli.quiet);

    let mut telemetry = TelemetryConfig::from_verbosity(cli.verbose, cli.quiet);
    telemetry.json = cli.log_json;
    qrscanner_telemetry::init_with_config(telemetry)?;

    let config = match Config::load_from(cli.config.as_deref(), &cli.project_dir) {
        Ok(config) => config,
        Err(e) => {
            Status::error(&e.to_string());
            std::process::exit(e.exit_code());
        }
    };

    let project_dir = cli.project_dir.as_path();
    let exit_code = match cli.command {
        Commands::Signing { json } => run_signing(project_dir, &config, json),
        Commands::Build {
            configuration,
            clean,
            bundle,
        } => run_build(project_dir, &config, &configuration, clean, bundle),
        Commands::Config { json } => run_config(project_dir, &config, json)?,
        Commands::Doctor => run_doctor(project_dir, &config),
    };

    std::process::exit(exit_code);
}

fn report_error(e: &Error, json: bool) -> i32 {
    if json {
        match serde_json::to_string_pretty(&e.to_report()) {
            Ok(report) => println!("{}", report),
            Err(_) => Status::error(&e.to_string()),
        }
    } else {
        Status::error(&e.to_string());
    }
    e.exit_code()
}

fn run_signing(project_dir: &Path, config: &Config, json: bool) -> i32 {
    let resolver = SigningConfigResolver::for_project(project_dir, &config.schema.signing);

    let identity = match resolver.resolve() {
        Ok(identity) => identity,
        Err(e) => return report_error(&e, json),
    };

    if json {
        println!("{}", output::identity_json(&resolver, &identity));
        return exit_codes::SUCCESS;
    }

    Status::header("Release signing");
    for (label, value) in output::identity_rows(&resolver, &identity) {
        Status::field(label, &value);
    }
    Status::blank();

    match &identity {
        SigningIdentity::Release(release) if release.is_complete() => {
            Status::success("Release builds will be signed with the upload key");
        }
        _ => output::warn_about_identity(&identity),
    }

    exit_codes::SUCCESS
}

fn run_build(
    project_dir: &Path,
    config: &Config,
    configuration: &str,
    clean: bool,
    bundle: bool,
) -> i32 {
    let build_type: BuildType = match configuration.parse() {
        Ok(build_type) => build_type,
        Err(msg) => return report_error(&Error::validation(msg), false),
    };
    let artifact = if bundle { Artifact::Bundle } else { Artifact::Apk };

    // Resolve before cleaning so a bad credential file aborts early
    let identity = if build_type.needs_signing_resolution() {
        let resolver = SigningConfigResolver::for_project(project_dir, &config.schema.signing);
        match resolver.resolve() {
            Ok(identity) => {
                output::warn_about_identity(&identity);
                identity
            }
            Err(e) => return report_error(&e, false),
        }
    } else {
        SigningIdentity::Default
    };

    if clean {
        Status::info("Cleaning...");
        match gradle::clean(project_dir) {
            Ok(0) => {}
            Ok(code) => {
                Status::error("Clean failed");
                return failure_code(code);
            }
            Err(e) => return report_error(&e, false),
        }
    }

    let invocation = GradleInvocation::for_build(
        build_type,
        artifact,
        &identity,
        &ReleaseOptions::from(&config.schema.release),
        &AppSettings::from(&config.schema.app),
    );

    Status::info(&format!(
        "Building {} {} (signing: {})...",
        build_type,
        artifact,
        identity.config_name()
    ));

    let timer = Timer::start(artifact.task(build_type));
    match invocation.run(project_dir) {
        Ok(0) => {
            let duration = timer.stop();
            Status::success(&format!("Build succeeded in {}", format_duration(duration)));
            exit_codes::SUCCESS
        }
        Ok(code) => {
            Status::error(&format!("Build failed after {}", format_duration(timer.elapsed())));
            failure_code(code)
        }
        Err(e) => report_error(&e, false),
    }
}

/// Gradle exit status, never 0 and never negative
fn failure_code(code: i32) -> i32 {
    if code > 0 {
        code
    } else {
        exit_codes::FAILURE
    }
}

fn run_config(project_dir: &Path, config: &Config, json: bool) -> Result<i32> {
    let local = match LocalProperties::load(project_dir) {
        Ok(local) => local,
        Err(e) => return Ok(report_error(&e, json)),
    };

    if json {
        let value = serde_json::json!({
            "path": config.path.as_ref().map(|p| p.display().to_string()),
            "config": config.schema,
            "local_properties": local,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(exit_codes::SUCCESS);
    }

    match &config.path {
        Some(path) => Status::info(&format!("Config file: {}", path.display())),
        None => Status::info("No config file found, using defaults"),
    }
    Status::plain(&toml::to_string_pretty(&config.schema)?);

    Status::header("local.properties");
    match local {
        Some(local) => {
            let show = |value: Option<String>| value.unwrap_or_else(|| "-".to_string());
            Status::field("sdk.dir", &show(local.android_sdk.map(|p| p.display().to_string())));
            Status::field("flutter.sdk", &show(local.flutter_sdk.map(|p| p.display().to_string())));
            Status::field("versionName", &show(local.version_name));
            Status::field("versionCode", &show(local.version_code.map(|c| c.to_string())));
        }
        None => Status::warning("local.properties not found (run `flutter pub get`)"),
    }

    Ok(exit_codes::SUCCESS)
}

fn run_doctor(project_dir: &Path, config: &Config) -> i32 {
    let mut healthy = true;

    Status::header("Environment Check");

    if gradle::has_wrapper(project_dir) {
        Status::success(&format!("{}: found", gradle::wrapper_name()));
    } else {
        Status::error(&format!(
            "{}: not found in {}",
            gradle::wrapper_name(),
            project_dir.display()
        ));
        healthy = false;
    }

    for tool in ["java", "keytool"] {
        match which_command(tool) {
            Some(path) => Status::success(&format!("{}: {}", tool, path.display())),
            None => Status::warning(&format!("{}: not found", tool)),
        }
    }

    match LocalProperties::load(project_dir) {
        Ok(Some(local)) => {
            let flutter = local.flutter_executable();
            match flutter {
                Some(path) if path.is_file() => {
                    Status::success(&format!("flutter: {}", path.display()))
                }
                Some(path) => {
                    Status::warning(&format!("flutter: {} does not exist", path.display()))
                }
                None if command_exists("flutter") => Status::success("flutter: on PATH"),
                None => Status::warning("flutter: not found"),
            }
            if let Some(version) = &local.version_name {
                Status::success(&format!(
                    "version: {} ({})",
                    version,
                    local
                        .version_code
                        .map(|c| c.to_string())
                        .unwrap_or_else(|| "no code".to_string())
                ));
            }
        }
        Ok(None) => Status::warning("local.properties: not found (run `flutter pub get`)"),
        Err(e) => {
            Status::error(&e.to_string());
            healthy = false;
        }
    }

    let resolver = SigningConfigResolver::for_project(project_dir, &config.schema.signing);
    match resolver.resolve() {
        Ok(SigningIdentity::Release(release)) if release.is_complete() => {
            Status::success(&format!("signing: release key {}", release.store_file.display()));
        }
        Ok(identity) => output::warn_about_identity(&identity),
        Err(e) => {
            Status::error(&e.to_string());
            healthy = false;
        }
    }

    if healthy {
        exit_codes::SUCCESS
    } else {
        exit_codes::FAILURE
    }
}
