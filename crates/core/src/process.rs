//! Process execution utilities
//!
//! Thin wrappers over `std::process::Command` for the external build backend
//! and the tools `doctor` checks for.

use crate::error::{Error, Result};
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

fn spawn_error(program: &str, err: io::Error) -> Error {
    if err.kind() == io::ErrorKind::NotFound {
        Error::command_not_found(program).with_source(err)
    } else {
        Error::process(format!("Failed to execute {}: {}", program, err)).with_source(err)
    }
}

/// Run a command in `dir` with extra environment, streaming its output
///
/// Environment values never appear in logs; only their names do.
pub fn run_command_streaming_in_dir(
    program: &str,
    args: &[String],
    dir: &Path,
    env: &[(String, String)],
) -> Result<i32> {
    let mut cmd = Command::new(program);
    cmd.args(args)
        .current_dir(dir)
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());

    for (key, value) in env {
        cmd.env(key, value);
    }

    tracing::debug!(
        program,
        ?args,
        dir = %dir.display(),
        env = ?env.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>(),
        "Spawning process"
    );

    let status = cmd.status().map_err(|e| spawn_error(program, e))?;

    Ok(status.code().unwrap_or(-1))
}

/// Check if a command exists in PATH
pub fn command_exists(program: &str) -> bool {
    which::which(program).is_ok()
}

/// Get the path to a command
pub fn which_command(program: &str) -> Option<PathBuf> {
    which::which(program).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn test_command_exists_sh() {
        assert!(command_exists("sh"));
        assert!(which_command("sh").is_some());
    }

    #[test]
    fn test_command_exists_nonexistent() {
        assert!(!command_exists("nonexistent_command_12345"));
        assert!(which_command("nonexistent_command_12345").is_none());
    }

    #[test]
    fn test_missing_program_maps_to_command_not_found() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = run_command_streaming_in_dir("nonexistent_command_12345", &[], dir.path(), &[])
            .unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::CommandNotFound);
        assert_eq!(err.exit_code(), crate::error::exit_codes::COMMAND_NOT_FOUND);
    }

    #[cfg(unix)]
    #[test]
    fn test_streaming_passes_env_and_exit_code() {
        let dir = tempfile::TempDir::new().unwrap();
        let args = vec![
            "-c".to_string(),
            "test \"$QRSCANNER_SECRET\" = secret && exit 7".to_string(),
        ];
        let env = vec![("QRSCANNER_SECRET".to_string(), "secret".to_string())];

        let code = run_command_streaming_in_dir("sh", &args, dir.path(), &env).unwrap();
        assert_eq!(code, 7);
    }
}
