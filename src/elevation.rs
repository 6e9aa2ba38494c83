//! Privilege elevation for the firewall primitive
//!
//! Most firewall mutations need elevated rights. The bridge itself runs
//! unprivileged; when `elevate` is enabled in the config, only the primitive
//! process is wrapped in an elevation helper.
//!
//! # Elevation Strategy
//!
//! - **Preferred (all modes)**: Uses `run0` when available (systemd v256+, no SUID)
//! - **Terminal fallback**: Uses `sudo`
//! - **Non-interactive fallback**: Uses `pkexec`
//!
//! # Environment Variables
//!
//! - `FWBRIDGE_ELEVATION_METHOD`: Force a specific elevation method (`sudo`, `run0`, or `pkexec`).
//!   Useful with sudoers NOPASSWD rules for the primitive.
//!
//! - `FWBRIDGE_TEST_NO_ELEVATION`: Bypass elevation entirely (for testing only).
//!
//! # Security
//!
//! - Arguments are passed as an argv vector, never through a shell
//! - All caller input is sanitized and validated before a command is built
//! - Elevation helpers are checked for availability before use

use std::io;
use tokio::process::Command;

/// Error type for privilege elevation operations
#[derive(Debug, thiserror::Error)]
pub enum ElevationError {
    /// pkexec binary not found in PATH
    #[error("pkexec not found - please install PolicyKit")]
    PkexecNotFound,

    /// Requested elevation method is not available (binary not found)
    #[error("Elevation method '{0}' is not available (binary not found)")]
    MethodNotAvailable(String),

    /// Invalid value for `FWBRIDGE_ELEVATION_METHOD`
    #[error("Invalid FWBRIDGE_ELEVATION_METHOD '{0}'. Valid options: sudo, run0, pkexec")]
    InvalidMethod(String),

    /// Generic I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Checks if a binary exists in PATH
fn binary_exists(name: &str) -> bool {
    std::env::var_os("PATH")
        .and_then(|paths| {
            std::env::split_paths(&paths).find_map(|dir| {
                let full_path = dir.join(name);
                if full_path.is_file() {
                    Some(full_path)
                } else {
                    None
                }
            })
        })
        .is_some()
}

fn wrapped(helper: &str, program: &str, args: &[String]) -> Command {
    let mut cmd = Command::new(helper);
    cmd.arg(program).args(args);
    cmd
}

fn direct(program: &str, args: &[String]) -> Command {
    let mut cmd = Command::new(program);
    cmd.args(args);
    cmd
}

/// Builds an elevated command running `program` with `args`.
fn build_elevated_command(program: &str, args: &[String]) -> Result<Command, ElevationError> {
    use std::os::fd::AsFd;

    // 1. Strict Test Mode Override (Highest Priority)
    if std::env::var("FWBRIDGE_TEST_NO_ELEVATION").is_ok() {
        return Ok(direct(program, args));
    }

    // 2. Direct Root Execution (No prompt needed)
    if nix::unistd::getuid().is_root() {
        return Ok(direct(program, args));
    }

    // 3. Explicit elevation method override
    if let Ok(method) = std::env::var("FWBRIDGE_ELEVATION_METHOD") {
        let method = method.to_lowercase();
        if !method.is_empty() {
            return match method.as_str() {
                "sudo" | "run0" | "pkexec" => {
                    if binary_exists(&method) {
                        Ok(wrapped(&method, program, args))
                    } else {
                        Err(ElevationError::MethodNotAvailable(method))
                    }
                }
                _ => Err(ElevationError::InvalidMethod(method)),
            };
        }
    }

    // 4. Automatic detection - prefer run0, fallback to sudo/pkexec
    if binary_exists("run0") {
        return Ok(wrapped("run0", program, args));
    }

    let is_atty = nix::unistd::isatty(std::io::stdin().as_fd()).unwrap_or(false);

    if is_atty {
        Ok(wrapped("sudo", program, args))
    } else {
        if !binary_exists("pkexec") {
            return Err(ElevationError::PkexecNotFound);
        }
        Ok(wrapped("pkexec", program, args))
    }
}

/// Creates the command that runs the firewall primitive.
///
/// With `elevate` unset the primitive runs directly as the current user.
/// Arguments are passed without shell interpretation; callers must ensure
/// they were validated first.
///
/// # Example
///
/// ```no_run
/// use fwbridge::elevation::create_primitive_command;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let args = vec!["firewall_controller.py".to_string(), "status".to_string()];
/// let mut cmd = create_primitive_command("python", &args, false)?;
/// let output = cmd.output().await?;
/// # Ok(())
/// # }
/// ```
pub fn create_primitive_command(
    program: &str,
    args: &[String],
    elevate: bool,
) -> Result<Command, ElevationError> {
    if elevate {
        build_elevated_command(program, args)
    } else {
        Ok(direct(program, args))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_helpers::ENV_VAR_MUTEX;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_binary_exists() {
        // sh should exist on all Unix systems
        assert!(binary_exists("sh"));
        assert!(!binary_exists("fwbridge_nonexistent_binary_xyz"));
    }

    #[test]
    fn test_unelevated_command_runs_program_directly() {
        let cmd = create_primitive_command("sh", &args(&["-c", "true"]), false).unwrap();
        assert_eq!(cmd.as_std().get_program(), "sh");
        let collected: Vec<_> = cmd.as_std().get_args().collect();
        assert_eq!(collected, vec!["-c", "true"]);
    }

    #[tokio::test]
    async fn test_create_command_test_mode() {
        let _guard = ENV_VAR_MUTEX.lock().unwrap();

        unsafe {
            std::env::set_var("FWBRIDGE_TEST_NO_ELEVATION", "1");
        }

        let cmd = create_primitive_command("sh", &args(&["status"]), true).unwrap();
        assert_eq!(cmd.as_std().get_program(), "sh");

        unsafe {
            std::env::remove_var("FWBRIDGE_TEST_NO_ELEVATION");
        }
    }

    #[test]
    fn test_invalid_elevation_method() {
        let _guard = ENV_VAR_MUTEX.lock().unwrap();
        if nix::unistd::getuid().is_root() {
            // Root short-circuits before the method override is read
            return;
        }

        unsafe {
            std::env::remove_var("FWBRIDGE_TEST_NO_ELEVATION");
            std::env::set_var("FWBRIDGE_ELEVATION_METHOD", "invalid_method");
        }

        let result = create_primitive_command("sh", &args(&["status"]), true);

        unsafe {
            std::env::remove_var("FWBRIDGE_ELEVATION_METHOD");
        }

        assert!(matches!(result, Err(ElevationError::InvalidMethod(_))));
    }

    #[test]
    fn test_elevation_method_case_insensitive() {
        let _guard = ENV_VAR_MUTEX.lock().unwrap();

        unsafe {
            std::env::remove_var("FWBRIDGE_TEST_NO_ELEVATION");
            std::env::set_var("FWBRIDGE_ELEVATION_METHOD", "SUDO");
        }

        let result = create_primitive_command("sh", &args(&["status"]), true);

        unsafe {
            std::env::remove_var("FWBRIDGE_ELEVATION_METHOD");
        }

        // Either sudo exists or MethodNotAvailable, but never InvalidMethod
        assert!(!matches!(result, Err(ElevationError::InvalidMethod(_))));
    }
}
