//! History filter tooling detection

use std::process::{Command, Stdio};

use tracing::{info, warn};

/// Which history rewrite tool is available
///
/// Resolved once when the git layer is initialised and passed in from
/// then on, so tests can pin it to [`FilterCapability::LegacyOnly`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterCapability {
    /// `git filter-repo` is installed
    ModernFilterAvailable,
    /// Only the built-in `git filter-branch`
    LegacyOnly,
}

impl FilterCapability {
    /// Check for python3 and pip3, then try to install git-filter-repo
    pub fn probe() -> Self {
        info!("Checking for Python and attempting to install git-filter-repo via pip");

        let steps: [(&str, &[&str]); 3] = [
            ("python3", &["--version"]),
            ("pip3", &["--version"]),
            ("pip3", &["install", "git-filter-repo"]),
        ];

        for (program, args) in steps {
            if let Err(reason) = run_quiet(program, args) {
                warn!(
                    "Could not install git-filter-repo ({}). Falling back to git filter-branch.",
                    reason
                );
                return Self::LegacyOnly;
            }
        }

        info!("git-filter-repo installed and ready to use");
        Self::ModernFilterAvailable
    }
}

fn run_quiet(program: &str, args: &[&str]) -> Result<(), String> {
    let status = Command::new(program)
        .args(args)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map_err(|e| format!("{} unavailable: {}", program, e))?;

    if status.success() {
        Ok(())
    } else {
        Err(format!("`{} {}` exited with {}", program, args.join(" "), status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_program_is_an_error() {
        let result = run_quiet("gitshield-no-such-program", &["--version"]);
        assert!(result.unwrap_err().contains("unavailable"));
    }
}
