//! User-supplied inputs for a run
//!
//! Inputs arrive through CLI flags or the `INPUT_*` environment variables
//! GitHub Actions sets for an action's `with:` block.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::crypto::SecureString;
use crate::error::{ShieldError, ShieldResult};
use crate::validation;

/// Which workflow to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Backup,
    Restore,
}

impl FromStr for Action {
    type Err = ShieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        validation::validate_action(s)?;
        match s {
            "backup" => Ok(Self::Backup),
            _ => Ok(Self::Restore),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Backup => write!(f, "backup"),
            Self::Restore => write!(f, "restore"),
        }
    }
}

/// How the OTP is delivered to the operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OtpMethod {
    #[default]
    Mail,
    Authenticator,
}

impl OtpMethod {
    /// Wire name of the method
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mail => "MAIL",
            Self::Authenticator => "AUTHENTICATOR",
        }
    }
}

impl FromStr for OtpMethod {
    type Err = ShieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        validation::validate_otp_method(s)?;
        match s {
            "MAIL" => Ok(Self::Mail),
            _ => Ok(Self::Authenticator),
        }
    }
}

impl fmt::Display for OtpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inputs for a single backup or restore run
#[derive(Debug, Clone)]
pub struct ActionInputs {
    /// Activation code for the vault endpoint
    pub activation_code: SecureString,
    /// Encryption password (hashed before use)
    pub encryption_password: SecureString,
    pub action: Action,
    /// Backup version to restore
    pub file_version_id: Option<String>,
    /// Elevated credential able to modify workflow files
    pub restore_token: Option<SecureString>,
    /// Default, scope-limited token issued to the job
    pub github_token: Option<SecureString>,
    /// Suspend Actions while the restore pushes
    pub suspend_actions: bool,
    pub otp_method: OtpMethod,
}

impl ActionInputs {
    /// Whether an elevated credential was supplied
    pub fn has_elevated_token(&self) -> bool {
        self.restore_token
            .as_ref()
            .map_or(false, |token| !token.is_empty())
    }

    /// Validate the inputs for the selected action
    pub fn validate(&self) -> ShieldResult<()> {
        validation::validate_password(&self.encryption_password)?;
        if self.activation_code.is_empty() {
            return Err(ShieldError::Validation(
                "Activation code is required".to_string(),
            ));
        }
        if self.action == Action::Restore {
            validation::validate_restore_inputs(self.file_version_id.as_deref())?;
        }
        Ok(())
    }

    /// Secret values that must never appear in logs
    pub fn secrets(&self) -> Vec<&str> {
        let mut secrets = vec![
            self.activation_code.as_str(),
            self.encryption_password.as_str(),
        ];
        if let Some(token) = &self.restore_token {
            secrets.push(token.as_str());
        }
        if let Some(token) = &self.github_token {
            secrets.push(token.as_str());
        }
        secrets.retain(|s| !s.is_empty());
        secrets
    }
}

#[cfg(test)]
pub(crate) fn test_inputs(action: Action) -> ActionInputs {
    ActionInputs {
        activation_code: "ACT-1234".into(),
        encryption_password: "Secret123!".into(),
        action,
        file_version_id: Some("file-version-1".to_string()),
        restore_token: None,
        github_token: Some("ghs_default".into()),
        suspend_actions: true,
        otp_method: OtpMethod::Mail,
    }
}
