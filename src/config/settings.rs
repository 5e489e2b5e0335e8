//! Static settings for gitshield
//!
//! Endpoints, git identity, upload attributes and artifact names. Every
//! field has a default, so a settings file only needs the values it
//! overrides.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ShieldError;

/// Vault API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Base URL of the vault API
    pub base_url: String,
    /// Base URL of the management console (OTP page, dashboard links)
    pub management_base_url: String,
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
    /// User agent sent with every request
    pub user_agent: String,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "https://staging.api.file-security.icredible.com".to_string(),
            management_base_url: "https://staging.management.file-security.icredible.com"
                .to_string(),
            timeout_ms: 30_000,
            user_agent: "iCredible-Git-Security/2.0".to_string(),
        }
    }
}

/// GitHub settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubSettings {
    /// REST API base URL
    pub api_url: String,
    /// Host used for authenticated push URLs
    pub host: String,
}

impl Default for GithubSettings {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".to_string(),
            host: "github.com".to_string(),
        }
    }
}

/// Identity used for commits made while restoring
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GitIdentity {
    pub user_name: String,
    pub user_email: String,
}

impl Default for GitIdentity {
    fn default() -> Self {
        Self {
            user_name: "iCredible Git Security".to_string(),
            user_email: "icredible-git-sec@icredible.com".to_string(),
        }
    }
}

/// Fixed attributes sent with every upload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadSettings {
    pub attributes: u32,
    pub compression_engine: String,
    pub compression_level: String,
    pub encryption_type: String,
    pub revision_type: u32,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            attributes: 32,
            compression_engine: "None".to_string(),
            compression_level: "NoCompression".to_string(),
            encryption_type: "None".to_string(),
            revision_type: 1,
        }
    }
}

/// Artifact naming
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSettings {
    /// Mirror clone directory name; archives are named after it
    pub source_archive_dir: String,
    /// Where the Actions suspension state is persisted (defaults to the temp dir)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suspension_state_file: Option<PathBuf>,
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            source_archive_dir: "repo-mirror".to_string(),
            suspension_state_file: None,
        }
    }
}

/// Settings for gitshield
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api: ApiSettings,
    pub github: GithubSettings,
    pub git: GitIdentity,
    /// Endpoint type reported on activation
    pub endpoint_type: String,
    pub upload: UploadSettings,
    pub files: FileSettings,
    /// Seconds between OTP status checks
    pub otp_poll_interval_secs: u64,
}

impl Settings {
    /// Load settings from a JSON file, or use the defaults when no file is given
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ShieldError> {
        let Some(path) = path else {
            return Ok(Self::with_defaults());
        };

        let contents = std::fs::read_to_string(path).map_err(|e| {
            ShieldError::Io(format!(
                "Failed to read settings file {}: {}",
                path.display(),
                e
            ))
        })?;

        let mut settings: Settings = serde_json::from_str(&contents).map_err(|e| {
            ShieldError::Config(format!("Failed to parse settings file: {}", e))
        })?;
        settings.fill_defaults();
        Ok(settings)
    }

    /// Default settings with every scalar populated
    pub fn with_defaults() -> Self {
        let mut settings = Self::default();
        settings.fill_defaults();
        settings
    }

    fn fill_defaults(&mut self) {
        if self.endpoint_type.is_empty() {
            self.endpoint_type = "PC".to_string();
        }
        if self.otp_poll_interval_secs == 0 {
            self.otp_poll_interval_secs = 5;
        }
    }
}
