//! Configuration module for gitshield
//!
//! This module provides:
//! - Run inputs (credentials, action, OTP method)
//! - Static settings (endpoints, git identity, upload attributes)
//! - Artifact path resolution
//! - CI run context

pub mod context;
pub mod inputs;
pub mod paths;
pub mod settings;

pub use context::GithubContext;
pub use inputs::{Action, ActionInputs, OtpMethod};
pub use paths::ArtifactPaths;
pub use settings::Settings;

/// Everything a workflow needs to know about the run
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub inputs: ActionInputs,
    pub settings: Settings,
    pub context: GithubContext,
    pub paths: ArtifactPaths,
}

impl AppConfig {
    /// Path of the encrypted envelope for this repository
    pub fn encrypted_file(&self) -> std::path::PathBuf {
        self.paths
            .encrypted_file(&self.context.repository(), &self.inputs.encryption_password)
    }
}
