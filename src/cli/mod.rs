//! CLI command handlers
//!
//! This module contains the clap argument types and the handlers that
//! turn them into a configured workflow run.

pub mod actions;
pub mod run;

use std::path::PathBuf;

use clap::Args;

use crate::config::{ArtifactPaths, Settings};
use crate::error::{ShieldError, ShieldResult};
use crate::logging::LogFormat;

pub use actions::{handle_resume_actions, ResumeActionsArgs};
pub use run::{handle_run, RunArgs};

/// Options shared by every command
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Settings file (JSON); built-in defaults are used when omitted
    #[arg(long, global = true, env = "GITSHIELD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory to back up from and restore into (defaults to the current directory)
    #[arg(long, global = true, env = "GITHUB_WORKSPACE")]
    pub work_dir: Option<PathBuf>,

    /// Log output format (auto-detected when omitted)
    #[arg(long, global = true, value_enum)]
    pub log_format: Option<LogFormat>,
}

impl GlobalArgs {
    /// Load settings from `--config`, or the defaults
    pub fn settings(&self) -> ShieldResult<Settings> {
        Settings::load_or_default(self.config.as_deref())
    }

    /// Artifact paths rooted at the work directory
    pub fn paths(&self, settings: &Settings) -> ShieldResult<ArtifactPaths> {
        let work_dir = match &self.work_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().map_err(|e| {
                ShieldError::Config(format!("Cannot determine working directory: {}", e))
            })?,
        };
        Ok(ArtifactPaths::new(work_dir, settings.files.clone()))
    }
}
