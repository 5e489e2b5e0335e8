//! Suspend and resume GitHub Actions around a restore
//!
//! Pushing a restored history would otherwise trigger every workflow in
//! it. The original permissions are recorded in memory and in a JSON file
//! before Actions are disabled, so a later run can put them back even if
//! this process dies mid-restore.

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use super::{ActionsApi, ActionsPermissions};
use crate::error::{ShieldError, ShieldResult};
use crate::storage::{read_json_optional, write_json_atomic};

/// Attempts made to re-enable Actions after a failed resume
pub const RESUME_RETRY_ATTEMPTS: u32 = 3;

/// Durable record of the permissions in place before suspension
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuspensionState {
    /// `owner/repo` the permissions were read from
    #[serde(default)]
    pub repository: String,
    pub original_permissions: ActionsPermissions,
    pub suspended_at: DateTime<Utc>,
    pub storage_location: PathBuf,
}

/// How a resume ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeOutcome {
    /// The recorded permissions (or the default) were applied
    Restored,
    /// Restoring failed, but a plain re-enable worked on this attempt
    EnabledOnRetry(u32),
    /// Every attempt failed; Actions may still be disabled
    Failed,
}

impl ResumeOutcome {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::Failed)
    }
}

/// Disables Actions and puts them back afterwards
pub struct ActionsSuspensionManager<'a> {
    api: &'a dyn ActionsApi,
    repository: String,
    state_file: PathBuf,
    state: Option<SuspensionState>,
    retry_backoff: Duration,
}

impl<'a> ActionsSuspensionManager<'a> {
    pub fn new(
        api: &'a dyn ActionsApi,
        state_file: impl Into<PathBuf>,
        repository: impl Into<String>,
    ) -> Self {
        Self {
            api,
            repository: repository.into(),
            state_file: state_file.into(),
            state: None,
            retry_backoff: Duration::from_secs(2),
        }
    }

    /// Override the pause between resume retries
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    pub fn state_file(&self) -> &Path {
        &self.state_file
    }

    /// Whether an unfinished suspension of this repository is on disk
    ///
    /// A state file written for another repository does not count. An
    /// unreadable file does, so that resuming clears it.
    pub fn has_pending_state(&self) -> bool {
        match read_json_optional::<SuspensionState, _>(&self.state_file) {
            Ok(Some(state)) => state.repository == self.repository,
            Ok(None) => false,
            Err(_) => true,
        }
    }

    /// Owner of a state file that belongs to a different repository
    pub fn foreign_state_owner(&self) -> Option<String> {
        match read_json_optional::<SuspensionState, _>(&self.state_file) {
            Ok(Some(state)) if state.repository != self.repository => Some(state.repository),
            _ => None,
        }
    }

    /// Record the current permissions, then disable Actions
    pub fn suspend(&mut self) -> ShieldResult<()> {
        info!("Suspending GitHub Actions for {}", self.repository);

        if let Some(owner) = self.foreign_state_owner() {
            return Err(ShieldError::Suspension(format!(
                "{} holds unresolved suspension state for {}; resume Actions there first \
                 or configure a different suspension state file",
                self.state_file.display(),
                owner
            )));
        }

        let original_permissions = self.api.actions_permissions().map_err(|e| {
            ShieldError::Suspension(format!("Failed to read current permissions: {}", e))
        })?;

        let state = SuspensionState {
            repository: self.repository.clone(),
            original_permissions,
            suspended_at: Utc::now(),
            storage_location: self.state_file.clone(),
        };
        write_json_atomic(&self.state_file, &state)?;
        self.state = Some(state);

        if let Err(e) = self.api.set_actions_permissions(&ActionsPermissions::disabled()) {
            // Nothing was disabled, so there is nothing to resume
            self.state = None;
            self.remove_state_file();
            return Err(ShieldError::Suspension(format!(
                "Failed to disable GitHub Actions: {}",
                e
            )));
        }

        info!("GitHub Actions suspended successfully");
        Ok(())
    }

    /// Put the recorded permissions back
    ///
    /// Never fails: problems are logged and reported through the outcome.
    pub fn resume(&mut self) -> ResumeOutcome {
        info!("Resuming GitHub Actions for {}", self.repository);

        let state = self.state.take().or_else(|| self.load_state());
        let permissions = match state {
            Some(state) => state.original_permissions,
            None => ActionsPermissions::enabled(),
        };

        let result = self.api.set_actions_permissions(&permissions);
        if self.has_pending_state() {
            self.remove_state_file();
        }

        match result {
            Ok(()) => {
                info!("GitHub Actions resumed successfully");
                ResumeOutcome::Restored
            }
            Err(e) => {
                error!("Failed to resume GitHub Actions: {}", e);
                self.retry_enable()
            }
        }
    }

    fn retry_enable(&self) -> ResumeOutcome {
        for attempt in 1..=RESUME_RETRY_ATTEMPTS {
            info!("Retry attempt {} to resume GitHub Actions", attempt);
            match self.api.set_actions_permissions(&ActionsPermissions::enabled()) {
                Ok(()) => {
                    info!("GitHub Actions resumed on retry");
                    return ResumeOutcome::EnabledOnRetry(attempt);
                }
                Err(e) => {
                    warn!("Retry {} failed: {}", attempt, e);
                    if attempt < RESUME_RETRY_ATTEMPTS {
                        thread::sleep(self.retry_backoff);
                    }
                }
            }
        }

        error!(
            "All retry attempts failed - GitHub Actions may remain disabled. \
             Re-enable them in the repository settings or run `gitshield resume-actions`."
        );
        ResumeOutcome::Failed
    }

    fn load_state(&self) -> Option<SuspensionState> {
        match read_json_optional::<SuspensionState, _>(&self.state_file) {
            Ok(Some(state)) if state.repository != self.repository => {
                warn!(
                    "Suspension state in {} belongs to {}, leaving it in place and \
                     enabling Actions with default permissions",
                    self.state_file.display(),
                    state.repository
                );
                None
            }
            Ok(Some(state)) => {
                debug!("Loaded suspension state from {}", self.state_file.display());
                Some(state)
            }
            Ok(None) => {
                warn!("No suspension state found, enabling Actions with default permissions");
                None
            }
            Err(e) => {
                warn!(
                    "Could not load suspension state ({}), enabling Actions with default permissions",
                    e
                );
                None
            }
        }
    }

    fn remove_state_file(&self) {
        if let Err(e) = fs::remove_file(&self.state_file) {
            debug!(
                "Could not remove {} (it may not exist): {}",
                self.state_file.display(),
                e
            );
        }
    }
}
