//! Restore workflow
//!
//! authenticate -> OTP -> download -> decrypt -> zstd -> untar -> prepare
//! history -> (suspend Actions) -> push -> (resume Actions).
//!
//! If Actions were suspended during the run, they are resumed exactly once
//! on every exit path, before artifacts are cleaned up.

use std::fs;
use std::time::{Duration, Instant};

use tracing::{error, info, warn};

use crate::archive::{decompress, extract_tar_archive};
use crate::config::AppConfig;
use crate::crypto::decrypt_backup;
use crate::error::{ShieldError, ShieldResult};
use crate::git::GitOperations;
use crate::github::{ActionsApi, ActionsSuspensionManager, ResumeOutcome};
use crate::logging::NOTICE_TARGET;
use crate::otp::OtpVerificationFlow;
use crate::remote::RemoteBackupClient;
use crate::storage::remove_artifacts;

/// Result of a restore run
#[derive(Debug, Default)]
pub struct RestoreOutcome {
    pub success: bool,
    pub message: String,
    pub file_version_id: Option<String>,
    /// Whether Actions were suspended while pushing
    pub actions_suspended: bool,
    /// How the resume went, when one was needed
    pub resume: Option<ResumeOutcome>,
    pub error: Option<ShieldError>,
}

impl RestoreOutcome {
    /// One-line description of the run
    pub fn summary(&self) -> String {
        if !self.success {
            return self.message.clone();
        }
        let mut summary = format!(
            "Restored file version {}",
            self.file_version_id.as_deref().unwrap_or("unknown")
        );
        if self.actions_suspended {
            summary.push_str(" (Actions suspended during push)");
        }
        summary
    }
}

/// Downloads, decrypts and pushes a backup back to the repository
pub struct RestoreWorkflow<'a> {
    config: &'a AppConfig,
    git: &'a dyn GitOperations,
    remote: &'a dyn RemoteBackupClient,
    /// Repository API for Actions suspension; absent without a restore token
    actions: Option<&'a dyn ActionsApi>,
    poll_interval: Duration,
    resume_backoff: Duration,
}

impl<'a> RestoreWorkflow<'a> {
    pub fn new(
        config: &'a AppConfig,
        git: &'a dyn GitOperations,
        remote: &'a dyn RemoteBackupClient,
        actions: Option<&'a dyn ActionsApi>,
    ) -> Self {
        Self {
            config,
            git,
            remote,
            actions,
            poll_interval: Duration::from_secs(config.settings.otp_poll_interval_secs),
            resume_backoff: Duration::from_secs(2),
        }
    }

    /// Override the OTP poll interval
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Override the pause between resume retries
    pub fn with_resume_backoff(mut self, backoff: Duration) -> Self {
        self.resume_backoff = backoff;
        self
    }

    /// Run the restore; never fails, the outcome says how it went
    pub fn execute(&self) -> RestoreOutcome {
        info!("Starting restore workflow");
        let started = Instant::now();

        let mut suspension = self.actions.map(|api| {
            ActionsSuspensionManager::new(
                api,
                self.config.paths.suspension_state_file(),
                self.config.context.repository(),
            )
                .with_retry_backoff(self.resume_backoff)
        });

        if let Some(manager) = suspension.as_mut() {
            recover_stale_suspension(manager);
        }

        let mut suspended = false;
        let result = self.run(suspension.as_mut(), &mut suspended);

        let resume = match suspension.as_mut() {
            Some(manager) if suspended => {
                if result.is_err() {
                    info!("Attempting to resume GitHub Actions after failure");
                } else {
                    info!("Step 11: Resuming GitHub Actions");
                }
                Some(manager.resume())
            }
            _ => None,
        };

        self.cleanup();

        match result {
            Ok(file_version_id) => {
                self.log_summary(&file_version_id, suspended, started.elapsed());
                info!("Restore workflow completed successfully");
                RestoreOutcome {
                    success: true,
                    message: "Restore completed successfully".to_string(),
                    file_version_id: Some(file_version_id),
                    actions_suspended: suspended,
                    resume,
                    error: None,
                }
            }
            Err(e) => {
                error!("Restore workflow failed: {}", e);
                RestoreOutcome {
                    success: false,
                    message: format!("Restore failed: {}", e),
                    file_version_id: self.config.inputs.file_version_id.clone(),
                    actions_suspended: suspended,
                    resume,
                    error: Some(e),
                }
            }
        }
    }

    fn run(
        &self,
        suspension: Option<&mut ActionsSuspensionManager<'a>>,
        suspended: &mut bool,
    ) -> ShieldResult<String> {
        let inputs = &self.config.inputs;
        let paths = &self.config.paths;

        let file_version_id = inputs
            .file_version_id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| {
                ShieldError::Validation(
                    "Input 'file_version_id' is required when action is 'restore'".to_string(),
                )
            })?;

        info!("Step 1: Authenticating with the vault");
        let auth = self.remote.authenticate(&inputs.activation_code)?;

        info!("Step 2: Requesting OTP verification");
        let mut otp = OtpVerificationFlow::new(self.remote, &self.config.settings.api.management_base_url)
            .with_poll_interval(self.poll_interval);
        otp.set_auth_token(&auth.token);
        let challenge = otp.request_otp(inputs.otp_method)?;

        info!("Step 3: Waiting for OTP verification");
        if !otp.wait_for_otp_verification(&challenge.unique_key, challenge.expires_at)? {
            return Err(ShieldError::Otp(
                "OTP verification failed or timed out".to_string(),
            ));
        }

        info!("Step 4: Downloading backup archive");
        let envelope =
            self.remote
                .download_backup(&file_version_id, &auth.token, &challenge.unique_key)?;

        info!("Step 5: Decrypting backup archive");
        let compressed = decrypt_backup(&envelope, &inputs.encryption_password)?;
        let compressed_path = paths.compressed_file();
        fs::write(&compressed_path, &compressed).map_err(|e| {
            ShieldError::Io(format!(
                "Failed to write {}: {}",
                compressed_path.display(),
                e
            ))
        })?;

        info!("Step 6: Decompressing backup archive");
        let tar_path = decompress(&compressed_path)?;

        info!("Step 7: Extracting repository archive");
        extract_tar_archive(&tar_path, paths.work_dir())?;

        let repo = paths.mirror_dir();
        let has_elevated_token = inputs.has_elevated_token();

        if has_elevated_token {
            info!("Step 8: Syncing remote branches (restore token available)");
            self.git.sync_remote_branches(&repo)?;
        } else {
            info!("Step 8: Filtering workflow directory (default token)");
            self.git.filter_workflow_directory(&repo)?;
        }

        if inputs.suspend_actions && has_elevated_token {
            match suspension {
                Some(manager) => {
                    info!("Step 9: Suspending GitHub Actions");
                    manager.suspend()?;
                    *suspended = true;
                }
                None => warn!("No repository API available, GitHub Actions stay active during restore"),
            }
        }

        info!("Step 10: Configuring git and pushing to repository");
        self.git
            .configure_and_push(&repo, self.config, has_elevated_token)?;

        Ok(file_version_id)
    }

    fn log_summary(&self, file_version_id: &str, suspended: bool, elapsed: Duration) {
        let actions_line = if suspended {
            "- GitHub Actions were suspended and resumed"
        } else {
            "- GitHub Actions remained active during restore"
        };

        let summary = [
            "gitshield - Restore Summary".to_string(),
            String::new(),
            "Restore completed successfully".to_string(),
            format!("- Repository: {}", self.config.context.repository()),
            format!("- File Version ID: {}", file_version_id),
            format!("- Execution Time: {:.1}s", elapsed.as_secs_f64()),
            String::new(),
            "- OTP verification completed".to_string(),
            "- Backup downloaded and decrypted".to_string(),
            "- Git history and branches restored".to_string(),
            actions_line.to_string(),
            String::new(),
            "Important: the previous repository history has been overwritten with the restored backup."
                .to_string(),
        ]
        .join("\n");

        info!(target: NOTICE_TARGET, "{}", summary);
    }

    fn cleanup(&self) {
        let paths = &self.config.paths;
        remove_artifacts(&[paths.mirror_dir(), paths.tar_file(), paths.compressed_file()]);
    }
}

/// Put back Actions permissions left suspended by a run that never finished
fn recover_stale_suspension(manager: &mut ActionsSuspensionManager<'_>) {
    if let Some(owner) = manager.foreign_state_owner() {
        warn!(
            "Actions suspension state at {} belongs to {}, leaving it in place",
            manager.state_file().display(),
            owner
        );
        return;
    }
    if !manager.has_pending_state() {
        return;
    }

    warn!(
        "Found Actions suspension state from an earlier run at {}, resuming it first",
        manager.state_file().display()
    );
    let outcome = manager.resume();
    if !outcome.is_enabled() {
        warn!("Could not recover the earlier Actions suspension");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    use chrono::Utc;
    use tempfile::TempDir;

    use crate::archive::{compress, create_tar_archive};
    use crate::config::Action;
    use crate::crypto::encrypt;
    use crate::crypto::hash_password;
    use crate::git::testing::FakeGit;
    use crate::github::testing::FakeActionsApi;
    use crate::github::{ActionsPermissions, SuspensionState};
    use crate::remote::testing::FakeRemote;
    use crate::storage::write_json_atomic;
    use crate::workflow::testing::test_config;

    /// Build the envelope a backup of a small mirror would have uploaded
    fn backup_envelope(password: &str) -> Vec<u8> {
        let source = TempDir::new().unwrap();
        let mirror = source.path().join("repo-mirror");
        fs::create_dir_all(mirror.join("refs").join("heads")).unwrap();
        fs::write(mirror.join("HEAD"), "ref: refs/heads/main\n").unwrap();
        fs::write(mirror.join("refs").join("heads").join("main"), "abc123\n").unwrap();

        let (tar_path, _) = create_tar_archive(&mirror).unwrap();
        let (zst_path, _) = compress(&tar_path).unwrap();
        encrypt(&fs::read(zst_path).unwrap(), &hash_password(password)).unwrap()
    }

    fn remote_with_backup() -> FakeRemote {
        let remote = FakeRemote::default();
        *remote.download.borrow_mut() = Some(backup_envelope("Secret123!"));
        remote
    }

    fn restricted_permissions() -> ActionsPermissions {
        ActionsPermissions {
            enabled: true,
            allowed_actions: Some("local_only".to_string()),
            selected_actions_url: None,
        }
    }

    fn workflow<'a>(
        config: &'a AppConfig,
        git: &'a FakeGit,
        remote: &'a FakeRemote,
        actions: Option<&'a FakeActionsApi>,
    ) -> RestoreWorkflow<'a> {
        RestoreWorkflow::new(
            config,
            git,
            remote,
            actions.map(|api| api as &dyn ActionsApi),
        )
        .with_poll_interval(Duration::from_millis(1))
        .with_resume_backoff(Duration::from_millis(1))
    }

    fn assert_artifacts_removed(config: &AppConfig) {
        let paths = &config.paths;
        assert!(!paths.mirror_dir().exists());
        assert!(!paths.tar_file().exists());
        assert!(!paths.compressed_file().exists());
    }

    fn elevated_config(work_dir: &Path) -> AppConfig {
        let mut config = test_config(work_dir, Action::Restore);
        config.inputs.restore_token = Some("ghp_elevated".into());
        config
    }

    #[test]
    fn test_default_token_filters_before_push_and_never_suspends() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(temp_dir.path(), Action::Restore);
        let git = FakeGit::default();
        let remote = remote_with_backup();
        let api = FakeActionsApi::new(restricted_permissions());

        let outcome = workflow(&config, &git, &remote, Some(&api)).execute();

        assert!(outcome.success, "{}", outcome.message);
        assert_eq!(outcome.file_version_id.as_deref(), Some("file-version-1"));
        assert_eq!(git.calls(), vec!["filter", "push:default"]);
        assert!(!outcome.actions_suspended);
        assert!(outcome.resume.is_none());
        assert!(api.set_calls.borrow().is_empty());
        assert_artifacts_removed(&config);
    }

    #[test]
    fn test_elevated_token_suspends_and_restores_permissions() {
        let temp_dir = TempDir::new().unwrap();
        let config = elevated_config(temp_dir.path());
        let git = FakeGit::default();
        let remote = remote_with_backup();
        let api = FakeActionsApi::new(restricted_permissions());

        let outcome = workflow(&config, &git, &remote, Some(&api)).execute();

        assert!(outcome.success, "{}", outcome.message);
        assert_eq!(git.calls(), vec!["sync", "push:elevated"]);
        assert!(outcome.actions_suspended);
        assert_eq!(outcome.resume, Some(ResumeOutcome::Restored));
        assert_eq!(
            *api.set_calls.borrow(),
            vec![ActionsPermissions::disabled(), restricted_permissions()]
        );
        assert!(!config.paths.suspension_state_file().exists());
        assert_artifacts_removed(&config);
    }

    #[test]
    fn test_suspension_can_be_turned_off() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = elevated_config(temp_dir.path());
        config.inputs.suspend_actions = false;
        let git = FakeGit::default();
        let remote = remote_with_backup();
        let api = FakeActionsApi::new(restricted_permissions());

        let outcome = workflow(&config, &git, &remote, Some(&api)).execute();

        assert!(outcome.success);
        assert!(!outcome.actions_suspended);
        assert!(api.set_calls.borrow().is_empty());
    }

    #[test]
    fn test_push_failure_after_suspension_resumes_exactly_once() {
        let temp_dir = TempDir::new().unwrap();
        let config = elevated_config(temp_dir.path());
        let git = FakeGit {
            fail_push: true,
            ..FakeGit::default()
        };
        let remote = remote_with_backup();
        let api = FakeActionsApi::new(restricted_permissions());

        let outcome = workflow(&config, &git, &remote, Some(&api)).execute();

        assert!(!outcome.success);
        assert!(outcome.error.as_ref().unwrap().is_git());
        assert!(outcome.actions_suspended);
        assert_eq!(outcome.resume, Some(ResumeOutcome::Restored));
        // One disable, one restore
        assert_eq!(
            *api.set_calls.borrow(),
            vec![ActionsPermissions::disabled(), restricted_permissions()]
        );
        assert_eq!(*api.current.borrow(), restricted_permissions());
        assert!(!config.paths.suspension_state_file().exists());
        assert_artifacts_removed(&config);
    }

    #[test]
    fn test_otp_timeout_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(temp_dir.path(), Action::Restore);
        let git = FakeGit::default();
        let remote = FakeRemote {
            otp_ttl_secs: 0,
            ..remote_with_backup()
        };

        let outcome = workflow(&config, &git, &remote, None).execute();

        assert!(!outcome.success);
        assert!(matches!(outcome.error, Some(ShieldError::Otp(_))));
        assert!(outcome.message.contains("timed out"));
        assert!(git.calls().is_empty());
    }

    #[test]
    fn test_wrong_password_fails_before_git() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(temp_dir.path(), Action::Restore);
        let git = FakeGit::default();
        let remote = FakeRemote::default();
        *remote.download.borrow_mut() = Some(backup_envelope("Different456?"));

        let outcome = workflow(&config, &git, &remote, None).execute();

        assert!(!outcome.success);
        assert!(outcome.error.as_ref().unwrap().is_crypto() || matches!(outcome.error, Some(ShieldError::Decompression(_))));
        assert!(git.calls().is_empty());
        assert_artifacts_removed(&config);
    }

    #[test]
    fn test_download_failure() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(temp_dir.path(), Action::Restore);
        let git = FakeGit::default();
        let remote = FakeRemote::default();

        let outcome = workflow(&config, &git, &remote, None).execute();

        assert!(!outcome.success);
        assert!(outcome.message.contains("Failed to download backup"));
        assert!(outcome.error.as_ref().unwrap().is_remote());
    }

    #[test]
    fn test_missing_file_version_id() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = test_config(temp_dir.path(), Action::Restore);
        config.inputs.file_version_id = None;
        let git = FakeGit::default();
        let remote = remote_with_backup();

        let outcome = workflow(&config, &git, &remote, None).execute();

        assert!(!outcome.success);
        assert!(outcome.error.as_ref().unwrap().is_validation());
        assert_eq!(remote.verify_calls.get(), 0);
    }

    #[test]
    fn test_stale_suspension_is_recovered_first() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(temp_dir.path(), Action::Restore);
        let state = SuspensionState {
            repository: "octo/widgets".to_string(),
            original_permissions: restricted_permissions(),
            suspended_at: Utc::now(),
            storage_location: config.paths.suspension_state_file().to_path_buf(),
        };
        write_json_atomic(config.paths.suspension_state_file(), &state).unwrap();

        let git = FakeGit::default();
        let remote = remote_with_backup();
        let api = FakeActionsApi::new(ActionsPermissions::disabled());

        let outcome = workflow(&config, &git, &remote, Some(&api)).execute();

        assert!(outcome.success);
        assert_eq!(*api.set_calls.borrow(), vec![restricted_permissions()]);
        assert!(!config.paths.suspension_state_file().exists());
    }

    #[test]
    fn test_suspension_state_of_other_repository_is_left_alone() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(temp_dir.path(), Action::Restore);
        let state = SuspensionState {
            repository: "octo/gadgets".to_string(),
            original_permissions: ActionsPermissions::disabled(),
            suspended_at: Utc::now(),
            storage_location: config.paths.suspension_state_file().to_path_buf(),
        };
        write_json_atomic(config.paths.suspension_state_file(), &state).unwrap();

        let git = FakeGit::default();
        let remote = remote_with_backup();
        let api = FakeActionsApi::new(ActionsPermissions::enabled());

        let outcome = workflow(&config, &git, &remote, Some(&api)).execute();

        assert!(outcome.success);
        assert!(api.set_calls.borrow().is_empty());
        assert_eq!(*api.current.borrow(), ActionsPermissions::enabled());
        assert!(config.paths.suspension_state_file().exists());
    }
}
