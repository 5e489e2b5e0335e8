//! Backup workflow
//!
//! mirror clone -> commit info -> tar -> zstd -> encrypt -> authenticate
//! -> upload. Every intermediate artifact is removed afterwards, whether
//! the run succeeded or not.

use std::fs;
use std::time::Instant;

use tracing::{error, info};

use crate::archive::{compress, create_tar_archive};
use crate::config::AppConfig;
use crate::crypto::encrypt_archive;
use crate::error::{ShieldError, ShieldResult};
use crate::git::{CommitInfo, GitOperations};
use crate::logging::NOTICE_TARGET;
use crate::remote::{AuthToken, RemoteBackupClient, UploadRecord, UploadRequest};
use crate::storage::remove_artifacts;

/// Result of a backup run
#[derive(Debug, Default)]
pub struct BackupOutcome {
    pub success: bool,
    pub message: String,
    /// Identifiers the vault assigned to the upload
    pub record: Option<UploadRecord>,
    /// Size of the tar archive
    pub file_size: u64,
    /// Size after zstd compression
    pub compressed_size: u64,
    /// Size of the encrypted envelope
    pub encrypted_size: u64,
    pub commit: Option<CommitInfo>,
    pub error: Option<ShieldError>,
}

impl BackupOutcome {
    fn failed(error: ShieldError) -> Self {
        Self {
            success: false,
            message: format!("Backup failed: {}", error),
            error: Some(error),
            ..Self::default()
        }
    }

    /// One-line description of the run
    pub fn summary(&self) -> String {
        match &self.record {
            Some(record) if self.success => format!(
                "Backup uploaded as {} ({} bytes archived, {} bytes encrypted)",
                record.record_id, self.file_size, self.encrypted_size
            ),
            _ => self.message.clone(),
        }
    }
}

/// Archives, encrypts and uploads the repository
pub struct BackupWorkflow<'a> {
    config: &'a AppConfig,
    git: &'a dyn GitOperations,
    remote: &'a dyn RemoteBackupClient,
}

impl<'a> BackupWorkflow<'a> {
    pub fn new(
        config: &'a AppConfig,
        git: &'a dyn GitOperations,
        remote: &'a dyn RemoteBackupClient,
    ) -> Self {
        Self {
            config,
            git,
            remote,
        }
    }

    /// Run the backup; never fails, the outcome says how it went
    pub fn execute(&self) -> BackupOutcome {
        info!("Starting backup workflow");
        let started = Instant::now();

        let outcome = match self.run() {
            Ok(outcome) => {
                info!(
                    "Backup workflow completed successfully in {:.1}s",
                    started.elapsed().as_secs_f64()
                );
                outcome
            }
            Err(e) => {
                error!("Backup workflow failed: {}", e);
                BackupOutcome::failed(e)
            }
        };

        self.cleanup();
        outcome
    }

    fn run(&self) -> ShieldResult<BackupOutcome> {
        let paths = &self.config.paths;
        let mirror_dir = paths.mirror_dir();

        info!("Step 1: Creating repository mirror clone");
        self.git.create_mirror_clone(paths.work_dir(), &mirror_dir)?;

        info!("Step 2: Gathering commit information");
        let commit = self.git.current_commit_info(paths.work_dir())?;

        info!("Step 3: Creating tar archive");
        let (tar_path, file_size) = create_tar_archive(&mirror_dir)?;

        info!("Step 4: Compressing archive with zstd");
        let (compressed_path, compressed_size) = compress(&tar_path)?;

        info!("Step 5: Encrypting compressed archive");
        let envelope = encrypt_archive(&compressed_path, &self.config.inputs.encryption_password)?;
        let encrypted_path = self.config.encrypted_file();
        fs::write(&encrypted_path, &envelope).map_err(|e| {
            ShieldError::Io(format!(
                "Failed to write {}: {}",
                encrypted_path.display(),
                e
            ))
        })?;
        let encrypted_size = envelope.len() as u64;

        info!("Step 6: Authenticating with the vault");
        let auth = self
            .remote
            .authenticate(&self.config.inputs.activation_code)?;

        info!("Step 7: Uploading backup");
        let file_name = encrypted_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let request = UploadRequest::new(envelope, file_name, file_size, commit.clone(), self.config);
        let record = self.remote.upload_backup(request, &auth.token)?;

        self.log_summary(&record, &commit, &auth);

        Ok(BackupOutcome {
            success: true,
            message: "Backup completed successfully".to_string(),
            record: Some(record),
            file_size,
            compressed_size,
            encrypted_size,
            commit: Some(commit),
            error: None,
        })
    }

    fn log_summary(&self, record: &UploadRecord, commit: &CommitInfo, auth: &AuthToken) {
        let context = &self.config.context;

        let mut lines = vec![
            "gitshield - Backup Summary".to_string(),
            String::new(),
            "Backup completed successfully!".to_string(),
            "--------------------------------------------------".to_string(),
            "Git Metadata".to_string(),
            format!("Repository: {}", context.repository()),
            format!("- Owner: {} [{}]", context.owner, context.owner_type),
            format!("- Event: {}", context.event_name),
            format!("- Ref:   {}", context.git_ref),
            format!("- Actor: {}", context.actor),
        ];

        if !commit.is_empty() {
            lines.extend([
                "--------------------------------------------------".to_string(),
                "Upload Metadata".to_string(),
                format!("- Commit:      {}", commit.hash),
                format!("- CommitShort: {}", commit.short_hash),
                format!("- Author:      {}", commit.author),
                format!("- Date:        {}", commit.date),
                format!("- Committer:   {}", commit.author),
                format!("- Message:     {}", commit.message),
            ]);
        }

        lines.extend([
            "--------------------------------------------------".to_string(),
            "API Response".to_string(),
            format!("- File version id: {}", record.record_id),
            format!(
                "- You can access the backed-up file from this link: {}/dashboard/file-management/{}/{}",
                self.config.settings.api.management_base_url.trim_end_matches('/'),
                auth.endpoint_id,
                record.directory_record_id
            ),
        ]);

        info!(target: NOTICE_TARGET, "{}", lines.join("\n"));
    }

    fn cleanup(&self) {
        let paths = &self.config.paths;
        remove_artifacts(&[
            paths.mirror_dir(),
            paths.tar_file(),
            paths.compressed_file(),
            self.config.encrypted_file(),
        ]);
    }
}
