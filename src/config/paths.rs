//! Path management for gitshield
//!
//! Every intermediate artifact of a run lives in the work directory
//! (normally the checkout root):
//!
//! - `repo-mirror/`: bare mirror clone
//! - `repo-mirror.tar`: uncompressed archive
//! - `repo-mirror.tar.zst`: compressed archive
//! - `{repo}.tar.zst.enc`: encrypted envelope
//!
//! The Actions suspension state lives outside the work directory so it
//! survives the cleanup of a failed run.

use std::path::{Path, PathBuf};

use super::settings::FileSettings;
use crate::crypto::encrypted_file_name;

/// Manages all paths used during a backup or restore run
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    /// Directory the artifacts are written to and restored into
    work_dir: PathBuf,
    /// Artifact names
    files: FileSettings,
    /// Durable suspension state file
    suspension_state_file: PathBuf,
}

impl ArtifactPaths {
    /// Create paths rooted at the given work directory
    pub fn new(work_dir: impl Into<PathBuf>, files: FileSettings) -> Self {
        let suspension_state_file = files
            .suspension_state_file
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("actions_permissions.json"));
        Self {
            work_dir: work_dir.into(),
            files,
            suspension_state_file,
        }
    }

    /// Create paths with default artifact names (useful for testing)
    pub fn with_work_dir(work_dir: impl Into<PathBuf>) -> Self {
        let work_dir = work_dir.into();
        let files = FileSettings {
            suspension_state_file: Some(work_dir.join("actions_permissions.json")),
            ..FileSettings::default()
        };
        Self::new(work_dir, files)
    }

    /// Get the work directory
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Get the mirror clone directory
    pub fn mirror_dir(&self) -> PathBuf {
        self.work_dir.join(&self.files.source_archive_dir)
    }

    /// Get the tar archive path
    pub fn tar_file(&self) -> PathBuf {
        self.work_dir.join(format!("{}.tar", self.files.source_archive_dir))
    }

    /// Get the compressed archive path
    pub fn compressed_file(&self) -> PathBuf {
        self.work_dir.join(format!("{}.tar.zst", self.files.source_archive_dir))
    }

    /// Get the encrypted envelope path for a repository
    pub fn encrypted_file(&self, repository: &str, password: &str) -> PathBuf {
        self.work_dir.join(encrypted_file_name(repository, password))
    }

    /// Get the durable Actions suspension state file
    pub fn suspension_state_file(&self) -> &Path {
        &self.suspension_state_file
    }
}
