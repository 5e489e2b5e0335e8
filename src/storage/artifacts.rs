//! Best-effort removal of intermediate artifacts

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use tracing::debug;

/// Remove files and directories, ignoring anything that fails
///
/// Returns how many paths were actually removed.
pub fn remove_artifacts<P: AsRef<Path>>(paths: &[P]) -> usize {
    let mut removed = 0;

    for path in paths {
        let path = path.as_ref();
        let result = match fs::symlink_metadata(path) {
            Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
            Ok(_) => fs::remove_file(path),
            Err(e) if e.kind() == ErrorKind::NotFound => continue,
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                debug!("Cleaned up: {}", path.display());
                removed += 1;
            }
            Err(e) => debug!("Could not clean up {}: {}", path.display(), e),
        }
    }

    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_removes_files_and_directories() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("repo-mirror");
        fs::create_dir_all(dir.join("refs")).unwrap();
        fs::write(dir.join("HEAD"), "ref: refs/heads/main").unwrap();
        let file = temp_dir.path().join("repo-mirror.tar");
        fs::write(&file, b"tar").unwrap();

        let removed = remove_artifacts(&[&dir, &file]);

        assert_eq!(removed, 2);
        assert!(!dir.exists());
        assert!(!file.exists());
    }

    #[test]
    fn test_missing_paths_are_ignored() {
        let temp_dir = TempDir::new().unwrap();
        let removed = remove_artifacts(&[temp_dir.path().join("missing.tar.zst")]);
        assert_eq!(removed, 0);
    }
}
