//! Tar creation and staged extraction

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tar::{Archive, Builder};
use tracing::{debug, info};

use crate::error::{ShieldError, ShieldResult};

/// Archive a directory into `<source_dir>.tar`
///
/// Entries are rooted at the directory's own name, so extracting the
/// archive recreates the directory itself. Returns the archive path and
/// its size in bytes.
pub fn create_tar_archive(source_dir: &Path) -> ShieldResult<(PathBuf, u64)> {
    if !source_dir.is_dir() {
        return Err(ShieldError::NotADirectory(source_dir.to_path_buf()));
    }

    let dir_name = source_dir
        .file_name()
        .ok_or_else(|| ShieldError::NotADirectory(source_dir.to_path_buf()))?;
    let output = with_suffix(source_dir, ".tar");

    info!(
        "Creating tar archive from {} to {}",
        source_dir.display(),
        output.display()
    );

    let file = File::create(&output).map_err(|e| {
        ShieldError::Archive(format!("Failed to create {}: {}", output.display(), e))
    })?;

    let mut builder = Builder::new(BufWriter::new(file));
    builder.follow_symlinks(false);
    builder
        .append_dir_all(dir_name, source_dir)
        .map_err(|e| ShieldError::Archive(format!("Failed to add directory: {}", e)))?;

    let mut writer = builder
        .into_inner()
        .map_err(|e| ShieldError::Archive(format!("Failed to finish archive: {}", e)))?;
    writer
        .flush()
        .map_err(|e| ShieldError::Archive(format!("Failed to flush archive: {}", e)))?;
    drop(writer);

    let size = fs::metadata(&output)?.len();
    info!("Tar archive created successfully. Size: {} bytes", size);

    Ok((output, size))
}

/// Unpack a tar archive into `target_dir`
///
/// The archive is first unpacked into a staging directory inside the
/// target; entries are only moved into place once the whole archive has
/// unpacked. Existing entries with the same name are replaced.
pub fn extract_tar_archive(tar_path: &Path, target_dir: &Path) -> ShieldResult<()> {
    info!(
        "Extracting tar archive {} to {}",
        tar_path.display(),
        target_dir.display()
    );

    fs::create_dir_all(target_dir).map_err(|e| {
        ShieldError::Archive(format!(
            "Failed to create {}: {}",
            target_dir.display(),
            e
        ))
    })?;

    let file = File::open(tar_path).map_err(|e| {
        ShieldError::Archive(format!("Failed to open {}: {}", tar_path.display(), e))
    })?;

    let staging = tempfile::Builder::new()
        .prefix(".extract-")
        .tempdir_in(target_dir)
        .map_err(|e| ShieldError::Archive(format!("Failed to create staging directory: {}", e)))?;

    let mut archive = Archive::new(BufReader::new(file));
    archive.set_preserve_permissions(true);
    archive
        .unpack(staging.path())
        .map_err(|e| ShieldError::Archive(format!("Failed to unpack archive: {}", e)))?;

    for entry in fs::read_dir(staging.path())? {
        let entry = entry?;
        let destination = target_dir.join(entry.file_name());

        if let Ok(meta) = fs::symlink_metadata(&destination) {
            debug!("Replacing existing {}", destination.display());
            if meta.is_dir() {
                fs::remove_dir_all(&destination)?;
            } else {
                fs::remove_file(&destination)?;
            }
        }

        fs::rename(entry.path(), &destination).map_err(|e| {
            ShieldError::Archive(format!(
                "Failed to move {} into place: {}",
                destination.display(),
                e
            ))
        })?;
    }

    info!("Tar archive extracted successfully");
    Ok(())
}

/// `path` with `suffix` appended to its final component
pub(crate) fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_tree(root: &Path) -> PathBuf {
        let dir = root.join("repo-mirror");
        fs::create_dir_all(dir.join("refs").join("heads")).unwrap();
        fs::write(dir.join("HEAD"), "ref: refs/heads/main\n").unwrap();
        fs::write(dir.join("refs").join("heads").join("main"), "abc123\n").unwrap();
        dir
    }

    #[test]
    fn test_create_tar_archive() {
        let temp_dir = TempDir::new().unwrap();
        let dir = sample_tree(temp_dir.path());

        let (tar_path, size) = create_tar_archive(&dir).unwrap();

        assert_eq!(tar_path, temp_dir.path().join("repo-mirror.tar"));
        assert!(size > 0);
        assert_eq!(fs::metadata(&tar_path).unwrap().len(), size);
    }

    #[test]
    fn test_entries_rooted_at_directory_name() {
        let temp_dir = TempDir::new().unwrap();
        let dir = sample_tree(temp_dir.path());
        let (tar_path, _) = create_tar_archive(&dir).unwrap();

        let mut archive = Archive::new(File::open(&tar_path).unwrap());
        for entry in archive.entries().unwrap() {
            let entry = entry.unwrap();
            let path = entry.path().unwrap().into_owned();
            assert!(path.starts_with("repo-mirror"), "unexpected entry {:?}", path);
        }
    }

    #[test]
    fn test_not_a_directory() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("plain.txt");
        fs::write(&file, "x").unwrap();

        let result = create_tar_archive(&file);
        assert!(matches!(result, Err(ShieldError::NotADirectory(_))));

        let result = create_tar_archive(&temp_dir.path().join("missing"));
        assert!(matches!(result, Err(ShieldError::NotADirectory(_))));
    }

    #[test]
    fn test_extract_restores_tree() {
        let source = TempDir::new().unwrap();
        let dir = sample_tree(source.path());
        let (tar_path, _) = create_tar_archive(&dir).unwrap();

        let target = TempDir::new().unwrap();
        let restore_dir = target.path().join("restore");
        extract_tar_archive(&tar_path, &restore_dir).unwrap();

        let restored = restore_dir.join("repo-mirror");
        assert_eq!(
            fs::read_to_string(restored.join("HEAD")).unwrap(),
            "ref: refs/heads/main\n"
        );
        assert_eq!(
            fs::read_to_string(restored.join("refs").join("heads").join("main")).unwrap(),
            "abc123\n"
        );

        // Staging directory is gone
        let leftovers: Vec<_> = fs::read_dir(&restore_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, vec![std::ffi::OsString::from("repo-mirror")]);
    }

    #[test]
    fn test_extract_replaces_existing_entry() {
        let source = TempDir::new().unwrap();
        let dir = sample_tree(source.path());
        let (tar_path, _) = create_tar_archive(&dir).unwrap();

        let target = TempDir::new().unwrap();
        let stale = target.path().join("repo-mirror");
        fs::create_dir_all(&stale).unwrap();
        fs::write(stale.join("stale"), "old").unwrap();

        extract_tar_archive(&tar_path, target.path()).unwrap();

        assert!(!stale.join("stale").exists());
        assert!(stale.join("HEAD").exists());
    }

    #[test]
    fn test_extract_garbage_moves_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let bogus = temp_dir.path().join("bogus.tar");
        fs::write(&bogus, vec![0xAB; 1024]).unwrap();

        let target = temp_dir.path().join("out");
        let result = extract_tar_archive(&bogus, &target);

        assert!(matches!(result, Err(ShieldError::Archive(_))));
        assert_eq!(fs::read_dir(&target).unwrap().count(), 0);
    }
}
