//! Archive pipeline
//!
//! Turns a directory into a single zstd-compressed tar file and back:
//! `dir -> dir.tar -> dir.tar.zst`, and the inverse on restore.

pub mod bundle;
pub mod compression;

use std::fs;
use std::path::Path;

use tracing::warn;

pub use bundle::{create_tar_archive, extract_tar_archive};
pub use compression::{compress, decompress, COMPRESSION_LEVEL};

/// Total size in bytes of every file under `path`
///
/// Sub-paths that cannot be read are logged and count as zero.
pub fn directory_size(path: &Path) -> u64 {
    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) => {
            warn!("Could not get size for {}: {}", path.display(), e);
            return 0;
        }
    };

    if !meta.is_dir() {
        return if meta.is_file() { meta.len() } else { 0 };
    }

    match fs::read_dir(path) {
        Ok(entries) => entries
            .filter_map(|entry| match entry {
                Ok(entry) => Some(directory_size(&entry.path())),
                Err(e) => {
                    warn!("Could not read entry in {}: {}", path.display(), e);
                    None
                }
            })
            .sum(),
        Err(e) => {
            warn!("Could not get size for {}: {}", path.display(), e);
            0
        }
    }
}
