//! zstd compression of archive files

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use super::bundle::with_suffix;
use crate::error::{ShieldError, ShieldResult};

/// zstd level used for backups
pub const COMPRESSION_LEVEL: i32 = 10;

const ZSTD_SUFFIX: &str = ".zst";

/// Compress `path` into `<path>.zst`, returning the output path and size
pub fn compress(path: &Path) -> ShieldResult<(PathBuf, u64)> {
    let output = with_suffix(path, ZSTD_SUFFIX);
    info!(
        "Compressing {} with zstd to {}",
        path.display(),
        output.display()
    );

    let input = File::open(path)
        .map_err(|e| ShieldError::Io(format!("Failed to open {}: {}", path.display(), e)))?;
    let file = File::create(&output)
        .map_err(|e| ShieldError::Io(format!("Failed to create {}: {}", output.display(), e)))?;

    let mut writer = BufWriter::new(file);
    zstd::stream::copy_encode(BufReader::new(input), &mut writer, COMPRESSION_LEVEL)
        .and_then(|_| writer.flush())
        .map_err(|e| {
            let _ = fs::remove_file(&output);
            ShieldError::Archive(format!("Failed to compress with zstd: {}", e))
        })?;
    drop(writer);

    let size = fs::metadata(&output)?.len();
    info!("Zstd compression completed. Compressed size: {} bytes", size);

    Ok((output, size))
}

/// Decompress a `.zst` file next to itself, returning the output path
///
/// The output is `path` with the `.zst` suffix removed. Input that was not
/// produced by zstd fails with a decompression error and leaves no output.
pub fn decompress(path: &Path) -> ShieldResult<PathBuf> {
    let output = path
        .to_str()
        .and_then(|p| p.strip_suffix(ZSTD_SUFFIX))
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
        .ok_or_else(|| {
            ShieldError::Decompression(format!(
                "{} does not have a {} suffix",
                path.display(),
                ZSTD_SUFFIX
            ))
        })?;

    info!(
        "Decompressing {} with zstd to {}",
        path.display(),
        output.display()
    );

    let input = File::open(path)
        .map_err(|e| ShieldError::Io(format!("Failed to open {}: {}", path.display(), e)))?;
    let file = File::create(&output)
        .map_err(|e| ShieldError::Io(format!("Failed to create {}: {}", output.display(), e)))?;

    let mut writer = BufWriter::new(file);
    zstd::stream::copy_decode(BufReader::new(input), &mut writer)
        .and_then(|_| writer.flush())
        .map_err(|e| {
            let _ = fs::remove_file(&output);
            ShieldError::Decompression(format!("Failed to decompress with zstd: {}", e))
        })?;

    info!("Zstd decompression completed");
    Ok(output)
}
