//! Safe file reading and JSON writing utilities
//!
//! Reads are hardened with symlink rejection, regular file checks, and size
//! limits. Benchmark folders are usually extracted from third-party archives,
//! so a README or golden answer can be anything.
//!
//! Note: there is a TOCTOU window between the metadata check and the read.
//! Only local filesystem access can exploit it, and the worst outcome is
//! reading unexpected content.

use crate::errors::{BenchError, BenchResult};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Default maximum file size (4 MiB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 4 * 1_048_576;

/// Safely read a file with security checks.
///
/// This function:
/// 1. Rejects symlinks (uses `symlink_metadata` to detect without following)
/// 2. Rejects non-regular files (directories, FIFOs, sockets, devices)
/// 3. Enforces a maximum file size limit (files at exactly the limit are accepted)
///
/// # Errors
///
/// Returns `BenchError::FileSymlink` if the path is a symlink.
/// Returns `BenchError::FileNotRegular` if the path is not a regular file.
/// Returns `BenchError::FileTooBig` if the file exceeds the size limit.
/// Returns `BenchError::FileRead` for other I/O errors.
pub fn safe_read_file(path: &Path) -> BenchResult<String> {
    safe_read_file_with_limit(path, DEFAULT_MAX_FILE_SIZE)
}

/// Safely read a file with a custom size limit.
///
/// See [`safe_read_file`] for details on security checks.
pub fn safe_read_file_with_limit(path: &Path, max_size: u64) -> BenchResult<String> {
    let metadata = fs::symlink_metadata(path).map_err(|e| BenchError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    if metadata.file_type().is_symlink() {
        return Err(BenchError::FileSymlink {
            path: path.to_path_buf(),
        });
    }

    if !metadata.is_file() {
        return Err(BenchError::FileNotRegular {
            path: path.to_path_buf(),
        });
    }

    let size = metadata.len();
    if size > max_size {
        return Err(BenchError::FileTooBig {
            path: path.to_path_buf(),
            size,
            limit: max_size,
        });
    }

    fs::read_to_string(path).map_err(|e| BenchError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Read and deserialize a JSON record file.
pub fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> BenchResult<T> {
    let content = safe_read_file(path)?;
    serde_json::from_str(&content).map_err(|e| BenchError::MalformedRecord {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Serialize a value as pretty JSON and write it, creating parent directories.
pub fn write_json_pretty<T: Serialize + ?Sized>(path: &Path, value: &T) -> BenchResult<()> {
    let content = serde_json::to_string_pretty(value).map_err(|e| BenchError::Other(e.into()))?;
    write_text(path, &content)
}

/// Write a text file, creating parent directories.
pub fn write_text(path: &Path, content: &str) -> BenchResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| BenchError::FileWrite {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
    }

    fs::write(path, content).map_err(|e| BenchError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })
}
