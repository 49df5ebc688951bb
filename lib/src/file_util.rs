// Copyright 2024 The OFS Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

#![expect(missing_docs)]

use std::fs;
use std::io;
use std::io::Write as _;
use std::path::Path;
use std::path::PathBuf;

use tempfile::NamedTempFile;
use tempfile::PersistError;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("Cannot access {path}")]
pub struct PathError {
    pub path: PathBuf,
    pub source: io::Error,
}

pub trait IoResultExt<T> {
    fn context(self, path: impl AsRef<Path>) -> Result<T, PathError>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn context(self, path: impl AsRef<Path>) -> Result<T, PathError> {
        self.map_err(|error| PathError {
            path: path.as_ref().to_path_buf(),
            source: error,
        })
    }
}

/// Persists the temporary file onto `new_path` after flushing its content.
///
/// After a system crash the persisted file has valid contents if it exists
/// at all; the directory entry itself is not synchronized.
pub fn persist_temp_file<P: AsRef<Path>>(temp_file: NamedTempFile, new_path: P) -> io::Result<()> {
    temp_file.as_file().sync_data()?;
    temp_file
        .persist(new_path)
        .map(|_| ())
        .map_err(|PersistError { error, file: _ }| error)
}

/// Persists a temporary file at a content-addressed target path.
///
/// The target name encodes the hash of the contents, so when the target
/// already exists it holds the same bytes and the stored copy wins. On Unix
/// the rename replaces it outright. On Windows replacing a file that another
/// handle has open can fail, so an existing target is left untouched and the
/// temporary file is discarded.
pub fn persist_content_addressed_temp_file(
    temp_file: NamedTempFile,
    new_path: &Path,
) -> io::Result<()> {
    temp_file.as_file().sync_data()?;
    if cfg!(windows) {
        match temp_file.persist_noclobber(new_path) {
            Ok(_) => Ok(()),
            Err(PersistError { error, file: _ }) => {
                if new_path.exists() {
                    Ok(())
                } else {
                    Err(error)
                }
            }
        }
    } else {
        // Checking for the target first would not be atomic; rename wins
        // either way.
        temp_file
            .persist(new_path)
            .map(|_| ())
            .map_err(|PersistError { error, file: _ }| error)
    }
}

/// Writes `contents` to `target` atomically.
///
/// The contents are written to a sibling temporary file first, then renamed
/// onto the target, so readers observe either the old contents or the new
/// contents and never a truncated file. The parent directory is created if
/// missing.
pub fn write_atomic(target: &Path, contents: &[u8]) -> Result<(), PathError> {
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).context(dir)?;
    let mut temp_file = NamedTempFile::with_suffix_in(".tmp", dir).context(dir)?;
    temp_file.write_all(contents).context(target)?;
    persist_temp_file(temp_file, target).context(target)?;
    Ok(())
}

/// Converts a workspace-relative path to its canonical slash-separated string
/// form, or `None` if the path is not valid UTF-8.
pub fn to_slash_string(path: &Path) -> Option<String> {
    let s = path.to_str()?;
    if cfg!(windows) {
        Some(s.replace('\\', "/"))
    } else {
        Some(s.to_owned())
    }
}

/// Maximum size of a file accepted by `add`, in bytes (100 MiB).
pub const MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum FileSizeError {
    #[error("File not found: {path}")]
    NotFound { path: PathBuf },
    #[error("Not a file: {path}")]
    NotAFile { path: PathBuf },
    #[error("File size {} exceeds maximum of {}", format_file_size(*size), format_file_size(*max_size))]
    TooLarge { size: u64, max_size: u64 },
    #[error(transparent)]
    Io(#[from] PathError),
}

/// Checks that `path` names a regular file no larger than `max_size` bytes.
///
/// A file exactly at the ceiling is accepted; one byte over is rejected.
pub fn check_file_size(path: &Path, max_size: u64) -> Result<u64, FileSizeError> {
    let metadata = fs::metadata(path).map_err(|err| {
        if err.kind() == io::ErrorKind::NotFound {
            FileSizeError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            FileSizeError::Io(PathError {
                path: path.to_path_buf(),
                source: err,
            })
        }
    })?;
    if !metadata.is_file() {
        return Err(FileSizeError::NotAFile {
            path: path.to_path_buf(),
        });
    }
    let size = metadata.len();
    if size > max_size {
        return Err(FileSizeError::TooLarge { size, max_size });
    }
    Ok(size)
}

/// Formats a byte count for human consumption.
pub fn format_file_size(size_bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    let size = size_bytes as f64;
    if size < KIB {
        format!("{size_bytes} B")
    } else if size < KIB * KIB {
        format!("{:.1} KB", size / KIB)
    } else if size < KIB * KIB * KIB {
        format!("{:.1} MB", size / (KIB * KIB))
    } else {
        format!("{:.1} GB", size / (KIB * KIB * KIB))
    }
}
