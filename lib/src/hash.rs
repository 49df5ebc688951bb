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

//! SHA-256 hashing of byte buffers and files.
//!
//! Hashes are byte-exact: no line-ending normalization, no re-encoding. This
//! is an invariant of the object-store contract.

use std::fs::File;
use std::io::Read as _;
use std::path::Path;

use digest::Digest as _;
use sha2::Sha256;
use thiserror::Error;

use crate::file_util::IoResultExt as _;
use crate::file_util::PathError;
use crate::object_id::BLOB_ID_LENGTH;
use crate::object_id::BlobId;

/// Chunk size for streaming file hashes.
const HASH_CHUNK_SIZE: usize = 8 * 1024;

#[derive(Debug, Error)]
pub enum HashError {
    /// The expected hash string is not 64 hex characters.
    #[error("Invalid hash format: {0:?} (expected 64 hex characters)")]
    InvalidHashFormat(String),
    #[error(transparent)]
    Io(#[from] PathError),
}

/// Hashes an in-memory buffer.
pub fn hash_bytes(data: &[u8]) -> BlobId {
    let mut hasher = Sha256::new();
    hasher.update(data);
    BlobId::new(hasher.finalize().to_vec())
}

/// Hashes a file's contents by streaming, never loading the whole file.
pub fn hash_file(path: &Path) -> Result<BlobId, PathError> {
    let mut file = File::open(path).context(path)?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0; HASH_CHUNK_SIZE];
    loop {
        let bytes_read = file.read(&mut buf).context(path)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buf[..bytes_read]);
    }
    Ok(BlobId::new(hasher.finalize().to_vec()))
}

/// Checks whether the file at `path` hashes to `expected`.
///
/// The comparison is case-insensitive. Fails with
/// [`HashError::InvalidHashFormat`] if `expected` is not 64 hex characters.
pub fn verify_hash(path: &Path, expected: &str) -> Result<bool, HashError> {
    if expected.len() != BLOB_ID_LENGTH * 2 || !expected.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(HashError::InvalidHashFormat(expected.to_owned()));
    }
    let actual = hash_file(path)?;
    Ok(actual.hex().eq_ignore_ascii_case(expected))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use assert_matches::assert_matches;

    use super::*;

    const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn test_hash_bytes() {
        assert_eq!(hash_bytes(b"").hex(), EMPTY_SHA256);
        assert_eq!(
            hash_bytes(b"hello world").hex(),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
        // CR/LF bytes are hashed as-is.
        assert_ne!(hash_bytes(b"a\nb"), hash_bytes(b"a\r\nb"));
    }

    #[test]
    fn test_hash_file_matches_hash_bytes() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("file");

        fs::write(&path, b"").unwrap();
        assert_eq!(hash_file(&path).unwrap().hex(), EMPTY_SHA256);

        // Larger than one read chunk, to exercise the streaming loop.
        let contents: Vec<u8> = (0..=255u8).cycle().take(3 * HASH_CHUNK_SIZE + 17).collect();
        fs::write(&path, &contents).unwrap();
        assert_eq!(hash_file(&path).unwrap(), hash_bytes(&contents));
    }

    #[test]
    fn test_hash_file_missing() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(hash_file(&temp_dir.path().join("missing")).is_err());
    }

    #[test]
    fn test_verify_hash() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("file");
        fs::write(&path, b"hello world").unwrap();

        let expected = "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";
        assert_eq!(verify_hash(&path, expected).unwrap(), true);
        assert_eq!(
            verify_hash(&path, &expected.to_uppercase()).unwrap(),
            true,
            "comparison is case-insensitive"
        );
        assert_eq!(verify_hash(&path, EMPTY_SHA256).unwrap(), false);

        assert_matches!(
            verify_hash(&path, "abc123"),
            Err(HashError::InvalidHashFormat(_))
        );
        assert_matches!(
            verify_hash(&path, &"g".repeat(64)),
            Err(HashError::InvalidHashFormat(_))
        );
    }
}
