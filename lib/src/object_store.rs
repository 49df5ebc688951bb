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

//! Content-addressed blob storage.
//!
//! Blobs are stored by their SHA-256 hash in a two-level directory structure,
//! `objects/<aa>/<rest62>`, with no framing, compression, or file extension.
//! Storage is append-only: nothing in the engine ever deletes a blob.

use std::fs;
use std::io;
use std::io::Write as _;
use std::path::Path;
use std::path::PathBuf;

use tempfile::NamedTempFile;
use thiserror::Error;

use crate::file_util;
use crate::file_util::IoResultExt as _;
use crate::file_util::PathError;
use crate::hash;
use crate::object_id::BlobId;

#[derive(Debug, Error)]
pub enum ObjectStoreError {
    /// No blob with the requested hash exists.
    #[error("Object not found: {hash}")]
    ObjectNotFound { hash: String },
    /// The stored bytes no longer hash to the requested id.
    ///
    /// Mismatches are always surfaced to the caller, never repaired.
    #[error("Corruption detected: {expected} (actual: {actual})")]
    Corrupt { expected: String, actual: String },
    #[error("Cannot read object {hash}")]
    ReadObject {
        hash: String,
        #[source]
        source: io::Error,
    },
    #[error("Cannot write object {hash}")]
    WriteObject {
        hash: String,
        #[source]
        source: PathError,
    },
}

pub type ObjectStoreResult<T> = Result<T, ObjectStoreError>;

fn map_read_err(err: io::Error, id: &BlobId) -> ObjectStoreError {
    if err.kind() == io::ErrorKind::NotFound {
        ObjectStoreError::ObjectNotFound { hash: id.hex() }
    } else {
        ObjectStoreError::ReadObject {
            hash: id.hex(),
            source: err,
        }
    }
}

/// Content-addressed object store rooted at `.ofs/objects/`.
#[derive(Clone, Debug)]
pub struct ObjectStore {
    objects_dir: PathBuf,
}

impl ObjectStore {
    pub fn new(ofs_dir: &Path) -> Self {
        Self {
            objects_dir: ofs_dir.join("objects"),
        }
    }

    pub fn objects_dir(&self) -> &Path {
        &self.objects_dir
    }

    /// The on-disk path for a blob: `objects/<first 2 hex chars>/<rest>`.
    pub fn object_path(&self, id: &BlobId) -> PathBuf {
        let hex = id.hex();
        let (prefix, rest) = hex.split_at(2);
        self.objects_dir.join(prefix).join(rest)
    }

    /// Stores `contents` and returns its hash.
    ///
    /// If a blob with the same hash already exists, nothing is written
    /// (deduplication). New blobs are staged in a sibling temporary file and
    /// renamed into place, so readers never observe a partial blob.
    pub fn store(&self, contents: &[u8]) -> ObjectStoreResult<BlobId> {
        let id = hash::hash_bytes(contents);
        if self.exists(&id) {
            tracing::debug!(hash = %id, "blob already stored");
            return Ok(id);
        }
        self.write_blob(&id, contents)
            .map_err(|source| ObjectStoreError::WriteObject {
                hash: id.hex(),
                source,
            })?;
        Ok(id)
    }

    fn write_blob(&self, id: &BlobId, contents: &[u8]) -> Result<(), PathError> {
        let path = self.object_path(id);
        let dir = path.parent().unwrap_or(self.objects_dir.as_path());
        fs::create_dir_all(dir).context(dir)?;
        let mut temp_file = NamedTempFile::with_suffix_in(".tmp", dir).context(dir)?;
        temp_file.write_all(contents).context(&path)?;
        // The target path encodes the hash, so an existing target already
        // holds exactly these bytes.
        file_util::persist_content_addressed_temp_file(temp_file, &path).context(&path)?;
        Ok(())
    }

    pub fn exists(&self, id: &BlobId) -> bool {
        self.object_path(id).exists()
    }

    /// Retrieves a blob, verifying its integrity by recomputing the hash.
    pub fn retrieve(&self, id: &BlobId) -> ObjectStoreResult<Vec<u8>> {
        let path = self.object_path(id);
        let contents = fs::read(&path).map_err(|err| map_read_err(err, id))?;
        let actual = hash::hash_bytes(&contents);
        if actual != *id {
            return Err(ObjectStoreError::Corrupt {
                expected: id.hex(),
                actual: actual.hex(),
            });
        }
        Ok(contents)
    }

    /// Like [`retrieve()`](Self::retrieve), but reports a hash mismatch as
    /// `Ok(false)` instead of an error. A missing blob is still an error.
    pub fn verify(&self, id: &BlobId) -> ObjectStoreResult<bool> {
        match self.retrieve(id) {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::Corrupt { .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }
}
