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

//! The staging index: the set of entries that will populate the next commit.
//!
//! The index is persisted as a JSON array at `.ofs/index.json` and kept in
//! memory as an ordered path → entry map, so lookups are O(1) while
//! serialization preserves staging order.

use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use indexmap::IndexMap;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::file_util;
use crate::file_util::PathError;
use crate::object_id::BlobId;

/// Mode recorded for every tracked file.
pub const FILE_MODE: &str = "100644";

#[derive(Debug, Error)]
pub enum IndexError {
    #[error(transparent)]
    Io(#[from] PathError),
    #[error("Cannot serialize index")]
    Serialize(#[source] serde_json::Error),
}

/// One staged file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Workspace-relative, slash-separated path.
    pub path: String,
    /// Hash of the staged blob.
    pub hash: BlobId,
    /// Size of the staged contents in bytes.
    pub size: u64,
    /// Always [`FILE_MODE`].
    pub mode: String,
    /// Last-modified stamp in milliseconds since the epoch. Only a fast-skip
    /// hint; never authoritative.
    pub mtime: i64,
    /// Unknown fields, round-tripped verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl IndexEntry {
    /// Builds an entry with the default mode and no extra fields.
    pub fn new(path: impl Into<String>, hash: BlobId, size: u64, mtime: i64) -> Self {
        Self {
            path: path.into(),
            hash,
            size,
            mode: FILE_MODE.to_owned(),
            mtime,
            extra: serde_json::Map::new(),
        }
    }
}

/// The staging index, backed by `.ofs/index.json`.
#[derive(Debug)]
pub struct Index {
    index_file: PathBuf,
    entries: IndexMap<String, IndexEntry>,
}

impl Index {
    /// Loads the index from disk.
    ///
    /// A missing file is an empty index. A file that fails to parse also
    /// loads as empty, with a diagnostic; nothing is overwritten until the
    /// next explicit save.
    pub fn load(index_file: &Path) -> Self {
        let entries = match fs::read(index_file) {
            Ok(contents) => match serde_json::from_slice::<Vec<IndexEntry>>(&contents) {
                Ok(entries) => entries
                    .into_iter()
                    .map(|entry| (entry.path.clone(), entry))
                    .collect(),
                Err(err) => {
                    tracing::warn!(?err, "corrupt index file, using empty index");
                    IndexMap::new()
                }
            },
            Err(err) if err.kind() == io::ErrorKind::NotFound => IndexMap::new(),
            Err(err) => {
                tracing::warn!(?err, "cannot read index file, using empty index");
                IndexMap::new()
            }
        };
        Self {
            index_file: index_file.to_path_buf(),
            entries,
        }
    }

    fn save(&self) -> Result<(), IndexError> {
        let entries: Vec<&IndexEntry> = self.entries.values().collect();
        let contents = serde_json::to_vec_pretty(&entries).map_err(IndexError::Serialize)?;
        file_util::write_atomic(&self.index_file, &contents)?;
        Ok(())
    }

    /// Adds or replaces the entry for `entry.path` and saves.
    pub fn add(&mut self, entry: IndexEntry) -> Result<(), IndexError> {
        self.entries.insert(entry.path.clone(), entry);
        self.save()
    }

    /// Applies all replacements, then performs a single atomic save.
    pub fn batch_add(
        &mut self,
        entries: impl IntoIterator<Item = IndexEntry>,
    ) -> Result<(), IndexError> {
        for entry in entries {
            self.entries.insert(entry.path.clone(), entry);
        }
        self.save()
    }

    /// Removes the entry for `path`. Returns whether it existed.
    pub fn remove(&mut self, path: &str) -> Result<bool, IndexError> {
        if self.entries.shift_remove(path).is_none() {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }

    /// All entries, in staging order.
    pub fn entries(&self) -> Vec<IndexEntry> {
        self.entries.values().cloned().collect()
    }

    /// O(1) lookup by path.
    pub fn find(&self, path: &str) -> Option<&IndexEntry> {
        self.entries.get(path)
    }

    pub fn clear(&mut self) -> Result<(), IndexError> {
        self.entries.clear();
        self.save()
    }

    pub fn has_changes(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
