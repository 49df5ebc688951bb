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

//! Commit objects: creation, persistence, listing, and tree reconstruction.
//!
//! A commit records only the file actions applied at that step. The full tree
//! at a commit is a derived view: the left-fold of actions from the root
//! forward. Commits are append-only and stored one per file under
//! `.ofs/commits/<id>.json`.

use std::collections::BTreeMap;
use std::fs;
use std::num::NonZeroUsize;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;

use chrono::SecondsFormat;
use chrono::Utc;
use clru::CLruCache;
use itertools::Itertools as _;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::file_util;
use crate::file_util::PathError;
use crate::index::IndexEntry;
use crate::object_id::BlobId;
use crate::object_id::CommitId;

/// Bound on the number of commits kept in a store's load cache.
const COMMIT_CACHE_CAPACITY: NonZeroUsize = NonZeroUsize::new(128).unwrap();

#[derive(Debug, Error)]
pub enum CommitStoreError {
    #[error(transparent)]
    Io(#[from] PathError),
    #[error("Cannot serialize commit {id}")]
    Serialize {
        id: CommitId,
        #[source]
        source: serde_json::Error,
    },
}

/// What happened to one file at one commit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileAction {
    Added,
    Modified,
    Deleted,
    /// Staged but identical to the parent tree. Never persisted; commits
    /// consisting only of unchanged entries are rejected.
    Unchanged,
}

/// One file's record within a commit.
///
/// Deleted entries carry the hash of the file as it existed in the parent,
/// never a placeholder.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FileEntry {
    pub path: String,
    pub hash: Option<BlobId>,
    pub size: u64,
    pub mode: String,
    pub action: FileAction,
    /// Unknown fields, round-tripped verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl FileEntry {
    fn from_staged(entry: &IndexEntry, action: FileAction) -> Self {
        Self {
            path: entry.path.clone(),
            hash: Some(entry.hash.clone()),
            size: entry.size,
            mode: entry.mode.clone(),
            action,
            extra: entry.extra.clone(),
        }
    }
}

/// A snapshot delta: the set of file actions applied at one step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Commit {
    pub id: CommitId,
    pub parent: Option<CommitId>,
    pub message: String,
    pub author: String,
    pub email: String,
    /// ISO-8601 UTC with a trailing `Z`.
    pub timestamp: String,
    pub files: Vec<FileEntry>,
    /// Unknown fields, round-tripped verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// The full map of live paths at a commit, derived by folding actions from
/// the root forward.
pub type TreeState = BTreeMap<String, FileEntry>;

/// Allocates the next sequential commit id.
///
/// Scans `commits_dir` for files whose stem is all digits and returns the
/// maximum plus one, zero-padded to width 3 ("001".."999", then widening
/// naturally). An empty or missing directory yields "001".
pub fn generate_commit_id(commits_dir: &Path) -> CommitId {
    let Ok(entries) = fs::read_dir(commits_dir) else {
        return CommitId::from_int(1);
    };
    let max = entries
        .filter_map(|entry| {
            let path = entry.ok()?.path();
            if path.extension()? != "json" {
                return None;
            }
            let stem = path.file_stem()?.to_str()?;
            CommitId::new(stem).as_int()
        })
        .max()
        .unwrap_or(0);
    CommitId::from_int(max + 1)
}

/// Builds a commit object stamped with the current UTC time. Does not
/// persist.
pub fn build_commit(
    id: CommitId,
    parent: Option<CommitId>,
    message: impl Into<String>,
    author: impl Into<String>,
    email: impl Into<String>,
    files: Vec<FileEntry>,
) -> Commit {
    let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
    Commit {
        id,
        parent,
        message: message.into(),
        author: author.into(),
        email: email.into(),
        timestamp,
        files,
        extra: serde_json::Map::new(),
    }
}

/// Infers the action for each staged entry against the parent's full tree
/// state, then emits a `Deleted` entry for every parent path absent from the
/// staged set.
///
/// `Unchanged` entries are included; callers drop them before committing.
pub fn file_actions(staged: &[IndexEntry], parent_tree: &TreeState) -> Vec<FileEntry> {
    let mut files = vec![];
    for entry in staged {
        let action = match parent_tree.get(&entry.path) {
            None => FileAction::Added,
            Some(parent_entry) if parent_entry.hash.as_ref() != Some(&entry.hash) => {
                FileAction::Modified
            }
            Some(_) => FileAction::Unchanged,
        };
        files.push(FileEntry::from_staged(entry, action));
    }

    for (path, parent_entry) in parent_tree {
        if !staged.iter().any(|entry| entry.path == *path) {
            let mut deleted = parent_entry.clone();
            deleted.action = FileAction::Deleted;
            files.push(deleted);
        }
    }
    files
}

/// Commit persistence with a bounded, store-scoped load cache.
///
/// The cache lives and dies with the store (and so with the repository
/// handle that owns it); saving through the store keeps it coherent, and
/// out-of-band mutation is only visible to a freshly constructed store.
#[derive(Debug)]
pub struct CommitStore {
    commits_dir: PathBuf,
    cache: Mutex<CLruCache<CommitId, Commit>>,
}

impl CommitStore {
    pub fn new(commits_dir: PathBuf) -> Self {
        Self {
            commits_dir,
            cache: Mutex::new(CLruCache::new(COMMIT_CACHE_CAPACITY)),
        }
    }

    pub fn commits_dir(&self) -> &Path {
        &self.commits_dir
    }

    fn commit_path(&self, id: &CommitId) -> PathBuf {
        self.commits_dir.join(format!("{id}.json"))
    }

    /// Writes `commits/<id>.json` atomically, with two-space indentation.
    pub fn save(&self, commit: &Commit) -> Result<(), CommitStoreError> {
        let contents =
            serde_json::to_vec_pretty(commit).map_err(|source| CommitStoreError::Serialize {
                id: commit.id.clone(),
                source,
            })?;
        file_util::write_atomic(&self.commit_path(&commit.id), &contents)?;
        self.cache
            .lock()
            .unwrap()
            .put(commit.id.clone(), commit.clone());
        Ok(())
    }

    /// Loads a commit by id.
    ///
    /// A missing file or a parse failure both read as "not found"; failures
    /// are not cached, so a later successful load is still possible.
    pub fn load(&self, id: &CommitId) -> Option<Commit> {
        if let Some(commit) = self.cache.lock().unwrap().get(id) {
            return Some(commit.clone());
        }
        let contents = fs::read(self.commit_path(id)).ok()?;
        let commit: Commit = match serde_json::from_slice(&contents) {
            Ok(commit) => commit,
            Err(err) => {
                tracing::debug!(%id, ?err, "unparseable commit file");
                return None;
            }
        };
        self.cache
            .lock()
            .unwrap()
            .put(id.clone(), commit.clone());
        Some(commit)
    }

    /// Loads the parent of the given commit, if any.
    pub fn parent_commit(&self, id: &CommitId) -> Option<Commit> {
        let commit = self.load(id)?;
        self.load(&commit.parent?)
    }

    /// All commits, newest first (numeric id descending). Unparseable files
    /// are skipped.
    pub fn list(&self) -> Vec<Commit> {
        let Ok(entries) = fs::read_dir(&self.commits_dir) else {
            return vec![];
        };
        let mut commits = entries
            .filter_map(|entry| -> Option<Commit> {
                let path = entry.ok()?.path();
                if path.extension()? != "json" {
                    return None;
                }
                let contents = fs::read(&path).ok()?;
                match serde_json::from_slice(&contents) {
                    Ok(commit) => Some(commit),
                    Err(err) => {
                        tracing::debug!(?path, ?err, "skipping unparseable commit file");
                        None
                    }
                }
            })
            .collect_vec();
        commits.sort_by(|a, b| b.id.cmp(&a.id));
        commits
    }

    /// Total number of commit files.
    pub fn count(&self) -> usize {
        let Ok(entries) = fs::read_dir(&self.commits_dir) else {
            return 0;
        };
        entries
            .filter(|entry| {
                entry
                    .as_ref()
                    .is_ok_and(|entry| entry.path().extension().is_some_and(|ext| ext == "json"))
            })
            .count()
    }

    /// Reconstructs the full tree state at `target`.
    ///
    /// Walks the parent chain back to a commit with no parent (a missing
    /// parent is treated as the chain end), then folds oldest-first:
    /// `Deleted` removes the path, any other action sets it.
    pub fn tree_state(&self, target: &CommitId) -> TreeState {
        let mut chain = vec![];
        let mut current = Some(target.clone());
        while let Some(id) = current {
            let Some(commit) = self.load(&id) else {
                break;
            };
            current = commit.parent.clone();
            chain.push(commit);
        }

        let mut tree = TreeState::new();
        for commit in chain.into_iter().rev() {
            for file_entry in commit.files {
                match file_entry.action {
                    FileAction::Deleted => {
                        tree.remove(&file_entry.path);
                    }
                    _ => {
                        tree.insert(file_entry.path.clone(), file_entry);
                    }
                }
            }
        }
        tree
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash;

    fn staged(path: &str, contents: &[u8]) -> IndexEntry {
        IndexEntry::new(path, hash::hash_bytes(contents), contents.len() as u64, 0)
    }

    fn tree_entry(path: &str, contents: &[u8]) -> FileEntry {
        FileEntry::from_staged(&staged(path, contents), FileAction::Added)
    }

    #[test]
    fn test_generate_commit_id_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert_eq!(generate_commit_id(temp_dir.path()).as_str(), "001");
        // A missing directory behaves the same.
        assert_eq!(
            generate_commit_id(&temp_dir.path().join("missing")).as_str(),
            "001"
        );
    }

    #[test]
    fn test_generate_commit_id_sequence() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("001.json"), b"{}").unwrap();
        fs::write(temp_dir.path().join("002.json"), b"{}").unwrap();
        assert_eq!(generate_commit_id(temp_dir.path()).as_str(), "003");
    }

    #[test]
    fn test_generate_commit_id_ignores_non_digit_stems() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("005.json"), b"{}").unwrap();
        fs::write(temp_dir.path().join("backup.json"), b"{}").unwrap();
        fs::write(temp_dir.path().join("007.txt"), b"{}").unwrap();
        assert_eq!(generate_commit_id(temp_dir.path()).as_str(), "006");
    }

    #[test]
    fn test_generate_commit_id_widens_past_999() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("999.json"), b"{}").unwrap();
        assert_eq!(generate_commit_id(temp_dir.path()).as_str(), "1000");
        fs::write(temp_dir.path().join("1000.json"), b"{}").unwrap();
        assert_eq!(generate_commit_id(temp_dir.path()).as_str(), "1001");
    }

    #[test]
    fn test_build_commit_timestamp_is_utc_z() {
        let commit = build_commit(
            CommitId::new("001"),
            None,
            "message",
            "author",
            "author@localhost",
            vec![],
        );
        assert!(commit.timestamp.ends_with('Z'));
        assert!(commit.timestamp.contains('T'));
        assert_eq!(commit.parent, None);
    }

    #[test]
    fn test_file_actions_first_commit() {
        let files = file_actions(&[staged("a.txt", b"a")], &TreeState::new());
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].action, FileAction::Added);
        assert_eq!(files[0].hash, Some(hash::hash_bytes(b"a")));
    }

    #[test]
    fn test_file_actions_against_parent_tree() {
        let mut parent_tree = TreeState::new();
        parent_tree.insert("same.txt".to_owned(), tree_entry("same.txt", b"same"));
        parent_tree.insert("changed.txt".to_owned(), tree_entry("changed.txt", b"old"));
        parent_tree.insert("gone.txt".to_owned(), tree_entry("gone.txt", b"gone"));

        let staged_entries = [
            staged("same.txt", b"same"),
            staged("changed.txt", b"new"),
            staged("fresh.txt", b"fresh"),
        ];
        let files = file_actions(&staged_entries, &parent_tree);

        let action_of = |path: &str| {
            files
                .iter()
                .find(|file| file.path == path)
                .map(|file| file.action)
        };
        assert_eq!(action_of("same.txt"), Some(FileAction::Unchanged));
        assert_eq!(action_of("changed.txt"), Some(FileAction::Modified));
        assert_eq!(action_of("fresh.txt"), Some(FileAction::Added));
        assert_eq!(action_of("gone.txt"), Some(FileAction::Deleted));

        // The deleted entry carries the parent's hash, not a placeholder.
        let deleted = files.iter().find(|file| file.path == "gone.txt").unwrap();
        assert_eq!(deleted.hash, Some(hash::hash_bytes(b"gone")));
    }
}
