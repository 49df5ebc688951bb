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

//! Repository integrity verification.
//!
//! Five independent checks: the object store, the index, the commit history,
//! the references, and an aggregator that collects the per-axis results. The
//! repository is OK iff every axis is OK. Unlike the rest of the engine,
//! verification collects all errors instead of stopping at the first.

use std::fs;
use std::path::Path;

use crate::commits::Commit;
use crate::commits::FileAction;
use crate::hash;
use crate::object_id::BlobId;
use crate::refs;
use crate::repo::Repository;

/// How many hex chars of a hash are shown in verification errors.
const ERROR_HASH_LEN: usize = 12;

/// Outcome of one verification axis.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AxisResult {
    pub ok: bool,
    pub errors: Vec<String>,
}

impl AxisResult {
    fn from_errors(errors: Vec<String>) -> Self {
        Self {
            ok: errors.is_empty(),
            errors,
        }
    }
}

/// Per-axis results plus the overall verdict.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerifyReport {
    pub objects: AxisResult,
    pub index: AxisResult,
    pub commits: AxisResult,
    pub refs: AxisResult,
}

impl VerifyReport {
    /// Whether every axis passed.
    pub fn ok(&self) -> bool {
        self.axes().iter().all(|(_, axis)| axis.ok)
    }

    /// Total number of collected errors.
    pub fn error_count(&self) -> usize {
        self.axes().iter().map(|(_, axis)| axis.errors.len()).sum()
    }

    /// The axes in reporting order, keyed by their stable names.
    pub fn axes(&self) -> [(&'static str, &AxisResult); 4] {
        [
            ("objects", &self.objects),
            ("index", &self.index),
            ("commits", &self.commits),
            ("refs", &self.refs),
        ]
    }
}

/// Runs all verification axes against the repository.
pub fn verify_repository(repo: &Repository) -> VerifyReport {
    VerifyReport {
        objects: verify_objects(repo),
        index: verify_index(repo),
        commits: verify_commits(repo),
        refs: verify_refs(repo),
    }
}

fn truncated(hex: &str) -> &str {
    &hex[..hex.len().min(ERROR_HASH_LEN)]
}

/// Every blob file must hash to the name it is stored under.
///
/// Dotfiles and `.tmp` leftovers are ignored; unreadable files are errors.
fn verify_objects(repo: &Repository) -> AxisResult {
    let mut errors = vec![];
    let objects_dir = repo.objects().objects_dir();
    if !objects_dir.exists() {
        errors.push("Objects directory missing".to_owned());
        return AxisResult::from_errors(errors);
    }

    for (prefix, path) in object_files(objects_dir) {
        let file_name = path.file_name().and_then(|name| name.to_str()).unwrap_or("");
        let expected = format!("{prefix}{file_name}");
        match fs::read(&path) {
            Ok(contents) => {
                let actual = hash::hash_bytes(&contents).hex();
                if actual != expected {
                    errors.push(format!(
                        "Hash mismatch: {} (actual: {})",
                        truncated(&expected),
                        truncated(&actual)
                    ));
                }
            }
            Err(err) => {
                errors.push(format!("Cannot read object {}: {err}", truncated(&expected)));
            }
        }
    }
    AxisResult::from_errors(errors)
}

/// Enumerates `(fan-out prefix, blob file path)` pairs under `objects/`,
/// skipping dotfiles and temp-file leftovers.
fn object_files(objects_dir: &Path) -> Vec<(String, std::path::PathBuf)> {
    let mut files = vec![];
    let Ok(subdirs) = fs::read_dir(objects_dir) else {
        return files;
    };
    for subdir in subdirs.flatten() {
        let Some(prefix) = subdir.file_name().to_str().map(str::to_owned) else {
            continue;
        };
        if prefix.starts_with('.') || !subdir.path().is_dir() {
            continue;
        }
        let Ok(entries) = fs::read_dir(subdir.path()) else {
            continue;
        };
        for entry in entries.flatten() {
            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                continue;
            };
            if name.starts_with('.') || name.ends_with(".tmp") {
                continue;
            }
            files.push((prefix.clone(), entry.path()));
        }
    }
    files.sort();
    files
}

/// The index must parse as a JSON array whose entries name existing blobs.
///
/// A missing index file passes.
fn verify_index(repo: &Repository) -> AxisResult {
    let mut errors = vec![];
    let contents = match fs::read(repo.index_file()) {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return AxisResult::from_errors(errors);
        }
        Err(err) => {
            errors.push(format!("Cannot read index: {err}"));
            return AxisResult::from_errors(errors);
        }
    };
    let parsed: serde_json::Value = match serde_json::from_slice(&contents) {
        Ok(parsed) => parsed,
        Err(err) => {
            errors.push(format!("Index file corrupted (invalid JSON): {err}"));
            return AxisResult::from_errors(errors);
        }
    };
    let Some(entries) = parsed.as_array() else {
        errors.push("Index file corrupted (not a JSON array)".to_owned());
        return AxisResult::from_errors(errors);
    };

    for entry in entries {
        let path = entry.get("path").and_then(|value| value.as_str());
        let hash_hex = entry.get("hash").and_then(|value| value.as_str());
        match (path, hash_hex) {
            (path, None) => {
                errors.push(format!("Index entry missing hash: {}", path.unwrap_or("?")));
            }
            (None, Some(hash_hex)) => {
                errors.push(format!("Index entry missing path for hash {hash_hex}"));
            }
            (Some(path), Some(hash_hex)) => {
                let exists = BlobId::try_from_hex(hash_hex)
                    .is_some_and(|id| repo.objects().exists(&id));
                if !exists {
                    errors.push(format!(
                        "Index references missing object: {hash_hex} (path: {path})"
                    ));
                }
            }
        }
    }
    AxisResult::from_errors(errors)
}

/// Every commit file must parse, and every non-deleted file entry must name
/// an existing blob.
fn verify_commits(repo: &Repository) -> AxisResult {
    let mut errors = vec![];
    let commits_dir = repo.commits().commits_dir();
    let Ok(entries) = fs::read_dir(commits_dir) else {
        // No commits yet is ok.
        return AxisResult::from_errors(errors);
    };

    let mut paths: Vec<_> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    for path in paths {
        let file_name = path.file_name().and_then(|name| name.to_str()).unwrap_or("?");
        let commit: Commit = match fs::read(&path)
            .map_err(|err| err.to_string())
            .and_then(|contents| {
                serde_json::from_slice(&contents).map_err(|err| err.to_string())
            }) {
            Ok(commit) => commit,
            Err(err) => {
                errors.push(format!("Commit file {file_name} corrupted: {err}"));
                continue;
            }
        };

        for file_entry in &commit.files {
            if file_entry.action == FileAction::Deleted {
                continue;
            }
            match &file_entry.hash {
                None => {
                    errors.push(format!(
                        "Commit {}: file {} missing hash",
                        commit.id, file_entry.path
                    ));
                }
                Some(id) if !repo.objects().exists(id) => {
                    errors.push(format!(
                        "Commit {}: missing object {} for {}",
                        commit.id,
                        truncated(&id.hex()),
                        file_entry.path
                    ));
                }
                Some(_) => {}
            }
        }
    }
    AxisResult::from_errors(errors)
}

/// HEAD must exist, and a resolvable HEAD must point at a loadable commit.
///
/// An empty HEAD passes (fresh repository).
fn verify_refs(repo: &Repository) -> AxisResult {
    let mut errors = vec![];
    if !repo.head_file().exists() {
        errors.push("HEAD file missing".to_owned());
        return AxisResult::from_errors(errors);
    }
    if refs::read_head(repo.ofs_dir()).is_none() {
        // Empty HEAD is ok for new repos.
        return AxisResult::from_errors(errors);
    }
    if let Some(commit_id) = refs::resolve_head(repo.ofs_dir())
        && repo.commits().load(&commit_id).is_none()
    {
        errors.push(format!("HEAD points to non-existent commit: {commit_id}"));
    }
    AxisResult::from_errors(errors)
}
