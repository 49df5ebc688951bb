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

//! Working-tree scanning and comparison.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::UNIX_EPOCH;

use crate::file_util;
use crate::hash;
use crate::ignore::IgnorePatterns;
use crate::index::IndexEntry;
use crate::object_id::BlobId;

/// Scans the workspace and returns all non-ignored file paths, relative to
/// `root` and slash-separated.
///
/// Ignored directories are pruned: nothing below them is visited.
pub fn scan_working_tree(root: &Path, patterns: &IgnorePatterns) -> BTreeSet<String> {
    let mut files = BTreeSet::new();
    for path in collect_files(root, root, patterns) {
        if let Ok(rel) = path.strip_prefix(root)
            && let Some(rel) = file_util::to_slash_string(rel)
        {
            files.insert(rel);
        }
    }
    files
}

/// Recursively collects non-ignored files under `dir`, as absolute paths.
///
/// The ignore predicate sees paths relative to `repo_root`, so the same
/// compiled patterns apply no matter where the walk starts.
pub fn collect_files(dir: &Path, repo_root: &Path, patterns: &IgnorePatterns) -> Vec<PathBuf> {
    let mut files = vec![];
    walk_into(dir, repo_root, patterns, &mut files);
    files
}

fn walk_into(dir: &Path, repo_root: &Path, patterns: &IgnorePatterns, files: &mut Vec<PathBuf>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            tracing::warn!(?dir, ?err, "cannot read directory, skipping");
            return;
        }
    };
    for entry in entries {
        let Ok(entry) = entry else {
            continue;
        };
        let path = entry.path();
        let rel = match path.strip_prefix(repo_root) {
            Ok(rel) => rel,
            Err(_) => continue,
        };
        let Some(rel) = file_util::to_slash_string(rel) else {
            tracing::warn!(?path, "skipping non-UTF-8 path");
            continue;
        };
        if patterns.matches(&rel) {
            continue;
        }
        if path.is_dir() {
            walk_into(&path, repo_root, patterns, files);
        } else if path.is_file() {
            files.push(path);
        }
    }
}

/// Whether the file's contents differ from `expected`.
///
/// A missing or unreadable file counts as changed.
pub fn has_file_changed(path: &Path, expected: &BlobId) -> bool {
    match hash::hash_file(path) {
        Ok(actual) => actual != *expected,
        Err(_) => true,
    }
}

/// Whether the file still matches its index entry.
///
/// Size plus mtime equality is trusted as an unchanged signal to skip
/// hashing; any mismatch falls back to the content hash. A missing file does
/// not match.
pub fn file_matches_entry(path: &Path, entry: &IndexEntry) -> bool {
    let Ok(metadata) = fs::metadata(path) else {
        return false;
    };
    if metadata.len() == entry.size
        && file_mtime_millis(&metadata).is_some_and(|mtime| mtime == entry.mtime)
    {
        return true;
    }
    !has_file_changed(path, &entry.hash)
}

/// The file's mtime in milliseconds since the epoch, if representable.
pub fn file_mtime_millis(metadata: &fs::Metadata) -> Option<i64> {
    let mtime = metadata.modified().ok()?;
    let since_epoch = mtime.duration_since(UNIX_EPOCH).ok()?;
    i64::try_from(since_epoch.as_millis()).ok()
}
