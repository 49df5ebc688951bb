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

//! HEAD and branch reference machinery.
//!
//! `HEAD` is either symbolic (`ref: refs/heads/<name>`) or detached (a raw
//! commit id). Branch tips live under `refs/heads/<name>`, one commit id plus
//! trailing newline per file. All ref writes are atomic.

use std::fs;
use std::path::Path;

use crate::file_util;
use crate::file_util::PathError;
use crate::object_id::CommitId;

/// The branch HEAD points at after `init`.
pub const DEFAULT_BRANCH: &str = "main";

const SYMBOLIC_REF_PREFIX: &str = "ref: ";

/// Returns the HEAD file's stripped contents, or `None` if the file is
/// missing, unreadable, or empty.
pub fn read_head(ofs_dir: &Path) -> Option<String> {
    let contents = fs::read_to_string(ofs_dir.join("HEAD")).ok()?;
    let contents = contents.trim();
    if contents.is_empty() {
        None
    } else {
        Some(contents.to_owned())
    }
}

/// Resolves HEAD to a commit id.
///
/// A symbolic HEAD follows the referenced file; a missing or empty ref file
/// means no commits yet on that branch. A detached HEAD is returned as-is.
pub fn resolve_head(ofs_dir: &Path) -> Option<CommitId> {
    let head = read_head(ofs_dir)?;
    if let Some(ref_path) = head.strip_prefix(SYMBOLIC_REF_PREFIX) {
        let contents = fs::read_to_string(ofs_dir.join(ref_path)).ok()?;
        let contents = contents.trim();
        if contents.is_empty() {
            None
        } else {
            Some(CommitId::new(contents))
        }
    } else {
        Some(CommitId::new(head))
    }
}

/// Whether HEAD points directly at a commit rather than through a branch.
///
/// A missing or empty HEAD is not detached.
pub fn is_detached(ofs_dir: &Path) -> bool {
    read_head(ofs_dir).is_some_and(|head| !head.starts_with(SYMBOLIC_REF_PREFIX))
}

/// The branch name HEAD points at, if HEAD is symbolic.
pub fn head_branch(ofs_dir: &Path) -> Option<String> {
    let head = read_head(ofs_dir)?;
    let ref_path = head.strip_prefix(SYMBOLIC_REF_PREFIX)?;
    Some(
        ref_path
            .strip_prefix("refs/heads/")
            .unwrap_or(ref_path)
            .to_owned(),
    )
}

/// Atomically writes `value` (stripped, plus trailing newline) to a ref file.
pub fn update_ref(ref_path: &Path, value: &str) -> Result<(), PathError> {
    let contents = format!("{}\n", value.trim());
    file_util::write_atomic(ref_path, contents.as_bytes())
}

/// Points HEAD (or the branch it names) at `commit_id`.
///
/// In detached mode the HEAD file is overwritten directly. Otherwise the
/// referenced branch file is updated, defaulting to `refs/heads/main` when
/// HEAD is missing. This never changes whether HEAD is symbolic or detached;
/// dedicated paths ([`init_head`], checkout) do that.
pub fn update_head(ofs_dir: &Path, commit_id: &CommitId, detached: bool) -> Result<(), PathError> {
    let head_file = ofs_dir.join("HEAD");
    if detached {
        return update_ref(&head_file, commit_id.as_str());
    }
    let head = read_head(ofs_dir)
        .unwrap_or_else(|| format!("{SYMBOLIC_REF_PREFIX}refs/heads/{DEFAULT_BRANCH}"));
    match head.strip_prefix(SYMBOLIC_REF_PREFIX) {
        Some(ref_path) => update_ref(&ofs_dir.join(ref_path), commit_id.as_str()),
        None => update_ref(&head_file, commit_id.as_str()),
    }
}

/// Initializes HEAD as a symbolic ref to the given branch. The branch file
/// itself is created lazily by the first [`update_head`].
pub fn init_head(ofs_dir: &Path, branch: &str) -> Result<(), PathError> {
    update_ref(
        &ofs_dir.join("HEAD"),
        &format!("{SYMBOLIC_REF_PREFIX}refs/heads/{branch}"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_ofs_dir() -> tempfile::TempDir {
        tempfile::tempdir().unwrap()
    }

    #[test]
    fn test_read_head_missing_or_empty() {
        let ofs_dir = new_ofs_dir();
        assert_eq!(read_head(ofs_dir.path()), None);

        fs::write(ofs_dir.path().join("HEAD"), b"").unwrap();
        assert_eq!(read_head(ofs_dir.path()), None);
        assert_eq!(resolve_head(ofs_dir.path()), None);
        assert!(!is_detached(ofs_dir.path()));
    }

    #[test]
    fn test_symbolic_head_resolution() {
        let ofs_dir = new_ofs_dir();
        init_head(ofs_dir.path(), DEFAULT_BRANCH).unwrap();
        assert_eq!(
            read_head(ofs_dir.path()).as_deref(),
            Some("ref: refs/heads/main")
        );
        assert_eq!(head_branch(ofs_dir.path()).as_deref(), Some("main"));
        assert!(!is_detached(ofs_dir.path()));

        // Branch file doesn't exist yet: no commits on the branch.
        assert_eq!(resolve_head(ofs_dir.path()), None);

        update_head(ofs_dir.path(), &CommitId::new("001"), false).unwrap();
        assert_eq!(resolve_head(ofs_dir.path()), Some(CommitId::new("001")));
        assert_eq!(
            fs::read_to_string(ofs_dir.path().join("refs/heads/main")).unwrap(),
            "001\n"
        );
        // HEAD itself is still symbolic.
        assert!(!is_detached(ofs_dir.path()));
    }

    #[test]
    fn test_detached_head() {
        let ofs_dir = new_ofs_dir();
        init_head(ofs_dir.path(), DEFAULT_BRANCH).unwrap();
        update_head(ofs_dir.path(), &CommitId::new("002"), true).unwrap();

        assert_eq!(
            fs::read_to_string(ofs_dir.path().join("HEAD")).unwrap(),
            "002\n"
        );
        assert!(is_detached(ofs_dir.path()));
        assert_eq!(resolve_head(ofs_dir.path()), Some(CommitId::new("002")));
        assert_eq!(head_branch(ofs_dir.path()), None);

        // A non-detached update while detached rewrites HEAD directly; it
        // does not re-attach.
        update_head(ofs_dir.path(), &CommitId::new("003"), false).unwrap();
        assert!(is_detached(ofs_dir.path()));
        assert_eq!(resolve_head(ofs_dir.path()), Some(CommitId::new("003")));
    }

    #[test]
    fn test_update_head_defaults_to_main_when_head_missing() {
        let ofs_dir = new_ofs_dir();
        update_head(ofs_dir.path(), &CommitId::new("001"), false).unwrap();
        assert_eq!(
            fs::read_to_string(ofs_dir.path().join("refs/heads/main")).unwrap(),
            "001\n"
        );
        // HEAD itself was not created; init is responsible for that.
        assert!(!ofs_dir.path().join("HEAD").exists());
    }

    #[test]
    fn test_update_ref_strips_and_appends_newline() {
        let ofs_dir = new_ofs_dir();
        let ref_path = ofs_dir.path().join("refs/heads/topic");
        update_ref(&ref_path, "  007\n").unwrap();
        assert_eq!(fs::read_to_string(&ref_path).unwrap(), "007\n");
    }
}
