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

use std::fs;

use ofs_lib::commits::FileAction;
use ofs_lib::hash;
use ofs_lib::refs;
use ofs_lib::repo::Repository;
use ofs_lib::verify::verify_repository;
use testutils::TestRepo;
use testutils::file_entry;

/// A fresh handle, so verification never reads a warm commit cache.
fn reopen(test_repo: &TestRepo) -> Repository {
    Repository::new(test_repo.root())
}

#[test]
fn test_fresh_repository_verifies_clean() {
    let test_repo = TestRepo::init();
    let report = verify_repository(&test_repo.repo);
    assert!(report.ok(), "unexpected errors: {report:?}");
    assert_eq!(report.error_count(), 0);
}

#[test]
fn test_populated_repository_verifies_clean() {
    let test_repo = TestRepo::init();
    test_repo.stage_file("a.txt", b"hi\n");
    test_repo.commit_files(
        "first",
        None,
        vec![file_entry("a.txt", b"hi\n", FileAction::Added)],
    );

    let report = verify_repository(&reopen(&test_repo));
    assert!(report.ok(), "unexpected errors: {report:?}");
}

#[test]
fn test_corrupt_object_fails_objects_axis() {
    let test_repo = TestRepo::init();
    let id = test_repo.repo.objects().store(b"hi\n").unwrap();
    fs::write(test_repo.repo.objects().object_path(&id), b"xx").unwrap();

    let report = verify_repository(&reopen(&test_repo));
    assert!(!report.objects.ok);
    assert!(report.objects.errors[0].starts_with("Hash mismatch:"));
    assert!(!report.ok());
}

#[test]
fn test_temp_leftovers_and_dotfiles_are_ignored() {
    let test_repo = TestRepo::init();
    let objects_dir = test_repo.repo.objects().objects_dir().to_path_buf();
    fs::create_dir_all(objects_dir.join("ab")).unwrap();
    fs::write(objects_dir.join("ab").join("cdef.tmp"), b"partial").unwrap();
    fs::write(objects_dir.join("ab").join(".hidden"), b"meta").unwrap();

    let report = verify_repository(&reopen(&test_repo));
    assert!(report.objects.ok, "unexpected errors: {report:?}");
}

#[test]
fn test_index_referencing_missing_object_fails() {
    let test_repo = TestRepo::init();
    let missing = hash::hash_bytes(b"never stored");
    let index_json = serde_json::json!([{
        "path": "a.txt",
        "hash": missing.hex(),
        "size": 3,
        "mode": "100644",
        "mtime": 0,
    }]);
    fs::write(
        test_repo.repo.index_file(),
        serde_json::to_vec_pretty(&index_json).unwrap(),
    )
    .unwrap();

    let report = verify_repository(&reopen(&test_repo));
    assert!(!report.index.ok);
    assert!(report.index.errors[0].contains("missing object"));
}

#[test]
fn test_unparseable_index_fails() {
    let test_repo = TestRepo::init();
    fs::write(test_repo.repo.index_file(), b"{oops").unwrap();

    let report = verify_repository(&reopen(&test_repo));
    assert!(!report.index.ok);
    assert!(report.index.errors[0].contains("invalid JSON"));
}

#[test]
fn test_missing_index_passes() {
    let test_repo = TestRepo::init();
    fs::remove_file(test_repo.repo.index_file()).unwrap();
    let report = verify_repository(&reopen(&test_repo));
    assert!(report.index.ok);
}

#[test]
fn test_commit_referencing_missing_object_fails() {
    let test_repo = TestRepo::init();
    // The blob for a.txt is never stored.
    test_repo.commit_files(
        "first",
        None,
        vec![file_entry("a.txt", b"hi\n", FileAction::Added)],
    );

    let report = verify_repository(&reopen(&test_repo));
    assert!(!report.commits.ok);
    assert!(report.commits.errors[0].contains("missing object"));
}

#[test]
fn test_deleted_entries_need_no_object() {
    let test_repo = TestRepo::init();
    test_repo.stage_file("a.txt", b"hi\n");
    let first = test_repo.commit_files(
        "first",
        None,
        vec![file_entry("a.txt", b"hi\n", FileAction::Added)],
    );
    // The deletion references a.txt's hash, but deleted entries are not
    // required to have their blob present.
    test_repo.commit_files(
        "drop a",
        Some(&first.id),
        vec![file_entry("a.txt", b"hi\n", FileAction::Deleted)],
    );

    let report = verify_repository(&reopen(&test_repo));
    assert!(report.commits.ok, "unexpected errors: {report:?}");
}

#[test]
fn test_corrupt_commit_file_fails() {
    let test_repo = TestRepo::init();
    fs::write(
        test_repo.repo.commits().commits_dir().join("001.json"),
        b"{broken",
    )
    .unwrap();

    let report = verify_repository(&reopen(&test_repo));
    assert!(!report.commits.ok);
    assert!(report.commits.errors[0].starts_with("Commit file 001.json corrupted"));
}

#[test]
fn test_missing_head_fails_refs_axis() {
    let test_repo = TestRepo::init();
    fs::remove_file(test_repo.repo.head_file()).unwrap();

    let report = verify_repository(&reopen(&test_repo));
    assert!(!report.refs.ok);
    assert_eq!(report.refs.errors, ["HEAD file missing"]);
}

#[test]
fn test_empty_head_passes_refs_axis() {
    let test_repo = TestRepo::init();
    fs::write(test_repo.repo.head_file(), b"").unwrap();
    let report = verify_repository(&reopen(&test_repo));
    assert!(report.refs.ok);
}

#[test]
fn test_head_pointing_at_unknown_commit_fails() {
    let test_repo = TestRepo::init();
    refs::update_head(
        test_repo.repo.ofs_dir(),
        &ofs_lib::object_id::CommitId::new("042"),
        false,
    )
    .unwrap();

    let report = verify_repository(&reopen(&test_repo));
    assert!(!report.refs.ok);
    assert_eq!(
        report.refs.errors,
        ["HEAD points to non-existent commit: 042"]
    );
}
