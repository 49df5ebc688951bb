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

use ofs_lib::commits;
use ofs_lib::commits::CommitStore;
use ofs_lib::commits::FileAction;
use ofs_lib::object_id::CommitId;
use pretty_assertions::assert_eq;
use testutils::TestRepo;
use testutils::file_entry;

#[test]
fn test_save_load_roundtrip() {
    let test_repo = TestRepo::init();
    let store = test_repo.repo.commits();

    let commit = commits::build_commit(
        CommitId::new("001"),
        None,
        "first",
        "jsmith",
        "js@example.com",
        vec![file_entry("a.txt", b"hi\n", FileAction::Added)],
    );
    store.save(&commit).unwrap();

    let loaded = store.load(&CommitId::new("001")).unwrap();
    assert_eq!(loaded, commit);
}

#[test]
fn test_commit_file_is_two_space_indented_json() {
    let test_repo = TestRepo::init();
    let store = test_repo.repo.commits();

    let commit = commits::build_commit(
        CommitId::new("001"),
        None,
        "first",
        "jsmith",
        "js@example.com",
        vec![file_entry("a.txt", b"hi\n", FileAction::Added)],
    );
    store.save(&commit).unwrap();

    let text =
        fs::read_to_string(store.commits_dir().join("001.json")).unwrap();
    assert!(text.starts_with("{\n  \"id\": \"001\""));
    assert!(text.contains("\"parent\": null"));
    assert!(text.contains("    {\n      \"path\": \"a.txt\""));
    assert!(text.contains("\"action\": \"added\""));
}

#[test]
fn test_load_missing_or_corrupt_is_none() {
    let test_repo = TestRepo::init();
    let store = test_repo.repo.commits();

    assert_eq!(store.load(&CommitId::new("404")), None);

    fs::write(store.commits_dir().join("005.json"), b"{broken").unwrap();
    assert_eq!(store.load(&CommitId::new("005")), None);

    // A failed load is not cached as a negative: once the file is valid it
    // loads fine through the same store.
    let commit = commits::build_commit(
        CommitId::new("005"),
        None,
        "fixed",
        "jsmith",
        "js@example.com",
        vec![],
    );
    fs::write(
        store.commits_dir().join("005.json"),
        serde_json::to_vec_pretty(&commit).unwrap(),
    )
    .unwrap();
    assert_eq!(store.load(&CommitId::new("005")), Some(commit));
}

#[test]
fn test_cache_is_scoped_to_the_store() {
    let test_repo = TestRepo::init();
    let store = test_repo.repo.commits();

    let commit = commits::build_commit(
        CommitId::new("001"),
        None,
        "original message",
        "jsmith",
        "js@example.com",
        vec![],
    );
    store.save(&commit).unwrap();
    assert_eq!(store.load(&CommitId::new("001")).unwrap().message, "original message");

    // Mutate the file out-of-band. The warm cache still serves the old
    // value; a fresh store (fresh repository handle) sees the new one.
    let mut edited = commit.clone();
    edited.message = "edited on disk".to_owned();
    fs::write(
        store.commits_dir().join("001.json"),
        serde_json::to_vec_pretty(&edited).unwrap(),
    )
    .unwrap();

    assert_eq!(
        store.load(&CommitId::new("001")).unwrap().message,
        "original message"
    );
    let fresh = CommitStore::new(store.commits_dir().to_path_buf());
    assert_eq!(
        fresh.load(&CommitId::new("001")).unwrap().message,
        "edited on disk"
    );
}

#[test]
fn test_loads_return_independent_copies() {
    let test_repo = TestRepo::init();
    let store = test_repo.repo.commits();

    let commit = commits::build_commit(
        CommitId::new("001"),
        None,
        "first",
        "jsmith",
        "js@example.com",
        vec![],
    );
    store.save(&commit).unwrap();

    let mut first = store.load(&CommitId::new("001")).unwrap();
    first.message = "mutated by caller".to_owned();
    assert_eq!(store.load(&CommitId::new("001")).unwrap().message, "first");
}

#[test]
fn test_list_is_numeric_descending_and_skips_corrupt() {
    let test_repo = TestRepo::init();
    let store = test_repo.repo.commits();

    for (id, parent) in [("002", Some("001")), ("001", None), ("1000", Some("999"))] {
        let commit = commits::build_commit(
            CommitId::new(id),
            parent.map(CommitId::new),
            format!("commit {id}"),
            "jsmith",
            "js@example.com",
            vec![],
        );
        store.save(&commit).unwrap();
    }
    fs::write(store.commits_dir().join("003.json"), b"not json").unwrap();

    let ids: Vec<String> = store
        .list()
        .into_iter()
        .map(|commit| commit.id.as_str().to_owned())
        .collect();
    // "1000" sorts above "002" because ordering is numeric, not
    // lexicographic.
    assert_eq!(ids, ["1000", "002", "001"]);
    assert_eq!(store.count(), 4);
}

#[test]
fn test_parent_commit() {
    let test_repo = TestRepo::init();
    let store = test_repo.repo.commits();

    let first = test_repo.commit_files(
        "first",
        None,
        vec![file_entry("a.txt", b"hi\n", FileAction::Added)],
    );
    let second = test_repo.commit_files(
        "second",
        Some(&first.id),
        vec![file_entry("a.txt", b"hi2\n", FileAction::Modified)],
    );

    assert_eq!(store.parent_commit(&second.id).unwrap().id, first.id);
    assert_eq!(store.parent_commit(&first.id), None);
}

#[test]
fn test_tree_state_folds_actions_oldest_first() {
    let test_repo = TestRepo::init();
    let store = test_repo.repo.commits();

    let first = test_repo.commit_files(
        "add a",
        None,
        vec![file_entry("a.txt", b"hi\n", FileAction::Added)],
    );
    let second = test_repo.commit_files(
        "modify a",
        Some(&first.id),
        vec![file_entry("a.txt", b"hi2\n", FileAction::Modified)],
    );
    let third = test_repo.commit_files(
        "drop a, add b",
        Some(&second.id),
        vec![
            file_entry("b.txt", b"b", FileAction::Added),
            file_entry("a.txt", b"hi2\n", FileAction::Deleted),
        ],
    );

    let tree1 = store.tree_state(&first.id);
    assert_eq!(
        tree1["a.txt"].hash,
        Some(ofs_lib::hash::hash_bytes(b"hi\n"))
    );

    let tree2 = store.tree_state(&second.id);
    assert_eq!(tree2.len(), 1);
    assert_eq!(
        tree2["a.txt"].hash,
        Some(ofs_lib::hash::hash_bytes(b"hi2\n"))
    );

    let tree3 = store.tree_state(&third.id);
    assert_eq!(tree3.keys().collect::<Vec<_>>(), ["b.txt"]);
}

#[test]
fn test_tree_state_with_missing_parent_treats_chain_as_ended() {
    let test_repo = TestRepo::init();
    let store = test_repo.repo.commits();

    // "002" claims parent "001", which does not exist.
    let orphan = commits::build_commit(
        CommitId::new("002"),
        Some(CommitId::new("001")),
        "orphan",
        "jsmith",
        "js@example.com",
        vec![file_entry("b.txt", b"b", FileAction::Added)],
    );
    store.save(&orphan).unwrap();

    let tree = store.tree_state(&CommitId::new("002"));
    assert_eq!(tree.keys().collect::<Vec<_>>(), ["b.txt"]);
}

#[test]
fn test_unknown_commit_fields_roundtrip() {
    let test_repo = TestRepo::init();
    let store = test_repo.repo.commits();

    let mut commit = commits::build_commit(
        CommitId::new("001"),
        None,
        "first",
        "jsmith",
        "js@example.com",
        vec![],
    );
    commit
        .extra
        .insert("signed_off_by".to_owned(), serde_json::json!("someone"));
    store.save(&commit).unwrap();

    let fresh = CommitStore::new(store.commits_dir().to_path_buf());
    let loaded = fresh.load(&CommitId::new("001")).unwrap();
    assert_eq!(loaded.extra["signed_off_by"], "someone");
}
