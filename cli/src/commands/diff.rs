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

use std::collections::BTreeSet;
use std::fs;
use std::io::Stdout;
use std::io::Write as _;

use ofs_lib::diff;
use ofs_lib::diff::DiffClass;
use ofs_lib::object_id::CommitId;
use ofs_lib::refs;
use ofs_lib::repo::Repository;
use ofs_lib::working_tree;
use tracing::instrument;

use crate::cli_util::CommandError;
use crate::cli_util::user_error;
use crate::cli_util::workspace_repo;
use crate::ui::Ui;

/// Show changes between the working tree, the index, and commits
///
/// With no arguments, shows unstaged changes (working tree vs. index). With
/// `--cached`, shows staged changes (index vs. HEAD). With one commit id,
/// compares the working tree against that commit; with two, compares the two
/// commits.
#[derive(clap::Args, Clone, Debug)]
pub(crate) struct DiffArgs {
    /// First commit ID
    #[arg(value_name = "COMMIT1")]
    commit1: Option<String>,
    /// Second commit ID
    #[arg(value_name = "COMMIT2")]
    commit2: Option<String>,
    /// Show staged changes against HEAD
    #[arg(long, conflicts_with_all = ["commit1", "commit2"])]
    cached: bool,
}

#[instrument(skip_all)]
pub(crate) fn cmd_diff(ui: &mut Ui, args: &DiffArgs) -> Result<(), CommandError> {
    let repo = workspace_repo()?;
    let mut stdout = ui.stdout();
    match (&args.commit1, &args.commit2) {
        (Some(commit1), Some(commit2)) => {
            diff_commits(&mut stdout, &repo, commit1, commit2)
        }
        (Some(commit1), None) => diff_working_vs_commit(&mut stdout, &repo, commit1),
        (None, _) if args.cached => diff_staged_vs_head(&mut stdout, &repo),
        (None, _) => diff_working_vs_staged(&mut stdout, &repo),
    }
}

/// Working tree vs. staging area (unstaged changes).
fn diff_working_vs_staged(stdout: &mut Stdout, repo: &Repository) -> Result<(), CommandError> {
    let index = repo.load_index();
    let staged_entries = index.entries();
    if staged_entries.is_empty() {
        writeln!(
            stdout,
            "No files staged. Use 'ofs add <file>' to stage changes."
        )?;
        return Ok(());
    }

    let mut has_changes = false;
    for entry in &staged_entries {
        let file_path = repo.root().join(&entry.path);
        if file_path.exists() {
            let working_contents = fs::read(&file_path)?;
            let staged_contents = repo.objects().retrieve(&entry.hash)?;
            if working_contents != staged_contents {
                has_changes = true;
                print_file_diff(
                    stdout,
                    &staged_contents,
                    &working_contents,
                    &entry.path,
                    DiffClass::Modified,
                )?;
            }
        } else {
            has_changes = true;
            print_header_only(stdout, &entry.path, DiffClass::Deleted)?;
        }
    }

    if !has_changes {
        writeln!(stdout, "No unstaged changes")?;
    }
    Ok(())
}

/// Staging area vs. HEAD (staged changes).
fn diff_staged_vs_head(stdout: &mut Stdout, repo: &Repository) -> Result<(), CommandError> {
    let index = repo.load_index();
    let staged_entries = index.entries();

    let Some(head_id) = refs::resolve_head(repo.ofs_dir()) else {
        // No commits yet: every staged entry is new.
        if staged_entries.is_empty() {
            writeln!(stdout, "No changes staged for commit")?;
            return Ok(());
        }
        for entry in &staged_entries {
            let staged_contents = repo.objects().retrieve(&entry.hash)?;
            print_file_diff(stdout, b"", &staged_contents, &entry.path, DiffClass::New)?;
        }
        return Ok(());
    };

    let head_tree = repo.commits().tree_state(&head_id);
    let mut has_changes = false;

    for entry in &staged_entries {
        match head_tree.get(&entry.path) {
            Some(head_entry) => {
                if head_entry.hash.as_ref() == Some(&entry.hash) {
                    continue;
                }
                has_changes = true;
                let head_contents = match &head_entry.hash {
                    Some(hash) => repo.objects().retrieve(hash)?,
                    None => vec![],
                };
                let staged_contents = repo.objects().retrieve(&entry.hash)?;
                print_file_diff(
                    stdout,
                    &head_contents,
                    &staged_contents,
                    &entry.path,
                    DiffClass::Modified,
                )?;
            }
            None => {
                has_changes = true;
                let staged_contents = repo.objects().retrieve(&entry.hash)?;
                print_file_diff(stdout, b"", &staged_contents, &entry.path, DiffClass::New)?;
            }
        }
    }

    // Paths in HEAD but not staged read as deletions.
    for path in head_tree.keys() {
        if index.find(path).is_none() {
            has_changes = true;
            print_header_only(stdout, path, DiffClass::Deleted)?;
        }
    }

    if !has_changes {
        writeln!(stdout, "No changes staged for commit")?;
    }
    Ok(())
}

/// Working tree vs. one commit.
fn diff_working_vs_commit(
    stdout: &mut Stdout,
    repo: &Repository,
    commit_id: &str,
) -> Result<(), CommandError> {
    let commit_id = CommitId::new(commit_id);
    if repo.commits().load(&commit_id).is_none() {
        return Err(user_error(format!("Commit '{commit_id}' not found")));
    }
    let commit_tree = repo.commits().tree_state(&commit_id);

    let patterns = repo.ignore_patterns();
    let working_files = working_tree::scan_working_tree(repo.root(), &patterns);

    let mut all_paths: BTreeSet<&str> = commit_tree.keys().map(String::as_str).collect();
    all_paths.extend(working_files.iter().map(String::as_str));

    let mut has_changes = false;
    for path in all_paths {
        let file_path = repo.root().join(path);
        let commit_entry = commit_tree.get(path);
        let in_working = file_path.exists();

        match (commit_entry, in_working) {
            (Some(entry), true) => {
                let commit_contents = match &entry.hash {
                    Some(hash) => repo.objects().retrieve(hash)?,
                    None => vec![],
                };
                let working_contents = fs::read(&file_path)?;
                if commit_contents != working_contents {
                    has_changes = true;
                    print_file_diff(
                        stdout,
                        &commit_contents,
                        &working_contents,
                        path,
                        DiffClass::Modified,
                    )?;
                }
            }
            (Some(_), false) => {
                has_changes = true;
                print_header_only(stdout, path, DiffClass::Deleted)?;
            }
            (None, true) => {
                has_changes = true;
                let working_contents = fs::read(&file_path)?;
                print_file_diff(stdout, b"", &working_contents, path, DiffClass::New)?;
            }
            (None, false) => {}
        }
    }

    if !has_changes {
        writeln!(
            stdout,
            "No differences between working directory and commit {commit_id}"
        )?;
    }
    Ok(())
}

/// One commit vs. another.
fn diff_commits(
    stdout: &mut Stdout,
    repo: &Repository,
    commit1: &str,
    commit2: &str,
) -> Result<(), CommandError> {
    let id1 = CommitId::new(commit1);
    let id2 = CommitId::new(commit2);
    if repo.commits().load(&id1).is_none() {
        return Err(user_error(format!("Commit '{id1}' not found")));
    }
    if repo.commits().load(&id2).is_none() {
        return Err(user_error(format!("Commit '{id2}' not found")));
    }

    let tree1 = repo.commits().tree_state(&id1);
    let tree2 = repo.commits().tree_state(&id2);

    let mut all_paths: BTreeSet<&str> = tree1.keys().map(String::as_str).collect();
    all_paths.extend(tree2.keys().map(String::as_str));

    let mut has_changes = false;
    for path in all_paths {
        match (tree1.get(path), tree2.get(path)) {
            (Some(entry1), Some(entry2)) => {
                if entry1.hash == entry2.hash {
                    continue;
                }
                has_changes = true;
                let contents1 = match &entry1.hash {
                    Some(hash) => repo.objects().retrieve(hash)?,
                    None => vec![],
                };
                let contents2 = match &entry2.hash {
                    Some(hash) => repo.objects().retrieve(hash)?,
                    None => vec![],
                };
                print_file_diff(stdout, &contents1, &contents2, path, DiffClass::Modified)?;
            }
            (Some(_), None) => {
                has_changes = true;
                print_header_only(stdout, path, DiffClass::Deleted)?;
            }
            (None, Some(entry2)) => {
                has_changes = true;
                let contents2 = match &entry2.hash {
                    Some(hash) => repo.objects().retrieve(hash)?,
                    None => vec![],
                };
                print_file_diff(stdout, b"", &contents2, path, DiffClass::New)?;
            }
            (None, None) => {}
        }
    }

    if !has_changes {
        writeln!(stdout, "No differences between commits {id1} and {id2}")?;
    }
    Ok(())
}

fn print_file_diff(
    stdout: &mut Stdout,
    old_contents: &[u8],
    new_contents: &[u8],
    path: &str,
    class: DiffClass,
) -> Result<(), CommandError> {
    for line in diff::diff_header(path, path, Some(class)) {
        writeln!(stdout, "{line}")?;
    }
    let lines = diff::file_diff(
        old_contents,
        new_contents,
        &format!("a/{path}"),
        &format!("b/{path}"),
        diff::DEFAULT_CONTEXT_LINES,
    );
    for line in lines {
        writeln!(stdout, "{line}")?;
    }
    writeln!(stdout)?;
    Ok(())
}

fn print_header_only(
    stdout: &mut Stdout,
    path: &str,
    class: DiffClass,
) -> Result<(), CommandError> {
    for line in diff::diff_header(path, path, Some(class)) {
        writeln!(stdout, "{line}")?;
    }
    writeln!(stdout)?;
    Ok(())
}
