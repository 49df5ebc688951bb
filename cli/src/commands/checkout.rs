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
use std::io::BufRead as _;
use std::io::Write as _;

use ofs_lib::file_util;
use ofs_lib::index::IndexEntry;
use ofs_lib::object_id::CommitId;
use ofs_lib::refs;
use ofs_lib::repo::Repository;
use tracing::instrument;

use crate::cli_util::CommandError;
use crate::cli_util::user_error;
use crate::cli_util::user_error_with_hint;
use crate::cli_util::workspace_repo;
use crate::ui::Ui;

/// Restore the working tree to a previous commit (detaches HEAD)
#[derive(clap::Args, Clone, Debug)]
pub(crate) struct CheckoutArgs {
    /// Commit ID to check out
    #[arg(value_name = "COMMIT_ID")]
    commit_id: String,
    /// Discard uncommitted staged changes without prompting
    #[arg(long)]
    force: bool,
}

#[instrument(skip_all)]
pub(crate) fn cmd_checkout(ui: &mut Ui, args: &CheckoutArgs) -> Result<(), CommandError> {
    let repo = workspace_repo()?;
    let commit_id = CommitId::new(args.commit_id.clone());

    let Some(commit) = repo.commits().load(&commit_id) else {
        return Err(user_error_with_hint(
            format!("Commit '{commit_id}' not found"),
            "Use 'ofs log' to see available commits",
        ));
    };

    if !args.force && !confirm_discarding_staged_changes(ui, &repo, &commit_id)? {
        writeln!(ui.stdout(), "Checkout cancelled")?;
        return Err(CommandError::Failed);
    }

    let tree = repo.commits().tree_state(&commit_id);

    // Require every referenced blob before touching the working tree, so a
    // failed precondition has no side effects.
    for entry in tree.values() {
        let Some(hash) = &entry.hash else {
            return Err(user_error(format!(
                "Commit corrupted (missing hash for {})",
                entry.path
            )));
        };
        if !repo.objects().exists(hash) {
            return Err(user_error_with_hint(
                format!("Object not found: {hash}"),
                format!("Required for: {}", entry.path),
            ));
        }
    }

    let mut stdout = ui.stdout();

    // Remove files live in the current HEAD's tree but absent from the
    // target. Failures here are warnings, not fatal.
    let mut removed = 0;
    if let Some(current_id) = refs::resolve_head(repo.ofs_dir()) {
        let current_tree = repo.commits().tree_state(&current_id);
        for path in current_tree.keys() {
            if tree.contains_key(path) {
                continue;
            }
            let abs_path = repo.root().join(path);
            if !abs_path.exists() {
                continue;
            }
            match fs::remove_file(&abs_path) {
                Ok(()) => removed += 1,
                Err(err) => {
                    writeln!(stdout, "Warning: Could not remove {path}: {err}")?;
                }
            }
        }
    }

    // Restore every file of the target tree. retrieve() re-hashes on read,
    // so a corrupt blob aborts the operation here.
    let mut restored = 0;
    for entry in tree.values() {
        let Some(hash) = &entry.hash else {
            continue;
        };
        let contents = repo.objects().retrieve(hash)?;
        file_util::write_atomic(&repo.root().join(&entry.path), &contents)?;
        restored += 1;
    }

    // Rebuild the index to mirror the target tree, then detach HEAD.
    let mut index = repo.load_index();
    index.clear()?;
    let entries: Vec<IndexEntry> = tree
        .values()
        .filter_map(|tree_entry| {
            let hash = tree_entry.hash.clone()?;
            let mut entry = IndexEntry::new(tree_entry.path.clone(), hash, tree_entry.size, 0);
            entry.mode = tree_entry.mode.clone();
            Some(entry)
        })
        .collect();
    index.batch_add(entries)?;
    refs::update_head(repo.ofs_dir(), &commit_id, true)?;

    writeln!(
        stdout,
        "[OK] Checked out to commit {commit_id} \"{}\"",
        commit.message
    )?;
    writeln!(stdout, "  {restored} file(s) restored")?;
    if removed > 0 {
        writeln!(stdout, "  {removed} file(s) removed")?;
    }
    Ok(())
}

/// Warns about staged changes and prompts for confirmation. Returns whether
/// the checkout should proceed.
fn confirm_discarding_staged_changes(
    ui: &mut Ui,
    repo: &Repository,
    commit_id: &CommitId,
) -> Result<bool, CommandError> {
    let index = repo.load_index();
    if !index.has_changes() {
        return Ok(true);
    }
    let mut stdout = ui.stdout();
    writeln!(
        stdout,
        "[WARNING] You have uncommitted changes in the staging area"
    )?;
    writeln!(stdout, "These changes will be LOST if you proceed.")?;
    writeln!(stdout)?;
    writeln!(stdout, "Your uncommitted changes:")?;
    let entries = index.entries();
    for entry in entries.iter().take(5) {
        writeln!(stdout, "  - {}", entry.path)?;
    }
    if entries.len() > 5 {
        writeln!(stdout, "  ... and {} more file(s)", entries.len() - 5)?;
    }
    writeln!(stdout)?;
    writeln!(stdout, "Options:")?;
    writeln!(stdout, "  1. Commit your changes:  ofs commit -m 'save work'")?;
    writeln!(
        stdout,
        "  2. Force checkout:       ofs checkout {commit_id} --force"
    )?;
    writeln!(stdout)?;
    write!(stdout, "Continue anyway? (y/N): ")?;
    stdout.flush()?;

    let mut response = String::new();
    std::io::stdin().lock().read_line(&mut response)?;
    let proceed = response.trim().eq_ignore_ascii_case("y");
    if proceed {
        writeln!(stdout)?;
    }
    Ok(proceed)
}
