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

use std::io::Write as _;

use ofs_lib::commits;
use ofs_lib::commits::FileAction;
use ofs_lib::commits::TreeState;
use ofs_lib::refs;
use tracing::instrument;

use crate::cli_util::CommandError;
use crate::cli_util::user_error;
use crate::cli_util::user_error_with_hint;
use crate::cli_util::workspace_repo;
use crate::ui::Ui;

/// Minimum commit message length, after trimming.
const MIN_MESSAGE_LEN: usize = 3;

/// Record staged changes as a new commit
#[derive(clap::Args, Clone, Debug)]
pub(crate) struct CommitArgs {
    /// Commit message
    #[arg(long, short)]
    message: String,
}

#[instrument(skip_all)]
pub(crate) fn cmd_commit(ui: &mut Ui, args: &CommitArgs) -> Result<(), CommandError> {
    let repo = workspace_repo()?;

    let message = args.message.trim();
    if message.chars().count() < MIN_MESSAGE_LEN {
        return Err(user_error_with_hint(
            "Commit message too short (min 3 characters)",
            "Usage: ofs commit -m \"Your message here\"",
        ));
    }

    let mut index = repo.load_index();
    let staged = index.entries();
    if staged.is_empty() {
        return Err(user_error_with_hint(
            "Nothing to commit",
            "Use 'ofs add <file>' to stage changes",
        ));
    }

    let commit_id = commits::generate_commit_id(repo.commits().commits_dir());
    let parent_id = refs::resolve_head(repo.ofs_dir());
    let parent_tree = match &parent_id {
        Some(parent_id) => repo.commits().tree_state(parent_id),
        None => TreeState::new(),
    };

    let mut files = commits::file_actions(&staged, &parent_tree);
    files.retain(|file| file.action != FileAction::Unchanged);
    if files.is_empty() {
        return Err(user_error("No changes to commit (all files unchanged)"));
    }

    let config = repo.config()?;
    let commit = commits::build_commit(
        commit_id.clone(),
        parent_id,
        message,
        config.author,
        config.email,
        files,
    );

    // Ordering matters for crash safety: the commit file is durable before
    // the ref moves, and the ref moves before the index is cleared.
    repo.commits().save(&commit)?;
    refs::update_head(repo.ofs_dir(), &commit_id, false)?;
    index.clear()?;

    let branch = refs::head_branch(repo.ofs_dir()).unwrap_or_else(|| "detached".to_owned());
    let mut stdout = ui.stdout();
    writeln!(stdout, "[{branch} {commit_id}] {message}")?;

    let count_of = |action: FileAction| {
        commit
            .files
            .iter()
            .filter(|file| file.action == action)
            .count()
    };
    let added = count_of(FileAction::Added);
    let modified = count_of(FileAction::Modified);
    let deleted = count_of(FileAction::Deleted);
    writeln!(stdout, " {} file(s) changed", added + modified + deleted)?;
    if added > 0 {
        writeln!(stdout, " {added} file(s) added")?;
    }
    if modified > 0 {
        writeln!(stdout, " {modified} file(s) modified")?;
    }
    if deleted > 0 {
        writeln!(stdout, " {deleted} file(s) deleted")?;
    }
    Ok(())
}
