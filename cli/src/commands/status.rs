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
use std::io::Write as _;

use crossterm::style::Color;
use itertools::Itertools as _;
use ofs_lib::working_tree;
use tracing::instrument;

use crate::cli_util::CommandError;
use crate::cli_util::workspace_repo;
use crate::formatter::Formatter;
use crate::formatter::write_colored;
use crate::ui::Ui;

/// Show the repository status
#[derive(clap::Args, Clone, Debug)]
pub(crate) struct StatusArgs {}

#[instrument(skip_all)]
pub(crate) fn cmd_status(ui: &mut Ui, StatusArgs {}: &StatusArgs) -> Result<(), CommandError> {
    let repo = workspace_repo()?;
    let index = repo.load_index();
    let staged_entries = index.entries();

    let patterns = repo.ignore_patterns();
    let working_files = working_tree::scan_working_tree(repo.root(), &patterns);

    let mut staged: BTreeSet<&str> = BTreeSet::new();
    let mut modified: BTreeSet<&str> = BTreeSet::new();
    for entry in &staged_entries {
        staged.insert(&entry.path);
        let abs_path = repo.root().join(&entry.path);
        if abs_path.exists() && !working_tree::file_matches_entry(&abs_path, entry) {
            modified.insert(&entry.path);
        }
    }
    let untracked = working_files
        .iter()
        .map(String::as_str)
        .filter(|path| !staged.contains(path))
        .collect_vec();

    let mut formatter = ui.stdout_formatter();
    print_status(formatter.as_mut(), &staged, &modified, &untracked)?;
    formatter.flush()?;
    Ok(())
}

fn print_status(
    formatter: &mut dyn Formatter,
    staged: &BTreeSet<&str>,
    modified: &BTreeSet<&str>,
    untracked: &[&str],
) -> Result<(), CommandError> {
    if staged.is_empty() && modified.is_empty() && untracked.is_empty() {
        writeln!(formatter, "Nothing to commit, working tree clean")?;
        return Ok(());
    }

    if !staged.is_empty() {
        writeln!(formatter, "Changes to be committed:")?;
        writeln!(formatter, "  (use \"ofs reset <file>...\" to unstage)")?;
        writeln!(formatter)?;
        for path in staged {
            let label = if modified.contains(path) {
                "modified:"
            } else {
                "new file:"
            };
            write_colored(formatter, Color::Green, format!("  {label}   {path}"))?;
            writeln!(formatter)?;
        }
        writeln!(formatter)?;
    }

    if !modified.is_empty() {
        writeln!(formatter, "Changes not staged for commit:")?;
        writeln!(
            formatter,
            "  (use \"ofs add <file>...\" to update what will be committed)"
        )?;
        writeln!(formatter)?;
        for path in modified {
            write_colored(formatter, Color::Red, format!("  modified:   {path}"))?;
            writeln!(formatter)?;
        }
        writeln!(formatter)?;
    }

    if !untracked.is_empty() {
        writeln!(formatter, "Untracked files:")?;
        writeln!(
            formatter,
            "  (use \"ofs add <file>...\" to include in what will be committed)"
        )?;
        writeln!(formatter)?;
        for path in untracked {
            write_colored(formatter, Color::Red, format!("  {path}"))?;
            writeln!(formatter)?;
        }
        writeln!(formatter)?;
    }
    Ok(())
}
