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

use ofs_lib::commits::Commit;
use ofs_lib::commits::FileAction;
use tracing::instrument;

use crate::cli_util::CommandError;
use crate::cli_util::workspace_repo;
use crate::ui::Ui;

/// Show the commit history, newest first
#[derive(clap::Args, Clone, Debug)]
pub(crate) struct LogArgs {
    /// Limit the number of commits shown
    #[arg(long = "number", short = 'n', value_name = "N")]
    number: Option<usize>,
    /// Show one commit per line
    #[arg(long)]
    oneline: bool,
}

#[instrument(skip_all)]
pub(crate) fn cmd_log(ui: &mut Ui, args: &LogArgs) -> Result<(), CommandError> {
    let repo = workspace_repo()?;
    let mut commits = repo.commits().list();
    let mut stdout = ui.stdout();

    if commits.is_empty() {
        writeln!(stdout, "No commits yet")?;
        writeln!(
            stdout,
            "Hint: Use 'ofs commit -m \"message\"' to create your first commit"
        )?;
        return Ok(());
    }

    if let Some(limit) = args.number
        && limit > 0
    {
        commits.truncate(limit);
    }

    if args.oneline {
        for commit in &commits {
            print_oneline(&mut stdout, commit)?;
        }
    } else {
        for (i, commit) in commits.iter().enumerate() {
            print_full(&mut stdout, commit)?;
            if i + 1 < commits.len() {
                writeln!(stdout)?;
            }
        }
    }
    Ok(())
}

/// Splits an ISO-8601 timestamp into date and time-of-day display parts.
fn split_timestamp(timestamp: &str, time_len: usize) -> (String, String) {
    match timestamp.split_once('T') {
        Some((date, time)) => (date.to_owned(), time.chars().take(time_len).collect()),
        None => (timestamp.chars().take(10).collect(), String::new()),
    }
}

fn action_symbol(action: FileAction) -> char {
    match action {
        FileAction::Added => '+',
        FileAction::Modified => 'M',
        FileAction::Deleted => '-',
        FileAction::Unchanged => '?',
    }
}

fn print_full(stdout: &mut impl std::io::Write, commit: &Commit) -> Result<(), CommandError> {
    writeln!(stdout, "Commit {}", commit.id)?;
    writeln!(stdout, "Author: {}", commit.author)?;
    let (date, time) = split_timestamp(&commit.timestamp, 8);
    writeln!(stdout, "Date:   {date} {time}")?;
    writeln!(stdout)?;
    writeln!(stdout, "    {}", commit.message)?;
    writeln!(stdout)?;

    if !commit.files.is_empty() {
        writeln!(stdout, "    Changes:")?;
        for file in &commit.files {
            writeln!(
                stdout,
                "      {} {} ({} bytes)",
                action_symbol(file.action),
                file.path,
                file.size
            )?;
        }
        writeln!(stdout)?;
    }
    Ok(())
}

fn print_oneline(stdout: &mut impl std::io::Write, commit: &Commit) -> Result<(), CommandError> {
    let (date, time) = split_timestamp(&commit.timestamp, 5);
    writeln!(
        stdout,
        "{} {date} {time} {:<10} {}",
        commit.id, commit.author, commit.message
    )?;
    Ok(())
}
