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
use std::io::Write as _;
use std::path::Path;
use std::path::PathBuf;

use ofs_lib::file_util;
use ofs_lib::index::IndexEntry;
use ofs_lib::working_tree;
use tracing::instrument;

use crate::cli_util::CommandError;
use crate::cli_util::workspace_repo;
use crate::ui::Ui;

/// Add files to the staging area
#[derive(clap::Args, Clone, Debug)]
pub(crate) struct AddArgs {
    /// Files or directories to add
    #[arg(required = true, value_name = "PATHS")]
    paths: Vec<String>,
}

#[instrument(skip_all)]
pub(crate) fn cmd_add(ui: &mut Ui, args: &AddArgs) -> Result<(), CommandError> {
    let repo = workspace_repo()?;
    let patterns = repo.ignore_patterns();
    let mut stdout = ui.stdout();

    // Expand the arguments into candidate files.
    let mut files_to_add: Vec<PathBuf> = vec![];
    for path_str in &args.paths {
        let path = Path::new(path_str);
        let abs_path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            repo.root().join(path)
        };

        if !abs_path.exists() {
            writeln!(stdout, "Warning: Path does not exist: {path_str}")?;
            continue;
        }
        if abs_path.is_dir() {
            files_to_add.extend(working_tree::collect_files(&abs_path, repo.root(), &patterns));
            continue;
        }
        let ignored = abs_path
            .strip_prefix(repo.root())
            .ok()
            .and_then(file_util::to_slash_string)
            .is_some_and(|rel| patterns.matches(&rel));
        if ignored {
            writeln!(stdout, "Ignored: {path_str}")?;
        } else {
            files_to_add.push(abs_path);
        }
    }

    if files_to_add.is_empty() {
        writeln!(stdout, "No files to add")?;
        return Err(CommandError::Failed);
    }

    let max_size = max_file_size(&repo);
    let mut staged_entries: Vec<IndexEntry> = vec![];
    let mut skipped = 0;

    for file_path in files_to_add {
        let name = file_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| file_path.display().to_string());

        if let Err(err) = file_util::check_file_size(&file_path, max_size) {
            writeln!(stdout, "Skipping {name}: {err}")?;
            skipped += 1;
            continue;
        }
        let rel_path = match file_path
            .strip_prefix(repo.root())
            .ok()
            .and_then(file_util::to_slash_string)
        {
            Some(rel_path) => rel_path,
            None => {
                writeln!(
                    stdout,
                    "Warning: {} is outside repository, skipping",
                    file_path.display()
                )?;
                skipped += 1;
                continue;
            }
        };
        let contents = match fs::read(&file_path) {
            Ok(contents) => contents,
            Err(err) => {
                writeln!(stdout, "Error adding {name}: {err}")?;
                skipped += 1;
                continue;
            }
        };

        let hash = repo.objects().store(&contents)?;
        let mtime = fs::metadata(&file_path)
            .ok()
            .and_then(|metadata| working_tree::file_mtime_millis(&metadata))
            .unwrap_or(0);
        staged_entries.push(IndexEntry::new(
            rel_path,
            hash,
            contents.len() as u64,
            mtime,
        ));
    }

    let staged = staged_entries.len();
    if staged > 0 {
        let mut index = repo.load_index();
        index.batch_add(staged_entries)?;
        writeln!(stdout, "Staged {staged} file(s)")?;
    }
    if skipped > 0 {
        writeln!(stdout, "Skipped {skipped} file(s)")?;
    }
    if staged == 0 {
        return Err(CommandError::Failed);
    }
    Ok(())
}

/// The configured size ceiling, or the built-in 100 MiB default.
fn max_file_size(repo: &ofs_lib::repo::Repository) -> u64 {
    repo.config()
        .ok()
        .and_then(|config| config.extra.get("max_file_size")?.as_u64())
        .unwrap_or(file_util::MAX_FILE_SIZE)
}
