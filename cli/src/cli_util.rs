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

//! Shared plumbing for command implementations: error classification,
//! repository discovery, and process-level reporting.

use std::error::Error as _;
use std::io;
use std::io::Write as _;
use std::process::ExitCode;

use crossterm::style::Color;
use ofs_lib::commits::CommitStoreError;
use ofs_lib::file_util::PathError;
use ofs_lib::hash::HashError;
use ofs_lib::index::IndexError;
use ofs_lib::object_store::ObjectStoreError;
use ofs_lib::repo::RepoError;
use ofs_lib::repo::Repository;
use thiserror::Error;

use crate::formatter::write_colored;
use crate::ui::Ui;

/// How a command run went wrong.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Bad usage or an unsatisfied precondition; reported as
    /// `Error: <message>` plus any hints.
    #[error("{message}")]
    User {
        message: String,
        hints: Vec<String>,
    },
    /// The command already wrote its diagnostics; only the exit code
    /// remains.
    #[error("Command failed")]
    Failed,
    /// An unexpected failure inside the engine or the OS.
    #[error(transparent)]
    Internal(Box<dyn std::error::Error + Send + Sync>),
}

pub fn user_error(message: impl Into<String>) -> CommandError {
    CommandError::User {
        message: message.into(),
        hints: vec![],
    }
}

pub fn user_error_with_hint(message: impl Into<String>, hint: impl Into<String>) -> CommandError {
    CommandError::User {
        message: message.into(),
        hints: vec![hint.into()],
    }
}

pub fn internal_error(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> CommandError {
    CommandError::Internal(err.into())
}

impl From<io::Error> for CommandError {
    fn from(err: io::Error) -> Self {
        internal_error(err)
    }
}

impl From<PathError> for CommandError {
    fn from(err: PathError) -> Self {
        internal_error(err)
    }
}

impl From<ObjectStoreError> for CommandError {
    fn from(err: ObjectStoreError) -> Self {
        match &err {
            ObjectStoreError::ObjectNotFound { .. } | ObjectStoreError::Corrupt { .. } => {
                user_error(err.to_string())
            }
            _ => internal_error(err),
        }
    }
}

impl From<IndexError> for CommandError {
    fn from(err: IndexError) -> Self {
        internal_error(err)
    }
}

impl From<CommitStoreError> for CommandError {
    fn from(err: CommitStoreError) -> Self {
        internal_error(err)
    }
}

impl From<HashError> for CommandError {
    fn from(err: HashError) -> Self {
        match &err {
            HashError::InvalidHashFormat(_) => user_error(err.to_string()),
            HashError::Io(_) => internal_error(err),
        }
    }
}

impl From<RepoError> for CommandError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotInitialized => user_error_with_hint(
                "Not an OFS repository",
                "Run 'ofs init' to create a repository",
            ),
            RepoError::AlreadyExists { path } => user_error(format!(
                "Repository already initialized in {}",
                path.display()
            )),
            err => internal_error(err),
        }
    }
}

/// Opens the repository containing the current directory, or fails with the
/// standard "not a repository" user error.
pub fn workspace_repo() -> Result<Repository, CommandError> {
    let cwd = std::env::current_dir()?;
    let repo = Repository::new(cwd);
    if !repo.is_initialized() {
        return Err(RepoError::NotInitialized.into());
    }
    Ok(repo)
}

/// Reports the command outcome and picks the process exit code: 0 on
/// success, 1 on any command failure. (Argument-parsing errors exit 2, via
/// clap.)
pub fn handle_command_result(ui: &Ui, result: Result<(), CommandError>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(CommandError::Failed) => ExitCode::FAILURE,
        Err(CommandError::User { message, hints }) => {
            let mut formatter = ui.stderr_formatter();
            let _ = write_colored(formatter.as_mut(), Color::Red, format!("Error: {message}"));
            let _ = writeln!(formatter);
            for hint in hints {
                let _ = writeln!(formatter, "Hint: {hint}");
            }
            let _ = formatter.flush();
            ExitCode::FAILURE
        }
        Err(CommandError::Internal(err)) => {
            let mut formatter = ui.stderr_formatter();
            let _ = write_colored(formatter.as_mut(), Color::Red, format!("Error: {err}"));
            let _ = writeln!(formatter);
            let mut source = err.source();
            while let Some(err) = source {
                let _ = writeln!(formatter, "Caused by: {err}");
                source = err.source();
            }
            let _ = formatter.flush();
            ExitCode::FAILURE
        }
    }
}

/// Installs the env-filtered tracing subscriber on stderr.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();
}
