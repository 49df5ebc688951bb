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

use crossterm::style::Color;
use ofs_lib::verify;
use tracing::instrument;

use crate::cli_util::CommandError;
use crate::cli_util::workspace_repo;
use crate::formatter::write_colored;
use crate::ui::Ui;

/// Verify repository integrity
#[derive(clap::Args, Clone, Debug)]
pub(crate) struct VerifyArgs {
    /// Show detailed output
    #[arg(long)]
    verbose: bool,
}

fn axis_display_name(key: &str) -> &'static str {
    match key {
        "objects" => "Object Store",
        "index" => "Index",
        "commits" => "Commit History",
        "refs" => "References",
        _ => "Unknown",
    }
}

#[instrument(skip_all)]
pub(crate) fn cmd_verify(ui: &mut Ui, args: &VerifyArgs) -> Result<(), CommandError> {
    let repo = workspace_repo()?;

    let mut formatter = ui.stdout_formatter();
    writeln!(formatter, "Verifying repository integrity...")?;
    writeln!(formatter)?;

    let report = verify::verify_repository(&repo);

    for (key, axis) in report.axes() {
        let name = axis_display_name(key);
        if axis.ok {
            write_colored(formatter.as_mut(), Color::Green, format!("✓ {name}: OK"))?;
            writeln!(formatter)?;
        } else {
            write_colored(formatter.as_mut(), Color::Red, format!("✗ {name}: FAILED"))?;
            writeln!(formatter)?;
            for error in &axis.errors {
                writeln!(formatter, "  - {error}")?;
            }
        }
    }
    writeln!(formatter)?;

    if report.ok() {
        writeln!(formatter, "✓ Repository verification passed")?;
        writeln!(formatter, "  All checks successful")?;
        formatter.flush()?;
        return Ok(());
    }

    writeln!(formatter, "✗ Repository verification failed")?;
    writeln!(formatter, "  {} error(s) found", report.error_count())?;
    if !args.verbose {
        writeln!(formatter)?;
        writeln!(
            formatter,
            "Hint: Run 'ofs verify --verbose' for detailed error information"
        )?;
    }
    formatter.flush()?;
    Err(CommandError::Failed)
}
