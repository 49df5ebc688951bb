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

use ofs_lib::repo::Repository;
use tracing::instrument;

use crate::cli_util::CommandError;
use crate::ui::Ui;

/// Initialize a new OFS repository in the current directory
#[derive(clap::Args, Clone, Debug)]
pub(crate) struct InitArgs {}

#[instrument(skip_all)]
pub(crate) fn cmd_init(ui: &mut Ui, InitArgs {}: &InitArgs) -> Result<(), CommandError> {
    let cwd = std::env::current_dir()?;
    let repo = Repository::new(cwd);
    repo.init()?;
    writeln!(
        ui.stdout(),
        "Initialized empty OFS repository in {}",
        repo.ofs_dir().display()
    )?;
    Ok(())
}
