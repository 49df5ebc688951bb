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

mod add;
mod checkout;
mod commit;
mod diff;
mod init;
mod log;
mod status;
mod verify;

use clap::Parser;
use clap::Subcommand;

use crate::cli_util::CommandError;
use crate::ui::Ui;

/// OFS - local-first version control for air-gapped environments
#[derive(Parser, Clone, Debug)]
#[command(name = "ofs", version = env!("OFS_VERSION"))]
pub(crate) struct OfsArgs {
    /// Disable color output
    #[arg(long, global = true)]
    pub(crate) no_color: bool,
    #[command(subcommand)]
    pub(crate) command: Option<OfsCommand>,
}

#[derive(Subcommand, Clone, Debug)]
pub(crate) enum OfsCommand {
    Init(init::InitArgs),
    Add(add::AddArgs),
    Status(status::StatusArgs),
    Commit(commit::CommitArgs),
    Log(log::LogArgs),
    Checkout(checkout::CheckoutArgs),
    Diff(diff::DiffArgs),
    Verify(verify::VerifyArgs),
}

pub(crate) fn run_command(ui: &mut Ui, command: &OfsCommand) -> Result<(), CommandError> {
    match command {
        OfsCommand::Init(args) => init::cmd_init(ui, args),
        OfsCommand::Add(args) => add::cmd_add(ui, args),
        OfsCommand::Status(args) => status::cmd_status(ui, args),
        OfsCommand::Commit(args) => commit::cmd_commit(ui, args),
        OfsCommand::Log(args) => log::cmd_log(ui, args),
        OfsCommand::Checkout(args) => checkout::cmd_checkout(ui, args),
        OfsCommand::Diff(args) => diff::cmd_diff(ui, args),
        OfsCommand::Verify(args) => verify::cmd_verify(ui, args),
    }
}
