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

//! The `ofs` command-line interface, on top of the `ofs-lib` engine.

use std::process::ExitCode;

use clap::CommandFactory as _;
use clap::Parser as _;

pub mod cli_util;
pub mod commands;
pub mod formatter;
pub mod ui;

use crate::commands::OfsArgs;
use crate::ui::Ui;

/// Parses arguments, runs the selected command, and reports the outcome.
pub fn dispatch() -> ExitCode {
    cli_util::init_tracing();
    let args = match OfsArgs::try_parse() {
        Ok(args) => args,
        // Prints the message (or help/version text) and exits: 2 for usage
        // errors, 0 for --help and --version.
        Err(err) => err.exit(),
    };
    let mut ui = Ui::new(args.no_color);
    let result = match &args.command {
        Some(command) => commands::run_command(&mut ui, command),
        None => {
            let _ = OfsArgs::command().print_help();
            Ok(())
        }
    };
    cli_util::handle_command_result(&ui, result)
}
