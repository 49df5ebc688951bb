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

//! Terminal output handling.

use std::env;
use std::io;
use std::io::IsTerminal as _;

use crate::formatter::ColorFormatter;
use crate::formatter::Formatter;
use crate::formatter::PlainTextFormatter;

/// Whether to render ANSI color.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ColorChoice {
    Always,
    Never,
    /// Color iff stdout is a terminal.
    Auto,
}

/// Owns the process's stdout/stderr and the color decision.
pub struct Ui {
    color: bool,
}

impl Ui {
    /// Resolves the color choice from the `--no-color` flag and the
    /// `NO_COLOR` environment variable (per no-color.org: any non-empty
    /// value disables color). The flag overrides the environment.
    pub fn new(no_color_flag: bool) -> Self {
        let choice = if no_color_flag || env_no_color() {
            ColorChoice::Never
        } else {
            ColorChoice::Auto
        };
        Self::with_color_choice(choice)
    }

    pub fn with_color_choice(choice: ColorChoice) -> Self {
        let color = match choice {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => io::stdout().is_terminal(),
        };
        Self { color }
    }

    pub fn color_enabled(&self) -> bool {
        self.color
    }

    pub fn stdout(&self) -> io::Stdout {
        io::stdout()
    }

    pub fn stderr(&self) -> io::Stderr {
        io::stderr()
    }

    pub fn stdout_formatter(&self) -> Box<dyn Formatter> {
        if self.color {
            Box::new(ColorFormatter::new(io::stdout()))
        } else {
            Box::new(PlainTextFormatter::new(io::stdout()))
        }
    }

    pub fn stderr_formatter(&self) -> Box<dyn Formatter> {
        if self.color {
            Box::new(ColorFormatter::new(io::stderr()))
        } else {
            Box::new(PlainTextFormatter::new(io::stderr()))
        }
    }
}

fn env_no_color() -> bool {
    env::var_os("NO_COLOR").is_some_and(|value| !value.is_empty())
}
