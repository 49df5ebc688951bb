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

//! Output formatters: plain text, or ANSI color via crossterm.

use std::fmt;
use std::io;
use std::io::Write;

use crossterm::queue;
use crossterm::style::Color;
use crossterm::style::ResetColor;
use crossterm::style::SetForegroundColor;

/// A sink for command output that may or may not render color.
pub trait Formatter: Write {
    fn set_color(&mut self, color: Color) -> io::Result<()>;
    fn reset_color(&mut self) -> io::Result<()>;
}

/// Writes `text` in the given color, then resets.
pub fn write_colored(
    formatter: &mut dyn Formatter,
    color: Color,
    text: impl fmt::Display,
) -> io::Result<()> {
    formatter.set_color(color)?;
    write!(formatter, "{text}")?;
    formatter.reset_color()
}

/// Formatter that ignores color requests.
pub struct PlainTextFormatter<W> {
    output: W,
}

impl<W: Write> PlainTextFormatter<W> {
    pub fn new(output: W) -> Self {
        Self { output }
    }
}

impl<W: Write> Write for PlainTextFormatter<W> {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.output.write(data)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.output.flush()
    }
}

impl<W: Write> Formatter for PlainTextFormatter<W> {
    fn set_color(&mut self, _color: Color) -> io::Result<()> {
        Ok(())
    }

    fn reset_color(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Formatter that emits ANSI escape sequences for color requests.
pub struct ColorFormatter<W> {
    output: W,
}

impl<W: Write> ColorFormatter<W> {
    pub fn new(output: W) -> Self {
        Self { output }
    }
}

impl<W: Write> Write for ColorFormatter<W> {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.output.write(data)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.output.flush()
    }
}

impl<W: Write> Formatter for ColorFormatter<W> {
    fn set_color(&mut self, color: Color) -> io::Result<()> {
        queue!(self.output, SetForegroundColor(color))
    }

    fn reset_color(&mut self) -> io::Result<()> {
        queue!(self.output, ResetColor)
    }
}
