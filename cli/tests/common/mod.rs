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

// Each test binary compiles this module separately and uses a different
// subset of the helpers.
#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::process::Output;

use tempfile::TempDir;

/// A temporary workspace to run the `ofs` binary in.
pub struct TestEnvironment {
    temp_dir: TempDir,
}

/// Captured output of one `ofs` invocation.
pub struct CommandOutput {
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    fn from_output(output: Output) -> Self {
        Self {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

impl TestEnvironment {
    pub fn new() -> Self {
        Self {
            temp_dir: testutils::new_temp_dir(),
        }
    }

    /// An initialized environment, ready for staging commands.
    pub fn init() -> Self {
        let env = Self::new();
        env.ofs_ok(&["init"]);
        env
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn ofs_dir(&self) -> PathBuf {
        self.root().join(".ofs")
    }

    fn command(&self, args: &[&str]) -> assert_cmd::Command {
        let mut cmd = assert_cmd::Command::cargo_bin("ofs").unwrap();
        cmd.current_dir(self.root())
            .env_remove("NO_COLOR")
            .env_remove("RUST_LOG")
            .env("USER", "test-user")
            .env("EMAIL", "test-user@example.com")
            .args(args);
        cmd
    }

    /// Runs `ofs` with the given arguments.
    pub fn ofs(&self, args: &[&str]) -> CommandOutput {
        CommandOutput::from_output(self.command(args).output().unwrap())
    }

    /// Runs `ofs` with the given line fed to stdin (for prompts).
    pub fn ofs_with_stdin(&self, args: &[&str], stdin: &str) -> CommandOutput {
        let mut cmd = self.command(args);
        cmd.write_stdin(stdin.to_owned());
        CommandOutput::from_output(cmd.output().unwrap())
    }

    /// Runs `ofs` and asserts success, returning stdout.
    pub fn ofs_ok(&self, args: &[&str]) -> String {
        let output = self.ofs(args);
        assert_eq!(
            output.status,
            Some(0),
            "ofs {args:?} failed\nstdout: {}\nstderr: {}",
            output.stdout,
            output.stderr
        );
        output.stdout
    }

    pub fn write_file(&self, rel_path: &str, contents: impl AsRef<[u8]>) {
        let path = self.root().join(rel_path);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    pub fn read_file(&self, rel_path: &str) -> Vec<u8> {
        fs::read(self.root().join(rel_path)).unwrap()
    }

    pub fn file_exists(&self, rel_path: &str) -> bool {
        self.root().join(rel_path).exists()
    }

    pub fn remove_file(&self, rel_path: &str) {
        fs::remove_file(self.root().join(rel_path)).unwrap();
    }
}
