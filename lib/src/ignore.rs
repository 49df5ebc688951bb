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

//! `.ofsignore` pattern matching.
//!
//! Patterns are glob-style (`*`, `?`, `[…]`), one per line. `#` starts a
//! comment, a leading `!` negates, a trailing `/` marks a directory pattern,
//! and a leading `**/` means "match anywhere". Evaluation is order-sensitive:
//! later patterns override earlier ones, and a negation only un-ignores what
//! a prior pattern ignored.

use std::path::Path;

use globset::Glob;
use globset::GlobMatcher;

/// Patterns that are always applied, before anything from `.ofsignore`.
pub const DEFAULT_PATTERNS: &[&str] = &[
    ".ofs",
    ".ofs/**",
    "*.tmp",
    "*.swp",
    "__pycache__",
    ".DS_Store",
];

/// Name of the ignore file at the repository root.
pub const IGNORE_FILE_NAME: &str = ".ofsignore";

#[derive(Debug)]
struct CompiledPattern {
    negated: bool,
    /// Literal directory name for `foo/` patterns: matches the directory
    /// itself and everything below it.
    dir: Option<String>,
    /// Glob matched against both the file name and the full relative path.
    glob: Option<GlobMatcher>,
    /// For `**/x` patterns, `x` matched against the file name alone.
    anywhere: Option<GlobMatcher>,
}

impl CompiledPattern {
    fn compile(pattern: &str) -> Self {
        let (negated, pattern) = match pattern.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, pattern),
        };
        let dir = pattern.strip_suffix('/').map(str::to_owned);
        let glob = match Glob::new(pattern) {
            Ok(glob) => Some(glob.compile_matcher()),
            Err(err) => {
                tracing::warn!(pattern, ?err, "skipping unparseable ignore pattern");
                None
            }
        };
        let anywhere = pattern
            .strip_prefix("**/")
            .and_then(|rest| Glob::new(rest).ok())
            .map(|glob| glob.compile_matcher());
        Self {
            negated,
            dir,
            glob,
            anywhere,
        }
    }

    fn matches(&self, rel_path: &str, name: &str) -> bool {
        if let Some(dir) = &self.dir
            && (rel_path == dir
                || name == dir
                || (rel_path.starts_with(dir) && rel_path[dir.len()..].starts_with('/')))
        {
            return true;
        }
        if let Some(glob) = &self.glob
            && (glob.is_match(name) || glob.is_match(rel_path))
        {
            return true;
        }
        if let Some(anywhere) = &self.anywhere
            && anywhere.is_match(name)
        {
            return true;
        }
        false
    }
}

/// A pattern list compiled once, applied many times.
#[derive(Debug)]
pub struct IgnorePatterns {
    patterns: Vec<CompiledPattern>,
}

impl IgnorePatterns {
    /// Compiles the given patterns, in order.
    pub fn from_patterns<I>(patterns: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|pattern| CompiledPattern::compile(pattern.as_ref()))
            .collect();
        Self { patterns }
    }

    /// Compiles the default patterns plus the repository's `.ofsignore`.
    pub fn load(repo_root: &Path) -> Self {
        Self::from_patterns(load_ignore_patterns(repo_root))
    }

    /// Whether the slash-separated relative path should be ignored.
    ///
    /// Folds over the patterns in order: a positive match flips to ignored, a
    /// negation match flips back.
    pub fn matches(&self, rel_path: &str) -> bool {
        let name = rel_path.rsplit('/').next().unwrap_or(rel_path);
        let mut ignored = false;
        for pattern in &self.patterns {
            if pattern.matches(rel_path, name) {
                ignored = !pattern.negated;
            }
        }
        ignored
    }
}

/// Returns the default patterns followed by the `.ofsignore` contents.
///
/// Comment lines (`#`) and blank lines are skipped. An unreadable
/// `.ofsignore` contributes nothing.
pub fn load_ignore_patterns(repo_root: &Path) -> Vec<String> {
    let mut patterns: Vec<String> = DEFAULT_PATTERNS.iter().map(|&p| p.to_owned()).collect();
    match std::fs::read_to_string(repo_root.join(IGNORE_FILE_NAME)) {
        Ok(contents) => {
            for line in contents.lines() {
                let line = line.trim();
                if !line.is_empty() && !line.starts_with('#') {
                    patterns.push(line.to_owned());
                }
            }
        }
        Err(err) => {
            tracing::debug!(?err, "no readable .ofsignore");
        }
    }
    patterns
}
