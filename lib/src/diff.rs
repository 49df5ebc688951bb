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

#![expect(missing_docs)]

//! Line-level unified diffs between two byte buffers.

use similar::TextDiff;

/// How many leading bytes are sniffed for NUL when classifying content as
/// binary.
const BINARY_SNIFF_LEN: usize = 8 * 1024;

/// Default number of unified-diff context lines.
pub const DEFAULT_CONTEXT_LINES: usize = 3;

/// How a path differs between the two sides of a diff.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiffClass {
    New,
    Modified,
    Deleted,
}

/// A buffer is binary iff a NUL byte appears in its first 8 KiB.
pub fn is_binary(content: &[u8]) -> bool {
    content[..content.len().min(BINARY_SNIFF_LEN)].contains(&0)
}

/// Formats the per-file diff header.
///
/// Always `diff --ofs a/<old> b/<new>`, followed by a `new file:` or
/// `deleted file:` line when the path only exists on one side.
pub fn diff_header(old_path: &str, new_path: &str, class: Option<DiffClass>) -> Vec<String> {
    let mut header = vec![format!("diff --ofs a/{old_path} b/{new_path}")];
    match class {
        Some(DiffClass::New) => header.push(format!("new file: {new_path}")),
        Some(DiffClass::Deleted) => header.push(format!("deleted file: {old_path}")),
        _ => {}
    }
    header
}

/// Computes the unified diff between two file versions, as output lines.
///
/// Binary inputs (on either side) produce a single
/// `Binary files <a> and <b> differ` line, or nothing when identical. Text
/// is decoded as UTF-8 with replacement; identical text also produces no
/// lines.
pub fn file_diff(
    old_content: &[u8],
    new_content: &[u8],
    old_label: &str,
    new_label: &str,
    context_lines: usize,
) -> Vec<String> {
    if is_binary(old_content) || is_binary(new_content) {
        if old_content == new_content {
            return vec![];
        }
        return vec![format!("Binary files {old_label} and {new_label} differ")];
    }

    let old_text = String::from_utf8_lossy(old_content);
    let new_text = String::from_utf8_lossy(new_content);
    let diff = TextDiff::from_lines(old_text.as_ref(), new_text.as_ref());
    let unified = diff
        .unified_diff()
        .context_radius(context_lines)
        .header(old_label, new_label)
        .to_string();
    unified.lines().map(str::to_owned).collect()
}

/// Counts added and removed lines in unified-diff output, skipping the
/// `+++`/`---` file headers.
pub fn diff_stats<'a>(lines: impl IntoIterator<Item = &'a str>) -> (usize, usize) {
    let mut additions = 0;
    let mut deletions = 0;
    for line in lines {
        if line.starts_with('+') && !line.starts_with("+++") {
            additions += 1;
        } else if line.starts_with('-') && !line.starts_with("---") {
            deletions += 1;
        }
    }
    (additions, deletions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_binary() {
        assert!(!is_binary(b""));
        assert!(!is_binary(b"plain text\n"));
        assert!(is_binary(b"\x00"));
        assert!(is_binary(b"abc\x00def"));

        // NUL past the sniff window is not detected.
        let mut content = vec![b'a'; BINARY_SNIFF_LEN];
        content.push(0);
        assert!(!is_binary(&content));
    }

    #[test]
    fn test_text_diff_lines() {
        let lines = file_diff(
            b"hi\n",
            b"hi2\n",
            "a/a.txt",
            "b/a.txt",
            DEFAULT_CONTEXT_LINES,
        );
        assert_eq!(lines[0], "--- a/a.txt");
        assert_eq!(lines[1], "+++ b/a.txt");
        assert!(lines.iter().any(|line| line == "-hi"));
        assert!(lines.iter().any(|line| line == "+hi2"));
    }

    #[test]
    fn test_identical_text_has_no_output() {
        assert_eq!(
            file_diff(b"same\n", b"same\n", "a/x", "b/x", DEFAULT_CONTEXT_LINES),
            Vec::<String>::new()
        );
    }

    #[test]
    fn test_binary_diff_is_one_line() {
        let lines = file_diff(
            b"\x00old",
            b"\x00new",
            "a/bin",
            "b/bin",
            DEFAULT_CONTEXT_LINES,
        );
        assert_eq!(lines, ["Binary files a/bin and b/bin differ"]);
    }

    #[test]
    fn test_identical_binaries_have_no_output() {
        assert_eq!(
            file_diff(b"\x00same", b"\x00same", "a/bin", "b/bin", 3),
            Vec::<String>::new()
        );
    }

    #[test]
    fn test_new_file_diff_from_empty() {
        let lines = file_diff(b"", b"one\ntwo\n", "a/new.txt", "b/new.txt", 3);
        let (additions, deletions) = diff_stats(lines.iter().map(String::as_str));
        assert_eq!((additions, deletions), (2, 0));
    }

    #[test]
    fn test_diff_header_classes() {
        assert_eq!(
            diff_header("a.txt", "a.txt", None),
            ["diff --ofs a/a.txt b/a.txt"]
        );
        assert_eq!(
            diff_header("a.txt", "a.txt", Some(DiffClass::Modified)),
            ["diff --ofs a/a.txt b/a.txt"]
        );
        assert_eq!(
            diff_header("a.txt", "a.txt", Some(DiffClass::New)),
            ["diff --ofs a/a.txt b/a.txt", "new file: a.txt"]
        );
        assert_eq!(
            diff_header("a.txt", "a.txt", Some(DiffClass::Deleted)),
            ["diff --ofs a/a.txt b/a.txt", "deleted file: a.txt"]
        );
    }

    #[test]
    fn test_diff_stats_ignores_file_headers() {
        let lines = file_diff(b"a\nb\n", b"a\nc\n", "a/x", "b/x", 3);
        assert_eq!(diff_stats(lines.iter().map(String::as_str)), (1, 1));
    }
}
