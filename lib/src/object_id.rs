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

use std::cmp::Ordering;
use std::fmt;
use std::fmt::Debug;

use crate::hex_util;

/// Number of bytes in a blob id (a SHA-256 digest).
pub const BLOB_ID_LENGTH: usize = 32;

/// Identifier of a stored blob: the raw SHA-256 digest of its contents.
///
/// Rendered and serialized as 64 lowercase hex characters.
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Hash)]
pub struct BlobId(Vec<u8>);

impl BlobId {
    pub fn new(value: Vec<u8>) -> Self {
        Self(value)
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }

    /// Parses the given hex string into a `BlobId`.
    ///
    /// The given string must be valid. A static str is required to prevent
    /// API misuse.
    pub fn from_hex(hex: &'static str) -> Self {
        Self::try_from_hex(hex).unwrap()
    }

    /// Parses the given hex string into a `BlobId`.
    pub fn try_from_hex(hex: impl AsRef<[u8]>) -> Option<Self> {
        hex_util::decode_hex(hex).map(Self)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn hex(&self) -> String {
        hex_util::encode_hex(&self.0)
    }
}

impl Debug for BlobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        f.debug_tuple("BlobId").field(&self.hex()).finish()
    }
}

impl fmt::Display for BlobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        f.pad(&self.hex())
    }
}

impl serde::Serialize for BlobId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.hex().serialize(serializer)
    }
}

impl<'de> serde::Deserialize<'de> for BlobId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let hex = String::deserialize(deserializer)?;
        Self::try_from_hex(&hex)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid hash: {hex}")))
    }
}

/// Identifier of a commit: a zero-padded decimal counter starting at "001".
///
/// Ids are allocated sequentially and widen naturally past "999". Ordering is
/// numeric, never lexicographic, so mixed-width ids sort correctly.
#[derive(PartialEq, Eq, Clone, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct CommitId(String);

impl CommitId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Formats a sequence number as a commit id, zero-padded to width 3.
    pub fn from_int(n: u64) -> Self {
        Self(format!("{n:03}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The numeric value of the id, or `None` if it is not all digits.
    pub fn as_int(&self) -> Option<u64> {
        if self.0.is_empty() || !self.0.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        self.0.parse().ok()
    }
}

impl PartialOrd for CommitId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CommitId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.as_int(), other.as_int()) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => self.0.cmp(&other.0),
        }
    }
}

impl Debug for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        f.debug_tuple("CommitId").field(&self.0).finish()
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        f.pad(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_blob_id() {
        let id = BlobId::from_hex("deadbeef0123");
        assert_eq!(format!("{id}"), "deadbeef0123");
        assert_eq!(format!("{id:.6}"), "deadbe");
    }

    #[test]
    fn test_blob_id_hex_roundtrip() {
        let id = BlobId::from_bytes(b"\x01\x23\xab\xcd");
        assert_eq!(id.hex(), "0123abcd");
        assert_eq!(BlobId::try_from_hex("0123abcd"), Some(id));
        assert_eq!(BlobId::try_from_hex("0123abc"), None);
        assert_eq!(BlobId::try_from_hex("not hex!"), None);
    }

    #[test]
    fn test_commit_id_formatting() {
        assert_eq!(CommitId::from_int(1).as_str(), "001");
        assert_eq!(CommitId::from_int(42).as_str(), "042");
        assert_eq!(CommitId::from_int(999).as_str(), "999");
        // Width widens naturally past 999.
        assert_eq!(CommitId::from_int(1000).as_str(), "1000");
    }

    #[test]
    fn test_commit_id_numeric_ordering() {
        // Lexicographically "1000" < "999"; numeric ordering must win.
        assert!(CommitId::new("999") < CommitId::new("1000"));
        assert!(CommitId::new("002") < CommitId::new("010"));
        assert_eq!(CommitId::new("abc").as_int(), None);
    }
}
