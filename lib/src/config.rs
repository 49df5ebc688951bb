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

//! Repository configuration, persisted as `.ofs/config.json`.

use std::env;

use serde::Deserialize;
use serde::Serialize;

use crate::ignore;

/// Format version written to new configs.
pub const CONFIG_VERSION: &str = "1.0";

/// `{version, author, email, ignore[]}` plus any unknown fields.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RepoConfig {
    pub version: String,
    pub author: String,
    pub email: String,
    pub ignore: Vec<String>,
    /// Unknown fields, round-tripped verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl RepoConfig {
    /// The default configuration for a fresh repository, with author and
    /// email taken from the environment.
    pub fn from_env() -> Self {
        let author = default_author();
        let email = default_email(&author);
        Self {
            version: CONFIG_VERSION.to_owned(),
            author,
            email,
            ignore: ignore::DEFAULT_PATTERNS
                .iter()
                .map(|&pattern| pattern.to_owned())
                .collect(),
            extra: serde_json::Map::new(),
        }
    }
}

/// Default author: `$USER`, then `$USERNAME`, then "unknown".
pub fn default_author() -> String {
    env::var("USER")
        .or_else(|_| env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_owned())
}

/// Default email: `$EMAIL`, falling back to `<author>@localhost`.
pub fn default_email(author: &str) -> String {
    env::var("EMAIL").unwrap_or_else(|_| format!("{author}@localhost"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_email_fallback() {
        assert_eq!(default_email("jsmith"), {
            match env::var("EMAIL") {
                Ok(email) => email,
                Err(_) => "jsmith@localhost".to_owned(),
            }
        });
    }

    #[test]
    fn test_config_json_roundtrip() {
        let config = RepoConfig {
            version: CONFIG_VERSION.to_owned(),
            author: "jsmith".to_owned(),
            email: "js@example.com".to_owned(),
            ignore: vec!["*.log".to_owned()],
            extra: serde_json::Map::new(),
        };
        let json = serde_json::to_string(&config).unwrap();
        let parsed: RepoConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_config_preserves_unknown_fields() {
        let json = r#"{
            "version": "1.0",
            "author": "jsmith",
            "email": "js@example.com",
            "ignore": [],
            "color_scheme": "dark"
        }"#;
        let parsed: RepoConfig = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.extra["color_scheme"], "dark");
        let rewritten = serde_json::to_string(&parsed).unwrap();
        assert!(rewritten.contains("color_scheme"));
    }
}
