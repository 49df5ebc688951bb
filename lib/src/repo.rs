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

//! The repository handle.
//!
//! A [`Repository`] knows the `.ofs` layout and owns the per-repository
//! stores, including the commit cache. Every top-level command constructs
//! one handle; caches die with it, so there is no cross-command or
//! cross-test state.

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use thiserror::Error;

use crate::commits::CommitStore;
use crate::config::RepoConfig;
use crate::file_util;
use crate::file_util::IoResultExt as _;
use crate::file_util::PathError;
use crate::ignore::IgnorePatterns;
use crate::index::Index;
use crate::object_store::ObjectStore;
use crate::refs;

/// Name of the metadata directory at the workspace root.
pub const OFS_DIR_NAME: &str = ".ofs";

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Repository already initialized in {path}")]
    AlreadyExists { path: PathBuf },
    #[error("Not an OFS repository")]
    NotInitialized,
    #[error("Cannot parse repository config")]
    ParseConfig(#[source] serde_json::Error),
    #[error("Cannot serialize repository config")]
    SerializeConfig(#[source] serde_json::Error),
    #[error(transparent)]
    Io(#[from] PathError),
}

/// Handle to one OFS repository rooted at a workspace directory.
#[derive(Debug)]
pub struct Repository {
    root: PathBuf,
    ofs_dir: PathBuf,
    refs_heads_dir: PathBuf,
    index_file: PathBuf,
    head_file: PathBuf,
    config_file: PathBuf,
    objects: ObjectStore,
    commits: CommitStore,
}

impl Repository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let ofs_dir = root.join(OFS_DIR_NAME);
        let objects = ObjectStore::new(&ofs_dir);
        let commits = CommitStore::new(ofs_dir.join("commits"));
        Self {
            refs_heads_dir: ofs_dir.join("refs").join("heads"),
            index_file: ofs_dir.join("index.json"),
            head_file: ofs_dir.join("HEAD"),
            config_file: ofs_dir.join("config.json"),
            objects,
            commits,
            ofs_dir,
            root,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn ofs_dir(&self) -> &Path {
        &self.ofs_dir
    }

    pub fn refs_heads_dir(&self) -> &Path {
        &self.refs_heads_dir
    }

    pub fn index_file(&self) -> &Path {
        &self.index_file
    }

    pub fn head_file(&self) -> &Path {
        &self.head_file
    }

    pub fn config_file(&self) -> &Path {
        &self.config_file
    }

    pub fn objects(&self) -> &ObjectStore {
        &self.objects
    }

    pub fn commits(&self) -> &CommitStore {
        &self.commits
    }

    /// Whether the repository has been initialized: the `.ofs` directory
    /// plus its HEAD and config files exist.
    pub fn is_initialized(&self) -> bool {
        self.ofs_dir.exists() && self.head_file.exists() && self.config_file.exists()
    }

    /// Creates the `.ofs` tree: `objects/`, `refs/heads/`, `commits/`, a
    /// symbolic HEAD, an empty index, and a default config.
    ///
    /// Fails if `.ofs` already exists. On any mid-creation error the partial
    /// `.ofs` directory is removed entirely.
    pub fn init(&self) -> Result<(), RepoError> {
        if self.ofs_dir.exists() {
            return Err(RepoError::AlreadyExists {
                path: self.ofs_dir.clone(),
            });
        }
        tracing::info!(path = ?self.ofs_dir, "initializing repository");
        self.create_layout().inspect_err(|_| {
            if let Err(err) = fs::remove_dir_all(&self.ofs_dir) {
                tracing::warn!(?err, "cannot clean up partial repository");
            }
        })
    }

    fn create_layout(&self) -> Result<(), RepoError> {
        fs::create_dir_all(self.commits.commits_dir()).context(self.commits.commits_dir())?;
        fs::create_dir_all(&self.refs_heads_dir).context(&self.refs_heads_dir)?;
        fs::create_dir_all(self.objects.objects_dir()).context(self.objects.objects_dir())?;
        refs::init_head(&self.ofs_dir, refs::DEFAULT_BRANCH)?;
        fs::write(&self.index_file, b"[]").context(&self.index_file)?;
        self.store_config(&RepoConfig::from_env())
    }

    pub fn config(&self) -> Result<RepoConfig, RepoError> {
        let contents = fs::read(&self.config_file).context(&self.config_file)?;
        serde_json::from_slice(&contents).map_err(RepoError::ParseConfig)
    }

    pub fn store_config(&self, config: &RepoConfig) -> Result<(), RepoError> {
        let contents = serde_json::to_vec_pretty(config).map_err(RepoError::SerializeConfig)?;
        file_util::write_atomic(&self.config_file, &contents)?;
        Ok(())
    }

    /// Sets one config key, preserving unknown keys verbatim.
    pub fn set_config_value(
        &self,
        key: &str,
        value: serde_json::Value,
    ) -> Result<(), RepoError> {
        let contents = fs::read(&self.config_file).context(&self.config_file)?;
        let mut map: serde_json::Map<String, serde_json::Value> =
            serde_json::from_slice(&contents).map_err(RepoError::ParseConfig)?;
        map.insert(key.to_owned(), value);
        let contents = serde_json::to_vec_pretty(&map).map_err(RepoError::SerializeConfig)?;
        file_util::write_atomic(&self.config_file, &contents)?;
        Ok(())
    }

    /// Loads the staging index.
    pub fn load_index(&self) -> Index {
        Index::load(&self.index_file)
    }

    /// Compiles the ignore patterns for this workspace.
    pub fn ignore_patterns(&self) -> IgnorePatterns {
        IgnorePatterns::load(&self.root)
    }
}
