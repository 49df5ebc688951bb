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

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use ofs_lib::commits::Commit;
use ofs_lib::commits::FileAction;
use ofs_lib::commits::FileEntry;
use ofs_lib::hash;
use ofs_lib::index::IndexEntry;
use ofs_lib::object_id::BlobId;
use ofs_lib::object_id::CommitId;
use ofs_lib::repo::Repository;
use tempfile::TempDir;

pub fn new_temp_dir() -> TempDir {
    tempfile::Builder::new()
        .prefix("ofs-test-")
        .tempdir()
        .unwrap()
}

/// An initialized repository in a fresh temporary workspace.
pub struct TestRepo {
    _temp_dir: TempDir,
    pub repo: Repository,
}

impl TestRepo {
    pub fn init() -> Self {
        let temp_dir = new_temp_dir();
        let repo = Repository::new(temp_dir.path());
        repo.init().unwrap();
        Self {
            _temp_dir: temp_dir,
            repo,
        }
    }

    pub fn root(&self) -> &Path {
        self.repo.root()
    }

    /// Writes a working-tree file, creating parent directories as needed.
    pub fn write_working_file(&self, rel_path: &str, contents: impl AsRef<[u8]>) -> PathBuf {
        let path = self.root().join(rel_path);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
        path
    }

    pub fn remove_working_file(&self, rel_path: &str) {
        fs::remove_file(self.root().join(rel_path)).unwrap();
    }

    /// Stores the contents as a blob and stages the path.
    pub fn stage_file(&self, rel_path: &str, contents: &[u8]) -> BlobId {
        self.write_working_file(rel_path, contents);
        let id = self.repo.objects().store(contents).unwrap();
        let mut index = self.repo.load_index();
        index
            .add(IndexEntry::new(
                rel_path,
                id.clone(),
                contents.len() as u64,
                0,
            ))
            .unwrap();
        id
    }

    /// Creates and saves a commit from explicit file entries, updating the
    /// current branch and clearing the index.
    pub fn commit_files(
        &self,
        message: &str,
        parent: Option<&CommitId>,
        files: Vec<FileEntry>,
    ) -> Commit {
        let id = ofs_lib::commits::generate_commit_id(self.repo.commits().commits_dir());
        let commit = ofs_lib::commits::build_commit(
            id.clone(),
            parent.cloned(),
            message,
            "test-user",
            "test-user@localhost",
            files,
        );
        self.repo.commits().save(&commit).unwrap();
        ofs_lib::refs::update_head(self.repo.ofs_dir(), &id, false).unwrap();
        self.repo.load_index().clear().unwrap();
        commit
    }
}

/// Builds an added/modified/deleted file entry the way commits record them.
pub fn file_entry(path: &str, contents: &[u8], action: FileAction) -> FileEntry {
    FileEntry {
        path: path.to_owned(),
        hash: Some(hash::hash_bytes(contents)),
        size: contents.len() as u64,
        mode: ofs_lib::index::FILE_MODE.to_owned(),
        action,
        extra: serde_json::Map::new(),
    }
}
