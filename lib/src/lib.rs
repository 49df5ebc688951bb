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

//! The OFS repository engine.
//!
//! OFS is a local-first, single-user version control system for air-gapped
//! environments. This crate owns the content-addressed object store, the
//! staging index, the commit chain, the reference machinery, working-tree
//! scanning, the diff engine, and the integrity verifier. The companion
//! `ofs-cli` crate wires these into the `ofs` command surface.
//!
//! Everything is single-threaded, blocking, and single-writer by contract:
//! atomic rename is the sole ordering primitive, and every mutation is a
//! sequence of idempotent atomic writes.

#![warn(missing_docs)]

pub mod commits;
pub mod config;
pub mod diff;
pub mod file_util;
pub mod hash;
pub mod hex_util;
pub mod ignore;
pub mod index;
pub mod object_id;
pub mod object_store;
pub mod refs;
pub mod repo;
pub mod verify;
pub mod working_tree;
