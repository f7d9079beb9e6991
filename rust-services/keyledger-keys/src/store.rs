//! Record store interface
//!
//! The authoritative key list lives outside this process. Backends implement
//! [`KeyRecordStore`]:
//! - `GistStore`: a JSON file inside a GitHub gist, over HTTPS
//! - `MemoryStore`: in-process, for tests and dry runs
//!
//! The contract has no concurrency control. Two issuers that load, append and
//! save at the same time can lose one of the appends; `save` replaces the
//! whole document, so a reader never sees a half-written set.
//!
//! Entries travel as [`StoredRecord`]s, so whatever other tools wrote is
//! saved back exactly as it was loaded.
// Copyright 2025 Francisco F. Pinochet
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


use crate::error::StoreResult;
use crate::key_types::StoredRecord;
use async_trait::async_trait;

/// Trait for record store backends
#[async_trait]
pub trait KeyRecordStore: Send + Sync {
    /// Backend name, for logs
    fn name(&self) -> &str;

    /// Fetch the full ordered record set
    async fn load(&self) -> StoreResult<Vec<StoredRecord>>;

    /// Replace the stored record set with `records`
    async fn save(&self, records: &[StoredRecord]) -> StoreResult<()>;
}
