//! In-memory record store
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


use crate::error::{StoreError, StoreResult};
use crate::key_types::StoredRecord;
use crate::store::KeyRecordStore;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;
use tracing::debug;

/// Record store held in process memory
///
/// Failures can be injected on either side of the contract, and writes can
/// be silently discarded to mimic a concurrent writer replacing the document.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<Vec<StoredRecord>>,
    fail_load: AtomicBool,
    fail_save: AtomicBool,
    discard_writes: AtomicBool,
    saves: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with `records`
    pub fn with_records(records: Vec<StoredRecord>) -> Self {
        Self {
            records: RwLock::new(records),
            ..Self::default()
        }
    }

    /// Snapshot of the stored set
    pub async fn records(&self) -> Vec<StoredRecord> {
        self.records.read().await.clone()
    }

    pub fn set_fail_load(&self, fail: bool) {
        self.fail_load.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_save(&self, fail: bool) {
        self.fail_save.store(fail, Ordering::SeqCst);
    }

    /// Acknowledge saves without applying them
    pub fn set_discard_writes(&self, discard: bool) {
        self.discard_writes.store(discard, Ordering::SeqCst);
    }

    /// Number of saves that were applied
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeyRecordStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn load(&self) -> StoreResult<Vec<StoredRecord>> {
        if self.fail_load.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected load failure".to_string()));
        }
        Ok(self.records().await)
    }

    async fn save(&self, records: &[StoredRecord]) -> StoreResult<()> {
        if self.fail_save.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected save failure".to_string()));
        }
        if self.discard_writes.load(Ordering::SeqCst) {
            debug!(count = records.len(), "Discarding write");
            return Ok(());
        }

        let mut stored = self.records.write().await;
        *stored = records.to_vec();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
