//! Key issuance over a record store
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


use crate::error::{IssueError, IssueResult, StoreError};
use crate::generator::{generate_key, KeyGenerator};
use crate::key_types::{AccessKey, KeyRecord, StoredRecord, ValidityHours, ValidityPackage};
use crate::store::KeyRecordStore;
use chrono::{SubsecRound, Utc};
use keyledger_config::{IssuerConfig, LoadFailurePolicy};
use std::sync::Arc;
use tracing::{error, info, warn, Instrument};
use uuid::Uuid;

/// Issuance options
#[derive(Debug, Clone)]
pub struct IssuerOptions {
    pub on_load_failure: LoadFailurePolicy,
    /// Reload after saving and require the new key to be present
    pub verify_after_save: bool,
    /// Bound on re-generation when a fresh key collides with a stored one
    pub max_generation_attempts: u32,
}

impl Default for IssuerOptions {
    fn default() -> Self {
        Self {
            on_load_failure: LoadFailurePolicy::Fail,
            verify_after_save: false,
            max_generation_attempts: 8,
        }
    }
}

impl From<&IssuerConfig> for IssuerOptions {
    fn from(config: &IssuerConfig) -> Self {
        Self {
            on_load_failure: config.on_load_failure,
            verify_after_save: config.verify_after_save,
            ..Self::default()
        }
    }
}

/// Issues keys and appends them to a record store
pub struct KeyIssuer {
    store: Arc<dyn KeyRecordStore>,
    options: IssuerOptions,
    generator: KeyGenerator,
}

impl KeyIssuer {
    /// Create a new issuer over a store backend
    pub fn new(store: Arc<dyn KeyRecordStore>, options: IssuerOptions) -> Self {
        Self {
            store,
            options,
            generator: generate_key,
        }
    }

    /// Replace the key source
    pub fn with_generator(mut self, generator: KeyGenerator) -> Self {
        self.generator = generator;
        self
    }

    /// Issue a key for a named package
    pub async fn create_for_package(
        &self,
        package: ValidityPackage,
        note: &str,
    ) -> IssueResult<KeyRecord> {
        self.create(package.hours(), note).await
    }

    /// Issue a key valid for `hours` and persist it
    ///
    /// The record is returned only once the store has accepted the full,
    /// updated set. A save that cannot be confirmed yields
    /// [`IssueError::PartialFailure`], never the key. Entries already in the
    /// store are saved back exactly as they were loaded.
    pub async fn create(&self, hours: ValidityHours, note: &str) -> IssueResult<KeyRecord> {
        let span = tracing::info_span!(
            "issue_key",
            request_id = %Uuid::new_v4(),
            store = self.store.name(),
            hours = hours.get()
        );
        self.create_inner(hours, note).instrument(span).await
    }

    async fn create_inner(&self, hours: ValidityHours, note: &str) -> IssueResult<KeyRecord> {
        let mut records = self.load_records().await?;

        let key = self.unique_key(&records)?;
        let fingerprint = key.fingerprint();
        let record = KeyRecord::issue(key, hours, note, Utc::now().trunc_subsecs(0))?;

        records.push(StoredRecord::from(&record));

        if let Err(e) = self.store.save(&records).await {
            error!(fingerprint = %fingerprint, error = %e, "Failed to save key records");
            return Err(IssueError::PartialFailure {
                fingerprint,
                source: e,
            });
        }

        if self.options.verify_after_save {
            self.verify_stored(&record.key, &fingerprint).await?;
        }

        info!(
            fingerprint = %fingerprint,
            expires_at = %record.expires_at,
            total = records.len(),
            "Key issued"
        );
        Ok(record)
    }

    async fn load_records(&self) -> IssueResult<Vec<StoredRecord>> {
        match self.store.load().await {
            Ok(records) => Ok(records),
            Err(e) => match self.options.on_load_failure {
                LoadFailurePolicy::Fail => {
                    error!(error = %e, "Failed to load key records");
                    Err(IssueError::StoreUnavailable(e))
                }
                LoadFailurePolicy::StartEmpty => {
                    warn!(
                        error = %e,
                        "Failed to load key records, continuing with an empty list"
                    );
                    Ok(Vec::new())
                }
            },
        }
    }

    fn unique_key(&self, records: &[StoredRecord]) -> IssueResult<AccessKey> {
        for _ in 0..self.options.max_generation_attempts {
            let key = (self.generator)();
            if !records.iter().any(|r| r.holds(&key)) {
                return Ok(key);
            }
            warn!(fingerprint = %key.fingerprint(), "Generated key collides with a stored key");
        }
        Err(IssueError::GenerationExhausted(
            self.options.max_generation_attempts,
        ))
    }

    async fn verify_stored(&self, key: &AccessKey, fingerprint: &str) -> IssueResult<()> {
        let stored = self.store.load().await.map_err(|e| IssueError::PartialFailure {
            fingerprint: fingerprint.to_string(),
            source: e,
        })?;

        if stored.iter().any(|r| r.holds(key)) {
            return Ok(());
        }

        error!(fingerprint = %fingerprint, "Key missing from the store after save");
        Err(IssueError::PartialFailure {
            fingerprint: fingerprint.to_string(),
            source: StoreError::Conflict(
                "key missing after save; another writer likely replaced the document".to_string(),
            ),
        })
    }
}
