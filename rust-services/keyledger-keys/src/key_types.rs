//! Key record and validity definitions
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


use crate::error::{IssueError, IssueResult};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;

/// Opaque access key token
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct AccessKey(String);

impl AccessKey {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short SHA-256 fingerprint, safe to put in logs and error messages
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.0.as_bytes());
        hex::encode(&digest[..6])
    }
}

impl fmt::Display for AccessKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for AccessKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccessKey({})", self.fingerprint())
    }
}

/// Requested validity window, in whole hours (always positive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ValidityHours(NonZeroU32);

impl ValidityHours {
    pub fn new(hours: u32) -> IssueResult<Self> {
        NonZeroU32::new(hours)
            .map(Self)
            .ok_or_else(|| IssueError::InvalidInput("duration must be at least 1 hour".to_string()))
    }

    pub fn get(&self) -> u32 {
        self.0.get()
    }

    pub fn as_duration(&self) -> Duration {
        Duration::hours(i64::from(self.get()))
    }
}

impl FromStr for ValidityHours {
    type Err = IssueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let hours: i64 = trimmed.parse().map_err(|_| {
            IssueError::InvalidInput(format!(
                "duration must be a positive whole number of hours, got '{}'",
                trimmed
            ))
        })?;
        if hours <= 0 {
            return Err(IssueError::InvalidInput(format!(
                "duration must be positive, got {}",
                hours
            )));
        }
        let hours = u32::try_from(hours).map_err(|_| {
            IssueError::InvalidInput(format!("duration of {} hours is too large", hours))
        })?;
        Self::new(hours)
    }
}

/// Named validity packages sold through the order flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidityPackage {
    /// Short trial
    Test,
    OneDay,
    SevenDays,
    ThirtyDays,
}

impl ValidityPackage {
    pub const ALL: [ValidityPackage; 4] = [
        ValidityPackage::Test,
        ValidityPackage::OneDay,
        ValidityPackage::SevenDays,
        ValidityPackage::ThirtyDays,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ValidityPackage::Test => "test",
            ValidityPackage::OneDay => "1day",
            ValidityPackage::SevenDays => "7day",
            ValidityPackage::ThirtyDays => "30day",
        }
    }

    pub fn hours(&self) -> ValidityHours {
        let hours = match self {
            ValidityPackage::Test => 3,
            ValidityPackage::OneDay => 24,
            ValidityPackage::SevenDays => 168,
            ValidityPackage::ThirtyDays => 720,
        };
        match NonZeroU32::new(hours) {
            Some(hours) => ValidityHours(hours),
            None => unreachable!("package durations are non-zero"),
        }
    }
}

impl fmt::Display for ValidityPackage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ValidityPackage {
    type Err = IssueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|p| p.name() == wanted)
            .ok_or_else(|| {
                let known: Vec<&str> = Self::ALL.iter().map(|p| p.name()).collect();
                IssueError::InvalidInput(format!(
                    "unknown package '{}', expected one of: {}",
                    s.trim(),
                    known.join(", ")
                ))
            })
    }
}

/// A single issued key with its validity window and label
#[derive(Debug, Clone, PartialEq)]
pub struct KeyRecord {
    pub key: AccessKey,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub note: String,
}

impl KeyRecord {
    /// Build a record valid for `hours` starting at `created_at`
    pub fn issue(
        key: AccessKey,
        hours: ValidityHours,
        note: &str,
        created_at: DateTime<Utc>,
    ) -> IssueResult<Self> {
        let expires_at = created_at
            .checked_add_signed(hours.as_duration())
            .ok_or_else(|| {
                IssueError::InvalidInput(format!(
                    "duration of {} hours is beyond the supported date range",
                    hours.get()
                ))
            })?;

        Ok(Self {
            key,
            created_at,
            expires_at,
            note: note.to_string(),
        })
    }

    pub fn validity(&self) -> Duration {
        self.expires_at - self.created_at
    }
}

/// One entry of the stored record set, exactly as the store holds it
///
/// Entries written by the order flow and the older scripts use other field
/// names and naive local timestamps. They are written back untouched; the
/// only field ever read is `key`.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoredRecord(Value);

impl StoredRecord {
    /// The entry's key, if it has a string `key` field
    pub fn key(&self) -> Option<&str> {
        self.0.get("key").and_then(Value::as_str)
    }

    pub fn holds(&self, key: &AccessKey) -> bool {
        self.key() == Some(key.as_str())
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl From<Value> for StoredRecord {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Canonical shape for newly issued keys: camelCase fields, RFC 3339 UTC
impl From<&KeyRecord> for StoredRecord {
    fn from(record: &KeyRecord) -> Self {
        Self(json!({
            "key": record.key.as_str(),
            "createdAt": rfc3339(&record.created_at),
            "expiresAt": rfc3339(&record.expires_at),
            "note": record.note,
        }))
    }
}

impl fmt::Debug for StoredRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = self.key().map(|k| AccessKey::new(k).fingerprint());
        f.debug_struct("StoredRecord")
            .field("key", &key)
            .field("fields", &self.0.as_object().map_or(0, |o| o.len()))
            .finish()
    }
}

fn rfc3339(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}
