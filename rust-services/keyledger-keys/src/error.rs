//! Error types for key issuance
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


use thiserror::Error;

/// Failures talking to a record store backend
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Store rejected the credentials (HTTP {status}): {body}")]
    Authentication { status: u16, body: String },

    #[error("Store rate limit exceeded (HTTP {status}): {body}")]
    RateLimited { status: u16, body: String },

    #[error("Store returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid document format: {0}")]
    Format(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Write conflict: {0}")]
    Conflict(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Issuance errors
#[derive(Error, Debug)]
pub enum IssueError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Key store unavailable: {0}")]
    StoreUnavailable(#[source] StoreError),

    /// A key was generated but the store never confirmed it. The key itself
    /// is deliberately absent; only its fingerprint is carried.
    #[error("Key {fingerprint} was generated but not confirmed as stored: {source}")]
    PartialFailure {
        fingerprint: String,
        #[source]
        source: StoreError,
    },

    #[error("Could not generate a unique key after {0} attempts")]
    GenerationExhausted(u32),
}

/// Result type for issuance operations
pub type IssueResult<T> = Result<T, IssueError>;
