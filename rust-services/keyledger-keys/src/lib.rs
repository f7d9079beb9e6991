//! Key issuance for keyledger
//!
//! Generates time-limited access keys and appends them to an external record
//! store. The store is reached through [`KeyRecordStore`]; the gist backend
//! talks HTTPS, the memory backend stays in process.
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


pub mod error;
pub mod generator;
pub mod gist_store;
pub mod issuer;
pub mod key_types;
pub mod memory_store;
pub mod service_integration;
pub mod store;

pub use error::{IssueError, IssueResult, StoreError, StoreResult};
pub use gist_store::GistStore;
pub use issuer::{IssuerOptions, KeyIssuer};
pub use key_types::{AccessKey, KeyRecord, StoredRecord, ValidityHours, ValidityPackage};
pub use memory_store::MemoryStore;
pub use service_integration::*;
pub use store::KeyRecordStore;
