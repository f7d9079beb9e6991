//! Service integration helpers for wiring an issuer from configuration
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
use crate::gist_store::GistStore;
use crate::issuer::{IssuerOptions, KeyIssuer};
use keyledger_config::AppConfig;
use std::sync::Arc;
use tracing::info;

/// Build an issuer backed by the configured gist
pub fn init_issuer(config: &AppConfig) -> IssueResult<KeyIssuer> {
    info!(
        api_url = %config.store.api_url,
        document_id = %config.store.document_id,
        file_name = %config.store.file_name,
        timeout_secs = config.store.timeout_secs,
        "Initializing gist key store"
    );

    let store = GistStore::new(config.store.clone()).map_err(IssueError::StoreUnavailable)?;
    Ok(KeyIssuer::new(
        Arc::new(store),
        IssuerOptions::from(&config.issuer),
    ))
}
