//! GitHub gist record store
//!
//! The record set is a JSON array kept in one file of a gist. Reads fetch
//! the gist document; writes PATCH that single file, which GitHub applies
//! as one revision.
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
use keyledger_config::StoreConfig;
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, info, warn};

const GITHUB_MEDIA_TYPE: &str = "application/vnd.github+json";
const CLIENT_USER_AGENT: &str = concat!("keyledger/", env!("CARGO_PKG_VERSION"));
const MAX_ERROR_BODY: usize = 200;

#[derive(Deserialize)]
struct GistDocument {
    #[serde(default)]
    files: HashMap<String, GistFile>,
}

#[derive(Deserialize)]
struct GistFile {
    content: Option<String>,
    #[serde(default)]
    truncated: bool,
    raw_url: Option<String>,
}

/// Record store backed by a gist file
pub struct GistStore {
    config: StoreConfig,
    client: reqwest::Client,
}

impl GistStore {
    /// Create a gist store; every request is bounded by the configured timeouts
    pub fn new(config: StoreConfig) -> StoreResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .build()?;

        Ok(Self { config, client })
    }

    fn document_url(&self) -> String {
        format!("{}/gists/{}", self.config.api_url, self.config.document_id)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .bearer_auth(&self.config.token)
            .header(ACCEPT, GITHUB_MEDIA_TYPE)
            .header(USER_AGENT, CLIENT_USER_AGENT)
    }

    async fn check_status(response: Response) -> StoreResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        // GitHub answers an exhausted quota with 403 as well as 429
        let quota_spent = response
            .headers()
            .get("x-ratelimit-remaining")
            .map_or(false, |remaining| remaining == "0");
        let body = excerpt(response.text().await.unwrap_or_default());
        let status_code = status.as_u16();

        if status == StatusCode::TOO_MANY_REQUESTS
            || (status == StatusCode::FORBIDDEN
                && (quota_spent || body.to_ascii_lowercase().contains("rate limit")))
        {
            return Err(StoreError::RateLimited {
                status: status_code,
                body,
            });
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(StoreError::Authentication {
                status: status_code,
                body,
            });
        }
        Err(StoreError::Status {
            status: status_code,
            body,
        })
    }

    /// Fetch file content GitHub left out of the gist document
    ///
    /// The raw URL comes from the response body and points at another host,
    /// so the token is not sent with it.
    async fn fetch_raw(&self, raw_url: &str) -> StoreResult<String> {
        debug!(raw_url = raw_url, "Fetching truncated gist file");
        let response = self
            .client
            .get(raw_url)
            .header(USER_AGENT, CLIENT_USER_AGENT)
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        Ok(response.text().await?)
    }

    fn parse_records(content: &str) -> StoreResult<Vec<StoredRecord>> {
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(content)
            .map_err(|e| StoreError::Format(format!("key list is not a valid record array: {}", e)))
    }
}

fn excerpt(mut body: String) -> String {
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    body
}

#[async_trait]
impl KeyRecordStore for GistStore {
    fn name(&self) -> &str {
        "gist"
    }

    async fn load(&self) -> StoreResult<Vec<StoredRecord>> {
        let response = self
            .authorized(self.client.get(self.document_url()))
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        let body = response.text().await?;
        let document: GistDocument = serde_json::from_str(&body)
            .map_err(|e| StoreError::Format(format!("unexpected gist document: {}", e)))?;

        let file = match document.files.get(&self.config.file_name) {
            Some(file) => file,
            None => {
                warn!(
                    file_name = %self.config.file_name,
                    "Gist has no key file yet, starting from an empty list"
                );
                return Ok(Vec::new());
            }
        };

        let content = match (&file.content, file.truncated, &file.raw_url) {
            (_, true, Some(raw_url)) => self.fetch_raw(raw_url).await?,
            (Some(content), _, _) => content.clone(),
            (None, _, _) => String::new(),
        };

        let records = Self::parse_records(&content)?;
        debug!(count = records.len(), "Loaded key records from gist");
        Ok(records)
    }

    async fn save(&self, records: &[StoredRecord]) -> StoreResult<()> {
        let content = serde_json::to_string_pretty(records)?;
        let file_name = self.config.file_name.as_str();
        let body = serde_json::json!({
            "files": {
                file_name: {
                    "content": content
                }
            }
        });

        let response = self
            .authorized(self.client.patch(self.document_url()))
            .json(&body)
            .send()
            .await?;
        Self::check_status(response).await?;

        info!(
            count = records.len(),
            file_name = %self.config.file_name,
            "Saved key records to gist"
        );
        Ok(())
    }
}
