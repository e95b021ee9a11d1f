//! Sync service client
//!
//! Blocking client for the progress synchronization service. Requests carry
//! the `X-Auth-User` / `X-Auth-Key` header pair; status codes map onto
//! [`SyncError`].

use md5::{Digest, Md5};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, info};

use super::types::{SyncProgress, UpdateProgressResult};
use crate::config::{HttpConfig, SyncConfig};

/// Sync service errors
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Document not found")]
    DocumentNotFound,

    #[error("Sync service returned {0}")]
    Status(StatusCode),

    #[error("Sync request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Missing sync credentials: set KOSYNC_USER and KOSYNC_KEY or KOSYNC_PASSWORD")]
    MissingCredentials,
}

/// Derive the service user key from a password
pub fn user_key(password: &str) -> String {
    hex::encode(Md5::digest(password.as_bytes()))
}

/// Map a response status onto the service's error kinds
pub fn check_status(status: StatusCode) -> Result<(), SyncError> {
    match status {
        s if s.is_success() => Ok(()),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(SyncError::Unauthorized),
        StatusCode::NOT_FOUND => Err(SyncError::DocumentNotFound),
        other => Err(SyncError::Status(other)),
    }
}

/// Progress sync client
#[derive(Debug, Clone)]
pub struct SyncClient {
    client: Client,
    api_root: String,
    user: String,
    key: String,
}

impl SyncClient {
    /// Build a client; fails when the user or key is not configured
    pub fn new(config: &SyncConfig, http: &HttpConfig) -> Result<Self, SyncError> {
        if !config.has_credentials() {
            return Err(SyncError::MissingCredentials);
        }
        let client = Client::builder().timeout(http.timeout()).build()?;

        Ok(Self {
            client,
            api_root: config.api_root.trim_end_matches('/').to_string(),
            user: config.user.clone(),
            key: config.key.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_root, path)
    }

    fn send(&self, request: RequestBuilder) -> Result<reqwest::blocking::Response, SyncError> {
        let response = request
            .header("X-Auth-User", &self.user)
            .header("X-Auth-Key", &self.key)
            .header("Accept", "application/json")
            .send()?;
        check_status(response.status())?;
        Ok(response)
    }

    fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, SyncError> {
        Ok(self.send(request)?.json()?)
    }

    /// Check the configured credentials
    pub fn authorize(&self) -> Result<(), SyncError> {
        self.send(self.client.get(self.url("/users/auth")))?;
        info!(user = %self.user, "Authorized with sync service");
        Ok(())
    }

    /// Fetch the stored progress of a document
    pub fn progress(&self, document: &str) -> Result<SyncProgress, SyncError> {
        let url = self.url(&format!(
            "/syncs/progress/{}",
            urlencoding::encode(document)
        ));
        let progress: SyncProgress = self.send_json(self.client.get(url))?;
        debug!(%progress, "Fetched sync progress");
        Ok(progress)
    }

    /// Store progress; the last write wins
    pub fn update_progress(&self, progress: &SyncProgress) -> Result<UpdateProgressResult, SyncError> {
        let request = self.client.put(self.url("/syncs/progress")).json(progress);
        let result: UpdateProgressResult = self.send_json(request)?;
        info!(document = %result.document, timestamp = %result.timestamp, "Updated sync progress");
        Ok(result)
    }
}
