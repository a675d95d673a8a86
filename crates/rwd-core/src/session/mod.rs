//! HTTP client for the agent backend's session API.
//!
//! All endpoints live under `/api/v1` and wrap their payload in a
//! `{code, msg, data}` envelope where `code == 0` means success.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use url::Url;

use crate::events::{FileInfo, SessionEvent};

pub mod sse;

pub use sse::{StreamItem, subscribe};

/// Response envelope used by every session API endpoint.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    pub code: i64,
    #[serde(default)]
    pub msg: String,
    pub data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    /// Unwraps the payload, turning a non-zero `code` into an error.
    pub fn into_data(self) -> Result<T> {
        if self.code != 0 {
            bail!("backend error {}: {}", self.code, self.msg);
        }
        self.data.context("backend returned empty data")
    }
}

/// A complete recorded session, as returned by the replay endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordedSession {
    pub session_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub shared_at: Option<i64>,
    pub events: Vec<SessionEvent>,
    #[serde(default)]
    pub files: Vec<FileInfo>,
}

/// One row of the session list.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub latest_message: Option<String>,
    #[serde(default)]
    pub latest_message_at: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub unread_message_count: u64,
}

#[derive(Debug, Deserialize)]
struct SessionPage {
    #[serde(default)]
    sessions: Vec<SessionSummary>,
}

/// Client for one backend instance.
#[derive(Debug, Clone)]
pub struct SessionClient {
    base_url: Url,
    http: reqwest::Client,
}

impl SessionClient {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            http: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        // Url::join treats a missing trailing slash as a file segment and
        // would drop it, so build from the path pieces instead.
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| anyhow::anyhow!("base URL cannot be a base: {}", self.base_url))?
            .pop_if_empty()
            .extend(path.split('/'));
        Ok(url)
    }

    /// Fetches the full recorded event log for a session.
    pub async fn fetch_replay(&self, session_id: &str) -> Result<RecordedSession> {
        let url = self.endpoint(&format!("api/v1/sessions/{session_id}/replay"))?;
        tracing::debug!(%url, "fetching session replay");
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("replay fetch failed with HTTP {status}: {body}");
        }
        let envelope: ApiEnvelope<RecordedSession> = response
            .json()
            .await
            .context("failed to decode replay response")?;
        envelope.into_data()
    }

    /// Lists sessions known to the backend, most recent first.
    pub async fn list_sessions(&self) -> Result<Vec<SessionSummary>> {
        let url = self.endpoint("api/v1/sessions")?;
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("session list failed with HTTP {status}: {body}");
        }
        let envelope: ApiEnvelope<SessionPage> = response
            .json()
            .await
            .context("failed to decode session list response")?;
        Ok(envelope.into_data()?.sessions)
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }
}
