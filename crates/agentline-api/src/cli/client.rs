//! HTTP client for a running agent service.
//!
//! The terminal commands (`chat`, `history`, `clear`) never touch the
//! database directly; they talk to the service the same way any other
//! client would.

use anyhow::{Context, Result, anyhow, bail};
use reqwest::{StatusCode, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use agentline_types::conversation::{AgentRequest, AgentResponse, StoredMessage};

pub const DEFAULT_URL: &str = "http://localhost:8001";

/// Error detail inside a failed envelope.
#[derive(Debug, Deserialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Deserialize)]
struct SessionCleared {
    deleted_messages: u64,
}

pub struct AgentClient {
    http: reqwest::Client,
    base_url: Url,
    token: Option<SecretString>,
}

impl AgentClient {
    pub fn new(base_url: &str, token: Option<SecretString>) -> Result<Self> {
        let base_url =
            Url::parse(base_url).with_context(|| format!("invalid service URL '{base_url}'"))?;
        if base_url.cannot_be_a_base() {
            bail!("invalid service URL '{base_url}'");
        }
        let http = reqwest::Client::builder()
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url,
            token,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// `base_url` joined with `segments`, each percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        }
    }

    pub async fn health(&self) -> Result<HealthStatus> {
        let response = self
            .http
            .get(self.endpoint(&["health"]))
            .send()
            .await
            .with_context(|| format!("agent service unreachable at {}", self.base_url))?;
        if !response.status().is_success() {
            bail!("health check failed with HTTP {}", response.status());
        }
        Ok(response.json().await?)
    }

    /// POST /api/agent.
    pub async fn send_query(&self, request: &AgentRequest) -> Result<AgentResponse> {
        let response = self
            .authorize(self.http.post(self.endpoint(&["api", "agent"])))
            .json(request)
            .send()
            .await
            .context("failed to reach the agent service")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(describe_failure(status, &body));
        }
        Ok(response.json().await?)
    }

    /// The newest message of a session, `None` when the session is empty.
    pub async fn latest_message(&self, session_id: &str) -> Result<Option<StoredMessage>> {
        let url = self.endpoint(&["api", "sessions", session_id, "messages", "latest"]);
        let response = self
            .authorize(self.http.get(url))
            .send()
            .await
            .context("failed to reach the agent service")?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        read_envelope(response).await.map(Some)
    }

    pub async fn messages(&self, session_id: &str, limit: Option<i64>) -> Result<Vec<StoredMessage>> {
        let mut request = self.authorize(
            self.http
                .get(self.endpoint(&["api", "sessions", session_id, "messages"])),
        );
        if let Some(limit) = limit {
            request = request.query(&[("limit", limit)]);
        }
        let response = request
            .send()
            .await
            .context("failed to reach the agent service")?;
        read_envelope(response).await
    }

    /// DELETE /api/sessions/{id}. Returns the number of messages removed.
    pub async fn clear_session(&self, session_id: &str) -> Result<u64> {
        let response = self
            .authorize(self.http.delete(self.endpoint(&["api", "sessions", session_id])))
            .send()
            .await
            .context("failed to reach the agent service")?;
        let cleared: SessionCleared = read_envelope(response).await?;
        Ok(cleared.deleted_messages)
    }
}

async fn read_envelope<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(describe_failure(status, &body));
    }
    let envelope: Envelope<T> =
        serde_json::from_str(&body).context("unexpected response from the agent service")?;
    envelope
        .data
        .ok_or_else(|| anyhow!("agent service returned no data"))
}

/// Turn an error response into a readable message, preferring the envelope.
fn describe_failure(status: StatusCode, body: &str) -> anyhow::Error {
    match serde_json::from_str::<Envelope<serde_json::Value>>(body) {
        Ok(envelope) if !envelope.errors.is_empty() => {
            let detail = &envelope.errors[0];
            anyhow!("HTTP {status} ({}): {}", detail.code, detail.message)
        }
        _ if body.trim().is_empty() => anyhow!("HTTP {status}"),
        _ => anyhow!("HTTP {status}: {}", body.trim()),
    }
}
