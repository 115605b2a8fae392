//! GraphQL index prober (`agents { registrationFile { name mcpEndpoint } }`).

use std::time::Duration;

use msync_schemas::{RetryOutcome, RetryPolicy};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::{ProbeError, RemoteEntity, RemoteProber};

pub const DEFAULT_PAGE_SIZE: u32 = 1000;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Queries a subgraph endpoint for the first `page_size` registered agents.
///
/// The API key is passed in by the caller; it is sent as a bearer token and
/// never logged. Without a key the prober refuses before any network call.
#[derive(Debug, Clone)]
pub struct SubgraphProber {
    url: String,
    api_key: Option<String>,
    page_size: u32,
    retry: RetryPolicy,
    http: reqwest::Client,
}

impl SubgraphProber {
    pub fn new(url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            url: url.into(),
            api_key,
            page_size: DEFAULT_PAGE_SIZE,
            retry: RetryPolicy::default(),
            http: reqwest::Client::new(),
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn query(&self) -> String {
        format!(
            "{{ agents(first: {}) {{ registrationFile {{ name mcpEndpoint }} }} }}",
            self.page_size
        )
    }
}

#[async_trait::async_trait]
impl RemoteProber for SubgraphProber {
    fn name(&self) -> &'static str {
        "subgraph"
    }

    async fn fetch_entities(&self) -> Result<Vec<RemoteEntity>, ProbeError> {
        let key = match self.api_key.as_deref().map(str::trim) {
            Some(k) if !k.is_empty() => k,
            _ => return Err(ProbeError::Config("probe api key not set".to_string())),
        };
        if self.url.trim().is_empty() {
            return Err(ProbeError::Config("probe url is empty".to_string()));
        }

        let body = json!({ "query": self.query() });
        let mut attempt: u32 = 0;

        loop {
            let sent = self
                .http
                .post(&self.url)
                .bearer_auth(key)
                .timeout(REQUEST_TIMEOUT)
                .json(&body)
                .send()
                .await;

            let (outcome, err) = match sent {
                Ok(resp) if resp.status().is_success() => {
                    let parsed: GraphResponse = resp
                        .json()
                        .await
                        .map_err(|e| ProbeError::Decode(e.to_string()))?;
                    return parsed.into_entities();
                }
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    let message = resp.text().await.unwrap_or_default();
                    (
                        RetryOutcome::Status(status),
                        ProbeError::Api {
                            status: Some(status),
                            message,
                        },
                    )
                }
                Err(e) => (RetryOutcome::Transport, ProbeError::Transport(e.to_string())),
            };

            match self.retry.backoff(attempt, outcome) {
                Some(delay) => {
                    debug!(attempt, ?delay, error = %err, "probe request failed, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                None => return Err(err),
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct GraphResponse {
    data: Option<GraphData>,
    #[serde(default)]
    errors: Vec<GraphError>,
}

#[derive(Debug, Deserialize)]
struct GraphData {
    #[serde(default)]
    agents: Vec<AgentRow>,
}

#[derive(Debug, Deserialize)]
struct AgentRow {
    #[serde(rename = "registrationFile")]
    registration_file: Option<RegistrationFile>,
}

#[derive(Debug, Deserialize)]
struct RegistrationFile {
    name: Option<String>,
    #[serde(rename = "mcpEndpoint")]
    mcp_endpoint: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GraphError {
    message: String,
}

impl GraphResponse {
    fn into_entities(self) -> Result<Vec<RemoteEntity>, ProbeError> {
        let data = match self.data {
            Some(d) => d,
            None if !self.errors.is_empty() => {
                let message = self
                    .errors
                    .into_iter()
                    .map(|e| e.message)
                    .collect::<Vec<_>>()
                    .join("; ");
                return Err(ProbeError::Api {
                    status: None,
                    message,
                });
            }
            None => return Err(ProbeError::Decode("response has no data".to_string())),
        };

        Ok(data
            .agents
            .into_iter()
            .filter_map(|row| row.registration_file)
            .map(|f| RemoteEntity {
                endpoint: f.mcp_endpoint,
                display_name: f.name,
            })
            .collect())
    }
}
