use std::fmt;
use std::time::Duration;

use msync_schemas::{RetryOutcome, RetryPolicy, SubmitReceipt, SubmitRequest};
use serde::Deserialize;
use tracing::debug;

use crate::{SubmitError, Submitter};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Posts each [`SubmitRequest`] as JSON to a registration relay.
///
/// A write is not idempotent, so a request is sent again only after a 429:
/// the relay refused it before doing any work. A 5xx or a transport error
/// (including a timeout) may hide a completed write and is returned as is;
/// the item stays out of the ledger and is picked up by the next run.
///
/// Credentials: the pin token goes in `Authorization: Bearer`, the signer key
/// in `X-Signer-Key`. Neither appears in `Debug` output or logs.
#[derive(Clone)]
pub struct HttpSubmitter {
    url: String,
    signer_key: String,
    pin_token: String,
    retry: RetryPolicy,
    http: reqwest::Client,
}

impl fmt::Debug for HttpSubmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpSubmitter")
            .field("url", &self.url)
            .field("signer_key", &"<redacted>")
            .field("pin_token", &"<redacted>")
            .field("retry", &self.retry)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct RelayResponse {
    #[serde(rename = "agentId")]
    agent_id: serde_json::Value,
    #[serde(rename = "tokenUri", default)]
    token_uri: Option<String>,
}

impl HttpSubmitter {
    pub fn new(url: impl Into<String>, signer_key: String, pin_token: String) -> Self {
        Self {
            url: url.into(),
            signer_key,
            pin_token,
            retry: RetryPolicy::default(),
            http: reqwest::Client::new(),
        }
    }

    /// Backoff used for rate-limited (429) responses only.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

fn receipt_from(resp: RelayResponse) -> Result<SubmitReceipt, SubmitError> {
    // Relays return the token id either as a number or a string.
    let remote_id = match resp.agent_id {
        serde_json::Value::String(s) if !s.trim().is_empty() => s,
        serde_json::Value::Number(n) => n.to_string(),
        other => {
            return Err(SubmitError::Decode(format!("unusable agentId: {other}")));
        }
    };
    Ok(SubmitReceipt {
        remote_id,
        remote_uri: resp.token_uri.unwrap_or_default(),
    })
}

#[async_trait::async_trait]
impl Submitter for HttpSubmitter {
    async fn submit(&self, request: &SubmitRequest) -> Result<SubmitReceipt, SubmitError> {
        if self.url.trim().is_empty() {
            return Err(SubmitError::Config("submit url is empty".to_string()));
        }

        let mut attempt: u32 = 0;
        loop {
            let sent = self
                .http
                .post(&self.url)
                .bearer_auth(&self.pin_token)
                .header("X-Signer-Key", &self.signer_key)
                .timeout(REQUEST_TIMEOUT)
                .json(request)
                .send()
                .await;

            let err = match sent {
                Ok(resp) if resp.status().is_success() => {
                    let body: RelayResponse = resp
                        .json()
                        .await
                        .map_err(|e| SubmitError::Decode(e.to_string()))?;
                    return receipt_from(body);
                }
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    let message = resp.text().await.unwrap_or_default();
                    SubmitError::Rejected { status, message }
                }
                Err(e) => return Err(SubmitError::Transport(e.to_string())),
            };

            let delay = match &err {
                SubmitError::Rejected { status: 429, .. } => {
                    self.retry.backoff(attempt, RetryOutcome::Status(429))
                }
                _ => None,
            };
            match delay {
                Some(delay) => {
                    debug!(attempt, ?delay, "relay rate limited the write, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                None => return Err(err),
            }
        }
    }
}
