//! msync-probe
//!
//! Remote State Prober: a best-effort snapshot of what already exists on the
//! remote side, taken once per run.
//!
//! The prober itself may fail in any of the ways [`ProbeError`] lists; the
//! [`probe`] wrapper turns every such failure into an empty set plus a warning
//! so a run is never aborted by an unreachable index.

mod subgraph;

use std::fmt;

use msync_schemas::RemoteProbeSet;
use tracing::{info, warn};

pub use subgraph::{SubgraphProber, DEFAULT_PAGE_SIZE};

/// One entity as reported by the remote index. Either field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteEntity {
    pub endpoint: Option<String>,
    pub display_name: Option<String>,
}

impl RemoteEntity {
    pub fn new(endpoint: Option<&str>, display_name: Option<&str>) -> Self {
        Self {
            endpoint: endpoint.map(str::to_string),
            display_name: display_name.map(str::to_string),
        }
    }
}

/// Errors a [`RemoteProber`] may return.
#[derive(Debug)]
pub enum ProbeError {
    /// Network or transport failure.
    Transport(String),
    /// The index answered with an error (HTTP status and/or GraphQL errors).
    Api { status: Option<u16>, message: String },
    /// The response body could not be decoded.
    Decode(String),
    /// Missing URL or credentials.
    Config(String),
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeError::Transport(msg) => write!(f, "probe transport error: {msg}"),
            ProbeError::Api {
                status: Some(code),
                message,
            } => write!(f, "probe api error (status {code}): {message}"),
            ProbeError::Api {
                status: None,
                message,
            } => write!(f, "probe api error: {message}"),
            ProbeError::Decode(msg) => write!(f, "probe decode error: {msg}"),
            ProbeError::Config(msg) => write!(f, "probe config error: {msg}"),
        }
    }
}

impl std::error::Error for ProbeError {}

/// Source of remote identities.
#[async_trait::async_trait]
pub trait RemoteProber: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch_entities(&self) -> Result<Vec<RemoteEntity>, ProbeError>;
}

/// Prober used when no index URL is configured. Always degrades.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledProber;

#[async_trait::async_trait]
impl RemoteProber for DisabledProber {
    fn name(&self) -> &'static str {
        "disabled"
    }

    async fn fetch_entities(&self) -> Result<Vec<RemoteEntity>, ProbeError> {
        Err(ProbeError::Config("no probe url configured".to_string()))
    }
}

/// Build the session probe set. Never fails.
pub async fn probe(prober: &dyn RemoteProber) -> RemoteProbeSet {
    match prober.fetch_entities().await {
        Ok(entities) => {
            let mut set = RemoteProbeSet::new();
            for e in &entities {
                set.insert_entity(e.endpoint.as_deref(), e.display_name.as_deref());
            }
            info!(
                prober = prober.name(),
                entities = entities.len(),
                keys = set.len(),
                "remote probe complete"
            );
            set
        }
        Err(err) => {
            warn!(
                prober = prober.name(),
                error = %err,
                "remote probe unavailable, continuing with an empty probe set"
            );
            RemoteProbeSet::new()
        }
    }
}
