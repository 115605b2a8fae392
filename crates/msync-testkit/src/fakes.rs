use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard};

use msync_probe::{ProbeError, RemoteEntity, RemoteProber};
use msync_schemas::{SubmitReceipt, SubmitRequest};
use msync_submit::{SubmitError, Submitter};

/// In-memory write primitive.
///
/// Successful calls get sequential ids (`agent-1`, `agent-2`, ...). Requests
/// whose display name is in the failing set are rejected with 422 and do not
/// consume an id.
#[derive(Debug, Default)]
pub struct FakeSubmitter {
    failing: Mutex<BTreeSet<String>>,
    calls: Mutex<Vec<SubmitRequest>>,
    next_id: Mutex<u64>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|p| p.into_inner())
}

impl FakeSubmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(names: &[&str]) -> Self {
        let s = Self::default();
        for n in names {
            s.fail_display_name(n);
        }
        s
    }

    pub fn fail_display_name(&self, name: &str) {
        lock(&self.failing).insert(name.to_string());
    }

    pub fn clear_failures(&self) {
        lock(&self.failing).clear();
    }

    /// Every request seen, in call order, including rejected ones.
    pub fn calls(&self) -> Vec<SubmitRequest> {
        lock(&self.calls).clone()
    }

    pub fn call_names(&self) -> Vec<String> {
        lock(&self.calls)
            .iter()
            .map(|r| r.display_name.clone())
            .collect()
    }
}

#[async_trait::async_trait]
impl Submitter for FakeSubmitter {
    async fn submit(&self, request: &SubmitRequest) -> Result<SubmitReceipt, SubmitError> {
        lock(&self.calls).push(request.clone());

        if lock(&self.failing).contains(&request.display_name) {
            return Err(SubmitError::Rejected {
                status: 422,
                message: format!("rejected {}", request.display_name),
            });
        }

        let mut next = lock(&self.next_id);
        *next += 1;
        Ok(SubmitReceipt {
            remote_id: format!("agent-{}", *next),
            remote_uri: format!("ipfs://fake/{}.json", *next),
        })
    }
}

/// Prober returning a fixed entity list.
#[derive(Debug, Clone, Default)]
pub struct StaticProber {
    entities: Vec<RemoteEntity>,
}

impl StaticProber {
    pub fn new(entities: Vec<RemoteEntity>) -> Self {
        Self { entities }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with(mut self, endpoint: Option<&str>, display_name: Option<&str>) -> Self {
        self.entities.push(RemoteEntity::new(endpoint, display_name));
        self
    }
}

#[async_trait::async_trait]
impl RemoteProber for StaticProber {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn fetch_entities(&self) -> Result<Vec<RemoteEntity>, ProbeError> {
        Ok(self.entities.clone())
    }
}

/// Prober that always fails as if the index were unreachable.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingProber;

#[async_trait::async_trait]
impl RemoteProber for FailingProber {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn fetch_entities(&self) -> Result<Vec<RemoteEntity>, ProbeError> {
        Err(ProbeError::Transport("connection refused".to_string()))
    }
}
