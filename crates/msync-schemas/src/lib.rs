//! msync-schemas
//!
//! Shared data model for the registry sync pipeline. Every other crate speaks
//! these types; none of them carry behaviour beyond small accessors.
//!
//! Serde names on [`LedgerEntry`] and [`LedgerFile`] are the persisted wire
//! format of the ledger file and must not change.

mod retry;

pub use retry::{RetryOutcome, RetryPolicy};

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Source kinds
// ---------------------------------------------------------------------------

/// Upstream registry a record was pulled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// registry.modelcontextprotocol.io (nested publisher-registry shape).
    Official,
    /// registry.smithery.ai (flat marketplace-listing shape).
    Smithery,
}

impl SourceKind {
    pub const ALL: [SourceKind; 2] = [SourceKind::Official, SourceKind::Smithery];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Official => "official",
            SourceKind::Smithery => "smithery",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "official" | "mcp" => Ok(SourceKind::Official),
            "smithery" => Ok(SourceKind::Smithery),
            other => Err(anyhow!(
                "invalid source '{}'. expected one of: official | smithery",
                other
            )),
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One external entity to be registered, in canonical shape.
///
/// Built only by the normalizer. `fingerprint` is derived from
/// `display_name`, `description`, `tool_names` and `endpoint`; two records with
/// equal `id` and equal `fingerprint` are semantically identical.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// `{source}:{source-native-name}[:version]`
    pub id: String,
    pub source: SourceKind,
    pub display_name: String,
    pub description: String,
    pub icon_url: Option<String>,
    pub endpoint: Option<String>,
    /// De-duplicated, first-seen order.
    pub tool_names: Vec<String>,
    pub config_schema: Option<Value>,
    pub package_ref: Option<String>,
    /// 16 lower-case hex characters.
    pub fingerprint: String,
}

impl Record {
    pub fn has_endpoint(&self) -> bool {
        self.endpoint.as_deref().is_some_and(|e| !e.trim().is_empty())
    }

    pub fn has_tools(&self) -> bool {
        !self.tool_names.is_empty()
    }

    /// Arguments for the external write primitive.
    pub fn to_submit_request(&self) -> SubmitRequest {
        SubmitRequest {
            display_name: self.display_name.clone(),
            description: self.description.clone(),
            endpoint: self.endpoint.clone(),
            tool_names: self.tool_names.clone(),
            config_schema: self.config_schema.clone(),
            package_ref: self.package_ref.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Ledger (persisted)
// ---------------------------------------------------------------------------

/// Local ledger row, keyed by [`Record::id`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Identifier returned by the external write primitive.
    #[serde(rename = "agentId")]
    pub remote_id: String,
    /// Record fingerprint at the time of the last successful write.
    #[serde(rename = "contentHash")]
    pub fingerprint: String,
    #[serde(rename = "registeredAt")]
    pub written_at: DateTime<Utc>,
}

/// In-memory ledger map. `BTreeMap` keeps the persisted file stable.
pub type LedgerMap = BTreeMap<String, LedgerEntry>;

/// Persisted form: `{ "registered": { "<id>": LedgerEntry } }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerFile {
    #[serde(default)]
    pub registered: LedgerMap,
}

// ---------------------------------------------------------------------------
// Remote probe set (session only)
// ---------------------------------------------------------------------------

/// Opaque matching keys observed at the remote source of truth: endpoint
/// strings and lower-cased display names share one set.
///
/// Both kinds are trimmed on the way in and on lookup, the same way record
/// fields are trimmed by the normalizer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteProbeSet {
    keys: BTreeSet<String>,
}

impl RemoteProbeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one remote entity under both of its lookup keys.
    pub fn insert_entity(&mut self, endpoint: Option<&str>, display_name: Option<&str>) {
        if let Some(ep) = endpoint.map(str::trim).filter(|e| !e.is_empty()) {
            self.keys.insert(ep.to_string());
        }
        if let Some(name) = display_name.map(str::trim).filter(|n| !n.is_empty()) {
            self.keys.insert(name.to_lowercase());
        }
    }

    /// Case-sensitive endpoint lookup.
    pub fn contains_endpoint(&self, endpoint: &str) -> bool {
        self.keys.contains(endpoint.trim())
    }

    /// Display-name lookup; the argument is lower-cased before matching.
    pub fn contains_display_name(&self, display_name: &str) -> bool {
        self.keys.contains(&display_name.trim().to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

// ---------------------------------------------------------------------------
// External write primitive boundary
// ---------------------------------------------------------------------------

/// Payload handed to the external write primitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    pub display_name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    pub tool_names: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_schema: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_ref: Option<String>,
}

/// Result of one successful external write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReceipt {
    pub remote_id: String,
    pub remote_uri: String,
}
