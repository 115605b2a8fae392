//! msync-normalize
//!
//! Record Normalizer: turns raw upstream registry documents into canonical
//! [`Record`]s and computes their fingerprints.
//!
//! Each upstream shape is one variant of [`UpstreamPayload`]; the variant is
//! chosen once when a snapshot is read and the per-source normalizer is picked
//! by a single `match`. Nothing downstream inspects raw JSON again.
//!
//! Records that cannot or should not be registered are dropped with a
//! [`DropReason`]; a drop is a data-quality outcome, never an error.

pub mod extract;
pub mod fingerprint;
pub mod official;
pub mod quality;
pub mod smithery;
pub mod snapshot;

use std::fmt;

use msync_schemas::{Record, SourceKind};
use serde_json::Value;

pub use fingerprint::{fingerprint, FINGERPRINT_HEX_LEN};
pub use snapshot::{
    collect_records, DirSnapshotSource, MemorySnapshotSource, NormalizeReport, SnapshotSource,
};

/// Raw upstream document tagged with the registry it came from.
#[derive(Debug, Clone, PartialEq)]
pub enum UpstreamPayload {
    Official(Value),
    Smithery(Value),
}

impl UpstreamPayload {
    pub fn new(kind: SourceKind, doc: Value) -> Self {
        match kind {
            SourceKind::Official => UpstreamPayload::Official(doc),
            SourceKind::Smithery => UpstreamPayload::Smithery(doc),
        }
    }

    pub fn kind(&self) -> SourceKind {
        match self {
            UpstreamPayload::Official(_) => SourceKind::Official,
            UpstreamPayload::Smithery(_) => SourceKind::Smithery,
        }
    }

    pub fn doc(&self) -> &Value {
        match self {
            UpstreamPayload::Official(v) | UpstreamPayload::Smithery(v) => v,
        }
    }
}

/// Why a payload did not become a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DropReason {
    /// Payload is not a JSON object.
    Malformed,
    /// No resolvable name (identity) on the payload.
    MissingName,
    /// Display or native name matched a deny-list marker.
    DenyListed(&'static str),
    /// Registry marks the entry deleted.
    Deleted,
    /// A newer version of the same server exists upstream.
    Superseded,
    /// Another payload in this run already produced the same record id.
    DuplicateId,
}

impl DropReason {
    /// Stable label used as a report key.
    pub fn label(&self) -> &'static str {
        match self {
            DropReason::Malformed => "malformed",
            DropReason::MissingName => "missing_name",
            DropReason::DenyListed(_) => "deny_listed",
            DropReason::Deleted => "deleted",
            DropReason::Superseded => "superseded",
            DropReason::DuplicateId => "duplicate_id",
        }
    }
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::DenyListed(term) => write!(f, "deny_listed({term})"),
            other => f.write_str(other.label()),
        }
    }
}

/// Knobs for the normalizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizeOptions {
    /// Drop official entries whose registry metadata says `isLatest: false`.
    pub official_latest_only: bool,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            official_latest_only: true,
        }
    }
}

/// Normalize one payload, reporting why it was dropped.
pub fn normalize_with(payload: &UpstreamPayload, opts: &NormalizeOptions) -> Result<Record, DropReason> {
    match payload {
        UpstreamPayload::Official(doc) => official::normalize_official(doc, opts),
        UpstreamPayload::Smithery(doc) => smithery::normalize_smithery(doc),
    }
}

/// Normalize with default options; `None` for any dropped payload.
pub fn normalize(payload: &UpstreamPayload) -> Option<Record> {
    normalize_with(payload, &NormalizeOptions::default()).ok()
}
