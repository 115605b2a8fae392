//! Upstream snapshot sources.
//!
//! The fetch side (crawling the registries) is someone else's job; it leaves
//! one JSON document per entity on disk. A [`SnapshotSource`] hands those
//! documents to the normalizer as tagged [`UpstreamPayload`]s.
//!
//! Input order is the only ordering the reconciler preserves, so directory
//! sources read files sorted by file name.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use msync_schemas::{Record, SourceKind};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{normalize_with, DropReason, NormalizeOptions, UpstreamPayload};

/// A provider of raw upstream documents for one registry.
pub trait SnapshotSource {
    fn kind(&self) -> SourceKind;

    /// Every payload currently in the snapshot, in stable order.
    fn payloads(&self) -> Result<Vec<UpstreamPayload>>;
}

// ---------------------------------------------------------------------------
// Directory-backed
// ---------------------------------------------------------------------------

/// Directory of `*.json` files, one upstream document per file.
#[derive(Debug, Clone)]
pub struct DirSnapshotSource {
    kind: SourceKind,
    dir: PathBuf,
}

impl DirSnapshotSource {
    pub fn new(kind: SourceKind, dir: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            dir: dir.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn json_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let entries = fs::read_dir(&self.dir)
            .with_context(|| format!("read snapshot dir failed: {}", self.dir.display()))?;
        for entry in entries {
            let path = entry
                .with_context(|| format!("list snapshot dir failed: {}", self.dir.display()))?
                .path();
            if path.is_file() && path.extension().is_some_and(|e| e == "json") {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

impl SnapshotSource for DirSnapshotSource {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    fn payloads(&self) -> Result<Vec<UpstreamPayload>> {
        if !self.dir.exists() {
            info!(source = %self.kind, dir = %self.dir.display(), "snapshot dir not found; skipping source");
            return Ok(Vec::new());
        }

        let mut out = Vec::new();
        for path in self.json_files()? {
            // A single unreadable document is a data defect, not a failed run.
            let doc = match fs::read_to_string(&path)
                .map_err(anyhow::Error::from)
                .and_then(|raw| serde_json::from_str::<Value>(&raw).map_err(anyhow::Error::from))
            {
                Ok(doc) => doc,
                Err(e) => {
                    warn!(source = %self.kind, file = %path.display(), error = %e, "skipping unreadable snapshot file");
                    continue;
                }
            };
            out.push(UpstreamPayload::new(self.kind, doc));
        }
        Ok(out)
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// Fixed list of documents; used by tests and by callers that fetch in-process.
#[derive(Debug, Clone)]
pub struct MemorySnapshotSource {
    kind: SourceKind,
    docs: Vec<Value>,
}

impl MemorySnapshotSource {
    pub fn new(kind: SourceKind, docs: Vec<Value>) -> Self {
        Self { kind, docs }
    }
}

impl SnapshotSource for MemorySnapshotSource {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    fn payloads(&self) -> Result<Vec<UpstreamPayload>> {
        Ok(self
            .docs
            .iter()
            .cloned()
            .map(|d| UpstreamPayload::new(self.kind, d))
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Collection
// ---------------------------------------------------------------------------

/// Outcome of normalizing every payload from a set of sources.
#[derive(Debug, Clone, Default)]
pub struct NormalizeReport {
    /// Records in source order, then payload order within a source.
    pub records: Vec<Record>,
    /// Payload count per source.
    pub seen: BTreeMap<SourceKind, usize>,
    /// Drop count per [`DropReason::label`].
    pub dropped: BTreeMap<&'static str, usize>,
}

impl NormalizeReport {
    pub fn dropped_total(&self) -> usize {
        self.dropped.values().sum()
    }
}

/// Read and normalize every source in order.
///
/// The first payload producing a given record id wins; later ones are dropped
/// as [`DropReason::DuplicateId`] so the reconciler sees unique ids.
pub fn collect_records(
    sources: &[&dyn SnapshotSource],
    opts: &NormalizeOptions,
) -> Result<NormalizeReport> {
    let mut report = NormalizeReport::default();
    let mut ids: HashSet<String> = HashSet::new();

    for source in sources {
        let payloads = source.payloads()?;
        *report.seen.entry(source.kind()).or_default() += payloads.len();
        let mut kept = 0usize;

        for payload in &payloads {
            let outcome = normalize_with(payload, opts).and_then(|r| {
                if ids.insert(r.id.clone()) {
                    Ok(r)
                } else {
                    Err(DropReason::DuplicateId)
                }
            });
            match outcome {
                Ok(record) => {
                    kept += 1;
                    report.records.push(record);
                }
                Err(reason) => {
                    debug!(source = %source.kind(), %reason, "dropped upstream record");
                    *report.dropped.entry(reason.label()).or_default() += 1;
                }
            }
        }

        info!(
            source = %source.kind(),
            payloads = payloads.len(),
            kept,
            "normalized source snapshot"
        );
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn memory_source_tags_payloads_with_its_kind() {
        let src = MemorySnapshotSource::new(SourceKind::Smithery, vec![json!({"a": 1})]);
        let p = src.payloads().unwrap();
        assert_eq!(p.len(), 1);
        assert_eq!(p[0].kind(), SourceKind::Smithery);
    }

    #[test]
    fn collect_counts_drops_by_reason_and_dedups_ids() {
        let src = MemorySnapshotSource::new(
            SourceKind::Smithery,
            vec![
                json!({"qualifiedName": "@a/one", "displayName": "One"}),
                json!({"qualifiedName": "@a/one", "displayName": "One again"}),
                json!({"qualifiedName": "@a/demo", "displayName": "Demo"}),
                json!({"displayName": "nameless"}),
            ],
        );
        let report = collect_records(&[&src], &NormalizeOptions::default()).unwrap();

        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].display_name, "One");
        assert_eq!(report.seen[&SourceKind::Smithery], 4);
        assert_eq!(report.dropped["duplicate_id"], 1);
        assert_eq!(report.dropped["deny_listed"], 1);
        assert_eq!(report.dropped["missing_name"], 1);
        assert_eq!(report.dropped_total(), 3);
    }

    #[test]
    fn sources_are_concatenated_in_the_given_order() {
        let official = MemorySnapshotSource::new(
            SourceKind::Official,
            vec![json!({"server": {"name": "io.github.a/maps", "version": "1"}})],
        );
        let smithery = MemorySnapshotSource::new(
            SourceKind::Smithery,
            vec![json!({"qualifiedName": "@a/maps"})],
        );
        let report = collect_records(&[&smithery, &official], &NormalizeOptions::default()).unwrap();
        let ids: Vec<&str> = report.records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["smithery:@a/maps", "official:io.github.a/maps:1"]);
    }
}
