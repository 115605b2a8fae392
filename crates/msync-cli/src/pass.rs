//! One reconciliation pass: collect, probe, plan, submit.

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{Context, Result};
use msync_ledger::LedgerStore;
use msync_normalize::{collect_records, NormalizeOptions, SnapshotSource};
use msync_probe::{probe, RemoteProber};
use msync_reconcile::{plan_with_report, PlanReason, StructuralFilters};
use msync_submit::{RunOptions, RunSummary, SubmissionDriver, Submitter, DEFAULT_PACING};
use tracing::{debug, info};

/// Everything a pass needs, constructed by the caller.
pub struct PassInputs<'a> {
    pub sources: Vec<&'a dyn SnapshotSource>,
    pub normalize: NormalizeOptions,
    pub ledger: &'a dyn LedgerStore,
    pub prober: &'a dyn RemoteProber,
    pub submitter: &'a dyn Submitter,
    pub filters: StructuralFilters,
    pub run: RunOptions,
    pub pacing: Duration,
}

impl<'a> PassInputs<'a> {
    pub fn new(
        ledger: &'a dyn LedgerStore,
        prober: &'a dyn RemoteProber,
        submitter: &'a dyn Submitter,
    ) -> Self {
        Self {
            sources: Vec::new(),
            normalize: NormalizeOptions::default(),
            ledger,
            prober,
            submitter,
            filters: StructuralFilters::none(),
            run: RunOptions::default(),
            pacing: DEFAULT_PACING,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassReport {
    pub records: usize,
    pub dropped: BTreeMap<&'static str, usize>,
    pub probe_keys: usize,
    pub new: usize,
    pub updated: usize,
    /// `(cause, count)` for records left out of the plan.
    pub excluded: Vec<(&'static str, usize)>,
    pub summary: RunSummary,
}

/// Run one full pass.
///
/// Fails only on snapshot IO, ledger load, or ledger save errors; probe and
/// per-item submission failures are absorbed and reported.
pub async fn run_pass(inputs: &PassInputs<'_>) -> Result<PassReport> {
    let normalized =
        collect_records(&inputs.sources, &inputs.normalize).context("collect upstream records")?;

    let mut cache = inputs
        .ledger
        .load()
        .with_context(|| format!("load ledger {}", inputs.ledger.location()))?;
    info!(entries = cache.len(), ledger = %inputs.ledger.location(), "ledger loaded");

    let probe_set = probe(inputs.prober).await;

    let report = plan_with_report(&normalized.records, &cache, &probe_set, &inputs.filters);
    for excl in &report.exclusions {
        debug!(id = %excl.id, cause = excl.cause.as_str(), "excluded from plan");
    }
    let new = report.count_reason(PlanReason::New);
    let updated = report.count_reason(PlanReason::Updated);
    info!(
        planned = report.items.len(),
        new,
        updated,
        excluded = report.exclusions.len(),
        "write plan ready"
    );

    let driver = SubmissionDriver::new(inputs.submitter, inputs.ledger).with_pacing(inputs.pacing);
    let summary = driver
        .run(&report.items, inputs.run, &mut cache)
        .await
        .context("submission batch aborted")?;

    Ok(PassReport {
        records: normalized.records.len(),
        dropped: normalized.dropped,
        probe_keys: probe_set.len(),
        new,
        updated,
        excluded: report.exclusion_counts(),
        summary,
    })
}

impl PassReport {
    /// `key=value` lines for stdout.
    pub fn lines(&self) -> Vec<String> {
        let s = &self.summary;
        let mut out = vec![
            format!("records={}", self.records),
            format!("dropped={}", self.dropped.values().sum::<usize>()),
        ];
        for (reason, n) in &self.dropped {
            out.push(format!("dropped_{reason}={n}"));
        }
        out.push(format!("probe_keys={}", self.probe_keys));
        out.push(format!("planned={}", s.planned));
        out.push(format!("new={}", self.new));
        out.push(format!("updated={}", self.updated));
        for (cause, n) in &self.excluded {
            out.push(format!("excluded_{cause}={n}"));
        }
        out.push(format!("dry_run={}", s.dry_run));
        out.push(format!("attempted={}", s.attempted));
        out.push(format!("succeeded={}", s.succeeded));
        out.push(format!("failed={}", s.failed));
        out.push(format!("skipped_by_limit={}", s.skipped_by_limit));
        for f in &s.failures {
            out.push(format!("failure id={} error={}", f.id, f.error));
        }
        out
    }
}
