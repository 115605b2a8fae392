use msync_schemas::{LedgerMap, Record, RemoteProbeSet};

use crate::{Exclusion, ExclusionCause, PlanReason, PlanReport, StructuralFilters, WritePlanItem};

fn classify(
    record: &Record,
    cache: &LedgerMap,
    probe: &RemoteProbeSet,
    filters: &StructuralFilters,
) -> Result<PlanReason, ExclusionCause> {
    if let Some(failure) = filters.check(record) {
        return Err(ExclusionCause::Filtered(failure));
    }

    let reason = match cache.get(&record.id) {
        None => PlanReason::New,
        Some(entry) if entry.fingerprint == record.fingerprint => {
            return Err(ExclusionCause::Unchanged);
        }
        Some(_) => PlanReason::Updated,
    };

    // Remote presence overrides the ledger verdict.
    if let Some(endpoint) = record.endpoint.as_deref() {
        if probe.contains_endpoint(endpoint) {
            return Err(ExclusionCause::RemoteEndpoint);
        }
    }
    if probe.contains_display_name(&record.display_name) {
        return Err(ExclusionCause::RemoteName);
    }

    Ok(reason)
}

/// Full reconciliation pass with exclusion evidence.
///
/// Plan items keep the relative order of `records`.
pub fn plan_with_report(
    records: &[Record],
    cache: &LedgerMap,
    probe: &RemoteProbeSet,
    filters: &StructuralFilters,
) -> PlanReport {
    let mut report = PlanReport::default();
    for record in records {
        match classify(record, cache, probe, filters) {
            Ok(reason) => report.items.push(WritePlanItem {
                record: record.clone(),
                reason,
            }),
            Err(cause) => report.exclusions.push(Exclusion {
                id: record.id.clone(),
                cause,
            }),
        }
    }
    report
}

/// Ordered write plan for this run.
pub fn plan(
    records: &[Record],
    cache: &LedgerMap,
    probe: &RemoteProbeSet,
    filters: &StructuralFilters,
) -> Vec<WritePlanItem> {
    plan_with_report(records, cache, probe, filters).items
}
