use std::fmt;

use msync_schemas::Record;

/// Why a record is in the write plan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PlanReason {
    /// No ledger entry for this id.
    New,
    /// Ledger entry exists with a different fingerprint.
    Updated,
}

impl PlanReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanReason::New => "NEW",
            PlanReason::Updated => "UPDATED",
        }
    }
}

impl fmt::Display for PlanReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct WritePlanItem {
    pub record: Record,
    pub reason: PlanReason,
}

/// Structural requirements a record must meet to be considered at all.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StructuralFilters {
    pub require_endpoint: bool,
    pub require_tools: bool,
}

impl StructuralFilters {
    pub fn none() -> Self {
        Self::default()
    }

    /// First failed requirement, if any.
    pub fn check(&self, record: &Record) -> Option<FilterFailure> {
        if self.require_endpoint && !record.has_endpoint() {
            return Some(FilterFailure::MissingEndpoint);
        }
        if self.require_tools && !record.has_tools() {
            return Some(FilterFailure::NoTools);
        }
        None
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FilterFailure {
    MissingEndpoint,
    NoTools,
}

/// Why a record was left out of the plan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ExclusionCause {
    Filtered(FilterFailure),
    /// Ledger fingerprint equals the current one.
    Unchanged,
    /// Endpoint already present remotely.
    RemoteEndpoint,
    /// Lower-cased display name already present remotely.
    RemoteName,
}

impl ExclusionCause {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExclusionCause::Filtered(FilterFailure::MissingEndpoint) => "filtered_no_endpoint",
            ExclusionCause::Filtered(FilterFailure::NoTools) => "filtered_no_tools",
            ExclusionCause::Unchanged => "unchanged",
            ExclusionCause::RemoteEndpoint => "remote_endpoint",
            ExclusionCause::RemoteName => "remote_name",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Exclusion {
    pub id: String,
    pub cause: ExclusionCause,
}

/// Plan plus evidence for everything that did not make it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlanReport {
    pub items: Vec<WritePlanItem>,
    pub exclusions: Vec<Exclusion>,
}

impl PlanReport {
    pub fn count_reason(&self, reason: PlanReason) -> usize {
        self.items.iter().filter(|i| i.reason == reason).count()
    }

    pub fn count_excluded(&self, cause: ExclusionCause) -> usize {
        self.exclusions.iter().filter(|e| e.cause == cause).count()
    }

    /// `(cause label, count)` in stable order, zero counts omitted.
    pub fn exclusion_counts(&self) -> Vec<(&'static str, usize)> {
        let mut counts: std::collections::BTreeMap<ExclusionCause, usize> = Default::default();
        for e in &self.exclusions {
            *counts.entry(e.cause).or_default() += 1;
        }
        counts.into_iter().map(|(c, n)| (c.as_str(), n)).collect()
    }
}
