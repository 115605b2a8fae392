use std::time::Duration;

use chrono::{DateTime, Utc};
use msync_ledger::{LedgerError, LedgerStore};
use msync_reconcile::WritePlanItem;
use msync_schemas::{LedgerEntry, LedgerMap};
use tracing::{debug, error, info, warn};

use crate::Submitter;

/// Minimum gap between two real submissions.
pub const DEFAULT_PACING: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Process only the first `limit` plan items.
    pub limit: Option<usize>,
    /// Walk the plan without writing anything.
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitFailure {
    pub id: String,
    pub error: String,
}

/// Outcome of one batch.
///
/// In a dry run `attempted` counts would-be submissions and both
/// `succeeded` and `failed` stay zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub planned: usize,
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped_by_limit: usize,
    pub dry_run: bool,
    pub failures: Vec<SubmitFailure>,
}

type Clock = Box<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Sequential submit-and-record loop over a write plan.
///
/// Owns the ledger for the duration of [`run`](Self::run).
pub struct SubmissionDriver<'a> {
    submitter: &'a dyn Submitter,
    ledger: &'a dyn LedgerStore,
    pacing: Duration,
    clock: Clock,
}

impl<'a> SubmissionDriver<'a> {
    pub fn new(submitter: &'a dyn Submitter, ledger: &'a dyn LedgerStore) -> Self {
        Self {
            submitter,
            ledger,
            pacing: DEFAULT_PACING,
            clock: Box::new(Utc::now),
        }
    }

    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Submit plan items in order, updating `cache` and persisting it after
    /// every success.
    ///
    /// Returns `Err` only when the ledger cannot be saved; everything written
    /// before that point is already persisted.
    pub async fn run(
        &self,
        plan: &[WritePlanItem],
        opts: RunOptions,
        cache: &mut LedgerMap,
    ) -> Result<RunSummary, LedgerError> {
        let take = opts.limit.map_or(plan.len(), |l| l.min(plan.len()));
        let batch = &plan[..take];

        let mut summary = RunSummary {
            planned: plan.len(),
            skipped_by_limit: plan.len() - take,
            dry_run: opts.dry_run,
            ..RunSummary::default()
        };

        info!(
            planned = summary.planned,
            batch = batch.len(),
            dry_run = opts.dry_run,
            ledger = %self.ledger.location(),
            "submission batch starting"
        );

        for (idx, item) in batch.iter().enumerate() {
            let record = &item.record;
            summary.attempted += 1;

            if opts.dry_run {
                info!(id = %record.id, reason = %item.reason, "dry run: would submit");
                continue;
            }

            if idx > 0 && !self.pacing.is_zero() {
                tokio::time::sleep(self.pacing).await;
            }

            let request = record.to_submit_request();
            match self.submitter.submit(&request).await {
                Ok(receipt) => {
                    cache.insert(
                        record.id.clone(),
                        LedgerEntry {
                            remote_id: receipt.remote_id.clone(),
                            fingerprint: record.fingerprint.clone(),
                            written_at: (self.clock)(),
                        },
                    );
                    if let Err(err) = self.ledger.save(cache) {
                        error!(
                            id = %record.id,
                            remote_id = %receipt.remote_id,
                            error = %err,
                            "ledger save failed after a successful write, stopping batch"
                        );
                        return Err(err);
                    }
                    summary.succeeded += 1;
                    info!(
                        id = %record.id,
                        reason = %item.reason,
                        remote_id = %receipt.remote_id,
                        "submitted"
                    );
                    debug!(id = %record.id, remote_uri = %receipt.remote_uri, "receipt");
                }
                Err(err) => {
                    warn!(id = %record.id, error = %err, "submission failed");
                    summary.failed += 1;
                    summary.failures.push(SubmitFailure {
                        id: record.id.clone(),
                        error: err.to_string(),
                    });
                }
            }
        }

        info!(
            attempted = summary.attempted,
            succeeded = summary.succeeded,
            failed = summary.failed,
            skipped_by_limit = summary.skipped_by_limit,
            "submission batch finished"
        );
        Ok(summary)
    }
}
