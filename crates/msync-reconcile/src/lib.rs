//! msync-reconcile
//!
//! Reconciler: decides which records to write this run.
//!
//! Per record, in input order:
//! 1. structural filters (excluded outright when failed)
//! 2. ledger lookup: absent => NEW, same fingerprint => skip, else UPDATED
//! 3. probe cross-check: endpoint or lower-cased display name already
//!    remote => skip, whatever step 2 said
//!
//! Deterministic, pure logic. No IO, no clock, cannot fail.

mod engine;
mod types;

pub use engine::{plan, plan_with_report};
pub use types::*;
