//! msync-submit
//!
//! Submission Driver and the external write primitive it drives.
//!
//! The write path is strictly sequential: one submission at a time, a fixed
//! pacing delay between real submissions, and a ledger save after every
//! success. Per-item failures are counted and never abort the batch; a ledger
//! save failure does.

mod driver;
mod http;

use std::fmt;

use msync_schemas::{SubmitReceipt, SubmitRequest};

pub use driver::{RunOptions, RunSummary, SubmissionDriver, SubmitFailure, DEFAULT_PACING};
pub use http::HttpSubmitter;

/// Errors the write primitive may return. All of them are per-item.
#[derive(Debug)]
pub enum SubmitError {
    /// Network or transport failure.
    Transport(String),
    /// The remote side refused the write (auth, validation, server error).
    Rejected { status: u16, message: String },
    /// The response could not be decoded into a receipt.
    Decode(String),
    /// Missing URL or credentials.
    Config(String),
}

impl fmt::Display for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitError::Transport(msg) => write!(f, "submit transport error: {msg}"),
            SubmitError::Rejected { status, message } => {
                write!(f, "submit rejected (status {status}): {message}")
            }
            SubmitError::Decode(msg) => write!(f, "submit decode error: {msg}"),
            SubmitError::Config(msg) => write!(f, "submit config error: {msg}"),
        }
    }
}

impl std::error::Error for SubmitError {}

/// External write primitive: one capability.
#[async_trait::async_trait]
pub trait Submitter: Send + Sync {
    async fn submit(&self, request: &SubmitRequest) -> Result<SubmitReceipt, SubmitError>;
}

/// Submitter for preview runs, where no credentials are resolved.
///
/// The driver never calls it in a dry run; any call is a wiring bug and fails
/// the item.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSubmitter;

#[async_trait::async_trait]
impl Submitter for NullSubmitter {
    async fn submit(&self, _request: &SubmitRequest) -> Result<SubmitReceipt, SubmitError> {
        Err(SubmitError::Config(
            "no submitter configured for a preview run".to_string(),
        ))
    }
}
