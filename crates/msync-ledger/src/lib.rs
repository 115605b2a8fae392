//! msync-ledger
//!
//! Local Ledger Cache: the durable `record id -> LedgerEntry` map that says
//! which records were already written, under which remote id, and with which
//! fingerprint.
//!
//! # Contract
//! - `load` on a store that does not exist yet returns an empty map.
//! - `save` replaces the whole map atomically; a crash leaves either the old
//!   or the new file, never a torn one.
//! - Callers save after every individual successful write.
//! - One process at a time: [`JsonFileLedger::open`] takes an exclusive lock
//!   and refuses to open a ledger another process holds.

mod file;
mod memory;

use std::fmt;
use std::path::PathBuf;

pub use file::JsonFileLedger;
pub use memory::MemoryLedger;
pub use msync_schemas::{LedgerEntry, LedgerFile, LedgerMap};

/// Errors a [`LedgerStore`] may return.
#[derive(Debug)]
pub enum LedgerError {
    /// Filesystem failure reading, writing or locking the store.
    Io(String),
    /// Stored content is not a valid ledger document.
    Decode(String),
    /// The in-memory map could not be serialized.
    Encode(String),
    /// Another process holds the ledger lock.
    Locked(PathBuf),
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerError::Io(msg) => write!(f, "ledger io error: {msg}"),
            LedgerError::Decode(msg) => write!(f, "ledger decode error: {msg}"),
            LedgerError::Encode(msg) => write!(f, "ledger encode error: {msg}"),
            LedgerError::Locked(path) => write!(
                f,
                "ledger is locked by another process: {} (refusing to start)",
                path.display()
            ),
        }
    }
}

impl std::error::Error for LedgerError {}

/// Persistence boundary for the ledger map.
///
/// Object-safe so the submission driver can hold a `&dyn LedgerStore`.
pub trait LedgerStore: Send + Sync {
    /// Human-readable location for logs (file path, `memory`, ...).
    fn location(&self) -> String;

    fn load(&self) -> Result<LedgerMap, LedgerError>;

    fn save(&self, entries: &LedgerMap) -> Result<(), LedgerError>;
}
