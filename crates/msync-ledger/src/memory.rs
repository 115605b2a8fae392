use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use msync_schemas::LedgerMap;

use crate::{LedgerError, LedgerStore};

/// In-memory ledger for tests and previews.
///
/// Counts saves so callers can assert the save-after-every-write rule, and
/// can be told to fail saves to exercise the fatal bookkeeping path.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    entries: Mutex<LedgerMap>,
    saves: AtomicUsize,
    fail_saves: AtomicBool,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: LedgerMap) -> Self {
        Self {
            entries: Mutex::new(entries),
            ..Self::default()
        }
    }

    fn guard(&self) -> MutexGuard<'_, LedgerMap> {
        // A poisoned map is still the last saved state.
        self.entries.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Copy of the last saved map.
    pub fn snapshot(&self) -> LedgerMap {
        self.guard().clone()
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }
}

impl LedgerStore for MemoryLedger {
    fn location(&self) -> String {
        "memory".to_string()
    }

    fn load(&self) -> Result<LedgerMap, LedgerError> {
        Ok(self.snapshot())
    }

    fn save(&self, entries: &LedgerMap) -> Result<(), LedgerError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(LedgerError::Io("memory ledger configured to fail".to_string()));
        }
        *self.guard() = entries.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
