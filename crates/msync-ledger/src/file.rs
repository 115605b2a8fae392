//! JSON file ledger: `{ "registered": { "<id>": {agentId, contentHash, registeredAt} } }`.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use fs4::FileExt;
use msync_schemas::{LedgerFile, LedgerMap};
use tracing::debug;

use crate::{LedgerError, LedgerStore};

/// File-backed ledger holding an exclusive lock for its whole lifetime.
///
/// The lock lives in a sibling `<file>.lock` so the data file itself can be
/// replaced by rename on every save.
#[derive(Debug)]
pub struct JsonFileLedger {
    path: PathBuf,
    lock_path: PathBuf,
    // Released when dropped.
    _lock: File,
}

fn read_map(path: &Path) -> Result<LedgerMap, LedgerError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(LedgerMap::new()),
        Err(e) => return Err(LedgerError::Io(format!("read {}: {e}", path.display()))),
    };
    let file: LedgerFile = serde_json::from_str(&raw)
        .map_err(|e| LedgerError::Decode(format!("{}: {e}", path.display())))?;
    Ok(file.registered)
}

fn lock_path_for(path: &Path) -> PathBuf {
    let mut os: OsString = path.as_os_str().to_owned();
    os.push(".lock");
    PathBuf::from(os)
}

impl JsonFileLedger {
    /// Open (but do not read) the ledger at `path`, creating parent dirs.
    ///
    /// Fails with [`LedgerError::Locked`] if another handle already holds it.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, LedgerError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| LedgerError::Io(format!("create_dir_all {}: {e}", parent.display())))?;
        }

        let lock_path = lock_path_for(&path);
        let lock = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(&lock_path)
            .map_err(|e| LedgerError::Io(format!("open lock {}: {e}", lock_path.display())))?;

        match lock.try_lock_exclusive() {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::WouldBlock => {
                return Err(LedgerError::Locked(lock_path));
            }
            Err(e) => {
                return Err(LedgerError::Io(format!("lock {}: {e}", lock_path.display())));
            }
        }

        Ok(Self {
            path,
            lock_path,
            _lock: lock,
        })
    }

    /// Read the ledger at `path` without taking the lock.
    ///
    /// For status reporting while a run may hold the ledger; never save
    /// what this returns.
    pub fn peek(path: impl AsRef<Path>) -> Result<LedgerMap, LedgerError> {
        read_map(path.as_ref())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }

    fn dir(&self) -> &Path {
        match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        }
    }
}

impl LedgerStore for JsonFileLedger {
    fn location(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self) -> Result<LedgerMap, LedgerError> {
        read_map(&self.path)
    }

    fn save(&self, entries: &LedgerMap) -> Result<(), LedgerError> {
        let doc = LedgerFile {
            registered: entries.clone(),
        };
        let mut body =
            serde_json::to_string_pretty(&doc).map_err(|e| LedgerError::Encode(e.to_string()))?;
        body.push('\n');

        let dir = self.dir();
        let mut temp = tempfile::NamedTempFile::new_in(dir)
            .map_err(|e| LedgerError::Io(format!("create temp file in {}: {e}", dir.display())))?;
        temp.write_all(body.as_bytes())
            .map_err(|e| LedgerError::Io(format!("write temp ledger: {e}")))?;
        temp.as_file()
            .sync_all()
            .map_err(|e| LedgerError::Io(format!("fsync temp ledger: {e}")))?;
        temp.persist(&self.path)
            .map_err(|e| LedgerError::Io(format!("persist {}: {e}", self.path.display())))?;

        debug!(path = %self.path.display(), entries = entries.len(), "ledger saved");
        Ok(())
    }
}
