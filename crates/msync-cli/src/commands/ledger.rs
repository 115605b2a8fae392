use anyhow::{Context, Result};
use msync_ledger::JsonFileLedger;

use super::load_config;

/// `msync ledger status`: read without locking so it works during a run.
pub fn status(config_paths: &[String]) -> Result<()> {
    let cfg = load_config(config_paths)?.sync;
    let entries = JsonFileLedger::peek(&cfg.ledger.path)
        .with_context(|| format!("read ledger {}", cfg.ledger.path))?;

    let latest = entries.values().map(|e| e.written_at).max();

    println!("ledger_path={}", cfg.ledger.path);
    println!("entries={}", entries.len());
    match latest {
        Some(ts) => println!("latest_registered_at={}", ts.to_rfc3339()),
        None => println!("latest_registered_at=none"),
    }
    Ok(())
}
