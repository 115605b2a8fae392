//! Command handlers for `msync`.
//!
//! Shared helpers live here; command-specific logic lives in the submodules.

pub mod ledger;
pub mod sync;

use anyhow::Result;
use msync_config::LoadedConfig;
use msync_schemas::SourceKind;

/// Load layered config, or the all-defaults config when no paths are given.
pub fn load_config(paths: &[String]) -> Result<LoadedConfig> {
    if paths.is_empty() {
        return LoadedConfig::empty();
    }
    let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
    msync_config::load_layered_yaml(&path_refs)
}

/// Parse `--source`: `all` or a single registry.
pub fn parse_source_selection(raw: &str) -> Result<Vec<SourceKind>> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "all" => Ok(SourceKind::ALL.to_vec()),
        other => Ok(vec![SourceKind::parse(other)?]),
    }
}
