//! msync-config
//!
//! Layered YAML configuration for the sync pipeline.
//!
//! - Docs merge in order; later docs override earlier ones key by key.
//! - The merged document is hashed (sha256 of canonical JSON) so a run can
//!   report exactly which configuration it used.
//! - Literal credentials are refused: config carries env var NAMES only and
//!   [`resolve_secrets`] reads the values once at startup.

use anyhow::{bail, Context, Result};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;

mod secrets;
mod settings;

pub use secrets::{resolve_secrets, ResolvedSecrets, RunMode};
pub use settings::{
    FilterSettings, LedgerSettings, OfficialSourceSettings, ProbeKeysEnv, ProbeSettings,
    SmitherySourceSettings, SourceSettings, SubmitKeysEnv, SubmitSettings, SyncConfig,
};

/// Known secret-like prefixes. A leaf string starting with any of these
/// aborts loading with CONFIG_SECRET_DETECTED.
const SECRET_PREFIXES: &[&str] = &[
    "sk-",        // OpenAI style
    "sk_live",    // Stripe live
    "sk_test",    // Stripe test
    "AKIA",       // AWS access key ID
    "-----BEGIN", // PEM private keys
    "ghp_",       // GitHub PAT
    "gho_",       // GitHub OAuth
    "glpat-",     // GitLab PAT
    "xoxb-",      // Slack bot token
    "xoxp-",      // Slack user token
    "eyJ",        // JWT (pinning service tokens)
];

/// A merged configuration: the raw document, its identity, and the typed view
/// the sync pipeline runs on.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// sha256 of `canonical_json`; printed with every run.
    pub config_hash: String,
    pub canonical_json: String,
    /// Merged document; [`resolve_secrets`] reads env var names from it.
    pub config_json: Value,
    /// Typed view with defaults filled in. Parsed at load time so a
    /// mistyped key fails before any run starts.
    pub sync: SyncConfig,
}

impl LoadedConfig {
    /// Config used when no files are given: `{}` with its hash.
    pub fn empty() -> Result<Self> {
        load_layered_yaml_from_strings(&[])
    }
}

pub fn load_layered_yaml(paths: &[&str]) -> Result<LoadedConfig> {
    let docs = paths
        .iter()
        .map(|p| fs::read_to_string(p).with_context(|| format!("failed to read yaml path: {p}")))
        .collect::<Result<Vec<String>>>()?;
    let doc_refs: Vec<&str> = docs.iter().map(String::as_str).collect();
    load_layered_yaml_from_strings(&doc_refs)
}

pub fn load_layered_yaml_from_strings(yaml_docs: &[&str]) -> Result<LoadedConfig> {
    let merged = merge_layers(yaml_docs)?;
    enforce_no_secret_literals(&merged)?;
    let sync = SyncConfig::from_json(&merged)?;

    let canonical_json = canonicalize_json(&merged)?;
    Ok(LoadedConfig {
        config_hash: sha256_hex(canonical_json.as_bytes()),
        canonical_json,
        config_json: merged,
        sync,
    })
}

/// Fold the YAML layers into one JSON document, later layers winning.
fn merge_layers(yaml_docs: &[&str]) -> Result<Value> {
    let mut merged = serde_json::json!({});
    for (layer, raw) in yaml_docs.iter().enumerate() {
        let doc: serde_yaml::Value =
            serde_yaml::from_str(raw).with_context(|| format!("invalid yaml in layer {layer}"))?;
        // A blank or comment-only layer overrides nothing.
        if doc.is_null() {
            continue;
        }
        let doc = serde_json::to_value(doc).context("yaml->json conversion failed")?;
        merged = deep_merge(merged, doc);
    }
    Ok(merged)
}

fn deep_merge(a: Value, b: Value) -> Value {
    match (a, b) {
        (Value::Object(mut a_map), Value::Object(b_map)) => {
            for (k, b_val) in b_map {
                let a_val = a_map.remove(&k).unwrap_or(Value::Null);
                a_map.insert(k, deep_merge(a_val, b_val));
            }
            Value::Object(a_map)
        }
        (_, b_other) => b_other,
    }
}

// serde_json's default map is ordered by key, so compact output is canonical.
fn canonicalize_json(v: &Value) -> Result<String> {
    let s = serde_json::to_string(v).context("canonical json serialize failed")?;
    Ok(s)
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

fn collect_leaf_strings<'a>(v: &'a Value, prefix: &str, out: &mut Vec<(String, &'a str)>) {
    match v {
        Value::Object(map) => {
            for (k, vv) in map.iter() {
                let next = format!("{}/{}", prefix, k.replace('~', "~0").replace('/', "~1"));
                collect_leaf_strings(vv, &next, out);
            }
        }
        Value::Array(arr) => {
            for (i, vv) in arr.iter().enumerate() {
                collect_leaf_strings(vv, &format!("{prefix}/{i}"), out);
            }
        }
        Value::String(s) => {
            let p = if prefix.is_empty() { "/" } else { prefix };
            out.push((p.to_string(), s.as_str()));
        }
        _ => {}
    }
}

fn enforce_no_secret_literals(v: &Value) -> Result<()> {
    let mut leaves = Vec::new();
    collect_leaf_strings(v, "", &mut leaves);

    for (ptr, s) in leaves {
        if looks_like_secret(s) {
            bail!("CONFIG_SECRET_DETECTED leaf={} value=REDACTED", ptr);
        }
    }
    Ok(())
}

/// `0x` followed by exactly 64 hex digits: a raw signing key.
fn is_hex_private_key(t: &str) -> bool {
    match t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
        Some(rest) => rest.len() == 64 && rest.chars().all(|c| c.is_ascii_hexdigit()),
        None => false,
    }
}

fn looks_like_secret(s: &str) -> bool {
    let t = s.trim();
    if t.len() < 8 {
        return false;
    }
    is_hex_private_key(t) || SECRET_PREFIXES.iter().any(|p| t.starts_with(p))
}
