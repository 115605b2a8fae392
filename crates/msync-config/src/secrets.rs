//! Runtime secret resolution.
//!
//! Config stores env var NAMES (`submit.keys_env.*`, `probe.keys_env.*`);
//! [`resolve_secrets`] is called once per run and its result is passed to
//! constructors. Errors name the variable, never the value, and `Debug`
//! output is redacted.
//!
//! | Mode    | Required                       |
//! |---------|--------------------------------|
//! | Write   | signer key, pin token          |
//! | Preview | nothing                        |
//!
//! The probe API key is optional in every mode; without it the prober
//! degrades to an empty probe set.

use anyhow::{bail, Result};
use serde_json::Value;

use crate::SyncConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Dry run: no external writes, no ledger updates.
    Preview,
    Write,
}

impl RunMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunMode::Preview => "PREVIEW",
            RunMode::Write => "WRITE",
        }
    }
}

#[derive(Clone)]
pub struct ResolvedSecrets {
    pub signer_key: Option<String>,
    pub pin_token: Option<String>,
    pub probe_api_key: Option<String>,
}

impl std::fmt::Debug for ResolvedSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedSecrets")
            .field("signer_key", &self.signer_key.as_ref().map(|_| "<REDACTED>"))
            .field("pin_token", &self.pin_token.as_ref().map(|_| "<REDACTED>"))
            .field(
                "probe_api_key",
                &self.probe_api_key.as_ref().map(|_| "<REDACTED>"),
            )
            .finish()
    }
}

/// Unset and blank both count as missing.
fn resolve_env(var_name: &str) -> Option<String> {
    if var_name.trim().is_empty() {
        return None;
    }
    match std::env::var(var_name) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}

/// Resolve every secret the run may need; fail closed in `Write` mode.
pub fn resolve_secrets(mode: RunMode, config_json: &Value) -> Result<ResolvedSecrets> {
    let cfg = SyncConfig::from_json(config_json)?;
    let names = &cfg.submit.keys_env;

    let signer_key = resolve_env(&names.signer_key);
    let pin_token = resolve_env(&names.pin_token);
    let probe_api_key = resolve_env(&cfg.probe.keys_env.api_key);

    if mode == RunMode::Write {
        if signer_key.is_none() {
            bail!(
                "SECRETS_MISSING mode={}: required env var '{}' (signer key) is not set or empty",
                mode.as_str(),
                names.signer_key,
            );
        }
        if pin_token.is_none() {
            bail!(
                "SECRETS_MISSING mode={}: required env var '{}' (pin token) is not set or empty",
                mode.as_str(),
                names.pin_token,
            );
        }
    }

    Ok(ResolvedSecrets {
        signer_key,
        pin_token,
        probe_api_key,
    })
}
