//! Typed view over the merged config. Every key is optional.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub ledger: LedgerSettings,
    pub sources: SourceSettings,
    pub probe: ProbeSettings,
    pub submit: SubmitSettings,
    pub filters: FilterSettings,
}

impl SyncConfig {
    pub fn from_json(config_json: &Value) -> Result<Self> {
        if config_json.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(config_json.clone()).context("invalid sync config")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerSettings {
    pub path: String,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            path: "data/erc8004_registered.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    pub official: OfficialSourceSettings,
    pub smithery: SmitherySourceSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OfficialSourceSettings {
    pub dir: String,
    /// Skip entries explicitly marked as not the latest version.
    pub latest_only: bool,
}

impl Default for OfficialSourceSettings {
    fn default() -> Self {
        Self {
            dir: "data/servers".to_string(),
            latest_only: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmitherySourceSettings {
    pub dir: String,
}

impl Default for SmitherySourceSettings {
    fn default() -> Self {
        Self {
            dir: "data/sources/smithery/servers".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeSettings {
    /// Empty disables probing (degraded mode).
    pub url: String,
    pub page_size: u32,
    pub keys_env: ProbeKeysEnv,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            url: String::new(),
            page_size: 1000,
            keys_env: ProbeKeysEnv::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeKeysEnv {
    pub api_key: String,
}

impl Default for ProbeKeysEnv {
    fn default() -> Self {
        Self {
            api_key: "MSYNC_PROBE_API_KEY".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmitSettings {
    pub url: String,
    /// Minimum gap between two real submissions.
    pub pacing_ms: u64,
    pub keys_env: SubmitKeysEnv,
}

impl Default for SubmitSettings {
    fn default() -> Self {
        Self {
            url: String::new(),
            pacing_ms: 2000,
            keys_env: SubmitKeysEnv::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmitKeysEnv {
    pub signer_key: String,
    pub pin_token: String,
}

impl Default for SubmitKeysEnv {
    fn default() -> Self {
        Self {
            signer_key: "MSYNC_SIGNER_KEY".to_string(),
            pin_token: "MSYNC_PIN_TOKEN".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSettings {
    pub require_endpoint: bool,
    pub require_tools: bool,
}
