//! `msync` end to end through the binary: preview needs no credentials and
//! leaves no ledger behind; a write run without credentials fails before any
//! work and names the missing variable.

use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;

struct Workspace {
    dir: tempfile::TempDir,
}

impl Workspace {
    fn new() -> anyhow::Result<Self> {
        let dir = tempfile::tempdir()?;
        let official = dir.path().join("official");
        let smithery = dir.path().join("smithery");
        fs::create_dir_all(&official)?;
        fs::create_dir_all(&smithery)?;

        fs::write(
            official.join("io.github.acme__maps__2.0.0.json"),
            serde_json::to_string(&serde_json::json!({
                "server": {
                    "name": "io.github.acme/maps",
                    "version": "2.0.0",
                    "description": "Routing and geocoding",
                    "remotes": [{"type": "streamable-http", "url": "https://maps.acme.dev/mcp"}],
                    "tools": ["route", "geocode"]
                },
                "_meta": {"io.modelcontextprotocol.registry/official": {"isLatest": true, "status": "active"}}
            }))?,
        )?;
        fs::write(
            smithery.join("acme__weather.json"),
            serde_json::to_string(&serde_json::json!({
                "qualifiedName": "@acme/weather",
                "displayName": "Weather Pro",
                "description": "Forecasts",
                "deploymentUrl": "https://weather.acme.dev/mcp",
                "tools": [{"name": "forecast"}]
            }))?,
        )?;
        fs::write(
            smithery.join("acme__offline.json"),
            serde_json::to_string(&serde_json::json!({
                "qualifiedName": "@acme/offline",
                "displayName": "Offline Notes",
                "description": "Local only"
            }))?,
        )?;

        let config = format!(
            r#"
ledger:
  path: "{ledger}"
sources:
  official:
    dir: "{official}"
  smithery:
    dir: "{smithery}"
submit:
  url: "http://127.0.0.1:9/register"
  pacing_ms: 0
  keys_env:
    signer_key: "MSYNC_CLI_SENTINEL_SIGNER_UNSET"
    pin_token: "MSYNC_CLI_SENTINEL_PIN_UNSET"
"#,
            ledger = yaml_path(&dir.path().join("state/ledger.json")),
            official = yaml_path(&official),
            smithery = yaml_path(&smithery),
        );
        fs::write(dir.path().join("sync.yaml"), config)?;
        Ok(Self { dir })
    }

    fn config(&self) -> String {
        self.dir.path().join("sync.yaml").to_string_lossy().to_string()
    }

    fn ledger(&self) -> std::path::PathBuf {
        self.dir.path().join("state/ledger.json")
    }

    fn msync(&self) -> anyhow::Result<Command> {
        let mut cmd = Command::cargo_bin("msync")?;
        cmd.current_dir(self.dir.path()).env("RUST_LOG", "info");
        Ok(cmd)
    }
}

fn yaml_path(p: &Path) -> String {
    p.to_string_lossy().replace('\\', "/")
}

#[test]
fn dry_run_plans_without_credentials_or_ledger_writes() -> anyhow::Result<()> {
    let ws = Workspace::new()?;

    ws.msync()?
        .args(["sync", "--config", &ws.config(), "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("records=3"))
        .stdout(predicate::str::contains("planned=3"))
        .stdout(predicate::str::contains("dry_run=true"))
        .stdout(predicate::str::contains("attempted=3"))
        .stdout(predicate::str::contains("succeeded=0"));

    assert!(!ws.ledger().exists(), "preview must not write the ledger");
    assert!(!ws.dir.path().join("state/ledger.json.lock").exists());
    assert!(!ws.dir.path().join("state").exists(), "preview must not create dirs");
    Ok(())
}

#[test]
fn dry_run_reads_an_existing_ledger_without_touching_it() -> anyhow::Result<()> {
    let ws = Workspace::new()?;
    fs::create_dir_all(ws.dir.path().join("state"))?;
    let body = r#"{"registered": {"smithery:@acme/weather": {"agentId": "12", "contentHash": "stale0000000000a", "registeredAt": "2025-02-01T10:00:00Z"}}}"#;
    fs::write(ws.ledger(), body)?;

    ws.msync()?
        .args(["sync", "--config", &ws.config(), "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("new=2"))
        .stdout(predicate::str::contains("updated=1"));

    assert_eq!(fs::read_to_string(ws.ledger())?, body);
    assert!(!ws.dir.path().join("state/ledger.json.lock").exists());
    Ok(())
}

#[test]
fn dry_run_respects_endpoint_filter_and_limit() -> anyhow::Result<()> {
    let ws = Workspace::new()?;

    ws.msync()?
        .args([
            "sync",
            "--config",
            &ws.config(),
            "--dry-run",
            "--require-endpoint",
            "--limit",
            "1",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("planned=2"))
        .stdout(predicate::str::contains("excluded_filtered_no_endpoint=1"))
        .stdout(predicate::str::contains("attempted=1"))
        .stdout(predicate::str::contains("skipped_by_limit=1"));
    Ok(())
}

#[test]
fn source_selection_limits_input() -> anyhow::Result<()> {
    let ws = Workspace::new()?;

    ws.msync()?
        .args(["sync", "--config", &ws.config(), "--dry-run", "--source", "official"])
        .assert()
        .success()
        .stdout(predicate::str::contains("records=1"));
    Ok(())
}

#[test]
fn write_run_without_credentials_fails_fast() -> anyhow::Result<()> {
    let ws = Workspace::new()?;

    ws.msync()?
        .args(["sync", "--config", &ws.config()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("SECRETS_MISSING"))
        .stderr(predicate::str::contains("MSYNC_CLI_SENTINEL_SIGNER_UNSET"));

    assert!(!ws.ledger().exists());
    Ok(())
}

#[test]
fn ledger_status_reports_empty_ledger() -> anyhow::Result<()> {
    let ws = Workspace::new()?;

    ws.msync()?
        .args(["ledger", "--config", &ws.config(), "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("entries=0"))
        .stdout(predicate::str::contains("latest_registered_at=none"));
    Ok(())
}

#[test]
fn ledger_status_reports_latest_write() -> anyhow::Result<()> {
    let ws = Workspace::new()?;
    fs::create_dir_all(ws.dir.path().join("state"))?;
    fs::write(
        ws.ledger(),
        r#"{"registered": {
            "smithery:@acme/weather": {"agentId": "12", "contentHash": "aaaaaaaaaaaaaaaa", "registeredAt": "2025-02-01T10:00:00Z"},
            "official:io.github.acme/maps:2.0.0": {"agentId": "13", "contentHash": "bbbbbbbbbbbbbbbb", "registeredAt": "2025-03-05T09:30:00Z"}
        }}"#,
    )?;

    ws.msync()?
        .args(["ledger", "--config", &ws.config(), "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("entries=2"))
        .stdout(predicate::str::contains("latest_registered_at=2025-03-05T09:30:00+00:00"));
    Ok(())
}

#[test]
fn config_hash_prints_hash_and_canonical_json() -> anyhow::Result<()> {
    let ws = Workspace::new()?;

    ws.msync()?
        .args(["config-hash", &ws.config()])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("config_hash="))
        .stdout(predicate::str::contains("\"pacing_ms\":0"));
    Ok(())
}

#[test]
fn literal_secret_in_config_is_refused() -> anyhow::Result<()> {
    let ws = Workspace::new()?;
    let bad = ws.dir.path().join("bad.yaml");
    fs::write(
        &bad,
        format!("submit:\n  keys_env:\n    signer_key: \"0x{}\"\n", "1f".repeat(32)),
    )?;

    ws.msync()?
        .args([
            "sync",
            "--config",
            &ws.config(),
            "--config",
            &bad.to_string_lossy(),
            "--dry-run",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("CONFIG_SECRET_DETECTED"));
    Ok(())
}
