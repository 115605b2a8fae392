use std::time::Duration;

use anyhow::{bail, Context, Result};
use msync_cli::pass::{run_pass, PassInputs};
use msync_config::{resolve_secrets, RunMode};
use msync_ledger::{JsonFileLedger, LedgerStore, MemoryLedger};
use msync_normalize::{DirSnapshotSource, NormalizeOptions, SnapshotSource};
use msync_probe::{DisabledProber, RemoteProber, SubgraphProber};
use msync_reconcile::StructuralFilters;
use msync_schemas::SourceKind;
use msync_submit::{HttpSubmitter, NullSubmitter, RunOptions, Submitter};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use super::{load_config, parse_source_selection};

pub struct SyncArgs {
    pub config_paths: Vec<String>,
    pub source: String,
    pub limit: Option<usize>,
    pub require_endpoint: bool,
    pub require_tools: bool,
    pub dry_run: bool,
}

pub async fn run(args: SyncArgs) -> Result<()> {
    let run_id = Uuid::new_v4();
    let span = info_span!("sync", run_id = %run_id);
    run_inner(args, run_id).instrument(span).await
}

async fn run_inner(args: SyncArgs, run_id: Uuid) -> Result<()> {
    let loaded = load_config(&args.config_paths)?;
    let cfg = &loaded.sync;
    let kinds = parse_source_selection(&args.source)?;

    // Credentials are checked before anything touches the ledger or network.
    let mode = if args.dry_run {
        RunMode::Preview
    } else {
        RunMode::Write
    };
    let secrets = resolve_secrets(mode, &loaded.config_json)?;
    if mode == RunMode::Write && cfg.submit.url.trim().is_empty() {
        bail!("CONFIG_MISSING: submit.url is required for a write run");
    }

    // A preview reads the ledger as it is: no lock file, no directories.
    let file_ledger;
    let preview_ledger;
    let ledger: &dyn LedgerStore = if args.dry_run {
        let entries = JsonFileLedger::peek(&cfg.ledger.path)
            .with_context(|| format!("read ledger {}", cfg.ledger.path))?;
        preview_ledger = MemoryLedger::with_entries(entries);
        &preview_ledger
    } else {
        file_ledger = JsonFileLedger::open(&cfg.ledger.path)
            .with_context(|| format!("open ledger {}", cfg.ledger.path))?;
        &file_ledger
    };

    let dir_sources: Vec<DirSnapshotSource> = kinds
        .iter()
        .map(|kind| match kind {
            SourceKind::Official => DirSnapshotSource::new(*kind, &cfg.sources.official.dir),
            SourceKind::Smithery => DirSnapshotSource::new(*kind, &cfg.sources.smithery.dir),
        })
        .collect();

    let subgraph;
    let prober: &dyn RemoteProber = if cfg.probe.url.trim().is_empty() {
        warn!("probe.url not configured, remote cross-check disabled");
        &DisabledProber
    } else {
        subgraph = SubgraphProber::new(cfg.probe.url.clone(), secrets.probe_api_key.clone())
            .with_page_size(cfg.probe.page_size);
        &subgraph
    };

    let http;
    let submitter: &dyn Submitter = match (&secrets.signer_key, &secrets.pin_token) {
        (Some(signer), Some(pin)) if !args.dry_run => {
            http = HttpSubmitter::new(cfg.submit.url.clone(), signer.clone(), pin.clone());
            &http
        }
        _ => &NullSubmitter,
    };

    let filters = StructuralFilters {
        require_endpoint: args.require_endpoint || cfg.filters.require_endpoint,
        require_tools: args.require_tools || cfg.filters.require_tools,
    };

    info!(
        config_hash = %loaded.config_hash,
        sources = ?kinds,
        dry_run = args.dry_run,
        limit = ?args.limit,
        "sync starting"
    );

    let mut inputs = PassInputs::new(ledger, prober, submitter);
    inputs.sources = dir_sources.iter().map(|s| s as &dyn SnapshotSource).collect();
    inputs.normalize = NormalizeOptions {
        official_latest_only: cfg.sources.official.latest_only,
    };
    inputs.filters = filters;
    inputs.run = RunOptions {
        limit: args.limit,
        dry_run: args.dry_run,
    };
    inputs.pacing = Duration::from_millis(cfg.submit.pacing_ms);

    let report = run_pass(&inputs).await?;

    println!("run_id={run_id}");
    println!("config_hash={}", loaded.config_hash);
    for line in report.lines() {
        println!("{line}");
    }
    Ok(())
}
