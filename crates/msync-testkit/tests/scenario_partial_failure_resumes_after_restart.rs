//! A rejected item leaves no ledger trace and is the only thing retried on
//! the next run.

use std::time::Duration;

use msync_cli::pass::{run_pass, PassInputs};
use msync_ledger::{JsonFileLedger, LedgerStore};
use msync_normalize::MemorySnapshotSource;
use msync_reconcile::StructuralFilters;
use msync_schemas::SourceKind;
use msync_testkit::{smithery_payload, FakeSubmitter, StaticProber};

fn source() -> MemorySnapshotSource {
    MemorySnapshotSource::new(
        SourceKind::Smithery,
        vec![
            smithery_payload("@a/one", "One", Some("https://one/mcp"), &["t"]),
            smithery_payload("@a/two", "Two", Some("https://two/mcp"), &["t"]),
            smithery_payload("@a/three", "Three", Some("https://three/mcp"), &["t"]),
        ],
    )
}

#[tokio::test]
async fn scenario_middle_failure_is_isolated_and_retried_next_run() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("ledger.json");
    let src = source();
    let prober = StaticProber::empty();

    {
        let ledger = JsonFileLedger::open(&path)?;
        let submitter = FakeSubmitter::failing_on(&["Two"]);
        let mut inputs = PassInputs::new(&ledger, &prober, &submitter);
        inputs.sources = vec![&src];
        inputs.pacing = Duration::ZERO;
        inputs.filters = StructuralFilters {
            require_endpoint: true,
            require_tools: true,
        };

        let report = run_pass(&inputs).await?;
        assert_eq!(report.summary.succeeded, 2);
        assert_eq!(report.summary.failed, 1);
        assert_eq!(report.summary.failures[0].id, "smithery:@a/two");

        let saved = ledger.load()?;
        assert!(saved.contains_key("smithery:@a/one"));
        assert!(!saved.contains_key("smithery:@a/two"));
        assert!(saved.contains_key("smithery:@a/three"));
    }

    let ledger = JsonFileLedger::open(&path)?;
    let submitter = FakeSubmitter::new();
    let mut inputs = PassInputs::new(&ledger, &prober, &submitter);
    inputs.sources = vec![&src];
    inputs.pacing = Duration::ZERO;

    let report = run_pass(&inputs).await?;
    assert_eq!(report.new, 1);
    assert_eq!(submitter.call_names(), vec!["Two"]);
    assert_eq!(ledger.load()?.len(), 3);
    Ok(())
}

#[tokio::test]
async fn scenario_limit_spreads_work_across_runs() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("ledger.json");
    let src = source();
    let prober = StaticProber::empty();
    let submitter = FakeSubmitter::new();

    let mut order = Vec::new();
    for _ in 0..3 {
        let ledger = JsonFileLedger::open(&path)?;
        let mut inputs = PassInputs::new(&ledger, &prober, &submitter);
        inputs.sources = vec![&src];
        inputs.pacing = Duration::ZERO;
        inputs.run.limit = Some(1);

        let report = run_pass(&inputs).await?;
        assert_eq!(report.summary.succeeded, 1);
        order = submitter.call_names();
    }

    assert_eq!(order, vec!["One", "Two", "Three"]);
    Ok(())
}
