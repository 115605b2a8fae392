use msync_reconcile::*;
use msync_schemas::{LedgerMap, Record, RemoteProbeSet, SourceKind};

fn record(id: &str, name: &str, endpoint: Option<&str>) -> Record {
    Record {
        id: id.to_string(),
        source: SourceKind::Smithery,
        display_name: name.to_string(),
        description: String::new(),
        icon_url: None,
        endpoint: endpoint.map(str::to_string),
        tool_names: Vec::new(),
        config_schema: None,
        package_ref: None,
        fingerprint: "0123456789abcdef".to_string(),
    }
}

#[test]
fn scenario_remote_endpoint_excludes_new_record() {
    let mut probe = RemoteProbeSet::new();
    probe.insert_entity(Some("https://taken.example/mcp"), Some("Someone Else"));

    let records = vec![
        record("s:taken", "Mine", Some("https://taken.example/mcp")),
        record("s:free", "Free", Some("https://free.example/mcp")),
    ];
    let report = plan_with_report(&records, &LedgerMap::new(), &probe, &StructuralFilters::none());

    assert_eq!(report.items.len(), 1);
    assert_eq!(report.items[0].record.id, "s:free");
    assert_eq!(report.count_excluded(ExclusionCause::RemoteEndpoint), 1);
}

#[test]
fn scenario_remote_name_match_is_case_insensitive() {
    let mut probe = RemoteProbeSet::new();
    probe.insert_entity(None, Some("Weather Pro"));

    let records = vec![record("s:w", "WEATHER PRO", None)];
    let report = plan_with_report(&records, &LedgerMap::new(), &probe, &StructuralFilters::none());

    assert!(report.items.is_empty());
    assert_eq!(
        report.exclusions[0].cause,
        ExclusionCause::RemoteName,
        "generic display names collide across distinct entities"
    );
}

#[test]
fn scenario_endpoint_match_is_literal() {
    let mut probe = RemoteProbeSet::new();
    probe.insert_entity(Some("https://A.example/mcp"), None);

    let records = vec![record("s:a", "A", Some("https://a.example/mcp"))];
    let items = plan(&records, &LedgerMap::new(), &probe, &StructuralFilters::none());
    assert_eq!(items.len(), 1);
}

#[test]
fn scenario_empty_probe_changes_nothing() {
    let records = vec![record("s:a", "A", Some("https://a/mcp")), record("s:b", "B", None)];
    let with_probe = plan(&records, &LedgerMap::new(), &RemoteProbeSet::new(), &StructuralFilters::none());
    assert_eq!(with_probe.len(), 2);
    assert!(with_probe.iter().all(|i| i.reason == PlanReason::New));
}

#[test]
fn scenario_remote_endpoint_with_stray_whitespace_still_matches() {
    let mut probe = RemoteProbeSet::new();
    probe.insert_entity(Some(" https://padded.example/mcp \n"), None);

    let records = vec![record("s:p", "Padded", Some("https://padded.example/mcp"))];
    let report = plan_with_report(&records, &LedgerMap::new(), &probe, &StructuralFilters::none());

    assert!(report.items.is_empty());
    assert_eq!(report.count_excluded(ExclusionCause::RemoteEndpoint), 1);
}
