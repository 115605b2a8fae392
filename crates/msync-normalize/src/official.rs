//! Official MCP registry ("publisher registry" shape).
//!
//! ```text
//! {
//!   "server": { name, version, title?, description, icons?, remotes?, packages?, tools? },
//!   "_meta": { "io.modelcontextprotocol.registry/official": { isLatest, status, publishedAt } },
//!   "_introspection": { success, tools }            // optional enrichment
//! }
//! ```

use msync_schemas::{Record, SourceKind};
use serde_json::Value;

use crate::extract::{array_at, explicit_schema, merge_tool_names, str_at, synthesize_config_schema};
use crate::fingerprint::fingerprint;
use crate::quality::deny_listed;
use crate::{DropReason, NormalizeOptions};

/// Namespaced extension key carrying registry metadata under `_meta`.
pub const OFFICIAL_META_KEY: &str = "io.modelcontextprotocol.registry/official";

/// Transport tag of a directly reachable remote.
pub const EXPECTED_TRANSPORT: &str = "streamable-http";

/// Top-level fields that name a deployment explicitly.
const EXPLICIT_ENDPOINT_FIELDS: &[&str] = &["deploymentUrl", "remoteUrl"];

fn registry_meta(doc: &Value) -> Option<&Value> {
    doc.get("_meta").and_then(|m| m.get(OFFICIAL_META_KEY))
}

/// First match wins: explicit field, then a remote whose `type` is
/// [`EXPECTED_TRANSPORT`]. Official entries have no hosted canonical URL, so
/// there is no constructed fallback.
fn endpoint(server: &Value) -> Option<String> {
    if let Some(url) = EXPLICIT_ENDPOINT_FIELDS.iter().find_map(|f| str_at(server, f)) {
        return Some(url.to_string());
    }
    array_at(server, "remotes")
        .iter()
        .filter(|r| str_at(r, "type") == Some(EXPECTED_TRANSPORT))
        .find_map(|r| str_at(r, "url"))
        .map(str::to_string)
}

fn tool_names(doc: &Value, server: &Value) -> Vec<String> {
    let mut lists: Vec<&[Value]> = vec![array_at(server, "tools")];
    lists.extend(array_at(server, "packages").iter().map(|p| array_at(p, "tools")));

    if let Some(intro) = doc.get("_introspection") {
        if intro.get("success").and_then(Value::as_bool).unwrap_or(false) {
            lists.push(array_at(intro, "tools"));
        }
    }
    merge_tool_names(lists)
}

fn config_schema(server: &Value) -> Option<Value> {
    explicit_schema(server.get("configSchema")).or_else(|| {
        synthesize_config_schema(
            array_at(server, "packages")
                .iter()
                .flat_map(|p| array_at(p, "environmentVariables")),
        )
    })
}

/// `{registryType}:{identifier}[@{version}]` of the first usable package.
fn package_ref(server: &Value) -> Option<String> {
    array_at(server, "packages").iter().find_map(|p| {
        let identifier = str_at(p, "identifier")?;
        let registry = str_at(p, "registryType").unwrap_or("package");
        Some(match str_at(p, "version") {
            Some(v) => format!("{registry}:{identifier}@{v}"),
            None => format!("{registry}:{identifier}"),
        })
    })
}

pub(crate) fn normalize_official(doc: &Value, opts: &NormalizeOptions) -> Result<Record, DropReason> {
    // Exports sometimes flatten the envelope; accept a bare server object too.
    let server = doc.get("server").unwrap_or(doc);
    if !server.is_object() {
        return Err(DropReason::Malformed);
    }

    let name = str_at(server, "name").ok_or(DropReason::MissingName)?;
    let display_name = str_at(server, "title").unwrap_or(name);

    if let Some(meta) = registry_meta(doc) {
        if str_at(meta, "status").is_some_and(|s| s.eq_ignore_ascii_case("deleted")) {
            return Err(DropReason::Deleted);
        }
        if opts.official_latest_only && meta.get("isLatest").and_then(Value::as_bool) == Some(false) {
            return Err(DropReason::Superseded);
        }
    }

    if let Some(term) = deny_listed(SourceKind::Official, &[display_name, name]) {
        return Err(DropReason::DenyListed(term));
    }

    let id = match str_at(server, "version") {
        Some(v) => format!("{}:{}:{}", SourceKind::Official.as_str(), name, v),
        None => format!("{}:{}", SourceKind::Official.as_str(), name),
    };
    let description = str_at(server, "description").unwrap_or_default().to_string();
    let endpoint = endpoint(server);
    let tool_names = tool_names(doc, server);
    let fingerprint = fingerprint(display_name, &description, &tool_names, endpoint.as_deref());

    Ok(Record {
        id,
        source: SourceKind::Official,
        display_name: display_name.to_string(),
        description,
        icon_url: array_at(server, "icons")
            .first()
            .and_then(|i| str_at(i, "src"))
            .map(str::to_string),
        endpoint,
        tool_names,
        config_schema: config_schema(server),
        package_ref: package_ref(server),
        fingerprint,
    })
}
