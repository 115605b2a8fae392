//! Smithery registry ("marketplace listing" shape).
//!
//! ```text
//! { qualifiedName, displayName, description, iconUrl?, remote?, deploymentUrl?,
//!   connections?: [{ type, deploymentUrl?, url?, configSchema? }],
//!   tools?: [{ name, ... }] }
//! ```

use msync_schemas::{Record, SourceKind};
use serde_json::Value;

use crate::extract::{array_at, explicit_schema, merge_tool_names, str_at, synthesize_config_schema};
use crate::fingerprint::fingerprint;
use crate::quality::deny_listed;
use crate::DropReason;

/// Transport tag of a hosted HTTP connection.
pub const EXPECTED_TRANSPORT: &str = "http";

/// Base of the hosted gateway for servers Smithery runs itself.
pub const HOSTED_BASE_URL: &str = "https://server.smithery.ai";

/// Canonical hosted URL for a qualified name.
pub fn hosted_url(qualified_name: &str) -> String {
    format!(
        "{}/{}/mcp",
        HOSTED_BASE_URL,
        qualified_name.trim_start_matches('/')
    )
}

/// First match wins: top-level `deploymentUrl`, then an `http` connection,
/// then the hosted gateway URL when the listing is marked `remote`.
fn endpoint(doc: &Value, qualified_name: &str) -> Option<String> {
    if let Some(url) = str_at(doc, "deploymentUrl") {
        return Some(url.to_string());
    }

    let from_connection = array_at(doc, "connections")
        .iter()
        .filter(|c| str_at(c, "type") == Some(EXPECTED_TRANSPORT))
        .find_map(|c| str_at(c, "deploymentUrl").or_else(|| str_at(c, "url")));
    if let Some(url) = from_connection {
        return Some(url.to_string());
    }

    if doc.get("remote").and_then(Value::as_bool).unwrap_or(false) {
        return Some(hosted_url(qualified_name));
    }
    None
}

fn tool_names(doc: &Value) -> Vec<String> {
    let mut lists: Vec<&[Value]> = vec![array_at(doc, "tools")];
    lists.extend(array_at(doc, "packages").iter().map(|p| array_at(p, "tools")));
    merge_tool_names(lists)
}

fn config_schema(doc: &Value) -> Option<Value> {
    explicit_schema(doc.get("configSchema"))
        .or_else(|| {
            array_at(doc, "connections")
                .iter()
                .find_map(|c| explicit_schema(c.get("configSchema")))
        })
        .or_else(|| synthesize_config_schema(array_at(doc, "environmentVariables")))
}

pub(crate) fn normalize_smithery(doc: &Value) -> Result<Record, DropReason> {
    if !doc.is_object() {
        return Err(DropReason::Malformed);
    }

    let qualified_name = str_at(doc, "qualifiedName").ok_or(DropReason::MissingName)?;
    let display_name = str_at(doc, "displayName").unwrap_or(qualified_name);

    if let Some(term) = deny_listed(SourceKind::Smithery, &[display_name, qualified_name]) {
        return Err(DropReason::DenyListed(term));
    }

    let description = str_at(doc, "description").unwrap_or_default().to_string();
    let endpoint = endpoint(doc, qualified_name);
    let tool_names = tool_names(doc);
    let fingerprint = fingerprint(display_name, &description, &tool_names, endpoint.as_deref());

    Ok(Record {
        id: format!("{}:{}", SourceKind::Smithery.as_str(), qualified_name),
        source: SourceKind::Smithery,
        display_name: display_name.to_string(),
        description,
        icon_url: str_at(doc, "iconUrl").map(str::to_string),
        endpoint,
        tool_names,
        config_schema: config_schema(doc),
        package_ref: Some(format!("smithery:{qualified_name}")),
        fingerprint,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn listing() -> Value {
        json!({
            "qualifiedName": "@acme/search",
            "displayName": "Acme Search",
            "description": "Web search",
            "iconUrl": "https://acme.dev/s.png",
            "remote": true,
            "connections": [
                {"type": "stdio", "configSchema": {"type": "object", "properties": {}}},
                {"type": "http", "deploymentUrl": "https://conn.acme.dev/mcp"}
            ],
            "tools": [{"name": "search"}, {"name": "search"}, {"name": "news"}]
        })
    }

    #[test]
    fn flat_shape_maps_to_record() {
        let r = normalize_smithery(&listing()).unwrap();
        assert_eq!(r.id, "smithery:@acme/search");
        assert_eq!(r.display_name, "Acme Search");
        assert_eq!(r.endpoint.as_deref(), Some("https://conn.acme.dev/mcp"));
        assert_eq!(r.tool_names, vec!["search", "news"]);
        assert_eq!(r.package_ref.as_deref(), Some("smithery:@acme/search"));
        assert!(r.config_schema.is_some());
    }

    #[test]
    fn endpoint_precedence_top_level_first() {
        let mut d = listing();
        d["deploymentUrl"] = json!("https://top.acme.dev/mcp");
        let r = normalize_smithery(&d).unwrap();
        assert_eq!(r.endpoint.as_deref(), Some("https://top.acme.dev/mcp"));
    }

    #[test]
    fn endpoint_falls_back_to_hosted_url_for_remote_listings() {
        let mut d = listing();
        d["connections"] = json!([{"type": "stdio"}]);
        let r = normalize_smithery(&d).unwrap();
        assert_eq!(
            r.endpoint.as_deref(),
            Some("https://server.smithery.ai/@acme/search/mcp")
        );

        d["remote"] = json!(false);
        let r = normalize_smithery(&d).unwrap();
        assert_eq!(r.endpoint, None);
    }

    #[test]
    fn null_tools_and_connections_are_tolerated() {
        let d = json!({"qualifiedName": "@acme/x", "tools": null, "connections": null});
        let r = normalize_smithery(&d).unwrap();
        assert!(r.tool_names.is_empty());
        assert_eq!(r.display_name, "@acme/x");
        assert_eq!(r.description, "");
    }

    #[test]
    fn deny_listed_names_drop() {
        let mut d = listing();
        d["displayName"] = json!("My First MCP");
        assert_eq!(normalize_smithery(&d), Err(DropReason::DenyListed("my first")));
    }

    #[test]
    fn missing_qualified_name_drops() {
        let d = json!({"displayName": "Orphan"});
        assert_eq!(normalize_smithery(&d), Err(DropReason::MissingName));
    }
}
