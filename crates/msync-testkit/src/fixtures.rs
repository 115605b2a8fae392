use msync_normalize::fingerprint;
use msync_schemas::{Record, SourceKind};
use serde_json::{json, Value};

/// Official registry document with one streamable-http remote (when given).
pub fn official_payload(name: &str, version: &str, endpoint: Option<&str>, tools: &[&str]) -> Value {
    let remotes: Vec<Value> = endpoint
        .map(|url| json!({"type": "streamable-http", "url": url}))
        .into_iter()
        .collect();
    json!({
        "server": {
            "name": name,
            "version": version,
            "description": format!("{name} server"),
            "remotes": remotes,
            "tools": tools,
        },
        "_meta": {
            "io.modelcontextprotocol.registry/official": {"isLatest": true, "status": "active"}
        }
    })
}

/// Marketplace listing with an explicit deployment URL (when given).
pub fn smithery_payload(
    qualified_name: &str,
    display_name: &str,
    endpoint: Option<&str>,
    tools: &[&str],
) -> Value {
    let mut doc = json!({
        "qualifiedName": qualified_name,
        "displayName": display_name,
        "description": format!("{display_name} listing"),
        "tools": tools.iter().map(|t| json!({"name": t})).collect::<Vec<_>>(),
    });
    if let Some(url) = endpoint {
        doc["deploymentUrl"] = json!(url);
    }
    doc
}

/// Builds a [`Record`] directly, with a real fingerprint over its fields.
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    id: String,
    source: SourceKind,
    display_name: String,
    description: String,
    endpoint: Option<String>,
    tool_names: Vec<String>,
}

impl RecordBuilder {
    pub fn smithery(qualified_name: &str) -> Self {
        Self {
            id: format!("smithery:{qualified_name}"),
            source: SourceKind::Smithery,
            display_name: qualified_name.to_string(),
            description: String::new(),
            endpoint: None,
            tool_names: Vec::new(),
        }
    }

    pub fn official(name: &str, version: &str) -> Self {
        Self {
            id: format!("official:{name}:{version}"),
            source: SourceKind::Official,
            display_name: name.to_string(),
            description: String::new(),
            endpoint: None,
            tool_names: Vec::new(),
        }
    }

    pub fn display_name(mut self, name: &str) -> Self {
        self.display_name = name.to_string();
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn endpoint(mut self, url: &str) -> Self {
        self.endpoint = Some(url.to_string());
        self
    }

    pub fn tools(mut self, tools: &[&str]) -> Self {
        self.tool_names = tools.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn build(self) -> Record {
        let fp = fingerprint(
            &self.display_name,
            &self.description,
            &self.tool_names,
            self.endpoint.as_deref(),
        );
        Record {
            id: self.id,
            source: self.source,
            display_name: self.display_name,
            description: self.description,
            icon_url: None,
            endpoint: self.endpoint,
            tool_names: self.tool_names,
            config_schema: None,
            package_ref: None,
            fingerprint: fp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use msync_normalize::{normalize, UpstreamPayload};

    #[test]
    fn builder_fingerprint_matches_normalizer() {
        let doc = smithery_payload("@acme/weather", "Weather Pro", Some("https://w/mcp"), &["forecast"]);
        let normalized = normalize(&UpstreamPayload::new(SourceKind::Smithery, doc)).unwrap();

        let built = RecordBuilder::smithery("@acme/weather")
            .display_name("Weather Pro")
            .description("Weather Pro listing")
            .endpoint("https://w/mcp")
            .tools(&["forecast"])
            .build();

        assert_eq!(built.id, normalized.id);
        assert_eq!(built.fingerprint, normalized.fingerprint);
    }

    #[test]
    fn official_fixture_normalizes() {
        let doc = official_payload("io.github.acme/maps", "1.0.0", Some("https://m/mcp"), &["route"]);
        let r = normalize(&UpstreamPayload::new(SourceKind::Official, doc)).unwrap();
        assert_eq!(r.id, "official:io.github.acme/maps:1.0.0");
        assert_eq!(r.endpoint.as_deref(), Some("https://m/mcp"));
        assert_eq!(r.tool_names, vec!["route"]);
    }
}
