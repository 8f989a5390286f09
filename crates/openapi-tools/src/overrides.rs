//! Include/exclude filtering and per-tool overrides.

use crate::config::{ToolOverride, ToolOverridePolicy};
use crate::error::{OpenApiToolsError, Result};
use crate::translate::translate_input;
use specbridge_http_tools::tool::{InputSchema, ToolDefinition};
use tracing::warn;

/// Applies a [`ToolOverridePolicy`] to compiled tools, keyed by resolved tool name.
#[derive(Debug, Clone, Copy)]
pub struct OverrideFilter<'p> {
    policy: &'p ToolOverridePolicy,
}

impl<'p> OverrideFilter<'p> {
    #[must_use]
    pub fn new(policy: &'p ToolOverridePolicy) -> Self {
        Self { policy }
    }

    /// Whether a tool survives filtering. `includeOnly` is applied first, then `exclude`, so a name
    /// in both lists is dropped.
    #[must_use]
    pub fn retains(&self, name: &str) -> bool {
        if !self.policy.include_only.is_empty() && !self.policy.include_only.contains(name) {
            return false;
        }
        !self.policy.exclude.contains(name)
    }

    #[must_use]
    pub fn override_for(&self, name: &str) -> Option<&'p ToolOverride> {
        self.policy.tools.get(name)
    }

    /// Replace each field the override for `tool.name` sets. Returns whether one matched.
    ///
    /// # Errors
    ///
    /// Returns [`OpenApiToolsError::Config`] if an `inputSchema` override is not an object schema.
    pub fn apply(&self, tool: &mut ToolDefinition) -> Result<bool> {
        let Some(ovr) = self.override_for(&tool.name) else {
            return Ok(false);
        };

        if let Some(schema) = &ovr.input_schema {
            let input = InputSchema::from_node(translate_input(schema)).ok_or_else(|| {
                OpenApiToolsError::Config(format!(
                    "inputSchema override for '{}' must be an object schema",
                    tool.name
                ))
            })?;
            for param in tool.meta.path_params.keys() {
                if !input.properties.contains_key(param) {
                    warn!(
                        tool = %tool.name,
                        param = %param,
                        "inputSchema override drops a path parameter; calls will fail until it is supplied"
                    );
                }
            }
            tool.input_schema = input;
        }
        if let Some(title) = &ovr.title {
            tool.title = Some(title.clone());
        }
        if let Some(description) = &ovr.description {
            tool.description = Some(description.clone());
        }
        if let Some(name) = &ovr.name {
            tool.name = name.clone();
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Method;
    use serde_json::json;
    use specbridge_http_tools::schema::SchemaNode;
    use specbridge_http_tools::tool::ToolMeta;

    fn policy(yaml: &str) -> ToolOverridePolicy {
        serde_yaml::from_str(yaml).expect("policy parses")
    }

    fn tool(name: &str) -> ToolDefinition {
        let mut meta = ToolMeta::new(Method::GET, "/pets/{petId}");
        meta.path_params
            .insert("petId".to_string(), SchemaNode::scalar("integer"));
        let mut input = InputSchema::default();
        input
            .properties
            .insert("petId".to_string(), SchemaNode::scalar("integer"));
        ToolDefinition {
            name: name.to_string(),
            title: Some("Original".to_string()),
            description: Some("Original description".to_string()),
            input_schema: input,
            output_schema: None,
            meta,
        }
    }

    #[test]
    fn empty_policy_retains_everything() {
        let p = ToolOverridePolicy::default();
        assert!(OverrideFilter::new(&p).retains("anything"));
    }

    #[test]
    fn include_only_then_exclude() {
        let p = policy("includeOnly: [a, b]\nexclude: [b, c]\n");
        let filter = OverrideFilter::new(&p);
        assert!(filter.retains("a"));
        assert!(!filter.retains("b"));
        assert!(!filter.retains("c"));
        assert!(!filter.retains("d"));
    }

    #[test]
    fn exclude_wins_over_include() {
        let p = policy("includeOnly: [a]\nexclude: [a]\n");
        assert!(!OverrideFilter::new(&p).retains("a"));
    }

    #[test]
    fn present_fields_replace_compiled_values() {
        let p = policy("tools:\n  getPet:\n    description: Fetch one pet.\n");
        let mut t = tool("getPet");
        assert!(OverrideFilter::new(&p).apply(&mut t).expect("applies"));
        assert_eq!(t.description.as_deref(), Some("Fetch one pet."));
        assert_eq!(t.title.as_deref(), Some("Original"));
        assert_eq!(t.name, "getPet");
    }

    #[test]
    fn input_schema_is_replaced_not_merged() {
        let mut p = ToolOverridePolicy::default();
        p.tools.insert(
            "getPet".to_string(),
            ToolOverride {
                name: Some("fetchPet".to_string()),
                input_schema: Some(json!({
                    "type": "object",
                    "properties": {"petId": {"type": "string", "description": "Pet id"}},
                    "required": ["petId"]
                })),
                ..ToolOverride::default()
            },
        );
        let mut t = tool("getPet");
        OverrideFilter::new(&p).apply(&mut t).expect("applies");
        assert_eq!(t.name, "fetchPet");
        assert_eq!(
            t.input_schema.to_json(),
            json!({
                "type": "object",
                "properties": {"petId": {"type": "string", "description": "Pet id"}},
                "required": ["petId"]
            })
        );
    }

    #[test]
    fn non_object_input_schema_is_rejected() {
        let mut p = ToolOverridePolicy::default();
        p.tools.insert(
            "getPet".to_string(),
            ToolOverride {
                input_schema: Some(json!({"type": "string"})),
                ..ToolOverride::default()
            },
        );
        let err = OverrideFilter::new(&p).apply(&mut tool("getPet")).unwrap_err();
        assert!(matches!(err, OpenApiToolsError::Config(_)));
    }

    #[test]
    fn unmatched_name_leaves_tool_untouched() {
        let p = policy("tools:\n  other:\n    title: X\n");
        let mut t = tool("getPet");
        assert!(!OverrideFilter::new(&p).apply(&mut t).expect("no-op"));
        assert_eq!(t, tool("getPet"));
    }
}
