//! Compiled tool definitions.

use crate::schema::SchemaNode;
use indexmap::IndexMap;
use reqwest::Method;
use rmcp::model::{JsonObject, Tool};
use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};
use serde_json::Value;
use std::sync::Arc;

/// One security requirement object: scheme name → required scopes.
pub type SecurityRequirement = IndexMap<String, Vec<String>>;

/// A compiled, invocable unit derived from one (path, method) operation.
///
/// Immutable once compiled; a recompilation produces a fresh set.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub input_schema: InputSchema,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<SchemaNode>,
    pub meta: ToolMeta,
}

/// The caller-facing argument schema: always an object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputSchema {
    pub properties: IndexMap<String, SchemaNode>,
    pub required: Vec<String>,
}

/// How leftover arguments become the request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BodyShape {
    /// Object body: its properties are top-level arguments.
    Fields,
    /// Non-object body: a single `body` argument is sent verbatim.
    Raw,
}

/// Name of the argument that carries a [`BodyShape::Raw`] payload.
pub const RAW_BODY_ARGUMENT: &str = "body";

/// Routing information the executor needs to turn arguments into a request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolMeta {
    #[serde(serialize_with = "serialize_method")]
    pub http_method: Method,
    pub path_template: String,
    pub path_params: IndexMap<String, SchemaNode>,
    pub query_params: IndexMap<String, SchemaNode>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub header_params: IndexMap<String, SchemaNode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<BodyShape>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    pub tags: Vec<String>,
    pub security: Vec<SecurityRequirement>,
}

impl ToolMeta {
    #[must_use]
    pub fn new(http_method: Method, path_template: impl Into<String>) -> Self {
        Self {
            http_method,
            path_template: path_template.into(),
            path_params: IndexMap::new(),
            query_params: IndexMap::new(),
            header_params: IndexMap::new(),
            body: None,
            operation_id: None,
            tags: Vec::new(),
            security: Vec::new(),
        }
    }
}

fn serialize_method<S>(method: &Method, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(method.as_str())
}

impl InputSchema {
    /// Build from an object schema node. Returns `None` for non-object nodes.
    #[must_use]
    pub fn from_node(node: SchemaNode) -> Option<Self> {
        match node.kind {
            crate::schema::SchemaKind::Object {
                properties,
                required,
            } => Some(Self {
                properties,
                required,
            }),
            _ => None,
        }
    }

    #[must_use]
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl Serialize for InputSchema {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("type", "object")?;
        map.serialize_entry("properties", &self.properties)?;
        if !self.required.is_empty() {
            map.serialize_entry("required", &self.required)?;
        }
        map.end()
    }
}

impl ToolDefinition {
    /// Convert into an MCP `Tool` for listing to callers.
    ///
    /// Responses are returned as raw text, so no structured output schema is advertised.
    #[must_use]
    pub fn to_mcp_tool(&self) -> Tool {
        let schema_obj = match self.input_schema.to_json() {
            Value::Object(obj) => obj,
            _ => JsonObject::new(),
        };
        let mut tool = Tool::new(
            self.name.clone(),
            self.description.clone().unwrap_or_default(),
            Arc::new(schema_obj),
        );
        tool.annotations = Some(crate::semantics::annotations_for_method(
            &self.meta.http_method,
            self.title.clone(),
        ));
        tool
    }
}
