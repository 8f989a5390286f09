//! Specification compiler: document in, [`ToolDefinition`]s out.
//!
//! Pipeline: detect format, enumerate operations, build one tool per operation (malformed ones
//! are skipped), resolve unique names, filter by include/exclude, apply per-tool overrides.
//! Any fatal error aborts before a single tool is handed out.

use crate::adapter::{self, OperationCandidate, ParamLocation, SpecFormat};
use crate::config::{ToolOverridePolicy, is_http_location};
use crate::error::{OpenApiToolsError, Result};
use crate::naming::{reserve_unique_name, sanitize_operation_id, synthesize_name};
use crate::overrides::OverrideFilter;
use crate::translate::{translate_input, translate_output};
use indexmap::IndexMap;
use serde_json::Value;
use specbridge_http_tools::registry::ToolRegistry;
use specbridge_http_tools::schema::{SchemaKind, SchemaNode};
use specbridge_http_tools::semantics::carries_body;
use specbridge_http_tools::tool::{
    BodyShape, InputSchema, RAW_BODY_ARGUMENT, ToolDefinition, ToolMeta,
};
use std::collections::HashSet;
use tracing::{debug, info, warn};
use url::Url;

/// Result of one compilation pass.
#[derive(Debug, Clone)]
pub struct CompiledSpec {
    pub format: SpecFormat,
    pub title: Option<String>,
    /// The document's own server URL, possibly relative. See [`resolve_server_url`].
    pub default_base_url: Option<String>,
    pub tools: Vec<ToolDefinition>,
}

/// Compile `document` under `policy`.
///
/// # Errors
///
/// Fails with `UnsupportedSpecification`, `MissingPaths`, `NameCollisionUnresolved`, or a
/// configuration error from an invalid override. Malformed operations are skipped, not errors.
pub fn compile(document: &Value, policy: &ToolOverridePolicy) -> Result<CompiledSpec> {
    let adapter = adapter::detect(document)?;
    let candidates = adapter.operations()?;
    let filter = OverrideFilter::new(policy);

    let mut used: HashSet<String> = HashSet::new();
    let mut tools: Vec<ToolDefinition> = Vec::with_capacity(candidates.len());
    for op in candidates {
        let method = op.method.clone();
        let path = op.path.clone();
        let mut tool = match build_tool(op) {
            Ok(tool) => tool,
            Err(reason) => {
                let err = OpenApiToolsError::MalformedOperation {
                    method: method.to_string(),
                    path,
                    reason,
                };
                warn!(error = %err, "Skipping operation");
                continue;
            }
        };
        tool.name = reserve_unique_name(&mut used, &tool.name)?;
        tools.push(tool);
    }

    tools.retain(|tool| {
        let keep = filter.retains(&tool.name);
        if !keep {
            debug!(tool = %tool.name, "Tool filtered out by include/exclude policy");
        }
        keep
    });

    let mut matched: HashSet<String> = HashSet::new();
    for tool in &mut tools {
        let original = tool.name.clone();
        if filter.apply(tool)? {
            matched.insert(original);
        }
    }
    for name in policy.tools.keys() {
        if !matched.contains(name) {
            warn!(tool = %name, "Tool override does not match any compiled tool");
        }
    }

    let mut final_names: HashSet<&str> = HashSet::with_capacity(tools.len());
    for tool in &tools {
        if !final_names.insert(tool.name.as_str()) {
            return Err(OpenApiToolsError::NameCollisionUnresolved(format!(
                "override renames a tool onto existing name '{}'",
                tool.name
            )));
        }
    }

    let title = adapter.title();
    info!(
        title = title.as_deref().unwrap_or("<untitled>"),
        format = adapter.format().as_str(),
        tools = tools.len(),
        "Compiled spec"
    );

    Ok(CompiledSpec {
        format: adapter.format(),
        title,
        default_base_url: adapter.default_server(),
        tools,
    })
}

/// Compile and, only on success, swap the result into `registry`.
///
/// # Errors
///
/// Same as [`compile`]; on error the registry keeps its previous tool set.
pub fn compile_into(
    registry: &ToolRegistry,
    document: &Value,
    policy: &ToolOverridePolicy,
) -> Result<CompiledSpec> {
    let compiled = compile(document, policy)?;
    registry.replace_all(compiled.tools.clone());
    Ok(compiled)
}

/// Make a document server URL absolute.
///
/// Relative URLs (`/api/v3`) are joined onto the spec URL when the spec itself came over http(s).
///
/// # Errors
///
/// Returns [`OpenApiToolsError::Config`] if the URL is relative and cannot be resolved.
pub fn resolve_server_url(server: &str, spec_location: &str) -> Result<String> {
    if is_http_location(server) {
        return Ok(server.to_string());
    }
    if is_http_location(spec_location) {
        let mut spec_url = Url::parse(spec_location).map_err(|e| {
            OpenApiToolsError::Config(format!("invalid spec URL '{spec_location}': {e}"))
        })?;
        spec_url.set_fragment(None);
        let resolved = spec_url.join(server).map_err(|e| {
            OpenApiToolsError::Config(format!(
                "invalid server URL '{server}': {e} (set baseUrl explicitly)"
            ))
        })?;
        return Ok(resolved.to_string());
    }
    Err(OpenApiToolsError::Config(format!(
        "server URL '{server}' is not an absolute http(s) URL (set baseUrl explicitly)"
    )))
}

/// Assemble one tool. The name is the base name; uniqueness is handled by the caller.
///
/// Errors are reasons for skipping the operation.
fn build_tool(op: OperationCandidate) -> std::result::Result<ToolDefinition, String> {
    let name = op
        .operation_id
        .as_deref()
        .and_then(sanitize_operation_id)
        .unwrap_or_else(|| synthesize_name(&op.method, &op.path));

    let mut meta = ToolMeta::new(op.method.clone(), op.path.clone());
    meta.operation_id = op.operation_id.clone();
    meta.tags = op.tags;
    meta.security = op.security;

    let mut input = InputSchema::default();

    for location in [ParamLocation::Path, ParamLocation::Query, ParamLocation::Header] {
        for param in op.parameters.iter().filter(|p| p.location == location) {
            let mut node = translate_input(&param.schema);
            if node.description.is_none() {
                node.description = param.description.clone();
            }
            add_argument(&mut input, &param.name, node.clone(), param.required)?;
            let target = match location {
                ParamLocation::Path => &mut meta.path_params,
                ParamLocation::Query => &mut meta.query_params,
                ParamLocation::Header => &mut meta.header_params,
            };
            target.insert(param.name.clone(), node);
        }
    }

    for var in template_variables(&op.path) {
        if !meta.path_params.contains_key(&var) {
            debug!(path = %op.path, param = %var, "Path placeholder has no declared parameter");
            add_argument(&mut input, &var, SchemaNode::string(), true)?;
            meta.path_params.insert(var, SchemaNode::string());
        }
    }

    match op.body {
        Some(body) if carries_body(&op.method) => {
            let node = translate_input(&body.schema);
            match node.kind {
                SchemaKind::Object {
                    properties,
                    required,
                } => {
                    for (prop, schema) in properties {
                        add_argument(&mut input, &prop, schema, false)?;
                    }
                    if body.required {
                        input.required.extend(required);
                    }
                    meta.body = Some(BodyShape::Fields);
                }
                kind => {
                    let mut raw = SchemaNode::new(kind);
                    raw.description = node.description;
                    raw.format = node.format;
                    raw.enumeration = node.enumeration;
                    add_argument(&mut input, RAW_BODY_ARGUMENT, raw, body.required)?;
                    meta.body = Some(BodyShape::Raw);
                }
            }
        }
        Some(_) => {
            debug!(
                method = %op.method,
                path = %op.path,
                "Ignoring request body on a method that does not carry one"
            );
        }
        None => {}
    }

    Ok(ToolDefinition {
        name,
        title: op.summary.clone(),
        description: op.description.or(op.summary),
        input_schema: input,
        output_schema: op.response_schema.as_ref().map(translate_output),
        meta,
    })
}

fn add_argument(
    input: &mut InputSchema,
    name: &str,
    node: SchemaNode,
    required: bool,
) -> std::result::Result<(), String> {
    if input.properties.contains_key(name) {
        return Err(format!("argument '{name}' is declared more than once"));
    }
    input.properties.insert(name.to_string(), node);
    if required {
        input.required.push(name.to_string());
    }
    Ok(())
}

/// `{name}` placeholders of a path template, in order.
fn template_variables(path: &str) -> Vec<String> {
    let mut vars = Vec::new();
    let mut rest = path;
    while let Some(start) = rest.find('{') {
        let Some(len) = rest[start + 1..].find('}') else {
            break;
        };
        let var = &rest[start + 1..start + 1 + len];
        if !var.is_empty() && !vars.iter().any(|v| v == var) {
            vars.push(var.to_string());
        }
        rest = &rest[start + 2 + len..];
    }
    vars
}

/// Arguments per location, as recorded in `meta`.
#[must_use]
pub fn argument_locations(tool: &ToolDefinition) -> IndexMap<&str, &'static str> {
    let meta = &tool.meta;
    let mut out = IndexMap::new();
    for name in meta.path_params.keys() {
        out.insert(name.as_str(), "path");
    }
    for name in meta.query_params.keys() {
        out.insert(name.as_str(), "query");
    }
    for name in meta.header_params.keys() {
        out.insert(name.as_str(), "header");
    }
    if meta.body.is_some() {
        for name in tool.input_schema.properties.keys() {
            out.entry(name.as_str()).or_insert("body");
        }
    }
    out
}
