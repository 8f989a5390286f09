//! Format adapters.
//!
//! OpenAPI v3 and Swagger v2 describe the same things with different object models. Each adapter
//! turns its format into a flat list of [`OperationCandidate`]s with `$ref`s already inlined, so
//! the compiler only ever sees one shape.

mod v2;
mod v3;

pub use v2::SwaggerV2Adapter;
pub use v3::OpenApiV3Adapter;

use crate::error::{OpenApiToolsError, Result};
use crate::resolver::RefResolver;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{Map, Value};
use specbridge_http_tools::tool::SecurityRequirement;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Which document format an adapter reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecFormat {
    OpenApiV3,
    SwaggerV2,
}

impl SpecFormat {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpenApiV3 => "openapi-v3",
            Self::SwaggerV2 => "swagger-v2",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamLocation {
    Path,
    Query,
    Header,
}

impl ParamLocation {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::Query => "query",
            Self::Header => "header",
        }
    }
}

/// A declared parameter, with its schema inlined.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamCandidate {
    pub name: String,
    pub location: ParamLocation,
    pub required: bool,
    pub description: Option<String>,
    pub schema: Value,
}

/// The JSON request body of an operation.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyCandidate {
    pub schema: Value,
    pub required: bool,
}

/// One (path, method, operation) triple, normalized across formats.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationCandidate {
    pub path: String,
    pub method: Method,
    pub operation_id: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    /// Operation-level requirements, or the document default when the operation declares none.
    pub security: Vec<SecurityRequirement>,
    pub parameters: Vec<ParamCandidate>,
    pub body: Option<BodyCandidate>,
    pub response_schema: Option<Value>,
}

/// Fields shared by v2 and v3 operation objects. Parameters and bodies stay raw until the
/// format-specific adapter resolves them.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct OperationObject {
    pub operation_id: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub parameters: Vec<Value>,
    pub request_body: Option<Value>,
    pub security: Option<Vec<SecurityRequirement>>,
    pub responses: Map<String, Value>,
}

/// Per-format extraction over a parsed document.
pub trait SpecAdapter {
    fn format(&self) -> SpecFormat;

    fn document(&self) -> &Value;

    /// Method keys this format allows on a path item, in enumeration order.
    fn method_keys(&self) -> &'static [&'static str];

    /// The document's default server URL, possibly relative.
    fn default_server(&self) -> Option<String>;

    /// Build one candidate. `item` is the (resolved) path item the operation belongs to.
    ///
    /// # Errors
    ///
    /// Any error marks this operation as malformed; the caller skips it.
    fn operation(
        &self,
        path: &str,
        method: Method,
        item: &Map<String, Value>,
        operation: &Value,
    ) -> Result<OperationCandidate>;

    fn title(&self) -> Option<String> {
        self.document()
            .pointer("/info/title")
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    /// Enumerate every operation in document order.
    ///
    /// Malformed path items and operations are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns [`OpenApiToolsError::MissingPaths`] if `paths` is absent, not a mapping, or empty.
    fn operations(&self) -> Result<Vec<OperationCandidate>> {
        let paths = self
            .document()
            .get("paths")
            .and_then(Value::as_object)
            .filter(|p| !p.is_empty())
            .ok_or(OpenApiToolsError::MissingPaths)?;
        let resolver = RefResolver::new(self.document());

        let mut out = Vec::new();
        for (path, raw_item) in paths {
            let item = match resolver.resolve(raw_item) {
                Ok(Value::Object(item)) => item,
                Ok(_) => {
                    warn!(path = %path, "Skipping path: path item is not a mapping");
                    continue;
                }
                Err(e) => {
                    warn!(path = %path, error = %e, "Skipping path");
                    continue;
                }
            };

            for key in self.method_keys() {
                let Some(raw_op) = item.get(*key) else {
                    continue;
                };
                if raw_op.is_null() {
                    continue;
                }
                let Some(method) = method_for_key(key) else {
                    continue;
                };
                match self.operation(path, method.clone(), item, raw_op) {
                    Ok(candidate) => out.push(candidate),
                    Err(e) => {
                        let err = OpenApiToolsError::MalformedOperation {
                            method: method.to_string(),
                            path: path.clone(),
                            reason: e.to_string(),
                        };
                        warn!(error = %err, "Skipping operation");
                    }
                }
            }
        }
        Ok(out)
    }
}

/// Pick the adapter for `document` from its top-level marker key.
///
/// # Errors
///
/// Returns [`OpenApiToolsError::UnsupportedSpecification`] if the document is not a mapping or has
/// neither an `openapi` nor a `swagger` key.
pub fn detect(document: &Value) -> Result<Box<dyn SpecAdapter + '_>> {
    let Some(root) = document.as_object() else {
        return Err(OpenApiToolsError::UnsupportedSpecification(
            "document is not a mapping".to_string(),
        ));
    };
    if root.contains_key("openapi") {
        Ok(Box::new(OpenApiV3Adapter::new(document)))
    } else if root.contains_key("swagger") {
        Ok(Box::new(SwaggerV2Adapter::new(document)))
    } else {
        Err(OpenApiToolsError::UnsupportedSpecification(
            "neither an 'openapi' nor a 'swagger' key is present".to_string(),
        ))
    }
}

fn method_for_key(key: &str) -> Option<Method> {
    Some(match key {
        "get" => Method::GET,
        "put" => Method::PUT,
        "post" => Method::POST,
        "delete" => Method::DELETE,
        "options" => Method::OPTIONS,
        "head" => Method::HEAD,
        "patch" => Method::PATCH,
        "trace" => Method::TRACE,
        _ => return None,
    })
}

/// Path-item parameters first; an operation parameter with the same (location, name) replaces one.
pub(crate) fn merge_parameters(
    shared: Vec<ParamCandidate>,
    own: Vec<ParamCandidate>,
) -> Vec<ParamCandidate> {
    let mut merged: Vec<ParamCandidate> = Vec::with_capacity(shared.len() + own.len());
    let mut index: HashMap<(ParamLocation, String), usize> = HashMap::new();
    for p in shared.into_iter().chain(own) {
        let key = (p.location, p.name.clone());
        if let Some(i) = index.get(&key).copied() {
            merged[i] = p;
        } else {
            index.insert(key, merged.len());
            merged.push(p);
        }
    }
    merged
}

/// `parameters` of a path item as raw values.
pub(crate) fn raw_parameters(item: &Map<String, Value>) -> Result<Vec<Value>> {
    match item.get("parameters") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(params)) => Ok(params.clone()),
        Some(_) => Err(OpenApiToolsError::Config(
            "path item 'parameters' is not a list".to_string(),
        )),
    }
}

/// Document-level `security`, used when an operation declares none.
pub(crate) fn document_security(document: &Value) -> Vec<SecurityRequirement> {
    document
        .get("security")
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .unwrap_or_default()
}

/// The response whose schema describes a successful call.
///
/// `200` first, then the lowest explicit 2xx code, then `2XX`, then `default`.
pub(crate) fn select_success_response(responses: &Map<String, Value>) -> Option<&Value> {
    if let Some(r) = responses.get("200") {
        return Some(r);
    }
    let explicit = responses
        .iter()
        .filter_map(|(code, r)| {
            code.parse::<u16>()
                .ok()
                .filter(|n| (200..300).contains(n))
                .map(|n| (n, r))
        })
        .min_by_key(|(n, _)| *n);
    if let Some((_, r)) = explicit {
        return Some(r);
    }
    responses
        .iter()
        .find(|(code, _)| code.eq_ignore_ascii_case("2XX"))
        .map(|(_, r)| r)
        .or_else(|| responses.get("default"))
}

/// Select a JSON-ish media type: `application/json`, else the first one mentioning json.
pub(crate) fn json_media<'c, T>(content: &'c indexmap::IndexMap<String, T>) -> Option<&'c T> {
    if let Some(mt) = content.get("application/json") {
        return Some(mt);
    }
    content.iter().find_map(|(k, v)| {
        let lower = k.to_ascii_lowercase();
        lower.contains("json").then_some(v)
    })
}

/// Header parameters the HTTP layer owns; declaring them has no effect.
pub(crate) fn is_reserved_header(name: &str) -> bool {
    let reserved = ["accept", "content-type", "authorization"];
    if reserved.iter().any(|r| name.eq_ignore_ascii_case(r)) {
        debug!(header = %name, "Ignoring reserved header parameter");
        return true;
    }
    false
}
