use super::{
    BodyCandidate, OperationCandidate, OperationObject, ParamCandidate, ParamLocation,
    SpecAdapter, SpecFormat, document_security, is_reserved_header, merge_parameters,
    raw_parameters, select_success_response,
};
use crate::error::{OpenApiToolsError, Result};
use crate::resolver::RefResolver;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::debug;

// Swagger 2.0 has no `trace` operation.
const METHOD_KEYS: &[&str] = &["get", "put", "post", "delete", "options", "head", "patch"];

#[derive(Debug, Deserialize)]
struct Swagger2Parameter {
    name: String,
    #[serde(rename = "in")]
    location: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    required: bool,
    /// Only for `in: body`.
    #[serde(default)]
    schema: Option<Value>,
    #[serde(rename = "type", default)]
    param_type: Option<String>,
    #[serde(default)]
    format: Option<String>,
    #[serde(default)]
    items: Option<Value>,
    #[serde(rename = "enum", default)]
    enumeration: Option<Vec<Value>>,
}

enum Routed {
    Param(ParamCandidate),
    Body(BodyCandidate),
    Skipped,
}

/// Reads Swagger 2.0 documents.
///
/// Swagger has no request-body object: the single `in: body` parameter plays that role, and
/// non-body parameters carry their type inline instead of under a `schema`.
pub struct SwaggerV2Adapter<'a> {
    document: &'a Value,
    resolver: RefResolver<'a>,
}

impl<'a> SwaggerV2Adapter<'a> {
    #[must_use]
    pub fn new(document: &'a Value) -> Self {
        Self {
            document,
            resolver: RefResolver::new(document),
        }
    }

    fn route(&self, raw: &Value) -> Result<Routed> {
        let param: Swagger2Parameter = self.resolver.resolve_as(raw)?;
        let location = match param.location.as_str() {
            "path" => ParamLocation::Path,
            "query" => ParamLocation::Query,
            "header" => {
                if is_reserved_header(&param.name) {
                    return Ok(Routed::Skipped);
                }
                ParamLocation::Header
            }
            "body" => {
                let schema = param
                    .schema
                    .as_ref()
                    .map_or_else(|| json!({}), |s| self.resolver.inline_schema(s));
                return Ok(Routed::Body(BodyCandidate {
                    schema,
                    required: param.required,
                }));
            }
            "formData" => {
                debug!(name = %param.name, "Skipping formData parameter");
                return Ok(Routed::Skipped);
            }
            other => {
                return Err(OpenApiToolsError::Config(format!(
                    "parameter '{}' has unknown location '{other}'",
                    param.name
                )));
            }
        };

        let schema = self.inline_type(&param);
        Ok(Routed::Param(ParamCandidate {
            required: param.required || location == ParamLocation::Path,
            name: param.name,
            location,
            description: param.description,
            schema,
        }))
    }

    /// Rebuild a schema from the inline `type`/`format`/`items`/`enum` of a non-body parameter.
    fn inline_type(&self, param: &Swagger2Parameter) -> Value {
        let mut schema = Map::new();
        schema.insert(
            "type".to_string(),
            Value::String(param.param_type.clone().unwrap_or_else(|| "string".to_string())),
        );
        if let Some(format) = &param.format {
            schema.insert("format".to_string(), Value::String(format.clone()));
        }
        if let Some(items) = &param.items {
            schema.insert("items".to_string(), self.resolver.inline_schema(items));
        }
        if let Some(values) = &param.enumeration {
            schema.insert("enum".to_string(), Value::Array(values.clone()));
        }
        Value::Object(schema)
    }

    fn collect(&self, raws: &[Value]) -> Result<(Vec<ParamCandidate>, Option<BodyCandidate>)> {
        let mut params = Vec::with_capacity(raws.len());
        let mut body = None;
        for raw in raws {
            match self.route(raw)? {
                Routed::Param(p) => params.push(p),
                Routed::Body(b) => body = Some(b),
                Routed::Skipped => {}
            }
        }
        Ok((params, body))
    }

    fn response_schema(&self, responses: &Map<String, Value>) -> Option<Value> {
        let raw = select_success_response(responses)?;
        let response = self.resolver.resolve(raw).ok()?;
        let schema = response.get("schema")?;
        Some(self.resolver.inline_schema(schema))
    }
}

impl SpecAdapter for SwaggerV2Adapter<'_> {
    fn format(&self) -> SpecFormat {
        SpecFormat::SwaggerV2
    }

    fn document(&self) -> &Value {
        self.document
    }

    fn method_keys(&self) -> &'static [&'static str] {
        METHOD_KEYS
    }

    /// `schemes[0]://host + basePath`, or just `basePath` when no host is declared.
    fn default_server(&self) -> Option<String> {
        let base_path = self
            .document
            .get("basePath")
            .and_then(Value::as_str)
            .unwrap_or("");
        match self.document.get("host").and_then(Value::as_str) {
            Some(host) => {
                let scheme = self
                    .document
                    .get("schemes")
                    .and_then(Value::as_array)
                    .and_then(|s| s.first())
                    .and_then(Value::as_str)
                    .unwrap_or("https");
                Some(format!("{scheme}://{host}{base_path}"))
            }
            None if !base_path.is_empty() => Some(base_path.to_string()),
            None => None,
        }
    }

    fn operation(
        &self,
        path: &str,
        method: Method,
        item: &Map<String, Value>,
        operation: &Value,
    ) -> Result<OperationCandidate> {
        let op: OperationObject = serde_json::from_value(operation.clone())?;

        let (shared, shared_body) = self.collect(&raw_parameters(item)?)?;
        let (own, own_body) = self.collect(&op.parameters)?;

        Ok(OperationCandidate {
            path: path.to_string(),
            method,
            operation_id: op.operation_id,
            summary: op.summary,
            description: op.description,
            tags: op.tags,
            security: op
                .security
                .unwrap_or_else(|| document_security(self.document)),
            parameters: merge_parameters(shared, own),
            body: own_body.or(shared_body),
            response_schema: self.response_schema(&op.responses),
        })
    }
}
