use super::{
    BodyCandidate, OperationCandidate, OperationObject, ParamCandidate, ParamLocation,
    SpecAdapter, SpecFormat, document_security, is_reserved_header, json_media, merge_parameters,
    raw_parameters, select_success_response,
};
use crate::error::{OpenApiToolsError, Result};
use crate::resolver::RefResolver;
use indexmap::IndexMap;
use openapiv3::Server;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::debug;

const METHOD_KEYS: &[&str] = &[
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

// `schema` stays raw JSON so 3.1 keywords (type arrays, numeric `exclusiveMinimum`) pass through.
#[derive(Debug, Deserialize)]
struct V3Parameter {
    name: String,
    #[serde(rename = "in")]
    location: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    schema: Option<Value>,
    #[serde(default)]
    content: IndexMap<String, MediaType>,
}

#[derive(Debug, Deserialize)]
struct MediaType {
    #[serde(default)]
    schema: Option<Value>,
}

/// Request bodies and responses both reduce to a content map here.
#[derive(Debug, Deserialize)]
struct ContentHolder {
    #[serde(default)]
    content: IndexMap<String, MediaType>,
    #[serde(default)]
    required: bool,
}

/// Reads OpenAPI 3.x documents.
///
/// Servers go through the `openapiv3` object model. Parameters, request bodies and responses are
/// read with their schemas as plain JSON trees, which are inlined for the translator.
pub struct OpenApiV3Adapter<'a> {
    document: &'a Value,
    resolver: RefResolver<'a>,
}

impl<'a> OpenApiV3Adapter<'a> {
    #[must_use]
    pub fn new(document: &'a Value) -> Self {
        Self {
            document,
            resolver: RefResolver::new(document),
        }
    }

    fn parameter(&self, raw: &Value) -> Result<Option<ParamCandidate>> {
        let param: V3Parameter = self.resolver.resolve_as(raw)?;
        let location = match param.location.as_str() {
            "path" => ParamLocation::Path,
            "query" => ParamLocation::Query,
            "header" => {
                if is_reserved_header(&param.name) {
                    return Ok(None);
                }
                ParamLocation::Header
            }
            "cookie" => {
                debug!(name = %param.name, "Skipping cookie parameter");
                return Ok(None);
            }
            other => {
                return Err(OpenApiToolsError::Config(format!(
                    "parameter '{}' has unknown location '{other}'",
                    param.name
                )));
            }
        };
        let schema = match param
            .schema
            .as_ref()
            .or_else(|| param.content.values().next().and_then(|mt| mt.schema.as_ref()))
        {
            Some(schema) => self.resolver.inline_schema(schema),
            None => json!({"type": "string"}),
        };
        Ok(Some(ParamCandidate {
            required: param.required || location == ParamLocation::Path,
            name: param.name,
            location,
            description: param.description,
            schema,
        }))
    }

    fn parameters(&self, raws: &[Value]) -> Result<Vec<ParamCandidate>> {
        let mut out = Vec::with_capacity(raws.len());
        for raw in raws {
            if let Some(p) = self.parameter(raw)? {
                out.push(p);
            }
        }
        Ok(out)
    }

    fn request_body(&self, raw: &Value) -> Result<Option<BodyCandidate>> {
        let body: ContentHolder = self.resolver.resolve_as(raw)?;
        let Some(media) = json_media(&body.content) else {
            debug!("Request body has no JSON media type; ignoring it");
            return Ok(None);
        };
        let schema = media
            .schema
            .as_ref()
            .map_or_else(|| json!({}), |s| self.resolver.inline_schema(s));
        Ok(Some(BodyCandidate {
            schema,
            required: body.required,
        }))
    }

    /// Best effort: an unreadable response yields no output schema rather than a skipped tool.
    fn response_schema(&self, responses: &Map<String, Value>) -> Option<Value> {
        let raw = select_success_response(responses)?;
        let response: ContentHolder = self.resolver.resolve_as(raw).ok()?;
        let schema = json_media(&response.content)?.schema.as_ref()?;
        Some(self.resolver.inline_schema(schema))
    }
}

impl SpecAdapter for OpenApiV3Adapter<'_> {
    fn format(&self) -> SpecFormat {
        SpecFormat::OpenApiV3
    }

    fn document(&self) -> &Value {
        self.document
    }

    fn method_keys(&self) -> &'static [&'static str] {
        METHOD_KEYS
    }

    /// `servers[0].url` with server variables replaced by their defaults.
    fn default_server(&self) -> Option<String> {
        let servers: Vec<Server> = self
            .document
            .get("servers")
            .and_then(|v| serde_json::from_value(v.clone()).ok())?;
        let server = servers.into_iter().next()?;
        let mut url = server.url;
        if let Some(vars) = server.variables {
            for (name, var) in vars {
                url = url.replace(&format!("{{{name}}}"), &var.default);
            }
        }
        Some(url)
    }

    fn operation(
        &self,
        path: &str,
        method: Method,
        item: &Map<String, Value>,
        operation: &Value,
    ) -> Result<OperationCandidate> {
        let op: OperationObject = serde_json::from_value(operation.clone())?;

        let shared = self.parameters(&raw_parameters(item)?)?;
        let own = self.parameters(&op.parameters)?;
        let body = match &op.request_body {
            Some(raw) => self.request_body(raw)?,
            None => None,
        };

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
            body,
            response_schema: self.response_schema(&op.responses),
        })
    }
}
