//! Request executor: turns `(tool name, arguments)` into one authenticated HTTP request.
//!
//! Each call works on its own copy of the arguments ([`PendingCall`]). Routing consumes them in a
//! fixed order (path, query, header, then body) so a value is sent at most once. Anything left
//! over on a call without a body is reported back instead of dropped.

use crate::auth::AuthResolver;
use crate::config::RuntimeConfig;
use crate::error::{HttpToolsError, Result};
use crate::registry::ToolRegistry;
use crate::safety::{check_url, redact_url};
use crate::semantics::carries_body;
use crate::tool::{BodyShape, RAW_BODY_ARGUMENT, ToolDefinition};
use crate::transport::{HttpResponse, OutboundRequest, ReqwestTransport, Transport};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use rmcp::model::{CallToolResult, Content};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;
use url::Url;
use zeroize::Zeroizing;

/// Executes registered tools. Cheap to clone and safe to share across tasks.
#[derive(Clone)]
pub struct ToolExecutor {
    inner: Arc<ExecutorInner>,
}

struct ExecutorInner {
    registry: Arc<ToolRegistry>,
    base_url: String,
    auth: AuthResolver,
    default_headers: HeaderMap,
    transport: Arc<dyn Transport>,
}

impl ToolExecutor {
    /// Build an executor with the default `reqwest` transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is missing or invalid, the auth mode lacks its secrets,
    /// a default header is invalid, or the HTTP client cannot be built.
    pub fn new(registry: Arc<ToolRegistry>, config: &RuntimeConfig) -> Result<Self> {
        let transport = Arc::new(ReqwestTransport::new(&config.network)?);
        Self::with_transport(registry, config, transport)
    }

    /// Build an executor over a caller-supplied transport.
    ///
    /// # Errors
    ///
    /// Same as [`ToolExecutor::new`], minus client construction.
    pub fn with_transport(
        registry: Arc<ToolRegistry>,
        config: &RuntimeConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        let base_url = config
            .base_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| HttpToolsError::Config("no baseUrl configured".to_string()))?;
        let parsed = Url::parse(base_url)
            .map_err(|e| HttpToolsError::Config(format!("Invalid baseUrl '{base_url}': {e}")))?;
        check_url(&parsed)?;
        if parsed.query().is_some() || parsed.fragment().is_some() {
            return Err(HttpToolsError::Config(format!(
                "baseUrl '{}' must not carry a query string or fragment",
                redact_url(&parsed)
            )));
        }

        let auth = AuthResolver::new(&config.auth.resolve()?)?;

        let mut default_headers = HeaderMap::new();
        for (name, value) in &config.default_headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| HttpToolsError::Config(format!("Invalid default header '{name}'")))?;
            let header_value = HeaderValue::from_str(value).map_err(|_| {
                HttpToolsError::Config(format!("Invalid value for default header '{name}'"))
            })?;
            default_headers.insert(header_name, header_value);
        }

        Ok(Self {
            inner: Arc::new(ExecutorInner {
                registry,
                base_url: base_url.trim_end_matches('/').to_string(),
                auth,
                default_headers,
                transport,
            }),
        })
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.inner.registry
    }

    /// Assemble the request for a call without sending it.
    ///
    /// # Errors
    ///
    /// Returns [`HttpToolsError::UnknownTool`] for unregistered names, and argument errors
    /// (`InvalidArguments`, `MissingArgument`, `UnexpectedArguments`) for calls that cannot be
    /// routed.
    pub fn prepare(&self, tool_name: &str, arguments: &Value) -> Result<OutboundRequest> {
        let tool = self.lookup(tool_name)?;
        self.build_request(&tool, arguments)
    }

    /// Run one call: a single network round trip, no retries.
    ///
    /// Non-2xx statuses are returned as-is; only failures to obtain a response are errors.
    ///
    /// # Errors
    ///
    /// Everything [`ToolExecutor::prepare`] returns, plus [`HttpToolsError::Transport`] for
    /// network and timeout failures.
    pub async fn execute(&self, tool_name: &str, arguments: &Value) -> Result<HttpResponse> {
        let tool = self.lookup(tool_name)?;
        let request = self.build_request(&tool, arguments)?;
        debug!(
            tool = %tool.name,
            method = %request.method,
            url = %redact_url(&request.url),
            "dispatching tool call"
        );
        self.inner.transport.send(request).await
    }

    /// [`ToolExecutor::execute`] rendered as an MCP result. Never fails: errors become
    /// `is_error` results whose text starts with the error kind.
    pub async fn call_tool(&self, tool_name: &str, arguments: Value) -> CallToolResult {
        match self.execute(tool_name, &arguments).await {
            Ok(response) => response_to_result(&response),
            Err(e) => error_result(&e),
        }
    }

    fn lookup(&self, tool_name: &str) -> Result<Arc<ToolDefinition>> {
        self.inner
            .registry
            .get(tool_name)
            .ok_or_else(|| HttpToolsError::UnknownTool(tool_name.to_string()))
    }

    fn build_request(&self, tool: &ToolDefinition, arguments: &Value) -> Result<OutboundRequest> {
        let mut call = PendingCall::new(tool, arguments)?;
        call.substitute_path()?;
        call.collect_query(self.inner.auth.query_param());
        call.collect_headers()?;
        call.select_body()?;
        call.finish(&self.inner)
    }
}

/// Working state for one call.
struct PendingCall<'a> {
    tool: &'a ToolDefinition,
    args: Map<String, Value>,
    path: String,
    /// Values may include the API key, so they are wiped on drop.
    query: Vec<(String, Zeroizing<String>)>,
    headers: HeaderMap,
    body: Option<Vec<u8>>,
}

impl<'a> PendingCall<'a> {
    fn new(tool: &'a ToolDefinition, arguments: &Value) -> Result<Self> {
        let args = match arguments {
            Value::Null => Map::new(),
            Value::Object(map) => map.clone(),
            other => {
                return Err(HttpToolsError::InvalidArguments(format!(
                    "expected a JSON object, got {}",
                    json_type_name(other)
                )));
            }
        };
        let mut path = tool.meta.path_template.clone();
        if !path.starts_with('/') {
            path.insert(0, '/');
        }
        Ok(Self {
            tool,
            args,
            path,
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
        })
    }

    fn take(&mut self, name: &str) -> Option<Value> {
        match self.args.shift_remove(name) {
            Some(Value::Null) | None => None,
            Some(v) => Some(v),
        }
    }

    fn substitute_path(&mut self) -> Result<()> {
        for name in self.tool.meta.path_params.keys() {
            if let Some(value) = self.take(name) {
                let encoded = encode_component(&value_to_string(&value));
                self.path = self.path.replace(&format!("{{{name}}}"), &encoded);
            }
        }
        if let Some(name) = first_placeholder(&self.path) {
            return Err(HttpToolsError::MissingArgument {
                tool: self.tool.name.clone(),
                name: name.to_string(),
            });
        }
        Ok(())
    }

    fn collect_query(&mut self, auth_query: Option<(&str, &str)>) {
        for name in self.tool.meta.query_params.keys() {
            match self.take(name) {
                Some(Value::Array(items)) => {
                    for item in items.iter().filter(|v| !v.is_null()) {
                        self.query
                            .push((name.clone(), Zeroizing::new(value_to_string(item))));
                    }
                }
                Some(value) => self
                    .query
                    .push((name.clone(), Zeroizing::new(value_to_string(&value)))),
                None => {}
            }
        }
        if let Some((name, value)) = auth_query {
            self.query
                .push((name.to_string(), Zeroizing::new(value.to_string())));
        }
    }

    fn collect_headers(&mut self) -> Result<()> {
        for name in self.tool.meta.header_params.keys() {
            let Some(value) = self.take(name) else {
                continue;
            };
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| {
                HttpToolsError::InvalidArguments(format!("invalid header parameter name '{name}'"))
            })?;
            let header_value = HeaderValue::from_str(&value_to_string(&value)).map_err(|_| {
                HttpToolsError::InvalidArguments(format!(
                    "value for header parameter '{name}' cannot be sent in a header"
                ))
            })?;
            self.headers.insert(header_name, header_value);
        }
        Ok(())
    }

    fn select_body(&mut self) -> Result<()> {
        if !carries_body(&self.tool.meta.http_method) {
            return self.reject_leftovers();
        }
        let payload = match self.tool.meta.body {
            Some(BodyShape::Raw) => {
                let payload = self.take(RAW_BODY_ARGUMENT);
                self.reject_leftovers()?;
                payload
            }
            Some(BodyShape::Fields) => Some(Value::Object(std::mem::take(&mut self.args))),
            None if self.args.is_empty() => None,
            None => Some(Value::Object(std::mem::take(&mut self.args))),
        };
        if let Some(payload) = payload {
            let bytes = serde_json::to_vec(&payload)
                .map_err(|e| HttpToolsError::InvalidArguments(format!("body: {e}")))?;
            self.body = Some(bytes);
        }
        Ok(())
    }

    fn reject_leftovers(&self) -> Result<()> {
        if self.args.is_empty() {
            return Ok(());
        }
        Err(HttpToolsError::UnexpectedArguments {
            tool: self.tool.name.clone(),
            names: self.args.keys().cloned().collect(),
        })
    }

    fn finish(self, inner: &ExecutorInner) -> Result<OutboundRequest> {
        let mut raw = Zeroizing::new(format!("{}{}", inner.base_url, self.path));
        let mut separator = if raw.contains('?') { '&' } else { '?' };
        for (name, value) in &self.query {
            raw.push(separator);
            raw.push_str(&encode_component(name));
            raw.push('=');
            raw.push_str(&Zeroizing::new(encode_component(value)));
            separator = '&';
        }
        let url = Url::parse(&raw)
            .map_err(|e| HttpToolsError::Config(format!("Invalid request URL: {e}")))?;
        check_url(&url)?;

        // Later sources win: defaults < header params < auth < Content-Type.
        let mut headers = inner.default_headers.clone();
        for (name, value) in &self.headers {
            headers.insert(name.clone(), value.clone());
        }
        for (name, value) in inner.auth.headers() {
            headers.insert(name.clone(), value.clone());
        }
        if self.body.is_some() {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }

        Ok(OutboundRequest {
            method: self.tool.meta.http_method.clone(),
            url,
            headers,
            body: self.body,
        })
    }
}

fn response_to_result(response: &HttpResponse) -> CallToolResult {
    let body = response.body_text();
    if response.is_success() {
        return CallToolResult::success(vec![Content::text(body)]);
    }
    CallToolResult {
        content: vec![
            Content::text(format!("HTTP {}", response.status)),
            Content::text(body),
        ],
        structured_content: None,
        is_error: Some(true),
        meta: None,
    }
}

fn error_result(error: &HttpToolsError) -> CallToolResult {
    CallToolResult {
        content: vec![Content::text(format!("{}: {error}", error.kind()))],
        structured_content: None,
        is_error: Some(true),
        meta: None,
    }
}

/// The name inside the first `{...}` still present in `path`, if any.
fn first_placeholder(path: &str) -> Option<&str> {
    let start = path.find('{')?;
    let rest = &path[start + 1..];
    let end = rest.find('}')?;
    Some(&rest[..end])
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Percent-encode everything except RFC 3986 unreserved characters. Space becomes `%20`.
fn encode_component(s: &str) -> String {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    let mut out = String::with_capacity(s.len());
    for &b in s.as_bytes() {
        if is_unreserved(b) {
            out.push(b as char);
        } else {
            out.push('%');
            out.push(HEX[(b >> 4) as usize] as char);
            out.push(HEX[(b & 0x0F) as usize] as char);
        }
    }
    out
}

fn is_unreserved(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~')
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => value.to_string(),
    }
}
