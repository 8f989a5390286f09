//! Loading specification documents from files or URLs.
//!
//! Documents are parsed with `serde_yaml` (JSON is a YAML subset) and converted into a
//! `serde_json::Value` tree. Map keys are stringified during conversion, so unquoted response codes
//! such as `200:` become `"200"`.

use crate::config::{HashPolicy, SpecSource};
use crate::error::{OpenApiToolsError, Result};
use reqwest::Method;
use reqwest::header::HeaderMap;
use serde_json::{Map, Value};
use sha2::{Digest as _, Sha256};
use specbridge_http_tools::transport::{OutboundRequest, Transport};
use tracing::{info, warn};
use url::Url;

/// A parsed document and where it came from.
#[derive(Debug, Clone)]
pub struct LoadedSpec {
    pub location: String,
    /// `sha256:<hex>` of the raw text.
    pub hash: String,
    pub document: Value,
}

/// Load, verify, and parse the document named by `source`.
///
/// URLs are fetched through `transport`, so the runtime's timeouts and size cap apply.
///
/// # Errors
///
/// Returns a spec-source error if the document cannot be read or fetched, if the hash does not
/// match under [`HashPolicy::Fail`], or if the text is not valid YAML/JSON.
pub async fn load_spec(source: &SpecSource, transport: &dyn Transport) -> Result<LoadedSpec> {
    let text = if source.is_url() {
        info!(spec = %source.spec, "Fetching spec");
        fetch_text(&source.spec, transport).await?
    } else {
        info!(spec = %source.spec, "Loading spec");
        std::fs::read_to_string(&source.spec).map_err(|e| OpenApiToolsError::SpecReadFile {
            path: source.spec.clone(),
            source: e,
        })?
    };

    let hash = spec_hash(&text);
    verify_hash(source, &hash)?;

    let document = parse_document(&text, &source.spec)?;
    Ok(LoadedSpec {
        location: source.spec.clone(),
        hash,
        document,
    })
}

async fn fetch_text(location: &str, transport: &dyn Transport) -> Result<String> {
    let url = Url::parse(location).map_err(|e| OpenApiToolsError::SpecFetch {
        url: location.to_string(),
        message: format!("invalid URL: {e}"),
    })?;
    let response = transport
        .send(OutboundRequest {
            method: Method::GET,
            url,
            headers: HeaderMap::new(),
            body: None,
        })
        .await
        .map_err(|e| OpenApiToolsError::SpecFetch {
            url: location.to_string(),
            message: e.to_string(),
        })?;
    if !response.is_success() {
        return Err(OpenApiToolsError::SpecFetch {
            url: location.to_string(),
            message: format!("HTTP {}", response.status),
        });
    }
    String::from_utf8(response.body).map_err(|_| OpenApiToolsError::SpecFetch {
        url: location.to_string(),
        message: "response body is not valid UTF-8".to_string(),
    })
}

/// `sha256:<hex>` of `text`.
#[must_use]
pub fn spec_hash(text: &str) -> String {
    format!("sha256:{}", hex::encode(Sha256::digest(text.as_bytes())))
}

fn verify_hash(source: &SpecSource, actual: &str) -> Result<()> {
    let Some(expected) = &source.spec_hash else {
        return Ok(());
    };
    if expected.eq_ignore_ascii_case(actual) {
        return Ok(());
    }
    match source.spec_hash_policy {
        HashPolicy::Fail => Err(OpenApiToolsError::SpecHashMismatch {
            location: source.spec.clone(),
            expected: expected.clone(),
            actual: actual.to_string(),
        }),
        HashPolicy::Warn => {
            warn!(
                spec = %source.spec,
                expected = %expected,
                actual = %actual,
                "Spec hash mismatch"
            );
            Ok(())
        }
        HashPolicy::Ignore => Ok(()),
    }
}

/// Parse YAML or JSON text into a JSON tree.
///
/// # Errors
///
/// Returns [`OpenApiToolsError::SpecParse`] if the text is not valid YAML/JSON.
pub fn parse_document(text: &str, location: &str) -> Result<Value> {
    let yaml: serde_yaml::Value =
        serde_yaml::from_str(text).map_err(|e| OpenApiToolsError::SpecParse {
            location: location.to_string(),
            source: e,
        })?;
    Ok(yaml_to_json(yaml))
}

fn yaml_to_json(value: serde_yaml::Value) -> Value {
    use serde_yaml::Value as Y;
    match value {
        Y::Null => Value::Null,
        Y::Bool(b) => Value::Bool(b),
        Y::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                n.as_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map_or(Value::Null, Value::Number)
            }
        }
        Y::String(s) => Value::String(s),
        Y::Sequence(items) => Value::Array(items.into_iter().map(yaml_to_json).collect()),
        Y::Mapping(map) => {
            let mut out = Map::with_capacity(map.len());
            for (k, v) in map {
                out.insert(key_to_string(k), yaml_to_json(v));
            }
            Value::Object(out)
        }
        Y::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

fn key_to_string(key: serde_yaml::Value) -> String {
    use serde_yaml::Value as Y;
    match key {
        Y::String(s) => s,
        Y::Bool(b) => b.to_string(),
        Y::Number(n) => n.to_string(),
        Y::Null => "null".to_string(),
        other => serde_json::to_string(&yaml_to_json(other)).unwrap_or_default(),
    }
}
