use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// Where the specification document lives, and how it is pinned.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecSource {
    /// Spec location (file path or http(s) URL).
    pub spec: String,

    /// Optional `sha256:<hex>` of the raw document text.
    #[serde(default)]
    pub spec_hash: Option<String>,

    /// Hash policy: warn, fail, or ignore.
    #[serde(default)]
    pub spec_hash_policy: HashPolicy,
}

impl SpecSource {
    #[must_use]
    pub fn new(spec: impl Into<String>) -> Self {
        Self {
            spec: spec.into(),
            spec_hash: None,
            spec_hash_policy: HashPolicy::default(),
        }
    }

    #[must_use]
    pub fn is_url(&self) -> bool {
        is_http_location(&self.spec)
    }
}

pub(crate) fn is_http_location(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

/// Hash verification policy.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HashPolicy {
    /// Log warning if hash doesn't match.
    #[default]
    Warn,
    /// Fail loading if hash doesn't match.
    Fail,
    /// Ignore hash verification.
    Ignore,
}

/// Operator corrections applied once while compiling.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ToolOverridePolicy {
    /// When non-empty, only these (resolved) tool names survive.
    pub include_only: HashSet<String>,
    /// Tool names to drop. Applied after `includeOnly`.
    pub exclude: HashSet<String>,
    /// Per-tool field replacements, keyed by resolved tool name.
    pub tools: IndexMap<String, ToolOverride>,
}

/// Replacement values for one tool. Each present field replaces the compiled value entirely.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ToolOverride {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// A JSON Schema object.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<Value>,
}
