//! Local `$ref` resolver.
//!
//! Only same-document references (`#/...`) are followed. References into other files or URLs are
//! left in place and translate as unknown nodes.
//!
//! Two entry points:
//! - [`RefResolver::resolve`] follows a chain of refs for one object (path item, parameter, body,
//!   response) and fails on cycles or dangling pointers.
//! - [`RefResolver::inline_schema`] recursively inlines refs inside a schema tree. Self-referential
//!   schemas are cut at the cycle and replaced by a schema carrying only the target's `type`.

use crate::error::{OpenApiToolsError, Result};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy)]
pub struct RefResolver<'a> {
    root: &'a Value,
}

impl<'a> RefResolver<'a> {
    #[must_use]
    pub fn new(root: &'a Value) -> Self {
        Self { root }
    }

    /// Follow `$ref`s starting at `value` until a non-reference object is reached.
    ///
    /// # Errors
    ///
    /// Returns [`OpenApiToolsError::Reference`] for external, dangling, or cyclic references.
    pub fn resolve<'v>(&self, value: &'v Value) -> Result<&'v Value>
    where
        'a: 'v,
    {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut cur = value;
        while let Some(reference) = ref_of(cur) {
            if !seen.insert(reference) {
                return Err(OpenApiToolsError::Reference {
                    reference: reference.to_string(),
                    reason: "cyclic $ref".to_string(),
                });
            }
            cur = self.lookup(reference)?;
        }
        Ok(cur)
    }

    /// Resolve `value` and deserialize the target as `T`.
    ///
    /// # Errors
    ///
    /// Returns an error if resolution fails or the target does not have the shape of `T`.
    pub fn resolve_as<T: DeserializeOwned>(&self, value: &Value) -> Result<T> {
        let target = self.resolve(value)?;
        serde_json::from_value(target.clone()).map_err(OpenApiToolsError::from)
    }

    /// Look up one local reference (`#/a/b`) in the root document.
    ///
    /// # Errors
    ///
    /// Returns [`OpenApiToolsError::Reference`] if the reference is not local or the pointer does
    /// not exist.
    pub fn lookup(&self, reference: &str) -> Result<&'a Value> {
        let pointer = parse_ref(reference)?;
        self.root
            .pointer(&pointer)
            .ok_or_else(|| OpenApiToolsError::Reference {
                reference: reference.to_string(),
                reason: format!("missing pointer '{pointer}'"),
            })
    }

    /// Return `schema` with every resolvable local `$ref` inlined.
    ///
    /// Unresolvable and external refs are kept as `{"$ref": ...}`. A ref that points back into
    /// its own expansion becomes `{"type": <target type>}`, or `{}` when the target has none.
    #[must_use]
    pub fn inline_schema(&self, schema: &Value) -> Value {
        let mut active: Vec<String> = Vec::new();
        self.inline(schema, &mut active)
    }

    fn inline(&self, value: &Value, active: &mut Vec<String>) -> Value {
        match value {
            Value::Object(map) => {
                if let Some(reference) = ref_of(value) {
                    let Ok(target) = self.lookup(reference) else {
                        return value.clone();
                    };
                    if active.iter().any(|r| r == reference) {
                        return cycle_stub(target);
                    }
                    active.push(reference.to_string());
                    let out = self.inline(target, active);
                    active.pop();
                    return out;
                }
                let mut out = Map::with_capacity(map.len());
                for (k, v) in map {
                    out.insert(k.clone(), self.inline(v, active));
                }
                Value::Object(out)
            }
            Value::Array(items) => {
                Value::Array(items.iter().map(|v| self.inline(v, active)).collect())
            }
            other => other.clone(),
        }
    }
}

fn cycle_stub(target: &Value) -> Value {
    let mut stub = Map::new();
    if let Some(t) = target.get("type") {
        stub.insert("type".to_string(), t.clone());
    }
    Value::Object(stub)
}

fn ref_of(value: &Value) -> Option<&str> {
    value.as_object()?.get("$ref")?.as_str()
}

fn parse_ref(reference: &str) -> Result<String> {
    let Some(fragment) = reference.strip_prefix('#') else {
        return Err(OpenApiToolsError::Reference {
            reference: reference.to_string(),
            reason: "only local references ('#/...') are supported".to_string(),
        });
    };
    if fragment.is_empty() {
        return Ok(String::new());
    }
    if !fragment.starts_with('/') {
        return Err(OpenApiToolsError::Reference {
            reference: reference.to_string(),
            reason: "expected a JSON pointer starting with '/'".to_string(),
        });
    }
    // URI fragments may percent-encode pointer characters (e.g. `%7B` in path keys).
    Ok(urlencoding::decode(fragment).map_or_else(|_| fragment.to_string(), |d| d.into_owned()))
}
