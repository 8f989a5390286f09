//! Schema translation: spec schema trees (as JSON) into [`SchemaNode`]s.
//!
//! Translation is total. Anything it does not understand is dropped, never rejected. Refs are
//! expected to be inlined beforehand (see [`crate::resolver::RefResolver::inline_schema`]).

use indexmap::IndexMap;
use serde_json::Value;
use specbridge_http_tools::schema::{SchemaKind, SchemaNode};

/// Translate a schema describing caller-supplied arguments.
#[must_use]
pub fn translate_input(schema: &Value) -> SchemaNode {
    translate(schema, false)
}

/// Translate a response schema. Every node is marked nullable.
#[must_use]
pub fn translate_output(schema: &Value) -> SchemaNode {
    translate(schema, true)
}

fn translate(schema: &Value, nullable: bool) -> SchemaNode {
    let Some(obj) = schema.as_object() else {
        return with_nullable(SchemaNode::string(), nullable);
    };

    let kind = match type_name(obj).as_str() {
        "object" => {
            let mut properties: IndexMap<String, SchemaNode> = IndexMap::new();
            if let Some(props) = obj.get("properties").and_then(Value::as_object) {
                for (name, prop) in props {
                    properties.insert(name.clone(), translate(prop, nullable));
                }
            }
            // Copied as declared: duplicates and names missing from `properties` included.
            let required = obj
                .get("required")
                .and_then(Value::as_array)
                .map(|names| {
                    names
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();
            SchemaKind::Object {
                properties,
                required,
            }
        }
        "array" => SchemaKind::Array {
            items: obj
                .get("items")
                .filter(|items| items.is_object())
                .map(|items| Box::new(translate(items, nullable))),
        },
        other => SchemaKind::Scalar(other.to_string()),
    };

    let mut node = SchemaNode::new(kind);
    node.description = obj
        .get("description")
        .and_then(Value::as_str)
        .map(str::to_string);
    node.format = obj.get("format").and_then(Value::as_str).map(str::to_string);
    node.enumeration = obj.get("enum").and_then(Value::as_array).cloned();
    with_nullable(node, nullable)
}

/// The declared `type`, or a guess from the shape when it is missing.
///
/// For type arrays (`["string", "null"]`) the first non-null entry wins. A schema with neither a
/// type nor an object or array shape is advertised as `string`.
fn type_name(obj: &serde_json::Map<String, Value>) -> String {
    match obj.get("type") {
        Some(Value::String(t)) => return t.clone(),
        Some(Value::Array(types)) => {
            if let Some(t) = types
                .iter()
                .filter_map(Value::as_str)
                .find(|t| *t != "null")
            {
                return t.to_string();
            }
        }
        _ => {}
    }
    if obj.contains_key("items") {
        "array".to_string()
    } else if ["properties", "additionalProperties", "required"]
        .iter()
        .any(|k| obj.contains_key(*k))
    {
        "object".to_string()
    } else {
        "string".to_string()
    }
}

fn with_nullable(mut node: SchemaNode, nullable: bool) -> SchemaNode {
    node.nullable = nullable;
    node
}
