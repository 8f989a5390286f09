//! Structural schema descriptors shared by compiled tools.
//!
//! A [`SchemaNode`] is a small, typed subset of JSON Schema: enough to describe tool arguments and
//! responses to a caller, without trying to be a validator.

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

/// One node of a schema tree.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaNode {
    pub kind: SchemaKind,
    pub description: Option<String>,
    pub format: Option<String>,
    pub enumeration: Option<Vec<Value>>,
    /// Response schemas mark every node nullable; argument schemas never do.
    pub nullable: bool,
}

/// The `type` discriminant. `properties`/`required` only exist on objects and `items` only on
/// arrays.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaKind {
    Object {
        properties: IndexMap<String, SchemaNode>,
        required: Vec<String>,
    },
    Array {
        items: Option<Box<SchemaNode>>,
    },
    /// `string`, `integer`, `number`, `boolean`, or any type name we do not interpret.
    Scalar(String),
}

impl SchemaNode {
    #[must_use]
    pub fn new(kind: SchemaKind) -> Self {
        Self {
            kind,
            description: None,
            format: None,
            enumeration: None,
            nullable: false,
        }
    }

    #[must_use]
    pub fn scalar(type_name: impl Into<String>) -> Self {
        Self::new(SchemaKind::Scalar(type_name.into()))
    }

    #[must_use]
    pub fn string() -> Self {
        Self::scalar("string")
    }

    #[must_use]
    pub fn object(properties: IndexMap<String, SchemaNode>, required: Vec<String>) -> Self {
        Self::new(SchemaKind::Object {
            properties,
            required,
        })
    }

    #[must_use]
    pub fn array(items: Option<SchemaNode>) -> Self {
        Self::new(SchemaKind::Array {
            items: items.map(Box::new),
        })
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn type_name(&self) -> &str {
        match &self.kind {
            SchemaKind::Object { .. } => "object",
            SchemaKind::Array { .. } => "array",
            SchemaKind::Scalar(t) => t,
        }
    }

    #[must_use]
    pub fn properties(&self) -> Option<&IndexMap<String, SchemaNode>> {
        match &self.kind {
            SchemaKind::Object { properties, .. } => Some(properties),
            _ => None,
        }
    }

    #[must_use]
    pub fn required(&self) -> &[String] {
        match &self.kind {
            SchemaKind::Object { required, .. } => required,
            _ => &[],
        }
    }

    #[must_use]
    pub fn items(&self) -> Option<&SchemaNode> {
        match &self.kind {
            SchemaKind::Array { items } => items.as_deref(),
            _ => None,
        }
    }

    /// Render as a JSON Schema value.
    #[must_use]
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl Serialize for SchemaNode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        if self.nullable {
            map.serialize_entry("type", &[self.type_name(), "null"])?;
        } else {
            map.serialize_entry("type", self.type_name())?;
        }
        if let Some(description) = &self.description {
            map.serialize_entry("description", description)?;
        }
        if let Some(format) = &self.format {
            map.serialize_entry("format", format)?;
        }
        if let Some(values) = &self.enumeration {
            map.serialize_entry("enum", values)?;
        }
        match &self.kind {
            SchemaKind::Object {
                properties,
                required,
            } => {
                if !properties.is_empty() {
                    map.serialize_entry("properties", properties)?;
                }
                if !required.is_empty() {
                    map.serialize_entry("required", required)?;
                }
            }
            SchemaKind::Array { items: Some(items) } => {
                map.serialize_entry("items", items)?;
            }
            SchemaKind::Array { items: None } | SchemaKind::Scalar(_) => {}
        }
        map.end()
    }
}
