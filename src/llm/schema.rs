//! Strict output schemas for structured stages.
//!
//! A stage that emits structured data declares its fields once as an
//! [`OutputSchema`]; the schema is rendered into a JSON-schema response
//! format so the backend is asked to conform before we ever parse.

use serde_json::{json, Map, Value};

use super::client::ResponseFormat;

/// Declared type of a schema field.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaType {
    String,
    Integer,
    Number,
    Boolean,
    Array(Box<SchemaType>),
    Object(Vec<SchemaField>),
}

impl SchemaType {
    /// Array of `item`.
    pub fn array_of(item: SchemaType) -> Self {
        SchemaType::Array(Box::new(item))
    }

    fn to_json(&self) -> Value {
        match self {
            SchemaType::String => json!({"type": "string"}),
            SchemaType::Integer => json!({"type": "integer"}),
            SchemaType::Number => json!({"type": "number"}),
            SchemaType::Boolean => json!({"type": "boolean"}),
            SchemaType::Array(item) => json!({"type": "array", "items": item.to_json()}),
            SchemaType::Object(fields) => object_json(fields),
        }
    }
}

/// A named field of an object schema.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaField {
    pub name: String,
    pub field_type: SchemaType,
    pub required: bool,
}

impl SchemaField {
    /// A field the backend must always emit.
    pub fn required(name: impl Into<String>, field_type: SchemaType) -> Self {
        Self {
            name: name.into(),
            field_type,
            required: true,
        }
    }

    /// A field the backend may omit.
    pub fn optional(name: impl Into<String>, field_type: SchemaType) -> Self {
        Self {
            name: name.into(),
            field_type,
            required: false,
        }
    }
}

/// Top-level object schema for a stage's structured output.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSchema {
    name: String,
    fields: Vec<SchemaField>,
}

impl OutputSchema {
    pub fn new(name: impl Into<String>, fields: Vec<SchemaField>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[SchemaField] {
        &self.fields
    }

    /// Names of required top-level fields, in declaration order.
    pub fn required_fields(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name.as_str())
            .collect()
    }

    /// Render as a JSON schema document.
    pub fn to_json_schema(&self) -> Value {
        object_json(&self.fields)
    }

    /// Render as a strict response format for a generation request.
    pub fn response_format(&self) -> ResponseFormat {
        ResponseFormat::json_schema(self.name.clone(), self.to_json_schema())
    }
}

fn object_json(fields: &[SchemaField]) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();
    for field in fields {
        properties.insert(field.name.clone(), field.field_type.to_json());
        if field.required {
            required.push(Value::String(field.name.clone()));
        }
    }

    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}
