// src/row.rs - ordered field/value rows and the NDJSON boundary

use serde_json::{Map, Value};

/// Name of the implicit primary message field.
pub const MSG_FIELD: &str = "_msg";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub value: String,
}

impl Field {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Field {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// An ordered sequence of fields. Names are not required to be unique;
/// lookups by name take the first match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    pub fields: Vec<Field>,
}

impl Row {
    pub fn new(fields: Vec<Field>) -> Self {
        Row { fields }
    }

    /// A row carrying a single `_msg` field, for plain-line input.
    pub fn from_line(line: &str) -> Self {
        Row {
            fields: vec![Field::new(MSG_FIELD, line)],
        }
    }

    /// Value of the first field with this name, or "" when absent.
    /// Absent and empty fields are indistinguishable to readers.
    pub fn get(&self, name: &str) -> &str {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
            .unwrap_or("")
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    /// Replace the value of the first field with this name in place, or
    /// append the field when absent. Never reorders existing fields.
    pub fn set(&mut self, name: &str, value: String) {
        match self.fields.iter_mut().find(|f| f.name == name) {
            Some(field) => field.value = value,
            None => self.fields.push(Field::new(name, value)),
        }
    }

    /// Drop every field with this name.
    pub fn remove(&mut self, name: &str) {
        self.fields.retain(|f| f.name != name);
    }

    /// Build a row from one NDJSON object, preserving key order. Scalars
    /// are stringified, null becomes "", nested values keep their compact
    /// JSON text.
    pub fn from_json(value: &Value) -> Result<Self, String> {
        let obj = value
            .as_object()
            .ok_or_else(|| format!("expected a JSON object, got {}", json_kind(value)))?;
        let fields = obj
            .iter()
            .map(|(name, v)| Field::new(name.clone(), json_field_value(v)))
            .collect();
        Ok(Row { fields })
    }

    /// Render the row as a JSON object, key order following field order.
    /// On duplicate names the first value wins, matching `get`.
    pub fn to_json(&self) -> Value {
        let mut obj = Map::with_capacity(self.fields.len());
        for field in &self.fields {
            if !obj.contains_key(&field.name) {
                obj.insert(field.name.clone(), Value::String(field.value.clone()));
            }
        }
        Value::Object(obj)
    }
}

fn json_field_value(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        nested => nested.to_string(),
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a bool",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
