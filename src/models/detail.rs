//! Full, unstructured posting content returned by a detail fetch.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{AppError, Result};

/// A bag of fields describing one posting in full.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct DetailDocument {
    fields: Map<String, Value>,
}

impl DetailDocument {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// String field, if present and a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl TryFrom<Value> for DetailDocument {
    type Error = AppError;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(AppError::validation(format!(
                "detail document must be an object, got {}",
                kind_of(&other)
            ))),
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_object_value() {
        let doc = DetailDocument::try_from(json!({"title": "Nurse"})).unwrap();
        assert_eq!(doc.get_str("title"), Some("Nurse"));
    }

    #[test]
    fn test_rejects_non_object_value() {
        let err = DetailDocument::try_from(json!(["a"])).unwrap_err();
        assert!(err.to_string().contains("got array"));
    }
}
