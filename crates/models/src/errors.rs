use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    #[error("{model}: expected a JSON object, found {found}")]
    NotAnObject { model: &'static str, found: String },
    #[error("{model}: invalid payload: {reason}")]
    Invalid { model: &'static str, reason: String },
}

impl ModelError {
    pub fn not_an_object(model: &'static str, found: &Value) -> Self {
        Self::NotAnObject { model, found: json_kind(found).to_string() }
    }

    pub fn invalid(model: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid { model, reason: reason.into() }
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
