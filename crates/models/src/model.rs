//! Base contract of every backend resource model.

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Serializer, Value};

use crate::errors::ModelError;

/// JSON.stringify caps indentation at ten spaces; so do we.
const MAX_INDENT: usize = 10;

pub trait RestApiModel: Sized {
    /// Builds an instance from a raw backend JSON value.
    ///
    /// An `Err` means the value does not describe an instance at all; collection
    /// parsing drops such items instead of failing.
    fn from_json(json: &Value) -> Result<Self, ModelError>;

    /// Plain serializable form. Not guaranteed to match the backend's wire shape.
    fn to_json(&self) -> Value;

    /// `to_json` rendered as a string, indented by `space` spaces when given.
    fn to_json_string(&self, space: Option<usize>) -> String {
        stringify(&self.to_json(), space)
    }

    /// Serializes a collection, preserving order.
    fn collection_to_json(collection: &[Self]) -> Vec<Value> {
        collection.iter().map(Self::to_json).collect()
    }
}

/// Resources delivered inside the `_embedded.<name>` block of a collection envelope.
pub trait EmbeddedResource {
    const RESOURCE_NAME: &'static str;
}

pub fn stringify(value: &Value, space: Option<usize>) -> String {
    let indent = match space {
        Some(n) if n > 0 => " ".repeat(n.min(MAX_INDENT)),
        _ => return value.to_string(),
    };
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(indent.as_bytes());
    let mut ser = Serializer::with_formatter(&mut buf, formatter);
    if value.serialize(&mut ser).is_err() {
        return value.to_string();
    }
    String::from_utf8(buf).unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn stringify_compact_by_default() {
        let v = json!({"a": 1, "b": [true]});
        assert_eq!(stringify(&v, None), r#"{"a":1,"b":[true]}"#);
        assert_eq!(stringify(&v, Some(0)), r#"{"a":1,"b":[true]}"#);
    }

    #[test]
    fn stringify_indents_with_spaces() {
        let v = json!({"a": 1});
        assert_eq!(stringify(&v, Some(2)), "{\n  \"a\": 1\n}");
        assert_eq!(stringify(&v, Some(40)), format!("{{\n{}\"a\": 1\n}}", " ".repeat(10)));
    }
}
