use serde::Deserialize;
use serde_json::{json, Value};

use crate::errors::ModelError;
use crate::model::RestApiModel;

/// Paging information attached to a collection response. Immutable once parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Page {
    size: u64,
    total_elements: u64,
    total_pages: u64,
    number: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageJson {
    #[serde(default)]
    size: Option<u64>,
    #[serde(default)]
    total_elements: Option<u64>,
    #[serde(default)]
    total_pages: Option<u64>,
    #[serde(default)]
    number: Option<u64>,
}

impl Page {
    /// Number of elements on the current page.
    pub fn size(&self) -> u64 { self.size }
    /// Total number of elements available.
    pub fn total_elements(&self) -> u64 { self.total_elements }
    pub fn total_pages(&self) -> u64 { self.total_pages }
    /// Zero-based index of the current page.
    pub fn number(&self) -> u64 { self.number }

    pub fn is_last(&self) -> bool {
        self.number.saturating_add(1) >= self.total_pages
    }
}

impl RestApiModel for Page {
    fn from_json(json: &Value) -> Result<Self, ModelError> {
        if !json.is_object() {
            return Err(ModelError::not_an_object("Page", json));
        }
        let raw = PageJson::deserialize(json)
            .map_err(|e| ModelError::invalid("Page", e.to_string()))?;
        Ok(Self {
            size: raw.size.unwrap_or_default(),
            total_elements: raw.total_elements.unwrap_or_default(),
            total_pages: raw.total_pages.unwrap_or_default(),
            number: raw.number.unwrap_or_default(),
        })
    }

    fn to_json(&self) -> Value {
        json!({
            "size": self.size,
            "totalElements": self.total_elements,
            "totalPages": self.total_pages,
            "number": self.number,
        })
    }
}
