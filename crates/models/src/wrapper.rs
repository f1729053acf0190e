//! Generic paginated collection envelope.
//!
//! Collection parsing is best-effort: a record that fails to parse is dropped and
//! counted, the rest of the page is still returned.

use std::any::type_name;

use serde_json::{json, Map, Value};
use tracing::warn;

use crate::errors::{json_kind, ModelError};
use crate::model::{EmbeddedResource, RestApiModel};
use crate::page::Page;

/// Result of parsing one element of a collection.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome<T> {
    Parsed(T),
    Dropped(String),
}

impl<T> ItemOutcome<T> {
    pub fn into_parsed(self) -> Option<T> {
        match self {
            Self::Parsed(item) => Some(item),
            Self::Dropped(_) => None,
        }
    }
}

impl<T> From<Result<T, ModelError>> for ItemOutcome<T> {
    fn from(result: Result<T, ModelError>) -> Self {
        match result {
            Ok(item) => Self::Parsed(item),
            Err(e) => Self::Dropped(e.to_string()),
        }
    }
}

/// Ordered items plus optional paging. Populated once at parse time.
#[derive(Debug, Clone, PartialEq)]
pub struct RestApiWrapper<T> {
    items: Vec<T>,
    page: Option<Page>,
    dropped: usize,
}

impl<T> Default for RestApiWrapper<T> {
    fn default() -> Self {
        Self { items: Vec::new(), page: None, dropped: 0 }
    }
}

impl<T> RestApiWrapper<T> {
    pub fn items(&self) -> &[T] { &self.items }
    pub fn into_items(self) -> Vec<T> { self.items }
    pub fn page(&self) -> Option<&Page> { self.page.as_ref() }

    /// Number of raw records that could not be parsed and were left out of `items`.
    pub fn dropped(&self) -> usize { self.dropped }

    pub fn len(&self) -> usize { self.items.len() }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }
    pub fn iter(&self) -> std::slice::Iter<'_, T> { self.items.iter() }

    /// First item of a non-empty collection.
    pub fn first_item(&self) -> Option<&T> {
        self.items.first()
    }
}

impl<T: RestApiModel> RestApiWrapper<T> {
    /// Builds a wrapper from a raw item array and an optional raw page block.
    ///
    /// Never fails. Items rejected by `item_factory` are dropped and counted; a
    /// non-array item payload or an unreadable page block is logged and skipped.
    pub fn wrapper_from_json<F>(
        mut item_factory: F,
        raw_items: Option<&Value>,
        raw_page: Option<&Value>,
    ) -> Self
    where
        F: FnMut(&Value) -> Result<T, ModelError>,
    {
        let mut wrapper = Self::default();

        match raw_items {
            None | Some(Value::Null) => {}
            Some(Value::Array(elements)) => {
                for (index, element) in elements.iter().enumerate() {
                    match ItemOutcome::from(item_factory(element)) {
                        ItemOutcome::Parsed(item) => wrapper.items.push(item),
                        ItemOutcome::Dropped(reason) => {
                            warn!(
                                item_type = type_name::<T>(),
                                index,
                                %reason,
                                payload = %element,
                                "dropped record while parsing collection"
                            );
                            wrapper.dropped += 1;
                        }
                    }
                }
            }
            Some(other) => {
                warn!(
                    wrapper_type = type_name::<Self>(),
                    item_type = type_name::<T>(),
                    found = json_kind(other),
                    payload = %other,
                    "error parsing json: items are not an array"
                );
            }
        }

        wrapper.page = match raw_page {
            None | Some(Value::Null) => None,
            Some(raw) => match Page::from_json(raw) {
                Ok(page) => Some(page),
                Err(e) => {
                    warn!(
                        wrapper_type = type_name::<Self>(),
                        error = %e,
                        payload = %raw,
                        "error parsing json: page block ignored"
                    );
                    None
                }
            },
        };

        wrapper
    }

    /// Reads `_embedded.<resource_name>` and `page` from a backend envelope.
    pub fn from_embedded<F>(
        envelope: &Map<String, Value>,
        resource_name: &str,
        item_factory: F,
    ) -> Self
    where
        F: FnMut(&Value) -> Result<T, ModelError>,
    {
        let raw_items = envelope
            .get("_embedded")
            .and_then(|embedded| embedded.get(resource_name));
        if raw_items.is_none() {
            warn!(
                item_type = type_name::<T>(),
                resource_name,
                "envelope carries no embedded items"
            );
        }
        Self::wrapper_from_json(item_factory, raw_items, envelope.get("page"))
    }
}

impl<T: RestApiModel + EmbeddedResource> RestApiWrapper<T> {
    /// Like `from_json`, with a custom item factory (e.g. one applying defaults).
    pub fn from_json_with<F>(json: &Value, item_factory: F) -> Result<Self, ModelError>
    where
        F: FnMut(&Value) -> Result<T, ModelError>,
    {
        let envelope = json
            .as_object()
            .ok_or_else(|| ModelError::not_an_object(type_name::<Self>(), json))?;
        Ok(Self::from_embedded(envelope, T::RESOURCE_NAME, item_factory))
    }
}

impl<T: RestApiModel + EmbeddedResource> RestApiModel for RestApiWrapper<T> {
    fn from_json(json: &Value) -> Result<Self, ModelError> {
        Self::from_json_with(json, T::from_json)
    }

    /// `{ "items": [...], "page": {...} }`; not the backend envelope shape.
    fn to_json(&self) -> Value {
        let mut result = json!({ "items": T::collection_to_json(&self.items) });
        if let (Some(page), Some(map)) = (&self.page, result.as_object_mut()) {
            map.insert("page".into(), page.to_json());
        }
        result
    }
}
