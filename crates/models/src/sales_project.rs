use std::fmt;

use chrono::{DateTime, Utc};
use common::rest_api_helper::{convert_date_to_string, convert_string_to_date};
use serde_json::{Map, Value};
use tracing::debug;

use crate::errors::{json_kind, ModelError};
use crate::model::{EmbeddedResource, RestApiModel};
use crate::wrapper::RestApiWrapper;

/// A sales engagement grouping the lead offers made to one customer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SalesProject {
    id: Option<String>,
    created_date: Option<DateTime<Utc>>,
    date_ordered: Option<DateTime<Utc>>,
    last_modified_date: Option<DateTime<Utc>>,
    ordered_by: Option<String>,
    ordered_offer_id: Option<String>,
    sales_project_number: Option<i64>,
    /// Number of the related lead.
    pub lead_number: Option<i64>,
    /// Identifiers of the related lead offers.
    pub offer_ids: Vec<String>,
    pub project_name: String,
    /// Number of the responsible salesman.
    pub salesman_number: Option<i64>,
}

pub type SalesProjectWrapper = RestApiWrapper<SalesProject>;

impl SalesProject {
    pub fn new(
        id: Option<String>,
        created_date: Option<DateTime<Utc>>,
        date_ordered: Option<DateTime<Utc>>,
        last_modified_date: Option<DateTime<Utc>>,
        ordered_by: Option<String>,
        ordered_offer_id: Option<String>,
        sales_project_number: Option<i64>,
    ) -> Self {
        Self {
            id,
            created_date,
            date_ordered,
            last_modified_date,
            ordered_by,
            ordered_offer_id,
            sales_project_number,
            ..Self::default()
        }
    }

    /// New project not yet known to the backend.
    pub fn draft(project_name: impl Into<String>) -> Self {
        Self { project_name: project_name.into(), ..Self::default() }
    }

    pub fn id(&self) -> Option<&str> { self.id.as_deref() }
    pub fn created_date(&self) -> Option<&DateTime<Utc>> { self.created_date.as_ref() }
    pub fn date_ordered(&self) -> Option<&DateTime<Utc>> { self.date_ordered.as_ref() }
    pub fn last_modified_date(&self) -> Option<&DateTime<Utc>> { self.last_modified_date.as_ref() }
    pub fn ordered_by(&self) -> Option<&str> { self.ordered_by.as_deref() }
    pub fn ordered_offer_id(&self) -> Option<&str> { self.ordered_offer_id.as_deref() }
    pub fn sales_project_number(&self) -> Option<i64> { self.sales_project_number }

    pub fn is_ordered(&self) -> bool {
        self.ordered_offer_id.is_some()
    }

    pub fn contains_offer_by_id(&self, offer_id: &str) -> bool {
        self.offer_ids.iter().any(|id| id == offer_id)
    }

    /// Copy made by serializing and parsing again; only what `to_json` emits survives.
    pub fn clone_project(&self) -> Self {
        Self::from_object(&self.to_object())
    }

    fn from_object(obj: &Map<String, Value>) -> Self {
        let date = |key: &str| Some(convert_string_to_date(obj.get(key).and_then(Value::as_str)));
        let text = |key: &str| obj.get(key).and_then(Value::as_str).map(str::to_string);

        let mut instance = Self::new(
            text("id"),
            date("createdDate"),
            date("dateOrdered"),
            date("lastModifiedDate"),
            text("orderedBy"),
            text("orderedOfferId"),
            integer(obj.get("salesProjectNumber")).ok().flatten(),
        );

        let issues = instance.assign_mutable_fields(obj);
        if !issues.is_empty() {
            debug!(
                id = ?instance.id,
                ?issues,
                "error parsing SalesProject; kept defaults for some fields"
            );
        }
        instance
    }

    /// Assigns each mutable field independently; a field of the wrong type keeps its default.
    fn assign_mutable_fields(&mut self, obj: &Map<String, Value>) -> Vec<String> {
        let mut issues = Vec::new();

        match integer(obj.get("leadNumber")) {
            Ok(value) => self.lead_number = value,
            Err(found) => issues.push(format!("leadNumber: {found}")),
        }
        match integer(obj.get("salesmanNumber")) {
            Ok(value) => self.salesman_number = value,
            Err(found) => issues.push(format!("salesmanNumber: {found}")),
        }
        match obj.get("projectName") {
            None | Some(Value::Null) => {}
            Some(Value::String(name)) => self.project_name = name.clone(),
            Some(other) => issues.push(format!("projectName: {}", json_kind(other))),
        }
        match obj.get("offerIds") {
            None | Some(Value::Null) => {}
            Some(Value::Array(ids)) => {
                let parsed: Option<Vec<String>> =
                    ids.iter().map(|id| id.as_str().map(str::to_string)).collect();
                match parsed {
                    Some(ids) => self.offer_ids = ids,
                    None => issues.push("offerIds: non-string element".to_string()),
                }
            }
            Some(other) => issues.push(format!("offerIds: {}", json_kind(other))),
        }

        issues
    }

    fn to_object(&self) -> Map<String, Value> {
        let date = |d: &Option<DateTime<Utc>>| {
            convert_date_to_string(d.as_ref()).map_or(Value::Null, Value::String)
        };
        let mut map = Map::new();
        map.insert("createdDate".into(), date(&self.created_date));
        map.insert("dateOrdered".into(), date(&self.date_ordered));
        map.insert("id".into(), self.id.clone().into());
        map.insert("lastModifiedDate".into(), date(&self.last_modified_date));
        map.insert("leadNumber".into(), self.lead_number.into());
        map.insert("offerIds".into(), self.offer_ids.clone().into());
        map.insert("orderedBy".into(), self.ordered_by.clone().into());
        map.insert("orderedOfferId".into(), self.ordered_offer_id.clone().into());
        map.insert("projectName".into(), self.project_name.clone().into());
        map.insert("salesmanNumber".into(), self.salesman_number.into());
        map.insert("salesProjectNumber".into(), self.sales_project_number.into());
        map
    }
}

/// `i64::MAX as f64` rounds up to 2^63, which is already out of range.
fn in_i64_range(f: f64) -> bool {
    f >= i64::MIN as f64 && f < i64::MAX as f64
}

/// Missing or null is `Ok(None)`; integral numbers (also `5.0`) are accepted.
fn integer(value: Option<&Value>) -> Result<Option<i64>, &'static str> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && in_i64_range(*f))
                    .map(|f| f as i64)
            })
            .map(Some)
            .ok_or("number is not an integer"),
        Some(other) => Err(json_kind(other)),
    }
}

impl RestApiModel for SalesProject {
    fn from_json(json: &Value) -> Result<Self, ModelError> {
        json.as_object()
            .map(Self::from_object)
            .ok_or_else(|| ModelError::not_an_object("SalesProject", json))
    }

    fn to_json(&self) -> Value {
        Value::Object(self.to_object())
    }
}

impl EmbeddedResource for SalesProject {
    const RESOURCE_NAME: &'static str = "salesProjects";
}

impl fmt::Display for SalesProject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_json_string(None))
    }
}
