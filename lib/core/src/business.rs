use crate::geo::Coordinate;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Passthrough keys that never leave the core in query results
pub const HIDDEN_PASSTHROUGH_FIELDS: &[&str] = &["is_open", "attributes", "hours"];

/// A business record with its raw fields and batch-derived fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Business {
    pub id: String,
    pub name: String,
    pub coordinate: Coordinate,
    /// Raw delimited category string, e.g. "Pizza, Italian"
    #[serde(default)]
    pub categories: Option<String>,
    #[serde(default)]
    pub category_set: Option<BTreeSet<String>>,
    #[serde(default)]
    pub review_count: Option<u32>,
    #[serde(default)]
    pub average_adjusted_score: Option<f64>,
    #[serde(default)]
    pub credibility_score: Option<f64>,
    /// Everything else (address, city, hours, ...), kept for display
    #[serde(flatten)]
    pub passthrough: Map<String, Value>,
}

impl Business {
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, coordinate: Coordinate) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            coordinate,
            categories: None,
            category_set: None,
            review_count: None,
            average_adjusted_score: None,
            credibility_score: None,
            passthrough: Map::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn with_categories(mut self, categories: impl Into<String>) -> Self {
        self.categories = Some(categories.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.passthrough.insert(key.into(), value);
        self
    }

    /// Drop every derived field so the batch stages start from raw data
    pub fn clear_derived(&mut self) {
        self.category_set = None;
        self.review_count = None;
        self.average_adjusted_score = None;
        self.credibility_score = None;
    }

    pub fn category_set(&self) -> Result<&BTreeSet<String>> {
        self.category_set
            .as_ref()
            .ok_or_else(|| Error::missing_field(&self.id, "category_set"))
    }

    /// Credibility after aggregation; `None` means the business has no reviews.
    pub fn credibility(&self) -> Result<Option<f64>> {
        match self.review_count {
            None => Err(Error::missing_field(&self.id, "credibility_score")),
            Some(0) => Ok(None),
            Some(_) => self
                .credibility_score
                .map(Some)
                .ok_or_else(|| Error::missing_field(&self.id, "credibility_score")),
        }
    }

    /// Passthrough fields minus the internal ones
    pub fn display_fields(&self) -> Map<String, Value> {
        self.passthrough
            .iter()
            .filter(|(key, _)| !HIDDEN_PASSTHROUGH_FIELDS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}
