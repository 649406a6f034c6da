use std::cmp::Ordering;
use std::fmt;

use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Customers,
    Orders,
    Predictions,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Customers => "customers",
            Self::Orders => "orders",
            Self::Predictions => "predictions",
        }
    }

    /// Resource path relative to the API base URL.
    pub fn resource_path(&self) -> &'static str {
        match self {
            Self::Customers => "Customer",
            Self::Orders => "Order",
            Self::Predictions => "Customer/sales-prediction",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single sortable/searchable field value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Number(Decimal),
}

impl FieldValue {
    pub fn text(value: &Option<String>) -> Option<Self> {
        value.as_ref().map(|value| Self::Text(value.clone()))
    }

    pub fn number(value: impl Into<Decimal>) -> Option<Self> {
        Some(Self::Number(value.into()))
    }

    /// Empty strings count as missing for sorting.
    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Text(value) if value.is_empty())
    }

    pub fn as_search_text(&self) -> String {
        match self {
            Self::Text(value) => value.clone(),
            Self::Number(value) => value.normalize().to_string(),
        }
    }

    pub fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(left), Self::Number(right)) => left.cmp(right),
            (Self::Text(left), Self::Text(right)) => left.cmp(right),
            (Self::Number(_), Self::Text(_)) => Ordering::Less,
            (Self::Text(_), Self::Number(_)) => Ordering::Greater,
        }
    }
}

/// An entity the fallback dataset can hold, search, sort and identify.
pub trait Record: Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static {
    const KIND: EntityKind;

    /// Fields matched by free-text search, by wire name.
    const SEARCH_FIELDS: &'static [&'static str];

    fn id(&self) -> i64;

    fn set_id(&mut self, id: i64);

    /// Looks up a field by its wire name (case-insensitive).
    fn field(&self, name: &str) -> Option<FieldValue>;
}
