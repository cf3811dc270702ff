use std::{collections::BTreeMap, fmt, str::FromStr};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub i64);
    };
}

id_newtype!(ItemId);
id_newtype!(PivotId);

pub const DEFAULT_PER_PAGE: u32 = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDir {
    Asc,
    #[default]
    Desc,
}

impl SortDir {
    pub fn as_str(self) -> &'static str {
        match self {
            SortDir::Asc => "asc",
            SortDir::Desc => "desc",
        }
    }
}

impl fmt::Display for SortDir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid sort direction '{0}', expected 'asc' or 'desc'")]
pub struct InvalidSortDir(pub String);

impl FromStr for SortDir {
    type Err = InvalidSortDir;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortDir::Asc),
            "desc" => Ok(SortDir::Desc),
            other => Err(InvalidSortDir(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    Text,
    Id,
    Date,
    Range,
    Multi,
}

/// A single applied filter constraint.
///
/// Values that carry nothing to filter on (blank text, an empty multi-select,
/// a range open on both ends) are treated as "not applied" by the controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FilterValue {
    Text(String),
    Id(i64),
    Date(NaiveDate),
    Range {
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    },
    Multi(Vec<String>),
}

impl FilterValue {
    pub fn text(value: impl Into<String>) -> Self {
        FilterValue::Text(value.into())
    }

    pub fn kind(&self) -> FilterKind {
        match self {
            FilterValue::Text(_) => FilterKind::Text,
            FilterValue::Id(_) => FilterKind::Id,
            FilterValue::Date(_) => FilterKind::Date,
            FilterValue::Range { .. } => FilterKind::Range,
            FilterValue::Multi(_) => FilterKind::Multi,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            FilterValue::Text(text) => text.trim().is_empty(),
            FilterValue::Id(_) | FilterValue::Date(_) => false,
            FilterValue::Range { from, to } => from.is_none() && to.is_none(),
            FilterValue::Multi(values) => values.is_empty(),
        }
    }

    /// Raw string form used for option-table lookups and verbatim display.
    pub fn raw(&self) -> String {
        match self {
            FilterValue::Text(text) => text.clone(),
            FilterValue::Id(id) => id.to_string(),
            FilterValue::Date(date) => date.format(WIRE_DATE_FORMAT).to_string(),
            FilterValue::Range { from, to } => format!(
                "{}..{}",
                from.map(|d| d.format(WIRE_DATE_FORMAT).to_string())
                    .unwrap_or_default(),
                to.map(|d| d.format(WIRE_DATE_FORMAT).to_string())
                    .unwrap_or_default()
            ),
            FilterValue::Multi(values) => values.join(","),
        }
    }
}

pub const WIRE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Canonical list query for one screen.
///
/// Never mutated in place once shared: every change produces a new value so
/// holders of an older snapshot can tell it was superseded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub filters: BTreeMap<String, FilterValue>,
    pub page: u32,
    pub per_page: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub sort_dir: SortDir,
}

impl SearchRequest {
    pub fn new(per_page: u32, sort_by: Option<String>, sort_dir: SortDir) -> Self {
        Self {
            filters: BTreeMap::new(),
            page: 0,
            per_page,
            sort_by,
            sort_dir,
        }
    }

    pub fn filter(&self, key: &str) -> Option<&FilterValue> {
        self.filters.get(key)
    }
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self::new(DEFAULT_PER_PAGE, None, SortDir::Desc)
    }
}
