use serde::{Deserialize, Serialize};

use crate::domain::{FilterValue, ItemId, PivotId, SearchRequest, WIRE_DATE_FORMAT};

/// One page of a listed resource as returned by the admin backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListPage<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub total: u64,
}

impl<T> Default for ListPage<T> {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            total: 0,
        }
    }
}

/// How a resource expects its sort parameters to be named.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortParamStyle {
    /// `sortBy` / `sortDir`
    #[default]
    SortByDir,
    /// `orderBy` / `order`
    OrderBy,
    /// Resource ignores sorting.
    Unsorted,
}

/// The backend paginates from 1; the client keeps a 0-based index.
pub fn backend_page(page: u32) -> u32 {
    page.saturating_add(1).max(1)
}

/// Encodes one filter into query pairs.
///
/// Ranges expand to `{key}From` / `{key}To`, multi-selects to repeated `{key}[]`.
pub fn encode_filter(key: &str, value: &FilterValue) -> Vec<(String, String)> {
    match value {
        FilterValue::Text(text) => vec![(key.to_string(), text.trim().to_string())],
        FilterValue::Id(id) => vec![(key.to_string(), id.to_string())],
        FilterValue::Date(date) => vec![(
            key.to_string(),
            date.format(WIRE_DATE_FORMAT).to_string(),
        )],
        FilterValue::Range { from, to } => {
            let mut pairs = Vec::with_capacity(2);
            if let Some(from) = from {
                pairs.push((
                    format!("{key}From"),
                    from.format(WIRE_DATE_FORMAT).to_string(),
                ));
            }
            if let Some(to) = to {
                pairs.push((format!("{key}To"), to.format(WIRE_DATE_FORMAT).to_string()));
            }
            pairs
        }
        FilterValue::Multi(values) => values
            .iter()
            .map(|v| (format!("{key}[]"), v.clone()))
            .collect(),
    }
}

pub fn list_query_pairs(request: &SearchRequest, style: SortParamStyle) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (key, value) in &request.filters {
        if value.is_empty() {
            continue;
        }
        pairs.extend(encode_filter(key, value));
    }

    pairs.push(("page".to_string(), backend_page(request.page).to_string()));
    pairs.push(("perPage".to_string(), request.per_page.to_string()));

    let (by_key, dir_key) = match style {
        SortParamStyle::SortByDir => ("sortBy", "sortDir"),
        SortParamStyle::OrderBy => ("orderBy", "order"),
        SortParamStyle::Unsorted => return pairs,
    };
    if let Some(sort_by) = &request.sort_by {
        pairs.push((by_key.to_string(), sort_by.clone()));
    }
    pairs.push((dir_key.to_string(), request.sort_dir.as_str().to_string()));
    pairs
}

/// `id` is the pivot id for association rows, the item id otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionUpdate {
    pub id: i64,
    pub position: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkPositionRequest {
    pub data: Vec<PositionUpdate>,
}

/// Detaches a product from a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryProductRemoval {
    pub category_id: i64,
    pub product_id: ItemId,
}

/// Metadata echoed by the backend after a position write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionUpdated {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pivot_id: Option<PivotId>,
    pub position: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslatedName {
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductPivot {
    pub id: PivotId,
    pub position: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryProduct {
    pub id: ItemId,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub name: TranslatedName,
    #[serde(default)]
    pub draft: bool,
    pub pivot: ProductPivot,
}

impl CategoryProduct {
    pub fn display_name(&self) -> &str {
        self.name
            .value
            .as_deref()
            .unwrap_or("discontinued product")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDetail {
    pub id: i64,
    #[serde(default)]
    pub products: Vec<CategoryProduct>,
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
