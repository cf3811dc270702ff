//! Client-side narrowing of a category's products.
//!
//! The filter only hides rows from view; the ordered collection underneath
//! and its positions are never touched.

use std::{str::FromStr, time::Duration};

use shared::protocol::CategoryProduct;
use thiserror::Error;
use tokio::time::Instant;

use crate::{
    debounce::{Coalescer, DEFAULT_DEBOUNCE},
    reorder::OrderedItem,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DraftFilter {
    All,
    Drafts,
    /// Draft products are hidden until asked for.
    #[default]
    Published,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("draft filter must be one of all, true, false; got '{0}'")]
pub struct InvalidDraftFilter(pub String);

impl FromStr for DraftFilter {
    type Err = InvalidDraftFilter;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "all" => Ok(DraftFilter::All),
            "true" => Ok(DraftFilter::Drafts),
            "false" => Ok(DraftFilter::Published),
            other => Err(InvalidDraftFilter(other.to_string())),
        }
    }
}

impl DraftFilter {
    fn matches(self, draft: bool) -> bool {
        match self {
            DraftFilter::All => true,
            DraftFilter::Drafts => draft,
            DraftFilter::Published => !draft,
        }
    }
}

/// Case-insensitive product filter. Empty text fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub draft: DraftFilter,
    pub sku_or_reference: Option<String>,
    pub name: Option<String>,
}

impl ProductFilter {
    pub fn is_active(&self) -> bool {
        self.draft != DraftFilter::default()
            || non_empty(&self.sku_or_reference).is_some()
            || non_empty(&self.name).is_some()
    }

    pub fn matches(&self, product: &CategoryProduct) -> bool {
        if !self.draft.matches(product.draft) {
            return false;
        }
        if let Some(needle) = non_empty(&self.sku_or_reference) {
            let needle = needle.to_lowercase();
            let hit = [&product.sku, &product.reference]
                .into_iter()
                .flatten()
                .any(|field| field.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }
        if let Some(needle) = non_empty(&self.name) {
            let needle = needle.to_lowercase();
            return product
                .name
                .value
                .as_deref()
                .is_some_and(|name| name.to_lowercase().contains(&needle));
        }
        true
    }

    /// Visible rows, in collection order.
    pub fn apply(&self, items: &[OrderedItem<CategoryProduct>]) -> Vec<OrderedItem<CategoryProduct>> {
        items
            .iter()
            .filter(|item| self.matches(&item.data))
            .cloned()
            .collect()
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|value| !value.is_empty())
}

/// Product filter as edited on screen: the name box settles after a quiet
/// window, the other controls apply at once.
#[derive(Debug)]
pub struct ProductFilterState {
    applied: ProductFilter,
    typed_name: Coalescer<Option<String>>,
}

impl Default for ProductFilterState {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

impl ProductFilterState {
    pub fn new(name_delay: Duration) -> Self {
        Self {
            applied: ProductFilter::default(),
            typed_name: Coalescer::new(name_delay),
        }
    }

    pub fn filter(&self) -> &ProductFilter {
        &self.applied
    }

    pub fn set_draft(&mut self, draft: DraftFilter) {
        self.applied.draft = draft;
    }

    pub fn set_sku_or_reference(&mut self, value: Option<String>) {
        self.applied.sku_or_reference = value;
    }

    pub fn type_name(&mut self, value: Option<String>, now: Instant) {
        self.typed_name.push(value, now);
    }

    pub fn name_deadline(&self) -> Option<Instant> {
        self.typed_name.deadline()
    }

    /// Applies the typed name once its window is quiet. Returns whether the
    /// applied filter changed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.typed_name.poll(now) {
            Some(name) if name != self.applied.name => {
                self.applied.name = name;
                true
            }
            _ => false,
        }
    }

    /// Back to the default view: published products, no text filters.
    pub fn reset(&mut self) {
        self.typed_name.flush();
        self.applied = ProductFilter::default();
    }
}

#[cfg(test)]
#[path = "tests/product_filter_tests.rs"]
mod tests;
