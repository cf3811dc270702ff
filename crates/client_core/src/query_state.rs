//! Authoritative list query for one screen.
//!
//! The controller is a pure reducer: it performs no I/O and every successful
//! mutation yields a fresh `Arc<SearchRequest>`. Consumers detect change with
//! `Arc::ptr_eq`, so one logical change maps to one refetch. Debouncing sits
//! between the controller and the fetcher, never inside it.

use std::{collections::BTreeMap, sync::Arc};

use shared::domain::{FilterValue, SearchRequest, SortDir};

use crate::{
    error::QueryError,
    filters::{filters_from_chips, FilterCatalog, FilterChip},
};

#[derive(Debug, Clone)]
pub struct QueryController {
    catalog: Arc<FilterCatalog>,
    request: Arc<SearchRequest>,
    chips: Vec<FilterChip>,
    /// Caller-supplied display values, reused while the raw value is unchanged.
    display_overrides: BTreeMap<String, (FilterValue, String)>,
}

impl QueryController {
    /// Rehydrates chips from `initial.filters`; every key must be in the catalog.
    pub fn new(catalog: Arc<FilterCatalog>, initial: SearchRequest) -> Result<Self, QueryError> {
        if initial.per_page == 0 {
            return Err(QueryError::InvalidPageSize);
        }

        let mut chips = Vec::with_capacity(initial.filters.len());
        for (key, value) in &initial.filters {
            let spec = catalog
                .get(key)
                .ok_or_else(|| QueryError::UnknownFilter(key.clone()))?;
            if !spec.accepts(value) {
                return Err(QueryError::KindMismatch {
                    key: key.clone(),
                    kind: value.kind(),
                });
            }
            if value.is_empty() {
                continue;
            }
            if let Some(chip) = catalog.chip(key, value.clone()) {
                chips.push(chip);
            }
        }

        let request = SearchRequest {
            filters: filters_from_chips(&chips),
            ..initial
        };

        Ok(Self {
            catalog,
            request: Arc::new(request),
            chips,
            display_overrides: BTreeMap::new(),
        })
    }

    pub fn with_defaults(
        catalog: Arc<FilterCatalog>,
        per_page: u32,
        sort_by: Option<&str>,
        sort_dir: SortDir,
    ) -> Result<Self, QueryError> {
        Self::new(
            catalog,
            SearchRequest::new(per_page, sort_by.map(str::to_string), sort_dir),
        )
    }

    pub fn snapshot(&self) -> Arc<SearchRequest> {
        Arc::clone(&self.request)
    }

    pub fn chips(&self) -> &[FilterChip] {
        &self.chips
    }

    pub fn catalog(&self) -> &FilterCatalog {
        &self.catalog
    }

    /// Sets or clears one filter and resets pagination.
    ///
    /// `None` and empty values (blank text, empty selections) clear the filter.
    pub fn set_filter(
        &mut self,
        key: &str,
        value: Option<FilterValue>,
    ) -> Result<Arc<SearchRequest>, QueryError> {
        self.apply_filter(key, value, None)
    }

    /// Like [`set_filter`](Self::set_filter) with a display value resolved by the caller,
    /// e.g. a store name fetched after the catalog was built.
    pub fn set_filter_with_display(
        &mut self,
        key: &str,
        value: FilterValue,
        display_value: impl Into<String>,
    ) -> Result<Arc<SearchRequest>, QueryError> {
        self.apply_filter(key, Some(value), Some(display_value.into()))
    }

    pub fn remove_chip(&mut self, key: &str) -> Result<Arc<SearchRequest>, QueryError> {
        self.set_filter(key, None)
    }

    pub fn clear_filters(&mut self) -> Arc<SearchRequest> {
        self.chips.clear();
        self.display_overrides.clear();
        self.replace(SearchRequest {
            filters: BTreeMap::new(),
            page: 0,
            ..(*self.request).clone()
        })
    }

    pub fn set_sort(&mut self, sort_by: Option<&str>, sort_dir: SortDir) -> Arc<SearchRequest> {
        self.replace(SearchRequest {
            sort_by: sort_by.map(str::to_string),
            sort_dir,
            page: 0,
            ..(*self.request).clone()
        })
    }

    pub fn set_page(&mut self, page: u32) -> Arc<SearchRequest> {
        self.replace(SearchRequest {
            page,
            ..(*self.request).clone()
        })
    }

    pub fn set_per_page(&mut self, per_page: u32) -> Result<Arc<SearchRequest>, QueryError> {
        if per_page == 0 {
            return Err(QueryError::InvalidPageSize);
        }
        Ok(self.replace(SearchRequest {
            per_page,
            page: 0,
            ..(*self.request).clone()
        }))
    }

    /// Same content, new identity: forces a refetch after a failure.
    pub fn refresh(&mut self) -> Arc<SearchRequest> {
        self.replace((*self.request).clone())
    }

    /// Derives chips for an arbitrary filter map the way this controller would.
    pub fn derive_chips(&self, filters: &BTreeMap<String, FilterValue>) -> Vec<FilterChip> {
        filters
            .iter()
            .filter(|(_, value)| !value.is_empty())
            .filter_map(|(key, value)| {
                let mut chip = self.catalog.chip(key, value.clone())?;
                if let Some((remembered, display)) = self.display_overrides.get(key) {
                    if remembered == value {
                        chip.display_value = display.clone();
                    }
                }
                Some(chip)
            })
            .collect()
    }

    fn apply_filter(
        &mut self,
        key: &str,
        value: Option<FilterValue>,
        display_value: Option<String>,
    ) -> Result<Arc<SearchRequest>, QueryError> {
        let spec = self
            .catalog
            .get(key)
            .ok_or_else(|| QueryError::UnknownFilter(key.to_string()))?;

        let value = match value {
            Some(value) if !spec.accepts(&value) => {
                return Err(QueryError::KindMismatch {
                    key: key.to_string(),
                    kind: value.kind(),
                });
            }
            Some(value) if value.is_empty() => None,
            other => other,
        };

        self.chips.retain(|chip| chip.key != key);
        self.display_overrides.remove(key);

        if let Some(value) = value {
            let mut chip = FilterChip {
                key: key.to_string(),
                label: spec.label.clone(),
                display_value: spec.resolver.resolve(&value),
                value,
            };
            if let Some(display) = display_value {
                self.display_overrides
                    .insert(key.to_string(), (chip.value.clone(), display.clone()));
                chip.display_value = display;
            }
            self.chips.push(chip);
        }

        Ok(self.replace(SearchRequest {
            filters: filters_from_chips(&self.chips),
            page: 0,
            ..(*self.request).clone()
        }))
    }

    fn replace(&mut self, next: SearchRequest) -> Arc<SearchRequest> {
        self.request = Arc::new(next);
        Arc::clone(&self.request)
    }
}

#[cfg(test)]
#[path = "tests/query_state_tests.rs"]
mod tests;
