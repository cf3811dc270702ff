//! Filter dimensions, display resolution and the chip projection.
//!
//! Chips are the authoritative representation while a screen is live; the
//! filter map sent to the backend is always rebuilt from them.

use std::{collections::BTreeMap, fmt, sync::Arc};

use serde::Serialize;
use shared::domain::{FilterKind, FilterValue};
use tracing::debug;

pub const DISPLAY_DATE_FORMAT: &str = "%d/%m/%Y";

pub type ResolveFn = Arc<dyn Fn(&FilterValue) -> Option<String> + Send + Sync>;

/// Turns a raw filter value into the text shown on its chip.
#[derive(Clone)]
pub enum Resolver {
    Verbatim,
    /// Lookup table keyed by the raw value (ids as decimal strings).
    Options(BTreeMap<String, String>),
    /// chrono format string applied to dates and range ends.
    Date(String),
    Custom(ResolveFn),
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolver::Verbatim => f.write_str("Verbatim"),
            Resolver::Options(table) => f.debug_tuple("Options").field(&table.len()).finish(),
            Resolver::Date(format) => f.debug_tuple("Date").field(format).finish(),
            Resolver::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl Resolver {
    pub fn options<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: ToString,
        V: Into<String>,
    {
        Resolver::Options(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.into()))
                .collect(),
        )
    }

    pub fn date() -> Self {
        Resolver::Date(DISPLAY_DATE_FORMAT.to_string())
    }

    pub fn custom<F>(resolve: F) -> Self
    where
        F: Fn(&FilterValue) -> Option<String> + Send + Sync + 'static,
    {
        Resolver::Custom(Arc::new(resolve))
    }

    /// Unresolvable values fall back to their raw form rather than a blank chip.
    pub fn resolve(&self, value: &FilterValue) -> String {
        match self {
            Resolver::Verbatim => value.raw(),
            Resolver::Options(table) => match value {
                FilterValue::Multi(values) => values
                    .iter()
                    .map(|v| table.get(v).cloned().unwrap_or_else(|| v.clone()))
                    .collect::<Vec<_>>()
                    .join(", "),
                other => {
                    let raw = other.raw();
                    table.get(&raw).cloned().unwrap_or(raw)
                }
            },
            Resolver::Date(format) => match value {
                FilterValue::Date(date) => date.format(format).to_string(),
                FilterValue::Range { from, to } => {
                    let from = from.map(|d| d.format(format).to_string());
                    let to = to.map(|d| d.format(format).to_string());
                    match (from, to) {
                        (Some(from), Some(to)) => format!("{from} - {to}"),
                        (Some(from), None) => format!(">= {from}"),
                        (None, Some(to)) => format!("<= {to}"),
                        (None, None) => String::new(),
                    }
                }
                other => other.raw(),
            },
            Resolver::Custom(resolve) => resolve(value).unwrap_or_else(|| value.raw()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FilterSpec {
    pub label: String,
    pub kinds: Vec<FilterKind>,
    pub resolver: Resolver,
}

impl FilterSpec {
    pub fn new(label: impl Into<String>, kind: FilterKind) -> Self {
        let resolver = match kind {
            FilterKind::Date | FilterKind::Range => Resolver::date(),
            _ => Resolver::Verbatim,
        };
        Self {
            label: label.into(),
            kinds: vec![kind],
            resolver,
        }
    }

    pub fn accepting(mut self, kind: FilterKind) -> Self {
        if !self.kinds.contains(&kind) {
            self.kinds.push(kind);
        }
        self
    }

    pub fn with_resolver(mut self, resolver: Resolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn accepts(&self, value: &FilterValue) -> bool {
        self.kinds.contains(&value.kind())
    }
}

/// The filter dimensions a list screen knows about, in display order.
#[derive(Debug, Clone, Default)]
pub struct FilterCatalog {
    specs: Vec<(String, FilterSpec)>,
}

impl FilterCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, spec: FilterSpec) -> Self {
        let key = key.into();
        self.specs.retain(|(existing, _)| existing != &key);
        self.specs.push((key, spec));
        self
    }

    pub fn get(&self, key: &str) -> Option<&FilterSpec> {
        self.specs
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, spec)| spec)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.specs.iter().map(|(key, _)| key.as_str())
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn chip(&self, key: &str, value: FilterValue) -> Option<FilterChip> {
        let spec = self.get(key)?;
        Some(FilterChip {
            key: key.to_string(),
            label: spec.label.clone(),
            display_value: spec.resolver.resolve(&value),
            value,
        })
    }
}

/// One active filter, ready to render as a removable badge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterChip {
    pub key: String,
    pub label: String,
    pub value: FilterValue,
    pub display_value: String,
}

pub fn chips_from_filters(
    catalog: &FilterCatalog,
    filters: &BTreeMap<String, FilterValue>,
) -> Vec<FilterChip> {
    filters
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .filter_map(|(key, value)| {
            let chip = catalog.chip(key, value.clone());
            if chip.is_none() {
                debug!(filter = %key, "dropping filter unknown to catalog");
            }
            chip
        })
        .collect()
}

pub fn filters_from_chips(chips: &[FilterChip]) -> BTreeMap<String, FilterValue> {
    chips
        .iter()
        .map(|chip| (chip.key.clone(), chip.value.clone()))
        .collect()
}

#[cfg(test)]
#[path = "tests/filters_tests.rs"]
mod tests;
