//! Parsing of `--filter key=value` arguments against a screen's catalog.

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use clap::Args;
use client_core::{DraftFilter, FilterCatalog, ProductFilter};
use shared::domain::{FilterKind, FilterValue, WIRE_DATE_FORMAT};

/// Range values are written `from..to`; either side may be empty.
const RANGE_SEPARATOR: &str = "..";

pub fn parse_filter(catalog: &FilterCatalog, arg: &str) -> Result<(String, FilterValue)> {
    let (key, raw) = arg
        .split_once('=')
        .ok_or_else(|| anyhow!("filter '{arg}' must be written as key=value"))?;
    let key = key.trim();
    let spec = catalog.get(key).ok_or_else(|| {
        let known: Vec<_> = catalog.keys().collect();
        anyhow!("unknown filter '{key}', expected one of: {}", known.join(", "))
    })?;

    let kind = if raw.contains(RANGE_SEPARATOR) && spec.kinds.contains(&FilterKind::Range) {
        FilterKind::Range
    } else {
        spec.kinds.first().copied().unwrap_or(FilterKind::Text)
    };

    let value = match kind {
        FilterKind::Text => FilterValue::Text(raw.to_string()),
        FilterKind::Id => FilterValue::Id(
            raw.trim()
                .parse()
                .with_context(|| format!("filter '{key}' expects a numeric id"))?,
        ),
        FilterKind::Date => FilterValue::Date(parse_date(key, raw)?),
        FilterKind::Range => {
            let (from, to) = raw.split_once(RANGE_SEPARATOR).unwrap_or((raw, ""));
            FilterValue::Range {
                from: parse_optional_date(key, from)?,
                to: parse_optional_date(key, to)?,
            }
        }
        FilterKind::Multi => FilterValue::Multi(
            raw.split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(str::to_string)
                .collect(),
        ),
    };
    Ok((key.to_string(), value))
}

fn parse_date(key: &str, raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), WIRE_DATE_FORMAT)
        .with_context(|| format!("filter '{key}' expects a date as YYYY-MM-DD"))
}

fn parse_optional_date(key: &str, raw: &str) -> Result<Option<NaiveDate>> {
    if raw.trim().is_empty() {
        return Ok(None);
    }
    parse_date(key, raw).map(Some)
}

/// Comma separated column list for `prefs set --columns`.
pub fn parse_columns(raw: &str) -> Result<Vec<String>> {
    let columns: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|column| !column.is_empty())
        .map(str::to_string)
        .collect();
    if columns.is_empty() {
        bail!("at least one column is required");
    }
    Ok(columns)
}

/// Narrows the printed products of a category; positions are unaffected.
#[derive(Args, Debug, Clone, Default)]
pub struct ProductFilterArgs {
    /// `all`, `true` (drafts only) or `false` (published only).
    #[arg(long, default_value = "false")]
    pub draft: DraftFilter,
    /// Substring of the SKU or the reference.
    #[arg(long)]
    pub sku: Option<String>,
    #[arg(long)]
    pub name: Option<String>,
}

impl ProductFilterArgs {
    pub fn to_filter(&self) -> ProductFilter {
        ProductFilter {
            draft: self.draft,
            sku_or_reference: self.sku.clone(),
            name: self.name.clone(),
        }
    }
}

#[cfg(test)]
#[path = "tests/filter_args_tests.rs"]
mod tests;
