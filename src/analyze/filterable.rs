//! Filterable-item collector.
//!
//! The dynamic filter injector accepts column names and parameter names as
//! filter keys; this collector produces that set. Columns are deduplicated by
//! their fully qualified origin so `u.id` and `p.id` stay distinct even
//! though both end in `id`.

use rustc_hash::FxHashSet;

use crate::ast::{Expr, Query, Statement};
use crate::error::ResolveError;

use super::columns::{ColumnCollectOptions, TableColumnResolver, collect_columns};
use super::params::collect_parameters;

/// One name the filter injector will accept.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterableItem {
    /// The short name filters use (`id`, or an alias).
    pub name: String,
    /// The fully qualified key when known (`u.id`), used for deduplication.
    pub qualified: Option<String>,
    /// The defining expression, when present in the select list.
    pub expr: Option<Expr>,
}

#[derive(Debug, Clone, Default)]
pub struct FilterableItems {
    pub columns: Vec<FilterableItem>,
    pub params: Vec<String>,
}

impl FilterableItems {
    /// Find a column by filter key: exact qualified match first, then short
    /// name.
    pub fn find(&self, key: &str) -> Option<&FilterableItem> {
        self.columns
            .iter()
            .find(|c| c.qualified.as_deref() == Some(key))
            .or_else(|| self.columns.iter().find(|c| c.name == key))
    }

    pub fn accepts(&self, key: &str) -> bool {
        self.find(key).is_some() || self.params.iter().any(|p| p == key)
    }
}

/// Collect the filterable items of a query statement.
pub fn collect_filterable_items(
    stmt: &Statement,
    query: &Query,
    resolver: Option<&dyn TableColumnResolver>,
) -> Result<FilterableItems, ResolveError> {
    let columns = collect_columns(query, resolver, &ColumnCollectOptions::default())?;

    let mut seen: FxHashSet<String> = FxHashSet::default();
    let mut items = Vec::new();
    for column in columns {
        let Some(name) = column.name else {
            continue;
        };
        let qualified = column.origin.as_ref().map(|o| o.key());
        let dedup_key = qualified.clone().unwrap_or_else(|| name.clone());
        if !seen.insert(dedup_key) {
            continue;
        }
        items.push(FilterableItem {
            name,
            qualified,
            expr: column.expr,
        });
    }

    let params = collect_parameters(stmt)
        .into_iter()
        .map(|p| p.to_string())
        .collect();

    Ok(FilterableItems {
        columns: items,
        params,
    })
}
