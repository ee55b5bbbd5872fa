//! Static analysis: pure collectors over the AST.
//!
//! Everything here implements the visitor contract and never mutates the
//! tree (the one exception, parameter binding, is explicit about it).

mod columns;
mod ctes;
mod deps;
mod filterable;
mod params;
mod tables;

pub use columns::{
    ColumnCollectOptions, SelectableColumn, TableColumnResolver, collect_column_refs,
    collect_columns, for_each_column_ref, for_each_column_ref_mut,
};
pub use ctes::{collect_ctes, collect_ctes_in_query};
pub use deps::{CteDependencyGraph, CteNode, MAIN_QUERY, analyze_cte_dependencies};
pub use filterable::{FilterableItem, FilterableItems, collect_filterable_items};
pub use params::{collect_parameters, set_parameter};
pub use tables::collect_tables;
