//! The DynamicQueryBuilder facade: parse, inject, return the AST.

use serde_json::Value;
use tracing::debug;

use crate::analyze::TableColumnResolver;
use crate::ast::Statement;
use crate::error::Result;
use crate::parser::parse;
use crate::transform::{
    FilterSpec, Paging, QueryOptions, SerializeMapping, SortSpec, inject_filter,
    inject_pagination, inject_serialize, inject_sort,
};

/// Combines parse and the injector pipeline. The pipeline order is fixed
/// (filter, sort, paginate, serialize) regardless of how the option object
/// was assembled, so generated SQL is deterministic.
#[derive(Default)]
pub struct DynamicQueryBuilder {
    resolver: Option<Box<dyn TableColumnResolver>>,
}

impl DynamicQueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a table-column resolver used for wildcard expansion and
    /// filter-target validation.
    pub fn with_resolver(resolver: Box<dyn TableColumnResolver>) -> Self {
        Self {
            resolver: Some(resolver),
        }
    }

    fn resolver(&self) -> Option<&dyn TableColumnResolver> {
        self.resolver.as_deref()
    }

    /// Parse and apply the full option object. Pure: no I/O, the input SQL
    /// string is never modified.
    pub fn build_query(&self, sql: &str, options: &QueryOptions) -> Result<Statement> {
        let mut statement = parse(sql)?;
        if let Some(filter) = &options.filter {
            inject_filter(&mut statement, filter, self.resolver())?;
        }
        if let Some(sort) = &options.sort {
            inject_sort(&mut statement, sort, self.resolver())?;
        }
        if let Some(paging) = &options.paging {
            inject_pagination(&mut statement, paging)?;
        }
        if let Some(serialize) = &options.serialize {
            inject_serialize(&mut statement, serialize)?;
        }
        debug!("built dynamic query");
        Ok(statement)
    }

    /// [`Self::build_query`] from a raw JSON option object; unknown keys are
    /// structured errors.
    pub fn build_query_from_value(&self, sql: &str, options: Value) -> Result<Statement> {
        let options = QueryOptions::from_value(options)?;
        self.build_query(sql, &options)
    }

    pub fn build_filtered_query(&self, sql: &str, filter: &FilterSpec) -> Result<Statement> {
        self.build_query(
            sql,
            &QueryOptions {
                filter: Some(filter.clone()),
                ..QueryOptions::default()
            },
        )
    }

    pub fn build_sorted_query(&self, sql: &str, sort: &SortSpec) -> Result<Statement> {
        self.build_query(
            sql,
            &QueryOptions {
                sort: Some(sort.clone()),
                ..QueryOptions::default()
            },
        )
    }

    pub fn build_paginated_query(&self, sql: &str, paging: Paging) -> Result<Statement> {
        self.build_query(
            sql,
            &QueryOptions {
                paging: Some(paging),
                ..QueryOptions::default()
            },
        )
    }

    pub fn build_serialized_query(
        &self,
        sql: &str,
        mapping: &SerializeMapping,
    ) -> Result<Statement> {
        let mut statement = parse(sql)?;
        inject_serialize(&mut statement, mapping)?;
        Ok(statement)
    }

    /// Parse-only validation.
    pub fn validate_sql(&self, sql: &str) -> bool {
        parse(sql).is_ok()
    }
}
