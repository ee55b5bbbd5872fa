//! Common-table collector.

use crate::ast::{CommonTable, Query, Statement, Visit, visitor};

struct CteCollector {
    found: Vec<CommonTable>,
}

impl Visit for CteCollector {
    fn visit_common_table(&mut self, table: &CommonTable) {
        self.found.push(table.clone());
        // Nested WITH clauses inside the body are collected too.
        visitor::walk_common_table(self, table);
    }
}

/// Collect every common-table definition in first-encounter order, including
/// those nested in sub-queries, expression-inline queries, and both sides of
/// binary queries. Names are not deduplicated.
pub fn collect_ctes(stmt: &Statement) -> Vec<CommonTable> {
    let mut collector = CteCollector { found: Vec::new() };
    collector.visit_statement(stmt);
    collector.found
}

/// Query-rooted variant of [`collect_ctes`].
pub fn collect_ctes_in_query(query: &Query) -> Vec<CommonTable> {
    let mut collector = CteCollector { found: Vec::new() };
    collector.visit_query(query);
    collector.found
}
