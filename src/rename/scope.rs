//! Cursor-to-scope detection.
//!
//! Every query parsed from text carries its source span; scope detection
//! labels the main query, each CTE body, and each sub-query, then picks the
//! innermost region containing the cursor.

use crate::ast::{CommonTable, Query, Statement, Visit, visitor};
use crate::base::Span;
use crate::error::Result;
use crate::parser::parse;

/// The smallest enclosing SQL construct at a cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    Main,
    Cte(String),
    /// Pre-order index of the sub-query within the statement.
    Subquery(u32),
}

#[derive(Debug)]
struct Region {
    span: Span,
    scope: Scope,
}

/// Determine the innermost scope containing the 1-based cursor position.
pub fn detect_scope(sql: &str, line: u32, column: u32) -> Result<Scope> {
    let statement = parse(sql)?;
    let regions = collect_regions(&statement);

    let innermost = regions
        .into_iter()
        .filter(|r| r.span.contains(line, column))
        .min_by_key(|r| u32::from(r.span.len()));
    Ok(innermost.map(|r| r.scope).unwrap_or(Scope::Main))
}

fn collect_regions(statement: &Statement) -> Vec<Region> {
    let mut collector = RegionCollector {
        regions: Vec::new(),
        counter: 0,
        seen_root: false,
        pending_cte: None,
    };
    collector.visit_statement(statement);
    collector.regions
}

/// Labels each query span as it is entered: the first query is the main
/// query, a query reached through a common table is that CTE's body, and
/// everything else is a numbered sub-query.
struct RegionCollector {
    regions: Vec<Region>,
    counter: u32,
    seen_root: bool,
    pending_cte: Option<String>,
}

impl Visit for RegionCollector {
    fn visit_common_table(&mut self, table: &CommonTable) {
        self.pending_cte = Some(table.name.text.to_string());
        visitor::walk_common_table(self, table);
        self.pending_cte = None;
    }

    fn visit_query(&mut self, query: &Query) {
        let scope = if let Some(name) = self.pending_cte.take() {
            Scope::Cte(name)
        } else if !self.seen_root {
            self.seen_root = true;
            Scope::Main
        } else {
            self.counter += 1;
            Scope::Subquery(self.counter)
        };
        if let Some(span) = query.span() {
            self.regions.push(Region { span, scope });
        }
        visitor::walk_query(self, query);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope_at(sql: &str, needle: &str) -> Scope {
        let column = sql.find(needle).unwrap() as u32 + 2;
        detect_scope(sql, 1, column).unwrap()
    }

    #[test]
    fn test_main_scope() {
        let sql = "SELECT id FROM users WHERE active";
        assert_eq!(scope_at(sql, "active"), Scope::Main);
    }

    #[test]
    fn test_cte_scope() {
        let sql = "WITH u AS (SELECT id FROM users) SELECT * FROM u";
        assert_eq!(scope_at(sql, "users"), Scope::Cte("u".into()));
        assert_eq!(scope_at(sql, "FROM u"), Scope::Main);
    }

    #[test]
    fn test_subquery_scope() {
        let sql = "SELECT * FROM t WHERE id IN (SELECT id FROM banned)";
        assert!(matches!(scope_at(sql, "banned"), Scope::Subquery(_)));
    }

    #[test]
    fn test_innermost_wins() {
        let sql = "WITH a AS (SELECT * FROM (SELECT 1 AS x) inner_q) SELECT * FROM a";
        assert!(matches!(scope_at(sql, "1 AS x"), Scope::Subquery(_)));
        assert_eq!(scope_at(sql, "inner_q"), Scope::Cte("a".into()));
    }

    #[test]
    fn test_nested_cte_scope() {
        let sql = "WITH outer_cte AS (WITH inner_cte AS (SELECT 1) SELECT * FROM inner_cte) \
                   SELECT * FROM outer_cte";
        assert_eq!(scope_at(sql, "SELECT 1"), Scope::Cte("inner_cte".into()));
    }
}
