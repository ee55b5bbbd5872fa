//! Rename & scope engine: cursor-to-scope detection, CTE rename, alias
//! rename, and the smart dispatcher editors call.

mod alias;
mod cte;
mod scope;

pub use alias::rename_alias;
pub use cte::{RenameResult, rename_cte, rename_cte_statement};
pub use scope::{Scope, detect_scope};

use crate::ast::{Statement, Visit};
use crate::base::Span;
use crate::error::{Result, SchemaError};
use crate::parser::parse;

/// Apply ordered, non-overlapping span edits to the original text. Bytes
/// outside the edits are preserved exactly.
pub(crate) fn splice(sql: &str, mut edits: Vec<(Span, String)>) -> String {
    edits.sort_by_key(|(span, _)| span.start.offset);
    let mut out = String::with_capacity(sql.len());
    let mut cursor = 0usize;
    for (span, replacement) in edits {
        let start = usize::from(span.start.offset);
        let end = usize::from(span.end.offset);
        debug_assert!(start >= cursor, "overlapping rename edits");
        out.push_str(&sql[cursor..start]);
        out.push_str(&replacement);
        cursor = end;
    }
    out.push_str(&sql[cursor..]);
    out
}

/// What the cursor points at, as far as renaming is concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
enum RenameTarget {
    Cte(String),
    Alias,
}

fn target_at(statement: &Statement, line: u32, column: u32) -> Option<RenameTarget> {
    // CTE definition names and references first.
    if let Ok(query) = statement.expect_query()
        && let Some(with) = query.with_clause()
    {
        for table in &with.tables {
            if table
                .name
                .span
                .is_some_and(|span| span.contains(line, column))
            {
                return Some(RenameTarget::Cte(table.name.text.to_string()));
            }
        }
        let names: Vec<String> = with.names().map(str::to_string).collect();
        let mut finder = CteTokenFinder {
            names: &names,
            line,
            column,
            hit: None,
        };
        finder.visit_statement(statement);
        if let Some(name) = finder.hit {
            return Some(RenameTarget::Cte(name));
        }
    }

    // Then aliases (definition tokens or qualifiers).
    let index = alias::AliasIndex::build(statement);
    if index.target_at(line, column).is_some() {
        return Some(RenameTarget::Alias);
    }
    None
}

/// Whether the token at the cursor can be renamed (a CTE name or a source
/// alias), so editors can decide to offer the action.
pub fn is_renameable(sql: &str, line: u32, column: u32) -> bool {
    match parse(sql) {
        Ok(statement) => target_at(&statement, line, column).is_some(),
        Err(_) => false,
    }
}

/// Detect what the cursor points at and dispatch to the matching engine.
pub fn smart_rename(sql: &str, line: u32, column: u32, new: &str) -> Result<RenameResult> {
    let statement = parse(sql)?;
    match target_at(&statement, line, column) {
        Some(RenameTarget::Cte(old)) => rename_cte(sql, &old, new),
        Some(RenameTarget::Alias) => rename_alias(sql, line, column, new),
        None => Err(SchemaError::UnsupportedRoot("nothing renameable at cursor").into()),
    }
}

/// Finds a table-source token referencing one of the root CTE names at the
/// cursor.
struct CteTokenFinder<'a> {
    names: &'a [String],
    line: u32,
    column: u32,
    hit: Option<String>,
}

impl Visit for CteTokenFinder<'_> {
    fn visit_source_expr(&mut self, source: &crate::ast::SourceExpr) {
        if self.hit.is_none()
            && let crate::ast::Source::Table(table) = &source.source
            && table.name.is_bare()
        {
            let name = table.name.name();
            if self.names.iter().any(|n| n == name.as_str())
                && name.span.is_some_and(|span| span.contains(self.line, self.column))
            {
                self.hit = Some(name.text.to_string());
            }
        }
        crate::ast::visitor::walk_source_expr(self, source);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cursor(sql: &str, needle: &str) -> (u32, u32) {
        (1, sql.find(needle).unwrap() as u32 + 1)
    }

    #[test]
    fn test_smart_rename_dispatches_to_cte() {
        let sql = "WITH u AS (SELECT 1) SELECT * FROM u";
        let (line, column) = cursor(sql, "u AS");
        let result = smart_rename(sql, line, column, "base").unwrap();
        assert_eq!(result.sql, "WITH base AS (SELECT 1) SELECT * FROM base");
    }

    #[test]
    fn test_smart_rename_from_cte_reference() {
        let sql = "WITH u AS (SELECT 1) SELECT * FROM u";
        let column = sql.rfind('u').unwrap() as u32 + 1;
        let result = smart_rename(sql, 1, column, "base").unwrap();
        assert!(result.sql.ends_with("FROM base"));
        assert!(result.sql.starts_with("WITH base AS"));
    }

    #[test]
    fn test_smart_rename_dispatches_to_alias() {
        let sql = "SELECT o.id FROM orders o";
        let (line, column) = cursor(sql, "o.id");
        let result = smart_rename(sql, line, column, "ord").unwrap();
        assert_eq!(result.sql, "SELECT ord.id FROM orders ord");
    }

    #[test]
    fn test_is_renameable() {
        let sql = "WITH u AS (SELECT 1) SELECT x.a FROM t x";
        let (line, column) = cursor(sql, "u AS");
        assert!(is_renameable(sql, line, column));
        let (line, column) = cursor(sql, "x.a");
        assert!(is_renameable(sql, line, column));
        let (line, column) = cursor(sql, "SELECT 1");
        assert!(!is_renameable(sql, line, column));
        assert!(!is_renameable("not sql at all (", 1, 1));
    }

    #[test]
    fn test_splice_preserves_untouched_bytes() {
        let sql = "abc def ghi";
        let span = |start: u32, end: u32| {
            Span::new(
                crate::base::Position::new(1, start + 1, start),
                crate::base::Position::new(1, end + 1, end),
            )
        };
        let out = splice(sql, vec![(span(8, 11), "X".into()), (span(0, 3), "Y".into())]);
        assert_eq!(out, "Y def X");
    }
}
