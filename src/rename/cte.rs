//! CTE rename: the definition and every reference, statement-wide.

use tracing::debug;

use crate::ast::{ColumnRef, Query, Source, SourceExpr, Statement, Visit, visitor};
use crate::base::Span;
use crate::error::{Result, SchemaError};
use crate::parser::parse;

use super::splice;

/// Result of a textual rename: the edited SQL plus the number of replaced
/// identifiers.
#[derive(Debug, Clone, PartialEq)]
pub struct RenameResult {
    pub sql: String,
    pub replaced: usize,
}

/// Rename a root-level CTE and every reference to it (table sources and
/// column qualifiers) throughout the whole statement, including inside
/// other CTE bodies. Nested WITH clauses redefining the name shadow it and
/// are left untouched. The output is produced by splicing the original text,
/// so untouched bytes (layout, comments) survive unchanged.
pub fn rename_cte(sql: &str, old: &str, new: &str) -> Result<RenameResult> {
    if old == new {
        return Ok(RenameResult {
            sql: sql.to_string(),
            replaced: 0,
        });
    }

    let statement = parse(sql)?;
    let query = statement.expect_query()?;
    let with = query
        .with_clause()
        .ok_or(SchemaError::UnsupportedRoot("statement without WITH clause"))?;

    let definition = with.get(old).ok_or_else(|| SchemaError::UnknownCte {
        name: old.to_string(),
    })?;
    if with.get(new).is_some() {
        return Err(SchemaError::RenameTargetExists {
            from: old.to_string(),
            to: new.to_string(),
        }
        .into());
    }

    let mut edits: Vec<(Span, String)> = Vec::new();
    let render = |quoted: bool| {
        if quoted {
            format!("\"{}\"", new.replace('"', "\"\""))
        } else {
            new.to_string()
        }
    };

    // The definition name.
    let name_span = definition
        .name
        .span
        .expect("parsed identifiers carry spans");
    edits.push((name_span, render(definition.name.quoted)));

    // Every unshadowed reference.
    let mut collector = CteRefCollector {
        old,
        depth: 0,
        shadow_depth: Vec::new(),
        refs: Vec::new(),
    };
    collector.visit_statement(&statement);
    for reference in collector.refs {
        edits.push((reference.span, render(reference.quoted)));
    }

    let replaced = edits.len();
    debug!(old, new, replaced, "renamed CTE");
    Ok(RenameResult {
        sql: splice(sql, edits),
        replaced,
    })
}

struct CteRef {
    span: Span,
    quoted: bool,
}

/// Collects table-source references and column qualifiers naming the CTE,
/// skipping scopes where a nested (non-root) WITH redefines the name.
struct CteRefCollector<'a> {
    old: &'a str,
    /// Query nesting depth; the root query's WITH is the definition itself,
    /// not a shadow.
    depth: u32,
    /// Depths at which a shadowing WITH was entered.
    shadow_depth: Vec<u32>,
    refs: Vec<CteRef>,
}

impl CteRefCollector<'_> {
    fn shadowed(&self) -> bool {
        !self.shadow_depth.is_empty()
    }
}

impl Visit for CteRefCollector<'_> {
    fn visit_query(&mut self, query: &Query) {
        self.depth += 1;
        let shadows = self.depth > 1
            && query
                .with_clause()
                .is_some_and(|w| w.get(self.old).is_some());
        if shadows {
            self.shadow_depth.push(self.depth);
        }
        visitor::walk_query(self, query);
        if shadows {
            self.shadow_depth.pop();
        }
        self.depth -= 1;
    }

    fn visit_source_expr(&mut self, source: &SourceExpr) {
        if !self.shadowed()
            && let Source::Table(table) = &source.source
            && table.name.is_bare_name(self.old, false)
            && let Some(span) = table.name.name().span
        {
            self.refs.push(CteRef {
                span,
                quoted: table.name.name().quoted,
            });
        }
        visitor::walk_source_expr(self, source);
    }

    fn visit_column_ref(&mut self, column: &ColumnRef) {
        if !self.shadowed() && column.name.parts.len() >= 2 {
            let qualifier = &column.name.parts[0];
            if qualifier.text == self.old
                && let Some(span) = qualifier.span
            {
                self.refs.push(CteRef {
                    span,
                    quoted: qualifier.quoted,
                });
            }
        }
        visitor::walk_column_ref(self, column);
    }
}

/// Convenience: rename and hand back the reparsed statement too.
pub fn rename_cte_statement(sql: &str, old: &str, new: &str) -> Result<(RenameResult, Statement)> {
    let result = rename_cte(sql, old, new)?;
    let statement = parse(&result.sql)?;
    Ok((result, statement))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::strip_metadata;

    #[test]
    fn test_rename_definition_and_references() {
        // Scenario: the definition, another CTE's body, FROM, JOIN, and the
        // qualified column all follow the rename.
        let sql = "WITH u AS (SELECT id FROM users), \
                   o AS (SELECT u.id FROM u JOIN orders ON u.id = orders.user_id) \
                   SELECT * FROM o";
        let result = rename_cte(sql, "u", "customer").unwrap();
        assert_eq!(
            result.sql,
            "WITH customer AS (SELECT id FROM users), \
             o AS (SELECT customer.id FROM customer JOIN orders ON customer.id = orders.user_id) \
             SELECT * FROM o"
        );
        assert_eq!(result.replaced, 5);
        assert!(parse(&result.sql).is_ok());
    }

    #[test]
    fn test_rename_preserves_layout() {
        let sql = "WITH u AS (\n    SELECT id   FROM users -- comment\n)\nSELECT * FROM u";
        let result = rename_cte(sql, "u", "x").unwrap();
        assert_eq!(
            result.sql,
            "WITH x AS (\n    SELECT id   FROM users -- comment\n)\nSELECT * FROM x"
        );
    }

    #[test]
    fn test_rename_roundtrip_is_identity() {
        let sql = "WITH a AS (SELECT 1), b AS (SELECT * FROM a) SELECT * FROM b";
        let there = rename_cte(sql, "a", "zzz").unwrap();
        let back = rename_cte(&there.sql, "zzz", "a").unwrap();
        let mut original = parse(sql).unwrap();
        let mut roundtripped = parse(&back.sql).unwrap();
        strip_metadata(&mut original);
        strip_metadata(&mut roundtripped);
        assert_eq!(original, roundtripped);
    }

    #[test]
    fn test_rename_missing_source_errors() {
        let sql = "WITH a AS (SELECT 1) SELECT * FROM a";
        assert!(matches!(
            rename_cte(sql, "ghost", "x").unwrap_err(),
            crate::error::SqlError::Schema(SchemaError::UnknownCte { .. })
        ));
    }

    #[test]
    fn test_rename_duplicate_target_errors() {
        let sql = "WITH a AS (SELECT 1), b AS (SELECT 2) SELECT * FROM a";
        assert!(matches!(
            rename_cte(sql, "a", "b").unwrap_err(),
            crate::error::SqlError::Schema(SchemaError::RenameTargetExists { .. })
        ));
    }

    #[test]
    fn test_rename_unsupported_root_errors() {
        assert!(rename_cte("SELECT 1", "a", "b").is_err());
        assert!(rename_cte("CREATE TABLE t (id int)", "a", "b").is_err());
    }

    #[test]
    fn test_shadowed_scope_untouched() {
        let sql = "WITH x AS (SELECT 1), \
                   y AS (WITH x AS (SELECT 2) SELECT * FROM x) \
                   SELECT * FROM x";
        let result = rename_cte(sql, "x", "renamed").unwrap();
        // The nested definition and its local reference keep their name.
        assert!(result.sql.contains("WITH x AS (SELECT 2) SELECT * FROM x"));
        assert!(result.sql.starts_with("WITH renamed AS (SELECT 1)"));
        assert!(result.sql.ends_with("SELECT * FROM renamed"));
    }

    #[test]
    fn test_quoted_references_stay_quoted() {
        let sql = "WITH \"My CTE\" AS (SELECT 1) SELECT * FROM \"My CTE\"";
        let result = rename_cte(sql, "My CTE", "Your CTE").unwrap();
        assert_eq!(
            result.sql,
            "WITH \"Your CTE\" AS (SELECT 1) SELECT * FROM \"Your CTE\""
        );
    }

    #[test]
    fn test_recursive_cte_self_references_renamed() {
        let sql = "WITH RECURSIVE t AS (SELECT 1 AS n UNION ALL SELECT n + 1 FROM t WHERE n < 5) \
                   SELECT * FROM t";
        let result = rename_cte(sql, "t", "seq").unwrap();
        assert!(result.sql.contains("WITH RECURSIVE seq AS"));
        assert!(result.sql.contains("FROM seq WHERE n < 5"));
        assert!(result.sql.ends_with("SELECT * FROM seq"));
    }
}
