//! CTE disabler: inline every CTE reference as a sub-query source and drop
//! the WITH clause. For planners and export paths that do not support CTEs.

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::analyze::analyze_cte_dependencies;
use crate::ast::{
    Query, QuerySource, Source, SourceAlias, SourceExpr, VisitMut, visitor_mut,
};
use crate::error::{Result, SchemaError};

/// Inline all root-level CTEs into their reference sites.
///
/// Recursive CTEs have no finite expansion and are refused.
pub fn disable_ctes(query: &Query) -> Result<Query> {
    let Some(with) = query.with_clause() else {
        return Ok(query.clone());
    };

    let graph = analyze_cte_dependencies(query)?;
    for node in graph.nodes() {
        if node.recursive {
            return Err(SchemaError::RecursiveCte {
                name: node.name.clone(),
            }
            .into());
        }
    }

    // Fully inline each body in execution order, so later bodies can reuse
    // the already-inlined earlier ones.
    let mut inlined: FxHashMap<String, Query> = FxHashMap::default();
    for name in graph.topological_order() {
        let table = with.get(name).expect("cte present");
        let mut body = (*table.query).clone();
        replace_references(&mut body, &inlined);
        inlined.insert(name.clone(), body);
    }

    let mut main = query.clone();
    main.take_with();
    replace_references(&mut main, &inlined);
    debug!(ctes = inlined.len(), "inlined CTEs");
    Ok(main)
}

/// Swap table sources naming an inlined CTE for its body as a sub-query,
/// keeping the original name visible through an alias. A nested WITH that
/// redefines a name shadows it.
fn replace_references(query: &mut Query, inlined: &FxHashMap<String, Query>) {
    struct Replacer<'a> {
        inlined: &'a FxHashMap<String, Query>,
        shadowed: Vec<Vec<String>>,
    }

    impl VisitMut for Replacer<'_> {
        fn visit_query_mut(&mut self, query: &mut Query) {
            let pushed = match query.with_clause() {
                Some(with) => {
                    self.shadowed
                        .push(with.names().map(str::to_string).collect());
                    true
                }
                None => false,
            };
            visitor_mut::walk_query_mut(self, query);
            if pushed {
                self.shadowed.pop();
            }
        }

        fn visit_source_expr_mut(&mut self, source: &mut SourceExpr) {
            if let Source::Table(table) = &source.source
                && table.name.is_bare()
            {
                let name = table.name.name().text.to_string();
                let shadowed = self.shadowed.iter().any(|s| s.iter().any(|n| *n == name));
                if !shadowed && let Some(body) = self.inlined.get(&name) {
                    source.source = Source::Query(QuerySource {
                        query: Box::new(body.clone()),
                        lateral: false,
                    });
                    if source.alias.is_none() {
                        source.alias = Some(SourceAlias {
                            name: crate::ast::Ident::new(name),
                            columns: Vec::new(),
                        });
                    }
                    // The inlined body was already fully expanded; no need
                    // to descend into it.
                    return;
                }
            }
            visitor_mut::walk_source_expr_mut(self, source);
        }
    }

    let mut replacer = Replacer {
        inlined,
        shadowed: Vec::new(),
    };
    replacer.visit_query_mut(query);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::query_to_sql;
    use crate::parser::parse;

    fn query(sql: &str) -> Query {
        parse(sql).unwrap().into_query().unwrap()
    }

    #[test]
    fn test_inline_single_cte() {
        let q = query("WITH u AS (SELECT id FROM users) SELECT * FROM u WHERE id > 1");
        let inlined = disable_ctes(&q).unwrap();
        assert_eq!(
            query_to_sql(&inlined).unwrap(),
            "SELECT * FROM (SELECT id FROM users) AS u WHERE id > 1"
        );
    }

    #[test]
    fn test_inline_chained_ctes() {
        let q = query(
            "WITH a AS (SELECT id FROM x), b AS (SELECT id FROM a) SELECT * FROM b",
        );
        let inlined = disable_ctes(&q).unwrap();
        assert_eq!(
            query_to_sql(&inlined).unwrap(),
            "SELECT * FROM (SELECT id FROM (SELECT id FROM x) AS a) AS b"
        );
    }

    #[test]
    fn test_inline_preserves_existing_alias() {
        let q = query("WITH u AS (SELECT 1) SELECT * FROM u AS alias_name");
        let inlined = disable_ctes(&q).unwrap();
        assert_eq!(
            query_to_sql(&inlined).unwrap(),
            "SELECT * FROM (SELECT 1) AS alias_name"
        );
    }

    #[test]
    fn test_inline_into_joins_and_subqueries() {
        let q = query(
            "WITH u AS (SELECT id FROM users) \
             SELECT * FROM orders o JOIN u ON u.id = o.user_id \
             WHERE EXISTS (SELECT 1 FROM u WHERE u.id = o.user_id)",
        );
        let sql = query_to_sql(&disable_ctes(&q).unwrap()).unwrap();
        assert!(!sql.starts_with("WITH"), "got {sql}");
        assert!(sql.contains("JOIN (SELECT id FROM users) AS u"), "got {sql}");
        assert!(
            sql.contains("EXISTS (SELECT 1 FROM (SELECT id FROM users) AS u"),
            "got {sql}"
        );
    }

    #[test]
    fn test_recursive_cte_refuses() {
        let q = query(
            "WITH RECURSIVE t AS (SELECT 1 UNION ALL SELECT n + 1 FROM t) SELECT * FROM t",
        );
        assert!(matches!(
            disable_ctes(&q).unwrap_err(),
            crate::error::SqlError::Schema(SchemaError::RecursiveCte { .. })
        ));
    }

    #[test]
    fn test_shadowed_name_untouched() {
        let q = query(
            "WITH x AS (SELECT 1 AS a) \
             SELECT * FROM (WITH x AS (SELECT 2 AS a) SELECT * FROM x) AS inner_q, x",
        );
        let sql = query_to_sql(&disable_ctes(&q).unwrap()).unwrap();
        // The inner `x` keeps referring to the nested definition.
        assert!(sql.contains("WITH x AS (SELECT 2 AS a) SELECT * FROM x"), "got {sql}");
        // The outer reference is inlined.
        assert!(sql.contains("(SELECT 1 AS a) AS x"), "got {sql}");
    }
}
