//! Physical-table collector.

use rustc_hash::FxHashSet;

use crate::ast::{Query, Source, SourceExpr, Statement, TableSource, Visit, visitor};

struct TableCollector {
    found: Vec<crate::ast::QualifiedName>,
    /// CTE names visible in the scopes entered so far.
    cte_names: Vec<FxHashSet<String>>,
}

impl TableCollector {
    fn is_cte_reference(&self, table: &TableSource) -> bool {
        table.name.is_bare()
            && self
                .cte_names
                .iter()
                .any(|scope| scope.contains(table.name.name().as_str()))
    }
}

impl Visit for TableCollector {
    fn visit_query(&mut self, query: &Query) {
        let pushed = match query.with_clause() {
            Some(with) => {
                self.cte_names
                    .push(with.names().map(str::to_string).collect());
                true
            }
            None => false,
        };
        visitor::walk_query(self, query);
        if pushed {
            self.cte_names.pop();
        }
    }

    fn visit_source_expr(&mut self, source: &SourceExpr) {
        if let Source::Table(table) = &source.source
            && !self.is_cte_reference(table)
            && !self.found.contains(&table.name)
        {
            self.found.push(table.name.clone());
        }
        visitor::walk_source_expr(self, source);
    }
}

/// Physical tables referenced as sources anywhere in the statement, in
/// first-encounter order. References to in-scope CTE names are excluded.
pub fn collect_tables(stmt: &Statement) -> Vec<crate::ast::QualifiedName> {
    let mut collector = TableCollector {
        found: Vec::new(),
        cte_names: Vec::new(),
    };
    collector.visit_statement(stmt);
    collector.found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn keys(sql: &str) -> Vec<String> {
        collect_tables(&parse(sql).unwrap())
            .iter()
            .map(|n| n.key())
            .collect()
    }

    #[test]
    fn test_excludes_cte_references() {
        assert_eq!(
            keys("WITH u AS (SELECT * FROM users) SELECT * FROM u JOIN orders o ON true"),
            vec!["users", "orders"]
        );
    }

    #[test]
    fn test_qualified_names_are_not_cte_refs() {
        assert_eq!(
            keys("WITH users AS (SELECT 1) SELECT * FROM public.users, users"),
            vec!["public.users"]
        );
    }

    #[test]
    fn test_first_encounter_order_dedup() {
        assert_eq!(
            keys("SELECT * FROM a, b WHERE EXISTS (SELECT 1 FROM a)"),
            vec!["a", "b"]
        );
    }
}
