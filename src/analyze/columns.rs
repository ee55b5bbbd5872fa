//! Column collectors.
//!
//! Two distinct jobs live here:
//! - the selectable-column collector: the logical output columns of a query,
//!   expanding wildcards through CTEs, sub-queries, and (for physical tables)
//!   a caller-supplied resolver;
//! - the column-reference walkers: every qualified-name reference in
//!   expression position anywhere in the tree, including CTE internals,
//!   with a mutable variant for rename engines.

use rustc_hash::FxHashMap;

use crate::ast::{
    ColumnRef, Expr, Query, SelectItem, Source, SourceExpr, Statement, Visit, VisitMut,
    visitor, visitor_mut,
};
use crate::ast::QualifiedName;
use crate::error::ResolveError;

/// Resolves a physical table name to its column names.
///
/// Invoked at most once per distinct table per collection walk; results are
/// memoized internally.
pub trait TableColumnResolver {
    /// `None` means the table is unknown to the resolver.
    fn columns(&self, table: &QualifiedName) -> Option<Vec<String>>;
}

impl<F> TableColumnResolver for F
where
    F: Fn(&QualifiedName) -> Option<Vec<String>>,
{
    fn columns(&self, table: &QualifiedName) -> Option<Vec<String>> {
        self(table)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ColumnCollectOptions {
    /// Drop later duplicates of the same output name.
    pub dedupe: bool,
    pub case_insensitive: bool,
}

/// One logical output column of a query.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectableColumn {
    /// The output name (alias, or the bare column name). `None` for unnamed
    /// computed expressions.
    pub name: Option<String>,
    /// The defining expression, when one exists in the tree.
    pub expr: Option<Expr>,
    /// The qualified name this column came from, for provenance.
    pub origin: Option<QualifiedName>,
    /// An unexpanded `*` retained because no resolver could expand it.
    pub wildcard: bool,
}

impl SelectableColumn {
    fn named(name: impl Into<String>, expr: Option<Expr>, origin: Option<QualifiedName>) -> Self {
        Self {
            name: Some(name.into()),
            expr,
            origin,
            wildcard: false,
        }
    }

    fn opaque_wildcard(origin: Option<QualifiedName>) -> Self {
        Self {
            name: None,
            expr: None,
            origin,
            wildcard: true,
        }
    }
}

/// Collect the logical output columns of a query.
pub fn collect_columns(
    query: &Query,
    resolver: Option<&dyn TableColumnResolver>,
    options: &ColumnCollectOptions,
) -> Result<Vec<SelectableColumn>, ResolveError> {
    let mut ctx = Collector {
        resolver,
        memo: FxHashMap::default(),
        options,
    };
    let mut columns = ctx.query_columns(query, &[])?;
    if options.dedupe {
        let mut seen: Vec<String> = Vec::new();
        columns.retain(|c| match &c.name {
            Some(name) => {
                let key = if options.case_insensitive {
                    name.to_lowercase()
                } else {
                    name.clone()
                };
                if seen.contains(&key) {
                    false
                } else {
                    seen.push(key);
                    true
                }
            }
            None => true,
        });
    }
    Ok(columns)
}

struct Collector<'a> {
    resolver: Option<&'a dyn TableColumnResolver>,
    memo: FxHashMap<String, Option<Vec<String>>>,
    options: &'a ColumnCollectOptions,
}

/// CTEs visible while expanding a wildcard: innermost scope last.
type CteScope<'a> = [&'a crate::ast::WithClause];

impl<'a> Collector<'a> {
    fn query_columns(
        &mut self,
        query: &Query,
        outer: &CteScope<'_>,
    ) -> Result<Vec<SelectableColumn>, ResolveError> {
        match query {
            Query::Select(select) => {
                let mut scope: Vec<&crate::ast::WithClause> = outer.to_vec();
                if let Some(with) = &select.with {
                    scope.push(with);
                }
                let mut columns = Vec::new();
                for item in &select.select.items {
                    match item {
                        SelectItem::Expr(item) => {
                            let origin = match &item.expr {
                                Expr::Column(column) => Some(column.name.clone()),
                                _ => None,
                            };
                            columns.push(SelectableColumn {
                                name: item
                                    .alias
                                    .as_ref()
                                    .map(|a| a.text.to_string())
                                    .or_else(|| origin.as_ref().map(|o| o.name().text.to_string())),
                                expr: Some(item.expr.clone()),
                                origin,
                                wildcard: false,
                            });
                        }
                        SelectItem::Wildcard(wildcard) => {
                            let expanded = self.expand_wildcard(
                                select,
                                wildcard.qualifier.as_ref(),
                                &scope,
                            )?;
                            columns.extend(expanded);
                        }
                    }
                }
                Ok(columns)
            }
            Query::Binary(binary) => {
                let mut scope: Vec<&crate::ast::WithClause> = outer.to_vec();
                if let Some(with) = &binary.with {
                    scope.push(with);
                }
                // Output shape follows the left arm.
                self.query_columns(&binary.left, &scope)
            }
            Query::Values(values) => {
                let width = values.rows.first().map(Vec::len).unwrap_or(0);
                Ok((1..=width)
                    .map(|i| {
                        SelectableColumn::named(
                            format!("column{i}"),
                            values.rows.first().and_then(|row| row.get(i - 1)).cloned(),
                            None,
                        )
                    })
                    .collect())
            }
        }
    }

    fn expand_wildcard(
        &mut self,
        select: &crate::ast::SelectQuery,
        qualifier: Option<&QualifiedName>,
        scope: &CteScope<'_>,
    ) -> Result<Vec<SelectableColumn>, ResolveError> {
        let Some(from) = &select.from else {
            return Ok(vec![SelectableColumn::opaque_wildcard(qualifier.cloned())]);
        };

        let mut sources: Vec<&SourceExpr> = Vec::new();
        for item in &from.items {
            collect_sources(&item.source, &mut sources);
            for join in &item.joins {
                collect_sources(&join.source, &mut sources);
            }
        }

        let mut columns = Vec::new();
        for source in sources {
            if let Some(qualifier) = qualifier {
                let matches = source.scope_name().is_some_and(|name| {
                    qualifier.is_bare_name(name, self.options.case_insensitive)
                });
                if !matches {
                    continue;
                }
            }
            columns.extend(self.source_columns(source, scope)?);
        }

        if columns.is_empty() {
            // Qualifier did not match any source; keep the marker rather
            // than inventing columns.
            columns.push(SelectableColumn::opaque_wildcard(qualifier.cloned()));
        }
        Ok(columns)
    }

    fn source_columns(
        &mut self,
        source: &SourceExpr,
        scope: &CteScope<'_>,
    ) -> Result<Vec<SelectableColumn>, ResolveError> {
        // An explicit alias column list wins.
        if let Some(alias) = &source.alias
            && !alias.columns.is_empty()
        {
            return Ok(alias
                .columns
                .iter()
                .map(|c| SelectableColumn::named(c.text.to_string(), None, None))
                .collect());
        }

        match &source.source {
            Source::Table(table) => {
                // A bare name may refer to a CTE in scope (innermost wins).
                if table.name.is_bare() {
                    let name = table.name.name();
                    for with in scope.iter().rev() {
                        if let Some(cte) = with.tables.iter().find(|t| {
                            t.name.matches(name.as_str(), self.options.case_insensitive)
                        }) {
                            if !cte.columns.is_empty() {
                                return Ok(cte
                                    .columns
                                    .iter()
                                    .map(|c| {
                                        SelectableColumn::named(c.text.to_string(), None, None)
                                    })
                                    .collect());
                            }
                            return self.query_columns(&cte.query, scope);
                        }
                    }
                }
                self.physical_table_columns(&table.name)
            }
            Source::Query(query) => self.query_columns(&query.query, scope),
            Source::Values(values) => {
                let width = values.rows.first().map(Vec::len).unwrap_or(0);
                Ok((1..=width)
                    .map(|i| SelectableColumn::named(format!("column{i}"), None, None))
                    .collect())
            }
            Source::Function(function) => {
                // Without a catalog the output of a set-returning function is
                // its own name.
                Ok(vec![SelectableColumn::named(
                    function.call.name.name().text.to_string(),
                    None,
                    Some(function.call.name.clone()),
                )])
            }
            Source::Paren(inner) => self.source_columns(&inner.source, scope),
        }
    }

    fn physical_table_columns(
        &mut self,
        table: &QualifiedName,
    ) -> Result<Vec<SelectableColumn>, ResolveError> {
        let Some(resolver) = self.resolver else {
            return Ok(vec![SelectableColumn::opaque_wildcard(Some(table.clone()))]);
        };
        let key = table.key();
        let resolved = self
            .memo
            .entry(key)
            .or_insert_with(|| resolver.columns(table))
            .clone();
        match resolved {
            Some(columns) if columns.is_empty() => Err(ResolveError::EmptyWildcard {
                table: table.key(),
            }),
            Some(columns) => Ok(columns
                .into_iter()
                .map(|c| SelectableColumn::named(c, None, Some(table.clone())))
                .collect()),
            // Unknown to the resolver: keep the marker.
            None => Ok(vec![SelectableColumn::opaque_wildcard(Some(table.clone()))]),
        }
    }
}

fn collect_sources<'q>(source: &'q SourceExpr, out: &mut Vec<&'q SourceExpr>) {
    match &source.source {
        Source::Paren(inner) => {
            collect_sources(&inner.source, out);
            for join in &inner.joins {
                collect_sources(&join.source, out);
            }
        }
        _ => out.push(source),
    }
}

// ============================================================================
// Column-reference walkers
// ============================================================================

struct RefWalker<F: FnMut(&ColumnRef)> {
    f: F,
}

impl<F: FnMut(&ColumnRef)> Visit for RefWalker<F> {
    fn visit_column_ref(&mut self, column: &ColumnRef) {
        (self.f)(column);
        visitor::walk_column_ref(self, column);
    }
}

/// Visit every column reference in expression position, including inside CTE
/// bodies and sub-queries. No deduplication.
pub fn for_each_column_ref<F: FnMut(&ColumnRef)>(stmt: &Statement, f: F) {
    let mut walker = RefWalker { f };
    walker.visit_statement(stmt);
}

struct RefWalkerMut<F: FnMut(&mut ColumnRef)> {
    f: F,
}

impl<F: FnMut(&mut ColumnRef)> VisitMut for RefWalkerMut<F> {
    fn visit_column_ref_mut(&mut self, column: &mut ColumnRef) {
        (self.f)(column);
        visitor_mut::walk_column_ref_mut(self, column);
    }
}

/// The mutable walk: hands out `&mut` so callers (rename engines) can edit
/// references in place.
pub fn for_each_column_ref_mut<F: FnMut(&mut ColumnRef)>(stmt: &mut Statement, f: F) {
    let mut walker = RefWalkerMut { f };
    walker.visit_statement_mut(stmt);
}

/// Clone every column reference, in walk order.
pub fn collect_column_refs(stmt: &Statement) -> Vec<ColumnRef> {
    let mut refs = Vec::new();
    for_each_column_ref(stmt, |column| refs.push(column.clone()));
    refs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn query(sql: &str) -> Query {
        parse(sql).unwrap().into_query().unwrap()
    }

    fn names(columns: &[SelectableColumn]) -> Vec<Option<&str>> {
        columns.iter().map(|c| c.name.as_deref()).collect()
    }

    struct FixedResolver;

    impl TableColumnResolver for FixedResolver {
        fn columns(&self, table: &QualifiedName) -> Option<Vec<String>> {
            match table.name().as_str() {
                "users" => Some(vec!["id".into(), "name".into(), "status".into()]),
                "empty" => Some(vec![]),
                _ => None,
            }
        }
    }

    #[test]
    fn test_plain_columns_and_aliases() {
        let q = query("SELECT id, u.name AS username, 1 + 1 FROM users u");
        let columns = collect_columns(&q, None, &ColumnCollectOptions::default()).unwrap();
        assert_eq!(
            names(&columns),
            vec![Some("id"), Some("username"), None]
        );
        assert_eq!(columns[1].origin.as_ref().unwrap().key(), "u.name");
    }

    #[test]
    fn test_wildcard_without_resolver_is_opaque() {
        let q = query("SELECT * FROM users");
        let columns = collect_columns(&q, None, &ColumnCollectOptions::default()).unwrap();
        assert_eq!(columns.len(), 1);
        assert!(columns[0].wildcard);
    }

    #[test]
    fn test_wildcard_with_resolver() {
        let q = query("SELECT * FROM users");
        let columns =
            collect_columns(&q, Some(&FixedResolver), &ColumnCollectOptions::default()).unwrap();
        assert_eq!(names(&columns), vec![Some("id"), Some("name"), Some("status")]);
    }

    #[test]
    fn test_wildcard_empty_resolver_errors() {
        let q = query("SELECT * FROM empty");
        let err = collect_columns(&q, Some(&FixedResolver), &ColumnCollectOptions::default())
            .unwrap_err();
        assert_eq!(err, ResolveError::EmptyWildcard { table: "empty".into() });
    }

    #[test]
    fn test_qualified_wildcard_targets_one_source() {
        let q = query("SELECT u.* FROM users u JOIN orders o ON u.id = o.user_id");
        let columns =
            collect_columns(&q, Some(&FixedResolver), &ColumnCollectOptions::default()).unwrap();
        assert_eq!(names(&columns), vec![Some("id"), Some("name"), Some("status")]);
    }

    #[test]
    fn test_wildcard_through_cte() {
        let q = query("WITH u AS (SELECT id, status FROM users) SELECT * FROM u");
        let columns = collect_columns(&q, None, &ColumnCollectOptions::default()).unwrap();
        assert_eq!(names(&columns), vec![Some("id"), Some("status")]);
    }

    #[test]
    fn test_wildcard_through_subquery_and_alias_list() {
        let q = query("SELECT * FROM (SELECT 1, 2) AS t(a, b)");
        let columns = collect_columns(&q, None, &ColumnCollectOptions::default()).unwrap();
        assert_eq!(names(&columns), vec![Some("a"), Some("b")]);
    }

    #[test]
    fn test_binary_query_uses_left_shape() {
        let q = query("SELECT id, name FROM a UNION SELECT x, y FROM b");
        let columns = collect_columns(&q, None, &ColumnCollectOptions::default()).unwrap();
        assert_eq!(names(&columns), vec![Some("id"), Some("name")]);
    }

    #[test]
    fn test_values_columns() {
        let q = query("VALUES (1, 'a')");
        let columns = collect_columns(&q, None, &ColumnCollectOptions::default()).unwrap();
        assert_eq!(names(&columns), vec![Some("column1"), Some("column2")]);
    }

    #[test]
    fn test_dedupe_option() {
        let q = query("SELECT id, id FROM users");
        let all = collect_columns(&q, None, &ColumnCollectOptions::default()).unwrap();
        assert_eq!(all.len(), 2);
        let deduped = collect_columns(
            &q,
            None,
            &ColumnCollectOptions {
                dedupe: true,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(deduped.len(), 1);
    }

    #[test]
    fn test_column_refs_traverse_cte_internals() {
        let stmt = parse(
            "WITH u AS (SELECT id FROM users WHERE active) \
             SELECT u.id FROM u WHERE u.id > (SELECT min(id) FROM u)",
        )
        .unwrap();
        let refs = collect_column_refs(&stmt);
        let keys: Vec<String> = refs.iter().map(|r| r.name.key()).collect();
        assert!(keys.contains(&"active".to_string()));
        assert!(keys.contains(&"u.id".to_string()));
        assert!(keys.iter().filter(|k| *k == "u.id").count() >= 2);
    }

    #[test]
    fn test_mutable_walk_edits_in_place() {
        let mut stmt = parse("SELECT a FROM t WHERE a > 1").unwrap();
        for_each_column_ref_mut(&mut stmt, |column| {
            if column.name.is_bare_name("a", false) {
                column.name.name_mut().text = "b".into();
            }
        });
        let sql = crate::format::to_sql(&stmt).unwrap();
        assert_eq!(sql, "SELECT b FROM t WHERE b > 1");
    }
}
