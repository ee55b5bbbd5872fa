//! CTE decomposition: standalone executable queries per definition.
//!
//! Each decomposed item is the CTE's own body as the main query, prefixed by
//! a WITH carrying every transitive dependency in topological order, the
//! shape an editor can run section by section. `synchronize` recomposes
//! independently edited bodies into one statement and re-decomposes.

use tracing::debug;

use crate::analyze::analyze_cte_dependencies;
use crate::ast::{CommonTable, Query, Statement, WithClause};
use crate::error::{Result, SchemaError};
use crate::format::to_sql;
use crate::parser::parse;

/// One standalone executable slice of a WITH query.
#[derive(Debug, Clone, PartialEq)]
pub struct DecomposedCte {
    pub name: String,
    /// The standalone query: dependencies as a WITH prefix, the CTE's own
    /// body as the main query.
    pub query: Query,
    /// Direct and indirect dependencies, in execution order.
    pub dependencies: Vec<String>,
}

/// Decompose every CTE of the query's root WITH clause, in declaration
/// order.
pub fn decompose_ctes(query: &Query) -> Result<Vec<DecomposedCte>> {
    let graph = analyze_cte_dependencies(query)?;
    let Some(with) = query.with_clause() else {
        return Ok(Vec::new());
    };

    let mut items = Vec::new();
    for table in &with.tables {
        let name = table.name.text.to_string();
        items.push(build_standalone(&name, with, &graph)?);
    }
    debug!(count = items.len(), "decomposed CTEs");
    Ok(items)
}

/// The standalone executable query for one named CTE.
pub fn extract_cte(query: &Query, name: &str) -> Result<Query> {
    let graph = analyze_cte_dependencies(query)?;
    let with = query
        .with_clause()
        .ok_or_else(|| SchemaError::UnknownCte {
            name: name.to_string(),
        })?;
    if with.get(name).is_none() {
        return Err(SchemaError::UnknownCte {
            name: name.to_string(),
        }
        .into());
    }
    Ok(build_standalone(name, with, &graph)?.query)
}

fn build_standalone(
    name: &str,
    with: &WithClause,
    graph: &crate::analyze::CteDependencyGraph,
) -> Result<DecomposedCte> {
    let table = with.get(name).expect("cte present");
    let node = graph.node(name).expect("node present");
    let dependencies = graph.transitive_dependencies(name);

    if node.recursive {
        // A recursive CTE cannot stand alone: keep its WITH RECURSIVE form
        // and select from it trivially.
        let mut standalone_with = WithClause::new(true);
        for dep in &dependencies {
            push_dep(&mut standalone_with, with, dep)?;
        }
        standalone_with.push(strip_cte(table))?;
        let mut query = trivial_select(name);
        query.set_with(Some(standalone_with));
        return Ok(DecomposedCte {
            name: name.to_string(),
            query,
            dependencies,
        });
    }

    let mut query = (*table.query).clone();
    if !dependencies.is_empty() {
        let recursive_dep = dependencies
            .iter()
            .any(|d| graph.node(d).is_some_and(|n| n.recursive));
        let mut standalone_with = WithClause::new(recursive_dep);
        for dep in &dependencies {
            push_dep(&mut standalone_with, with, dep)?;
        }
        // A WITH already present on the body shadows same-named deps.
        if let Some(own) = query.take_with() {
            standalone_with.recursive |= own.recursive;
            for table in own.tables {
                if standalone_with.get(table.name.as_str()).is_none() {
                    standalone_with.push(table)?;
                } else {
                    return Err(SchemaError::DuplicateCte {
                        name: table.name.text.to_string(),
                    }
                    .into());
                }
            }
        }
        query.set_with(Some(standalone_with));
    }

    Ok(DecomposedCte {
        name: name.to_string(),
        query,
        dependencies,
    })
}

fn push_dep(target: &mut WithClause, with: &WithClause, name: &str) -> Result<()> {
    let table = with.get(name).ok_or_else(|| SchemaError::UnknownCte {
        name: name.to_string(),
    })?;
    target.push(strip_cte(table))?;
    Ok(())
}

/// Clone a definition without its source spans (it will live in new text).
fn strip_cte(table: &CommonTable) -> CommonTable {
    let mut cloned = table.clone();
    cloned.span = None;
    cloned
}

fn trivial_select(name: &str) -> Query {
    use crate::ast::{
        CommentSet, FromClause, QualifiedName, SelectClause, SelectItem, SelectQuery, SourceExpr,
    };
    Query::Select(SelectQuery {
        select: SelectClause {
            distinct: None,
            items: vec![SelectItem::wildcard()],
            comments: CommentSet::new(),
        },
        from: Some(FromClause::single(SourceExpr::table(QualifiedName::bare(
            name,
        )))),
        ..SelectQuery::default()
    })
}

/// Re-compose independently edited CTE bodies into the root query, render
/// and reparse it, then decompose again. The reparse validates the edits
/// compose into one well-formed statement.
pub fn synchronize(
    edited: &[(String, Query)],
    root: &Query,
) -> Result<(Statement, Vec<DecomposedCte>)> {
    let mut recomposed = root.clone();
    {
        let with = recomposed
            .with_clause_mut()
            .ok_or(SchemaError::UnsupportedRoot("query without WITH clause"))?;
        for (name, body) in edited {
            let table = with.get_mut(name).ok_or_else(|| SchemaError::UnknownCte {
                name: name.clone(),
            })?;
            // An edited standalone body may carry the dependency prefix it
            // was decomposed with; the definition keeps only its own body.
            let mut body = body.clone();
            body.set_with(None);
            table.query = Box::new(body);
        }
    }

    let statement = Statement::from(recomposed);
    let sql = to_sql(&statement)?;
    let reparsed = parse(&sql)?;
    let decomposed = decompose_ctes(reparsed.as_query().expect("query statement"))?;
    Ok((reparsed, decomposed))
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
    fn test_decompose_linear_chain() {
        let q = query(
            "WITH a AS (SELECT * FROM x), b AS (SELECT * FROM a WHERE v = 1) SELECT * FROM b",
        );
        let items = decompose_ctes(&q).unwrap();
        assert_eq!(items.len(), 2);

        assert_eq!(items[0].name, "a");
        assert_eq!(items[0].dependencies, Vec::<String>::new());
        assert_eq!(query_to_sql(&items[0].query).unwrap(), "SELECT * FROM x");

        assert_eq!(items[1].name, "b");
        assert_eq!(items[1].dependencies, vec!["a"]);
        assert_eq!(
            query_to_sql(&items[1].query).unwrap(),
            "WITH a AS (SELECT * FROM x) SELECT * FROM a WHERE v = 1"
        );
    }

    #[test]
    fn test_decompose_orders_dependencies_topologically() {
        let q = query(
            "WITH c AS (SELECT * FROM b), b AS (SELECT * FROM a), a AS (SELECT 1) \
             SELECT * FROM c",
        );
        let items = decompose_ctes(&q).unwrap();
        let c = items.iter().find(|i| i.name == "c").unwrap();
        assert_eq!(c.dependencies, vec!["a", "b"]);
        assert_eq!(
            query_to_sql(&c.query).unwrap(),
            "WITH a AS (SELECT 1), b AS (SELECT * FROM a) SELECT * FROM b"
        );
    }

    #[test]
    fn test_decompose_recursive_kept_whole() {
        let q = query(
            "WITH RECURSIVE t AS (SELECT 1 AS n UNION ALL SELECT n + 1 FROM t WHERE n < 5) \
             SELECT * FROM t",
        );
        let items = decompose_ctes(&q).unwrap();
        let sql = query_to_sql(&items[0].query).unwrap();
        assert!(sql.starts_with("WITH RECURSIVE t AS ("), "got {sql}");
        assert!(sql.ends_with("SELECT * FROM t"), "got {sql}");
    }

    #[test]
    fn test_decompose_cycle_errors() {
        let q = query("WITH a AS (SELECT * FROM b), b AS (SELECT * FROM a) SELECT * FROM a");
        assert!(decompose_ctes(&q).is_err());
    }

    #[test]
    fn test_extract_cte() {
        let q = query(
            "WITH a AS (SELECT * FROM x), b AS (SELECT * FROM a) SELECT * FROM b",
        );
        let standalone = extract_cte(&q, "b").unwrap();
        assert_eq!(
            query_to_sql(&standalone).unwrap(),
            "WITH a AS (SELECT * FROM x) SELECT * FROM a"
        );
        assert!(matches!(
            extract_cte(&q, "missing").unwrap_err(),
            crate::error::SqlError::Schema(SchemaError::UnknownCte { .. })
        ));
    }

    #[test]
    fn test_synchronize_roundtrip() {
        let root = query(
            "WITH a AS (SELECT id FROM x), b AS (SELECT * FROM a) SELECT * FROM b",
        );
        // Edit `a` as if it had been decomposed, tweaked, and handed back.
        let edited_a = query("SELECT id, extra FROM x");
        let (statement, decomposed) =
            synchronize(&[("a".to_string(), edited_a)], &root).unwrap();
        let sql = to_sql(&statement).unwrap();
        assert!(sql.contains("a AS (SELECT id, extra FROM x)"), "got {sql}");
        assert_eq!(decomposed.len(), 2);
        assert_eq!(decomposed[1].dependencies, vec!["a"]);
    }
}
