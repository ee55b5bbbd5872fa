//! CTE dependency analysis.
//!
//! Builds a directed graph over the root WITH clause plus a synthetic
//! `MAIN_QUERY` node. An edge A -> B means A's body references B as a table
//! source. Self-edges of recursive CTEs are ignored; any other cycle is a
//! structured error.

use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use tracing::debug;

use crate::ast::{Query, Source, SourceExpr, Visit, visitor};
use crate::error::CycleError;

/// Name of the synthetic node representing the main query.
pub const MAIN_QUERY: &str = "MAIN_QUERY";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CteNode {
    pub name: String,
    /// CTEs this node's body references.
    pub dependencies: Vec<String>,
    /// Nodes whose bodies reference this CTE.
    pub dependents: Vec<String>,
    pub recursive: bool,
}

#[derive(Debug, Clone)]
pub struct CteDependencyGraph {
    /// All nodes in declaration order, `MAIN_QUERY` last.
    nodes: IndexMap<String, CteNode>,
    /// CTE names in a valid execution order (dependencies first).
    order: Vec<String>,
}

impl CteDependencyGraph {
    pub fn node(&self, name: &str) -> Option<&CteNode> {
        self.nodes.get(name)
    }

    pub fn main(&self) -> &CteNode {
        &self.nodes[MAIN_QUERY]
    }

    pub fn nodes(&self) -> impl Iterator<Item = &CteNode> {
        self.nodes.values()
    }

    /// CTE names in execution order (excluding `MAIN_QUERY`).
    pub fn topological_order(&self) -> &[String] {
        &self.order
    }

    /// The transitive dependencies of one node, in execution order,
    /// excluding the node itself.
    pub fn transitive_dependencies(&self, name: &str) -> Vec<String> {
        let mut wanted: FxHashSet<&str> = FxHashSet::default();
        let mut stack: Vec<&str> = self
            .node(name)
            .map(|n| n.dependencies.iter().map(String::as_str).collect())
            .unwrap_or_default();
        while let Some(dep) = stack.pop() {
            if dep != name && wanted.insert(dep) {
                if let Some(node) = self.node(dep) {
                    stack.extend(node.dependencies.iter().map(String::as_str));
                }
            }
        }
        self.order
            .iter()
            .filter(|n| wanted.contains(n.as_str()))
            .cloned()
            .collect()
    }
}

/// Analyze the root WITH clause of a query.
pub fn analyze_cte_dependencies(query: &Query) -> Result<CteDependencyGraph, CycleError> {
    let empty;
    let with = match query.with_clause() {
        Some(with) => with,
        None => {
            empty = crate::ast::WithClause::new(false);
            &empty
        }
    };

    let names: FxHashSet<String> = with.names().map(str::to_string).collect();
    let mut nodes: IndexMap<String, CteNode> = IndexMap::new();

    for table in &with.tables {
        let mut deps = references(&table.query, &names);
        let self_ref = deps.iter().any(|d| d == table.name.as_str());
        let recursive = with.recursive && self_ref;
        deps.retain(|d| d != table.name.as_str());
        nodes.insert(
            table.name.text.to_string(),
            CteNode {
                name: table.name.text.to_string(),
                dependencies: deps,
                dependents: Vec::new(),
                recursive,
            },
        );
        if self_ref && !with.recursive {
            // A non-recursive self-reference is a one-node cycle.
            return Err(CycleError {
                cycle: vec![table.name.text.to_string(), table.name.text.to_string()],
            });
        }
    }

    // The main query body: the query with its WITH detached.
    let mut main = query.clone();
    main.set_with(None);
    let main_deps = references(&main, &names);
    nodes.insert(
        MAIN_QUERY.to_string(),
        CteNode {
            name: MAIN_QUERY.to_string(),
            dependencies: main_deps,
            dependents: Vec::new(),
            recursive: false,
        },
    );

    // Dependents are the inverse edges.
    let edges: Vec<(String, String)> = nodes
        .values()
        .flat_map(|n| {
            n.dependencies
                .iter()
                .map(|d| (n.name.clone(), d.clone()))
                .collect::<Vec<_>>()
        })
        .collect();
    for (from, to) in edges {
        if let Some(node) = nodes.get_mut(&to) {
            node.dependents.push(from);
        }
    }

    let order = topological_order(&nodes)?;
    debug!(ctes = nodes.len() - 1, "analyzed CTE dependencies");
    Ok(CteDependencyGraph { nodes, order })
}

/// Kahn's algorithm over the CTE nodes (the main query is excluded from the
/// execution order). A stall means a cycle; walk it for the error.
fn topological_order(nodes: &IndexMap<String, CteNode>) -> Result<Vec<String>, CycleError> {
    let cte_names: Vec<&String> = nodes.keys().filter(|n| *n != MAIN_QUERY).collect();
    let mut remaining_deps: IndexMap<&str, FxHashSet<&str>> = cte_names
        .iter()
        .map(|name| {
            let deps: FxHashSet<&str> = nodes[*name]
                .dependencies
                .iter()
                .map(String::as_str)
                .collect();
            (name.as_str(), deps)
        })
        .collect();

    let mut order = Vec::new();
    while order.len() < cte_names.len() {
        let ready: Vec<&str> = remaining_deps
            .iter()
            .filter(|(_, deps)| deps.is_empty())
            .map(|(name, _)| *name)
            .collect();
        if ready.is_empty() {
            return Err(CycleError {
                cycle: find_cycle(nodes),
            });
        }
        for name in ready {
            remaining_deps.shift_remove(name);
            for deps in remaining_deps.values_mut() {
                deps.remove(name);
            }
            order.push(name.to_string());
        }
    }
    Ok(order)
}

/// Depth-first search for one concrete cycle, for the error message.
fn find_cycle(nodes: &IndexMap<String, CteNode>) -> Vec<String> {
    let mut visiting: Vec<&str> = Vec::new();
    let mut done: FxHashSet<&str> = FxHashSet::default();

    fn dfs<'a>(
        name: &'a str,
        nodes: &'a IndexMap<String, CteNode>,
        visiting: &mut Vec<&'a str>,
        done: &mut FxHashSet<&'a str>,
    ) -> Option<Vec<String>> {
        if let Some(pos) = visiting.iter().position(|n| *n == name) {
            let mut cycle: Vec<String> = visiting[pos..].iter().map(|n| n.to_string()).collect();
            cycle.push(name.to_string());
            return Some(cycle);
        }
        if done.contains(name) {
            return None;
        }
        visiting.push(name);
        if let Some(node) = nodes.get(name) {
            for dep in &node.dependencies {
                if let Some(cycle) = dfs(dep, nodes, visiting, done) {
                    return Some(cycle);
                }
            }
        }
        visiting.pop();
        done.insert(name);
        None
    }

    for name in nodes.keys().filter(|n| *n != MAIN_QUERY) {
        if let Some(cycle) = dfs(name, nodes, &mut visiting, &mut done) {
            return cycle;
        }
    }
    Vec::new()
}

/// Table-source references to names in `names`, shadowing-aware: a nested
/// WITH that redefines a name hides the outer definition inside its scope.
pub(crate) fn references(query: &Query, names: &FxHashSet<String>) -> Vec<String> {
    struct RefCollector<'a> {
        names: &'a FxHashSet<String>,
        shadowed: Vec<Vec<String>>,
        found: Vec<String>,
    }

    impl Visit for RefCollector<'_> {
        fn visit_query(&mut self, query: &Query) {
            let pushed = match query.with_clause() {
                Some(with) => {
                    self.shadowed
                        .push(with.names().map(str::to_string).collect());
                    true
                }
                None => false,
            };
            visitor::walk_query(self, query);
            if pushed {
                self.shadowed.pop();
            }
        }

        fn visit_source_expr(&mut self, source: &SourceExpr) {
            if let Source::Table(table) = &source.source
                && table.name.is_bare()
            {
                let name = table.name.name().as_str();
                let shadowed = self.shadowed.iter().any(|s| s.iter().any(|n| n == name));
                if !shadowed && self.names.contains(name) && !self.found.iter().any(|f| f == name)
                {
                    self.found.push(name.to_string());
                }
            }
            visitor::walk_source_expr(self, source);
        }
    }

    let mut collector = RefCollector {
        names,
        shadowed: Vec::new(),
        found: Vec::new(),
    };
    collector.visit_query(query);
    collector.found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn graph(sql: &str) -> Result<CteDependencyGraph, CycleError> {
        analyze_cte_dependencies(parse(sql).unwrap().as_query().unwrap())
    }

    #[test]
    fn test_linear_chain() {
        let g = graph(
            "WITH a AS (SELECT * FROM x), b AS (SELECT * FROM a WHERE v = 1) SELECT * FROM b",
        )
        .unwrap();
        assert_eq!(g.node("a").unwrap().dependencies, Vec::<String>::new());
        assert_eq!(g.node("b").unwrap().dependencies, vec!["a"]);
        assert_eq!(g.node("a").unwrap().dependents, vec!["b"]);
        assert_eq!(g.main().dependencies, vec!["b"]);
        assert_eq!(g.topological_order(), ["a", "b"]);
    }

    #[test]
    fn test_diamond_topological_order() {
        let g = graph(
            "WITH d AS (SELECT * FROM b JOIN c ON true), \
                  b AS (SELECT * FROM a), \
                  c AS (SELECT * FROM a), \
                  a AS (SELECT 1) \
             SELECT * FROM d",
        )
        .unwrap();
        let order = g.topological_order();
        let pos = |n: &str| order.iter().position(|x| x == n).unwrap();
        assert!(pos("a") < pos("b"));
        assert!(pos("a") < pos("c"));
        assert!(pos("b") < pos("d"));
        assert!(pos("c") < pos("d"));
    }

    #[test]
    fn test_cycle_is_error() {
        let err = graph("WITH a AS (SELECT * FROM b), b AS (SELECT * FROM a) SELECT * FROM a")
            .unwrap_err();
        assert!(err.cycle.contains(&"a".to_string()));
        assert!(err.cycle.contains(&"b".to_string()));
    }

    #[test]
    fn test_recursive_self_edge_is_ignored() {
        let g = graph(
            "WITH RECURSIVE t AS (SELECT 1 UNION ALL SELECT n + 1 FROM t) SELECT * FROM t",
        )
        .unwrap();
        let node = g.node("t").unwrap();
        assert!(node.recursive);
        assert!(node.dependencies.is_empty());
    }

    #[test]
    fn test_non_recursive_self_edge_is_cycle() {
        let err = graph("WITH t AS (SELECT * FROM t) SELECT 1").unwrap_err();
        assert_eq!(err.cycle, vec!["t", "t"]);
    }

    #[test]
    fn test_shadowed_names_do_not_create_edges() {
        let g = graph(
            "WITH a AS (SELECT 1), \
                  b AS (WITH a AS (SELECT 2) SELECT * FROM a) \
             SELECT * FROM b",
        )
        .unwrap();
        assert!(g.node("b").unwrap().dependencies.is_empty());
    }

    #[test]
    fn test_transitive_dependencies() {
        let g = graph(
            "WITH a AS (SELECT 1), b AS (SELECT * FROM a), c AS (SELECT * FROM b) \
             SELECT * FROM c",
        )
        .unwrap();
        assert_eq!(g.transitive_dependencies("c"), vec!["a", "b"]);
        assert_eq!(g.transitive_dependencies("a"), Vec::<String>::new());
    }

    #[test]
    fn test_query_without_with() {
        let g = graph("SELECT 1").unwrap();
        assert!(g.topological_order().is_empty());
        assert!(g.main().dependencies.is_empty());
    }
}
