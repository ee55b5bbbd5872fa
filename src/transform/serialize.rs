//! JSON serialize injection.
//!
//! Rewrites a query's select list into nested `jsonb_build_object` /
//! `jsonb_agg` expressions over the original query as a derived table, so
//! the database returns one hierarchical JSON value per root row.

use indexmap::IndexMap;
use serde::Deserialize;
use tracing::debug;

use crate::ast::{
    CommentSet, Expr, FromClause, GroupByClause, Ident, QualifiedName, Query, SelectClause,
    SelectItem, SelectQuery, SourceExpr, Statement, StatementBody,
};
use crate::error::Result;

/// The serialize option object: a root entity with nested entities.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct SerializeMapping {
    pub root: EntityMapping,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct EntityMapping {
    /// Output name of the JSON value.
    pub name: String,
    /// JSON key to source column (or alias) translations, in output order.
    pub columns: IndexMap<String, String>,
    #[serde(default)]
    pub children: Vec<ChildMapping>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ChildMapping {
    /// JSON key of the nested entity.
    pub name: String,
    pub relationship: Relationship,
    pub mapping: EntityMapping,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relationship {
    /// One nested object per row.
    Object,
    /// Rows aggregate into a JSON array, grouped by the root columns.
    Array,
}

const SOURCE_ALIAS: &str = "src";

/// Rewrite the statement's query per the mapping.
pub fn inject_serialize(stmt: &mut Statement, mapping: &SerializeMapping) -> Result<()> {
    let query = stmt.expect_query_mut()?;
    let original = query.clone();

    let has_array_child = mapping
        .root
        .children
        .iter()
        .any(|c| c.relationship == Relationship::Array);

    let root_object = build_object(&mapping.root, false);
    let item = SelectItem::aliased(root_object, Ident::new(mapping.root.name.as_str()));

    // Array children aggregate, so the root's own columns become the group
    // key.
    let group_by = has_array_child.then(|| GroupByClause {
        items: mapping
            .root
            .columns
            .values()
            .map(|column| source_column(column))
            .collect(),
        comments: CommentSet::new(),
    });

    let wrapped = SelectQuery {
        select: SelectClause {
            distinct: None,
            items: vec![item],
            comments: CommentSet::new(),
        },
        from: Some(FromClause::single(SourceExpr::subquery(
            original,
            SOURCE_ALIAS,
        ))),
        group_by,
        ..SelectQuery::default()
    };

    stmt.body = StatementBody::Query(Query::Select(wrapped));
    debug!(root = %mapping.root.name, "serialize injected");
    Ok(())
}

fn source_column(column: &str) -> Expr {
    Expr::column(QualifiedName::from_parts([SOURCE_ALIAS, column]))
}

/// `jsonb_build_object('key', src.col, …)` with nested children appended;
/// array children wrap their object in `jsonb_agg`.
fn build_object(entity: &EntityMapping, inside_aggregate: bool) -> Expr {
    let mut args = Vec::new();
    for (key, column) in &entity.columns {
        args.push(Expr::string(key.as_str()));
        args.push(source_column(column));
    }
    for child in &entity.children {
        args.push(Expr::string(child.name.as_str()));
        let child_object = build_object(&child.mapping, true);
        let value = match child.relationship {
            Relationship::Object => child_object,
            Relationship::Array if inside_aggregate => child_object,
            Relationship::Array => Expr::function("jsonb_agg", vec![child_object]),
        };
        args.push(value);
    }
    Expr::function("jsonb_build_object", args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::to_sql;
    use crate::parser::parse;
    use serde_json::json;

    fn mapping(value: serde_json::Value) -> SerializeMapping {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_flat_object_mapping() {
        let mut stmt = parse("SELECT id, name FROM users").unwrap();
        let mapping = mapping(json!({
            "root": {
                "name": "user",
                "columns": {"id": "id", "displayName": "name"}
            }
        }));
        inject_serialize(&mut stmt, &mapping).unwrap();
        assert_eq!(
            to_sql(&stmt).unwrap(),
            "SELECT jsonb_build_object('id', src.id, 'displayName', src.name) AS user \
             FROM (SELECT id, name FROM users) AS src"
        );
    }

    #[test]
    fn test_nested_object_child() {
        let mut stmt =
            parse("SELECT o.id, u.name FROM orders o JOIN users u ON u.id = o.user_id").unwrap();
        let mapping = mapping(json!({
            "root": {
                "name": "order",
                "columns": {"id": "id"},
                "children": [{
                    "name": "customer",
                    "relationship": "object",
                    "mapping": {"name": "customer", "columns": {"name": "name"}}
                }]
            }
        }));
        inject_serialize(&mut stmt, &mapping).unwrap();
        let sql = to_sql(&stmt).unwrap();
        assert!(
            sql.contains("'customer', jsonb_build_object('name', src.name)"),
            "got {sql}"
        );
        assert!(!sql.contains("GROUP BY"), "got {sql}");
    }

    #[test]
    fn test_array_child_aggregates_and_groups() {
        let mut stmt = parse(
            "SELECT u.id, u.name, o.total FROM users u JOIN orders o ON o.user_id = u.id",
        )
        .unwrap();
        let mapping = mapping(json!({
            "root": {
                "name": "user",
                "columns": {"id": "id", "name": "name"},
                "children": [{
                    "name": "orders",
                    "relationship": "array",
                    "mapping": {"name": "order", "columns": {"total": "total"}}
                }]
            }
        }));
        inject_serialize(&mut stmt, &mapping).unwrap();
        let sql = to_sql(&stmt).unwrap();
        assert!(
            sql.contains("'orders', jsonb_agg(jsonb_build_object('total', src.total))"),
            "got {sql}"
        );
        assert!(sql.ends_with("GROUP BY src.id, src.name"), "got {sql}");
    }

    #[test]
    fn test_mapping_rejects_unknown_keys() {
        let err = serde_json::from_value::<SerializeMapping>(json!({
            "root": {"name": "x", "columns": {}, "chilren": []}
        }));
        assert!(err.is_err());
    }

    #[test]
    fn test_serialized_output_reparses() {
        let mut stmt = parse("SELECT id, name FROM users").unwrap();
        let mapping = mapping(json!({
            "root": {"name": "user", "columns": {"id": "id"}}
        }));
        inject_serialize(&mut stmt, &mapping).unwrap();
        let sql = to_sql(&stmt).unwrap();
        assert!(parse(&sql).is_ok(), "generated SQL must reparse: {sql}");
    }
}
