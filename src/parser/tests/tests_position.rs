#![allow(clippy::unwrap_used)]

use rstest::rstest;

use crate::parser::{
    ClauseContext, ParserOptions, detect_cte_at_cursor, get_cte_regions, parse_to_position,
};

fn at_end(sql: &str) -> crate::parser::PositionParse {
    parse_to_position(sql, 1, sql.len() as u32 + 1, &ParserOptions::default())
}

#[rstest]
#[case("SELECT id, na", ClauseContext::SelectList)]
#[case("SELECT * FROM use", ClauseContext::From)]
#[case("SELECT * FROM users WHERE act", ClauseContext::Where)]
#[case("SELECT * FROM a JOIN b ON a.i", ClauseContext::JoinCondition)]
#[case("SELECT * FROM t GROUP BY ", ClauseContext::GroupBy)]
#[case("SELECT * FROM t ORDER BY ", ClauseContext::OrderBy)]
#[case("WITH u AS ", ClauseContext::With)]
#[case("UPDATE t SET co", ClauseContext::UpdateSet)]
#[case("INSERT INTO t (a) VALUES (", ClauseContext::InsertValues)]
#[case("SELECT * FROM t LIMIT ", ClauseContext::Limit)]
fn test_clause_context(#[case] sql: &str, #[case] expected: ClauseContext) {
    assert_eq!(at_end(sql).context, expected, "for {sql:?}");
}

#[test]
fn test_subquery_context_pops_on_close() {
    // Inside the subquery parens the context is the subquery's.
    let inside = at_end("SELECT * FROM t WHERE id IN (SELECT id FROM u WHERE ");
    assert_eq!(inside.context, ClauseContext::Where);

    // After the parens close the outer WHERE is current again.
    let outside = at_end("SELECT * FROM t WHERE id IN (SELECT id FROM u) AND ");
    assert_eq!(outside.context, ClauseContext::Where);
}

#[test]
fn test_before_cursor_token() {
    let result = at_end("SELECT id FROM users");
    assert_eq!(result.before_cursor.unwrap().text, "users");
}

#[test]
fn test_partial_ast_with_synthetic_closers() {
    let result = at_end("SELECT * FROM (SELECT id FROM users");
    assert!(!result.inserted.is_empty());
    assert!(result.statement.is_some());
}

#[test]
fn test_scope_idents() {
    let result = at_end(
        "WITH recent AS (SELECT * FROM orders) \
         SELECT * FROM recent r JOIN users u ON ",
    );
    let idents = &result.scope_idents;
    assert!(idents.iter().any(|i| i == "recent"));
    assert!(idents.iter().any(|i| i == "r"));
    assert!(idents.iter().any(|i| i == "users"));
    assert!(idents.iter().any(|i| i == "u"));
}

#[test]
fn test_get_cte_regions() {
    let sql = "WITH a AS (SELECT 1), b AS (SELECT 2) SELECT * FROM b";
    let regions = get_cte_regions(sql).unwrap();
    assert_eq!(regions.len(), 2);
    assert_eq!(regions[0].name, "a");
    assert_eq!(regions[1].name, "b");
}

#[test]
fn test_detect_cte_at_cursor() {
    let sql = "WITH a AS (SELECT 1), b AS (SELECT 2) SELECT * FROM b";
    // Inside `a`'s body.
    let hit = detect_cte_at_cursor(sql, 1, 13).unwrap();
    assert_eq!(hit.as_deref(), Some("a"));
    // In the main query.
    let miss = detect_cte_at_cursor(sql, 1, 45).unwrap();
    assert_eq!(miss, None);
}

#[test]
fn test_nested_cte_regions_prefer_innermost() {
    let sql = "WITH outer_cte AS (WITH inner_cte AS (SELECT 1) SELECT * FROM inner_cte) \
               SELECT * FROM outer_cte";
    // Offset of `SELECT 1` body inside inner_cte.
    let column = sql.find("SELECT 1").unwrap() as u32 + 2;
    let hit = detect_cte_at_cursor(sql, 1, column).unwrap();
    assert_eq!(hit.as_deref(), Some("inner_cte"));
}
