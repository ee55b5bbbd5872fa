//! End-to-end scenarios exercising the public API surface: parse, inject,
//! analyze, transform, rename, format.

use serde_json::json;

use sqlshape::analyze::analyze_cte_dependencies;
use sqlshape::ast::strip_metadata;
use sqlshape::error::{CycleError, InjectionError, SqlError};
use sqlshape::format::{BoundParams, Formatter, query_to_sql, to_sql};
use sqlshape::transform::Paging;
use sqlshape::{
    DynamicQueryBuilder, decompose_ctes, extract_cte, parse, rename_cte, smart_rename,
};

/// Filter + sort + paginate on a plain select.
#[test]
fn scenario_filter_sort_paginate() {
    let builder = DynamicQueryBuilder::new();
    let statement = builder
        .build_query_from_value(
            "SELECT id, name FROM users WHERE active = true",
            json!({
                "filter": {"status": "premium"},
                "sort": {"created_at": {"desc": true}},
                "paging": {"page": 2, "pageSize": 10}
            }),
        )
        .unwrap();

    let result = Formatter::default().format(&statement).unwrap();
    assert_eq!(
        result.sql,
        "SELECT id, name FROM users WHERE active = TRUE AND status = :status \
         ORDER BY created_at DESC LIMIT :paging_limit OFFSET :paging_offset"
    );
    match result.params {
        BoundParams::Named(params) => {
            assert_eq!(params["status"], json!("premium"));
            assert_eq!(params["paging_limit"], json!(10));
            assert_eq!(params["paging_offset"], json!(10));
        }
        other => panic!("expected named params, got {other:?}"),
    }
}

/// CTE rename touches the definition, the other CTE's body, FROM, JOIN, and
/// qualified columns, and the result parses back to the same shape.
#[test]
fn scenario_cte_rename() {
    let sql = "WITH u AS (SELECT id FROM users), \
               o AS (SELECT u.id FROM u JOIN orders ON u.id = orders.user_id) \
               SELECT * FROM o";
    let renamed = rename_cte(sql, "u", "customer").unwrap();
    assert!(!renamed.sql.contains(" u "), "got {}", renamed.sql);
    assert!(renamed.sql.contains("WITH customer AS"));
    assert!(renamed.sql.contains("FROM customer JOIN orders"));
    assert!(renamed.sql.contains("customer.id = orders.user_id"));

    // Renaming back is the identity, structurally.
    let back = rename_cte(&renamed.sql, "customer", "u").unwrap();
    let mut original = parse(sql).unwrap();
    let mut roundtripped = parse(&back.sql).unwrap();
    strip_metadata(&mut original);
    strip_metadata(&mut roundtripped);
    assert_eq!(original, roundtripped);
}

/// Pagination refuses a query that already carries a LIMIT.
#[test]
fn scenario_pagination_conflict() {
    let builder = DynamicQueryBuilder::new();
    let err = builder
        .build_paginated_query("SELECT 1 FROM t LIMIT 5", Paging { page: 1, page_size: 10 })
        .unwrap_err();
    assert_eq!(err, SqlError::Injection(InjectionError::ExistingLimit));
}

/// Decomposition: each CTE becomes a standalone query with its transitive
/// dependencies as a WITH prefix.
#[test]
fn scenario_cte_decomposition() {
    let statement =
        parse("WITH a AS (SELECT * FROM x), b AS (SELECT * FROM a WHERE v = 1) SELECT * FROM b")
            .unwrap();
    let query = statement.as_query().unwrap();
    let items = decompose_ctes(query).unwrap();

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].name, "a");
    assert_eq!(items[0].dependencies.len(), 0);
    assert_eq!(query_to_sql(&items[0].query).unwrap(), "SELECT * FROM x");

    assert_eq!(items[1].name, "b");
    assert_eq!(items[1].dependencies, vec!["a"]);
    assert_eq!(
        query_to_sql(&items[1].query).unwrap(),
        "WITH a AS (SELECT * FROM x) SELECT * FROM a WHERE v = 1"
    );

    // extract_cte is the single-item primitive behind "run this section".
    let b = extract_cte(query, "b").unwrap();
    assert_eq!(
        query_to_sql(&b).unwrap(),
        "WITH a AS (SELECT * FROM x) SELECT * FROM a WHERE v = 1"
    );
}

/// A non-recursive dependency cycle is a structured error naming the cycle.
#[test]
fn scenario_dependency_cycle() {
    let statement =
        parse("WITH a AS (SELECT * FROM b), b AS (SELECT * FROM a) SELECT * FROM a").unwrap();
    let err: CycleError = analyze_cte_dependencies(statement.as_query().unwrap()).unwrap_err();
    assert!(err.cycle.contains(&"a".to_string()));
    assert!(err.cycle.contains(&"b".to_string()));
}

/// Upstream filter push-down: the WHERE lands inside the CTE that exposes
/// the column, not on the outer query that does not.
#[test]
fn scenario_upstream_filter_pushdown() {
    let builder = DynamicQueryBuilder::new();
    let statement = builder
        .build_query_from_value(
            "WITH u AS (SELECT id, status FROM users) SELECT id FROM u",
            json!({"filter": {"status": "x"}}),
        )
        .unwrap();
    assert_eq!(
        to_sql(&statement).unwrap(),
        "WITH u AS (SELECT id, status FROM users WHERE status = :status) SELECT id FROM u"
    );
}

/// Smart rename picks the right engine from the cursor position.
#[test]
fn scenario_smart_rename_dispatch() {
    let sql = "WITH tmp AS (SELECT 1) SELECT t.a FROM data t JOIN tmp ON true";

    // Cursor on the CTE reference.
    let column = sql.find("tmp ON").unwrap() as u32 + 1;
    let result = smart_rename(sql, 1, column, "stage").unwrap();
    assert!(result.sql.starts_with("WITH stage AS"));
    assert!(result.sql.contains("JOIN stage ON"));

    // Cursor on the table alias.
    let column = sql.find("t.a").unwrap() as u32 + 1;
    let result = smart_rename(sql, 1, column, "d").unwrap();
    assert!(result.sql.contains("SELECT d.a FROM data d"));
}
