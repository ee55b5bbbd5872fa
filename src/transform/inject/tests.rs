#![allow(clippy::unwrap_used)]

use serde_json::json;

use crate::error::{InjectionError, ResolveError, SqlError};
use crate::format::{BoundParams, Formatter};
use crate::parser::parse;
use crate::transform::{
    FilterSpec, FilterValue, Paging, QueryOptions, SortSpec, inject_filter, inject_pagination,
    inject_sort,
};

fn filter_spec(entries: serde_json::Value) -> FilterSpec {
    serde_json::from_value(entries).unwrap()
}

fn sort_spec(entries: serde_json::Value) -> SortSpec {
    serde_json::from_value(entries).unwrap()
}

#[test]
fn test_filter_sort_paginate_end_to_end() {
    // Scenario: filter + sort + paginate on a plain select.
    let mut stmt = parse("SELECT id, name FROM users WHERE active = true").unwrap();
    inject_filter(&mut stmt, &filter_spec(json!({"status": "premium"})), None).unwrap();
    inject_sort(&mut stmt, &sort_spec(json!({"created_at": {"desc": true}})), None).unwrap();
    inject_pagination(&mut stmt, &Paging { page: 2, page_size: 10 }).unwrap();

    let result = Formatter::default().format(&stmt).unwrap();
    assert_eq!(
        result.sql,
        "SELECT id, name FROM users WHERE active = TRUE AND status = :status \
         ORDER BY created_at DESC LIMIT :paging_limit OFFSET :paging_offset"
    );
    match result.params {
        BoundParams::Named(map) => {
            assert_eq!(map["status"], json!("premium"));
            assert_eq!(map["paging_limit"], json!(10));
            assert_eq!(map["paging_offset"], json!(10));
        }
        other => panic!("expected named params, got {other:?}"),
    }
}

#[test]
fn test_pagination_conflict_with_existing_limit() {
    let mut stmt = parse("SELECT 1 FROM t LIMIT 5").unwrap();
    let err = inject_pagination(&mut stmt, &Paging { page: 1, page_size: 10 }).unwrap_err();
    assert_eq!(err, SqlError::Injection(InjectionError::ExistingLimit));
}

#[test]
fn test_pagination_conflict_with_existing_offset() {
    let mut stmt = parse("SELECT 1 FROM t OFFSET 5").unwrap();
    let err = inject_pagination(&mut stmt, &Paging { page: 1, page_size: 10 }).unwrap_err();
    assert_eq!(err, SqlError::Injection(InjectionError::ExistingOffset));
}

#[test]
fn test_pagination_page_out_of_range() {
    let mut stmt = parse("SELECT 1 FROM t").unwrap();
    for (page, page_size) in [(0, 10), (1, 0), (1, 1001)] {
        let err = inject_pagination(&mut stmt, &Paging { page, page_size }).unwrap_err();
        assert!(matches!(
            err,
            SqlError::Injection(InjectionError::PageOutOfRange { .. })
        ));
    }
}

#[test]
fn test_pagination_always_emits_offset() {
    let mut stmt = parse("SELECT 1 FROM t").unwrap();
    inject_pagination(&mut stmt, &Paging { page: 1, page_size: 25 }).unwrap();
    let result = Formatter::default().format(&stmt).unwrap();
    assert!(result.sql.ends_with("LIMIT :paging_limit OFFSET :paging_offset"));
    match result.params {
        BoundParams::Named(map) => assert_eq!(map["paging_offset"], json!(0)),
        other => panic!("expected named params, got {other:?}"),
    }
}

#[test]
fn test_upstream_filter_pushdown_into_cte() {
    // Scenario: the outer query does not expose `status`; the CTE does.
    let mut stmt = parse("WITH u AS (SELECT id, status FROM users) SELECT id FROM u").unwrap();
    inject_filter(&mut stmt, &filter_spec(json!({"status": "x"})), None).unwrap();
    let sql = crate::format::to_sql(&stmt).unwrap();
    assert_eq!(
        sql,
        "WITH u AS (SELECT id, status FROM users WHERE status = :status) SELECT id FROM u"
    );
}

#[test]
fn test_upstream_filter_prefers_highest_query() {
    // Both the sub-query and its inner table expose `v`; the sub-query is the
    // highest level that does, so the condition lands there, not outside.
    let mut stmt =
        parse("SELECT id FROM (SELECT id, v FROM data) AS d WHERE id > 0").unwrap();
    inject_filter(&mut stmt, &filter_spec(json!({"v": 1})), None).unwrap();
    let sql = crate::format::to_sql(&stmt).unwrap();
    assert_eq!(
        sql,
        "SELECT id FROM (SELECT id, v FROM data WHERE v = :v) AS d WHERE id > 0"
    );
}

#[test]
fn test_filter_on_alias_uses_underlying_expression() {
    let mut stmt = parse("SELECT u.id AS uid FROM users u").unwrap();
    inject_filter(&mut stmt, &filter_spec(json!({"uid": 5})), None).unwrap();
    let sql = crate::format::to_sql(&stmt).unwrap();
    assert!(sql.contains("WHERE u.id = :uid"), "got {sql}");
}

#[test]
fn test_filter_null_means_is_null() {
    let mut stmt = parse("SELECT id FROM t").unwrap();
    inject_filter(&mut stmt, &filter_spec(json!({"deleted_at": null})), None).unwrap();
    let sql = crate::format::to_sql(&stmt).unwrap();
    assert!(sql.contains("WHERE deleted_at IS NULL"), "got {sql}");
}

#[test]
fn test_filter_condition_operators() {
    let mut stmt = parse("SELECT id, price FROM items").unwrap();
    inject_filter(
        &mut stmt,
        &filter_spec(json!({"price": {"gte": 10, "lt": 100}})),
        None,
    )
    .unwrap();
    let sql = crate::format::to_sql(&stmt).unwrap();
    assert!(
        sql.contains("price >= :price_gte AND price < :price_lt"),
        "got {sql}"
    );
}

#[test]
fn test_filter_in_and_between() {
    let mut stmt = parse("SELECT id FROM t").unwrap();
    inject_filter(
        &mut stmt,
        &filter_spec(json!({
            "status": {"in": ["a", "b"]},
            "score": {"between": [1, 5]}
        })),
        None,
    )
    .unwrap();
    let sql = crate::format::to_sql(&stmt).unwrap();
    assert!(sql.contains("status IN (:status_0, :status_1)"), "got {sql}");
    assert!(
        sql.contains("score BETWEEN :score_min AND :score_max"),
        "got {sql}"
    );
}

#[test]
fn test_filter_or_branches_parenthesized() {
    let mut stmt = parse("SELECT id FROM t").unwrap();
    inject_filter(
        &mut stmt,
        &filter_spec(json!({"state": {"or": [{"eq": "new"}, {"eq": "open"}]}})),
        None,
    )
    .unwrap();
    let sql = crate::format::to_sql(&stmt).unwrap();
    assert!(
        sql.contains("(state = :state_or0 OR state = :state_or1)"),
        "got {sql}"
    );
}

#[test]
fn test_filter_conditions_join_existing_where_with_and() {
    let mut stmt = parse("SELECT id FROM t WHERE a = 1 OR b = 2").unwrap();
    inject_filter(&mut stmt, &filter_spec(json!({"c": 3})), None).unwrap();
    let sql = crate::format::to_sql(&stmt).unwrap();
    // The existing OR is parenthesized under the new AND.
    assert!(sql.contains("WHERE (a = 1 OR b = 2) AND c = :c"), "got {sql}");
}

#[test]
fn test_filter_application_follows_spec_order() {
    let mut stmt = parse("SELECT id FROM t").unwrap();
    let spec = filter_spec(json!({"b": 2, "a": 1}));
    inject_filter(&mut stmt, &spec, None).unwrap();
    let sql = crate::format::to_sql(&stmt).unwrap();
    assert!(sql.contains("WHERE b = :b AND a = :a"), "got {sql}");
}

#[test]
fn test_filter_key_matching_parameter_binds_it() {
    let mut stmt = parse("SELECT id FROM t WHERE score > :threshold").unwrap();
    inject_filter(&mut stmt, &filter_spec(json!({"threshold": 10})), None).unwrap();
    let result = Formatter::default().format(&stmt).unwrap();
    assert!(result.sql.contains("score > :threshold"));
    match result.params {
        BoundParams::Named(map) => assert_eq!(map["threshold"], json!(10)),
        other => panic!("expected named params, got {other:?}"),
    }
}

#[test]
fn test_filter_unknown_column_errors() {
    // The only source is a CTE with a fixed shape; nothing exposes `ghost`.
    let mut stmt = parse("WITH u AS (SELECT id FROM users) SELECT id FROM u").unwrap();
    let err = inject_filter(&mut stmt, &filter_spec(json!({"ghost": 1})), None).unwrap_err();
    assert!(matches!(
        err,
        SqlError::Resolve(ResolveError::ColumnNotFound { .. })
    ));
}

#[test]
fn test_empty_condition_object_errors() {
    let mut stmt = parse("SELECT id FROM t").unwrap();
    let err = inject_filter(&mut stmt, &filter_spec(json!({"id": {}})), None).unwrap_err();
    assert!(matches!(
        err,
        SqlError::Injection(InjectionError::EmptyCondition { .. })
    ));
}

#[test]
fn test_sort_appends_to_existing_order_by() {
    let mut stmt = parse("SELECT a, b FROM t ORDER BY a").unwrap();
    inject_sort(
        &mut stmt,
        &sort_spec(json!({"b": {"desc": true, "nullsLast": true}})),
        None,
    )
    .unwrap();
    let sql = crate::format::to_sql(&stmt).unwrap();
    assert!(sql.contains("ORDER BY a, b DESC NULLS LAST"), "got {sql}");
}

#[test]
fn test_sort_unknown_column_errors() {
    let mut stmt = parse("WITH u AS (SELECT id FROM users) SELECT id FROM u").unwrap();
    let err = inject_sort(&mut stmt, &sort_spec(json!({"ghost": {}})), None).unwrap_err();
    assert!(matches!(
        err,
        SqlError::Resolve(ResolveError::ColumnNotFound { .. })
    ));
}

#[test]
fn test_query_options_reject_unknown_keys() {
    let err = QueryOptions::from_value(json!({"filtre": {}})).unwrap_err();
    assert!(matches!(err, InjectionError::UnknownOption { .. }));

    let err = QueryOptions::from_value(json!({
        "filter": {"a": {"eqq": 1}}
    }))
    .unwrap_err();
    assert!(matches!(err, InjectionError::UnknownOption { .. }));
}

#[test]
fn test_query_options_accept_known_shape() {
    let options = QueryOptions::from_value(json!({
        "filter": {"status": "premium", "price": {"gte": 10}},
        "sort": {"created_at": {"desc": true}},
        "paging": {"page": 2, "pageSize": 10}
    }))
    .unwrap();
    assert_eq!(options.filter.as_ref().unwrap().len(), 2);
    assert!(matches!(
        options.filter.as_ref().unwrap()["status"],
        FilterValue::Value(_)
    ));
    assert_eq!(options.paging.unwrap().page, 2);
}
