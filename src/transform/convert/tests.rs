#![allow(clippy::unwrap_used)]

use crate::ast::{Query, Statement, StatementBody};
use crate::error::{ConversionError, SqlError};
use crate::format::to_sql;
use crate::parser::parse;
use crate::transform::{
    ConversionOptions, to_delete, to_insert, to_merge, to_update, union_to_values,
    values_to_union,
};

fn query(sql: &str) -> Query {
    parse(sql).unwrap().into_query().unwrap()
}

fn render(body: StatementBody) -> String {
    to_sql(&Statement::new(body)).unwrap()
}

#[test]
fn test_to_insert_from_select() {
    let q = query("SELECT id, name FROM users WHERE active");
    let insert = to_insert(&q, &ConversionOptions::table("archive")).unwrap();
    assert_eq!(
        render(StatementBody::Insert(insert)),
        "INSERT INTO archive (id, name) SELECT id, name FROM users WHERE active"
    );
}

#[test]
fn test_to_insert_reorders_to_explicit_columns() {
    let q = query("SELECT id, name FROM users");
    let options = ConversionOptions {
        columns: Some(vec!["name".into(), "id".into()]),
        ..ConversionOptions::table("archive")
    };
    let insert = to_insert(&q, &options).unwrap();
    assert_eq!(
        render(StatementBody::Insert(insert)),
        "INSERT INTO archive (name, id) SELECT name, id FROM users"
    );
}

#[test]
fn test_to_insert_unknown_column_errors() {
    let q = query("SELECT id FROM users");
    let options = ConversionOptions {
        columns: Some(vec!["ghost".into()]),
        ..ConversionOptions::table("archive")
    };
    let err = to_insert(&q, &options).unwrap_err();
    assert!(matches!(
        err,
        SqlError::Conversion(ConversionError::UnknownColumn { .. })
    ));
}

#[test]
fn test_to_insert_normalizes_binary_select() {
    let q = query("SELECT id, name FROM a UNION ALL SELECT id, name FROM b");
    let insert = to_insert(
        &q,
        &ConversionOptions {
            columns: Some(vec!["id".into(), "name".into()]),
            ..ConversionOptions::table("archive")
        },
    )
    .unwrap();
    let sql = render(StatementBody::Insert(insert));
    assert!(
        sql.starts_with("INSERT INTO archive (id, name) SELECT * FROM ("),
        "got {sql}"
    );
    assert!(sql.contains("UNION ALL"), "got {sql}");
}

#[test]
fn test_to_update() {
    let q = query("SELECT id, name, status FROM staged");
    let options = ConversionOptions::table("users").with_keys(["id"]);
    let update = to_update(&q, &options).unwrap();
    assert_eq!(
        render(StatementBody::Update(update)),
        "UPDATE users SET name = src.name, status = src.status \
         FROM (SELECT id, name, status FROM staged) AS src WHERE users.id = src.id"
    );
}

#[test]
fn test_to_update_requires_keys() {
    let q = query("SELECT id, name FROM staged");
    let err = to_update(&q, &ConversionOptions::table("users")).unwrap_err();
    assert_eq!(err, SqlError::Conversion(ConversionError::NoKeyColumns));

    let err = to_update(&q, &ConversionOptions::table("users").with_keys(["missing"]))
        .unwrap_err();
    assert!(matches!(
        err,
        SqlError::Conversion(ConversionError::MissingKeyColumn { .. })
    ));
}

#[test]
fn test_to_delete() {
    let q = query("SELECT id FROM doomed");
    let options = ConversionOptions::table("users").with_keys(["id"]);
    let delete = to_delete(&q, &options).unwrap();
    assert_eq!(
        render(StatementBody::Delete(delete)),
        "DELETE FROM users USING (SELECT id FROM doomed) AS src WHERE users.id = src.id"
    );
}

#[test]
fn test_to_merge() {
    let q = query("SELECT id, name FROM staged");
    let options = ConversionOptions::table("users").with_keys(["id"]);
    let merge = to_merge(&q, &options).unwrap();
    let sql = render(StatementBody::Merge(merge));
    assert_eq!(
        sql,
        "MERGE INTO users AS t USING (SELECT id, name FROM staged) AS src ON t.id = src.id \
         WHEN MATCHED THEN UPDATE SET name = src.name \
         WHEN NOT MATCHED THEN INSERT (id, name) VALUES (src.id, src.name)"
    );
}

#[test]
fn test_merge_with_only_key_columns_skips_update() {
    let q = query("SELECT id FROM staged");
    let options = ConversionOptions::table("users").with_keys(["id"]);
    let merge = to_merge(&q, &options).unwrap();
    assert_eq!(merge.clauses.len(), 1);
    assert!(!merge.clauses[0].matched);
}

#[test]
fn test_values_to_union_roundtrip() {
    let values = match query("VALUES (1, 'a'), (2, 'b')") {
        Query::Values(v) => v,
        other => panic!("expected values, got {:?}", other.kind()),
    };
    let columns = vec!["id".to_string(), "tag".to_string()];
    let union = values_to_union(&values, Some(&columns)).unwrap();
    let sql = to_sql(&Statement::from(union.clone())).unwrap();
    assert_eq!(
        sql,
        "SELECT 1 AS id, 'a' AS tag UNION ALL SELECT 2, 'b'"
    );

    let back = union_to_values(&union).unwrap();
    assert_eq!(back.rows.len(), 2);
    assert_eq!(back.rows[0].len(), 2);
}

#[test]
fn test_union_to_values_rejects_non_literal_arms() {
    let q = query("SELECT 1 UNION ALL SELECT id FROM t");
    assert!(matches!(
        union_to_values(&q).unwrap_err(),
        SqlError::Conversion(ConversionError::UnsupportedShape(_))
    ));

    // Plain UNION (without ALL) is not convertible either.
    let q = query("SELECT 1 UNION SELECT 2");
    assert!(union_to_values(&q).is_err());
}
