#![allow(clippy::unwrap_used)]

use crate::ast::*;
use crate::error::{ParseErrorKind, SqlError};
use crate::parser::{analyze, parse, parse_multi, split_multi_query};

fn parse_query(sql: &str) -> Query {
    parse(sql).unwrap().into_query().unwrap()
}

fn select(sql: &str) -> SelectQuery {
    match parse_query(sql) {
        Query::Select(q) => q,
        other => panic!("expected a simple select, got {:?}", other.kind()),
    }
}

#[test]
fn test_parse_simple_select() {
    let query = select("SELECT id, name FROM users WHERE active = true");
    assert_eq!(query.select.items.len(), 2);
    assert!(query.from.is_some());
    assert!(query.where_clause.is_some());
    assert_eq!(query.select.items[0].output_name(), Some("id"));
}

#[test]
fn test_parse_select_with_alias() {
    let query = select("SELECT u.id AS user_id, count(*) total FROM users u GROUP BY u.id");
    assert_eq!(query.select.items[0].output_name(), Some("user_id"));
    assert_eq!(query.select.items[1].output_name(), Some("total"));
    assert!(query.group_by.is_some());

    let from = query.from.unwrap();
    assert_eq!(from.items[0].source.scope_name(), Some("u"));
}

#[test]
fn test_parse_qualified_wildcard() {
    let query = select("SELECT u.*, o.id FROM users u JOIN orders o ON u.id = o.user_id");
    match &query.select.items[0] {
        SelectItem::Wildcard(w) => {
            assert_eq!(w.qualifier.as_ref().unwrap().key(), "u");
        }
        other => panic!("expected wildcard, got {other:?}"),
    }
    assert_eq!(query.from.as_ref().unwrap().items[0].joins.len(), 1);
}

#[test]
fn test_parse_joins() {
    let query = select(
        "SELECT * FROM a \
         LEFT OUTER JOIN b ON a.id = b.a_id \
         CROSS JOIN c \
         RIGHT JOIN d USING (id)",
    );
    let joins = &query.from.as_ref().unwrap().items[0].joins;
    assert_eq!(joins.len(), 3);
    assert_eq!(joins[0].kind, JoinKind::Left);
    assert_eq!(joins[1].kind, JoinKind::Cross);
    assert!(joins[1].constraint.is_none());
    assert!(matches!(joins[2].constraint, Some(JoinConstraint::Using(_))));
}

#[test]
fn test_parse_with_clause() {
    let query = parse_query("WITH u AS (SELECT id FROM users) SELECT * FROM u");
    let with = query.with_clause().unwrap();
    assert!(!with.recursive);
    assert_eq!(with.tables.len(), 1);
    assert_eq!(with.tables[0].name.as_str(), "u");
}

#[test]
fn test_parse_recursive_cte_with_hints() {
    let query = parse_query(
        "WITH RECURSIVE t(n) AS MATERIALIZED (SELECT 1 UNION ALL SELECT n + 1 FROM t) \
         SELECT n FROM t",
    );
    let with = query.with_clause().unwrap();
    assert!(with.recursive);
    assert_eq!(with.tables[0].columns.len(), 1);
    assert_eq!(with.tables[0].materialized, Some(true));
    assert!(matches!(*with.tables[0].query, Query::Binary(_)));
}

#[test]
fn test_duplicate_cte_name_is_parse_error() {
    let err = parse("WITH a AS (SELECT 1), a AS (SELECT 2) SELECT 1").unwrap_err();
    match err {
        SqlError::Parse(e) => assert_eq!(e.kind, ParseErrorKind::DuplicateCte),
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn test_parse_union() {
    let query = parse_query("SELECT 1 UNION ALL SELECT 2 UNION SELECT 3");
    // Left-associative: (1 UNION ALL 2) UNION 3.
    match query {
        Query::Binary(outer) => {
            assert_eq!(outer.op.kind, SetOpKind::Union);
            assert!(!outer.op.all);
            match *outer.left {
                Query::Binary(inner) => assert!(inner.op.all),
                other => panic!("expected nested binary, got {:?}", other.kind()),
            }
        }
        other => panic!("expected binary query, got {:?}", other.kind()),
    }
}

#[test]
fn test_union_trailing_clauses_attach_to_binary() {
    let query = parse_query("SELECT a FROM t UNION SELECT b FROM u ORDER BY 1 LIMIT 3");
    match query {
        Query::Binary(binary) => {
            assert!(binary.order_by.is_some());
            assert!(binary.limit.is_some());
        }
        other => panic!("expected binary query, got {:?}", other.kind()),
    }
}

#[test]
fn test_parse_values() {
    let query = parse_query("VALUES (1, 'a'), (2, 'b')");
    match query {
        Query::Values(values) => {
            assert_eq!(values.rows.len(), 2);
            assert_eq!(values.rows[0].len(), 2);
        }
        other => panic!("expected values, got {:?}", other.kind()),
    }
}

#[test]
fn test_parse_select_trailing_clauses() {
    let query = select(
        "SELECT id FROM t ORDER BY id DESC NULLS LAST LIMIT 10 OFFSET 5 \
         FETCH FIRST 3 ROWS ONLY FOR UPDATE SKIP LOCKED",
    );
    let order = query.order_by.unwrap();
    assert_eq!(order.items[0].direction, Some(OrderDirection::Desc));
    assert_eq!(order.items[0].nulls, Some(NullsOrder::Last));
    assert!(query.limit.is_some());
    assert!(query.offset.is_some());
    assert!(query.fetch.is_some());
    assert_eq!(query.locking.len(), 1);
    assert_eq!(query.locking[0].wait, Some(LockWait::SkipLocked));
}

#[test]
fn test_parse_insert_select() {
    let stmt = parse("INSERT INTO archive (id, name) SELECT id, name FROM users RETURNING id")
        .unwrap();
    match stmt.body {
        StatementBody::Insert(insert) => {
            assert_eq!(insert.table.key(), "archive");
            assert_eq!(insert.columns.len(), 2);
            assert!(matches!(insert.source, InsertSource::Query(_)));
            assert_eq!(insert.returning.unwrap().len(), 1);
        }
        other => panic!("expected insert, got {:?}", other.kind()),
    }
}

#[test]
fn test_parse_insert_default_values() {
    let stmt = parse("INSERT INTO t DEFAULT VALUES").unwrap();
    match stmt.body {
        StatementBody::Insert(insert) => {
            assert!(matches!(insert.source, InsertSource::DefaultValues))
        }
        other => panic!("expected insert, got {:?}", other.kind()),
    }
}

#[test]
fn test_parse_update() {
    let stmt =
        parse("UPDATE users u SET name = :name, active = false FROM roles r WHERE u.role_id = r.id")
            .unwrap();
    match stmt.body {
        StatementBody::Update(update) => {
            assert_eq!(update.set.len(), 2);
            assert!(update.from.is_some());
            assert!(update.where_clause.is_some());
        }
        other => panic!("expected update, got {:?}", other.kind()),
    }
}

#[test]
fn test_parse_delete_using() {
    let stmt = parse("DELETE FROM users USING banned b WHERE users.id = b.user_id").unwrap();
    match stmt.body {
        StatementBody::Delete(delete) => {
            assert!(delete.using.is_some());
            assert!(delete.where_clause.is_some());
        }
        other => panic!("expected delete, got {:?}", other.kind()),
    }
}

#[test]
fn test_parse_merge() {
    let stmt = parse(
        "MERGE INTO target t USING source s ON t.id = s.id \
         WHEN MATCHED AND s.deleted THEN DELETE \
         WHEN MATCHED THEN UPDATE SET name = s.name \
         WHEN NOT MATCHED THEN INSERT (id, name) VALUES (s.id, s.name)",
    )
    .unwrap();
    match stmt.body {
        StatementBody::Merge(merge) => {
            assert_eq!(merge.clauses.len(), 3);
            assert!(merge.clauses[0].matched);
            assert!(merge.clauses[0].condition.is_some());
            assert!(matches!(merge.clauses[0].action, MergeAction::Delete));
            assert!(matches!(merge.clauses[1].action, MergeAction::Update { .. }));
            assert!(!merge.clauses[2].matched);
            assert!(matches!(merge.clauses[2].action, MergeAction::Insert { .. }));
        }
        other => panic!("expected merge, got {:?}", other.kind()),
    }
}

#[test]
fn test_parse_statement_level_with_before_dml() {
    let stmt = parse("WITH doomed AS (SELECT id FROM old) DELETE FROM t WHERE id IN (SELECT id FROM doomed)")
        .unwrap();
    match stmt.body {
        StatementBody::Delete(delete) => assert!(delete.with.is_some()),
        other => panic!("expected delete, got {:?}", other.kind()),
    }
}

#[test]
fn test_parse_create_table() {
    let stmt = parse(
        "CREATE TABLE IF NOT EXISTS orders (\
           id bigint GENERATED ALWAYS AS IDENTITY PRIMARY KEY,\
           user_id int NOT NULL REFERENCES users (id) ON DELETE CASCADE,\
           total numeric(10, 2) DEFAULT 0,\
           CONSTRAINT orders_total_check CHECK (total >= 0),\
           UNIQUE (user_id, id)\
         )",
    )
    .unwrap();
    match stmt.body {
        StatementBody::CreateTable(create) => {
            assert!(create.if_not_exists);
            assert_eq!(create.columns.len(), 3);
            assert_eq!(create.constraints.len(), 2);
            let user_id = &create.columns[1];
            assert!(user_id.constraints.iter().any(|c| matches!(
                &c.kind,
                ColumnConstraintKind::References(r)
                    if r.on_delete == Some(ReferentialAction::Cascade)
            )));
        }
        other => panic!("expected create table, got {:?}", other.kind()),
    }
}

#[test]
fn test_parse_create_index() {
    let stmt = parse("CREATE UNIQUE INDEX idx_users_email ON users USING btree (lower(email) DESC)")
        .unwrap();
    match stmt.body {
        StatementBody::CreateIndex(create) => {
            assert!(create.unique);
            assert_eq!(create.method.as_ref().unwrap().as_str(), "btree");
            assert_eq!(create.columns[0].direction, Some(OrderDirection::Desc));
        }
        other => panic!("expected create index, got {:?}", other.kind()),
    }
}

#[test]
fn test_parse_alter_table() {
    let stmt = parse(
        "ALTER TABLE t ADD CONSTRAINT t_pkey PRIMARY KEY (id), DROP COLUMN old_col CASCADE",
    )
    .unwrap();
    match stmt.body {
        StatementBody::AlterTable(alter) => {
            assert_eq!(alter.actions.len(), 2);
            assert!(matches!(alter.actions[0], AlterAction::AddConstraint(_)));
            assert!(matches!(
                alter.actions[1],
                AlterAction::DropColumn { cascade: true, .. }
            ));
        }
        other => panic!("expected alter table, got {:?}", other.kind()),
    }
}

#[test]
fn test_parse_drop_and_maintenance() {
    assert!(matches!(
        parse("DROP TABLE IF EXISTS a, b CASCADE").unwrap().body,
        StatementBody::DropTable(DropTable { if_exists: true, cascade: true, .. })
    ));
    assert!(matches!(
        parse("DROP INDEX idx").unwrap().body,
        StatementBody::DropIndex(_)
    ));
    assert!(matches!(
        parse("EXPLAIN ANALYZE SELECT 1").unwrap().body,
        StatementBody::Explain(ExplainStmt { analyze: true, .. })
    ));
    assert!(matches!(
        parse("VACUUM FULL users").unwrap().body,
        StatementBody::Vacuum(VacuumStmt { full: true, .. })
    ));
    assert!(matches!(
        parse("REINDEX TABLE users").unwrap().body,
        StatementBody::Reindex(_)
    ));
    assert!(matches!(
        parse("ANALYZE users").unwrap().body,
        StatementBody::Analyze(_)
    ));
}

#[test]
fn test_trailing_input_is_error() {
    let err = parse("SELECT 1 SELECT 2").unwrap_err();
    match err {
        SqlError::Parse(e) => assert_eq!(e.kind, ParseErrorKind::TrailingInput),
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn test_parse_error_carries_position_and_snippet() {
    let err = parse("SELECT id FROM\nWHERE x = 1").unwrap_err();
    let position = err.position().unwrap();
    assert_eq!(position.line, 2);
    match err {
        SqlError::Parse(e) => assert!(!e.snippet.is_empty()),
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn test_parse_multi() {
    let statements = parse_multi("SELECT 1; SELECT 2;\nINSERT INTO t DEFAULT VALUES").unwrap();
    assert_eq!(statements.len(), 3);
}

#[test]
fn test_analyze_does_not_throw() {
    let good = analyze("SELECT 1");
    assert!(good.success);
    assert!(good.statement.is_some());

    let bad = analyze("SELECT FROM WHERE");
    assert!(!bad.success);
    assert!(bad.error.is_some());
    assert!(!bad.lexemes.is_empty());

    let unterminated = analyze("SELECT 'oops");
    assert!(!unterminated.success);
    assert!(unterminated.error.is_some());
}

#[test]
fn test_header_comments() {
    let stmt = parse("-- top of file\n-- second line\nSELECT 1").unwrap();
    assert_eq!(stmt.header.len(), 2);
    assert_eq!(stmt.header[0].text, "top of file");
}

#[test]
fn test_split_multi_query_respects_strings() {
    let pieces = split_multi_query("SELECT ';' AS x; SELECT 2 -- trailing ;\n; SELECT 3");
    assert_eq!(pieces.len(), 3);
    assert_eq!(pieces[0], "SELECT ';' AS x");
    assert_eq!(pieces[2], "SELECT 3");
}

#[test]
fn test_cte_order_is_declaration_order() {
    let query = parse_query("WITH b AS (SELECT 1), a AS (SELECT 2), c AS (SELECT 3) SELECT 1");
    let names: Vec<_> = query.with_clause().unwrap().names().collect();
    assert_eq!(names, vec!["b", "a", "c"]);
}
