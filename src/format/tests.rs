#![allow(clippy::unwrap_used)]

use rstest::rstest;
use serde_json::json;

use crate::ast::{Expr, VisitMut, strip_metadata};
use crate::ast::visitor_mut;
use crate::format::{
    BoundParams, FormatOptions, Formatter, KeywordCase, NewlineStyle, ParamStyle, ParamSymbol,
    to_sql,
};
use crate::parser::{ParserOptions, parse, parse_with_options};

fn roundtrip(sql: &str) -> String {
    to_sql(&parse(sql).unwrap()).unwrap()
}

/// parse(format(parse(s))) must equal parse(s) structurally.
fn assert_ast_roundtrip(sql: &str) {
    let mut first = parse(sql).unwrap();
    let rendered = to_sql(&first).unwrap();
    let mut second = parse(&rendered).unwrap_or_else(|e| {
        panic!("formatted SQL failed to reparse: {e}\n  formatted: {rendered}")
    });
    strip_metadata(&mut first);
    strip_metadata(&mut second);
    assert_eq!(first, second, "AST drift for {sql:?} via {rendered:?}");
}

#[rstest]
#[case("SELECT id, name FROM users WHERE active = true")]
#[case("SELECT DISTINCT ON (dept) dept, salary FROM emp ORDER BY dept, salary DESC")]
#[case("SELECT u.*, count(*) AS n FROM users u GROUP BY u.id HAVING count(*) > 1")]
#[case("WITH a AS (SELECT 1), b AS (SELECT * FROM a) SELECT * FROM b")]
#[case("WITH RECURSIVE t(n) AS (SELECT 1 UNION ALL SELECT n + 1 FROM t WHERE n < 10) SELECT n FROM t")]
#[case("SELECT 1 UNION ALL SELECT 2 EXCEPT SELECT 3")]
#[case("SELECT a FROM t UNION SELECT b FROM u ORDER BY 1 LIMIT 3 OFFSET 1")]
#[case("VALUES (1, 'a'), (2, 'b')")]
#[case("SELECT * FROM a LEFT JOIN b ON a.id = b.a_id CROSS JOIN c")]
#[case("SELECT * FROM (SELECT id FROM t) AS sub WHERE id > 0")]
#[case("SELECT * FROM unnest(ARRAY[1, 2]) WITH ORDINALITY AS u(x, i)")]
#[case("SELECT row_number() OVER (PARTITION BY g ORDER BY x DESC NULLS LAST) FROM t")]
#[case("SELECT sum(x) OVER (ORDER BY d ROWS BETWEEN 2 PRECEDING AND CURRENT ROW) FROM t")]
#[case("SELECT sum(x) OVER w FROM t WINDOW w AS (PARTITION BY g)")]
#[case("SELECT CASE WHEN a THEN 1 ELSE 0 END FROM t")]
#[case("SELECT CASE status WHEN 'a' THEN 1 END FROM t")]
#[case("SELECT x::numeric(10, 2), CAST(y AS int[]) FROM t")]
#[case("SELECT payload ->> 'kind', data @> '{}' FROM events")]
#[case("SELECT * FROM t WHERE x BETWEEN 1 AND 5 AND y NOT IN (1, 2)")]
#[case("SELECT * FROM t WHERE EXISTS (SELECT 1 FROM u WHERE u.id = t.id)")]
#[case("SELECT tags[1], tags[1:2], matrix[i][j] FROM t")]
#[case("SELECT DATE '2024-01-01', name COLLATE \"C\" FROM t")]
#[case("SELECT -x, NOT a AND b, 2 ^ 3 ^ 2 FROM t")]
#[case("SELECT \"Mixed Case\".\"Col\" FROM \"Mixed Case\"")]
#[case("SELECT id FROM t ORDER BY id FETCH FIRST 3 ROWS WITH TIES")]
#[case("SELECT id FROM t FOR UPDATE OF t NOWAIT")]
#[case("INSERT INTO archive (id, name) SELECT id, name FROM users RETURNING id")]
#[case("INSERT INTO t DEFAULT VALUES")]
#[case("UPDATE users AS u SET name = :name FROM roles r WHERE u.role_id = r.id RETURNING u.id")]
#[case("DELETE FROM users USING banned b WHERE users.id = b.user_id")]
#[case(
    "MERGE INTO target AS t USING src AS s ON t.id = s.id \
     WHEN MATCHED THEN UPDATE SET v = s.v \
     WHEN NOT MATCHED THEN INSERT (id, v) VALUES (s.id, s.v)"
)]
#[case("WITH doomed AS (SELECT id FROM old) DELETE FROM t WHERE id IN (SELECT id FROM doomed)")]
#[case(
    "CREATE TABLE orders (id bigint PRIMARY KEY, user_id int NOT NULL REFERENCES users (id) \
     ON DELETE CASCADE, total numeric(10, 2) DEFAULT 0, CHECK (total >= 0))"
)]
#[case("CREATE UNIQUE INDEX idx ON users USING btree (lower(email) DESC)")]
#[case("ALTER TABLE t ADD CONSTRAINT c UNIQUE (a, b), DROP COLUMN x CASCADE")]
#[case("DROP TABLE IF EXISTS a, b CASCADE")]
#[case("EXPLAIN ANALYZE SELECT 1")]
fn test_ast_roundtrip(#[case] sql: &str) {
    assert_ast_roundtrip(sql);
}

#[test]
fn test_roundtrip_is_idempotent_textually() {
    let sql = "select   a,b   from t where a=1 and (b=2 or c=3)";
    let once = roundtrip(sql);
    let twice = roundtrip(&once);
    assert_eq!(once, twice);
}

#[test]
fn test_constructed_conjunction_gets_parens() {
    // AND over OR must emit parentheses to preserve structure.
    let or = Expr::or(Expr::bare_column("a"), Expr::bare_column("b"));
    let and = Expr::and(or, Expr::bare_column("c"));
    let mut stmt = parse("SELECT 1 FROM t WHERE x").unwrap();
    struct Replace(Option<Expr>);
    impl VisitMut for Replace {
        fn visit_where_clause_mut(&mut self, clause: &mut crate::ast::WhereClause) {
            clause.condition = self.0.take().unwrap();
            visitor_mut::walk_where_clause_mut(self, clause);
        }
    }
    Replace(Some(and)).visit_statement_mut(&mut stmt);
    let sql = to_sql(&stmt).unwrap();
    assert!(sql.contains("(a OR b) AND c"), "got {sql}");
}

#[test]
fn test_keyword_case_lower() {
    let options = FormatOptions {
        keyword_case: KeywordCase::Lower,
        ..FormatOptions::default()
    };
    let stmt = parse("SELECT id FROM t WHERE x IS NULL").unwrap();
    let sql = Formatter::new(options).format(&stmt).unwrap().sql;
    assert!(sql.starts_with("select id from t where"));
    assert!(sql.contains("is null"));
}

#[test]
fn test_multiline_layout() {
    let options = FormatOptions::pretty();
    let stmt = parse("SELECT a, b FROM t WHERE x = 1 AND y = 2 ORDER BY a").unwrap();
    let sql = Formatter::new(options).format(&stmt).unwrap().sql;
    let lines: Vec<&str> = sql.lines().collect();
    assert!(lines.len() > 3, "expected multi-line output, got {sql:?}");
    assert!(lines.iter().any(|l| l.trim_start().starts_with("FROM")));
    assert!(lines.iter().any(|l| l.trim_start().starts_with("ORDER BY")));
}

#[test]
fn test_crlf_newlines() {
    let options = FormatOptions {
        newline: NewlineStyle::CrLf,
        ..FormatOptions::default()
    };
    let stmt = parse("SELECT a FROM t WHERE x = 1").unwrap();
    let sql = Formatter::new(options).format(&stmt).unwrap().sql;
    assert!(sql.contains("\r\n"));
}

#[test]
fn test_named_params_collected_in_emission_order() {
    let mut stmt = parse("SELECT * FROM t WHERE a = :alpha AND b = :beta").unwrap();
    crate::analyze::set_parameter(&mut stmt, "beta", json!(2));
    crate::analyze::set_parameter(&mut stmt, "alpha", json!(1));
    let result = Formatter::default().format(&stmt).unwrap();
    match result.params {
        BoundParams::Named(map) => {
            let keys: Vec<_> = map.keys().cloned().collect();
            assert_eq!(keys, vec!["alpha".to_string(), "beta".to_string()]);
        }
        other => panic!("expected named params, got {other:?}"),
    }
}

#[test]
fn test_indexed_param_emission() {
    let options = FormatOptions {
        parameter_symbol: ParamSymbol::Dollar,
        parameter_style: ParamStyle::Indexed,
        ..FormatOptions::default()
    };
    let stmt = parse("SELECT * FROM t WHERE a = :x AND b = :y AND c = :x").unwrap();
    let sql = Formatter::new(options).format(&stmt).unwrap().sql;
    assert!(sql.contains("a = $1"), "got {sql}");
    assert!(sql.contains("b = $2"), "got {sql}");
    assert!(sql.contains("c = $1"), "got {sql}");
}

#[test]
fn test_anonymous_param_emission() {
    let options = FormatOptions {
        parameter_symbol: ParamSymbol::Question,
        parameter_style: ParamStyle::Anonymous,
        ..FormatOptions::default()
    };
    let mut stmt = parse("SELECT * FROM t WHERE a = :x AND b = :y").unwrap();
    crate::analyze::set_parameter(&mut stmt, "x", json!("first"));
    let result = Formatter::new(options).format(&stmt).unwrap();
    assert!(result.sql.contains("a = ? AND b = ?"), "got {}", result.sql);
    match result.params {
        BoundParams::Positional(values) => {
            assert_eq!(values, vec![json!("first"), serde_json::Value::Null]);
        }
        other => panic!("expected positional params, got {other:?}"),
    }
}

#[test]
fn test_custom_param_symbol() {
    let options = FormatOptions {
        parameter_symbol: ParamSymbol::Custom {
            prefix: "${".into(),
            suffix: "}".into(),
        },
        ..FormatOptions::default()
    };
    let stmt = parse("SELECT * FROM t WHERE a = :x").unwrap();
    let sql = Formatter::new(options).format(&stmt).unwrap().sql;
    assert!(sql.contains("${x}"), "got {sql}");
}

#[test]
fn test_format_preservation_byte_exact() {
    let source = "select  a , -- keep me\n   b\nFROM   t  \nwhere a=1";
    let options = ParserOptions {
        preserve_original_formatting: true,
        ..ParserOptions::default()
    };
    let stmt = parse_with_options(source, &options).unwrap();
    let format_options = FormatOptions {
        preserve_original_formatting: true,
        ..FormatOptions::default()
    };
    let rendered = Formatter::new(format_options).format(&stmt).unwrap().sql;
    assert_eq!(rendered, source);
}

#[test]
fn test_format_preservation_requires_retained_lexemes() {
    let stmt = parse("SELECT 1").unwrap();
    let options = FormatOptions {
        preserve_original_formatting: true,
        ..FormatOptions::default()
    };
    assert!(Formatter::new(options).format(&stmt).is_err());
}

#[test]
fn test_comment_reemission_single_line() {
    let stmt = parse("SELECT a /* note */, b FROM t").unwrap();
    let sql = to_sql(&stmt).unwrap();
    assert!(sql.contains("/* note */"), "got {sql}");
}

#[test]
fn test_comment_mode_none_drops_comments() {
    let stmt = parse("-- header\nSELECT a /* note */ FROM t").unwrap();
    let sql = Formatter::new(FormatOptions::compact())
        .format(&stmt)
        .unwrap()
        .sql;
    assert!(!sql.contains("note"), "got {sql}");
    assert!(!sql.contains("header"), "got {sql}");
}

#[test]
fn test_identifier_quoting_applied_when_needed() {
    let sql = roundtrip("SELECT \"weird name\", plain FROM \"Tbl\"");
    assert!(sql.contains("\"weird name\""));
    assert!(sql.contains("plain"));
    assert!(sql.contains("\"Tbl\""));
}
