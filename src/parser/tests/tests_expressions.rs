#![allow(clippy::unwrap_used)]

use crate::ast::*;
use crate::parser::parse;

fn expr(sql: &str) -> Expr {
    let stmt = parse(&format!("SELECT {sql}")).unwrap();
    let query = stmt.into_query().unwrap();
    match query {
        Query::Select(select) => match select.select.items.into_iter().next().unwrap() {
            SelectItem::Expr(item) => item.expr,
            other => panic!("expected expression item, got {other:?}"),
        },
        other => panic!("expected select, got {:?}", other.kind()),
    }
}

fn binary(e: &Expr) -> &BinaryExpr {
    match e {
        Expr::Binary(b) => b,
        other => panic!("expected binary expr, got {:?}", other.kind()),
    }
}

#[test]
fn test_multiplicative_binds_tighter_than_additive() {
    let e = expr("1 + 2 * 3");
    let outer = binary(&e);
    assert_eq!(outer.op, BinaryOp::Add);
    assert_eq!(binary(&outer.right).op, BinaryOp::Multiply);
}

#[test]
fn test_exponent_is_right_associative() {
    let e = expr("2 ^ 3 ^ 2");
    let outer = binary(&e);
    assert_eq!(outer.op, BinaryOp::Exponent);
    // 2 ^ (3 ^ 2)
    assert_eq!(binary(&outer.right).op, BinaryOp::Exponent);
}

#[test]
fn test_and_binds_tighter_than_or() {
    let e = expr("a OR b AND c");
    let outer = binary(&e);
    assert_eq!(outer.op, BinaryOp::Or);
    assert_eq!(binary(&outer.right).op, BinaryOp::And);
}

#[test]
fn test_not_is_looser_than_comparison() {
    let e = expr("NOT a = 1");
    match e {
        Expr::Unary(unary) => {
            assert_eq!(unary.op, UnaryOp::Not);
            assert_eq!(binary(&unary.operand).op, BinaryOp::Eq);
        }
        other => panic!("expected unary, got {:?}", other.kind()),
    }
}

#[test]
fn test_json_operator_binds_tighter_than_comparison() {
    let e = expr("payload ->> 'kind' = 'order'");
    let outer = binary(&e);
    assert_eq!(outer.op, BinaryOp::Eq);
    assert_eq!(binary(&outer.left).op, BinaryOp::JsonGetText);
}

#[test]
fn test_concat_chain() {
    let e = expr("a || b || c");
    // Left-associative: (a || b) || c.
    let outer = binary(&e);
    assert_eq!(outer.op, BinaryOp::Concat);
    assert_eq!(binary(&outer.left).op, BinaryOp::Concat);
}

#[test]
fn test_between_does_not_swallow_and() {
    let e = expr("x BETWEEN 1 AND 5 AND y");
    let outer = binary(&e);
    assert_eq!(outer.op, BinaryOp::And);
    assert!(matches!(*outer.left, Expr::Between(_)));
}

#[test]
fn test_not_between() {
    let e = expr("x NOT BETWEEN SYMMETRIC 5 AND 1");
    match e {
        Expr::Between(between) => {
            assert!(between.negated);
            assert!(between.symmetric);
        }
        other => panic!("expected between, got {:?}", other.kind()),
    }
}

#[test]
fn test_in_list_and_subquery() {
    assert!(matches!(
        expr("status IN ('a', 'b')"),
        Expr::InList(InListExpr { negated: false, .. })
    ));
    match expr("id NOT IN (SELECT id FROM banned)") {
        Expr::InQuery(in_query) => assert!(in_query.negated),
        other => panic!("expected in-subquery, got {:?}", other.kind()),
    }
}

#[test]
fn test_is_forms() {
    assert!(matches!(
        binary(&expr("x IS NULL")).op,
        BinaryOp::Is
    ));
    assert!(matches!(
        binary(&expr("x IS NOT NULL")).op,
        BinaryOp::IsNot
    ));
    assert!(matches!(
        binary(&expr("x IS DISTINCT FROM y")).op,
        BinaryOp::IsDistinctFrom
    ));
}

#[test]
fn test_like_ilike() {
    assert_eq!(binary(&expr("name LIKE 'a%'")).op, BinaryOp::Like);
    assert_eq!(binary(&expr("name NOT ILIKE 'a%'")).op, BinaryOp::NotILike);
    assert_eq!(binary(&expr("name SIMILAR TO 'a%'")).op, BinaryOp::SimilarTo);
}

#[test]
fn test_postfix_cast_and_cast_call() {
    match expr("total::numeric(10, 2)") {
        Expr::Cast(cast) => {
            assert!(cast.postfix);
            assert_eq!(cast.ty.name.key(), "numeric");
            assert_eq!(cast.ty.modifiers.len(), 2);
        }
        other => panic!("expected cast, got {:?}", other.kind()),
    }
    match expr("CAST(x AS int[])") {
        Expr::Cast(cast) => {
            assert!(!cast.postfix);
            assert!(cast.ty.array);
        }
        other => panic!("expected cast, got {:?}", other.kind()),
    }
}

#[test]
fn test_case_forms() {
    match expr("CASE WHEN a THEN 1 WHEN b THEN 2 ELSE 0 END") {
        Expr::Case(case) => {
            assert!(case.operand.is_none());
            assert_eq!(case.branches.len(), 2);
            assert!(case.else_value.is_some());
        }
        other => panic!("expected case, got {:?}", other.kind()),
    }
    match expr("CASE status WHEN 'a' THEN 1 END") {
        Expr::Case(case) => {
            assert!(case.operand.is_some());
            assert!(case.else_value.is_none());
        }
        other => panic!("expected case, got {:?}", other.kind()),
    }
}

#[test]
fn test_function_calls() {
    match expr("count(*)") {
        Expr::Function(call) => assert!(call.star),
        other => panic!("expected function, got {:?}", other.kind()),
    }
    match expr("array_agg(DISTINCT name ORDER BY name DESC)") {
        Expr::Function(call) => {
            assert!(call.distinct);
            assert_eq!(call.order_by.len(), 1);
        }
        other => panic!("expected function, got {:?}", other.kind()),
    }
    match expr("count(*) FILTER (WHERE active)") {
        Expr::Function(call) => assert!(call.filter.is_some()),
        other => panic!("expected function, got {:?}", other.kind()),
    }
}

#[test]
fn test_window_function() {
    match expr("row_number() OVER (PARTITION BY dept ORDER BY salary DESC)") {
        Expr::Function(call) => match call.over.unwrap() {
            Over::Spec(spec) => {
                assert_eq!(spec.partition_by.len(), 1);
                assert_eq!(spec.order_by.len(), 1);
            }
            Over::Named(_) => panic!("expected inline spec"),
        },
        other => panic!("expected function, got {:?}", other.kind()),
    }
}

#[test]
fn test_window_frame() {
    match expr("sum(x) OVER (ORDER BY d ROWS BETWEEN 2 PRECEDING AND CURRENT ROW)") {
        Expr::Function(call) => match call.over.unwrap() {
            Over::Spec(spec) => {
                let frame = spec.frame.unwrap();
                assert_eq!(frame.units, FrameUnits::Rows);
                assert!(matches!(frame.start, FrameBound::Preceding(_)));
                assert_eq!(frame.end, Some(FrameBound::CurrentRow));
            }
            Over::Named(_) => panic!("expected inline spec"),
        },
        other => panic!("expected function, got {:?}", other.kind()),
    }
}

#[test]
fn test_named_window_reference() {
    let stmt = parse("SELECT sum(x) OVER w FROM t WINDOW w AS (PARTITION BY g)").unwrap();
    let query = stmt.into_query().unwrap();
    match query {
        Query::Select(select) => {
            assert!(select.window.is_some());
            match &select.select.items[0] {
                SelectItem::Expr(item) => match &item.expr {
                    Expr::Function(call) => {
                        assert!(matches!(&call.over, Some(Over::Named(n)) if n.as_str() == "w"))
                    }
                    other => panic!("expected function, got {:?}", other.kind()),
                },
                other => panic!("expected expr item, got {other:?}"),
            }
        }
        other => panic!("expected select, got {:?}", other.kind()),
    }
}

#[test]
fn test_array_literal_and_query() {
    assert!(matches!(expr("ARRAY[1, 2, 3]"), Expr::Array(_)));
    assert!(matches!(
        expr("ARRAY(SELECT id FROM t)"),
        Expr::ArrayQuery(_)
    ));
}

#[test]
fn test_subscript_and_slice() {
    match expr("tags[1]") {
        Expr::Subscript(s) => assert!(matches!(s.index, Subscript::Index(_))),
        other => panic!("expected subscript, got {:?}", other.kind()),
    }
    match expr("tags[1:2]") {
        Expr::Subscript(s) => assert!(matches!(s.index, Subscript::Slice { .. })),
        other => panic!("expected subscript, got {:?}", other.kind()),
    }
}

#[test]
fn test_scalar_subquery_and_exists() {
    assert!(matches!(
        expr("(SELECT max(id) FROM t)"),
        Expr::Subquery(_)
    ));
    assert!(matches!(
        expr("EXISTS (SELECT 1 FROM t)"),
        Expr::Exists(_)
    ));
}

#[test]
fn test_tuple_and_row() {
    match expr("(1, 2)") {
        Expr::Tuple(tuple) => assert!(!tuple.row),
        other => panic!("expected tuple, got {:?}", other.kind()),
    }
    match expr("ROW(1, 2)") {
        Expr::Tuple(tuple) => assert!(tuple.row),
        other => panic!("expected tuple, got {:?}", other.kind()),
    }
}

#[test]
fn test_typed_string() {
    match expr("DATE '2024-01-01'") {
        Expr::TypedString(typed) => {
            assert_eq!(typed.ty.name.key(), "DATE");
            assert_eq!(typed.value, "2024-01-01");
        }
        other => panic!("expected typed string, got {:?}", other.kind()),
    }
}

#[test]
fn test_parameters() {
    match expr(":status") {
        Expr::Param(param) => {
            assert_eq!(param.name, "status");
            assert_eq!(param.index, None);
        }
        other => panic!("expected param, got {:?}", other.kind()),
    }
    match expr("$2") {
        Expr::Param(param) => assert_eq!(param.index, Some(2)),
        other => panic!("expected param, got {:?}", other.kind()),
    }
}

#[test]
fn test_collate() {
    assert!(matches!(expr("name COLLATE \"de_DE\""), Expr::Collate(_)));
}

#[test]
fn test_qualified_column_preserves_quoting() {
    match expr("\"Schema\".\"Tbl\".col") {
        Expr::Column(column) => {
            assert_eq!(column.name.parts.len(), 3);
            assert!(column.name.parts[0].quoted);
            assert!(!column.name.parts[2].quoted);
        }
        other => panic!("expected column, got {:?}", other.kind()),
    }
}
