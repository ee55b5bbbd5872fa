//! The mutable visitor, mirroring [`super::visitor::Visit`].
//!
//! Used by transformers that edit a tree in place (parameter binding, rename,
//! injection). The deep/shallow discipline is the same: defaults recurse via
//! `walk_*_mut`, overriding without walking short-circuits.

use super::dml::*;
use super::expr::*;
use super::name::QualifiedName;
use super::query::*;
use super::source::*;
use super::statement::{Statement, StatementBody};

pub trait VisitMut {
    fn visit_statement_mut(&mut self, stmt: &mut Statement) {
        walk_statement_mut(self, stmt);
    }
    fn visit_query_mut(&mut self, query: &mut Query) {
        walk_query_mut(self, query);
    }
    fn visit_select_query_mut(&mut self, query: &mut SelectQuery) {
        walk_select_query_mut(self, query);
    }
    fn visit_binary_query_mut(&mut self, query: &mut BinaryQuery) {
        walk_binary_query_mut(self, query);
    }
    fn visit_values_query_mut(&mut self, query: &mut ValuesQuery) {
        walk_values_query_mut(self, query);
    }
    fn visit_with_clause_mut(&mut self, with: &mut WithClause) {
        walk_with_clause_mut(self, with);
    }
    fn visit_common_table_mut(&mut self, table: &mut CommonTable) {
        walk_common_table_mut(self, table);
    }
    fn visit_select_clause_mut(&mut self, select: &mut SelectClause) {
        walk_select_clause_mut(self, select);
    }
    fn visit_select_item_mut(&mut self, item: &mut SelectItem) {
        walk_select_item_mut(self, item);
    }
    fn visit_from_clause_mut(&mut self, from: &mut FromClause) {
        walk_from_clause_mut(self, from);
    }
    fn visit_source_expr_mut(&mut self, source: &mut SourceExpr) {
        walk_source_expr_mut(self, source);
    }
    fn visit_join_mut(&mut self, join: &mut Join) {
        walk_join_mut(self, join);
    }
    fn visit_where_clause_mut(&mut self, clause: &mut WhereClause) {
        walk_where_clause_mut(self, clause);
    }
    fn visit_order_expr_mut(&mut self, order: &mut OrderExpr) {
        walk_order_expr_mut(self, order);
    }
    fn visit_expr_mut(&mut self, expr: &mut Expr) {
        walk_expr_mut(self, expr);
    }
    fn visit_column_ref_mut(&mut self, column: &mut ColumnRef) {
        walk_column_ref_mut(self, column);
    }
    fn visit_param_mut(&mut self, _param: &mut ParamExpr) {}
    fn visit_function_call_mut(&mut self, call: &mut FunctionCall) {
        walk_function_call_mut(self, call);
    }
    fn visit_window_spec_mut(&mut self, spec: &mut WindowSpec) {
        walk_window_spec_mut(self, spec);
    }
    fn visit_qualified_name_mut(&mut self, _name: &mut QualifiedName) {}
    fn visit_insert_mut(&mut self, insert: &mut InsertQuery) {
        walk_insert_mut(self, insert);
    }
    fn visit_update_mut(&mut self, update: &mut UpdateQuery) {
        walk_update_mut(self, update);
    }
    fn visit_delete_mut(&mut self, delete: &mut DeleteQuery) {
        walk_delete_mut(self, delete);
    }
    fn visit_merge_mut(&mut self, merge: &mut MergeQuery) {
        walk_merge_mut(self, merge);
    }
    fn visit_set_clause_mut(&mut self, set: &mut SetClause) {
        walk_set_clause_mut(self, set);
    }
}

pub fn walk_statement_mut<V: VisitMut + ?Sized>(v: &mut V, stmt: &mut Statement) {
    match &mut stmt.body {
        StatementBody::Query(q) => v.visit_query_mut(q),
        StatementBody::Insert(s) => v.visit_insert_mut(s),
        StatementBody::Update(s) => v.visit_update_mut(s),
        StatementBody::Delete(s) => v.visit_delete_mut(s),
        StatementBody::Merge(s) => v.visit_merge_mut(s),
        StatementBody::Explain(s) => v.visit_statement_mut(&mut s.statement),
        // DDL carries no parameters, column references, or nested queries
        // that the mutable walks edit.
        _ => {}
    }
}

pub fn walk_query_mut<V: VisitMut + ?Sized>(v: &mut V, query: &mut Query) {
    match query {
        Query::Select(q) => v.visit_select_query_mut(q),
        Query::Binary(q) => v.visit_binary_query_mut(q),
        Query::Values(q) => v.visit_values_query_mut(q),
    }
}

pub fn walk_select_query_mut<V: VisitMut + ?Sized>(v: &mut V, query: &mut SelectQuery) {
    if let Some(with) = &mut query.with {
        v.visit_with_clause_mut(with);
    }
    v.visit_select_clause_mut(&mut query.select);
    if let Some(from) = &mut query.from {
        v.visit_from_clause_mut(from);
    }
    if let Some(clause) = &mut query.where_clause {
        v.visit_where_clause_mut(clause);
    }
    if let Some(clause) = &mut query.group_by {
        for expr in &mut clause.items {
            v.visit_expr_mut(expr);
        }
    }
    if let Some(clause) = &mut query.having {
        v.visit_expr_mut(&mut clause.condition);
    }
    if let Some(clause) = &mut query.window {
        for window in &mut clause.windows {
            v.visit_window_spec_mut(&mut window.spec);
        }
    }
    if let Some(clause) = &mut query.order_by {
        for item in &mut clause.items {
            v.visit_order_expr_mut(item);
        }
    }
    if let Some(clause) = &mut query.limit {
        v.visit_expr_mut(&mut clause.value);
    }
    if let Some(clause) = &mut query.offset {
        v.visit_expr_mut(&mut clause.value);
    }
    if let Some(clause) = &mut query.fetch
        && let Some(count) = &mut clause.count
    {
        v.visit_expr_mut(count);
    }
}

pub fn walk_binary_query_mut<V: VisitMut + ?Sized>(v: &mut V, query: &mut BinaryQuery) {
    if let Some(with) = &mut query.with {
        v.visit_with_clause_mut(with);
    }
    v.visit_query_mut(&mut query.left);
    v.visit_query_mut(&mut query.right);
    if let Some(clause) = &mut query.order_by {
        for item in &mut clause.items {
            v.visit_order_expr_mut(item);
        }
    }
    if let Some(clause) = &mut query.limit {
        v.visit_expr_mut(&mut clause.value);
    }
    if let Some(clause) = &mut query.offset {
        v.visit_expr_mut(&mut clause.value);
    }
}

pub fn walk_values_query_mut<V: VisitMut + ?Sized>(v: &mut V, query: &mut ValuesQuery) {
    if let Some(with) = &mut query.with {
        v.visit_with_clause_mut(with);
    }
    for row in &mut query.rows {
        for expr in row {
            v.visit_expr_mut(expr);
        }
    }
}

pub fn walk_with_clause_mut<V: VisitMut + ?Sized>(v: &mut V, with: &mut WithClause) {
    for table in &mut with.tables {
        v.visit_common_table_mut(table);
    }
}

pub fn walk_common_table_mut<V: VisitMut + ?Sized>(v: &mut V, table: &mut CommonTable) {
    v.visit_query_mut(&mut table.query);
}

pub fn walk_select_clause_mut<V: VisitMut + ?Sized>(v: &mut V, select: &mut SelectClause) {
    if let Some(Distinct::DistinctOn(exprs)) = &mut select.distinct {
        for expr in exprs {
            v.visit_expr_mut(expr);
        }
    }
    for item in &mut select.items {
        v.visit_select_item_mut(item);
    }
}

pub fn walk_select_item_mut<V: VisitMut + ?Sized>(v: &mut V, item: &mut SelectItem) {
    match item {
        SelectItem::Wildcard(wildcard) => {
            if let Some(qualifier) = &mut wildcard.qualifier {
                v.visit_qualified_name_mut(qualifier);
            }
        }
        SelectItem::Expr(item) => v.visit_expr_mut(&mut item.expr),
    }
}

pub fn walk_from_clause_mut<V: VisitMut + ?Sized>(v: &mut V, from: &mut FromClause) {
    for item in &mut from.items {
        v.visit_source_expr_mut(&mut item.source);
        for join in &mut item.joins {
            v.visit_join_mut(join);
        }
    }
}

pub fn walk_source_expr_mut<V: VisitMut + ?Sized>(v: &mut V, source: &mut SourceExpr) {
    match &mut source.source {
        Source::Table(table) => v.visit_qualified_name_mut(&mut table.name),
        Source::Query(query) => v.visit_query_mut(&mut query.query),
        Source::Function(function) => v.visit_function_call_mut(&mut function.call),
        Source::Values(values) => {
            for row in &mut values.rows {
                for expr in row {
                    v.visit_expr_mut(expr);
                }
            }
        }
        Source::Paren(inner) => {
            v.visit_source_expr_mut(&mut inner.source);
            for join in &mut inner.joins {
                v.visit_join_mut(join);
            }
        }
    }
}

pub fn walk_join_mut<V: VisitMut + ?Sized>(v: &mut V, join: &mut Join) {
    v.visit_source_expr_mut(&mut join.source);
    if let Some(JoinConstraint::On(condition)) = &mut join.constraint {
        v.visit_expr_mut(condition);
    }
}

pub fn walk_where_clause_mut<V: VisitMut + ?Sized>(v: &mut V, clause: &mut WhereClause) {
    v.visit_expr_mut(&mut clause.condition);
}

pub fn walk_order_expr_mut<V: VisitMut + ?Sized>(v: &mut V, order: &mut OrderExpr) {
    v.visit_expr_mut(&mut order.expr);
}

pub fn walk_expr_mut<V: VisitMut + ?Sized>(v: &mut V, expr: &mut Expr) {
    match expr {
        Expr::Column(column) => v.visit_column_ref_mut(column),
        Expr::Literal(_) => {}
        Expr::Param(param) => v.visit_param_mut(param),
        Expr::Unary(unary) => v.visit_expr_mut(&mut unary.operand),
        Expr::Binary(binary) => {
            v.visit_expr_mut(&mut binary.left);
            v.visit_expr_mut(&mut binary.right);
        }
        Expr::Between(between) => {
            v.visit_expr_mut(&mut between.operand);
            v.visit_expr_mut(&mut between.low);
            v.visit_expr_mut(&mut between.high);
        }
        Expr::InList(in_list) => {
            v.visit_expr_mut(&mut in_list.operand);
            for item in &mut in_list.items {
                v.visit_expr_mut(item);
            }
        }
        Expr::InQuery(in_query) => {
            v.visit_expr_mut(&mut in_query.operand);
            v.visit_query_mut(&mut in_query.query);
        }
        Expr::Exists(exists) => v.visit_query_mut(&mut exists.query),
        Expr::Function(call) => v.visit_function_call_mut(call),
        Expr::Cast(cast) => v.visit_expr_mut(&mut cast.operand),
        Expr::Case(case) => {
            if let Some(operand) = &mut case.operand {
                v.visit_expr_mut(operand);
            }
            for branch in &mut case.branches {
                v.visit_expr_mut(&mut branch.condition);
                v.visit_expr_mut(&mut branch.result);
            }
            if let Some(else_value) = &mut case.else_value {
                v.visit_expr_mut(else_value);
            }
        }
        Expr::Tuple(tuple) => {
            for item in &mut tuple.items {
                v.visit_expr_mut(item);
            }
        }
        Expr::Array(array) => {
            for item in &mut array.items {
                v.visit_expr_mut(item);
            }
        }
        Expr::ArrayQuery(array) => v.visit_query_mut(&mut array.query),
        Expr::Subscript(subscript) => {
            v.visit_expr_mut(&mut subscript.operand);
            match &mut subscript.index {
                Subscript::Index(index) => v.visit_expr_mut(index),
                Subscript::Slice { lower, upper } => {
                    if let Some(lower) = lower {
                        v.visit_expr_mut(lower);
                    }
                    if let Some(upper) = upper {
                        v.visit_expr_mut(upper);
                    }
                }
            }
        }
        Expr::Subquery(subquery) => v.visit_query_mut(&mut subquery.query),
        Expr::Paren(paren) => v.visit_expr_mut(&mut paren.inner),
        Expr::TypedString(_) => {}
        Expr::Collate(collate) => v.visit_expr_mut(&mut collate.operand),
    }
}

pub fn walk_column_ref_mut<V: VisitMut + ?Sized>(v: &mut V, column: &mut ColumnRef) {
    v.visit_qualified_name_mut(&mut column.name);
}

pub fn walk_function_call_mut<V: VisitMut + ?Sized>(v: &mut V, call: &mut FunctionCall) {
    for arg in &mut call.args {
        v.visit_expr_mut(arg);
    }
    for order in &mut call.order_by {
        v.visit_order_expr_mut(order);
    }
    if let Some(filter) = &mut call.filter {
        v.visit_expr_mut(filter);
    }
    if let Some(Over::Spec(spec)) = &mut call.over {
        v.visit_window_spec_mut(spec);
    }
}

pub fn walk_window_spec_mut<V: VisitMut + ?Sized>(v: &mut V, spec: &mut WindowSpec) {
    for expr in &mut spec.partition_by {
        v.visit_expr_mut(expr);
    }
    for order in &mut spec.order_by {
        v.visit_order_expr_mut(order);
    }
    if let Some(frame) = &mut spec.frame {
        let mut bounds = vec![&mut frame.start];
        if let Some(end) = &mut frame.end {
            bounds.push(end);
        }
        for bound in bounds {
            match bound {
                FrameBound::Preceding(expr) | FrameBound::Following(expr) => {
                    v.visit_expr_mut(expr)
                }
                _ => {}
            }
        }
    }
}

pub fn walk_insert_mut<V: VisitMut + ?Sized>(v: &mut V, insert: &mut InsertQuery) {
    if let Some(with) = &mut insert.with {
        v.visit_with_clause_mut(with);
    }
    v.visit_qualified_name_mut(&mut insert.table);
    if let InsertSource::Query(query) = &mut insert.source {
        v.visit_query_mut(query);
    }
    if let Some(returning) = &mut insert.returning {
        for item in returning {
            v.visit_select_item_mut(item);
        }
    }
}

pub fn walk_update_mut<V: VisitMut + ?Sized>(v: &mut V, update: &mut UpdateQuery) {
    if let Some(with) = &mut update.with {
        v.visit_with_clause_mut(with);
    }
    v.visit_source_expr_mut(&mut update.table);
    for set in &mut update.set {
        v.visit_set_clause_mut(set);
    }
    if let Some(from) = &mut update.from {
        v.visit_from_clause_mut(from);
    }
    if let Some(clause) = &mut update.where_clause {
        v.visit_where_clause_mut(clause);
    }
    if let Some(returning) = &mut update.returning {
        for item in returning {
            v.visit_select_item_mut(item);
        }
    }
}

pub fn walk_delete_mut<V: VisitMut + ?Sized>(v: &mut V, delete: &mut DeleteQuery) {
    if let Some(with) = &mut delete.with {
        v.visit_with_clause_mut(with);
    }
    v.visit_source_expr_mut(&mut delete.table);
    if let Some(using) = &mut delete.using {
        v.visit_from_clause_mut(using);
    }
    if let Some(clause) = &mut delete.where_clause {
        v.visit_where_clause_mut(clause);
    }
    if let Some(returning) = &mut delete.returning {
        for item in returning {
            v.visit_select_item_mut(item);
        }
    }
}

pub fn walk_merge_mut<V: VisitMut + ?Sized>(v: &mut V, merge: &mut MergeQuery) {
    if let Some(with) = &mut merge.with {
        v.visit_with_clause_mut(with);
    }
    v.visit_source_expr_mut(&mut merge.target);
    v.visit_source_expr_mut(&mut merge.source);
    v.visit_expr_mut(&mut merge.on);
    for when in &mut merge.clauses {
        if let Some(condition) = &mut when.condition {
            v.visit_expr_mut(condition);
        }
        match &mut when.action {
            MergeAction::Update { set } => {
                for clause in set {
                    v.visit_set_clause_mut(clause);
                }
            }
            MergeAction::Insert { values, .. } => {
                if let MergeInsertValues::Values(exprs) = values {
                    for expr in exprs {
                        v.visit_expr_mut(expr);
                    }
                }
            }
            MergeAction::Delete | MergeAction::DoNothing => {}
        }
    }
}

pub fn walk_set_clause_mut<V: VisitMut + ?Sized>(v: &mut V, set: &mut SetClause) {
    v.visit_qualified_name_mut(&mut set.column);
    v.visit_expr_mut(&mut set.value);
}
