//! Metadata stripping for structural comparison.
//!
//! Spans and comments are positional metadata: two trees parsed from
//! differently formatted renditions of the same SQL differ only there.
//! [`strip_metadata`] clears both so trees can be compared with `==`
//! ("structurally equal modulo comment positions").

use super::ddl::*;
use super::dml::*;
use super::expr::*;
use super::name::{Ident, QualifiedName};
use super::query::*;
use super::source::*;
use super::statement::{Statement, StatementBody};
use super::visitor_mut::{self, VisitMut};

/// Remove spans, comments, and the preserved lexeme stream from a statement.
pub fn strip_metadata(stmt: &mut Statement) {
    stmt.header.clear();
    stmt.preserved = None;
    let mut stripper = Stripper;
    stripper.visit_statement_mut(stmt);
    strip_ddl(&mut stmt.body);
}

fn strip_ident(ident: &mut Ident) {
    ident.span = None;
}

fn strip_name(name: &mut QualifiedName) {
    for part in &mut name.parts {
        strip_ident(part);
    }
}

struct Stripper;

impl VisitMut for Stripper {
    fn visit_select_query_mut(&mut self, query: &mut SelectQuery) {
        query.span = None;
        query.comments.clear();
        query.select.comments.clear();
        if let Some(from) = &mut query.from {
            from.comments.clear();
        }
        if let Some(clause) = &mut query.where_clause {
            clause.comments.clear();
        }
        if let Some(clause) = &mut query.group_by {
            clause.comments.clear();
        }
        if let Some(clause) = &mut query.having {
            clause.comments.clear();
        }
        if let Some(clause) = &mut query.window {
            clause.comments.clear();
            for window in &mut clause.windows {
                strip_ident(&mut window.name);
                window.comments.clear();
            }
        }
        if let Some(clause) = &mut query.order_by {
            clause.comments.clear();
        }
        if let Some(clause) = &mut query.limit {
            clause.comments.clear();
        }
        if let Some(clause) = &mut query.offset {
            clause.comments.clear();
        }
        if let Some(clause) = &mut query.fetch {
            clause.comments.clear();
        }
        for clause in &mut query.locking {
            clause.comments.clear();
            for name in &mut clause.of {
                strip_name(name);
            }
        }
        visitor_mut::walk_select_query_mut(self, query);
    }

    fn visit_binary_query_mut(&mut self, query: &mut BinaryQuery) {
        query.span = None;
        query.comments.clear();
        if let Some(clause) = &mut query.order_by {
            clause.comments.clear();
        }
        if let Some(clause) = &mut query.limit {
            clause.comments.clear();
        }
        if let Some(clause) = &mut query.offset {
            clause.comments.clear();
        }
        if let Some(clause) = &mut query.fetch {
            clause.comments.clear();
        }
        visitor_mut::walk_binary_query_mut(self, query);
    }

    fn visit_values_query_mut(&mut self, query: &mut ValuesQuery) {
        query.span = None;
        query.comments.clear();
        visitor_mut::walk_values_query_mut(self, query);
    }

    fn visit_with_clause_mut(&mut self, with: &mut WithClause) {
        with.comments.clear();
        visitor_mut::walk_with_clause_mut(self, with);
    }

    fn visit_common_table_mut(&mut self, table: &mut CommonTable) {
        table.span = None;
        table.comments.clear();
        strip_ident(&mut table.name);
        for column in &mut table.columns {
            strip_ident(column);
        }
        visitor_mut::walk_common_table_mut(self, table);
    }

    fn visit_select_item_mut(&mut self, item: &mut SelectItem) {
        match item {
            SelectItem::Wildcard(wildcard) => wildcard.comments.clear(),
            SelectItem::Expr(item) => {
                item.comments.clear();
                if let Some(alias) = &mut item.alias {
                    strip_ident(alias);
                }
            }
        }
        visitor_mut::walk_select_item_mut(self, item);
    }

    fn visit_source_expr_mut(&mut self, source: &mut SourceExpr) {
        source.comments.clear();
        if let Some(alias) = &mut source.alias {
            strip_ident(&mut alias.name);
            for column in &mut alias.columns {
                strip_ident(column);
            }
        }
        visitor_mut::walk_source_expr_mut(self, source);
    }

    fn visit_join_mut(&mut self, join: &mut Join) {
        join.comments.clear();
        if let Some(JoinConstraint::Using(columns)) = &mut join.constraint {
            for column in columns {
                strip_ident(column);
            }
        }
        visitor_mut::walk_join_mut(self, join);
    }

    fn visit_where_clause_mut(&mut self, clause: &mut WhereClause) {
        clause.comments.clear();
        visitor_mut::walk_where_clause_mut(self, clause);
    }

    fn visit_order_expr_mut(&mut self, order: &mut OrderExpr) {
        order.comments.clear();
        visitor_mut::walk_order_expr_mut(self, order);
    }

    fn visit_expr_mut(&mut self, expr: &mut Expr) {
        expr.comments_mut().clear();
        if let Expr::Case(case) = expr {
            for branch in &mut case.branches {
                branch.comments.clear();
            }
        }
        if let Expr::Function(call) = expr {
            strip_name(&mut call.name);
            if let Some(Over::Named(name)) = &mut call.over {
                strip_ident(name);
            }
            if let Some(Over::Spec(spec)) = &mut call.over {
                spec.comments.clear();
                if let Some(base) = &mut spec.base {
                    strip_ident(base);
                }
            }
        }
        if let Expr::Cast(cast) = expr {
            strip_name(&mut cast.ty.name);
            for modifier in &mut cast.ty.modifiers {
                self.visit_expr_mut(modifier);
            }
        }
        if let Expr::TypedString(typed) = expr {
            strip_name(&mut typed.ty.name);
        }
        if let Expr::Collate(collate) = expr {
            strip_name(&mut collate.collation);
        }
        visitor_mut::walk_expr_mut(self, expr);
    }

    fn visit_window_spec_mut(&mut self, spec: &mut WindowSpec) {
        spec.comments.clear();
        if let Some(base) = &mut spec.base {
            strip_ident(base);
        }
        visitor_mut::walk_window_spec_mut(self, spec);
    }

    fn visit_qualified_name_mut(&mut self, name: &mut QualifiedName) {
        strip_name(name);
    }

    fn visit_insert_mut(&mut self, insert: &mut InsertQuery) {
        insert.comments.clear();
        if let Some(alias) = &mut insert.alias {
            strip_ident(alias);
        }
        for column in &mut insert.columns {
            strip_ident(column);
        }
        visitor_mut::walk_insert_mut(self, insert);
    }

    fn visit_update_mut(&mut self, update: &mut UpdateQuery) {
        update.comments.clear();
        visitor_mut::walk_update_mut(self, update);
    }

    fn visit_delete_mut(&mut self, delete: &mut DeleteQuery) {
        delete.comments.clear();
        visitor_mut::walk_delete_mut(self, delete);
    }

    fn visit_merge_mut(&mut self, merge: &mut MergeQuery) {
        merge.comments.clear();
        for when in &mut merge.clauses {
            when.comments.clear();
            if let MergeAction::Insert { columns, .. } = &mut when.action {
                for column in columns {
                    strip_ident(column);
                }
            }
        }
        visitor_mut::walk_merge_mut(self, merge);
    }

    fn visit_set_clause_mut(&mut self, set: &mut SetClause) {
        set.comments.clear();
        visitor_mut::walk_set_clause_mut(self, set);
    }
}

// The mutable visitor does not descend into DDL (it has no parameters to
// bind), so DDL metadata is stripped by direct recursion.
fn strip_ddl(body: &mut StatementBody) {
    match body {
        StatementBody::CreateTable(create) => {
            create.comments.clear();
            strip_name(&mut create.name);
            for column in &mut create.columns {
                strip_column_def(column);
            }
            for constraint in &mut create.constraints {
                strip_table_constraint(constraint);
            }
        }
        StatementBody::CreateIndex(create) => {
            create.comments.clear();
            strip_name(&mut create.table);
            if let Some(name) = &mut create.name {
                strip_ident(name);
            }
            if let Some(method) = &mut create.method {
                strip_ident(method);
            }
            for column in &mut create.columns {
                column.comments.clear();
                strip_expr_shallow(&mut column.expr);
            }
        }
        StatementBody::AlterTable(alter) => {
            alter.comments.clear();
            strip_name(&mut alter.table);
            for action in &mut alter.actions {
                match action {
                    AlterAction::AddColumn { column, .. } => strip_column_def(column),
                    AlterAction::DropColumn { name, .. } => strip_ident(name),
                    AlterAction::AddConstraint(constraint) => strip_table_constraint(constraint),
                    AlterAction::DropConstraint { name, .. } => strip_ident(name),
                }
            }
        }
        StatementBody::DropTable(drop) => {
            drop.comments.clear();
            for name in &mut drop.names {
                strip_name(name);
            }
        }
        StatementBody::DropIndex(drop) => {
            drop.comments.clear();
            for name in &mut drop.names {
                strip_name(name);
            }
        }
        StatementBody::Explain(explain) => {
            explain.comments.clear();
            strip_metadata(&mut explain.statement);
        }
        StatementBody::Analyze(analyze) => {
            analyze.comments.clear();
            if let Some(table) = &mut analyze.table {
                strip_name(table);
            }
        }
        StatementBody::Vacuum(vacuum) => {
            vacuum.comments.clear();
            if let Some(table) = &mut vacuum.table {
                strip_name(table);
            }
        }
        StatementBody::Reindex(reindex) => {
            reindex.comments.clear();
            strip_name(&mut reindex.name);
        }
        // Query statements were handled by the visitor.
        _ => {}
    }
}

fn strip_column_def(column: &mut ColumnDef) {
    column.comments.clear();
    strip_ident(&mut column.name);
    strip_name(&mut column.ty.name);
    for modifier in &mut column.ty.modifiers {
        strip_expr_shallow(modifier);
    }
    for constraint in &mut column.constraints {
        constraint.comments.clear();
        if let Some(name) = &mut constraint.name {
            strip_ident(name);
        }
        match &mut constraint.kind {
            ColumnConstraintKind::Default(expr) | ColumnConstraintKind::Check(expr) => {
                strip_expr_shallow(expr)
            }
            ColumnConstraintKind::References(reference) => strip_reference(reference),
            _ => {}
        }
    }
}

fn strip_table_constraint(constraint: &mut TableConstraint) {
    constraint.comments.clear();
    if let Some(name) = &mut constraint.name {
        strip_ident(name);
    }
    match &mut constraint.kind {
        TableConstraintKind::PrimaryKey(columns) | TableConstraintKind::Unique(columns) => {
            for column in columns {
                strip_ident(column);
            }
        }
        TableConstraintKind::ForeignKey { columns, reference } => {
            for column in columns {
                strip_ident(column);
            }
            strip_reference(reference);
        }
        TableConstraintKind::Check(expr) => strip_expr_shallow(expr),
    }
}

fn strip_reference(reference: &mut ReferenceDef) {
    strip_name(&mut reference.table);
    for column in &mut reference.columns {
        strip_ident(column);
    }
}

/// Strip an expression appearing inside DDL, which the visitor cannot reach.
fn strip_expr_shallow(expr: &mut Expr) {
    let mut stripper = Stripper;
    stripper.visit_expr_mut(expr);
}
