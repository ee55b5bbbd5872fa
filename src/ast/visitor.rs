//! Visitor traits for AST traversal.
//!
//! [`Visit`] is the read-only walk, [`VisitMut`] the in-place editing walk.
//! Every method has a default implementation that recurses into children via
//! the matching free `walk_*` function (deep visit). Overriding a method
//! without calling `walk_*` short-circuits that subtree (shallow visit);
//! collectors that must distinguish the root query from nested ones rely on
//! exactly that.

use super::ddl::*;
use super::dml::*;
use super::expr::*;
use super::name::QualifiedName;
use super::query::*;
use super::source::*;
use super::statement::{Statement, StatementBody};

// ============================================================================
// Read-only visitor
// ============================================================================

pub trait Visit {
    fn visit_statement(&mut self, stmt: &Statement) {
        walk_statement(self, stmt);
    }
    fn visit_query(&mut self, query: &Query) {
        walk_query(self, query);
    }
    fn visit_select_query(&mut self, query: &SelectQuery) {
        walk_select_query(self, query);
    }
    fn visit_binary_query(&mut self, query: &BinaryQuery) {
        walk_binary_query(self, query);
    }
    fn visit_values_query(&mut self, query: &ValuesQuery) {
        walk_values_query(self, query);
    }
    fn visit_with_clause(&mut self, with: &WithClause) {
        walk_with_clause(self, with);
    }
    fn visit_common_table(&mut self, table: &CommonTable) {
        walk_common_table(self, table);
    }
    fn visit_select_clause(&mut self, select: &SelectClause) {
        walk_select_clause(self, select);
    }
    fn visit_select_item(&mut self, item: &SelectItem) {
        walk_select_item(self, item);
    }
    fn visit_from_clause(&mut self, from: &FromClause) {
        walk_from_clause(self, from);
    }
    fn visit_source_expr(&mut self, source: &SourceExpr) {
        walk_source_expr(self, source);
    }
    fn visit_join(&mut self, join: &Join) {
        walk_join(self, join);
    }
    fn visit_where_clause(&mut self, clause: &WhereClause) {
        walk_where_clause(self, clause);
    }
    fn visit_group_by_clause(&mut self, clause: &GroupByClause) {
        walk_group_by_clause(self, clause);
    }
    fn visit_having_clause(&mut self, clause: &HavingClause) {
        walk_having_clause(self, clause);
    }
    fn visit_window_clause(&mut self, clause: &WindowClause) {
        walk_window_clause(self, clause);
    }
    fn visit_order_by_clause(&mut self, clause: &OrderByClause) {
        walk_order_by_clause(self, clause);
    }
    fn visit_order_expr(&mut self, order: &OrderExpr) {
        walk_order_expr(self, order);
    }
    fn visit_limit_clause(&mut self, clause: &LimitClause) {
        walk_limit_clause(self, clause);
    }
    fn visit_offset_clause(&mut self, clause: &OffsetClause) {
        walk_offset_clause(self, clause);
    }
    fn visit_fetch_clause(&mut self, clause: &FetchClause) {
        walk_fetch_clause(self, clause);
    }
    fn visit_locking_clause(&mut self, _clause: &LockingClause) {}
    fn visit_expr(&mut self, expr: &Expr) {
        walk_expr(self, expr);
    }
    fn visit_column_ref(&mut self, column: &ColumnRef) {
        walk_column_ref(self, column);
    }
    fn visit_param(&mut self, _param: &ParamExpr) {}
    fn visit_function_call(&mut self, call: &FunctionCall) {
        walk_function_call(self, call);
    }
    fn visit_window_spec(&mut self, spec: &WindowSpec) {
        walk_window_spec(self, spec);
    }
    fn visit_qualified_name(&mut self, _name: &QualifiedName) {}
    fn visit_type_name(&mut self, ty: &TypeName) {
        walk_type_name(self, ty);
    }
    fn visit_insert(&mut self, insert: &InsertQuery) {
        walk_insert(self, insert);
    }
    fn visit_update(&mut self, update: &UpdateQuery) {
        walk_update(self, update);
    }
    fn visit_delete(&mut self, delete: &DeleteQuery) {
        walk_delete(self, delete);
    }
    fn visit_merge(&mut self, merge: &MergeQuery) {
        walk_merge(self, merge);
    }
    fn visit_merge_when(&mut self, when: &MergeWhen) {
        walk_merge_when(self, when);
    }
    fn visit_set_clause(&mut self, set: &SetClause) {
        walk_set_clause(self, set);
    }
    fn visit_create_table(&mut self, create: &CreateTable) {
        walk_create_table(self, create);
    }
    fn visit_column_def(&mut self, column: &ColumnDef) {
        walk_column_def(self, column);
    }
    fn visit_column_constraint(&mut self, constraint: &ColumnConstraint) {
        walk_column_constraint(self, constraint);
    }
    fn visit_table_constraint(&mut self, constraint: &TableConstraint) {
        walk_table_constraint(self, constraint);
    }
    fn visit_reference_def(&mut self, reference: &ReferenceDef) {
        walk_reference_def(self, reference);
    }
    fn visit_create_index(&mut self, create: &CreateIndex) {
        walk_create_index(self, create);
    }
    fn visit_index_column(&mut self, column: &IndexColumn) {
        walk_index_column(self, column);
    }
    fn visit_alter_table(&mut self, alter: &AlterTable) {
        walk_alter_table(self, alter);
    }
    fn visit_alter_action(&mut self, action: &AlterAction) {
        walk_alter_action(self, action);
    }
    fn visit_drop_table(&mut self, drop: &DropTable) {
        walk_drop_table(self, drop);
    }
    fn visit_drop_index(&mut self, drop: &DropIndex) {
        walk_drop_index(self, drop);
    }
    fn visit_explain(&mut self, explain: &ExplainStmt) {
        walk_explain(self, explain);
    }
    fn visit_analyze(&mut self, analyze: &AnalyzeStmt) {
        walk_analyze(self, analyze);
    }
    fn visit_vacuum(&mut self, vacuum: &VacuumStmt) {
        walk_vacuum(self, vacuum);
    }
    fn visit_reindex(&mut self, reindex: &ReindexStmt) {
        walk_reindex(self, reindex);
    }
}

pub fn walk_statement<V: Visit + ?Sized>(v: &mut V, stmt: &Statement) {
    match &stmt.body {
        StatementBody::Query(q) => v.visit_query(q),
        StatementBody::Insert(s) => v.visit_insert(s),
        StatementBody::Update(s) => v.visit_update(s),
        StatementBody::Delete(s) => v.visit_delete(s),
        StatementBody::Merge(s) => v.visit_merge(s),
        StatementBody::CreateTable(s) => v.visit_create_table(s),
        StatementBody::CreateIndex(s) => v.visit_create_index(s),
        StatementBody::AlterTable(s) => v.visit_alter_table(s),
        StatementBody::DropTable(s) => v.visit_drop_table(s),
        StatementBody::DropIndex(s) => v.visit_drop_index(s),
        StatementBody::Explain(s) => v.visit_explain(s),
        StatementBody::Analyze(s) => v.visit_analyze(s),
        StatementBody::Vacuum(s) => v.visit_vacuum(s),
        StatementBody::Reindex(s) => v.visit_reindex(s),
    }
}

pub fn walk_query<V: Visit + ?Sized>(v: &mut V, query: &Query) {
    match query {
        Query::Select(q) => v.visit_select_query(q),
        Query::Binary(q) => v.visit_binary_query(q),
        Query::Values(q) => v.visit_values_query(q),
    }
}

pub fn walk_select_query<V: Visit + ?Sized>(v: &mut V, query: &SelectQuery) {
    if let Some(with) = &query.with {
        v.visit_with_clause(with);
    }
    v.visit_select_clause(&query.select);
    if let Some(from) = &query.from {
        v.visit_from_clause(from);
    }
    if let Some(clause) = &query.where_clause {
        v.visit_where_clause(clause);
    }
    if let Some(clause) = &query.group_by {
        v.visit_group_by_clause(clause);
    }
    if let Some(clause) = &query.having {
        v.visit_having_clause(clause);
    }
    if let Some(clause) = &query.window {
        v.visit_window_clause(clause);
    }
    if let Some(clause) = &query.order_by {
        v.visit_order_by_clause(clause);
    }
    if let Some(clause) = &query.limit {
        v.visit_limit_clause(clause);
    }
    if let Some(clause) = &query.offset {
        v.visit_offset_clause(clause);
    }
    if let Some(clause) = &query.fetch {
        v.visit_fetch_clause(clause);
    }
    for clause in &query.locking {
        v.visit_locking_clause(clause);
    }
}

pub fn walk_binary_query<V: Visit + ?Sized>(v: &mut V, query: &BinaryQuery) {
    if let Some(with) = &query.with {
        v.visit_with_clause(with);
    }
    v.visit_query(&query.left);
    v.visit_query(&query.right);
    if let Some(clause) = &query.order_by {
        v.visit_order_by_clause(clause);
    }
    if let Some(clause) = &query.limit {
        v.visit_limit_clause(clause);
    }
    if let Some(clause) = &query.offset {
        v.visit_offset_clause(clause);
    }
    if let Some(clause) = &query.fetch {
        v.visit_fetch_clause(clause);
    }
}

pub fn walk_values_query<V: Visit + ?Sized>(v: &mut V, query: &ValuesQuery) {
    if let Some(with) = &query.with {
        v.visit_with_clause(with);
    }
    for row in &query.rows {
        for expr in row {
            v.visit_expr(expr);
        }
    }
}

pub fn walk_with_clause<V: Visit + ?Sized>(v: &mut V, with: &WithClause) {
    for table in &with.tables {
        v.visit_common_table(table);
    }
}

pub fn walk_common_table<V: Visit + ?Sized>(v: &mut V, table: &CommonTable) {
    v.visit_query(&table.query);
}

pub fn walk_select_clause<V: Visit + ?Sized>(v: &mut V, select: &SelectClause) {
    if let Some(Distinct::DistinctOn(exprs)) = &select.distinct {
        for expr in exprs {
            v.visit_expr(expr);
        }
    }
    for item in &select.items {
        v.visit_select_item(item);
    }
}

pub fn walk_select_item<V: Visit + ?Sized>(v: &mut V, item: &SelectItem) {
    match item {
        SelectItem::Wildcard(wildcard) => {
            if let Some(qualifier) = &wildcard.qualifier {
                v.visit_qualified_name(qualifier);
            }
        }
        SelectItem::Expr(item) => v.visit_expr(&item.expr),
    }
}

pub fn walk_from_clause<V: Visit + ?Sized>(v: &mut V, from: &FromClause) {
    for item in &from.items {
        v.visit_source_expr(&item.source);
        for join in &item.joins {
            v.visit_join(join);
        }
    }
}

pub fn walk_source_expr<V: Visit + ?Sized>(v: &mut V, source: &SourceExpr) {
    match &source.source {
        Source::Table(table) => v.visit_qualified_name(&table.name),
        Source::Query(query) => v.visit_query(&query.query),
        Source::Function(function) => v.visit_function_call(&function.call),
        Source::Values(values) => {
            for row in &values.rows {
                for expr in row {
                    v.visit_expr(expr);
                }
            }
        }
        Source::Paren(inner) => {
            v.visit_source_expr(&inner.source);
            for join in &inner.joins {
                v.visit_join(join);
            }
        }
    }
}

pub fn walk_join<V: Visit + ?Sized>(v: &mut V, join: &Join) {
    v.visit_source_expr(&join.source);
    if let Some(JoinConstraint::On(condition)) = &join.constraint {
        v.visit_expr(condition);
    }
}

pub fn walk_where_clause<V: Visit + ?Sized>(v: &mut V, clause: &WhereClause) {
    v.visit_expr(&clause.condition);
}

pub fn walk_group_by_clause<V: Visit + ?Sized>(v: &mut V, clause: &GroupByClause) {
    for expr in &clause.items {
        v.visit_expr(expr);
    }
}

pub fn walk_having_clause<V: Visit + ?Sized>(v: &mut V, clause: &HavingClause) {
    v.visit_expr(&clause.condition);
}

pub fn walk_window_clause<V: Visit + ?Sized>(v: &mut V, clause: &WindowClause) {
    for window in &clause.windows {
        v.visit_window_spec(&window.spec);
    }
}

pub fn walk_order_by_clause<V: Visit + ?Sized>(v: &mut V, clause: &OrderByClause) {
    for item in &clause.items {
        v.visit_order_expr(item);
    }
}

pub fn walk_order_expr<V: Visit + ?Sized>(v: &mut V, order: &OrderExpr) {
    v.visit_expr(&order.expr);
}

pub fn walk_limit_clause<V: Visit + ?Sized>(v: &mut V, clause: &LimitClause) {
    v.visit_expr(&clause.value);
}

pub fn walk_offset_clause<V: Visit + ?Sized>(v: &mut V, clause: &OffsetClause) {
    v.visit_expr(&clause.value);
}

pub fn walk_fetch_clause<V: Visit + ?Sized>(v: &mut V, clause: &FetchClause) {
    if let Some(count) = &clause.count {
        v.visit_expr(count);
    }
}

pub fn walk_expr<V: Visit + ?Sized>(v: &mut V, expr: &Expr) {
    match expr {
        Expr::Column(column) => v.visit_column_ref(column),
        Expr::Literal(_) => {}
        Expr::Param(param) => v.visit_param(param),
        Expr::Unary(unary) => v.visit_expr(&unary.operand),
        Expr::Binary(binary) => {
            v.visit_expr(&binary.left);
            v.visit_expr(&binary.right);
        }
        Expr::Between(between) => {
            v.visit_expr(&between.operand);
            v.visit_expr(&between.low);
            v.visit_expr(&between.high);
        }
        Expr::InList(in_list) => {
            v.visit_expr(&in_list.operand);
            for item in &in_list.items {
                v.visit_expr(item);
            }
        }
        Expr::InQuery(in_query) => {
            v.visit_expr(&in_query.operand);
            v.visit_query(&in_query.query);
        }
        Expr::Exists(exists) => v.visit_query(&exists.query),
        Expr::Function(call) => v.visit_function_call(call),
        Expr::Cast(cast) => {
            v.visit_expr(&cast.operand);
            v.visit_type_name(&cast.ty);
        }
        Expr::Case(case) => {
            if let Some(operand) = &case.operand {
                v.visit_expr(operand);
            }
            for branch in &case.branches {
                v.visit_expr(&branch.condition);
                v.visit_expr(&branch.result);
            }
            if let Some(else_value) = &case.else_value {
                v.visit_expr(else_value);
            }
        }
        Expr::Tuple(tuple) => {
            for item in &tuple.items {
                v.visit_expr(item);
            }
        }
        Expr::Array(array) => {
            for item in &array.items {
                v.visit_expr(item);
            }
        }
        Expr::ArrayQuery(array) => v.visit_query(&array.query),
        Expr::Subscript(subscript) => {
            v.visit_expr(&subscript.operand);
            match &subscript.index {
                Subscript::Index(index) => v.visit_expr(index),
                Subscript::Slice { lower, upper } => {
                    if let Some(lower) = lower {
                        v.visit_expr(lower);
                    }
                    if let Some(upper) = upper {
                        v.visit_expr(upper);
                    }
                }
            }
        }
        Expr::Subquery(subquery) => v.visit_query(&subquery.query),
        Expr::Paren(paren) => v.visit_expr(&paren.inner),
        Expr::TypedString(typed) => v.visit_type_name(&typed.ty),
        Expr::Collate(collate) => {
            v.visit_expr(&collate.operand);
            v.visit_qualified_name(&collate.collation);
        }
    }
}

pub fn walk_column_ref<V: Visit + ?Sized>(v: &mut V, column: &ColumnRef) {
    v.visit_qualified_name(&column.name);
}

pub fn walk_function_call<V: Visit + ?Sized>(v: &mut V, call: &FunctionCall) {
    v.visit_qualified_name(&call.name);
    for arg in &call.args {
        v.visit_expr(arg);
    }
    for order in &call.order_by {
        v.visit_order_expr(order);
    }
    if let Some(filter) = &call.filter {
        v.visit_expr(filter);
    }
    match &call.over {
        Some(Over::Spec(spec)) => v.visit_window_spec(spec),
        Some(Over::Named(_)) | None => {}
    }
}

pub fn walk_window_spec<V: Visit + ?Sized>(v: &mut V, spec: &WindowSpec) {
    for expr in &spec.partition_by {
        v.visit_expr(expr);
    }
    for order in &spec.order_by {
        v.visit_order_expr(order);
    }
    if let Some(frame) = &spec.frame {
        for bound in [Some(&frame.start), frame.end.as_ref()].into_iter().flatten() {
            match bound {
                FrameBound::Preceding(expr) | FrameBound::Following(expr) => v.visit_expr(expr),
                _ => {}
            }
        }
    }
}

pub fn walk_type_name<V: Visit + ?Sized>(v: &mut V, ty: &TypeName) {
    v.visit_qualified_name(&ty.name);
    for modifier in &ty.modifiers {
        v.visit_expr(modifier);
    }
}

pub fn walk_insert<V: Visit + ?Sized>(v: &mut V, insert: &InsertQuery) {
    if let Some(with) = &insert.with {
        v.visit_with_clause(with);
    }
    v.visit_qualified_name(&insert.table);
    if let InsertSource::Query(query) = &insert.source {
        v.visit_query(query);
    }
    if let Some(returning) = &insert.returning {
        for item in returning {
            v.visit_select_item(item);
        }
    }
}

pub fn walk_update<V: Visit + ?Sized>(v: &mut V, update: &UpdateQuery) {
    if let Some(with) = &update.with {
        v.visit_with_clause(with);
    }
    v.visit_source_expr(&update.table);
    for set in &update.set {
        v.visit_set_clause(set);
    }
    if let Some(from) = &update.from {
        v.visit_from_clause(from);
    }
    if let Some(clause) = &update.where_clause {
        v.visit_where_clause(clause);
    }
    if let Some(returning) = &update.returning {
        for item in returning {
            v.visit_select_item(item);
        }
    }
}

pub fn walk_delete<V: Visit + ?Sized>(v: &mut V, delete: &DeleteQuery) {
    if let Some(with) = &delete.with {
        v.visit_with_clause(with);
    }
    v.visit_source_expr(&delete.table);
    if let Some(using) = &delete.using {
        v.visit_from_clause(using);
    }
    if let Some(clause) = &delete.where_clause {
        v.visit_where_clause(clause);
    }
    if let Some(returning) = &delete.returning {
        for item in returning {
            v.visit_select_item(item);
        }
    }
}

pub fn walk_merge<V: Visit + ?Sized>(v: &mut V, merge: &MergeQuery) {
    if let Some(with) = &merge.with {
        v.visit_with_clause(with);
    }
    v.visit_source_expr(&merge.target);
    v.visit_source_expr(&merge.source);
    v.visit_expr(&merge.on);
    for when in &merge.clauses {
        v.visit_merge_when(when);
    }
}

pub fn walk_merge_when<V: Visit + ?Sized>(v: &mut V, when: &MergeWhen) {
    if let Some(condition) = &when.condition {
        v.visit_expr(condition);
    }
    match &when.action {
        MergeAction::Update { set } => {
            for clause in set {
                v.visit_set_clause(clause);
            }
        }
        MergeAction::Insert { values, .. } => {
            if let MergeInsertValues::Values(exprs) = values {
                for expr in exprs {
                    v.visit_expr(expr);
                }
            }
        }
        MergeAction::Delete | MergeAction::DoNothing => {}
    }
}

pub fn walk_set_clause<V: Visit + ?Sized>(v: &mut V, set: &SetClause) {
    v.visit_qualified_name(&set.column);
    v.visit_expr(&set.value);
}

pub fn walk_create_table<V: Visit + ?Sized>(v: &mut V, create: &CreateTable) {
    v.visit_qualified_name(&create.name);
    for column in &create.columns {
        v.visit_column_def(column);
    }
    for constraint in &create.constraints {
        v.visit_table_constraint(constraint);
    }
}

pub fn walk_column_def<V: Visit + ?Sized>(v: &mut V, column: &ColumnDef) {
    v.visit_type_name(&column.ty);
    for constraint in &column.constraints {
        v.visit_column_constraint(constraint);
    }
}

pub fn walk_column_constraint<V: Visit + ?Sized>(v: &mut V, constraint: &ColumnConstraint) {
    match &constraint.kind {
        ColumnConstraintKind::Default(expr) | ColumnConstraintKind::Check(expr) => {
            v.visit_expr(expr)
        }
        ColumnConstraintKind::References(reference) => v.visit_reference_def(reference),
        _ => {}
    }
}

pub fn walk_table_constraint<V: Visit + ?Sized>(v: &mut V, constraint: &TableConstraint) {
    match &constraint.kind {
        TableConstraintKind::Check(expr) => v.visit_expr(expr),
        TableConstraintKind::ForeignKey { reference, .. } => v.visit_reference_def(reference),
        _ => {}
    }
}

pub fn walk_reference_def<V: Visit + ?Sized>(v: &mut V, reference: &ReferenceDef) {
    v.visit_qualified_name(&reference.table);
}

pub fn walk_create_index<V: Visit + ?Sized>(v: &mut V, create: &CreateIndex) {
    v.visit_qualified_name(&create.table);
    for column in &create.columns {
        v.visit_index_column(column);
    }
}

pub fn walk_index_column<V: Visit + ?Sized>(v: &mut V, column: &IndexColumn) {
    v.visit_expr(&column.expr);
}

pub fn walk_alter_table<V: Visit + ?Sized>(v: &mut V, alter: &AlterTable) {
    v.visit_qualified_name(&alter.table);
    for action in &alter.actions {
        v.visit_alter_action(action);
    }
}

pub fn walk_alter_action<V: Visit + ?Sized>(v: &mut V, action: &AlterAction) {
    match action {
        AlterAction::AddColumn { column, .. } => v.visit_column_def(column),
        AlterAction::AddConstraint(constraint) => v.visit_table_constraint(constraint),
        AlterAction::DropColumn { .. } | AlterAction::DropConstraint { .. } => {}
    }
}

pub fn walk_drop_table<V: Visit + ?Sized>(v: &mut V, drop: &DropTable) {
    for name in &drop.names {
        v.visit_qualified_name(name);
    }
}

pub fn walk_drop_index<V: Visit + ?Sized>(v: &mut V, drop: &DropIndex) {
    for name in &drop.names {
        v.visit_qualified_name(name);
    }
}

pub fn walk_explain<V: Visit + ?Sized>(v: &mut V, explain: &ExplainStmt) {
    v.visit_statement(&explain.statement);
}

pub fn walk_analyze<V: Visit + ?Sized>(v: &mut V, analyze: &AnalyzeStmt) {
    if let Some(table) = &analyze.table {
        v.visit_qualified_name(table);
    }
}

pub fn walk_vacuum<V: Visit + ?Sized>(v: &mut V, vacuum: &VacuumStmt) {
    if let Some(table) = &vacuum.table {
        v.visit_qualified_name(table);
    }
}

pub fn walk_reindex<V: Visit + ?Sized>(v: &mut V, reindex: &ReindexStmt) {
    v.visit_qualified_name(&reindex.name);
}
