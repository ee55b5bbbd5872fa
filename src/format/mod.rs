//! Formatter: AST back to SQL text.
//!
//! The non-preserving path renders from structure alone and is idempotent at
//! the AST level; the preserving path re-emits the retained lexeme stream
//! byte for byte. Parameter indices are assigned in emission order.

mod options;
mod writer;

pub use options::{
    BreakStyle, CommentMode, FormatOptions, KeywordCase, NewlineStyle, ParamStyle, ParamSymbol,
};
pub use writer::BoundParams;

use crate::ast::*;
use crate::error::{Result, SchemaError};

use writer::SqlWriter;
use crate::lexer::Keyword;

/// Rendered SQL plus the parameters collected on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct FormattedSql {
    pub sql: String,
    pub params: BoundParams,
}

#[derive(Debug, Clone, Default)]
pub struct Formatter {
    options: FormatOptions,
}

impl Formatter {
    pub fn new(options: FormatOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &FormatOptions {
        &self.options
    }

    pub fn format(&self, stmt: &Statement) -> Result<FormattedSql> {
        if self.options.preserve_original_formatting {
            return self.format_preserved(stmt);
        }
        let mut w = SqlWriter::new(&self.options);
        if self.options.comment_mode != CommentMode::None {
            w.comments_before(&stmt.header);
        }
        fmt_statement_body(&mut w, &stmt.body);
        let (sql, params) = w.finish();
        Ok(FormattedSql { sql, params })
    }

    pub fn format_query(&self, query: &Query) -> Result<FormattedSql> {
        let mut w = SqlWriter::new(&self.options);
        fmt_query(&mut w, query);
        let (sql, params) = w.finish();
        Ok(FormattedSql { sql, params })
    }

    /// Byte-exact re-emission from the retained lexeme stream.
    fn format_preserved(&self, stmt: &Statement) -> Result<FormattedSql> {
        let Some(lexemes) = &stmt.preserved else {
            return Err(SchemaError::UnsupportedRoot(
                "statement parsed without formatting preservation",
            )
            .into());
        };
        let mut sql = String::new();
        for lexeme in lexemes {
            for comment in &lexeme.leading {
                sql.push_str(&comment.ws_before);
                sql.push_str(&comment.raw);
            }
            sql.push_str(&lexeme.whitespace);
            sql.push_str(&lexeme.raw);
            for comment in &lexeme.trailing {
                sql.push_str(&comment.ws_before);
                sql.push_str(&comment.raw);
            }
        }
        Ok(FormattedSql {
            sql,
            params: BoundParams::Named(Default::default()),
        })
    }
}

/// Render a statement with default options; the everyday helper.
pub fn to_sql(stmt: &Statement) -> Result<String> {
    Ok(Formatter::default().format(stmt)?.sql)
}

/// Render a query with default options.
pub fn query_to_sql(query: &Query) -> Result<String> {
    Ok(Formatter::default().format_query(query)?.sql)
}

// ============================================================================
// Statements
// ============================================================================

fn fmt_statement_body(w: &mut SqlWriter<'_>, body: &StatementBody) {
    match body {
        StatementBody::Query(query) => fmt_query(w, query),
        StatementBody::Insert(insert) => fmt_insert(w, insert),
        StatementBody::Update(update) => fmt_update(w, update),
        StatementBody::Delete(delete) => fmt_delete(w, delete),
        StatementBody::Merge(merge) => fmt_merge(w, merge),
        StatementBody::CreateTable(create) => fmt_create_table(w, create),
        StatementBody::CreateIndex(create) => fmt_create_index(w, create),
        StatementBody::AlterTable(alter) => fmt_alter_table(w, alter),
        StatementBody::DropTable(drop) => fmt_drop(w, Keyword::TABLE, &drop.names, drop.if_exists, drop.cascade),
        StatementBody::DropIndex(drop) => fmt_drop(w, Keyword::INDEX, &drop.names, drop.if_exists, drop.cascade),
        StatementBody::Explain(explain) => {
            w.keyword(Keyword::EXPLAIN);
            if explain.analyze {
                w.keyword(Keyword::ANALYZE);
            }
            if explain.verbose {
                w.keyword(Keyword::VERBOSE);
            }
            fmt_statement_body(w, &explain.statement.body);
        }
        StatementBody::Analyze(analyze) => {
            w.keyword(Keyword::ANALYZE);
            if analyze.verbose {
                w.keyword(Keyword::VERBOSE);
            }
            if let Some(table) = &analyze.table {
                fmt_name(w, table);
            }
        }
        StatementBody::Vacuum(vacuum) => {
            w.keyword(Keyword::VACUUM);
            if vacuum.full {
                w.keyword(Keyword::FULL);
            }
            if vacuum.analyze {
                w.keyword(Keyword::ANALYZE);
            }
            if let Some(table) = &vacuum.table {
                fmt_name(w, table);
            }
        }
        StatementBody::Reindex(reindex) => {
            w.keyword(Keyword::REINDEX);
            w.keyword(match reindex.target {
                ReindexTarget::Index => Keyword::INDEX,
                ReindexTarget::Table => Keyword::TABLE,
            });
            fmt_name(w, &reindex.name);
        }
    }
}

// ============================================================================
// Queries
// ============================================================================

fn fmt_query(w: &mut SqlWriter<'_>, query: &Query) {
    match query {
        Query::Select(select) => fmt_select(w, select),
        Query::Binary(binary) => fmt_binary(w, binary),
        Query::Values(values) => fmt_values(w, values),
    }
}

fn fmt_select(w: &mut SqlWriter<'_>, query: &SelectQuery) {
    w.comments_before(&query.comments.before);
    if let Some(with) = &query.with {
        fmt_with(w, with);
        w.clause_break();
    }

    w.keyword(Keyword::SELECT);
    match &query.select.distinct {
        Some(Distinct::All) => w.keyword(Keyword::ALL),
        Some(Distinct::Distinct) => w.keyword(Keyword::DISTINCT),
        Some(Distinct::DistinctOn(exprs)) => {
            w.keyword(Keyword::DISTINCT);
            w.keyword(Keyword::ON);
            w.word("(");
            fmt_expr_list(w, exprs);
            w.glue(")");
        }
        None => {}
    }
    for (i, item) in query.select.items.iter().enumerate() {
        if i > 0 {
            w.comma();
        }
        fmt_select_item(w, item);
    }

    if let Some(from) = &query.from {
        w.clause_break();
        w.keyword(Keyword::FROM);
        fmt_from(w, from);
    }
    if let Some(clause) = &query.where_clause {
        w.clause_break();
        w.comments_before(&clause.comments.before);
        w.keyword(Keyword::WHERE);
        fmt_expr(w, &clause.condition);
        w.comments_after(&clause.comments.after);
    }
    if let Some(clause) = &query.group_by {
        w.clause_break();
        w.keyword(Keyword::GROUP);
        w.keyword(Keyword::BY);
        fmt_expr_list(w, &clause.items);
    }
    if let Some(clause) = &query.having {
        w.clause_break();
        w.keyword(Keyword::HAVING);
        fmt_expr(w, &clause.condition);
    }
    if let Some(clause) = &query.window {
        w.clause_break();
        w.keyword(Keyword::WINDOW);
        for (i, window) in clause.windows.iter().enumerate() {
            if i > 0 {
                w.comma();
            }
            w.ident(&window.name);
            w.keyword(Keyword::AS);
            fmt_window_spec(w, &window.spec);
        }
    }
    fmt_trailing_clauses(
        w,
        query.order_by.as_ref(),
        query.limit.as_ref(),
        query.offset.as_ref(),
        query.fetch.as_ref(),
    );
    for locking in &query.locking {
        w.clause_break();
        w.keyword(Keyword::FOR);
        w.keyword_text(locking.mode.as_str());
        if !locking.of.is_empty() {
            w.keyword(Keyword::OF);
            for (i, name) in locking.of.iter().enumerate() {
                if i > 0 {
                    w.comma();
                }
                fmt_name(w, name);
            }
        }
        match locking.wait {
            Some(LockWait::Nowait) => w.keyword(Keyword::NOWAIT),
            Some(LockWait::SkipLocked) => {
                w.keyword(Keyword::SKIP);
                w.keyword(Keyword::LOCKED);
            }
            None => {}
        }
    }
    w.comments_after(&query.comments.after);
}

fn fmt_binary(w: &mut SqlWriter<'_>, query: &BinaryQuery) {
    if let Some(with) = &query.with {
        fmt_with(w, with);
        w.clause_break();
    }
    fmt_binary_arm(w, &query.left, false);
    w.clause_break();
    w.keyword_text(query.op.as_str());
    w.clause_break();
    fmt_binary_arm(w, &query.right, true);
    fmt_trailing_clauses(
        w,
        query.order_by.as_ref(),
        query.limit.as_ref(),
        query.offset.as_ref(),
        query.fetch.as_ref(),
    );
}

/// An arm of a set operation needs parentheses when it carries its own
/// trailing clauses or WITH, or when it is a nested set operation on the
/// right (left association is implicit).
fn fmt_binary_arm(w: &mut SqlWriter<'_>, arm: &Query, is_right: bool) {
    let needs_parens = match arm {
        Query::Binary(_) => is_right,
        Query::Select(select) => {
            select.with.is_some()
                || select.order_by.is_some()
                || select.limit.is_some()
                || select.offset.is_some()
                || select.fetch.is_some()
                || !select.locking.is_empty()
        }
        Query::Values(values) => values.with.is_some(),
    };
    if needs_parens {
        w.word("(");
        fmt_query(w, arm);
        w.glue(")");
    } else {
        fmt_query(w, arm);
    }
}

fn fmt_values(w: &mut SqlWriter<'_>, query: &ValuesQuery) {
    if let Some(with) = &query.with {
        fmt_with(w, with);
        w.clause_break();
    }
    w.keyword(Keyword::VALUES);
    for (i, row) in query.rows.iter().enumerate() {
        if i > 0 {
            w.comma();
        }
        w.word("(");
        fmt_expr_list(w, row);
        w.glue(")");
    }
}

fn fmt_trailing_clauses(
    w: &mut SqlWriter<'_>,
    order_by: Option<&OrderByClause>,
    limit: Option<&LimitClause>,
    offset: Option<&OffsetClause>,
    fetch: Option<&FetchClause>,
) {
    if let Some(clause) = order_by {
        w.clause_break();
        w.keyword(Keyword::ORDER);
        w.keyword(Keyword::BY);
        for (i, item) in clause.items.iter().enumerate() {
            if i > 0 {
                w.comma();
            }
            fmt_order_expr(w, item);
        }
    }
    if let Some(clause) = limit {
        w.clause_break();
        w.keyword(Keyword::LIMIT);
        fmt_expr(w, &clause.value);
    }
    if let Some(clause) = offset {
        w.clause_break();
        w.keyword(Keyword::OFFSET);
        fmt_expr(w, &clause.value);
        if clause.rows {
            w.keyword(Keyword::ROWS);
        }
    }
    if let Some(clause) = fetch {
        w.clause_break();
        w.keyword(Keyword::FETCH);
        w.keyword(if clause.first {
            Keyword::FIRST
        } else {
            Keyword::NEXT
        });
        if let Some(count) = &clause.count {
            fmt_expr(w, count);
        }
        w.keyword(Keyword::ROWS);
        if clause.with_ties {
            w.keyword(Keyword::WITH);
            w.keyword(Keyword::TIES);
        } else {
            w.keyword(Keyword::ONLY);
        }
    }
}

fn fmt_order_expr(w: &mut SqlWriter<'_>, item: &OrderExpr) {
    fmt_expr(w, &item.expr);
    match item.direction {
        Some(OrderDirection::Asc) => w.keyword(Keyword::ASC),
        Some(OrderDirection::Desc) => w.keyword(Keyword::DESC),
        None => {}
    }
    match item.nulls {
        Some(NullsOrder::First) => {
            w.keyword(Keyword::NULLS);
            w.keyword(Keyword::FIRST);
        }
        Some(NullsOrder::Last) => {
            w.keyword(Keyword::NULLS);
            w.keyword(Keyword::LAST);
        }
        None => {}
    }
}

fn fmt_with(w: &mut SqlWriter<'_>, with: &WithClause) {
    w.comments_before(&with.comments.before);
    w.keyword(Keyword::WITH);
    if with.recursive {
        w.keyword(Keyword::RECURSIVE);
    }
    for (i, table) in with.tables.iter().enumerate() {
        if i > 0 {
            w.comma();
        }
        fmt_common_table(w, table);
    }
    w.comments_after(&with.comments.after);
}

fn fmt_common_table(w: &mut SqlWriter<'_>, table: &CommonTable) {
    w.comments_before(&table.comments.before);
    w.ident(&table.name);
    if !table.columns.is_empty() {
        fmt_paren_idents(w, &table.columns);
    }
    w.keyword(Keyword::AS);
    match table.materialized {
        Some(true) => w.keyword(Keyword::MATERIALIZED),
        Some(false) => {
            w.keyword(Keyword::NOT);
            w.keyword(Keyword::MATERIALIZED);
        }
        None => {}
    }
    w.word("(");
    w.indented(|w| {
        w.newline();
        fmt_query(w, &table.query);
    });
    w.newline();
    w.glue(")");
    w.comments_after(&table.comments.after);
}

// ============================================================================
// Select list, FROM, joins
// ============================================================================

fn fmt_select_item(w: &mut SqlWriter<'_>, item: &SelectItem) {
    match item {
        SelectItem::Wildcard(wildcard) => {
            w.comments_before(&wildcard.comments.before);
            match &wildcard.qualifier {
                Some(qualifier) => {
                    fmt_name(w, qualifier);
                    w.glue(".*");
                }
                None => w.word("*"),
            }
            w.comments_after(&wildcard.comments.after);
        }
        SelectItem::Expr(item) => {
            w.comments_before(&item.comments.before);
            fmt_expr(w, &item.expr);
            if let Some(alias) = &item.alias {
                w.keyword(Keyword::AS);
                w.ident(alias);
            }
            w.comments_after(&item.comments.after);
        }
    }
}

fn fmt_from(w: &mut SqlWriter<'_>, from: &FromClause) {
    for (i, item) in from.items.iter().enumerate() {
        if i > 0 {
            w.comma();
        }
        fmt_from_item(w, item);
    }
}

fn fmt_from_item(w: &mut SqlWriter<'_>, item: &FromItem) {
    fmt_source_expr(w, &item.source);
    for join in &item.joins {
        w.clause_break();
        fmt_join(w, join);
    }
}

fn fmt_source_expr(w: &mut SqlWriter<'_>, source: &SourceExpr) {
    w.comments_before(&source.comments.before);
    match &source.source {
        Source::Table(table) => {
            if table.only {
                w.keyword(Keyword::ONLY);
            }
            fmt_name(w, &table.name);
        }
        Source::Query(query) => {
            if query.lateral {
                w.keyword(Keyword::LATERAL);
            }
            w.word("(");
            w.indented(|w| {
                w.newline();
                fmt_query(w, &query.query);
            });
            w.newline();
            w.glue(")");
        }
        Source::Function(function) => {
            if function.lateral {
                w.keyword(Keyword::LATERAL);
            }
            fmt_function_call(w, &function.call);
            if function.with_ordinality {
                w.keyword(Keyword::WITH);
                w.keyword(Keyword::ORDINALITY);
            }
        }
        Source::Values(values) => {
            w.word("(");
            w.keyword(Keyword::VALUES);
            for (i, row) in values.rows.iter().enumerate() {
                if i > 0 {
                    w.comma();
                }
                w.word("(");
                fmt_expr_list(w, row);
                w.glue(")");
            }
            w.glue(")");
        }
        Source::Paren(inner) => {
            w.word("(");
            fmt_from_item(w, inner);
            w.glue(")");
        }
    }
    if let Some(alias) = &source.alias {
        w.keyword(Keyword::AS);
        w.ident(&alias.name);
        if !alias.columns.is_empty() {
            w.word("(");
            for (i, column) in alias.columns.iter().enumerate() {
                if i > 0 {
                    w.glue(", ");
                }
                w.ident_glued(column);
            }
            w.glue(")");
        }
    }
    w.comments_after(&source.comments.after);
}

fn fmt_join(w: &mut SqlWriter<'_>, join: &Join) {
    w.comments_before(&join.comments.before);
    if join.natural {
        w.keyword(Keyword::NATURAL);
    }
    w.keyword_text(join.kind.as_str());
    fmt_source_expr(w, &join.source);
    match &join.constraint {
        Some(JoinConstraint::On(condition)) => {
            w.keyword(Keyword::ON);
            fmt_expr(w, condition);
        }
        Some(JoinConstraint::Using(columns)) => {
            w.keyword(Keyword::USING);
            w.word("(");
            for (i, column) in columns.iter().enumerate() {
                if i > 0 {
                    w.glue(", ");
                }
                w.ident_glued(column);
            }
            w.glue(")");
        }
        None => {}
    }
    w.comments_after(&join.comments.after);
}

// ============================================================================
// DML
// ============================================================================

fn fmt_insert(w: &mut SqlWriter<'_>, insert: &InsertQuery) {
    if let Some(with) = &insert.with {
        fmt_with(w, with);
        w.clause_break();
    }
    w.keyword(Keyword::INSERT);
    w.keyword(Keyword::INTO);
    fmt_name(w, &insert.table);
    if let Some(alias) = &insert.alias {
        w.keyword(Keyword::AS);
        w.ident(alias);
    }
    if !insert.columns.is_empty() {
        w.word("(");
        for (i, column) in insert.columns.iter().enumerate() {
            if i > 0 {
                w.glue(", ");
            }
            w.ident_glued(column);
        }
        w.glue(")");
    }
    w.clause_break();
    match &insert.source {
        InsertSource::Query(query) => fmt_query(w, query),
        InsertSource::DefaultValues => {
            w.keyword(Keyword::DEFAULT);
            w.keyword(Keyword::VALUES);
        }
    }
    fmt_returning(w, insert.returning.as_deref());
}

fn fmt_update(w: &mut SqlWriter<'_>, update: &UpdateQuery) {
    if let Some(with) = &update.with {
        fmt_with(w, with);
        w.clause_break();
    }
    w.keyword(Keyword::UPDATE);
    fmt_source_expr(w, &update.table);
    w.clause_break();
    w.keyword(Keyword::SET);
    for (i, set) in update.set.iter().enumerate() {
        if i > 0 {
            w.comma();
        }
        fmt_set_clause(w, set);
    }
    if let Some(from) = &update.from {
        w.clause_break();
        w.keyword(Keyword::FROM);
        fmt_from(w, from);
    }
    if let Some(clause) = &update.where_clause {
        w.clause_break();
        w.keyword(Keyword::WHERE);
        fmt_expr(w, &clause.condition);
    }
    fmt_returning(w, update.returning.as_deref());
}

fn fmt_set_clause(w: &mut SqlWriter<'_>, set: &SetClause) {
    fmt_name(w, &set.column);
    w.word("=");
    fmt_expr(w, &set.value);
}

fn fmt_delete(w: &mut SqlWriter<'_>, delete: &DeleteQuery) {
    if let Some(with) = &delete.with {
        fmt_with(w, with);
        w.clause_break();
    }
    w.keyword(Keyword::DELETE);
    w.keyword(Keyword::FROM);
    fmt_source_expr(w, &delete.table);
    if let Some(using) = &delete.using {
        w.clause_break();
        w.keyword(Keyword::USING);
        fmt_from(w, using);
    }
    if let Some(clause) = &delete.where_clause {
        w.clause_break();
        w.keyword(Keyword::WHERE);
        fmt_expr(w, &clause.condition);
    }
    fmt_returning(w, delete.returning.as_deref());
}

fn fmt_merge(w: &mut SqlWriter<'_>, merge: &MergeQuery) {
    if let Some(with) = &merge.with {
        fmt_with(w, with);
        w.clause_break();
    }
    w.keyword(Keyword::MERGE);
    w.keyword(Keyword::INTO);
    fmt_source_expr(w, &merge.target);
    w.clause_break();
    w.keyword(Keyword::USING);
    fmt_source_expr(w, &merge.source);
    w.keyword(Keyword::ON);
    fmt_expr(w, &merge.on);
    for when in &merge.clauses {
        w.clause_break();
        w.keyword(Keyword::WHEN);
        if !when.matched {
            w.keyword(Keyword::NOT);
        }
        w.keyword(Keyword::MATCHED);
        if let Some(condition) = &when.condition {
            w.keyword(Keyword::AND);
            fmt_expr(w, condition);
        }
        w.keyword(Keyword::THEN);
        match &when.action {
            MergeAction::Update { set } => {
                w.keyword(Keyword::UPDATE);
                w.keyword(Keyword::SET);
                for (i, clause) in set.iter().enumerate() {
                    if i > 0 {
                        w.comma();
                    }
                    fmt_set_clause(w, clause);
                }
            }
            MergeAction::Insert { columns, values } => {
                w.keyword(Keyword::INSERT);
                if !columns.is_empty() {
                    w.word("(");
                    for (i, column) in columns.iter().enumerate() {
                        if i > 0 {
                            w.glue(", ");
                        }
                        w.ident_glued(column);
                    }
                    w.glue(")");
                }
                match values {
                    MergeInsertValues::Values(exprs) => {
                        w.keyword(Keyword::VALUES);
                        w.word("(");
                        fmt_expr_list(w, exprs);
                        w.glue(")");
                    }
                    MergeInsertValues::DefaultValues => {
                        w.keyword(Keyword::DEFAULT);
                        w.keyword(Keyword::VALUES);
                    }
                }
            }
            MergeAction::Delete => w.keyword(Keyword::DELETE),
            MergeAction::DoNothing => {
                w.keyword(Keyword::DO);
                w.keyword(Keyword::NOTHING);
            }
        }
    }
}

fn fmt_returning(w: &mut SqlWriter<'_>, returning: Option<&[SelectItem]>) {
    let Some(items) = returning else {
        return;
    };
    w.clause_break();
    w.keyword(Keyword::RETURNING);
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            w.comma();
        }
        fmt_select_item(w, item);
    }
}

// ============================================================================
// DDL
// ============================================================================

fn fmt_create_table(w: &mut SqlWriter<'_>, create: &CreateTable) {
    w.keyword(Keyword::CREATE);
    if create.temporary {
        w.keyword(Keyword::TEMPORARY);
    }
    w.keyword(Keyword::TABLE);
    if create.if_not_exists {
        w.keyword(Keyword::IF);
        w.keyword(Keyword::NOT);
        w.keyword(Keyword::EXISTS);
    }
    fmt_name(w, &create.name);
    w.word("(");
    w.indented(|w| {
        let total = create.columns.len() + create.constraints.len();
        let mut emitted = 0;
        for column in &create.columns {
            w.newline();
            fmt_column_def(w, column);
            emitted += 1;
            if emitted < total {
                w.glue(",");
            }
        }
        for constraint in &create.constraints {
            w.newline();
            fmt_table_constraint(w, constraint);
            emitted += 1;
            if emitted < total {
                w.glue(",");
            }
        }
    });
    w.newline();
    w.glue(")");
}

fn fmt_column_def(w: &mut SqlWriter<'_>, column: &ColumnDef) {
    w.ident(&column.name);
    fmt_type_name(w, &column.ty);
    for constraint in &column.constraints {
        if let Some(name) = &constraint.name {
            w.keyword(Keyword::CONSTRAINT);
            w.ident(name);
        }
        match &constraint.kind {
            ColumnConstraintKind::NotNull => {
                w.keyword(Keyword::NOT);
                w.keyword_text("NULL");
            }
            ColumnConstraintKind::Null => w.keyword_text("NULL"),
            ColumnConstraintKind::Default(expr) => {
                w.keyword(Keyword::DEFAULT);
                fmt_expr(w, expr);
            }
            ColumnConstraintKind::PrimaryKey => {
                w.keyword(Keyword::PRIMARY);
                w.keyword(Keyword::KEY);
            }
            ColumnConstraintKind::Unique => w.keyword(Keyword::UNIQUE),
            ColumnConstraintKind::References(reference) => {
                w.keyword(Keyword::REFERENCES);
                fmt_reference(w, reference);
            }
            ColumnConstraintKind::Check(expr) => {
                w.keyword(Keyword::CHECK);
                w.word("(");
                fmt_expr(w, expr);
                w.glue(")");
            }
            ColumnConstraintKind::Generated { always, options } => {
                w.keyword(Keyword::GENERATED);
                if *always {
                    w.keyword(Keyword::ALWAYS);
                } else {
                    w.keyword(Keyword::BY);
                    w.keyword(Keyword::DEFAULT);
                }
                w.keyword(Keyword::AS);
                w.keyword(Keyword::IDENTITY);
                if !options.is_empty() {
                    w.word("(");
                    for (i, option) in options.iter().enumerate() {
                        if i > 0 {
                            w.glue(" ");
                        }
                        fmt_sequence_option(w, option);
                    }
                    w.glue(")");
                }
            }
        }
    }
}

fn fmt_sequence_option(w: &mut SqlWriter<'_>, option: &SequenceOption) {
    match option {
        SequenceOption::Start(n) => {
            w.keyword(Keyword::START);
            w.word(&n.to_string());
        }
        SequenceOption::Increment(n) => {
            w.keyword(Keyword::INCREMENT);
            w.word(&n.to_string());
        }
        SequenceOption::MinValue(n) => {
            w.keyword(Keyword::MINVALUE);
            w.word(&n.to_string());
        }
        SequenceOption::MaxValue(n) => {
            w.keyword(Keyword::MAXVALUE);
            w.word(&n.to_string());
        }
        SequenceOption::Cache(n) => {
            w.keyword(Keyword::CACHE);
            w.word(&n.to_string());
        }
        SequenceOption::Cycle => w.keyword(Keyword::CYCLE),
        SequenceOption::NoCycle => {
            w.keyword(Keyword::NO);
            w.keyword(Keyword::CYCLE);
        }
    }
}

fn fmt_table_constraint(w: &mut SqlWriter<'_>, constraint: &TableConstraint) {
    if let Some(name) = &constraint.name {
        w.keyword(Keyword::CONSTRAINT);
        w.ident(name);
    }
    match &constraint.kind {
        TableConstraintKind::PrimaryKey(columns) => {
            w.keyword(Keyword::PRIMARY);
            w.keyword(Keyword::KEY);
            fmt_paren_idents(w, columns);
        }
        TableConstraintKind::Unique(columns) => {
            w.keyword(Keyword::UNIQUE);
            fmt_paren_idents(w, columns);
        }
        TableConstraintKind::ForeignKey { columns, reference } => {
            w.keyword(Keyword::FOREIGN);
            w.keyword(Keyword::KEY);
            fmt_paren_idents(w, columns);
            w.keyword(Keyword::REFERENCES);
            fmt_reference(w, reference);
        }
        TableConstraintKind::Check(expr) => {
            w.keyword(Keyword::CHECK);
            w.word("(");
            fmt_expr(w, expr);
            w.glue(")");
        }
    }
}

fn fmt_reference(w: &mut SqlWriter<'_>, reference: &ReferenceDef) {
    fmt_name(w, &reference.table);
    if !reference.columns.is_empty() {
        fmt_paren_idents(w, &reference.columns);
    }
    match reference.match_kind {
        Some(MatchKind::Full) => {
            w.keyword(Keyword::MATCH);
            w.keyword(Keyword::FULL);
        }
        Some(MatchKind::Partial) => {
            w.keyword(Keyword::MATCH);
            w.keyword(Keyword::PARTIAL);
        }
        Some(MatchKind::Simple) => {
            w.keyword(Keyword::MATCH);
            w.keyword(Keyword::SIMPLE);
        }
        None => {}
    }
    if let Some(action) = reference.on_delete {
        w.keyword(Keyword::ON);
        w.keyword(Keyword::DELETE);
        w.keyword_text(action.as_str());
    }
    if let Some(action) = reference.on_update {
        w.keyword(Keyword::ON);
        w.keyword(Keyword::UPDATE);
        w.keyword_text(action.as_str());
    }
    match reference.deferrable {
        Some(true) => w.keyword(Keyword::DEFERRABLE),
        Some(false) => {
            w.keyword(Keyword::NOT);
            w.keyword(Keyword::DEFERRABLE);
        }
        None => {}
    }
    match reference.initially_deferred {
        Some(true) => {
            w.keyword(Keyword::INITIALLY);
            w.keyword(Keyword::DEFERRED);
        }
        Some(false) => {
            w.keyword(Keyword::INITIALLY);
            w.keyword(Keyword::IMMEDIATE);
        }
        None => {}
    }
}

fn fmt_create_index(w: &mut SqlWriter<'_>, create: &CreateIndex) {
    w.keyword(Keyword::CREATE);
    if create.unique {
        w.keyword(Keyword::UNIQUE);
    }
    w.keyword(Keyword::INDEX);
    if create.if_not_exists {
        w.keyword(Keyword::IF);
        w.keyword(Keyword::NOT);
        w.keyword(Keyword::EXISTS);
    }
    if let Some(name) = &create.name {
        w.ident(name);
    }
    w.keyword(Keyword::ON);
    fmt_name(w, &create.table);
    if let Some(method) = &create.method {
        w.keyword(Keyword::USING);
        w.ident(method);
    }
    w.word("(");
    for (i, column) in create.columns.iter().enumerate() {
        if i > 0 {
            w.glue(", ");
        }
        fmt_expr(w, &column.expr);
        match column.direction {
            Some(OrderDirection::Asc) => w.keyword(Keyword::ASC),
            Some(OrderDirection::Desc) => w.keyword(Keyword::DESC),
            None => {}
        }
        match column.nulls {
            Some(NullsOrder::First) => {
                w.keyword(Keyword::NULLS);
                w.keyword(Keyword::FIRST);
            }
            Some(NullsOrder::Last) => {
                w.keyword(Keyword::NULLS);
                w.keyword(Keyword::LAST);
            }
            None => {}
        }
    }
    w.glue(")");
}

fn fmt_alter_table(w: &mut SqlWriter<'_>, alter: &AlterTable) {
    w.keyword(Keyword::ALTER);
    w.keyword(Keyword::TABLE);
    if alter.if_exists {
        w.keyword(Keyword::IF);
        w.keyword(Keyword::EXISTS);
    }
    fmt_name(w, &alter.table);
    for (i, action) in alter.actions.iter().enumerate() {
        if i > 0 {
            w.comma();
        }
        match action {
            AlterAction::AddColumn {
                if_not_exists,
                column,
            } => {
                w.keyword(Keyword::ADD);
                w.keyword(Keyword::COLUMN);
                if *if_not_exists {
                    w.keyword(Keyword::IF);
                    w.keyword(Keyword::NOT);
                    w.keyword(Keyword::EXISTS);
                }
                fmt_column_def(w, column);
            }
            AlterAction::DropColumn {
                name,
                if_exists,
                cascade,
            } => {
                w.keyword(Keyword::DROP);
                w.keyword(Keyword::COLUMN);
                if *if_exists {
                    w.keyword(Keyword::IF);
                    w.keyword(Keyword::EXISTS);
                }
                w.ident(name);
                if *cascade {
                    w.keyword(Keyword::CASCADE);
                }
            }
            AlterAction::AddConstraint(constraint) => {
                w.keyword(Keyword::ADD);
                fmt_table_constraint(w, constraint);
            }
            AlterAction::DropConstraint {
                name,
                if_exists,
                cascade,
            } => {
                w.keyword(Keyword::DROP);
                w.keyword(Keyword::CONSTRAINT);
                if *if_exists {
                    w.keyword(Keyword::IF);
                    w.keyword(Keyword::EXISTS);
                }
                w.ident(name);
                if *cascade {
                    w.keyword(Keyword::CASCADE);
                }
            }
        }
    }
}

fn fmt_drop(
    w: &mut SqlWriter<'_>,
    what: Keyword,
    names: &[QualifiedName],
    if_exists: bool,
    cascade: bool,
) {
    w.keyword(Keyword::DROP);
    w.keyword(what);
    if if_exists {
        w.keyword(Keyword::IF);
        w.keyword(Keyword::EXISTS);
    }
    for (i, name) in names.iter().enumerate() {
        if i > 0 {
            w.glue(",");
        }
        fmt_name(w, name);
    }
    if cascade {
        w.keyword(Keyword::CASCADE);
    }
}

fn fmt_paren_idents(w: &mut SqlWriter<'_>, idents: &[Ident]) {
    w.word("(");
    for (i, ident) in idents.iter().enumerate() {
        if i > 0 {
            w.glue(", ");
        }
        w.ident_glued(ident);
    }
    w.glue(")");
}

// ============================================================================
// Expressions
// ============================================================================

fn op_bp(op: &BinaryOp) -> u8 {
    match op {
        BinaryOp::Or => 10,
        BinaryOp::And => 20,
        BinaryOp::Eq
        | BinaryOp::NotEq
        | BinaryOp::Lt
        | BinaryOp::LtEq
        | BinaryOp::Gt
        | BinaryOp::GtEq
        | BinaryOp::Is
        | BinaryOp::IsNot
        | BinaryOp::IsDistinctFrom
        | BinaryOp::IsNotDistinctFrom
        | BinaryOp::Like
        | BinaryOp::NotLike
        | BinaryOp::ILike
        | BinaryOp::NotILike
        | BinaryOp::SimilarTo
        | BinaryOp::NotSimilarTo => 30,
        BinaryOp::Concat
        | BinaryOp::JsonGet
        | BinaryOp::JsonGetText
        | BinaryOp::JsonGetPath
        | BinaryOp::JsonGetPathText
        | BinaryOp::JsonContains
        | BinaryOp::JsonContainedIn
        | BinaryOp::JsonExists
        | BinaryOp::JsonExistsAny
        | BinaryOp::JsonExistsAll
        | BinaryOp::Other(_) => 40,
        BinaryOp::Add | BinaryOp::Subtract => 50,
        BinaryOp::Multiply | BinaryOp::Divide | BinaryOp::Modulo => 60,
        BinaryOp::Exponent => 80,
    }
}

/// The effective binding power of an expression as an operand.
fn expr_bp(expr: &Expr) -> u8 {
    match expr {
        Expr::Binary(binary) => op_bp(&binary.op),
        Expr::Between(_) | Expr::InList(_) | Expr::InQuery(_) => 30,
        Expr::Unary(unary) => match unary.op {
            UnaryOp::Not => 25,
            UnaryOp::Plus | UnaryOp::Minus => 70,
        },
        Expr::Collate(_) => 95,
        _ => u8::MAX,
    }
}

fn fmt_expr(w: &mut SqlWriter<'_>, expr: &Expr) {
    fmt_expr_min(w, expr, 0);
}

/// Emit `expr`, parenthesizing when its binding power is below what the
/// surrounding context requires, which keeps constructed trees and reparsed
/// trees structurally identical.
fn fmt_expr_min(w: &mut SqlWriter<'_>, expr: &Expr, min_bp: u8) {
    if expr_bp(expr) < min_bp {
        w.word("(");
        fmt_expr_inner(w, expr);
        w.glue(")");
    } else {
        fmt_expr_inner(w, expr);
    }
}

fn fmt_expr_inner(w: &mut SqlWriter<'_>, expr: &Expr) {
    w.comments_before(&expr.comments().before);
    match expr {
        Expr::Column(column) => fmt_name(w, &column.name),
        Expr::Literal(literal) => match &literal.value {
            LiteralValue::Number(text) => w.word(text),
            LiteralValue::String(text) => w.string_literal(text),
            LiteralValue::Bool(true) => w.keyword_text("TRUE"),
            LiteralValue::Bool(false) => w.keyword_text("FALSE"),
            LiteralValue::Null => w.keyword_text("NULL"),
        },
        Expr::Param(param) => w.param(param),
        Expr::Unary(unary) => {
            match unary.op {
                UnaryOp::Not => {
                    w.keyword(Keyword::NOT);
                    fmt_expr_min(w, &unary.operand, 25);
                }
                UnaryOp::Plus | UnaryOp::Minus => {
                    w.word(unary.op.as_str());
                    w.no_space_next();
                    fmt_expr_min(w, &unary.operand, 70);
                }
            }
        }
        Expr::Binary(binary) => {
            let bp = op_bp(&binary.op);
            let right_assoc = binary.op == BinaryOp::Exponent;
            let (left_min, right_min) = if right_assoc { (bp + 1, bp) } else { (bp, bp + 1) };
            fmt_expr_min(w, &binary.left, left_min);
            match binary.op {
                BinaryOp::And => w.and_or("AND"),
                BinaryOp::Or => w.and_or("OR"),
                BinaryOp::Is
                | BinaryOp::IsNot
                | BinaryOp::IsDistinctFrom
                | BinaryOp::IsNotDistinctFrom
                | BinaryOp::Like
                | BinaryOp::NotLike
                | BinaryOp::ILike
                | BinaryOp::NotILike
                | BinaryOp::SimilarTo
                | BinaryOp::NotSimilarTo => w.keyword_text(binary.op.as_str()),
                _ => w.word(binary.op.as_str()),
            }
            fmt_expr_min(w, &binary.right, right_min);
        }
        Expr::Between(between) => {
            fmt_expr_min(w, &between.operand, 31);
            if between.negated {
                w.keyword(Keyword::NOT);
            }
            w.keyword(Keyword::BETWEEN);
            if between.symmetric {
                w.keyword(Keyword::SYMMETRIC);
            }
            fmt_expr_min(w, &between.low, 40);
            w.keyword(Keyword::AND);
            fmt_expr_min(w, &between.high, 40);
        }
        Expr::InList(in_list) => {
            fmt_expr_min(w, &in_list.operand, 31);
            if in_list.negated {
                w.keyword(Keyword::NOT);
            }
            w.keyword(Keyword::IN);
            w.word("(");
            fmt_expr_list(w, &in_list.items);
            w.glue(")");
        }
        Expr::InQuery(in_query) => {
            fmt_expr_min(w, &in_query.operand, 31);
            if in_query.negated {
                w.keyword(Keyword::NOT);
            }
            w.keyword(Keyword::IN);
            w.word("(");
            fmt_query(w, &in_query.query);
            w.glue(")");
        }
        Expr::Exists(exists) => {
            if exists.negated {
                w.keyword(Keyword::NOT);
            }
            w.keyword(Keyword::EXISTS);
            w.word("(");
            fmt_query(w, &exists.query);
            w.glue(")");
        }
        Expr::Function(call) => fmt_function_call(w, call),
        Expr::Cast(cast) => {
            if cast.postfix {
                fmt_expr_min(w, &cast.operand, 90);
                w.glue("::");
                fmt_type_name_glued(w, &cast.ty);
            } else {
                w.keyword(Keyword::CAST);
                w.glue("(");
                fmt_expr(w, &cast.operand);
                w.keyword(Keyword::AS);
                fmt_type_name(w, &cast.ty);
                w.glue(")");
            }
        }
        Expr::Case(case) => {
            w.keyword(Keyword::CASE);
            if let Some(operand) = &case.operand {
                fmt_expr(w, operand);
            }
            for branch in &case.branches {
                w.keyword(Keyword::WHEN);
                fmt_expr(w, &branch.condition);
                w.keyword(Keyword::THEN);
                fmt_expr(w, &branch.result);
            }
            if let Some(else_value) = &case.else_value {
                w.keyword(Keyword::ELSE);
                fmt_expr(w, else_value);
            }
            w.keyword(Keyword::END);
        }
        Expr::Tuple(tuple) => {
            if tuple.row {
                w.keyword(Keyword::ROW);
                w.glue("(");
            } else {
                w.word("(");
            }
            fmt_expr_list(w, &tuple.items);
            w.glue(")");
        }
        Expr::Array(array) => {
            w.keyword(Keyword::ARRAY);
            w.glue("[");
            fmt_expr_list(w, &array.items);
            w.glue("]");
        }
        Expr::ArrayQuery(array) => {
            w.keyword(Keyword::ARRAY);
            w.glue("(");
            fmt_query(w, &array.query);
            w.glue(")");
        }
        Expr::Subscript(subscript) => {
            fmt_expr_min(w, &subscript.operand, u8::MAX);
            w.glue("[");
            match &subscript.index {
                Subscript::Index(index) => fmt_expr(w, index),
                Subscript::Slice { lower, upper } => {
                    if let Some(lower) = lower {
                        fmt_expr(w, lower);
                    }
                    w.glue(":");
                    if let Some(upper) = upper {
                        w.no_space_next();
                        fmt_expr(w, upper);
                    }
                }
            }
            w.glue("]");
        }
        Expr::Subquery(subquery) => {
            w.word("(");
            fmt_query(w, &subquery.query);
            w.glue(")");
        }
        Expr::Paren(paren) => {
            w.word("(");
            fmt_expr(w, &paren.inner);
            w.glue(")");
        }
        Expr::TypedString(typed) => {
            fmt_type_name(w, &typed.ty);
            w.string_literal(&typed.value);
        }
        Expr::Collate(collate) => {
            fmt_expr_min(w, &collate.operand, 95);
            w.keyword(Keyword::COLLATE);
            fmt_name(w, &collate.collation);
        }
    }
    w.comments_after(&expr.comments().after);
}

fn fmt_expr_list(w: &mut SqlWriter<'_>, exprs: &[Expr]) {
    for (i, expr) in exprs.iter().enumerate() {
        if i > 0 {
            w.glue(", ");
        }
        fmt_expr(w, expr);
    }
}

fn fmt_function_call(w: &mut SqlWriter<'_>, call: &FunctionCall) {
    fmt_name(w, &call.name);
    w.glue("(");
    if call.star {
        w.glue("*");
    } else {
        if call.distinct {
            w.keyword(Keyword::DISTINCT);
        }
        fmt_expr_list(w, &call.args);
        if !call.order_by.is_empty() {
            w.keyword(Keyword::ORDER);
            w.keyword(Keyword::BY);
            for (i, item) in call.order_by.iter().enumerate() {
                if i > 0 {
                    w.glue(", ");
                }
                fmt_order_expr(w, item);
            }
        }
    }
    w.glue(")");
    if let Some(filter) = &call.filter {
        w.keyword(Keyword::FILTER);
        w.word("(");
        w.keyword(Keyword::WHERE);
        fmt_expr(w, filter);
        w.glue(")");
    }
    match &call.over {
        Some(Over::Named(name)) => {
            w.keyword(Keyword::OVER);
            w.ident(name);
        }
        Some(Over::Spec(spec)) => {
            w.keyword(Keyword::OVER);
            fmt_window_spec(w, spec);
        }
        None => {}
    }
}

fn fmt_window_spec(w: &mut SqlWriter<'_>, spec: &WindowSpec) {
    w.word("(");
    if let Some(base) = &spec.base {
        w.ident_glued(base);
    }
    if !spec.partition_by.is_empty() {
        w.keyword(Keyword::PARTITION);
        w.keyword(Keyword::BY);
        fmt_expr_list(w, &spec.partition_by);
    }
    if !spec.order_by.is_empty() {
        w.keyword(Keyword::ORDER);
        w.keyword(Keyword::BY);
        for (i, item) in spec.order_by.iter().enumerate() {
            if i > 0 {
                w.glue(", ");
            }
            fmt_order_expr(w, item);
        }
    }
    if let Some(frame) = &spec.frame {
        w.keyword_text(match frame.units {
            FrameUnits::Rows => "ROWS",
            FrameUnits::Range => "RANGE",
            FrameUnits::Groups => "GROUPS",
        });
        if let Some(end) = &frame.end {
            w.keyword(Keyword::BETWEEN);
            fmt_frame_bound(w, &frame.start);
            w.keyword(Keyword::AND);
            fmt_frame_bound(w, end);
        } else {
            fmt_frame_bound(w, &frame.start);
        }
        match frame.exclusion {
            Some(FrameExclusion::CurrentRow) => {
                w.keyword(Keyword::EXCLUDE);
                w.keyword(Keyword::CURRENT);
                w.keyword(Keyword::ROW);
            }
            Some(FrameExclusion::Group) => {
                w.keyword(Keyword::EXCLUDE);
                w.keyword(Keyword::GROUP);
            }
            Some(FrameExclusion::Ties) => {
                w.keyword(Keyword::EXCLUDE);
                w.keyword(Keyword::TIES);
            }
            Some(FrameExclusion::NoOthers) => {
                w.keyword(Keyword::EXCLUDE);
                w.keyword(Keyword::NO);
                w.keyword(Keyword::OTHERS);
            }
            None => {}
        }
    }
    w.glue(")");
}

fn fmt_frame_bound(w: &mut SqlWriter<'_>, bound: &FrameBound) {
    match bound {
        FrameBound::CurrentRow => {
            w.keyword(Keyword::CURRENT);
            w.keyword(Keyword::ROW);
        }
        FrameBound::UnboundedPreceding => {
            w.keyword(Keyword::UNBOUNDED);
            w.keyword(Keyword::PRECEDING);
        }
        FrameBound::UnboundedFollowing => {
            w.keyword(Keyword::UNBOUNDED);
            w.keyword(Keyword::FOLLOWING);
        }
        FrameBound::Preceding(expr) => {
            fmt_expr(w, expr);
            w.keyword(Keyword::PRECEDING);
        }
        FrameBound::Following(expr) => {
            fmt_expr(w, expr);
            w.keyword(Keyword::FOLLOWING);
        }
    }
}

// ============================================================================
// Names and types
// ============================================================================

fn fmt_name(w: &mut SqlWriter<'_>, name: &QualifiedName) {
    for (i, part) in name.parts.iter().enumerate() {
        if i > 0 {
            w.glue(".");
            w.ident_glued(part);
        } else {
            w.ident(part);
        }
    }
}

fn fmt_type_name(w: &mut SqlWriter<'_>, ty: &TypeName) {
    fmt_name(w, &ty.name);
    fmt_type_suffix(w, ty);
}

fn fmt_type_name_glued(w: &mut SqlWriter<'_>, ty: &TypeName) {
    for (i, part) in ty.name.parts.iter().enumerate() {
        if i > 0 {
            w.glue(".");
        }
        w.ident_glued(part);
    }
    fmt_type_suffix(w, ty);
}

fn fmt_type_suffix(w: &mut SqlWriter<'_>, ty: &TypeName) {
    if !ty.modifiers.is_empty() {
        w.glue("(");
        fmt_expr_list(w, &ty.modifiers);
        w.glue(")");
    }
    if ty.array {
        w.glue("[]");
    }
}

#[cfg(test)]
mod tests;
