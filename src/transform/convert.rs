//! Statement-shape converters: SELECT into INSERT / UPDATE / DELETE / MERGE,
//! and VALUES into UNION ALL and back.

use serde::Deserialize;

use crate::ast::{
    BinaryQuery, CommentSet, DeleteQuery, Expr, Ident, InsertQuery, InsertSource, MergeAction,
    MergeInsertValues, MergeQuery, MergeWhen, Query, QualifiedName, SelectClause, SelectItem,
    SelectQuery, SetClause, SetOp, SetOpKind, SourceExpr, UpdateQuery, ValuesQuery, WhereClause,
};
use crate::error::{ConversionError, Result};

/// Options naming the conversion target.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ConversionOptions {
    /// Target table, optionally schema-qualified.
    pub table: String,
    /// Columns identifying a row, for UPDATE / DELETE / MERGE matching.
    #[serde(default)]
    pub key_columns: Vec<String>,
    /// Explicit column list; when present the select list is reordered to
    /// match it positionally.
    pub columns: Option<Vec<String>>,
}

impl ConversionOptions {
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            key_columns: Vec::new(),
            columns: None,
        }
    }

    pub fn with_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.key_columns = keys.into_iter().map(Into::into).collect();
        self
    }

    fn table_name(&self) -> QualifiedName {
        QualifiedName::from_parts(self.table.split('.'))
    }
}

/// Normalize to a simple SELECT: binary queries become a SELECT over a
/// parenthesized source.
fn normalize_select(query: &Query) -> Result<SelectQuery> {
    match query {
        Query::Select(select) => Ok(select.clone()),
        Query::Binary(_) => {
            let source = SourceExpr::subquery(query.clone(), "q");
            Ok(SelectQuery {
                select: SelectClause {
                    distinct: None,
                    items: vec![SelectItem::wildcard()],
                    comments: CommentSet::new(),
                },
                from: Some(crate::ast::FromClause::single(source)),
                ..SelectQuery::default()
            })
        }
        Query::Values(_) => Err(ConversionError::UnsupportedShape(
            "a bare VALUES list cannot be normalized into a select".into(),
        )
        .into()),
    }
}

/// The named output columns of a select, failing on unnamed items.
fn output_names(select: &SelectQuery) -> Result<Vec<String>> {
    select
        .select
        .items
        .iter()
        .map(|item| {
            item.output_name().map(str::to_string).ok_or_else(|| {
                ConversionError::UnsupportedShape(
                    "every select item needs a name or alias for conversion".into(),
                )
                .into()
            })
        })
        .collect()
}

/// Reorder the select list so its output names match `columns` positionally.
fn reorder_items(select: &SelectQuery, columns: &[String]) -> Result<Vec<SelectItem>> {
    columns
        .iter()
        .map(|column| {
            select
                .select
                .items
                .iter()
                .find(|item| item.output_name() == Some(column.as_str()))
                .cloned()
                .ok_or_else(|| {
                    ConversionError::UnknownColumn {
                        column: column.clone(),
                    }
                    .into()
                })
        })
        .collect()
}

/// Convert a row-yielding query into `INSERT INTO table (…) <query>`.
pub fn to_insert(query: &Query, options: &ConversionOptions) -> Result<InsertQuery> {
    // A VALUES list inserts as-is; its column list must be explicit.
    if let Query::Values(_) = query {
        let columns = options.columns.clone().unwrap_or_default();
        return Ok(InsertQuery {
            with: None,
            table: options.table_name(),
            alias: None,
            columns: columns.iter().map(Ident::new).collect(),
            source: InsertSource::Query(Box::new(query.clone())),
            returning: None,
            comments: CommentSet::new(),
        });
    }

    let mut select = normalize_select(query)?;
    let columns = match &options.columns {
        Some(columns) => {
            // A pure wildcard shape (normalized binary select) cannot be
            // reordered; the explicit list is trusted as-is.
            let wildcard_only = select.select.items.len() == 1
                && matches!(select.select.items[0], SelectItem::Wildcard(_));
            if !wildcard_only {
                select.select.items = reorder_items(&select, columns)?;
            }
            columns.clone()
        }
        None => output_names(&select)?,
    };
    // The WITH clause travels to the statement level.
    let with = select.with.take();

    Ok(InsertQuery {
        with,
        table: options.table_name(),
        alias: None,
        columns: columns.iter().map(Ident::new).collect(),
        source: InsertSource::Query(Box::new(Query::Select(select))),
        returning: None,
        comments: CommentSet::new(),
    })
}

fn validate_keys(names: &[String], options: &ConversionOptions) -> Result<()> {
    if options.key_columns.is_empty() {
        return Err(ConversionError::NoKeyColumns.into());
    }
    for key in &options.key_columns {
        if !names.contains(key) {
            return Err(ConversionError::MissingKeyColumn {
                column: key.clone(),
            }
            .into());
        }
    }
    Ok(())
}

fn key_match_condition(target: &str, keys: &[String]) -> Expr {
    let mut parts = keys.iter().map(|key| {
        Expr::eq(
            Expr::column(QualifiedName::from_parts([target, key])),
            Expr::column(QualifiedName::from_parts(["src", key])),
        )
    });
    let first = parts.next().expect("validated nonempty keys");
    parts.fold(first, Expr::and)
}

/// Which columns the conversion writes: the explicit list, or every named
/// output except the keys.
fn value_columns(names: &[String], options: &ConversionOptions) -> Result<Vec<String>> {
    match &options.columns {
        Some(columns) => {
            for column in columns {
                if !names.contains(column) {
                    return Err(ConversionError::UnknownColumn {
                        column: column.clone(),
                    }
                    .into());
                }
            }
            Ok(columns.clone())
        }
        None => Ok(names
            .iter()
            .filter(|n| !options.key_columns.contains(n))
            .cloned()
            .collect()),
    }
}

/// Convert a SELECT into an UPDATE driven by it:
/// `UPDATE table SET c = src.c FROM (query) AS src WHERE table.k = src.k`.
pub fn to_update(query: &Query, options: &ConversionOptions) -> Result<UpdateQuery> {
    let select = normalize_select(query)?;
    let names = output_names(&select)?;
    validate_keys(&names, options)?;
    let columns = value_columns(&names, options)?;
    if columns.is_empty() {
        return Err(ConversionError::UnsupportedShape(
            "no non-key columns left to update".into(),
        )
        .into());
    }

    let table = options.table_name();
    let target = table.name().text.to_string();
    let set = columns
        .iter()
        .map(|column| {
            SetClause::new(
                QualifiedName::bare(column.as_str()),
                Expr::column(QualifiedName::from_parts(["src", column])),
            )
        })
        .collect();

    Ok(UpdateQuery {
        with: None,
        table: SourceExpr::table(table),
        set,
        from: Some(crate::ast::FromClause::single(SourceExpr::subquery(
            Query::Select(select),
            "src",
        ))),
        where_clause: Some(WhereClause {
            condition: key_match_condition(&target, &options.key_columns),
            comments: CommentSet::new(),
        }),
        returning: None,
        comments: CommentSet::new(),
    })
}

/// Convert a SELECT into a DELETE of the matching rows:
/// `DELETE FROM table USING (query) AS src WHERE table.k = src.k`.
pub fn to_delete(query: &Query, options: &ConversionOptions) -> Result<DeleteQuery> {
    let select = normalize_select(query)?;
    let names = output_names(&select)?;
    validate_keys(&names, options)?;

    let table = options.table_name();
    let target = table.name().text.to_string();

    Ok(DeleteQuery {
        with: None,
        table: SourceExpr::table(table),
        using: Some(crate::ast::FromClause::single(SourceExpr::subquery(
            Query::Select(select),
            "src",
        ))),
        where_clause: Some(WhereClause {
            condition: key_match_condition(&target, &options.key_columns),
            comments: CommentSet::new(),
        }),
        returning: None,
        comments: CommentSet::new(),
    })
}

/// Convert a SELECT into an upserting MERGE.
pub fn to_merge(query: &Query, options: &ConversionOptions) -> Result<MergeQuery> {
    let select = normalize_select(query)?;
    let names = output_names(&select)?;
    validate_keys(&names, options)?;
    let update_columns = value_columns(&names, options)?;

    let table = options.table_name();
    let target_alias = "t";

    let mut clauses = Vec::new();
    if !update_columns.is_empty() {
        clauses.push(MergeWhen {
            matched: true,
            condition: None,
            action: MergeAction::Update {
                set: update_columns
                    .iter()
                    .map(|column| {
                        SetClause::new(
                            QualifiedName::bare(column.as_str()),
                            Expr::column(QualifiedName::from_parts(["src", column])),
                        )
                    })
                    .collect(),
            },
            comments: CommentSet::new(),
        });
    }
    clauses.push(MergeWhen {
        matched: false,
        condition: None,
        action: MergeAction::Insert {
            columns: names.iter().map(Ident::new).collect(),
            values: MergeInsertValues::Values(
                names
                    .iter()
                    .map(|column| Expr::column(QualifiedName::from_parts(["src", column])))
                    .collect(),
            ),
        },
        comments: CommentSet::new(),
    });

    Ok(MergeQuery {
        with: None,
        target: SourceExpr::table(table).with_alias(target_alias),
        source: SourceExpr::subquery(Query::Select(select), "src"),
        on: key_match_condition(target_alias, &options.key_columns),
        clauses,
        comments: CommentSet::new(),
    })
}

// ============================================================================
// VALUES <-> UNION ALL
// ============================================================================

/// Rewrite a VALUES list as a chain of single-row SELECTs joined with
/// UNION ALL; the first arm carries the column aliases.
pub fn values_to_union(values: &ValuesQuery, columns: Option<&[String]>) -> Result<Query> {
    if values.rows.is_empty() {
        return Err(ConversionError::UnsupportedShape("empty VALUES list".into()).into());
    }
    let width = values.rows[0].len();

    let arm = |row: &[Expr], aliased: bool| {
        let items = row
            .iter()
            .enumerate()
            .map(|(i, expr)| {
                if aliased {
                    let name = columns
                        .and_then(|c| c.get(i).cloned())
                        .unwrap_or_else(|| format!("column{}", i + 1));
                    SelectItem::aliased(expr.clone(), Ident::new(name))
                } else {
                    SelectItem::expr(expr.clone())
                }
            })
            .collect();
        Query::Select(SelectQuery {
            select: SelectClause {
                distinct: None,
                items,
                comments: CommentSet::new(),
            },
            ..SelectQuery::default()
        })
    };

    let mut result = arm(&values.rows[0], true);
    for row in &values.rows[1..] {
        if row.len() != width {
            return Err(
                ConversionError::UnsupportedShape("rows of differing arity".into()).into(),
            );
        }
        result = Query::Binary(BinaryQuery {
            with: None,
            left: Box::new(result),
            op: SetOp {
                kind: SetOpKind::Union,
                all: true,
            },
            right: Box::new(arm(row, false)),
            order_by: None,
            limit: None,
            offset: None,
            fetch: None,
            span: None,
            comments: CommentSet::new(),
        });
    }
    Ok(result)
}

/// The inverse: a UNION ALL chain of literal-only single selects becomes a
/// VALUES list. Anything else is a conversion error.
pub fn union_to_values(query: &Query) -> Result<ValuesQuery> {
    let mut arms = Vec::new();
    flatten_union_all(query, &mut arms)?;

    let mut rows: Vec<Vec<Expr>> = Vec::new();
    let mut width = None;
    for arm in arms {
        let row = literal_row(arm)?;
        if *width.get_or_insert(row.len()) != row.len() {
            return Err(
                ConversionError::UnsupportedShape("arms of differing arity".into()).into(),
            );
        }
        rows.push(row);
    }

    Ok(ValuesQuery {
        with: None,
        rows,
        span: None,
        comments: CommentSet::new(),
    })
}

fn flatten_union_all<'q>(query: &'q Query, out: &mut Vec<&'q SelectQuery>) -> Result<()> {
    match query {
        Query::Binary(binary) => {
            if binary.op.kind != SetOpKind::Union || !binary.op.all {
                return Err(ConversionError::UnsupportedShape(
                    "only UNION ALL chains convert to VALUES".into(),
                )
                .into());
            }
            flatten_union_all(&binary.left, out)?;
            flatten_union_all(&binary.right, out)
        }
        Query::Select(select) => {
            out.push(select);
            Ok(())
        }
        Query::Values(_) => Err(ConversionError::UnsupportedShape(
            "nested VALUES inside a union chain".into(),
        )
        .into()),
    }
}

fn literal_row(select: &SelectQuery) -> Result<Vec<Expr>> {
    let simple = select.from.is_none()
        && select.where_clause.is_none()
        && select.with.is_none()
        && select.group_by.is_none()
        && select.having.is_none();
    if !simple {
        return Err(ConversionError::UnsupportedShape(
            "union arms must be literal-only selects".into(),
        )
        .into());
    }
    select
        .select
        .items
        .iter()
        .map(|item| match item {
            SelectItem::Expr(item) if is_literal_expr(&item.expr) => Ok(item.expr.clone()),
            _ => Err(ConversionError::UnsupportedShape(
                "union arms must be literal-only selects".into(),
            )
            .into()),
        })
        .collect()
}

fn is_literal_expr(expr: &Expr) -> bool {
    match expr {
        Expr::Literal(_) | Expr::Param(_) | Expr::TypedString(_) => true,
        Expr::Unary(unary) => is_literal_expr(&unary.operand),
        Expr::Cast(cast) => is_literal_expr(&cast.operand),
        Expr::Paren(paren) => is_literal_expr(&paren.inner),
        _ => false,
    }
}

#[cfg(test)]
mod tests;
