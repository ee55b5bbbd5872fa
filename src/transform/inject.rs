//! The dynamic query injectors: filter, sort, pagination.
//!
//! Options are JSON-shaped; deserialization rejects unknown keys so a typo
//! in an option object is a structured error, never silently ignored. The
//! pipeline order (filter, sort, paginate, serialize) is fixed by the facade.

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::analyze::{
    ColumnCollectOptions, TableColumnResolver, collect_columns, collect_parameters,
    set_parameter,
};
use crate::ast::{
    BinaryOp, Expr, NullsOrder, OrderByClause, OrderDirection, OrderExpr, Query, Source,
    Statement,
};
use crate::ast::{LimitClause, OffsetClause};
use crate::error::{InjectionError, ResolveError, Result, SqlError};

use super::serialize::SerializeMapping;

// ============================================================================
// Option objects
// ============================================================================

/// The full option object of the injector pipeline.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct QueryOptions {
    pub filter: Option<FilterSpec>,
    pub sort: Option<SortSpec>,
    pub paging: Option<Paging>,
    pub serialize: Option<SerializeMapping>,
}

impl QueryOptions {
    /// Deserialize from a JSON value; unknown keys are errors.
    pub fn from_value(value: Value) -> Result<Self, InjectionError> {
        serde_json::from_value(value).map_err(|e| InjectionError::UnknownOption {
            key: e.to_string(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.filter.is_none()
            && self.sort.is_none()
            && self.paging.is_none()
            && self.serialize.is_none()
    }
}

/// Filter keys in application order.
pub type FilterSpec = IndexMap<String, FilterValue>;

/// A filter entry: a bare scalar (equality; null means IS NULL) or a
/// condition object.
#[derive(Debug, Clone)]
pub enum FilterValue {
    Condition(FilterCondition),
    Value(Value),
}

// JSON objects must be valid condition objects; an unknown operator key is
// an error rather than a silent fall-through to the scalar case.
impl<'de> Deserialize<'de> for FilterValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        if value.is_object() {
            let condition =
                serde_json::from_value(value).map_err(serde::de::Error::custom)?;
            Ok(FilterValue::Condition(condition))
        } else {
            Ok(FilterValue::Value(value))
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct FilterCondition {
    pub eq: Option<Value>,
    pub neq: Option<Value>,
    pub lt: Option<Value>,
    pub lte: Option<Value>,
    pub gt: Option<Value>,
    pub gte: Option<Value>,
    pub like: Option<Value>,
    pub ilike: Option<Value>,
    #[serde(rename = "in")]
    pub in_: Option<Vec<Value>>,
    pub not_in: Option<Vec<Value>>,
    pub is_null: Option<bool>,
    pub is_not_null: Option<bool>,
    pub between: Option<(Value, Value)>,
    pub and: Option<Vec<FilterCondition>>,
    pub or: Option<Vec<FilterCondition>>,
}

/// Sort keys in application order.
pub type SortSpec = IndexMap<String, SortDirective>;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct SortDirective {
    pub asc: Option<bool>,
    pub desc: Option<bool>,
    pub nulls_first: Option<bool>,
    pub nulls_last: Option<bool>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct Paging {
    pub page: u64,
    pub page_size: u64,
}

// ============================================================================
// Filter injection
// ============================================================================

/// Inject filter conditions, joining existing WHERE clauses with AND.
///
/// A key naming a parameter binds that parameter instead. A key naming a
/// column that the outer query does not expose is pushed upstream: the
/// condition attaches to the highest-level CTE or sub-query that still
/// exposes the column, shrinking inner result sets.
pub fn inject_filter(
    stmt: &mut Statement,
    spec: &FilterSpec,
    resolver: Option<&dyn TableColumnResolver>,
) -> Result<()> {
    let params = collect_parameters(stmt);

    for (key, value) in spec {
        // Parameter keys bind the parameter.
        if params.iter().any(|p| p == key) {
            let scalar = match value {
                FilterValue::Value(v) => v.clone(),
                FilterValue::Condition(c) => c.eq.clone().ok_or_else(|| {
                    SqlError::from(InjectionError::EmptyCondition {
                        column: key.clone(),
                    })
                })?,
            };
            set_parameter(stmt, key, scalar);
            debug!(%key, "filter bound parameter");
            continue;
        }

        let query = stmt.expect_query_mut()?;
        if !apply_to_query(query, key, value, resolver)? {
            return Err(ResolveError::ColumnNotFound {
                column: key.clone(),
            }
            .into());
        }
        debug!(%key, "filter injected");
    }
    Ok(())
}

/// Try to attach the condition for `key` to `query`, walking upstream when
/// the query itself does not expose the column. Returns whether a target was
/// found.
fn apply_to_query(
    query: &mut Query,
    key: &str,
    value: &FilterValue,
    resolver: Option<&dyn TableColumnResolver>,
) -> Result<bool> {
    if let Some(target) = exposed_column_expr(query, key, resolver)? {
        match query {
            Query::Select(select) => {
                let condition = condition_expr(&target, &param_base(key), value)?;
                select.and_where(condition);
                return Ok(true);
            }
            Query::Binary(binary) => {
                // Filtering each arm filters the combined result.
                let applied_left = apply_to_query(&mut binary.left, key, value, resolver)?;
                let applied_right = apply_to_query(&mut binary.right, key, value, resolver)?;
                return Ok(applied_left || applied_right);
            }
            Query::Values(_) => return Ok(false),
        }
    }

    // Upstream push-down: the first (shallowest) source that exposes the
    // column gets the condition.
    match query {
        Query::Select(select) => {
            if let Some(with) = &mut select.with {
                for table in &mut with.tables {
                    if apply_to_query(&mut table.query, key, value, resolver)? {
                        return Ok(true);
                    }
                }
            }
            if let Some(from) = &mut select.from {
                for item in &mut from.items {
                    if let Source::Query(source) = &mut item.source.source
                        && apply_to_query(&mut source.query, key, value, resolver)?
                    {
                        return Ok(true);
                    }
                    for join in &mut item.joins {
                        if let Source::Query(source) = &mut join.source.source
                            && apply_to_query(&mut source.query, key, value, resolver)?
                        {
                            return Ok(true);
                        }
                    }
                }
            }
            Ok(false)
        }
        Query::Binary(binary) => {
            let left = apply_to_query(&mut binary.left, key, value, resolver)?;
            let right = apply_to_query(&mut binary.right, key, value, resolver)?;
            Ok(left || right)
        }
        Query::Values(_) => Ok(false),
    }
}

/// The expression to filter on when `query` accepts `key`.
///
/// A key is accepted when it names an output column of the query, or a
/// column of a *physical* table in its FROM clause, verified through the
/// resolver when one is supplied, accepted optimistically otherwise (the
/// database resolves it at execution time). CTE and sub-query sources do not
/// accept keys here; upstream push-down recurses into them instead, so the
/// condition lands on the highest query that truly exposes the column.
fn exposed_column_expr(
    query: &Query,
    key: &str,
    resolver: Option<&dyn TableColumnResolver>,
) -> Result<Option<Expr>> {
    // Output columns first: aliases win over raw table columns.
    let columns = collect_columns(query, resolver, &ColumnCollectOptions::default())?;
    for column in &columns {
        let matches = column.name.as_deref() == Some(key)
            || column.origin.as_ref().is_some_and(|o| o.key() == key);
        if matches {
            let expr = match (&column.expr, &column.name) {
                (Some(expr), _) => expr.clone(),
                (None, Some(name)) => Expr::bare_column(name.as_str()),
                (None, None) => continue,
            };
            return Ok(Some(expr));
        }
    }

    let Query::Select(select) = query else {
        return Ok(None);
    };
    let Some(from) = &select.from else {
        return Ok(None);
    };
    let cte_names: Vec<&str> = select
        .with
        .as_ref()
        .map(|w| w.names().collect())
        .unwrap_or_default();

    // `alias.column` keys resolve through the named source.
    let (qualifier, bare) = match key.rsplit_once('.') {
        Some((qualifier, bare)) => (Some(qualifier), bare),
        None => (None, key),
    };

    for source in from_sources(from) {
        if let Some(qualifier) = qualifier
            && source.scope_name() != Some(qualifier)
        {
            continue;
        }
        let Source::Table(table) = &source.source else {
            continue;
        };
        if table.name.is_bare() && cte_names.contains(&table.name.name().as_str()) {
            continue;
        }
        let known = match resolver {
            Some(resolver) => resolver
                .columns(&table.name)
                .map(|columns| columns.iter().any(|c| c == bare)),
            None => None,
        };
        // Unknown tables accept optimistically.
        if known != Some(false) {
            let expr = match qualifier {
                Some(qualifier) => {
                    Expr::column(crate::ast::QualifiedName::from_parts([qualifier, bare]))
                }
                None => Expr::bare_column(bare),
            };
            return Ok(Some(expr));
        }
    }
    Ok(None)
}

fn from_sources(from: &crate::ast::FromClause) -> Vec<&crate::ast::SourceExpr> {
    fn push<'a>(source: &'a crate::ast::SourceExpr, out: &mut Vec<&'a crate::ast::SourceExpr>) {
        if let Source::Paren(inner) = &source.source {
            push(&inner.source, out);
            for join in &inner.joins {
                push(&join.source, out);
            }
        } else {
            out.push(source);
        }
    }
    let mut sources = Vec::new();
    for item in &from.items {
        push(&item.source, &mut sources);
        for join in &item.joins {
            push(&join.source, &mut sources);
        }
    }
    sources
}

fn param_base(key: &str) -> String {
    key.replace('.', "_")
}

fn scalar_condition(target: &Expr, base: &str, value: &Value) -> Expr {
    if value.is_null() {
        Expr::binary(target.clone(), BinaryOp::Is, Expr::null())
    } else {
        Expr::eq(target.clone(), Expr::bound_param(base, value.clone()))
    }
}

/// Build the condition expression for one filter entry.
fn condition_expr(target: &Expr, base: &str, value: &FilterValue) -> Result<Expr> {
    match value {
        FilterValue::Value(v) => Ok(scalar_condition(target, base, v)),
        FilterValue::Condition(c) => {
            let expr = build_condition(target, base, c)?;
            expr.ok_or_else(|| {
                InjectionError::EmptyCondition {
                    column: base.to_string(),
                }
                .into()
            })
        }
    }
}

fn build_condition(
    target: &Expr,
    base: &str,
    condition: &FilterCondition,
) -> Result<Option<Expr>> {
    let mut parts: Vec<Expr> = Vec::new();
    let comparison = |op: BinaryOp, suffix: &str, value: &Value| {
        Expr::binary(
            target.clone(),
            op,
            Expr::bound_param(format!("{base}{suffix}"), value.clone()),
        )
    };

    if let Some(v) = &condition.eq {
        parts.push(scalar_condition(target, base, v));
    }
    if let Some(v) = &condition.neq {
        parts.push(comparison(BinaryOp::NotEq, "_neq", v));
    }
    if let Some(v) = &condition.lt {
        parts.push(comparison(BinaryOp::Lt, "_lt", v));
    }
    if let Some(v) = &condition.lte {
        parts.push(comparison(BinaryOp::LtEq, "_lte", v));
    }
    if let Some(v) = &condition.gt {
        parts.push(comparison(BinaryOp::Gt, "_gt", v));
    }
    if let Some(v) = &condition.gte {
        parts.push(comparison(BinaryOp::GtEq, "_gte", v));
    }
    if let Some(v) = &condition.like {
        parts.push(comparison(BinaryOp::Like, "_like", v));
    }
    if let Some(v) = &condition.ilike {
        parts.push(comparison(BinaryOp::ILike, "_ilike", v));
    }
    if let Some(values) = &condition.in_ {
        parts.push(list_condition(target, base, values, false));
    }
    if let Some(values) = &condition.not_in {
        parts.push(list_condition(target, base, values, true));
    }
    if condition.is_null == Some(true) {
        parts.push(Expr::binary(target.clone(), BinaryOp::Is, Expr::null()));
    }
    if condition.is_not_null == Some(true) {
        parts.push(Expr::binary(target.clone(), BinaryOp::IsNot, Expr::null()));
    }
    if let Some((low, high)) = &condition.between {
        parts.push(Expr::Between(crate::ast::BetweenExpr {
            operand: Box::new(target.clone()),
            negated: false,
            symmetric: false,
            low: Box::new(Expr::bound_param(format!("{base}_min"), low.clone())),
            high: Box::new(Expr::bound_param(format!("{base}_max"), high.clone())),
            comments: Default::default(),
        }));
    }
    if let Some(branches) = &condition.and {
        for (i, branch) in branches.iter().enumerate() {
            if let Some(expr) = build_condition(target, &format!("{base}_and{i}"), branch)? {
                parts.push(expr);
            }
        }
    }
    if let Some(branches) = &condition.or {
        let mut alternatives = Vec::new();
        for (i, branch) in branches.iter().enumerate() {
            if let Some(expr) = build_condition(target, &format!("{base}_or{i}"), branch)? {
                alternatives.push(expr);
            }
        }
        if let Some(first) = alternatives.first().cloned() {
            let joined = alternatives
                .into_iter()
                .skip(1)
                .fold(first, Expr::or);
            parts.push(Expr::paren(joined));
        }
    }

    let Some(first) = parts.first().cloned() else {
        return Ok(None);
    };
    Ok(Some(parts.into_iter().skip(1).fold(first, Expr::and)))
}

fn list_condition(target: &Expr, base: &str, values: &[Value], negated: bool) -> Expr {
    let suffix = if negated { "_not_in_" } else { "_" };
    let items = values
        .iter()
        .enumerate()
        .map(|(i, v)| Expr::bound_param(format!("{base}{suffix}{i}"), v.clone()))
        .collect();
    Expr::InList(crate::ast::InListExpr {
        operand: Box::new(target.clone()),
        negated,
        items,
        comments: Default::default(),
    })
}

// ============================================================================
// Sort injection
// ============================================================================

/// Append sort keys to the query's ORDER BY, preserving any existing
/// ordering prefix.
pub fn inject_sort(
    stmt: &mut Statement,
    spec: &SortSpec,
    resolver: Option<&dyn TableColumnResolver>,
) -> Result<()> {
    let query = stmt.expect_query_mut()?;
    for (key, directive) in spec {
        let Some(target) = exposed_column_expr(query, key, resolver)? else {
            return Err(ResolveError::ColumnNotFound {
                column: key.clone(),
            }
            .into());
        };
        let direction = if directive.desc == Some(true) {
            Some(OrderDirection::Desc)
        } else if directive.asc == Some(true) {
            Some(OrderDirection::Asc)
        } else {
            None
        };
        let nulls = if directive.nulls_first == Some(true) {
            Some(NullsOrder::First)
        } else if directive.nulls_last == Some(true) {
            Some(NullsOrder::Last)
        } else {
            None
        };
        let item = OrderExpr {
            expr: target,
            direction,
            nulls,
            comments: Default::default(),
        };
        order_by_mut(query)?.items.push(item);
        debug!(%key, "sort injected");
    }
    Ok(())
}

fn order_by_mut(query: &mut Query) -> Result<&mut OrderByClause> {
    let slot = match query {
        Query::Select(select) => &mut select.order_by,
        Query::Binary(binary) => &mut binary.order_by,
        Query::Values(_) => {
            return Err(crate::error::SchemaError::UnsupportedRoot("values query").into());
        }
    };
    Ok(slot.get_or_insert_with(OrderByClause::default))
}

// ============================================================================
// Pagination injection
// ============================================================================

/// Inject `LIMIT :paging_limit OFFSET :paging_offset`.
///
/// Both clauses are always emitted (offset included even for page 1) so
/// generated SQL keeps a stable shape for prepared-statement caching.
pub fn inject_pagination(stmt: &mut Statement, paging: &Paging) -> Result<()> {
    if paging.page < 1 || paging.page_size < 1 || paging.page_size > 1000 {
        return Err(InjectionError::PageOutOfRange {
            page: paging.page,
            page_size: paging.page_size,
        }
        .into());
    }

    let query = stmt.expect_query_mut()?;
    let (limit_slot, offset_slot) = match query {
        Query::Select(select) => (&mut select.limit, &mut select.offset),
        Query::Binary(binary) => (&mut binary.limit, &mut binary.offset),
        Query::Values(_) => {
            return Err(crate::error::SchemaError::UnsupportedRoot("values query").into());
        }
    };
    if limit_slot.is_some() {
        return Err(InjectionError::ExistingLimit.into());
    }
    if offset_slot.is_some() {
        return Err(InjectionError::ExistingOffset.into());
    }

    let offset = (paging.page - 1) * paging.page_size;
    *limit_slot = Some(LimitClause::new(Expr::bound_param(
        "paging_limit",
        Value::from(paging.page_size),
    )));
    *offset_slot = Some(OffsetClause::new(Expr::bound_param(
        "paging_offset",
        Value::from(offset),
    )));
    debug!(page = paging.page, size = paging.page_size, "pagination injected");
    Ok(())
}

#[cfg(test)]
mod tests;
