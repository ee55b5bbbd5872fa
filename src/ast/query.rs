//! Row-yielding queries and their clauses.

use crate::base::Span;
use crate::error::SchemaError;

use super::comment::CommentSet;
use super::expr::{Expr, OrderExpr, WindowSpec};
use super::kind::ComponentKind;
use super::name::{Ident, QualifiedName};
use super::source::FromClause;

/// Anything that yields rows: the marker type usable in FROM positions, CTE
/// bodies, INSERT sources, and as a statement of its own.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    Select(SelectQuery),
    Binary(BinaryQuery),
    Values(ValuesQuery),
}

impl Query {
    pub fn kind(&self) -> ComponentKind {
        match self {
            Self::Select(_) => ComponentKind::SelectQuery,
            Self::Binary(_) => ComponentKind::BinaryQuery,
            Self::Values(_) => ComponentKind::ValuesQuery,
        }
    }

    pub fn with_clause(&self) -> Option<&WithClause> {
        match self {
            Self::Select(q) => q.with.as_ref(),
            Self::Binary(q) => q.with.as_ref(),
            Self::Values(q) => q.with.as_ref(),
        }
    }

    pub fn with_clause_mut(&mut self) -> Option<&mut WithClause> {
        match self {
            Self::Select(q) => q.with.as_mut(),
            Self::Binary(q) => q.with.as_mut(),
            Self::Values(q) => q.with.as_mut(),
        }
    }

    pub fn take_with(&mut self) -> Option<WithClause> {
        match self {
            Self::Select(q) => q.with.take(),
            Self::Binary(q) => q.with.take(),
            Self::Values(q) => q.with.take(),
        }
    }

    pub fn set_with(&mut self, with: Option<WithClause>) {
        match self {
            Self::Select(q) => q.with = with,
            Self::Binary(q) => q.with = with,
            Self::Values(q) => q.with = with,
        }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            Self::Select(q) => q.span,
            Self::Binary(q) => q.span,
            Self::Values(q) => q.span,
        }
    }

    pub fn as_select(&self) -> Option<&SelectQuery> {
        match self {
            Self::Select(q) => Some(q),
            _ => None,
        }
    }

    pub fn as_select_mut(&mut self) -> Option<&mut SelectQuery> {
        match self {
            Self::Select(q) => Some(q),
            _ => None,
        }
    }
}

/// A simple SELECT statement.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectQuery {
    pub with: Option<WithClause>,
    pub select: SelectClause,
    pub from: Option<FromClause>,
    pub where_clause: Option<WhereClause>,
    pub group_by: Option<GroupByClause>,
    pub having: Option<HavingClause>,
    pub window: Option<WindowClause>,
    pub order_by: Option<OrderByClause>,
    pub limit: Option<LimitClause>,
    pub offset: Option<OffsetClause>,
    pub fetch: Option<FetchClause>,
    pub locking: Vec<LockingClause>,
    pub span: Option<Span>,
    pub comments: CommentSet,
}

impl SelectQuery {
    /// Add a condition to the WHERE clause, joining with AND when one exists.
    pub fn and_where(&mut self, condition: Expr) {
        match self.where_clause.take() {
            Some(existing) => {
                self.where_clause = Some(WhereClause {
                    condition: Expr::and(existing.condition, condition),
                    comments: existing.comments,
                });
            }
            None => {
                self.where_clause = Some(WhereClause {
                    condition,
                    comments: CommentSet::new(),
                });
            }
        }
    }
}

/// UNION / INTERSECT / EXCEPT over exactly two child queries.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryQuery {
    pub with: Option<WithClause>,
    pub left: Box<Query>,
    pub op: SetOp,
    pub right: Box<Query>,
    pub order_by: Option<OrderByClause>,
    pub limit: Option<LimitClause>,
    pub offset: Option<OffsetClause>,
    pub fetch: Option<FetchClause>,
    pub span: Option<Span>,
    pub comments: CommentSet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SetOp {
    pub kind: SetOpKind,
    pub all: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SetOpKind {
    Union,
    Intersect,
    Except,
}

impl SetOp {
    pub fn as_str(&self) -> &'static str {
        match (self.kind, self.all) {
            (SetOpKind::Union, false) => "UNION",
            (SetOpKind::Union, true) => "UNION ALL",
            (SetOpKind::Intersect, false) => "INTERSECT",
            (SetOpKind::Intersect, true) => "INTERSECT ALL",
            (SetOpKind::Except, false) => "EXCEPT",
            (SetOpKind::Except, true) => "EXCEPT ALL",
        }
    }
}

/// A bare VALUES list.
#[derive(Debug, Clone, PartialEq)]
pub struct ValuesQuery {
    pub with: Option<WithClause>,
    pub rows: Vec<Vec<Expr>>,
    pub span: Option<Span>,
    pub comments: CommentSet,
}

// ============================================================================
// WITH
// ============================================================================

/// A WITH clause owning an ordered sequence of common tables.
///
/// Declaration order is significant and alias names are unique; [`Self::push`]
/// enforces uniqueness at construction time.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WithClause {
    pub recursive: bool,
    pub tables: Vec<CommonTable>,
    pub comments: CommentSet,
}

impl WithClause {
    pub fn new(recursive: bool) -> Self {
        Self {
            recursive,
            tables: Vec::new(),
            comments: CommentSet::new(),
        }
    }

    /// Append a common table, rejecting duplicate alias names.
    pub fn push(&mut self, table: CommonTable) -> Result<(), SchemaError> {
        if self.get(table.name.as_str()).is_some() {
            return Err(SchemaError::DuplicateCte {
                name: table.name.text.to_string(),
            });
        }
        self.tables.push(table);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&CommonTable> {
        self.tables.iter().find(|t| t.name.text == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut CommonTable> {
        self.tables.iter_mut().find(|t| t.name.text == name)
    }

    /// Remove a common table by name.
    pub fn remove(&mut self, name: &str) -> Result<CommonTable, SchemaError> {
        match self.tables.iter().position(|t| t.name.text == name) {
            Some(idx) => Ok(self.tables.remove(idx)),
            None => Err(SchemaError::UnknownCte {
                name: name.to_string(),
            }),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|t| t.name.as_str())
    }
}

/// One entry of a WITH clause: alias, optional column list, optional
/// materialization hint, and the body query.
#[derive(Debug, Clone, PartialEq)]
pub struct CommonTable {
    pub name: Ident,
    pub columns: Vec<Ident>,
    /// `Some(true)` = MATERIALIZED, `Some(false)` = NOT MATERIALIZED.
    pub materialized: Option<bool>,
    pub query: Box<Query>,
    pub span: Option<Span>,
    pub comments: CommentSet,
}

impl CommonTable {
    pub fn new(name: impl Into<Ident>, query: Query) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            materialized: None,
            query: Box::new(query),
            span: None,
            comments: CommentSet::new(),
        }
    }
}

// ============================================================================
// SELECT list
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectClause {
    pub distinct: Option<Distinct>,
    pub items: Vec<SelectItem>,
    pub comments: CommentSet,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Distinct {
    All,
    Distinct,
    DistinctOn(Vec<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SelectItem {
    Wildcard(WildcardItem),
    Expr(ExprItem),
}

impl SelectItem {
    pub fn expr(expr: Expr) -> Self {
        Self::Expr(ExprItem {
            expr,
            alias: None,
            comments: CommentSet::new(),
        })
    }

    pub fn aliased(expr: Expr, alias: impl Into<Ident>) -> Self {
        Self::Expr(ExprItem {
            expr,
            alias: Some(alias.into()),
            comments: CommentSet::new(),
        })
    }

    pub fn wildcard() -> Self {
        Self::Wildcard(WildcardItem {
            qualifier: None,
            comments: CommentSet::new(),
        })
    }

    /// The logical output name: the alias, or for a plain column reference
    /// the final name component.
    pub fn output_name(&self) -> Option<&str> {
        match self {
            Self::Wildcard(_) => None,
            Self::Expr(item) => match &item.alias {
                Some(alias) => Some(alias.as_str()),
                None => match &item.expr {
                    Expr::Column(col) => Some(col.name.name().as_str()),
                    _ => None,
                },
            },
        }
    }
}

/// `*` or `table.*`.
#[derive(Debug, Clone, PartialEq)]
pub struct WildcardItem {
    pub qualifier: Option<QualifiedName>,
    pub comments: CommentSet,
}

/// An expression select item with optional alias.
#[derive(Debug, Clone, PartialEq)]
pub struct ExprItem {
    pub expr: Expr,
    pub alias: Option<Ident>,
    pub comments: CommentSet,
}

// ============================================================================
// Simple clauses
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct WhereClause {
    pub condition: Expr,
    pub comments: CommentSet,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupByClause {
    pub items: Vec<Expr>,
    pub comments: CommentSet,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HavingClause {
    pub condition: Expr,
    pub comments: CommentSet,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindowClause {
    pub windows: Vec<NamedWindow>,
    pub comments: CommentSet,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NamedWindow {
    pub name: Ident,
    pub spec: WindowSpec,
    pub comments: CommentSet,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct OrderByClause {
    pub items: Vec<OrderExpr>,
    pub comments: CommentSet,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LimitClause {
    pub value: Expr,
    pub comments: CommentSet,
}

impl LimitClause {
    pub fn new(value: Expr) -> Self {
        Self {
            value,
            comments: CommentSet::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OffsetClause {
    pub value: Expr,
    /// Written with a trailing ROW/ROWS noise word.
    pub rows: bool,
    pub comments: CommentSet,
}

impl OffsetClause {
    pub fn new(value: Expr) -> Self {
        Self {
            value,
            rows: false,
            comments: CommentSet::new(),
        }
    }
}

/// `FETCH FIRST n ROWS ONLY` / `FETCH NEXT n ROWS WITH TIES`.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchClause {
    pub first: bool,
    pub count: Option<Expr>,
    pub with_ties: bool,
    pub comments: CommentSet,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LockingClause {
    pub mode: LockMode,
    pub of: Vec<QualifiedName>,
    pub wait: Option<LockWait>,
    pub comments: CommentSet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockMode {
    Update,
    NoKeyUpdate,
    Share,
    KeyShare,
}

impl LockMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Update => "UPDATE",
            Self::NoKeyUpdate => "NO KEY UPDATE",
            Self::Share => "SHARE",
            Self::KeyShare => "KEY SHARE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockWait {
    Nowait,
    SkipLocked,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trivial_query() -> Query {
        Query::Select(SelectQuery {
            select: SelectClause {
                distinct: None,
                items: vec![SelectItem::expr(Expr::number("1"))],
                comments: CommentSet::new(),
            },
            ..SelectQuery::default()
        })
    }

    #[test]
    fn test_with_clause_rejects_duplicates() {
        let mut with = WithClause::new(false);
        with.push(CommonTable::new("a", trivial_query())).unwrap();
        with.push(CommonTable::new("b", trivial_query())).unwrap();
        let err = with.push(CommonTable::new("a", trivial_query())).unwrap_err();
        assert_eq!(err, SchemaError::DuplicateCte { name: "a".into() });
        assert_eq!(with.names().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_with_clause_remove() {
        let mut with = WithClause::new(false);
        with.push(CommonTable::new("a", trivial_query())).unwrap();
        assert!(with.remove("a").is_ok());
        assert!(matches!(
            with.remove("a"),
            Err(SchemaError::UnknownCte { .. })
        ));
    }

    #[test]
    fn test_and_where() {
        let mut query = SelectQuery::default();
        query.and_where(Expr::bare_column("a"));
        query.and_where(Expr::bare_column("b"));
        let condition = &query.where_clause.as_ref().unwrap().condition;
        assert!(condition.is_conjunction());
    }

    #[test]
    fn test_output_name() {
        let aliased = SelectItem::aliased(Expr::bare_column("id"), "user_id");
        assert_eq!(aliased.output_name(), Some("user_id"));
        let plain = SelectItem::expr(Expr::column(QualifiedName::from_parts(["u", "id"])));
        assert_eq!(plain.output_name(), Some("id"));
        assert_eq!(SelectItem::wildcard().output_name(), None);
    }
}
