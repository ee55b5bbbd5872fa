//! Mutation statements: INSERT, UPDATE, DELETE, MERGE.

use super::comment::CommentSet;
use super::expr::Expr;
use super::kind::ComponentKind;
use super::name::{Ident, QualifiedName};
use super::query::{Query, SelectItem, WhereClause, WithClause};
use super::source::{FromClause, SourceExpr};

#[derive(Debug, Clone, PartialEq)]
pub struct InsertQuery {
    pub with: Option<WithClause>,
    pub table: QualifiedName,
    pub alias: Option<Ident>,
    pub columns: Vec<Ident>,
    pub source: InsertSource,
    pub returning: Option<Vec<SelectItem>>,
    pub comments: CommentSet,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InsertSource {
    /// SELECT or VALUES.
    Query(Box<Query>),
    DefaultValues,
}

/// One `column = value` assignment of an UPDATE SET list or merge action.
#[derive(Debug, Clone, PartialEq)]
pub struct SetClause {
    pub column: QualifiedName,
    pub value: Expr,
    pub comments: CommentSet,
}

impl SetClause {
    pub fn new(column: QualifiedName, value: Expr) -> Self {
        Self {
            column,
            value,
            comments: CommentSet::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateQuery {
    pub with: Option<WithClause>,
    pub table: SourceExpr,
    pub set: Vec<SetClause>,
    pub from: Option<FromClause>,
    pub where_clause: Option<WhereClause>,
    pub returning: Option<Vec<SelectItem>>,
    pub comments: CommentSet,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteQuery {
    pub with: Option<WithClause>,
    pub table: SourceExpr,
    pub using: Option<FromClause>,
    pub where_clause: Option<WhereClause>,
    pub returning: Option<Vec<SelectItem>>,
    pub comments: CommentSet,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergeQuery {
    pub with: Option<WithClause>,
    pub target: SourceExpr,
    pub source: SourceExpr,
    pub on: Expr,
    pub clauses: Vec<MergeWhen>,
    pub comments: CommentSet,
}

/// `WHEN [NOT] MATCHED [AND condition] THEN action`.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeWhen {
    pub matched: bool,
    pub condition: Option<Expr>,
    pub action: MergeAction,
    pub comments: CommentSet,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MergeAction {
    Update { set: Vec<SetClause> },
    Insert { columns: Vec<Ident>, values: MergeInsertValues },
    Delete,
    DoNothing,
}

impl MergeAction {
    pub fn kind(&self) -> ComponentKind {
        match self {
            Self::Update { .. } => ComponentKind::MergeActionUpdate,
            Self::Insert { .. } => ComponentKind::MergeActionInsert,
            Self::Delete => ComponentKind::MergeActionDelete,
            Self::DoNothing => ComponentKind::MergeActionDoNothing,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MergeInsertValues {
    Values(Vec<Expr>),
    DefaultValues,
}
