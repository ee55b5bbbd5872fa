//! DDL statements and shapes.

use super::comment::CommentSet;
use super::expr::{Expr, NullsOrder, OrderDirection, TypeName};
use super::name::{Ident, QualifiedName};
use super::statement::Statement;

#[derive(Debug, Clone, PartialEq)]
pub struct CreateTable {
    pub name: QualifiedName,
    pub if_not_exists: bool,
    pub temporary: bool,
    pub columns: Vec<ColumnDef>,
    pub constraints: Vec<TableConstraint>,
    pub comments: CommentSet,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: Ident,
    pub ty: TypeName,
    pub constraints: Vec<ColumnConstraint>,
    pub comments: CommentSet,
}

/// An optionally named inline column constraint.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnConstraint {
    pub name: Option<Ident>,
    pub kind: ColumnConstraintKind,
    pub comments: CommentSet,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnConstraintKind {
    NotNull,
    Null,
    Default(Expr),
    PrimaryKey,
    Unique,
    References(ReferenceDef),
    Check(Expr),
    Generated {
        always: bool,
        options: Vec<SequenceOption>,
    },
}

/// An optionally named table-level constraint.
#[derive(Debug, Clone, PartialEq)]
pub struct TableConstraint {
    pub name: Option<Ident>,
    pub kind: TableConstraintKind,
    pub comments: CommentSet,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TableConstraintKind {
    PrimaryKey(Vec<Ident>),
    Unique(Vec<Ident>),
    ForeignKey {
        columns: Vec<Ident>,
        reference: ReferenceDef,
    },
    Check(Expr),
}

/// The REFERENCES part of a foreign key.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceDef {
    pub table: QualifiedName,
    pub columns: Vec<Ident>,
    pub match_kind: Option<MatchKind>,
    pub on_delete: Option<ReferentialAction>,
    pub on_update: Option<ReferentialAction>,
    pub deferrable: Option<bool>,
    pub initially_deferred: Option<bool>,
}

impl ReferenceDef {
    pub fn new(table: QualifiedName, columns: Vec<Ident>) -> Self {
        Self {
            table,
            columns,
            match_kind: None,
            on_delete: None,
            on_update: None,
            deferrable: None,
            initially_deferred: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchKind {
    Full,
    Partial,
    Simple,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferentialAction {
    NoAction,
    Restrict,
    Cascade,
    SetNull,
    SetDefault,
}

impl ReferentialAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoAction => "NO ACTION",
            Self::Restrict => "RESTRICT",
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
            Self::SetDefault => "SET DEFAULT",
        }
    }
}

/// Options of a generated identity column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SequenceOption {
    Start(i64),
    Increment(i64),
    MinValue(i64),
    MaxValue(i64),
    Cache(i64),
    Cycle,
    NoCycle,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateIndex {
    pub name: Option<Ident>,
    pub unique: bool,
    pub if_not_exists: bool,
    pub table: QualifiedName,
    /// `USING btree` and friends.
    pub method: Option<Ident>,
    pub columns: Vec<IndexColumn>,
    pub comments: CommentSet,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexColumn {
    pub expr: Expr,
    pub direction: Option<OrderDirection>,
    pub nulls: Option<NullsOrder>,
    pub comments: CommentSet,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlterTable {
    pub table: QualifiedName,
    pub if_exists: bool,
    pub actions: Vec<AlterAction>,
    pub comments: CommentSet,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AlterAction {
    AddColumn {
        if_not_exists: bool,
        column: ColumnDef,
    },
    DropColumn {
        name: Ident,
        if_exists: bool,
        cascade: bool,
    },
    AddConstraint(TableConstraint),
    DropConstraint {
        name: Ident,
        if_exists: bool,
        cascade: bool,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DropTable {
    pub names: Vec<QualifiedName>,
    pub if_exists: bool,
    pub cascade: bool,
    pub comments: CommentSet,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DropIndex {
    pub names: Vec<QualifiedName>,
    pub if_exists: bool,
    pub cascade: bool,
    pub comments: CommentSet,
}

// ============================================================================
// Utility statements
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ExplainStmt {
    pub analyze: bool,
    pub verbose: bool,
    pub statement: Box<Statement>,
    pub comments: CommentSet,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzeStmt {
    pub verbose: bool,
    pub table: Option<QualifiedName>,
    pub comments: CommentSet,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VacuumStmt {
    pub full: bool,
    pub analyze: bool,
    pub table: Option<QualifiedName>,
    pub comments: CommentSet,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReindexStmt {
    pub target: ReindexTarget,
    pub name: QualifiedName,
    pub comments: CommentSet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReindexTarget {
    Index,
    Table,
}
