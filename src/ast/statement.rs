//! The statement root.

use crate::error::SchemaError;
use crate::lexer::{Comment, Lexeme};

use super::ddl::{
    AlterTable, AnalyzeStmt, CreateIndex, CreateTable, DropIndex, DropTable, ExplainStmt,
    ReindexStmt, VacuumStmt,
};
use super::dml::{DeleteQuery, InsertQuery, MergeQuery, UpdateQuery};
use super::kind::ComponentKind;
use super::query::Query;

/// One parsed statement: the root of an ownership tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// File-leading comments before the first statement keyword.
    pub header: Vec<Comment>,
    pub body: StatementBody,
    /// The original lexeme stream, retained when the parser was asked to
    /// preserve formatting. Enables byte-exact re-emission.
    pub preserved: Option<Vec<Lexeme>>,
}

impl Statement {
    pub fn new(body: StatementBody) -> Self {
        Self {
            header: Vec::new(),
            body,
            preserved: None,
        }
    }

    pub fn kind(&self) -> ComponentKind {
        self.body.kind()
    }

    /// The row-yielding query, when this statement is one.
    pub fn as_query(&self) -> Option<&Query> {
        match &self.body {
            StatementBody::Query(q) => Some(q),
            _ => None,
        }
    }

    pub fn as_query_mut(&mut self) -> Option<&mut Query> {
        match &mut self.body {
            StatementBody::Query(q) => Some(q),
            _ => None,
        }
    }

    /// Like [`Self::as_query`] but failing with a structured error, for
    /// transformers that only operate on row-yielding roots.
    pub fn expect_query(&self) -> Result<&Query, SchemaError> {
        self.as_query()
            .ok_or(SchemaError::UnsupportedRoot(self.kind().display_name()))
    }

    pub fn expect_query_mut(&mut self) -> Result<&mut Query, SchemaError> {
        let kind = self.kind();
        self.as_query_mut()
            .ok_or(SchemaError::UnsupportedRoot(kind.display_name()))
    }

    pub fn into_query(self) -> Result<Query, SchemaError> {
        match self.body {
            StatementBody::Query(q) => Ok(q),
            other => Err(SchemaError::UnsupportedRoot(other.kind().display_name())),
        }
    }
}

impl From<Query> for Statement {
    fn from(query: Query) -> Self {
        Self::new(StatementBody::Query(query))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatementBody {
    /// SELECT (simple or binary) or VALUES.
    Query(Query),
    Insert(InsertQuery),
    Update(UpdateQuery),
    Delete(DeleteQuery),
    Merge(MergeQuery),
    CreateTable(CreateTable),
    CreateIndex(CreateIndex),
    AlterTable(AlterTable),
    DropTable(DropTable),
    DropIndex(DropIndex),
    Explain(ExplainStmt),
    Analyze(AnalyzeStmt),
    Vacuum(VacuumStmt),
    Reindex(ReindexStmt),
}

impl StatementBody {
    pub fn kind(&self) -> ComponentKind {
        match self {
            Self::Query(q) => q.kind(),
            Self::Insert(_) => ComponentKind::InsertQuery,
            Self::Update(_) => ComponentKind::UpdateQuery,
            Self::Delete(_) => ComponentKind::DeleteQuery,
            Self::Merge(_) => ComponentKind::MergeQuery,
            Self::CreateTable(_) => ComponentKind::CreateTable,
            Self::CreateIndex(_) => ComponentKind::CreateIndex,
            Self::AlterTable(_) => ComponentKind::AlterTable,
            Self::DropTable(_) => ComponentKind::DropTable,
            Self::DropIndex(_) => ComponentKind::DropIndex,
            Self::Explain(_) => ComponentKind::Explain,
            Self::Analyze(_) => ComponentKind::Analyze,
            Self::Vacuum(_) => ComponentKind::Vacuum,
            Self::Reindex(_) => ComponentKind::Reindex,
        }
    }
}
