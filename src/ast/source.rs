//! FROM-clause sources and joins.

use super::comment::CommentSet;
use super::expr::{Expr, FunctionCall};
use super::kind::ComponentKind;
use super::name::{Ident, QualifiedName};
use super::query::Query;

/// The FROM clause: one or more comma-separated items, each carrying its
/// chain of joins.
#[derive(Debug, Clone, PartialEq)]
pub struct FromClause {
    pub items: Vec<FromItem>,
    pub comments: CommentSet,
}

impl FromClause {
    pub fn single(source: SourceExpr) -> Self {
        Self {
            items: vec![FromItem {
                source,
                joins: Vec::new(),
            }],
            comments: CommentSet::new(),
        }
    }

}

#[derive(Debug, Clone, PartialEq)]
pub struct FromItem {
    pub source: SourceExpr,
    pub joins: Vec<Join>,
}

/// A source together with its optional alias.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceExpr {
    pub source: Source,
    pub alias: Option<SourceAlias>,
    pub comments: CommentSet,
}

impl SourceExpr {
    pub fn table(name: QualifiedName) -> Self {
        Self {
            source: Source::Table(TableSource { name, only: false }),
            alias: None,
            comments: CommentSet::new(),
        }
    }

    pub fn subquery(query: Query, alias: impl Into<Ident>) -> Self {
        Self {
            source: Source::Query(QuerySource {
                query: Box::new(query),
                lateral: false,
            }),
            alias: Some(SourceAlias {
                name: alias.into(),
                columns: Vec::new(),
            }),
            comments: CommentSet::new(),
        }
    }

    pub fn with_alias(mut self, alias: impl Into<Ident>) -> Self {
        self.alias = Some(SourceAlias {
            name: alias.into(),
            columns: Vec::new(),
        });
        self
    }

    /// The name this source is known by in its scope: the alias if present,
    /// otherwise the table's bare name.
    pub fn scope_name(&self) -> Option<&str> {
        if let Some(alias) = &self.alias {
            return Some(alias.name.as_str());
        }
        match &self.source {
            Source::Table(table) => Some(table.name.name().as_str()),
            _ => None,
        }
    }
}

/// The source itself.
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    Table(TableSource),
    Query(QuerySource),
    Function(FunctionSource),
    Values(ValuesSource),
    /// A parenthesized source, which may carry its own join chain.
    Paren(Box<FromItem>),
}

impl Source {
    pub fn kind(&self) -> ComponentKind {
        match self {
            Self::Table(_) => ComponentKind::TableSource,
            Self::Query(_) => ComponentKind::QuerySource,
            Self::Function(_) => ComponentKind::FunctionSource,
            Self::Values(_) => ComponentKind::ValuesSource,
            Self::Paren(_) => ComponentKind::ParenSource,
        }
    }
}

/// A physical table reference (or a CTE reference, resolved by name).
#[derive(Debug, Clone, PartialEq)]
pub struct TableSource {
    pub name: QualifiedName,
    /// `FROM ONLY table`
    pub only: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuerySource {
    pub query: Box<Query>,
    pub lateral: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSource {
    pub call: FunctionCall,
    pub lateral: bool,
    pub with_ordinality: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValuesSource {
    pub rows: Vec<Vec<Expr>>,
}

/// `AS alias (col1, col2, …)`.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceAlias {
    pub name: Ident,
    pub columns: Vec<Ident>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub kind: JoinKind,
    pub natural: bool,
    pub source: SourceExpr,
    /// Absent for CROSS and NATURAL joins.
    pub constraint: Option<JoinConstraint>,
    pub comments: CommentSet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
    Cross,
}

impl JoinKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inner => "JOIN",
            Self::Left => "LEFT JOIN",
            Self::Right => "RIGHT JOIN",
            Self::Full => "FULL JOIN",
            Self::Cross => "CROSS JOIN",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum JoinConstraint {
    On(Expr),
    Using(Vec<Ident>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_name() {
        let plain = SourceExpr::table(QualifiedName::from_parts(["public", "users"]));
        assert_eq!(plain.scope_name(), Some("users"));

        let aliased = plain.clone().with_alias("u");
        assert_eq!(aliased.scope_name(), Some("u"));
    }
}
