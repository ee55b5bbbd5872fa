//! The component kind registry.
//!
//! Every AST node belongs to exactly one of these kinds. Visitors dispatch on
//! the enum (tagged-variant dispatch, no down-casting), and diagnostics use
//! the display name.

/// Every component kind in the AST, grouped by family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    // Statements
    SelectQuery,
    BinaryQuery,
    ValuesQuery,
    InsertQuery,
    UpdateQuery,
    DeleteQuery,
    MergeQuery,
    CreateTable,
    CreateIndex,
    AlterTable,
    DropTable,
    DropIndex,
    Explain,
    Analyze,
    Vacuum,
    Reindex,

    // Clauses
    WithClause,
    CommonTable,
    SelectClause,
    SelectItem,
    WildcardItem,
    FromClause,
    WhereClause,
    GroupByClause,
    HavingClause,
    WindowClause,
    NamedWindow,
    OrderByClause,
    OrderExpr,
    LimitClause,
    OffsetClause,
    FetchClause,
    LockingClause,
    SetClause,
    Join,

    // Sources
    SourceExpr,
    TableSource,
    QuerySource,
    FunctionSource,
    ValuesSource,
    ParenSource,
    SourceAlias,

    // Value expressions
    ColumnRef,
    Literal,
    Param,
    UnaryExpr,
    BinaryExpr,
    BetweenExpr,
    InListExpr,
    InQueryExpr,
    ExistsExpr,
    FunctionCall,
    CastExpr,
    CaseExpr,
    WhenBranch,
    TupleExpr,
    ArrayExpr,
    ArrayQueryExpr,
    SubscriptExpr,
    SubqueryExpr,
    ParenExpr,
    TypedString,
    CollateExpr,
    WindowSpec,
    WindowFrame,

    // Naming
    Ident,
    QualifiedName,
    TypeName,

    // DDL shapes
    ColumnDef,
    ColumnConstraint,
    TableConstraint,
    ReferenceDef,
    IndexColumn,
    SequenceOption,
    AlterAction,

    // MERGE shapes
    MergeWhen,
    MergeActionUpdate,
    MergeActionInsert,
    MergeActionDelete,
    MergeActionDoNothing,
}

impl ComponentKind {
    /// Human-readable name for diagnostics.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::SelectQuery => "select query",
            Self::BinaryQuery => "set-operation query",
            Self::ValuesQuery => "values query",
            Self::InsertQuery => "insert statement",
            Self::UpdateQuery => "update statement",
            Self::DeleteQuery => "delete statement",
            Self::MergeQuery => "merge statement",
            Self::CreateTable => "create table statement",
            Self::CreateIndex => "create index statement",
            Self::AlterTable => "alter table statement",
            Self::DropTable => "drop table statement",
            Self::DropIndex => "drop index statement",
            Self::Explain => "explain statement",
            Self::Analyze => "analyze statement",
            Self::Vacuum => "vacuum statement",
            Self::Reindex => "reindex statement",
            Self::WithClause => "with clause",
            Self::CommonTable => "common table",
            Self::SelectClause => "select list",
            Self::SelectItem => "select item",
            Self::WildcardItem => "wildcard",
            Self::FromClause => "from clause",
            Self::WhereClause => "where clause",
            Self::GroupByClause => "group by clause",
            Self::HavingClause => "having clause",
            Self::WindowClause => "window clause",
            Self::NamedWindow => "named window",
            Self::OrderByClause => "order by clause",
            Self::OrderExpr => "order expression",
            Self::LimitClause => "limit clause",
            Self::OffsetClause => "offset clause",
            Self::FetchClause => "fetch clause",
            Self::LockingClause => "locking clause",
            Self::SetClause => "set clause",
            Self::Join => "join",
            Self::SourceExpr => "source expression",
            Self::TableSource => "table source",
            Self::QuerySource => "sub-query source",
            Self::FunctionSource => "function source",
            Self::ValuesSource => "values source",
            Self::ParenSource => "parenthesized source",
            Self::SourceAlias => "source alias",
            Self::ColumnRef => "column reference",
            Self::Literal => "literal",
            Self::Param => "parameter",
            Self::UnaryExpr => "unary expression",
            Self::BinaryExpr => "binary expression",
            Self::BetweenExpr => "between expression",
            Self::InListExpr => "in-list expression",
            Self::InQueryExpr => "in-subquery expression",
            Self::ExistsExpr => "exists expression",
            Self::FunctionCall => "function call",
            Self::CastExpr => "cast expression",
            Self::CaseExpr => "case expression",
            Self::WhenBranch => "when branch",
            Self::TupleExpr => "tuple expression",
            Self::ArrayExpr => "array literal",
            Self::ArrayQueryExpr => "array sub-query",
            Self::SubscriptExpr => "subscript expression",
            Self::SubqueryExpr => "scalar sub-query",
            Self::ParenExpr => "parenthesized expression",
            Self::TypedString => "typed string",
            Self::CollateExpr => "collate expression",
            Self::WindowSpec => "window specification",
            Self::WindowFrame => "window frame",
            Self::Ident => "identifier",
            Self::QualifiedName => "qualified name",
            Self::TypeName => "type name",
            Self::ColumnDef => "column definition",
            Self::ColumnConstraint => "column constraint",
            Self::TableConstraint => "table constraint",
            Self::ReferenceDef => "reference definition",
            Self::IndexColumn => "index column",
            Self::SequenceOption => "sequence option",
            Self::AlterAction => "alter action",
            Self::MergeWhen => "merge when clause",
            Self::MergeActionUpdate => "merge update action",
            Self::MergeActionInsert => "merge insert action",
            Self::MergeActionDelete => "merge delete action",
            Self::MergeActionDoNothing => "merge do-nothing action",
        }
    }
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}
