//! Value expressions.

use smol_str::SmolStr;

use super::comment::CommentSet;
use super::kind::ComponentKind;
use super::name::{Ident, QualifiedName};
use super::query::Query;

/// A value expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Column(ColumnRef),
    Literal(Literal),
    Param(ParamExpr),
    Unary(UnaryExpr),
    Binary(BinaryExpr),
    Between(BetweenExpr),
    InList(InListExpr),
    InQuery(InQueryExpr),
    Exists(ExistsExpr),
    Function(FunctionCall),
    Cast(CastExpr),
    Case(CaseExpr),
    Tuple(TupleExpr),
    Array(ArrayExpr),
    ArrayQuery(ArrayQueryExpr),
    Subscript(SubscriptExpr),
    Subquery(SubqueryExpr),
    Paren(ParenExpr),
    TypedString(TypedStringExpr),
    Collate(CollateExpr),
}

impl Expr {
    pub fn kind(&self) -> ComponentKind {
        match self {
            Self::Column(_) => ComponentKind::ColumnRef,
            Self::Literal(_) => ComponentKind::Literal,
            Self::Param(_) => ComponentKind::Param,
            Self::Unary(_) => ComponentKind::UnaryExpr,
            Self::Binary(_) => ComponentKind::BinaryExpr,
            Self::Between(_) => ComponentKind::BetweenExpr,
            Self::InList(_) => ComponentKind::InListExpr,
            Self::InQuery(_) => ComponentKind::InQueryExpr,
            Self::Exists(_) => ComponentKind::ExistsExpr,
            Self::Function(_) => ComponentKind::FunctionCall,
            Self::Cast(_) => ComponentKind::CastExpr,
            Self::Case(_) => ComponentKind::CaseExpr,
            Self::Tuple(_) => ComponentKind::TupleExpr,
            Self::Array(_) => ComponentKind::ArrayExpr,
            Self::ArrayQuery(_) => ComponentKind::ArrayQueryExpr,
            Self::Subscript(_) => ComponentKind::SubscriptExpr,
            Self::Subquery(_) => ComponentKind::SubqueryExpr,
            Self::Paren(_) => ComponentKind::ParenExpr,
            Self::TypedString(_) => ComponentKind::TypedString,
            Self::Collate(_) => ComponentKind::CollateExpr,
        }
    }

    pub fn comments(&self) -> &CommentSet {
        match self {
            Self::Column(e) => &e.comments,
            Self::Literal(e) => &e.comments,
            Self::Param(e) => &e.comments,
            Self::Unary(e) => &e.comments,
            Self::Binary(e) => &e.comments,
            Self::Between(e) => &e.comments,
            Self::InList(e) => &e.comments,
            Self::InQuery(e) => &e.comments,
            Self::Exists(e) => &e.comments,
            Self::Function(e) => &e.comments,
            Self::Cast(e) => &e.comments,
            Self::Case(e) => &e.comments,
            Self::Tuple(e) => &e.comments,
            Self::Array(e) => &e.comments,
            Self::ArrayQuery(e) => &e.comments,
            Self::Subscript(e) => &e.comments,
            Self::Subquery(e) => &e.comments,
            Self::Paren(e) => &e.comments,
            Self::TypedString(e) => &e.comments,
            Self::Collate(e) => &e.comments,
        }
    }

    pub fn comments_mut(&mut self) -> &mut CommentSet {
        match self {
            Self::Column(e) => &mut e.comments,
            Self::Literal(e) => &mut e.comments,
            Self::Param(e) => &mut e.comments,
            Self::Unary(e) => &mut e.comments,
            Self::Binary(e) => &mut e.comments,
            Self::Between(e) => &mut e.comments,
            Self::InList(e) => &mut e.comments,
            Self::InQuery(e) => &mut e.comments,
            Self::Exists(e) => &mut e.comments,
            Self::Function(e) => &mut e.comments,
            Self::Cast(e) => &mut e.comments,
            Self::Case(e) => &mut e.comments,
            Self::Tuple(e) => &mut e.comments,
            Self::Array(e) => &mut e.comments,
            Self::ArrayQuery(e) => &mut e.comments,
            Self::Subscript(e) => &mut e.comments,
            Self::Subquery(e) => &mut e.comments,
            Self::Paren(e) => &mut e.comments,
            Self::TypedString(e) => &mut e.comments,
            Self::Collate(e) => &mut e.comments,
        }
    }

    // -----------------------------------------------------------------
    // Construction helpers used by parsers and transformers
    // -----------------------------------------------------------------

    pub fn column(name: QualifiedName) -> Self {
        Self::Column(ColumnRef {
            name,
            comments: CommentSet::new(),
        })
    }

    pub fn bare_column(name: impl Into<SmolStr>) -> Self {
        Self::column(QualifiedName::bare(name))
    }

    pub fn number(text: impl Into<SmolStr>) -> Self {
        Self::Literal(Literal {
            value: LiteralValue::Number(text.into()),
            comments: CommentSet::new(),
        })
    }

    pub fn string(text: impl Into<SmolStr>) -> Self {
        Self::Literal(Literal {
            value: LiteralValue::String(text.into()),
            comments: CommentSet::new(),
        })
    }

    pub fn null() -> Self {
        Self::Literal(Literal {
            value: LiteralValue::Null,
            comments: CommentSet::new(),
        })
    }

    pub fn param(name: impl Into<SmolStr>) -> Self {
        Self::Param(ParamExpr {
            name: name.into(),
            index: None,
            value: None,
            comments: CommentSet::new(),
        })
    }

    pub fn bound_param(name: impl Into<SmolStr>, value: serde_json::Value) -> Self {
        Self::Param(ParamExpr {
            name: name.into(),
            index: None,
            value: Some(value),
            comments: CommentSet::new(),
        })
    }

    pub fn binary(left: Expr, op: BinaryOp, right: Expr) -> Self {
        Self::Binary(BinaryExpr {
            left: Box::new(left),
            op,
            right: Box::new(right),
            comments: CommentSet::new(),
        })
    }

    pub fn and(left: Expr, right: Expr) -> Self {
        Self::binary(left, BinaryOp::And, right)
    }

    pub fn or(left: Expr, right: Expr) -> Self {
        Self::binary(left, BinaryOp::Or, right)
    }

    pub fn eq(left: Expr, right: Expr) -> Self {
        Self::binary(left, BinaryOp::Eq, right)
    }

    pub fn paren(inner: Expr) -> Self {
        Self::Paren(ParenExpr {
            inner: Box::new(inner),
            comments: CommentSet::new(),
        })
    }

    pub fn function(name: impl Into<SmolStr>, args: Vec<Expr>) -> Self {
        Self::Function(FunctionCall {
            name: QualifiedName::bare(name),
            args,
            star: false,
            distinct: false,
            order_by: Vec::new(),
            filter: None,
            over: None,
            comments: CommentSet::new(),
        })
    }

    /// True for AND/OR conjunctions, used when deciding whether injected
    /// conditions need parentheses.
    pub fn is_conjunction(&self) -> bool {
        matches!(
            self,
            Self::Binary(BinaryExpr {
                op: BinaryOp::And | BinaryOp::Or,
                ..
            })
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRef {
    pub name: QualifiedName,
    pub comments: CommentSet,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub value: LiteralValue,
    pub comments: CommentSet,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiteralValue {
    /// Kept as written; the library never interprets numbers.
    Number(SmolStr),
    String(SmolStr),
    Bool(bool),
    Null,
}

/// A parameter marker. Every occurrence of the same name denotes the same
/// parameter; binding a value sets it on all of them.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamExpr {
    pub name: SmolStr,
    /// Position for positional dialects (`$3`), assigned at parse time.
    pub index: Option<u32>,
    /// Bound value, if `set_parameter` has run.
    pub value: Option<serde_json::Value>,
    pub comments: CommentSet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Plus,
    Minus,
    Not,
}

impl UnaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Not => "NOT",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpr {
    pub op: UnaryOp,
    pub operand: Box<Expr>,
    pub comments: CommentSet,
}

/// Binary operators, lowest to highest precedence tiers. Dialect-specific
/// symbol operators that the grammar does not model individually travel as
/// [`BinaryOp::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Is,
    IsNot,
    IsDistinctFrom,
    IsNotDistinctFrom,
    Like,
    NotLike,
    ILike,
    NotILike,
    SimilarTo,
    NotSimilarTo,
    Concat,
    JsonGet,
    JsonGetText,
    JsonGetPath,
    JsonGetPathText,
    JsonContains,
    JsonContainedIn,
    JsonExists,
    JsonExistsAny,
    JsonExistsAll,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Exponent,
    Other(SmolStr),
}

impl BinaryOp {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Or => "OR",
            Self::And => "AND",
            Self::Eq => "=",
            Self::NotEq => "<>",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::Is => "IS",
            Self::IsNot => "IS NOT",
            Self::IsDistinctFrom => "IS DISTINCT FROM",
            Self::IsNotDistinctFrom => "IS NOT DISTINCT FROM",
            Self::Like => "LIKE",
            Self::NotLike => "NOT LIKE",
            Self::ILike => "ILIKE",
            Self::NotILike => "NOT ILIKE",
            Self::SimilarTo => "SIMILAR TO",
            Self::NotSimilarTo => "NOT SIMILAR TO",
            Self::Concat => "||",
            Self::JsonGet => "->",
            Self::JsonGetText => "->>",
            Self::JsonGetPath => "#>",
            Self::JsonGetPathText => "#>>",
            Self::JsonContains => "@>",
            Self::JsonContainedIn => "<@",
            Self::JsonExists => "?",
            Self::JsonExistsAny => "?|",
            Self::JsonExistsAll => "?&",
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Modulo => "%",
            Self::Exponent => "^",
            Self::Other(text) => text.as_str(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpr {
    pub left: Box<Expr>,
    pub op: BinaryOp,
    pub right: Box<Expr>,
    pub comments: CommentSet,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BetweenExpr {
    pub operand: Box<Expr>,
    pub negated: bool,
    pub symmetric: bool,
    pub low: Box<Expr>,
    pub high: Box<Expr>,
    pub comments: CommentSet,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InListExpr {
    pub operand: Box<Expr>,
    pub negated: bool,
    pub items: Vec<Expr>,
    pub comments: CommentSet,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InQueryExpr {
    pub operand: Box<Expr>,
    pub negated: bool,
    pub query: Box<Query>,
    pub comments: CommentSet,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExistsExpr {
    pub negated: bool,
    pub query: Box<Query>,
    pub comments: CommentSet,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: QualifiedName,
    pub args: Vec<Expr>,
    /// `count(*)`
    pub star: bool,
    pub distinct: bool,
    /// Ordering inside an aggregate: `array_agg(x ORDER BY y)`.
    pub order_by: Vec<OrderExpr>,
    /// `FILTER (WHERE …)`
    pub filter: Option<Box<Expr>>,
    pub over: Option<Over>,
    pub comments: CommentSet,
}

/// The OVER part of a window function call.
#[derive(Debug, Clone, PartialEq)]
pub enum Over {
    /// `OVER w`: refers to a named window from the WINDOW clause.
    Named(Ident),
    /// `OVER (…)`
    Spec(WindowSpec),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct WindowSpec {
    /// An inherited named window: `(w ORDER BY x)`.
    pub base: Option<Ident>,
    pub partition_by: Vec<Expr>,
    pub order_by: Vec<OrderExpr>,
    pub frame: Option<WindowFrame>,
    pub comments: CommentSet,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindowFrame {
    pub units: FrameUnits,
    pub start: FrameBound,
    /// Present for `BETWEEN start AND end` frames.
    pub end: Option<FrameBound>,
    pub exclusion: Option<FrameExclusion>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameUnits {
    Rows,
    Range,
    Groups,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FrameBound {
    CurrentRow,
    UnboundedPreceding,
    UnboundedFollowing,
    Preceding(Box<Expr>),
    Following(Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameExclusion {
    CurrentRow,
    Group,
    Ties,
    NoOthers,
}

/// A SQL type name with optional modifiers and array suffix.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeName {
    pub name: QualifiedName,
    /// `varchar(20)`, `numeric(10, 2)`.
    pub modifiers: Vec<Expr>,
    /// `int[]`
    pub array: bool,
}

impl TypeName {
    pub fn simple(name: impl Into<SmolStr>) -> Self {
        Self {
            name: QualifiedName::bare(name),
            modifiers: Vec::new(),
            array: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CastExpr {
    pub operand: Box<Expr>,
    pub ty: TypeName,
    /// Written as `expr::type` rather than `CAST(expr AS type)`.
    pub postfix: bool,
    pub comments: CommentSet,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaseExpr {
    /// Present for the simple form `CASE operand WHEN …`.
    pub operand: Option<Box<Expr>>,
    pub branches: Vec<WhenBranch>,
    pub else_value: Option<Box<Expr>>,
    pub comments: CommentSet,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhenBranch {
    pub condition: Expr,
    pub result: Expr,
    pub comments: CommentSet,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TupleExpr {
    pub items: Vec<Expr>,
    /// Written with the ROW keyword.
    pub row: bool,
    pub comments: CommentSet,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayExpr {
    pub items: Vec<Expr>,
    pub comments: CommentSet,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayQueryExpr {
    pub query: Box<Query>,
    pub comments: CommentSet,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptExpr {
    pub operand: Box<Expr>,
    pub index: Subscript,
    pub comments: CommentSet,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Subscript {
    Index(Box<Expr>),
    Slice {
        lower: Option<Box<Expr>>,
        upper: Option<Box<Expr>>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubqueryExpr {
    pub query: Box<Query>,
    pub comments: CommentSet,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParenExpr {
    pub inner: Box<Expr>,
    pub comments: CommentSet,
}

/// A string literal with a type-specifier prefix: `DATE '2024-01-01'`,
/// `INTERVAL '1 day'`.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedStringExpr {
    pub ty: TypeName,
    pub value: SmolStr,
    pub comments: CommentSet,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CollateExpr {
    pub operand: Box<Expr>,
    pub collation: QualifiedName,
    pub comments: CommentSet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NullsOrder {
    First,
    Last,
}

/// One element of an ORDER BY list.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderExpr {
    pub expr: Expr,
    pub direction: Option<OrderDirection>,
    pub nulls: Option<NullsOrder>,
    pub comments: CommentSet,
}

impl OrderExpr {
    pub fn new(expr: Expr) -> Self {
        Self {
            expr,
            direction: None,
            nulls: None,
            comments: CommentSet::new(),
        }
    }
}
