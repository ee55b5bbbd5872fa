//! Value-expression grammar: precedence climbing.

use crate::ast::{
    ArrayExpr, ArrayQueryExpr, BetweenExpr, BinaryExpr, BinaryOp, CaseExpr, CastExpr, CollateExpr,
    ColumnRef, CommentSet, Expr, ExistsExpr, FrameBound, FrameExclusion, FrameUnits, FunctionCall,
    Ident, InListExpr, InQueryExpr, Literal, LiteralValue, Over, ParamExpr, ParenExpr,
    QualifiedName, Subscript, SubscriptExpr, SubqueryExpr, TupleExpr, TypeName, TypedStringExpr,
    UnaryExpr, UnaryOp, WhenBranch, WindowFrame, WindowSpec,
};
use crate::error::Result;
use crate::lexer::{Keyword, LexemeKind, Op, Punct};

use super::Parser;

// Binding powers, lowest first. Left-associative operators parse their right
// side at `bp + 1`; the right-associative exponent parses at `bp`.
const BP_OR: u8 = 10;
const BP_AND: u8 = 20;
const BP_NOT: u8 = 25;
const BP_COMPARISON: u8 = 30;
const BP_OTHER: u8 = 40;
const BP_ADDITIVE: u8 = 50;
const BP_MULTIPLICATIVE: u8 = 60;
const BP_UNARY_SIGN: u8 = 70;
const BP_EXPONENT: u8 = 80;
const BP_CAST: u8 = 90;
const BP_COLLATE: u8 = 95;

impl<'a> Parser<'a> {
    pub(crate) fn parse_expr(&mut self) -> Result<Expr> {
        self.parse_expr_bp(0)
    }

    /// Expressions that must not swallow a bare AND (BETWEEN bounds).
    fn parse_between_bound(&mut self) -> Result<Expr> {
        self.parse_expr_bp(BP_OTHER)
    }

    pub(crate) fn parse_expr_bp(&mut self, min_bp: u8) -> Result<Expr> {
        let mut lhs = self.parse_prefix()?;

        loop {
            // Postfix operators.
            if self.at_op(Op::DoubleColon) && BP_CAST >= min_bp {
                self.bump();
                let ty = self.parse_type_name()?;
                lhs = Expr::Cast(CastExpr {
                    operand: Box::new(lhs),
                    ty,
                    postfix: true,
                    comments: CommentSet::new(),
                });
                continue;
            }
            if self.at_keyword(Keyword::COLLATE) && BP_COLLATE >= min_bp {
                self.bump();
                let collation = self.parse_qualified_name()?;
                lhs = Expr::Collate(CollateExpr {
                    operand: Box::new(lhs),
                    collation,
                    comments: CommentSet::new(),
                });
                continue;
            }
            if self.at_punct(Punct::LBracket) {
                lhs = self.parse_subscript(lhs)?;
                continue;
            }

            // Keyword-operator tails.
            if let Some(expr) = self.parse_keyword_tail(&lhs, min_bp)? {
                lhs = expr;
                continue;
            }

            // Symbol operators.
            let Some((op, bp)) = self.peek_binary_op() else {
                break;
            };
            if bp < min_bp {
                break;
            }
            self.bump();
            let right_bp = if op == BinaryOp::Exponent { bp } else { bp + 1 };
            let rhs = self.parse_expr_bp(right_bp)?;
            lhs = Expr::Binary(BinaryExpr {
                left: Box::new(lhs),
                op,
                right: Box::new(rhs),
                comments: CommentSet::new(),
            });
        }

        Ok(lhs)
    }

    fn peek_binary_op(&self) -> Option<(BinaryOp, u8)> {
        let lexeme = self.current()?;
        let entry = match &lexeme.kind {
            LexemeKind::Keyword(Keyword::OR) => (BinaryOp::Or, BP_OR),
            LexemeKind::Keyword(Keyword::AND) => (BinaryOp::And, BP_AND),
            LexemeKind::Op(op) => match op {
                Op::Eq => (BinaryOp::Eq, BP_COMPARISON),
                Op::Neq => (BinaryOp::NotEq, BP_COMPARISON),
                Op::Lt => (BinaryOp::Lt, BP_COMPARISON),
                Op::LtEq => (BinaryOp::LtEq, BP_COMPARISON),
                Op::Gt => (BinaryOp::Gt, BP_COMPARISON),
                Op::GtEq => (BinaryOp::GtEq, BP_COMPARISON),
                Op::Concat => (BinaryOp::Concat, BP_OTHER),
                Op::Arrow => (BinaryOp::JsonGet, BP_OTHER),
                Op::ArrowText => (BinaryOp::JsonGetText, BP_OTHER),
                Op::HashArrow => (BinaryOp::JsonGetPath, BP_OTHER),
                Op::HashArrowText => (BinaryOp::JsonGetPathText, BP_OTHER),
                Op::AtGt => (BinaryOp::JsonContains, BP_OTHER),
                Op::LtAt => (BinaryOp::JsonContainedIn, BP_OTHER),
                Op::Question => (BinaryOp::JsonExists, BP_OTHER),
                Op::QuestionPipe => (BinaryOp::JsonExistsAny, BP_OTHER),
                Op::QuestionAmp => (BinaryOp::JsonExistsAll, BP_OTHER),
                Op::Plus => (BinaryOp::Add, BP_ADDITIVE),
                Op::Minus => (BinaryOp::Subtract, BP_ADDITIVE),
                Op::Star => (BinaryOp::Multiply, BP_MULTIPLICATIVE),
                Op::Slash => (BinaryOp::Divide, BP_MULTIPLICATIVE),
                Op::Percent => (BinaryOp::Modulo, BP_MULTIPLICATIVE),
                Op::Caret => (BinaryOp::Exponent, BP_EXPONENT),
                _ => return None,
            },
            _ => return None,
        };
        Some(entry)
    }

    /// IS / IN / BETWEEN / LIKE and their negated forms.
    fn parse_keyword_tail(&mut self, lhs: &Expr, min_bp: u8) -> Result<Option<Expr>> {
        if BP_COMPARISON < min_bp {
            return Ok(None);
        }

        // `NOT` as an infix prefix of IN/BETWEEN/LIKE/ILIKE/SIMILAR.
        let negated = self.at_keyword(Keyword::NOT)
            && self.peek(1).and_then(|l| l.keyword()).is_some_and(|k| {
                matches!(
                    k,
                    Keyword::IN
                        | Keyword::BETWEEN
                        | Keyword::LIKE
                        | Keyword::ILIKE
                        | Keyword::SIMILAR
                )
            });
        let offset = usize::from(negated);

        let Some(kw) = self.peek(offset).and_then(|l| l.keyword()) else {
            return Ok(None);
        };

        match kw {
            Keyword::IS => {
                self.bump();
                let negated = self.eat_keyword(Keyword::NOT);
                if self.eat_keyword(Keyword::DISTINCT) {
                    self.expect_keyword(Keyword::FROM)?;
                    let rhs = self.parse_expr_bp(BP_COMPARISON + 1)?;
                    let op = if negated {
                        BinaryOp::IsNotDistinctFrom
                    } else {
                        BinaryOp::IsDistinctFrom
                    };
                    return Ok(Some(Expr::binary(lhs.clone(), op, rhs)));
                }
                let rhs = self.parse_expr_bp(BP_COMPARISON + 1)?;
                let op = if negated { BinaryOp::IsNot } else { BinaryOp::Is };
                Ok(Some(Expr::binary(lhs.clone(), op, rhs)))
            }
            Keyword::IN => {
                if negated {
                    self.bump();
                }
                self.bump();
                self.expect_punct(Punct::LParen)?;
                if self.at_query_start() {
                    let query = self.parse_query()?;
                    self.expect_punct(Punct::RParen)?;
                    return Ok(Some(Expr::InQuery(InQueryExpr {
                        operand: Box::new(lhs.clone()),
                        negated,
                        query: Box::new(query),
                        comments: CommentSet::new(),
                    })));
                }
                let items = self.parse_expr_list()?;
                self.expect_punct(Punct::RParen)?;
                Ok(Some(Expr::InList(InListExpr {
                    operand: Box::new(lhs.clone()),
                    negated,
                    items,
                    comments: CommentSet::new(),
                })))
            }
            Keyword::BETWEEN => {
                if negated {
                    self.bump();
                }
                self.bump();
                let symmetric = self.eat_keyword(Keyword::SYMMETRIC);
                let low = self.parse_between_bound()?;
                self.expect_keyword(Keyword::AND)?;
                let high = self.parse_between_bound()?;
                Ok(Some(Expr::Between(BetweenExpr {
                    operand: Box::new(lhs.clone()),
                    negated,
                    symmetric,
                    low: Box::new(low),
                    high: Box::new(high),
                    comments: CommentSet::new(),
                })))
            }
            Keyword::LIKE | Keyword::ILIKE => {
                if negated {
                    self.bump();
                }
                self.bump();
                let rhs = self.parse_expr_bp(BP_COMPARISON + 1)?;
                let op = match (kw, negated) {
                    (Keyword::LIKE, false) => BinaryOp::Like,
                    (Keyword::LIKE, true) => BinaryOp::NotLike,
                    (_, false) => BinaryOp::ILike,
                    (_, true) => BinaryOp::NotILike,
                };
                Ok(Some(Expr::binary(lhs.clone(), op, rhs)))
            }
            Keyword::SIMILAR => {
                if negated {
                    self.bump();
                }
                self.bump();
                self.expect_keyword(Keyword::TO)?;
                let rhs = self.parse_expr_bp(BP_COMPARISON + 1)?;
                let op = if negated {
                    BinaryOp::NotSimilarTo
                } else {
                    BinaryOp::SimilarTo
                };
                Ok(Some(Expr::binary(lhs.clone(), op, rhs)))
            }
            _ => Ok(None),
        }
    }

    fn parse_prefix(&mut self) -> Result<Expr> {
        if self.at_keyword(Keyword::NOT) {
            // Not followed by IN/BETWEEN/... is an infix tail, handled above.
            let infix = self.peek(1).and_then(|l| l.keyword()).is_some_and(|k| {
                matches!(
                    k,
                    Keyword::IN
                        | Keyword::BETWEEN
                        | Keyword::LIKE
                        | Keyword::ILIKE
                        | Keyword::SIMILAR
                )
            });
            if !infix {
                self.bump();
                let operand = self.parse_expr_bp(BP_NOT)?;
                return Ok(Expr::Unary(UnaryExpr {
                    op: UnaryOp::Not,
                    operand: Box::new(operand),
                    comments: CommentSet::new(),
                }));
            }
        }
        if self.at_op(Op::Minus) || self.at_op(Op::Plus) {
            let op = if self.at_op(Op::Minus) {
                UnaryOp::Minus
            } else {
                UnaryOp::Plus
            };
            self.bump();
            let operand = self.parse_expr_bp(BP_UNARY_SIGN)?;
            return Ok(Expr::Unary(UnaryExpr {
                op,
                operand: Box::new(operand),
                comments: CommentSet::new(),
            }));
        }
        self.parse_atom()
    }

    fn parse_atom(&mut self) -> Result<Expr> {
        let leading = self.take_leading();
        let mut expr = self.parse_atom_inner()?;
        if !leading.is_empty() {
            expr.comments_mut().before = leading;
        }
        let trailing = self.take_trailing();
        if !trailing.is_empty() {
            expr.comments_mut().after = trailing;
        }
        Ok(expr)
    }

    fn parse_atom_inner(&mut self) -> Result<Expr> {
        let Some(lexeme) = self.current() else {
            return Err(self.unexpected(&["an expression"]).into());
        };

        match &lexeme.kind {
            LexemeKind::Number => {
                let text = self.bump().text.clone();
                Ok(Expr::Literal(Literal {
                    value: LiteralValue::Number(text),
                    comments: CommentSet::new(),
                }))
            }
            LexemeKind::String(_) => {
                let text = self.bump().text.clone();
                Ok(Expr::Literal(Literal {
                    value: LiteralValue::String(text),
                    comments: CommentSet::new(),
                }))
            }
            LexemeKind::Bool => {
                let value = self.bump().raw.eq_ignore_ascii_case("true");
                Ok(Expr::Literal(Literal {
                    value: LiteralValue::Bool(value),
                    comments: CommentSet::new(),
                }))
            }
            LexemeKind::Null => {
                self.bump();
                Ok(Expr::null())
            }
            LexemeKind::Param { index } => {
                let index = *index;
                let lexeme = self.bump();
                Ok(Expr::Param(ParamExpr {
                    name: lexeme.text.clone(),
                    index,
                    value: None,
                    comments: CommentSet::new(),
                }))
            }
            LexemeKind::Keyword(Keyword::CASE) => self.parse_case(),
            LexemeKind::Keyword(Keyword::CAST) => self.parse_cast(),
            LexemeKind::Keyword(Keyword::EXISTS) => {
                self.bump();
                self.expect_punct(Punct::LParen)?;
                let query = self.parse_query()?;
                self.expect_punct(Punct::RParen)?;
                Ok(Expr::Exists(ExistsExpr {
                    negated: false,
                    query: Box::new(query),
                    comments: CommentSet::new(),
                }))
            }
            LexemeKind::Keyword(Keyword::ARRAY) => self.parse_array(),
            LexemeKind::Keyword(Keyword::ROW)
                if self.peek(1).is_some_and(|l| l.is_punct(Punct::LParen)) =>
            {
                self.bump();
                self.expect_punct(Punct::LParen)?;
                let items = self.parse_expr_list()?;
                self.expect_punct(Punct::RParen)?;
                Ok(Expr::Tuple(TupleExpr {
                    items,
                    row: true,
                    comments: CommentSet::new(),
                }))
            }
            LexemeKind::Punct(Punct::LParen) => self.parse_paren_expr(),
            _ => self.parse_name_expr(),
        }
    }

    /// `(` subquery | parenthesized expression | tuple `)`.
    fn parse_paren_expr(&mut self) -> Result<Expr> {
        self.expect_punct(Punct::LParen)?;
        if self.at_query_start() {
            let query = self.parse_query()?;
            self.expect_punct(Punct::RParen)?;
            return Ok(Expr::Subquery(SubqueryExpr {
                query: Box::new(query),
                comments: CommentSet::new(),
            }));
        }
        let first = self.parse_expr()?;
        if self.eat_punct(Punct::Comma) {
            let mut items = vec![first];
            loop {
                items.push(self.parse_expr()?);
                if !self.eat_punct(Punct::Comma) {
                    break;
                }
            }
            self.expect_punct(Punct::RParen)?;
            return Ok(Expr::Tuple(TupleExpr {
                items,
                row: false,
                comments: CommentSet::new(),
            }));
        }
        self.expect_punct(Punct::RParen)?;
        Ok(Expr::Paren(ParenExpr {
            inner: Box::new(first),
            comments: CommentSet::new(),
        }))
    }

    fn parse_case(&mut self) -> Result<Expr> {
        self.expect_keyword(Keyword::CASE)?;
        let operand = if self.at_keyword(Keyword::WHEN) {
            None
        } else {
            Some(Box::new(self.parse_expr()?))
        };
        let mut branches = Vec::new();
        while self.eat_keyword(Keyword::WHEN) {
            let condition = self.parse_expr()?;
            self.expect_keyword(Keyword::THEN)?;
            let result = self.parse_expr()?;
            branches.push(WhenBranch {
                condition,
                result,
                comments: CommentSet::new(),
            });
        }
        if branches.is_empty() {
            return Err(self.unexpected(&["WHEN"]).into());
        }
        let else_value = if self.eat_keyword(Keyword::ELSE) {
            Some(Box::new(self.parse_expr()?))
        } else {
            None
        };
        self.expect_keyword(Keyword::END)?;
        Ok(Expr::Case(CaseExpr {
            operand,
            branches,
            else_value,
            comments: CommentSet::new(),
        }))
    }

    fn parse_cast(&mut self) -> Result<Expr> {
        self.expect_keyword(Keyword::CAST)?;
        self.expect_punct(Punct::LParen)?;
        let operand = self.parse_expr()?;
        self.expect_keyword(Keyword::AS)?;
        let ty = self.parse_type_name()?;
        self.expect_punct(Punct::RParen)?;
        Ok(Expr::Cast(CastExpr {
            operand: Box::new(operand),
            ty,
            postfix: false,
            comments: CommentSet::new(),
        }))
    }

    /// `ARRAY[…]` literal or `ARRAY(SELECT …)` query form.
    fn parse_array(&mut self) -> Result<Expr> {
        self.expect_keyword(Keyword::ARRAY)?;
        if self.eat_punct(Punct::LParen) {
            let query = self.parse_query()?;
            self.expect_punct(Punct::RParen)?;
            return Ok(Expr::ArrayQuery(ArrayQueryExpr {
                query: Box::new(query),
                comments: CommentSet::new(),
            }));
        }
        self.expect_punct(Punct::LBracket)?;
        let items = if self.at_punct(Punct::RBracket) {
            Vec::new()
        } else {
            self.parse_expr_list()?
        };
        self.expect_punct(Punct::RBracket)?;
        Ok(Expr::Array(ArrayExpr {
            items,
            comments: CommentSet::new(),
        }))
    }

    /// Identifier-led atoms: column references, function calls, and typed
    /// string literals (`DATE '2024-01-01'`).
    fn parse_name_expr(&mut self) -> Result<Expr> {
        let Some(lexeme) = self.current() else {
            return Err(self.unexpected(&["an expression"]).into());
        };
        if lexeme.as_ident().is_none() {
            return Err(self.unexpected(&["an expression"]).into());
        }

        // Typed string: a single bare identifier immediately followed by a
        // string literal.
        let next = self.peek(1);
        if lexeme.kind == LexemeKind::Ident
            && next.is_some_and(|l| matches!(l.kind, LexemeKind::String(_)))
        {
            let ty = TypeName::simple(self.bump().text.clone());
            let value = self.bump().text.clone();
            return Ok(Expr::TypedString(TypedStringExpr {
                ty,
                value,
                comments: CommentSet::new(),
            }));
        }

        let name = self.parse_qualified_name()?;
        if self.at_punct(Punct::LParen) {
            return self.parse_function_call(name);
        }
        Ok(Expr::Column(ColumnRef {
            name,
            comments: CommentSet::new(),
        }))
    }

    pub(crate) fn parse_function_call(&mut self, name: QualifiedName) -> Result<Expr> {
        self.expect_punct(Punct::LParen)?;
        let mut call = FunctionCall {
            name,
            args: Vec::new(),
            star: false,
            distinct: false,
            order_by: Vec::new(),
            filter: None,
            over: None,
            comments: CommentSet::new(),
        };

        if self.at_op(Op::Star) && self.peek(1).is_some_and(|l| l.is_punct(Punct::RParen)) {
            self.bump();
            call.star = true;
        } else if !self.at_punct(Punct::RParen) {
            call.distinct = self.eat_keyword(Keyword::DISTINCT);
            call.args = self.parse_expr_list()?;
            if self.at_keyword(Keyword::ORDER) {
                call.order_by = self.parse_order_expr_list()?;
            }
        }
        self.expect_punct(Punct::RParen)?;

        if self.at_keyword(Keyword::FILTER) {
            self.bump();
            self.expect_punct(Punct::LParen)?;
            self.expect_keyword(Keyword::WHERE)?;
            call.filter = Some(Box::new(self.parse_expr()?));
            self.expect_punct(Punct::RParen)?;
        }

        if self.eat_keyword(Keyword::OVER) {
            if self.at_punct(Punct::LParen) {
                call.over = Some(Over::Spec(self.parse_window_spec()?));
            } else {
                let window = self.parse_ident()?;
                call.over = Some(Over::Named(window));
            }
        }

        Ok(Expr::Function(call))
    }

    pub(crate) fn parse_window_spec(&mut self) -> Result<WindowSpec> {
        self.expect_punct(Punct::LParen)?;
        let mut spec = WindowSpec::default();

        // A leading identifier that is not a clause keyword names the base
        // window the spec refines.
        if self
            .current()
            .is_some_and(|l| l.as_ident().is_some() && l.keyword().is_none())
        {
            spec.base = Some(self.parse_ident()?);
        }

        if self.at_keyword(Keyword::PARTITION) {
            self.bump();
            self.expect_keyword(Keyword::BY)?;
            spec.partition_by = self.parse_expr_list()?;
        }
        if self.at_keyword(Keyword::ORDER) {
            spec.order_by = self.parse_order_expr_list()?;
        }
        if self.at_any_keyword(&[Keyword::ROWS, Keyword::RANGE, Keyword::GROUPS]) {
            spec.frame = Some(self.parse_window_frame()?);
        }
        self.expect_punct(Punct::RParen)?;
        Ok(spec)
    }

    fn parse_window_frame(&mut self) -> Result<WindowFrame> {
        let units = match self.bump().keyword() {
            Some(Keyword::ROWS) => FrameUnits::Rows,
            Some(Keyword::RANGE) => FrameUnits::Range,
            _ => FrameUnits::Groups,
        };

        let (start, end) = if self.eat_keyword(Keyword::BETWEEN) {
            let start = self.parse_frame_bound()?;
            self.expect_keyword(Keyword::AND)?;
            let end = self.parse_frame_bound()?;
            (start, Some(end))
        } else {
            (self.parse_frame_bound()?, None)
        };

        let exclusion = if self.eat_keyword(Keyword::EXCLUDE) {
            Some(if self.eat_keyword(Keyword::CURRENT) {
                self.expect_keyword(Keyword::ROW)?;
                FrameExclusion::CurrentRow
            } else if self.eat_keyword(Keyword::GROUP) {
                FrameExclusion::Group
            } else if self.eat_keyword(Keyword::TIES) {
                FrameExclusion::Ties
            } else {
                self.expect_keyword(Keyword::NO)?;
                self.expect_keyword(Keyword::OTHERS)?;
                FrameExclusion::NoOthers
            })
        } else {
            None
        };

        Ok(WindowFrame {
            units,
            start,
            end,
            exclusion,
        })
    }

    fn parse_frame_bound(&mut self) -> Result<FrameBound> {
        if self.eat_keyword(Keyword::UNBOUNDED) {
            if self.eat_keyword(Keyword::PRECEDING) {
                return Ok(FrameBound::UnboundedPreceding);
            }
            self.expect_keyword(Keyword::FOLLOWING)?;
            return Ok(FrameBound::UnboundedFollowing);
        }
        if self.eat_keyword(Keyword::CURRENT) {
            self.expect_keyword(Keyword::ROW)?;
            return Ok(FrameBound::CurrentRow);
        }
        let offset = self.parse_expr()?;
        if self.eat_keyword(Keyword::PRECEDING) {
            Ok(FrameBound::Preceding(Box::new(offset)))
        } else {
            self.expect_keyword(Keyword::FOLLOWING)?;
            Ok(FrameBound::Following(Box::new(offset)))
        }
    }

    /// `operand[index]` and `operand[lower:upper]` slices.
    fn parse_subscript(&mut self, operand: Expr) -> Result<Expr> {
        self.expect_punct(Punct::LBracket)?;

        let lower = if self.at_punct(Punct::Colon) || self.at_colon_param() {
            None
        } else {
            Some(Box::new(self.parse_expr()?))
        };

        let index = if self.at_punct(Punct::Colon) || self.at_colon_param() {
            // `:upper` may have lexed as a named parameter; reinterpret.
            let upper = if self.at_colon_param() {
                let lexeme = self.bump();
                Some(Box::new(Expr::bare_column(lexeme.text.clone())))
            } else {
                self.bump();
                if self.at_punct(Punct::RBracket) {
                    None
                } else {
                    Some(Box::new(self.parse_expr()?))
                }
            };
            Subscript::Slice { lower, upper }
        } else {
            Subscript::Index(lower.expect("index expression"))
        };

        self.expect_punct(Punct::RBracket)?;
        Ok(Expr::Subscript(SubscriptExpr {
            operand: Box::new(operand),
            index,
            comments: CommentSet::new(),
        }))
    }

    /// A named parameter whose raw text begins with `:`; inside brackets it
    /// is really a slice separator plus an identifier.
    fn at_colon_param(&self) -> bool {
        self.current().is_some_and(|l| {
            matches!(l.kind, LexemeKind::Param { .. }) && l.raw.starts_with(':')
        })
    }

    // -----------------------------------------------------------------
    // Shared pieces
    // -----------------------------------------------------------------

    pub(crate) fn parse_expr_list(&mut self) -> Result<Vec<Expr>> {
        let mut items = vec![self.parse_expr()?];
        while self.eat_punct(Punct::Comma) {
            items.push(self.parse_expr()?);
        }
        Ok(items)
    }

    pub(crate) fn parse_ident(&mut self) -> Result<Ident> {
        let Some(lexeme) = self.current() else {
            return Err(self.unexpected(&["an identifier"]).into());
        };
        let Some(text) = lexeme.as_ident() else {
            return Err(self.unexpected(&["an identifier"]).into());
        };
        let ident = Ident {
            text: text.into(),
            quoted: lexeme.kind == LexemeKind::QuotedIdent,
            span: Some(lexeme.span),
        };
        self.bump();
        Ok(ident)
    }

    pub(crate) fn parse_qualified_name(&mut self) -> Result<QualifiedName> {
        let mut parts = vec![self.parse_ident()?];
        while self.at_punct(Punct::Dot) {
            // `t.*` is handled by the select-item grammar; stop before it.
            if self.peek(1).is_some_and(|l| l.is_op(Op::Star)) {
                break;
            }
            self.bump();
            parts.push(self.parse_ident()?);
        }
        Ok(QualifiedName::new(parts))
    }

    pub(crate) fn parse_type_name(&mut self) -> Result<TypeName> {
        let name = self.parse_qualified_name()?;
        let mut modifiers = Vec::new();
        if self.eat_punct(Punct::LParen) {
            modifiers = self.parse_expr_list()?;
            self.expect_punct(Punct::RParen)?;
        }
        let mut array = false;
        if self.at_punct(Punct::LBracket)
            && self.peek(1).is_some_and(|l| l.is_punct(Punct::RBracket))
        {
            self.bump();
            self.bump();
            array = true;
        }
        Ok(TypeName {
            name,
            modifiers,
            array,
        })
    }

    /// True when the current lexeme can begin a row-yielding query.
    pub(crate) fn at_query_start(&self) -> bool {
        match self.current() {
            Some(lexeme) => {
                matches!(
                    lexeme.keyword(),
                    Some(Keyword::SELECT) | Some(Keyword::WITH) | Some(Keyword::VALUES)
                ) || (lexeme.is_punct(Punct::LParen) && self.query_start_after_parens())
            }
            None => false,
        }
    }

    /// Look past any run of opening parentheses for a query keyword.
    fn query_start_after_parens(&self) -> bool {
        let mut n = 0;
        while self.peek(n).is_some_and(|l| l.is_punct(Punct::LParen)) {
            n += 1;
        }
        self.peek(n).and_then(|l| l.keyword()).is_some_and(|k| {
            matches!(k, Keyword::SELECT | Keyword::WITH | Keyword::VALUES)
        })
    }
}
