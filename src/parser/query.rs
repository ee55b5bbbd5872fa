//! Query grammar: SELECT cores, set operations, WITH, and trailing clauses.

use crate::ast::{
    BinaryQuery, CommentSet, CommonTable, Distinct, Expr, ExprItem, FetchClause, GroupByClause,
    HavingClause, LimitClause, LockMode, LockWait, LockingClause, NamedWindow, NullsOrder,
    OffsetClause, OrderByClause, OrderDirection, OrderExpr, Query, SelectClause, SelectItem,
    SelectQuery, SetOp, SetOpKind, ValuesQuery, WhereClause, WildcardItem, WindowClause,
    WithClause,
};
use crate::error::{ParseErrorKind, Result};
use crate::lexer::{Keyword, Op, Punct};

use super::Parser;

impl<'a> Parser<'a> {
    /// A full query expression: optional WITH, set-operation chain, trailing
    /// ORDER BY / LIMIT / OFFSET / FETCH / locking clauses.
    pub(crate) fn parse_query(&mut self) -> Result<Query> {
        let start = self.pos;
        let with = if self.at_keyword(Keyword::WITH) {
            Some(self.parse_with_clause()?)
        } else {
            None
        };

        let mut query = self.parse_set_expr()?;

        // Trailing clauses belong to the outermost query expression.
        let order_by = if self.at_keyword(Keyword::ORDER) {
            Some(self.parse_order_by_clause()?)
        } else {
            None
        };
        let limit = if self.at_keyword(Keyword::LIMIT) {
            Some(self.parse_limit_clause()?)
        } else {
            None
        };
        let offset = if self.at_keyword(Keyword::OFFSET) {
            Some(self.parse_offset_clause()?)
        } else {
            None
        };
        let fetch = if self.at_keyword(Keyword::FETCH) {
            Some(self.parse_fetch_clause()?)
        } else {
            None
        };
        let mut locking = Vec::new();
        while self.at_keyword(Keyword::FOR) {
            locking.push(self.parse_locking_clause()?);
        }

        match &mut query {
            Query::Select(select) => {
                if select.order_by.is_none() {
                    select.order_by = order_by;
                } else if order_by.is_some() {
                    return Err(self
                        .error_at(
                            ParseErrorKind::UnexpectedToken,
                            "duplicate ORDER BY clause",
                            self.error_position(),
                        )
                        .into());
                }
                select.limit = select.limit.take().or(limit);
                select.offset = select.offset.take().or(offset);
                select.fetch = select.fetch.take().or(fetch);
                select.locking.extend(locking);
            }
            Query::Binary(binary) => {
                binary.order_by = order_by;
                binary.limit = limit;
                binary.offset = offset;
                binary.fetch = fetch;
            }
            Query::Values(_) => {
                if order_by.is_some() || limit.is_some() || offset.is_some() || fetch.is_some() {
                    return Err(self
                        .error_at(
                            ParseErrorKind::UnexpectedToken,
                            "trailing clauses are not supported after a bare VALUES list",
                            self.error_position(),
                        )
                        .into());
                }
            }
        }

        if let Some(with) = with {
            query.set_with(Some(with));
        }

        let span = self.span_from(start);
        match &mut query {
            Query::Select(q) => q.span = span,
            Query::Binary(q) => q.span = span,
            Query::Values(q) => q.span = span,
        }
        Ok(query)
    }

    /// UNION / INTERSECT / EXCEPT chain, left-associative.
    fn parse_set_expr(&mut self) -> Result<Query> {
        let start = self.pos;
        let mut left = self.parse_query_primary()?;

        loop {
            let kind = match self.current().and_then(|l| l.keyword()) {
                Some(Keyword::UNION) => SetOpKind::Union,
                Some(Keyword::INTERSECT) => SetOpKind::Intersect,
                Some(Keyword::EXCEPT) => SetOpKind::Except,
                _ => break,
            };
            self.bump();
            let all = self.eat_keyword(Keyword::ALL);
            if !all {
                self.eat_keyword(Keyword::DISTINCT);
            }
            let right = self.parse_query_primary()?;
            let span = self.span_from(start);
            left = Query::Binary(BinaryQuery {
                with: None,
                left: Box::new(left),
                op: SetOp { kind, all },
                right: Box::new(right),
                order_by: None,
                limit: None,
                offset: None,
                fetch: None,
                span,
                comments: CommentSet::new(),
            });
        }

        Ok(left)
    }

    /// One arm of a set-operation chain: a SELECT core, a VALUES list, or a
    /// parenthesized query.
    fn parse_query_primary(&mut self) -> Result<Query> {
        if self.at_punct(Punct::LParen) {
            self.bump();
            let query = self.parse_query()?;
            self.expect_punct(Punct::RParen)?;
            return Ok(query);
        }
        if self.at_keyword(Keyword::VALUES) {
            return self.parse_values();
        }
        // A nested WITH inside one arm.
        if self.at_keyword(Keyword::WITH) {
            let with = self.parse_with_clause()?;
            let mut query = self.parse_query_primary()?;
            query.set_with(Some(with));
            return Ok(query);
        }
        Ok(Query::Select(self.parse_select_core()?))
    }

    /// The SELECT core: select list through HAVING/WINDOW, no trailing
    /// clauses (those attach at the query-expression level).
    fn parse_select_core(&mut self) -> Result<SelectQuery> {
        let start = self.pos;
        let mut query = SelectQuery {
            comments: CommentSet {
                before: self.take_leading(),
                after: Vec::new(),
            },
            ..SelectQuery::default()
        };

        self.expect_keyword(Keyword::SELECT)?;
        query.select = self.parse_select_clause()?;

        if self.eat_keyword(Keyword::FROM) {
            query.from = Some(self.parse_from_clause()?);
        }
        if self.eat_keyword(Keyword::WHERE) {
            query.where_clause = Some(WhereClause {
                condition: self.parse_expr()?,
                comments: CommentSet::new(),
            });
        }
        if self.at_keyword(Keyword::GROUP) {
            self.bump();
            self.expect_keyword(Keyword::BY)?;
            query.group_by = Some(GroupByClause {
                items: self.parse_expr_list()?,
                comments: CommentSet::new(),
            });
        }
        if self.eat_keyword(Keyword::HAVING) {
            query.having = Some(HavingClause {
                condition: self.parse_expr()?,
                comments: CommentSet::new(),
            });
        }
        if self.at_keyword(Keyword::WINDOW) {
            query.window = Some(self.parse_window_clause()?);
        }
        query.span = self.span_from(start);
        Ok(query)
    }

    fn parse_select_clause(&mut self) -> Result<SelectClause> {
        let mut clause = SelectClause::default();

        if self.eat_keyword(Keyword::ALL) {
            clause.distinct = Some(Distinct::All);
        } else if self.eat_keyword(Keyword::DISTINCT) {
            if self.eat_keyword(Keyword::ON) {
                self.expect_punct(Punct::LParen)?;
                let exprs = self.parse_expr_list()?;
                self.expect_punct(Punct::RParen)?;
                clause.distinct = Some(Distinct::DistinctOn(exprs));
            } else {
                clause.distinct = Some(Distinct::Distinct);
            }
        }

        clause.items.push(self.parse_select_item()?);
        while self.eat_punct(Punct::Comma) {
            clause.items.push(self.parse_select_item()?);
        }
        Ok(clause)
    }

    fn parse_select_item(&mut self) -> Result<SelectItem> {
        let leading = self.take_leading();

        // `*`
        if self.at_op(Op::Star) {
            self.bump();
            return Ok(SelectItem::Wildcard(WildcardItem {
                qualifier: None,
                comments: CommentSet {
                    before: leading,
                    after: self.take_trailing(),
                },
            }));
        }

        // `t.*`: a qualified name whose trailing `.*` the name parser
        // deliberately leaves unconsumed.
        if self.current().is_some_and(|l| l.as_ident().is_some()) {
            let checkpoint = self.pos;
            if let Ok(name) = self.parse_qualified_name()
                && self.at_punct(Punct::Dot)
                && self.peek(1).is_some_and(|l| l.is_op(Op::Star))
            {
                self.bump();
                self.bump();
                return Ok(SelectItem::Wildcard(WildcardItem {
                    qualifier: Some(name),
                    comments: CommentSet {
                        before: leading,
                        after: self.take_trailing(),
                    },
                }));
            }
            self.pos = checkpoint;
        }

        let expr = self.parse_expr()?;
        let alias = self.parse_optional_alias()?;
        Ok(SelectItem::Expr(ExprItem {
            expr,
            alias,
            comments: CommentSet {
                before: leading,
                after: self.take_trailing(),
            },
        }))
    }

    /// `[AS] alias`, where an implicit alias must not be a clause keyword.
    pub(crate) fn parse_optional_alias(&mut self) -> Result<Option<crate::ast::Ident>> {
        if self.eat_keyword(Keyword::AS) {
            return Ok(Some(self.parse_ident()?));
        }
        let Some(lexeme) = self.current() else {
            return Ok(None);
        };
        if lexeme.as_ident().is_some() {
            if let Some(kw) = lexeme.keyword()
                && kw.stops_alias()
            {
                return Ok(None);
            }
            return Ok(Some(self.parse_ident()?));
        }
        Ok(None)
    }

    fn parse_values(&mut self) -> Result<Query> {
        let start = self.pos;
        self.expect_keyword(Keyword::VALUES)?;
        let mut rows = vec![self.parse_values_row()?];
        while self.eat_punct(Punct::Comma) {
            rows.push(self.parse_values_row()?);
        }
        Ok(Query::Values(ValuesQuery {
            with: None,
            rows,
            span: self.span_from(start),
            comments: CommentSet::new(),
        }))
    }

    pub(crate) fn parse_values_row(&mut self) -> Result<Vec<Expr>> {
        self.expect_punct(Punct::LParen)?;
        let row = self.parse_expr_list()?;
        self.expect_punct(Punct::RParen)?;
        Ok(row)
    }

    // -----------------------------------------------------------------
    // WITH
    // -----------------------------------------------------------------

    pub(crate) fn parse_with_clause(&mut self) -> Result<WithClause> {
        let comments = CommentSet {
            before: self.take_leading(),
            after: Vec::new(),
        };
        self.expect_keyword(Keyword::WITH)?;
        let mut with = WithClause::new(self.eat_keyword(Keyword::RECURSIVE));
        with.comments = comments;

        loop {
            let table = self.parse_common_table()?;
            let position = table.name.span.map(|s| s.start).unwrap_or_else(|| self.error_position());
            with.push(table).map_err(|_| {
                self.error_at(
                    ParseErrorKind::DuplicateCte,
                    "duplicate common table name in WITH clause",
                    position,
                )
            })?;
            if !self.eat_punct(Punct::Comma) {
                break;
            }
        }
        Ok(with)
    }

    fn parse_common_table(&mut self) -> Result<CommonTable> {
        let start = self.pos;
        let leading = self.take_leading();
        let name = self.parse_ident()?;

        let mut columns = Vec::new();
        if self.eat_punct(Punct::LParen) {
            columns.push(self.parse_ident()?);
            while self.eat_punct(Punct::Comma) {
                columns.push(self.parse_ident()?);
            }
            self.expect_punct(Punct::RParen)?;
        }

        self.expect_keyword(Keyword::AS)?;

        let materialized = if self.eat_keyword(Keyword::MATERIALIZED) {
            Some(true)
        } else if self.at_keyword(Keyword::NOT)
            && self.peek(1).is_some_and(|l| l.is_keyword(Keyword::MATERIALIZED))
        {
            self.bump();
            self.bump();
            Some(false)
        } else {
            None
        };

        self.expect_punct(Punct::LParen)?;
        let query = self.parse_query()?;
        self.expect_punct(Punct::RParen)?;

        Ok(CommonTable {
            name,
            columns,
            materialized,
            query: Box::new(query),
            span: self.span_from(start),
            comments: CommentSet {
                before: leading,
                after: self.take_trailing(),
            },
        })
    }

    // -----------------------------------------------------------------
    // Trailing clauses
    // -----------------------------------------------------------------

    pub(crate) fn parse_order_by_clause(&mut self) -> Result<OrderByClause> {
        Ok(OrderByClause {
            items: self.parse_order_expr_list()?,
            comments: CommentSet::new(),
        })
    }

    /// `ORDER BY expr [ASC|DESC] [NULLS FIRST|LAST], …`; also used inside
    /// aggregate calls and window specs.
    pub(crate) fn parse_order_expr_list(&mut self) -> Result<Vec<OrderExpr>> {
        self.expect_keyword(Keyword::ORDER)?;
        self.expect_keyword(Keyword::BY)?;
        let mut items = vec![self.parse_order_expr()?];
        while self.eat_punct(Punct::Comma) {
            items.push(self.parse_order_expr()?);
        }
        Ok(items)
    }

    fn parse_order_expr(&mut self) -> Result<OrderExpr> {
        let expr = self.parse_expr()?;
        let direction = if self.eat_keyword(Keyword::ASC) {
            Some(OrderDirection::Asc)
        } else if self.eat_keyword(Keyword::DESC) {
            Some(OrderDirection::Desc)
        } else {
            None
        };
        let nulls = if self.eat_keyword(Keyword::NULLS) {
            if self.eat_keyword(Keyword::FIRST) {
                Some(NullsOrder::First)
            } else {
                self.expect_keyword(Keyword::LAST)?;
                Some(NullsOrder::Last)
            }
        } else {
            None
        };
        Ok(OrderExpr {
            expr,
            direction,
            nulls,
            comments: CommentSet::new(),
        })
    }

    fn parse_limit_clause(&mut self) -> Result<LimitClause> {
        self.expect_keyword(Keyword::LIMIT)?;
        if self.eat_keyword(Keyword::ALL) {
            return Ok(LimitClause::new(Expr::null()));
        }
        Ok(LimitClause::new(self.parse_expr()?))
    }

    fn parse_offset_clause(&mut self) -> Result<OffsetClause> {
        self.expect_keyword(Keyword::OFFSET)?;
        let value = self.parse_expr()?;
        let rows = self.eat_keyword(Keyword::ROW) || self.eat_keyword(Keyword::ROWS);
        Ok(OffsetClause {
            value,
            rows,
            comments: CommentSet::new(),
        })
    }

    fn parse_fetch_clause(&mut self) -> Result<FetchClause> {
        self.expect_keyword(Keyword::FETCH)?;
        let first = if self.eat_keyword(Keyword::FIRST) {
            true
        } else {
            self.expect_keyword(Keyword::NEXT)?;
            false
        };
        let count = if self.at_keyword(Keyword::ROW) || self.at_keyword(Keyword::ROWS) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        if !self.eat_keyword(Keyword::ROW) {
            self.expect_keyword(Keyword::ROWS)?;
        }
        let with_ties = if self.eat_keyword(Keyword::ONLY) {
            false
        } else {
            self.expect_keyword(Keyword::WITH)?;
            self.expect_keyword(Keyword::TIES)?;
            true
        };
        Ok(FetchClause {
            first,
            count,
            with_ties,
            comments: CommentSet::new(),
        })
    }

    fn parse_locking_clause(&mut self) -> Result<LockingClause> {
        self.expect_keyword(Keyword::FOR)?;
        let mode = if self.eat_keyword(Keyword::UPDATE) {
            LockMode::Update
        } else if self.eat_keyword(Keyword::SHARE) {
            LockMode::Share
        } else if self.eat_keyword(Keyword::NO) {
            self.expect_keyword(Keyword::KEY)?;
            self.expect_keyword(Keyword::UPDATE)?;
            LockMode::NoKeyUpdate
        } else {
            self.expect_keyword(Keyword::KEY)?;
            self.expect_keyword(Keyword::SHARE)?;
            LockMode::KeyShare
        };

        let mut of = Vec::new();
        if self.eat_keyword(Keyword::OF) {
            of.push(self.parse_qualified_name()?);
            while self.eat_punct(Punct::Comma) {
                of.push(self.parse_qualified_name()?);
            }
        }

        let wait = if self.eat_keyword(Keyword::NOWAIT) {
            Some(LockWait::Nowait)
        } else if self.eat_keyword(Keyword::SKIP) {
            self.expect_keyword(Keyword::LOCKED)?;
            Some(LockWait::SkipLocked)
        } else {
            None
        };

        Ok(LockingClause {
            mode,
            of,
            wait,
            comments: CommentSet::new(),
        })
    }

    fn parse_window_clause(&mut self) -> Result<WindowClause> {
        self.expect_keyword(Keyword::WINDOW)?;
        let mut windows = Vec::new();
        loop {
            let name = self.parse_ident()?;
            self.expect_keyword(Keyword::AS)?;
            let spec = self.parse_window_spec()?;
            windows.push(NamedWindow {
                name,
                spec,
                comments: CommentSet::new(),
            });
            if !self.eat_punct(Punct::Comma) {
                break;
            }
        }
        Ok(WindowClause {
            windows,
            comments: CommentSet::new(),
        })
    }
}
