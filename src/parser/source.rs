//! FROM-clause grammar: sources, aliases, joins.

use crate::ast::{
    CommentSet, Expr, FromClause, FromItem, FunctionSource, Join, JoinConstraint, JoinKind,
    QuerySource, Source, SourceAlias, SourceExpr, TableSource, ValuesSource,
};
use crate::error::Result;
use crate::lexer::{Keyword, Punct};

use super::Parser;

impl<'a> Parser<'a> {
    pub(crate) fn parse_from_clause(&mut self) -> Result<FromClause> {
        let mut items = vec![self.parse_from_item()?];
        while self.eat_punct(Punct::Comma) {
            items.push(self.parse_from_item()?);
        }
        Ok(FromClause {
            items,
            comments: CommentSet::new(),
        })
    }

    pub(crate) fn parse_from_item(&mut self) -> Result<FromItem> {
        let source = self.parse_source_expr()?;
        let joins = self.parse_joins()?;
        Ok(FromItem { source, joins })
    }

    fn parse_joins(&mut self) -> Result<Vec<Join>> {
        let mut joins = Vec::new();
        loop {
            let natural = self.at_keyword(Keyword::NATURAL);
            let offset = usize::from(natural);
            let kind = match self.peek(offset).and_then(|l| l.keyword()) {
                Some(Keyword::JOIN) | Some(Keyword::INNER) => JoinKind::Inner,
                Some(Keyword::LEFT) => JoinKind::Left,
                Some(Keyword::RIGHT) => JoinKind::Right,
                Some(Keyword::FULL) => JoinKind::Full,
                Some(Keyword::CROSS) => JoinKind::Cross,
                _ => break,
            };
            if natural {
                self.bump();
            }
            // Consume the join keywords: [INNER|LEFT|RIGHT|FULL|CROSS] [OUTER] JOIN.
            if !self.at_keyword(Keyword::JOIN) {
                self.bump();
                self.eat_keyword(Keyword::OUTER);
            }
            self.expect_keyword(Keyword::JOIN)?;

            let source = self.parse_source_expr()?;

            let constraint = if kind == JoinKind::Cross || natural {
                None
            } else if self.eat_keyword(Keyword::ON) {
                Some(JoinConstraint::On(self.parse_expr()?))
            } else if self.eat_keyword(Keyword::USING) {
                self.expect_punct(Punct::LParen)?;
                let mut columns = vec![self.parse_ident()?];
                while self.eat_punct(Punct::Comma) {
                    columns.push(self.parse_ident()?);
                }
                self.expect_punct(Punct::RParen)?;
                Some(JoinConstraint::Using(columns))
            } else {
                return Err(self.unexpected(&["ON", "USING"]).into());
            };

            joins.push(Join {
                kind,
                natural,
                source,
                constraint,
                comments: CommentSet::new(),
            });
        }
        Ok(joins)
    }

    pub(crate) fn parse_source_expr(&mut self) -> Result<SourceExpr> {
        let leading = self.take_leading();
        let lateral = self.eat_keyword(Keyword::LATERAL);

        let source = if self.at_punct(Punct::LParen) {
            if self.at_query_start() {
                self.bump();
                let query = self.parse_query()?;
                self.expect_punct(Punct::RParen)?;
                Source::Query(QuerySource {
                    query: Box::new(query),
                    lateral,
                })
            } else {
                // A parenthesized source, possibly with its own joins.
                self.bump();
                let inner = self.parse_from_item()?;
                self.expect_punct(Punct::RParen)?;
                Source::Paren(Box::new(inner))
            }
        } else if self.at_keyword(Keyword::VALUES) {
            self.bump();
            let mut rows = vec![self.parse_values_row()?];
            while self.eat_punct(Punct::Comma) {
                rows.push(self.parse_values_row()?);
            }
            Source::Values(ValuesSource { rows })
        } else {
            let only = self.eat_keyword(Keyword::ONLY);
            let name = self.parse_qualified_name()?;
            if self.at_punct(Punct::LParen) {
                // Function source: srf(arg, …) [WITH ORDINALITY].
                let call = match self.parse_function_call(name)? {
                    Expr::Function(call) => call,
                    _ => unreachable!("function call parse"),
                };
                let with_ordinality = if self.at_keyword(Keyword::WITH)
                    && self.peek(1).is_some_and(|l| l.is_keyword(Keyword::ORDINALITY))
                {
                    self.bump();
                    self.bump();
                    true
                } else {
                    false
                };
                Source::Function(FunctionSource {
                    call,
                    lateral,
                    with_ordinality,
                })
            } else {
                Source::Table(TableSource { name, only })
            }
        };

        let alias = self.parse_source_alias()?;
        Ok(SourceExpr {
            source,
            alias,
            comments: CommentSet {
                before: leading,
                after: self.take_trailing(),
            },
        })
    }

    /// `[AS] alias [(col, …)]`.
    fn parse_source_alias(&mut self) -> Result<Option<SourceAlias>> {
        let name = match self.parse_optional_alias()? {
            Some(name) => name,
            None => return Ok(None),
        };
        let mut columns = Vec::new();
        if self.at_punct(Punct::LParen) {
            self.bump();
            columns.push(self.parse_ident()?);
            while self.eat_punct(Punct::Comma) {
                columns.push(self.parse_ident()?);
            }
            self.expect_punct(Punct::RParen)?;
        }
        Ok(Some(SourceAlias { name, columns }))
    }
}
