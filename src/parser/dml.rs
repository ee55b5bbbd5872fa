//! DML grammar: INSERT, UPDATE, DELETE, MERGE.

use crate::ast::{
    CommentSet, DeleteQuery, InsertQuery, InsertSource, MergeAction, MergeInsertValues,
    MergeQuery, MergeWhen, SelectItem, SetClause, UpdateQuery, WhereClause, WithClause,
};
use crate::error::Result;
use crate::lexer::{Keyword, Punct};

use super::Parser;

impl<'a> Parser<'a> {
    pub(crate) fn parse_insert(&mut self, with: Option<WithClause>) -> Result<InsertQuery> {
        let comments = CommentSet {
            before: self.take_leading(),
            after: Vec::new(),
        };
        self.expect_keyword(Keyword::INSERT)?;
        self.expect_keyword(Keyword::INTO)?;
        let table = self.parse_qualified_name()?;
        let alias = if self.eat_keyword(Keyword::AS) {
            Some(self.parse_ident()?)
        } else {
            None
        };

        // A parenthesized column list only if not immediately a sub-select.
        let mut columns = Vec::new();
        if self.at_punct(Punct::LParen) && !self.at_query_start() {
            self.bump();
            columns.push(self.parse_ident()?);
            while self.eat_punct(Punct::Comma) {
                columns.push(self.parse_ident()?);
            }
            self.expect_punct(Punct::RParen)?;
        }

        let source = if self.at_keyword(Keyword::DEFAULT) {
            self.bump();
            self.expect_keyword(Keyword::VALUES)?;
            InsertSource::DefaultValues
        } else {
            InsertSource::Query(Box::new(self.parse_query()?))
        };

        let returning = self.parse_returning()?;

        Ok(InsertQuery {
            with,
            table,
            alias,
            columns,
            source,
            returning,
            comments,
        })
    }

    pub(crate) fn parse_update(&mut self, with: Option<WithClause>) -> Result<UpdateQuery> {
        let comments = CommentSet {
            before: self.take_leading(),
            after: Vec::new(),
        };
        self.expect_keyword(Keyword::UPDATE)?;
        let table = self.parse_source_expr()?;
        self.expect_keyword(Keyword::SET)?;

        let mut set = vec![self.parse_set_clause()?];
        while self.eat_punct(Punct::Comma) {
            set.push(self.parse_set_clause()?);
        }

        let from = if self.eat_keyword(Keyword::FROM) {
            Some(self.parse_from_clause()?)
        } else {
            None
        };
        let where_clause = if self.eat_keyword(Keyword::WHERE) {
            Some(WhereClause {
                condition: self.parse_expr()?,
                comments: CommentSet::new(),
            })
        } else {
            None
        };
        let returning = self.parse_returning()?;

        Ok(UpdateQuery {
            with,
            table,
            set,
            from,
            where_clause,
            returning,
            comments,
        })
    }

    pub(crate) fn parse_set_clause(&mut self) -> Result<SetClause> {
        let column = self.parse_qualified_name()?;
        if !self.eat_op(crate::lexer::Op::Eq) {
            return Err(self.unexpected(&["'='"]).into());
        }
        let value = self.parse_expr()?;
        Ok(SetClause {
            column,
            value,
            comments: CommentSet::new(),
        })
    }

    pub(crate) fn parse_delete(&mut self, with: Option<WithClause>) -> Result<DeleteQuery> {
        let comments = CommentSet {
            before: self.take_leading(),
            after: Vec::new(),
        };
        self.expect_keyword(Keyword::DELETE)?;
        self.expect_keyword(Keyword::FROM)?;
        let table = self.parse_source_expr()?;

        let using = if self.eat_keyword(Keyword::USING) {
            Some(self.parse_from_clause()?)
        } else {
            None
        };
        let where_clause = if self.eat_keyword(Keyword::WHERE) {
            Some(WhereClause {
                condition: self.parse_expr()?,
                comments: CommentSet::new(),
            })
        } else {
            None
        };
        let returning = self.parse_returning()?;

        Ok(DeleteQuery {
            with,
            table,
            using,
            where_clause,
            returning,
            comments,
        })
    }

    pub(crate) fn parse_merge(&mut self, with: Option<WithClause>) -> Result<MergeQuery> {
        let comments = CommentSet {
            before: self.take_leading(),
            after: Vec::new(),
        };
        self.expect_keyword(Keyword::MERGE)?;
        self.expect_keyword(Keyword::INTO)?;
        let target = self.parse_source_expr()?;
        self.expect_keyword(Keyword::USING)?;
        let source = self.parse_source_expr()?;
        self.expect_keyword(Keyword::ON)?;
        let on = self.parse_expr()?;

        let mut clauses = Vec::new();
        while self.at_keyword(Keyword::WHEN) {
            clauses.push(self.parse_merge_when()?);
        }
        if clauses.is_empty() {
            return Err(self.unexpected(&["WHEN"]).into());
        }

        Ok(MergeQuery {
            with,
            target,
            source,
            on,
            clauses,
            comments,
        })
    }

    fn parse_merge_when(&mut self) -> Result<MergeWhen> {
        self.expect_keyword(Keyword::WHEN)?;
        let matched = if self.eat_keyword(Keyword::NOT) {
            self.expect_keyword(Keyword::MATCHED)?;
            false
        } else {
            self.expect_keyword(Keyword::MATCHED)?;
            true
        };
        let condition = if self.eat_keyword(Keyword::AND) {
            Some(self.parse_expr()?)
        } else {
            None
        };
        self.expect_keyword(Keyword::THEN)?;

        let action = if self.eat_keyword(Keyword::DO) {
            self.expect_keyword(Keyword::NOTHING)?;
            MergeAction::DoNothing
        } else if self.eat_keyword(Keyword::DELETE) {
            MergeAction::Delete
        } else if self.eat_keyword(Keyword::UPDATE) {
            self.expect_keyword(Keyword::SET)?;
            let mut set = vec![self.parse_set_clause()?];
            while self.eat_punct(Punct::Comma) {
                set.push(self.parse_set_clause()?);
            }
            MergeAction::Update { set }
        } else {
            self.expect_keyword(Keyword::INSERT)?;
            let mut columns = Vec::new();
            if self.at_punct(Punct::LParen) {
                self.bump();
                columns.push(self.parse_ident()?);
                while self.eat_punct(Punct::Comma) {
                    columns.push(self.parse_ident()?);
                }
                self.expect_punct(Punct::RParen)?;
            }
            let values = if self.eat_keyword(Keyword::DEFAULT) {
                self.expect_keyword(Keyword::VALUES)?;
                MergeInsertValues::DefaultValues
            } else {
                self.expect_keyword(Keyword::VALUES)?;
                MergeInsertValues::Values(self.parse_values_row()?)
            };
            MergeAction::Insert { columns, values }
        };

        Ok(MergeWhen {
            matched,
            condition,
            action,
            comments: CommentSet::new(),
        })
    }

    pub(crate) fn parse_returning(&mut self) -> Result<Option<Vec<SelectItem>>> {
        if !self.eat_keyword(Keyword::RETURNING) {
            return Ok(None);
        }
        let mut items = vec![self.parse_returning_item()?];
        while self.eat_punct(Punct::Comma) {
            items.push(self.parse_returning_item()?);
        }
        Ok(Some(items))
    }

    fn parse_returning_item(&mut self) -> Result<SelectItem> {
        if self.at_op(crate::lexer::Op::Star) {
            self.bump();
            return Ok(SelectItem::wildcard());
        }
        let expr = self.parse_expr()?;
        let alias = self.parse_optional_alias()?;
        Ok(match alias {
            Some(alias) => SelectItem::aliased(expr, alias),
            None => SelectItem::expr(expr),
        })
    }
}
