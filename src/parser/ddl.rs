//! DDL grammar: CREATE / ALTER / DROP and maintenance statements.

use crate::ast::{
    AlterAction, AlterTable, AnalyzeStmt, ColumnConstraint, ColumnConstraintKind, ColumnDef,
    CommentSet, CreateIndex, CreateTable, DropIndex, DropTable, ExplainStmt, Ident, IndexColumn,
    MatchKind, NullsOrder, OrderDirection, ReferenceDef, ReferentialAction, ReindexStmt,
    ReindexTarget, SequenceOption, StatementBody, TableConstraint, TableConstraintKind,
    VacuumStmt,
};
use crate::error::{ParseErrorKind, Result};
use crate::lexer::{Keyword, LexemeKind, Punct};

use super::Parser;

impl<'a> Parser<'a> {
    pub(crate) fn parse_create(&mut self) -> Result<StatementBody> {
        let comments = CommentSet {
            before: self.take_leading(),
            after: Vec::new(),
        };
        self.expect_keyword(Keyword::CREATE)?;

        let temporary = self.eat_keyword(Keyword::TEMPORARY) || self.eat_keyword(Keyword::TEMP);
        let unique = self.eat_keyword(Keyword::UNIQUE);

        if self.eat_keyword(Keyword::TABLE) {
            if unique {
                return Err(self
                    .error_at(
                        ParseErrorKind::UnexpectedToken,
                        "UNIQUE is not valid before TABLE",
                        self.error_position(),
                    )
                    .into());
            }
            return Ok(StatementBody::CreateTable(
                self.parse_create_table(temporary, comments)?,
            ));
        }
        self.expect_keyword(Keyword::INDEX)?;
        Ok(StatementBody::CreateIndex(
            self.parse_create_index(unique, comments)?,
        ))
    }

    fn parse_create_table(
        &mut self,
        temporary: bool,
        comments: CommentSet,
    ) -> Result<CreateTable> {
        let if_not_exists = self.parse_if_not_exists()?;
        let name = self.parse_qualified_name()?;
        self.expect_punct(Punct::LParen)?;

        let mut columns = Vec::new();
        let mut constraints = Vec::new();
        loop {
            if self.at_table_constraint_start() {
                constraints.push(self.parse_table_constraint()?);
            } else {
                columns.push(self.parse_column_def()?);
            }
            if !self.eat_punct(Punct::Comma) {
                break;
            }
        }
        self.expect_punct(Punct::RParen)?;

        Ok(CreateTable {
            name,
            if_not_exists,
            temporary,
            columns,
            constraints,
            comments,
        })
    }

    fn at_table_constraint_start(&self) -> bool {
        matches!(
            self.current().and_then(|l| l.keyword()),
            Some(Keyword::CONSTRAINT)
                | Some(Keyword::PRIMARY)
                | Some(Keyword::UNIQUE)
                | Some(Keyword::FOREIGN)
                | Some(Keyword::CHECK)
        )
    }

    pub(crate) fn parse_table_constraint(&mut self) -> Result<TableConstraint> {
        let name = if self.eat_keyword(Keyword::CONSTRAINT) {
            Some(self.parse_ident()?)
        } else {
            None
        };

        let kind = if self.eat_keyword(Keyword::PRIMARY) {
            self.expect_keyword(Keyword::KEY)?;
            TableConstraintKind::PrimaryKey(self.parse_paren_ident_list()?)
        } else if self.eat_keyword(Keyword::UNIQUE) {
            TableConstraintKind::Unique(self.parse_paren_ident_list()?)
        } else if self.eat_keyword(Keyword::FOREIGN) {
            self.expect_keyword(Keyword::KEY)?;
            let columns = self.parse_paren_ident_list()?;
            self.expect_keyword(Keyword::REFERENCES)?;
            let reference = self.parse_reference_def()?;
            TableConstraintKind::ForeignKey { columns, reference }
        } else {
            self.expect_keyword(Keyword::CHECK)?;
            self.expect_punct(Punct::LParen)?;
            let expr = self.parse_expr()?;
            self.expect_punct(Punct::RParen)?;
            TableConstraintKind::Check(expr)
        };

        Ok(TableConstraint {
            name,
            kind,
            comments: CommentSet::new(),
        })
    }

    fn parse_column_def(&mut self) -> Result<ColumnDef> {
        let leading = self.take_leading();
        let name = self.parse_ident()?;
        let ty = self.parse_type_name()?;

        let mut constraints = Vec::new();
        loop {
            let constraint_name = if self.eat_keyword(Keyword::CONSTRAINT) {
                Some(self.parse_ident()?)
            } else {
                None
            };

            let kind = if self.at_keyword(Keyword::NOT)
                && self.peek(1).is_some_and(|l| l.kind == LexemeKind::Null)
            {
                self.bump();
                self.bump();
                Some(ColumnConstraintKind::NotNull)
            } else if self.current().is_some_and(|l| l.kind == LexemeKind::Null) {
                self.bump();
                Some(ColumnConstraintKind::Null)
            } else if self.eat_keyword(Keyword::DEFAULT) {
                Some(ColumnConstraintKind::Default(self.parse_expr()?))
            } else if self.eat_keyword(Keyword::PRIMARY) {
                self.expect_keyword(Keyword::KEY)?;
                Some(ColumnConstraintKind::PrimaryKey)
            } else if self.eat_keyword(Keyword::UNIQUE) {
                Some(ColumnConstraintKind::Unique)
            } else if self.eat_keyword(Keyword::REFERENCES) {
                Some(ColumnConstraintKind::References(self.parse_reference_def()?))
            } else if self.eat_keyword(Keyword::CHECK) {
                self.expect_punct(Punct::LParen)?;
                let expr = self.parse_expr()?;
                self.expect_punct(Punct::RParen)?;
                Some(ColumnConstraintKind::Check(expr))
            } else if self.eat_keyword(Keyword::GENERATED) {
                Some(self.parse_generated()?)
            } else {
                None
            };

            match kind {
                Some(kind) => constraints.push(ColumnConstraint {
                    name: constraint_name,
                    kind,
                    comments: CommentSet::new(),
                }),
                None => {
                    if constraint_name.is_some() {
                        return Err(self.unexpected(&["a column constraint"]).into());
                    }
                    break;
                }
            }
        }

        Ok(ColumnDef {
            name,
            ty,
            constraints,
            comments: CommentSet {
                before: leading,
                after: self.take_trailing(),
            },
        })
    }

    /// `GENERATED ALWAYS | BY DEFAULT AS IDENTITY [(seq options)]`.
    fn parse_generated(&mut self) -> Result<ColumnConstraintKind> {
        let always = if self.eat_keyword(Keyword::ALWAYS) {
            true
        } else {
            self.expect_keyword(Keyword::BY)?;
            self.expect_keyword(Keyword::DEFAULT)?;
            false
        };
        self.expect_keyword(Keyword::AS)?;
        self.expect_keyword(Keyword::IDENTITY)?;

        let mut options = Vec::new();
        if self.eat_punct(Punct::LParen) {
            while !self.at_punct(Punct::RParen) {
                options.push(self.parse_sequence_option()?);
            }
            self.expect_punct(Punct::RParen)?;
        }
        Ok(ColumnConstraintKind::Generated { always, options })
    }

    fn parse_sequence_option(&mut self) -> Result<SequenceOption> {
        if self.eat_keyword(Keyword::START) {
            self.eat_keyword(Keyword::WITH);
            return Ok(SequenceOption::Start(self.parse_integer()?));
        }
        if self.eat_keyword(Keyword::INCREMENT) {
            self.eat_keyword(Keyword::BY);
            return Ok(SequenceOption::Increment(self.parse_integer()?));
        }
        if self.eat_keyword(Keyword::MINVALUE) {
            return Ok(SequenceOption::MinValue(self.parse_integer()?));
        }
        if self.eat_keyword(Keyword::MAXVALUE) {
            return Ok(SequenceOption::MaxValue(self.parse_integer()?));
        }
        if self.eat_keyword(Keyword::CACHE) {
            return Ok(SequenceOption::Cache(self.parse_integer()?));
        }
        if self.at_keyword(Keyword::NO)
            && self.peek(1).is_some_and(|l| l.is_keyword(Keyword::CYCLE))
        {
            self.bump();
            self.bump();
            return Ok(SequenceOption::NoCycle);
        }
        if self.eat_keyword(Keyword::CYCLE) {
            return Ok(SequenceOption::Cycle);
        }
        Err(self.unexpected(&["a sequence option"]).into())
    }

    fn parse_integer(&mut self) -> Result<i64> {
        let negative = self.eat_op(crate::lexer::Op::Minus);
        let Some(lexeme) = self.current() else {
            return Err(self.unexpected(&["an integer"]).into());
        };
        if lexeme.kind != LexemeKind::Number {
            return Err(self.unexpected(&["an integer"]).into());
        }
        let value: i64 = lexeme.text.parse().map_err(|_| {
            self.error_at(
                ParseErrorKind::UnexpectedToken,
                "integer out of range",
                self.error_position(),
            )
        })?;
        self.bump();
        Ok(if negative { -value } else { value })
    }

    pub(crate) fn parse_reference_def(&mut self) -> Result<ReferenceDef> {
        let table = self.parse_qualified_name()?;
        let mut reference = ReferenceDef::new(table, Vec::new());
        if self.at_punct(Punct::LParen) {
            reference.columns = self.parse_paren_ident_list()?;
        }

        loop {
            if self.eat_keyword(Keyword::MATCH) {
                reference.match_kind = Some(if self.eat_keyword(Keyword::FULL) {
                    MatchKind::Full
                } else if self.eat_keyword(Keyword::PARTIAL) {
                    MatchKind::Partial
                } else {
                    self.expect_keyword(Keyword::SIMPLE)?;
                    MatchKind::Simple
                });
            } else if self.at_keyword(Keyword::ON) {
                self.bump();
                if self.eat_keyword(Keyword::DELETE) {
                    reference.on_delete = Some(self.parse_referential_action()?);
                } else {
                    self.expect_keyword(Keyword::UPDATE)?;
                    reference.on_update = Some(self.parse_referential_action()?);
                }
            } else if self.at_keyword(Keyword::NOT)
                && self.peek(1).is_some_and(|l| l.is_keyword(Keyword::DEFERRABLE))
            {
                self.bump();
                self.bump();
                reference.deferrable = Some(false);
            } else if self.eat_keyword(Keyword::DEFERRABLE) {
                reference.deferrable = Some(true);
            } else if self.eat_keyword(Keyword::INITIALLY) {
                if self.eat_keyword(Keyword::DEFERRED) {
                    reference.initially_deferred = Some(true);
                } else {
                    self.expect_keyword(Keyword::IMMEDIATE)?;
                    reference.initially_deferred = Some(false);
                }
            } else {
                break;
            }
        }

        Ok(reference)
    }

    fn parse_referential_action(&mut self) -> Result<ReferentialAction> {
        if self.eat_keyword(Keyword::CASCADE) {
            return Ok(ReferentialAction::Cascade);
        }
        if self.eat_keyword(Keyword::RESTRICT) {
            return Ok(ReferentialAction::Restrict);
        }
        if self.eat_keyword(Keyword::NO) {
            self.expect_keyword(Keyword::ACTION)?;
            return Ok(ReferentialAction::NoAction);
        }
        self.expect_keyword(Keyword::SET)?;
        if self.current().is_some_and(|l| l.kind == LexemeKind::Null) {
            self.bump();
            return Ok(ReferentialAction::SetNull);
        }
        self.expect_keyword(Keyword::DEFAULT)?;
        Ok(ReferentialAction::SetDefault)
    }

    fn parse_create_index(&mut self, unique: bool, comments: CommentSet) -> Result<CreateIndex> {
        let if_not_exists = self.parse_if_not_exists()?;
        let name = if self.at_keyword(Keyword::ON) {
            None
        } else {
            Some(self.parse_ident()?)
        };
        self.expect_keyword(Keyword::ON)?;
        let table = self.parse_qualified_name()?;

        let method = if self.eat_keyword(Keyword::USING) {
            Some(self.parse_ident()?)
        } else {
            None
        };

        self.expect_punct(Punct::LParen)?;
        let mut columns = vec![self.parse_index_column()?];
        while self.eat_punct(Punct::Comma) {
            columns.push(self.parse_index_column()?);
        }
        self.expect_punct(Punct::RParen)?;

        Ok(CreateIndex {
            name,
            unique,
            if_not_exists,
            table,
            method,
            columns,
            comments,
        })
    }

    fn parse_index_column(&mut self) -> Result<IndexColumn> {
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
        Ok(IndexColumn {
            expr,
            direction,
            nulls,
            comments: CommentSet::new(),
        })
    }

    pub(crate) fn parse_alter_table(&mut self) -> Result<AlterTable> {
        let comments = CommentSet {
            before: self.take_leading(),
            after: Vec::new(),
        };
        self.expect_keyword(Keyword::ALTER)?;
        self.expect_keyword(Keyword::TABLE)?;
        let if_exists = self.parse_if_exists()?;
        let table = self.parse_qualified_name()?;

        let mut actions = vec![self.parse_alter_action()?];
        while self.eat_punct(Punct::Comma) {
            actions.push(self.parse_alter_action()?);
        }

        Ok(AlterTable {
            table,
            if_exists,
            actions,
            comments,
        })
    }

    fn parse_alter_action(&mut self) -> Result<AlterAction> {
        if self.eat_keyword(Keyword::ADD) {
            if self.at_table_constraint_start() {
                return Ok(AlterAction::AddConstraint(self.parse_table_constraint()?));
            }
            self.eat_keyword(Keyword::COLUMN);
            let if_not_exists = self.parse_if_not_exists()?;
            let column = self.parse_column_def()?;
            return Ok(AlterAction::AddColumn {
                if_not_exists,
                column,
            });
        }

        self.expect_keyword(Keyword::DROP)?;
        if self.eat_keyword(Keyword::CONSTRAINT) {
            let if_exists = self.parse_if_exists()?;
            let name = self.parse_ident()?;
            let cascade = self.parse_drop_behavior();
            return Ok(AlterAction::DropConstraint {
                name,
                if_exists,
                cascade,
            });
        }
        self.eat_keyword(Keyword::COLUMN);
        let if_exists = self.parse_if_exists()?;
        let name = self.parse_ident()?;
        let cascade = self.parse_drop_behavior();
        Ok(AlterAction::DropColumn {
            name,
            if_exists,
            cascade,
        })
    }

    pub(crate) fn parse_drop(&mut self) -> Result<StatementBody> {
        let comments = CommentSet {
            before: self.take_leading(),
            after: Vec::new(),
        };
        self.expect_keyword(Keyword::DROP)?;

        let is_index = if self.eat_keyword(Keyword::TABLE) {
            false
        } else {
            self.expect_keyword(Keyword::INDEX)?;
            true
        };

        let if_exists = self.parse_if_exists()?;
        let mut names = vec![self.parse_qualified_name()?];
        while self.eat_punct(Punct::Comma) {
            names.push(self.parse_qualified_name()?);
        }
        let cascade = self.parse_drop_behavior();

        Ok(if is_index {
            StatementBody::DropIndex(DropIndex {
                names,
                if_exists,
                cascade,
                comments,
            })
        } else {
            StatementBody::DropTable(DropTable {
                names,
                if_exists,
                cascade,
                comments,
            })
        })
    }

    fn parse_drop_behavior(&mut self) -> bool {
        if self.eat_keyword(Keyword::CASCADE) {
            true
        } else {
            self.eat_keyword(Keyword::RESTRICT);
            false
        }
    }

    fn parse_if_not_exists(&mut self) -> Result<bool> {
        if self.eat_keyword(Keyword::IF) {
            self.expect_keyword(Keyword::NOT)?;
            self.expect_keyword(Keyword::EXISTS)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn parse_if_exists(&mut self) -> Result<bool> {
        if self.eat_keyword(Keyword::IF) {
            self.expect_keyword(Keyword::EXISTS)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn parse_paren_ident_list(&mut self) -> Result<Vec<Ident>> {
        self.expect_punct(Punct::LParen)?;
        let mut idents = vec![self.parse_ident()?];
        while self.eat_punct(Punct::Comma) {
            idents.push(self.parse_ident()?);
        }
        self.expect_punct(Punct::RParen)?;
        Ok(idents)
    }

    // -----------------------------------------------------------------
    // Maintenance statements
    // -----------------------------------------------------------------

    pub(crate) fn parse_explain(&mut self) -> Result<ExplainStmt> {
        let comments = CommentSet {
            before: self.take_leading(),
            after: Vec::new(),
        };
        self.expect_keyword(Keyword::EXPLAIN)?;
        let analyze = self.eat_keyword(Keyword::ANALYZE);
        let verbose = self.eat_keyword(Keyword::VERBOSE);
        let statement = self.parse_statement()?;
        Ok(ExplainStmt {
            analyze,
            verbose,
            statement: Box::new(statement),
            comments,
        })
    }

    pub(crate) fn parse_analyze(&mut self) -> Result<AnalyzeStmt> {
        let comments = CommentSet {
            before: self.take_leading(),
            after: Vec::new(),
        };
        self.expect_keyword(Keyword::ANALYZE)?;
        let verbose = self.eat_keyword(Keyword::VERBOSE);
        let table = if self.current().is_some_and(|l| l.as_ident().is_some()) {
            Some(self.parse_qualified_name()?)
        } else {
            None
        };
        Ok(AnalyzeStmt {
            verbose,
            table,
            comments,
        })
    }

    pub(crate) fn parse_vacuum(&mut self) -> Result<VacuumStmt> {
        let comments = CommentSet {
            before: self.take_leading(),
            after: Vec::new(),
        };
        self.expect_keyword(Keyword::VACUUM)?;
        let full = self.eat_keyword(Keyword::FULL);
        let analyze = self.eat_keyword(Keyword::ANALYZE);
        let table = if self.current().is_some_and(|l| l.as_ident().is_some()) {
            Some(self.parse_qualified_name()?)
        } else {
            None
        };
        Ok(VacuumStmt {
            full,
            analyze,
            table,
            comments,
        })
    }

    pub(crate) fn parse_reindex(&mut self) -> Result<ReindexStmt> {
        let comments = CommentSet {
            before: self.take_leading(),
            after: Vec::new(),
        };
        self.expect_keyword(Keyword::REINDEX)?;
        let target = if self.eat_keyword(Keyword::TABLE) {
            ReindexTarget::Table
        } else {
            self.expect_keyword(Keyword::INDEX)?;
            ReindexTarget::Index
        };
        let name = self.parse_qualified_name()?;
        Ok(ReindexStmt {
            target,
            name,
            comments,
        })
    }
}
