//! Recursive-descent parser: lexemes to typed AST.
//!
//! The grammar is split across sub-modules by construct family (expressions,
//! queries, sources, DML, DDL), each an `impl` block on [`Parser`]. Lookahead
//! is bounded to two lexemes except at the alias/set-op boundary.

mod cursor;
mod ddl;
mod dml;
mod expr;
mod query;
mod source;

pub use cursor::{
    ClauseContext, CteRegion, PositionParse, detect_cte_at_cursor, get_cte_regions,
    parse_to_position,
};

use tracing::debug;

use crate::ast::{Comment, Statement, StatementBody};
use crate::base::{Position, Span, TextSize};
use crate::error::{ParseError, ParseErrorKind, Result, SqlError, snippet_at};
use crate::lexer::{Keyword, Lexeme, LexerOptions, Op, Punct, tokenize, tokenize_lossy};

/// Parser configuration.
#[derive(Debug, Clone)]
pub struct ParserOptions {
    /// Leading symbols accepted as parameter markers.
    pub parameter_symbols: Vec<char>,
    /// Recovery mode for editor tooling: tokenizer failures truncate instead
    /// of erroring.
    pub allow_incomplete_input: bool,
    /// Retain the lexeme stream (with exact whitespace) on the parsed
    /// statement so it can be re-emitted byte for byte.
    pub preserve_original_formatting: bool,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            parameter_symbols: vec![':', '@', '$', '?'],
            allow_incomplete_input: false,
            preserve_original_formatting: false,
        }
    }
}

impl ParserOptions {
    pub(crate) fn lexer_options(&self) -> LexerOptions {
        LexerOptions {
            parameter_symbols: self.parameter_symbols.clone(),
            keep_comments: true,
            preserve_whitespace: self.preserve_original_formatting,
        }
    }
}

/// Parse exactly one statement; trailing input is an error.
pub fn parse(sql: &str) -> Result<Statement> {
    parse_with_options(sql, &ParserOptions::default())
}

/// Sync-wrapping convenience for async call sites; performs no I/O.
pub async fn parse_async(sql: &str) -> Result<Statement> {
    parse(sql)
}

pub fn parse_with_options(sql: &str, options: &ParserOptions) -> Result<Statement> {
    let lexemes = if options.allow_incomplete_input {
        tokenize_lossy(sql, &options.lexer_options()).0
    } else {
        tokenize(sql, &options.lexer_options())?
    };
    let (statement, mut next) = parse_from_lexemes(sql, &lexemes, 0)?;
    // A terminating semicolon is not trailing input.
    while lexemes.get(next).is_some_and(|l| l.is_punct(Punct::Semicolon)) {
        next += 1;
    }
    if let Some(extra) = lexemes.get(next) {
        return Err(ParseError::new(
            ParseErrorKind::TrailingInput,
            format!("unexpected {} after complete statement", extra.describe()),
            extra.span.start,
            snippet_at(sql, extra.span.start),
        )
        .into());
    }
    let mut statement = statement;
    if options.preserve_original_formatting {
        statement.preserved = Some(lexemes);
    }
    Ok(statement)
}

/// Parse a statement sequence separated by semicolons.
pub fn parse_multi(sql: &str) -> Result<Vec<Statement>> {
    let options = ParserOptions::default();
    let lexemes = tokenize(sql, &options.lexer_options())?;
    let mut statements = Vec::new();
    let mut pos = 0;
    while pos < lexemes.len() {
        if lexemes[pos].is_punct(Punct::Semicolon) {
            pos += 1;
            continue;
        }
        let (statement, next) = parse_from_lexemes(sql, &lexemes, pos)?;
        statements.push(statement);
        pos = next;
        if let Some(lexeme) = lexemes.get(pos) {
            if lexeme.is_punct(Punct::Semicolon) {
                pos += 1;
            } else {
                return Err(ParseError::new(
                    ParseErrorKind::TrailingInput,
                    format!("expected ';' between statements, found {}", lexeme.describe()),
                    lexeme.span.start,
                    snippet_at(sql, lexeme.span.start),
                )
                .into());
            }
        }
    }
    Ok(statements)
}

/// The compositional entry point: parse one statement starting at
/// `start`, returning it together with the index of the next unconsumed
/// lexeme.
pub fn parse_from_lexemes(
    sql: &str,
    lexemes: &[Lexeme],
    start: usize,
) -> Result<(Statement, usize)> {
    let mut parser = Parser::new(sql, lexemes, start);
    let statement = parser.parse_statement()?;
    Ok((statement, parser.pos))
}

/// Result of the non-throwing [`analyze`] entry point.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub success: bool,
    pub statement: Option<Statement>,
    pub error: Option<SqlError>,
    /// Lexemes assembled before any failure, for tooling.
    pub lexemes: Vec<Lexeme>,
}

/// Parse without throwing; failures are captured as values.
pub fn analyze(sql: &str) -> Analysis {
    let options = ParserOptions::default();
    let (lexemes, tokenize_error) = tokenize_lossy(sql, &options.lexer_options());
    if let Some(error) = tokenize_error {
        return Analysis {
            success: false,
            statement: None,
            error: Some(error.into()),
            lexemes,
        };
    }
    match parse_from_lexemes(sql, &lexemes, 0) {
        Ok((statement, mut next)) => {
            while lexemes
                .get(next)
                .is_some_and(|l| l.is_punct(Punct::Semicolon))
            {
                next += 1;
            }
            if next >= lexemes.len() {
                return Analysis {
                    success: true,
                    statement: Some(statement),
                    error: None,
                    lexemes,
                };
            }
            let at = lexemes[next].span.start;
            Analysis {
                success: false,
                statement: Some(statement),
                error: Some(
                    ParseError::new(
                        ParseErrorKind::TrailingInput,
                        "unexpected input after complete statement",
                        at,
                        snippet_at(sql, at),
                    )
                    .into(),
                ),
                lexemes,
            }
        }
        Err(error) => Analysis {
            success: false,
            statement: None,
            error: Some(error),
            lexemes,
        },
    }
}

/// Split SQL text into individual statement strings, respecting strings and
/// comments (a `;` inside a literal does not split).
pub fn split_multi_query(sql: &str) -> Vec<String> {
    let options = LexerOptions {
        preserve_whitespace: true,
        ..LexerOptions::default()
    };
    let (lexemes, _) = tokenize_lossy(sql, &options);
    let mut pieces = Vec::new();
    let mut start = TextSize::new(0);
    for lexeme in &lexemes {
        if lexeme.is_punct(Punct::Semicolon) {
            let piece = &sql[usize::from(start)..usize::from(lexeme.span.start.offset)];
            if !piece.trim().is_empty() {
                pieces.push(piece.trim().to_string());
            }
            start = lexeme.span.end.offset;
        }
    }
    let tail = &sql[usize::from(start)..];
    if !tail.trim().is_empty() {
        pieces.push(tail.trim().to_string());
    }
    pieces
}

// ============================================================================
// Parser state
// ============================================================================

pub(crate) struct Parser<'a> {
    pub(crate) sql: &'a str,
    pub(crate) lexemes: &'a [Lexeme],
    pub(crate) pos: usize,
    /// Comment slots already attached to a component; each comment is
    /// attached exactly once.
    taken_leading: Vec<bool>,
    taken_trailing: Vec<bool>,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(sql: &'a str, lexemes: &'a [Lexeme], start: usize) -> Self {
        Self {
            sql,
            lexemes,
            pos: start,
            taken_leading: vec![false; lexemes.len()],
            taken_trailing: vec![false; lexemes.len()],
        }
    }

    // -----------------------------------------------------------------
    // Lexeme inspection
    // -----------------------------------------------------------------

    pub(crate) fn current(&self) -> Option<&'a Lexeme> {
        self.lexemes.get(self.pos)
    }

    pub(crate) fn peek(&self, n: usize) -> Option<&'a Lexeme> {
        self.lexemes.get(self.pos + n)
    }

    pub(crate) fn at_eof(&self) -> bool {
        self.pos >= self.lexemes.len()
    }

    pub(crate) fn at_keyword(&self, kw: Keyword) -> bool {
        self.current().is_some_and(|l| l.is_keyword(kw))
    }

    pub(crate) fn at_any_keyword(&self, kws: &[Keyword]) -> bool {
        self.current()
            .and_then(|l| l.keyword())
            .is_some_and(|k| kws.contains(&k))
    }

    pub(crate) fn at_punct(&self, p: Punct) -> bool {
        self.current().is_some_and(|l| l.is_punct(p))
    }

    pub(crate) fn at_op(&self, op: Op) -> bool {
        self.current().is_some_and(|l| l.is_op(op))
    }

    /// The position used for errors at the current lexeme (end of input
    /// falls back to the end of the source).
    pub(crate) fn error_position(&self) -> Position {
        match self.current() {
            Some(lexeme) => lexeme.span.start,
            None => self
                .lexemes
                .last()
                .map(|l| l.span.end)
                .unwrap_or_else(Position::start),
        }
    }

    // -----------------------------------------------------------------
    // Lexeme consumption
    // -----------------------------------------------------------------

    pub(crate) fn bump(&mut self) -> &'a Lexeme {
        let lexeme = &self.lexemes[self.pos];
        self.pos += 1;
        lexeme
    }

    pub(crate) fn eat_keyword(&mut self, kw: Keyword) -> bool {
        if self.at_keyword(kw) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    pub(crate) fn eat_punct(&mut self, p: Punct) -> bool {
        if self.at_punct(p) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    pub(crate) fn eat_op(&mut self, op: Op) -> bool {
        if self.at_op(op) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    pub(crate) fn expect_keyword(&mut self, kw: Keyword) -> Result<&'a Lexeme, ParseError> {
        if self.at_keyword(kw) {
            Ok(self.bump())
        } else {
            Err(self.unexpected(&[kw.as_str()]))
        }
    }

    pub(crate) fn expect_punct(&mut self, p: Punct) -> Result<&'a Lexeme, ParseError> {
        if self.at_punct(p) {
            Ok(self.bump())
        } else {
            Err(self.unexpected(&[p.as_str()]))
        }
    }

    // -----------------------------------------------------------------
    // Errors
    // -----------------------------------------------------------------

    pub(crate) fn unexpected(&self, expected: &[&'static str]) -> ParseError {
        let found = self
            .current()
            .map(|l| l.describe())
            .unwrap_or_else(|| "end of input".to_string());
        let position = self.error_position();
        let kind = if self.at_eof() {
            ParseErrorKind::UnexpectedEof
        } else {
            ParseErrorKind::UnexpectedToken
        };
        let message = if expected.is_empty() {
            format!("unexpected {found}")
        } else {
            format!("expected {}, found {}", expected.join(" or "), found)
        };
        ParseError::new(kind, message, position, snippet_at(self.sql, position))
            .with_expected(expected.to_vec())
    }

    pub(crate) fn error_at(
        &self,
        kind: ParseErrorKind,
        message: impl Into<String>,
        position: Position,
    ) -> ParseError {
        ParseError::new(kind, message, position, snippet_at(self.sql, position))
    }

    // -----------------------------------------------------------------
    // Comment attachment
    // -----------------------------------------------------------------

    /// Claim the leading comments of the current lexeme for the component
    /// starting here. First claimant wins; every comment attaches once.
    pub(crate) fn take_leading(&mut self) -> Vec<Comment> {
        let Some(lexeme) = self.lexemes.get(self.pos) else {
            return Vec::new();
        };
        if lexeme.leading.is_empty() || self.taken_leading[self.pos] {
            return Vec::new();
        }
        self.taken_leading[self.pos] = true;
        lexeme.leading.clone()
    }

    /// Claim the trailing comments of the previous lexeme for the component
    /// ending there.
    pub(crate) fn take_trailing(&mut self) -> Vec<Comment> {
        let Some(idx) = self.pos.checked_sub(1) else {
            return Vec::new();
        };
        let lexeme = &self.lexemes[idx];
        if lexeme.trailing.is_empty() || self.taken_trailing[idx] {
            return Vec::new();
        }
        self.taken_trailing[idx] = true;
        lexeme.trailing.clone()
    }

    /// Span from the lexeme at `start_index` through the previous lexeme.
    pub(crate) fn span_from(&self, start_index: usize) -> Option<Span> {
        let first = self.lexemes.get(start_index)?;
        let last = self.lexemes.get(self.pos.checked_sub(1)?)?;
        Some(Span::new(first.span.start, last.span.end))
    }

    // -----------------------------------------------------------------
    // Statement dispatch
    // -----------------------------------------------------------------

    pub(crate) fn parse_statement(&mut self) -> Result<Statement> {
        debug!(pos = self.pos, "parse statement");
        // Top-of-file comments become the statement header.
        let header = self.take_leading();

        let Some(first) = self.current() else {
            return Err(self
                .error_at(
                    ParseErrorKind::UnexpectedEof,
                    "empty input",
                    self.error_position(),
                )
                .into());
        };

        let body = match first.keyword() {
            Some(Keyword::WITH) | Some(Keyword::SELECT) | Some(Keyword::VALUES) => {
                // Statement-level WITH may prefix DML as well.
                if first.is_keyword(Keyword::WITH) {
                    self.parse_with_prefixed_statement()?
                } else {
                    StatementBody::Query(self.parse_query()?)
                }
            }
            Some(Keyword::INSERT) => StatementBody::Insert(self.parse_insert(None)?),
            Some(Keyword::UPDATE) => StatementBody::Update(self.parse_update(None)?),
            Some(Keyword::DELETE) => StatementBody::Delete(self.parse_delete(None)?),
            Some(Keyword::MERGE) => StatementBody::Merge(self.parse_merge(None)?),
            Some(Keyword::CREATE) => self.parse_create()?,
            Some(Keyword::ALTER) => StatementBody::AlterTable(self.parse_alter_table()?),
            Some(Keyword::DROP) => self.parse_drop()?,
            Some(Keyword::EXPLAIN) => StatementBody::Explain(self.parse_explain()?),
            Some(Keyword::ANALYZE) => StatementBody::Analyze(self.parse_analyze()?),
            Some(Keyword::VACUUM) => StatementBody::Vacuum(self.parse_vacuum()?),
            Some(Keyword::REINDEX) => StatementBody::Reindex(self.parse_reindex()?),
            _ if first.is_punct(Punct::LParen) => StatementBody::Query(self.parse_query()?),
            _ => {
                return Err(self
                    .unexpected(&["a statement keyword (SELECT, INSERT, CREATE, ...)"])
                    .into());
            }
        };

        Ok(Statement {
            header,
            body,
            preserved: None,
        })
    }

    /// `WITH …` followed by SELECT/VALUES or a DML statement.
    fn parse_with_prefixed_statement(&mut self) -> Result<StatementBody> {
        let with = self.parse_with_clause()?;
        let body = match self.current().and_then(|l| l.keyword()) {
            Some(Keyword::SELECT) | Some(Keyword::VALUES) => {
                let mut query = self.parse_query()?;
                query.set_with(Some(with));
                StatementBody::Query(query)
            }
            Some(Keyword::INSERT) => StatementBody::Insert(self.parse_insert(Some(with))?),
            Some(Keyword::UPDATE) => StatementBody::Update(self.parse_update(Some(with))?),
            Some(Keyword::DELETE) => StatementBody::Delete(self.parse_delete(Some(with))?),
            Some(Keyword::MERGE) => StatementBody::Merge(self.parse_merge(Some(with))?),
            _ if self.at_punct(Punct::LParen) => {
                let mut query = self.parse_query()?;
                query.set_with(Some(with));
                StatementBody::Query(query)
            }
            _ => return Err(self.unexpected(&["SELECT", "VALUES", "INSERT", "UPDATE", "DELETE", "MERGE"]).into()),
        };
        Ok(body)
    }

}

#[cfg(test)]
mod tests;
