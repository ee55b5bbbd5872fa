//! Error types for parsing, analysis, and transformation.
//!
//! Every public operation reports failures as one of the structured kinds
//! below; tokenizer and parser errors always carry a source [`Position`] and a
//! one-line snippet of the offending text. The library never prints and never
//! swallows an error.

use thiserror::Error;

use crate::base::Position;

/// Convenience result alias used throughout the crate.
pub type Result<T, E = SqlError> = std::result::Result<T, E>;

/// Top-level error type aggregating every failure kind.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SqlError {
    #[error(transparent)]
    Tokenize(#[from] TokenizeError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Conversion(#[from] ConversionError),
    #[error(transparent)]
    Injection(#[from] InjectionError),
    #[error(transparent)]
    Cycle(#[from] CycleError),
}

impl SqlError {
    /// The source position, when this error originated in the lexer or parser.
    pub fn position(&self) -> Option<Position> {
        match self {
            Self::Tokenize(e) => Some(e.position),
            Self::Parse(e) => Some(e.position),
            _ => None,
        }
    }
}

// ============================================================================
// Tokenizer
// ============================================================================

/// Categorized tokenizer failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenizeErrorKind {
    UnterminatedString,
    UnterminatedQuotedIdent,
    UnterminatedComment,
    UnterminatedDollarQuote,
    InvalidNumber,
    InvalidCharacter,
}

impl TokenizeErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnterminatedString => "unterminated string literal",
            Self::UnterminatedQuotedIdent => "unterminated quoted identifier",
            Self::UnterminatedComment => "unterminated block comment",
            Self::UnterminatedDollarQuote => "unterminated dollar-quoted string",
            Self::InvalidNumber => "invalid numeric literal",
            Self::InvalidCharacter => "unrecognized character",
        }
    }
}

/// A tokenizer error with position and a snippet of the offending text.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{} at {position}: {snippet}", kind.as_str())]
pub struct TokenizeError {
    pub kind: TokenizeErrorKind,
    pub position: Position,
    /// One line of source around the failure.
    pub snippet: String,
}

impl TokenizeError {
    pub fn new(kind: TokenizeErrorKind, position: Position, snippet: impl Into<String>) -> Self {
        Self {
            kind,
            position,
            snippet: snippet.into(),
        }
    }
}

// ============================================================================
// Parser
// ============================================================================

/// Categorized parse failures.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    /// The current lexeme did not match any expected class.
    UnexpectedToken,
    /// Input ended where more was required.
    UnexpectedEof,
    /// A WITH clause declared the same alias twice.
    DuplicateCte,
    /// A required clause is missing (e.g. INSERT without a source).
    MissingClause,
    /// A complete statement was followed by more input.
    TrailingInput,
}

/// A structured parse error: what was expected, what was found, and where.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{message} at {position}: {snippet}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
    /// Token classes that would have been accepted, for tooling.
    pub expected: Vec<&'static str>,
    pub position: Position,
    /// One line of source around the failure.
    pub snippet: String,
}

impl ParseError {
    pub fn new(
        kind: ParseErrorKind,
        message: impl Into<String>,
        position: Position,
        snippet: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            expected: Vec::new(),
            position,
            snippet: snippet.into(),
        }
    }

    pub fn with_expected(mut self, expected: Vec<&'static str>) -> Self {
        self.expected = expected;
        self
    }
}

// ============================================================================
// Schema (structural AST edits)
// ============================================================================

/// Failures of structural edits on an existing AST.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("duplicate common table name '{name}'")]
    DuplicateCte { name: String },

    #[error("no common table named '{name}'")]
    UnknownCte { name: String },

    #[error("cannot rename '{from}' to '{to}': target name already exists")]
    RenameTargetExists { from: String, to: String },

    #[error("recursive common table '{name}' cannot be inlined")]
    RecursiveCte { name: String },

    #[error("operation not supported on this statement kind: {0}")]
    UnsupportedRoot(&'static str),
}

// ============================================================================
// Resolution (wildcards, upstream columns)
// ============================================================================

/// Failures of name resolution during collection or injection.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("wildcard expansion for table '{table}' requires a column resolver")]
    NoResolver { table: String },

    #[error("column resolver returned no columns for table '{table}'")]
    EmptyWildcard { table: String },

    #[error("column '{column}' not found in the query or any upstream query")]
    ColumnNotFound { column: String },
}

// ============================================================================
// Conversion (SELECT <-> mutation statements)
// ============================================================================

/// Failures of statement-shape conversion.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConversionError {
    #[error("key column '{column}' is not part of the select list")]
    MissingKeyColumn { column: String },

    #[error("column '{column}' is not part of the select list")]
    UnknownColumn { column: String },

    #[error("conversion requires at least one key column")]
    NoKeyColumns,

    #[error("{0}")]
    UnsupportedShape(String),
}

// ============================================================================
// Injection (dynamic query options)
// ============================================================================

/// Failures of the dynamic query injector pipeline.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InjectionError {
    #[error("query already contains a LIMIT clause")]
    ExistingLimit,

    #[error("query already contains an OFFSET clause")]
    ExistingOffset,

    #[error("page must be >= 1 and page size within 1..=1000 (got page {page}, size {page_size})")]
    PageOutOfRange { page: u64, page_size: u64 },

    #[error("unknown option key '{key}'")]
    UnknownOption { key: String },

    #[error("filter condition for '{column}' has no recognized operator")]
    EmptyCondition { column: String },
}

// ============================================================================
// Cycles (CTE dependency graph)
// ============================================================================

/// A circular dependency among non-recursive common tables.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("circular dependency among common tables: {}", cycle.join(" -> "))]
pub struct CycleError {
    /// The names participating in the cycle, in walk order.
    pub cycle: Vec<String>,
}

/// Extract the line of `source` containing `position`, trimmed, for snippets.
pub(crate) fn snippet_at(source: &str, position: Position) -> String {
    source
        .lines()
        .nth(position.line.saturating_sub(1) as usize)
        .unwrap_or("")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_error_display() {
        let err = TokenizeError::new(
            TokenizeErrorKind::UnterminatedString,
            Position::new(2, 8, 20u32),
            "SELECT 'oops",
        );
        let text = err.to_string();
        assert!(text.contains("unterminated string literal"));
        assert!(text.contains("line 2, column 8"));
    }

    #[test]
    fn test_error_position() {
        let err: SqlError = ParseError::new(
            ParseErrorKind::UnexpectedToken,
            "expected expression",
            Position::new(1, 3, 2u32),
            "",
        )
        .into();
        assert_eq!(err.position().map(|p| p.line), Some(1));

        let err: SqlError = CycleError {
            cycle: vec!["a".into(), "b".into(), "a".into()],
        }
        .into();
        assert_eq!(err.position(), None);
        assert!(err.to_string().contains("a -> b -> a"));
    }

    #[test]
    fn test_snippet_at() {
        let sql = "SELECT 1\nFROM t\n";
        assert_eq!(snippet_at(sql, Position::new(2, 1, 9u32)), "FROM t");
    }
}
