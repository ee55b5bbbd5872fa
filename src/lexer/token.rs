//! Logos-based raw token layer.
//!
//! Fast single-pass tokenization. This layer is purely structural: it knows
//! nothing about keywords (identifiers are classified later against the
//! keyword table) and nothing about parameter-symbol configuration. Shapes
//! that a DFA cannot express (nested block comments, dollar-quoted strings,
//! backslash-escaped strings) are lexed by callbacks scanning the remainder.

use logos::{Lexer, Logos};
use text_size::TextSize;

use crate::error::TokenizeErrorKind;

/// Mutable lexer state shared with callbacks, so a failing callback can
/// report *why* it failed instead of a bare error token.
#[derive(Debug, Default, Clone)]
pub struct RawLexerState {
    pub error: Option<TokenizeErrorKind>,
}

/// A raw token with its text and absolute offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSpanned<'a> {
    pub token: Result<RawToken, ()>,
    pub text: &'a str,
    pub offset: TextSize,
}

/// Iterate raw tokens with offset tracking.
pub struct RawTokens<'a> {
    inner: Lexer<'a, RawToken>,
}

impl<'a> RawTokens<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            inner: RawToken::lexer(input),
        }
    }

    /// The error kind recorded by the most recent failing callback, if any.
    pub fn take_error(&mut self) -> Option<TokenizeErrorKind> {
        self.inner.extras.error.take()
    }
}

impl<'a> Iterator for RawTokens<'a> {
    type Item = RawSpanned<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.inner.next()?;
        Some(RawSpanned {
            token,
            text: self.inner.slice(),
            offset: TextSize::new(self.inner.span().start as u32),
        })
    }
}

/// The raw token kinds.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[logos(extras = RawLexerState)]
pub enum RawToken {
    // =========================================================================
    // TRIVIA
    // =========================================================================
    #[regex(r"[ \t\r\n\x0c]+")]
    Whitespace,

    #[regex(r"--[^\n]*")]
    LineComment,

    #[token("/*", lex_block_comment)]
    BlockComment,

    // =========================================================================
    // LITERALS
    // =========================================================================
    /// `'…'` with `''` escapes.
    #[regex(r"'([^']|'')*'")]
    String,

    /// `E'…'` with backslash escapes (callback: `\'` does not terminate).
    #[regex(r"[eE]'", lex_escaped_string)]
    EscapedString,

    /// `$tag$ … $tag$` / `$$ … $$`.
    #[regex(r"\$([A-Za-z_][A-Za-z0-9_]*)?\$", lex_dollar_string)]
    DollarString,

    #[regex(r"[0-9]+(\.[0-9]*)?([eE][+-]?[0-9]+)?", priority = 12)]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?", priority = 12)]
    Number,

    /// Numeric junk like `123abc` or `1e+`, kept as a token so the wrapper can
    /// report `InvalidNumber` with the full offending slice.
    #[regex(r"[0-9]+(\.[0-9]*)?[eE][+-]?[A-Za-z_][A-Za-z0-9_]*", priority = 4)]
    #[regex(r"[0-9]+(\.[0-9]*)?[eE][+-]", priority = 3)]
    #[regex(r"[0-9]+[A-Za-z_][A-Za-z0-9_]*", priority = 3)]
    BadNumber,

    // =========================================================================
    // NAMES
    // =========================================================================
    #[regex(r#""([^"]|"")*""#)]
    QuotedIdent,

    #[regex(r"[\p{XID_Start}_][\p{XID_Continue}$]*")]
    Ident,

    // =========================================================================
    // PARAMETER MARKERS
    // =========================================================================
    #[regex(r":[A-Za-z_][A-Za-z0-9_]*")]
    ColonParam,

    #[regex(r"@[A-Za-z_][A-Za-z0-9_]*")]
    AtParam,

    #[regex(r"\$[0-9]+")]
    DollarParam,

    // =========================================================================
    // MULTI-CHARACTER OPERATORS (longest match wins)
    // =========================================================================
    #[token("::")]
    DoubleColon,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,
    #[token("<>")]
    LtGt,
    #[token("!=")]
    BangEq,
    #[token("||")]
    PipePipe,
    #[token("->>")]
    ArrowText,
    #[token("->")]
    Arrow,
    #[token("#>>")]
    HashArrowText,
    #[token("#>")]
    HashArrow,
    #[token("@>")]
    AtGt,
    #[token("<@")]
    LtAt,
    #[token("?|")]
    QuestionPipe,
    #[token("?&")]
    QuestionAmp,

    // =========================================================================
    // SINGLE-CHARACTER TOKENS
    // =========================================================================
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token(";")]
    Semicolon,
    #[token(":")]
    Colon,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("^")]
    Caret,
    #[token("=")]
    Eq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("?")]
    Question,
}

/// Block comments nest (`/* outer /* inner */ still outer */`).
fn lex_block_comment(lex: &mut Lexer<RawToken>) -> bool {
    let bytes = lex.remainder().as_bytes();
    let mut depth = 1usize;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'/' && bytes.get(i + 1) == Some(&b'*') {
            depth += 1;
            i += 2;
        } else if bytes[i] == b'*' && bytes.get(i + 1) == Some(&b'/') {
            depth -= 1;
            i += 2;
            if depth == 0 {
                lex.bump(i);
                return true;
            }
        } else {
            i += 1;
        }
    }
    lex.extras.error = Some(TokenizeErrorKind::UnterminatedComment);
    false
}

/// `E'…'`: backslash escapes any character, `''` is a literal quote.
fn lex_escaped_string(lex: &mut Lexer<RawToken>) -> bool {
    let bytes = lex.remainder().as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'\'' => {
                if bytes.get(i + 1) == Some(&b'\'') {
                    i += 2;
                } else {
                    lex.bump(i + 1);
                    return true;
                }
            }
            _ => i += 1,
        }
    }
    lex.extras.error = Some(TokenizeErrorKind::UnterminatedString);
    false
}

/// Scan for the matching closing tag of a dollar-quoted string.
fn lex_dollar_string(lex: &mut Lexer<RawToken>) -> bool {
    let tag = lex.slice().to_owned();
    match lex.remainder().find(&tag) {
        Some(pos) => {
            lex.bump(pos + tag.len());
            true
        }
        None => {
            lex.extras.error = Some(TokenizeErrorKind::UnterminatedDollarQuote);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<Result<RawToken, ()>> {
        RawTokens::new(input).map(|t| t.token).collect()
    }

    #[test]
    fn test_lex_select() {
        let tokens: Vec<_> = RawTokens::new("SELECT id FROM t").collect();
        assert_eq!(tokens.len(), 7); // 4 idents + 3 whitespace runs
        assert_eq!(tokens[0].token, Ok(RawToken::Ident));
        assert_eq!(tokens[0].text, "SELECT");
        assert_eq!(tokens[2].text, "id");
    }

    #[test]
    fn test_lex_operators_longest_match() {
        assert_eq!(
            kinds("a->>b"),
            vec![Ok(RawToken::Ident), Ok(RawToken::ArrowText), Ok(RawToken::Ident)]
        );
        assert_eq!(
            kinds("x::int"),
            vec![Ok(RawToken::Ident), Ok(RawToken::DoubleColon), Ok(RawToken::Ident)]
        );
    }

    #[test]
    fn test_lex_string_with_doubled_quote() {
        let tokens: Vec<_> = RawTokens::new("'it''s'").collect();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].token, Ok(RawToken::String));
        assert_eq!(tokens[0].text, "'it''s'");
    }

    #[test]
    fn test_lex_dollar_string() {
        let tokens: Vec<_> = RawTokens::new("$fn$ body 'x' $fn$").collect();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].token, Ok(RawToken::DollarString));
    }

    #[test]
    fn test_lex_dollar_param_not_dollar_string() {
        assert_eq!(kinds("$1"), vec![Ok(RawToken::DollarParam)]);
    }

    #[test]
    fn test_lex_nested_block_comment() {
        let tokens: Vec<_> = RawTokens::new("/* a /* b */ c */x").collect();
        assert_eq!(tokens[0].token, Ok(RawToken::BlockComment));
        assert_eq!(tokens[1].token, Ok(RawToken::Ident));
        assert_eq!(tokens[1].text, "x");
    }

    #[test]
    fn test_lex_unterminated_comment_sets_error() {
        let mut lexer = RawTokens::new("/* never closed");
        let first = lexer.next().unwrap();
        assert!(first.token.is_err());
        assert_eq!(
            lexer.take_error(),
            Some(TokenizeErrorKind::UnterminatedComment)
        );
    }

    #[test]
    fn test_lex_bad_number() {
        assert_eq!(kinds("123abc"), vec![Ok(RawToken::BadNumber)]);
        assert_eq!(kinds("1e+"), vec![Ok(RawToken::BadNumber)]);
        assert_eq!(
            kinds("1e5 2.5e-3 .5"),
            vec![
                Ok(RawToken::Number),
                Ok(RawToken::Whitespace),
                Ok(RawToken::Number),
                Ok(RawToken::Whitespace),
                Ok(RawToken::Number)
            ]
        );
    }

    #[test]
    fn test_lex_params() {
        assert_eq!(
            kinds(":name @tag $3"),
            vec![
                Ok(RawToken::ColonParam),
                Ok(RawToken::Whitespace),
                Ok(RawToken::AtParam),
                Ok(RawToken::Whitespace),
                Ok(RawToken::DollarParam)
            ]
        );
    }
}
