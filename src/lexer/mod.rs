//! Tokenizer: SQL text to a classified lexeme stream.
//!
//! The raw Logos layer ([`token`]) produces structural tokens; this module
//! classifies them against the keyword table, folds whitespace and comments
//! into attached trivia, and tracks full source positions.

pub mod keywords;
mod lexeme;
mod token;

pub use keywords::Keyword;
pub use lexeme::{Comment, Lexeme, LexemeKind, Op, Punct, StringStyle};

use smol_str::SmolStr;

use crate::base::{LineIndex, Position, Span, TextSize};
use crate::error::{TokenizeError, TokenizeErrorKind, snippet_at};

use token::{RawToken, RawTokens};

/// Tokenizer configuration.
#[derive(Debug, Clone)]
pub struct LexerOptions {
    /// Leading symbols accepted as parameter markers. `:` and `@` introduce
    /// named parameters, `$` positional ones, `?` anonymous ones.
    pub parameter_symbols: Vec<char>,
    /// Discard comments entirely when false.
    pub keep_comments: bool,
    /// Record the exact whitespace run preceding every lexeme so the source
    /// can be reconstructed byte for byte.
    pub preserve_whitespace: bool,
}

impl Default for LexerOptions {
    fn default() -> Self {
        Self {
            parameter_symbols: vec![':', '@', '$', '?'],
            keep_comments: true,
            preserve_whitespace: false,
        }
    }
}

/// Tokenize strictly: any malformed input is an error.
pub fn tokenize(sql: &str, options: &LexerOptions) -> Result<Vec<Lexeme>, TokenizeError> {
    let (lexemes, error) = run(sql, options, false);
    match error {
        Some(err) => Err(err),
        None => Ok(lexemes),
    }
}

/// Tokenize in recovery mode: on malformed input, return the lexemes
/// assembled so far (the last one marked incomplete) plus the diagnostic.
pub fn tokenize_lossy(sql: &str, options: &LexerOptions) -> (Vec<Lexeme>, Option<TokenizeError>) {
    run(sql, options, true)
}

fn run(
    sql: &str,
    options: &LexerOptions,
    lossy: bool,
) -> (Vec<Lexeme>, Option<TokenizeError>) {
    let index = LineIndex::new(sql);
    let mut raw = RawTokens::new(sql);
    let mut lexemes: Vec<Lexeme> = Vec::new();

    let mut pending_ws = String::new();
    let mut pending_leading: Vec<Comment> = Vec::new();
    let mut newline_since_last = false;
    let mut anon_params = 0u32;

    let span_of = |offset: TextSize, text: &str| -> Span {
        Span::new(
            index.position_at(offset),
            index.position_at(u32::from(offset) + text.len() as u32),
        )
    };

    while let Some(spanned) = raw.next() {
        let text = spanned.text;
        let span = span_of(spanned.offset, text);

        let token = match spanned.token {
            Ok(t) => t,
            Err(()) => {
                let kind = raw
                    .take_error()
                    .unwrap_or_else(|| classify_error(text));
                let error = TokenizeError::new(kind, span.start, snippet_at(sql, span.start));
                if lossy && let Some(last) = lexemes.last_mut() {
                    last.incomplete = true;
                }
                return (lexemes, Some(error));
            }
        };

        match token {
            RawToken::Whitespace => {
                if text.contains('\n') {
                    newline_since_last = true;
                }
                if options.preserve_whitespace {
                    pending_ws.push_str(text);
                }
            }
            RawToken::LineComment | RawToken::BlockComment => {
                if !options.keep_comments {
                    continue;
                }
                let block = token == RawToken::BlockComment;
                let content = if block {
                    text.trim_start_matches("/*").trim_end_matches("*/").trim()
                } else {
                    text.trim_start_matches("--").trim()
                };
                let comment = Comment {
                    text: SmolStr::new(content),
                    block,
                    span,
                    raw: SmolStr::new(text),
                    ws_before: SmolStr::new(std::mem::take(&mut pending_ws)),
                };
                if !newline_since_last && !lexemes.is_empty() && pending_leading.is_empty() {
                    lexemes
                        .last_mut()
                        .expect("nonempty")
                        .trailing
                        .push(comment);
                } else {
                    pending_leading.push(comment);
                }
            }
            _ => {
                match classify(token, text, span, options, &mut anon_params) {
                    Classified::One(mut lexeme) => {
                        lexeme.leading = std::mem::take(&mut pending_leading);
                        lexeme.whitespace = SmolStr::new(std::mem::take(&mut pending_ws));
                        lexemes.push(lexeme);
                    }
                    Classified::Two(mut first, second) => {
                        first.leading = std::mem::take(&mut pending_leading);
                        first.whitespace = SmolStr::new(std::mem::take(&mut pending_ws));
                        lexemes.push(first);
                        lexemes.push(second);
                    }
                    Classified::Fail(kind) => {
                        let error =
                            TokenizeError::new(kind, span.start, snippet_at(sql, span.start));
                        if lossy {
                            if let Some(last) = lexemes.last_mut() {
                                last.incomplete = true;
                            }
                        }
                        return (lexemes, Some(error));
                    }
                }
                newline_since_last = false;
            }
        }
    }

    // Comments after the final token attach as its trailing trivia.
    if let Some(last) = lexemes.last_mut() {
        last.trailing.append(&mut pending_leading);
    }

    (lexemes, None)
}

enum Classified {
    One(Lexeme),
    /// A split token, e.g. `:tag` when `:` is not a parameter symbol.
    Two(Lexeme, Lexeme),
    Fail(TokenizeErrorKind),
}

fn classify(
    token: RawToken,
    text: &str,
    span: Span,
    options: &LexerOptions,
    anon_params: &mut u32,
) -> Classified {
    use Classified::One;

    let lexeme = |kind: LexemeKind, normalized: &str| {
        Lexeme::new(kind, normalized, text, span)
    };

    match token {
        RawToken::Ident => match Keyword::from_ident(text) {
            Some(Keyword::TRUE) | Some(Keyword::FALSE) => One(lexeme(LexemeKind::Bool, text)),
            Some(Keyword::NULL) => One(lexeme(LexemeKind::Null, text)),
            Some(kw) => One(lexeme(LexemeKind::Keyword(kw), kw.as_str())),
            None => One(lexeme(LexemeKind::Ident, text)),
        },
        RawToken::QuotedIdent => {
            let inner = text[1..text.len() - 1].replace("\"\"", "\"");
            One(lexeme(LexemeKind::QuotedIdent, &inner))
        }
        RawToken::Number => One(lexeme(LexemeKind::Number, text)),
        RawToken::BadNumber => Classified::Fail(TokenizeErrorKind::InvalidNumber),
        RawToken::String => {
            let inner = text[1..text.len() - 1].replace("''", "'");
            One(lexeme(LexemeKind::String(StringStyle::Plain), &inner))
        }
        RawToken::EscapedString => {
            let inner = unescape_backslashes(&text[2..text.len() - 1]);
            One(lexeme(LexemeKind::String(StringStyle::Escaped), &inner))
        }
        RawToken::DollarString => {
            let tag_end = text[1..].find('$').expect("dollar tag") + 2;
            let inner = &text[tag_end..text.len() - tag_end];
            One(lexeme(LexemeKind::String(StringStyle::Dollar), inner))
        }
        RawToken::ColonParam => {
            if options.parameter_symbols.contains(&':') {
                One(lexeme(LexemeKind::Param { index: None }, &text[1..]))
            } else {
                // Re-split into `:` and a bare identifier.
                let mid = Position::new(span.start.line, span.start.column + 1, u32::from(span.start.offset) + 1);
                let colon = Lexeme::new(
                    LexemeKind::Punct(Punct::Colon),
                    ":",
                    ":",
                    Span::new(span.start, mid),
                );
                let name = Lexeme::new(
                    LexemeKind::Ident,
                    &text[1..],
                    &text[1..],
                    Span::new(mid, span.end),
                );
                Classified::Two(colon, name)
            }
        }
        RawToken::AtParam => {
            if options.parameter_symbols.contains(&'@') {
                One(lexeme(LexemeKind::Param { index: None }, &text[1..]))
            } else {
                Classified::Fail(TokenizeErrorKind::InvalidCharacter)
            }
        }
        RawToken::DollarParam => {
            if options.parameter_symbols.contains(&'$') {
                let index = text[1..].parse::<u32>().ok();
                One(Lexeme::new(
                    LexemeKind::Param { index },
                    &text[1..],
                    text,
                    span,
                ))
            } else {
                Classified::Fail(TokenizeErrorKind::InvalidCharacter)
            }
        }
        RawToken::Question => {
            if options.parameter_symbols.contains(&'?') {
                *anon_params += 1;
                One(Lexeme::new(
                    LexemeKind::Param {
                        index: Some(*anon_params),
                    },
                    "",
                    text,
                    span,
                ))
            } else {
                One(lexeme(LexemeKind::Op(Op::Question), text))
            }
        }

        RawToken::DoubleColon => One(lexeme(LexemeKind::Op(Op::DoubleColon), text)),
        RawToken::LtEq => One(lexeme(LexemeKind::Op(Op::LtEq), text)),
        RawToken::GtEq => One(lexeme(LexemeKind::Op(Op::GtEq), text)),
        RawToken::LtGt | RawToken::BangEq => One(lexeme(LexemeKind::Op(Op::Neq), text)),
        RawToken::PipePipe => One(lexeme(LexemeKind::Op(Op::Concat), text)),
        RawToken::Arrow => One(lexeme(LexemeKind::Op(Op::Arrow), text)),
        RawToken::ArrowText => One(lexeme(LexemeKind::Op(Op::ArrowText), text)),
        RawToken::HashArrow => One(lexeme(LexemeKind::Op(Op::HashArrow), text)),
        RawToken::HashArrowText => One(lexeme(LexemeKind::Op(Op::HashArrowText), text)),
        RawToken::AtGt => One(lexeme(LexemeKind::Op(Op::AtGt), text)),
        RawToken::LtAt => One(lexeme(LexemeKind::Op(Op::LtAt), text)),
        RawToken::QuestionPipe => One(lexeme(LexemeKind::Op(Op::QuestionPipe), text)),
        RawToken::QuestionAmp => One(lexeme(LexemeKind::Op(Op::QuestionAmp), text)),
        RawToken::Plus => One(lexeme(LexemeKind::Op(Op::Plus), text)),
        RawToken::Minus => One(lexeme(LexemeKind::Op(Op::Minus), text)),
        RawToken::Star => One(lexeme(LexemeKind::Op(Op::Star), text)),
        RawToken::Slash => One(lexeme(LexemeKind::Op(Op::Slash), text)),
        RawToken::Percent => One(lexeme(LexemeKind::Op(Op::Percent), text)),
        RawToken::Caret => One(lexeme(LexemeKind::Op(Op::Caret), text)),
        RawToken::Eq => One(lexeme(LexemeKind::Op(Op::Eq), text)),
        RawToken::Lt => One(lexeme(LexemeKind::Op(Op::Lt), text)),
        RawToken::Gt => One(lexeme(LexemeKind::Op(Op::Gt), text)),

        RawToken::LParen => One(lexeme(LexemeKind::Punct(Punct::LParen), text)),
        RawToken::RParen => One(lexeme(LexemeKind::Punct(Punct::RParen), text)),
        RawToken::LBracket => One(lexeme(LexemeKind::Punct(Punct::LBracket), text)),
        RawToken::RBracket => One(lexeme(LexemeKind::Punct(Punct::RBracket), text)),
        RawToken::Comma => One(lexeme(LexemeKind::Punct(Punct::Comma), text)),
        RawToken::Dot => One(lexeme(LexemeKind::Punct(Punct::Dot), text)),
        RawToken::Semicolon => One(lexeme(LexemeKind::Punct(Punct::Semicolon), text)),
        RawToken::Colon => One(lexeme(LexemeKind::Punct(Punct::Colon), text)),

        RawToken::Whitespace | RawToken::LineComment | RawToken::BlockComment => {
            unreachable!("trivia handled by the assembly loop")
        }
    }
}

fn classify_error(text: &str) -> TokenizeErrorKind {
    let mut chars = text.chars();
    match chars.next() {
        Some('\'') => TokenizeErrorKind::UnterminatedString,
        Some('e') | Some('E') if chars.next() == Some('\'') => {
            TokenizeErrorKind::UnterminatedString
        }
        Some('"') => TokenizeErrorKind::UnterminatedQuotedIdent,
        Some(c) if c.is_ascii_digit() => TokenizeErrorKind::InvalidNumber,
        _ => TokenizeErrorKind::InvalidCharacter,
    }
}

fn unescape_backslashes(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('r') => out.push('\r'),
                Some('b') => out.push('\u{8}'),
                Some('f') => out.push('\u{c}'),
                Some(other) => out.push(other),
                None => out.push('\\'),
            }
        } else if c == '\'' {
            // A doubled quote inside E'…'.
            chars.next();
            out.push('\'');
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(sql: &str) -> Vec<Lexeme> {
        tokenize(sql, &LexerOptions::default()).expect("tokenize")
    }

    #[test]
    fn test_keywords_classified() {
        let lexemes = lex("select id from users");
        assert!(lexemes[0].is_keyword(Keyword::SELECT));
        assert_eq!(lexemes[0].text, "SELECT");
        assert_eq!(lexemes[0].raw, "select");
        assert_eq!(lexemes[1].kind, LexemeKind::Ident);
        assert!(lexemes[2].is_keyword(Keyword::FROM));
    }

    #[test]
    fn test_spans_strictly_increasing() {
        let lexemes = lex("SELECT a, b FROM t WHERE a = 1");
        for pair in lexemes.windows(2) {
            assert!(pair[0].span.end.offset <= pair[1].span.start.offset);
            assert!(!pair[0].span.is_empty());
        }
    }

    #[test]
    fn test_leading_comment_attachment() {
        let lexemes = lex("-- header\nSELECT 1");
        assert_eq!(lexemes[0].leading.len(), 1);
        assert_eq!(lexemes[0].leading[0].text, "header");
    }

    #[test]
    fn test_trailing_comment_attachment() {
        let lexemes = lex("SELECT 1 -- one\n, 2");
        // `-- one` sits on the same line as `1`.
        let one = lexemes.iter().find(|l| l.raw == "1").unwrap();
        assert_eq!(one.trailing.len(), 1);
        assert_eq!(one.trailing[0].text, "one");
    }

    #[test]
    fn test_comment_attached_exactly_once() {
        let lexemes = lex("SELECT /* c */ 1");
        let total: usize = lexemes.iter().map(|l| l.leading.len() + l.trailing.len()).sum();
        assert_eq!(total, 1);
    }

    #[test]
    fn test_bool_and_null_literals() {
        let lexemes = lex("true FALSE null");
        assert_eq!(lexemes[0].kind, LexemeKind::Bool);
        assert_eq!(lexemes[1].kind, LexemeKind::Bool);
        assert_eq!(lexemes[2].kind, LexemeKind::Null);
    }

    #[test]
    fn test_named_and_positional_params() {
        let lexemes = lex("WHERE a = :status AND b = $2");
        let named = lexemes.iter().find(|l| l.raw == ":status").unwrap();
        assert_eq!(named.kind, LexemeKind::Param { index: None });
        assert_eq!(named.text, "status");
        let positional = lexemes.iter().find(|l| l.raw == "$2").unwrap();
        assert_eq!(positional.kind, LexemeKind::Param { index: Some(2) });
    }

    #[test]
    fn test_question_param_vs_operator() {
        let lexemes = lex("a = ?");
        assert!(matches!(lexemes[2].kind, LexemeKind::Param { index: Some(1) }));

        let options = LexerOptions {
            parameter_symbols: vec![':'],
            ..LexerOptions::default()
        };
        let lexemes = tokenize("a ? 'k'", &options).unwrap();
        assert!(lexemes[1].is_op(Op::Question));
    }

    #[test]
    fn test_string_unescaping() {
        let lexemes = lex("'it''s'");
        assert_eq!(lexemes[0].text, "it's");
        let lexemes = lex(r"E'line\n'");
        assert_eq!(lexemes[0].text, "line\n");
        let lexemes = lex("$q$raw 'text'$q$");
        assert_eq!(lexemes[0].text, "raw 'text'");
    }

    #[test]
    fn test_unterminated_string_errors() {
        let err = tokenize("SELECT 'oops", &LexerOptions::default()).unwrap_err();
        assert_eq!(err.kind, TokenizeErrorKind::UnterminatedString);
        assert_eq!(err.position.line, 1);
    }

    #[test]
    fn test_lossy_marks_incomplete() {
        let (lexemes, error) = tokenize_lossy("SELECT 'oops", &LexerOptions::default());
        assert!(error.is_some());
        assert!(lexemes.last().unwrap().incomplete);
    }

    #[test]
    fn test_preserved_whitespace() {
        let options = LexerOptions {
            preserve_whitespace: true,
            ..LexerOptions::default()
        };
        let lexemes = tokenize("SELECT   1\n\tFROM t", &options).unwrap();
        assert_eq!(lexemes[1].whitespace, "   ");
        assert_eq!(lexemes[2].whitespace, "\n\t");
    }

    #[test]
    fn test_discard_comments() {
        let options = LexerOptions {
            keep_comments: false,
            ..LexerOptions::default()
        };
        let lexemes = tokenize("-- gone\nSELECT 1", &options).unwrap();
        assert!(lexemes[0].leading.is_empty());
    }
}
