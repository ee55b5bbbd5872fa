//! Lexemes: the classified tokens the parser consumes.
//!
//! A lexeme carries its semantic category, normalized and original text, a
//! source span, and the comments attached to it. When formatting preservation
//! is requested it also records the exact whitespace run preceding it, so the
//! original layout can be reconstructed byte for byte.

use smol_str::SmolStr;

use crate::base::Span;

use super::keywords::Keyword;

/// Punctuation that structures the grammar rather than combining values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Punct {
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Dot,
    Semicolon,
    Colon,
}

impl Punct {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LParen => "(",
            Self::RParen => ")",
            Self::LBracket => "[",
            Self::RBracket => "]",
            Self::Comma => ",",
            Self::Dot => ".",
            Self::Semicolon => ";",
            Self::Colon => ":",
        }
    }
}

/// Operator symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    Eq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    Neq,
    DoubleColon,
    Concat,
    Arrow,
    ArrowText,
    HashArrow,
    HashArrowText,
    AtGt,
    LtAt,
    Question,
    QuestionPipe,
    QuestionAmp,
}

impl Op {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Star => "*",
            Self::Slash => "/",
            Self::Percent => "%",
            Self::Caret => "^",
            Self::Eq => "=",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::LtEq => "<=",
            Self::GtEq => ">=",
            Self::Neq => "<>",
            Self::DoubleColon => "::",
            Self::Concat => "||",
            Self::Arrow => "->",
            Self::ArrowText => "->>",
            Self::HashArrow => "#>",
            Self::HashArrowText => "#>>",
            Self::AtGt => "@>",
            Self::LtAt => "<@",
            Self::Question => "?",
            Self::QuestionPipe => "?|",
            Self::QuestionAmp => "?&",
        }
    }
}

/// How a string literal was written in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringStyle {
    /// `'…'`
    Plain,
    /// `E'…'`
    Escaped,
    /// `$tag$…$tag$`; the tag (without dollars) is kept on the lexeme text.
    Dollar,
}

/// The semantic category of a lexeme.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LexemeKind {
    Keyword(Keyword),
    Ident,
    /// A `"…"` identifier; `text` holds the unescaped inner name.
    QuotedIdent,
    Number,
    /// A string literal; `text` holds the unescaped value.
    String(StringStyle),
    Bool,
    Null,
    /// A parameter marker; `text` holds the name, `index` the numeric
    /// position for positional dialects (`$3` gives `Some(3)`).
    Param { index: Option<u32> },
    Op(Op),
    Punct(Punct),
}

/// A comment attached to a lexeme (and later to an AST component).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Comment {
    /// Content without the `--` / `/* */` markers, trimmed.
    pub text: SmolStr,
    pub block: bool,
    pub span: Span,
    /// The original source slice including markers.
    pub raw: SmolStr,
    /// Whitespace between the previous token (or comment) and this comment;
    /// only populated when whitespace preservation is on.
    pub ws_before: SmolStr,
}

impl Comment {
    pub fn line(text: impl Into<SmolStr>, span: Span) -> Self {
        let text = text.into();
        let raw = SmolStr::new(format!("-- {text}"));
        Self {
            text,
            block: false,
            span,
            raw,
            ws_before: SmolStr::default(),
        }
    }

    pub fn block(text: impl Into<SmolStr>, span: Span) -> Self {
        let text = text.into();
        let raw = SmolStr::new(format!("/* {text} */"));
        Self {
            text,
            block: true,
            span,
            raw,
            ws_before: SmolStr::default(),
        }
    }
}

/// A classified token with attached trivia.
#[derive(Debug, Clone, PartialEq)]
pub struct Lexeme {
    pub kind: LexemeKind,
    /// Normalized text: uppercased for keywords, unescaped for quoted
    /// identifiers and strings, the bare name for parameters.
    pub text: SmolStr,
    /// The original source slice.
    pub raw: SmolStr,
    pub span: Span,
    /// Comments before this lexeme.
    pub leading: Vec<Comment>,
    /// Comments after this lexeme on the same source line.
    pub trailing: Vec<Comment>,
    /// Exact whitespace preceding this lexeme (empty unless whitespace
    /// preservation was requested).
    pub whitespace: SmolStr,
    /// Set in recovery mode on the final lexeme when input ended mid-token.
    pub incomplete: bool,
}

impl Lexeme {
    pub fn new(kind: LexemeKind, text: impl Into<SmolStr>, raw: impl Into<SmolStr>, span: Span) -> Self {
        Self {
            kind,
            text: text.into(),
            raw: raw.into(),
            span,
            leading: Vec::new(),
            trailing: Vec::new(),
            whitespace: SmolStr::default(),
            incomplete: false,
        }
    }

    pub fn is_keyword(&self, kw: Keyword) -> bool {
        matches!(self.kind, LexemeKind::Keyword(k) if k == kw)
    }

    pub fn keyword(&self) -> Option<Keyword> {
        match self.kind {
            LexemeKind::Keyword(k) => Some(k),
            _ => None,
        }
    }

    pub fn is_punct(&self, p: Punct) -> bool {
        matches!(self.kind, LexemeKind::Punct(q) if q == p)
    }

    pub fn is_op(&self, op: Op) -> bool {
        matches!(self.kind, LexemeKind::Op(o) if o == op)
    }

    /// The text usable as an identifier: identifiers, quoted identifiers, and
    /// non-reserved keywords qualify.
    pub fn as_ident(&self) -> Option<&str> {
        match &self.kind {
            LexemeKind::Ident | LexemeKind::QuotedIdent => Some(self.text.as_str()),
            LexemeKind::Keyword(k) if !k.is_reserved() => Some(self.raw.as_str()),
            _ => None,
        }
    }

    /// A short human-readable description for diagnostics.
    pub fn describe(&self) -> String {
        match &self.kind {
            LexemeKind::Keyword(k) => format!("keyword {k}"),
            LexemeKind::Ident | LexemeKind::QuotedIdent => format!("identifier '{}'", self.text),
            LexemeKind::Number => format!("number {}", self.raw),
            LexemeKind::String(_) => "string literal".to_string(),
            LexemeKind::Bool => format!("{}", self.raw),
            LexemeKind::Null => "NULL".to_string(),
            LexemeKind::Param { .. } => format!("parameter {}", self.raw),
            LexemeKind::Op(op) => format!("'{}'", op.as_str()),
            LexemeKind::Punct(p) => format!("'{}'", p.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::Position;

    fn span() -> Span {
        Span::new(Position::start(), Position::new(1, 3, 2u32))
    }

    #[test]
    fn test_as_ident() {
        let ident = Lexeme::new(LexemeKind::Ident, "users", "users", span());
        assert_eq!(ident.as_ident(), Some("users"));

        let kw = Lexeme::new(
            LexemeKind::Keyword(Keyword::SELECT),
            "SELECT",
            "select",
            span(),
        );
        assert_eq!(kw.as_ident(), None);

        // Non-reserved keywords keep their original spelling as identifier.
        let soft = Lexeme::new(LexemeKind::Keyword(Keyword::FIRST), "FIRST", "First", span());
        assert_eq!(soft.as_ident(), Some("First"));
    }

    #[test]
    fn test_describe() {
        let op = Lexeme::new(LexemeKind::Op(Op::Concat), "||", "||", span());
        assert_eq!(op.describe(), "'||'");
    }
}
