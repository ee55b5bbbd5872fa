//! The low-level SQL writer: token spacing, breaks, indentation, parameter
//! collection.

use indexmap::IndexMap;
use serde_json::Value;
use smol_str::SmolStr;
use unicode_ident::{is_xid_continue, is_xid_start};

use crate::ast::{Comment, Ident, ParamExpr};
use crate::lexer::Keyword;

use super::options::{BreakStyle, CommentMode, FormatOptions, KeywordCase, ParamStyle, ParamSymbol};

/// Parameter bindings collected during emission.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundParams {
    /// Name to bound value; unbound parameters are omitted.
    Named(IndexMap<String, Value>),
    /// Positional values in emission order; unbound slots are `Value::Null`.
    Positional(Vec<Value>),
}

impl BoundParams {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Named(map) => map.is_empty(),
            Self::Positional(values) => values.is_empty(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        match self {
            Self::Named(map) => map.get(name),
            Self::Positional(_) => None,
        }
    }
}

pub(crate) struct SqlWriter<'o> {
    pub(crate) options: &'o FormatOptions,
    out: String,
    indent: usize,
    /// Index assignment for `Indexed` style: name -> 1-based index.
    indices: IndexMap<SmolStr, usize>,
    named: IndexMap<String, Value>,
    positional: Vec<Value>,
    suppress_space: bool,
}

impl<'o> SqlWriter<'o> {
    pub(crate) fn new(options: &'o FormatOptions) -> Self {
        Self {
            options,
            out: String::new(),
            indent: 0,
            indices: IndexMap::new(),
            named: IndexMap::new(),
            positional: Vec::new(),
            suppress_space: false,
        }
    }

    pub(crate) fn finish(self) -> (String, BoundParams) {
        let params = match self.options.parameter_style {
            ParamStyle::Named => BoundParams::Named(self.named),
            ParamStyle::Indexed | ParamStyle::Anonymous => {
                BoundParams::Positional(self.positional)
            }
        };
        (self.out, params)
    }

    // -----------------------------------------------------------------
    // Raw emission
    // -----------------------------------------------------------------

    fn needs_space(&self) -> bool {
        match self.out.chars().last() {
            None => false,
            Some(c) => !matches!(c, ' ' | '\n' | '\t' | '(' | '[' | '.'),
        }
    }

    /// Glue the next word to the current output (unary signs).
    pub(crate) fn no_space_next(&mut self) {
        self.suppress_space = true;
    }

    /// A token that wants a space before it.
    pub(crate) fn word(&mut self, text: &str) {
        if std::mem::take(&mut self.suppress_space) {
            self.out.push_str(text);
            return;
        }
        if self.needs_space() {
            self.out.push(' ');
        }
        self.out.push_str(text);
    }

    /// A token glued to the previous output (`,`, `)`, `::`, `.`).
    pub(crate) fn glue(&mut self, text: &str) {
        self.out.push_str(text);
    }

    pub(crate) fn keyword(&mut self, kw: Keyword) {
        self.keyword_text(kw.as_str());
    }

    pub(crate) fn keyword_text(&mut self, text: &str) {
        let rendered = match self.options.keyword_case {
            KeywordCase::Upper | KeywordCase::Preserve => text.to_ascii_uppercase(),
            KeywordCase::Lower => text.to_ascii_lowercase(),
        };
        self.word(&rendered);
    }

    pub(crate) fn ident(&mut self, ident: &Ident) {
        let rendered = self.render_ident(ident);
        self.word(&rendered);
    }

    /// An identifier glued after a dot.
    pub(crate) fn ident_glued(&mut self, ident: &Ident) {
        let rendered = self.render_ident(ident);
        self.glue(&rendered);
    }

    fn render_ident(&self, ident: &Ident) -> String {
        let (open, close) = self.options.identifier_quote;
        if ident.quoted || needs_quoting(&ident.text) {
            let mut escaped = String::with_capacity(ident.text.len() + 2);
            escaped.push(open);
            for c in ident.text.chars() {
                if c == close {
                    escaped.push(close);
                }
                escaped.push(c);
            }
            escaped.push(close);
            escaped
        } else {
            ident.text.to_string()
        }
    }

    pub(crate) fn string_literal(&mut self, value: &str) {
        let escaped = value.replace('\'', "''");
        if self.needs_space() {
            self.out.push(' ');
        }
        self.out.push('\'');
        self.out.push_str(&escaped);
        self.out.push('\'');
    }

    // -----------------------------------------------------------------
    // Layout
    // -----------------------------------------------------------------

    pub(crate) fn indented<F: FnOnce(&mut Self)>(&mut self, f: F) {
        self.indent += 1;
        f(self);
        self.indent -= 1;
    }

    /// Break before a clause keyword in multi-line mode; a plain space
    /// separator otherwise.
    pub(crate) fn clause_break(&mut self) {
        if self.options.is_multiline() {
            self.newline();
        }
    }

    pub(crate) fn newline(&mut self) {
        if self.options.is_multiline() {
            self.out.push_str(self.options.newline.as_str());
            self.out.push_str(&self.options.indent(self.indent));
        }
    }

    /// A list separator honoring the configured comma break.
    pub(crate) fn comma(&mut self) {
        if !self.options.is_multiline() {
            self.glue(",");
            return;
        }
        match self.options.comma_break {
            BreakStyle::Before => {
                self.newline();
                self.glue(", ");
            }
            BreakStyle::After => {
                self.glue(",");
                self.newline();
            }
            BreakStyle::None => self.glue(","),
        }
    }

    /// Emit AND/OR honoring the configured break.
    pub(crate) fn and_or(&mut self, text: &str) {
        if !self.options.is_multiline() {
            self.keyword_text(text);
            return;
        }
        match self.options.and_or_break {
            BreakStyle::Before => {
                self.newline();
                self.keyword_text(text);
            }
            BreakStyle::After => {
                self.keyword_text(text);
                self.newline();
            }
            BreakStyle::None => self.keyword_text(text),
        }
    }

    // -----------------------------------------------------------------
    // Comments
    // -----------------------------------------------------------------

    pub(crate) fn comments_before(&mut self, comments: &[Comment]) {
        if self.options.comment_mode == CommentMode::None {
            return;
        }
        for comment in comments {
            self.emit_comment(comment);
        }
    }

    pub(crate) fn comments_after(&mut self, comments: &[Comment]) {
        if self.options.comment_mode != CommentMode::Full {
            return;
        }
        for comment in comments {
            self.emit_comment(comment);
        }
    }

    fn emit_comment(&mut self, comment: &Comment) {
        if self.options.is_multiline() && !comment.block {
            self.word("--");
            if !comment.text.is_empty() {
                self.out.push(' ');
                self.out.push_str(&comment.text);
            }
            self.newline();
        } else {
            // Line comments are re-emitted block style so single-line output
            // stays a single line.
            self.word("/*");
            self.out.push(' ');
            self.out.push_str(&comment.text);
            self.out.push_str(" */");
        }
    }

    // -----------------------------------------------------------------
    // Parameters
    // -----------------------------------------------------------------

    pub(crate) fn param(&mut self, param: &ParamExpr) {
        match self.options.parameter_style {
            ParamStyle::Named => {
                let rendered = self.render_param_marker(&param.name);
                self.word(&rendered);
                if let Some(value) = &param.value {
                    self.named
                        .entry(param.name.to_string())
                        .or_insert_with(|| value.clone());
                }
            }
            ParamStyle::Indexed => {
                let next = self.indices.len() + 1;
                let index = *self.indices.entry(param.name.clone()).or_insert(next);
                if index > self.positional.len() {
                    self.positional
                        .push(param.value.clone().unwrap_or(Value::Null));
                }
                let rendered = self.render_param_marker(&index.to_string());
                self.word(&rendered);
            }
            ParamStyle::Anonymous => {
                self.positional
                    .push(param.value.clone().unwrap_or(Value::Null));
                let rendered = self.render_param_marker("");
                self.word(&rendered);
            }
        }
    }

    fn render_param_marker(&self, name: &str) -> String {
        match &self.options.parameter_symbol {
            ParamSymbol::Colon => format!(":{name}"),
            ParamSymbol::At => format!("@{name}"),
            ParamSymbol::Dollar => format!("${name}"),
            ParamSymbol::Question => "?".to_string(),
            ParamSymbol::Custom { prefix, suffix } => format!("{prefix}{name}{suffix}"),
        }
    }
}

/// Whether an identifier must be quoted to survive a round trip.
fn needs_quoting(text: &str) -> bool {
    if text.is_empty() {
        return true;
    }
    let mut chars = text.chars();
    let first = chars.next().expect("nonempty");
    if !(is_xid_start(first) || first == '_') {
        return true;
    }
    if !chars.all(|c| is_xid_continue(c) || c == '$') {
        return true;
    }
    // A word that the lexer would classify as a keyword needs quotes.
    Keyword::from_ident(text).is_some_and(|k| k.is_reserved())
}
