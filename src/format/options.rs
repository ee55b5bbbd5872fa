//! Formatter configuration.

/// Leading (and for custom styles, trailing) text of an emitted parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamSymbol {
    /// `:name`
    Colon,
    /// `@name`
    At,
    /// `$1`
    Dollar,
    /// `?`
    Question,
    /// Asymmetric custom markers, e.g. `${name}`.
    Custom { prefix: String, suffix: String },
}

/// How parameters are rendered and collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParamStyle {
    /// Markers keep their names; bindings are a name-to-value map.
    #[default]
    Named,
    /// Markers become 1-based indices (one per distinct name, in emission
    /// order); bindings are positional.
    Indexed,
    /// Every marker renders the bare symbol; bindings are positional with
    /// one entry per occurrence.
    Anonymous,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeywordCase {
    #[default]
    Upper,
    Lower,
    /// Keywords are not stored textually in the AST, so `Preserve` emits the
    /// canonical (uppercase) spelling; identifier casing is always preserved.
    Preserve,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NewlineStyle {
    Lf,
    CrLf,
    /// Single-line output.
    #[default]
    None,
}

impl NewlineStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
            Self::None => " ",
        }
    }
}

/// Where the separator lands relative to the break, for comma and AND/OR
/// lists in multi-line output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BreakStyle {
    Before,
    #[default]
    After,
    None,
}

/// Which attached comments the formatter re-emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommentMode {
    None,
    /// Header and before-comments only.
    Leading,
    #[default]
    Full,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormatOptions {
    pub parameter_symbol: ParamSymbol,
    pub parameter_style: ParamStyle,
    /// Start and end quote characters for identifiers.
    pub identifier_quote: (char, char),
    pub keyword_case: KeywordCase,
    pub indent_size: usize,
    pub indent_char: char,
    pub newline: NewlineStyle,
    pub comma_break: BreakStyle,
    pub and_or_break: BreakStyle,
    pub comment_mode: CommentMode,
    /// Re-emit from the retained lexeme stream, byte for byte.
    pub preserve_original_formatting: bool,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            parameter_symbol: ParamSymbol::Colon,
            parameter_style: ParamStyle::Named,
            identifier_quote: ('"', '"'),
            keyword_case: KeywordCase::Upper,
            indent_size: 4,
            indent_char: ' ',
            newline: NewlineStyle::None,
            comma_break: BreakStyle::After,
            and_or_break: BreakStyle::After,
            comment_mode: CommentMode::Full,
            preserve_original_formatting: false,
        }
    }
}

impl FormatOptions {
    /// A compact single-line profile with comments dropped, the shape used
    /// by generated-SQL call sites.
    pub fn compact() -> Self {
        Self {
            newline: NewlineStyle::None,
            comment_mode: CommentMode::None,
            ..Self::default()
        }
    }

    /// A multi-line pretty-printing profile.
    pub fn pretty() -> Self {
        Self {
            newline: NewlineStyle::Lf,
            ..Self::default()
        }
    }

    pub fn indent(&self, level: usize) -> String {
        std::iter::repeat_n(self.indent_char, self.indent_size * level).collect()
    }

    pub(crate) fn is_multiline(&self) -> bool {
        self.newline != NewlineStyle::None
    }
}
