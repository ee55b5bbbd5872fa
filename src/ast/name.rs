//! Identifiers and qualified names.

use smol_str::SmolStr;

use crate::base::Span;

/// An identifier, tracking whether it was written quoted.
///
/// Equality is structural over text and quoting; the span (populated by the
/// parser, `None` on synthesized nodes) participates so use
/// [`crate::ast::strip_metadata`] before comparing trees from different
/// sources.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ident {
    pub text: SmolStr,
    pub quoted: bool,
    pub span: Option<Span>,
}

impl Ident {
    pub fn new(text: impl Into<SmolStr>) -> Self {
        Self {
            text: text.into(),
            quoted: false,
            span: None,
        }
    }

    pub fn quoted(text: impl Into<SmolStr>) -> Self {
        Self {
            text: text.into(),
            quoted: true,
            span: None,
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Name comparison. Case-sensitive by default; analyzers may opt into
    /// case-insensitive matching.
    pub fn matches(&self, other: &str, case_insensitive: bool) -> bool {
        if case_insensitive {
            self.text.eq_ignore_ascii_case(other)
        } else {
            self.text == other
        }
    }
}

impl From<&str> for Ident {
    fn from(text: &str) -> Self {
        Ident::new(text)
    }
}

impl std::fmt::Display for Ident {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.quoted {
            write!(f, "\"{}\"", self.text.replace('"', "\"\""))
        } else {
            f.write_str(&self.text)
        }
    }
}

/// Zero or more namespace identifiers plus a bare name (`schema.table`,
/// `db.schema.table.column`, or just `name`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifiedName {
    pub parts: Vec<Ident>,
}

impl QualifiedName {
    pub fn new(parts: Vec<Ident>) -> Self {
        debug_assert!(!parts.is_empty(), "qualified name needs at least one part");
        Self { parts }
    }

    pub fn bare(name: impl Into<SmolStr>) -> Self {
        Self {
            parts: vec![Ident::new(name)],
        }
    }

    pub fn from_parts<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SmolStr>,
    {
        Self {
            parts: parts.into_iter().map(Ident::new).collect(),
        }
    }

    /// The final component.
    pub fn name(&self) -> &Ident {
        self.parts.last().expect("nonempty name")
    }

    pub fn name_mut(&mut self) -> &mut Ident {
        self.parts.last_mut().expect("nonempty name")
    }

    /// Everything before the final component.
    pub fn namespaces(&self) -> &[Ident] {
        &self.parts[..self.parts.len() - 1]
    }

    pub fn is_bare(&self) -> bool {
        self.parts.len() == 1
    }

    /// True when this is a single unqualified identifier equal to `name`.
    pub fn is_bare_name(&self, name: &str, case_insensitive: bool) -> bool {
        self.is_bare() && self.parts[0].matches(name, case_insensitive)
    }

    /// The dotted rendering without quoting, used as a lookup key.
    pub fn key(&self) -> String {
        self.parts
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl std::fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{part}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ident_display_quoting() {
        assert_eq!(Ident::new("users").to_string(), "users");
        assert_eq!(Ident::quoted("User \"A\"").to_string(), "\"User \"\"A\"\"\"");
    }

    #[test]
    fn test_qualified_name() {
        let name = QualifiedName::from_parts(["public", "users"]);
        assert_eq!(name.name().as_str(), "users");
        assert_eq!(name.namespaces().len(), 1);
        assert_eq!(name.key(), "public.users");
        assert!(!name.is_bare());
    }

    #[test]
    fn test_matching() {
        let ident = Ident::new("Users");
        assert!(ident.matches("Users", false));
        assert!(!ident.matches("users", false));
        assert!(ident.matches("users", true));
    }
}
