//! SQL keyword table.
//!
//! Keywords are not baked into the token definitions: the raw lexer produces
//! identifiers and this table classifies them case-insensitively. Unknown
//! words stay identifiers, so extending a dialect means editing this table
//! only, never the grammar.

/// Expands to the [`Keyword`] enum, an `ALL_KEYWORDS` array of the spellings,
/// and a parallel `ALL_KEYWORDS_INDEX` array for binary-search lookup.
macro_rules! define_keywords {
    ($($ident:ident),* $(,)?) => {
        /// Every keyword the grammar knows about.
        #[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Eq, Ord, Hash)]
        #[expect(non_camel_case_types, clippy::upper_case_acronyms)]
        pub enum Keyword {
            $($ident),*
        }

        /// Keyword spellings, sorted, for binary search.
        pub const ALL_KEYWORDS: &[&str] = &[
            $(stringify!($ident)),*
        ];

        /// Enum values parallel to [`ALL_KEYWORDS`].
        pub const ALL_KEYWORDS_INDEX: &[Keyword] = &[
            $(Keyword::$ident),*
        ];
    };
}

// Sorted alphabetically so lookup can binary-search the spellings.
define_keywords!(
    ACTION, ADD, ALL, ALTER, ALWAYS, ANALYZE, AND, ANY, ARRAY, AS, ASC, BETWEEN, BY, CACHE,
    CASCADE, CASE, CAST, CHECK, COLLATE, COLUMN, CONSTRAINT, CREATE, CROSS, CURRENT, CYCLE,
    DEFAULT, DEFERRABLE, DEFERRED, DELETE, DESC, DISTINCT, DO, DROP, ELSE, END, ESCAPE, EXCEPT,
    EXCLUDE, EXISTS, EXPLAIN, FALSE, FETCH, FILTER, FIRST, FOLLOWING, FOR, FOREIGN, FROM, FULL,
    GENERATED, GROUP, GROUPS, HAVING, IDENTITY, IF, ILIKE, IMMEDIATE, IN, INCREMENT, INDEX,
    INITIALLY, INNER, INSERT, INTERSECT, INTO, IS, JOIN, KEY, LAST, LATERAL, LEFT, LIKE, LIMIT,
    LOCKED, MATCH, MATCHED, MATERIALIZED, MAXVALUE, MERGE, MINVALUE, NATURAL, NEXT, NO, NOT,
    NOTHING, NOWAIT, NULL, NULLS, OF, OFFSET, ON, ONLY, OR, ORDER, ORDINALITY, OTHERS, OUTER,
    OVER, PARTIAL, PARTITION, PRECEDING, PRIMARY, RANGE, RECURSIVE, REFERENCES, REINDEX,
    RESTRICT, RETURNING, RIGHT, ROW, ROWS, SELECT, SET, SHARE, SIMILAR, SIMPLE, SKIP, SOME,
    START, SYMMETRIC, TABLE, TEMP, TEMPORARY, THEN, TIES, TO, TRUE, UNBOUNDED, UNION, UNIQUE,
    UPDATE, USING, VACUUM, VALUES, VERBOSE, WHEN, WHERE, WINDOW, WITH,
);

/// Keywords that can never be used as a bare identifier.
///
/// Everything else in the table is non-reserved: the parser accepts it in
/// identifier position and only treats it as a keyword in clause position.
pub const RESERVED_KEYWORDS: &[Keyword] = &[
    Keyword::AND,
    Keyword::AS,
    Keyword::CASE,
    Keyword::CAST,
    Keyword::CHECK,
    Keyword::COLLATE,
    Keyword::CONSTRAINT,
    Keyword::CREATE,
    Keyword::CROSS,
    Keyword::DEFAULT,
    Keyword::DELETE,
    Keyword::DISTINCT,
    Keyword::DO,
    Keyword::ELSE,
    Keyword::END,
    Keyword::EXCEPT,
    Keyword::FALSE,
    Keyword::FETCH,
    Keyword::FOR,
    Keyword::FOREIGN,
    Keyword::FROM,
    Keyword::FULL,
    Keyword::GROUP,
    Keyword::HAVING,
    Keyword::IN,
    Keyword::INNER,
    Keyword::INSERT,
    Keyword::INTERSECT,
    Keyword::INTO,
    Keyword::IS,
    Keyword::JOIN,
    Keyword::LATERAL,
    Keyword::LIMIT,
    Keyword::MERGE,
    Keyword::NATURAL,
    Keyword::NOT,
    Keyword::NULL,
    Keyword::OFFSET,
    Keyword::ON,
    Keyword::ONLY,
    Keyword::OR,
    Keyword::ORDER,
    Keyword::OUTER,
    Keyword::PRIMARY,
    Keyword::REFERENCES,
    Keyword::RETURNING,
    Keyword::RIGHT,
    Keyword::SELECT,
    Keyword::SOME,
    Keyword::SYMMETRIC,
    Keyword::TABLE,
    Keyword::THEN,
    Keyword::TO,
    Keyword::TRUE,
    Keyword::UNION,
    Keyword::UNIQUE,
    Keyword::UPDATE,
    Keyword::USING,
    Keyword::VALUES,
    Keyword::WHEN,
    Keyword::WHERE,
    Keyword::WINDOW,
    Keyword::WITH,
];

/// Keywords that terminate an implicit (AS-less) alias position after a
/// table source or select item.
pub const RESERVED_FOR_ALIAS: &[Keyword] = &[
    Keyword::CROSS,
    Keyword::EXCEPT,
    Keyword::FETCH,
    Keyword::FOR,
    Keyword::FROM,
    Keyword::FULL,
    Keyword::GROUP,
    Keyword::HAVING,
    Keyword::INNER,
    Keyword::INTERSECT,
    Keyword::JOIN,
    Keyword::LEFT,
    Keyword::LIMIT,
    Keyword::NATURAL,
    Keyword::OFFSET,
    Keyword::ON,
    Keyword::ORDER,
    Keyword::RETURNING,
    Keyword::RIGHT,
    Keyword::SET,
    Keyword::THEN,
    Keyword::UNION,
    Keyword::USING,
    Keyword::WHEN,
    Keyword::WHERE,
    Keyword::WINDOW,
];

impl Keyword {
    /// Classify an identifier, case-insensitively. Unknown words return `None`
    /// and stay identifiers.
    pub fn from_ident(text: &str) -> Option<Keyword> {
        if text.len() > 13 || !text.is_ascii() {
            return None;
        }
        let upper = text.to_ascii_uppercase();
        ALL_KEYWORDS
            .binary_search(&upper.as_str())
            .ok()
            .map(|idx| ALL_KEYWORDS_INDEX[idx])
    }

    /// The canonical (uppercase) spelling.
    pub fn as_str(&self) -> &'static str {
        ALL_KEYWORDS[ALL_KEYWORDS_INDEX
            .iter()
            .position(|k| k == self)
            .expect("keyword present in index")]
    }

    pub fn is_reserved(&self) -> bool {
        RESERVED_KEYWORDS.contains(self)
    }

    pub fn stops_alias(&self) -> bool {
        self.is_reserved() || RESERVED_FOR_ALIAS.contains(self)
    }
}

impl std::fmt::Display for Keyword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_sorted() {
        let mut sorted = ALL_KEYWORDS.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, ALL_KEYWORDS);
        assert_eq!(ALL_KEYWORDS.len(), ALL_KEYWORDS_INDEX.len());
    }

    #[test]
    fn test_lookup_case_insensitive() {
        assert_eq!(Keyword::from_ident("select"), Some(Keyword::SELECT));
        assert_eq!(Keyword::from_ident("Select"), Some(Keyword::SELECT));
        assert_eq!(Keyword::from_ident("SELECT"), Some(Keyword::SELECT));
        assert_eq!(Keyword::from_ident("selects"), None);
        assert_eq!(Keyword::from_ident("users"), None);
    }

    #[test]
    fn test_reserved() {
        assert!(Keyword::SELECT.is_reserved());
        assert!(!Keyword::MATERIALIZED.is_reserved());
        assert!(Keyword::LIMIT.stops_alias());
    }
}
