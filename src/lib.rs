//! # sqlshape
//!
//! SQL parsing, transformation, formatting, and static analysis.
//!
//! The library ingests SQL text (a PostgreSQL-leaning dialect), produces a
//! typed, visitor-traversable AST, and supports formatting back to SQL with
//! style options, structural transformation (dynamic WHERE/ORDER BY/LIMIT
//! injection, CTE decomposition and inlining, statement-shape conversion,
//! scope-aware rename), and static analysis (column, parameter, table, and
//! CTE-dependency collection).
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! builder    → DynamicQueryBuilder facade
//!   ↓
//! rename     → cursor scope detection, CTE/alias/smart rename
//!   ↓
//! transform  → injectors, converters, CTE decompose/inline, DDL diff
//!   ↓
//! analyze    → collectors and the CTE dependency analyzer
//!   ↓
//! format     → AST → SQL with dialect and layout options
//!   ↓
//! parser     → recursive-descent grammar over lexemes
//!   ↓
//! ast        → typed components, comment attachment, visitors
//!   ↓
//! lexer      → Logos tokenizer, keyword table, lexeme assembly
//!   ↓
//! error      → structured error taxonomy
//!   ↓
//! base       → primitives (Position, Span, LineIndex)
//! ```

// ============================================================================
// MODULES (dependency order: base → lexer → ast → parser → format → …)
// ============================================================================

/// Foundation types: Position, Span, LineIndex
pub mod base;

/// Structured error taxonomy
pub mod error;

/// Tokenizer: Logos raw tokens, keyword table, lexemes with trivia
pub mod lexer;

/// Typed AST components and visitors
pub mod ast;

/// Recursive-descent parser and position-aware tooling entry points
pub mod parser;

/// Formatter: AST back to SQL text
pub mod format;

/// Collectors and the CTE dependency analyzer
pub mod analyze;

/// Query transformers: injectors, converters, decomposition, DDL diff
pub mod transform;

/// Cursor scope detection and rename engines
pub mod rename;

/// The DynamicQueryBuilder facade
pub mod builder;

// Re-export the everyday surface.
pub use analyze::{
    TableColumnResolver, analyze_cte_dependencies, collect_columns, collect_ctes,
    collect_filterable_items, collect_parameters, collect_tables, set_parameter,
};
pub use ast::{Query, Statement, StatementBody};
pub use builder::DynamicQueryBuilder;
pub use error::{Result, SqlError};
pub use format::{FormatOptions, FormattedSql, Formatter, to_sql};
pub use parser::{
    Analysis, ParserOptions, analyze, detect_cte_at_cursor, get_cte_regions, parse, parse_async,
    parse_multi, parse_to_position, parse_with_options, split_multi_query,
};
pub use rename::{
    Scope, detect_scope, is_renameable, rename_alias, rename_cte, smart_rename,
};
pub use transform::{
    ConversionOptions, QueryOptions, decompose_ctes, diff_ddl, disable_ctes, extract_cte,
    generalize_ddl, synchronize, to_delete, to_insert, to_merge, to_update,
};
