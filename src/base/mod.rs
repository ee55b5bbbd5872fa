//! Foundation types for the sqlshape library.
//!
//! This module provides the primitives everything else builds on:
//! - [`Position`], [`Span`] - line/column/offset positions for lexemes and AST nodes
//! - [`LineIndex`] - offset to line/column conversion
//!
//! This module has NO dependencies on other sqlshape modules.

mod line_index;
mod position;

pub use line_index::LineIndex;
pub use position::{Position, Span};

// Re-export text-size types for convenience
pub use text_size::{TextRange, TextSize};
