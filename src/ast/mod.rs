//! The typed AST: components, comment attachment, and visitors.
//!
//! Components are plain structs and enums with exclusive ownership; the only
//! cross-references in a tree are by-name lookups (a table source naming a
//! CTE). Once the parser returns a [`Statement`] the shape is stable:
//! transformers clone what they change and return new trees.

mod comment;
mod ddl;
mod dml;
mod expr;
mod kind;
mod name;
mod query;
mod source;
mod statement;
mod util;
pub mod visitor;
pub mod visitor_mut;

pub use comment::{Comment, CommentSet};
pub use ddl::*;
pub use dml::*;
pub use expr::*;
pub use kind::ComponentKind;
pub use name::{Ident, QualifiedName};
pub use query::*;
pub use source::*;
pub use statement::{Statement, StatementBody};
pub use util::strip_metadata;
pub use visitor::Visit;
pub use visitor_mut::VisitMut;
