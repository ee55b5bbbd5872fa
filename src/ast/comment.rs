//! Comment attachment for AST components.

pub use crate::lexer::Comment;

/// Ordered comments attached to a component: before its first token and
/// after its last token.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommentSet {
    pub before: Vec<Comment>,
    pub after: Vec<Comment>,
}

impl CommentSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.before.is_empty() && self.after.is_empty()
    }

    pub fn clear(&mut self) {
        self.before.clear();
        self.after.clear();
    }
}
