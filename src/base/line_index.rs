//! Offset to line/column conversion.

use text_size::TextSize;

use super::Position;

/// Maps byte offsets to 1-based line/column positions.
///
/// Built once per source string; lookups are a binary search over the
/// newline table.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Offset of the first character of each line.
    line_starts: Vec<TextSize>,
    len: TextSize,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![TextSize::new(0)];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(TextSize::new(i as u32 + 1));
            }
        }
        Self {
            line_starts,
            len: TextSize::of(text),
        }
    }

    /// Convert an absolute offset into a [`Position`].
    ///
    /// Offsets past the end of the text clamp to the end position.
    pub fn position_at(&self, offset: impl Into<TextSize>) -> Position {
        let offset = offset.into().min(self.len);
        let line = match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx - 1,
        };
        let column = u32::from(offset) - u32::from(self.line_starts[line]) + 1;
        Position::new(line as u32 + 1, column, offset)
    }

    /// Convert a 1-based (line, column) pair back into an offset, if the line
    /// exists.
    pub fn offset_at(&self, line: u32, column: u32) -> Option<TextSize> {
        let start = *self.line_starts.get(line.checked_sub(1)? as usize)?;
        let offset = TextSize::new(u32::from(start) + column.saturating_sub(1));
        (offset <= self.len).then_some(offset)
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}
