//! Open-document state tracked by the LSP backend.

use tower_lsp::lsp_types::{Position, TextDocumentContentChangeEvent};

/// An open text document with its latest synchronized content.
#[derive(Debug, Clone)]
pub struct Document {
    pub text: String,
    pub version: i32,
}

impl Document {
    pub fn new(text: String, version: i32) -> Self {
        Self { text, version }
    }

    /// Applies incremental content changes in order; a change without a
    /// range replaces the whole document.
    pub fn apply_changes(
        &mut self,
        content_changes: Vec<TextDocumentContentChangeEvent>,
        new_version: i32,
    ) {
        for change in content_changes {
            if let Some(range) = change.range {
                let start = position_to_offset(&self.text, range.start);
                let end = position_to_offset(&self.text, range.end);
                if start <= end && end <= self.text.len() {
                    self.text.replace_range(start..end, &change.text);
                }
            } else {
                self.text = change.text;
            }
        }
        self.version = new_version;
    }

    /// Text of the given 0-based line, without its line terminator.
    pub fn line(&self, line: u32) -> Option<&str> {
        self.text.lines().nth(line as usize)
    }
}

/// Converts an LSP position to a byte offset into `text`, clamping past-end
/// positions to the end of the text.
fn position_to_offset(text: &str, position: Position) -> usize {
    let mut offset = 0;
    let mut line = 0;
    let mut char_pos = 0;

    for c in text.chars() {
        if line == position.line {
            if char_pos == position.character {
                return offset;
            }
            char_pos += 1;
        }
        if c == '\n' {
            line += 1;
            char_pos = 0;
        }
        offset += c.len_utf8();
    }

    offset
}
