//! Offset-based text edits and a checking applier

use std::fmt;

use thiserror::Error;

/// Errors that can occur during edit application
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApplyError {
    #[error("Overlapping edits detected at offset {0}")]
    OverlappingEdits(usize),

    #[error("Edit span {start}..{end} out of bounds for source length {len}")]
    SpanOutOfBounds { start: usize, end: usize, len: usize },

    #[error("Edit boundary {0} is not on a character boundary")]
    NotCharBoundary(usize),
}

/// A single replacement in original-buffer coordinates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    /// Byte offset where the replaced text starts
    pub offset: usize,
    /// Number of original bytes replaced
    pub length: usize,
    /// The replacement text
    pub replacement: String,
}

impl TextEdit {
    pub fn new(offset: usize, length: usize, replacement: impl Into<String>) -> Self {
        Self {
            offset,
            length,
            replacement: replacement.into(),
        }
    }

    /// Zero-length insertion at `offset`
    pub fn insert(offset: usize, text: impl Into<String>) -> Self {
        Self::new(offset, 0, text)
    }

    pub fn delete(offset: usize, length: usize) -> Self {
        Self::new(offset, length, String::new())
    }

    /// Replace the byte range `start..end`
    pub fn replace(start: usize, end: usize, text: impl Into<String>) -> Self {
        Self::new(start, end - start, text)
    }

    /// Get the byte offset where this edit ends
    pub fn end(&self) -> usize {
        self.offset + self.length
    }

    pub fn is_insert(&self) -> bool {
        self.length == 0
    }
}

impl fmt::Display for TextEdit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{} => {:?}", self.offset, self.end(), self.replacement)
    }
}

/// Apply edits to a source buffer
///
/// Edits may be given in any order; they are applied front to back.
/// Insertions sharing an offset keep their relative order, and an
/// insertion at the start of a replaced range lands before it.
///
/// # Returns
/// * `Ok(String)` - The modified source code
/// * `Err(ApplyError)` - If edits overlap or are out of bounds
pub fn apply_edits(source: &str, edits: &[TextEdit]) -> Result<String, ApplyError> {
    if edits.is_empty() {
        return Ok(source.to_string());
    }

    let mut sorted: Vec<&TextEdit> = edits.iter().collect();
    sorted.sort_by_key(|edit| (edit.offset, edit.length));

    let len = source.len();
    let mut result = String::with_capacity(len);
    let mut cursor = 0;

    for edit in sorted {
        let start = edit.offset;
        let end = edit.end();

        if end > len {
            return Err(ApplyError::SpanOutOfBounds { start, end, len });
        }
        if start < cursor {
            return Err(ApplyError::OverlappingEdits(start));
        }
        for boundary in [start, end] {
            if !source.is_char_boundary(boundary) {
                return Err(ApplyError::NotCharBoundary(boundary));
            }
        }

        result.push_str(&source[cursor..start]);
        result.push_str(&edit.replacement);
        cursor = end;
    }

    result.push_str(&source[cursor..]);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_replacement() {
        let source = "list.add(x);";
        let edit = TextEdit::replace(0, 11, "list.push(x)");

        let result = apply_edits(source, &[edit]).unwrap();
        assert_eq!(result, "list.push(x);");
    }

    #[test]
    fn test_multiple_edits_in_any_order() {
        let source = "a = 1; b = 2;";
        let edits = vec![TextEdit::replace(11, 12, "3"), TextEdit::replace(4, 5, "9")];

        let result = apply_edits(source, &edits).unwrap();
        assert_eq!(result, "a = 9; b = 3;");
    }

    #[test]
    fn test_inserts_at_same_offset_keep_order() {
        let source = "ab";
        let edits = vec![TextEdit::insert(1, "x"), TextEdit::insert(1, "y")];

        assert_eq!(apply_edits(source, &edits).unwrap(), "axyb");
    }

    #[test]
    fn test_insert_before_replacement_at_same_offset() {
        let source = "abc";
        let edits = vec![TextEdit::replace(1, 2, "B"), TextEdit::insert(1, "_")];

        assert_eq!(apply_edits(source, &edits).unwrap(), "a_Bc");
    }

    #[test]
    fn test_empty_edits() {
        let source = "unchanged";
        let result = apply_edits(source, &[]).unwrap();
        assert_eq!(result, "unchanged");
    }

    #[test]
    fn test_out_of_bounds() {
        let source = "short";
        let edit = TextEdit::replace(0, 100, "replacement");

        let result = apply_edits(source, &[edit]);
        assert!(matches!(result, Err(ApplyError::SpanOutOfBounds { .. })));
    }

    #[test]
    fn test_overlap() {
        let source = "abcdef";
        let edits = vec![TextEdit::replace(0, 3, "x"), TextEdit::replace(2, 4, "y")];

        assert_eq!(
            apply_edits(source, &edits),
            Err(ApplyError::OverlappingEdits(2))
        );
    }

    #[test]
    fn test_char_boundary() {
        let source = "é";
        let edit = TextEdit::delete(1, 1);

        assert_eq!(
            apply_edits(source, &[edit]),
            Err(ApplyError::NotCharBoundary(1))
        );
    }
}
