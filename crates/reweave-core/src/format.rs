//! Formatting adapter and source-position helpers
//!
//! The [`Formatter`] is only consulted for synthesized text: fresh nodes
//! and literal placeholders. Everything copied from the original buffer
//! goes through [`reindent`] instead.

use crate::ast::NodeKind;
use crate::config::WhitespaceConfig;

/// Lays out synthesized fragments at a target nesting level
pub trait Formatter {
    /// Format `text` so that it can be placed at column `indent_level`.
    ///
    /// The first line is placed by the caller; continuation lines must
    /// carry their own indentation.
    fn format(&self, text: &str, indent_level: usize, kind: NodeKind) -> String;
}

/// Indents continuation lines and normalises line endings
#[derive(Debug, Clone, Default)]
pub struct IndentFormatter {
    whitespace: WhitespaceConfig,
}

impl IndentFormatter {
    pub fn new(whitespace: WhitespaceConfig) -> Self {
        Self { whitespace }
    }
}

impl Formatter for IndentFormatter {
    fn format(&self, text: &str, indent_level: usize, _kind: NodeKind) -> String {
        let indent = self.whitespace.indent.repeat(indent_level);
        let eol = self.whitespace.line_ending.as_str();

        let mut out = String::with_capacity(text.len());
        for (i, line) in text.trim_end().split('\n').enumerate() {
            let line = line.strip_suffix('\r').unwrap_or(line);
            if i > 0 {
                out.push_str(eol);
                if !line.trim().is_empty() {
                    out.push_str(&indent);
                }
            }
            if i > 0 && line.trim().is_empty() {
                continue;
            }
            out.push_str(line.trim_end());
        }
        out
    }
}

/// Offset of the first byte of the line holding `offset`
pub fn line_start(source: &str, offset: usize) -> usize {
    source[..offset].rfind('\n').map_or(0, |i| i + 1)
}

/// Leading whitespace of the line holding `offset`
pub fn line_indent(source: &str, offset: usize) -> &str {
    let start = line_start(source, offset);
    let rest = &source[start..];
    let len = rest.len() - rest.trim_start_matches([' ', '\t']).len();
    &source[start..start + len]
}

/// Whether only whitespace precedes `offset` on its line
pub fn is_first_on_line(source: &str, offset: usize) -> bool {
    source[line_start(source, offset)..offset]
        .chars()
        .all(|c| c == ' ' || c == '\t')
}

/// Scan backward from `offset` over whitespace
pub fn gap_start(source: &str, offset: usize) -> usize {
    source[..offset].trim_end().len()
}

/// Scan forward from `offset` over whitespace
pub fn next_non_ws(source: &str, offset: usize) -> usize {
    let rest = &source[offset..];
    offset + (rest.len() - rest.trim_start().len())
}

/// Scan forward from `offset` over whitespace and comments
pub fn skip_trivia(source: &str, mut offset: usize) -> usize {
    loop {
        offset = next_non_ws(source, offset);
        let rest = &source[offset..];
        if rest.starts_with("//") {
            offset += rest.find('\n').unwrap_or(rest.len());
        } else if rest.starts_with("/*") {
            match rest[2..].find("*/") {
                Some(end) => offset += end + 4,
                None => return source.len(),
            }
        } else {
            return offset;
        }
    }
}

/// Extend `end` past comments that trail it on the same line
pub fn trailing_comment_end(source: &str, end: usize) -> usize {
    let mut offset = end;
    loop {
        let rest = &source[offset..];
        let spaces = rest.len() - rest.trim_start_matches([' ', '\t']).len();
        let rest = &rest[spaces..];
        if rest.starts_with("//") {
            let len = rest.find('\n').unwrap_or(rest.len());
            let comment = &rest[..len];
            return offset + spaces + comment.trim_end_matches('\r').len();
        }
        if rest.starts_with("/*") {
            match rest[2..].find("*/") {
                Some(close) if !rest[..close + 4].contains('\n') => {
                    offset += spaces + close + 4;
                    continue;
                }
                _ => return offset,
            }
        }
        return offset;
    }
}

/// Offset just past the line break ending the line holding `offset`,
/// when only whitespace remains on that line
pub fn end_of_blank_tail(source: &str, offset: usize) -> usize {
    let rest = &source[offset..];
    let spaces = rest.len() - rest.trim_start_matches([' ', '\t', '\r']).len();
    if rest[spaces..].starts_with('\n') {
        offset + spaces + 1
    } else if spaces == rest.len() {
        source.len()
    } else {
        offset
    }
}

/// Move copied text from indentation `from` to indentation `to`
///
/// The first line is left alone; it is positioned by the caller.
/// Continuation lines that start with `from` get it swapped for `to`;
/// other lines lose as much leading whitespace as `from` is long.
pub fn reindent(text: &str, from: &str, to: &str) -> String {
    if from == to || !text.contains('\n') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    for (i, line) in text.split('\n').enumerate() {
        if i == 0 {
            out.push_str(line);
            continue;
        }
        out.push('\n');
        if line.trim().is_empty() {
            out.push_str(line.trim_start_matches([' ', '\t']));
            continue;
        }
        let rest = match line.strip_prefix(from) {
            Some(rest) => rest,
            None => {
                let ws = line.len() - line.trim_start_matches([' ', '\t']).len();
                &line[ws.min(from.len())..]
            }
        };
        out.push_str(to);
        out.push_str(rest);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{IndentStyle, LineEnding};

    #[test]
    fn test_indent_formatter() {
        let formatter = IndentFormatter::default();
        let text = "if (a) {\n    b();\n\n}\n";
        assert_eq!(
            formatter.format(text, 1, NodeKind::IfStatement),
            "if (a) {\n        b();\n\n    }"
        );
    }

    #[test]
    fn test_indent_formatter_crlf_tabs() {
        let formatter =
            IndentFormatter::new(WhitespaceConfig::new(IndentStyle::Tabs, LineEnding::CrLf));
        assert_eq!(
            formatter.format("{\r\n\tx();\n}", 1, NodeKind::Block),
            "{\r\n\t\tx();\r\n\t}"
        );
    }

    #[test]
    fn test_line_helpers() {
        let source = "a {\n    b(); // c\n}";
        let b = source.find("b()").unwrap();
        assert_eq!(line_start(source, b), 4);
        assert_eq!(line_indent(source, b), "    ");
        assert!(is_first_on_line(source, b));
        assert!(!is_first_on_line(source, b + 1));
        assert_eq!(gap_start(source, b), 3);
        assert_eq!(next_non_ws(source, 3), b);
        assert_eq!(trailing_comment_end(source, b + 4), b + 9);
        assert_eq!(trailing_comment_end(source, b + 9), b + 9);
    }

    #[test]
    fn test_skip_trivia() {
        let source = "x /* a */ // b\n  {";
        assert_eq!(skip_trivia(source, 1), source.len() - 1);
    }

    #[test]
    fn test_reindent() {
        let text = "if (a) {\n        b();\n    }";
        assert_eq!(reindent(text, "    ", ""), "if (a) {\n    b();\n}");
        assert_eq!(
            reindent(text, "    ", "\t"),
            "if (a) {\n\t    b();\n\t}"
        );
    }

    #[test]
    fn test_end_of_blank_tail() {
        let source = "a();  \nb();";
        assert_eq!(end_of_blank_tail(source, 4), 7);
        assert_eq!(end_of_blank_tail(source, 2), 2);
    }
}
