//! Whitespace configuration types

use serde::{Deserialize, Serialize};

/// Indentation style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndentStyle {
    /// Use spaces for indentation
    Spaces(usize),
    /// Use tabs for indentation
    Tabs,
}

impl Default for IndentStyle {
    fn default() -> Self {
        IndentStyle::Spaces(4)
    }
}

impl IndentStyle {
    /// Get the indentation string for one level
    pub fn unit(&self) -> String {
        match self {
            IndentStyle::Spaces(n) => " ".repeat(*n),
            IndentStyle::Tabs => "\t".to_string(),
        }
    }

    /// Indentation string for `level` levels
    pub fn repeat(&self, level: usize) -> String {
        self.unit().repeat(level)
    }

    /// Get the number of columns one level spans
    pub fn width(&self) -> usize {
        match self {
            IndentStyle::Spaces(n) => (*n).max(1),
            IndentStyle::Tabs => 4, // Tab width for calculation purposes
        }
    }

    /// Visual width of a leading-whitespace string
    pub fn columns(&self, indent: &str) -> usize {
        indent
            .chars()
            .map(|c| if c == '\t' { self.width() } else { 1 })
            .sum()
    }

    /// Nesting level of a leading-whitespace string, rounded down
    pub fn level_of(&self, indent: &str) -> usize {
        self.columns(indent) / self.width()
    }
}

/// Line ending style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineEnding {
    /// Unix-style line endings (LF)
    #[default]
    Lf,
    /// Windows-style line endings (CRLF)
    CrLf,
}

impl LineEnding {
    /// Get the line ending string
    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }
}

/// Combined whitespace configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WhitespaceConfig {
    pub indent: IndentStyle,
    pub line_ending: LineEnding,
}

impl WhitespaceConfig {
    pub fn new(indent: IndentStyle, line_ending: LineEnding) -> Self {
        Self { indent, line_ending }
    }

    /// Infer the indentation unit and line ending used by `source`
    ///
    /// Tabs win if any line is tab-indented; otherwise the smallest
    /// non-zero space indent is the unit. Falls back to the defaults.
    pub fn detect(source: &str) -> Self {
        let line_ending = if source.contains("\r\n") {
            LineEnding::CrLf
        } else {
            LineEnding::Lf
        };

        let mut smallest: Option<usize> = None;
        for line in source.lines() {
            if line.trim().is_empty() {
                continue;
            }
            if line.starts_with('\t') {
                return Self::new(IndentStyle::Tabs, line_ending);
            }
            let spaces = line.len() - line.trim_start_matches(' ').len();
            if spaces > 0 {
                smallest = Some(smallest.map_or(spaces, |s| s.min(spaces)));
            }
        }

        let indent = smallest.map_or_else(IndentStyle::default, IndentStyle::Spaces);
        Self::new(indent, line_ending)
    }
}
