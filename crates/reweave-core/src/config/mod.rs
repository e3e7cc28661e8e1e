//! Formatting options for regenerated text
//!
//! Loads `.reweave.toml` from a directory or its parents, or detects the
//! whitespace conventions of the source being rewritten.

mod lists;
mod whitespace;

pub use lists::{ListTemplate, ListTemplates};
pub use whitespace::{IndentStyle, LineEnding, WhitespaceConfig};

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = ".reweave.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Brace placement choices
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BraceStyle {
    /// Put `else` on the line of the closing brace
    pub cuddle_else: bool,
}

impl Default for BraceStyle {
    fn default() -> Self {
        Self { cuddle_else: true }
    }
}

/// Configuration file structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatOptions {
    pub whitespace: WhitespaceConfig,
    pub lists: ListTemplates,
    pub braces: BraceStyle,
}

impl FormatOptions {
    /// Defaults with whitespace detected from `source`
    pub fn for_source(source: &str) -> Self {
        Self {
            whitespace: WhitespaceConfig::detect(source),
            ..Default::default()
        }
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Load options searching from the given directory upward
    pub fn load_from(start_dir: &Path) -> Result<Option<(FormatOptions, PathBuf)>, ConfigError> {
        let mut current = Some(start_dir);

        while let Some(dir) = current {
            let config_path = dir.join(CONFIG_FILE_NAME);
            if config_path.exists() {
                let options = Self::load_path(&config_path)?;
                return Ok(Some((options, config_path)));
            }
            current = dir.parent();
        }

        Ok(None)
    }

    /// Load options from a specific path
    pub fn load_path(path: &Path) -> Result<FormatOptions, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let options = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loaded format options");
        Ok(options)
    }

    pub fn indent_unit(&self) -> String {
        self.whitespace.indent.unit()
    }

    pub fn eol(&self) -> &'static str {
        self.whitespace.line_ending.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_options() {
        let options = FormatOptions::from_toml_str(
            r#"
[whitespace]
indent = "tabs"
line_ending = "cr_lf"

[lists.switch_body]
layout = "lines"
nested_indent = 0

[lists.arguments]
layout = "inline"
separator = ","

[braces]
cuddle_else = false
"#,
        )
        .unwrap();

        assert_eq!(options.whitespace.indent, IndentStyle::Tabs);
        assert_eq!(options.whitespace.line_ending, LineEnding::CrLf);
        assert_eq!(options.lists.switch_body, ListTemplate::lines(0));
        assert_eq!(options.lists.arguments, ListTemplate::inline(","));
        assert_eq!(options.lists.parameters, ListTemplate::inline(", "));
        assert!(!options.braces.cuddle_else);
    }

    #[test]
    fn test_spaces_indent() {
        let options = FormatOptions::from_toml_str("[whitespace]\nindent = { spaces = 2 }\n").unwrap();
        assert_eq!(options.indent_unit(), "  ");
        assert_eq!(options.eol(), "\n");
    }

    #[test]
    fn test_empty_options_are_defaults() {
        let options = FormatOptions::from_toml_str("").unwrap();
        assert_eq!(options, FormatOptions::default());
        assert!(options.braces.cuddle_else);
    }

    #[test]
    fn test_invalid_layout() {
        let err = FormatOptions::from_toml_str("[lists.arguments]\nlayout = \"zigzag\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }
}
