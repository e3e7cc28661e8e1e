//! Per-list separator and indentation templates

use serde::{Deserialize, Serialize};

use crate::ast::ListRole;

/// How elements of one list role are laid out when regenerated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "layout", rename_all = "snake_case")]
pub enum ListTemplate {
    /// Elements on one line joined by `separator`
    Inline { separator: String },
    /// One element per line; non-label elements nest `nested_indent`
    /// extra levels below labels
    Lines {
        #[serde(default)]
        nested_indent: usize,
    },
}

impl ListTemplate {
    pub fn inline(separator: impl Into<String>) -> Self {
        ListTemplate::Inline {
            separator: separator.into(),
        }
    }

    pub fn lines(nested_indent: usize) -> Self {
        ListTemplate::Lines { nested_indent }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListTemplates {
    pub statements: ListTemplate,
    pub switch_body: ListTemplate,
    pub arguments: ListTemplate,
    pub parameters: ListTemplate,
    pub fragments: ListTemplate,
}

impl Default for ListTemplates {
    fn default() -> Self {
        Self {
            statements: ListTemplate::lines(0),
            switch_body: ListTemplate::lines(1),
            arguments: ListTemplate::inline(", "),
            parameters: ListTemplate::inline(", "),
            fragments: ListTemplate::inline(", "),
        }
    }
}

impl ListTemplates {
    pub fn get(&self, role: ListRole) -> &ListTemplate {
        match role {
            ListRole::Statements => &self.statements,
            ListRole::SwitchBody => &self.switch_body,
            ListRole::Arguments => &self.arguments,
            ListRole::Parameters => &self.parameters,
            ListRole::Fragments => &self.fragments,
        }
    }
}
