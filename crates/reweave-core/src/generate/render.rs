//! Rendering of replacement text
//!
//! Original subtrees render as their source text with nested edits
//! applied; placeholders resolve to copied, moved or literal text; fresh
//! nodes are assembled from their kind's template.

use super::{finish, Generator};
use crate::ast::{ListRole, NodeId, NodeKind, Property, Slot};
use crate::config::ListTemplate;
use crate::error::{Result, RewriteError};
use crate::format::{line_indent, reindent};
use crate::placeholder::Placeholder;
use crate::rewrite::{Synthetic, Terminal, Wrapping};
use crate::synthetic::{FreshNode, NodeHandle};

/// A node as seen by a template: synthesized, or original with its
/// pending changes applied
#[derive(Clone, Copy)]
enum View<'a> {
    Fresh(&'a FreshNode),
    Original(NodeId),
}

impl<'a, 't> Generator<'a, 't> {
    /// Text for `handle` placed on a line indented by `indent`
    pub(super) fn render_at(&mut self, handle: NodeHandle, indent: &str) -> Result<String> {
        let state = self.state;
        match handle {
            NodeHandle::Synthetic(id) => match state.synthetic(id) {
                Synthetic::Fresh(node) => {
                    let text = self.render_template(View::Fresh(node), "")?;
                    let level = self.options.whitespace.indent.level_of(indent);
                    Ok(self.formatter.format(&text, level, node.kind()))
                }
                Synthetic::Placeholder(_) => self.render_child(handle, indent),
            },
            NodeHandle::Original(_) => self.render_child(handle, indent),
        }
    }

    /// Whole-node text of an original node rebuilt from its template
    pub(super) fn rerender(&mut self, id: NodeId) -> Result<String> {
        let indent = line_indent(self.source, self.tree.range(id).start);
        let text = self.render_template(View::Original(id), "")?;
        let level = self.options.whitespace.indent.level_of(indent);
        Ok(self.formatter.format(&text, level, self.tree.kind(id)))
    }

    /// Text for `handle` nested in template output at relative `indent`
    fn render_child(&mut self, handle: NodeHandle, indent: &str) -> Result<String> {
        let state = self.state;
        let id = match handle {
            NodeHandle::Original(id) => {
                if let Some(Terminal::Replaced(replacement)) = state.terminal(id) {
                    return self.render_child(replacement, indent);
                }
                let text = self.subtree_text(id)?;
                return Ok(self.from_source(&text, id, indent));
            }
            NodeHandle::Synthetic(id) => id,
        };

        match state.synthetic(id) {
            Synthetic::Fresh(node) => self.render_template(View::Fresh(node), indent),
            Synthetic::Placeholder(Placeholder::Copy { source, text }) => {
                Ok(self.from_source(text, *source, indent))
            }
            Synthetic::Placeholder(Placeholder::Move { source }) => {
                let source = *source;
                if self.moving.contains(&source) {
                    return Err(RewriteError::CyclicMove { node: source });
                }
                self.moving.push(source);
                let text = self.subtree_text(source);
                self.moving.pop();
                Ok(self.from_source(&text?, source, indent))
            }
            Synthetic::Placeholder(Placeholder::Literal { text, kind }) => {
                let level = self.options.whitespace.indent.level_of(indent);
                Ok(self.formatter.format(text, level, *kind))
            }
        }
    }

    /// Source-derived text of `origin` moved to indentation `indent`
    fn from_source(&self, text: &str, origin: NodeId, indent: &str) -> String {
        let from = line_indent(self.source, self.tree.range(origin).start);
        reindent(text, from, indent)
    }

    /// Original text of `id` with every edit recorded inside it
    ///
    /// The node's own disposition is ignored; its own wrapping is applied
    /// textually since those edits lie outside its range.
    fn subtree_text(&mut self, id: NodeId) -> Result<String> {
        let range = self.tree.range(id);
        let mut edits = Vec::new();
        if self.touched.contains(&id) {
            self.visit_contents(id, &mut edits, false)?;
        }
        let edits = finish(self.source, edits)?;

        let mut text = String::with_capacity(range.len());
        let mut cursor = range.start;
        for edit in edits {
            if edit.offset < cursor || edit.end() > range.end {
                return Err(RewriteError::OverlappingEdits {
                    offset: edit.offset,
                });
            }
            text.push_str(&self.source[cursor..edit.offset]);
            text.push_str(&edit.replacement);
            cursor = edit.end();
        }
        text.push_str(&self.source[cursor..range.end]);

        match self.state.wrapping(id) {
            Some(Wrapping::IntoBlock) => {
                let indent = line_indent(self.source, range.start);
                let inner = format!("{indent}{}", self.unit);
                let eol = self.eol;
                Ok(format!(
                    "{{{eol}{inner}{}{eol}{indent}}}",
                    reindent(&text, indent, &inner)
                ))
            }
            Some(Wrapping::OutOfBlock) => match self.tree[id].list(Slot::Statements) {
                [statement] => {
                    let indent = line_indent(self.source, range.start);
                    self.render_child(NodeHandle::Original(*statement), indent)
                }
                _ => Err(RewriteError::invalid(id, "unwrapped block lost its statement")),
            },
            None => Ok(text),
        }
    }

    // === Views ===

    fn view_kind(&self, view: View<'_>) -> NodeKind {
        match view {
            View::Fresh(node) => node.kind(),
            View::Original(id) => self.tree.kind(id),
        }
    }

    fn view_child(&self, view: View<'_>, slot: Slot) -> Option<NodeHandle> {
        match view {
            View::Fresh(node) => node.child(slot),
            View::Original(id) => match self.state.fills.get(&(id, slot)) {
                Some(fill) => Some(*fill),
                None => self.tree[id]
                    .child(slot)
                    .filter(|child| !self.state.is_erased(*child))
                    .map(NodeHandle::Original),
            },
        }
    }

    fn view_list(&self, view: View<'_>, slot: Slot) -> Vec<NodeHandle> {
        match view {
            View::Fresh(node) => node.list(slot).to_vec(),
            View::Original(id) => self.state.live_list(id, slot),
        }
    }

    fn view_property(&self, view: View<'_>, property: Property) -> String {
        let value = match view {
            View::Fresh(node) => node.property(property),
            View::Original(id) => self
                .state
                .record(id)
                .and_then(|record| record.property(property))
                .or_else(|| self.tree[id].property(property).map(|t| t.text.as_str())),
        };
        value.unwrap_or_default().to_string()
    }

    // === Templates ===

    fn slot_text(&mut self, view: View<'_>, slot: Slot, indent: &str) -> Result<String> {
        match self.view_child(view, slot) {
            Some(handle) => self.render_child(handle, indent),
            None => Ok(String::new()),
        }
    }

    fn separator(&self, role: ListRole) -> String {
        match self.options.lists.get(role) {
            ListTemplate::Inline { separator } => separator.clone(),
            ListTemplate::Lines { .. } => ", ".to_string(),
        }
    }

    fn inline_list(&mut self, view: View<'_>, slot: Slot, indent: &str) -> Result<String> {
        let kind = self.view_kind(view);
        let separator = ListRole::of(kind, slot).map_or_else(|| ", ".to_string(), |r| self.separator(r));
        let mut items = Vec::new();
        for handle in self.view_list(view, slot) {
            items.push(self.render_child(handle, indent)?);
        }
        Ok(items.join(&separator))
    }

    /// `{`, one element per line, `}` at `indent`
    fn braced_lines(&mut self, view: View<'_>, slot: Slot, indent: &str) -> Result<String> {
        let kind = self.view_kind(view);
        let nested = match ListRole::of(kind, slot).map(|role| self.options.lists.get(role)) {
            Some(ListTemplate::Lines { nested_indent }) => *nested_indent,
            _ => 0,
        };
        let items = self.view_list(view, slot);
        if items.is_empty() {
            return Ok("{}".to_string());
        }

        let mut out = String::from("{");
        for handle in items {
            let extra = if self.state.handle_kind(handle).is_label() {
                0
            } else {
                nested
            };
            let inner = format!("{indent}{}", self.unit.repeat(1 + extra));
            let text = self.render_child(handle, &inner)?;
            out.push('\n');
            out.push_str(&inner);
            out.push_str(&text);
        }
        out.push('\n');
        out.push_str(indent);
        out.push('}');
        Ok(out)
    }

    /// A statement body: blocks stay on the header line, anything else
    /// goes on its own line one level deeper
    fn branch(&mut self, handle: NodeHandle, indent: &str) -> Result<String> {
        if self.state.handle_kind(handle) == NodeKind::Block {
            Ok(format!(" {}", self.render_child(handle, indent)?))
        } else {
            let inner = format!("{indent}{}", self.unit);
            Ok(format!("\n{inner}{}", self.render_child(handle, &inner)?))
        }
    }

    fn modifiers(&self, view: View<'_>) -> String {
        let modifiers = self.view_property(view, Property::Modifiers);
        let modifiers = modifiers.trim();
        if modifiers.is_empty() {
            String::new()
        } else {
            format!("{modifiers} ")
        }
    }

    /// Text of a node from its kind's template, at relative `indent`
    fn render_template(&mut self, view: View<'_>, indent: &str) -> Result<String> {
        use NodeKind::*;

        let kind = self.view_kind(view);
        let text = match kind {
            CompilationUnit => {
                let mut items = Vec::new();
                for handle in self.view_list(view, Slot::Statements) {
                    items.push(self.render_child(handle, indent)?);
                }
                items.join(&format!("\n{indent}"))
            }
            Block => self.braced_lines(view, Slot::Statements, indent)?,
            ExpressionStatement => format!("{};", self.slot_text(view, Slot::Expression, indent)?),
            VariableDeclarationStatement => format!(
                "{}{} {};",
                self.modifiers(view),
                self.slot_text(view, Slot::Type, indent)?,
                self.inline_list(view, Slot::Fragments, indent)?
            ),
            VariableDeclarationFragment => {
                let name = self.slot_text(view, Slot::Name, indent)?;
                match self.view_child(view, Slot::Initializer) {
                    Some(init) => format!("{name} = {}", self.render_child(init, indent)?),
                    None => name,
                }
            }
            IfStatement => {
                let condition = self.slot_text(view, Slot::Condition, indent)?;
                let mut text = format!("if ({condition})");
                let then = self.view_child(view, Slot::ThenStatement);
                if let Some(then) = then {
                    text.push_str(&self.branch(then, indent)?);
                }
                if let Some(otherwise) = self.view_child(view, Slot::ElseStatement) {
                    let then_is_block =
                        then.is_some_and(|h| self.state.handle_kind(h) == NodeKind::Block);
                    if then_is_block {
                        text.push_str(" else");
                    } else {
                        text.push('\n');
                        text.push_str(indent);
                        text.push_str("else");
                    }
                    if self.state.handle_kind(otherwise) == NodeKind::IfStatement {
                        text.push(' ');
                        text.push_str(&self.render_child(otherwise, indent)?);
                    } else {
                        text.push_str(&self.branch(otherwise, indent)?);
                    }
                }
                text
            }
            WhileStatement => {
                let condition = self.slot_text(view, Slot::Condition, indent)?;
                let body = match self.view_child(view, Slot::Body) {
                    Some(body) => self.branch(body, indent)?,
                    None => String::from(";"),
                };
                format!("while ({condition}){body}")
            }
            ReturnStatement => match self.view_child(view, Slot::Expression) {
                Some(value) => format!("return {};", self.render_child(value, indent)?),
                None => "return;".to_string(),
            },
            BreakStatement => "break;".to_string(),
            ContinueStatement => "continue;".to_string(),
            EmptyStatement => ";".to_string(),
            SwitchStatement => {
                let selector = self.slot_text(view, Slot::Expression, indent)?;
                let body = self.braced_lines(view, Slot::Statements, indent)?;
                format!("switch ({selector}) {body}")
            }
            SwitchCase => match self.view_child(view, Slot::Expression) {
                Some(value) => format!("case {}:", self.render_child(value, indent)?),
                None => "default:".to_string(),
            },
            MethodDeclaration => format!(
                "{}{} {}({}) {}",
                self.modifiers(view),
                self.slot_text(view, Slot::ReturnType, indent)?,
                self.slot_text(view, Slot::Name, indent)?,
                self.inline_list(view, Slot::Parameters, indent)?,
                self.slot_text(view, Slot::Body, indent)?
            ),
            SingleVariableDeclaration => format!(
                "{}{} {}",
                self.modifiers(view),
                self.slot_text(view, Slot::Type, indent)?,
                self.slot_text(view, Slot::Name, indent)?
            ),
            PrimitiveType | NumberLiteral | StringLiteral | CharacterLiteral | BooleanLiteral => {
                self.view_property(view, Property::Token)
            }
            SimpleType => self.slot_text(view, Slot::Name, indent)?,
            SimpleName => self.view_property(view, Property::Identifier),
            NullLiteral => "null".to_string(),
            ThisExpression => "this".to_string(),
            ArrayAccess => format!(
                "{}[{}]",
                self.slot_text(view, Slot::Array, indent)?,
                self.slot_text(view, Slot::Index, indent)?
            ),
            FieldAccess => format!(
                "{}.{}",
                self.slot_text(view, Slot::Expression, indent)?,
                self.slot_text(view, Slot::Name, indent)?
            ),
            MethodInvocation => {
                let receiver = match self.view_child(view, Slot::Expression) {
                    Some(receiver) => format!("{}.", self.render_child(receiver, indent)?),
                    None => String::new(),
                };
                format!(
                    "{receiver}{}({})",
                    self.slot_text(view, Slot::Name, indent)?,
                    self.inline_list(view, Slot::Arguments, indent)?
                )
            }
            ClassInstanceCreation => format!(
                "new {}({})",
                self.slot_text(view, Slot::Type, indent)?,
                self.inline_list(view, Slot::Arguments, indent)?
            ),
            InfixExpression => format!(
                "{} {} {}",
                self.slot_text(view, Slot::LeftOperand, indent)?,
                self.view_property(view, Property::Operator),
                self.slot_text(view, Slot::RightOperand, indent)?
            ),
            PrefixExpression => format!(
                "{}{}",
                self.view_property(view, Property::Operator),
                self.slot_text(view, Slot::Operand, indent)?
            ),
            PostfixExpression => format!(
                "{}{}",
                self.slot_text(view, Slot::Operand, indent)?,
                self.view_property(view, Property::Operator)
            ),
            Assignment => format!(
                "{} {} {}",
                self.slot_text(view, Slot::LeftHandSide, indent)?,
                self.view_property(view, Property::Operator),
                self.slot_text(view, Slot::RightHandSide, indent)?
            ),
            ParenthesizedExpression => {
                format!("({})", self.slot_text(view, Slot::Expression, indent)?)
            }
            ConditionalExpression => format!(
                "{} ? {} : {}",
                self.slot_text(view, Slot::Expression, indent)?,
                self.slot_text(view, Slot::ThenExpression, indent)?,
                self.slot_text(view, Slot::ElseExpression, indent)?
            ),
        };
        Ok(text)
    }
}
