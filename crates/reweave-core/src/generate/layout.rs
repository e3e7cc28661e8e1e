//! Edits for optional slots, properties and block wrapping

use super::Generator;
use crate::ast::{Cardinality, NodeId, NodeKind, Property, Slot};
use crate::edit::TextEdit;
use crate::error::{Result, RewriteError};
use crate::format::{
    gap_start, is_first_on_line, line_indent, next_non_ws, skip_trivia, trailing_comment_end,
};
use crate::synthetic::NodeHandle;

/// Where the text of an optional slot attaches to its parent
#[derive(Debug, Clone, Copy)]
enum Anchor {
    AfterChild(Slot),
    AfterKeyword(&'static str),
    BeforeChild(Slot),
}

#[derive(Debug, Clone, Copy)]
struct SlotLayout {
    anchor: Anchor,
    prefix: &'static str,
    suffix: &'static str,
}

fn slot_layout(kind: NodeKind, slot: Slot) -> Option<SlotLayout> {
    let (anchor, prefix, suffix) = match (kind, slot) {
        (NodeKind::IfStatement, Slot::ElseStatement) => {
            (Anchor::AfterChild(Slot::ThenStatement), " else ", "")
        }
        (NodeKind::VariableDeclarationFragment, Slot::Initializer) => {
            (Anchor::AfterChild(Slot::Name), " = ", "")
        }
        (NodeKind::ReturnStatement, Slot::Expression) => (Anchor::AfterKeyword("return"), " ", ""),
        (NodeKind::MethodInvocation, Slot::Expression) => {
            (Anchor::BeforeChild(Slot::Name), "", ".")
        }
        _ => return None,
    };
    Some(SlotLayout {
        anchor,
        prefix,
        suffix,
    })
}

impl Generator<'_, '_> {
    fn layout_of(&self, parent: NodeId, slot: Slot) -> Option<SlotLayout> {
        let layout = slot_layout(self.tree.kind(parent), slot)?;
        match layout.anchor {
            Anchor::AfterKeyword(keyword) => {
                let start = self.tree.range(parent).start;
                self.source[start..].starts_with(keyword).then_some(layout)
            }
            Anchor::AfterChild(sibling) | Anchor::BeforeChild(sibling) => {
                self.tree[parent].child(sibling).map(|_| layout)
            }
        }
    }

    fn anchor_offset(&self, parent: NodeId, anchor: Anchor) -> usize {
        let node = &self.tree[parent];
        match anchor {
            Anchor::AfterChild(slot) => node
                .child(slot)
                .map_or(node.range().end, |c| self.tree.range(c).end),
            Anchor::AfterKeyword(keyword) => node.range().start + keyword.len(),
            Anchor::BeforeChild(slot) => node
                .child(slot)
                .map_or(node.range().start, |c| self.tree.range(c).start),
        }
    }

    /// Whether a singular slot change has no layout and the parent must be
    /// rendered again from its template
    pub(super) fn needs_rerender(&self, id: NodeId) -> Result<bool> {
        let node = &self.tree[id];
        for spec in node.kind().slots() {
            if spec.is_list() {
                continue;
            }
            let changed = match node.child(spec.slot) {
                Some(child) if self.state.is_erased(child) => {
                    if spec.cardinality == Cardinality::Required {
                        return Err(RewriteError::invalid(
                            child,
                            format!(
                                "moved out of required slot {:?} without a replacement",
                                spec.slot
                            ),
                        ));
                    }
                    true
                }
                Some(_) => false,
                None => self.state.fills.contains_key(&(id, spec.slot)),
            };
            if changed && self.layout_of(id, spec.slot).is_none() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub(super) fn erase_optional(
        &mut self,
        parent: NodeId,
        slot: Slot,
        child: NodeId,
        out: &mut Vec<TextEdit>,
    ) -> Result<()> {
        let layout = self
            .layout_of(parent, slot)
            .ok_or_else(|| RewriteError::invalid(child, format!("no layout for {slot:?}")))?;
        let range = self.tree.range(child);
        let edit = match layout.anchor {
            Anchor::BeforeChild(_) => {
                TextEdit::replace(range.start, self.anchor_offset(parent, layout.anchor), "")
            }
            // A comment trailing the anchor on its line is not part of the slot
            anchor => {
                let start = trailing_comment_end(self.source, self.anchor_offset(parent, anchor));
                TextEdit::replace(start.min(range.start), range.end, "")
            }
        };
        out.push(edit);
        Ok(())
    }

    pub(super) fn fill_optional(
        &mut self,
        parent: NodeId,
        slot: Slot,
        fill: NodeHandle,
        out: &mut Vec<TextEdit>,
    ) -> Result<()> {
        let layout = self
            .layout_of(parent, slot)
            .ok_or_else(|| RewriteError::invalid(fill, format!("no layout for {slot:?}")))?;
        let indent = line_indent(self.source, self.tree.range(parent).start);
        let text = self.render_at(fill, indent)?;
        let at = self.anchor_offset(parent, layout.anchor);
        out.push(TextEdit::insert(
            at,
            format!("{}{text}{}", layout.prefix, layout.suffix),
        ));
        Ok(())
    }

    pub(super) fn property_edit(
        &self,
        id: NodeId,
        property: Property,
        value: &str,
        out: &mut Vec<TextEdit>,
    ) {
        let Some(token) = self.tree[id].property(property) else {
            return;
        };
        let range = token.range;
        if property != Property::Modifiers {
            out.push(TextEdit::replace(range.start, range.end, value));
            return;
        }

        let value = value.trim();
        if value.is_empty() {
            if !range.is_empty() {
                let rest = &self.source[range.end..];
                let spaces = rest.len() - rest.trim_start_matches([' ', '\t']).len();
                out.push(TextEdit::delete(range.start, range.len() + spaces));
            }
        } else if range.is_empty() {
            out.push(TextEdit::insert(range.start, format!("{value} ")));
        } else {
            out.push(TextEdit::replace(range.start, range.end, value));
        }
    }

    /// Offset right after the token introducing a statement slot: the
    /// closing parenthesis of the condition or the `else` keyword
    fn head_anchor(&self, parent: NodeId, slot: Slot, fallback: usize) -> usize {
        let node = &self.tree[parent];
        let (after, token) = match slot {
            Slot::ThenStatement | Slot::Body => (node.child(Slot::Condition), ")"),
            Slot::ElseStatement => (node.child(Slot::ThenStatement), "else"),
            _ => (None, ""),
        };
        if let Some(after) = after {
            let at = skip_trivia(self.source, self.tree.range(after).end);
            if self.source[at..].starts_with(token) {
                return at + token.len();
            }
        }
        gap_start(self.source, fallback)
    }

    /// The `else` branch following `id` in its if statement, if it stays
    fn following_else(&self, id: NodeId) -> Option<NodeId> {
        match self.tree.parent(id) {
            Some((parent, Slot::ThenStatement)) => self.tree[parent]
                .child(Slot::ElseStatement)
                .filter(|e| !self.state.is_erased(*e)),
            _ => None,
        }
    }

    /// Delimiter edits surrounding a statement with `{ }`
    pub(super) fn wrap_edits(&mut self, id: NodeId, out: &mut Vec<TextEdit>) {
        let range = self.tree.range(id);
        let eol = self.eol;
        let Some((parent, slot)) = self.tree.parent(id) else {
            return;
        };

        if self.tree.in_list(id) {
            let indent = line_indent(self.source, range.start);
            out.push(TextEdit::insert(
                range.start,
                format!("{{{eol}{indent}{}", self.unit),
            ));
            self.shift_continuation_lines(id, out);
            out.push(TextEdit::insert(range.end, format!("{eol}{indent}}}")));
            return;
        }

        let parent_indent = line_indent(self.source, self.tree.range(parent).start);
        let own_line = is_first_on_line(self.source, range.start);
        if own_line {
            let at = self.head_anchor(parent, slot, range.start);
            out.push(TextEdit::insert(at, " {"));
        } else {
            out.push(TextEdit::insert(range.start, "{ "));
        }

        let keyword = next_non_ws(self.source, range.end);
        let else_follows = self.following_else(id).is_some()
            && self.source[keyword..].starts_with("else");
        let tail = if else_follows {
            let gap = &self.source[range.end..keyword];
            let text = if !self.options.braces.cuddle_else {
                format!("{eol}{parent_indent}}}{eol}{parent_indent}")
            } else if gap.contains('\n') {
                format!("{eol}{parent_indent}}} ")
            } else {
                " } ".to_string()
            };
            TextEdit::replace(range.end, keyword, text)
        } else if own_line {
            TextEdit::insert(range.end, format!("{eol}{parent_indent}}}"))
        } else {
            TextEdit::insert(range.end, " }")
        };
        out.push(tail);
    }

    /// Indent the continuation lines of `id` by one unit
    ///
    /// A statement with edits of its own inside keeps its continuation
    /// lines where they are; those edits may start at a line start.
    fn shift_continuation_lines(&self, id: NodeId, out: &mut Vec<TextEdit>) {
        let state = self.state;
        let inner_edits = self.tree[id]
            .children()
            .any(|child| self.touched.contains(&child) || state.is_erased(child))
            || state.lists.keys().chain(state.fills.keys()).any(|(parent, _)| *parent == id);
        if inner_edits {
            return;
        }
        let range = self.tree.range(id);
        let text = &self.source[range.start..range.end];
        for (i, _) in text.match_indices('\n') {
            let at = range.start + i + 1;
            let line = self.source[at..range.end].split('\n').next().unwrap_or("");
            if !line.trim().is_empty() {
                out.push(TextEdit::insert(at, self.unit.clone()));
            }
        }
    }

    /// Delimiter edits dropping the braces of a one-statement block
    pub(super) fn unwrap_edits(&mut self, id: NodeId, out: &mut Vec<TextEdit>) -> Result<()> {
        let block = self.tree.range(id);
        let [statement] = self.tree[id].list(Slot::Statements) else {
            return Err(RewriteError::invalid(id, "unwrapped block lost its statement"));
        };
        let inner = self.tree.range(*statement);
        let tail_start = trailing_comment_end(self.source, inner.end).min(block.end);

        if self.tree.in_list(id) {
            out.push(TextEdit::replace(block.start, inner.start, ""));
            out.push(TextEdit::replace(tail_start, block.end, ""));
            return Ok(());
        }
        let Some((parent, slot)) = self.tree.parent(id) else {
            return Ok(());
        };

        let anchor = self.head_anchor(parent, slot, block.start);
        let lead = &self.source[block.start + 1..inner.start];
        let head = if lead.contains('\n') { lead } else { " " };
        out.push(TextEdit::replace(anchor, inner.start, head));

        let keyword = next_non_ws(self.source, block.end);
        if self.following_else(id).is_some() && self.source[keyword..].starts_with("else") {
            let parent_indent = line_indent(self.source, self.tree.range(parent).start);
            let text = if self.source[inner.end..block.end].contains('\n') {
                format!("{}{parent_indent}", self.eol)
            } else {
                " ".to_string()
            };
            out.push(TextEdit::replace(tail_start, keyword, text));
        } else {
            out.push(TextEdit::replace(tail_start, block.end, ""));
        }
        Ok(())
    }
}
