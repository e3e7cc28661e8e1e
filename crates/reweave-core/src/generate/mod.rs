//! Text edit generation
//!
//! Walks the original tree top-down and turns the session's records into
//! byte-range edits. Subtrees without records are skipped, so their text
//! (comments included) survives untouched.

mod layout;
mod lists;
mod render;

use rustc_hash::FxHashSet;
use tracing::{debug, warn};

use crate::ast::{Child, NodeId, SyntaxTree};
use crate::config::FormatOptions;
use crate::edit::TextEdit;
use crate::error::{Result, RewriteError};
use crate::format::{line_indent, Formatter, IndentFormatter};
use crate::rewrite::{PropertyDelta, RewriteState, Terminal, Wrapping};

/// Generate the edits of a session with options detected from its source
pub fn generate(state: RewriteState<'_>) -> Result<Vec<TextEdit>> {
    let options = FormatOptions::for_source(state.tree().source());
    let formatter = IndentFormatter::new(options.whitespace.clone());
    state.generate_with(&options, &formatter)
}

impl RewriteState<'_> {
    /// Consume the session and produce sorted, non-overlapping edits
    pub fn generate_with(
        self,
        options: &FormatOptions,
        formatter: &dyn Formatter,
    ) -> Result<Vec<TextEdit>> {
        let placed = self.placed_synthetics();
        for (source, record) in &self.records {
            if let Some(placeholder) = record.moved.filter(|p| !placed.contains(p)) {
                warn!(node = %source, %placeholder, "move placeholder never placed, its text is dropped");
            }
        }

        let mut generator = Generator::new(&self, options, formatter);
        let mut edits = Vec::new();
        generator.visit_node(self.tree.root(), &mut edits)?;
        let edits = finish(self.tree.source(), edits)?;

        debug!(
            events = self.events().len(),
            touched = generator.touched.len(),
            edits = edits.len(),
            "generated text edits"
        );
        Ok(edits)
    }
}

/// Sort edits, merge insertions sharing an offset, reject overlaps and
/// drop edits that change nothing
pub(crate) fn finish(source: &str, mut edits: Vec<TextEdit>) -> Result<Vec<TextEdit>> {
    // Stable: insertions at one offset keep emission order.
    edits.sort_by_key(|edit| (edit.offset, edit.length));

    let mut merged: Vec<TextEdit> = Vec::with_capacity(edits.len());
    for edit in edits {
        if let Some(last) = merged.last_mut() {
            if last.is_insert() && edit.is_insert() && last.offset == edit.offset {
                last.replacement.push_str(&edit.replacement);
                continue;
            }
            if edit.offset < last.end() {
                return Err(RewriteError::OverlappingEdits {
                    offset: edit.offset,
                });
            }
        }
        merged.push(edit);
    }

    merged.retain(|edit| source.get(edit.offset..edit.end()) != Some(edit.replacement.as_str()));
    Ok(merged)
}

pub(crate) struct Generator<'a, 't> {
    state: &'a RewriteState<'t>,
    tree: &'t SyntaxTree,
    source: &'t str,
    options: &'a FormatOptions,
    formatter: &'a dyn Formatter,
    unit: String,
    eol: &'static str,
    /// Nodes with records and all their ancestors
    touched: FxHashSet<NodeId>,
    /// Sources of the move placeholders being rendered
    moving: Vec<NodeId>,
}

impl<'a, 't> Generator<'a, 't> {
    fn new(
        state: &'a RewriteState<'t>,
        options: &'a FormatOptions,
        formatter: &'a dyn Formatter,
    ) -> Self {
        let tree = state.tree;
        let mut touched = FxHashSet::default();
        let mut mark = |id: NodeId| {
            for node in std::iter::once(id).chain(tree.ancestors(id)) {
                if !touched.insert(node) {
                    break;
                }
            }
        };
        for (id, record) in &state.records {
            if record.is_edited() {
                mark(*id);
            }
        }
        for (parent, _) in state.lists.keys().chain(state.fills.keys()) {
            mark(*parent);
        }

        Self {
            state,
            tree,
            source: tree.source(),
            options,
            formatter,
            unit: options.indent_unit(),
            eol: options.eol(),
            touched,
            moving: Vec::new(),
        }
    }

    /// Edits for `id` at its original position
    fn visit_node(&mut self, id: NodeId, out: &mut Vec<TextEdit>) -> Result<()> {
        if !self.touched.contains(&id) {
            return Ok(());
        }
        match self.state.terminal(id) {
            Some(Terminal::Replaced(replacement)) => {
                let range = self.tree.range(id);
                let indent = line_indent(self.source, range.start);
                let text = self.render_at(replacement, indent)?;
                out.push(TextEdit::replace(range.start, range.end, text));
                Ok(())
            }
            // The parent erases removed and moved-out children.
            Some(Terminal::Removed) => Ok(()),
            None if self.state.is_erased(id) => Ok(()),
            None => self.visit_contents(id, out, true),
        }
    }

    /// Edits inside `id`, ignoring its own disposition
    ///
    /// With `own_shape` the node's wrapping edits, which lie around its
    /// range, are emitted too.
    fn visit_contents(&mut self, id: NodeId, out: &mut Vec<TextEdit>, own_shape: bool) -> Result<()> {
        let state = self.state;
        if let Some(record) = state.record(id) {
            for delta in &record.deltas {
                match delta {
                    PropertyDelta::Set { property, value } => {
                        self.property_edit(id, *property, value, out)
                    }
                    PropertyDelta::Wrapping(Wrapping::IntoBlock) if own_shape => {
                        self.wrap_edits(id, out)
                    }
                    PropertyDelta::Wrapping(Wrapping::OutOfBlock) if own_shape => {
                        self.unwrap_edits(id, out)?
                    }
                    PropertyDelta::Wrapping(_) => {}
                }
            }
        }

        if self.needs_rerender(id)? {
            let range = self.tree.range(id);
            let text = self.rerender(id)?;
            out.push(TextEdit::replace(range.start, range.end, text));
            return Ok(());
        }

        let tree = self.tree;
        for (slot, child) in tree[id].slots() {
            match child {
                Child::Single(Some(child)) if state.is_erased(*child) => {
                    self.erase_optional(id, *slot, *child, out)?
                }
                Child::Single(Some(child)) => self.visit_node(*child, out)?,
                Child::Single(None) => {
                    if let Some(fill) = state.fills.get(&(id, *slot)) {
                        self.fill_optional(id, *slot, *fill, out)?
                    }
                }
                Child::List(ids) => self.visit_list(id, *slot, ids, out)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{NodeKind, Slot};
    use crate::edit::apply_edits;
    use crate::rewrite::{open, EditEvent};
    use crate::synthetic::{FreshNode, NodeHandle};
    use crate::testing::{find, parse};

    fn rewrite(source: &str, edit: impl FnOnce(&mut RewriteState<'_>)) -> String {
        let tree = parse(source);
        let mut state = open(&tree);
        edit(&mut state);
        let edits = generate(state).unwrap();
        apply_edits(source, &edits).unwrap()
    }

    #[test]
    fn test_untouched_session_has_no_edits() {
        let tree = parse("a();\n// keep me\n{\n    b(); // and me\n}\n");
        assert!(generate(open(&tree)).unwrap().is_empty());
    }

    #[test]
    fn test_remove_middle_statement() {
        let source = "{\n    a();\n    b();\n    c();\n}\n";
        let out = rewrite(source, |state| {
            let b = find(state.tree(), "b()");
            state.remove(b).unwrap();
        });
        assert_eq!(out, "{\n    a();\n    c();\n}\n");
    }

    #[test]
    fn test_remove_first_keeps_comment_of_next() {
        let source = "a();\n// about b\nb();\n";
        let out = rewrite(source, |state| {
            let a = find(state.tree(), "a()");
            state.remove(a).unwrap();
        });
        assert_eq!(out, "// about b\nb();\n");
    }

    #[test]
    fn test_replace_first_in_place_of_deleted_line() {
        let source = "{\n    a(); // gone\n    // about b\n    b();\n}\n";
        let out = rewrite(source, |state| {
            let tree = state.tree();
            let block = find(tree, "{");
            let x = state.create_placeholder("x();", NodeKind::ExpressionStatement);
            let mut list = state.list(block, Slot::Statements).unwrap();
            list.remove(find(tree, "a()")).unwrap();
            list.insert_first(x).unwrap();
        });
        assert_eq!(out, "{\n    x();\n    // about b\n    b();\n}\n");
    }

    #[test]
    fn test_remove_else_keeps_comment_of_then() {
        let source = "if (a) f(); // keep\nelse g();\n";
        let out = rewrite(source, |state| {
            let g = find(state.tree(), "g()");
            state.remove(g).unwrap();
        });
        assert_eq!(out, "if (a) f(); // keep\n");
    }

    #[test]
    fn test_insert_after_keeps_trailing_comment() {
        let source = "a(); // first\nb();\n";
        let out = rewrite(source, |state| {
            let tree = state.tree();
            let a = find(tree, "a()");
            let x = state.create_placeholder("x();", NodeKind::ExpressionStatement);
            state.list(tree.root(), Slot::Statements).unwrap().insert_after(a, x).unwrap();
        });
        assert_eq!(out, "a(); // first\nx();\nb();\n");
    }

    #[test]
    fn test_insert_fresh_statement_into_block() {
        let source = "{\n    a();\n}";
        let out = rewrite(source, |state| {
            let block = find(state.tree(), "{");
            let name = state.create(FreshNode::name("z")).unwrap();
            let call = state
                .create(
                    FreshNode::new(NodeKind::MethodInvocation)
                        .with_child(Slot::Name, name)
                        .with_list(Slot::Arguments, []),
                )
                .unwrap();
            let statement = state
                .create(FreshNode::new(NodeKind::ExpressionStatement).with_child(Slot::Expression, call))
                .unwrap();
            state.list(block, Slot::Statements).unwrap().insert_last(statement).unwrap();
        });
        assert_eq!(out, "{\n    a();\n    z();\n}");
    }

    #[test]
    fn test_move_to_front() {
        let source = "a();\nb();\nc();\n";
        let out = rewrite(source, |state| {
            let tree = state.tree();
            let c = state.create_move(find(tree, "c()")).unwrap();
            state.list(tree.root(), Slot::Statements).unwrap().insert_first(c).unwrap();
        });
        assert_eq!(out, "c();\na();\nb();\n");
    }

    #[test]
    fn test_move_out_of_block_reindents() {
        let source = "{\n    x();\n}\ny();\n";
        let out = rewrite(source, |state| {
            let tree = state.tree();
            let x = state.create_move(find(tree, "x()")).unwrap();
            state.list(tree.root(), Slot::Statements).unwrap().insert_last(x).unwrap();
        });
        assert_eq!(out, "{\n}\ny();\nx();\n");
    }

    #[test]
    fn test_copy_is_a_snapshot() {
        let source = "a();\nb();\nc();\n";
        let out = rewrite(source, |state| {
            let tree = state.tree();
            let a = find(tree, "a()");
            let copy = state.create_copy(a).unwrap();
            state.remove(a).unwrap();
            state.list(tree.root(), Slot::Statements).unwrap().insert_last(copy).unwrap();
        });
        assert_eq!(out, "b();\nc();\na();\n");
    }

    #[test]
    fn test_wrap_then_branch_before_else() {
        let source = "if (a)\n    x();\nelse\n    y();\n";
        let out = rewrite(source, |state| {
            let x = find(state.tree(), "x()");
            state.wrap_in_block(x).unwrap();
        });
        assert_eq!(out, "if (a) {\n    x();\n} else\n    y();\n");
    }

    #[test]
    fn test_wrap_list_statement_shifts_continuation_lines() {
        let source = "a();\nif (c)\n    x();\n";
        let out = rewrite(source, |state| {
            let statement = find(state.tree(), "if");
            state.wrap_in_block(statement).unwrap();
        });
        assert_eq!(out, "a();\n{\n    if (c)\n        x();\n}\n");
    }

    #[test]
    fn test_removed_move_can_be_placed_again() {
        let source = "a();\n{\n    b();\n}\n";
        let out = rewrite(source, |state| {
            let tree = state.tree();
            let block = find(tree, "{");
            let moved = state.create_move(find(tree, "a()")).unwrap();
            let mut statements = state.list(tree.root(), Slot::Statements).unwrap();
            statements.insert_last(moved).unwrap();
            statements.remove(moved).unwrap();
            assert!(!state
                .events()
                .iter()
                .any(|event| matches!(event, EditEvent::Insert { .. })));
            assert!(!state.placed_synthetics().contains(&moved));

            state.list(block, Slot::Statements).unwrap().insert_last(moved).unwrap();
            assert!(state.placed_synthetics().contains(&moved));
        });
        assert_eq!(out, "{\n    b();\n    a();\n}\n");
    }

    #[test]
    fn test_replace_with_block_of_itself_is_a_wrap() {
        let source = "if (a)\n    x();\nelse\n    y();\n";
        let tree = parse(source);
        let mut state = open(&tree);
        let x = find(&tree, "x()");
        let moved = state.create_move(x).unwrap();
        let block = state
            .create(FreshNode::new(NodeKind::Block).with_list(Slot::Statements, [moved.into()]))
            .unwrap();
        state.replace(x, block).unwrap();
        assert!(matches!(state.events(), [EditEvent::Modify { node, .. }] if *node == x));

        let edits = generate(state).unwrap();
        assert_eq!(
            apply_edits(source, &edits).unwrap(),
            "if (a) {\n    x();\n} else\n    y();\n"
        );
    }

    #[test]
    fn test_unwrap_block() {
        let source = "if (a) {\n    x();\n}\n";
        let out = rewrite(source, |state| {
            let block = find(state.tree(), "{");
            state.unwrap_block(block).unwrap();
        });
        assert_eq!(out, "if (a)\n    x();\n");
    }

    #[test]
    fn test_generation_is_deterministic() {
        let source = "a();\nb();\n{\n    c();\n}\n";
        let tree = parse(source);
        let run = || {
            let mut state = open(&tree);
            let b = find(&tree, "b()");
            let c = find(&tree, "c()");
            let moved = state.create_move(c).unwrap();
            state.replace(b, moved).unwrap();
            generate(state).unwrap()
        };
        let first = run();
        assert_eq!(first, run());
        assert_eq!(apply_edits(source, &first).unwrap(), "a();\nc();\n{\n}\n");
    }

    #[test]
    fn test_fresh_node_of_other_session_is_foreign() {
        let tree = parse("a();\n");
        let mut other = open(&tree);
        let stray = other.create_placeholder("z();", NodeKind::ExpressionStatement);
        let mut state = open(&tree);
        let err = state
            .list(tree.root(), Slot::Statements)
            .unwrap()
            .insert_last(stray)
            .unwrap_err();
        assert_eq!(
            err,
            RewriteError::ForeignNode {
                node: NodeHandle::Synthetic(stray)
            }
        );
    }

    #[test]
    fn test_finish_sorts_and_merges() {
        let source = "abcdef";
        let edits = vec![
            TextEdit::replace(4, 5, "E"),
            TextEdit::insert(2, "x"),
            TextEdit::insert(2, "y"),
            TextEdit::replace(0, 1, "a"),
        ];
        let edits = finish(source, edits).unwrap();
        assert_eq!(
            edits,
            vec![TextEdit::insert(2, "xy"), TextEdit::replace(4, 5, "E")]
        );
    }

    #[test]
    fn test_finish_rejects_overlap() {
        let edits = vec![TextEdit::replace(0, 3, "x"), TextEdit::insert(2, "y")];
        assert_eq!(
            finish("abcdef", edits),
            Err(RewriteError::OverlappingEdits { offset: 2 })
        );
    }

    #[test]
    fn test_finish_allows_touching_edits() {
        let edits = vec![TextEdit::replace(0, 3, "x"), TextEdit::insert(3, "y")];
        assert_eq!(finish("abcdef", edits).unwrap().len(), 2);
    }
}
