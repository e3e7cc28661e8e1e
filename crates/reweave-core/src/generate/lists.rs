//! Edits for list slots: one edit per changed region

use super::Generator;
use crate::ast::{Delimiter, ListRole, NodeId, NodeKind, Slot};
use crate::config::ListTemplate;
use crate::edit::TextEdit;
use crate::error::{Result, RewriteError};
use crate::format::{
    end_of_blank_tail, is_first_on_line, line_indent, line_start, next_non_ws, skip_trivia,
    trailing_comment_end,
};
use crate::planner::{plan, ListOp, ListRegion};

/// Effective layout of one list occurrence
#[derive(Debug, Clone)]
enum ListLayout {
    Inline(String),
    Lines { nested: usize },
}

impl Generator<'_, '_> {
    pub(super) fn visit_list(
        &mut self,
        parent: NodeId,
        slot: Slot,
        ids: &[NodeId],
        out: &mut Vec<TextEdit>,
    ) -> Result<()> {
        let changed = self.state.lists.contains_key(&(parent, slot))
            || ids.iter().any(|id| self.state.is_erased(*id));
        if !changed {
            for id in ids {
                self.visit_node(*id, out)?;
            }
            return Ok(());
        }
        self.emit_list(parent, slot, ids, out)
    }

    fn emit_list(
        &mut self,
        parent: NodeId,
        slot: Slot,
        originals: &[NodeId],
        out: &mut Vec<TextEdit>,
    ) -> Result<()> {
        let kind = self.tree.kind(parent);
        let role = ListRole::of(kind, slot).ok_or_else(|| RewriteError::MalformedNode {
            kind,
            reason: format!("slot {slot:?} has no list layout"),
        })?;
        let live = self.state.live_list(parent, slot);
        let script = plan(originals, &live);
        let layout = self.list_layout(role, originals);

        let mut regions = script.regions().into_iter().peekable();
        // A leading region edits the line start of the first retained
        // element, so it goes before that element's own edits.
        if let Some(region) = regions.next_if(|r| r.prev.is_none() && r.next.is_some()) {
            self.emit_region(parent, role, &layout, &region, out)?;
        }
        for op in &script.ops {
            if let ListOp::Retain(id) = op {
                self.visit_node(*id, out)?;
            }
        }
        for region in regions {
            self.emit_region(parent, role, &layout, &region, out)?;
        }
        Ok(())
    }

    fn list_layout(&self, role: ListRole, originals: &[NodeId]) -> ListLayout {
        match self.options.lists.get(role) {
            ListTemplate::Inline { separator } => ListLayout::Inline(separator.clone()),
            ListTemplate::Lines { nested_indent } => {
                let single_line = match (originals.first(), originals.last()) {
                    (Some(first), Some(last)) => {
                        let start = self.tree.range(*first).start;
                        let end = self.tree.range(*last).end;
                        !self.source[start..end].contains('\n')
                            && !is_first_on_line(self.source, start)
                    }
                    _ => false,
                };
                if single_line {
                    ListLayout::Inline(" ".to_string())
                } else {
                    ListLayout::Lines {
                        nested: *nested_indent,
                    }
                }
            }
        }
    }

    fn emit_region(
        &mut self,
        parent: NodeId,
        role: ListRole,
        layout: &ListLayout,
        region: &ListRegion,
        out: &mut Vec<TextEdit>,
    ) -> Result<()> {
        match layout {
            ListLayout::Inline(separator) => self.emit_inline(parent, role, separator, region, out),
            ListLayout::Lines { nested } => self.emit_lines(parent, role, *nested, region, out),
        }
    }

    fn emit_inline(
        &mut self,
        parent: NodeId,
        role: ListRole,
        separator: &str,
        region: &ListRegion,
        out: &mut Vec<TextEdit>,
    ) -> Result<()> {
        let indent = line_indent(self.source, self.tree.range(parent).start);
        let mut items = Vec::with_capacity(region.inserted.len());
        for handle in &region.inserted {
            items.push(self.render_at(*handle, indent)?);
        }
        let first_deleted = region.deleted.first().map(|id| self.tree.range(*id));
        let last_deleted = region.deleted.last().map(|id| self.tree.range(*id));

        let edit = match (region.prev, region.next) {
            (Some(prev), _) => {
                let start = self.tree.range(prev).end;
                let end = last_deleted.map_or(start, |r| r.end);
                let text: String = items.iter().map(|t| format!("{separator}{t}")).collect();
                TextEdit::replace(start, end, text)
            }
            (None, Some(next)) => {
                let next_start = self.tree.range(next).start;
                let (start, end) = match (first_deleted, last_deleted) {
                    (Some(first), Some(last)) => {
                        (first.start, self.past_separator(last.end, separator, next_start))
                    }
                    _ => (next_start, next_start),
                };
                let text: String = items.iter().map(|t| format!("{t}{separator}")).collect();
                TextEdit::replace(start, end, text)
            }
            (None, None) => match (first_deleted, last_deleted) {
                (Some(first), Some(last)) => {
                    TextEdit::replace(first.start, last.end, items.join(separator))
                }
                _ => {
                    let text = items.join(separator);
                    return self.insert_into_empty(parent, role, text, None, out);
                }
            },
        };
        out.push(edit);
        Ok(())
    }

    fn emit_lines(
        &mut self,
        parent: NodeId,
        role: ListRole,
        nested: usize,
        region: &ListRegion,
        out: &mut Vec<TextEdit>,
    ) -> Result<()> {
        let eol = self.eol;
        let base = self.base_indent(parent, region, nested);
        let mut items = Vec::with_capacity(region.inserted.len());
        for handle in &region.inserted {
            let kind = self.state.handle_kind(*handle);
            let indent = format!("{base}{}", self.unit.repeat(extra_levels(kind, nested)));
            let text = self.render_at(*handle, &indent)?;
            items.push((indent, text));
        }
        let first_deleted = region.deleted.first().map(|id| self.tree.range(*id));
        let last_end = region
            .deleted
            .last()
            .map(|id| trailing_comment_end(self.source, self.tree.range(*id).end));

        let edit = match (region.prev, region.next) {
            (Some(prev), _) => {
                let start = trailing_comment_end(self.source, self.tree.range(prev).end);
                let end = last_end.unwrap_or(start);
                let text: String = items
                    .iter()
                    .map(|(indent, t)| format!("{eol}{indent}{t}"))
                    .collect();
                TextEdit::replace(start, end, text)
            }
            (None, Some(next)) => {
                let next_start = self.tree.range(next).start;
                // Text between the deleted run and `next` stays, comments included
                let (start, end, whole_lines) = match (first_deleted, last_end) {
                    (Some(first), Some(end)) => {
                        let line_end = end_of_blank_tail(self.source, end);
                        if is_first_on_line(self.source, first.start) && line_end > end {
                            (line_start(self.source, first.start), line_end, true)
                        } else {
                            (first.start, next_non_ws(self.source, end).min(next_start), false)
                        }
                    }
                    _ => {
                        let at_line = is_first_on_line(self.source, next_start);
                        let start = if at_line {
                            line_start(self.source, next_start)
                        } else {
                            next_start
                        };
                        (start, start, at_line)
                    }
                };
                let text: String = if whole_lines {
                    items
                        .iter()
                        .map(|(indent, t)| format!("{indent}{t}{eol}"))
                        .collect()
                } else {
                    items.iter().map(|(_, t)| format!("{t} ")).collect()
                };
                TextEdit::replace(start, end, text)
            }
            (None, None) => match (first_deleted, last_end) {
                (Some(first), Some(end)) if items.is_empty() => {
                    let start = if is_first_on_line(self.source, first.start) {
                        line_start(self.source, first.start)
                    } else {
                        first.start
                    };
                    TextEdit::replace(start, end_of_blank_tail(self.source, end), "")
                }
                (Some(first), Some(end)) => {
                    let text = items
                        .iter()
                        .enumerate()
                        .map(|(i, (indent, t))| {
                            if i == 0 {
                                t.clone()
                            } else {
                                format!("{eol}{indent}{t}")
                            }
                        })
                        .collect::<String>();
                    TextEdit::replace(first.start, end, text)
                }
                _ => {
                    let text: String = items
                        .iter()
                        .map(|(indent, t)| format!("{eol}{indent}{t}"))
                        .collect();
                    let parent_indent = line_indent(self.source, self.tree.range(parent).start);
                    let closing = format!("{eol}{parent_indent}");
                    return self.insert_into_empty(parent, role, text, Some(closing), out);
                }
            },
        };
        out.push(edit);
        Ok(())
    }

    /// End of the separator after a deleted inline element, and of the
    /// whitespace following it, never past `limit`
    fn past_separator(&self, end: usize, separator: &str, limit: usize) -> usize {
        let token = separator.trim();
        let at = next_non_ws(self.source, end).min(limit);
        if token.is_empty() {
            return at;
        }
        if self.source[at..limit].starts_with(token) {
            next_non_ws(self.source, at + token.len()).min(limit)
        } else {
            limit
        }
    }

    /// Indentation of a label-level element in this region
    fn base_indent(&self, parent: NodeId, region: &ListRegion, nested: usize) -> String {
        let neighbor = region
            .next
            .or(region.prev)
            .or_else(|| region.deleted.first().copied());
        match neighbor {
            Some(id) => {
                let indent = line_indent(self.source, self.tree.range(id).start);
                let extra = self.unit.repeat(extra_levels(self.tree.kind(id), nested));
                indent.strip_suffix(extra.as_str()).unwrap_or(indent).to_string()
            }
            None => {
                let indent = line_indent(self.source, self.tree.range(parent).start);
                if self.tree.kind(parent) == NodeKind::CompilationUnit {
                    indent.to_string()
                } else {
                    format!("{indent}{}", self.unit)
                }
            }
        }
    }

    /// Place the elements of an originally empty list inside its delimiters
    ///
    /// `closing` is appended when a whitespace-only interior is replaced,
    /// putting the closing delimiter on its own line.
    fn insert_into_empty(
        &mut self,
        parent: NodeId,
        role: ListRole,
        text: String,
        closing: Option<String>,
        out: &mut Vec<TextEdit>,
    ) -> Result<()> {
        let kind = self.tree.kind(parent);
        let range = self.tree.range(parent);
        let delimiter = role.delimiter(kind);

        let (Some(open), Some(close)) = (delimiter.open(), delimiter.close()) else {
            let text = match (&closing, self.source[..range.end].trim().is_empty()) {
                (Some(_), true) => text.trim_start().to_string(),
                _ => text,
            };
            out.push(TextEdit::insert(range.end, text));
            return Ok(());
        };

        let from = self.list_search_start(parent, role);
        let open_at = self.find_delimiter(from, range.end, open).ok_or_else(|| {
            RewriteError::MalformedNode {
                kind,
                reason: format!("no opening {open:?} for its list"),
            }
        })?;
        let interior_start = open_at + open.len_utf8();

        let closes_parent = delimiter == Delimiter::Braces
            && self.source[..range.end].ends_with(close)
            && interior_start < range.end;
        let interior_end = range.end - close.len_utf8();
        match closing {
            Some(closing)
                if closes_parent && self.source[interior_start..interior_end].trim().is_empty() =>
            {
                out.push(TextEdit::replace(
                    interior_start,
                    interior_end,
                    format!("{text}{closing}"),
                ));
            }
            _ => out.push(TextEdit::insert(interior_start, text)),
        }
        Ok(())
    }

    /// End of the last present child before the list, or the parent start
    fn list_search_start(&self, parent: NodeId, role: ListRole) -> usize {
        let node = &self.tree[parent];
        let mut start = node.range().start;
        for (slot, _) in node.slots() {
            if ListRole::of(node.kind(), *slot) == Some(role) {
                break;
            }
            if let Some(child) = node.child(*slot) {
                start = self.tree.range(child).end;
            }
        }
        start
    }

    /// First `delimiter` at or after `from` outside comments
    fn find_delimiter(&self, from: usize, end: usize, delimiter: char) -> Option<usize> {
        let mut at = from;
        while at < end {
            at = skip_trivia(self.source, at);
            let c = self.source[at..].chars().next()?;
            if c == delimiter {
                return (at < end).then_some(at);
            }
            at += c.len_utf8();
        }
        None
    }
}

/// Extra nesting of an element below the list's label level
fn extra_levels(kind: NodeKind, nested: usize) -> usize {
    if kind.is_label() {
        0
    } else {
        nested
    }
}
