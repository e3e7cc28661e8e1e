//! Tiny statement parser for unit tests
//!
//! Understands `name();`, `{ ... }` and `if (name) stmt else stmt`, with
//! whitespace and `//` comments between tokens.

use crate::ast::{NodeId, NodeKind, NodeSpec, Property, Slot, SyntaxTree, TreeBuilder};

pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub(crate) fn parse(source: &str) -> SyntaxTree {
    init_tracing();
    let mut parser = Mini {
        source,
        pos: 0,
        builder: TreeBuilder::new(source),
    };
    let mut statements = Vec::new();
    loop {
        parser.trivia();
        if parser.pos >= source.len() {
            break;
        }
        statements.push(parser.statement());
    }
    let root = parser
        .builder
        .push(NodeSpec::new(NodeKind::CompilationUnit, 0..source.len()).list(Slot::Statements, statements))
        .unwrap();
    parser.builder.finish(root).unwrap()
}

/// Statement nodes in source order of their start offsets
pub(crate) fn statements(tree: &SyntaxTree) -> Vec<NodeId> {
    let mut found = Vec::new();
    let mut stack = vec![tree.root()];
    while let Some(id) = stack.pop() {
        if tree.kind(id).is_statement() {
            found.push(id);
        }
        stack.extend(tree[id].children());
    }
    found.sort_by_key(|id| tree.range(*id).start);
    found
}

/// The statement whose text starts with `prefix`
pub(crate) fn find(tree: &SyntaxTree, prefix: &str) -> NodeId {
    statements(tree)
        .into_iter()
        .find(|id| tree.text(*id).starts_with(prefix))
        .unwrap_or_else(|| panic!("no statement starting with {prefix:?}"))
}

struct Mini<'s> {
    source: &'s str,
    pos: usize,
    builder: TreeBuilder,
}

impl<'s> Mini<'s> {
    fn rest(&self) -> &'s str {
        &self.source[self.pos..]
    }

    fn trivia(&mut self) {
        loop {
            let rest = self.rest();
            let trimmed = rest.trim_start();
            self.pos += rest.len() - trimmed.len();
            if trimmed.starts_with("//") {
                self.pos += trimmed.find('\n').unwrap_or(trimmed.len());
            } else {
                return;
            }
        }
    }

    fn expect(&mut self, token: &str) {
        self.trivia();
        assert!(self.rest().starts_with(token), "expected {token:?} at {}", self.pos);
        self.pos += token.len();
    }

    fn name(&mut self) -> NodeId {
        self.trivia();
        let start = self.pos;
        let len = self
            .rest()
            .find(|c: char| !c.is_alphanumeric() && c != '_')
            .unwrap_or(self.rest().len());
        self.pos += len;
        let text = &self.source[start..self.pos];
        self.builder
            .push(
                NodeSpec::new(NodeKind::SimpleName, start..self.pos)
                    .property(Property::Identifier, text, start..self.pos),
            )
            .unwrap()
    }

    fn statement(&mut self) -> NodeId {
        self.trivia();
        let start = self.pos;
        if self.rest().starts_with('{') {
            self.pos += 1;
            let mut statements = Vec::new();
            loop {
                self.trivia();
                if self.rest().starts_with('}') {
                    break;
                }
                statements.push(self.statement());
            }
            self.pos += 1;
            return self
                .builder
                .push(NodeSpec::new(NodeKind::Block, start..self.pos).list(Slot::Statements, statements))
                .unwrap();
        }
        if self.rest().starts_with("if ") || self.rest().starts_with("if(") {
            self.pos += 2;
            self.expect("(");
            let condition = self.name();
            self.expect(")");
            let then = self.statement();
            let mut end = self.pos;
            self.trivia();
            let otherwise = if self.rest().starts_with("else") {
                self.pos += 4;
                let otherwise = self.statement();
                end = self.pos;
                Some(otherwise)
            } else {
                self.pos = end;
                None
            };
            return self
                .builder
                .push(
                    NodeSpec::new(NodeKind::IfStatement, start..end)
                        .child(Slot::Condition, condition)
                        .child(Slot::ThenStatement, then)
                        .optional(Slot::ElseStatement, otherwise),
                )
                .unwrap();
        }

        let name = self.name();
        self.expect("()");
        let call = self
            .builder
            .push(
                NodeSpec::new(NodeKind::MethodInvocation, start..self.pos)
                    .child(Slot::Name, name)
                    .list(Slot::Arguments, Vec::new()),
            )
            .unwrap();
        self.expect(";");
        self.builder
            .push(NodeSpec::new(NodeKind::ExpressionStatement, start..self.pos).child(Slot::Expression, call))
            .unwrap()
    }
}
