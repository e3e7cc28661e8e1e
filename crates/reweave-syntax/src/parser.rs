//! Recursive-descent parser building a `SyntaxTree`
//!
//! Children are pushed before their parents, so every node is built
//! bottom-up through `TreeBuilder`. Node ranges run from the first to the
//! last token of the node; whitespace and comments stay between ranges.

use reweave_core::{NodeId, NodeKind, NodeSpec, Property, Slot, SyntaxTree, TextRange, TreeBuilder};
use tracing::debug;

use crate::error::ParseError;
use crate::lexer::{lex, Spanned, Token};

type Result<T> = std::result::Result<T, ParseError>;

/// Parse a compilation unit: a sequence of statements and method declarations
pub fn parse(source: &str) -> Result<SyntaxTree> {
    let tokens = lex(source)?;
    let parser = Parser {
        source,
        tokens,
        pos: 0,
        builder: TreeBuilder::new(source),
    };
    let tree = parser.compilation_unit()?;
    debug!(tree = %tree.id(), nodes = tree.len(), bytes = source.len(), "parsed source");
    Ok(tree)
}

struct Parser<'s> {
    source: &'s str,
    tokens: Vec<Spanned>,
    pos: usize,
    builder: TreeBuilder,
}

impl<'s> Parser<'s> {
    // === Token access ===

    fn peek(&self) -> Option<Token> {
        self.peek_nth(0)
    }

    fn peek_nth(&self, n: usize) -> Option<Token> {
        self.tokens.get(self.pos + n).map(|t| t.token)
    }

    fn at(&self, token: Token) -> bool {
        self.peek() == Some(token)
    }

    fn start(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map_or(self.source.len(), |t| t.range.start)
    }

    /// End of the last consumed token
    fn end(&self) -> usize {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map_or(0, |t| t.range.end)
    }

    fn text(&self, range: TextRange) -> &'s str {
        &self.source[range.start..range.end]
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        match self.tokens.get(self.pos) {
            Some(t) => ParseError::UnexpectedToken {
                offset: t.range.start,
                expected: expected.to_string(),
                found: self.text(t.range).to_string(),
            },
            None => ParseError::UnexpectedEof {
                expected: expected.to_string(),
            },
        }
    }

    fn bump(&mut self, expected: &str) -> Result<Spanned> {
        let token = self
            .tokens
            .get(self.pos)
            .copied()
            .ok_or_else(|| self.unexpected(expected))?;
        self.pos += 1;
        Ok(token)
    }

    fn eat(&mut self, token: Token) -> Option<Spanned> {
        let spanned = self.tokens.get(self.pos).copied().filter(|t| t.token == token)?;
        self.pos += 1;
        Some(spanned)
    }

    fn expect(&mut self, token: Token) -> Result<Spanned> {
        self.eat(token)
            .ok_or_else(|| self.unexpected(&token.to_string()))
    }

    fn push(&mut self, spec: NodeSpec) -> Result<NodeId> {
        Ok(self.builder.push(spec)?)
    }

    fn range_of(&self, id: NodeId) -> TextRange {
        self.builder.range(id).unwrap_or_default()
    }

    // === Statements ===

    fn compilation_unit(mut self) -> Result<SyntaxTree> {
        let mut statements = Vec::new();
        while self.peek().is_some() {
            statements.push(self.statement()?);
        }
        let root = self.push(
            NodeSpec::new(NodeKind::CompilationUnit, 0..self.source.len())
                .list(Slot::Statements, statements),
        )?;
        Ok(self.builder.finish(root)?)
    }

    fn statement(&mut self) -> Result<NodeId> {
        let Some(token) = self.peek() else {
            return Err(self.unexpected("statement"));
        };
        let start = self.start();
        match token {
            Token::LBrace => self.block(),
            Token::If => self.if_statement(),
            Token::While => self.while_statement(),
            Token::Switch => self.switch_statement(),
            Token::Return => {
                self.pos += 1;
                let value = if self.at(Token::Semi) {
                    None
                } else {
                    Some(self.expression()?)
                };
                self.expect(Token::Semi)?;
                self.push(
                    NodeSpec::new(NodeKind::ReturnStatement, start..self.end())
                        .optional(Slot::Expression, value),
                )
            }
            Token::Break | Token::Continue => {
                self.pos += 1;
                self.expect(Token::Semi)?;
                let kind = if token == Token::Break {
                    NodeKind::BreakStatement
                } else {
                    NodeKind::ContinueStatement
                };
                self.push(NodeSpec::new(kind, start..self.end()))
            }
            Token::Semi => {
                self.pos += 1;
                self.push(NodeSpec::new(NodeKind::EmptyStatement, start..self.end()))
            }
            Token::Modifier | Token::Primitive => self.declaration(),
            Token::Ident if self.peek_nth(1) == Some(Token::Ident) => self.declaration(),
            _ => {
                let expression = self.expression()?;
                self.expect(Token::Semi)?;
                self.push(
                    NodeSpec::new(NodeKind::ExpressionStatement, start..self.end())
                        .child(Slot::Expression, expression),
                )
            }
        }
    }

    fn block(&mut self) -> Result<NodeId> {
        let start = self.expect(Token::LBrace)?.range.start;
        let mut statements = Vec::new();
        while !self.at(Token::RBrace) {
            statements.push(self.statement()?);
        }
        self.expect(Token::RBrace)?;
        self.push(NodeSpec::new(NodeKind::Block, start..self.end()).list(Slot::Statements, statements))
    }

    /// `( expression )` after a keyword
    fn condition(&mut self) -> Result<NodeId> {
        self.expect(Token::LParen)?;
        let condition = self.expression()?;
        self.expect(Token::RParen)?;
        Ok(condition)
    }

    fn if_statement(&mut self) -> Result<NodeId> {
        let start = self.expect(Token::If)?.range.start;
        let condition = self.condition()?;
        let then = self.statement()?;
        let otherwise = match self.eat(Token::Else) {
            Some(_) => Some(self.statement()?),
            None => None,
        };
        self.push(
            NodeSpec::new(NodeKind::IfStatement, start..self.end())
                .child(Slot::Condition, condition)
                .child(Slot::ThenStatement, then)
                .optional(Slot::ElseStatement, otherwise),
        )
    }

    fn while_statement(&mut self) -> Result<NodeId> {
        let start = self.expect(Token::While)?.range.start;
        let condition = self.condition()?;
        let body = self.statement()?;
        self.push(
            NodeSpec::new(NodeKind::WhileStatement, start..self.end())
                .child(Slot::Condition, condition)
                .child(Slot::Body, body),
        )
    }

    /// Case labels are flat elements of the switch body, like statements
    fn switch_statement(&mut self) -> Result<NodeId> {
        let start = self.expect(Token::Switch)?.range.start;
        let selector = self.condition()?;
        self.expect(Token::LBrace)?;
        let mut body = Vec::new();
        while !self.at(Token::RBrace) {
            let label_start = self.start();
            let label = match self.peek() {
                Some(Token::Case) => {
                    self.pos += 1;
                    Some(Some(self.expression()?))
                }
                Some(Token::Default) => {
                    self.pos += 1;
                    Some(None)
                }
                _ => None,
            };
            let element = match label {
                Some(value) => {
                    self.expect(Token::Colon)?;
                    self.push(
                        NodeSpec::new(NodeKind::SwitchCase, label_start..self.end())
                            .optional(Slot::Expression, value),
                    )?
                }
                None => self.statement()?,
            };
            body.push(element);
        }
        self.expect(Token::RBrace)?;
        self.push(
            NodeSpec::new(NodeKind::SwitchStatement, start..self.end())
                .child(Slot::Expression, selector)
                .list(Slot::Statements, body),
        )
    }

    /// Modifier keywords as one property token
    fn modifiers(&mut self) -> Option<TextRange> {
        let first = self.eat(Token::Modifier)?;
        let mut last = first;
        while let Some(next) = self.eat(Token::Modifier) {
            last = next;
        }
        Some(TextRange::new(first.range.start, last.range.end))
    }

    fn with_modifiers(&self, spec: NodeSpec, modifiers: Option<TextRange>) -> NodeSpec {
        match modifiers {
            Some(range) => spec.property(Property::Modifiers, self.text(range), range),
            None => spec,
        }
    }

    fn declaration(&mut self) -> Result<NodeId> {
        let start = self.start();
        let modifiers = self.modifiers();
        let ty = self.type_reference()?;
        if self.at(Token::Ident) && self.peek_nth(1) == Some(Token::LParen) {
            return self.method_declaration(start, modifiers, ty);
        }

        let mut fragments = Vec::new();
        loop {
            let name = self.simple_name()?;
            let initializer = match self.eat(Token::Assign) {
                Some(_) => Some(self.expression()?),
                None => None,
            };
            let fragment_start = self.range_of(name).start;
            fragments.push(self.push(
                NodeSpec::new(NodeKind::VariableDeclarationFragment, fragment_start..self.end())
                    .child(Slot::Name, name)
                    .optional(Slot::Initializer, initializer),
            )?);
            if self.eat(Token::Comma).is_none() {
                break;
            }
        }
        self.expect(Token::Semi)?;
        let spec = NodeSpec::new(NodeKind::VariableDeclarationStatement, start..self.end())
            .child(Slot::Type, ty)
            .list(Slot::Fragments, fragments);
        let spec = self.with_modifiers(spec, modifiers);
        self.push(spec)
    }

    fn method_declaration(
        &mut self,
        start: usize,
        modifiers: Option<TextRange>,
        return_type: NodeId,
    ) -> Result<NodeId> {
        let name = self.simple_name()?;
        self.expect(Token::LParen)?;
        let mut parameters = Vec::new();
        if self.eat(Token::RParen).is_none() {
            loop {
                let parameter_start = self.start();
                let parameter_modifiers = self.modifiers();
                let ty = self.type_reference()?;
                let parameter_name = self.simple_name()?;
                let spec = NodeSpec::new(
                    NodeKind::SingleVariableDeclaration,
                    parameter_start..self.end(),
                )
                .child(Slot::Type, ty)
                .child(Slot::Name, parameter_name);
                let spec = self.with_modifiers(spec, parameter_modifiers);
                parameters.push(self.push(spec)?);
                if self.eat(Token::Comma).is_none() {
                    break;
                }
            }
            self.expect(Token::RParen)?;
        }
        let body = self.block()?;
        let spec = NodeSpec::new(NodeKind::MethodDeclaration, start..self.end())
            .child(Slot::ReturnType, return_type)
            .child(Slot::Name, name)
            .list(Slot::Parameters, parameters)
            .child(Slot::Body, body);
        let spec = self.with_modifiers(spec, modifiers);
        self.push(spec)
    }

    fn type_reference(&mut self) -> Result<NodeId> {
        if let Some(token) = self.eat(Token::Primitive) {
            return self.push(
                NodeSpec::new(NodeKind::PrimitiveType, token.range).property(
                    Property::Token,
                    self.text(token.range),
                    token.range,
                ),
            );
        }
        if !self.at(Token::Ident) {
            return Err(self.unexpected("type"));
        }
        let name = self.simple_name()?;
        let range = self.range_of(name);
        self.push(NodeSpec::new(NodeKind::SimpleType, range).child(Slot::Name, name))
    }

    // === Expressions ===

    fn expression(&mut self) -> Result<NodeId> {
        let left = self.conditional()?;
        match self.peek() {
            Some(token) if token.is_assignment() => {
                let operator = self.bump("assignment operator")?;
                let right = self.expression()?;
                let range = self.range_of(left).start..self.end();
                self.push(
                    NodeSpec::new(NodeKind::Assignment, range)
                        .child(Slot::LeftHandSide, left)
                        .child(Slot::RightHandSide, right)
                        .property(Property::Operator, self.text(operator.range), operator.range),
                )
            }
            _ => Ok(left),
        }
    }

    fn conditional(&mut self) -> Result<NodeId> {
        let condition = self.binary(1)?;
        if self.eat(Token::Question).is_none() {
            return Ok(condition);
        }
        let then = self.expression()?;
        self.expect(Token::Colon)?;
        let otherwise = self.conditional()?;
        let range = self.range_of(condition).start..self.end();
        self.push(
            NodeSpec::new(NodeKind::ConditionalExpression, range)
                .child(Slot::Expression, condition)
                .child(Slot::ThenExpression, then)
                .child(Slot::ElseExpression, otherwise),
        )
    }

    /// Precedence climbing over left-associative binary operators
    fn binary(&mut self, min_precedence: u8) -> Result<NodeId> {
        let mut left = self.unary()?;
        while let Some(precedence) = self
            .peek()
            .and_then(Token::infix_precedence)
            .filter(|p| *p >= min_precedence)
        {
            let operator = self.bump("operator")?;
            let right = self.binary(precedence + 1)?;
            let range = self.range_of(left).start..self.end();
            left = self.push(
                NodeSpec::new(NodeKind::InfixExpression, range)
                    .child(Slot::LeftOperand, left)
                    .child(Slot::RightOperand, right)
                    .property(Property::Operator, self.text(operator.range), operator.range),
            )?;
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<NodeId> {
        if !self.peek().is_some_and(Token::is_prefix) {
            return self.postfix();
        }
        let operator = self.bump("operator")?;
        let operand = self.unary()?;
        self.push(
            NodeSpec::new(NodeKind::PrefixExpression, operator.range.start..self.end())
                .child(Slot::Operand, operand)
                .property(Property::Operator, self.text(operator.range), operator.range),
        )
    }

    fn postfix(&mut self) -> Result<NodeId> {
        let mut expression = self.primary()?;
        let start = self.range_of(expression).start;
        loop {
            expression = match self.peek() {
                Some(Token::Dot) => {
                    self.pos += 1;
                    let name = self.simple_name()?;
                    if self.at(Token::LParen) {
                        let arguments = self.arguments()?;
                        self.push(
                            NodeSpec::new(NodeKind::MethodInvocation, start..self.end())
                                .child(Slot::Expression, expression)
                                .child(Slot::Name, name)
                                .list(Slot::Arguments, arguments),
                        )?
                    } else {
                        self.push(
                            NodeSpec::new(NodeKind::FieldAccess, start..self.end())
                                .child(Slot::Expression, expression)
                                .child(Slot::Name, name),
                        )?
                    }
                }
                Some(Token::LBracket) => {
                    self.pos += 1;
                    let index = self.expression()?;
                    self.expect(Token::RBracket)?;
                    self.push(
                        NodeSpec::new(NodeKind::ArrayAccess, start..self.end())
                            .child(Slot::Array, expression)
                            .child(Slot::Index, index),
                    )?
                }
                Some(Token::PlusPlus | Token::MinusMinus) => {
                    let operator = self.bump("operator")?;
                    self.push(
                        NodeSpec::new(NodeKind::PostfixExpression, start..self.end())
                            .child(Slot::Operand, expression)
                            .property(
                                Property::Operator,
                                self.text(operator.range),
                                operator.range,
                            ),
                    )?
                }
                _ => return Ok(expression),
            };
        }
    }

    fn primary(&mut self) -> Result<NodeId> {
        let Some(token) = self.peek() else {
            return Err(self.unexpected("expression"));
        };
        match token {
            Token::Number => self.literal(NodeKind::NumberLiteral),
            Token::String => self.literal(NodeKind::StringLiteral),
            Token::Char => self.literal(NodeKind::CharacterLiteral),
            Token::Boolean => self.literal(NodeKind::BooleanLiteral),
            Token::Null | Token::This => {
                let spanned = self.bump("expression")?;
                let kind = if token == Token::Null {
                    NodeKind::NullLiteral
                } else {
                    NodeKind::ThisExpression
                };
                self.push(NodeSpec::new(kind, spanned.range))
            }
            Token::New => {
                let start = self.bump("new")?.range.start;
                let ty = self.type_reference()?;
                let arguments = self.arguments()?;
                self.push(
                    NodeSpec::new(NodeKind::ClassInstanceCreation, start..self.end())
                        .child(Slot::Type, ty)
                        .list(Slot::Arguments, arguments),
                )
            }
            Token::LParen => {
                let start = self.bump("(")?.range.start;
                let inner = self.expression()?;
                self.expect(Token::RParen)?;
                self.push(
                    NodeSpec::new(NodeKind::ParenthesizedExpression, start..self.end())
                        .child(Slot::Expression, inner),
                )
            }
            Token::Ident => {
                let name = self.simple_name()?;
                if !self.at(Token::LParen) {
                    return Ok(name);
                }
                let start = self.range_of(name).start;
                let arguments = self.arguments()?;
                self.push(
                    NodeSpec::new(NodeKind::MethodInvocation, start..self.end())
                        .child(Slot::Name, name)
                        .list(Slot::Arguments, arguments),
                )
            }
            _ => Err(self.unexpected("expression")),
        }
    }

    fn literal(&mut self, kind: NodeKind) -> Result<NodeId> {
        let token = self.bump("literal")?;
        self.push(NodeSpec::new(kind, token.range).property(
            Property::Token,
            self.text(token.range),
            token.range,
        ))
    }

    fn simple_name(&mut self) -> Result<NodeId> {
        let token = self.expect(Token::Ident)?;
        self.push(NodeSpec::new(NodeKind::SimpleName, token.range).property(
            Property::Identifier,
            self.text(token.range),
            token.range,
        ))
    }

    /// `( expression, ... )`
    fn arguments(&mut self) -> Result<Vec<NodeId>> {
        self.expect(Token::LParen)?;
        let mut arguments = Vec::new();
        if self.eat(Token::RParen).is_some() {
            return Ok(arguments);
        }
        loop {
            arguments.push(self.expression()?);
            if self.eat(Token::Comma).is_none() {
                break;
            }
        }
        self.expect(Token::RParen)?;
        Ok(arguments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(tree: &SyntaxTree, id: NodeId) -> Vec<NodeKind> {
        tree[id].children().map(|child| tree.kind(child)).collect()
    }

    #[test]
    fn test_statements_and_ranges() {
        let source = "int x = 1;\nif (x > 0) {\n    x++;\n} else return;\n";
        let tree = parse(source).unwrap();
        let root = tree.root();
        assert_eq!(
            kinds(&tree, root),
            vec![NodeKind::VariableDeclarationStatement, NodeKind::IfStatement]
        );
        let statement = tree[root].list(Slot::Statements)[1];
        assert_eq!(tree.text(statement), "if (x > 0) {\n    x++;\n} else return;");
        let otherwise = tree[statement].child(Slot::ElseStatement).unwrap();
        assert_eq!(tree.kind(otherwise), NodeKind::ReturnStatement);
        assert_eq!(tree[otherwise].child(Slot::Expression), None);
    }

    #[test]
    fn test_operator_precedence() {
        let tree = parse("a = b + c * d - e;").unwrap();
        let statement = tree[tree.root()].list(Slot::Statements)[0];
        let assignment = tree[statement].child(Slot::Expression).unwrap();
        let right = tree[assignment].child(Slot::RightHandSide).unwrap();
        assert_eq!(tree.text(right), "b + c * d - e");
        assert_eq!(tree[right].property(Property::Operator).unwrap().text, "-");
        let left = tree[right].child(Slot::LeftOperand).unwrap();
        assert_eq!(tree.text(left), "b + c * d");
    }

    #[test]
    fn test_comment_inside_expression() {
        let tree = parse("o[3 /* comment*/ - 1]= this.o[3 - 1];").unwrap();
        let statement = tree[tree.root()].list(Slot::Statements)[0];
        let assignment = tree[statement].child(Slot::Expression).unwrap();
        let left = tree[assignment].child(Slot::LeftHandSide).unwrap();
        let index = tree[left].child(Slot::Index).unwrap();
        assert_eq!(tree.text(index), "3 /* comment*/ - 1");
        let right = tree[assignment].child(Slot::RightHandSide).unwrap();
        let array = tree[right].child(Slot::Array).unwrap();
        assert_eq!(tree.kind(array), NodeKind::FieldAccess);
        assert_eq!(tree.text(array), "this.o");
    }

    #[test]
    fn test_method_declaration() {
        let source = "public static int add(final int a, int b) {\n    return a + b;\n}";
        let tree = parse(source).unwrap();
        let method = tree[tree.root()].list(Slot::Statements)[0];
        assert_eq!(tree.kind(method), NodeKind::MethodDeclaration);
        assert_eq!(
            tree[method].property(Property::Modifiers).unwrap().text,
            "public static"
        );
        let parameters = tree[method].list(Slot::Parameters);
        assert_eq!(parameters.len(), 2);
        assert_eq!(tree.text(parameters[0]), "final int a");
        let second = tree[parameters[1]].property(Property::Modifiers).unwrap();
        assert!(second.text.is_empty());
        assert_eq!(second.range, TextRange::empty(tree.range(parameters[1]).start));
    }

    #[test]
    fn test_switch_labels_are_flat() {
        let tree = parse("switch (x) {\ncase 1:\n    f();\n    break;\ndefault:\n}").unwrap();
        let switch = tree[tree.root()].list(Slot::Statements)[0];
        assert_eq!(
            kinds(&tree, switch)[1..],
            [
                NodeKind::SwitchCase,
                NodeKind::ExpressionStatement,
                NodeKind::BreakStatement,
                NodeKind::SwitchCase
            ]
        );
    }

    #[test]
    fn test_calls_and_creation() {
        let tree = parse("list.add(new Item(1, \"a\"), 'c');").unwrap();
        let statement = tree[tree.root()].list(Slot::Statements)[0];
        let call = tree[statement].child(Slot::Expression).unwrap();
        assert_eq!(tree.kind(call), NodeKind::MethodInvocation);
        assert_eq!(tree.text(tree[call].child(Slot::Expression).unwrap()), "list");
        let arguments = tree[call].list(Slot::Arguments);
        assert_eq!(tree.kind(arguments[0]), NodeKind::ClassInstanceCreation);
        assert_eq!(tree.kind(arguments[1]), NodeKind::CharacterLiteral);
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            parse("if (x) "),
            Err(ParseError::UnexpectedEof { .. })
        ));
        assert_eq!(
            parse("f(;").unwrap_err().offset(),
            Some(2)
        );
        assert!(matches!(parse("x = #;"), Err(ParseError::UnexpectedChar { offset: 4 })));
    }
}
