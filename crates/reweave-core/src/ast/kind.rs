//! Node kinds, child slots and properties
//!
//! The kind set is closed: every kind declares its slot schema (in source
//! order) and the textual properties it carries. Both parsers and the
//! renderer are driven by this table.

use std::fmt;

/// Syntax kinds of the Java-like statement language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    // === Units and statements ===
    CompilationUnit,
    Block,
    ExpressionStatement,
    VariableDeclarationStatement,
    VariableDeclarationFragment,
    IfStatement,
    WhileStatement,
    ReturnStatement,
    BreakStatement,
    ContinueStatement,
    EmptyStatement,
    SwitchStatement,
    SwitchCase,
    MethodDeclaration,
    SingleVariableDeclaration,

    // === Types ===
    PrimitiveType,
    SimpleType,

    // === Expressions ===
    SimpleName,
    NumberLiteral,
    StringLiteral,
    CharacterLiteral,
    BooleanLiteral,
    NullLiteral,
    ThisExpression,
    ArrayAccess,
    FieldAccess,
    MethodInvocation,
    ClassInstanceCreation,
    InfixExpression,
    PrefixExpression,
    PostfixExpression,
    Assignment,
    ParenthesizedExpression,
    ConditionalExpression,
}

/// Named child position of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Slot {
    Statements,
    Expression,
    Type,
    Fragments,
    Name,
    Initializer,
    Condition,
    ThenStatement,
    ElseStatement,
    Body,
    ReturnType,
    Parameters,
    Array,
    Index,
    Arguments,
    LeftOperand,
    RightOperand,
    Operand,
    LeftHandSide,
    RightHandSide,
    ThenExpression,
    ElseExpression,
}

/// Textual, non-node field of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Property {
    /// Name of a `SimpleName`
    Identifier,
    /// Literal or primitive type token
    Token,
    /// Operator of infix, prefix, postfix and assignment expressions
    Operator,
    /// Space separated modifier keywords (`final`, `static`, ...)
    Modifiers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    Required,
    Optional,
    List,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotSpec {
    pub slot: Slot,
    pub cardinality: Cardinality,
}

impl SlotSpec {
    pub fn is_list(&self) -> bool {
        self.cardinality == Cardinality::List
    }
}

/// Builds a `&'static [SlotSpec]` out of struct literals so it is promoted.
macro_rules! slots {
    ($($cardinality:ident $slot:ident),* $(,)?) => {
        &[$(SlotSpec {
            slot: Slot::$slot,
            cardinality: Cardinality::$cardinality,
        }),*]
    };
}

impl NodeKind {
    /// Child slots of this kind, in source order
    pub fn slots(self) -> &'static [SlotSpec] {
        use NodeKind::*;
        match self {
            CompilationUnit | Block => slots![List Statements],
            ExpressionStatement | ParenthesizedExpression => slots![Required Expression],
            VariableDeclarationStatement => slots![Required Type, List Fragments],
            VariableDeclarationFragment => slots![Required Name, Optional Initializer],
            IfStatement => slots![
                Required Condition,
                Required ThenStatement,
                Optional ElseStatement,
            ],
            WhileStatement => slots![Required Condition, Required Body],
            ReturnStatement | SwitchCase => slots![Optional Expression],
            BreakStatement | ContinueStatement | EmptyStatement => slots![],
            SwitchStatement => slots![Required Expression, List Statements],
            MethodDeclaration => slots![
                Required ReturnType,
                Required Name,
                List Parameters,
                Required Body,
            ],
            SingleVariableDeclaration => slots![Required Type, Required Name],
            PrimitiveType => slots![],
            SimpleType => slots![Required Name],
            SimpleName | NumberLiteral | StringLiteral | CharacterLiteral | BooleanLiteral
            | NullLiteral | ThisExpression => slots![],
            ArrayAccess => slots![Required Array, Required Index],
            FieldAccess => slots![Required Expression, Required Name],
            MethodInvocation => slots![Optional Expression, Required Name, List Arguments],
            ClassInstanceCreation => slots![Required Type, List Arguments],
            InfixExpression => slots![Required LeftOperand, Required RightOperand],
            PrefixExpression | PostfixExpression => slots![Required Operand],
            Assignment => slots![Required LeftHandSide, Required RightHandSide],
            ConditionalExpression => slots![
                Required Expression,
                Required ThenExpression,
                Required ElseExpression,
            ],
        }
    }

    /// Textual properties of this kind
    pub fn properties(self) -> &'static [Property] {
        use NodeKind::*;
        match self {
            SimpleName => &[Property::Identifier],
            NumberLiteral | StringLiteral | CharacterLiteral | BooleanLiteral | PrimitiveType => {
                &[Property::Token]
            }
            InfixExpression | PrefixExpression | PostfixExpression | Assignment => {
                &[Property::Operator]
            }
            VariableDeclarationStatement | MethodDeclaration | SingleVariableDeclaration => {
                &[Property::Modifiers]
            }
            _ => &[],
        }
    }

    pub fn slot_spec(self, slot: Slot) -> Option<SlotSpec> {
        self.slots().iter().copied().find(|spec| spec.slot == slot)
    }

    pub fn has_property(self, property: Property) -> bool {
        self.properties().contains(&property)
    }

    pub fn is_statement(self) -> bool {
        use NodeKind::*;
        matches!(
            self,
            Block
                | ExpressionStatement
                | VariableDeclarationStatement
                | IfStatement
                | WhileStatement
                | ReturnStatement
                | BreakStatement
                | ContinueStatement
                | EmptyStatement
                | SwitchStatement
                | SwitchCase
                | MethodDeclaration
        )
    }

    /// Labels sit one nesting level above the statements they introduce
    pub fn is_label(self) -> bool {
        self == NodeKind::SwitchCase
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Layout family of a list-valued slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListRole {
    /// Statements of a block or compilation unit
    Statements,
    /// Case labels and statements of a switch
    SwitchBody,
    /// Call and instance-creation arguments
    Arguments,
    /// Method parameters
    Parameters,
    /// Declarators of a variable declaration
    Fragments,
}

/// Punctuation enclosing a list in the source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Braces,
    Parens,
    None,
}

impl Delimiter {
    pub fn open(self) -> Option<char> {
        match self {
            Delimiter::Braces => Some('{'),
            Delimiter::Parens => Some('('),
            Delimiter::None => None,
        }
    }

    pub fn close(self) -> Option<char> {
        match self {
            Delimiter::Braces => Some('}'),
            Delimiter::Parens => Some(')'),
            Delimiter::None => None,
        }
    }
}

impl ListRole {
    /// Role of the list slot `slot` of a `kind` node
    pub fn of(kind: NodeKind, slot: Slot) -> Option<ListRole> {
        match (kind, slot) {
            (NodeKind::CompilationUnit | NodeKind::Block, Slot::Statements) => {
                Some(ListRole::Statements)
            }
            (NodeKind::SwitchStatement, Slot::Statements) => Some(ListRole::SwitchBody),
            (NodeKind::MethodInvocation | NodeKind::ClassInstanceCreation, Slot::Arguments) => {
                Some(ListRole::Arguments)
            }
            (NodeKind::MethodDeclaration, Slot::Parameters) => Some(ListRole::Parameters),
            (NodeKind::VariableDeclarationStatement, Slot::Fragments) => Some(ListRole::Fragments),
            _ => None,
        }
    }

    pub fn delimiter(self, parent: NodeKind) -> Delimiter {
        match self {
            ListRole::Statements if parent == NodeKind::CompilationUnit => Delimiter::None,
            ListRole::Statements | ListRole::SwitchBody => Delimiter::Braces,
            ListRole::Arguments | ListRole::Parameters => Delimiter::Parens,
            ListRole::Fragments => Delimiter::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_list_slot_has_a_role() {
        let kinds = [
            NodeKind::CompilationUnit,
            NodeKind::Block,
            NodeKind::SwitchStatement,
            NodeKind::MethodInvocation,
            NodeKind::ClassInstanceCreation,
            NodeKind::MethodDeclaration,
            NodeKind::VariableDeclarationStatement,
        ];
        for kind in kinds {
            for spec in kind.slots().iter().filter(|s| s.is_list()) {
                assert!(
                    ListRole::of(kind, spec.slot).is_some(),
                    "{kind} {:?} has no list role",
                    spec.slot
                );
            }
        }
    }

    #[test]
    fn test_slot_lookup() {
        let spec = NodeKind::IfStatement.slot_spec(Slot::ElseStatement).unwrap();
        assert_eq!(spec.cardinality, Cardinality::Optional);
        assert!(NodeKind::IfStatement.slot_spec(Slot::Arguments).is_none());
    }

    #[test]
    fn test_switch_body_is_brace_delimited() {
        let role = ListRole::of(NodeKind::SwitchStatement, Slot::Statements).unwrap();
        assert_eq!(role, ListRole::SwitchBody);
        assert_eq!(role.delimiter(NodeKind::SwitchStatement), Delimiter::Braces);
        assert_eq!(
            ListRole::Statements.delimiter(NodeKind::CompilationUnit),
            Delimiter::None
        );
    }
}
