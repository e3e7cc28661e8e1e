//! Lexer for the statement language using logos
//!
//! Whitespace and comments are skipped; the tree keeps them only as text
//! between node ranges.

use std::fmt;

use logos::Logos;
use reweave_core::TextRange;

use crate::error::ParseError;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"//[^\n]*")]
#[logos(skip r"/\*[^*]*\*+([^/*][^*]*\*+)*/")]
pub enum Token {
    // Keywords
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("while")]
    While,
    #[token("return")]
    Return,
    #[token("break")]
    Break,
    #[token("continue")]
    Continue,
    #[token("switch")]
    Switch,
    #[token("case")]
    Case,
    #[token("default")]
    Default,
    #[token("new")]
    New,
    #[token("this")]
    This,
    #[token("null")]
    Null,
    #[token("true")]
    #[token("false")]
    Boolean,
    #[token("final")]
    #[token("static")]
    #[token("public")]
    #[token("private")]
    #[token("protected")]
    #[token("abstract")]
    #[token("synchronized")]
    Modifier,
    #[token("int")]
    #[token("long")]
    #[token("short")]
    #[token("byte")]
    #[token("char")]
    #[token("boolean")]
    #[token("float")]
    #[token("double")]
    #[token("void")]
    Primitive,

    // Identifiers and literals
    #[regex(r"[a-zA-Z_$][a-zA-Z0-9_$]*")]
    Ident,
    #[regex(r"[0-9]+(\.[0-9]+)?[lLfFdD]?")]
    Number,
    #[regex(r#""([^"\\\n]|\\.)*""#)]
    String,
    #[regex(r"'([^'\\\n]|\\.)*'")]
    Char,

    // Operators
    #[token("=")]
    Assign,
    #[token("+=")]
    PlusAssign,
    #[token("-=")]
    MinusAssign,
    #[token("*=")]
    StarAssign,
    #[token("/=")]
    SlashAssign,
    #[token("||")]
    OrOr,
    #[token("&&")]
    AndAnd,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<")]
    Lt,
    #[token("<=")]
    Lte,
    #[token(">")]
    Gt,
    #[token(">=")]
    Gte,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("!")]
    Bang,
    #[token("++")]
    PlusPlus,
    #[token("--")]
    MinusMinus,
    #[token("?")]
    Question,

    // Punctuation
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(";")]
    Semi,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token(":")]
    Colon,
}

impl Token {
    pub fn is_assignment(self) -> bool {
        matches!(
            self,
            Token::Assign
                | Token::PlusAssign
                | Token::MinusAssign
                | Token::StarAssign
                | Token::SlashAssign
        )
    }

    /// Binding power of a binary operator, higher binds tighter
    pub fn infix_precedence(self) -> Option<u8> {
        let precedence = match self {
            Token::OrOr => 1,
            Token::AndAnd => 2,
            Token::EqEq | Token::NotEq => 3,
            Token::Lt | Token::Lte | Token::Gt | Token::Gte => 4,
            Token::Plus | Token::Minus => 5,
            Token::Star | Token::Slash | Token::Percent => 6,
            _ => return None,
        };
        Some(precedence)
    }

    pub fn is_prefix(self) -> bool {
        matches!(
            self,
            Token::Bang | Token::Minus | Token::Plus | Token::PlusPlus | Token::MinusMinus
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Token::Ident => "identifier",
            Token::Number => "number",
            Token::String => "string literal",
            Token::Char => "character literal",
            Token::Boolean => "boolean literal",
            Token::Modifier => "modifier",
            Token::Primitive => "primitive type",
            Token::LParen => "'('",
            Token::RParen => "')'",
            Token::LBrace => "'{'",
            Token::RBrace => "'}'",
            Token::LBracket => "'['",
            Token::RBracket => "']'",
            Token::Semi => "';'",
            Token::Comma => "','",
            Token::Colon => "':'",
            other => return write!(f, "{other:?}"),
        };
        f.write_str(text)
    }
}

/// A token with its byte range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spanned {
    pub token: Token,
    pub range: TextRange,
}

/// Lex the whole source, failing on the first unknown character
pub fn lex(source: &str) -> Result<Vec<Spanned>, ParseError> {
    Token::lexer(source)
        .spanned()
        .map(|(result, span)| match result {
            Ok(token) => Ok(Spanned {
                token,
                range: span.into(),
            }),
            Err(()) => Err(ParseError::UnexpectedChar { offset: span.start }),
        })
        .collect()
}
