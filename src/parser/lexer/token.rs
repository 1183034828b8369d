use crate::parser::span::Span;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn text<'a>(&self, source: &'a [u8]) -> &'a [u8] {
        self.span.as_str(source)
    }

    pub fn line(&self, source: &[u8]) -> usize {
        source
            .get(..self.span.start)
            .unwrap_or_default()
            .iter()
            .filter(|&&b| b == b'\n')
            .count()
            + 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TokenKind {
    // Keywords relevant to declaration structure
    Function,
    Fn,
    Class,
    Interface,
    Trait,
    Enum,
    Extends,
    Implements,
    Namespace,
    Use,
    As,
    Const,
    Static,
    Abstract,
    Final,
    Readonly,
    Public,
    Protected,
    Private,
    Global,
    New,
    Array,
    List,
    Attribute, // #[

    // Types (for type hints)
    TypeBool,
    TypeInt,
    TypeFloat,
    TypeString,
    TypeObject,
    TypeVoid,
    TypeIterable,
    TypeCallable,
    TypeMixed,
    TypeNever,
    TypeNull,
    TypeFalse,
    TypeTrue,

    // Identifiers & Literals
    Identifier,
    LNumber,
    DNumber,
    StringLiteral,
    Heredoc,
    Backtick,
    Variable,
    InlineHtml,
    Dollar,      // $ (for variable variables like $$a)
    NsSeparator, // \

    // Comments
    Comment,
    DocComment,

    // Symbols
    Arrow,         // ->
    NullSafeArrow, // ?->
    DoubleArrow,   // =>
    DoubleColon,   // ::
    Ellipsis,      // ...

    Plus,
    Minus,
    Asterisk,
    Slash,
    Percent,
    Dot,
    Pow, // **

    Eq, // =

    EqEq,      // ==
    EqEqEq,    // ===
    Bang,      // !
    BangEq,    // !=
    BangEqEq,  // !==
    Lt,        // <
    LtEq,      // <=
    Gt,        // >
    GtEq,      // >=
    Spaceship, // <=>

    Ampersand, // &
    Pipe,      // |
    Caret,     // ^
    BitNot,    // ~
    Sl,        // <<
    Sr,        // >>

    AmpersandAmpersand, // &&
    PipePipe,           // ||
    Question,           // ?
    Coalesce,           // ??
    At,                 // @

    SemiColon,
    Colon,
    Comma,
    OpenBrace,
    CloseBrace,
    OpenParen,
    CloseParen,
    OpenBracket,
    CloseBracket,

    OpenTag,     // <?php
    OpenTagEcho, // <?=
    CloseTag,    // ?>

    Eof,

    // Error token for lexing failures
    Error,
}

impl TokenKind {
    /// Keywords and type names may reappear as member names (semi-reserved
    /// words) and as segments of namespaced names.
    pub fn is_name_like(self) -> bool {
        matches!(
            self,
            TokenKind::Identifier
                | TokenKind::Function
                | TokenKind::Fn
                | TokenKind::Class
                | TokenKind::Interface
                | TokenKind::Trait
                | TokenKind::Enum
                | TokenKind::Extends
                | TokenKind::Implements
                | TokenKind::Namespace
                | TokenKind::Use
                | TokenKind::As
                | TokenKind::Const
                | TokenKind::Static
                | TokenKind::Abstract
                | TokenKind::Final
                | TokenKind::Readonly
                | TokenKind::Public
                | TokenKind::Protected
                | TokenKind::Private
                | TokenKind::Global
                | TokenKind::New
                | TokenKind::Array
                | TokenKind::List
                | TokenKind::TypeBool
                | TokenKind::TypeInt
                | TokenKind::TypeFloat
                | TokenKind::TypeString
                | TokenKind::TypeObject
                | TokenKind::TypeVoid
                | TokenKind::TypeIterable
                | TokenKind::TypeCallable
                | TokenKind::TypeMixed
                | TokenKind::TypeNever
                | TokenKind::TypeNull
                | TokenKind::TypeFalse
                | TokenKind::TypeTrue
        )
    }

    /// Token kinds that may start a parameter or return type hint.
    pub fn starts_type(self) -> bool {
        matches!(
            self,
            TokenKind::Question
                | TokenKind::Array
                | TokenKind::NsSeparator
                | TokenKind::Namespace
                | TokenKind::Static
        ) || self.is_name_like()
    }
}
