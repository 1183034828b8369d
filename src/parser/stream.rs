use crate::parser::lexer::Lexer;
use crate::parser::lexer::token::{Token, TokenKind};
use crate::parser::span::Span;
use std::collections::HashMap;
use std::ops::Range;

/// An indexed, rewindable view over the lexed tokens of one source unit.
///
/// Plain comments are filtered out so that structural scanning can address
/// tokens by index without skipping noise. Doc comments are filtered too but
/// remembered by the index of the token they directly precede, so a binder
/// can attach them to declarations.
#[derive(Debug)]
pub struct TokenStream<'src> {
    source: &'src [u8],
    tokens: Vec<Token>,
    docs: HashMap<usize, Span>,
}

impl<'src> TokenStream<'src> {
    pub fn new(source: &'src [u8]) -> Self {
        let mut tokens = Vec::new();
        let mut docs = HashMap::new();
        let mut pending_doc: Option<Span> = None;

        for token in Lexer::new(source) {
            match token.kind {
                TokenKind::Comment => {}
                TokenKind::DocComment => pending_doc = Some(token.span),
                _ => {
                    if let Some(span) = pending_doc.take() {
                        docs.insert(tokens.len(), span);
                    }
                    tokens.push(token);
                }
            }
        }

        Self {
            source,
            tokens,
            docs,
        }
    }

    pub fn source(&self) -> &'src [u8] {
        self.source
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Token> {
        self.tokens.get(index).copied()
    }

    /// Token kind at `index`, or `Eof` past the end.
    pub fn kind(&self, index: usize) -> TokenKind {
        self.tokens
            .get(index)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    pub fn span(&self, index: usize) -> Span {
        self.tokens
            .get(index)
            .map(|t| t.span)
            .unwrap_or_else(|| Span::new(self.source.len(), self.source.len()))
    }

    pub fn text(&self, index: usize) -> &'src [u8] {
        self.span(index).as_str(self.source)
    }

    pub fn slice(&self, range: Range<usize>) -> &[Token] {
        &self.tokens[range.start.min(self.tokens.len())..range.end.min(self.tokens.len())]
    }

    /// The doc comment directly preceding the token at `index`, if any.
    pub fn doc_before(&self, index: usize) -> Option<Span> {
        self.docs.get(&index).copied()
    }
}

/// Bracket-depth contribution of a token. `#[` opens attribute brackets.
fn depth_delta(kind: TokenKind) -> i32 {
    match kind {
        TokenKind::OpenParen
        | TokenKind::OpenBracket
        | TokenKind::OpenBrace
        | TokenKind::Attribute => 1,
        TokenKind::CloseParen | TokenKind::CloseBracket | TokenKind::CloseBrace => -1,
        _ => 0,
    }
}

/// Verify that parens, brackets and braces pair up within the slice.
/// Returns the offending token on mismatch.
pub fn check_balanced(tokens: &[Token]) -> Result<(), Token> {
    let mut stack: Vec<TokenKind> = Vec::new();
    for token in tokens {
        match token.kind {
            TokenKind::OpenParen => stack.push(TokenKind::CloseParen),
            TokenKind::OpenBracket | TokenKind::Attribute => stack.push(TokenKind::CloseBracket),
            TokenKind::OpenBrace => stack.push(TokenKind::CloseBrace),
            TokenKind::CloseParen | TokenKind::CloseBracket | TokenKind::CloseBrace => {
                if stack.pop() != Some(token.kind) {
                    return Err(*token);
                }
            }
            _ => {}
        }
    }
    match tokens.last() {
        Some(last) if !stack.is_empty() => Err(*last),
        _ => Ok(()),
    }
}

/// Split a token slice on every top-level occurrence of `separator`,
/// i.e. occurrences at bracket depth zero. Nested array literals, call
/// argument lists and attribute groups keep their separators.
pub fn split_top_level(tokens: &[Token], separator: TokenKind) -> Vec<&[Token]> {
    let mut pieces = Vec::new();
    let mut depth = 0i32;
    let mut start = 0usize;
    for (i, token) in tokens.iter().enumerate() {
        if token.kind == separator && depth == 0 {
            pieces.push(&tokens[start..i]);
            start = i + 1;
        } else {
            depth += depth_delta(token.kind);
        }
    }
    pieces.push(&tokens[start..]);
    pieces
}

/// Index of the first top-level occurrence of `kind` in the slice.
pub fn find_top_level(tokens: &[Token], kind: TokenKind) -> Option<usize> {
    let mut depth = 0i32;
    for (i, token) in tokens.iter().enumerate() {
        if token.kind == kind && depth == 0 {
            return Some(i);
        }
        depth += depth_delta(token.kind);
    }
    None
}
