use crate::parser::lexer::token::{Token, TokenKind};
use crate::parser::span::Span;
use crate::parser::stream::{check_balanced, split_top_level};
use crate::reflect::error::ParseError;
use crate::reflect::evaluator::Evaluator;
use crate::reflect::model::{HintKind, ParameterDescriptor, TypeHint};

/// Builds Parameter Descriptors from the token slice of one parameter list
/// (the region between the declaration's parentheses). Owner ids are filled
/// in by the binder afterwards.
pub struct ParameterListBuilder<'a> {
    source: &'a [u8],
    evaluator: &'a Evaluator<'a>,
}

impl<'a> ParameterListBuilder<'a> {
    pub fn new(source: &'a [u8], evaluator: &'a Evaluator<'a>) -> Self {
        Self { source, evaluator }
    }

    pub fn build(&self, tokens: &[Token]) -> Result<Vec<ParameterDescriptor>, ParseError> {
        if tokens.is_empty() {
            return Ok(Vec::new());
        }
        if let Err(offender) = check_balanced(tokens) {
            return Err(ParseError::new(
                offender.span,
                "unbalanced brackets in parameter list",
            ));
        }

        let pieces = split_top_level(tokens, TokenKind::Comma);
        let piece_count = pieces.len();
        let mut parameters = Vec::with_capacity(piece_count);

        for (index, piece) in pieces.into_iter().enumerate() {
            if piece.is_empty() {
                // PHP 8 allows one trailing comma.
                if index + 1 == piece_count {
                    continue;
                }
                return Err(ParseError::new(
                    tokens[0].span,
                    "empty parameter in parameter list",
                ));
            }
            let position = parameters.len();
            parameters.push(self.parse_parameter(piece, position)?);
        }

        // Once a parameter is optional, every later one is optional for
        // reflection purposes, matching default-before-optional ordering.
        let first_optional = parameters
            .iter()
            .position(|p| p.default.is_some() || p.variadic);
        if let Some(from) = first_optional {
            for parameter in &mut parameters[from..] {
                parameter.optional = true;
            }
        }

        Ok(parameters)
    }

    fn parse_parameter(
        &self,
        tokens: &[Token],
        position: usize,
    ) -> Result<ParameterDescriptor, ParseError> {
        let span = Span::new(
            tokens[0].span.start,
            tokens[tokens.len() - 1].span.end,
        );
        let mut i = 0;

        // Attribute groups
        while i < tokens.len() && tokens[i].kind == TokenKind::Attribute {
            i = skip_balanced(tokens, i);
        }

        // Constructor promotion modifiers
        let mut promoted = false;
        while i < tokens.len()
            && matches!(
                tokens[i].kind,
                TokenKind::Public
                    | TokenKind::Protected
                    | TokenKind::Private
                    | TokenKind::Readonly
            )
        {
            promoted = true;
            i += 1;
        }

        // Type hint
        let mut nullable = false;
        if i < tokens.len() && tokens[i].kind == TokenKind::Question {
            nullable = true;
            i += 1;
        }
        let type_hint = if i < tokens.len()
            && !matches!(
                tokens[i].kind,
                TokenKind::Ampersand | TokenKind::Ellipsis | TokenKind::Variable
            ) {
            let (raw, next) = self.read_type(tokens, i)?;
            i = next;
            let kind = if raw == b"array" {
                HintKind::Array
            } else {
                let name = String::from_utf8_lossy(&raw).into_owned();
                HintKind::Named {
                    qualified: name.clone(),
                    raw: name,
                }
            };
            Some(TypeHint { nullable, kind })
        } else if nullable {
            return Err(ParseError::new(
                tokens[i.min(tokens.len() - 1)].span,
                "expected type hint after '?'",
            ));
        } else {
            None
        };

        // By-reference marker
        let mut by_ref = false;
        if i < tokens.len() && tokens[i].kind == TokenKind::Ampersand {
            by_ref = true;
            i += 1;
        }

        // Variadic marker
        let mut variadic = false;
        if i < tokens.len() && tokens[i].kind == TokenKind::Ellipsis {
            variadic = true;
            i += 1;
        }

        // Parameter variable
        if i >= tokens.len() || tokens[i].kind != TokenKind::Variable {
            let at = tokens.get(i).map(|t| t.span).unwrap_or(span);
            return Err(ParseError::new(at, "missing parameter name"));
        }
        let name = String::from_utf8_lossy(&tokens[i].text(self.source)[1..]).into_owned();
        i += 1;

        // Default value, or property hooks on a promoted parameter
        let default = if i < tokens.len() {
            match tokens[i].kind {
                TokenKind::Eq => {
                    let expr = &tokens[i + 1..];
                    if expr.is_empty() {
                        return Err(ParseError::new(
                            tokens[i].span,
                            "missing default value expression",
                        ));
                    }
                    Some(self.evaluator.evaluate(expr)?)
                }
                TokenKind::OpenBrace => None,
                _ => {
                    return Err(ParseError::new(
                        tokens[i].span,
                        "unexpected token in parameter",
                    ));
                }
            }
        } else {
            None
        };

        Ok(ParameterDescriptor {
            position,
            name,
            type_hint,
            by_ref,
            variadic,
            promoted,
            default,
            optional: false,
            declaring_function: None,
            declaring_class: None,
            span,
        })
    }

    /// Read one type expression: an atom, optionally extended into a union
    /// or intersection. An `&` only continues the type when what follows is
    /// itself a type; otherwise it is the by-reference marker.
    fn read_type(&self, tokens: &[Token], start: usize) -> Result<(Vec<u8>, usize), ParseError> {
        let (mut raw, mut i) = self.read_type_atom(tokens, start)?;
        loop {
            match tokens.get(i).map(|t| t.kind) {
                Some(TokenKind::Pipe) => {
                    let (atom, next) = self.read_type_atom(tokens, i + 1)?;
                    raw.push(b'|');
                    raw.extend_from_slice(&atom);
                    i = next;
                }
                Some(TokenKind::Ampersand)
                    if tokens.get(i + 1).is_some_and(|t| {
                        t.kind.is_name_like()
                            || matches!(
                                t.kind,
                                TokenKind::NsSeparator | TokenKind::OpenParen
                            )
                    }) =>
                {
                    let (atom, next) = self.read_type_atom(tokens, i + 1)?;
                    raw.push(b'&');
                    raw.extend_from_slice(&atom);
                    i = next;
                }
                _ => break,
            }
        }
        Ok((raw, i))
    }

    fn read_type_atom(
        &self,
        tokens: &[Token],
        start: usize,
    ) -> Result<(Vec<u8>, usize), ParseError> {
        let mut i = start;
        let mut raw: Vec<u8> = Vec::new();

        match tokens.get(i).map(|t| t.kind) {
            Some(TokenKind::OpenParen) => {
                // Parenthesized DNF group, kept verbatim
                let end = skip_balanced(tokens, i);
                for token in &tokens[i..end] {
                    raw.extend_from_slice(token.text(self.source));
                }
                return Ok((raw, end));
            }
            Some(TokenKind::NsSeparator) => {
                raw.push(b'\\');
                i += 1;
            }
            _ => {}
        }

        let mut expect_segment = true;
        while i < tokens.len() {
            let kind = tokens[i].kind;
            if expect_segment && (kind.is_name_like() || kind == TokenKind::Array) {
                raw.extend_from_slice(tokens[i].text(self.source));
                i += 1;
                expect_segment = false;
            } else if !expect_segment && kind == TokenKind::NsSeparator {
                raw.push(b'\\');
                i += 1;
                expect_segment = true;
            } else {
                break;
            }
        }

        if raw.is_empty() || expect_segment && raw != b"\\" && raw.last() == Some(&b'\\') {
            let at = tokens
                .get(i)
                .or_else(|| tokens.last())
                .map(|t| t.span)
                .unwrap_or_default();
            return Err(ParseError::new(at, "malformed type hint"));
        }
        Ok((raw, i))
    }
}

/// Index just past a balanced bracket group starting at `open`.
pub(crate) fn skip_balanced(tokens: &[Token], open: usize) -> usize {
    let mut depth = 0i32;
    let mut i = open;
    while i < tokens.len() {
        match tokens[i].kind {
            TokenKind::OpenParen
            | TokenKind::OpenBracket
            | TokenKind::OpenBrace
            | TokenKind::Attribute => depth += 1,
            TokenKind::CloseParen | TokenKind::CloseBracket | TokenKind::CloseBrace => {
                depth -= 1;
                if depth == 0 {
                    return i + 1;
                }
            }
            _ => {}
        }
        i += 1;
    }
    tokens.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::stream::TokenStream;
    use crate::reflect::constants::BuiltinConstants;
    use crate::reflect::evaluator::Evaluation;
    use crate::reflect::value::Value;

    fn build(list: &str) -> Result<Vec<ParameterDescriptor>, ParseError> {
        let source = format!("<?php {list}");
        let stream = TokenStream::new(source.as_bytes());
        let tokens = stream.slice(1..stream.len());
        let resolver = BuiltinConstants;
        let evaluator = Evaluator::new(stream.source(), &resolver, true);
        ParameterListBuilder::new(stream.source(), &evaluator).build(tokens)
    }

    #[test]
    fn positions_are_gapless() {
        let params = build("$a, array $b, Foo\\Bar &$c, ...$d").unwrap();
        let positions: Vec<_> = params.iter().map(|p| p.position).collect();
        assert_eq!(positions, vec![0, 1, 2, 3]);
        assert_eq!(params[1].type_hint.as_ref().unwrap().kind, HintKind::Array);
        assert!(params[2].by_ref);
        assert!(params[3].variadic);
    }

    #[test]
    fn array_default_commas_do_not_split() {
        let params = build("$a = array(1, 2, 3), $b = [4, 5]").unwrap();
        assert_eq!(params.len(), 2);
        let def = params[0].default.as_ref().unwrap();
        assert_eq!(def.definition, "array(1,2,3)");
    }

    #[test]
    fn optional_propagates_to_later_parameters() {
        let params = build("$a, $b = 1, $c").unwrap();
        assert!(!params[0].optional);
        assert!(params[1].optional);
        assert!(params[2].optional);
        assert!(params[2].default.is_none());
    }

    #[test]
    fn missing_name_is_fatal() {
        let err = build("int").unwrap_err();
        assert_eq!(err.message, "missing parameter name");
    }

    #[test]
    fn nullable_hint_and_null_default() {
        let params = build("?Foo $a, Bar $b = null, Baz $c").unwrap();
        assert!(params[0].allows_null());
        assert!(params[1].allows_null());
        assert!(!params[2].allows_null());
        assert!(params[1].default.as_ref().unwrap().is_null_literal);
    }

    #[test]
    fn promoted_constructor_parameter() {
        let params = build("private readonly int $count = 0").unwrap();
        assert!(params[0].promoted);
        assert_eq!(
            params[0].default.as_ref().unwrap().evaluation,
            Evaluation::Value(Value::Int(0))
        );
    }

    #[test]
    fn union_hint_is_kept_but_not_array() {
        let params = build("int|string $a, A&B $b, &$c").unwrap();
        let HintKind::Named { raw, .. } = &params[0].type_hint.as_ref().unwrap().kind else {
            panic!("expected named hint");
        };
        assert_eq!(raw, "int|string");
        let HintKind::Named { raw, .. } = &params[1].type_hint.as_ref().unwrap().kind else {
            panic!("expected named hint");
        };
        assert_eq!(raw, "A&B");
        assert!(params[2].by_ref);
        assert!(params[2].type_hint.is_none());
    }

    #[test]
    fn trailing_comma_is_allowed() {
        let params = build("$a, $b,").unwrap();
        assert_eq!(params.len(), 2);
    }
}
