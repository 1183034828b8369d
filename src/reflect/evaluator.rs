use crate::parser::lexer::token::{Token, TokenKind};
use crate::parser::stream::{check_balanced, find_top_level, split_top_level};
use crate::reflect::constants::ConstantResolver;
use crate::reflect::error::ParseError;
use crate::reflect::value::{ArrayBuilder, Value};
use serde::Serialize;
use smallvec::SmallVec;

/// Outcome of evaluating a default-value expression. The definition text is
/// captured in every case; only `Value` carries a concrete result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Evaluation {
    /// The expression is a static literal or known constant.
    Value(Value),
    /// The expression exists but is not statically evaluable (a call, an
    /// operator expression, a class constant, an unknown constant, ...).
    NotEvaluable,
    /// Evaluation was disabled by configuration.
    Disabled,
}

/// A parsed default-value expression: the reproduced source text plus the
/// evaluation outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DefaultExpr {
    pub definition: String,
    pub evaluation: Evaluation,
    /// The expression is exactly the `null` literal. Nullability inference
    /// needs this even when concrete evaluation is disabled.
    pub is_null_literal: bool,
}

/// Evaluates bounded token slices representing single default-value
/// expressions. Unsupported expression shapes are a normal "not evaluable"
/// outcome; only lexically malformed slices raise a parse error.
pub struct Evaluator<'a> {
    source: &'a [u8],
    resolver: &'a dyn ConstantResolver,
    parse_values: bool,
}

impl<'a> Evaluator<'a> {
    pub fn new(source: &'a [u8], resolver: &'a dyn ConstantResolver, parse_values: bool) -> Self {
        Self {
            source,
            resolver,
            parse_values,
        }
    }

    pub fn evaluate(&self, tokens: &[Token]) -> Result<DefaultExpr, ParseError> {
        let Some(first) = tokens.first() else {
            return Err(ParseError::new(
                Default::default(),
                "empty default value expression",
            ));
        };

        if let Some(error) = tokens.iter().find(|t| t.kind == TokenKind::Error) {
            return Err(ParseError::new(
                error.span,
                "malformed default value expression",
            ));
        }
        if let Err(offender) = check_balanced(tokens) {
            return Err(ParseError::new(
                offender.span,
                "unbalanced brackets in default value expression",
            ));
        }

        let definition = self.definition_text(tokens);
        let is_null_literal = tokens.len() == 1 && self.is_null_token(first);

        let evaluation = if !self.parse_values {
            Evaluation::Disabled
        } else {
            match self.parse_expr(tokens) {
                Some(value) => Evaluation::Value(value),
                None => Evaluation::NotEvaluable,
            }
        };

        Ok(DefaultExpr {
            definition,
            evaluation,
            is_null_literal,
        })
    }

    /// Concatenated token lexemes. A space is inserted only where gluing two
    /// lexemes would fuse them into a single token, so the text always
    /// re-lexes to the original token sequence.
    fn definition_text(&self, tokens: &[Token]) -> String {
        fn word_byte(b: u8) -> bool {
            b.is_ascii_alphanumeric() || b == b'_' || b == b'$' || b >= 0x80
        }

        let mut out: Vec<u8> = Vec::new();
        for token in tokens {
            let text = token.text(self.source);
            if let (Some(&last), Some(&first)) = (out.last(), text.first()) {
                if word_byte(last) && word_byte(first) {
                    out.push(b' ');
                }
            }
            out.extend_from_slice(text);
        }
        String::from_utf8_lossy(&out).into_owned()
    }

    fn is_null_token(&self, token: &Token) -> bool {
        token.kind == TokenKind::TypeNull
            || (token.kind == TokenKind::Identifier
                && token.text(self.source).eq_ignore_ascii_case(b"null"))
    }

    fn parse_expr(&self, tokens: &[Token]) -> Option<Value> {
        match tokens {
            [] => None,
            [single] => self.parse_single(single),
            [sign, number]
                if matches!(sign.kind, TokenKind::Minus | TokenKind::Plus)
                    && matches!(number.kind, TokenKind::LNumber | TokenKind::DNumber) =>
            {
                let value = self.parse_single(number)?;
                if sign.kind == TokenKind::Minus {
                    Some(negate(value))
                } else {
                    Some(value)
                }
            }
            _ => {
                if let Some(inner) = array_literal_body(tokens) {
                    self.parse_array(inner)
                } else if let Some(name) = self.qualified_constant_name(tokens) {
                    self.resolver.resolve_constant(&name)
                } else {
                    None
                }
            }
        }
    }

    fn parse_single(&self, token: &Token) -> Option<Value> {
        let text = token.text(self.source);
        match token.kind {
            TokenKind::TypeNull => Some(Value::Null),
            TokenKind::TypeTrue => Some(Value::Bool(true)),
            TokenKind::TypeFalse => Some(Value::Bool(false)),
            TokenKind::LNumber => Some(parse_int_literal(text)),
            TokenKind::DNumber => parse_float_literal(text),
            TokenKind::StringLiteral => parse_string_literal(text),
            TokenKind::Identifier => self.resolver.resolve_constant(text),
            _ => None,
        }
    }

    /// A constant reference spelled as `\Foo\BAR` or `Foo\BAR`: name-like
    /// tokens joined by namespace separators, nothing else. A leading `\`
    /// stays in the name; the resolver treats it as absolute.
    fn qualified_constant_name(&self, tokens: &[Token]) -> Option<Vec<u8>> {
        let mut name: Vec<u8> = Vec::new();
        let mut expect_segment = true;
        let mut iter = tokens.iter().peekable();

        if iter.peek().is_some_and(|t| t.kind == TokenKind::NsSeparator) {
            name.push(b'\\');
            iter.next();
        }
        for token in iter {
            if expect_segment {
                if !token.kind.is_name_like() {
                    return None;
                }
                name.extend_from_slice(token.text(self.source));
            } else if token.kind == TokenKind::NsSeparator {
                name.push(b'\\');
            } else {
                return None;
            }
            expect_segment = !expect_segment;
        }
        // Must end on a segment
        if expect_segment || name.is_empty() {
            return None;
        }
        Some(name)
    }

    fn parse_array(&self, inner: &[Token]) -> Option<Value> {
        let mut builder = ArrayBuilder::new();
        let elements: SmallVec<[&[Token]; 8]> =
            split_top_level(inner, TokenKind::Comma).into_iter().collect();

        for (i, element) in elements.iter().enumerate() {
            if element.is_empty() {
                // A trailing comma leaves one empty tail element; anything
                // else empty is not a literal array.
                if i + 1 == elements.len() {
                    continue;
                }
                return None;
            }
            match find_top_level(element, TokenKind::DoubleArrow) {
                Some(arrow) => {
                    let key = self.parse_expr(&element[..arrow])?;
                    let value = self.parse_expr(&element[arrow + 1..])?;
                    builder.push(Some(key.into_array_key()?), value);
                }
                None => builder.push(None, self.parse_expr(element)?),
            }
        }
        Some(builder.finish())
    }
}

/// The bounded token slice of an array literal body, for either syntax.
fn array_literal_body(tokens: &[Token]) -> Option<&[Token]> {
    match tokens {
        [array, open, inner @ .., close]
            if array.kind == TokenKind::Array
                && open.kind == TokenKind::OpenParen
                && close.kind == TokenKind::CloseParen =>
        {
            Some(inner)
        }
        [open, inner @ .., close]
            if open.kind == TokenKind::OpenBracket && close.kind == TokenKind::CloseBracket =>
        {
            Some(inner)
        }
        _ => None,
    }
}

fn negate(value: Value) -> Value {
    match value {
        Value::Int(i) => Value::Int(i.wrapping_neg()),
        Value::Float(f) => Value::Float(-f),
        other => other,
    }
}

/// Parse an integer literal in any of PHP's radix notations. Values that
/// overflow an i64 spill into a float, as the PHP lexer does.
fn parse_int_literal(text: &[u8]) -> Value {
    let cleaned: Vec<u8> = text.iter().copied().filter(|&b| b != b'_').collect();
    let (radix, digits): (u32, &[u8]) = match &cleaned {
        s if s.len() > 2 && (s.starts_with(b"0x") || s.starts_with(b"0X")) => (16, &s[2..]),
        s if s.len() > 2 && (s.starts_with(b"0b") || s.starts_with(b"0B")) => (2, &s[2..]),
        s if s.len() > 2 && (s.starts_with(b"0o") || s.starts_with(b"0O")) => (8, &s[2..]),
        s if s.len() > 1
            && s[0] == b'0'
            && s[1..].iter().all(|b| (b'0'..=b'7').contains(b)) =>
        {
            (8, &s[1..])
        }
        s => (10, &s[..]),
    };

    let digits = std::str::from_utf8(digits).unwrap_or("0");
    match i64::from_str_radix(digits, radix) {
        Ok(i) => Value::Int(i),
        // Overflowing literal spills into a float.
        Err(_) if radix == 10 => Value::Float(digits.parse::<f64>().unwrap_or(f64::INFINITY)),
        Err(_) => {
            let mut acc = 0f64;
            for b in digits.bytes() {
                let d = (b as char).to_digit(radix).unwrap_or(0);
                acc = acc * f64::from(radix) + f64::from(d);
            }
            Value::Float(acc)
        }
    }
}

fn parse_float_literal(text: &[u8]) -> Option<Value> {
    let cleaned: String = text
        .iter()
        .filter(|&&b| b != b'_')
        .map(|&b| b as char)
        .collect();
    cleaned.parse::<f64>().ok().map(Value::Float)
}

fn parse_string_literal(text: &[u8]) -> Option<Value> {
    if text.len() < 2 {
        return None;
    }
    let inner = &text[1..text.len() - 1];
    match text[0] {
        b'\'' => Some(Value::String(unescape_single_quoted(inner))),
        b'"' => Some(Value::String(unescape_double_quoted(inner))),
        _ => None,
    }
}

/// Single-quoted strings only unescape `\'` and `\\`.
fn unescape_single_quoted(inner: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(inner.len());
    let mut i = 0;
    while i < inner.len() {
        if inner[i] == b'\\' && i + 1 < inner.len() {
            if inner[i + 1] == b'\'' || inner[i + 1] == b'\\' {
                result.push(inner[i + 1]);
                i += 2;
            } else {
                result.push(inner[i]);
                i += 1;
            }
        } else {
            result.push(inner[i]);
            i += 1;
        }
    }
    result
}

/// Unescape a double-quoted string, processing escape sequences like \n,
/// \r, \t, \xHH, \u{...} and octal. No interpolation happens here: default
/// value contexts are always non-interpolated, so `$name` stays literal.
fn unescape_double_quoted(s: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(s.len());
    let mut i = 0;
    while i < s.len() {
        if s[i] == b'\\' && i + 1 < s.len() {
            match s[i + 1] {
                b'n' => result.push(b'\n'),
                b'r' => result.push(b'\r'),
                b't' => result.push(b'\t'),
                b'\\' => result.push(b'\\'),
                b'$' => result.push(b'$'),
                b'"' => result.push(b'"'),
                b'v' => result.push(b'\x0B'),
                b'e' => result.push(b'\x1B'),
                b'f' => result.push(b'\x0C'),
                // Hexadecimal: \xHH
                b'x' if i + 3 < s.len() => {
                    if let (Some(h1), Some(h2)) = (
                        char::from(s[i + 2]).to_digit(16),
                        char::from(s[i + 3]).to_digit(16),
                    ) {
                        result.push((h1 * 16 + h2) as u8);
                        i += 2;
                    } else {
                        result.push(b'\\');
                        result.push(s[i + 1]);
                    }
                }
                // Unicode codepoint: \u{HHHH}
                b'u' if s.get(i + 2) == Some(&b'{') => {
                    if let Some(close) = s[i + 3..].iter().position(|&b| b == b'}') {
                        let hex = &s[i + 3..i + 3 + close];
                        let parsed = std::str::from_utf8(hex)
                            .ok()
                            .and_then(|h| u32::from_str_radix(h, 16).ok())
                            .and_then(char::from_u32);
                        if let Some(c) = parsed {
                            let mut buf = [0u8; 4];
                            result.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
                            i += close + 2;
                        } else {
                            result.push(b'\\');
                            result.push(s[i + 1]);
                        }
                    } else {
                        result.push(b'\\');
                        result.push(s[i + 1]);
                    }
                }
                // Octal: \nnn (up to 3 digits)
                b'0'..=b'7' => {
                    let mut octal_val = s[i + 1] - b'0';
                    let mut consumed = 1;
                    if i + 2 < s.len() && (b'0'..=b'7').contains(&s[i + 2]) {
                        octal_val = octal_val * 8 + (s[i + 2] - b'0');
                        consumed = 2;
                        if i + 3 < s.len() && (b'0'..=b'7').contains(&s[i + 3]) {
                            octal_val = octal_val * 8 + (s[i + 3] - b'0');
                            consumed = 3;
                        }
                    }
                    result.push(octal_val);
                    i += consumed;
                }
                _ => {
                    // Unknown escape, keep both characters
                    result.push(b'\\');
                    result.push(s[i + 1]);
                }
            }
            i += 2;
        } else {
            result.push(s[i]);
            i += 1;
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::stream::TokenStream;
    use crate::reflect::constants::BuiltinConstants;

    fn eval(expr: &str) -> DefaultExpr {
        let source = format!("<?php {expr}");
        let stream = TokenStream::new(source.as_bytes());
        let tokens = stream.slice(1..stream.len());
        let resolver = BuiltinConstants;
        Evaluator::new(stream.source(), &resolver, true)
            .evaluate(tokens)
            .expect("lexically well-formed expression")
    }

    fn value(expr: &str) -> Value {
        match eval(expr).evaluation {
            Evaluation::Value(v) => v,
            other => panic!("expected value for {expr:?}, got {other:?}"),
        }
    }

    #[test]
    fn integer_radixes() {
        assert_eq!(value("1"), Value::Int(1));
        assert_eq!(value("0x1A"), Value::Int(26));
        assert_eq!(value("0b101"), Value::Int(5));
        assert_eq!(value("0o17"), Value::Int(15));
        assert_eq!(value("0777"), Value::Int(511));
        assert_eq!(value("1_000_000"), Value::Int(1_000_000));
        assert_eq!(value("-42"), Value::Int(-42));
    }

    #[test]
    fn overflowing_integer_becomes_float() {
        assert_eq!(
            value("99999999999999999999"),
            Value::Float(99999999999999999999f64)
        );
    }

    #[test]
    fn string_escapes() {
        assert_eq!(value(r"'a\'b\\c\nd'"), Value::String(b"a'b\\c\\nd".to_vec()));
        assert_eq!(
            value(r#""a\tb\x41\u{1F600}\q""#),
            Value::String(b"a\tbA\xF0\x9F\x98\x80\\q".to_vec())
        );
        assert_eq!(value(r#""no $interp""#), Value::String(b"no $interp".to_vec()));
    }

    #[test]
    fn keyed_array_with_auto_index() {
        let v = value("array('a' => 1, 2, 5 => 3, 4,)");
        let Value::Array(entries) = v else { unreachable!() };
        let keys: Vec<_> = entries.keys().cloned().collect();
        use crate::reflect::value::ArrayKey;
        assert_eq!(
            keys,
            vec![
                ArrayKey::String(b"a".to_vec()),
                ArrayKey::Int(0),
                ArrayKey::Int(5),
                ArrayKey::Int(6),
            ]
        );
    }

    #[test]
    fn non_literal_element_poisons_whole_array() {
        let out = eval("array(1, foo())");
        assert_eq!(out.evaluation, Evaluation::NotEvaluable);
        assert_eq!(out.definition, "array(1,foo())");
    }

    #[test]
    fn class_constant_is_not_evaluable_but_reproduced() {
        let out = eval("SomeClass::SOME_CONSTANT");
        assert_eq!(out.evaluation, Evaluation::NotEvaluable);
        assert_eq!(out.definition, "SomeClass::SOME_CONSTANT");
    }

    #[test]
    fn definition_survives_disabled_evaluation() {
        let source = "<?php array ( 1 , 2 )";
        let stream = TokenStream::new(source.as_bytes());
        let tokens = stream.slice(1..stream.len());
        let resolver = BuiltinConstants;
        let out = Evaluator::new(stream.source(), &resolver, false)
            .evaluate(tokens)
            .unwrap();
        assert_eq!(out.evaluation, Evaluation::Disabled);
        assert_eq!(out.definition, "array(1,2)");
    }

    #[test]
    fn unbalanced_slice_is_a_hard_error() {
        let source = "<?php array(1, [2)";
        let stream = TokenStream::new(source.as_bytes());
        let tokens = stream.slice(1..stream.len());
        let resolver = BuiltinConstants;
        assert!(
            Evaluator::new(stream.source(), &resolver, true)
                .evaluate(tokens)
                .is_err()
        );
    }
}
