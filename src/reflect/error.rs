use crate::parser::span::{LineInfo, Span};
use serde::Serialize;
use std::fmt;

/// A structural parse failure. Fatal to the declaration being parsed, never
/// to the whole source unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ParseError {
    pub span: Span,
    pub message: &'static str,
}

impl ParseError {
    pub fn new(span: Span, message: &'static str) -> Self {
        Self { span, message }
    }

    pub fn to_human_readable(&self, source: &[u8]) -> String {
        self.to_human_readable_with_path(source, None)
    }

    pub fn to_human_readable_with_path(&self, source: &[u8], path: Option<&str>) -> String {
        let Some(LineInfo {
            line,
            column,
            line_text,
        }) = self.span.line_info(source)
        else {
            return format!("error: {}", self.message);
        };

        let line_str = String::from_utf8_lossy(line_text);
        let gutter_width = line.to_string().len();
        let padding = std::cmp::min(line_text.len(), column.saturating_sub(1));
        let highlight_len = std::cmp::max(
            1,
            std::cmp::min(self.span.len(), line_text.len().saturating_sub(padding)),
        );

        let mut marker = String::new();
        marker.push_str(&" ".repeat(padding));
        marker.push_str(&"^".repeat(highlight_len));

        let location = match path {
            Some(path) => format!("{path}:{line}:{column}"),
            None => format!("line {line}, column {column}"),
        };

        format!(
            "error: {}\n --> {}\n{gutter}|\n{line_no:>width$} | {line_src}\n{gutter}| {marker}",
            self.message,
            location,
            gutter = " ".repeat(gutter_width + 1),
            line_no = line,
            width = gutter_width,
            line_src = line_str,
            marker = marker,
        )
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at byte offset {}..{}",
            self.message, self.span.start, self.span.end
        )
    }
}

impl std::error::Error for ParseError {}

/// Query-time unavailability signals. These are normal outcomes of the
/// reflection surface, kept distinct so that a caller can always tell "no
/// default" from "default is null" and "no type hint" from "class unknown".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReflectionError {
    /// `default_value()` was called on a parameter without a default.
    NoDefaultValue { parameter: String },
    /// A default exists textually but no concrete value is available, either
    /// because evaluation is disabled or because the expression is not a
    /// static literal/constant.
    ValueNotEvaluable {
        parameter: String,
        definition: String,
    },
    /// A class-type hint names a class the registry has not seen.
    UnresolvedClass { name: String },
}

impl fmt::Display for ReflectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReflectionError::NoDefaultValue { parameter } => {
                write!(f, "parameter ${parameter} has no default value")
            }
            ReflectionError::ValueNotEvaluable {
                parameter,
                definition,
            } => write!(
                f,
                "default value of parameter ${parameter} is not statically evaluable: {definition}"
            ),
            ReflectionError::UnresolvedClass { name } => {
                write!(f, "class {name} is not known to the registry")
            }
        }
    }
}

impl std::error::Error for ReflectionError {}
