//! Static PHP reflection derived from token streams.
//!
//! The crate lexes PHP source text, structurally scans it for function,
//! method and class declarations, and exposes the result through a
//! reflection-like API, without ever loading or executing the code. The
//! heart of it is parameter-signature extraction: nullability, optionality,
//! by-reference passing, type-hint resolution and static evaluation of
//! default-value expressions.
//!
//! ```
//! use php_reflect::{ParseConfig, Registry};
//!
//! let mut registry = Registry::with_config(ParseConfig::with_value_definitions(true));
//! registry.parse_source("demo.php", b"<?php function greet(string $name, $mark = '!') {}");
//!
//! let greet = registry.function("greet").unwrap();
//! let mark = greet.parameter_by_name("mark").unwrap();
//! assert!(mark.is_optional());
//! assert_eq!(mark.default_value_definition(), Some("'!'"));
//! ```

pub mod parser;
pub mod reflect;

pub use reflect::{
    ParseConfig, ParseError, ReflectionClass, ReflectionError, ReflectionFunction,
    ReflectionParameter, Registry, UnitReport, Value, parse_value_definitions,
    set_parse_value_definitions,
};
