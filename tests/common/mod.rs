//! Common test helpers for php-reflect tests
//!
//! Builds registries from inline PHP source with a known configuration, so
//! individual tests stay declarative.

#![allow(dead_code)]

use php_reflect::{ParseConfig, Registry, UnitReport};

/// Parse one source string with default-value evaluation enabled.
/// Panics if any declaration in it failed to parse.
pub fn reflect(source: &str) -> Registry {
    reflect_with(source, ParseConfig::with_value_definitions(true))
}

/// Parse one source string with definitions captured but not evaluated.
pub fn reflect_definitions_only(source: &str) -> Registry {
    reflect_with(source, ParseConfig::with_value_definitions(false))
}

pub fn reflect_with(source: &str, config: ParseConfig) -> Registry {
    let mut registry = Registry::with_config(config);
    let report = registry.parse_source("test.php", source.as_bytes());
    assert!(
        report.is_clean(),
        "unexpected parse errors: {:?}",
        report.errors
    );
    registry
}

/// Parse a source string that is expected to contain broken declarations;
/// returns the registry together with the unit report.
pub fn reflect_lossy(source: &str) -> (Registry, UnitReport) {
    let mut registry = Registry::with_config(ParseConfig::with_value_definitions(true));
    let report = registry.parse_source("test.php", source.as_bytes());
    (registry, report)
}
