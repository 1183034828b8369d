use std::sync::atomic::{AtomicBool, Ordering};

static PARSE_VALUE_DEFINITIONS: AtomicBool = AtomicBool::new(true);

/// Legacy process-wide toggle for default-value evaluation. Registries
/// snapshot it at construction; descriptors that already exist are immutable
/// and never affected by later toggling.
pub fn set_parse_value_definitions(enabled: bool) {
    PARSE_VALUE_DEFINITIONS.store(enabled, Ordering::SeqCst);
}

pub fn parse_value_definitions() -> bool {
    PARSE_VALUE_DEFINITIONS.load(Ordering::SeqCst)
}

/// Per-registry parse configuration. Prefer constructing this explicitly
/// over the global setter; `Default` reads the global toggle once.
#[derive(Debug, Clone, Copy)]
pub struct ParseConfig {
    /// Evaluate default-value expressions to concrete values. The literal
    /// definition text is captured either way.
    pub parse_value_definitions: bool,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            parse_value_definitions: parse_value_definitions(),
        }
    }
}

impl ParseConfig {
    pub fn with_value_definitions(enabled: bool) -> Self {
        Self {
            parse_value_definitions: enabled,
        }
    }
}
