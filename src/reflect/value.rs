use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// A statically evaluated PHP value. Only the shapes that can appear as a
/// compile-time constant exist here; strings stay byte vectors because PHP
/// strings are byte arrays.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(Vec<u8>),
    Array(IndexMap<ArrayKey, Value>),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ArrayKey {
    Int(i64),
    String(Vec<u8>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn string(text: &str) -> Self {
        Value::String(text.as_bytes().to_vec())
    }

    /// Normalize a value used in key position to an array key, per PHP's
    /// array semantics. Float and array keys are rejected (an array key is
    /// never a float in a constant expression that this crate evaluates;
    /// arrays are illegal keys).
    pub fn into_array_key(self) -> Option<ArrayKey> {
        match self {
            Value::Int(i) => Some(ArrayKey::Int(i)),
            Value::Bool(b) => Some(ArrayKey::Int(i64::from(b))),
            Value::Null => Some(ArrayKey::String(Vec::new())),
            Value::Float(f) => Some(ArrayKey::Int(f as i64)),
            Value::String(s) => Some(canonical_string_key(s)),
            Value::Array(_) => None,
        }
    }
}

/// Integral decimal strings collapse to integer keys, as in PHP.
fn canonical_string_key(s: Vec<u8>) -> ArrayKey {
    let text = match std::str::from_utf8(&s) {
        Ok(t) => t,
        Err(_) => return ArrayKey::String(s),
    };
    if let Ok(i) = text.parse::<i64>() {
        // PHP keeps "012" and "1.0" as string keys; only the canonical
        // decimal form converts.
        if i.to_string() == text {
            return ArrayKey::Int(i);
        }
    }
    ArrayKey::String(s)
}

/// Builds an array value, tracking PHP's auto-index counter for entries
/// without an explicit key.
#[derive(Debug, Default)]
pub struct ArrayBuilder {
    entries: IndexMap<ArrayKey, Value>,
    next_index: i64,
}

impl ArrayBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: Option<ArrayKey>, value: Value) {
        let key = key.unwrap_or(ArrayKey::Int(self.next_index));
        if let ArrayKey::Int(i) = key {
            if i >= self.next_index {
                self.next_index = i.saturating_add(1);
            }
        }
        self.entries.insert(key, value);
    }

    pub fn finish(self) -> Value {
        Value::Array(self.entries)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(&String::from_utf8_lossy(s)),
            Value::Array(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

impl Serialize for ArrayKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ArrayKey::Int(i) => serializer.serialize_i64(*i),
            ArrayKey::String(s) => serializer.serialize_str(&String::from_utf8_lossy(s)),
        }
    }
}
