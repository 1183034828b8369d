use crate::reflect::value::Value;
use lazy_static::lazy_static;
use std::collections::HashMap;

/// Constant-lookup collaborator used by the expression evaluator. Lookup is
/// case-sensitive, matching PHP's constant semantics; `true`/`false`/`null`
/// never reach this trait (the evaluator handles them as literals).
pub trait ConstantResolver {
    fn resolve_constant(&self, name: &[u8]) -> Option<Value>;
}

lazy_static! {
    static ref BUILTIN_CONSTANTS: HashMap<&'static [u8], Value> = {
        let mut m: HashMap<&'static [u8], Value> = HashMap::new();
        m.insert(b"E_ERROR".as_slice(), Value::Int(1));
        m.insert(b"E_WARNING".as_slice(), Value::Int(2));
        m.insert(b"E_PARSE".as_slice(), Value::Int(4));
        m.insert(b"E_NOTICE".as_slice(), Value::Int(8));
        m.insert(b"E_CORE_ERROR".as_slice(), Value::Int(16));
        m.insert(b"E_CORE_WARNING".as_slice(), Value::Int(32));
        m.insert(b"E_COMPILE_ERROR".as_slice(), Value::Int(64));
        m.insert(b"E_COMPILE_WARNING".as_slice(), Value::Int(128));
        m.insert(b"E_USER_ERROR".as_slice(), Value::Int(256));
        m.insert(b"E_USER_WARNING".as_slice(), Value::Int(512));
        m.insert(b"E_USER_NOTICE".as_slice(), Value::Int(1024));
        m.insert(b"E_STRICT".as_slice(), Value::Int(2048));
        m.insert(b"E_RECOVERABLE_ERROR".as_slice(), Value::Int(4096));
        m.insert(b"E_DEPRECATED".as_slice(), Value::Int(8192));
        m.insert(b"E_USER_DEPRECATED".as_slice(), Value::Int(16384));
        m.insert(b"E_ALL".as_slice(), Value::Int(32767));
        m.insert(b"PHP_INT_MAX".as_slice(), Value::Int(i64::MAX));
        m.insert(b"PHP_INT_MIN".as_slice(), Value::Int(i64::MIN));
        m.insert(b"PHP_INT_SIZE".as_slice(), Value::Int(8));
        m.insert(b"PHP_FLOAT_EPSILON".as_slice(), Value::Float(f64::EPSILON));
        m.insert(b"PHP_FLOAT_MAX".as_slice(), Value::Float(f64::MAX));
        m.insert(b"PHP_FLOAT_DIG".as_slice(), Value::Int(15));
        m.insert(b"PHP_EOL".as_slice(), Value::string("\n"));
        m.insert(b"DIRECTORY_SEPARATOR".as_slice(), Value::string("/"));
        m.insert(b"PATH_SEPARATOR".as_slice(), Value::string(":"));
        m.insert(b"SORT_REGULAR".as_slice(), Value::Int(0));
        m.insert(b"SORT_NUMERIC".as_slice(), Value::Int(1));
        m.insert(b"SORT_STRING".as_slice(), Value::Int(2));
        m.insert(b"SORT_ASC".as_slice(), Value::Int(4));
        m.insert(b"SORT_DESC".as_slice(), Value::Int(3));
        m.insert(b"SORT_FLAG_CASE".as_slice(), Value::Int(8));
        m.insert(b"COUNT_NORMAL".as_slice(), Value::Int(0));
        m.insert(b"COUNT_RECURSIVE".as_slice(), Value::Int(1));
        m.insert(b"M_PI".as_slice(), Value::Float(std::f64::consts::PI));
        m.insert(b"M_E".as_slice(), Value::Float(std::f64::consts::E));
        m.insert(b"M_SQRT2".as_slice(), Value::Float(std::f64::consts::SQRT_2));
        m.insert(b"JSON_HEX_TAG".as_slice(), Value::Int(1));
        m.insert(b"JSON_PRETTY_PRINT".as_slice(), Value::Int(128));
        m.insert(b"JSON_UNESCAPED_SLASHES".as_slice(), Value::Int(64));
        m.insert(b"JSON_UNESCAPED_UNICODE".as_slice(), Value::Int(256));
        m
    };
}

/// The always-available PHP engine constants.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinConstants;

impl ConstantResolver for BuiltinConstants {
    fn resolve_constant(&self, name: &[u8]) -> Option<Value> {
        BUILTIN_CONSTANTS.get(name).cloned()
    }
}
