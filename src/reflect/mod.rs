pub mod binder;
pub mod config;
pub mod constants;
pub mod error;
pub mod evaluator;
pub mod model;
pub mod params;
pub mod registry;
pub mod value;

pub use binder::UnitReport;
pub use config::{ParseConfig, parse_value_definitions, set_parse_value_definitions};
pub use error::{ParseError, ReflectionError};
pub use registry::{Registry, ReflectionClass, ReflectionFunction, ReflectionParameter};
pub use value::{ArrayKey, Value};
