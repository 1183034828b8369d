//! Parameter reflection contract tests
//!
//! These mirror the behavior of PHP's runtime ReflectionParameter for
//! statically parsed declarations: positions, nullability, optionality,
//! defaults, hints, by-reference markers and owner back-references.

mod common;

use common::{reflect, reflect_definitions_only, reflect_lossy};
use php_reflect::reflect::model::HintKind;
use php_reflect::{ReflectionError, Value};

#[test]
fn positions_are_declaration_order_and_gapless() {
    let registry = reflect("<?php function position($first, $second, $third) {}");
    let function = registry.function("position").unwrap();
    let positions: Vec<_> = function.parameters().map(|p| p.position()).collect();
    assert_eq!(positions, vec![0, 1, 2]);
    for (i, parameter) in function.parameters().enumerate() {
        assert_eq!(parameter.position(), i);
    }
}

#[test]
fn untyped_parameters_allow_null() {
    let registry = reflect("<?php function f($untyped, Exception $typed, Exception $defaulted = null, ?Exception $nullable) {}");
    let function = registry.function("f").unwrap();
    assert!(function.parameter_by_name("untyped").unwrap().allows_null());
    assert!(!function.parameter_by_name("typed").unwrap().allows_null());
    assert!(function.parameter_by_name("defaulted").unwrap().allows_null());
    assert!(function.parameter_by_name("nullable").unwrap().allows_null());
}

#[test]
fn optional_parameters_expose_value_and_definition() {
    let source = r#"<?php
        function optionalNull($param = null) {}
        function optionalTrue($param = true) {}
        function optionalFalse($param = false) {}
        function optionalArray($param = array()) {}
        function optionalString($param = 'string') {}
        function optionalInteger($param = 1) {}
        function optionalFloat($param = 1.1) {}
        function optionalConstant($param = E_NOTICE) {}
    "#;
    let registry = reflect(source);

    let expectations: &[(&str, Value, &str)] = &[
        ("optionalNull", Value::Null, "null"),
        ("optionalTrue", Value::Bool(true), "true"),
        ("optionalFalse", Value::Bool(false), "false"),
        ("optionalArray", Value::Array(indexmap::IndexMap::new()), "array()"),
        ("optionalString", Value::String(b"string".to_vec()), "'string'"),
        ("optionalInteger", Value::Int(1), "1"),
        ("optionalFloat", Value::Float(1.1), "1.1"),
        ("optionalConstant", Value::Int(8), "E_NOTICE"),
    ];

    for (name, value, definition) in expectations {
        let function = registry.function(name).unwrap();
        let parameter = function.parameter(0).unwrap();
        assert!(parameter.is_optional(), "{name} should be optional");
        assert!(parameter.is_default_value_available());
        assert_eq!(parameter.default_value().unwrap(), value, "{name}");
        assert_eq!(parameter.default_value_definition(), Some(*definition));
    }
}

#[test]
fn missing_default_is_a_distinct_failure() {
    let registry = reflect("<?php function noOptional($param) {}");
    let parameter = registry
        .function("noOptional")
        .unwrap()
        .parameter(0)
        .unwrap();

    assert!(!parameter.is_optional());
    assert!(!parameter.is_default_value_available());
    assert_eq!(parameter.default_value_definition(), None);
    match parameter.default_value() {
        Err(ReflectionError::NoDefaultValue { parameter }) => {
            assert_eq!(parameter, "param");
        }
        other => panic!("expected NoDefaultValue, got {other:?}"),
    }
}

#[test]
fn null_default_is_distinguishable_from_no_default() {
    let registry = reflect("<?php function f($a = null, $b) {}");
    let function = registry.function("f").unwrap();
    assert_eq!(
        function.parameter(0).unwrap().default_value().unwrap(),
        &Value::Null
    );
    assert!(function.parameter(1).unwrap().default_value().is_err());
}

#[test]
fn unknown_constant_keeps_definition_but_fails_value_retrieval() {
    let registry = reflect("<?php function f($param = UNKNOWN_CONSTANT) {}");
    let parameter = registry.function("f").unwrap().parameter(0).unwrap();

    assert!(parameter.is_default_value_available());
    assert_eq!(parameter.default_value_definition(), Some("UNKNOWN_CONSTANT"));
    match parameter.default_value() {
        Err(ReflectionError::ValueNotEvaluable { definition, .. }) => {
            assert_eq!(definition, "UNKNOWN_CONSTANT");
        }
        other => panic!("expected ValueNotEvaluable, got {other:?}"),
    }
}

#[test]
fn array_hint_reports_is_array() {
    let registry = reflect("<?php function f(array $with, $without) {}");
    let function = registry.function("f").unwrap();
    assert!(function.parameter(0).unwrap().is_array());
    assert!(!function.parameter(1).unwrap().is_array());
    assert!(function.parameter(0).unwrap().class_name().is_none());
}

#[test]
fn class_hint_resolves_against_registry() {
    let registry = reflect("<?php function f(Exception $e, $plain) {}");
    let function = registry.function("f").unwrap();

    let hinted = function.parameter(0).unwrap();
    assert_eq!(hinted.class_name(), Some("Exception"));
    let class = hinted.class().unwrap().unwrap();
    assert_eq!(class.name(), "Exception");
    assert!(class.is_internal());

    let plain = function.parameter(1).unwrap();
    assert_eq!(plain.class_name(), None);
    assert!(plain.class().unwrap().is_none());
}

#[test]
fn unresolved_class_hint_defers_until_the_class_is_parsed() {
    let mut registry = reflect("<?php function f(\\Vendor\\Widget $w) {}");
    let parameter_class = {
        let parameter = registry.function("f").unwrap().parameter(0).unwrap();
        assert_eq!(parameter.class_name(), Some("Vendor\\Widget"));
        parameter.class()
    };
    match parameter_class {
        Err(ReflectionError::UnresolvedClass { name }) => {
            assert_eq!(name, "Vendor\\Widget");
        }
        other => panic!("expected UnresolvedClass, got {other:?}"),
    }

    // The class arrives in a later unit; resolution happens at query time.
    registry.parse_source("widget.php", b"<?php namespace Vendor; class Widget {}");
    let parameter = registry.function("f").unwrap().parameter(0).unwrap();
    let class = parameter.class().unwrap().unwrap();
    assert_eq!(class.name(), "Vendor\\Widget");
}

#[test]
fn by_reference_marker() {
    let registry = reflect("<?php function f(&$reference, $noReference) {}");
    let function = registry.function("f").unwrap();
    assert!(function.parameter(0).unwrap().is_passed_by_reference());
    assert!(!function.parameter(1).unwrap().is_passed_by_reference());
}

#[test]
fn optionality_propagates_past_the_first_default() {
    let registry = reflect("<?php function f($required, $optional = 1, $forced) {}");
    let function = registry.function("f").unwrap();
    assert!(!function.parameter(0).unwrap().is_optional());
    assert!(function.parameter(1).unwrap().is_optional());

    let forced = function.parameter(2).unwrap();
    assert!(forced.is_optional());
    assert!(!forced.is_default_value_available());
}

#[test]
fn variadic_parameter_is_optional() {
    let registry = reflect("<?php function f($first, ...$rest) {}");
    let function = registry.function("f").unwrap();
    let rest = function.parameter(1).unwrap();
    assert!(rest.is_variadic());
    assert!(rest.is_optional());
    assert!(!function.parameter(0).unwrap().is_optional());
}

#[test]
fn free_function_has_no_declaring_class() {
    let registry = reflect("<?php function declaringFunction($param) {}");
    let parameter = registry
        .function("declaringFunction")
        .unwrap()
        .parameter(0)
        .unwrap();

    assert_eq!(parameter.declaring_function().name(), "declaringFunction");
    assert_eq!(parameter.declaring_function_name(), "declaringFunction");
    assert!(!parameter.declaring_function().is_method());
    assert!(parameter.declaring_class().is_none());
    assert!(parameter.declaring_class_name().is_none());
}

#[test]
fn method_parameter_reports_both_owners() {
    let registry = reflect(
        "<?php class TokenHolder { public function declaringMethod($param) {} }",
    );
    let class = registry.class("TokenHolder").unwrap();
    let method = class.method("declaringMethod").unwrap();
    let parameter = method.parameter(0).unwrap();

    assert_eq!(parameter.declaring_function().name(), "declaringMethod");
    assert!(parameter.declaring_function().is_method());
    assert_eq!(
        parameter.declaring_class().unwrap().name(),
        "TokenHolder"
    );
    assert_eq!(parameter.declaring_class_name().as_deref(), Some("TokenHolder"));
}

#[test]
fn definitions_only_configuration_never_evaluates() {
    let registry = reflect_definitions_only("<?php function f($a = array(1, 2)) {}");
    let parameter = registry.function("f").unwrap().parameter(0).unwrap();

    assert!(parameter.is_default_value_available());
    assert_eq!(parameter.default_value_definition(), Some("array(1,2)"));
    assert!(matches!(
        parameter.default_value(),
        Err(ReflectionError::ValueNotEvaluable { .. })
    ));
}

#[test]
fn promoted_constructor_parameter_is_flagged() {
    let registry = reflect(
        "<?php class Point { public function __construct(private int $x = 0, $y = 1) {} }",
    );
    let constructor = registry
        .class("Point")
        .unwrap()
        .method("__construct")
        .unwrap();
    assert!(constructor.parameter(0).unwrap().is_promoted());
    assert!(!constructor.parameter(1).unwrap().is_promoted());
}

#[test]
fn nullable_hint_is_recorded_on_the_type() {
    let registry = reflect("<?php function f(?Exception $e) {}");
    let parameter = registry.function("f").unwrap().parameter(0).unwrap();
    let hint = parameter.type_hint().unwrap();
    assert!(hint.nullable);
    assert!(matches!(&hint.kind, HintKind::Named { raw, .. } if raw == "Exception"));
}

#[test]
fn malformed_declaration_drops_only_itself() {
    let (registry, report) = reflect_lossy(
        "<?php
        function broken(int) {}
        function intact($fine = 2) {}
        ",
    );
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].message, "missing parameter name");
    assert!(registry.function("broken").is_none());

    let intact = registry.function("intact").unwrap();
    assert_eq!(
        intact.parameter(0).unwrap().default_value().unwrap(),
        &Value::Int(2)
    );
}
