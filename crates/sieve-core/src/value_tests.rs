use std::cmp::Ordering;
use std::sync::Arc;

use crate::{CoreError, DynamicList, Value, escape_string, format_float, is_bare_name};

#[test]
fn sexpr_scalars() {
    insta::assert_snapshot!(Value::number(5).sexpr(), @"5");
    insta::assert_snapshot!(Value::number(-12).sexpr(), @"-12");
    insta::assert_snapshot!(Value::float(3.14).sexpr(), @"3.14");
    insta::assert_snapshot!(Value::float(-2.0).sexpr(), @"-2.0");
    insta::assert_snapshot!(Value::string("abc").sexpr(), @"'abc'");
    insta::assert_snapshot!(Value::string("").sexpr(), @"''");
}

#[test]
fn sexpr_escaping() {
    insta::assert_snapshot!(Value::string("it's").sexpr(), @r"'it\'s'");
    insta::assert_snapshot!(Value::string("a\\b").sexpr(), @r"'a\\b'");
}

#[test]
fn sexpr_named() {
    insta::assert_snapshot!(Value::number(5).named("x").sexpr(), @"x:5");
    insta::assert_snapshot!(Value::string("v").named("two words").sexpr(), @"'two words':'v'");
}

#[test]
fn sexpr_list() {
    let v = Value::list(vec![Value::number(1), Value::number(2), Value::number(3)]);
    insta::assert_snapshot!(v.sexpr(), @"[1 2 3]");
    insta::assert_snapshot!(Value::list(vec![]).sexpr(), @"[]");
}

#[test]
fn truthiness() {
    assert!(Value::number(0).is_truthy());
    assert!(Value::string("").is_truthy());
    assert!(Value::list(vec![Value::number(1)]).is_truthy());
    assert!(!Value::list(vec![]).is_truthy());
}

#[test]
fn equality_same_type() {
    assert!(Value::number(5).eq_value(&Value::number(5)));
    assert!(!Value::number(5).eq_value(&Value::number(6)));
    assert!(Value::string("a").eq_value(&Value::string("a")));
    assert!(Value::float(1.5).eq_value(&Value::float(1.5)));
}

#[test]
fn equality_cross_type_is_false() {
    assert!(!Value::number(5).eq_value(&Value::float(5.0)));
    assert!(!Value::number(5).eq_value(&Value::string("5")));
    // Lists never compare equal, even to themselves.
    let l = Value::list(vec![Value::number(1)]);
    assert!(!l.eq_value(&l));
}

#[test]
fn equality_ignores_names() {
    assert!(Value::number(5).named("x").eq_value(&Value::number(5)));
}

#[test]
fn ordering_numeric() {
    assert_eq!(
        Value::number(1).try_cmp(&Value::number(2)).unwrap(),
        Ordering::Less
    );
    assert_eq!(
        Value::float(2.5).try_cmp(&Value::number(2)).unwrap(),
        Ordering::Greater
    );
    assert_eq!(
        Value::number(2).try_cmp(&Value::float(2.0)).unwrap(),
        Ordering::Equal
    );
}

#[test]
fn ordering_non_numeric_is_error() {
    let err = Value::string("a").try_cmp(&Value::string("b")).unwrap_err();
    assert!(matches!(err, CoreError::Inval(_)));

    let err = Value::number(1)
        .try_cmp(&Value::list(vec![]))
        .unwrap_err();
    assert!(matches!(err, CoreError::Inval(_)));
}

#[test]
fn structural_equality_includes_names() {
    assert_eq!(Value::number(5).named("x"), Value::number(5).named("x"));
    assert_ne!(Value::number(5).named("x"), Value::number(5));
    assert_eq!(
        Value::list(vec![Value::number(1)]),
        Value::list(vec![Value::number(1)])
    );
}

#[test]
fn bare_names() {
    assert!(is_bare_name("foo"));
    assert!(is_bare_name("_x9.y-z"));
    assert!(!is_bare_name(""));
    assert!(!is_bare_name("9lives"));
    assert!(!is_bare_name("two words"));
}

#[test]
fn float_formatting_round_trips_through_grammar() {
    // Grammar floats always carry a decimal point.
    assert_eq!(format_float(1.0), "1.0");
    assert_eq!(format_float(-0.5), "-0.5");
    assert_eq!(format_float(3.14), "3.14");
}

#[test]
fn escape_string_quotes() {
    assert_eq!(escape_string(b"abc"), "'abc'");
    assert_eq!(escape_string(b"a'b"), r"'a\'b'");
}

struct Projection {
    rows: Vec<(&'static str, i64)>,
}

impl DynamicList for Projection {
    fn subkey(&self, key: &str) -> Vec<Value> {
        self.rows
            .iter()
            .filter(|(name, _)| *name == key)
            .map(|(name, n)| Value::number(*n).named(name))
            .collect()
    }

    fn values(&self) -> Vec<Value> {
        self.rows
            .iter()
            .map(|(name, n)| Value::number(*n).named(name))
            .collect()
    }
}

#[test]
fn dynamic_lists_project_on_demand() {
    let dynamic = Arc::new(Projection {
        rows: vec![("a", 1), ("b", 2), ("a", 3)],
    });
    let value = Value::dynamic(dynamic.clone());

    assert_eq!(value.type_name(), "list");
    assert!(value.is_truthy());
    assert_eq!(value.as_list().unwrap().len(), 3);
    assert_eq!(dynamic.subkey("a").len(), 2);
    assert!(dynamic.subkey("missing").is_empty());
    insta::assert_snapshot!(value.sexpr(), @"[a:1 b:2 a:3]");

    let empty = Value::dynamic(Arc::new(Projection { rows: vec![] }));
    assert!(!empty.is_truthy());
}
