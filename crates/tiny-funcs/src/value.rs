//! Value inspection shared by the function groups.

use minijinja::value::{Value, ValueKind};

/// Comparable classes of template values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BasicKind {
    Nil,
    Bool,
    Int,
    Float,
    String,
    Other,
}

fn basic_kind(value: &Value) -> BasicKind {
    match value.kind() {
        ValueKind::Undefined | ValueKind::None => BasicKind::Nil,
        ValueKind::Bool => BasicKind::Bool,
        ValueKind::Number if value.is_integer() => BasicKind::Int,
        ValueKind::Number => BasicKind::Float,
        ValueKind::String => BasicKind::String,
        _ => BasicKind::Other,
    }
}

/// Equality between basic values.
///
/// Values only compare within their kind: an integer never equals a float
/// and a string never equals a number. Collections never compare equal.
pub(crate) fn basic_eq(a: &Value, b: &Value) -> bool {
    match (basic_kind(a), basic_kind(b)) {
        (BasicKind::Nil, BasicKind::Nil) => true,
        (BasicKind::Bool, BasicKind::Bool) => a.is_true() == b.is_true(),
        (BasicKind::Int, BasicKind::Int) => a == b,
        (BasicKind::Float, BasicKind::Float) => {
            match (f64::try_from(a.clone()), f64::try_from(b.clone())) {
                (Ok(x), Ok(y)) => x == y,
                _ => false,
            }
        }
        (BasicKind::String, BasicKind::String) => a.as_str() == b.as_str(),
        _ => false,
    }
}

/// Text form of a value; undefined and none print as nothing.
pub(crate) fn printable(value: &Value) -> String {
    if value.is_undefined() || value.is_none() {
        String::new()
    } else {
        value.to_string()
    }
}

/// Whether a value is nil (undefined or none).
pub(crate) fn is_nil(value: &Value) -> bool {
    basic_kind(value) == BasicKind::Nil
}

/// Iterate over the values held by a sequence or map.
///
/// Maps yield their values, not their keys. Other kinds yield nothing.
pub(crate) fn elements(value: &Value) -> Vec<Value> {
    match value.kind() {
        ValueKind::Seq | ValueKind::Iterable => value
            .try_iter()
            .map(Iterator::collect)
            .unwrap_or_default(),
        ValueKind::Map => value
            .try_iter()
            .map(|keys| {
                keys.filter_map(|key| value.get_item(&key).ok())
                    .collect()
            })
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_basic_eq_same_kinds() {
        assert!(basic_eq(&Value::from(1), &Value::from(1)));
        assert!(basic_eq(&Value::from("a"), &Value::from("a")));
        assert!(basic_eq(&Value::from(true), &Value::from(true)));
        assert!(basic_eq(&Value::from(1.5), &Value::from(1.5)));
        assert!(!basic_eq(&Value::from(1), &Value::from(2)));
    }

    #[test]
    fn test_basic_eq_mixed_kinds() {
        assert!(!basic_eq(&Value::from(1), &Value::from(1.0)));
        assert!(!basic_eq(&Value::from(1), &Value::from("1")));
        assert!(!basic_eq(&Value::from(vec![1]), &Value::from(vec![1])));
    }

    #[test]
    fn test_basic_eq_nil() {
        assert!(basic_eq(&Value::UNDEFINED, &Value::from(())));
        assert!(!basic_eq(&Value::from(()), &Value::from(0)));
    }

    #[test]
    fn test_printable() {
        assert_eq!(printable(&Value::UNDEFINED), "");
        assert_eq!(printable(&Value::from(())), "");
        assert_eq!(printable(&Value::from("x")), "x");
        assert_eq!(printable(&Value::from(42)), "42");
    }

    #[test]
    fn test_elements_of_map_are_values() {
        let mut map = BTreeMap::new();
        map.insert("a".to_owned(), Value::from(1));
        map.insert("b".to_owned(), Value::from(2));
        let values = elements(&Value::from(map));
        assert_eq!(values, vec![Value::from(1), Value::from(2)]);
    }
}
