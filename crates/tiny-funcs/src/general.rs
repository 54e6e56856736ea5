//! General purpose functions.

use std::collections::BTreeMap;

use minijinja::value::{Value, ValueKind};

use crate::FuncMap;
use crate::args;
use crate::value::{basic_eq, elements, is_nil, printable};

impl FuncMap {
    /// General functions: `is_empty`, `default`, `ternary`, `coalesce`, `env`,
    /// `has`, `has_any`, `file_size`, `uuid`, `repeat`, `join`, `eq_any`,
    /// `deep_eq`, `map` and `safe_html`.
    #[must_use]
    pub fn general() -> Self {
        let mut map = Self::new();
        map.put("is_empty", true, |a| {
            let a = args::exact("is_empty", a, 1)?;
            Ok(Value::from(!a[0].is_true()))
        });
        map.put("default", true, |a| {
            let a = args::exact("default", a, 2)?;
            Ok(if a[1].is_true() { a[1].clone() } else { a[0].clone() })
        });
        map.put("ternary", true, |a| {
            let a = args::exact("ternary", a, 3)?;
            Ok(if a[0].is_true() { a[1].clone() } else { a[2].clone() })
        });
        map.put("coalesce", true, |a| {
            Ok(a.iter()
                .find(|v| v.is_true())
                .cloned()
                .unwrap_or_else(|| Value::from(())))
        });
        map.put("env", true, |a| {
            let a = args::exact("env", a, 1)?;
            let name = args::string("env", &a[0])?;
            Ok(Value::from(std::env::var(name).unwrap_or_default()))
        });
        map.put("has", true, |a| {
            let a = args::at_least("has", a, 1)?;
            Ok(Value::from(a[1..].iter().all(|v| contains(&a[0], v))))
        });
        map.put("has_any", true, |a| {
            let a = args::at_least("has_any", a, 1)?;
            Ok(Value::from(a[1..].iter().any(|v| contains(&a[0], v))))
        });
        map.put("file_size", true, |a| {
            let a = args::exact("file_size", a, 1)?;
            Ok(Value::from(file_size(&a[0])))
        });
        map.put("uuid", true, |a| {
            args::exact("uuid", a, 0)?;
            Ok(Value::from(uuid::Uuid::new_v4().to_string()))
        });
        map.put("repeat", true, |a| {
            let a = args::exact("repeat", a, 2)?;
            let count = args::int("repeat", &a[0])?;
            let text = printable(&a[1]);
            Ok(Value::from(text.repeat(usize::try_from(count).unwrap_or(0))))
        });
        map.put("join", true, |a| {
            let a = args::at_least("join", a, 1)?;
            let sep = printable(&a[0]);
            Ok(Value::from(join(&sep, &a[1..])))
        });
        map.put("eq_any", true, |a| {
            let a = args::at_least("eq_any", a, 1)?;
            Ok(Value::from(a[1..].iter().any(|v| basic_eq(&a[0], v))))
        });
        map.put("deep_eq", true, |a| {
            let a = args::exact("deep_eq", a, 2)?;
            Ok(Value::from(a[0] == a[1]))
        });
        map.put("map", false, |a| Ok(pairs_to_map(a)));
        map.put("safe_html", true, |a| {
            let a = args::exact("safe_html", a, 1)?;
            Ok(Value::from_safe_string(printable(&a[0])))
        });
        map
    }
}

/// Whether `value` is contained in `collection`.
///
/// Strings check for a substring, sequences for an element and maps for a
/// value. Nil values match nil elements.
fn contains(collection: &Value, value: &Value) -> bool {
    match collection.kind() {
        ValueKind::String => collection
            .as_str()
            .is_some_and(|s| s.contains(printable(value).as_str())),
        ValueKind::Seq | ValueKind::Iterable | ValueKind::Map => elements(collection)
            .iter()
            .any(|item| basic_eq(value, item)),
        _ => false,
    }
}

/// Join the text form of values.
///
/// Strings are joined whole, sequences element by element and maps value by
/// value. A nil value short-circuits to an empty result.
fn join(sep: &str, values: &[Value]) -> String {
    let mut parts = Vec::new();
    for value in values {
        match value.kind() {
            _ if is_nil(value) => return String::new(),
            ValueKind::Seq | ValueKind::Iterable | ValueKind::Map => {
                parts.extend(elements(value).iter().map(printable));
            }
            _ => parts.push(printable(value)),
        }
    }
    parts.join(sep)
}

/// Human readable file size, e.g. `1.5 KB`; empty for non-numbers.
#[allow(clippy::cast_precision_loss)]
fn file_size(value: &Value) -> String {
    const KB: f64 = (1u64 << 10) as f64;
    const MB: f64 = (1u64 << 20) as f64;
    const GB: f64 = (1u64 << 30) as f64;
    const TB: f64 = (1u64 << 40) as f64;
    const PB: f64 = (1u64 << 50) as f64;

    if value.kind() != ValueKind::Number {
        return String::new();
    }
    let Ok(size) = f64::try_from(value.clone()) else {
        return String::new();
    };

    let (scaled, suffix) = if size < KB {
        (size, "bytes")
    } else if size < MB {
        (size / KB, "KB")
    } else if size < GB {
        (size / MB, "MB")
    } else if size < TB {
        (size / GB, "GB")
    } else if size < PB {
        (size / TB, "TB")
    } else {
        (size / PB, "PB")
    };
    format!("{scaled:.1} {suffix}").replace(".0", "")
}

/// Build a map from alternating keys and values.
fn pairs_to_map(values: &[Value]) -> Value {
    let map: BTreeMap<String, Value> = values
        .chunks(2)
        .map(|pair| {
            let key = printable(&pair[0]);
            let value = pair.get(1).cloned().unwrap_or_else(|| Value::from(""));
            (key, value)
        })
        .collect();
    Value::from(map)
}
