//! String functions.
//!
//! Argument order puts the subject string last so that every function works
//! as a filter: `[[ name | trim_prefix("x") ]]`.

use minijinja::value::Value;

use crate::FuncMap;
use crate::args;
use crate::value::printable;

impl FuncMap {
    /// String functions: case conversion, trimming, searching, replacing
    /// and splitting.
    #[must_use]
    pub fn strings() -> Self {
        let mut map = Self::new();
        map.put("upper", true, |a| {
            let a = args::exact("upper", a, 1)?;
            Ok(Value::from(args::string("upper", &a[0])?.to_uppercase()))
        });
        map.put("lower", true, |a| {
            let a = args::exact("lower", a, 1)?;
            Ok(Value::from(args::string("lower", &a[0])?.to_lowercase()))
        });
        map.put("string", true, |a| {
            let a = args::exact("string", a, 1)?;
            Ok(Value::from(printable(&a[0])))
        });
        map.put("trim", true, |a| {
            let (cutset, s) = two_strings("trim", a)?;
            Ok(Value::from(s.trim_matches(|c: char| cutset.contains(c))))
        });
        map.put("trim_left", true, |a| {
            let (cutset, s) = two_strings("trim_left", a)?;
            Ok(Value::from(s.trim_start_matches(|c: char| cutset.contains(c))))
        });
        map.put("trim_right", true, |a| {
            let (cutset, s) = two_strings("trim_right", a)?;
            Ok(Value::from(s.trim_end_matches(|c: char| cutset.contains(c))))
        });
        map.put("trim_prefix", true, |a| {
            let (prefix, s) = two_strings("trim_prefix", a)?;
            Ok(Value::from(s.strip_prefix(prefix).unwrap_or(s)))
        });
        map.put("trim_suffix", true, |a| {
            let (suffix, s) = two_strings("trim_suffix", a)?;
            Ok(Value::from(s.strip_suffix(suffix).unwrap_or(s)))
        });
        map.put("title", true, |a| {
            let a = args::exact("title", a, 1)?;
            Ok(Value::from(title(args::string("title", &a[0])?)))
        });
        map.put("fields", true, |a| {
            let a = args::exact("fields", a, 1)?;
            let s = args::string("fields", &a[0])?;
            Ok(Value::from(
                s.split_whitespace().map(str::to_owned).collect::<Vec<_>>(),
            ))
        });
        map.put("wc", true, |a| {
            let a = args::exact("wc", a, 1)?;
            let s = args::string("wc", &a[0])?;
            Ok(Value::from(s.split_whitespace().count()))
        });
        map.put("has_prefix", true, |a| {
            let (prefix, s) = two_strings("has_prefix", a)?;
            Ok(Value::from(s.starts_with(prefix)))
        });
        map.put("has_suffix", true, |a| {
            let (suffix, s) = two_strings("has_suffix", a)?;
            Ok(Value::from(s.ends_with(suffix)))
        });
        map.put("replace", true, |a| {
            let a = args::exact("replace", a, 4)?;
            let old = args::string("replace", &a[0])?;
            let new = args::string("replace", &a[1])?;
            let n = args::int("replace", &a[2])?;
            let s = args::string("replace", &a[3])?;
            Ok(Value::from(match usize::try_from(n) {
                Ok(n) => s.replacen(old, new, n),
                Err(_) => s.replace(old, new),
            }))
        });
        map.put("replace_all", true, |a| {
            let a = args::exact("replace_all", a, 3)?;
            let old = args::string("replace_all", &a[0])?;
            let new = args::string("replace_all", &a[1])?;
            let s = args::string("replace_all", &a[2])?;
            Ok(Value::from(s.replace(old, new)))
        });
        map.put("count", true, |a| {
            let (sub, s) = two_strings("count", a)?;
            Ok(Value::from(count(sub, s)))
        });
        map.put("split", true, |a| {
            let (sep, s) = two_strings("split", a)?;
            Ok(Value::from(split_n(s, sep, -1)))
        });
        map.put("split_n", true, |a| {
            let a = args::exact("split_n", a, 3)?;
            let sep = args::string("split_n", &a[0])?;
            let n = args::int("split_n", &a[1])?;
            let s = args::string("split_n", &a[2])?;
            Ok(Value::from(split_n(s, sep, n)))
        });
        map
    }
}

fn two_strings<'a>(name: &str, a: &'a [Value]) -> Result<(&'a str, &'a str), minijinja::Error> {
    let a = args::exact(name, a, 2)?;
    Ok((args::string(name, &a[0])?, args::string(name, &a[1])?))
}

/// Uppercase the first letter of every word.
fn title(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if at_word_start {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        at_word_start = !(c.is_alphanumeric() || c == '_');
    }
    out
}

/// Non-overlapping occurrences of `sub`; an empty `sub` counts the gaps
/// between characters.
fn count(sub: &str, s: &str) -> usize {
    if sub.is_empty() {
        s.chars().count() + 1
    } else {
        s.matches(sub).count()
    }
}

/// Split into at most `n` parts; `n == 0` yields nothing and a negative `n`
/// means no limit. An empty separator splits between characters.
fn split_n(s: &str, sep: &str, n: i64) -> Vec<String> {
    if n == 0 {
        return Vec::new();
    }
    let limit = usize::try_from(n).ok();

    if sep.is_empty() {
        let chars: Vec<char> = s.chars().collect();
        return match limit {
            Some(limit) if limit < chars.len() => {
                let mut parts: Vec<String> =
                    chars[..limit - 1].iter().map(ToString::to_string).collect();
                parts.push(chars[limit - 1..].iter().collect());
                parts
            }
            _ => chars.iter().map(ToString::to_string).collect(),
        };
    }

    match limit {
        Some(limit) => s.splitn(limit, sep).map(str::to_owned).collect(),
        None => s.split(sep).map(str::to_owned).collect(),
    }
}
