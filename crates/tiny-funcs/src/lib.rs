//! Template function library for tiny sites.
//!
//! Functions are collected in a [`FuncMap`] and installed into a minijinja
//! [`Environment`]. Every function is callable as `name(args...)`; most are
//! also installed as filters with pipeline semantics, where the piped value
//! becomes the **last** argument:
//!
//! ```text
//! [[ page.title | default("Untitled") ]]   ==  [[ default("Untitled", page.title) ]]
//! [[ name | trim_prefix("x") ]]            ==  [[ trim_prefix("x", name) ]]
//! ```
//!
//! # Groups
//!
//! - [`FuncMap::general`]: emptiness checks, defaults, membership, joins
//! - [`FuncMap::strings`]: case, trimming, splitting, replacing
//! - [`FuncMap::time`]: date formatting and durations

mod args;
mod general;
mod strings;
mod time;
mod value;

use std::collections::BTreeMap;
use std::sync::Arc;

use minijinja::value::{Rest, Value};
use minijinja::{Environment, Error};

/// A template function operating on positional arguments.
pub type Func = Arc<dyn Fn(&[Value]) -> Result<Value, Error> + Send + Sync>;

/// Error returned when adding functions to a [`FuncMap`].
#[derive(Debug, thiserror::Error)]
pub enum FuncError {
    /// The function name is not a valid identifier.
    #[error("{0:?} is not a valid function name")]
    InvalidName(String),
}

#[derive(Clone)]
struct Entry {
    func: Func,
    filter: bool,
}

/// Named collection of template functions.
#[derive(Clone, Default)]
pub struct FuncMap {
    entries: BTreeMap<String, Entry>,
}

impl FuncMap {
    /// Create an empty function map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All built-in functions: general, string and time groups.
    #[must_use]
    pub fn standard() -> Self {
        let mut map = Self::general();
        map.extend(Self::strings());
        map.extend(Self::time());
        map
    }

    /// Add a function that is callable both as a function and as a filter.
    ///
    /// Replaces any existing function with the same name.
    pub fn insert<F>(&mut self, name: &str, func: F) -> Result<(), FuncError>
    where
        F: Fn(&[Value]) -> Result<Value, Error> + Send + Sync + 'static,
    {
        validate_name(name)?;
        self.put(name, true, func);
        Ok(())
    }

    /// Add a function that is not installed as a filter.
    pub fn insert_function<F>(&mut self, name: &str, func: F) -> Result<(), FuncError>
    where
        F: Fn(&[Value]) -> Result<Value, Error> + Send + Sync + 'static,
    {
        validate_name(name)?;
        self.put(name, false, func);
        Ok(())
    }

    /// Merge another map into this one. Entries from `other` win.
    pub fn extend(&mut self, other: FuncMap) {
        self.entries.extend(other.entries);
    }

    /// Check whether a function is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered function names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of registered functions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map holds no functions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Install every function (and filter) into a template environment.
    pub fn register(&self, env: &mut Environment<'_>) {
        for (name, entry) in &self.entries {
            let func = Arc::clone(&entry.func);
            env.add_function(name.clone(), move |args: Rest<Value>| func(&args.0));

            if entry.filter {
                let func = Arc::clone(&entry.func);
                env.add_filter(name.clone(), move |value: Value, args: Rest<Value>| {
                    let mut args = args.0;
                    args.push(value);
                    func(&args)
                });
            }
        }
    }

    /// Insert a built-in function without name validation.
    fn put<F>(&mut self, name: &str, filter: bool, func: F)
    where
        F: Fn(&[Value]) -> Result<Value, Error> + Send + Sync + 'static,
    {
        debug_assert!(is_valid_name(name), "invalid built-in name {name}");
        self.entries.insert(
            name.to_owned(),
            Entry {
                func: Arc::new(func),
                filter,
            },
        );
    }
}

impl std::fmt::Debug for FuncMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.entries.keys()).finish()
    }
}

fn validate_name(name: &str) -> Result<(), FuncError> {
    if is_valid_name(name) {
        Ok(())
    } else {
        Err(FuncError::InvalidName(name.to_owned()))
    }
}

/// A name is valid when it is a non-empty identifier: a letter or `_`
/// followed by letters, digits or `_`.
fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first == '_' || first.is_alphabetic()) && chars.all(|c| c == '_' || c.is_alphanumeric())
}
