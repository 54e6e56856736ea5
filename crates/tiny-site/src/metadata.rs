//! Page and site metadata.
//!
//! Metadata is an open map so site files can carry arbitrary keys; the
//! accessors cover the keys the built-in templates use.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key/value metadata exposed to templates as `metadata`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetaData(Map<String, Value>);

macro_rules! string_field {
    ($get:ident, $set:ident, $key:literal) => {
        #[doc = concat!("Value of `", $key, "`.")]
        #[must_use]
        pub fn $get(&self) -> String {
            self.get_str($key)
        }

        #[doc = concat!("Set `", $key, "`.")]
        pub fn $set(&mut self, value: impl Into<String>) {
            self.0.insert($key.to_owned(), Value::String(value.into()));
        }
    };
}

impl MetaData {
    /// Empty metadata.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Metadata every site starts from.
    #[must_use]
    pub fn site_defaults() -> Self {
        let mut meta = Self::new();
        meta.set_lang("en");
        meta.set_author("tiny");
        meta.set_description("Tiny");
        meta.set_domain("localhost");
        meta.set_key_words(["tiny"]);
        meta.set_title("Tiny");
        meta.set_page_type("WebSite");
        meta.set_site_name("Tiny");
        meta.set_version("v0.0.1");
        meta.set_image("");
        meta.set_base_url("");
        meta.set_canonical_url("");
        meta
    }

    /// Raw value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Set `key` to any JSON value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Text form of `key`; empty when missing.
    #[must_use]
    pub fn get_str(&self, key: &str) -> String {
        match self.0.get(key) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }

    string_field!(version, set_version, "version");
    string_field!(lang, set_lang, "lang");
    string_field!(site_name, set_site_name, "site_name");
    string_field!(title, set_title, "title");
    string_field!(domain, set_domain, "domain");
    string_field!(base_url, set_base_url, "base_url");
    string_field!(canonical_url, set_canonical_url, "canonical_url");
    string_field!(author, set_author, "author");
    string_field!(page_type, set_page_type, "type");
    string_field!(image, set_image, "image");
    string_field!(description, set_description, "description");

    /// Keywords; a scalar value is treated as a single keyword.
    #[must_use]
    pub fn key_words(&self) -> Vec<String> {
        match self.0.get("key_words") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect(),
            Some(_) => vec![self.get_str("key_words")],
        }
    }

    pub fn set_key_words<I, S>(&mut self, words: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let words = words
            .into_iter()
            .map(|w| Value::String(w.into()))
            .collect();
        self.0.insert("key_words".to_owned(), Value::Array(words));
    }

    /// Copy entries from `defaults` whose keys are not set here.
    pub fn merge_defaults(&mut self, defaults: &MetaData) {
        for (key, value) in &defaults.0 {
            if !self.0.contains_key(key) {
                self.0.insert(key.clone(), value.clone());
            }
        }
    }

    /// Whether `key` is set.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }
}

impl From<Map<String, Value>> for MetaData {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_get_str_renders_any_value() {
        let mut meta = MetaData::new();
        meta.insert("n", 3);
        meta.insert("flag", true);
        meta.set_title("Home");
        assert_eq!(meta.get_str("n"), "3");
        assert_eq!(meta.get_str("flag"), "true");
        assert_eq!(meta.title(), "Home");
        assert_eq!(meta.get_str("missing"), "");
    }

    #[test]
    fn test_key_words_variants() {
        let mut meta = MetaData::new();
        assert!(meta.key_words().is_empty());

        meta.set_key_words(["a", "b"]);
        assert_eq!(meta.key_words(), vec!["a", "b"]);

        meta.insert("key_words", json!([1, "x"]));
        assert_eq!(meta.key_words(), vec!["1", "x"]);

        meta.insert("key_words", "solo");
        assert_eq!(meta.key_words(), vec!["solo"]);
    }

    #[test]
    fn test_merge_defaults_keeps_own_values() {
        let mut meta = MetaData::new();
        meta.set_title("Mine");
        meta.merge_defaults(&MetaData::site_defaults());
        assert_eq!(meta.title(), "Mine");
        assert_eq!(meta.lang(), "en");
        assert_eq!(meta.page_type(), "WebSite");
        assert_eq!(meta.key_words(), vec!["tiny"]);
    }

    #[test]
    fn test_deserialize_from_yaml() {
        let meta: MetaData = serde_yaml::from_str("title: Blog\nkey_words: [rust, web]\n").unwrap();
        assert_eq!(meta.title(), "Blog");
        assert_eq!(meta.key_words(), vec!["rust", "web"]);
    }
}
