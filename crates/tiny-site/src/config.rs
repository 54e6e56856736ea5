//! Site file model.
//!
//! The site file is YAML. Every section is optional; missing keys fall back
//! to the defaults below. Relative paths are resolved against the directory
//! holding the site file, and the string fields `static`, `static_prefix`,
//! `login`, `static_site.request.host` and `static_site.output.root_dir`
//! support `${VAR}` and `${VAR:-default}` expansion.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::SiteError;
use crate::expand::expand_env;
use crate::metadata::MetaData;

/// Default left template delimiter.
pub const DEFAULT_DELIM_LEFT: &str = "[[";
/// Default right template delimiter.
pub const DEFAULT_DELIM_RIGHT: &str = "]]";
/// Cache lifetime used when `cache_max_age` is zero: 30 days.
pub const DEFAULT_CACHE_MAX_AGE: u64 = 30 * 24 * 60 * 60;

/// Prefix marking page data that should be loaded from a JSON file.
pub(crate) const JSON_PREFIX: &str = "json://";

/// Parsed site file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// `Cache-Control` max age for static files, in seconds.
    pub cache_max_age: u64,
    /// Site-wide metadata; pages inherit keys they do not set.
    pub metadata: MetaData,
    /// Re-read templates and JSON data on every request.
    pub reload: bool,
    /// Directory served under `static_prefix`.
    #[serde(rename = "static")]
    pub static_dir: Option<PathBuf>,
    /// URL prefix for static files.
    pub static_prefix: String,
    /// Login path used to redirect anonymous users away from auth pages.
    pub login: String,
    /// Layout name to template files.
    pub layouts: BTreeMap<String, Vec<PathBuf>>,
    /// Page name to page definition.
    pub pages: BTreeMap<String, Page>,
    /// Error page name to the status codes it handles.
    pub errors: BTreeMap<String, Vec<u16>>,
    /// Treat an invalid site file as an error instead of a warning.
    pub validate: bool,
    pub delim_left: String,
    pub delim_right: String,
    /// Static site generation settings.
    pub static_site: StaticSiteConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            cache_max_age: 0,
            metadata: MetaData::new(),
            reload: false,
            static_dir: None,
            static_prefix: "/static/".to_owned(),
            login: "/login".to_owned(),
            layouts: BTreeMap::new(),
            pages: BTreeMap::new(),
            errors: BTreeMap::new(),
            validate: true,
            delim_left: DEFAULT_DELIM_LEFT.to_owned(),
            delim_right: DEFAULT_DELIM_RIGHT.to_owned(),
            static_site: StaticSiteConfig::default(),
        }
    }
}

/// A page bound to a URL path.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Page {
    /// URL path, may contain `{param}` segments.
    pub path: String,
    /// Layout name from `layouts`.
    pub layout: String,
    /// Page-specific template files, added after the layout files.
    pub components: Vec<PathBuf>,
    pub metadata: MetaData,
    /// Require an authenticated user.
    pub auth: bool,
    pub delim_left: String,
    pub delim_right: String,
    /// Inline data, or `json://<file>` to load it from a JSON file.
    pub data: Option<serde_json::Value>,

    /// Built-in page compiled from embedded templates.
    #[serde(skip)]
    pub(crate) embedded: bool,
}

impl Page {
    /// Whether this page is one of the built-in defaults.
    #[must_use]
    pub fn is_embedded(&self) -> bool {
        self.embedded
    }

    /// Data file path when `data` is a `json://` reference.
    pub(crate) fn json_data_file(&self) -> Option<&str> {
        self.data
            .as_ref()
            .and_then(serde_json::Value::as_str)
            .and_then(|s| s.strip_prefix(JSON_PREFIX))
    }
}

/// Static site generation settings (`static_site`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StaticSiteConfig {
    pub enable: bool,
    pub output: StaticOutput,
    /// Files and directories copied into `output.static_dir`.
    #[serde(rename = "static")]
    pub static_files: Vec<PathBuf>,
    /// Regular expressions; only matching paths are written.
    pub allowed_pages: Vec<String>,
    pub request: StaticRequest,
}

/// Output locations for generated files.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StaticOutput {
    /// Directory receiving generated pages. Cleaned before generation.
    pub root_dir: PathBuf,
    /// Directory receiving static files; defaults to `root_dir`.
    pub static_dir: PathBuf,
    /// Entry names in `root_dir` that survive cleaning.
    pub keep: Vec<String>,
}

/// How pages are requested during generation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StaticRequest {
    /// Base URL of a running server; empty renders in process.
    pub host: String,
    /// URL paths to generate.
    pub paths: Vec<String>,
}

impl SiteConfig {
    /// Parse a site file. An empty document yields the defaults.
    pub fn from_yaml(content: &str) -> Result<Self, SiteError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Effective `Cache-Control` max age in seconds.
    #[must_use]
    pub fn cache_max_age(&self) -> u64 {
        if self.cache_max_age == 0 {
            DEFAULT_CACHE_MAX_AGE
        } else {
            self.cache_max_age
        }
    }

    /// Expand environment variables, resolve relative paths and fill defaults.
    pub(crate) fn prepare(&mut self, base_dir: &Path) -> Result<(), SiteError> {
        self.expand_env_vars()?;
        self.resolve_paths(base_dir);

        let mut metadata = std::mem::take(&mut self.metadata);
        metadata.merge_defaults(&MetaData::site_defaults());
        self.metadata = metadata;

        // Defaults only cover codes no configured page claims.
        for (page, code) in [(crate::PAGE_NOT_FOUND, 404), (crate::PAGE_ERROR, 500)] {
            if !self.errors.values().any(|codes| codes.contains(&code)) {
                self.errors.entry(page.to_owned()).or_insert_with(|| vec![code]);
            }
        }
        if self.delim_left.is_empty() || self.delim_right.is_empty() {
            DEFAULT_DELIM_LEFT.clone_into(&mut self.delim_left);
            DEFAULT_DELIM_RIGHT.clone_into(&mut self.delim_right);
        }
        Ok(())
    }

    fn expand_env_vars(&mut self) -> Result<(), SiteError> {
        if let Some(dir) = &self.static_dir {
            let expanded = expand_env(&dir.to_string_lossy(), "static")?;
            self.static_dir = (!expanded.is_empty()).then(|| PathBuf::from(expanded));
        }
        self.static_prefix = expand_env(&self.static_prefix, "static_prefix")?;
        self.login = expand_env(&self.login, "login")?;

        let request = &mut self.static_site.request;
        request.host = expand_env(&request.host, "static_site.request.host")?;
        let output = &mut self.static_site.output;
        output.root_dir = PathBuf::from(expand_env(
            &output.root_dir.to_string_lossy(),
            "static_site.output.root_dir",
        )?);
        Ok(())
    }

    fn resolve_paths(&mut self, base_dir: &Path) {
        let resolve = |path: &mut PathBuf| {
            if path.is_relative() && !path.as_os_str().is_empty() {
                *path = base_dir.join(&*path);
            }
        };

        if let Some(dir) = &mut self.static_dir {
            resolve(dir);
        }
        for files in self.layouts.values_mut() {
            files.iter_mut().for_each(resolve);
        }
        for page in self.pages.values_mut() {
            page.components.iter_mut().for_each(resolve);
        }

        let static_site = &mut self.static_site;
        static_site.static_files.iter_mut().for_each(resolve);
        resolve(&mut static_site.output.root_dir);
        if static_site.output.static_dir.as_os_str().is_empty() {
            static_site.output.static_dir = static_site.output.root_dir.clone();
        } else {
            resolve(&mut static_site.output.static_dir);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SITE: &str = r#"
cache_max_age: 60
static: public
static_prefix: /assets/
metadata:
  title: Blog
layouts:
  main: [layouts/main.html, layouts/nav.html]
pages:
  home:
    path: /
    layout: main
    components: [pages/home.html]
    data: json://data/home.json
  about:
    path: /about
    layout: main
    data:
      team: [ann, bob]
errors:
  oops: [500, 502]
static_site:
  enable: true
  output:
    root_dir: dist
  static: [public]
  allowed_pages: ['^/$']
  request:
    paths: [/, /about]
"#;

    #[test]
    fn test_from_yaml_empty_uses_defaults() {
        let config = SiteConfig::from_yaml("").unwrap();
        assert!(config.validate);
        assert_eq!(config.delim_left, "[[");
        assert_eq!(config.delim_right, "]]");
        assert_eq!(config.static_prefix, "/static/");
        assert_eq!(config.cache_max_age(), DEFAULT_CACHE_MAX_AGE);
    }

    #[test]
    fn test_from_yaml_parses_sections() {
        let config = SiteConfig::from_yaml(SITE).unwrap();
        assert_eq!(config.cache_max_age(), 60);
        assert_eq!(config.static_prefix, "/assets/");
        assert_eq!(config.layouts["main"].len(), 2);
        assert_eq!(config.pages["home"].path, "/");
        assert_eq!(config.pages["home"].json_data_file(), Some("data/home.json"));
        assert_eq!(config.pages["about"].json_data_file(), None);
        assert_eq!(config.errors["oops"], vec![500, 502]);
        assert!(config.static_site.enable);
    }

    #[test]
    fn test_prepare_resolves_relative_paths() {
        let mut config = SiteConfig::from_yaml(SITE).unwrap();
        config.prepare(Path::new("/srv/site")).unwrap();

        assert_eq!(config.static_dir, Some(PathBuf::from("/srv/site/public")));
        assert_eq!(
            config.layouts["main"][0],
            PathBuf::from("/srv/site/layouts/main.html")
        );
        assert_eq!(
            config.pages["home"].components[0],
            PathBuf::from("/srv/site/pages/home.html")
        );
        assert_eq!(
            config.static_site.output.root_dir,
            PathBuf::from("/srv/site/dist")
        );
        assert_eq!(
            config.static_site.output.static_dir,
            PathBuf::from("/srv/site/dist")
        );
        assert_eq!(
            config.static_site.static_files,
            vec![PathBuf::from("/srv/site/public")]
        );
    }

    #[test]
    fn test_prepare_fills_defaults() {
        let mut config = SiteConfig::from_yaml(SITE).unwrap();
        config.prepare(Path::new(".")).unwrap();

        assert_eq!(config.metadata.title(), "Blog");
        assert_eq!(config.metadata.lang(), "en");
        assert_eq!(config.errors["not_found"], vec![404]);
        assert_eq!(config.errors["oops"], vec![500, 502]);
        // 500 is already handled by `oops`
        assert!(!config.errors.contains_key("error"));
    }

    #[test]
    fn test_prepare_keeps_claimed_error_codes() {
        let mut config = SiteConfig::from_yaml("errors:\n  missing: [404]\n").unwrap();
        config.prepare(Path::new(".")).unwrap();

        assert_eq!(config.errors["missing"], vec![404]);
        assert_eq!(config.errors["error"], vec![500]);
        assert!(!config.errors.contains_key("not_found"));
    }

    #[test]
    fn test_prepare_keeps_absolute_paths() {
        let mut config = SiteConfig::from_yaml("static: /var/www\n").unwrap();
        config.prepare(Path::new("/srv/site")).unwrap();
        assert_eq!(config.static_dir, Some(PathBuf::from("/var/www")));
    }

    #[test]
    fn test_prepare_expands_env_vars() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::set_var("TINY_TEST_GEN_HOST", "http://localhost:9000");
        }
        let yaml = "static_prefix: ${TINY_TEST_UNSET_PREFIX:-/files/}\nstatic_site:\n  request:\n    host: ${TINY_TEST_GEN_HOST}\n";
        let mut config = SiteConfig::from_yaml(yaml).unwrap();
        config.prepare(Path::new(".")).unwrap();
        assert_eq!(config.static_prefix, "/files/");
        assert_eq!(config.static_site.request.host, "http://localhost:9000");
        unsafe {
            std::env::remove_var("TINY_TEST_GEN_HOST");
        }
    }

    #[test]
    fn test_empty_static_is_none() {
        let mut config = SiteConfig::from_yaml("static: ''\n").unwrap();
        config.prepare(Path::new("/srv")).unwrap();
        assert_eq!(config.static_dir, None);
    }

    #[test]
    fn test_invalid_yaml() {
        let err = SiteConfig::from_yaml("pages: [").unwrap_err();
        assert!(matches!(err, SiteError::Yaml(_)));
    }
}
