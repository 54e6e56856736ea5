//! Site loading and page rendering.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use http::StatusCode;
use serde_json::Value;
use tiny_funcs::FuncMap;

use crate::config::{Page, SiteConfig};
use crate::metadata::MetaData;
use crate::page::{
    AuthInfo, DataHandler, PageContent, PageData, PageRequest, RobotsTxt, SiteMap,
};
use crate::route::{RouteError, RoutePattern, static_mount_patterns};
use crate::templates::{CompiledPage, DEFAULT_PAGES, Delimiters, entry_name};
use crate::{PAGE_ERROR, PAGE_ROBOTS_TXT, PAGE_SITEMAP_XML, SiteError};

type DynamicPaths = Box<dyn Fn() -> Vec<String> + Send + Sync>;

/// Builder for [`Site`].
///
/// ```no_run
/// use tiny_site::SiteBuilder;
///
/// let site = SiteBuilder::from_file("index.yml")?.build()?;
/// # Ok::<(), tiny_site::SiteError>(())
/// ```
pub struct SiteBuilder {
    config: SiteConfig,
    base_dir: PathBuf,
    funcs: FuncMap,
    auth: Option<Arc<dyn AuthInfo>>,
}

impl SiteBuilder {
    /// Read a site file. Relative paths in it resolve against its directory.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SiteError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| SiteError::io(path, e))?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_yaml(&content, base_dir)
    }

    /// Parse a site file held in memory.
    pub fn from_yaml(content: &str, base_dir: impl Into<PathBuf>) -> Result<Self, SiteError> {
        Ok(Self::from_config(SiteConfig::from_yaml(content)?, base_dir))
    }

    #[must_use]
    pub fn from_config(config: SiteConfig, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            config,
            base_dir: base_dir.into(),
            funcs: FuncMap::standard(),
            auth: None,
        }
    }

    /// Add template functions on top of the standard library.
    #[must_use]
    pub fn functions(mut self, funcs: FuncMap) -> Self {
        self.funcs.extend(funcs);
        self
    }

    /// Set the provider deciding who is logged in.
    #[must_use]
    pub fn auth_info(mut self, auth: impl AuthInfo + 'static) -> Self {
        self.auth = Some(Arc::new(auth));
        self
    }

    /// Load the site.
    ///
    /// # Errors
    ///
    /// Returns an error if environment expansion fails, a built-in template
    /// fails to compile, a JSON data file cannot be loaded, or the site is
    /// invalid while `validate` is on.
    pub fn build(self) -> Result<Site, SiteError> {
        let Self {
            mut config,
            base_dir,
            funcs,
            auth,
        } = self;
        config.prepare(&base_dir)?;

        let mut site = Site {
            config,
            base_dir,
            funcs,
            auth,
            error_pages: HashMap::new(),
            handlers: RwLock::default(),
            templates: RwLock::default(),
            dynamic_paths: RwLock::default(),
        };
        site.add_default_pages()?;
        site.install_data_handlers()?;
        site.error_pages = site
            .config
            .errors
            .iter()
            .flat_map(|(page, codes)| codes.iter().map(move |code| (*code, page.clone())))
            .collect();

        if let Err(err) = site.validate() {
            if site.config.validate {
                return Err(err);
            }
            tracing::warn!(error = %err, "Invalid site configuration");
        }
        tracing::info!(pages = site.config.pages.len(), "Site loaded");
        Ok(site)
    }
}

/// Rendered page or error page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResponse {
    pub status: StatusCode,
    pub body: String,
    /// Page that produced the body; `None` for the plain-text fallback.
    pub page: Option<String>,
}

/// A loaded site: pages, their data handlers and compiled templates.
pub struct Site {
    config: SiteConfig,
    base_dir: PathBuf,
    funcs: FuncMap,
    auth: Option<Arc<dyn AuthInfo>>,
    error_pages: HashMap<u16, String>,
    handlers: RwLock<HashMap<String, Arc<dyn DataHandler>>>,
    templates: RwLock<HashMap<String, Arc<CompiledPage>>>,
    dynamic_paths: RwLock<Vec<DynamicPaths>>,
}

impl Site {
    #[must_use]
    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    /// Directory the site file was loaded from.
    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    #[must_use]
    pub fn pages(&self) -> &BTreeMap<String, Page> {
        &self.config.pages
    }

    #[must_use]
    pub fn page(&self, name: &str) -> Option<&Page> {
        self.config.pages.get(name)
    }

    /// Page rendered for errors with this status.
    #[must_use]
    pub fn error_page(&self, status: StatusCode) -> &str {
        self.error_pages
            .get(&status.as_u16())
            .map_or(PAGE_ERROR, String::as_str)
    }

    #[must_use]
    pub fn has_auth_info(&self) -> bool {
        self.auth.is_some()
    }

    /// Claims of the user behind `request`, if any.
    #[must_use]
    pub fn user(&self, request: &PageRequest) -> Option<Value> {
        self.auth.as_ref().and_then(|auth| auth.user(request))
    }

    /// Page metadata with site metadata filling the gaps.
    #[must_use]
    pub fn page_metadata(&self, name: &str) -> MetaData {
        match self.config.pages.get(name) {
            Some(page) => {
                let mut metadata = page.metadata.clone();
                metadata.merge_defaults(&self.config.metadata);
                metadata
            }
            None => self.config.metadata.clone(),
        }
    }

    /// Default template context for a page.
    #[must_use]
    pub fn page_data(&self, name: &str, request: &PageRequest, error: Option<&SiteError>) -> PageData {
        let user = self.user(request);
        PageData {
            metadata: self.page_metadata(name),
            authenticated: user.is_some(),
            user,
            error: error.map(Into::into),
            cookies: request.cookies.clone(),
            params: request.params.clone(),
            data: Value::Null,
        }
    }

    /// Attach a data handler to a page, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError::PageNotFound`] if the page does not exist.
    pub fn set_data_handler(&self, name: &str, handler: impl DataHandler + 'static) -> Result<(), SiteError> {
        self.set_shared_handler(name, Arc::new(handler))
    }

    /// Attach several data handlers; stops at the first unknown page.
    pub fn set_data_handlers<I, S>(&self, handlers: I) -> Result<(), SiteError>
    where
        I: IntoIterator<Item = (S, Arc<dyn DataHandler>)>,
        S: AsRef<str>,
    {
        for (name, handler) in handlers {
            self.set_shared_handler(name.as_ref(), handler)?;
        }
        Ok(())
    }

    /// Supply the data of a sitemap page.
    pub fn set_sitemap_handler<F>(&self, name: &str, handler: F) -> Result<(), SiteError>
    where
        F: Fn(&PageRequest) -> SiteMap + Send + Sync + 'static,
    {
        self.set_data_handler(name, move |request: &PageRequest| -> Result<PageContent, SiteError> {
            Ok(PageContent::Data(serde_json::to_value(handler(request))?))
        })
    }

    /// Supply the data of a robots.txt page.
    pub fn set_robots_handler<F>(&self, name: &str, handler: F) -> Result<(), SiteError>
    where
        F: Fn(&PageRequest) -> RobotsTxt + Send + Sync + 'static,
    {
        self.set_data_handler(name, move |request: &PageRequest| -> Result<PageContent, SiteError> {
            Ok(PageContent::Data(serde_json::to_value(handler(request))?))
        })
    }

    fn set_shared_handler(&self, name: &str, handler: Arc<dyn DataHandler>) -> Result<(), SiteError> {
        if !self.config.pages.contains_key(name) {
            return Err(SiteError::PageNotFound(name.to_owned()));
        }
        write(&self.handlers).insert(name.to_owned(), handler);
        Ok(())
    }

    /// Register a callback producing extra paths for static generation.
    pub fn add_dynamic_paths<F>(&self, paths: F)
    where
        F: Fn() -> Vec<String> + Send + Sync + 'static,
    {
        write(&self.dynamic_paths).push(Box::new(paths));
    }

    /// Configured generation paths followed by the dynamic ones.
    #[must_use]
    pub fn generation_paths(&self) -> Vec<String> {
        let mut paths = self.config.static_site.request.paths.clone();
        for dynamic in read(&self.dynamic_paths).iter() {
            paths.extend(dynamic());
        }
        paths
    }

    /// Produce the response for a page.
    ///
    /// Handler and render failures are turned into the matching error page.
    #[must_use]
    pub fn serve(&self, name: &str, request: &PageRequest) -> PageResponse {
        let mut data = self.page_data(name, request, None);
        let handler = read(&self.handlers).get(name).cloned();
        if let Some(handler) = handler {
            match handler.handle(request) {
                Ok(PageContent::Data(value)) => data.data = value,
                Ok(PageContent::Page(page)) => data = *page,
                Err(err) => return self.serve_error(request, &err),
            }
        }
        match self.render(name, &data) {
            Ok(body) => PageResponse {
                status: StatusCode::OK,
                body,
                page: Some(name.to_owned()),
            },
            Err(err) => {
                tracing::error!(page = name, error = %err, "Failed to render page");
                self.serve_error(request, &err)
            }
        }
    }

    /// Render the error page mapped to the error's status.
    #[must_use]
    pub fn serve_error(&self, request: &PageRequest, error: &SiteError) -> PageResponse {
        let status = error.status();
        let name = self.error_page(status);
        let data = self.page_data(name, request, Some(error));
        match self.render(name, &data) {
            Ok(body) => PageResponse {
                status,
                body,
                page: Some(name.to_owned()),
            },
            Err(err) => {
                tracing::error!(page = name, error = %err, "Failed to render error page");
                PageResponse {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    body: "Internal Server Error".to_owned(),
                    page: None,
                }
            }
        }
    }

    /// Render a page with the given context.
    pub fn render(&self, name: &str, data: &PageData) -> Result<String, SiteError> {
        self.compiled(name)?.render(data)
    }

    fn compiled(&self, name: &str) -> Result<Arc<CompiledPage>, SiteError> {
        let page = self
            .config
            .pages
            .get(name)
            .ok_or_else(|| SiteError::PageNotFound(name.to_owned()))?;
        if (page.embedded || !self.config.reload)
            && let Some(compiled) = read(&self.templates).get(name)
        {
            return Ok(Arc::clone(compiled));
        }

        let mut files = self
            .config
            .layouts
            .get(&page.layout)
            .cloned()
            .unwrap_or_default();
        files.extend(page.components.iter().cloned());
        let entry = match entry_name(&page.layout, &page.components) {
            Some(entry) if !files.is_empty() => entry,
            _ => return Err(SiteError::NoTemplates(name.to_owned())),
        };

        let delimiters = if page.delim_left.is_empty() || page.delim_right.is_empty() {
            Delimiters::new(&self.config.delim_left, &self.config.delim_right)
        } else {
            Delimiters::new(&page.delim_left, &page.delim_right)
        };
        let compiled = Arc::new(CompiledPage::from_files(
            entry,
            &files,
            &delimiters,
            &self.funcs,
        )?);
        tracing::debug!(page = name, files = files.len(), "Compiled page templates");
        write(&self.templates).insert(name.to_owned(), Arc::clone(&compiled));
        Ok(compiled)
    }

    fn add_default_pages(&mut self) -> Result<(), SiteError> {
        for default in &DEFAULT_PAGES {
            if self.config.pages.contains_key(default.name) {
                continue;
            }
            let compiled = CompiledPage::embedded(default.template, default.source, &self.funcs)?;
            write(&self.templates).insert(default.name.to_owned(), Arc::new(compiled));
            self.config.pages.insert(
                default.name.to_owned(),
                Page {
                    path: default.path.to_owned(),
                    embedded: true,
                    ..Page::default()
                },
            );

            let handler: Option<Arc<dyn DataHandler>> = match default.name {
                PAGE_SITEMAP_XML => Some(Arc::new(StaticData(serde_json::to_value(SiteMap::home())?))),
                PAGE_ROBOTS_TXT => Some(Arc::new(StaticData(serde_json::to_value(RobotsTxt::allow_all())?))),
                _ => None,
            };
            if let Some(handler) = handler {
                write(&self.handlers).insert(default.name.to_owned(), handler);
            }
        }
        Ok(())
    }

    fn install_data_handlers(&self) -> Result<(), SiteError> {
        for (name, page) in &self.config.pages {
            let Some(data) = &page.data else { continue };
            let handler: Arc<dyn DataHandler> = match page.json_data_file() {
                Some(file) => Arc::new(JsonFileData::load(self.base_dir.join(file), self.config.reload)?),
                None => Arc::new(StaticData(data.clone())),
            };
            write(&self.handlers).insert(name.clone(), handler);
        }
        Ok(())
    }

    /// Check that referenced files exist and routes do not conflict.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError::Validation`] listing every problem found.
    pub fn validate(&self) -> Result<(), SiteError> {
        let mut problems = Vec::new();
        let config = &self.config;

        if let Some(dir) = &config.static_dir {
            if !dir.exists() {
                problems.push(format!("static directory not found: {}", dir.display()));
            }
            if !config.static_prefix.starts_with('/') || config.static_prefix == "/" {
                problems.push(format!(
                    "static_prefix must start with '/' and not be '/': {:?}",
                    config.static_prefix
                ));
            }
        }
        for (layout, files) in &config.layouts {
            for file in files.iter().filter(|f| !f.exists()) {
                problems.push(format!("layout {layout}: file not found: {}", file.display()));
            }
        }

        // Owner `None` marks the static file mount.
        let mut routes: Vec<(Option<&str>, RoutePattern)> = Vec::new();
        if config.static_dir.is_some() {
            routes.extend(static_mount_patterns(&config.static_prefix).into_iter().map(|p| (None, p)));
        }
        for (name, page) in &config.pages {
            if !page.layout.is_empty() && !config.layouts.contains_key(&page.layout) {
                problems.push(format!("page {name}: layout {} not defined", page.layout));
            }
            for file in page.components.iter().filter(|f| !f.exists()) {
                problems.push(format!("page {name}: component not found: {}", file.display()));
            }
            match RoutePattern::parse(&page.path) {
                Err(RouteError::NotAbsolute) => {
                    problems.push(format!("page {name}: path must start with '/': {:?}", page.path));
                }
                Err(err) => problems.push(format!("page {name}: unsupported path {}: {err}", page.path)),
                Ok(pattern) => {
                    match routes.iter().find(|(_, p)| p.conflicts_with(&pattern)) {
                        Some((Some(other), _)) => {
                            problems.push(format!("pages {other} and {name} share path {}", page.path));
                        }
                        Some((None, _)) => problems.push(format!(
                            "page {name}: path {} overlaps static files under {}",
                            page.path, config.static_prefix
                        )),
                        None => routes.push((Some(name.as_str()), pattern)),
                    }
                }
            }
            if page.auth && self.auth.is_none() {
                problems.push(format!("page {name}: auth is enabled but no auth info provider is set"));
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(SiteError::Validation(problems.join("; ")))
        }
    }
}

/// Serves a fixed value as page data.
struct StaticData(Value);

impl DataHandler for StaticData {
    fn handle(&self, _request: &PageRequest) -> Result<PageContent, SiteError> {
        Ok(PageContent::Data(self.0.clone()))
    }
}

/// Serves a JSON object read from a file.
///
/// The file is read once on load; with `reload` it is read again on every
/// request and read failures become error pages.
pub struct JsonFileData {
    path: PathBuf,
    reload: bool,
    cached: Value,
}

impl JsonFileData {
    /// Load the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a JSON object.
    pub fn load(path: impl Into<PathBuf>, reload: bool) -> Result<Self, SiteError> {
        let path = path.into();
        let cached = read_json_object(&path)?;
        Ok(Self {
            path,
            reload,
            cached,
        })
    }
}

impl DataHandler for JsonFileData {
    fn handle(&self, _request: &PageRequest) -> Result<PageContent, SiteError> {
        if self.reload {
            Ok(PageContent::Data(read_json_object(&self.path)?))
        } else {
            Ok(PageContent::Data(self.cached.clone()))
        }
    }
}

fn read_json_object(path: &Path) -> Result<Value, SiteError> {
    let content = fs::read_to_string(path).map_err(|e| SiteError::io(path, e))?;
    let object: serde_json::Map<String, Value> =
        serde_json::from_str(&content).map_err(|source| SiteError::Json {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(Value::Object(object))
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
