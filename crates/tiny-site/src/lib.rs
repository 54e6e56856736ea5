//! Site definitions for tiny.
//!
//! A site is described by a YAML file listing layouts, pages and their
//! template files. [`SiteBuilder`] loads the file, adds the built-in pages
//! (`robots.txt`, `sitemap.xml`, `error`, `not_found`), installs data
//! handlers and validates the result. The resulting [`Site`] renders pages
//! for the HTTP server and the static generator.
//!
//! # Example
//!
//! ```no_run
//! use tiny_site::{PageRequest, SiteBuilder};
//!
//! let site = SiteBuilder::from_file("index.yml")?.build()?;
//! let response = site.serve("home", &PageRequest::new("/"));
//! println!("{}", response.body);
//! # Ok::<(), tiny_site::SiteError>(())
//! ```

mod config;
mod error;
mod expand;
mod metadata;
mod output;
mod page;
mod route;
mod site;
mod templates;

pub use config::{
    DEFAULT_CACHE_MAX_AGE, DEFAULT_DELIM_LEFT, DEFAULT_DELIM_RIGHT, Page, SiteConfig,
    StaticOutput, StaticRequest, StaticSiteConfig,
};
pub use error::SiteError;
pub use metadata::MetaData;
pub use output::{AllowedPages, output_path, prepare_output, write_page};
pub use page::{
    AuthInfo, DataHandler, ErrorInfo, PageContent, PageData, PageRequest, RobotsTxt, SiteMap,
    SiteMapUrl, UserAgent,
};
pub use route::{RouteError, RoutePattern, static_mount_patterns};
pub use site::{JsonFileData, PageResponse, Site, SiteBuilder};
pub use tiny_funcs::FuncMap;

/// Page rendered for 404 errors and unmatched paths.
pub const PAGE_NOT_FOUND: &str = "not_found";
/// Page rendered for errors without a dedicated page.
pub const PAGE_ERROR: &str = "error";
pub const PAGE_ROBOTS_TXT: &str = "robots.txt";
pub const PAGE_SITEMAP_XML: &str = "sitemap.xml";
