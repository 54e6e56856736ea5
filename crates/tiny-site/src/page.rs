//! Request context, page data and the hooks applications plug in.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use http::HeaderMap;
use serde::Serialize;
use serde_json::Value;

use crate::SiteError;
use crate::metadata::MetaData;

/// The parts of an HTTP request pages can see.
#[derive(Debug, Clone, Default)]
pub struct PageRequest {
    /// Request path without the query string.
    pub path: String,
    /// Raw query string.
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub cookies: BTreeMap<String, String>,
    /// Route parameters captured from the page path.
    pub params: BTreeMap<String, String>,
}

impl PageRequest {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Cookie value by name.
    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    /// Route parameter by name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

/// Error details exposed to error pages as `error`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorInfo {
    pub code: u16,
    pub message: String,
}

impl From<&SiteError> for ErrorInfo {
    fn from(err: &SiteError) -> Self {
        Self {
            code: err.status().as_u16(),
            message: err.to_string(),
        }
    }
}

/// Template context of a page.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PageData {
    /// Page metadata merged over the site metadata.
    pub metadata: MetaData,
    pub authenticated: bool,
    /// Claims returned by the auth provider.
    pub user: Option<Value>,
    pub error: Option<ErrorInfo>,
    pub cookies: BTreeMap<String, String>,
    pub params: BTreeMap<String, String>,
    /// Output of the page's data handler.
    pub data: Value,
}

impl PageData {
    /// Cookie value by name, empty when absent.
    #[must_use]
    pub fn cookie(&self, name: &str) -> &str {
        self.cookies.get(name).map_or("", String::as_str)
    }
}

/// What a data handler produces.
#[derive(Debug, Clone)]
pub enum PageContent {
    /// Exposed to templates as `data`.
    Data(Value),
    /// Replaces the whole page data.
    Page(Box<PageData>),
}

impl From<Value> for PageContent {
    fn from(value: Value) -> Self {
        Self::Data(value)
    }
}

impl From<PageData> for PageContent {
    fn from(data: PageData) -> Self {
        Self::Page(Box::new(data))
    }
}

/// Supplies per-request data for a page.
///
/// Returning an error renders the error page mapped to the error's status.
pub trait DataHandler: Send + Sync {
    fn handle(&self, request: &PageRequest) -> Result<PageContent, SiteError>;
}

impl<F> DataHandler for F
where
    F: Fn(&PageRequest) -> Result<PageContent, SiteError> + Send + Sync,
{
    fn handle(&self, request: &PageRequest) -> Result<PageContent, SiteError> {
        self(request)
    }
}

/// Resolves the user behind a request.
pub trait AuthInfo: Send + Sync {
    /// User claims, or `None` for anonymous requests.
    fn user(&self, request: &PageRequest) -> Option<Value>;
}

impl<F> AuthInfo for F
where
    F: Fn(&PageRequest) -> Option<Value> + Send + Sync,
{
    fn user(&self, request: &PageRequest) -> Option<Value> {
        self(request)
    }
}

/// A `<url>` entry of `sitemap.xml`.
#[derive(Debug, Clone, Serialize)]
pub struct SiteMapUrl {
    /// Path appended to the `base_url` metadata.
    pub loc: String,
    pub last_mod: DateTime<Utc>,
    pub change_freq: String,
    pub priority: f64,
}

/// Data of the built-in `sitemap.xml` page.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SiteMap {
    pub url_set: Vec<SiteMapUrl>,
}

/// A `User-agent` group of `robots.txt`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserAgent {
    pub user_agent: String,
    pub disallow: Vec<String>,
    pub allow: Vec<String>,
}

/// Data of the built-in `robots.txt` page.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RobotsTxt {
    pub user_agents: Vec<UserAgent>,
}

impl SiteMap {
    /// Sitemap listing only the home page.
    #[must_use]
    pub fn home() -> Self {
        Self {
            url_set: vec![SiteMapUrl {
                loc: "/".to_owned(),
                last_mod: Utc::now(),
                change_freq: "daily".to_owned(),
                priority: 1.0,
            }],
        }
    }
}

impl RobotsTxt {
    /// Allow every crawler everywhere.
    #[must_use]
    pub fn allow_all() -> Self {
        Self {
            user_agents: vec![UserAgent {
                user_agent: "*".to_owned(),
                disallow: Vec::new(),
                allow: vec!["/".to_owned()],
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;
    use serde_json::json;

    #[test]
    fn test_error_info_from_site_error() {
        let err = SiteError::new(StatusCode::FORBIDDEN, "members only");
        let info = ErrorInfo::from(&err);
        assert_eq!(info.code, 403);
        assert_eq!(info.message, "members only");
    }

    #[test]
    fn test_closure_handlers() {
        let handler = |req: &PageRequest| -> Result<PageContent, SiteError> {
            Ok(json!({ "id": req.param("id") }).into())
        };
        let request = PageRequest::new("/posts/7").with_param("id", "7");
        match handler.handle(&request).unwrap() {
            PageContent::Data(data) => assert_eq!(data, json!({ "id": "7" })),
            PageContent::Page(_) => panic!("expected data"),
        }

        let auth = |req: &PageRequest| req.cookie("session").map(|s| json!({ "sid": s }));
        assert!(auth.user(&PageRequest::new("/")).is_none());
        assert!(auth.user(&PageRequest::new("/").with_cookie("session", "x")).is_some());
    }

    #[test]
    fn test_page_data_serializes_template_fields() {
        let data = PageData {
            authenticated: true,
            cookies: BTreeMap::from([("lang".to_owned(), "vi".to_owned())]),
            ..PageData::default()
        };
        let value = serde_json::to_value(&data).unwrap();
        assert_eq!(value["authenticated"], json!(true));
        assert_eq!(value["cookies"]["lang"], json!("vi"));
        assert_eq!(value["error"], Value::Null);
        assert_eq!(data.cookie("lang"), "vi");
        assert_eq!(data.cookie("missing"), "");
    }
}
