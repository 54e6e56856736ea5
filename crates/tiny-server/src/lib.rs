//! HTTP server and static generator for tiny sites.
//!
//! Every page of a [`Site`] becomes a `GET` route. Static files are served
//! under the configured prefix with a `Cache-Control` header, pages marked
//! `auth` redirect anonymous users to the login page, and unmatched paths
//! render the `not_found` page.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use tiny_server::{ServerConfig, run_server};
//! use tiny_site::SiteBuilder;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let site = Arc::new(SiteBuilder::from_file("index.yml")?.build()?);
//!     run_server(site, ServerConfig::default()).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! Browser ──HTTP──► axum router (tiny-server)
//!                        │
//!                        ├─► Page routes ──► auth redirect ──► Site::serve
//!                        │
//!                        ├─► Static files (tower-http ServeDir)
//!                        │
//!                        └─► Fallback ──► not_found page
//! ```

mod app;
mod generate;
mod handlers;
mod middleware;
mod state;
mod static_files;

use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;

use axum::Router;
use state::AppState;
use tiny_site::Site;

pub use generate::{GenerateError, GenerateReport, SkipReason, generate_static_site};

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 8080,
        }
    }
}

/// Server error.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Host and port do not form a socket address.
    #[error("invalid address {address}: {source}")]
    Address {
        address: String,
        #[source]
        source: std::net::AddrParseError,
    },
    /// Binding or serving failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Build the router serving a site.
#[must_use]
pub fn router(site: Arc<Site>) -> Router {
    app::create_router(Arc::new(AppState { site }))
}

/// Run the server until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the address is invalid or the server fails to start.
pub async fn run_server(site: Arc<Site>, config: ServerConfig) -> Result<(), ServerError> {
    let app = router(site);

    let address = format!("{}:{}", config.host, config.port);
    let addr = SocketAddr::from_str(&address).map_err(|source| ServerError::Address {
        address: address.clone(),
        source,
    })?;
    tracing::info!(address = %addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Wait for shutdown signal (Ctrl-C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, stopping server...");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;
    use tiny_site::{PageRequest, SiteBuilder};
    use tower::ServiceExt;

    const SITE: &str = r"
static: assets
metadata:
  title: Blog
pages:
  home:
    path: /
    components: [pages/home.html]
  post:
    path: /posts/{id}
    components: [pages/post.html]
  account:
    path: /account
    auth: true
    components: [pages/account.html]
";

    fn write_file(dir: &Path, name: &str, content: &str) {
        let path = dir.join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn create_site(dir: &TempDir) -> Arc<Site> {
        let root = dir.path();
        write_file(root, "pages/home.html", "<h1>[[ metadata.title ]]</h1>");
        write_file(root, "pages/post.html", "post [[ params.id ]]");
        write_file(root, "pages/account.html", "hello [[ user.name ]]");
        write_file(root, "assets/site.css", "body{}");
        let site = SiteBuilder::from_yaml(SITE, root)
            .unwrap()
            .auth_info(|request: &PageRequest| {
                request
                    .cookie("session")
                    .map(|name| serde_json::json!({ "name": name }))
            })
            .build()
            .unwrap();
        Arc::new(site)
    }

    async fn get(app: Router, uri: &str, cookie: Option<&str>) -> (StatusCode, String, axum::http::HeaderMap) {
        let mut request = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        let response = app.oneshot(request.body(Body::empty()).unwrap()).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap(), headers)
    }

    #[tokio::test]
    async fn test_page_route() {
        let dir = TempDir::new().unwrap();
        let (status, body, headers) = get(router(create_site(&dir)), "/", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "<h1>Blog</h1>");
        assert_eq!(headers[header::CONTENT_TYPE], "text/html; charset=utf-8");
    }

    #[tokio::test]
    async fn test_page_route_with_params() {
        let dir = TempDir::new().unwrap();
        let (status, body, _) = get(router(create_site(&dir)), "/posts/42", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "post 42");
    }

    #[tokio::test]
    async fn test_unknown_path_renders_not_found() {
        let dir = TempDir::new().unwrap();
        let (status, body, _) = get(router(create_site(&dir)), "/missing", None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("Page not found."), "{body}");
    }

    #[tokio::test]
    async fn test_static_files_have_cache_control() {
        let dir = TempDir::new().unwrap();
        let (status, body, headers) = get(router(create_site(&dir)), "/static/site.css", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "body{}");
        assert_eq!(headers[header::CACHE_CONTROL], "public, max-age=2592000");
    }

    #[tokio::test]
    async fn test_auth_page_redirects_anonymous_users() {
        let dir = TempDir::new().unwrap();
        let (status, _, headers) = get(router(create_site(&dir)), "/account", None).await;

        assert_eq!(status, StatusCode::FOUND);
        assert_eq!(headers[header::LOCATION], "/login?redirect=/account");
    }

    #[tokio::test]
    async fn test_auth_page_renders_for_users() {
        let dir = TempDir::new().unwrap();
        let (status, body, _) =
            get(router(create_site(&dir)), "/account", Some("session=ada")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "hello ada");
    }

    #[tokio::test]
    async fn test_builtin_pages_content_type() {
        let dir = TempDir::new().unwrap();
        let app = router(create_site(&dir));

        let (status, body, headers) = get(app.clone(), "/sitemap.xml", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<urlset"), "{body}");
        assert_eq!(headers[header::CONTENT_TYPE], "text/xml; charset=utf-8");

        let (status, body, headers) = get(app, "/robots.txt", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("User-agent: *"), "{body}");
        assert_eq!(headers[header::CONTENT_TYPE], "text/plain; charset=utf-8");
    }

    #[tokio::test]
    async fn test_router_skips_unroutable_pages() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write_file(root, "pages/ok.html", "ok");
        write_file(root, "assets/site.css", "body{}");
        let yaml = r#"
validate: false
static: assets
pages:
  tail: { path: "/a/{*rest}/b", components: [pages/ok.html] }
  json: { path: "/{id}.json", components: [pages/ok.html] }
  pair: { path: "/a/{id}{other}", components: [pages/ok.html] }
  one: { path: "/a/{id}", components: [pages/ok.html] }
  rest: { path: "/a/{*rest}", components: [pages/ok.html] }
  assets: { path: "/static/{*rest}", components: [pages/ok.html] }
  file: { path: /static/x, components: [pages/ok.html] }
  version: { path: "/x{id}", components: [pages/ok.html] }
"#;
        let site = Arc::new(SiteBuilder::from_yaml(yaml, root).unwrap().build().unwrap());
        let app = router(site);

        for uri in ["/a/1", "/static/x", "/x2"] {
            let (status, body, _) = get(app.clone(), uri, None).await;
            assert_eq!((status, body.as_str()), (StatusCode::OK, "ok"), "{uri}");
        }
        let (status, body, _) = get(app.clone(), "/static/site.css", None).await;
        assert_eq!((status, body.as_str()), (StatusCode::OK, "body{}"));
        let (status, _, _) = get(app, "/a/1/b", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
    }
}
