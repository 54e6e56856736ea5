//! Static site generation.
//!
//! Pages are requested one by one, either from the in-process router or from
//! a running server when `static_site.request.host` is set, and successful
//! responses whose path is allowed are written under the output directory.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::Request;
use tower::ServiceExt;
use ureq::Agent;

use tiny_site::{AllowedPages, Site, SiteError, prepare_output, write_page};

use crate::app::create_router;
use crate::state::AppState;

/// Timeout for each request to a running server.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Static generation error.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// Preparing the output or writing a page failed.
    #[error(transparent)]
    Site(#[from] SiteError),
    /// A page could not be fetched.
    #[error("failed to request {url}: {message}")]
    Request { url: String, message: String },
    /// A blocking fetch task panicked or was cancelled.
    #[error("fetch task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Why a requested path was not written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// No `allowed_pages` pattern matches the path.
    NotAllowed,
    /// The response was not successful.
    Status(u16),
}

/// Outcome of a generation run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GenerateReport {
    /// Files written, in request order.
    pub written: Vec<PathBuf>,
    /// Requested paths that were not written.
    pub skipped: Vec<(String, SkipReason)>,
}

/// Where pages are fetched from.
enum Fetcher {
    Router(Router),
    Http { agent: Agent, host: String },
}

impl Fetcher {
    fn new(site: &Arc<Site>) -> Self {
        let host = &site.config().static_site.request.host;
        if host.is_empty() {
            let state = Arc::new(AppState {
                site: Arc::clone(site),
            });
            return Self::Router(create_router(state));
        }
        let agent = Agent::config_builder()
            .timeout_global(Some(REQUEST_TIMEOUT))
            .http_status_as_error(false)
            .build()
            .into();
        Self::Http {
            agent,
            host: host.trim_end_matches('/').to_owned(),
        }
    }

    /// Fetch a path, returning the status code and body.
    async fn fetch(&self, path: &str) -> Result<(u16, Vec<u8>), GenerateError> {
        match self {
            Self::Router(router) => {
                let request_error = |message: String| GenerateError::Request {
                    url: path.to_owned(),
                    message,
                };
                let request = Request::get(path)
                    .body(Body::empty())
                    .map_err(|e| request_error(e.to_string()))?;
                let response = router
                    .clone()
                    .oneshot(request)
                    .await
                    .map_err(|e| request_error(e.to_string()))?;
                let status = response.status().as_u16();
                let body = to_bytes(response.into_body(), usize::MAX)
                    .await
                    .map_err(|e| request_error(e.to_string()))?;
                Ok((status, body.to_vec()))
            }
            Self::Http { agent, host } => {
                let agent = agent.clone();
                let url = format!("{host}{path}");
                tokio::task::spawn_blocking(move || -> Result<(u16, Vec<u8>), GenerateError> {
                    let request_error = |message: String| GenerateError::Request {
                        url: url.clone(),
                        message,
                    };
                    let response = agent
                        .get(&url)
                        .call()
                        .map_err(|e| request_error(e.to_string()))?;
                    let status = response.status().as_u16();
                    let body = response
                        .into_body()
                        .read_to_vec()
                        .map_err(|e| request_error(e.to_string()))?;
                    Ok((status, body))
                })
                .await?
            }
        }
    }
}

/// Generate the static site configured under `static_site`.
///
/// Does nothing but log a warning when generation is disabled.
///
/// # Errors
///
/// Returns an error if the output cannot be prepared, an `allowed_pages`
/// pattern is invalid, a page cannot be fetched or a file cannot be written.
pub async fn generate_static_site(site: Arc<Site>) -> Result<GenerateReport, GenerateError> {
    let config = &site.config().static_site;
    let mut report = GenerateReport::default();
    if !config.enable {
        tracing::warn!("Static site generation is disabled");
        return Ok(report);
    }

    let allowed = AllowedPages::new(&config.allowed_pages)?;
    prepare_output(config)?;
    let fetcher = Fetcher::new(&site);

    for path in site.generation_paths() {
        let (status, body) = fetcher.fetch(&path).await?;
        if !(200..300).contains(&status) {
            tracing::warn!(path = %path, status, "Skipping page: unsuccessful response");
            report.skipped.push((path, SkipReason::Status(status)));
            continue;
        }
        if !allowed.is_allowed(&path) {
            tracing::debug!(path = %path, "Skipping page: not allowed");
            report.skipped.push((path, SkipReason::NotAllowed));
            continue;
        }
        let file = write_page(&config.output.root_dir, &path, &body)?;
        tracing::info!(path = %path, file = %file.display(), "Generated page");
        report.written.push(file);
    }
    Ok(report)
}
