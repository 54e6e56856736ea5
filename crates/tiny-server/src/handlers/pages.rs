//! Page rendering endpoints.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, HeaderValue, Uri, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{MethodRouter, get};
use tiny_site::{PageResponse, Site, SiteError};

use crate::handlers::page_request;
use crate::state::AppState;

/// `GET` route rendering the named page.
pub(crate) fn page_route(name: &str) -> MethodRouter<Arc<AppState>> {
    let name: Arc<str> = Arc::from(name);
    get(
        move |State(state): State<Arc<AppState>>,
              params: Option<Path<BTreeMap<String, String>>>,
              uri: Uri,
              headers: HeaderMap| {
            let name = Arc::clone(&name);
            async move {
                let params = params.map(|Path(params)| params).unwrap_or_default();
                let request = page_request(&uri, headers, params);
                let response = state.site.serve(&name, &request);
                into_response(&state.site, response)
            }
        },
    )
}

/// Fallback for paths no page matches.
pub(crate) async fn not_found(
    State(state): State<Arc<AppState>>,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let request = page_request(&uri, headers, BTreeMap::new());
    let error = SiteError::PageNotFound(uri.path().to_owned());
    tracing::debug!(path = %uri.path(), "No page matches path");
    into_response(&state.site, state.site.serve_error(&request, &error))
}

/// Turn a rendered page into an HTTP response.
pub(crate) fn into_response(site: &Site, response: PageResponse) -> Response {
    let content_type = content_type(site, response.page.as_deref());
    (
        response.status,
        [(header::CONTENT_TYPE, content_type)],
        response.body,
    )
        .into_response()
}

/// Content type from the extension of the page path; HTML when it has none.
fn content_type(site: &Site, page: Option<&str>) -> HeaderValue {
    let Some(page) = page.and_then(|name| site.page(name)) else {
        return HeaderValue::from_static("text/plain; charset=utf-8");
    };
    let value = match mime_guess::from_path(page.path.trim_end_matches('/')).first() {
        Some(mime) if mime.type_() == mime_guess::mime::TEXT => format!("{mime}; charset=utf-8"),
        Some(mime) => mime.to_string(),
        None => return HeaderValue::from_static("text/html; charset=utf-8"),
    };
    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("text/html; charset=utf-8"))
}
