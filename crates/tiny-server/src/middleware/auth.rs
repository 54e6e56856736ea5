//! Login redirect for pages requiring authentication.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::handlers::page_request;
use crate::state::AppState;

/// Redirect anonymous users to `<login>?redirect=<path>` with `302 Found`.
pub(crate) async fn require_auth(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let view = page_request(request.uri(), request.headers().clone(), BTreeMap::new());
    if state.site.user(&view).is_some() {
        return next.run(request).await;
    }

    let location = login_location(&state.site.config().login, request.uri().path());
    tracing::debug!(path = %request.uri().path(), location = %location, "Redirecting to login");
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}

fn login_location(login: &str, path: &str) -> String {
    format!("{login}?redirect={path}")
}
