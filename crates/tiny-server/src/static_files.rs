//! Static file serving.

use std::path::Path;
use std::sync::Arc;

use axum::Router;
use tower::ServiceBuilder;
use tower_http::services::ServeDir;

use crate::middleware::cache::cache_control_layer;
use crate::state::AppState;

/// Mount `dir` under `prefix` with a `Cache-Control` header.
///
/// Returns the router unchanged when the prefix has nothing left after
/// trimming slashes.
pub(crate) fn mount(
    router: Router<Arc<AppState>>,
    prefix: &str,
    dir: &Path,
    max_age: u64,
) -> Router<Arc<AppState>> {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() || !prefix.starts_with('/') {
        tracing::warn!(prefix, "Static files not mounted: invalid prefix");
        return router;
    }
    tracing::info!(prefix, dir = %dir.display(), "Serving static files");
    let service = ServiceBuilder::new()
        .layer(cache_control_layer(max_age))
        .service(ServeDir::new(dir));
    router.nest_service(prefix, service)
}
