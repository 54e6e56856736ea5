//! Router construction.
//!
//! One `GET` route per page, static files under the static prefix and a
//! fallback rendering the not-found page.

use std::sync::Arc;

use axum::Router;
use axum::middleware;
use tiny_site::{RoutePattern, static_mount_patterns};
use tower_http::trace::TraceLayer;

use crate::handlers::pages;
use crate::middleware::auth;
use crate::state::AppState;
use crate::static_files;

/// Create the application router.
pub(crate) fn create_router(state: Arc<AppState>) -> Router {
    let site = Arc::clone(&state.site);
    let config = site.config();
    let mut router = Router::new();

    if let Some(dir) = &config.static_dir {
        router = static_files::mount(router, &config.static_prefix, dir, config.cache_max_age());
    }

    // axum panics on overlapping routes.
    let mut registered = Vec::new();
    if config.static_dir.is_some() {
        registered = static_mount_patterns(&config.static_prefix);
    }
    for (name, page) in site.pages() {
        let pattern = match RoutePattern::parse(&page.path) {
            Ok(pattern) => pattern,
            Err(err) => {
                tracing::warn!(page = %name, path = %page.path, error = %err, "Skipping page with unsupported path");
                continue;
            }
        };
        if registered.iter().any(|other| other.conflicts_with(&pattern)) {
            tracing::warn!(page = %name, path = %page.path, "Skipping page with conflicting path");
            continue;
        }
        registered.push(pattern);

        let mut route = pages::page_route(name);
        if page.auth {
            route = route.route_layer(middleware::from_fn_with_state(
                Arc::clone(&state),
                auth::require_auth,
            ));
        }
        tracing::info!(page = %name, path = %page.path, auth = page.auth, "Registered page");
        router = router.route(&page.path, route);
    }

    router
        .fallback(pages::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
