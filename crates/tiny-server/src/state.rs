//! Application state.

use std::sync::Arc;

use tiny_site::Site;

/// State shared by all request handlers.
pub(crate) struct AppState {
    pub(crate) site: Arc<Site>,
}
