//! Cache headers for static files.

use axum::http::{HeaderValue, header};
use tower_http::set_header::SetResponseHeaderLayer;

/// `Cache-Control` value allowing shared caches to keep a response for
/// `max_age` seconds.
pub(crate) fn cache_control_value(max_age: u64) -> HeaderValue {
    HeaderValue::from_str(&format!("public, max-age={max_age}"))
        .unwrap_or_else(|_| HeaderValue::from_static("no-cache"))
}

/// Create layer that sets `Cache-Control` on every response.
pub(crate) fn cache_control_layer(max_age: u64) -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::overriding(header::CACHE_CONTROL, cache_control_value(max_age))
}
