//! HTTP request handlers.

pub(crate) mod pages;

use std::collections::BTreeMap;

use axum::http::{HeaderMap, Uri};
use axum_extra::extract::CookieJar;
use tiny_site::PageRequest;

/// Build the request view handed to the site.
pub(crate) fn page_request(
    uri: &Uri,
    headers: HeaderMap,
    params: BTreeMap<String, String>,
) -> PageRequest {
    let cookies = CookieJar::from_headers(&headers)
        .iter()
        .map(|cookie| (cookie.name().to_owned(), cookie.value().to_owned()))
        .collect();
    PageRequest {
        path: uri.path().to_owned(),
        query: uri.query().map(str::to_owned),
        headers,
        cookies,
        params,
    }
}
