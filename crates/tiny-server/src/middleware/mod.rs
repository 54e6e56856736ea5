//! Request and response middleware.

pub(crate) mod auth;
pub(crate) mod cache;
