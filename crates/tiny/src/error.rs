//! CLI error types.

use tiny_server::{GenerateError, ServerError};
use tiny_site::SiteError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Site(#[from] SiteError),

    #[error("{0}")]
    Server(#[from] ServerError),

    #[error("{0}")]
    Generate(#[from] GenerateError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Validation(String),
}
