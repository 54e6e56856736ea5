//! Site error type.

use std::path::PathBuf;

use http::StatusCode;

/// Error raised while loading, validating or rendering a site.
#[derive(Debug, thiserror::Error)]
pub enum SiteError {
    /// No page with this name is configured.
    #[error("page not found: {0}")]
    PageNotFound(String),
    /// The page has neither layout files nor components.
    #[error("no templates found for page: {0}")]
    NoTemplates(String),
    /// Template compilation or rendering failed.
    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),
    /// Filesystem access failed.
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The site file is not valid YAML.
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// A JSON data file is malformed.
    #[error("invalid data in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// Handler output could not be converted to template data.
    #[error("failed to serialize page data: {0}")]
    Serialize(#[from] serde_json::Error),
    /// An `allowed_pages` entry is not a valid regular expression.
    #[error("invalid page pattern: {0}")]
    Pattern(#[from] regex::Error),
    /// The site file references missing files or conflicting routes.
    #[error("invalid site configuration: {0}")]
    Validation(String),
    /// Environment variable expansion failed.
    #[error("environment variable error in {field}: {message}")]
    EnvVar { field: String, message: String },
    /// A custom template function has an invalid name.
    #[error(transparent)]
    Funcs(#[from] tiny_funcs::FuncError),
    /// Application error carrying an HTTP status.
    #[error("{message}")]
    Status { code: StatusCode, message: String },
}

impl SiteError {
    /// Create an error that renders the error page mapped to `code`.
    pub fn new(code: StatusCode, message: impl Into<String>) -> Self {
        Self::Status {
            code,
            message: message.into(),
        }
    }

    /// Wrap an I/O error with the path that caused it.
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// HTTP status used to pick the error page.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::PageNotFound(_) | Self::NoTemplates(_) => StatusCode::NOT_FOUND,
            Self::Status { code, .. } => *code,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            SiteError::PageNotFound("x".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            SiteError::NoTemplates("x".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            SiteError::new(StatusCode::FORBIDDEN, "nope").status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            SiteError::Validation("bad".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_status_error_message() {
        let err = SiteError::new(StatusCode::BAD_REQUEST, "missing id");
        assert_eq!(err.to_string(), "missing id");
    }
}
