//! Environment variable expansion for site file strings.

use crate::SiteError;

/// Expand `${VAR}` and `${VAR:-default}` references in `value`.
///
/// `field` names the site file key for error messages.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, SiteError> {
    shellexpand::env(value)
        .map(std::borrow::Cow::into_owned)
        .map_err(|e| SiteError::EnvVar {
            field: field.to_owned(),
            message: format!("${{{}}} not set", e.var_name),
        })
}
