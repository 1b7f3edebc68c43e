use thiserror::Error;

use crate::models::ProxyType;

/// Errors raised while converting between share links and Clash documents.
///
/// Whether an error aborts a call or only drops one entry is decided by the
/// caller: batch operations collect per-entry errors into
/// [`Diagnostic`](crate::models::Diagnostic)s and keep going.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConvertError {
    #[error("malformed {scheme} link: {reason}")]
    MalformedUri { scheme: String, reason: String },

    #[error("unknown link scheme: {0}")]
    UnknownScheme(String),

    #[error("malformed document: {0}")]
    MalformedDocument(String),

    #[error("unknown proxy type: {0}")]
    UnknownType(String),

    #[error("cannot build a {proxy_type} link without `{field}`")]
    UnsupportedField {
        proxy_type: ProxyType,
        field: &'static str,
    },

    #[error("proxy entry is missing `{0}`")]
    MissingField(&'static str),

    #[error("invalid proxy entry: {0}")]
    InvalidEntry(String),

    #[error("unknown output mode: {0}")]
    UnknownMode(String),

    #[error("failed to render document: {0}")]
    Render(String),
}

impl ConvertError {
    pub fn malformed(scheme: &str, reason: impl Into<String>) -> Self {
        ConvertError::MalformedUri {
            scheme: scheme.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = ConvertError> = std::result::Result<T, E>;
