use thiserror::Error;

use crate::provider::ProviderId;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Every failure the aggregator can report.
///
/// Only [`Error::Validation`] is attributable to the caller; all other
/// variants describe something that went wrong while talking to (or being
/// configured for) an external provider.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid parameter '{param}': {message}")]
    Validation { param: &'static str, message: String },

    #[error("{0}")]
    NotFound(String),

    #[error("{provider} request failed: {message}")]
    Upstream { provider: ProviderId, message: String },

    #[error("{provider} request timed out")]
    Timeout { provider: ProviderId },

    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn validation(param: &'static str, message: impl Into<String>) -> Self {
        Error::Validation { param, message: message.into() }
    }

    pub fn upstream(provider: ProviderId, message: impl Into<String>) -> Self {
        Error::Upstream { provider, message: message.into() }
    }

    /// True when the request itself was malformed and nothing was sent upstream.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::Validation { .. })
    }

    /// Provider involved in the failure, if any.
    pub fn provider(&self) -> Option<ProviderId> {
        match self {
            Error::Upstream { provider, .. } | Error::Timeout { provider } => Some(*provider),
            _ => None,
        }
    }
}
