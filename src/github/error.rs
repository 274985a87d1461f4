//! Error types exposed by the GitHub gateway layer.

use thiserror::Error;

use super::rate_limit::RateLimitInfo;

/// Errors surfaced while building requests or communicating with GitHub.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    /// A URL could not be parsed.
    #[error("URL is invalid: {0}")]
    InvalidUrl(String),

    /// The repository owner or name is missing.
    #[error("repository must be given as owner and name")]
    MissingRepository,

    /// The authentication token was missing.
    #[error("personal access token is required")]
    MissingToken,

    /// The authentication token was rejected by GitHub.
    #[error("GitHub rejected the token: {message}")]
    Authentication {
        /// GitHub error message returned with the 401/403 response.
        message: String,
    },

    /// GitHub returned a non-authentication API error.
    #[error("GitHub API error: {message}")]
    Api {
        /// Response body from GitHub describing the failure.
        message: String,
    },

    /// Networking failed while calling GitHub.
    #[error("network error talking to GitHub: {message}")]
    Network {
        /// Transport-level error detail.
        message: String,
    },

    /// Rate limit exceeded - the API returned 403/429 with a rate limit message.
    #[error("GitHub API rate limit exceeded: {message}")]
    RateLimitExceeded {
        /// Rate limit info if it could be fetched after the failure.
        rate_limit: Option<RateLimitInfo>,
        /// Error message from GitHub.
        message: String,
    },

    /// Invalid pagination parameters.
    #[error("invalid pagination: {message}")]
    InvalidPagination {
        /// Description of the invalid parameter.
        message: String,
    },
}
