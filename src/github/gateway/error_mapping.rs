//! Maps Octocrab failures onto [`GatewayError`].

use http::StatusCode;

use crate::github::error::GatewayError;

const fn is_auth_failure(status: StatusCode) -> bool {
    matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
}

const fn is_network_error(error: &octocrab::Error) -> bool {
    matches!(
        error,
        octocrab::Error::Http { .. }
            | octocrab::Error::Hyper { .. }
            | octocrab::Error::Service { .. }
    )
}

/// True for 403/429 responses whose message or docs link mention the rate
/// limit. A plain 403 is an authentication failure instead.
pub(super) fn is_rate_limit_error(source: &octocrab::GitHubError) -> bool {
    let is_rate_limit_status = matches!(
        source.status_code,
        StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS
    );

    let message_indicates_rate_limit = source.message.to_lowercase().contains("rate limit")
        || source
            .documentation_url
            .as_deref()
            .is_some_and(|url| url.contains("rate-limit"));

    is_rate_limit_status && message_indicates_rate_limit
}

pub(super) fn map_octocrab_error(operation: &str, error: &octocrab::Error) -> GatewayError {
    if let octocrab::Error::GitHub { source, .. } = error {
        let status = source.status_code;
        let message = &source.message;
        return if is_auth_failure(status) {
            GatewayError::Authentication {
                message: format!("{operation} failed: GitHub returned {status} {message}"),
            }
        } else {
            GatewayError::Api {
                message: format!("{operation} failed with status {status}: {message}"),
            }
        };
    }

    if is_network_error(error) {
        return GatewayError::Network {
            message: format!("{operation} failed: {error}"),
        };
    }

    GatewayError::Api {
        message: format!("{operation} failed: {error}"),
    }
}
