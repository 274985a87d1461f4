//! Rate limit status reported by the GitHub API.
//!
//! Synchronisation and patch application both check the remaining core quota
//! before issuing any other request, so a run never starts when it is bound to
//! be cut off halfway.

use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};

/// Core API quota as reported by `GET /rate_limit`.
///
/// # Example
///
/// ```
/// use patchtester::github::rate_limit::RateLimitInfo;
///
/// let info = RateLimitInfo::new(5000, 9, 1_700_000_000);
/// assert!(!info.allows(10));
/// assert!(info.allows(1));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitInfo {
    limit: u32,
    remaining: u32,
    reset_at: u64,
}

impl RateLimitInfo {
    /// Creates a new rate limit snapshot.
    #[must_use]
    pub const fn new(limit: u32, remaining: u32, reset_at: u64) -> Self {
        Self {
            limit,
            remaining,
            reset_at,
        }
    }

    /// Returns the maximum requests allowed in the current window.
    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Returns the remaining requests in the current window.
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Returns the Unix timestamp when the window resets.
    #[must_use]
    pub const fn reset_at(&self) -> u64 {
        self.reset_at
    }

    /// Returns true when at least `required` requests remain.
    #[must_use]
    pub const fn allows(&self, required: u32) -> bool {
        self.remaining >= required
    }

    /// Returns the reset instant as a UTC timestamp.
    #[must_use]
    pub fn reset_at_utc(&self) -> Option<DateTime<Utc>> {
        i64::try_from(self.reset_at)
            .ok()
            .and_then(|seconds| DateTime::from_timestamp(seconds, 0))
    }

    /// Formats the reset instant for messages, falling back to the raw
    /// timestamp when it is out of range.
    #[must_use]
    pub fn describe_reset(&self) -> String {
        self.reset_at_utc().map_or_else(
            || self.reset_at.to_string(),
            |instant| instant.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        )
    }

    /// Calculates seconds until the window resets, or 0 when it already has.
    #[must_use]
    pub fn seconds_until_reset(&self) -> u64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|duration| duration.as_secs())
            .unwrap_or(0);

        self.reset_at.saturating_sub(now)
    }
}
