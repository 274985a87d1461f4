//! GitHub access for the patch tester.
//!
//! This module wraps Octocrab behind the [`PatchGateway`] trait: rate limit
//! checks, paginated open-issue listing, pull request heads, changed files,
//! and raw file contents. Errors are mapped into [`GatewayError`] so callers
//! never see Octocrab internals.

pub mod error;
pub mod gateway;
pub mod locator;
pub mod models;
pub mod pagination;
pub mod rate_limit;

pub use error::GatewayError;
pub use gateway::{OctocrabPatchGateway, PatchGateway};
pub use locator::{PersonalAccessToken, RepositoryLocator, RepositoryName, RepositoryOwner};
pub use models::{
    ChangedFile, FileContents, HeadRepository, IssuePage, IssueSummary, PullRequestHead,
};
pub use rate_limit::RateLimitInfo;

#[cfg(test)]
pub use gateway::MockPatchGateway;
