//! Gateway for the GitHub calls the patch tester makes.
//!
//! The trait keeps the synchroniser and the patch engine independent of
//! Octocrab so they can be exercised against mocks, while
//! [`OctocrabPatchGateway`] performs the real HTTP requests.

mod client;
mod error_mapping;
mod remote;

pub use remote::OctocrabPatchGateway;

use async_trait::async_trait;

use crate::github::error::GatewayError;
use crate::github::models::{
    ChangedFile, FileContents, HeadRepository, IssuePage, PullRequestHead,
};
use crate::github::rate_limit::RateLimitInfo;

/// Remote operations against the configured upstream repository.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PatchGateway: Send + Sync {
    /// Fetch the core API quota.
    async fn rate_limit(&self) -> Result<RateLimitInfo, GatewayError>;

    /// List one page of open issues, pull requests included.
    async fn list_open_issues(&self, page: u32, per_page: u8) -> Result<IssuePage, GatewayError>;

    /// Fetch the head of a pull request.
    async fn pull_request(&self, number: u64) -> Result<PullRequestHead, GatewayError>;

    /// List every file a pull request touches, across all pages.
    async fn pull_request_files(&self, number: u64) -> Result<Vec<ChangedFile>, GatewayError>;

    /// Fetch a file from `repository` at `git_ref`.
    async fn file_contents(
        &self,
        repository: &HeadRepository,
        path: &str,
        git_ref: &str,
    ) -> Result<FileContents, GatewayError>;
}
