//! Octocrab-backed implementation of [`PatchGateway`].

use async_trait::async_trait;
use octocrab::{Octocrab, Page};

use crate::github::error::GatewayError;
use crate::github::locator::{PersonalAccessToken, RepositoryLocator, contents_path};
use crate::github::models::{
    ApiChangedFile, ApiFileContents, ApiIssue, ApiPullRequest, ChangedFile, FileContents,
    HeadRepository, IssuePage, PullRequestHead,
};
use crate::github::pagination::{self, BATCH_SIZE, last_page_from_link};
use crate::github::rate_limit::RateLimitInfo;

use super::PatchGateway;
use super::client::build_octocrab_client;
use super::error_mapping::{is_rate_limit_error, map_octocrab_error};


/// Gateway bound to a single upstream repository.
pub struct OctocrabPatchGateway {
    client: Octocrab,
    locator: RepositoryLocator,
}

impl OctocrabPatchGateway {
    /// Creates a new gateway from an Octocrab client.
    #[must_use]
    pub const fn new(client: Octocrab, locator: RepositoryLocator) -> Self {
        Self { client, locator }
    }

    /// Builds an Octocrab client for the given token and repository locator.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::InvalidUrl` when the base URI cannot be parsed or
    /// `GatewayError::Api` when Octocrab fails to construct a client.
    pub fn for_token(
        token: &PersonalAccessToken,
        locator: RepositoryLocator,
    ) -> Result<Self, GatewayError> {
        let octocrab = build_octocrab_client(token, locator.api_base().as_str())?;
        Ok(Self::new(octocrab, locator))
    }

    async fn map_error_with_rate_limit(
        &self,
        operation: &str,
        error: &octocrab::Error,
    ) -> GatewayError {
        match error {
            octocrab::Error::GitHub { source, .. } if is_rate_limit_error(source) => {
                let rate_limit = self.rate_limit().await.ok();
                let base_message =
                    format!("{operation} failed: {message}", message = source.message);
                let message = match &rate_limit {
                    Some(info) => format!(
                        "{base_message} (resets at {reset})",
                        reset = info.describe_reset()
                    ),
                    None => base_message,
                };

                GatewayError::RateLimitExceeded {
                    rate_limit,
                    message,
                }
            }
            _ => map_octocrab_error(operation, error),
        }
    }
}

#[async_trait]
impl PatchGateway for OctocrabPatchGateway {
    async fn rate_limit(&self) -> Result<RateLimitInfo, GatewayError> {
        let core = self
            .client
            .ratelimit()
            .get()
            .await
            .map_err(|error| map_octocrab_error("fetch rate limit", &error))?
            .resources
            .core;

        Ok(RateLimitInfo::new(
            u32::try_from(core.limit).unwrap_or(u32::MAX),
            u32::try_from(core.remaining).unwrap_or(u32::MAX),
            core.reset,
        ))
    }

    async fn list_open_issues(&self, page: u32, per_page: u8) -> Result<IssuePage, GatewayError> {
        pagination::validate(page, per_page)?;

        let page_str = page.to_string();
        let per_page_str = per_page.to_string();
        let query_params = [
            ("state", "open"),
            ("page", page_str.as_str()),
            ("per_page", per_page_str.as_str()),
        ];

        let page_result: Page<ApiIssue> = match self
            .client
            .get(self.locator.issues_path(), Some(&query_params))
            .await
        {
            Ok(page_result) => page_result,
            Err(error) => {
                return Err(self.map_error_with_rate_limit("list issues", &error).await);
            }
        };

        let last_page = page_result
            .last
            .as_ref()
            .and_then(|link| last_page_from_link(&link.to_string(), per_page));

        Ok(IssuePage {
            items: page_result.items.into_iter().map(Into::into).collect(),
            last_page,
        })
    }

    async fn pull_request(&self, number: u64) -> Result<PullRequestHead, GatewayError> {
        match self
            .client
            .get::<ApiPullRequest, _, _>(self.locator.pull_request_path(number), None::<&()>)
            .await
        {
            Ok(pull) => Ok(pull.into()),
            Err(error) => Err(self.map_error_with_rate_limit("pull request", &error).await),
        }
    }

    async fn pull_request_files(&self, number: u64) -> Result<Vec<ChangedFile>, GatewayError> {
        let per_page = BATCH_SIZE.to_string();
        let query_params = [("per_page", per_page.as_str())];

        let first_page: Page<ApiChangedFile> = match self
            .client
            .get(
                self.locator.pull_request_files_path(number),
                Some(&query_params),
            )
            .await
        {
            Ok(page) => page,
            Err(error) => {
                return Err(self
                    .map_error_with_rate_limit("pull request files", &error)
                    .await);
            }
        };

        match self.client.all_pages(first_page).await {
            Ok(files) => Ok(files.into_iter().map(Into::into).collect()),
            Err(error) => Err(self
                .map_error_with_rate_limit("pull request files", &error)
                .await),
        }
    }

    async fn file_contents(
        &self,
        repository: &HeadRepository,
        path: &str,
        git_ref: &str,
    ) -> Result<FileContents, GatewayError> {
        let query_params = [("ref", git_ref)];
        let route = contents_path(&repository.owner, &repository.name, path);

        match self
            .client
            .get::<ApiFileContents, _, _>(route, Some(&query_params))
            .await
        {
            Ok(contents) => Ok(contents.into()),
            Err(error) => Err(self.map_error_with_rate_limit("file contents", &error).await),
        }
    }
}
