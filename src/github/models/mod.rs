//! Data models for the GitHub resources the patch tester reads.
//!
//! Types prefixed with `Api` are internal deserialisation targets that
//! convert into the public domain types.

use serde::Deserialize;

/// An open issue, which may or may not be a pull request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueSummary {
    /// Issue number (shared with the pull request number).
    pub number: u64,
    /// Issue title.
    pub title: String,
    /// Issue body, if any.
    pub body: Option<String>,
    /// Names of the attached labels, in API order.
    pub labels: Vec<String>,
    /// Whether the issue is backed by a pull request.
    pub is_pull_request: bool,
    /// Web URL of the pull request, when the issue is one.
    pub pull_request_url: Option<String>,
}

/// One page of open issues.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssuePage {
    /// Issues on this page.
    pub items: Vec<IssueSummary>,
    /// Last page number from the `rel="last"` link, when present and valid.
    pub last_page: Option<u32>,
}

/// Repository that holds a pull request's head branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadRepository {
    /// Owner login of the fork (or upstream) repository.
    pub owner: String,
    /// Repository name.
    pub name: String,
}

/// The head of a pull request, which file contents are fetched from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestHead {
    /// Pull request number.
    pub number: u64,
    /// Branch name on the head repository.
    pub head_ref: String,
    /// Head commit SHA.
    pub head_sha: String,
    /// Head repository; `None` once the fork has been deleted.
    pub repository: Option<HeadRepository>,
}

/// A file touched by a pull request, as listed by GitHub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedFile {
    /// Repository-relative path after the change.
    pub filename: String,
    /// GitHub change status (`added`, `modified`, `removed`, `renamed`, ...).
    pub status: String,
    /// Path before a rename.
    pub previous_filename: Option<String>,
    /// API URL for the file contents at the head commit.
    pub contents_url: String,
}

/// A file blob returned by the contents API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileContents {
    /// Transfer encoding of `content`; only `base64` is expected.
    pub encoding: String,
    /// Encoded file body.
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiIssue {
    pub(super) number: u64,
    pub(super) title: Option<String>,
    pub(super) body: Option<String>,
    #[serde(default)]
    pub(super) labels: Vec<ApiLabel>,
    pub(super) pull_request: Option<ApiIssuePullRequest>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiLabel {
    pub(super) name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiIssuePullRequest {
    pub(super) html_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiPullRequest {
    pub(super) number: u64,
    pub(super) head: ApiPullRequestHead,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiPullRequestHead {
    #[serde(rename = "ref")]
    pub(super) git_ref: String,
    pub(super) sha: String,
    pub(super) repo: Option<ApiRepository>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiRepository {
    pub(super) name: String,
    pub(super) owner: ApiUser,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiUser {
    pub(super) login: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiChangedFile {
    pub(super) filename: String,
    pub(super) status: String,
    pub(super) previous_filename: Option<String>,
    #[serde(default)]
    pub(super) contents_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiFileContents {
    #[serde(default)]
    pub(super) encoding: String,
    #[serde(default)]
    pub(super) content: String,
}

impl From<ApiIssue> for IssueSummary {
    fn from(value: ApiIssue) -> Self {
        Self {
            number: value.number,
            title: value.title.unwrap_or_default(),
            body: value.body,
            labels: value.labels.into_iter().map(|label| label.name).collect(),
            is_pull_request: value.pull_request.is_some(),
            pull_request_url: value.pull_request.and_then(|pull| pull.html_url),
        }
    }
}

impl From<ApiPullRequest> for PullRequestHead {
    fn from(value: ApiPullRequest) -> Self {
        Self {
            number: value.number,
            head_ref: value.head.git_ref,
            head_sha: value.head.sha,
            repository: value.head.repo.map(|repo| HeadRepository {
                owner: repo.owner.login,
                name: repo.name,
            }),
        }
    }
}

impl From<ApiChangedFile> for ChangedFile {
    fn from(value: ApiChangedFile) -> Self {
        Self {
            filename: value.filename,
            status: value.status,
            previous_filename: value.previous_filename,
            contents_url: value.contents_url,
        }
    }
}

impl From<ApiFileContents> for FileContents {
    fn from(value: ApiFileContents) -> Self {
        Self {
            encoding: value.encoding,
            content: value.content,
        }
    }
}
