//! Wiremock stand-in for the GitHub REST API.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use patchtester::{OctocrabPatchGateway, PersonalAccessToken, RepositoryLocator};
use serde_json::{Value, json};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const OWNER: &str = "joomla";
pub const REPO: &str = "joomla-cms";
pub const FORK_OWNER: &str = "contributor";
pub const FORK_REPO: &str = "joomla-cms-fork";
pub const RESET_AT: u64 = 1_700_000_000;

const API_PREFIX: &str = "/api/v3";

/// A mock GitHub Enterprise host serving one upstream repository.
pub struct GithubMock {
    pub server: MockServer,
}

impl GithubMock {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Repository URL understood by `RepositoryLocator::parse`.
    pub fn repository_url(&self) -> String {
        format!("{}/{OWNER}/{REPO}", self.server.uri())
    }

    /// API base the locator derives for this host.
    pub fn api_base(&self) -> String {
        format!("{}{API_PREFIX}", self.server.uri())
    }

    pub fn gateway(&self) -> OctocrabPatchGateway {
        let locator =
            RepositoryLocator::parse(&self.repository_url()).expect("locator should parse");
        let token = PersonalAccessToken::new("test-token").expect("token should be valid");
        OctocrabPatchGateway::for_token(&token, locator).expect("gateway should build")
    }

    pub async fn mount_rate_limit(&self, remaining: u32) {
        let core = json!({
            "limit": 5000,
            "used": 5000 - remaining,
            "remaining": remaining,
            "reset": RESET_AT
        });
        Mock::given(method("GET"))
            .and(path(format!("{API_PREFIX}/rate_limit")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "resources": { "core": core.clone(), "search": core.clone() },
                "rate": core
            })))
            .mount(&self.server)
            .await;
    }

    /// Serves `issues` for `page` of the open-issue listing.
    pub async fn mount_issue_page(&self, page: u32, issues: Value) {
        Mock::given(method("GET"))
            .and(path(format!("{API_PREFIX}/repos/{OWNER}/{REPO}/issues")))
            .and(query_param("state", "open"))
            .and(query_param("page", page.to_string()))
            .and(query_param("per_page", "100"))
            .respond_with(ResponseTemplate::new(200).set_body_json(issues))
            .mount(&self.server)
            .await;
    }

    /// Serves the head of pull `number`; `fork_exists` false models a
    /// deleted fork.
    pub async fn mount_pull(&self, number: u64, head_sha: &str, fork_exists: bool) {
        let repo = fork_exists.then(|| {
            json!({
                "name": FORK_REPO,
                "owner": { "login": FORK_OWNER }
            })
        });
        Mock::given(method("GET"))
            .and(path(format!(
                "{API_PREFIX}/repos/{OWNER}/{REPO}/pulls/{number}"
            )))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "number": number,
                "head": { "ref": "feature", "sha": head_sha, "repo": repo }
            })))
            .mount(&self.server)
            .await;
    }

    /// Serves the changed-file listing of pull `number` as a single page.
    pub async fn mount_files(&self, number: u64, files: Value) {
        Mock::given(method("GET"))
            .and(path(format!(
                "{API_PREFIX}/repos/{OWNER}/{REPO}/pulls/{number}/files"
            )))
            .respond_with(ResponseTemplate::new(200).set_body_json(files))
            .mount(&self.server)
            .await;
    }

    /// Serves `body` for `repo_path` in the fork at the `feature` branch.
    pub async fn mount_contents(&self, repo_path: &str, body: &[u8]) {
        Mock::given(method("GET"))
            .and(path(format!(
                "{API_PREFIX}/repos/{FORK_OWNER}/{FORK_REPO}/contents/{repo_path}"
            )))
            .and(query_param("ref", "feature"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "encoding": "base64",
                "content": wrap(&STANDARD.encode(body))
            })))
            .mount(&self.server)
            .await;
    }
}

/// Issue JSON for a pull request.
pub fn pull_issue(number: u64, title: &str, labels: &[&str]) -> Value {
    json!({
        "number": number,
        "title": title,
        "body": format!("Testing instructions for #{number}"),
        "labels": labels.iter().map(|name| json!({ "name": name })).collect::<Vec<_>>(),
        "pull_request": {
            "html_url": format!("https://github.com/{OWNER}/{REPO}/pull/{number}")
        }
    })
}

/// Issue JSON for a plain issue.
pub fn plain_issue(number: u64) -> Value {
    json!({ "number": number, "title": "Question", "labels": [] })
}

/// Changed-file JSON.
pub fn changed_file(filename: &str, status: &str, previous: Option<&str>) -> Value {
    json!({
        "filename": filename,
        "status": status,
        "previous_filename": previous,
        "contents_url": format!(
            "https://api.github.com/repos/{FORK_OWNER}/{FORK_REPO}/contents/{filename}"
        )
    })
}

/// Breaks base64 into 60-character lines the way the contents API does.
fn wrap(encoded: &str) -> String {
    encoded
        .as_bytes()
        .chunks(60)
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .collect::<Vec<_>>()
        .join("\n")
}
