//! Repository identity wrappers and API path construction.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use url::Url;

use super::error::GatewayError;

/// Repository owner wrapper to avoid stringly typed parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryOwner(String);

impl RepositoryOwner {
    /// Validates that the owner is non-empty.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::MissingRepository` when the value is blank.
    pub fn new(value: &str) -> Result<Self, GatewayError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(GatewayError::MissingRepository);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the owner value.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Repository name wrapper to prevent parameter mix-ups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryName(String);

impl RepositoryName {
    /// Validates that the repository name is non-empty.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::MissingRepository` when the value is blank.
    pub fn new(value: &str) -> Result<Self, GatewayError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(GatewayError::MissingRepository);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the repository name.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Personal access token wrapper enforcing presence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonalAccessToken(String);

impl PersonalAccessToken {
    /// Validates that the token is non-empty and trims whitespace.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::MissingToken` when the supplied string is blank.
    pub fn new(token: impl AsRef<str>) -> Result<Self, GatewayError> {
        let trimmed = token.as_ref().trim();
        if trimmed.is_empty() {
            return Err(GatewayError::MissingToken);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the token value.
    #[must_use]
    pub const fn value(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for PersonalAccessToken {
    fn as_ref(&self) -> &str {
        self.value()
    }
}

const PUBLIC_API_BASE: &str = "https://api.github.com";

/// Derives the GitHub API base URL from a web URL.
///
/// `github.com` maps to the public API; any other host is treated as GitHub
/// Enterprise and served from `/api/v3` on the same authority.
fn derive_api_base(parsed: &Url) -> Result<Url, GatewayError> {
    let host = parsed
        .host_str()
        .ok_or_else(|| GatewayError::InvalidUrl("URL must include a host".to_owned()))?;

    if host.eq_ignore_ascii_case("github.com") {
        return Url::parse(PUBLIC_API_BASE)
            .map_err(|error| GatewayError::InvalidUrl(error.to_string()));
    }

    let mut api_url = parsed.clone();
    api_url.set_path("api/v3");
    api_url.set_query(None);
    api_url.set_fragment(None);
    Ok(api_url)
}

/// The upstream repository whose pull requests are tested.
///
/// # Example
///
/// ```
/// use patchtester::github::RepositoryLocator;
///
/// let locator = RepositoryLocator::parse("https://github.com/joomla/joomla-cms")
///     .expect("should parse repository URL");
/// assert_eq!(locator.owner().as_str(), "joomla");
/// assert_eq!(locator.repository().as_str(), "joomla-cms");
/// assert_eq!(locator.api_base().as_str(), "https://api.github.com/");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryLocator {
    api_base: Url,
    owner: RepositoryOwner,
    repository: RepositoryName,
}

impl RepositoryLocator {
    /// Creates a locator for `owner/repo` on the public GitHub API.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::MissingRepository` when owner or repo is blank.
    pub fn from_owner_repo(owner: &str, repo: &str) -> Result<Self, GatewayError> {
        let api_base = Url::parse(PUBLIC_API_BASE)
            .map_err(|error| GatewayError::InvalidUrl(error.to_string()))?;
        Ok(Self {
            api_base,
            owner: RepositoryOwner::new(owner)?,
            repository: RepositoryName::new(repo)?,
        })
    }

    /// Parses a repository web URL in the form `https://<host>/<owner>/<repo>`.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::InvalidUrl` when parsing fails or
    /// `MissingRepository` when the path lacks an owner and name.
    pub fn parse(input: &str) -> Result<Self, GatewayError> {
        let parsed =
            Url::parse(input).map_err(|error| GatewayError::InvalidUrl(error.to_string()))?;

        let mut segments = parsed
            .path_segments()
            .ok_or(GatewayError::MissingRepository)?;
        let owner = RepositoryOwner::new(segments.next().unwrap_or_default())?;
        let repository = RepositoryName::new(
            segments
                .next()
                .unwrap_or_default()
                .trim_end_matches(".git"),
        )?;

        Ok(Self {
            api_base: derive_api_base(&parsed)?,
            owner,
            repository,
        })
    }

    /// Replaces the API base, for GitHub Enterprise or test servers.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::InvalidUrl` when `api_base` is not a URL.
    pub fn with_api_base(mut self, api_base: &str) -> Result<Self, GatewayError> {
        self.api_base =
            Url::parse(api_base).map_err(|error| GatewayError::InvalidUrl(error.to_string()))?;
        Ok(self)
    }

    /// API base URL.
    #[must_use]
    pub const fn api_base(&self) -> &Url {
        &self.api_base
    }

    /// Repository owner.
    #[must_use]
    pub const fn owner(&self) -> &RepositoryOwner {
        &self.owner
    }

    /// Repository name.
    #[must_use]
    pub const fn repository(&self) -> &RepositoryName {
        &self.repository
    }

    pub(crate) fn issues_path(&self) -> String {
        format!(
            "/repos/{}/{}/issues",
            self.owner.as_str(),
            self.repository.as_str()
        )
    }

    pub(crate) fn pull_request_path(&self, number: u64) -> String {
        format!(
            "/repos/{}/{}/pulls/{number}",
            self.owner.as_str(),
            self.repository.as_str()
        )
    }

    pub(crate) fn pull_request_files_path(&self, number: u64) -> String {
        format!("{}/files", self.pull_request_path(number))
    }
}

/// Characters left as-is in a path segment: RFC 3986 unreserved.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Builds the contents API path for `path` inside `owner/repo`.
///
/// Each path segment is percent-encoded so that spaces and reserved
/// characters in file names survive the request.
pub(crate) fn contents_path(owner: &str, repo: &str, path: &str) -> String {
    let mut route = format!("/repos/{owner}/{repo}/contents");
    for segment in path.split('/').filter(|segment| !segment.is_empty()) {
        route.push('/');
        route.extend(utf8_percent_encode(segment, PATH_SEGMENT));
    }
    route
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{PersonalAccessToken, RepositoryLocator, contents_path};
    use crate::github::error::GatewayError;

    #[rstest]
    #[case::public("https://github.com/octo/site", "https://api.github.com/")]
    #[case::git_suffix("https://github.com/octo/site.git", "https://api.github.com/")]
    #[case::enterprise("https://ghe.example.com/octo/site", "https://ghe.example.com/api/v3")]
    #[case::enterprise_port(
        "http://127.0.0.1:8080/octo/site",
        "http://127.0.0.1:8080/api/v3"
    )]
    fn parse_derives_api_base(#[case] input: &str, #[case] expected: &str) {
        let locator = RepositoryLocator::parse(input).expect("URL should parse");

        assert_eq!(locator.api_base().as_str(), expected);
        assert_eq!(locator.owner().as_str(), "octo");
        assert_eq!(locator.repository().as_str(), "site");
    }

    #[rstest]
    #[case::no_repo("https://github.com/octo")]
    #[case::no_path("https://github.com/")]
    fn parse_requires_owner_and_repo(#[case] input: &str) {
        let error = RepositoryLocator::parse(input).expect_err("URL should be rejected");
        assert_eq!(error, GatewayError::MissingRepository);
    }

    #[test]
    fn from_owner_repo_rejects_blank_values() {
        let error = RepositoryLocator::from_owner_repo("octo", " ")
            .expect_err("blank repo should be rejected");
        assert_eq!(error, GatewayError::MissingRepository);
    }

    #[test]
    fn api_paths_include_owner_repo_and_number() {
        let locator =
            RepositoryLocator::from_owner_repo("octo", "site").expect("locator should build");

        assert_eq!(locator.issues_path(), "/repos/octo/site/issues");
        assert_eq!(locator.pull_request_path(7), "/repos/octo/site/pulls/7");
        assert_eq!(
            locator.pull_request_files_path(7),
            "/repos/octo/site/pulls/7/files"
        );
    }

    #[rstest]
    #[case::reserved("media/my file+1.js", "/repos/fork/site/contents/media/my%20file%2B1.js")]
    #[case::unreserved_kept("lib/a-b_c~d.v2.php", "/repos/fork/site/contents/lib/a-b_c~d.v2.php")]
    #[case::multibyte("docs/naïve.txt", "/repos/fork/site/contents/docs/na%C3%AFve.txt")]
    #[case::empty_segments("/media//x.js", "/repos/fork/site/contents/media/x.js")]
    fn contents_path_encodes_each_segment(#[case] path: &str, #[case] expected: &str) {
        assert_eq!(contents_path("fork", "site", path), expected);
    }

    #[test]
    fn blank_token_is_rejected() {
        let error = PersonalAccessToken::new("   ").expect_err("blank token should fail");
        assert_eq!(error, GatewayError::MissingToken);
    }
}
