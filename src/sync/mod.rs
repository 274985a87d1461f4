//! Mirrors the upstream repository's open pull requests into the registry.
//!
//! Synchronisation is cooperative: the caller asks for one page at a time
//! until [`SyncStatus::Complete`] comes back. Page 1 starts a fresh mirror.

use tracing::{debug, info};

use crate::github::{IssueSummary, PatchGateway, pagination::BATCH_SIZE};
use crate::patch::{
    PatchError, map_gateway_error, map_persistence_error, map_persistence_read_error,
    require_quota,
};
use crate::persistence::{NewPull, PullRepository, TestRepository};


/// Requests that must remain before a page is fetched.
pub const MIN_REMAINING_FOR_SYNC: u32 = 10;

/// Maximum stored title length, in characters.
pub const TITLE_LIMIT: usize = 150;

/// Maximum stored description length, in characters.
pub const DESCRIPTION_LIMIT: usize = 100;

const ELLIPSIS: &str = "...";

/// Outcome of synchronising one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    /// No further pull requests exist.
    Complete,
    /// More pages may exist.
    Continue {
        /// Page to request next.
        next_page: u32,
        /// Last page as announced by GitHub on page 1.
        last_page: Option<u32>,
    },
}

/// Label conventions used to classify pull requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSettings {
    /// Label marking a pull request as ready to commit.
    pub fast_track_label: String,
    /// Prefix of labels naming the target branch.
    pub branch_label_prefix: String,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            fast_track_label: "RTC".to_owned(),
            branch_label_prefix: "PR-".to_owned(),
        }
    }
}

/// Drives paginated ingestion of open pull requests.
pub struct PullListSynchronizer<'deps> {
    gateway: &'deps dyn PatchGateway,
    pulls: &'deps dyn PullRepository,
    tests: &'deps dyn TestRepository,
    settings: SyncSettings,
    last_page: Option<u32>,
}

impl<'deps> PullListSynchronizer<'deps> {
    /// Creates a synchroniser with no remembered page count.
    #[must_use]
    pub const fn new(
        gateway: &'deps dyn PatchGateway,
        pulls: &'deps dyn PullRepository,
        tests: &'deps dyn TestRepository,
        settings: SyncSettings,
    ) -> Self {
        Self {
            gateway,
            pulls,
            tests,
            settings,
            last_page: None,
        }
    }

    /// Last page remembered from page 1, if it has been fetched.
    #[must_use]
    pub const fn last_page(&self) -> Option<u32> {
        self.last_page
    }

    /// Fetches and stores one page of open pull requests.
    ///
    /// Page 1 refuses to run while applied tests exist, then clears the
    /// registry before inserting.
    ///
    /// # Errors
    ///
    /// Returns `RateLimitExceeded` when fewer than
    /// [`MIN_REMAINING_FOR_SYNC`] requests remain, `AppliedPatchesPresent`
    /// on page 1 with applied tests, `RemoteUnavailable` for GitHub failures,
    /// and `DatabaseIo` when the registry cannot be written. Pages already
    /// stored are kept.
    pub async fn sync(&mut self, page: u32) -> Result<SyncStatus, PatchError> {
        require_quota(self.gateway, MIN_REMAINING_FOR_SYNC).await?;

        if page == 1 {
            self.start_fresh()?;
        }

        let batch = self
            .gateway
            .list_open_issues(page, BATCH_SIZE)
            .await
            .map_err(|error| map_gateway_error(&error))?;

        if page == 1 {
            self.last_page = Some(batch.last_page.unwrap_or(1));
        }

        let rows: Vec<NewPull> = batch
            .items
            .iter()
            .filter(|issue| issue.is_pull_request)
            .map(|issue| self.to_new_pull(issue))
            .collect();

        if rows.is_empty() {
            info!(page, "pull request synchronisation complete");
            return Ok(SyncStatus::Complete);
        }

        let inserted = self
            .pulls
            .insert_batch(&rows)
            .map_err(|error| map_persistence_error("store pull requests", &error))?;
        debug!(page, inserted, last_page = ?self.last_page, "pull request page stored");

        Ok(SyncStatus::Continue {
            next_page: page.saturating_add(1),
            last_page: self.last_page,
        })
    }

    /// Synchronises every page, reporting progress after each one.
    ///
    /// Returns the number of pages requested, including the final one.
    ///
    /// # Errors
    ///
    /// Propagates the first failure from [`Self::sync`].
    pub async fn sync_all<F>(&mut self, mut on_page: F) -> Result<u32, PatchError>
    where
        F: FnMut(u32, Option<u32>) + Send,
    {
        let mut page = 1;
        loop {
            match self.sync(page).await? {
                SyncStatus::Complete => return Ok(page),
                SyncStatus::Continue {
                    next_page,
                    last_page,
                } => {
                    on_page(page, last_page);
                    page = next_page;
                }
            }
        }
    }

    fn start_fresh(&self) -> Result<(), PatchError> {
        let applied = self
            .tests
            .list_applied()
            .map_err(|error| map_persistence_read_error("check applied tests", &error))?;
        if !applied.is_empty() {
            return Err(PatchError::AppliedPatchesPresent {
                count: applied.len(),
            });
        }

        self.pulls
            .truncate()
            .map_err(|error| map_persistence_error("clear pull requests", &error))
    }

    fn to_new_pull(&self, issue: &IssueSummary) -> NewPull {
        let (is_fast_track, branch) = classify_labels(&issue.labels, &self.settings);
        NewPull {
            pull_id: issue.number,
            title: truncate(&issue.title, TITLE_LIMIT),
            description: truncate(issue.body.as_deref().unwrap_or_default(), DESCRIPTION_LIMIT),
            pull_url: issue.pull_request_url.clone().unwrap_or_default(),
            is_fast_track,
            branch,
        }
    }
}

/// Reads the fast-track flag and the target branch from issue labels.
///
/// When several labels carry the branch prefix the last one wins. The
/// fast-track label is never read as a branch, even if it has the prefix.
#[must_use]
pub fn classify_labels(labels: &[String], settings: &SyncSettings) -> (bool, String) {
    let mut is_fast_track = false;
    let mut branch = "";
    for label in labels {
        if *label == settings.fast_track_label {
            is_fast_track = true;
        } else if let Some(name) = label.strip_prefix(settings.branch_label_prefix.as_str()) {
            branch = name;
        }
    }
    (is_fast_track, branch.to_owned())
}

/// Shortens `text` to at most `limit` characters, ending in `...` when cut.
///
/// The cut backs up to the previous word boundary; a single word longer than
/// the limit is split.
#[must_use]
pub fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_owned();
    }

    let keep = limit.saturating_sub(ELLIPSIS.len());
    let mut rest = text.chars();
    let mut shortened: String = rest.by_ref().take(keep).collect();
    let splits_word = rest.next().is_some_and(|next| !next.is_whitespace());
    if splits_word && let Some(boundary) = shortened.rfind(char::is_whitespace) {
        shortened.truncate(boundary);
    }
    shortened.truncate(shortened.trim_end().len());
    shortened.push_str(ELLIPSIS);
    shortened
}
