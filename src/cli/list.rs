//! Listing the mirrored pull requests.

use std::io;

use patchtester::patch::map_persistence_read_error;
use patchtester::persistence::{PullFilter, PullOrdering, SearchTerm, SortDirection};
use patchtester::{PatchTesterConfig, PullRepository};

use super::CliError;
use super::context::Registries;
use super::output::write_pull_listing;

/// Builds the listing filter from `--search` and `--branch`.
#[must_use]
pub fn listing_filter(config: &PatchTesterConfig) -> PullFilter {
    PullFilter {
        search: config.search.as_deref().and_then(SearchTerm::parse),
        branch: config
            .branch
            .as_deref()
            .map(str::trim)
            .filter(|branch| !branch.is_empty())
            .map(str::to_owned),
        ordering: PullOrdering::PullId,
        direction: SortDirection::Descending,
        ..PullFilter::default()
    }
}

/// Prints pull requests matching the configured filters.
///
/// # Errors
///
/// Returns a database error when the registry cannot be read.
pub fn run(config: &PatchTesterConfig) -> Result<(), CliError> {
    let registries = Registries::open(config)?;
    let filter = listing_filter(config);

    let pulls = registries
        .pulls
        .list(&filter)
        .map_err(|error| map_persistence_read_error("list pull requests", &error))?;
    let total = registries
        .pulls
        .count(&filter)
        .map_err(|error| map_persistence_read_error("count pull requests", &error))?;

    write_pull_listing(&mut io::stdout().lock(), &pulls, total)
}

#[cfg(test)]
mod tests {
    use patchtester::PatchTesterConfig;
    use patchtester::persistence::SearchTerm;

    use super::listing_filter;

    #[test]
    fn listing_filter_parses_search_and_ignores_blank_branch() {
        let config = PatchTesterConfig {
            search: Some("id:12".to_owned()),
            branch: Some("  ".to_owned()),
            ..Default::default()
        };

        let filter = listing_filter(&config);

        assert_eq!(filter.search, Some(SearchTerm::PullId(12)));
        assert_eq!(filter.branch, None);
    }

    #[test]
    fn listing_filter_keeps_branch() {
        let config = PatchTesterConfig {
            branch: Some("4.0-dev".to_owned()),
            ..Default::default()
        };

        assert_eq!(listing_filter(&config).branch.as_deref(), Some("4.0-dev"));
    }
}
