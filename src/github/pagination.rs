//! Pagination helpers for GitHub list endpoints.

use url::Url;

/// Page size used for every list request.
pub const BATCH_SIZE: u8 = 100;

/// Extracts the page number from a `rel="last"` link.
///
/// The link is only trusted when its `per_page` matches the size that was
/// requested; anything else means the hint describes a different paging and
/// is ignored.
///
/// # Example
///
/// ```
/// use patchtester::github::pagination::last_page_from_link;
///
/// let link = "https://api.github.com/repos/o/r/issues?state=open&page=4&per_page=100";
/// assert_eq!(last_page_from_link(link, 100), Some(4));
/// assert_eq!(last_page_from_link(link, 30), None);
/// ```
#[must_use]
pub fn last_page_from_link(link: &str, per_page: u8) -> Option<u32> {
    let url = Url::parse(link).ok()?;
    let mut page = None;
    let mut matches_size = false;

    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "page" => page = value.parse::<u32>().ok(),
            "per_page" => matches_size = value.parse::<u8>().ok() == Some(per_page),
            _ => {}
        }
    }

    page.filter(|_| matches_size)
}

/// Rejects page numbers and sizes GitHub would refuse.
pub(crate) fn validate(page: u32, per_page: u8) -> Result<(), super::GatewayError> {
    if page == 0 {
        return Err(super::GatewayError::InvalidPagination {
            message: "page must be at least 1".to_owned(),
        });
    }

    if per_page == 0 || per_page > BATCH_SIZE {
        return Err(super::GatewayError::InvalidPagination {
            message: format!("per_page must be between 1 and {BATCH_SIZE}"),
        });
    }

    Ok(())
}
