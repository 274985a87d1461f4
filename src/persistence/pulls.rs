//! Registry of open pull requests mirrored from GitHub.
//!
//! The synchroniser refreshes this table wholesale; the patch engine only
//! touches the `sha` column, which records the head commit of the currently
//! applied test for a pull request.

use diesel::Connection;
use diesel::OptionalExtension;
use diesel::QueryableByName;
use diesel::RunQueryDsl;
use diesel::query_builder::{BoxedSqlQuery, SqlQuery};
use diesel::sql_query;
use diesel::sql_types::{BigInt, Bool, Nullable, Text};
use diesel::sqlite::Sqlite;

use super::PersistenceError;
use super::connection::{DatabaseUrl, id_from_i64, id_to_i64, map_query_error, map_write_error};

const PULLS_TABLE: &str = "pulls";

/// A pull request row as stored in the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRecord {
    /// GitHub pull request number.
    pub pull_id: u64,
    /// Title, truncated for storage.
    pub title: String,
    /// Description, truncated for storage.
    pub description: String,
    /// HTML URL of the pull request.
    pub pull_url: String,
    /// Whether the pull request carries the fast-track label.
    pub is_fast_track: bool,
    /// Target branch taken from the branch label, possibly empty.
    pub branch: String,
    /// Head commit of the applied test, empty when nothing is applied.
    pub applied_sha: String,
    /// Identifier of the applied test referencing this pull, if any.
    pub applied_test_id: Option<u64>,
}

impl PullRecord {
    /// Returns true when a test for this pull request is currently applied.
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        self.applied_test_id.is_some()
    }
}

/// Data required to insert a pull request row during synchronisation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPull {
    /// GitHub pull request number.
    pub pull_id: u64,
    /// Title, already truncated.
    pub title: String,
    /// Description, already truncated.
    pub description: String,
    /// HTML URL of the pull request.
    pub pull_url: String,
    /// Whether the pull request carries the fast-track label.
    pub is_fast_track: bool,
    /// Target branch taken from the branch label, possibly empty.
    pub branch: String,
}

/// Column used to order pull listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PullOrdering {
    /// Order by pull request number.
    #[default]
    PullId,
    /// Order by title.
    Title,
    /// Order by applied state, then by pull request number.
    Applied,
}

/// Sort direction for pull listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    /// Ascending order.
    Ascending,
    /// Descending order.
    #[default]
    Descending,
}

impl SortDirection {
    const fn as_sql(self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

/// Parsed search input for pull listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchTerm {
    /// Exact pull request number, from `id:<n>` or a bare number.
    PullId(u64),
    /// Case-insensitive title substring.
    Title(String),
}

impl SearchTerm {
    /// Interprets free-form search input.
    ///
    /// `id:42` and `42` both select pull request 42; anything else is matched
    /// against titles. Blank input yields `None`.
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return None;
        }

        let id_candidate = trimmed
            .get(..3)
            .filter(|prefix| prefix.eq_ignore_ascii_case("id:"))
            .and_then(|_| trimmed.get(3..))
            .unwrap_or(trimmed);

        id_candidate.trim().parse::<u64>().map_or_else(
            |_| Some(Self::Title(trimmed.to_owned())),
            |pull_id| Some(Self::PullId(pull_id)),
        )
    }
}

/// Filters, ordering, and paging for pull listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullFilter {
    /// Optional search term.
    pub search: Option<SearchTerm>,
    /// Restrict to applied (`Some(true)`) or unapplied (`Some(false)`) pulls.
    pub applied: Option<bool>,
    /// Restrict to a target branch.
    pub branch: Option<String>,
    /// Restrict to fast-tracked (`Some(true)`) or other pulls.
    pub fast_track: Option<bool>,
    /// Ordering column.
    pub ordering: PullOrdering,
    /// Ordering direction.
    pub direction: SortDirection,
    /// Maximum number of rows to return.
    pub limit: Option<u32>,
    /// Number of rows to skip.
    pub offset: u32,
}

/// Storage for mirrored pull requests.
pub trait PullRepository: Send + Sync {
    /// Removes every pull request row.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the delete fails.
    fn truncate(&self) -> Result<(), PersistenceError>;

    /// Inserts or refreshes a batch of pull requests, returning the number of
    /// rows written.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when any row fails; the batch is written
    /// in a single transaction.
    fn insert_batch(&self, pulls: &[NewPull]) -> Result<usize, PersistenceError>;

    /// Loads a single pull request.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the query fails.
    fn find(&self, pull_id: u64) -> Result<Option<PullRecord>, PersistenceError>;

    /// Records the head commit of the applied test for a pull request.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the update fails.
    fn set_applied_sha(&self, pull_id: u64, sha: &str) -> Result<(), PersistenceError>;

    /// Clears the applied commit for a pull request.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the update fails.
    fn clear_applied_sha(&self, pull_id: u64) -> Result<(), PersistenceError> {
        self.set_applied_sha(pull_id, "")
    }

    /// Lists pull requests matching the filter.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the query fails.
    fn list(&self, filter: &PullFilter) -> Result<Vec<PullRecord>, PersistenceError>;

    /// Counts pull requests matching the filter, ignoring paging.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the query fails.
    fn count(&self, filter: &PullFilter) -> Result<u64, PersistenceError>;

    /// Lists the distinct non-empty branches in ascending order.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the query fails.
    fn branches(&self) -> Result<Vec<String>, PersistenceError>;
}

/// SQLite-backed pull request registry.
#[derive(Debug, Clone)]
pub struct SqlitePullRepository {
    database_url: DatabaseUrl,
}

impl SqlitePullRepository {
    /// Creates a registry targeting the configured `database_url`.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::BlankDatabaseUrl`] when the URL is blank.
    pub fn new(database_url: impl Into<String>) -> Result<Self, PersistenceError> {
        Ok(Self {
            database_url: DatabaseUrl::new(database_url)?,
        })
    }
}

#[derive(Debug, QueryableByName)]
struct PullRow {
    #[diesel(sql_type = BigInt)]
    pull_id: i64,
    #[diesel(sql_type = Text)]
    title: String,
    #[diesel(sql_type = Text)]
    description: String,
    #[diesel(sql_type = Text)]
    pull_url: String,
    #[diesel(sql_type = Bool)]
    is_rtc: bool,
    #[diesel(sql_type = Text)]
    branch: String,
    #[diesel(sql_type = Text)]
    sha: String,
    #[diesel(sql_type = Nullable<BigInt>)]
    applied_test_id: Option<i64>,
}

impl From<PullRow> for PullRecord {
    fn from(row: PullRow) -> Self {
        Self {
            pull_id: id_from_i64(row.pull_id),
            title: row.title,
            description: row.description,
            pull_url: row.pull_url,
            is_fast_track: row.is_rtc,
            branch: row.branch,
            applied_sha: row.sha,
            applied_test_id: row.applied_test_id.map(id_from_i64),
        }
    }
}

const SELECT_PULLS: &str = "SELECT a.pull_id, a.title, a.description, a.pull_url, a.is_rtc, \
     a.branch, a.sha, t.id AS applied_test_id \
     FROM pulls AS a LEFT JOIN tests AS t ON t.pull_id = a.pull_id WHERE 1 = 1";

const COUNT_PULLS: &str = "SELECT COUNT(*) AS count \
     FROM pulls AS a LEFT JOIN tests AS t ON t.pull_id = a.pull_id WHERE 1 = 1";

type BoxedQuery<'f> = BoxedSqlQuery<'f, Sqlite, SqlQuery>;

fn apply_filters<'f>(query: BoxedQuery<'f>, filter: &PullFilter) -> BoxedQuery<'f> {
    let mut filtered = match &filter.search {
        Some(SearchTerm::PullId(pull_id)) => query
            .sql(" AND a.pull_id = ?")
            .bind::<BigInt, _>(id_to_i64(*pull_id)),
        Some(SearchTerm::Title(title)) => query
            .sql(" AND a.title LIKE ? ESCAPE '\\'")
            .bind::<Text, _>(like_pattern(title)),
        None => query,
    };

    filtered = match filter.applied {
        Some(true) => filtered.sql(" AND t.id IS NOT NULL"),
        Some(false) => filtered.sql(" AND t.id IS NULL"),
        None => filtered,
    };

    if let Some(branch) = &filter.branch {
        filtered = filtered
            .sql(" AND a.branch = ?")
            .bind::<Text, _>(branch.clone());
    }

    match filter.fast_track {
        Some(fast_track) => filtered
            .sql(" AND a.is_rtc = ?")
            .bind::<Bool, _>(fast_track),
        None => filtered,
    }
}

fn order_clause(filter: &PullFilter) -> String {
    let direction = filter.direction.as_sql();
    match filter.ordering {
        PullOrdering::PullId => format!(" ORDER BY a.pull_id {direction}"),
        PullOrdering::Title => format!(" ORDER BY a.title {direction}"),
        PullOrdering::Applied => {
            format!(" ORDER BY applied_test_id {direction}, a.pull_id {direction}")
        }
    }
}

fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for character in term.chars() {
        if matches!(character, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(character);
    }
    escaped.push('%');
    escaped
}

impl PullRepository for SqlitePullRepository {
    fn truncate(&self) -> Result<(), PersistenceError> {
        let mut connection = self.database_url.establish()?;
        sql_query("DELETE FROM pulls;")
            .execute(&mut connection)
            .map(drop)
            .map_err(|error| map_write_error(&mut connection, PULLS_TABLE, &error))
    }

    fn insert_batch(&self, pulls: &[NewPull]) -> Result<usize, PersistenceError> {
        let mut connection = self.database_url.establish()?;

        let result = connection.transaction::<usize, diesel::result::Error, _>(|transaction| {
            let mut written = 0;
            for pull in pulls {
                written += sql_query(
                    "INSERT INTO pulls (pull_id, title, description, pull_url, is_rtc, branch) \
                     VALUES (?, ?, ?, ?, ?, ?) \
                     ON CONFLICT(pull_id) DO UPDATE SET \
                       title = excluded.title, \
                       description = excluded.description, \
                       pull_url = excluded.pull_url, \
                       is_rtc = excluded.is_rtc, \
                       branch = excluded.branch;",
                )
                .bind::<BigInt, _>(id_to_i64(pull.pull_id))
                .bind::<Text, _>(&pull.title)
                .bind::<Text, _>(&pull.description)
                .bind::<Text, _>(&pull.pull_url)
                .bind::<Bool, _>(pull.is_fast_track)
                .bind::<Text, _>(&pull.branch)
                .execute(transaction)?;
            }
            Ok(written)
        });

        result.map_err(|error| map_write_error(&mut connection, PULLS_TABLE, &error))
    }

    fn find(&self, pull_id: u64) -> Result<Option<PullRecord>, PersistenceError> {
        let mut connection = self.database_url.establish()?;

        let row: Option<PullRow> = sql_query(format!("{SELECT_PULLS} AND a.pull_id = ? LIMIT 1;"))
            .bind::<BigInt, _>(id_to_i64(pull_id))
            .get_result(&mut connection)
            .optional()
            .map_err(|error| map_query_error(&mut connection, PULLS_TABLE, &error))?;

        Ok(row.map(PullRecord::from))
    }

    fn set_applied_sha(&self, pull_id: u64, sha: &str) -> Result<(), PersistenceError> {
        let mut connection = self.database_url.establish()?;

        let affected = sql_query("UPDATE pulls SET sha = ? WHERE pull_id = ?;")
            .bind::<Text, _>(sha)
            .bind::<BigInt, _>(id_to_i64(pull_id))
            .execute(&mut connection)
            .map_err(|error| map_write_error(&mut connection, PULLS_TABLE, &error))?;

        if affected == 0 {
            tracing::debug!("pull request {pull_id} is not in the registry; sha not recorded");
        }

        Ok(())
    }

    fn list(&self, filter: &PullFilter) -> Result<Vec<PullRecord>, PersistenceError> {
        let mut connection = self.database_url.establish()?;

        let limit = filter.limit.map_or(-1, i64::from);
        let query = apply_filters(sql_query(SELECT_PULLS).into_boxed(), filter)
            .sql(order_clause(filter))
            .sql(" LIMIT ? OFFSET ?;")
            .bind::<BigInt, _>(limit)
            .bind::<BigInt, _>(i64::from(filter.offset));

        let rows: Vec<PullRow> = query
            .load(&mut connection)
            .map_err(|error| map_query_error(&mut connection, PULLS_TABLE, &error))?;

        Ok(rows.into_iter().map(PullRecord::from).collect())
    }

    fn count(&self, filter: &PullFilter) -> Result<u64, PersistenceError> {
        #[derive(Debug, QueryableByName)]
        struct Row {
            #[diesel(sql_type = BigInt)]
            count: i64,
        }

        let mut connection = self.database_url.establish()?;

        let row: Row = apply_filters(sql_query(COUNT_PULLS).into_boxed(), filter)
            .sql(";")
            .get_result(&mut connection)
            .map_err(|error| map_query_error(&mut connection, PULLS_TABLE, &error))?;

        Ok(id_from_i64(row.count))
    }

    fn branches(&self) -> Result<Vec<String>, PersistenceError> {
        #[derive(Debug, QueryableByName)]
        struct Row {
            #[diesel(sql_type = Text)]
            branch: String,
        }

        let mut connection = self.database_url.establish()?;

        let rows: Vec<Row> = sql_query(
            "SELECT DISTINCT branch FROM pulls WHERE branch != '' ORDER BY branch ASC;",
        )
        .load(&mut connection)
        .map_err(|error| map_query_error(&mut connection, PULLS_TABLE, &error))?;

        Ok(rows.into_iter().map(|row| row.branch).collect())
    }
}
