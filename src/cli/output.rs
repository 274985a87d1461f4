//! Output formatting utilities for CLI operations.

use std::io::{self, Write};

use patchtester::persistence::{PullRecord, SchemaVersion};

use super::CliError;

/// Reports the schema version after migrations.
pub fn write_schema_version<W: Write>(
    writer: &mut W,
    version: &SchemaVersion,
) -> Result<(), CliError> {
    writeln!(writer, "Database schema at version {}", version.as_str()).map_err(|e| io_error(&e))
}

/// Reports one stored synchronisation page.
pub fn write_sync_progress<W: Write>(
    writer: &mut W,
    page: u32,
    last_page: Option<u32>,
) -> Result<(), CliError> {
    match last_page {
        Some(last) if last >= page => writeln!(writer, "Stored page {page} of {last}"),
        _ => writeln!(writer, "Stored page {page}"),
    }
    .map_err(|e| io_error(&e))
}

/// Reports a finished synchronisation.
pub fn write_sync_summary<W: Write>(
    writer: &mut W,
    pages: u32,
    stored: u64,
) -> Result<(), CliError> {
    writeln!(
        writer,
        "Synchronised {stored} open pull request(s) in {pages} request(s)"
    )
    .map_err(|e| io_error(&e))
}

/// Writes the mirrored pull requests, one per line.
pub fn write_pull_listing<W: Write>(
    writer: &mut W,
    pulls: &[PullRecord],
    total: u64,
) -> Result<(), CliError> {
    if pulls.is_empty() {
        writeln!(writer, "No pull requests found. Run with --sync first.")
            .map_err(|e| io_error(&e))?;
        return Ok(());
    }

    for pull in pulls {
        let mut markers = String::new();
        if let Some(test_id) = pull.applied_test_id {
            markers.push_str(&format!("[applied as test {test_id}] "));
        }
        if pull.is_fast_track {
            markers.push_str("[RTC] ");
        }
        if !pull.branch.is_empty() {
            markers.push_str(&format!("({}) ", pull.branch));
        }
        writeln!(writer, "  #{} {markers}{}", pull.pull_id, pull.title)
            .map_err(|e| io_error(&e))?;
    }

    writeln!(writer).map_err(|e| io_error(&e))?;
    writeln!(writer, "{} of {total} pull request(s) shown", pulls.len()).map_err(|e| io_error(&e))
}

/// Reports the outcome of applying a pull request.
pub fn write_apply_outcome<W: Write>(
    writer: &mut W,
    pull_id: u64,
    applied: bool,
) -> Result<(), CliError> {
    if applied {
        writeln!(writer, "Applied pull request #{pull_id}")
    } else {
        writeln!(
            writer,
            "Pull request #{pull_id} changes no files that ship with the site; nothing applied"
        )
    }
    .map_err(|e| io_error(&e))
}

/// Reports the outcome of reverting an applied test.
pub fn write_revert_outcome<W: Write>(writer: &mut W, test_id: u64) -> Result<(), CliError> {
    writeln!(writer, "Reverted applied test {test_id}").map_err(|e| io_error(&e))
}

/// Converts an I/O error to a [`CliError::Output`].
pub(crate) fn io_error(error: &io::Error) -> CliError {
    CliError::Output {
        message: error.to_string(),
    }
}
