//! Structured events for schema upgrades, syncs and working tree changes.
//!
//! The binary prints them to stderr as JSON lines; library callers pick their
//! own [`TelemetrySink`].

use std::io::{self, Write};

use serde::{Deserialize, Serialize};

/// A structured telemetry event emitted by the patch tester.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TelemetryEvent {
    /// Records the current database schema version after migrations apply.
    SchemaVersionRecorded {
        /// Diesel migration version string (e.g. `20261019000000`).
        schema_version: String,
    },
    /// A full pull request synchronisation finished.
    PullsSynchronised {
        /// Number of pages fetched, including the final empty one.
        pages: u32,
    },
    /// A pull request was applied to the working tree.
    PatchApplied {
        /// Pull request number.
        pull_id: u64,
    },
    /// An applied test was reverted.
    PatchReverted {
        /// Identifier of the reverted test.
        test_id: u64,
    },
}

/// A sink that can record telemetry events.
pub trait TelemetrySink: Send + Sync {
    /// Records a telemetry event.
    fn record(&self, event: TelemetryEvent);
}

/// Telemetry sink that drops all events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTelemetrySink;

impl TelemetrySink for NoopTelemetrySink {
    fn record(&self, _event: TelemetryEvent) {}
}

/// Writes each event to stderr as one JSON object per line.
///
/// Nothing leaves the machine; stdout stays reserved for command output.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrJsonlTelemetrySink;

impl TelemetrySink for StderrJsonlTelemetrySink {
    fn record(&self, event: TelemetryEvent) {
        // Telemetry must never fail an operation.
        let _ignored = write_jsonl(&mut io::stderr().lock(), &event);
    }
}

fn write_jsonl(writer: &mut impl Write, event: &TelemetryEvent) -> io::Result<()> {
    serde_json::to_writer(&mut *writer, event)?;
    writer.write_all(b"\n")
}
