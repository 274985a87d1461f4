//! Reverting an applied test.

use camino::Utf8Path;
use tracing::{debug, info, warn};

use crate::backup::BackupKey;
use crate::persistence::AppliedTestRecord;

use super::engine::PatchEngine;
use super::error::{PatchError, map_persistence_error, map_persistence_read_error};
use super::file_change::{FileAction, FileChange};

impl PatchEngine<'_> {
    /// Reverts applied test `test_id`, restoring the replaced files.
    ///
    /// When the host version changed since the patch was applied, the files
    /// are left alone and only the bookkeeping is removed.
    ///
    /// # Errors
    ///
    /// Returns `TestNotFound` for an unknown identifier and `DatabaseIo` when
    /// the stored file list cannot be decoded. `FilesystemIo` may leave the
    /// tree partially restored.
    pub fn revert(&self, test_id: u64) -> Result<bool, PatchError> {
        let record = self
            .deps
            .tests
            .find(test_id)
            .map_err(|error| map_persistence_read_error("load applied test", &error))?
            .ok_or(PatchError::TestNotFound { test_id })?;

        info!(test_id, pull_id = record.pull_id, "reverting applied test");

        if record.applied_version != self.settings.host_version {
            warn!(
                test_id,
                applied_version = %record.applied_version,
                host_version = %self.settings.host_version,
                "host version changed since apply; leaving files untouched"
            );
            self.remove_test(&record)?;
            return Ok(true);
        }

        let changes: Vec<FileChange> =
            serde_json::from_str(&record.data).map_err(|error| PatchError::DatabaseIo {
                message: format!("decode file list of applied test {test_id}: {error}"),
                partial: false,
            })?;

        for change in &changes {
            self.restore(change)?;
        }

        self.deps
            .assets
            .bump()
            .map_err(|error| map_persistence_error("refresh asset version", &error))?;
        self.remove_test(&record)?;

        info!(test_id, files = changes.len(), "applied test reverted");
        Ok(true)
    }

    fn restore(&self, change: &FileChange) -> Result<(), PatchError> {
        let tree = self.deps.tree;

        match change.action {
            FileAction::Modified | FileAction::Deleted => {
                self.restore_backup(&change.filename)?;
            }
            FileAction::Added => {
                if tree.exists(change.path()) {
                    tree.remove(change.path())?;
                }
            }
            FileAction::Renamed => {
                if let Some(original) = change.original_filename.as_deref()
                    && self.deps.backups.contains(&BackupKey::for_path(original))
                {
                    self.restore_backup(original)?;
                }
                if tree.exists(change.path()) {
                    tree.remove(change.path())?;
                }
            }
        }

        debug!(filename = %change.filename, action = ?change.action, "file restored");
        Ok(())
    }

    /// Copies the backup of `path` back into the tree and drops the backup.
    fn restore_backup(&self, path: &str) -> Result<(), PatchError> {
        let key = BackupKey::for_path(path);
        let saved = self.deps.backups.load(&key)?;
        self.deps.tree.write(Utf8Path::new(path), &saved)?;
        self.deps.backups.remove(&key)?;
        Ok(())
    }

    fn remove_test(&self, record: &AppliedTestRecord) -> Result<(), PatchError> {
        self.deps
            .pulls
            .clear_applied_sha(record.pull_id)
            .map_err(|error| map_persistence_error("clear applied sha", &error))?;
        self.deps
            .tests
            .delete(record.id)
            .map_err(|error| map_persistence_error("delete applied test", &error))
    }
}
