//! Applying a pull request to the working tree.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use camino::Utf8Path;
use tracing::{debug, info};

use crate::backup::BackupKey;
use crate::github::{FileContents, HeadRepository};
use crate::persistence::NewAppliedTest;

use super::engine::{PatchEngine, require_quota};
use super::error::{PatchError, map_gateway_error, map_persistence_error};
use super::file_change::{FileAction, FileChange, StagedChange, parse_file_list};

/// Encoding the contents API is expected to use.
const BASE64_ENCODING: &str = "base64";

impl PatchEngine<'_> {
    /// Applies pull request `pull_id` to the working tree.
    ///
    /// Returns `Ok(false)` when the pull request touches no file that ships
    /// with the site. On success the replaced files are backed up, an applied
    /// test is recorded, and the pull's applied SHA is set.
    ///
    /// # Errors
    ///
    /// Validation failures (`RateLimitExceeded`, `RemoteUnavailable`,
    /// `RepoGone`, `Conflict`, `MissingLocalFile`, `UnsupportedEncoding`)
    /// leave everything untouched. `FilesystemIo` and `DatabaseIo` may leave
    /// the tree partially patched.
    pub async fn apply(&self, pull_id: u64) -> Result<bool, PatchError> {
        info!(pull_id, "applying pull request");
        require_quota(self.deps.gateway, 1).await?;

        let head = self
            .deps
            .gateway
            .pull_request(pull_id)
            .await
            .map_err(|error| map_gateway_error(&error))?;
        let Some(source) = head.repository.as_ref() else {
            return Err(PatchError::RepoGone { pull_id });
        };

        let files = self
            .deps
            .gateway
            .pull_request_files(pull_id)
            .await
            .map_err(|error| map_gateway_error(&error))?;
        if files.is_empty() {
            debug!(pull_id, "pull request has no files");
            return Ok(false);
        }

        let changes = parse_file_list(&files, self.deps.tree.is_development_checkout());
        if changes.is_empty() {
            debug!(pull_id, "no production files left after filtering");
            return Ok(false);
        }

        let staged = self.stage(changes, source, &head.head_ref).await?;
        let changes = self.write_staged(staged)?;
        self.record(head.number, &head.head_sha, &changes)?;

        info!(pull_id, files = changes.len(), "pull request applied");
        Ok(true)
    }

    /// Checks every change against the tree and downloads new contents.
    async fn stage(
        &self,
        changes: Vec<FileChange>,
        source: &HeadRepository,
        git_ref: &str,
    ) -> Result<Vec<StagedChange>, PatchError> {
        let mut staged = Vec::with_capacity(changes.len());

        for change in changes {
            self.validate(&change)?;

            let body = if change.action.needs_contents() {
                let contents = self
                    .deps
                    .gateway
                    .file_contents(source, &change.repo_filename, git_ref)
                    .await
                    .map_err(|error| map_gateway_error(&error))?;
                Some(decode_contents(&change.filename, &contents)?)
            } else {
                None
            };

            staged.push(StagedChange { change, body });
        }

        Ok(staged)
    }

    fn validate(&self, change: &FileChange) -> Result<(), PatchError> {
        let exists = self.deps.tree.exists(change.path());

        match change.action {
            FileAction::Deleted if !exists => Err(PatchError::MissingLocalFile {
                path: change.filename.clone(),
            }),
            FileAction::Deleted => Ok(()),
            FileAction::Added | FileAction::Modified | FileAction::Renamed => {
                if self
                    .deps
                    .backups
                    .contains(&BackupKey::for_path(&change.filename))
                {
                    return Err(PatchError::Conflict {
                        path: change.filename.clone(),
                    });
                }

                if change.action == FileAction::Modified && !exists {
                    return Err(PatchError::MissingLocalFile {
                        path: change.filename.clone(),
                    });
                }

                Ok(())
            }
        }
    }

    /// Backs up and writes every staged change, discarding the contents.
    fn write_staged(&self, staged: Vec<StagedChange>) -> Result<Vec<FileChange>, PatchError> {
        let tree = self.deps.tree;
        let mut written = Vec::with_capacity(staged.len());

        for staged_change in staged {
            let StagedChange { change, body } = staged_change;

            if let Some(backup_source) = self.backup_source(&change) {
                let current = tree.read(Utf8Path::new(backup_source))?;
                self.deps
                    .backups
                    .save(&BackupKey::for_path(backup_source), &current)?;
            }

            let body = body.unwrap_or_default();
            match change.action {
                FileAction::Added | FileAction::Modified => tree.write(change.path(), &body)?,
                FileAction::Deleted => tree.remove(change.path())?,
                FileAction::Renamed => {
                    if let Some(original) = change.original_path()
                        && tree.exists(original)
                    {
                        tree.remove(original)?;
                    }
                    tree.write(change.path(), &body)?;
                }
            }

            debug!(filename = %change.filename, action = ?change.action, "file patched");
            written.push(change);
        }

        Ok(written)
    }

    /// Path whose current contents must be saved before `change` is written.
    fn backup_source<'change>(&self, change: &'change FileChange) -> Option<&'change str> {
        let tree = self.deps.tree;
        match change.action {
            FileAction::Deleted => Some(change.filename.as_str()),
            FileAction::Modified if tree.exists(change.path()) => Some(change.filename.as_str()),
            FileAction::Renamed => change
                .original_filename
                .as_deref()
                .filter(|original| tree.exists(Utf8Path::new(original))),
            FileAction::Added | FileAction::Modified => None,
        }
    }

    fn record(
        &self,
        pull_id: u64,
        head_sha: &str,
        changes: &[FileChange],
    ) -> Result<(), PatchError> {
        let data = serde_json::to_string(changes).map_err(|error| PatchError::DatabaseIo {
            message: format!("serialise file list: {error}"),
            partial: true,
        })?;

        let test_id = self
            .deps
            .tests
            .insert(NewAppliedTest {
                pull_id,
                data: &data,
                patched_by: self.settings.acting_user,
                applied_version: &self.settings.host_version,
            })
            .map_err(|error| map_persistence_error("record applied test", &error))?;

        self.deps
            .pulls
            .set_applied_sha(pull_id, head_sha)
            .map_err(|error| map_persistence_error("record applied sha", &error))?;

        self.deps
            .assets
            .bump()
            .map_err(|error| map_persistence_error("refresh asset version", &error))?;

        debug!(pull_id, test_id, "applied test recorded");
        Ok(())
    }
}

/// Decodes a contents API payload.
///
/// GitHub wraps base64 bodies at 60 columns, so line breaks are removed
/// before decoding.
fn decode_contents(path: &str, contents: &FileContents) -> Result<Vec<u8>, PatchError> {
    if contents.encoding != BASE64_ENCODING {
        return Err(PatchError::UnsupportedEncoding {
            path: path.to_owned(),
            encoding: contents.encoding.clone(),
        });
    }

    let compact: String = contents
        .content
        .chars()
        .filter(|character| !character.is_ascii_whitespace())
        .collect();

    STANDARD
        .decode(compact)
        .map_err(|error| PatchError::RemoteUnavailable {
            message: format!("GitHub returned malformed base64 for '{path}': {error}"),
        })
}
