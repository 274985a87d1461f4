//! Saved copies of files replaced by an applied patch.
//!
//! Each blob lives at `<sha256-hex(path)>.bak` inside the backups directory.
//! A blob existing for a path means some applied patch currently owns it.

use std::fmt;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use sha2::{Digest, Sha256};

use crate::workspace::{FilesystemError, open_dir};

/// Deterministic backup name for a repository-relative path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BackupKey(String);

impl BackupKey {
    /// Derives the key for `path`.
    ///
    /// Leading slashes are ignored so `/index.php` and `index.php` share a
    /// backup.
    ///
    /// # Example
    ///
    /// ```
    /// use patchtester::backup::BackupKey;
    ///
    /// let key = BackupKey::for_path("index.php");
    /// assert_eq!(key, BackupKey::for_path("/index.php"));
    /// assert!(key.file_name().ends_with(".bak"));
    /// ```
    #[must_use]
    pub fn for_path(path: &str) -> Self {
        let normalised = path.trim_start_matches('/');
        Self(hex::encode(Sha256::digest(normalised.as_bytes())))
    }

    /// Hex digest identifying the path.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name of the backup blob.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}.bak", self.0)
    }
}

impl fmt::Display for BackupKey {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

/// Storage for backup blobs.
pub trait BackupStore: Send + Sync {
    /// Returns true when a backup exists for `key`.
    fn contains(&self, key: &BackupKey) -> bool;

    /// Stores `contents` under `key`, replacing any previous blob.
    ///
    /// # Errors
    ///
    /// Returns [`FilesystemError`] when the blob cannot be written.
    fn save(&self, key: &BackupKey, contents: &[u8]) -> Result<(), FilesystemError>;

    /// Loads the blob stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`FilesystemError`] when the blob is missing or unreadable.
    fn load(&self, key: &BackupKey) -> Result<Vec<u8>, FilesystemError>;

    /// Deletes the blob stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`FilesystemError`] when the blob cannot be removed.
    fn remove(&self, key: &BackupKey) -> Result<(), FilesystemError>;
}

/// Backup store kept in a single directory.
#[derive(Debug)]
pub struct DirectoryBackupStore {
    dir: Dir,
}

impl DirectoryBackupStore {
    /// Opens the backups directory, creating it when missing.
    ///
    /// # Errors
    ///
    /// Returns [`FilesystemError::OpenDirectory`] when the directory cannot
    /// be created or opened.
    pub fn open(path: &Utf8Path) -> Result<Self, FilesystemError> {
        Dir::create_ambient_dir_all(path, ambient_authority()).map_err(|error| {
            FilesystemError::OpenDirectory {
                label: "backups",
                path: path.to_owned(),
                message: error.to_string(),
            }
        })?;

        Ok(Self {
            dir: open_dir(path, "backups")?,
        })
    }

    fn blob_error(
        operation: &'static str,
        key: &BackupKey,
        error: &std::io::Error,
    ) -> FilesystemError {
        FilesystemError::Io {
            operation,
            path: Utf8PathBuf::from(key.file_name()),
            message: error.to_string(),
        }
    }
}

impl BackupStore for DirectoryBackupStore {
    fn contains(&self, key: &BackupKey) -> bool {
        self.dir.exists(key.file_name())
    }

    fn save(&self, key: &BackupKey, contents: &[u8]) -> Result<(), FilesystemError> {
        self.dir
            .write(key.file_name(), contents)
            .map_err(|error| Self::blob_error("save backup", key, &error))
    }

    fn load(&self, key: &BackupKey) -> Result<Vec<u8>, FilesystemError> {
        self.dir
            .read(key.file_name())
            .map_err(|error| Self::blob_error("load backup", key, &error))
    }

    fn remove(&self, key: &BackupKey) -> Result<(), FilesystemError> {
        self.dir
            .remove_file(key.file_name())
            .map_err(|error| Self::blob_error("remove backup", key, &error))
    }
}
