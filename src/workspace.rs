//! The working tree that patches are applied to.
//!
//! All access goes through a capability handle on the site root, so a
//! repository-relative path from a pull request can never reach outside it.

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use thiserror::Error;

/// File whose presence marks a development checkout rather than an install.
pub const DEVELOPMENT_MARKER: &str = "installation/index.php";

/// Errors raised by filesystem access.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilesystemError {
    /// A root directory could not be opened or created.
    #[error("failed to open {label} directory '{path}': {message}")]
    OpenDirectory {
        /// What the directory is used for.
        label: &'static str,
        /// Directory path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        message: String,
    },

    /// A file operation failed.
    #[error("failed to {operation} '{path}': {message}")]
    Io {
        /// Operation that failed (`read`, `write`, ...).
        operation: &'static str,
        /// Path relative to the opened directory.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        message: String,
    },
}

impl FilesystemError {
    fn io(operation: &'static str, path: &Utf8Path, error: &std::io::Error) -> Self {
        Self::Io {
            operation,
            path: path.to_owned(),
            message: error.to_string(),
        }
    }
}

/// Filesystem rooted at the site under test.
pub trait WorkingTree: Send + Sync {
    /// Returns true when `path` exists.
    fn exists(&self, path: &Utf8Path) -> bool;

    /// Reads the full contents of `path`.
    ///
    /// # Errors
    ///
    /// Returns [`FilesystemError::Io`] when the file cannot be read.
    fn read(&self, path: &Utf8Path) -> Result<Vec<u8>, FilesystemError>;

    /// Writes `contents` to `path`, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns [`FilesystemError::Io`] when the file cannot be written.
    fn write(&self, path: &Utf8Path, contents: &[u8]) -> Result<(), FilesystemError>;

    /// Deletes the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`FilesystemError::Io`] when the file cannot be removed.
    fn remove(&self, path: &Utf8Path) -> Result<(), FilesystemError>;

    /// Returns true when the tree is a development checkout, in which case
    /// non-production files are patched too.
    fn is_development_checkout(&self) -> bool {
        self.exists(Utf8Path::new(DEVELOPMENT_MARKER))
    }
}

/// Working tree backed by a directory on disk.
#[derive(Debug)]
pub struct SiteTree {
    root: Dir,
}

impl SiteTree {
    /// Opens the site root.
    ///
    /// # Errors
    ///
    /// Returns [`FilesystemError::OpenDirectory`] when the directory is
    /// missing or unreadable.
    pub fn open(root_path: &Utf8Path) -> Result<Self, FilesystemError> {
        Ok(Self {
            root: open_dir(root_path, "site")?,
        })
    }
}

impl WorkingTree for SiteTree {
    fn exists(&self, path: &Utf8Path) -> bool {
        self.root.exists(path)
    }

    fn read(&self, path: &Utf8Path) -> Result<Vec<u8>, FilesystemError> {
        self.root
            .read(path)
            .map_err(|error| FilesystemError::io("read", path, &error))
    }

    fn write(&self, path: &Utf8Path, contents: &[u8]) -> Result<(), FilesystemError> {
        if let Some(parent) = path.parent()
            && !parent.as_str().is_empty()
        {
            self.root
                .create_dir_all(parent)
                .map_err(|error| FilesystemError::io("create directory", parent, &error))?;
        }

        self.root
            .write(path, contents)
            .map_err(|error| FilesystemError::io("write", path, &error))
    }

    fn remove(&self, path: &Utf8Path) -> Result<(), FilesystemError> {
        self.root
            .remove_file(path)
            .map_err(|error| FilesystemError::io("remove", path, &error))
    }
}

/// Opens a directory using ambient authority.
pub(crate) fn open_dir(path: &Utf8Path, label: &'static str) -> Result<Dir, FilesystemError> {
    Dir::open_ambient_dir(path, ambient_authority()).map_err(|error| {
        FilesystemError::OpenDirectory {
            label,
            path: path.to_owned(),
            message: error.to_string(),
        }
    })
}
