//! File-level view of a pull request's diff.
//!
//! GitHub's changed-file listing is normalised into [`FileChange`] values:
//! statuses collapse to four actions, the packaging `src/` prefix is removed
//! so paths match the installed site, and files that never ship are dropped
//! unless the tree is a development checkout.

use camino::Utf8Path;
use serde::{Deserialize, Serialize};

use crate::github::ChangedFile;

/// Top-level folders that exist only in the source repository.
pub const NON_PRODUCTION_FOLDERS: &[&str] = &["build", "docs", "installation", "tests", ".github"];

/// Top-level files that exist only in the source repository.
pub const NON_PRODUCTION_FILES: &[&str] = &[
    ".drone.yml",
    ".gitignore",
    ".php_cs",
    ".travis.yml",
    "README.md",
    "build.xml",
    "composer.json",
    "composer.lock",
    "phpunit.xml.dist",
    "robots.txt.dist",
    "travisci-phpunit.xml",
    "LICENSE",
    "RoboFile.dist.ini",
    "RoboFile.php",
    "codeception.yml",
    "jorobo.dist.ini",
    "manifest.xml",
    "crowdin.yaml",
];

const SOURCE_PREFIX: &str = "src/";

/// What a pull request does to one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileAction {
    /// New file.
    Added,
    /// Existing file with new contents.
    Modified,
    /// File removed.
    Deleted,
    /// File moved, possibly with new contents.
    Renamed,
}

impl FileAction {
    /// Maps a GitHub file status onto an action.
    ///
    /// Returns `None` for `unchanged` and any status GitHub may add later.
    #[must_use]
    pub fn from_github_status(status: &str) -> Option<Self> {
        match status {
            "added" | "copied" => Some(Self::Added),
            "modified" | "changed" => Some(Self::Modified),
            "removed" | "deleted" => Some(Self::Deleted),
            "renamed" => Some(Self::Renamed),
            _ => None,
        }
    }

    /// Returns true when the action needs the new file contents.
    #[must_use]
    pub const fn needs_contents(self) -> bool {
        !matches!(self, Self::Deleted)
    }
}

/// One normalised file entry, as stored with an applied test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    /// Action taken on the file.
    pub action: FileAction,
    /// Path in the working tree.
    pub filename: String,
    /// Path in the remote repository.
    pub repo_filename: String,
    /// Contents API URL reported by GitHub.
    pub contents_url: String,
    /// Working-tree path before a rename.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_filename: Option<String>,
}

impl FileChange {
    /// Normalises a GitHub changed-file entry.
    ///
    /// Returns `None` when the status does not map to an action.
    #[must_use]
    pub fn from_changed_file(file: &ChangedFile) -> Option<Self> {
        let action = FileAction::from_github_status(&file.status)?;
        Some(Self {
            action,
            filename: strip_source_prefix(&file.filename).to_owned(),
            repo_filename: file.filename.clone(),
            contents_url: file.contents_url.clone(),
            original_filename: file
                .previous_filename
                .as_deref()
                .map(|previous| strip_source_prefix(previous).to_owned()),
        })
    }

    /// Working-tree path of the file after the change.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        Utf8Path::new(&self.filename)
    }

    /// Working-tree path before a rename.
    #[must_use]
    pub fn original_path(&self) -> Option<&Utf8Path> {
        self.original_filename.as_deref().map(Utf8Path::new)
    }
}

/// Removes the packaging `src/` prefix so the path matches the site layout.
#[must_use]
pub fn strip_source_prefix(path: &str) -> &str {
    path.strip_prefix(SOURCE_PREFIX).unwrap_or(path)
}

/// Returns true when the repository path never ships in an installed site.
#[must_use]
pub fn is_non_production(repo_filename: &str) -> bool {
    let top_level = repo_filename.split('/').next().unwrap_or_default();
    NON_PRODUCTION_FOLDERS.contains(&top_level) || NON_PRODUCTION_FILES.contains(&top_level)
}

/// Normalises GitHub's listing, keeping API order.
///
/// Non-production entries are skipped unless `development_checkout` is set.
#[must_use]
pub fn parse_file_list(files: &[ChangedFile], development_checkout: bool) -> Vec<FileChange> {
    files
        .iter()
        .filter(|file| development_checkout || !is_non_production(&file.filename))
        .filter_map(|file| {
            let change = FileChange::from_changed_file(file);
            if change.is_none() {
                tracing::debug!(
                    filename = %file.filename,
                    status = %file.status,
                    "skipping file with unsupported status"
                );
            }
            change
        })
        .collect()
}

/// A [`FileChange`] together with its downloaded contents.
///
/// Contents stay here and never reach the stored JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedChange {
    /// The change being applied.
    pub change: FileChange,
    /// New file contents; `None` for deletions.
    pub body: Option<Vec<u8>>,
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{FileAction, FileChange, is_non_production, parse_file_list, strip_source_prefix};
    use crate::github::ChangedFile;

    fn changed(filename: &str, status: &str, previous: Option<&str>) -> ChangedFile {
        ChangedFile {
            filename: filename.to_owned(),
            status: status.to_owned(),
            previous_filename: previous.map(ToOwned::to_owned),
            contents_url: format!("https://api.github.com/contents/{filename}"),
        }
    }

    #[rstest]
    #[case("added", Some(FileAction::Added))]
    #[case("copied", Some(FileAction::Added))]
    #[case("modified", Some(FileAction::Modified))]
    #[case("changed", Some(FileAction::Modified))]
    #[case("removed", Some(FileAction::Deleted))]
    #[case("renamed", Some(FileAction::Renamed))]
    #[case("unchanged", None)]
    fn github_statuses_map_to_actions(#[case] status: &str, #[case] expected: Option<FileAction>) {
        assert_eq!(FileAction::from_github_status(status), expected);
    }

    #[rstest]
    #[case("src/libraries/Foo.php", "libraries/Foo.php")]
    #[case("libraries/src/Foo.php", "libraries/src/Foo.php")]
    #[case("src", "src")]
    fn only_leading_source_prefix_is_removed(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(strip_source_prefix(input), expected);
    }

    #[rstest]
    #[case("tests/unit/FooTest.php", true)]
    #[case(".github/workflows/ci.yml", true)]
    #[case("README.md", true)]
    #[case("composer.json", true)]
    #[case("libraries/README.md", false)]
    #[case("media/build/app.js", false)]
    #[case("index.php", false)]
    fn non_production_uses_the_top_level_segment(#[case] path: &str, #[case] expected: bool) {
        assert_eq!(is_non_production(path), expected);
    }

    #[test]
    fn parse_file_list_filters_and_normalises() {
        let files = vec![
            changed("src/libraries/Foo.php", "modified", None),
            changed("tests/FooTest.php", "added", None),
            changed("media/new.js", "renamed", Some("src/media/old.js")),
            changed("index.php", "unchanged", None),
        ];

        let parsed = parse_file_list(&files, false);

        assert_eq!(parsed.len(), 2);
        let first = parsed.first().expect("first change should exist");
        assert_eq!(first.filename, "libraries/Foo.php");
        assert_eq!(first.repo_filename, "src/libraries/Foo.php");
        let renamed = parsed.get(1).expect("renamed change should exist");
        assert_eq!(renamed.action, FileAction::Renamed);
        assert_eq!(renamed.original_filename.as_deref(), Some("media/old.js"));
    }

    #[test]
    fn development_checkout_keeps_non_production_files() {
        let files = vec![changed("tests/FooTest.php", "added", None)];

        assert_eq!(parse_file_list(&files, true).len(), 1);
    }

    #[test]
    fn stored_form_omits_contents_and_empty_original() {
        let change = FileChange::from_changed_file(&changed("index.php", "added", None))
            .expect("added should map");

        let json = serde_json::to_value(&change).expect("change should serialise");

        assert_eq!(
            json,
            serde_json::json!({
                "action": "added",
                "filename": "index.php",
                "repo_filename": "index.php",
                "contents_url": "https://api.github.com/contents/index.php"
            })
        );
    }
}
