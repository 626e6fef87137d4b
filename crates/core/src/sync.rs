//! Mirror a local directory tree onto the drive

use crate::client::DriveClient;
use crate::entry::EntryId;
use crate::error::{Error, Result};
use crate::throttle::RateLimiter;
use crate::transport::Transport;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Patterns skipped when the caller configures none
pub const DEFAULT_EXCLUDE_PATTERNS: &[&str] = &[
    ".git",
    "__pycache__",
    ".DS_Store",
    ".env",
    "venv",
    "node_modules",
];

/// Files larger than this are skipped (100 MiB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Substring patterns that suppress local paths from a sync.
///
/// Matching is deliberately broad: a path is excluded when any pattern occurs
/// anywhere in it, so `.git` also hides `.github/` and `.gitignore`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExclusionSet {
    patterns: Vec<String>,
}

impl ExclusionSet {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .map(|pattern| -> String { pattern.into() })
                .filter(|pattern| !pattern.is_empty())
                .collect(),
        }
    }

    /// A set that excludes nothing
    pub fn empty() -> Self {
        Self { patterns: Vec::new() }
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Add more patterns, skipping duplicates and empty strings
    pub fn extend<I, S>(&mut self, patterns: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for pattern in patterns {
            let pattern = pattern.into();
            if !pattern.is_empty() && !self.patterns.contains(&pattern) {
                self.patterns.push(pattern);
            }
        }
    }

    /// First pattern occurring in `path`, if any
    pub fn matching_pattern(&self, path: &Path) -> Option<&str> {
        let path = path.to_string_lossy();
        self.patterns
            .iter()
            .find(|pattern| path.contains(pattern.as_str()))
            .map(String::as_str)
    }

    pub fn is_excluded(&self, path: &Path) -> bool {
        self.matching_pattern(path).is_some()
    }
}

impl Default for ExclusionSet {
    fn default() -> Self {
        Self::new(DEFAULT_EXCLUDE_PATTERNS.iter().copied())
    }
}

/// Knobs for [`DriveClient::upload_directory`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    pub exclude: ExclusionSet,
    pub max_file_size: u64,
}

impl SyncOptions {
    pub fn with_exclusions(mut self, exclude: ExclusionSet) -> Self {
        self.exclude = exclude;
        self
    }

    pub fn with_max_file_size(mut self, max_file_size: u64) -> Self {
        self.max_file_size = max_file_size;
        self
    }
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            exclude: ExclusionSet::default(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

/// Whether a file of `size` bytes is over the ceiling (the ceiling itself is allowed)
pub fn exceeds_size_limit(size: u64, max_file_size: u64) -> bool {
    size > max_file_size
}

/// Counters of a completed sync
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub folders_resolved: usize,
    pub files_uploaded: usize,
    pub bytes_uploaded: u64,
    pub skipped_oversize: usize,
    pub excluded: usize,
}

impl<T: Transport> DriveClient<T> {
    /// Upload the contents of `root` under `parent_id`, recreating its folder tree.
    ///
    /// Entries are visited depth-first in file-name order, one at a time. Excluded
    /// paths are pruned without being descended, oversize files are skipped with a
    /// warning, and every file is uploaded with overwrite after a permit from
    /// `limiter`. The first fatal error aborts the walk; files uploaded before it
    /// stay on the drive.
    pub async fn upload_directory<L>(
        &self,
        root: &Path,
        parent_id: Option<EntryId>,
        options: &SyncOptions,
        limiter: &L,
    ) -> Result<SyncReport>
    where
        L: RateLimiter + ?Sized,
    {
        let mut report = SyncReport::default();
        let mut excluded = 0usize;
        // parents[d] is the remote folder mirroring the directory at depth d
        let mut parents: Vec<Option<EntryId>> = vec![parent_id];

        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                if entry.depth() == 0 {
                    return true;
                }
                match options.exclude.matching_pattern(entry.path()) {
                    Some(pattern) => {
                        debug!(path = %entry.path().display(), pattern, "excluded");
                        excluded += 1;
                        false
                    }
                    None => true,
                }
            });

        for item in walker {
            let entry = item.map_err(walk_error)?;
            let depth = entry.depth();

            if depth == 0 {
                if !entry.file_type().is_dir() {
                    return Err(Error::InvalidArgument(format!(
                        "{} is not a directory",
                        root.display()
                    )));
                }
                continue;
            }

            let parent = parents[depth - 1];

            if entry.file_type().is_dir() {
                let name = entry.file_name().to_string_lossy();
                let folder_id = self.get_or_create_folder(&name, parent).await?;
                debug!(path = %entry.path().display(), id = %folder_id, "folder ready");

                report.folders_resolved += 1;
                parents.truncate(depth);
                parents.push(Some(folder_id));
                continue;
            }

            let size = match entry.metadata() {
                Ok(metadata) => metadata.len(),
                Err(err) => {
                    warn!(path = %entry.path().display(), error = %err, "cannot read file info, skipping");
                    continue;
                }
            };

            if exceeds_size_limit(size, options.max_file_size) {
                warn!(
                    path = %entry.path().display(),
                    size_mb = size as f64 / (1024.0 * 1024.0),
                    "skipping large file"
                );
                report.skipped_oversize += 1;
                continue;
            }

            limiter.acquire().await;
            self.upload_file_from_path(entry.path(), parent, true).await?;

            report.files_uploaded += 1;
            report.bytes_uploaded += size;
        }

        report.excluded = excluded;
        info!(
            root = %root.display(),
            folders = report.folders_resolved,
            files = report.files_uploaded,
            skipped = report.skipped_oversize,
            excluded = report.excluded,
            "directory uploaded"
        );

        Ok(report)
    }
}

fn walk_error(err: walkdir::Error) -> Error {
    let path = err.path().map(Path::to_path_buf).unwrap_or_default();
    let message = err.to_string();
    match err.into_io_error() {
        Some(source) => Error::LocalPath { path, source },
        None => Error::LocalPath {
            path,
            source: std::io::Error::new(std::io::ErrorKind::Other, message),
        },
    }
}
