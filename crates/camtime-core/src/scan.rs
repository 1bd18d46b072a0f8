use std::path::{Path, PathBuf};

use regex::Regex;
use walkdir::WalkDir;

use crate::error::ScanError;

/// Filenames worth looking at: a recognized camera/screenshot prefix.
pub const DEFAULT_INCLUDE: &str = r"^(IMG|PANO|TINYPLANET_PANO|VID|Screenshot)_";

/// A file yielded by the walker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub path: PathBuf,
    pub name: String,
}

/// Recursively enumerate regular files under `root` whose name matches
/// `include`, in filename order within each directory.
///
/// Symlinks are followed, so a linked file is yielded under its link name.
/// Unreadable entries (a missing root, a dangling link, a link loop) are
/// yielded as errors and the walk carries on with the rest.
pub fn walk<'a>(
    root: &'a Path,
    include: &'a Regex,
) -> impl Iterator<Item = Result<Candidate, ScanError>> + 'a {
    WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(move |entry| {
            let entry = match entry {
                Ok(entry) => entry,
                Err(source) => {
                    return Some(Err(ScanError::Walk {
                        root: root.to_path_buf(),
                        source,
                    }))
                }
            };
            if !entry.file_type().is_file() {
                return None;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if !include.is_match(&name) {
                return None;
            }
            Some(Ok(Candidate {
                path: entry.into_path(),
                name,
            }))
        })
}
