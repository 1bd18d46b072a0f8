use std::path::PathBuf;

use chrono::NaiveDateTime;

use crate::date::PrefixTag;

/// Tolerance class of a file, decided by its filename prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    Still,
}

impl MediaKind {
    pub fn from_prefix(prefix: Option<PrefixTag>) -> Self {
        match prefix {
            Some(tag) if tag.is_video() => MediaKind::Video,
            _ => MediaKind::Still,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MediaFile {
    /// Location as yielded by the walker
    pub path: PathBuf,
    /// Just the filename
    pub name: String,
    /// Capture time encoded in the filename
    pub filename_date: Option<NaiveDateTime>,
    /// Capture time read from embedded metadata
    pub metadata_date: Option<NaiveDateTime>,
    pub kind: MediaKind,
}

impl MediaFile {
    pub fn new(path: PathBuf, name: String) -> Self {
        Self {
            path,
            name,
            filename_date: None,
            metadata_date: None,
            kind: MediaKind::Still,
        }
    }
}
