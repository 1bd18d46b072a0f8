use std::path::Path;

use chrono::{Local, NaiveDateTime};
use filetime::FileTime;

use crate::error::MutationError;

/// What a mutation sink did with a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    Applied,
    /// Dry run: the equivalent shell command, nothing touched.
    DryRun(String),
}

/// Applies a resolved timestamp as a file's modification time.
pub trait MtimeSink {
    fn apply_mtime(
        &self,
        path: &Path,
        date: NaiveDateTime,
        dry_run: bool,
    ) -> Result<MutationOutcome, MutationError>;
}

/// Sets mtimes through `filetime`, interpreting dates as local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct FiletimeSink;

impl MtimeSink for FiletimeSink {
    fn apply_mtime(
        &self,
        path: &Path,
        date: NaiveDateTime,
        dry_run: bool,
    ) -> Result<MutationOutcome, MutationError> {
        if dry_run {
            return Ok(MutationOutcome::DryRun(touch_command(path, date)));
        }

        let ft = local_file_time(date)?;
        filetime::set_file_mtime(path, ft).map_err(|source| MutationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(MutationOutcome::Applied)
    }
}

/// Convert a naive local date to a `FileTime`, taking the earlier instant
/// when a DST fold makes the local time ambiguous.
pub fn local_file_time(date: NaiveDateTime) -> Result<FileTime, MutationError> {
    let local = date
        .and_local_timezone(Local)
        .earliest()
        .ok_or(MutationError::NonexistentLocalTime { date })?;
    Ok(FileTime::from_unix_time(local.timestamp(), 0))
}

/// The `touch` invocation that would have the same effect.
pub fn touch_command(path: &Path, date: NaiveDateTime) -> String {
    format!(
        "touch -m -d '{}' '{}'",
        date.format("%Y-%m-%d %H:%M:%S"),
        path.display().to_string().replace('\'', r"'\''")
    )
}
