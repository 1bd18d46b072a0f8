use std::fmt;
use std::path::PathBuf;

use chrono::NaiveDateTime;
use log::Level;

use crate::error::{ConsistencyError, MetadataError, MutationError, ParseError, ScanError};

/// Per-file, per-stage observations made by the driver.
#[derive(Debug)]
pub enum Event {
    /// A walk root or an entry under it could not be read.
    ScanFailed { error: ScanError },
    /// A file passed the prefix filter and is about to be processed.
    Candidate { path: PathBuf },
    /// The filename does not carry a usable timestamp; the file is left alone.
    ParseFailed { path: PathBuf, error: ParseError },
    /// Metadata could not be read or interpreted; no cross-check possible.
    MetadataFailed { path: PathBuf, error: MetadataError },
    /// Metadata was read but holds nothing to compare against.
    MetadataNotApplicable { path: PathBuf },
    /// The filename date will be applied without a metadata cross-check.
    Unverified { path: PathBuf, date: NaiveDateTime },
    /// Filename and metadata disagree; the file needs manual review.
    Inconsistent { path: PathBuf, error: ConsistencyError },
    Applied {
        path: PathBuf,
        date: NaiveDateTime,
        confirmed: bool,
    },
    DryRun {
        path: PathBuf,
        date: NaiveDateTime,
        command: String,
    },
    MutationFailed { path: PathBuf, error: MutationError },
}

impl Event {
    pub fn level(&self) -> Level {
        match self {
            Event::ScanFailed { .. } | Event::Inconsistent { .. } => Level::Error,
            Event::ParseFailed { .. }
            | Event::MetadataFailed { .. }
            | Event::Unverified { .. }
            | Event::MutationFailed { .. } => Level::Warn,
            Event::Applied { .. } | Event::DryRun { .. } => Level::Info,
            Event::Candidate { .. } | Event::MetadataNotApplicable { .. } => Level::Debug,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::ScanFailed { error } => write!(f, "{}", error),
            Event::Candidate { path } => write!(f, "{}", path.display()),
            Event::ParseFailed { path, error } => {
                write!(f, "invalid file {}: {}", path.display(), error)
            }
            Event::MetadataFailed { path, error } => {
                write!(f, "no metadata date for {}: {}", path.display(), error)
            }
            Event::MetadataNotApplicable { path } => {
                write!(f, "no usable metadata date in {}", path.display())
            }
            Event::Unverified { path, date } => write!(
                f,
                "using filename date {} for {} without metadata cross-check",
                date,
                path.display()
            ),
            Event::Inconsistent { path, error } => {
                write!(f, "leaving {} untouched: {}", path.display(), error)
            }
            Event::Applied {
                path,
                date,
                confirmed,
            } => write!(
                f,
                "set mtime of {} to {}{}",
                path.display(),
                date,
                if *confirmed { " (metadata agrees)" } else { "" }
            ),
            Event::DryRun { command, .. } => write!(f, "{}", command),
            Event::MutationFailed { path, error } => {
                write!(f, "FAILED FOR FILE {}: {}", path.display(), error)
            }
        }
    }
}

/// Receiver for driver events.
pub trait EventSink {
    fn record(&mut self, event: Event);
}

impl EventSink for Vec<Event> {
    fn record(&mut self, event: Event) {
        self.push(event);
    }
}

/// Forwards every event to the `log` facade at its own level.
#[derive(Debug, Default)]
pub struct LogSink;

impl EventSink for LogSink {
    fn record(&mut self, event: Event) {
        log::log!(event.level(), "{}", event);
    }
}

/// Outcome counts accumulated over a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    pub candidates: u64,
    pub applied: u64,
    pub dry_run: u64,
    pub unverified: u64,
    pub inconsistent: u64,
    pub parse_failed: u64,
    pub metadata_failed: u64,
    pub mutation_failed: u64,
    pub scan_failed: u64,
}

impl fmt::Display for Counts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} candidates, {} updated, {} dry-run, {} unverified, {} inconsistent, \
             {} unparseable names, {} metadata failures, {} write failures, {} scan errors",
            self.candidates,
            self.applied,
            self.dry_run,
            self.unverified,
            self.inconsistent,
            self.parse_failed,
            self.metadata_failed,
            self.mutation_failed,
            self.scan_failed
        )
    }
}

/// Counts events on their way to another sink.
pub struct Tally<'a> {
    inner: &'a mut dyn EventSink,
    counts: Counts,
}

impl<'a> Tally<'a> {
    pub fn new(inner: &'a mut dyn EventSink) -> Self {
        Self {
            inner,
            counts: Counts::default(),
        }
    }

    pub fn counts(&self) -> Counts {
        self.counts
    }
}

impl EventSink for Tally<'_> {
    fn record(&mut self, event: Event) {
        let c = &mut self.counts;
        match &event {
            Event::ScanFailed { .. } => c.scan_failed += 1,
            Event::Candidate { .. } => c.candidates += 1,
            Event::ParseFailed { .. } => c.parse_failed += 1,
            Event::MetadataFailed { .. } => c.metadata_failed += 1,
            Event::MetadataNotApplicable { .. } => {}
            Event::Unverified { .. } => c.unverified += 1,
            Event::Inconsistent { .. } => c.inconsistent += 1,
            Event::Applied { .. } => c.applied += 1,
            Event::DryRun { .. } => c.dry_run += 1,
            Event::MutationFailed { .. } => c.mutation_failed += 1,
        }
        self.inner.record(event);
    }
}
