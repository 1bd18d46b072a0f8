pub mod date;
pub mod error;
pub mod events;
pub mod media;
pub mod metadata;
pub mod reconcile;
pub mod scan;
pub mod writer;

use std::path::PathBuf;

use anyhow::Context;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::date::{extract_metadata_date, parse_filename_date};
use crate::events::{Event, EventSink};
use crate::media::{MediaFile, MediaKind};
use crate::metadata::{Backend, MetadataService};
use crate::reconcile::{reconcile_dates, Resolution};
use crate::scan::Candidate;
use crate::writer::{FiletimeSink, MtimeSink, MutationOutcome};

pub use events::{Counts, LogSink, Tally};

fn default_include() -> String {
    scan::DEFAULT_INCLUDE.to_string()
}

fn default_use_metadata() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileOptions {
    pub roots: Vec<PathBuf>,
    /// Cross-check filename dates against embedded metadata
    #[serde(default = "default_use_metadata")]
    pub use_metadata: bool,
    /// Report intended changes without touching any file
    #[serde(default)]
    pub dry_run: bool,
    /// Candidate filename pattern
    #[serde(default = "default_include")]
    pub include: String,
    #[serde(default)]
    pub backend: Backend,
}

impl ReconcileOptions {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self {
            roots,
            use_metadata: true,
            dry_run: false,
            include: default_include(),
            backend: Backend::default(),
        }
    }

    pub fn include_regex(&self) -> anyhow::Result<Regex> {
        Regex::new(&self.include)
            .with_context(|| format!("invalid include pattern {:?}", self.include))
    }
}

/// Reconcile every candidate file under the configured roots, using the
/// metadata backend from `options` and writing mtimes with `filetime`.
pub fn reconcile_with_defaults(
    options: &ReconcileOptions,
    events: &mut dyn EventSink,
) -> anyhow::Result<()> {
    let metadata = options.backend.service();
    reconcile(options, metadata.as_ref(), &FiletimeSink, events)
}

/// Walk each root and reconcile every candidate file independently.
///
/// Per-file problems are reported to `events` and never stop the run; the
/// only error returned is an invalid include pattern, before any file is
/// looked at.
pub fn reconcile(
    options: &ReconcileOptions,
    metadata: &dyn MetadataService,
    sink: &dyn MtimeSink,
    events: &mut dyn EventSink,
) -> anyhow::Result<()> {
    let include = options.include_regex()?;

    for root in &options.roots {
        for candidate in scan::walk(root, &include) {
            match candidate {
                Ok(candidate) => process_file(candidate, options, metadata, sink, events),
                Err(error) => events.record(Event::ScanFailed { error }),
            }
        }
    }

    Ok(())
}

/// Filename date, metadata cross-check, then mtime for a single file.
fn process_file(
    candidate: Candidate,
    options: &ReconcileOptions,
    metadata: &dyn MetadataService,
    sink: &dyn MtimeSink,
    events: &mut dyn EventSink,
) {
    events.record(Event::Candidate {
        path: candidate.path.clone(),
    });
    let mut media = MediaFile::new(candidate.path, candidate.name);

    match parse_filename_date(&media.name) {
        Ok(parsed) => {
            media.filename_date = Some(parsed.date);
            media.kind = MediaKind::from_prefix(parsed.prefix);
        }
        Err(error) => {
            events.record(Event::ParseFailed {
                path: media.path.clone(),
                error,
            });
        }
    }

    // Without a filename date there is nothing for metadata to confirm.
    if options.use_metadata && media.filename_date.is_some() {
        match extract_metadata_date(metadata, &media.path) {
            Ok(Some(date)) => media.metadata_date = Some(date),
            Ok(None) => events.record(Event::MetadataNotApplicable {
                path: media.path.clone(),
            }),
            Err(error) => events.record(Event::MetadataFailed {
                path: media.path.clone(),
                error,
            }),
        }
    }

    let resolution = match reconcile_dates(media.filename_date, media.metadata_date, media.kind) {
        Ok(resolution) => resolution,
        Err(error) => {
            events.record(Event::Inconsistent {
                path: media.path,
                error,
            });
            return;
        }
    };

    let (date, confirmed) = match resolution {
        Resolution::Confirmed(date) => (date, true),
        Resolution::Unverified(date) => {
            events.record(Event::Unverified {
                path: media.path.clone(),
                date,
            });
            (date, false)
        }
        Resolution::Undetermined => return,
    };

    match sink.apply_mtime(&media.path, date, options.dry_run) {
        Ok(MutationOutcome::Applied) => events.record(Event::Applied {
            path: media.path,
            date,
            confirmed,
        }),
        Ok(MutationOutcome::DryRun(command)) => events.record(Event::DryRun {
            path: media.path,
            date,
            command,
        }),
        Err(error) => events.record(Event::MutationFailed {
            path: media.path,
            error,
        }),
    }
}
