use chrono::NaiveDateTime;

use crate::error::ConsistencyError;
use crate::media::MediaKind;

/// Videos may be stamped in another timezone, so up to half a day apart.
pub const VIDEO_MAX_DRIFT_SECS: i64 = 43_200;
/// Timezone offsets are multiples of half an hour.
pub const VIDEO_ALIGNMENT_SECS: i64 = 1_800;
/// Slack around each half-hour boundary for encoding delay.
pub const VIDEO_ENCODING_ALLOWANCE_SECS: i64 = 360;
pub const STILL_MAX_DRIFT_SECS: i64 = 5;

/// Outcome of cross-checking the two candidate timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Metadata agrees with the filename.
    Confirmed(NaiveDateTime),
    /// No metadata to compare against; the filename date is used as-is.
    Unverified(NaiveDateTime),
    /// The filename carries no date, so there is nothing to apply.
    Undetermined,
}

impl Resolution {
    pub fn date(&self) -> Option<NaiveDateTime> {
        match self {
            Resolution::Confirmed(date) | Resolution::Unverified(date) => Some(*date),
            Resolution::Undetermined => None,
        }
    }
}

/// Decide the creation time of a file.
///
/// The filename date is always the value applied; metadata only serves as a
/// witness that the file was named correctly.
pub fn reconcile_dates(
    filename_date: Option<NaiveDateTime>,
    metadata_date: Option<NaiveDateTime>,
    kind: MediaKind,
) -> Result<Resolution, ConsistencyError> {
    let Some(filename_date) = filename_date else {
        return Ok(Resolution::Undetermined);
    };
    let Some(metadata_date) = metadata_date else {
        return Ok(Resolution::Unverified(filename_date));
    };

    let drift = (filename_date - metadata_date).num_seconds().abs();
    if drift_within_tolerance(drift, kind) {
        Ok(Resolution::Confirmed(filename_date))
    } else {
        Err(ConsistencyError {
            filename_date,
            metadata_date,
            drift,
        })
    }
}

/// Tolerance policy on an absolute drift in seconds.
pub fn drift_within_tolerance(drift: i64, kind: MediaKind) -> bool {
    match kind {
        MediaKind::Video => {
            let rem = drift % VIDEO_ALIGNMENT_SECS;
            drift < VIDEO_MAX_DRIFT_SECS
                && (rem <= VIDEO_ENCODING_ALLOWANCE_SECS
                    || rem >= VIDEO_ALIGNMENT_SECS - VIDEO_ENCODING_ALLOWANCE_SECS)
        }
        MediaKind::Still => drift < STILL_MAX_DRIFT_SECS,
    }
}
