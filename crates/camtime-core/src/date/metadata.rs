use std::path::Path;

use chrono::NaiveDateTime;

use crate::error::MetadataError;
use crate::metadata::{keys, MetadataMap, MetadataService};

/// Placeholder date written by buggy camera firmware instead of the real
/// capture time.
pub const CORRUPTED_SENTINEL: &str = "2002:12:08 12:00:00";

const METADATA_DATE_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

const VIDEO_KEYS: &[&str] = &[keys::QUICKTIME_CREATE_DATE];
const STILL_KEYS: &[&str] = &[
    keys::EXIF_DATE_TIME_ORIGINAL,
    keys::EXIF_CREATE_DATE,
    keys::EXIF_MODIFY_DATE,
];

/// Media types that carry a usable capture timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Mp4,
    Png,
    Jpeg,
}

impl MediaType {
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.trim() {
            "video/mp4" => Some(Self::Mp4),
            "image/png" => Some(Self::Png),
            "image/jpeg" => Some(Self::Jpeg),
            _ => None,
        }
    }

    /// Keys to try, most trustworthy first.
    pub fn date_keys(self) -> &'static [&'static str] {
        match self {
            Self::Mp4 => VIDEO_KEYS,
            Self::Png | Self::Jpeg => STILL_KEYS,
        }
    }

    /// Whether this type is affected by the firmware sentinel date.
    pub fn skips_sentinel(self) -> bool {
        match self {
            Self::Mp4 => false,
            Self::Png | Self::Jpeg => true,
        }
    }
}

/// Query the metadata service once and pick the capture timestamp.
///
/// `Ok(None)` means there is nothing to compare against: the MIME type is
/// not one we know, or every candidate field held the firmware sentinel.
pub fn extract_metadata_date(
    service: &dyn MetadataService,
    path: &Path,
) -> Result<Option<NaiveDateTime>, MetadataError> {
    let map = service.extract(path)?;
    select_metadata_date(&map)
}

/// Pick the capture timestamp out of an already extracted mapping.
pub fn select_metadata_date(map: &MetadataMap) -> Result<Option<NaiveDateTime>, MetadataError> {
    let Some(media_type) = map.get(keys::MIME_TYPE).and_then(|m| MediaType::from_mime(m)) else {
        return Ok(None);
    };

    let mut saw_sentinel = false;
    for &key in media_type.date_keys() {
        let Some(raw) = map.get(key) else {
            continue;
        };
        let value = clean_value(raw);
        if media_type.skips_sentinel() && value == CORRUPTED_SENTINEL {
            saw_sentinel = true;
            continue;
        }
        return NaiveDateTime::parse_from_str(value, METADATA_DATE_FORMAT)
            .map(Some)
            .map_err(|_| MetadataError::Format {
                key,
                value: raw.clone(),
            });
    }

    if saw_sentinel {
        Ok(None)
    } else {
        Err(MetadataError::MissingField {
            keys: media_type.date_keys().to_vec(),
        })
    }
}

fn clean_value(raw: &str) -> &str {
    raw.trim().trim_matches('\0').trim()
}
