pub mod exiftool;
pub mod native;

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

pub use exiftool::ExiftoolMetadata;
pub use native::NativeMetadata;

/// Metadata keys in exiftool's `Group:Tag` spelling.
pub mod keys {
    pub const MIME_TYPE: &str = "File:MIMEType";
    pub const QUICKTIME_CREATE_DATE: &str = "QuickTime:CreateDate";
    pub const EXIF_DATE_TIME_ORIGINAL: &str = "EXIF:DateTimeOriginal";
    pub const EXIF_CREATE_DATE: &str = "EXIF:CreateDate";
    pub const EXIF_MODIFY_DATE: &str = "EXIF:ModifyDate";
}

/// Flat key/value view of a file's metadata.
pub type MetadataMap = BTreeMap<String, String>;

/// Anything that can read a file's metadata as a flat mapping.
///
/// Every call is self-contained: resources opened for one path are released
/// before `extract` returns.
pub trait MetadataService {
    fn extract(&self, path: &Path) -> Result<MetadataMap, ServiceError>;
}

/// Which metadata service the driver should build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Native,
    Exiftool,
}

impl Backend {
    pub fn service(self) -> Box<dyn MetadataService> {
        match self {
            Backend::Native => Box::new(NativeMetadata),
            Backend::Exiftool => Box::new(ExiftoolMetadata::default()),
        }
    }
}

impl std::str::FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "native" => Ok(Backend::Native),
            "exiftool" => Ok(Backend::Exiftool),
            other => Err(format!("unknown metadata backend: {}", other)),
        }
    }
}
