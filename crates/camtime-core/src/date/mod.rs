pub mod filename;
pub mod metadata;

pub use filename::{parse_filename_date, ParsedName, PrefixTag};
pub use metadata::{extract_metadata_date, select_metadata_date, MediaType, CORRUPTED_SENTINEL};
