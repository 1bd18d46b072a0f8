use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use std::sync::LazyLock;

use crate::error::ParseError;

/// Full camera/screenshot naming grammar, anchored at both ends.
///
/// Date and time digit groups may be separated by `-` or not at all, so both
/// `IMG_20230615_143022.jpg` and `Screenshot_2023-06-15-14-30-22.png` match.
static NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^(?:(?P<tag>IMG|PANO|TINYPLANET_PANO|VID|Screenshot)_)?",
        r"(?P<y>\d{4})-?(?P<mo>\d{2})-?(?P<d>\d{2})",
        r"[_-]",
        r"(?P<h>\d{2})-?(?P<mi>\d{2})-?(?P<s>\d{2})",
        r"(?:\d{3})?",
        r"(?:_\d{13})?",
        r"(?:_(?:BURST\d\d)?\d)?",
        r"(?:_(?:HDR|COVER_TOP|COVER|TOP))?",
        r"\.[a-z]{3}$",
    ))
    .unwrap()
});

/// Recognized filename prefix tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixTag {
    Img,
    Pano,
    TinyPlanetPano,
    Vid,
    Screenshot,
}

impl PrefixTag {
    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "IMG" => Some(Self::Img),
            "PANO" => Some(Self::Pano),
            "TINYPLANET_PANO" => Some(Self::TinyPlanetPano),
            "VID" => Some(Self::Vid),
            "Screenshot" => Some(Self::Screenshot),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Img => "IMG",
            Self::Pano => "PANO",
            Self::TinyPlanetPano => "TINYPLANET_PANO",
            Self::Vid => "VID",
            Self::Screenshot => "Screenshot",
        }
    }

    pub fn is_video(self) -> bool {
        matches!(self, Self::Vid)
    }
}

/// A filename that matched the naming grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedName {
    pub prefix: Option<PrefixTag>,
    pub date: NaiveDateTime,
}

/// Parse the capture timestamp encoded in a camera filename.
///
/// The millisecond, epoch, burst and semantic suffixes are accepted but not
/// folded into the result: the returned value has whole-second precision.
pub fn parse_filename_date(name: &str) -> Result<ParsedName, ParseError> {
    let caps = NAME_RE
        .captures(name)
        .ok_or_else(|| ParseError::new(name))?;

    let field = |group: &str| -> Result<u32, ParseError> {
        caps.name(group)
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .ok_or_else(|| ParseError::new(name))
    };

    let date = NaiveDate::from_ymd_opt(field("y")? as i32, field("mo")?, field("d")?)
        .and_then(|d| d.and_hms_opt(field("h").ok()?, field("mi").ok()?, field("s").ok()?))
        .ok_or_else(|| ParseError::new(name))?;

    let prefix = caps.name("tag").and_then(|m| PrefixTag::from_tag(m.as_str()));

    Ok(ParsedName { prefix, date })
}
