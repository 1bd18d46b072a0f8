use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use chrono::DateTime;
use exif::{In, Reader, Tag, Value};

use super::{keys, MetadataMap, MetadataService};
use crate::error::ServiceError;

/// Seconds between 1904-01-01 (QuickTime epoch) and 1970-01-01.
const QUICKTIME_EPOCH_OFFSET: i64 = 2_082_844_800;

/// What exiftool prints for a zeroed QuickTime date.
const ZERO_DATE: &str = "0000:00:00 00:00:00";

/// EXIF tags and the exiftool keys they are reported under.
const EXIF_TAGS: [(Tag, &str); 3] = [
    (Tag::DateTimeOriginal, keys::EXIF_DATE_TIME_ORIGINAL),
    (Tag::DateTimeDigitized, keys::EXIF_CREATE_DATE),
    (Tag::DateTime, keys::EXIF_MODIFY_DATE),
];

/// Pure Rust metadata reader: EXIF for stills, the `mvhd` box for MP4.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeMetadata;

impl MetadataService for NativeMetadata {
    fn extract(&self, path: &Path) -> Result<MetadataMap, ServiceError> {
        let io_err = |source| ServiceError::Io {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(path).map_err(io_err)?;
        let len = file.metadata().map_err(io_err)?.len();
        let mut reader = BufReader::new(file);

        let mut head = Vec::with_capacity(12);
        (&mut reader).take(12).read_to_end(&mut head).map_err(io_err)?;
        reader.seek(SeekFrom::Start(0)).map_err(io_err)?;

        let mut map = MetadataMap::new();
        let Some(mime) = sniff_mime(&head).or_else(|| mime_guess::from_path(path).first_raw())
        else {
            return Ok(map);
        };
        map.insert(keys::MIME_TYPE.to_string(), mime.to_string());

        match mime {
            "image/jpeg" | "image/png" | "image/tiff" | "image/heic" | "image/webp" => {
                read_exif_dates(&mut reader, &mut map)?;
            }
            "video/mp4" | "video/quicktime" => {
                if let Some(date) = read_mvhd_creation(&mut reader, len).map_err(|e| match e {
                    BoxError::Io(source) => io_err(source),
                    BoxError::Malformed(msg) => ServiceError::Container(msg),
                })? {
                    map.insert(keys::QUICKTIME_CREATE_DATE.to_string(), date);
                }
            }
            _ => {}
        }

        Ok(map)
    }
}

/// Identify the container from its first bytes.
fn sniff_mime(head: &[u8]) -> Option<&'static str> {
    if head.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some("image/jpeg");
    }
    if head.starts_with(b"\x89PNG\r\n\x1a\n") {
        return Some("image/png");
    }
    if head.len() >= 12 && &head[4..8] == b"ftyp" {
        return match &head[8..12] {
            b"qt  " => Some("video/quicktime"),
            b"heic" | b"heix" | b"mif1" | b"msf1" => Some("image/heic"),
            _ => Some("video/mp4"),
        };
    }
    None
}

fn read_exif_dates<R: std::io::BufRead + Seek>(
    reader: &mut R,
    map: &mut MetadataMap,
) -> Result<(), ServiceError> {
    let exif = match Reader::new().read_from_container(reader) {
        Ok(exif) => exif,
        Err(exif::Error::NotFound(_)) => return Ok(()),
        Err(e) => return Err(ServiceError::Container(e.to_string())),
    };

    for (tag, key) in EXIF_TAGS {
        let Some(field) = exif.get_field(tag, In::PRIMARY) else {
            continue;
        };
        if let Value::Ascii(ref parts) = field.value {
            if let Some(raw) = parts.first() {
                let text = String::from_utf8_lossy(raw);
                let trimmed = text.trim().trim_matches('\0');
                if !trimmed.is_empty() {
                    map.insert(key.to_string(), trimmed.to_string());
                }
            }
        }
    }

    Ok(())
}

#[derive(Debug)]
enum BoxError {
    Io(std::io::Error),
    Malformed(String),
}

impl From<std::io::Error> for BoxError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

struct BoxHeader {
    kind: [u8; 4],
    body_start: u64,
    end: u64,
}

/// Read the box header at `pos`, or `None` once `limit` is reached.
fn read_box_header<R: Read + Seek>(
    reader: &mut R,
    pos: u64,
    limit: u64,
) -> Result<Option<BoxHeader>, BoxError> {
    if pos + 8 > limit {
        return Ok(None);
    }
    reader.seek(SeekFrom::Start(pos))?;
    let mut header = [0u8; 8];
    reader.read_exact(&mut header)?;
    let size32 = u32::from_be_bytes([header[0], header[1], header[2], header[3]]);
    let kind = [header[4], header[5], header[6], header[7]];

    let (size, header_len) = match size32 {
        0 => (limit - pos, 8),
        1 => {
            let mut large = [0u8; 8];
            reader.read_exact(&mut large)?;
            (u64::from_be_bytes(large), 16)
        }
        n => (n as u64, 8),
    };

    if size < header_len || pos.checked_add(size).map_or(true, |end| end > limit) {
        return Err(BoxError::Malformed(format!(
            "box {} at offset {} has invalid size {}",
            String::from_utf8_lossy(&kind),
            pos,
            size
        )));
    }

    Ok(Some(BoxHeader {
        kind,
        body_start: pos + header_len,
        end: pos + size,
    }))
}

/// Find the first child box of type `kind` between `start` and `end`.
fn find_box<R: Read + Seek>(
    reader: &mut R,
    kind: &[u8; 4],
    start: u64,
    end: u64,
) -> Result<Option<BoxHeader>, BoxError> {
    let mut pos = start;
    while let Some(header) = read_box_header(reader, pos, end)? {
        if &header.kind == kind {
            return Ok(Some(header));
        }
        pos = header.end;
    }
    Ok(None)
}

/// Creation time from `moov/mvhd`, rendered like exiftool (UTC, no zone).
fn read_mvhd_creation<R: Read + Seek>(reader: &mut R, len: u64) -> Result<Option<String>, BoxError> {
    let Some(moov) = find_box(reader, b"moov", 0, len)? else {
        return Ok(None);
    };
    let Some(mvhd) = find_box(reader, b"mvhd", moov.body_start, moov.end)? else {
        return Ok(None);
    };

    let body_len = mvhd.end - mvhd.body_start;
    if body_len < 4 {
        return Err(BoxError::Malformed(format!("mvhd body of {} bytes", body_len)));
    }
    reader.seek(SeekFrom::Start(mvhd.body_start))?;
    let mut version = [0u8; 4];
    reader.read_exact(&mut version)?;

    // version/flags, then creation and modification times
    let required = match version[0] {
        0 => 12,
        1 => 20,
        _ => 4,
    };
    if body_len < required {
        return Err(BoxError::Malformed(format!(
            "mvhd version {} body of {} bytes",
            version[0], body_len
        )));
    }

    let created = match version[0] {
        0 => {
            let mut buf = [0u8; 4];
            reader.read_exact(&mut buf)?;
            u32::from_be_bytes(buf) as u64
        }
        1 => {
            let mut buf = [0u8; 8];
            reader.read_exact(&mut buf)?;
            u64::from_be_bytes(buf)
        }
        v => return Err(BoxError::Malformed(format!("unsupported mvhd version {}", v))),
    };

    if created == 0 {
        return Ok(Some(ZERO_DATE.to_string()));
    }

    let unix = i64::try_from(created)
        .map_err(|_| BoxError::Malformed(format!("mvhd creation time {} out of range", created)))?
        - QUICKTIME_EPOCH_OFFSET;
    let date = DateTime::from_timestamp(unix, 0)
        .ok_or_else(|| BoxError::Malformed(format!("mvhd creation time {} out of range", created)))?;

    Ok(Some(date.naive_utc().format("%Y:%m:%d %H:%M:%S").to_string()))
}
