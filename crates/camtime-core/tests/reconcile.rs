use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use camtime_core::date::CORRUPTED_SENTINEL;
use camtime_core::error::{MetadataError, MutationError, ServiceError};
use camtime_core::events::Event;
use camtime_core::metadata::{keys, MetadataMap, MetadataService};
use camtime_core::writer::{local_file_time, FiletimeSink, MtimeSink, MutationOutcome};
use camtime_core::{reconcile, ReconcileOptions, Tally};
use chrono::{NaiveDate, NaiveDateTime};
use filetime::FileTime;
use tempfile::tempdir;

/// Metadata keyed by filename; unknown files make the service fail.
#[derive(Default)]
struct FakeMetadata {
    by_name: HashMap<String, MetadataMap>,
    calls: RefCell<Vec<PathBuf>>,
}

impl FakeMetadata {
    fn with(mut self, name: &str, entries: &[(&str, &str)]) -> Self {
        let map = entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.by_name.insert(name.to_string(), map);
        self
    }
}

impl MetadataService for FakeMetadata {
    fn extract(&self, path: &Path) -> Result<MetadataMap, ServiceError> {
        self.calls.borrow_mut().push(path.to_path_buf());
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        self.by_name
            .get(&name)
            .cloned()
            .ok_or_else(|| ServiceError::Output(format!("no metadata for {}", name)))
    }
}

/// Records every call, delegating to the real filetime sink.
#[derive(Default)]
struct RecordingSink {
    calls: RefCell<Vec<(PathBuf, NaiveDateTime, bool)>>,
    fail_for: Option<String>,
}

impl MtimeSink for RecordingSink {
    fn apply_mtime(
        &self,
        path: &Path,
        date: NaiveDateTime,
        dry_run: bool,
    ) -> Result<MutationOutcome, MutationError> {
        self.calls
            .borrow_mut()
            .push((path.to_path_buf(), date, dry_run));
        if self
            .fail_for
            .as_deref()
            .is_some_and(|name| path.ends_with(name))
        {
            return Err(MutationError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            });
        }
        FiletimeSink.apply_mtime(path, date, dry_run)
    }
}

fn dt(h: u32, m: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2023, 6, 15)
        .unwrap()
        .and_hms_opt(h, m, s)
        .unwrap()
}

fn touch(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    File::create(&path).unwrap();
    filetime::set_file_mtime(&path, FileTime::from_unix_time(1_000_000_000, 0)).unwrap();
    path
}

fn mtime(path: &Path) -> FileTime {
    FileTime::from_last_modification_time(&fs::metadata(path).unwrap())
}

fn options(root: &Path) -> ReconcileOptions {
    ReconcileOptions::new(vec![root.to_path_buf()])
}

#[test]
fn test_image_without_metadata_uses_filename_date() {
    let dir = tempdir().unwrap();
    let path = touch(dir.path(), "IMG_20230615_143022.jpg");
    let metadata = FakeMetadata::default();
    let sink = RecordingSink::default();
    let mut events: Vec<Event> = Vec::new();

    reconcile(&options(dir.path()), &metadata, &sink, &mut events).unwrap();

    assert_eq!(mtime(&path), local_file_time(dt(14, 30, 22)).unwrap());
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::MetadataFailed { error: MetadataError::Service(_), .. })));
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::Unverified { date, .. } if *date == dt(14, 30, 22))));
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::Applied { confirmed: false, .. })));
}

#[test]
fn test_video_outside_tolerance_is_left_untouched() {
    let dir = tempdir().unwrap();
    let path = touch(dir.path(), "VID_20230615_143022.mp4");
    let before = mtime(&path);
    let metadata = FakeMetadata::default().with(
        "VID_20230615_143022.mp4",
        &[
            (keys::MIME_TYPE, "video/mp4"),
            (keys::QUICKTIME_CREATE_DATE, "2023:06:15 08:10:00"),
        ],
    );
    let sink = RecordingSink::default();
    let mut events: Vec<Event> = Vec::new();

    reconcile(&options(dir.path()), &metadata, &sink, &mut events).unwrap();

    assert!(sink.calls.borrow().is_empty());
    assert_eq!(mtime(&path), before);
    let drift = events.iter().find_map(|e| match e {
        Event::Inconsistent { error, .. } => Some(error.drift),
        _ => None,
    });
    assert_eq!(drift, Some(22_822));
}

#[test]
fn test_video_in_other_timezone_is_confirmed() {
    let dir = tempdir().unwrap();
    let path = touch(dir.path(), "VID_20230615_143022.mp4");
    let metadata = FakeMetadata::default().with(
        "VID_20230615_143022.mp4",
        &[
            (keys::MIME_TYPE, "video/mp4"),
            (keys::QUICKTIME_CREATE_DATE, "2023:06:15 12:31:00"),
        ],
    );
    let sink = RecordingSink::default();
    let mut events: Vec<Event> = Vec::new();

    reconcile(&options(dir.path()), &metadata, &sink, &mut events).unwrap();

    assert_eq!(mtime(&path), local_file_time(dt(14, 30, 22)).unwrap());
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::Applied { confirmed: true, .. })));
}

#[test]
fn test_sentinel_falls_back_to_next_field() {
    let dir = tempdir().unwrap();
    let path = touch(dir.path(), "IMG_20230615_143022.jpg");
    let metadata = FakeMetadata::default().with(
        "IMG_20230615_143022.jpg",
        &[
            (keys::MIME_TYPE, "image/jpeg"),
            (keys::EXIF_DATE_TIME_ORIGINAL, CORRUPTED_SENTINEL),
            (keys::EXIF_CREATE_DATE, "2023:06:15 14:30:19"),
        ],
    );
    let sink = RecordingSink::default();
    let mut events: Vec<Event> = Vec::new();

    reconcile(&options(dir.path()), &metadata, &sink, &mut events).unwrap();

    assert_eq!(
        sink.calls.borrow().as_slice(),
        &[(path.clone(), dt(14, 30, 22), false)]
    );
    assert_eq!(mtime(&path), local_file_time(dt(14, 30, 22)).unwrap());
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::Applied { confirmed: true, .. })));
}

#[test]
fn test_only_grammar_matches_are_mutated() {
    let dir = tempdir().unwrap();
    let good = touch(dir.path(), "IMG_20230615_143022.jpg");
    let bad = touch(dir.path(), "IMG_holiday.jpg");
    let ignored = touch(dir.path(), "notes.txt");
    let before_bad = mtime(&bad);
    let metadata = FakeMetadata::default();
    let sink = RecordingSink::default();
    let mut events: Vec<Event> = Vec::new();

    reconcile(&options(dir.path()), &metadata, &sink, &mut events).unwrap();

    let calls = sink.calls.borrow();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, good);
    assert_eq!(mtime(&bad), before_bad);
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::ParseFailed { path, .. } if *path == bad)));
    assert!(!events.iter().any(|e| match e {
        Event::Candidate { path } => *path == ignored,
        _ => false,
    }));
    // Unparseable names never reach the metadata service
    assert_eq!(metadata.calls.borrow().as_slice(), &[good]);
}

#[test]
fn test_dry_run_changes_nothing() {
    let dir = tempdir().unwrap();
    let path = touch(dir.path(), "IMG_20230615_143022.jpg");
    let before = mtime(&path);
    let metadata = FakeMetadata::default();
    let sink = RecordingSink::default();
    let mut events: Vec<Event> = Vec::new();
    let mut opts = options(dir.path());
    opts.dry_run = true;

    reconcile(&opts, &metadata, &sink, &mut events).unwrap();

    assert_eq!(mtime(&path), before);
    assert_eq!(sink.calls.borrow().len(), 1);
    let command = events.iter().find_map(|e| match e {
        Event::DryRun { command, .. } => Some(command.clone()),
        _ => None,
    });
    assert_eq!(
        command,
        Some(format!(
            "touch -m -d '2023-06-15 14:30:22' '{}'",
            path.display()
        ))
    );
}

#[test]
fn test_no_metadata_option_skips_service() {
    let dir = tempdir().unwrap();
    touch(dir.path(), "IMG_20230615_143022.jpg");
    let metadata = FakeMetadata::default();
    let sink = RecordingSink::default();
    let mut events: Vec<Event> = Vec::new();
    let mut opts = options(dir.path());
    opts.use_metadata = false;

    reconcile(&opts, &metadata, &sink, &mut events).unwrap();

    assert!(metadata.calls.borrow().is_empty());
    assert_eq!(sink.calls.borrow().len(), 1);
    assert!(events.iter().any(|e| matches!(e, Event::Unverified { .. })));
}

#[test]
fn test_failures_do_not_stop_the_run() {
    let dir = tempdir().unwrap();
    touch(dir.path(), "IMG_20230615_143022.jpg");
    let later = touch(dir.path(), "IMG_20230616_090000.jpg");
    let metadata = FakeMetadata::default();
    let sink = RecordingSink {
        fail_for: Some("IMG_20230615_143022.jpg".to_string()),
        ..Default::default()
    };
    let mut recorded: Vec<Event> = Vec::new();
    let mut opts = options(dir.path());
    opts.roots.insert(0, dir.path().join("missing"));

    let counts = {
        let mut tally = Tally::new(&mut recorded);
        reconcile(&opts, &metadata, &sink, &mut tally).unwrap();
        tally.counts()
    };

    assert_eq!(counts.scan_failed, 1);
    assert_eq!(counts.candidates, 2);
    assert_eq!(counts.mutation_failed, 1);
    assert_eq!(counts.applied, 1);
    let expected = NaiveDate::from_ymd_opt(2023, 6, 16)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap();
    assert_eq!(mtime(&later), local_file_time(expected).unwrap());
    assert!(recorded.iter().any(|e| matches!(
        e,
        Event::MutationFailed { path, .. } if path.ends_with("IMG_20230615_143022.jpg")
    )));
}

#[test]
fn test_invalid_include_pattern_is_rejected() {
    let dir = tempdir().unwrap();
    let mut opts = options(dir.path());
    opts.include = "(".to_string();
    let mut events: Vec<Event> = Vec::new();

    let result = reconcile(&opts, &FakeMetadata::default(), &FiletimeSink, &mut events);
    assert!(result.is_err());
    assert!(events.is_empty());
}
