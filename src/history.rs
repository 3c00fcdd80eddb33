use std::collections::{BTreeMap, HashMap};
use std::io::BufRead;
use std::path::Path;
use std::sync::LazyLock;

use chrono::NaiveDate;
use indicatif::{ProgressBar, ProgressStyle};
use regex::Regex;
use thiserror::Error;
use walkdir::WalkDir;

use crate::HISTORY_EXTENSION;

#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("history source {name:?} is not named by a date")]
    BadDate { name: String },
    #[error("entry {entry:?} on {day} has no preceding metadata block")]
    MissingMetadata { day: NaiveDate, entry: String },
    #[error("metadata block on {day} has no time field (entry {entry:?})")]
    MissingTime { day: NaiveDate, entry: String },
    #[error("unparseable time of day {value:?}")]
    BadTime { value: String },
}

/// One play of one file: which day, and seconds since that day's midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayEvent {
    pub day: NaiveDate,
    pub seconds: u32,
}

/// All plays of one specific file, in source order (not chronological).
pub type FileSeries = Vec<PlayEvent>;

/// File path → its series. Ordered so downstream iteration is deterministic.
pub type SeriesMap = BTreeMap<String, FileSeries>;

/// Marker prefix for playlist metadata lines.
const METADATA_MARKER: &str = "#EXTVDJ:";

// <tag>value</tag> runs inside a metadata line. The regex crate has no
// backreferences, so open and close names are captured separately and
// compared for equality.
static META_FIELD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<(?P<open>[^<>/]+)>(?P<value>[^<>]+)</(?P<close>[^<>/]+)>").unwrap()
});

// H:MM / HH:MM, anchored. Anything else is not a time of day.
static TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2}):(\d{2})$").unwrap());

/// Convert a wall-clock `HH:MM` string into seconds since midnight.
pub fn parse_time(s: &str) -> Result<u32, HistoryError> {
    let caps = TIME_RE.captures(s).ok_or_else(|| HistoryError::BadTime {
        value: s.to_string(),
    })?;
    let hours: u32 = caps[1].parse().expect("digits match");
    let minutes: u32 = caps[2].parse().expect("digits match");
    Ok(hours * 3600 + minutes * 60)
}

/// Parse a metadata marker line into a flat tag→value mapping.
fn parse_metadata(line: &str) -> HashMap<String, String> {
    META_FIELD_RE
        .captures_iter(line)
        .filter(|caps| caps["open"] == caps["close"])
        .map(|caps| (caps["open"].to_string(), caps["value"].to_string()))
        .collect()
}

/// Scan one playlist source for calendar day `day`, appending one PlayEvent
/// per plain entry to that entry's series in `out`.
///
/// A metadata line applies to every plain entry that follows it, until the
/// next metadata line. Entries before any metadata, or under a block with a
/// missing or malformed time, poison the run (fail-fast).
pub fn parse_playlist(
    day: NaiveDate,
    reader: impl BufRead,
    out: &mut SeriesMap,
) -> Result<(), HistoryError> {
    let mut metadata: Option<HashMap<String, String>> = None;

    for line in reader.lines() {
        let line = line?;
        if let Some(rest) = line.strip_prefix(METADATA_MARKER) {
            metadata = Some(parse_metadata(rest));
        } else {
            let entry = line.trim_end_matches(['\r', '\n']);
            if entry.is_empty() {
                continue;
            }
            let meta = metadata.as_ref().ok_or_else(|| HistoryError::MissingMetadata {
                day,
                entry: entry.to_string(),
            })?;
            let time = meta.get("time").ok_or_else(|| HistoryError::MissingTime {
                day,
                entry: entry.to_string(),
            })?;
            let seconds = parse_time(time)?;
            out.entry(entry.to_string())
                .or_default()
                .push(PlayEvent { day, seconds });
        }
    }

    Ok(())
}

/// Discover and scan every playlist under the history tree.
///
/// Sources are sorted by path before parsing so the merge order (and with
/// it all downstream tie-breaking) is reproducible across platforms.
pub fn load(dir: &Path) -> Result<SeriesMap, HistoryError> {
    let mut sources: Vec<std::path::PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .and_then(|x| x.to_str())
                .is_some_and(|x| x.eq_ignore_ascii_case(HISTORY_EXTENSION))
        })
        .map(|e| e.into_path())
        .collect();
    sources.sort();

    let pb = ProgressBar::new(sources.len() as u64);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
        )
        .unwrap()
        .progress_chars("#>-"),
    );
    pb.set_message("Reading history...");

    let mut series = SeriesMap::new();
    for path in &sources {
        log::debug!("history source {}", path.display());
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        let day = NaiveDate::parse_from_str(stem, "%Y-%m-%d").map_err(|_| {
            HistoryError::BadDate {
                name: stem.to_string(),
            }
        })?;
        let file = std::fs::File::open(path)?;
        parse_playlist(day, std::io::BufReader::new(file), &mut series)?;
        pb.inc(1);
    }
    pb.finish_with_message(format!(
        "{} sources, {} distinct files",
        sources.len(),
        series.len()
    ));

    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    // === Time parsing ===

    #[test]
    fn time_is_linear_seconds() {
        assert_eq!(parse_time("00:00").unwrap(), 0);
        assert_eq!(parse_time("20:00").unwrap(), 20 * 3600);
        assert_eq!(parse_time("19:35").unwrap(), 19 * 3600 + 35 * 60);
        assert_eq!(parse_time("9:05").unwrap(), 9 * 3600 + 5 * 60);
    }

    #[test]
    fn non_time_shapes_fail() {
        for bad in ["", "20", "20:0", "20:000", "late", "20:15:30", " 20:15"] {
            assert!(parse_time(bad).is_err(), "{bad:?} should not parse");
        }
    }

    // === Metadata lines ===

    #[test]
    fn metadata_fields_parse() {
        let meta = parse_metadata("<time>20:01</time><lastplaytime>1654110060</lastplaytime>");
        assert_eq!(meta.get("time").map(String::as_str), Some("20:01"));
        assert_eq!(
            meta.get("lastplaytime").map(String::as_str),
            Some("1654110060")
        );
    }

    #[test]
    fn mismatched_close_tag_is_skipped() {
        let meta = parse_metadata("<time>20:01</date>");
        assert!(meta.is_empty());
    }

    // === Playlist scan ===

    #[test]
    fn entries_inherit_most_recent_metadata() {
        let playlist = "\
#EXTVDJ:<time>20:00</time>
a.mp3
b.mp3
#EXTVDJ:<time>21:30</time>
a.mp3
";
        let mut series = SeriesMap::new();
        parse_playlist(day("2022-06-01"), Cursor::new(playlist), &mut series).unwrap();

        assert_eq!(series["a.mp3"].len(), 2);
        assert_eq!(series["a.mp3"][0].seconds, 20 * 3600);
        assert_eq!(series["a.mp3"][1].seconds, 21 * 3600 + 30 * 60);
        assert_eq!(series["b.mp3"], vec![PlayEvent {
            day: day("2022-06-01"),
            seconds: 20 * 3600,
        }]);
    }

    #[test]
    fn sources_merge_into_one_series() {
        let mut series = SeriesMap::new();
        parse_playlist(
            day("2022-06-01"),
            Cursor::new("#EXTVDJ:<time>20:00</time>\na.mp3\n"),
            &mut series,
        )
        .unwrap();
        parse_playlist(
            day("2022-06-02"),
            Cursor::new("#EXTVDJ:<time>20:00</time>\na.mp3\n"),
            &mut series,
        )
        .unwrap();

        assert_eq!(series.len(), 1);
        assert_eq!(series["a.mp3"].len(), 2);
        assert_eq!(series["a.mp3"][1].day, day("2022-06-02"));
    }

    #[test]
    fn entry_before_metadata_is_fatal() {
        let mut series = SeriesMap::new();
        let err =
            parse_playlist(day("2022-06-01"), Cursor::new("a.mp3\n"), &mut series).unwrap_err();
        assert!(matches!(err, HistoryError::MissingMetadata { .. }));
    }

    #[test]
    fn metadata_without_time_is_fatal() {
        let mut series = SeriesMap::new();
        let err = parse_playlist(
            day("2022-06-01"),
            Cursor::new("#EXTVDJ:<filesize>9</filesize>\na.mp3\n"),
            &mut series,
        )
        .unwrap_err();
        assert!(matches!(err, HistoryError::MissingTime { .. }));
    }

    #[test]
    fn malformed_time_is_fatal() {
        let mut series = SeriesMap::new();
        let err = parse_playlist(
            day("2022-06-01"),
            Cursor::new("#EXTVDJ:<time>evening</time>\na.mp3\n"),
            &mut series,
        )
        .unwrap_err();
        match err {
            HistoryError::BadTime { value } => assert_eq!(value, "evening"),
            other => panic!("expected BadTime, got {other:?}"),
        }
    }

    #[test]
    fn blank_lines_are_ignored() {
        let mut series = SeriesMap::new();
        parse_playlist(
            day("2022-06-01"),
            Cursor::new("#EXTVDJ:<time>20:00</time>\n\na.mp3\n\n"),
            &mut series,
        )
        .unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series["a.mp3"].len(), 1);
    }
}
