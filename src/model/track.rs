use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a track within a collection.
///
/// Ordering on `TrackId` defines the deterministic track order within
/// playlist leaves (ascending).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct TrackId(pub u64);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Represents a single music track with the metadata the builder consumes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    /// Unique identifier for this track
    pub id: TrackId,

    /// Track title
    pub title: String,

    /// Artists, in the order they appear in the collection
    pub artists: Vec<String>,

    /// Genre tags, split from the raw genre field
    pub genre_tags: Vec<String>,

    /// Free-form tags extracted from the comment field
    pub other_tags: Vec<String>,

    /// BPM; rounded to the nearest integer for selector matching
    pub bpm: f64,

    /// Star rating in [0, 5]
    pub rating: i64,

    /// Release year, if the collection carries one
    pub year: Option<i32>,

    /// Date the track was added to the collection
    pub date_added: Option<NaiveDate>,

    /// Record label (optional)
    pub label: Option<String>,

    /// Musical key (Camelot or musical notation), if analyzed
    pub key: Option<String>,

    /// Full free-text comment, including any tag annotation
    pub comment: String,

    /// Path to the audio file, kept opaque
    pub location: String,
}

impl Track {
    /// All tags of this track: genre tags followed by other tags.
    /// Genre and other tags share a namespace for index lookups.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.genre_tags
            .iter()
            .chain(self.other_tags.iter())
            .map(String::as_str)
    }

    /// BPM rounded to the nearest integer, as used by numeric selectors.
    pub fn rounded_bpm(&self) -> i64 {
        self.bpm.round() as i64
    }
}

/// Split a raw genre field into individual tags.
///
/// Tags are trimmed; empty segments are dropped.
pub fn split_genre_tags(raw: &str, delimiter: &str) -> Vec<String> {
    raw.split(delimiter)
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

/// Extract "other" tags from a comment field.
///
/// Comments carry tags between sentinel markers, e.g.
/// `prefix /* Dark / Vocal */ suffix`. The substring between the first
/// opening marker and the following closing marker is split on `/`,
/// trimmed, with empty segments dropped. Text outside the markers is left
/// untouched in the comment itself.
pub fn extract_other_tags(comment: &str, markers: &(String, String)) -> Vec<String> {
    let (open, close) = (markers.0.as_str(), markers.1.as_str());
    let Some(start) = comment.find(open) else {
        return Vec::new();
    };
    let rest = &comment[start + open.len()..];
    let Some(end) = rest.find(close) else {
        return Vec::new();
    };
    rest[..end]
        .split('/')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}
