//! Tag index: reverse maps from tags, playlist names, and attribute
//! predicates to track identifier sets
//!
//! Built once per run from the collection. Genre tags and "other" tags share
//! one namespace; a collision unions the two sets. The playlist-name
//! relation starts empty and is filled in while the tag playlist tree is
//! built, then frozen before combiner evaluation.

use crate::error::{Error, PatternError, Result};
use crate::expr::selector::{DateSpec, GlobPattern};
use crate::model::{Track, TrackId};
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet, HashMap};

#[derive(Debug, Default)]
pub struct TagIndex {
    /// tag name -> track ids; BTreeMap keeps `all_tag_names` sorted
    tags: BTreeMap<String, BTreeSet<TrackId>>,

    /// playlist name -> track ids, filled while the tag tree is built.
    /// A later playlist with the same name replaces the earlier entry.
    playlists: HashMap<String, BTreeSet<TrackId>>,

    /// per-track attribute snapshot backing the lazy predicates
    tracks: BTreeMap<TrackId, Track>,
}

impl TagIndex {
    /// Build the index from the collection's tracks.
    pub fn from_tracks<'a>(tracks: impl Iterator<Item = &'a Track>) -> Self {
        let mut index = TagIndex::default();
        for track in tracks {
            for tag in track.tags() {
                index
                    .tags
                    .entry(tag.to_string())
                    .or_default()
                    .insert(track.id);
            }
            index.tracks.insert(track.id, track.clone());
        }
        log::debug!(
            "Indexed {} tracks under {} tags",
            index.tracks.len(),
            index.tags.len()
        );
        index
    }

    /// Track ids carrying the given tag; empty set for unknown tags.
    pub fn tag(&self, name: &str) -> BTreeSet<TrackId> {
        self.tags.get(name).cloned().unwrap_or_default()
    }

    /// All tag names present in the collection, sorted.
    pub fn all_tag_names(&self) -> impl Iterator<Item = &str> {
        self.tags.keys().map(String::as_str)
    }

    /// Union of all tags whose lowercased name contains `pattern` after
    /// stripping asterisks and lowercasing. Backs wildcard tag literals.
    pub fn tags_matching(&self, pattern: &str) -> BTreeSet<TrackId> {
        let needle = pattern.replace('*', "").to_lowercase();
        self.tags
            .iter()
            .filter(|(tag, _)| tag.to_lowercase().contains(&needle))
            .flat_map(|(_, ids)| ids.iter().copied())
            .collect()
    }

    /// Look up a track by id.
    pub fn track(&self, id: TrackId) -> Option<&Track> {
        self.tracks.get(&id)
    }

    /// Record a materialized playlist so `{playlist:...}` selectors can
    /// reference it. A repeated name overwrites the earlier entry.
    pub fn register_playlist(&mut self, name: &str, tracks: &[TrackId]) {
        self.playlists
            .insert(name.to_string(), tracks.iter().copied().collect());
    }

    /// Tracks of a previously built playlist.
    pub fn playlist(&self, name: &str) -> Result<BTreeSet<TrackId>> {
        self.playlists
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownPlaylist(name.to_string()))
    }

    /// Tracks whose rounded BPM lies in `[lo, hi]` (inclusive).
    pub fn bpm_in(&self, lo: i64, hi: i64) -> BTreeSet<TrackId> {
        self.filter_tracks(|track| (lo..=hi).contains(&track.rounded_bpm()))
    }

    /// Tracks whose rating lies in `[lo, hi]` (inclusive).
    pub fn rating_in(&self, lo: i64, hi: i64) -> BTreeSet<TrackId> {
        self.filter_tracks(|track| (lo..=hi).contains(&track.rating))
    }

    /// Tracks whose release year lies in `[lo, hi]` (inclusive).
    pub fn year_in(&self, lo: i64, hi: i64) -> BTreeSet<TrackId> {
        self.filter_tracks(|track| {
            track
                .year
                .is_some_and(|year| (lo..=hi).contains(&i64::from(year)))
        })
    }

    /// Tracks whose date added satisfies the parsed date predicate.
    pub fn date_matches(&self, spec: &DateSpec, today: NaiveDate) -> BTreeSet<TrackId> {
        self.filter_tracks(|track| {
            track
                .date_added
                .is_some_and(|date| spec.matches(date, today))
        })
    }

    /// Tracks with at least one artist matching the pattern.
    pub fn artist_glob(&self, pattern: &str) -> std::result::Result<BTreeSet<TrackId>, PatternError> {
        Ok(self.artists_matching(&GlobPattern::parse(pattern)?))
    }

    /// Tracks whose label matches the pattern.
    pub fn label_glob(&self, pattern: &str) -> std::result::Result<BTreeSet<TrackId>, PatternError> {
        Ok(self.labels_matching(&GlobPattern::parse(pattern)?))
    }

    /// Tracks whose comment matches the pattern.
    pub fn comment_glob(&self, pattern: &str) -> std::result::Result<BTreeSet<TrackId>, PatternError> {
        Ok(self.comments_matching(&GlobPattern::parse(pattern)?))
    }

    /// Tracks whose key matches the pattern.
    pub fn key_glob(&self, pattern: &str) -> std::result::Result<BTreeSet<TrackId>, PatternError> {
        Ok(self.keys_matching(&GlobPattern::parse(pattern)?))
    }

    pub(crate) fn artists_matching(&self, pattern: &GlobPattern) -> BTreeSet<TrackId> {
        self.filter_tracks(|track| track.artists.iter().any(|artist| pattern.matches(artist)))
    }

    pub(crate) fn labels_matching(&self, pattern: &GlobPattern) -> BTreeSet<TrackId> {
        self.filter_tracks(|track| {
            track
                .label
                .as_deref()
                .is_some_and(|label| pattern.matches(label))
        })
    }

    pub(crate) fn comments_matching(&self, pattern: &GlobPattern) -> BTreeSet<TrackId> {
        self.filter_tracks(|track| pattern.matches(&track.comment))
    }

    pub(crate) fn keys_matching(&self, pattern: &GlobPattern) -> BTreeSet<TrackId> {
        self.filter_tracks(|track| track.key.as_deref().is_some_and(|key| pattern.matches(key)))
    }

    fn filter_tracks(&self, keep: impl Fn(&Track) -> bool) -> BTreeSet<TrackId> {
        self.tracks
            .values()
            .filter(|track| keep(track))
            .map(|track| track.id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(id: u64, genres: &[&str], others: &[&str]) -> Track {
        Track {
            id: TrackId(id),
            title: format!("Track {id}"),
            artists: vec!["Someone".to_string()],
            genre_tags: genres.iter().map(|s| s.to_string()).collect(),
            other_tags: others.iter().map(|s| s.to_string()).collect(),
            bpm: 120.0,
            rating: 0,
            year: None,
            date_added: None,
            label: None,
            key: None,
            comment: String::new(),
            location: String::new(),
        }
    }

    fn ids(set: &BTreeSet<TrackId>) -> Vec<u64> {
        set.iter().map(|id| id.0).collect()
    }

    #[test]
    fn test_genre_and_other_tags_share_namespace() {
        let tracks = vec![
            track(1, &["House"], &[]),
            track(2, &[], &["House"]),
            track(3, &["Techno"], &["Dark"]),
        ];
        let index = TagIndex::from_tracks(tracks.iter());
        assert_eq!(ids(&index.tag("House")), vec![1, 2]);
        assert_eq!(ids(&index.tag("Dark")), vec![3]);
        assert!(index.tag("Dubstep").is_empty());
    }

    #[test]
    fn test_all_tag_names_sorted() {
        let tracks = vec![track(1, &["Techno", "House"], &["Dark"])];
        let index = TagIndex::from_tracks(tracks.iter());
        let names: Vec<&str> = index.all_tag_names().collect();
        assert_eq!(names, vec!["Dark", "House", "Techno"]);
    }

    #[test]
    fn test_wildcard_tag_union() {
        let tracks = vec![
            track(1, &["Hard Techno"], &[]),
            track(2, &["Melodic Techno"], &[]),
            track(3, &["Tech House"], &[]),
        ];
        let index = TagIndex::from_tracks(tracks.iter());
        assert_eq!(ids(&index.tags_matching("*Techno*")), vec![1, 2]);
        assert_eq!(ids(&index.tags_matching("*tech*")), vec![1, 2, 3]);
    }

    #[test]
    fn test_playlist_relation() {
        let tracks = vec![track(1, &["House"], &[])];
        let mut index = TagIndex::from_tracks(tracks.iter());
        index.register_playlist("My Favorites", &[TrackId(1)]);

        assert_eq!(ids(&index.playlist("My Favorites").unwrap()), vec![1]);
        assert!(matches!(
            index.playlist("Missing"),
            Err(Error::UnknownPlaylist(name)) if name == "Missing"
        ));
    }

    #[test]
    fn test_playlist_reregistration_overwrites() {
        let mut index = TagIndex::default();
        index.register_playlist("X", &[TrackId(1)]);
        index.register_playlist("X", &[TrackId(2)]);
        assert_eq!(ids(&index.playlist("X").unwrap()), vec![2]);
    }

    #[test]
    fn test_bpm_rounding_in_range() {
        let mut fast = track(1, &[], &[]);
        fast.bpm = 140.3;
        let mut slow = track(2, &[], &[]);
        slow.bpm = 120.0;
        let tracks = vec![fast, slow];
        let index = TagIndex::from_tracks(tracks.iter());

        assert_eq!(ids(&index.bpm_in(138, 142)), vec![1]);
        assert_eq!(ids(&index.bpm_in(140, 140)), vec![1]);
        assert!(index.bpm_in(141, 150).is_empty());
    }

    #[test]
    fn test_rating_and_year_ranges() {
        let mut a = track(1, &[], &[]);
        a.rating = 5;
        a.year = Some(2022);
        let mut b = track(2, &[], &[]);
        b.rating = 2;
        let tracks = vec![a, b];
        let index = TagIndex::from_tracks(tracks.iter());

        assert_eq!(ids(&index.rating_in(5, 5)), vec![1]);
        assert_eq!(ids(&index.rating_in(1, 3)), vec![2]);
        assert_eq!(ids(&index.year_in(2020, 2023)), vec![1]);
        assert!(index.year_in(1990, 1999).is_empty());
    }

    #[test]
    fn test_artist_glob() {
        let mut a = track(1, &[], &[]);
        a.artists = vec!["Eprom".to_string(), "Alix Perez".to_string()];
        let tracks = vec![a, track(2, &[], &[])];
        let index = TagIndex::from_tracks(tracks.iter());

        assert_eq!(ids(&index.artist_glob("*eprom*").unwrap()), vec![1]);
        assert_eq!(ids(&index.artist_glob("Alix Perez").unwrap()), vec![1]);
        assert!(index.artist_glob("Perez").unwrap().is_empty());
        assert!(index.artist_glob("").is_err());
    }

    #[test]
    fn test_date_predicate() {
        let mut a = track(1, &[], &[]);
        a.date_added = NaiveDate::from_ymd_opt(2022, 6, 15);
        let tracks = vec![a, track(2, &[], &[])];
        let index = TagIndex::from_tracks(tracks.iter());
        let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

        let spec = DateSpec::parse("2022").unwrap();
        assert_eq!(ids(&index.date_matches(&spec, today)), vec![1]);
        let spec = DateSpec::parse(">2022-06").unwrap();
        assert!(index.date_matches(&spec, today).is_empty());
    }
}
