//! Post-hoc playlist filters
//!
//! A filter is a pair of predicates: `matches_playlist` decides, from the
//! leaf name and its ancestor folder names, whether the filter applies;
//! `keep_track` decides which tracks survive. Filters are held in an
//! ordered registry and enabled by identifier at build time. For each leaf
//! where at least one enabled filter matches, only tracks every matching
//! filter keeps are retained.

use crate::error::{Error, Result};
use crate::index::TagIndex;
use crate::model::{Playlist, Track};
use std::collections::BTreeSet;

pub trait PlaylistFilter: Send + Sync + std::fmt::Debug {
    /// Identifier used in configuration to enable this filter
    fn id(&self) -> &'static str;

    /// Whether this filter applies to the leaf `name` under `ancestors`
    /// (outermost first).
    fn matches_playlist(&self, ancestors: &[&str], name: &str) -> bool;

    /// Whether `track` should remain in a matched leaf.
    fn keep_track(&self, ancestors: &[&str], name: &str, track: &Track) -> bool;
}

/// Ordered registry of available filters.
pub struct FilterRegistry {
    available: Vec<Box<dyn PlaylistFilter>>,
}

impl FilterRegistry {
    /// Registry with the stock filters under their default settings.
    pub fn stock() -> Self {
        Self {
            available: vec![
                Box::new(HipHopFilter),
                Box::new(MinimalDeepTechFilter),
                Box::new(ComplexTrackFilter::default()),
                Box::new(TransitionTrackFilter::default()),
            ],
        }
    }

    /// Add a filter (or replace the stock one with the same identifier).
    pub fn register(&mut self, filter: Box<dyn PlaylistFilter>) {
        self.available.retain(|f| f.id() != filter.id());
        self.available.push(filter);
    }

    /// Resolve enabled filter identifiers, preserving the requested order.
    pub fn select(&self, ids: &[String]) -> Result<Vec<&dyn PlaylistFilter>> {
        ids.iter()
            .map(|id| {
                self.available
                    .iter()
                    .find(|filter| filter.id() == id)
                    .map(|filter| &**filter)
                    .ok_or_else(|| Error::Config(format!("unknown playlist filter \"{id}\"")))
            })
            .collect()
    }
}

/// Apply the selected filters to every leaf of `tree`.
///
/// A track id the index cannot resolve is excluded with a diagnostic; one
/// bad track never poisons the rest of the leaf.
pub fn apply_filters(tree: &mut Playlist, filters: &[&dyn PlaylistFilter], index: &TagIndex) {
    let mut ancestors: Vec<String> = Vec::new();
    apply_inner(tree, &mut ancestors, filters, index);
}

fn apply_inner(
    node: &mut Playlist,
    ancestors: &mut Vec<String>,
    filters: &[&dyn PlaylistFilter],
    index: &TagIndex,
) {
    match node {
        Playlist::Folder { name, children } => {
            ancestors.push(name.clone());
            for child in children {
                apply_inner(child, ancestors, filters, index);
            }
            ancestors.pop();
        }
        Playlist::Leaf { name, tracks } => {
            let chain: Vec<&str> = ancestors.iter().map(String::as_str).collect();
            let matching: Vec<&&dyn PlaylistFilter> = filters
                .iter()
                .filter(|filter| filter.matches_playlist(&chain, name))
                .collect();
            if matching.is_empty() {
                return;
            }

            let before = tracks.len();
            tracks.retain(|id| match index.track(*id) {
                Some(track) => matching
                    .iter()
                    .all(|filter| filter.keep_track(&chain, name, track)),
                None => {
                    log::warn!("Dropping unresolvable track {id} from \"{name}\"");
                    false
                }
            });
            if tracks.len() != before {
                log::debug!(
                    "Filtered \"{name}\": {} of {before} tracks kept",
                    tracks.len()
                );
            }
        }
    }
}

fn chain_contains(ancestors: &[&str], name: &str) -> bool {
    ancestors.iter().any(|ancestor| *ancestor == name)
}

fn chain_contains_substring(ancestors: &[&str], leaf: &str, needle: &str) -> bool {
    leaf.to_lowercase().contains(needle)
        || ancestors
            .iter()
            .any(|ancestor| ancestor.to_lowercase().contains(needle))
}

/// Disambiguates "Hip Hop" playlists by folder context.
///
/// Under a "Bass" folder the leaf means bass-crossover hip hop, so tracks
/// tagged exclusively Hip Hop / R&B are dropped. Anywhere else the leaf
/// means pure hip hop, so only tracks tagged exclusively Hip Hop / R&B stay.
#[derive(Debug)]
pub struct HipHopFilter;

impl HipHopFilter {
    fn family_tag(tag: &str) -> bool {
        tag.eq_ignore_ascii_case("hip hop") || tag.eq_ignore_ascii_case("r&b")
    }
}

impl PlaylistFilter for HipHopFilter {
    fn id(&self) -> &'static str {
        "HipHopFilter"
    }

    fn matches_playlist(&self, _ancestors: &[&str], name: &str) -> bool {
        name == "Hip Hop"
    }

    fn keep_track(&self, ancestors: &[&str], _name: &str, track: &Track) -> bool {
        if chain_contains(ancestors, "Bass") {
            track
                .genre_tags
                .iter()
                .any(|tag| !Self::family_tag(tag))
        } else {
            track.genre_tags.iter().all(|tag| Self::family_tag(tag))
        }
    }
}

/// Disambiguates "Minimal Deep Tech" playlists between Techno and House
/// parent folders.
#[derive(Debug)]
pub struct MinimalDeepTechFilter;

const MINIMAL_DEEP_TECH: &str = "Minimal Deep Tech";

impl MinimalDeepTechFilter {
    fn has_other_tag_containing(track: &Track, needle: &str) -> bool {
        track
            .genre_tags
            .iter()
            .any(|tag| tag != MINIMAL_DEEP_TECH && tag.to_lowercase().contains(needle))
    }
}

impl PlaylistFilter for MinimalDeepTechFilter {
    fn id(&self) -> &'static str {
        "MinimalDeepTechFilter"
    }

    fn matches_playlist(&self, ancestors: &[&str], name: &str) -> bool {
        name == MINIMAL_DEEP_TECH
            && (chain_contains(ancestors, "Techno") || chain_contains(ancestors, "House"))
    }

    fn keep_track(&self, ancestors: &[&str], _name: &str, track: &Track) -> bool {
        if chain_contains(ancestors, "Techno") && !Self::has_other_tag_containing(track, "techno") {
            return false;
        }
        if chain_contains(ancestors, "House") && !Self::has_other_tag_containing(track, "house") {
            return false;
        }
        true
    }
}

/// Keeps only "complex" tracks: those carrying a minimum number of other
/// tags once housekeeping tags are excluded.
#[derive(Debug)]
pub struct ComplexTrackFilter {
    min_tags: usize,
    exclude_tags: BTreeSet<String>,
}

impl ComplexTrackFilter {
    pub fn new(min_tags: usize, exclude_tags: impl IntoIterator<Item = String>) -> Self {
        Self {
            min_tags,
            exclude_tags: exclude_tags.into_iter().collect(),
        }
    }
}

impl Default for ComplexTrackFilter {
    fn default() -> Self {
        Self::new(
            3,
            [
                "DELETE", "Flute", "Guitar", "Horn", "Piano", "Scratch", "Strings", "Vocal",
            ]
            .into_iter()
            .map(str::to_string),
        )
    }
}

impl PlaylistFilter for ComplexTrackFilter {
    fn id(&self) -> &'static str {
        "ComplexTrackFilter"
    }

    fn matches_playlist(&self, ancestors: &[&str], name: &str) -> bool {
        chain_contains_substring(ancestors, name, "complex")
    }

    fn keep_track(&self, _ancestors: &[&str], _name: &str, track: &Track) -> bool {
        let count = track
            .other_tags
            .iter()
            .filter(|tag| !self.exclude_tags.contains(*tag))
            .count();
        count >= self.min_tags && count > 0
    }
}

/// Keeps only tracks annotated for the transition type a playlist expects.
///
/// Transition playlists live under a folder (or carry a name) containing
/// "transition" and name exactly one of "genre" or "tempo". Tracks must
/// carry a bracketed annotation in their comment, e.g. `[ 126 / 140 ]` for
/// tempo or `[ Techno / Dubstep ]` for genre.
#[derive(Debug)]
pub struct TransitionTrackFilter {
    separator: char,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TransitionKind {
    Genre,
    Tempo,
}

impl TransitionTrackFilter {
    pub fn new(separator: char) -> Self {
        Self { separator }
    }

    fn playlist_kind(name: &str) -> Option<TransitionKind> {
        let name = name.to_lowercase();
        match (name.contains("genre"), name.contains("tempo")) {
            (true, false) => Some(TransitionKind::Genre),
            (false, true) => Some(TransitionKind::Tempo),
            (true, true) => {
                log::warn!("\"{name}\" matches both genre and tempo transition types");
                None
            }
            (false, false) => None,
        }
    }

    /// Bracketed annotation groups in a comment, e.g. `[126 / 140]`.
    fn annotation_groups(comment: &str) -> Vec<&str> {
        let mut groups = Vec::new();
        let mut rest = comment;
        while let Some(open) = rest.find('[') {
            let Some(close) = rest[open + 1..].find(']') else {
                break;
            };
            groups.push(&rest[open + 1..open + 1 + close]);
            rest = &rest[open + 1 + close + 1..];
        }
        groups
    }

    fn group_kind(&self, group: &str) -> TransitionKind {
        let all_numeric = group
            .split(self.separator)
            .all(|token| token.trim().parse::<f64>().is_ok());
        if all_numeric {
            TransitionKind::Tempo
        } else {
            TransitionKind::Genre
        }
    }
}

impl Default for TransitionTrackFilter {
    fn default() -> Self {
        Self::new('/')
    }
}

impl PlaylistFilter for TransitionTrackFilter {
    fn id(&self) -> &'static str {
        "TransitionTrackFilter"
    }

    fn matches_playlist(&self, ancestors: &[&str], name: &str) -> bool {
        chain_contains_substring(ancestors, name, "transition")
            && Self::playlist_kind(name).is_some()
    }

    fn keep_track(&self, _ancestors: &[&str], name: &str, track: &Track) -> bool {
        let Some(expected) = Self::playlist_kind(name) else {
            return false;
        };
        let groups = Self::annotation_groups(&track.comment);
        if groups.is_empty() {
            log::debug!(
                "Track {} has no transition annotation in its comment",
                track.id
            );
            return false;
        }
        groups.iter().any(|group| self.group_kind(group) == expected)
    }
}
