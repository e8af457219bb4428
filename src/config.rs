//! Build configuration

use crate::error::{Error, Result};
use serde::Deserialize;

/// What to do with tags present in the collection but absent from the spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Remainder {
    /// Emit an "Unused Tags" folder with one playlist per remainder tag
    #[default]
    Folder,

    /// Emit a single "Unused Tags" playlist with the union of remainder tags
    Playlist,

    /// Skip remainder tags entirely
    None,
}

impl std::str::FromStr for Remainder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "folder" => Ok(Remainder::Folder),
            "playlist" => Ok(Remainder::Playlist),
            "none" => Ok(Remainder::None),
            other => Err(Error::Config(format!(
                "unknown remainder policy \"{other}\" (expected folder, playlist, or none)"
            ))),
        }
    }
}

/// Configuration consumed by the build pipeline
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Remainder policy for tags not referenced by the spec
    pub remainder: Remainder,

    /// Playlist filter identifiers to enable, applied in order
    pub enabled_filters: Vec<String>,

    /// Minimum track count for a tag playlist to survive pruning
    pub min_tag_playlist_tracks: usize,

    /// Minimum track count for a combiner playlist to survive pruning
    pub min_combiner_playlist_tracks: usize,

    /// Sentinel pair delimiting "other" tags inside a comment field
    pub other_tag_markers: (String, String),

    /// Delimiter between tags inside the genre field
    pub genre_delimiter: String,

    /// Print tag statistics for combiner playlists after the build
    pub verbose_statistics: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            remainder: Remainder::Folder,
            enabled_filters: Vec::new(),
            min_tag_playlist_tracks: 0,
            min_combiner_playlist_tracks: 0,
            other_tag_markers: ("/*".to_string(), "*/".to_string()),
            genre_delimiter: "/".to_string(),
            verbose_statistics: false,
        }
    }
}

impl BuildConfig {
    /// Set the remainder policy
    pub fn with_remainder(mut self, remainder: Remainder) -> Self {
        self.remainder = remainder;
        self
    }

    /// Enable the given playlist filters, in order
    pub fn with_filters(mut self, filters: Vec<String>) -> Self {
        self.enabled_filters = filters;
        self
    }

    /// Set the minimum track thresholds for tag and combiner playlists
    pub fn with_minimum_tracks(mut self, tag: usize, combiner: usize) -> Self {
        self.min_tag_playlist_tracks = tag;
        self.min_combiner_playlist_tracks = combiner;
        self
    }

    /// Validate values that serde's types cannot enforce.
    pub fn validate(&self) -> Result<()> {
        if self.other_tag_markers.0.is_empty() || self.other_tag_markers.1.is_empty() {
            return Err(Error::Config(
                "other_tag_markers must be a pair of non-empty sentinels".to_string(),
            ));
        }
        if self.genre_delimiter.is_empty() {
            return Err(Error::Config(
                "genre_delimiter must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
