//! Playlist Builder - automatic DJ playlist hierarchies
//!
//! This library builds a tree of playlists from the tags of a music
//! collection: one playlist per tag as laid out by a spec document, plus
//! "combiner" playlists evaluated from boolean expressions over tags,
//! playlists, and track attributes.

pub mod build;
pub mod config;
pub mod error;
pub mod expr;
pub mod index;
pub mod model;
pub mod rekordbox;
pub mod spec;

pub use build::{FilterRegistry, PlaylistBuilder, PLAYLIST_BUILDER_ROOT};
pub use config::{BuildConfig, Remainder};
pub use error::{Error, Result};
pub use spec::PlaylistSpec;
