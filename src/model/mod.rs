//! Data model: tracks, playlist trees, and the collection seam

pub mod collection;
pub mod playlist;
pub mod track;

pub use collection::{CollectionView, MemoryCollection};
pub use playlist::Playlist;
pub use track::{extract_other_tags, split_genre_tags, Track, TrackId};
