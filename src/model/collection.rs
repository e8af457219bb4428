//! The collection seam consumed by the builder

use crate::error::Result;
use crate::model::{Playlist, Track};
use std::path::Path;

/// View of a music collection the builder operates on.
///
/// The builder reads tracks, attaches the generated playlist tree, and asks
/// the view to serialize itself; it never touches the underlying format.
/// Implementations own the platform-specific (de)serialization.
pub trait CollectionView {
    /// Iterate over all tracks in the collection
    fn tracks(&self) -> Box<dyn Iterator<Item = &Track> + '_>;

    /// Append a playlist tree at the root of the collection
    fn append_playlist(&mut self, playlist: Playlist);

    /// Remove all root playlists with the given name.
    /// Used to replace the output of a previous build.
    fn remove_playlists(&mut self, name: &str);

    /// Write the current state to an implementation-defined format
    fn serialize(&self, path: &Path) -> Result<()>;
}

/// In-memory collection, used by tests and callers that assemble tracks
/// programmatically. Serialization is a no-op.
#[derive(Debug, Default)]
pub struct MemoryCollection {
    tracks: Vec<Track>,
    playlists: Vec<Playlist>,
}

impl MemoryCollection {
    pub fn new(tracks: Vec<Track>) -> Self {
        Self {
            tracks,
            playlists: Vec::new(),
        }
    }

    /// Root playlists currently attached to the collection
    pub fn playlists(&self) -> &[Playlist] {
        &self.playlists
    }
}

impl CollectionView for MemoryCollection {
    fn tracks(&self) -> Box<dyn Iterator<Item = &Track> + '_> {
        Box::new(self.tracks.iter())
    }

    fn append_playlist(&mut self, playlist: Playlist) {
        self.playlists.push(playlist);
    }

    fn remove_playlists(&mut self, name: &str) {
        self.playlists.retain(|playlist| playlist.name() != name);
    }

    fn serialize(&self, _path: &Path) -> Result<()> {
        Ok(())
    }
}
