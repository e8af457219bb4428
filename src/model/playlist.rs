use crate::model::TrackId;
use serde::{Deserialize, Serialize};

/// A playlist tree node: either a folder of further playlists or a leaf
/// carrying tracks.
///
/// The tree is strictly hierarchical; nodes own their children exclusively
/// and carry no parent pointers. Traversals that need ancestor context
/// thread the name chain explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Playlist {
    /// A folder containing sub-playlists (ordered)
    Folder {
        name: String,
        children: Vec<Playlist>,
    },

    /// A playlist of tracks, ordered ascending by track id
    Leaf { name: String, tracks: Vec<TrackId> },
}

impl Playlist {
    /// Create a new empty folder
    pub fn folder(name: impl Into<String>) -> Self {
        Playlist::Folder {
            name: name.into(),
            children: Vec::new(),
        }
    }

    /// Create a leaf from an iterator of track ids, sorted ascending
    pub fn leaf(name: impl Into<String>, tracks: impl IntoIterator<Item = TrackId>) -> Self {
        let mut tracks: Vec<TrackId> = tracks.into_iter().collect();
        tracks.sort_unstable();
        tracks.dedup();
        Playlist::Leaf {
            name: name.into(),
            tracks,
        }
    }

    /// Name of this node
    pub fn name(&self) -> &str {
        match self {
            Playlist::Folder { name, .. } | Playlist::Leaf { name, .. } => name,
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, Playlist::Folder { .. })
    }

    /// Add a child to this folder. Appending to a leaf is ignored with a
    /// warning; the builders only ever append to folders.
    pub fn push(&mut self, child: Playlist) {
        match self {
            Playlist::Folder { children, .. } => children.push(child),
            Playlist::Leaf { name, .. } => {
                log::warn!("Ignoring playlist appended to non-folder \"{name}\"");
            }
        }
    }

    /// Children of a folder; empty slice for a leaf
    pub fn children(&self) -> &[Playlist] {
        match self {
            Playlist::Folder { children, .. } => children,
            Playlist::Leaf { .. } => &[],
        }
    }

    /// Tracks of a leaf; empty slice for a folder
    pub fn tracks(&self) -> &[TrackId] {
        match self {
            Playlist::Leaf { tracks, .. } => tracks,
            Playlist::Folder { .. } => &[],
        }
    }

    /// Total number of playlist nodes in this tree, excluding this node
    /// when it is a folder.
    pub fn count_playlists(&self) -> usize {
        match self {
            Playlist::Leaf { .. } => 1,
            Playlist::Folder { children, .. } => {
                children.iter().map(Playlist::count_playlists).sum::<usize>() + 1
            }
        }
    }

    /// Depth-first search for a node with the given name.
    pub fn find(&self, name: &str) -> Option<&Playlist> {
        if self.name() == name {
            return Some(self);
        }
        self.children().iter().find_map(|child| child.find(name))
    }

    /// Visit every leaf with its ancestor name chain (outermost first,
    /// excluding the leaf itself).
    pub fn visit_leaves<'a, F>(&'a self, visit: &mut F)
    where
        F: FnMut(&[&'a str], &'a Playlist),
    {
        let mut ancestors: Vec<&str> = Vec::new();
        self.visit_leaves_inner(&mut ancestors, visit);
    }

    fn visit_leaves_inner<'a, F>(&'a self, ancestors: &mut Vec<&'a str>, visit: &mut F)
    where
        F: FnMut(&[&'a str], &'a Playlist),
    {
        match self {
            Playlist::Leaf { .. } => visit(ancestors, self),
            Playlist::Folder { name, children } => {
                ancestors.push(name);
                for child in children {
                    child.visit_leaves_inner(ancestors, visit);
                }
                ancestors.pop();
            }
        }
    }
}
