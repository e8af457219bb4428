//! Tag playlist tree construction
//!
//! Traverses the `tags` section of the spec depth-first, materializing one
//! leaf per named tag and appending an `All <folder>` aggregation leaf to
//! every non-root folder. A reserved `_ignore` folder excludes its listed
//! tags from the remainder computation without emitting playlists.

use crate::config::Remainder;
use crate::index::TagIndex;
use crate::model::{Playlist, TrackId};
use crate::spec::{SpecFolder, SpecNode};
use std::collections::BTreeSet;

/// Reserved folder name marking tags to exclude from the remainder.
const IGNORE_FOLDER: &str = "_ignore";

/// Prefix selecting the "pure" variant of a tag playlist.
const PURE_PREFIX: &str = "Pure ";

/// The built tag tree along with the tag bookkeeping the remainder needs.
#[derive(Debug)]
pub struct TagTreeOutput {
    pub tree: Playlist,
    /// Tags referenced by a plain leaf of the spec
    pub used: BTreeSet<String>,
    /// Tags listed under `_ignore` folders
    pub ignored: BTreeSet<String>,
}

/// Build the tag playlist tree. Every produced leaf (including `All`
/// aggregations) is registered in the index so combiner `{playlist:...}`
/// selectors can reference it.
pub fn build_tag_tree(spec: &SpecFolder, index: &mut TagIndex) -> TagTreeOutput {
    let mut used = BTreeSet::new();
    let mut ignored = BTreeSet::new();
    let tree = build_folder(spec, index, &mut used, &mut ignored, true)
        .unwrap_or_else(|| Playlist::folder(&spec.name));
    TagTreeOutput {
        tree,
        used,
        ignored,
    }
}

fn build_folder(
    folder: &SpecFolder,
    index: &mut TagIndex,
    used: &mut BTreeSet<String>,
    ignored: &mut BTreeSet<String>,
    is_root: bool,
) -> Option<Playlist> {
    if !is_root && folder.name == IGNORE_FOLDER {
        collect_ignored(folder, ignored);
        return None;
    }

    let mut node = Playlist::folder(&folder.name);
    for child in &folder.playlists {
        match child {
            SpecNode::Folder(inner) => {
                if let Some(built) = build_folder(inner, index, used, ignored, false) {
                    node.push(built);
                }
            }
            leaf => {
                let content = leaf.content().expect("non-folder nodes carry content");
                let name = leaf.display_name().expect("non-folder nodes carry a name");
                node.push(build_leaf(content, name, index, used));
            }
        }
    }

    if !is_root {
        let all = Playlist::leaf(format!("All {}", folder.name), leaf_union(&node));
        index.register_playlist(all.name(), all.tracks());
        node.push(all);
    }
    Some(node)
}

fn build_leaf(
    content: &str,
    name: &str,
    index: &mut TagIndex,
    used: &mut BTreeSet<String>,
) -> Playlist {
    let tracks: BTreeSet<TrackId> = if let Some(base) = content.strip_prefix(PURE_PREFIX) {
        pure_tracks(base, index)
    } else {
        used.insert(content.to_string());
        let tracks = index.tag(content);
        if tracks.is_empty() {
            log::warn!("There are no tracks with the tag \"{content}\"");
        }
        tracks
    };

    let leaf = Playlist::leaf(name, tracks);
    index.register_playlist(leaf.name(), leaf.tracks());
    leaf
}

/// Tracks tagged `base` whose genre tags all contain `base` as a
/// case-insensitive substring.
fn pure_tracks(base: &str, index: &TagIndex) -> BTreeSet<TrackId> {
    let tagged = index.tag(base);
    if tagged.is_empty() {
        log::warn!(
            "Can't build a \"Pure {base}\" playlist because no track carries that tag"
        );
        return BTreeSet::new();
    }

    let needle = base.to_lowercase();
    let pure: BTreeSet<TrackId> = tagged
        .into_iter()
        .filter(|id| {
            index.track(*id).is_some_and(|track| {
                track
                    .genre_tags
                    .iter()
                    .all(|tag| tag.to_lowercase().contains(&needle))
            })
        })
        .collect();
    if pure.is_empty() {
        log::warn!("No track is purely \"{base}\"");
    }
    pure
}

fn collect_ignored(folder: &SpecFolder, ignored: &mut BTreeSet<String>) {
    for node in &folder.playlists {
        match node {
            SpecNode::Folder(inner) => collect_ignored(inner, ignored),
            leaf => {
                if let Some(content) = leaf.content() {
                    ignored.insert(content.to_string());
                }
            }
        }
    }
}

/// Union of the tracks of every leaf under `node`, the leaf itself included.
pub fn leaf_union(node: &Playlist) -> BTreeSet<TrackId> {
    match node {
        Playlist::Leaf { tracks, .. } => tracks.iter().copied().collect(),
        Playlist::Folder { children, .. } => {
            let mut union = BTreeSet::new();
            for child in children {
                union.extend(leaf_union(child));
            }
            union
        }
    }
}

/// Build the remainder playlist for tags the spec never referenced.
/// Returns `None` when the policy is `none` or no tags remain.
pub fn build_remainder(
    index: &mut TagIndex,
    used: &BTreeSet<String>,
    ignored: &BTreeSet<String>,
    policy: Remainder,
) -> Option<Playlist> {
    if policy == Remainder::None {
        return None;
    }

    let remainder: Vec<String> = index
        .all_tag_names()
        .filter(|tag| !used.contains(*tag) && !ignored.contains(*tag))
        .map(str::to_string)
        .collect();
    if remainder.is_empty() {
        return None;
    }
    log::info!("{} tags fall into the remainder", remainder.len());

    match policy {
        Remainder::None => None,
        Remainder::Playlist => {
            let mut tracks = BTreeSet::new();
            for tag in &remainder {
                tracks.extend(index.tag(tag));
            }
            let leaf = Playlist::leaf("Unused Tags", tracks);
            index.register_playlist(leaf.name(), leaf.tracks());
            Some(leaf)
        }
        Remainder::Folder => {
            let mut folder = Playlist::folder("Unused Tags");
            for tag in &remainder {
                let leaf = Playlist::leaf(tag, index.tag(tag));
                index.register_playlist(leaf.name(), leaf.tracks());
                folder.push(leaf);
            }
            let all = Playlist::leaf("All Unused Tags", leaf_union(&folder));
            index.register_playlist(all.name(), all.tracks());
            folder.push(all);
            Some(folder)
        }
    }
}
