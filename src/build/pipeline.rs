//! End-to-end playlist build orchestration

use crate::build::combiner::build_combiner_tree;
use crate::build::filters::{apply_filters, FilterRegistry};
use crate::build::stats::print_tag_statistics;
use crate::build::tags::{build_remainder, build_tag_tree};
use crate::config::BuildConfig;
use crate::error::Result;
use crate::index::TagIndex;
use crate::model::{CollectionView, Playlist};
use crate::spec::PlaylistSpec;
use chrono::NaiveDate;

/// Name of the root folder the builder attaches to the collection.
pub const PLAYLIST_BUILDER_ROOT: &str = "PLAYLIST_BUILDER";

/// Drives the full playlist build against a collection.
pub struct PlaylistBuilder {
    config: BuildConfig,
    registry: FilterRegistry,
}

impl PlaylistBuilder {
    /// Create a builder with the stock filter registry.
    ///
    /// Configuration is validated up front, including that every enabled
    /// filter identifier resolves.
    pub fn new(config: BuildConfig) -> Result<Self> {
        Self::with_registry(config, FilterRegistry::stock())
    }

    /// Create a builder with a caller-supplied filter registry.
    pub fn with_registry(config: BuildConfig, registry: FilterRegistry) -> Result<Self> {
        config.validate()?;
        registry.select(&config.enabled_filters)?;
        Ok(Self { config, registry })
    }

    /// Run the build, attaching the generated tree to the collection under
    /// [`PLAYLIST_BUILDER_ROOT`]. Relative date selectors resolve against
    /// the current local date.
    pub fn build<C: CollectionView>(&self, collection: &mut C, spec: &PlaylistSpec) -> Result<()> {
        self.build_as_of(collection, spec, chrono::Local::now().date_naive())
    }

    /// Run the build with an explicit "today" for date selectors.
    pub fn build_as_of<C: CollectionView>(
        &self,
        collection: &mut C,
        spec: &PlaylistSpec,
        today: NaiveDate,
    ) -> Result<()> {
        if spec.is_empty() {
            log::warn!("Not building playlists because the playlist spec is empty");
            return Ok(());
        }

        log::info!("Building the tag index");
        let mut index = TagIndex::from_tracks(collection.tracks());

        // Tag playlists and remainder.
        let mut tag_trees: Vec<Playlist> = Vec::new();
        if let Some(tags) = &spec.tags {
            log::info!("Building tag playlists from \"{}\"", tags.name);
            let output = build_tag_tree(tags, &mut index);
            let remainder = build_remainder(
                &mut index,
                &output.used,
                &output.ignored,
                self.config.remainder,
            );
            tag_trees.push(output.tree);
            tag_trees.extend(remainder);
        }

        // Combiner playlists; the playlist-name relation is frozen by now.
        let mut combiner_tree = match &spec.combiner {
            Some(combiner) => {
                log::info!("Building combiner playlists from \"{}\"", combiner.name);
                Some(build_combiner_tree(combiner, &index, today)?)
            }
            None => None,
        };

        // Post-hoc filters over both trees.
        let filters = self.registry.select(&self.config.enabled_filters)?;
        if !filters.is_empty() {
            log::info!("Applying {} playlist filters", filters.len());
            for tree in tag_trees.iter_mut().chain(combiner_tree.iter_mut()) {
                apply_filters(tree, &filters, &index);
            }
        }

        // Minimum-track pruning; each tree gets its own threshold.
        let min_tag = self.config.min_tag_playlist_tracks;
        let min_combiner = self.config.min_combiner_playlist_tracks;
        tag_trees.retain_mut(|tree| prune(tree, min_tag));
        if let Some(mut tree) = combiner_tree.take() {
            if prune(&mut tree, min_combiner) {
                combiner_tree = Some(tree);
            }
        }

        if self.config.verbose_statistics {
            if let Some(tree) = &combiner_tree {
                print_tag_statistics(tree, &index);
            }
        }

        let mut root = Playlist::folder(PLAYLIST_BUILDER_ROOT);
        for child in tag_trees.into_iter().chain(combiner_tree) {
            root.push(child);
        }
        let total = root.count_playlists();

        collection.remove_playlists(PLAYLIST_BUILDER_ROOT);
        collection.append_playlist(root);
        log::info!("{PLAYLIST_BUILDER_ROOT} generated with {total} playlists");
        Ok(())
    }
}

/// Drop leaves with fewer than `min_tracks` tracks and folders left empty.
/// Returns whether `node` itself survives.
fn prune(node: &mut Playlist, min_tracks: usize) -> bool {
    match node {
        Playlist::Leaf { tracks, .. } => tracks.len() >= min_tracks,
        Playlist::Folder { children, .. } => {
            children.retain_mut(|child| prune(child, min_tracks));
            !children.is_empty()
        }
    }
}
