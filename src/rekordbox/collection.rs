//! Rekordbox collection XML parser and serializer
//!
//! Reads the `DJ_PLAYLISTS` document Rekordbox exports: a `COLLECTION` of
//! `TRACK` elements (metadata in attributes, beat grid and hot cues as
//! nested `TEMPO`/`POSITION_MARK` elements) followed by a `PLAYLISTS` tree
//! of `NODE` elements. Track attributes and nested elements are kept
//! verbatim so serialization reproduces everything the builder does not
//! touch.

use crate::config::BuildConfig;
use crate::error::{Error, Result};
use crate::model::{
    extract_other_tags, split_genre_tags, CollectionView, Playlist, Track, TrackId,
};
use anyhow::Context;
use chrono::NaiveDate;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// A track as it appeared in the document: attributes plus nested beat
/// grid / hot cue elements, preserved for round-tripping.
#[derive(Debug, Clone)]
struct RawTrack {
    attrs: Vec<(String, String)>,
    children: Vec<(String, Vec<(String, String)>)>,
}

/// In-memory Rekordbox collection.
#[derive(Debug)]
pub struct RekordboxCollection {
    version: String,
    product: Vec<(String, String)>,
    tracks: Vec<Track>,
    raw: Vec<RawTrack>,
    root: Playlist,
}

impl RekordboxCollection {
    /// Parse a collection document. Tag extraction follows the configured
    /// genre delimiter and comment markers.
    pub fn load(path: &Path, config: &BuildConfig) -> Result<Self> {
        parse_collection(path, config).map_err(Error::CollectionLoad)
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// Root playlists of the document, in order.
    pub fn playlists(&self) -> &[Playlist] {
        self.root.children()
    }

    fn write(&self, path: &Path) -> anyhow::Result<()> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        let mut writer = Writer::new_with_indent(BufWriter::new(file), b' ', 4);

        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let mut dj_playlists = BytesStart::new("DJ_PLAYLISTS");
        dj_playlists.push_attribute(("Version", self.version.as_str()));
        writer.write_event(Event::Start(dj_playlists))?;

        if !self.product.is_empty() {
            let mut product = BytesStart::new("PRODUCT");
            for (key, value) in &self.product {
                product.push_attribute((key.as_str(), value.as_str()));
            }
            writer.write_event(Event::Empty(product))?;
        }

        let mut collection = BytesStart::new("COLLECTION");
        collection.push_attribute(("Entries", self.tracks.len().to_string().as_str()));
        writer.write_event(Event::Start(collection))?;
        for raw in &self.raw {
            let mut track = BytesStart::new("TRACK");
            for (key, value) in &raw.attrs {
                track.push_attribute((key.as_str(), value.as_str()));
            }
            if raw.children.is_empty() {
                writer.write_event(Event::Empty(track))?;
            } else {
                writer.write_event(Event::Start(track))?;
                for (name, attrs) in &raw.children {
                    let mut child = BytesStart::new(name.as_str());
                    for (key, value) in attrs {
                        child.push_attribute((key.as_str(), value.as_str()));
                    }
                    writer.write_event(Event::Empty(child))?;
                }
                writer.write_event(Event::End(BytesEnd::new("TRACK")))?;
            }
        }
        writer.write_event(Event::End(BytesEnd::new("COLLECTION")))?;

        writer.write_event(Event::Start(BytesStart::new("PLAYLISTS")))?;
        write_node(&mut writer, &self.root)?;
        writer.write_event(Event::End(BytesEnd::new("PLAYLISTS")))?;

        writer.write_event(Event::End(BytesEnd::new("DJ_PLAYLISTS")))?;
        Ok(())
    }
}

impl CollectionView for RekordboxCollection {
    fn tracks(&self) -> Box<dyn Iterator<Item = &Track> + '_> {
        Box::new(self.tracks.iter())
    }

    fn append_playlist(&mut self, playlist: Playlist) {
        self.root.push(playlist);
    }

    fn remove_playlists(&mut self, name: &str) {
        if let Playlist::Folder { children, .. } = &mut self.root {
            children.retain(|child| child.name() != name);
        }
    }

    fn serialize(&self, path: &Path) -> Result<()> {
        self.write(path).map_err(Error::CollectionWrite)?;
        log::info!(
            "Wrote {} tracks and {} playlists to {}",
            self.tracks.len(),
            self.root.count_playlists().saturating_sub(1),
            path.display()
        );
        Ok(())
    }
}

fn parse_collection(path: &Path, config: &BuildConfig) -> anyhow::Result<RekordboxCollection> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open collection: {}", path.display()))?;

    let mut reader = Reader::from_reader(BufReader::new(file));
    reader.config_mut().trim_text(true);

    let mut version = String::from("1.0.0");
    let mut product = Vec::new();
    let mut tracks = Vec::new();
    let mut raw = Vec::new();
    let mut root: Option<Playlist> = None;

    let mut in_collection = false;
    let mut in_playlists = false;
    let mut current_track: Option<RawTrack> = None;
    // Stack of NODE frames while walking the playlist tree.
    let mut node_stack: Vec<Playlist> = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"DJ_PLAYLISTS" => {
                    if let Some(value) = attr_value(&e, b"Version") {
                        version = value;
                    }
                }
                b"PRODUCT" => product = attributes(&e),
                b"COLLECTION" => in_collection = true,
                b"PLAYLISTS" => in_playlists = true,
                b"TRACK" if in_collection => {
                    current_track = Some(RawTrack {
                        attrs: attributes(&e),
                        children: Vec::new(),
                    });
                }
                b"TEMPO" | b"POSITION_MARK" => {
                    if let Some(track) = &mut current_track {
                        let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                        track.children.push((name, attributes(&e)));
                    }
                }
                b"NODE" if in_playlists => node_stack.push(node_from_attrs(&e)),
                _ => {}
            },

            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"PRODUCT" => product = attributes(&e),
                b"TRACK" if in_collection => {
                    let raw_track = RawTrack {
                        attrs: attributes(&e),
                        children: Vec::new(),
                    };
                    if let Some(track) = track_from_attrs(&raw_track.attrs, config) {
                        tracks.push(track);
                        raw.push(raw_track);
                    }
                }
                b"TRACK" if in_playlists => {
                    if let Some(key) = attr_value(&e, b"Key") {
                        push_playlist_entry(&mut node_stack, &key);
                    }
                }
                b"TEMPO" | b"POSITION_MARK" => {
                    if let Some(track) = &mut current_track {
                        let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                        track.children.push((name, attributes(&e)));
                    }
                }
                b"NODE" if in_playlists => {
                    let node = node_from_attrs(&e);
                    attach_node(node, &mut node_stack, &mut root);
                }
                _ => {}
            },

            Ok(Event::End(e)) => match e.name().as_ref() {
                b"COLLECTION" => in_collection = false,
                b"PLAYLISTS" => in_playlists = false,
                b"TRACK" if in_collection => {
                    if let Some(raw_track) = current_track.take() {
                        if let Some(track) = track_from_attrs(&raw_track.attrs, config) {
                            tracks.push(track);
                            raw.push(raw_track);
                        }
                    }
                }
                b"NODE" if in_playlists => {
                    if let Some(node) = node_stack.pop() {
                        attach_node(node, &mut node_stack, &mut root);
                    }
                }
                _ => {}
            },

            Ok(Event::Eof) => break,
            Err(e) => {
                log::warn!(
                    "XML parsing error at position {}: {:?}",
                    reader.buffer_position(),
                    e
                );
            }
            _ => {}
        }

        buf.clear();
    }

    let root = root.unwrap_or_else(|| Playlist::folder("ROOT"));
    log::info!("Parsed {} tracks from {}", tracks.len(), path.display());
    Ok(RekordboxCollection {
        version,
        product,
        tracks,
        raw,
        root,
    })
}

/// All attributes of an element as owned key/value pairs.
fn attributes(e: &BytesStart) -> Vec<(String, String)> {
    e.attributes()
        .flatten()
        .map(|attr| {
            let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
            let value = attr.unescape_value().unwrap_or_default().to_string();
            (key, value)
        })
        .collect()
}

fn attr_value(e: &BytesStart, name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == name)
        .map(|attr| attr.unescape_value().unwrap_or_default().to_string())
}

/// Build a playlist frame from a NODE element: Type 0 is a folder, Type 1
/// a playlist of tracks.
fn node_from_attrs(e: &BytesStart) -> Playlist {
    let name = attr_value(e, b"Name").unwrap_or_else(|| "Unnamed".to_string());
    match attr_value(e, b"Type").as_deref() {
        Some("0") => Playlist::folder(name),
        _ => Playlist::Leaf {
            name,
            tracks: Vec::new(),
        },
    }
}

fn push_playlist_entry(node_stack: &mut [Playlist], key: &str) {
    let Ok(id) = key.parse::<u64>() else {
        log::warn!("Skipping playlist entry with non-numeric key \"{key}\"");
        return;
    };
    if let Some(Playlist::Leaf { tracks, .. }) = node_stack.last_mut() {
        // Document order is preserved; the builder's own leaves are the
        // only ones required to be sorted.
        tracks.push(TrackId(id));
    }
}

fn attach_node(node: Playlist, node_stack: &mut Vec<Playlist>, root: &mut Option<Playlist>) {
    match node_stack.last_mut() {
        Some(parent) => parent.push(node),
        None => match root {
            None => *root = Some(node),
            Some(existing) => existing.push(node),
        },
    }
}

/// Convert raw TRACK attributes into the semantic track model.
/// Returns `None` (with a warning) when the element has no usable id.
fn track_from_attrs(attrs: &[(String, String)], config: &BuildConfig) -> Option<Track> {
    let mut id = None;
    let mut title = String::new();
    let mut artists = Vec::new();
    let mut genre_tags = Vec::new();
    let mut bpm = 0.0;
    let mut rating = 0;
    let mut year = None;
    let mut date_added = None;
    let mut label = None;
    let mut key = None;
    let mut comment = String::new();
    let mut location = String::new();

    for (name, value) in attrs {
        match name.as_str() {
            "TrackID" => id = value.parse::<u64>().ok().map(TrackId),
            "Name" => title = value.clone(),
            "Artist" => {
                artists = value
                    .split(", ")
                    .map(str::trim)
                    .filter(|artist| !artist.is_empty())
                    .map(str::to_string)
                    .collect();
            }
            "Genre" => genre_tags = split_genre_tags(value, &config.genre_delimiter),
            "AverageBpm" => {
                if let Ok(parsed) = value.parse::<f64>() {
                    bpm = parsed;
                }
            }
            // Rekordbox stores ratings as POPM bytes.
            "Rating" => {
                rating = match value.as_str() {
                    "51" => 1,
                    "102" => 2,
                    "153" => 3,
                    "204" => 4,
                    "255" => 5,
                    _ => 0,
                };
            }
            "Year" => year = value.parse::<i32>().ok(),
            "DateAdded" => date_added = NaiveDate::parse_from_str(value, "%Y-%m-%d").ok(),
            "Label" if !value.is_empty() => label = Some(value.clone()),
            "Tonality" if !value.is_empty() => key = Some(value.clone()),
            "Comments" => comment = value.clone(),
            "Location" => location = value.clone(),
            _ => {}
        }
    }

    let Some(id) = id else {
        log::warn!("Skipping TRACK element without a numeric TrackID");
        return None;
    };

    let other_tags = extract_other_tags(&comment, &config.other_tag_markers);
    Some(Track {
        id,
        title,
        artists,
        genre_tags,
        other_tags,
        bpm,
        rating,
        year,
        date_added,
        label,
        key,
        comment,
        location,
    })
}

fn write_node<W: std::io::Write>(writer: &mut Writer<W>, node: &Playlist) -> anyhow::Result<()> {
    match node {
        Playlist::Folder { name, children } => {
            let mut elem = BytesStart::new("NODE");
            elem.push_attribute(("Type", "0"));
            elem.push_attribute(("Name", name.as_str()));
            elem.push_attribute(("Count", children.len().to_string().as_str()));
            writer.write_event(Event::Start(elem))?;
            for child in children {
                write_node(writer, child)?;
            }
            writer.write_event(Event::End(BytesEnd::new("NODE")))?;
        }
        Playlist::Leaf { name, tracks } => {
            let mut elem = BytesStart::new("NODE");
            elem.push_attribute(("Name", name.as_str()));
            elem.push_attribute(("Type", "1"));
            elem.push_attribute(("KeyType", "0"));
            elem.push_attribute(("Entries", tracks.len().to_string().as_str()));
            if tracks.is_empty() {
                writer.write_event(Event::Empty(elem))?;
            } else {
                writer.write_event(Event::Start(elem))?;
                for id in tracks {
                    let mut track = BytesStart::new("TRACK");
                    track.push_attribute(("Key", id.to_string().as_str()));
                    writer.write_event(Event::Empty(track))?;
                }
                writer.write_event(Event::End(BytesEnd::new("NODE")))?;
            }
        }
    }
    Ok(())
}
