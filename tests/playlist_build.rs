use chrono::NaiveDate;
use playlist_builder::build::tags::leaf_union;
use playlist_builder::expr::{parse, Evaluator};
use playlist_builder::index::TagIndex;
use playlist_builder::model::{CollectionView, MemoryCollection, Playlist, Track, TrackId};
use playlist_builder::rekordbox::RekordboxCollection;
use playlist_builder::{BuildConfig, PlaylistBuilder, PlaylistSpec, Remainder, PLAYLIST_BUILDER_ROOT};
use std::collections::BTreeSet;
use tempfile::TempDir;

fn track(id: u64, genres: &[&str]) -> Track {
    Track {
        id: TrackId(id),
        title: format!("Track {id}"),
        artists: vec!["Test Artist".to_string()],
        genre_tags: genres.iter().map(|s| s.to_string()).collect(),
        other_tags: Vec::new(),
        bpm: 120.0,
        rating: 0,
        year: None,
        date_added: None,
        label: None,
        key: None,
        comment: String::new(),
        location: format!("/music/{id}.mp3"),
    }
}

/// The three-track House/Techno collection the literal scenarios use.
fn house_techno_collection() -> MemoryCollection {
    MemoryCollection::new(vec![
        track(1, &["House"]),
        track(2, &["Techno"]),
        track(3, &["House", "Techno"]),
    ])
}

fn build(collection: &mut MemoryCollection, yaml: &str, config: BuildConfig) -> Playlist {
    let spec = PlaylistSpec::from_yaml(yaml).unwrap();
    PlaylistBuilder::new(config)
        .unwrap()
        .build_as_of(
            collection,
            &spec,
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        )
        .unwrap();
    collection.playlists().last().unwrap().clone()
}

fn ids(leaf: &Playlist) -> Vec<u64> {
    leaf.tracks().iter().map(|id| id.0).collect()
}

#[test]
fn scenario_s1_flat_tag_tree_without_root_aggregation() {
    let mut collection = house_techno_collection();
    let root = build(
        &mut collection,
        "tags:\n  name: Root\n  playlists:\n    - House\n    - Techno\n",
        BuildConfig::default().with_remainder(Remainder::None),
    );

    assert_eq!(root.name(), PLAYLIST_BUILDER_ROOT);
    let tags_root = &root.children()[0];
    assert_eq!(tags_root.name(), "Root");
    assert_eq!(ids(&tags_root.children()[0]), vec![1, 3]);
    assert_eq!(ids(&tags_root.children()[1]), vec![2, 3]);
    assert!(root.find("All Root").is_none());
}

#[test]
fn scenario_s2_nested_folder_gets_aggregation() {
    let mut collection = house_techno_collection();
    let root = build(
        &mut collection,
        "tags:\n  name: Root\n  playlists:\n    - name: Styles\n      playlists:\n        - House\n        - Techno\n",
        BuildConfig::default().with_remainder(Remainder::None),
    );

    let styles = root.find("Styles").unwrap();
    let names: Vec<&str> = styles.children().iter().map(Playlist::name).collect();
    assert_eq!(names, vec!["House", "Techno", "All Styles"]);
    assert_eq!(ids(root.find("All Styles").unwrap()), vec![1, 2, 3]);
}

#[test]
fn scenario_s3_combiner_intersection() {
    let mut collection = house_techno_collection();
    let root = build(
        &mut collection,
        "combiner:\n  name: Combos\n  playlists:\n    - House & Techno\n",
        BuildConfig::default(),
    );
    assert_eq!(ids(root.find("House & Techno").unwrap()), vec![3]);
}

#[test]
fn scenario_s4_combiner_difference() {
    let mut collection = house_techno_collection();
    let root = build(
        &mut collection,
        "combiner:\n  name: Combos\n  playlists:\n    - House ~ Techno\n",
        BuildConfig::default(),
    );
    assert_eq!(ids(root.find("House ~ Techno").unwrap()), vec![1]);
}

#[test]
fn scenario_s5_bpm_rounding_and_rating() {
    let mut t4 = track(4, &[]);
    t4.bpm = 140.3;
    t4.rating = 5;
    t4.year = Some(2022);
    let mut collection = MemoryCollection::new(vec![track(1, &["House"]), t4]);

    let root = build(
        &mut collection,
        "combiner:\n  name: Combos\n  playlists:\n    - \"[138-142] & [5]\"\n",
        BuildConfig::default(),
    );
    assert_eq!(ids(&root.children()[0].children()[0]), vec![4]);
}

#[test]
fn scenario_s6_artist_and_comment_selectors() {
    let mut t5 = track(5, &[]);
    t5.artists = vec!["Eprom".to_string()];
    t5.comment = "/* Dark */ absolute banger".to_string();
    t5.other_tags = vec!["Dark".to_string()];
    let mut t6 = track(6, &[]);
    t6.artists = vec!["Other".to_string()];
    t6.comment = "/* Dark */".to_string();
    t6.other_tags = vec!["Dark".to_string()];
    let mut collection = MemoryCollection::new(vec![t5, t6]);

    let root = build(
        &mut collection,
        "combiner:\n  name: Combos\n  playlists:\n    - \"{artist:*Eprom*} & {comment:*banger*}\"\n",
        BuildConfig::default().with_remainder(Remainder::None),
    );
    assert_eq!(ids(&root.find("Combos").unwrap().children()[0]), vec![5]);
}

#[test]
fn aggregation_law_all_folder_equals_descendant_union() {
    let tracks = vec![
        track(1, &["House"]),
        track(2, &["Techno"]),
        track(3, &["House", "Techno"]),
        track(4, &["Dubstep"]),
    ];
    let mut collection = MemoryCollection::new(tracks);
    let root = build(
        &mut collection,
        "tags:\n  name: Root\n  playlists:\n    - name: Four Four\n      playlists:\n        - House\n        - Techno\n    - name: Bass\n      playlists:\n        - Dubstep\n",
        BuildConfig::default().with_remainder(Remainder::None),
    );

    for folder_name in ["Four Four", "Bass"] {
        let folder = root.find(folder_name).unwrap();
        let all_name = format!("All {folder_name}");
        let all_leaf = folder.find(&all_name).unwrap();

        let mut union: BTreeSet<TrackId> = BTreeSet::new();
        for child in folder.children() {
            if child.name() != all_name {
                union.extend(leaf_union(child));
            }
        }
        let expected: Vec<TrackId> = union.into_iter().collect();
        assert_eq!(all_leaf.tracks(), expected.as_slice());
    }
}

#[test]
fn remainder_partition_law() {
    let tracks = vec![
        track(1, &["House"]),
        track(2, &["Techno"]),
        track(3, &["Dubstep"]),
        track(4, &["Garage"]),
    ];
    let index = TagIndex::from_tracks(tracks.iter());
    let all_tags: BTreeSet<String> = index.all_tag_names().map(str::to_string).collect();

    let mut collection = MemoryCollection::new(tracks);
    let root = build(
        &mut collection,
        "tags:\n  name: Root\n  playlists:\n    - House\n    - name: _ignore\n      playlists:\n        - Garage\n",
        BuildConfig::default().with_remainder(Remainder::Folder),
    );

    // Explicit leaves, ignored tags, and the remainder folder leaves
    // together cover every tag in the collection exactly once.
    let unused = root.find("Unused Tags").unwrap();
    let mut covered: BTreeSet<String> = unused
        .children()
        .iter()
        .map(|leaf| leaf.name().to_string())
        .filter(|name| name != "All Unused Tags")
        .collect();
    covered.insert("House".to_string());
    covered.insert("Garage".to_string());
    assert_eq!(covered, all_tags);
}

#[test]
fn boolean_algebra_laws() {
    let tracks = vec![
        track(1, &["A"]),
        track(2, &["B"]),
        track(3, &["A", "B"]),
        track(4, &["C"]),
        track(5, &["A", "C"]),
        track(6, &["B", "C"]),
        track(7, &["A", "B", "C"]),
    ];
    let index = TagIndex::from_tracks(tracks.iter());
    let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    let evaluator = Evaluator::new(&index, today);
    let eval = |text: &str| evaluator.evaluate(&parse(text).unwrap()).unwrap();

    // Commutativity
    assert_eq!(eval("A & B"), eval("B & A"));
    assert_eq!(eval("A | B"), eval("B | A"));
    // Associativity
    assert_eq!(eval("(A & B) & C"), eval("A & (B & C)"));
    assert_eq!(eval("(A | B) | C"), eval("A | (B | C)"));
    // Self-difference is empty
    assert!(eval("A ~ A").is_empty());
    // Distributivity
    assert_eq!(eval("A & (B | C)"), eval("(A & B) | (A & C)"));
}

#[test]
fn selector_laws() {
    let mut t1 = track(1, &[]);
    t1.rating = 5;
    let mut t2 = track(2, &[]);
    t2.bpm = 135.0;
    let mut t3 = track(3, &[]);
    t3.bpm = 150.0;
    let tracks = vec![t1, t2, t3];
    let index = TagIndex::from_tracks(tracks.iter());
    let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    let evaluator = Evaluator::new(&index, today);
    let eval = |text: &str| evaluator.evaluate(&parse(text).unwrap()).unwrap();

    // [5] and [5-5] are the same rating selector; the extra operand makes
    // the expressions legal.
    assert_eq!(eval("[5] | [5]"), eval("[5-5] | [5-5]"));
    // A BPM range covers exactly the tracks whose rounded BPM falls in it.
    let in_range = eval("[130-150] | [130-150]");
    assert_eq!(in_range.iter().map(|id| id.0).collect::<Vec<_>>(), vec![2, 3]);
}

#[test]
fn wildcard_law_union_of_matching_tags() {
    let tracks = vec![
        track(1, &["Hard Techno"]),
        track(2, &["Melodic Techno"]),
        track(3, &["Tech House"]),
        track(4, &["Dubstep"]),
    ];
    let index = TagIndex::from_tracks(tracks.iter());
    let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    let evaluator = Evaluator::new(&index, today);

    let result = evaluator
        .evaluate(&parse("*techno* | *techno*").unwrap())
        .unwrap();

    let mut expected = BTreeSet::new();
    for name in index.all_tag_names() {
        if name.to_lowercase().contains("techno") {
            expected.extend(index.tag(name));
        }
    }
    assert_eq!(result, expected);
}

#[test]
fn determinism_two_runs_identical() {
    let yaml = "tags:\n  name: Root\n  playlists:\n    - House\n    - Techno\ncombiner:\n  name: Combos\n  playlists:\n    - House | Techno\n    - House ~ Techno\n";
    let mut first = house_techno_collection();
    let mut second = house_techno_collection();
    let tree_a = build(&mut first, yaml, BuildConfig::default());
    let tree_b = build(&mut second, yaml, BuildConfig::default());
    assert_eq!(tree_a, tree_b);
}

#[test]
fn combiner_playlist_selector_sees_tag_playlists() {
    let mut collection = house_techno_collection();
    let root = build(
        &mut collection,
        "tags:\n  name: Root\n  playlists:\n    - name: Styles\n      playlists:\n        - House\n        - Techno\ncombiner:\n  name: Combos\n  playlists:\n    - \"{playlist:All Styles} ~ House\"\n",
        BuildConfig::default().with_remainder(Remainder::None),
    );
    assert_eq!(ids(&root.find("Combos").unwrap().children()[0]), vec![2]);
}

#[test]
fn end_to_end_rekordbox_collection() {
    let dir = TempDir::new().unwrap();
    let collection_path = dir.path().join("collection.xml");
    std::fs::write(
        &collection_path,
        r#"<?xml version="1.0" encoding="UTF-8"?>
<DJ_PLAYLISTS Version="1.0.0">
    <PRODUCT Name="rekordbox" Version="6.7.7" Company="AlphaTheta"/>
    <COLLECTION Entries="3">
        <TRACK TrackID="1" Name="One" Artist="A" Genre="House" AverageBpm="124.00"
               Rating="204" Comments="/* Dark */" Location="file://localhost/m/1.mp3"/>
        <TRACK TrackID="2" Name="Two" Artist="B" Genre="Techno" AverageBpm="132.00"
               Rating="255" Comments="" Location="file://localhost/m/2.mp3"/>
        <TRACK TrackID="3" Name="Three" Artist="C" Genre="House / Techno" AverageBpm="128.00"
               Rating="0" Comments="" Location="file://localhost/m/3.mp3"/>
    </COLLECTION>
    <PLAYLISTS>
        <NODE Type="0" Name="ROOT" Count="0"/>
    </PLAYLISTS>
</DJ_PLAYLISTS>
"#,
    )
    .unwrap();

    let config = BuildConfig::default();
    let mut collection = RekordboxCollection::load(&collection_path, &config).unwrap();

    let spec = PlaylistSpec::from_yaml(
        "tags:\n  name: Genres\n  playlists:\n    - House\n    - Techno\ncombiner:\n  name: Combos\n  playlists:\n    - House & Techno\n",
    )
    .unwrap();
    PlaylistBuilder::new(config.clone())
        .unwrap()
        .build(&mut collection, &spec)
        .unwrap();

    let out_path = dir.path().join("out.xml");
    collection.serialize(&out_path).unwrap();

    // The written document contains the generated tree.
    let reloaded = RekordboxCollection::load(&out_path, &config).unwrap();
    let builder_root = reloaded
        .playlists()
        .iter()
        .find(|p| p.name() == PLAYLIST_BUILDER_ROOT)
        .unwrap();
    assert_eq!(
        ids(builder_root.find("House & Techno").unwrap()),
        vec![3]
    );
    assert!(builder_root.find("Unused Tags").is_some());

    // Rebuilding against the written document replaces, not duplicates.
    let mut reloaded = reloaded;
    PlaylistBuilder::new(config.clone())
        .unwrap()
        .build(&mut reloaded, &spec)
        .unwrap();
    let count = reloaded
        .playlists()
        .iter()
        .filter(|p| p.name() == PLAYLIST_BUILDER_ROOT)
        .count();
    assert_eq!(count, 1);
}
