//! Tag statistics for combiner playlists
//!
//! Prints an ASCII histogram of tag frequencies for each combiner leaf,
//! split into genre and other tag groups. Purely informational output for
//! verbose runs.

use crate::index::TagIndex;
use crate::model::Playlist;
use std::collections::BTreeMap;

const MAX_BAR_HEIGHT: usize = 25;

/// Print tag statistics for every leaf of the combiner tree.
pub fn print_tag_statistics(tree: &Playlist, index: &TagIndex) {
    tree.visit_leaves(&mut |_ancestors, leaf| {
        if leaf.tracks().is_empty() {
            return;
        }

        let mut genre_counts: BTreeMap<String, usize> = BTreeMap::new();
        let mut other_counts: BTreeMap<String, usize> = BTreeMap::new();
        for id in leaf.tracks() {
            let Some(track) = index.track(*id) else {
                continue;
            };
            for tag in &track.genre_tags {
                *genre_counts.entry(tag.clone()).or_default() += 1;
            }
            for tag in &track.other_tags {
                *other_counts.entry(tag.clone()).or_default() += 1;
            }
        }

        println!("\n{} tag statistics:", leaf.name());
        for (label, counts) in [("Genre", &genre_counts), ("Other", &other_counts)] {
            if counts.is_empty() {
                continue;
            }
            println!("\n{label}:");
            print_histogram(counts);
        }
    });
}

/// Scale counts so the tallest bar fits `MAX_BAR_HEIGHT` rows, keeping every
/// non-zero count visible at a height of at least one.
fn scale_counts(counts: &BTreeMap<String, usize>) -> BTreeMap<&str, usize> {
    let max = counts.values().copied().max().unwrap_or(1).max(1);
    counts
        .iter()
        .map(|(tag, count)| {
            let scaled = ((count * MAX_BAR_HEIGHT) as f64 / max as f64).round() as usize;
            (tag.as_str(), scaled.max(1))
        })
        .collect()
}

fn print_histogram(counts: &BTreeMap<String, usize>) {
    let scaled = scale_counts(counts);
    let tallest = scaled.values().copied().max().unwrap_or(0);

    let mut output = String::new();
    let mut width = 0;
    for row in (1..=tallest).rev() {
        output.push('|');
        for (tag, height) in &scaled {
            let pad = " ".repeat(1 + tag.len() / 2);
            output.push_str(&pad);
            output.push(if *height >= row { '*' } else { ' ' });
            output.push_str(&pad);
        }
        if width == 0 {
            width = output.len();
        }
        output.push('\n');
    }
    output.push_str(&"-".repeat(width));
    output.push('\n');
    for tag in scaled.keys() {
        output.push(' ');
        output.push_str(tag);
        output.push(' ');
    }
    println!("{output}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_counts_bounds() {
        let counts: BTreeMap<String, usize> = [
            ("Dark".to_string(), 100),
            ("Vocal".to_string(), 1),
        ]
        .into_iter()
        .collect();
        let scaled = scale_counts(&counts);
        assert_eq!(scaled["Dark"], MAX_BAR_HEIGHT);
        assert_eq!(scaled["Vocal"], 1);
    }
}
