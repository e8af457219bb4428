//! Combiner playlist tree construction
//!
//! Leaves of the `combiner` spec are boolean expressions over tags,
//! selectors, and previously built playlists. All expressions are parsed up
//! front so every syntax error is reported before any evaluation runs;
//! evaluation itself fans out across leaves and is reassembled in spec
//! order, so the output is identical to a sequential run.

use crate::error::{Error, Result};
use crate::expr::{parse, Evaluator, Expr};
use crate::index::TagIndex;
use crate::model::{Playlist, TrackId};
use crate::spec::{SpecFolder, SpecNode};
use chrono::NaiveDate;
use rayon::prelude::*;
use std::collections::BTreeSet;

/// Build the combiner playlist tree against a frozen index.
pub fn build_combiner_tree(
    spec: &SpecFolder,
    index: &TagIndex,
    today: NaiveDate,
) -> Result<Playlist> {
    // Parse every expression first, collecting all faults with positions.
    let mut parsed = Vec::new();
    let mut errors = Vec::new();
    collect_expressions(spec, &mut parsed, &mut errors);

    if !errors.is_empty() {
        for (expression, error) in &errors {
            log::error!("Cannot parse combiner expression \"{expression}\": {error}");
        }
        let (_, first) = errors.swap_remove(0);
        return Err(Error::Expression(first));
    }

    // Evaluate leaves in parallel; results come back in spec order.
    let evaluator = Evaluator::new(index, today);
    let sets: Vec<BTreeSet<TrackId>> = parsed
        .par_iter()
        .map(|expr| evaluator.evaluate(expr))
        .collect::<Result<_>>()?;

    let mut results = sets.into_iter();
    Ok(assemble(spec, &mut results))
}

fn collect_expressions(
    folder: &SpecFolder,
    parsed: &mut Vec<Expr>,
    errors: &mut Vec<(String, crate::error::ExpressionError)>,
) {
    for node in &folder.playlists {
        match node {
            SpecNode::Folder(inner) => collect_expressions(inner, parsed, errors),
            leaf => {
                let expression = leaf.content().expect("non-folder nodes carry content");
                match parse(expression) {
                    Ok(expr) => parsed.push(expr),
                    Err(error) => errors.push((expression.to_string(), error)),
                }
            }
        }
    }
}

fn assemble(
    folder: &SpecFolder,
    results: &mut impl Iterator<Item = BTreeSet<TrackId>>,
) -> Playlist {
    let mut node = Playlist::folder(&folder.name);
    for child in &folder.playlists {
        match child {
            SpecNode::Folder(inner) => node.push(assemble(inner, results)),
            leaf => {
                let name = leaf.display_name().expect("non-folder nodes carry a name");
                let tracks = results
                    .next()
                    .expect("one evaluation result per combiner leaf");
                if tracks.is_empty() {
                    log::warn!("Combiner playlist \"{name}\" matched no tracks");
                }
                node.push(Playlist::leaf(name, tracks));
            }
        }
    }
    node
}
