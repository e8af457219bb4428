//! Set-valued evaluation of combiner expressions

use crate::error::Result;
use crate::expr::parser::{Expr, Selector};
use crate::expr::selector::NumericKind;
use crate::index::TagIndex;
use crate::model::TrackId;
use chrono::NaiveDate;
use std::collections::BTreeSet;

/// Evaluates expression trees against a frozen tag index.
///
/// Relative date selectors are resolved against the `today` the evaluator
/// was created with, so a whole build observes one consistent "now".
pub struct Evaluator<'a> {
    index: &'a TagIndex,
    today: NaiveDate,
}

impl<'a> Evaluator<'a> {
    pub fn new(index: &'a TagIndex, today: NaiveDate) -> Self {
        Self { index, today }
    }

    /// Walk the AST in post-order, producing the set of matching track ids.
    ///
    /// Unknown tag names evaluate to the empty set so a shared spec keeps
    /// working across evolving collections; only `{playlist:...}` references
    /// to names that were never built are an error.
    pub fn evaluate(&self, expr: &Expr) -> Result<BTreeSet<TrackId>> {
        match expr {
            Expr::Tag {
                name,
                wildcard: false,
                ..
            } => Ok(self.index.tag(name)),
            Expr::Tag {
                name,
                wildcard: true,
                ..
            } => Ok(self.index.tags_matching(name)),
            Expr::Selector { selector, .. } => self.evaluate_selector(selector),
            Expr::Numeric { ranges, .. } => {
                let mut result = BTreeSet::new();
                for range in ranges {
                    let matched = match range.kind {
                        NumericKind::Rating => self.index.rating_in(range.lo, range.hi),
                        NumericKind::Bpm => self.index.bpm_in(range.lo, range.hi),
                        NumericKind::Year => self.index.year_in(range.lo, range.hi),
                    };
                    result.extend(matched);
                }
                Ok(result)
            }
            Expr::And(left, right) => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                Ok(left.intersection(&right).copied().collect())
            }
            Expr::Or(left, right) => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                Ok(left.union(&right).copied().collect())
            }
            Expr::Diff(left, right) => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                Ok(left.difference(&right).copied().collect())
            }
        }
    }

    fn evaluate_selector(&self, selector: &Selector) -> Result<BTreeSet<TrackId>> {
        match selector {
            Selector::Artist(pattern) => Ok(self.index.artists_matching(pattern)),
            Selector::Comment(pattern) => Ok(self.index.comments_matching(pattern)),
            Selector::Key(pattern) => Ok(self.index.keys_matching(pattern)),
            Selector::Label(pattern) => Ok(self.index.labels_matching(pattern)),
            Selector::Date(spec) => Ok(self.index.date_matches(spec, self.today)),
            Selector::Playlist(name) => self.index.playlist(name),
        }
    }
}
