//! Selector payload parsing and matching
//!
//! Three payload families appear inside combiner expressions: wildcard
//! string patterns (`{artist:*Eprom*}`), numeric ranges (`[1-3, 140]`), and
//! date predicates (`{date:>=2022-06}`, `{date:3m}`).

use crate::error::PatternError;
use chrono::{Datelike, Days, Months, NaiveDate};

/// A wildcard pattern over a string attribute.
///
/// `*` matches any run of characters; comparison is case-insensitive.
/// Without wildcards the match is exact; a pattern flanked by `*` degrades
/// to a substring test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobPattern {
    raw: String,
    /// Lowercased literal segments between wildcards. A single segment
    /// means the pattern had no `*` at all.
    segments: Vec<String>,
}

impl GlobPattern {
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        if pattern.is_empty() {
            return Err(PatternError::new(pattern, "pattern must not be empty"));
        }
        let segments = pattern
            .to_lowercase()
            .split('*')
            .map(str::to_string)
            .collect();
        Ok(Self {
            raw: pattern.to_string(),
            segments,
        })
    }

    /// The pattern as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn matches(&self, value: &str) -> bool {
        let value = value.to_lowercase();
        if self.segments.len() == 1 {
            return value == self.segments[0];
        }

        let first = &self.segments[0];
        let last = &self.segments[self.segments.len() - 1];
        if !value.starts_with(first.as_str()) || !value.ends_with(last.as_str()) {
            return false;
        }

        let mut pos = first.len();
        let end = value.len() - last.len();
        if pos > end {
            return false;
        }
        for segment in &self.segments[1..self.segments.len() - 1] {
            if segment.is_empty() {
                continue;
            }
            match value[pos..end].find(segment.as_str()) {
                Some(found) => pos += found + segment.len(),
                None => return false,
            }
        }
        true
    }
}

/// Interpretation of one numeric range inside `[...]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericKind {
    /// Both endpoints in [0, 5]
    Rating,
    /// Any endpoint above 5 (and below the year threshold)
    Bpm,
    /// Both endpoints at or above 1900
    Year,
}

/// An inclusive numeric range with its selector interpretation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumericRange {
    pub lo: i64,
    pub hi: i64,
    pub kind: NumericKind,
}

impl NumericRange {
    pub fn new(lo: i64, hi: i64) -> Result<Self, String> {
        if hi < lo {
            return Err(format!("malformed range {lo}-{hi}: upper bound below lower"));
        }
        let kind = if lo >= 1900 {
            NumericKind::Year
        } else if hi <= 5 {
            NumericKind::Rating
        } else {
            NumericKind::Bpm
        };
        Ok(Self { lo, hi, kind })
    }
}

/// Parse the payload of a numeric selector: comma-separated integers or
/// `lo-hi` ranges. Errors carry a message only; the lexer attaches the
/// selector's source offset.
pub fn parse_numeric_ranges(payload: &str) -> Result<Vec<NumericRange>, String> {
    let mut ranges = Vec::new();
    for item in payload.split(',') {
        let item = item.trim();
        if item.is_empty() {
            return Err("empty numeric selector item".to_string());
        }
        let range = match item.split_once('-') {
            Some((lo, hi)) => {
                let lo = parse_bound(lo.trim())?;
                let hi = parse_bound(hi.trim())?;
                NumericRange::new(lo, hi)?
            }
            None => {
                let value = parse_bound(item)?;
                NumericRange::new(value, value)?
            }
        };
        ranges.push(range);
    }
    Ok(ranges)
}

fn parse_bound(text: &str) -> Result<i64, String> {
    text.parse::<i64>()
        .map_err(|_| format!("malformed numeric selector \"{text}\""))
}

/// Comparator prefix of a date selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateCmp {
    Lt,
    Le,
    Gt,
    Ge,
}

/// Reference point of a date selector, at the precision it was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateAnchor {
    Year(i32),
    Month(i32, u32),
    Day(NaiveDate),
    /// Duration anchored at "now", e.g. `1y6m` or `2w3d`
    Relative {
        years: u32,
        months: u32,
        weeks: u32,
        days: u32,
    },
}

/// A parsed date predicate over a track's date added.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateSpec {
    pub cmp: Option<DateCmp>,
    pub anchor: DateAnchor,
}

impl DateSpec {
    pub fn parse(payload: &str) -> Result<Self, String> {
        let (cmp, rest) = if let Some(rest) = payload.strip_prefix(">=") {
            (Some(DateCmp::Ge), rest)
        } else if let Some(rest) = payload.strip_prefix("<=") {
            (Some(DateCmp::Le), rest)
        } else if let Some(rest) = payload.strip_prefix('>') {
            (Some(DateCmp::Gt), rest)
        } else if let Some(rest) = payload.strip_prefix('<') {
            (Some(DateCmp::Lt), rest)
        } else {
            (None, payload)
        };

        let rest = rest.trim();
        if rest.is_empty() {
            return Err("empty date selector".to_string());
        }

        let anchor = if rest.chars().all(|c| c.is_ascii_digit() || c == '-') {
            parse_absolute(rest)?
        } else {
            parse_relative(rest)?
        };
        Ok(Self { cmp, anchor })
    }

    /// Whether `date` satisfies this predicate, with relative anchors
    /// resolved against `today`.
    pub fn matches(&self, date: NaiveDate, today: NaiveDate) -> bool {
        match self.anchor {
            DateAnchor::Year(year) => compare(self.cmp, date.year() as i64, year as i64),
            DateAnchor::Month(year, month) => compare(
                self.cmp,
                date.year() as i64 * 12 + date.month() as i64,
                year as i64 * 12 + month as i64,
            ),
            DateAnchor::Day(anchor) => compare(
                self.cmp,
                date.num_days_from_ce() as i64,
                anchor.num_days_from_ce() as i64,
            ),
            DateAnchor::Relative {
                years,
                months,
                weeks,
                days,
            } => {
                let shifted = today
                    .checked_sub_months(Months::new(years * 12 + months))
                    .and_then(|d| d.checked_sub_days(Days::new(u64::from(weeks) * 7 + u64::from(days))));
                let Some(anchor) = shifted else {
                    return false;
                };
                match self.cmp {
                    // A bare duration means the closed interval ending today.
                    None => anchor <= date && date <= today,
                    Some(_) => compare(
                        self.cmp,
                        date.num_days_from_ce() as i64,
                        anchor.num_days_from_ce() as i64,
                    ),
                }
            }
        }
    }
}

fn compare(cmp: Option<DateCmp>, value: i64, anchor: i64) -> bool {
    match cmp {
        None => value == anchor,
        Some(DateCmp::Lt) => value < anchor,
        Some(DateCmp::Le) => value <= anchor,
        Some(DateCmp::Gt) => value > anchor,
        Some(DateCmp::Ge) => value >= anchor,
    }
}

fn parse_absolute(text: &str) -> Result<DateAnchor, String> {
    let parts: Vec<&str> = text.split('-').collect();
    let err = || format!("malformed date \"{text}\"");
    match parts.as_slice() {
        [year] => Ok(DateAnchor::Year(year.parse().map_err(|_| err())?)),
        [year, month] => {
            let year = year.parse().map_err(|_| err())?;
            let month: u32 = month.parse().map_err(|_| err())?;
            if !(1..=12).contains(&month) {
                return Err(err());
            }
            Ok(DateAnchor::Month(year, month))
        }
        [_, _, _] => NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .map(DateAnchor::Day)
            .map_err(|_| err()),
        _ => Err(err()),
    }
}

fn parse_relative(text: &str) -> Result<DateAnchor, String> {
    let mut years = None;
    let mut months = None;
    let mut weeks = None;
    let mut days = None;
    let mut digits = String::new();

    for c in text.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        if digits.is_empty() {
            return Err(format!("malformed relative date \"{text}\""));
        }
        let value: u32 = digits
            .parse()
            .map_err(|_| format!("malformed relative date \"{text}\""))?;
        digits.clear();
        let slot = match c {
            'y' => &mut years,
            'm' => &mut months,
            'w' => &mut weeks,
            'd' => &mut days,
            other => {
                return Err(format!("unknown duration unit '{other}' in \"{text}\""));
            }
        };
        if slot.replace(value).is_some() {
            return Err(format!("duplicate duration unit '{c}' in \"{text}\""));
        }
    }
    if !digits.is_empty() {
        return Err(format!("dangling number in relative date \"{text}\""));
    }
    if years.is_none() && months.is_none() && weeks.is_none() && days.is_none() {
        return Err(format!("malformed relative date \"{text}\""));
    }
    Ok(DateAnchor::Relative {
        years: years.unwrap_or(0),
        months: months.unwrap_or(0),
        weeks: weeks.unwrap_or(0),
        days: days.unwrap_or(0),
    })
}
