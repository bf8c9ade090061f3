//! Mergeinfo: per-path revision-range provenance
//!
//! Mergeinfo maps repository-root-relative paths to lists of inclusive
//! revision ranges describing history merged into (or implied by) a node.
//! The text form is one `path:ranges` line per path, ranges comma-separated,
//! a single revision written `N` and a span written `N-M`:
//!
//! ```text
//! /trunk/foo:1-10,12
//! /branches/bar:4
//! ```
//!
//! Range lists are kept normalized: sorted by start, overlapping and
//! adjacent ranges coalesced. [`Mergeinfo::merge`] is therefore idempotent.

pub mod assembler;

use crate::artifacts::revision::Revnum;
use crate::error::{Error, ErrorKind, Result};
use derive_new::new;
use std::collections::BTreeMap;
use std::fmt;

/// Property name under which mergeinfo rides on a node.
pub const PROP_MERGEINFO: &str = "svn:mergeinfo";

/// An inclusive revision range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, new)]
pub struct RevRange {
    pub start: Revnum,
    pub end: Revnum,
}

impl fmt::Display for RevRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

/// Mergeinfo for one node: repository-root-relative path to range list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mergeinfo(BTreeMap<String, Vec<RevRange>>);

impl Mergeinfo {
    pub fn new() -> Self {
        Mergeinfo::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn ranges(&self, path: &str) -> Option<&[RevRange]> {
        self.0.get(path).map(Vec::as_slice)
    }

    /// Record a range for a path, keeping the range list normalized.
    pub fn add_range(&mut self, path: impl Into<String>, range: RevRange) {
        let ranges = self.0.entry(path.into()).or_default();
        ranges.push(range);
        normalize(ranges);
    }

    /// Union `other` into `self`.
    pub fn merge(&mut self, other: &Mergeinfo) {
        for (path, ranges) in &other.0 {
            let mine = self.0.entry(path.clone()).or_default();
            mine.extend_from_slice(ranges);
            normalize(mine);
        }
    }

    /// Parse the standard text form.
    pub fn parse(s: &str) -> Result<Mergeinfo> {
        let mut info = Mergeinfo::new();
        for line in s.lines().filter(|l| !l.trim().is_empty()) {
            let (path, ranges) = line.rsplit_once(':').ok_or_else(|| {
                Error::new(
                    ErrorKind::MergeinfoParse,
                    format!("Could not parse mergeinfo string '{line}'"),
                )
            })?;
            if path.is_empty() {
                return Err(Error::new(
                    ErrorKind::MergeinfoParse,
                    format!("Mergeinfo path is empty in '{line}'"),
                ));
            }
            for range in ranges.split(',') {
                info.add_range(path, parse_range(range)?);
            }
        }
        Ok(info)
    }
}

impl fmt::Display for Mergeinfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (path, ranges) in &self.0 {
            if !first {
                writeln!(f)?;
            }
            first = false;
            let ranges = ranges
                .iter()
                .map(|r| r.to_string())
                .collect::<Vec<_>>()
                .join(",");
            write!(f, "{path}:{ranges}")?;
        }
        Ok(())
    }
}

fn parse_range(s: &str) -> Result<RevRange> {
    let bad = || {
        Error::new(
            ErrorKind::MergeinfoParse,
            format!("Could not parse revision range '{s}'"),
        )
    };
    match s.split_once('-') {
        Some((start, end)) => {
            let start = start.trim().parse::<u64>().map_err(|_| bad())?;
            let end = end.trim().parse::<u64>().map_err(|_| bad())?;
            if start > end {
                return Err(bad());
            }
            Ok(RevRange::new(Revnum::new(start), Revnum::new(end)))
        }
        None => {
            let rev = s.trim().parse::<u64>().map_err(|_| bad())?;
            Ok(RevRange::new(Revnum::new(rev), Revnum::new(rev)))
        }
    }
}

/// Sort by start and coalesce overlapping or adjacent ranges.
fn normalize(ranges: &mut Vec<RevRange>) {
    ranges.sort();
    let mut out: Vec<RevRange> = Vec::with_capacity(ranges.len());
    for range in ranges.drain(..) {
        match out.last_mut() {
            Some(last) if range.start.get() <= last.end.get() + 1 => {
                if range.end > last.end {
                    last.end = range.end;
                }
            }
            _ => out.push(range),
        }
    }
    *ranges = out;
}
