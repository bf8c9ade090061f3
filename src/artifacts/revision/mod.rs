//! Revision selectors
//!
//! A [`Revision`] names *which* revision an operation should act on, either
//! concretely by number or symbolically (`HEAD`, `WORKING`, `BASE`,
//! `COMMITTED`, `PREV`). Symbolic selectors split into two families: those
//! resolvable against a repository alone, and those that only make sense
//! relative to a working copy. Copy sources carry two selectors, a peg
//! revision (in which the path is interpreted) and an operative revision
//! (whose content is used).

use crate::areas::ra::RaSession;
use crate::error::{Error, ErrorKind, Result};
use std::fmt;
use std::sync::LazyLock;

/// A concrete revision number. The C-era invalid-revision sentinel does not
/// exist; absence is expressed as `Option<Revnum>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Revnum(u64);

impl Revnum {
    pub fn new(n: u64) -> Self {
        Revnum(n)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for Revnum {
    fn from(n: u64) -> Self {
        Revnum(n)
    }
}

impl fmt::Display for Revnum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A revision selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Revision {
    /// No revision was named; defaulted during normalization.
    #[default]
    Unspecified,
    /// A concrete revision number.
    Number(Revnum),
    /// The youngest repository revision.
    Head,
    /// The working-copy text as it is on disk.
    Working,
    /// The pristine base of a working-copy node.
    Base,
    /// The revision in which a working-copy node last changed.
    Committed,
    /// The revision just before [`Revision::Committed`].
    Previous,
}

static REVISION_WORD_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"(?i)^(head|working|base|committed|prev(ious)?)$").expect("valid regex")
});

impl Revision {
    /// Parse a CLI-style revision word or decimal number.
    pub fn try_parse(s: &str) -> Result<Revision> {
        let s = s.trim();
        if let Ok(n) = s.parse::<u64>() {
            return Ok(Revision::Number(Revnum(n)));
        }
        if REVISION_WORD_RE.is_match(s) {
            return Ok(match s.to_ascii_lowercase().as_str() {
                "head" => Revision::Head,
                "working" => Revision::Working,
                "base" => Revision::Base,
                "committed" => Revision::Committed,
                _ => Revision::Previous,
            });
        }
        Err(Error::new(
            ErrorKind::ClientBadRevision,
            format!("Syntax error in revision argument '{s}'"),
        ))
    }

    /// Selectors that are only meaningful relative to a working copy.
    pub fn is_wc_only(self) -> bool {
        matches!(
            self,
            Revision::Base | Revision::Committed | Revision::Previous
        )
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Revision::Unspecified => write!(f, "unspecified"),
            Revision::Number(n) => write!(f, "{n}"),
            Revision::Head => write!(f, "HEAD"),
            Revision::Working => write!(f, "WORKING"),
            Revision::Base => write!(f, "BASE"),
            Revision::Committed => write!(f, "COMMITTED"),
            Revision::Previous => write!(f, "PREV"),
        }
    }
}

/// Fill in unspecified peg and operative revisions: the peg defaults to
/// `HEAD` for URLs and `WORKING` for local paths, and the operative revision
/// defaults to the peg.
pub fn resolve_revisions(peg: Revision, op: Revision, is_url: bool) -> (Revision, Revision) {
    let peg = match peg {
        Revision::Unspecified => {
            if is_url {
                Revision::Head
            } else {
                Revision::Working
            }
        }
        other => other,
    };
    let op = match op {
        Revision::Unspecified => peg,
        other => other,
    };
    (peg, op)
}

/// Resolve a selector to a concrete revision number against a repository,
/// with no working copy available.
pub fn revision_number(revision: Revision, ra: &dyn RaSession) -> Result<Revnum> {
    match revision {
        Revision::Number(n) => Ok(n),
        Revision::Head => ra.latest_revnum(),
        other => Err(Error::new(
            ErrorKind::ClientBadRevision,
            format!("Revision type '{other}' requires a working copy path, not a URL"),
        )),
    }
}
