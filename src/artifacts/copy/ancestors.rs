//! Common ancestors over a set of copy pairs
//!
//! Handlers anchor their locks and sessions at the longest path common to
//! the endpoints they touch. Ancestry is computed per segment; for URLs it
//! additionally never descends below the `scheme://authority` root, so two
//! URLs in different repositories have an empty common ancestor.

use crate::artifacts::copy::pair::CopyPair;
use crate::artifacts::paths::{Target, Url, longest_common_path};
use crate::error::{Error, ErrorKind, Result};
use std::path::{Path, PathBuf};

/// The ancestors of one batch of pairs.
#[derive(Debug, Clone)]
pub(crate) struct CopyPairAncestors {
    /// Longest ancestor of all sources.
    pub src: Target,
    /// Longest ancestor of all destinations. For a single pair this is the
    /// destination itself; callers that want its directory take the parent
    /// explicitly.
    pub dst: Target,
    /// Longest ancestor of `src` and `dst` together, when both sides are
    /// URLs; empty when the two sides share no repository.
    pub common_url: Option<Url>,
}

pub(crate) fn get_copy_pair_ancestors(pairs: &[CopyPair]) -> Result<CopyPairAncestors> {
    let src = fold_ancestor(pairs.iter().map(|pair| &pair.src))?;
    let dst = if pairs.len() == 1 {
        pairs[0].dst.clone()
    } else {
        fold_ancestor(pairs.iter().map(|pair| &pair.dst))?
    };
    let common_url = match (&src, &dst) {
        (Target::Repo(a), Target::Repo(b)) => Some(a.longest_common_ancestor(b)),
        _ => None,
    };
    Ok(CopyPairAncestors {
        src,
        dst,
        common_url,
    })
}

fn fold_ancestor<'a>(mut targets: impl Iterator<Item = &'a Target>) -> Result<Target> {
    let first = targets
        .next()
        .ok_or_else(|| Error::new(ErrorKind::Base, "No targets to compute an ancestor over"))?;
    let mut ancestor = first.clone();
    for target in targets {
        ancestor = match (&ancestor, target) {
            (Target::Repo(a), Target::Repo(b)) => Target::Repo(a.longest_common_ancestor(b)),
            (Target::Wc(a), Target::Wc(b)) => Target::Wc(common_path(a, b)),
            _ => {
                return Err(Error::new(
                    ErrorKind::Base,
                    "Cannot compute an ancestor over mixed targets",
                ));
            }
        };
    }
    Ok(ancestor)
}

fn common_path(a: &Path, b: &Path) -> PathBuf {
    PathBuf::from(longest_common_path(
        &a.to_string_lossy(),
        &b.to_string_lossy(),
    ))
}
