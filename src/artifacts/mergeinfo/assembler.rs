//! Assembles the mergeinfo that rides along with a copy.
//!
//! Every copy destination carries the union of the *implied* mergeinfo of
//! its source (the single revision range over which the node has existed in
//! its current incarnation) and any *explicit* mergeinfo already recorded on
//! the source node in the repository.

use crate::areas::ra::{RaSession, repos_relative_path};
use crate::artifacts::mergeinfo::{Mergeinfo, RevRange};
use crate::artifacts::paths::Url;
use crate::artifacts::revision::Revnum;
use crate::error::Result;

/// The implied mergeinfo of the node at `session_rel` as of `rev`: one range
/// from the oldest revision where the node exists through `rev`, keyed under
/// `root_rel`. Empty when the node has no history there.
pub fn implied_mergeinfo(
    ra: &dyn RaSession,
    session_rel: &str,
    root_rel: &str,
    rev: Revnum,
) -> Result<Mergeinfo> {
    let mut info = Mergeinfo::new();
    if let Some(oldest) = ra.oldest_rev_at_path(session_rel, rev)? {
        info.add_range(root_rel, RevRange::new(oldest, rev));
    }
    Ok(info)
}

/// Implied plus explicit mergeinfo for the source of a copy. `src_session_rel`
/// locates the source relative to `ra`'s anchor; the repository-root-relative
/// key is derived from `src_url`.
pub fn calculate_target_mergeinfo(
    ra: &dyn RaSession,
    src_url: &Url,
    src_session_rel: &str,
    src_revnum: Revnum,
) -> Result<Mergeinfo> {
    let root_rel = repos_relative_path(ra, src_url)?;
    let mut info = implied_mergeinfo(ra, src_session_rel, &root_rel, src_revnum)?;
    if let Some(explicit) = ra.mergeinfo_for_path(&root_rel, src_revnum)? {
        info.merge(&explicit);
    }
    Ok(info)
}
