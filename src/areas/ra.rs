//! Remote-access layer
//!
//! An [`RaSession`] is a live handle to a repository anchored at some URL;
//! the [`RaConnector`] opens sessions and answers the history-tracing
//! queries that do not need a standing anchor. All relative paths exchanged
//! with a session are URI-decoded and `/`-separated.

use crate::areas::NodeKind;
use crate::areas::editor::CommitEditor;
use crate::areas::wc::WcAccess;
use crate::artifacts::mergeinfo::Mergeinfo;
use crate::artifacts::paths::{Url, uri_decode};
use crate::artifacts::revision::{Revision, Revnum};
use crate::error::{Error, ErrorKind, Result};
use std::collections::BTreeMap;
use std::io::Write;

/// A property table, e.g. the revision properties of a pending commit.
pub type PropTable = BTreeMap<String, String>;

/// Opens sessions against repositories and traces node history.
pub trait RaConnector {
    /// Open a session anchored at `url`. `wc_anchor`, when present, names a
    /// locked working-copy directory usable for temporary files. An URL that
    /// no repository answers for fails with [`ErrorKind::RaIllegalUrl`].
    fn open(&self, url: &Url, wc_anchor: Option<&dyn WcAccess>) -> Result<Box<dyn RaSession>>;

    /// Canonical URL of the node addressed by `url` at `peg`, as of the
    /// operative revision `op` (following renames backwards through
    /// history).
    fn trace_node_location(&self, url: &Url, peg: Revision, op: Revision) -> Result<Url>;
}

/// A live session anchored at a repository URL.
pub trait RaSession {
    fn session_url(&self) -> Url;

    /// Move the session anchor without reopening the connection.
    fn reparent(&mut self, url: &Url) -> Result<()>;

    fn latest_revnum(&self) -> Result<Revnum>;

    /// Kind of the node at `rel` (relative to the session anchor; empty for
    /// the anchor itself) in `rev`, or the youngest revision when `rev` is
    /// `None`.
    fn check_path(&self, rel: &str, rev: Option<Revnum>) -> Result<NodeKind>;

    /// Repository UUID; missing UUIDs (very old repositories) surface as
    /// [`ErrorKind::RaNoReposUuid`].
    fn uuid(&self) -> Result<String>;

    fn repos_root(&self) -> Result<Url>;

    /// Stream the file at `rel`@`rev` into `sink`; returns the revision the
    /// content was actually served from and the node's properties.
    fn get_file(&self, rel: &str, rev: Revnum, sink: &mut dyn Write)
    -> Result<(Revnum, PropTable)>;

    /// Begin a commit transaction carrying `revprops`.
    fn get_commit_editor(&self, revprops: PropTable) -> Result<Box<dyn CommitEditor>>;

    /// Oldest revision in which the node at `rel` (session-relative) exists
    /// in its current incarnation, as of `rev`. `None` when the node has no
    /// history there.
    fn oldest_rev_at_path(&self, rel: &str, rev: Revnum) -> Result<Option<Revnum>>;

    /// Explicit mergeinfo recorded on the node at the repository-root-
    /// relative path `root_rel` in `rev`.
    fn mergeinfo_for_path(&self, root_rel: &str, rev: Revnum) -> Result<Option<Mergeinfo>>;
}

/// The repository-root-relative path (leading `/`, URI-decoded) of `url`
/// within the repository `ra` is connected to.
pub fn repos_relative_path(ra: &dyn RaSession, url: &Url) -> Result<String> {
    let root = ra.repos_root()?;
    if url == &root {
        return Ok("/".to_string());
    }
    match root.is_child(url) {
        Some(rel) => Ok(format!("/{}", uri_decode(&rel))),
        None => Err(Error::new(
            ErrorKind::RaIllegalUrl,
            format!("URL '{url}' is not within the repository rooted at '{root}'"),
        )),
    }
}
