//! Working-copy administrative layer
//!
//! The copy handlers consume the working copy through two traits: a
//! [`WcContext`] offering the operations themselves, and [`WcAccess`], the
//! directory-scoped exclusive lock ("access baton") most operations demand.
//! Locks are acquired on the narrowest directory that covers the work and
//! must be released along every exit path, including error paths.

use crate::areas::NodeKind;
use crate::areas::context::Callbacks;
use crate::areas::editor::CommitEditor;
use crate::artifacts::commit::CommitItem;
use crate::artifacts::mergeinfo::Mergeinfo;
use crate::artifacts::paths::Url;
use crate::artifacts::revision::{Revision, Revnum};
use crate::error::Result;
use derive_new::new;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// How deep an administrative lock reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockDepth {
    /// The named directory only.
    This,
    /// The named directory and everything below it.
    Infinite,
}

/// Scheduling state of a working-copy entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WcSchedule {
    Normal,
    Add,
    Delete,
    Replace,
}

/// A versioned node as recorded in the working-copy administrative area.
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct WcEntry {
    pub kind: NodeKind,
    pub revision: Revnum,
    pub url: Option<Url>,
    pub uuid: Option<String>,
    pub schedule: WcSchedule,
}

/// One source of a working-copy-to-repository copy, handed to the
/// committables crawl.
#[derive(Debug, Clone, new)]
pub struct CopyCandidate {
    pub src: PathBuf,
    pub dst: Url,
}

/// A held administrative lock.
pub trait WcAccess {
    /// The directory this lock was opened on.
    fn path(&self) -> &Path;

    /// Hand out the baton for a directory already covered by this lock's
    /// set. Closing the parent releases retrieved batons with it.
    fn retrieve(&self, path: &Path) -> Result<Box<dyn WcAccess>>;

    fn close(self: Box<Self>) -> Result<()>;
}

/// The working-copy operations the copy/move core consumes.
pub trait WcContext {
    /// Lock `path` for administrative work. Fails when `path` is not a
    /// versioned directory.
    fn adm_open(
        &self,
        path: &Path,
        write_lock: bool,
        depth: LockDepth,
        callbacks: &Callbacks,
    ) -> Result<Box<dyn WcAccess>>;

    /// Like `adm_open`, but when `path` is not itself a versioned directory,
    /// lock its parent instead.
    fn adm_probe_open(
        &self,
        path: &Path,
        write_lock: bool,
        depth: LockDepth,
        callbacks: &Callbacks,
    ) -> Result<Box<dyn WcAccess>>;

    /// The administrative entry for `path`, or `None` when unversioned.
    fn entry(&self, path: &Path, adm: &dyn WcAccess) -> Result<Option<WcEntry>>;

    /// Copy the versioned node at `src` to `base_name` under the directory
    /// `adm` is locked on, scheduling the result as added-with-history.
    fn copy(&self, src: &Path, adm: &dyn WcAccess, base_name: &str, callbacks: &Callbacks)
    -> Result<()>;

    /// Schedule the node at `path` for deletion. `force` skips the
    /// local-modification check.
    fn delete(
        &self,
        path: &Path,
        adm: &dyn WcAccess,
        force: bool,
        callbacks: &Callbacks,
    ) -> Result<()>;

    /// Mark an already-present subtree at `dst` as added with copy history
    /// from `copyfrom_url`@`copyfrom_rev`.
    fn add_with_history(
        &self,
        dst: &Path,
        adm: &dyn WcAccess,
        copyfrom_url: &Url,
        copyfrom_rev: Revnum,
        callbacks: &Callbacks,
    ) -> Result<()>;

    /// Install a file fetched from the repository: `text_path` becomes the
    /// text base, `props` the node's properties, and `copyfrom` (when the
    /// repositories match) the copy history.
    fn add_repos_file(
        &self,
        dst: &Path,
        adm: &dyn WcAccess,
        text_path: &Path,
        props: &BTreeMap<String, String>,
        copyfrom: Option<(&Url, Revnum)>,
    ) -> Result<()>;

    /// Check out `src_url` into `dst`; returns the revision the checkout
    /// actually landed on.
    fn checkout(
        &self,
        src_url: &Url,
        dst: &Path,
        peg: Revision,
        op: Revision,
        callbacks: &Callbacks,
    ) -> Result<Revnum>;

    /// Explicit mergeinfo recorded on the working-copy node at `path`.
    fn parse_mergeinfo(&self, path: &Path, adm: &dyn WcAccess) -> Result<Mergeinfo>;

    fn record_mergeinfo(&self, path: &Path, info: &Mergeinfo, adm: &dyn WcAccess) -> Result<()>;

    /// UUID of the repository the working copy at `path` belongs to;
    /// missing UUIDs surface as [`crate::error::ErrorKind::RaNoReposUuid`].
    fn uuid_from_path(&self, path: &Path, adm: &dyn WcAccess) -> Result<String>;

    /// Crawl the working copy and produce one ADD commit item per
    /// candidate, in input order.
    fn collect_copy_committables(
        &self,
        candidates: &[CopyCandidate],
        adm: &dyn WcAccess,
        callbacks: &Callbacks,
    ) -> Result<Vec<CommitItem>>;

    /// Sort and condense `items`; returns the common anchor URL the commit
    /// should be driven from.
    fn condense_commit_items(&self, items: &mut Vec<CommitItem>) -> Result<Url>;

    /// Drive `editor` with the contents of `items`, sending text bases from
    /// the working copy. Temporary files created along the way are recorded
    /// in `tempfiles` even when the drive fails.
    fn drive_commit(
        &self,
        base_url: &Url,
        items: &[CommitItem],
        adm: &dyn WcAccess,
        editor: &mut dyn CommitEditor,
        tempfiles: &mut Vec<PathBuf>,
        callbacks: &Callbacks,
    ) -> Result<()>;
}
