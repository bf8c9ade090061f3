//! Commit (delta) editor
//!
//! A visitor-style interface receiving adds, deletes, and property changes
//! in parent-before-child order; closing the edit atomically commits a new
//! revision. Batons are opaque owned handles minted by the editor: every
//! opened directory or file is addressed through its baton, and directory
//! batons stay open while children are visited.

use crate::artifacts::commit::CommitInfo;
use crate::artifacts::paths::Url;
use crate::artifacts::revision::Revnum;
use crate::error::Result;
use bytes::Bytes;

/// Handle to an open directory within an edit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DirBaton(u64);

impl DirBaton {
    pub fn new(id: u64) -> Self {
        DirBaton(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Handle to an open file within an edit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileBaton(u64);

impl FileBaton {
    pub fn new(id: u64) -> Self {
        FileBaton(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// One commit transaction. Paths are relative to the session anchor the
/// editor was acquired from.
pub trait CommitEditor {
    fn open_root(&mut self, base_rev: Option<Revnum>) -> Result<DirBaton>;

    fn open_directory(
        &mut self,
        path: &str,
        parent: &DirBaton,
        base_rev: Option<Revnum>,
    ) -> Result<DirBaton>;

    /// Add a directory, optionally as a copy of `copyfrom`.
    fn add_directory(
        &mut self,
        path: &str,
        parent: &DirBaton,
        copyfrom: Option<(&Url, Revnum)>,
    ) -> Result<DirBaton>;

    /// Add a file, optionally as a copy of `copyfrom`.
    fn add_file(
        &mut self,
        path: &str,
        parent: &DirBaton,
        copyfrom: Option<(&Url, Revnum)>,
    ) -> Result<FileBaton>;

    /// Delete the entry at `path`. `rev` is the expected base revision;
    /// `None` deletes whatever is youngest.
    fn delete_entry(&mut self, path: &str, rev: Option<Revnum>, parent: &DirBaton) -> Result<()>;

    fn change_dir_prop(&mut self, dir: &DirBaton, name: &str, value: &str) -> Result<()>;

    fn change_file_prop(&mut self, file: &FileBaton, name: &str, value: &str) -> Result<()>;

    /// Replace the text of an open file.
    fn apply_text(&mut self, file: &FileBaton, content: Bytes) -> Result<()>;

    fn close_file(&mut self, file: FileBaton) -> Result<()>;

    fn close_directory(&mut self, dir: DirBaton) -> Result<()>;

    /// Commit everything recorded so far as one new revision.
    fn close_edit(self: Box<Self>) -> Result<CommitInfo>;

    /// Abandon the transaction; the repository is left unchanged.
    fn abort_edit(&mut self) -> Result<()>;
}
