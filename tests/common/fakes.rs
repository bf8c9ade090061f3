//! In-memory fakes for the collaborator seams.
//!
//! `FakeRepo` models a repository as per-path state changes keyed by
//! revision; `FakeRaConnector`/`FakeRaSession` answer remote-access queries
//! from it, and the editor it hands out records every call and applies the
//! transaction to the repository on close. `FakeWc` performs real file
//! operations under a temp directory while logging every working-copy
//! primitive and every lock transition for assertions.

use bytes::Bytes;
use rsvn::areas::NodeKind;
use rsvn::areas::context::Callbacks;
use rsvn::areas::editor::{CommitEditor, DirBaton, FileBaton};
use rsvn::areas::ra::{PropTable, RaConnector, RaSession};
use rsvn::areas::wc::{CopyCandidate, LockDepth, WcAccess, WcContext, WcEntry};
use rsvn::artifacts::commit::{CommitInfo, CommitItem, CommitItemFlags};
use rsvn::artifacts::mergeinfo::{Mergeinfo, PROP_MERGEINFO};
use rsvn::artifacts::paths::{Url, parent_dir};
use rsvn::artifacts::revision::{Revision, Revnum};
use rsvn::error::{Error, ErrorKind, Result};
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;

// ---------------------------------------------------------------------------
// Repository model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct FakeNode {
    pub kind: NodeKind,
    pub content: String,
    pub props: PropTable,
    pub mergeinfo: Option<Mergeinfo>,
}

impl FakeNode {
    fn dir() -> Self {
        FakeNode {
            kind: NodeKind::Dir,
            content: String::new(),
            props: PropTable::new(),
            mergeinfo: None,
        }
    }

    fn file(content: &str) -> Self {
        FakeNode {
            kind: NodeKind::File,
            content: content.to_string(),
            props: PropTable::new(),
            mergeinfo: None,
        }
    }
}

/// One recorded commit-editor call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOp {
    OpenRoot,
    OpenDir(String),
    AddDir {
        path: String,
        copyfrom: Option<(String, u64)>,
    },
    AddFile {
        path: String,
        copyfrom: Option<(String, u64)>,
    },
    Delete(String),
    DirProp {
        path: String,
        name: String,
        value: String,
    },
    FileProp {
        path: String,
        name: String,
        value: String,
    },
    CloseFile(String),
    CloseDir(String),
    Abort,
    CloseEdit,
}

/// An in-memory repository: per-path state changes keyed by revision.
#[derive(Debug)]
pub struct FakeRepo {
    pub root: Url,
    pub uuid: Option<String>,
    pub head: u64,
    nodes: BTreeMap<String, BTreeMap<u64, Option<FakeNode>>>,
    pub edit_ops: Vec<EditOp>,
    pub aborted: bool,
    pub revprops: Vec<PropTable>,
    /// Session-relative paths whose editor add fails, for abort tests.
    pub fail_add_paths: HashSet<String>,
}

impl FakeRepo {
    pub fn new(root: &str) -> Rc<RefCell<FakeRepo>> {
        Rc::new(RefCell::new(FakeRepo {
            root: Url::parse(root).expect("valid repository root"),
            uuid: Some(format!("uuid:{root}")),
            head: 0,
            nodes: BTreeMap::new(),
            edit_ops: Vec::new(),
            aborted: false,
            revprops: Vec::new(),
            fail_add_paths: HashSet::new(),
        }))
    }

    /// Full URL of a root-relative path, for building test inputs.
    pub fn url(&self, rel: &str) -> String {
        format!("{}/{rel}", self.root)
    }

    pub fn add_dir(&mut self, rel: &str, rev: u64) {
        self.set_node(rel, rev, Some(FakeNode::dir()));
    }

    pub fn add_file(&mut self, rel: &str, rev: u64, content: &str) {
        self.set_node(rel, rev, Some(FakeNode::file(content)));
    }

    /// Attach explicit mergeinfo to the node as of `rev`.
    pub fn set_mergeinfo(&mut self, rel: &str, rev: u64, text: &str) {
        let mut node = self
            .node_at(rel, rev)
            .cloned()
            .unwrap_or_else(FakeNode::dir);
        node.mergeinfo = Some(Mergeinfo::parse(text).expect("valid mergeinfo"));
        self.set_node(rel, rev, Some(node));
    }

    /// Delete the node and everything below it as of `rev`.
    pub fn delete(&mut self, rel: &str, rev: u64) {
        let prefix = format!("{rel}/");
        let doomed: Vec<String> = self
            .nodes
            .keys()
            .filter(|key| key.as_str() == rel || key.starts_with(&prefix))
            .cloned()
            .collect();
        for key in doomed {
            self.nodes.entry(key).or_default().insert(rev, None);
        }
        self.head = self.head.max(rev);
    }

    fn set_node(&mut self, rel: &str, rev: u64, node: Option<FakeNode>) {
        let mut ancestors = Vec::new();
        let mut parent = rel;
        while let Some(idx) = parent.rfind('/') {
            parent = &parent[..idx];
            ancestors.push(parent.to_string());
        }
        for ancestor in ancestors {
            if self.kind_at(&ancestor, rev) == NodeKind::None {
                self.nodes
                    .entry(ancestor)
                    .or_default()
                    .insert(rev, Some(FakeNode::dir()));
            }
        }
        self.nodes.entry(rel.to_string()).or_default().insert(rev, node);
        self.head = self.head.max(rev);
    }

    pub fn node_at(&self, rel: &str, rev: u64) -> Option<&FakeNode> {
        if rel.is_empty() {
            return None;
        }
        self.nodes.get(rel)?.range(..=rev).next_back()?.1.as_ref()
    }

    pub fn kind_at(&self, rel: &str, rev: u64) -> NodeKind {
        if rel.is_empty() {
            return NodeKind::Dir;
        }
        match self.node_at(rel, rev) {
            Some(node) => node.kind,
            None => NodeKind::None,
        }
    }

    /// Oldest revision of the node's current incarnation as of `rev`.
    pub fn oldest_rev(&self, rel: &str, rev: u64) -> Option<u64> {
        let changes = self.nodes.get(rel)?;
        let mut oldest = None;
        for (change_rev, state) in changes.range(..=rev).rev() {
            match state {
                Some(_) => oldest = Some(*change_rev),
                None => break,
            }
        }
        oldest
    }

    /// The node at `rel` and everything below it, as `(suffix, node)` pairs
    /// where the node itself has an empty suffix.
    fn nodes_under(&self, rel: &str, rev: u64) -> Vec<(String, FakeNode)> {
        let prefix = format!("{rel}/");
        let mut out = Vec::new();
        for key in self.nodes.keys() {
            let suffix = if key.as_str() == rel {
                String::new()
            } else if let Some(rest) = key.strip_prefix(&prefix) {
                rest.to_string()
            } else {
                continue;
            };
            if let Some(node) = self.node_at(key, rev) {
                out.push((suffix, node.clone()));
            }
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Remote access
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct FakeRaConnector {
    repos: Vec<Rc<RefCell<FakeRepo>>>,
}

impl FakeRaConnector {
    pub fn new(repos: Vec<Rc<RefCell<FakeRepo>>>) -> Self {
        FakeRaConnector { repos }
    }
}

impl RaConnector for FakeRaConnector {
    fn open(&self, url: &Url, _wc_anchor: Option<&dyn WcAccess>) -> Result<Box<dyn RaSession>> {
        for repo in &self.repos {
            let root = repo.borrow().root.clone();
            if *url == root || root.is_child(url).is_some() {
                return Ok(Box::new(FakeRaSession {
                    repo: repo.clone(),
                    url: url.clone(),
                }));
            }
        }
        Err(Error::new(
            ErrorKind::RaIllegalUrl,
            format!("Illegal repository URL '{url}'"),
        ))
    }

    fn trace_node_location(&self, url: &Url, _peg: Revision, _op: Revision) -> Result<Url> {
        // The fake repositories have no rename history to follow.
        Ok(url.clone())
    }
}

pub struct FakeRaSession {
    repo: Rc<RefCell<FakeRepo>>,
    url: Url,
}

impl FakeRaSession {
    fn base_rel(&self) -> String {
        let repo = self.repo.borrow();
        if self.url == repo.root {
            String::new()
        } else {
            repo.root.is_child(&self.url).unwrap_or_default()
        }
    }

    fn to_root_rel(&self, rel: &str) -> String {
        let base = self.base_rel();
        if rel.is_empty() {
            base
        } else if base.is_empty() {
            rel.to_string()
        } else {
            format!("{base}/{rel}")
        }
    }
}

impl RaSession for FakeRaSession {
    fn session_url(&self) -> Url {
        self.url.clone()
    }

    fn reparent(&mut self, url: &Url) -> Result<()> {
        let root = self.repo.borrow().root.clone();
        if *url != root && root.is_child(url).is_none() {
            return Err(Error::new(
                ErrorKind::RaIllegalUrl,
                format!("Cannot reparent outside the repository: '{url}'"),
            ));
        }
        self.url = url.clone();
        Ok(())
    }

    fn latest_revnum(&self) -> Result<Revnum> {
        Ok(Revnum::new(self.repo.borrow().head))
    }

    fn check_path(&self, rel: &str, rev: Option<Revnum>) -> Result<NodeKind> {
        let repo = self.repo.borrow();
        let rev = rev.map(Revnum::get).unwrap_or(repo.head);
        Ok(repo.kind_at(&self.to_root_rel(rel), rev))
    }

    fn uuid(&self) -> Result<String> {
        self.repo
            .borrow()
            .uuid
            .clone()
            .ok_or_else(|| Error::new(ErrorKind::RaNoReposUuid, "Repository has no UUID"))
    }

    fn repos_root(&self) -> Result<Url> {
        Ok(self.repo.borrow().root.clone())
    }

    fn get_file(
        &self,
        rel: &str,
        rev: Revnum,
        sink: &mut dyn Write,
    ) -> Result<(Revnum, PropTable)> {
        let repo = self.repo.borrow();
        let root_rel = self.to_root_rel(rel);
        let node = repo.node_at(&root_rel, rev.get()).ok_or_else(|| {
            Error::new(
                ErrorKind::FsNotFound,
                format!("File '{root_rel}' not found in revision {rev}"),
            )
        })?;
        sink.write_all(node.content.as_bytes())
            .map_err(|err| Error::new(ErrorKind::Io, err.to_string()))?;
        Ok((rev, node.props.clone()))
    }

    fn get_commit_editor(&self, revprops: PropTable) -> Result<Box<dyn CommitEditor>> {
        self.repo.borrow_mut().revprops.push(revprops);
        Ok(Box::new(RecordingEditor {
            repo: self.repo.clone(),
            base: self.base_rel(),
            next_baton: 0,
            open_dirs: HashMap::new(),
            open_files: HashMap::new(),
            pending: Vec::new(),
        }))
    }

    fn oldest_rev_at_path(&self, rel: &str, rev: Revnum) -> Result<Option<Revnum>> {
        let repo = self.repo.borrow();
        Ok(repo
            .oldest_rev(&self.to_root_rel(rel), rev.get())
            .map(Revnum::new))
    }

    fn mergeinfo_for_path(&self, root_rel: &str, rev: Revnum) -> Result<Option<Mergeinfo>> {
        let repo = self.repo.borrow();
        let rel = root_rel.trim_start_matches('/');
        Ok(repo.node_at(rel, rev.get()).and_then(|n| n.mergeinfo.clone()))
    }
}

// ---------------------------------------------------------------------------
// Commit editor
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum PendingChange {
    Add {
        root_rel: String,
        kind: NodeKind,
        copyfrom: Option<(String, u64)>,
        text: Option<String>,
    },
    Delete {
        root_rel: String,
    },
    Prop {
        root_rel: String,
        name: String,
        value: String,
    },
}

pub struct RecordingEditor {
    repo: Rc<RefCell<FakeRepo>>,
    base: String,
    next_baton: u64,
    open_dirs: HashMap<u64, String>,
    open_files: HashMap<u64, String>,
    pending: Vec<PendingChange>,
}

impl RecordingEditor {
    fn next_id(&mut self) -> u64 {
        self.next_baton += 1;
        self.next_baton
    }

    fn to_root_rel(&self, rel: &str) -> String {
        if rel.is_empty() {
            self.base.clone()
        } else if self.base.is_empty() {
            rel.to_string()
        } else {
            format!("{}/{rel}", self.base)
        }
    }

    fn copyfrom_rel(&self, copyfrom: Option<(&Url, Revnum)>) -> Option<(String, u64)> {
        copyfrom.map(|(url, rev)| {
            let repo = self.repo.borrow();
            let rel = if *url == repo.root {
                String::new()
            } else {
                repo.root.is_child(url).unwrap_or_default()
            };
            (rel, rev.get())
        })
    }
}

impl CommitEditor for RecordingEditor {
    fn open_root(&mut self, _base_rev: Option<Revnum>) -> Result<DirBaton> {
        self.repo.borrow_mut().edit_ops.push(EditOp::OpenRoot);
        let id = self.next_id();
        self.open_dirs.insert(id, String::new());
        Ok(DirBaton::new(id))
    }

    fn open_directory(
        &mut self,
        path: &str,
        _parent: &DirBaton,
        _base_rev: Option<Revnum>,
    ) -> Result<DirBaton> {
        self.repo
            .borrow_mut()
            .edit_ops
            .push(EditOp::OpenDir(path.to_string()));
        let id = self.next_id();
        self.open_dirs.insert(id, path.to_string());
        Ok(DirBaton::new(id))
    }

    fn add_directory(
        &mut self,
        path: &str,
        _parent: &DirBaton,
        copyfrom: Option<(&Url, Revnum)>,
    ) -> Result<DirBaton> {
        if self.repo.borrow().fail_add_paths.contains(path) {
            return Err(Error::new(ErrorKind::Io, "injected editor failure"));
        }
        let copyfrom_rel = self.copyfrom_rel(copyfrom);
        self.repo.borrow_mut().edit_ops.push(EditOp::AddDir {
            path: path.to_string(),
            copyfrom: copyfrom_rel.clone(),
        });
        self.pending.push(PendingChange::Add {
            root_rel: self.to_root_rel(path),
            kind: NodeKind::Dir,
            copyfrom: copyfrom_rel,
            text: None,
        });
        let id = self.next_id();
        self.open_dirs.insert(id, path.to_string());
        Ok(DirBaton::new(id))
    }

    fn add_file(
        &mut self,
        path: &str,
        _parent: &DirBaton,
        copyfrom: Option<(&Url, Revnum)>,
    ) -> Result<FileBaton> {
        if self.repo.borrow().fail_add_paths.contains(path) {
            return Err(Error::new(ErrorKind::Io, "injected editor failure"));
        }
        let copyfrom_rel = self.copyfrom_rel(copyfrom);
        self.repo.borrow_mut().edit_ops.push(EditOp::AddFile {
            path: path.to_string(),
            copyfrom: copyfrom_rel.clone(),
        });
        self.pending.push(PendingChange::Add {
            root_rel: self.to_root_rel(path),
            kind: NodeKind::File,
            copyfrom: copyfrom_rel,
            text: None,
        });
        let id = self.next_id();
        self.open_files.insert(id, path.to_string());
        Ok(FileBaton::new(id))
    }

    fn delete_entry(&mut self, path: &str, _rev: Option<Revnum>, _parent: &DirBaton) -> Result<()> {
        self.repo
            .borrow_mut()
            .edit_ops
            .push(EditOp::Delete(path.to_string()));
        self.pending.push(PendingChange::Delete {
            root_rel: self.to_root_rel(path),
        });
        Ok(())
    }

    fn change_dir_prop(&mut self, dir: &DirBaton, name: &str, value: &str) -> Result<()> {
        let path = self.open_dirs.get(&dir.id()).cloned().unwrap_or_default();
        self.repo.borrow_mut().edit_ops.push(EditOp::DirProp {
            path: path.clone(),
            name: name.to_string(),
            value: value.to_string(),
        });
        self.pending.push(PendingChange::Prop {
            root_rel: self.to_root_rel(&path),
            name: name.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }

    fn change_file_prop(&mut self, file: &FileBaton, name: &str, value: &str) -> Result<()> {
        let path = self.open_files.get(&file.id()).cloned().unwrap_or_default();
        self.repo.borrow_mut().edit_ops.push(EditOp::FileProp {
            path: path.clone(),
            name: name.to_string(),
            value: value.to_string(),
        });
        self.pending.push(PendingChange::Prop {
            root_rel: self.to_root_rel(&path),
            name: name.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }

    fn apply_text(&mut self, file: &FileBaton, content: Bytes) -> Result<()> {
        let path = self.open_files.get(&file.id()).cloned().unwrap_or_default();
        let root_rel = self.to_root_rel(&path);
        for change in self.pending.iter_mut().rev() {
            if let PendingChange::Add {
                root_rel: add_path,
                text,
                ..
            } = change
            {
                if *add_path == root_rel {
                    *text = Some(String::from_utf8_lossy(&content).into_owned());
                    break;
                }
            }
        }
        Ok(())
    }

    fn close_file(&mut self, file: FileBaton) -> Result<()> {
        let path = self.open_files.remove(&file.id()).unwrap_or_default();
        self.repo.borrow_mut().edit_ops.push(EditOp::CloseFile(path));
        Ok(())
    }

    fn close_directory(&mut self, dir: DirBaton) -> Result<()> {
        let path = self.open_dirs.remove(&dir.id()).unwrap_or_default();
        self.repo.borrow_mut().edit_ops.push(EditOp::CloseDir(path));
        Ok(())
    }

    fn close_edit(self: Box<Self>) -> Result<CommitInfo> {
        let this = *self;
        let mut repo = this.repo.borrow_mut();
        repo.edit_ops.push(EditOp::CloseEdit);

        let new_rev = repo.head + 1;
        repo.head = new_rev;
        for change in &this.pending {
            match change {
                PendingChange::Add {
                    root_rel,
                    kind,
                    copyfrom,
                    text,
                } => match copyfrom {
                    Some((from_rel, from_rev)) => {
                        for (suffix, mut node) in repo.nodes_under(from_rel, *from_rev) {
                            let target = if suffix.is_empty() {
                                root_rel.clone()
                            } else {
                                format!("{root_rel}/{suffix}")
                            };
                            if suffix.is_empty() {
                                if let Some(text) = text {
                                    node.content = text.clone();
                                }
                            }
                            repo.set_node(&target, new_rev, Some(node));
                        }
                    }
                    None => {
                        let node = match kind {
                            NodeKind::Dir => FakeNode::dir(),
                            _ => FakeNode::file(text.as_deref().unwrap_or("")),
                        };
                        repo.set_node(root_rel, new_rev, Some(node));
                    }
                },
                PendingChange::Delete { root_rel } => {
                    repo.delete(root_rel, new_rev);
                }
                PendingChange::Prop {
                    root_rel,
                    name,
                    value,
                } => {
                    if let Some(node) = repo.node_at(root_rel, new_rev).cloned() {
                        let mut node = node;
                        if name == PROP_MERGEINFO {
                            node.mergeinfo = Some(Mergeinfo::parse(value)?);
                        } else {
                            node.props.insert(name.clone(), value.clone());
                        }
                        repo.set_node(root_rel, new_rev, Some(node));
                    }
                }
            }
        }

        Ok(CommitInfo::new(Revnum::new(new_rev), None, None))
    }

    fn abort_edit(&mut self) -> Result<()> {
        let mut repo = self.repo.borrow_mut();
        repo.aborted = true;
        repo.edit_ops.push(EditOp::Abort);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Working copy
// ---------------------------------------------------------------------------

/// One recorded working-copy primitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WcOp {
    Copy {
        src: PathBuf,
        under: PathBuf,
        base_name: String,
    },
    Delete {
        path: PathBuf,
        force: bool,
    },
    AddWithHistory {
        dst: PathBuf,
        copyfrom_url: String,
        copyfrom_rev: u64,
    },
    AddReposFile {
        dst: PathBuf,
        copyfrom: Option<(String, u64)>,
    },
    Checkout {
        url: String,
        dst: PathBuf,
        rev: u64,
    },
    RecordMergeinfo {
        path: PathBuf,
        mergeinfo: String,
    },
}

pub struct WcState {
    pub root: PathBuf,
    pub entries: RefCell<HashMap<PathBuf, WcEntry>>,
    pub wc_mergeinfo: RefCell<HashMap<PathBuf, Mergeinfo>>,
    pub recorded_mergeinfo: RefCell<HashMap<PathBuf, Mergeinfo>>,
    pub ops: RefCell<Vec<WcOp>>,
    pub live_locks: RefCell<Vec<PathBuf>>,
    pub lock_events: RefCell<Vec<String>>,
    pub uuid: RefCell<Option<String>>,
    pub repo: RefCell<Option<Rc<RefCell<FakeRepo>>>>,
    /// Revision checkouts land on; 0 means the repository head.
    pub checkout_rev: Cell<u64>,
    pub fail_unlock: Cell<bool>,
    pub fail_copy_of: RefCell<Option<PathBuf>>,
    pub fail_drive: Cell<bool>,
}

#[derive(Clone)]
pub struct FakeWc {
    state: Rc<WcState>,
}

impl FakeWc {
    pub fn new(root: &Path) -> FakeWc {
        FakeWc {
            state: Rc::new(WcState {
                root: root.to_path_buf(),
                entries: RefCell::new(HashMap::new()),
                wc_mergeinfo: RefCell::new(HashMap::new()),
                recorded_mergeinfo: RefCell::new(HashMap::new()),
                ops: RefCell::new(Vec::new()),
                live_locks: RefCell::new(Vec::new()),
                lock_events: RefCell::new(Vec::new()),
                uuid: RefCell::new(None),
                repo: RefCell::new(None),
                checkout_rev: Cell::new(0),
                fail_unlock: Cell::new(false),
                fail_copy_of: RefCell::new(None),
                fail_drive: Cell::new(false),
            }),
        }
    }

    pub fn state(&self) -> Rc<WcState> {
        self.state.clone()
    }
}

fn copy_recursively(src: &Path, dst: &Path) -> std::io::Result<()> {
    if src.is_dir() {
        std::fs::create_dir_all(dst)?;
        for entry in std::fs::read_dir(src)? {
            let entry = entry?;
            copy_recursively(&entry.path(), &dst.join(entry.file_name()))?;
        }
        Ok(())
    } else {
        std::fs::copy(src, dst).map(|_| ())
    }
}

impl WcContext for FakeWc {
    fn adm_open(
        &self,
        path: &Path,
        _write_lock: bool,
        _depth: LockDepth,
        _callbacks: &Callbacks,
    ) -> Result<Box<dyn WcAccess>> {
        if !path.is_dir() {
            return Err(Error::new(
                ErrorKind::WcNotDirectory,
                format!("Path '{}' is not a directory", path.display()),
            ));
        }
        self.state.live_locks.borrow_mut().push(path.to_path_buf());
        self.state
            .lock_events
            .borrow_mut()
            .push(format!("open:{}", path.display()));
        Ok(Box::new(FakeAdm {
            state: self.state.clone(),
            path: path.to_path_buf(),
            retrieved: false,
        }))
    }

    fn adm_probe_open(
        &self,
        path: &Path,
        write_lock: bool,
        depth: LockDepth,
        callbacks: &Callbacks,
    ) -> Result<Box<dyn WcAccess>> {
        let target = if path.is_dir() {
            path.to_path_buf()
        } else {
            parent_dir(path)
        };
        self.adm_open(&target, write_lock, depth, callbacks)
    }

    fn entry(&self, path: &Path, _adm: &dyn WcAccess) -> Result<Option<WcEntry>> {
        Ok(self.state.entries.borrow().get(path).cloned())
    }

    fn copy(
        &self,
        src: &Path,
        adm: &dyn WcAccess,
        base_name: &str,
        _callbacks: &Callbacks,
    ) -> Result<()> {
        if self.state.fail_copy_of.borrow().as_deref() == Some(src) {
            return Err(Error::new(ErrorKind::Io, "simulated copy failure"));
        }
        let dst = adm.path().join(base_name);
        copy_recursively(src, &dst)?;
        self.state.ops.borrow_mut().push(WcOp::Copy {
            src: src.to_path_buf(),
            under: adm.path().to_path_buf(),
            base_name: base_name.to_string(),
        });
        Ok(())
    }

    fn delete(
        &self,
        path: &Path,
        _adm: &dyn WcAccess,
        force: bool,
        _callbacks: &Callbacks,
    ) -> Result<()> {
        if path.is_dir() {
            std::fs::remove_dir_all(path)?;
        } else if path.exists() {
            std::fs::remove_file(path)?;
        }
        self.state.ops.borrow_mut().push(WcOp::Delete {
            path: path.to_path_buf(),
            force,
        });
        Ok(())
    }

    fn add_with_history(
        &self,
        dst: &Path,
        _adm: &dyn WcAccess,
        copyfrom_url: &Url,
        copyfrom_rev: Revnum,
        _callbacks: &Callbacks,
    ) -> Result<()> {
        self.state.ops.borrow_mut().push(WcOp::AddWithHistory {
            dst: dst.to_path_buf(),
            copyfrom_url: copyfrom_url.to_string(),
            copyfrom_rev: copyfrom_rev.get(),
        });
        Ok(())
    }

    fn add_repos_file(
        &self,
        dst: &Path,
        _adm: &dyn WcAccess,
        text_path: &Path,
        _props: &PropTable,
        copyfrom: Option<(&Url, Revnum)>,
    ) -> Result<()> {
        std::fs::rename(text_path, dst)?;
        self.state.ops.borrow_mut().push(WcOp::AddReposFile {
            dst: dst.to_path_buf(),
            copyfrom: copyfrom.map(|(url, rev)| (url.to_string(), rev.get())),
        });
        Ok(())
    }

    fn checkout(
        &self,
        src_url: &Url,
        dst: &Path,
        _peg: Revision,
        _op: Revision,
        _callbacks: &Callbacks,
    ) -> Result<Revnum> {
        let repo_rc = self
            .state
            .repo
            .borrow()
            .clone()
            .ok_or_else(|| Error::new(ErrorKind::Base, "fake WC has no repository configured"))?;
        let repo = repo_rc.borrow();
        let rev = match self.state.checkout_rev.get() {
            0 => repo.head,
            rev => rev,
        };
        let rel = if *src_url == repo.root {
            String::new()
        } else {
            repo.root.is_child(src_url).ok_or_else(|| {
                Error::new(
                    ErrorKind::RaIllegalUrl,
                    format!("URL '{src_url}' is not in the configured repository"),
                )
            })?
        };

        std::fs::create_dir_all(dst)?;
        for (suffix, node) in repo.nodes_under(&rel, rev) {
            let target = if suffix.is_empty() {
                dst.to_path_buf()
            } else {
                dst.join(&suffix)
            };
            match node.kind {
                NodeKind::Dir => std::fs::create_dir_all(&target)?,
                _ => std::fs::write(&target, node.content.as_bytes())?,
            }
        }

        self.state.ops.borrow_mut().push(WcOp::Checkout {
            url: src_url.to_string(),
            dst: dst.to_path_buf(),
            rev,
        });
        Ok(Revnum::new(rev))
    }

    fn parse_mergeinfo(&self, path: &Path, _adm: &dyn WcAccess) -> Result<Mergeinfo> {
        Ok(self
            .state
            .wc_mergeinfo
            .borrow()
            .get(path)
            .cloned()
            .unwrap_or_default())
    }

    fn record_mergeinfo(&self, path: &Path, info: &Mergeinfo, _adm: &dyn WcAccess) -> Result<()> {
        self.state
            .recorded_mergeinfo
            .borrow_mut()
            .insert(path.to_path_buf(), info.clone());
        self.state.ops.borrow_mut().push(WcOp::RecordMergeinfo {
            path: path.to_path_buf(),
            mergeinfo: info.to_string(),
        });
        Ok(())
    }

    fn uuid_from_path(&self, _path: &Path, _adm: &dyn WcAccess) -> Result<String> {
        self.state
            .uuid
            .borrow()
            .clone()
            .ok_or_else(|| Error::new(ErrorKind::RaNoReposUuid, "Working copy has no UUID"))
    }

    fn collect_copy_committables(
        &self,
        candidates: &[CopyCandidate],
        _adm: &dyn WcAccess,
        _callbacks: &Callbacks,
    ) -> Result<Vec<CommitItem>> {
        let mut items = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let kind = if candidate.src.is_dir() {
                NodeKind::Dir
            } else {
                NodeKind::File
            };
            let mut item = CommitItem::new(
                candidate.dst.clone(),
                kind,
                CommitItemFlags::ADD | CommitItemFlags::IS_COPY,
            );
            if let Some(entry) = self.state.entries.borrow().get(&candidate.src) {
                if let Some(url) = &entry.url {
                    item.copyfrom = Some((url.clone(), entry.revision));
                }
            }
            items.push(item);
        }
        Ok(items)
    }

    fn condense_commit_items(&self, items: &mut Vec<CommitItem>) -> Result<Url> {
        let first = items
            .first()
            .ok_or_else(|| Error::new(ErrorKind::Base, "no commit items to condense"))?;
        let mut anchor = first.url.dirname();
        for item in items[1..].iter() {
            anchor = anchor.longest_common_ancestor(&item.url);
        }
        Ok(anchor)
    }

    fn drive_commit(
        &self,
        base_url: &Url,
        items: &[CommitItem],
        _adm: &dyn WcAccess,
        editor: &mut dyn CommitEditor,
        tempfiles: &mut Vec<PathBuf>,
        _callbacks: &Callbacks,
    ) -> Result<()> {
        let root = editor.open_root(None)?;
        for (idx, item) in items.iter().enumerate() {
            let temp = self.state.root.join(format!(".rsvn-textbase-{idx}.tmp"));
            std::fs::write(&temp, b"text-base")?;
            tempfiles.push(temp);
            if self.state.fail_drive.get() {
                return Err(Error::new(ErrorKind::Io, "simulated transmission failure"));
            }

            let rel = base_url.is_child(&item.url).unwrap_or_default();
            let copyfrom = item.copyfrom.as_ref().map(|(url, rev)| (url, *rev));
            match item.kind {
                NodeKind::Dir => {
                    let dir = editor.add_directory(&rel, &root, copyfrom)?;
                    for (name, value) in &item.outgoing_prop_changes {
                        editor.change_dir_prop(&dir, name, value)?;
                    }
                    editor.close_directory(dir)?;
                }
                _ => {
                    let file = editor.add_file(&rel, &root, copyfrom)?;
                    for (name, value) in &item.outgoing_prop_changes {
                        editor.change_file_prop(&file, name, value)?;
                    }
                    editor.apply_text(&file, Bytes::from_static(b"text-base"))?;
                    editor.close_file(file)?;
                }
            }
        }
        editor.close_directory(root)?;
        Ok(())
    }
}

pub struct FakeAdm {
    state: Rc<WcState>,
    path: PathBuf,
    retrieved: bool,
}

impl WcAccess for FakeAdm {
    fn path(&self) -> &Path {
        &self.path
    }

    fn retrieve(&self, path: &Path) -> Result<Box<dyn WcAccess>> {
        Ok(Box::new(FakeAdm {
            state: self.state.clone(),
            path: path.to_path_buf(),
            retrieved: true,
        }))
    }

    fn close(self: Box<Self>) -> Result<()> {
        if self.retrieved {
            return Ok(());
        }
        {
            let mut live = self.state.live_locks.borrow_mut();
            if let Some(pos) = live.iter().position(|p| *p == self.path) {
                live.remove(pos);
            }
        }
        self.state
            .lock_events
            .borrow_mut()
            .push(format!("close:{}", self.path.display()));
        if self.state.fail_unlock.get() {
            return Err(Error::new(ErrorKind::Io, "simulated unlock failure"));
        }
        Ok(())
    }
}
