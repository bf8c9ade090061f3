//! Repository to repository copies and moves
//!
//! The whole batch executes as one commit transaction: a session is opened
//! at the longest URL common to every endpoint, each pair contributes an add
//! (and, for a non-resurrection move, a delete), and the path driver feeds
//! the union of affected paths to the commit editor parent-before-child.
//!
//! Copying a URL onto itself is a *resurrection*: it reinstates a node
//! deleted in an earlier revision and produces an add but no delete. A
//! resurrection forces the session anchor up one level, since a session
//! cannot add its own root.

use crate::areas::NodeKind;
use crate::areas::context::Client;
use crate::areas::editor::{CommitEditor, DirBaton};
use crate::artifacts::commit::path_driver;
use crate::artifacts::commit::{CommitInfo, CommitItem, CommitItemFlags, revprop_table};
use crate::artifacts::copy::ancestors::get_copy_pair_ancestors;
use crate::artifacts::copy::pair::CopyPair;
use crate::artifacts::mergeinfo::{PROP_MERGEINFO, assembler};
use crate::artifacts::paths::{Target, Url, uri_decode};
use crate::artifacts::revision::{Revnum, revision_number};
use crate::error::{Error, ErrorKind, Result};
use std::collections::HashMap;

/// Per-pair state consumed by the path-driver callback.
#[derive(Debug, Clone)]
struct PathDriverInfo {
    src_url: Url,
    src_path: String,
    dst_path: String,
    src_kind: NodeKind,
    src_revnum: Revnum,
    resurrection: bool,
    /// Serialized mergeinfo to set on the added node, when non-empty.
    mergeinfo: Option<String>,
}

impl Client {
    pub(crate) fn repos_to_repos_copy(
        &self,
        pairs: &mut [CopyPair],
        is_move: bool,
    ) -> Result<Option<CommitInfo>> {
        // The session must sit at a URL from which every source and
        // destination is reachable.
        let ancestors = get_copy_pair_ancestors(pairs)?;
        let mut top_url = ancestors.common_url.ok_or_else(|| {
            Error::new(ErrorKind::Base, "repository copy without URL endpoints")
        })?;

        let mut resurrections = vec![false; pairs.len()];
        for (pair, resurrection) in pairs.iter().zip(resurrections.iter_mut()) {
            if pair.src == pair.dst {
                *resurrection = true;
                // Resurrecting the anchor itself: a session cannot add its
                // own root, so anchor at the parent instead.
                if *pair.src.as_url()? == top_url {
                    top_url = top_url.dirname();
                }
            }
        }

        let mut session = match self.ra().open(&top_url, None) {
            Ok(session) => session,
            Err(err) if err.kind() == ErrorKind::RaIllegalUrl && top_url.is_empty() => {
                // Two URLs share no non-empty ancestor iff they live in
                // different repositories; this textual test spares a UUID
                // round-trip to both sides.
                let first = &pairs[0];
                return Err(Error::new(
                    ErrorKind::UnsupportedFeature,
                    format!(
                        "Source and dest appear not to be in the same repository \
                         (src: '{}'; dst: '{}')",
                        first.src, first.dst
                    ),
                ));
            }
            Err(err) => return Err(err),
        };

        let repos_root = session.repos_root()?;

        // A source below its own destination also forces the anchor up one
        // level, except when the destination is the repository root.
        for (pair, resurrection) in pairs.iter().zip(resurrections.iter_mut()) {
            let dst = pair.dst.as_url()?;
            if *dst != repos_root && dst.is_child(pair.src.as_url()?).is_some() {
                *resurrection = true;
                top_url = top_url.dirname();
                session.reparent(&top_url)?;
            }
        }

        let youngest = session.latest_revnum()?;

        let mut infos = Vec::with_capacity(pairs.len());
        for (pair, resurrection) in pairs.iter_mut().zip(resurrections.iter().copied()) {
            let src_revnum = revision_number(pair.src_op_revision, session.as_ref())?;
            pair.src_revnum = Some(src_revnum);

            // Trace history so the copy references the URL the node had in
            // the operative revision.
            let traced = self.ra().trace_node_location(
                pair.src.as_url()?,
                pair.src_peg_revision,
                pair.src_op_revision,
            )?;
            pair.src = Target::Repo(traced);

            let src_rel = top_url
                .is_child(pair.src.as_url()?)
                .map(|rel| uri_decode(&rel))
                .unwrap_or_default();
            let dst_rel = top_url
                .is_child(pair.dst.as_url()?)
                .map(|rel| uri_decode(&rel))
                .unwrap_or_default();

            if src_rel.is_empty() && is_move {
                return Err(Error::new(
                    ErrorKind::UnsupportedFeature,
                    format!("Cannot move URL '{}' into itself", pair.src),
                ));
            }

            let src_kind = session.check_path(&src_rel, Some(src_revnum))?;
            if src_kind == NodeKind::None {
                return Err(Error::new(
                    ErrorKind::FsNotFound,
                    format!("Path '{}' does not exist in revision {src_revnum}", pair.src),
                ));
            }
            if session.check_path(&dst_rel, Some(youngest))? != NodeKind::None {
                return Err(Error::new(
                    ErrorKind::FsAlreadyExists,
                    format!("Path '{dst_rel}' already exists"),
                ));
            }

            pair.src_rel = Some(src_rel.clone());
            pair.dst_rel = Some(dst_rel.clone());
            infos.push(PathDriverInfo {
                src_url: pair.src.as_url()?.clone(),
                src_path: src_rel,
                dst_path: dst_rel,
                src_kind,
                src_revnum,
                resurrection,
                mergeinfo: None,
            });
        }

        // The log-message callback sees the prospective commit items and may
        // abandon the whole operation by returning no message.
        let message = if self.callbacks().has_log_msg_callback() {
            let mut items = Vec::with_capacity(2 * infos.len());
            for info in &infos {
                items.push(CommitItem::new(
                    top_url.join(&info.dst_path),
                    info.src_kind,
                    CommitItemFlags::ADD | CommitItemFlags::IS_COPY,
                ));
                if is_move && !info.resurrection {
                    items.push(CommitItem::new(
                        top_url.join(&info.src_path),
                        info.src_kind,
                        CommitItemFlags::DELETE,
                    ));
                }
            }
            match self.callbacks().resolve_log_message(&items)? {
                Some(message) => message,
                None => return Ok(None),
            }
        } else {
            String::new()
        };

        // Every destination carries the source's complete mergeinfo, both
        // implied by its history and explicitly recorded on it.
        for info in &mut infos {
            let mergeinfo = assembler::calculate_target_mergeinfo(
                session.as_ref(),
                &info.src_url,
                &info.src_path,
                info.src_revnum,
            )?;
            if !mergeinfo.is_empty() {
                info.mergeinfo = Some(mergeinfo.to_string());
            }
        }

        // The flat path set for the editor drive: every destination, plus
        // the source of every non-resurrection move.
        let mut paths = Vec::with_capacity(2 * infos.len());
        let mut actions: HashMap<&str, &PathDriverInfo> = HashMap::new();
        for info in &infos {
            paths.push(info.dst_path.clone());
            actions.insert(info.dst_path.as_str(), info);
            if is_move && !info.resurrection {
                paths.push(info.src_path.clone());
                actions.insert(info.src_path.as_str(), info);
            }
        }

        tracing::debug!(%top_url, paths = paths.len(), youngest = %youngest, "driving commit");
        let mut editor = session.get_commit_editor(revprop_table(&message))?;

        let drive_result = path_driver::drive(
            editor.as_mut(),
            Some(youngest),
            &paths,
            &mut |editor, parent, path| {
                let info = actions.get(path).copied().ok_or_else(|| {
                    Error::new(
                        ErrorKind::Base,
                        format!("No action recorded for path '{path}'"),
                    )
                })?;
                drive_one_path(editor, parent, path, info, is_move)
            },
        );

        match drive_result {
            Ok(()) => Ok(Some(editor.close_edit()?)),
            Err(err) => {
                // At least try to abort the transaction before surfacing
                // the error.
                let _ = editor.abort_edit();
                Err(err)
            }
        }
    }
}

/// The per-path state machine of the commit.
fn drive_one_path(
    editor: &mut dyn CommitEditor,
    parent: &DirBaton,
    path: &str,
    info: &PathDriverInfo,
    is_move: bool,
) -> Result<Option<DirBaton>> {
    // A resurrection move would add and delete the same path, which would
    // annihilate; such a pair contributes nothing to the commit.
    let (do_delete, do_add) = if info.resurrection {
        (false, !is_move)
    } else if is_move {
        if info.src_path == path {
            (true, false)
        } else {
            (false, true)
        }
    } else {
        (false, true)
    };

    if do_delete {
        editor.delete_entry(path, None, parent)?;
    }

    let mut dir_baton = None;
    if do_add {
        debug_assert!(!path.is_empty(), "cannot add the empty path");
        if info.src_kind == NodeKind::File {
            let file = editor.add_file(path, parent, Some((&info.src_url, info.src_revnum)))?;
            if let Some(mergeinfo) = &info.mergeinfo {
                editor.change_file_prop(&file, PROP_MERGEINFO, mergeinfo)?;
            }
            editor.close_file(file)?;
        } else {
            let dir = editor.add_directory(path, parent, Some((&info.src_url, info.src_revnum)))?;
            if let Some(mergeinfo) = &info.mergeinfo {
                editor.change_dir_prop(&dir, PROP_MERGEINFO, mergeinfo)?;
            }
            dir_baton = Some(dir);
        }
    }

    Ok(dir_baton)
}
