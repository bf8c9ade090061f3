//! Working copy to repository copies
//!
//! The sources are crawled into commit items, each item is given the union
//! of its source's repository mergeinfo and the working copy's own, and one
//! commit transaction is driven from the condensed destination anchor.
//!
//! Three phases can fail independently at the tail of the operation: the
//! commit drive itself, unlocking the working copy, and removing temporary
//! text-base files. Unlock and cleanup always run; their outcomes are
//! reconciled into one composite error headed either by the commit failure
//! or by a synthetic "commit succeeded" notice.

use crate::areas::NodeKind;
use crate::areas::context::{Callbacks, Client};
use crate::areas::disk;
use crate::areas::ra::{RaSession, repos_relative_path};
use crate::areas::wc::{CopyCandidate, LockDepth, WcAccess};
use crate::artifacts::commit::{CommitInfo, CommitItem, CommitItemFlags, revprop_table};
use crate::artifacts::copy::ancestors::get_copy_pair_ancestors;
use crate::artifacts::copy::pair::CopyPair;
use crate::artifacts::mergeinfo::{PROP_MERGEINFO, assembler};
use crate::artifacts::paths::{Url, uri_decode};
use crate::error::{Error, ErrorKind, Result};
use std::path::{Path, PathBuf};

impl Client {
    pub(crate) fn wc_to_repos_copy(&self, pairs: &mut [CopyPair]) -> Result<Option<CommitInfo>> {
        // The commit layer wants absolute paths.
        for pair in pairs.iter_mut() {
            pair.src_abs = Some(std::path::absolute(pair.src.as_wc_path()?)?);
        }

        let ancestors = get_copy_pair_ancestors(pairs)?;
        let top_src_path = ancestors.src.as_wc_path()?.to_path_buf();
        let adm = self.wc().adm_probe_open(
            &top_src_path,
            false,
            LockDepth::Infinite,
            self.callbacks(),
        )?;

        // Common destination URL ancestor; the directory itself for a
        // single pair.
        let mut top_dst_url = pairs[0].dst.as_url()?.dirname();
        for pair in pairs[1..].iter() {
            top_dst_url = top_dst_url.longest_common_ancestor(pair.dst.as_url()?);
        }

        let prepared = self.prepare_wc_to_repos(pairs, adm.as_ref(), &top_dst_url);
        let (session, message) = match prepared {
            Ok(Some(prepared)) => prepared,
            Ok(None) => {
                // The user declined to supply a log message; abandon the
                // operation quietly.
                adm.close()?;
                return Ok(None);
            }
            Err(mut err) => {
                if let Err(unlock_err) = adm.close() {
                    err.compose(unlock_err);
                }
                return Err(err);
            }
        };

        let mut tempfiles = Vec::new();
        let commit_result =
            self.commit_wc_to_repos(pairs, adm.as_ref(), session, &top_src_path, &message, &mut tempfiles);

        // The lock is read-only, so unlocking is harmless; it and tempfile
        // cleanup run regardless of how the commit went.
        let unlock_err = adm.close().err();
        let cleanup_err = remove_tmpfiles(&tempfiles, self.callbacks()).err();

        let (value, commit_err) = match commit_result {
            Ok(value) => (value, None),
            Err(err) => (None, Some(err)),
        };
        match reconcile_errors(commit_err, unlock_err, cleanup_err) {
            Some(err) => Err(err),
            None => Ok(value),
        }
    }

    /// Open the destination session, resolve per-pair state, verify the
    /// destinations are free, and obtain the log message. `Ok(None)` means
    /// the user abandoned the operation.
    fn prepare_wc_to_repos(
        &self,
        pairs: &mut [CopyPair],
        adm: &dyn WcAccess,
        top_dst_url: &Url,
    ) -> Result<Option<(Box<dyn RaSession>, String)>> {
        let session = self.ra().open(top_dst_url, Some(adm))?;

        for pair in pairs.iter_mut() {
            let src_path = pair.src.as_wc_path()?.to_path_buf();
            let entry = self.wc().entry(&src_path, adm)?.ok_or_else(|| {
                Error::new(
                    ErrorKind::EntryNotFound,
                    format!("'{}' is not under version control", src_path.display()),
                )
            })?;
            let url = entry.url.ok_or_else(|| {
                Error::new(
                    ErrorKind::EntryMissingUrl,
                    format!(
                        "'{}' does not seem to have a URL associated with it",
                        src_path.display()
                    ),
                )
            })?;
            pair.src_rel = Some(repos_relative_path(session.as_ref(), &url)?);
            pair.src_revnum = Some(entry.revision);

            let dst_rel = top_dst_url
                .is_child(pair.dst.as_url()?)
                .map(|rel| uri_decode(&rel))
                .unwrap_or_default();
            if session.check_path(&dst_rel, None)? != NodeKind::None {
                return Err(Error::new(
                    ErrorKind::FsAlreadyExists,
                    format!("Path '{}' already exists", pair.dst),
                ));
            }
            pair.dst_rel = Some(dst_rel);
        }

        let mut items = Vec::with_capacity(pairs.len());
        for pair in pairs.iter() {
            items.push(CommitItem::new(
                pair.dst.as_url()?.clone(),
                disk::check_path(pair.src.as_wc_path()?)?,
                CommitItemFlags::ADD | CommitItemFlags::IS_COPY,
            ));
        }
        match self.callbacks().resolve_log_message(&items)? {
            Some(message) => Ok(Some((session, message))),
            None => Ok(None),
        }
    }

    /// The commit phase: crawl committables, attach mergeinfo, condense,
    /// and drive the editor. `Ok(None)` when the crawl found nothing to
    /// commit.
    fn commit_wc_to_repos(
        &self,
        pairs: &mut [CopyPair],
        adm: &dyn WcAccess,
        mut session: Box<dyn RaSession>,
        top_src_path: &Path,
        message: &str,
        tempfiles: &mut Vec<PathBuf>,
    ) -> Result<Option<CommitInfo>> {
        let base_kind = disk::check_path(top_src_path)?;
        let dir_access = if base_kind == NodeKind::Dir {
            Some(adm.retrieve(top_src_path)?)
        } else {
            None
        };
        let crawl_adm = dir_access.as_deref().unwrap_or(adm);

        let mut candidates = Vec::with_capacity(pairs.len());
        for pair in pairs.iter() {
            let src_abs = pair
                .src_abs
                .clone()
                .ok_or_else(|| Error::new(ErrorKind::Base, "source not made absolute"))?;
            candidates.push(CopyCandidate::new(src_abs, pair.dst.as_url()?.clone()));
        }
        let mut items = self
            .wc()
            .collect_copy_committables(&candidates, crawl_adm, self.callbacks())?;
        if items.is_empty() {
            return Ok(None);
        }

        // Anchor the session at the repository root so history and
        // mergeinfo queries can use root-relative paths.
        let root = session.repos_root()?;
        session.reparent(&root)?;

        // The destination's mergeinfo is the combined mergeinfo known to
        // the repository and to the working copy.
        for (pair, item) in pairs.iter().zip(items.iter_mut()) {
            let src_path = pair.src.as_wc_path()?.to_path_buf();
            let entry = self.wc().entry(&src_path, adm)?.ok_or_else(|| {
                Error::new(
                    ErrorKind::EntryNotFound,
                    format!("'{}' is not under version control", src_path.display()),
                )
            })?;
            let url = entry.url.ok_or_else(|| {
                Error::new(
                    ErrorKind::EntryMissingUrl,
                    format!(
                        "'{}' does not seem to have a URL associated with it",
                        src_path.display()
                    ),
                )
            })?;
            let session_rel = pair.src_rel()?.trim_start_matches('/').to_string();
            let mut mergeinfo = assembler::calculate_target_mergeinfo(
                session.as_ref(),
                &url,
                &session_rel,
                pair.resolved_revnum()?,
            )?;
            let wc_mergeinfo = self.wc().parse_mergeinfo(&src_path, adm)?;
            mergeinfo.merge(&wc_mergeinfo);
            item.outgoing_prop_changes
                .push((PROP_MERGEINFO.to_string(), mergeinfo.to_string()));
        }

        let top_dst_url = self.wc().condense_commit_items(&mut items)?;

        // Reopen at the condensed anchor and drive the commit from there.
        let session = self.ra().open(&top_dst_url, None)?;
        let mut editor = session.get_commit_editor(revprop_table(message))?;
        tracing::debug!(%top_dst_url, items = items.len(), "driving working-copy commit");

        let drive_result = self.wc().drive_commit(
            &top_dst_url,
            &items,
            adm,
            editor.as_mut(),
            tempfiles,
            self.callbacks(),
        );
        disk::sleep_for_timestamps();

        match drive_result {
            Ok(()) => Ok(Some(editor.close_edit()?)),
            Err(err) => {
                let _ = editor.abort_edit();
                Err(err)
            }
        }
    }
}

/// Remove the temporary text-base files a commit drive left behind.
fn remove_tmpfiles(tempfiles: &[PathBuf], callbacks: &Callbacks) -> Result<()> {
    for path in tempfiles {
        callbacks.check_cancelled()?;
        if disk::check_path(path)? == NodeKind::File {
            disk::remove_file(path)?;
        }
    }
    Ok(())
}

/// Combine the outcomes of the commit, unlock, and cleanup phases into one
/// error chain, or nothing when all three succeeded.
fn reconcile_errors(
    commit_err: Option<Error>,
    unlock_err: Option<Error>,
    cleanup_err: Option<Error>,
) -> Option<Error> {
    if commit_err.is_none() && unlock_err.is_none() && cleanup_err.is_none() {
        return None;
    }

    let mut err = match commit_err {
        Some(err) => err.wrap("Commit failed (details follow):"),
        None => Error::new(ErrorKind::Base, "Commit succeeded, but other errors follow:"),
    };
    if let Some(unlock_err) = unlock_err {
        err.compose(unlock_err.wrap("Error unlocking locked dirs (details follow):"));
    }
    if let Some(cleanup_err) = cleanup_err {
        err.compose(cleanup_err.wrap("Error in post-commit clean-up (details follow):"));
    }
    Some(err)
}
