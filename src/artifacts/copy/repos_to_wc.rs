//! Repository to working copy copies
//!
//! Directory sources are checked out into place and, when both sides belong
//! to the same repository, marked added-with-history; file sources are
//! streamed into a temporary file and handed to the working copy as a new
//! text base. Whether history can be carried at all hinges on a repository
//! UUID comparison: if either UUID is unobtainable the repositories are
//! assumed different and no copy history is attempted.

use crate::areas::NodeKind;
use crate::areas::context::{Client, Notification, NotifyAction};
use crate::areas::disk;
use crate::areas::ra::RaSession;
use crate::areas::wc::{LockDepth, WcAccess, WcSchedule};
use crate::artifacts::copy::ancestors::get_copy_pair_ancestors;
use crate::artifacts::copy::pair::CopyPair;
use crate::artifacts::mergeinfo::{Mergeinfo, assembler};
use crate::artifacts::paths::{Target, parent_dir, uri_decode};
use crate::artifacts::revision::{Revision, revision_number};
use crate::error::{Error, ErrorKind, Result};
use std::path::Path;

impl Client {
    pub(crate) fn repos_to_wc_copy(&self, pairs: &mut [CopyPair]) -> Result<()> {
        // Trace each source's history first so the copy references the URL
        // the node had in the operative revision. Checkout reporting still
        // wants the original URL, so that is stashed aside.
        for pair in pairs.iter_mut() {
            let traced = self.ra().trace_node_location(
                pair.src.as_url()?,
                pair.src_peg_revision,
                pair.src_op_revision,
            )?;
            pair.src_original = pair.src.clone();
            pair.src = Target::Repo(traced);
        }

        let ancestors = get_copy_pair_ancestors(pairs)?;
        let mut top_src_url = ancestors.src.as_url()?.clone();
        if pairs.len() == 1 {
            top_src_url = top_src_url.dirname();
        }
        let top_dst_path = ancestors.dst.as_wc_path()?.to_path_buf();

        let session = self.ra().open(&top_src_url, None)?;

        for pair in pairs.iter_mut() {
            pair.src_revnum = Some(revision_number(pair.src_op_revision, session.as_ref())?);
        }

        // Verify sources exist at their revisions and destinations are
        // free before any working-copy state is touched.
        for pair in pairs.iter_mut() {
            let src_rel = top_src_url
                .is_child(pair.src.as_url()?)
                .map(|rel| uri_decode(&rel))
                .unwrap_or_default();
            let src_revnum = pair.resolved_revnum()?;
            let src_kind = session.check_path(&src_rel, Some(src_revnum))?;
            if src_kind == NodeKind::None {
                return Err(Error::new(
                    ErrorKind::FsNotFound,
                    format!("Path '{}' not found in revision {src_revnum}", pair.src),
                ));
            }
            pair.src_kind = src_kind;
            pair.src_rel = Some(src_rel);

            let dst = pair.dst.as_wc_path()?;
            if disk::check_path(dst)? != NodeKind::None {
                return Err(Error::new(
                    ErrorKind::EntryExists,
                    format!("Path '{}' already exists", dst.display()),
                ));
            }
            let dst_parent = parent_dir(dst);
            if disk::check_path(&dst_parent)? != NodeKind::Dir {
                return Err(Error::new(
                    ErrorKind::WcNotDirectory,
                    format!("Path '{}' is not a directory", dst_parent.display()),
                ));
            }
        }

        let adm =
            self.wc()
                .adm_probe_open(&top_dst_path, true, LockDepth::This, self.callbacks())?;

        let result = self.repos_to_wc_copy_locked(pairs, session.as_ref(), adm.as_ref(), &top_dst_path);
        let close_result = adm.close();
        result?;
        close_result
    }

    fn repos_to_wc_copy_locked(
        &self,
        pairs: &mut [CopyPair],
        session: &dyn RaSession,
        adm: &dyn WcAccess,
        top_dst_path: &Path,
    ) -> Result<()> {
        // Physical obstruction was ruled out above; an entry whose working
        // file happens to be missing still logically obstructs, unless it
        // is already scheduled for deletion.
        for pair in pairs.iter() {
            let dst = pair.dst.as_wc_path()?;
            if let Some(entry) = self.wc().entry(dst, adm)? {
                if entry.kind != NodeKind::Dir && entry.schedule != WcSchedule::Delete {
                    return Err(Error::new(
                        ErrorKind::WcObstructedUpdate,
                        format!(
                            "Entry for '{}' exists (though the working file is missing)",
                            dst.display()
                        ),
                    ));
                }
            }
        }

        let same_repositories = self.same_repositories(session, adm, pairs, top_dst_path)?;
        tracing::debug!(same_repositories, "repository identity decided");

        for pair in pairs.iter() {
            self.callbacks().check_cancelled()?;
            self.repos_to_wc_copy_single(pair, same_repositories, session, adm)?;
        }
        Ok(())
    }

    /// Compare the source repository's UUID with the UUID of the
    /// destination's parent. If either is unobtainable (a very old
    /// repository), assume they differ rather than punish the user; no
    /// copy history will be attempted. Textually equal UUIDs are taken as
    /// proof of identity, a heuristic that spares contacting both sides.
    fn same_repositories(
        &self,
        session: &dyn RaSession,
        adm: &dyn WcAccess,
        pairs: &[CopyPair],
        top_dst_path: &Path,
    ) -> Result<bool> {
        let src_uuid = match session.uuid() {
            Ok(uuid) => Some(uuid),
            Err(err) if err.kind() == ErrorKind::RaNoReposUuid => None,
            Err(err) => return Err(err),
        };

        // The destination itself does not exist yet, so probe its parent.
        let probe_path = if pairs.len() == 1 {
            parent_dir(top_dst_path)
        } else {
            top_dst_path.to_path_buf()
        };
        let dst_uuid = match self.wc().uuid_from_path(&probe_path, adm) {
            Ok(uuid) => Some(uuid),
            Err(err) if err.kind() == ErrorKind::RaNoReposUuid => None,
            Err(err) => return Err(err),
        };

        Ok(matches!((src_uuid, dst_uuid), (Some(src), Some(dst)) if src == dst))
    }

    fn repos_to_wc_copy_single(
        &self,
        pair: &CopyPair,
        same_repositories: bool,
        session: &dyn RaSession,
        adm: &dyn WcAccess,
    ) -> Result<()> {
        let dst = pair.dst.as_wc_path()?;
        let src_url = pair.src.as_url()?;

        if pair.src_kind == NodeKind::Dir {
            let checkout_rev = self.wc().checkout(
                pair.src_original.as_url()?,
                dst,
                pair.src_peg_revision,
                pair.src_op_revision,
                self.callbacks(),
            )?;

            if !same_repositories {
                // The caller is left with a populated but unversioned
                // subtree.
                return Err(Error::new(
                    ErrorKind::UnsupportedFeature,
                    format!(
                        "Source URL '{src_url}' is from foreign repository; \
                         leaving it as a disjoint WC"
                    ),
                ));
            }

            let dst_access =
                self.wc()
                    .adm_open(dst, true, LockDepth::Infinite, self.callbacks())?;
            let result = (|| {
                // A checkout of HEAD lands on whatever revision the server
                // had at that moment; that concrete revision is the
                // copyfrom revision, never a sentinel.
                let src_revnum = if pair.src_op_revision == Revision::Head {
                    checkout_rev
                } else {
                    pair.resolved_revnum()?
                };
                self.wc()
                    .add_with_history(dst, adm, src_url, src_revnum, self.callbacks())?;
                let mergeinfo = assembler::calculate_target_mergeinfo(
                    session,
                    src_url,
                    pair.src_rel()?,
                    src_revnum,
                )?;
                self.extend_wc_mergeinfo(dst, &mergeinfo, dst_access.as_ref())
            })();
            let close_result = dst_access.close();
            result?;
            close_result
        } else {
            let (text_path, mut file) = disk::create_unique_file(dst)?;
            let src_revnum = pair.resolved_revnum()?;
            let fetched = session.get_file(pair.src_rel()?, src_revnum, &mut file);
            drop(file);
            let (_, props) = match fetched {
                Ok(fetched) => fetched,
                Err(err) => {
                    let _ = disk::remove_file(&text_path);
                    return Err(err);
                }
            };

            let copyfrom = if same_repositories {
                Some((src_url, src_revnum))
            } else {
                None
            };
            let add_result = self
                .wc()
                .add_repos_file(dst, adm, &text_path, &props, copyfrom);

            let mergeinfo =
                assembler::calculate_target_mergeinfo(session, src_url, pair.src_rel()?, src_revnum)?;
            self.extend_wc_mergeinfo(dst, &mergeinfo, adm)?;

            // The add primitive cannot notify yet, so an explicit add event
            // is emitted here once it has succeeded.
            if add_result.is_ok() {
                self.callbacks().notify(&Notification::new(
                    pair.dst.clone(),
                    NotifyAction::Add,
                    pair.src_kind,
                ));
            }

            disk::sleep_for_timestamps();
            add_result
        }
    }

    /// Merge `mergeinfo` into whatever the working copy already records on
    /// `path` and write the result back.
    fn extend_wc_mergeinfo(
        &self,
        path: &Path,
        mergeinfo: &Mergeinfo,
        adm: &dyn WcAccess,
    ) -> Result<()> {
        let mut combined = self.wc().parse_mergeinfo(path, adm)?;
        combined.merge(mergeinfo);
        self.wc().record_mergeinfo(path, &combined, adm)
    }
}
