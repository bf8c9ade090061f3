//! Working-copy to working-copy copies and moves
//!
//! All destinations of one batch share a parent directory, so plain copies
//! run under a single administrative lock on that parent. Moves lock each
//! source's parent as well, reusing or retrieving the destination lock when
//! the two overlap. The batch is not atomic: a failure mid-way leaves the
//! already-completed pairs applied, which is acceptable because working-copy
//! state is locally recoverable.

use crate::areas::NodeKind;
use crate::areas::context::Client;
use crate::areas::disk;
use crate::areas::wc::LockDepth;
use crate::artifacts::copy::ancestors::get_copy_pair_ancestors;
use crate::artifacts::copy::pair::CopyPair;
use crate::artifacts::paths::{parent_dir, path_is_child};
use crate::error::{Error, ErrorKind, Result};

impl Client {
    pub(crate) fn wc_to_wc_copy(
        &self,
        pairs: &mut [CopyPair],
        is_move: bool,
        force: bool,
    ) -> Result<()> {
        // Check that all of our sources exist, and all the destinations
        // don't, before touching anything.
        for pair in pairs.iter_mut() {
            let src = pair.src.as_wc_path()?;
            pair.src_kind = disk::check_path(src)?;
            if pair.src_kind == NodeKind::None {
                return Err(Error::new(
                    ErrorKind::NodeUnknownKind,
                    format!("Path '{}' does not exist", src.display()),
                ));
            }

            let dst = pair.dst.as_wc_path()?;
            if disk::check_path(dst)? != NodeKind::None {
                return Err(Error::new(
                    ErrorKind::EntryExists,
                    format!("Path '{}' already exists", dst.display()),
                ));
            }

            let dst_parent = parent_dir(dst);
            let base_name = match dst.file_name() {
                Some(name) => name.to_string_lossy().into_owned(),
                None => {
                    return Err(Error::new(
                        ErrorKind::WcNotDirectory,
                        format!("Path '{}' has no usable name", dst.display()),
                    ));
                }
            };
            if disk::check_path(&dst_parent)? != NodeKind::Dir {
                return Err(Error::new(
                    ErrorKind::WcNotDirectory,
                    format!("Path '{}' is not a directory", dst_parent.display()),
                ));
            }
            pair.dst_parent = Some(dst_parent);
            pair.base_name = Some(base_name);
        }

        if is_move {
            self.do_wc_to_wc_moves(pairs, force)
        } else {
            self.do_wc_to_wc_copies(pairs)
        }
    }

    fn do_wc_to_wc_copies(&self, pairs: &[CopyPair]) -> Result<()> {
        let ancestors = get_copy_pair_ancestors(pairs)?;
        let mut dst_parent = ancestors.dst.as_wc_path()?.to_path_buf();
        if pairs.len() == 1 {
            dst_parent = parent_dir(&dst_parent);
        }

        // All destinations share this parent, so one lock covers the batch.
        let adm = self
            .wc()
            .adm_open(&dst_parent, true, LockDepth::This, self.callbacks())?;

        let mut first_err = None;
        for pair in pairs {
            if let Err(err) = self.callbacks().check_cancelled() {
                first_err = Some(err);
                break;
            }

            // Known limitation: the source is not locked, so a source left
            // in need of cleanup is only discovered by the copy itself.
            let result = self.wc().copy(
                pair.src.as_wc_path()?,
                adm.as_ref(),
                pair.base_name()?,
                self.callbacks(),
            );
            if let Err(err) = result {
                first_err = Some(err);
                break;
            }
        }

        disk::sleep_for_timestamps();

        let close_result = adm.close();
        match first_err {
            Some(err) => Err(err),
            None => close_result,
        }
    }

    fn do_wc_to_wc_moves(&self, pairs: &[CopyPair], force: bool) -> Result<()> {
        let mut first_err = None;
        for pair in pairs {
            if let Err(err) = self.callbacks().check_cancelled() {
                first_err = Some(err);
                break;
            }
            if let Err(err) = self.move_one_pair(pair, force) {
                first_err = Some(err);
                break;
            }
        }

        disk::sleep_for_timestamps();
        first_err.map_or(Ok(()), Err)
    }

    fn move_one_pair(&self, pair: &CopyPair, force: bool) -> Result<()> {
        let src = pair.src.as_wc_path()?;
        let src_parent = parent_dir(src);
        let depth = if pair.src_kind == NodeKind::Dir {
            LockDepth::Infinite
        } else {
            LockDepth::This
        };
        let src_access = self
            .wc()
            .adm_open(&src_parent, true, depth, self.callbacks())?;

        let dst_parent = pair.dst_parent_path()?;

        // Avoid opening the same directory twice when source and destination
        // overlap: reuse the source lock outright when the parents match,
        // and retrieve from it when the destination parent sits inside a
        // recursively locked source directory.
        let dst_access = if src_parent == dst_parent {
            None
        } else {
            let src_parent_abs = std::path::absolute(&src_parent)?;
            let dst_parent_abs = std::path::absolute(dst_parent)?;
            if pair.src_kind == NodeKind::Dir
                && path_is_child(&src_parent_abs, &dst_parent_abs).is_some()
            {
                Some(src_access.retrieve(dst_parent)?)
            } else {
                Some(
                    self.wc()
                        .adm_open(dst_parent, true, LockDepth::This, self.callbacks())?,
                )
            }
        };

        let result = (|| {
            let target = dst_access.as_deref().unwrap_or(src_access.as_ref());
            self.wc()
                .copy(src, target, pair.base_name()?, self.callbacks())?;
            self.wc()
                .delete(src, src_access.as_ref(), force, self.callbacks())
        })();

        let dst_close = match dst_access {
            Some(access) => access.close(),
            None => Ok(()),
        };
        let src_close = src_access.close();

        result?;
        dst_close?;
        src_close
    }
}
