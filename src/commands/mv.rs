//! Move entry points

use crate::areas::context::Client;
use crate::artifacts::commit::CommitInfo;
use crate::artifacts::copy::pair::CopySource;
use crate::artifacts::paths;
use crate::artifacts::revision::Revision;
use crate::error::{Error, ErrorKind, Result};

impl Client {
    /// Move each source to `dst_path`. Both endpoints must be on the same
    /// side of the working-copy/repository boundary. `force` bypasses the
    /// local-modification check in the working-copy delete. Returns commit
    /// info iff a repository-side commit occurred.
    ///
    /// With `move_as_child`, a single-source call whose destination already
    /// exists is retried once with the destination treated as a directory
    /// to move into. Multiple sources require `move_as_child`.
    pub fn mv(
        &self,
        src_paths: &[&str],
        dst_path: &str,
        force: bool,
        move_as_child: bool,
    ) -> Result<Option<CommitInfo>> {
        if src_paths.len() > 1 && !move_as_child {
            return Err(Error::new(
                ErrorKind::ClientMultipleSourcesDisallowed,
                "Destination of a move with multiple sources must be a directory",
            ));
        }

        let sources: Vec<CopySource> = src_paths
            .iter()
            .map(|path| CopySource::new(*path, Revision::Head, Revision::Head))
            .collect();

        let result = self.setup_copy(&sources, dst_path, true, force);
        match result {
            Err(err)
                if move_as_child
                    && src_paths.len() == 1
                    && matches!(
                        err.kind(),
                        ErrorKind::EntryExists | ErrorKind::FsAlreadyExists
                    ) =>
            {
                let child_dst = paths::join(dst_path, paths::basename(src_paths[0]));
                self.setup_copy(&sources, &child_dst, true, force)
            }
            other => other,
        }
    }

    /// Single-source adapter: move `src_path` to `dst_path`, retrying once
    /// against `dst_path/basename(src_path)` when the destination already
    /// exists. Moves act on the youngest revision, so any operative
    /// revision other than `HEAD` is rejected rather than silently pinned.
    pub fn mv_single(
        &self,
        src_path: &str,
        revision: Revision,
        dst_path: &str,
        force: bool,
    ) -> Result<Option<CommitInfo>> {
        if !matches!(revision, Revision::Unspecified | Revision::Head) {
            return Err(Error::new(
                ErrorKind::UnsupportedFeature,
                "Cannot specify revisions (except HEAD) with move operations",
            ));
        }

        match self.mv(&[src_path], dst_path, force, false) {
            Err(err)
                if matches!(
                    err.kind(),
                    ErrorKind::EntryExists | ErrorKind::FsAlreadyExists
                ) =>
            {
                let child_dst = paths::join(dst_path, paths::basename(src_path));
                self.mv(&[src_path], &child_dst, force, false)
            }
            other => other,
        }
    }
}
