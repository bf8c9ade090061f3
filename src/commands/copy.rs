//! Copy entry points

use crate::areas::context::Client;
use crate::artifacts::commit::CommitInfo;
use crate::artifacts::copy::pair::CopySource;
use crate::artifacts::paths;
use crate::artifacts::revision::Revision;
use crate::error::{Error, ErrorKind, Result};

impl Client {
    /// Copy each source to `dst_path`, preserving history. Returns commit
    /// info iff a repository-side commit occurred.
    ///
    /// With `copy_as_child`, a single-source call whose destination already
    /// exists is retried once with the destination treated as a directory
    /// to copy into. Multiple sources require `copy_as_child`.
    pub fn copy(
        &self,
        sources: &[CopySource],
        dst_path: &str,
        copy_as_child: bool,
    ) -> Result<Option<CommitInfo>> {
        if sources.len() > 1 && !copy_as_child {
            return Err(Error::new(
                ErrorKind::ClientMultipleSourcesDisallowed,
                "Destination of a copy with multiple sources must be a directory",
            ));
        }

        let result = self.setup_copy(sources, dst_path, false, true);
        match result {
            Err(err)
                if copy_as_child
                    && sources.len() == 1
                    && matches!(
                        err.kind(),
                        ErrorKind::EntryExists | ErrorKind::FsAlreadyExists
                    ) =>
            {
                let child_dst = paths::join(dst_path, paths::basename(&sources[0].path));
                self.setup_copy(sources, &child_dst, false, true)
            }
            other => other,
        }
    }

    /// Single-source adapter: copy `src_path`@`revision` to `dst_path`,
    /// retrying once against `dst_path/basename(src_path)` when the
    /// destination already exists.
    pub fn copy_single(
        &self,
        src_path: &str,
        revision: Revision,
        dst_path: &str,
    ) -> Result<Option<CommitInfo>> {
        let sources = [CopySource::new(src_path, revision, revision)];
        match self.copy(&sources, dst_path, false) {
            Err(err)
                if matches!(
                    err.kind(),
                    ErrorKind::EntryExists | ErrorKind::FsAlreadyExists
                ) =>
            {
                let child_dst = paths::join(dst_path, paths::basename(src_path));
                self.copy(&sources, &child_dst, false)
            }
            other => other,
        }
    }
}
