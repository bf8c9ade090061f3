//! Copy and move with history
//!
//! The entry points in `commands` funnel into [`Client::setup_copy`], which
//! normalizes the user's sources into validated pairs and dispatches on the
//! locality of the two endpoints:
//!
//! | sources | destination | handler |
//! |---------|-------------|------------------|
//! | WC      | WC          | `wc_to_wc`       |
//! | WC      | repository  | `wc_to_repos`    |
//! | repo    | WC          | `repos_to_wc`    |
//! | repo    | repository  | `repos_to_repos` |
//!
//! Repository-side handlers batch every pair into one commit transaction and
//! return its [`CommitInfo`]; working-copy destinations produce none.

pub mod ancestors;
pub mod pair;
pub(crate) mod repos_to_repos;
pub(crate) mod repos_to_wc;
pub(crate) mod wc_to_repos;
pub(crate) mod wc_to_wc;

use crate::areas::context::Client;
use crate::artifacts::commit::CommitInfo;
use crate::artifacts::copy::pair::CopySource;
use crate::error::Result;

impl Client {
    /// Normalize `sources` against `dst_path` and run the handler the
    /// locality matrix selects. The handler choice is a pure function of
    /// (first source is URL, destination is URL).
    pub(crate) fn setup_copy(
        &self,
        sources: &[CopySource],
        dst_path: &str,
        is_move: bool,
        force: bool,
    ) -> Result<Option<CommitInfo>> {
        let mut pairs = self.normalize_copy_pairs(sources, dst_path, is_move)?;
        let srcs_are_urls = pairs[0].src.is_repo();
        let dst_is_url = pairs[0].dst.is_repo();
        tracing::debug!(
            pairs = pairs.len(),
            srcs_are_urls,
            dst_is_url,
            is_move,
            "dispatching copy"
        );

        match (srcs_are_urls, dst_is_url) {
            (false, false) => {
                self.wc_to_wc_copy(&mut pairs, is_move, force)?;
                Ok(None)
            }
            (false, true) => self.wc_to_repos_copy(&mut pairs),
            (true, false) => {
                self.repos_to_wc_copy(&mut pairs)?;
                Ok(None)
            }
            (true, true) => self.repos_to_repos_copy(&mut pairs, is_move),
        }
    }
}
