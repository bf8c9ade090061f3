//! Copy sources and normalized copy pairs
//!
//! Normalization turns the user's `(sources, dst)` into one validated
//! [`CopyPair`] per source: destinations are joined under a directory
//! destination when several sources are given, unspecified revisions are
//! defaulted, locality is checked for homogeneity, and the handful of
//! combinations that can be rejected without touching a repository are
//! rejected here.

use crate::areas::NodeKind;
use crate::areas::context::Client;
use crate::areas::wc::LockDepth;
use crate::artifacts::paths::{self, Target};
use crate::artifacts::revision::{Revision, Revnum, resolve_revisions};
use crate::error::{Error, ErrorKind, Result};
use std::path::PathBuf;

/// One user-supplied copy source: a path or URL, the operative revision, and
/// the peg revision in which the path is interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopySource {
    pub path: String,
    pub revision: Revision,
    pub peg_revision: Revision,
}

impl CopySource {
    pub fn new(path: impl Into<String>, revision: Revision, peg_revision: Revision) -> Self {
        CopySource {
            path: path.into(),
            revision,
            peg_revision,
        }
    }
}

/// The internal working record for one source/destination pair. Handlers
/// fill in the lazily-computed fields (kind, resolved revision, relative
/// paths) during their pre-flight checks.
#[derive(Debug, Clone)]
pub(crate) struct CopyPair {
    /// Source endpoint; rewritten to the canonical URL when a working-copy
    /// source must be treated as a repository source.
    pub src: Target,
    /// The source as the user supplied it, before peg relocation. Checkout
    /// reporting for repository-to-WC copies uses this.
    pub src_original: Target,
    /// Absolute form of a local source.
    pub src_abs: Option<PathBuf>,
    pub src_kind: NodeKind,
    pub src_peg_revision: Revision,
    pub src_op_revision: Revision,
    /// Resolved operative revision, once known.
    pub src_revnum: Option<Revnum>,
    /// Source relative to the session anchor, URI-decoded.
    pub src_rel: Option<String>,
    pub dst: Target,
    pub dst_parent: Option<PathBuf>,
    pub base_name: Option<String>,
    /// Destination relative to the session anchor, URI-decoded.
    pub dst_rel: Option<String>,
}

impl CopyPair {
    /// The destination's final component, once pre-flight has split it.
    pub(crate) fn base_name(&self) -> Result<&str> {
        self.base_name
            .as_deref()
            .ok_or_else(|| Error::new(ErrorKind::Base, "copy pair base name not yet computed"))
    }

    /// The destination's parent directory, once pre-flight has split it.
    pub(crate) fn dst_parent_path(&self) -> Result<&std::path::Path> {
        self.dst_parent
            .as_deref()
            .ok_or_else(|| Error::new(ErrorKind::Base, "copy pair destination parent not yet computed"))
    }

    /// The resolved operative revision, once a handler has computed it.
    pub(crate) fn resolved_revnum(&self) -> Result<Revnum> {
        self.src_revnum
            .ok_or_else(|| Error::new(ErrorKind::Base, "copy pair revision not yet resolved"))
    }

    /// The session-relative source path, once a handler has computed it.
    pub(crate) fn src_rel(&self) -> Result<&str> {
        self.src_rel
            .as_deref()
            .ok_or_else(|| Error::new(ErrorKind::Base, "copy pair source path not yet relativized"))
    }

    fn new(src: Target, peg: Revision, op: Revision, dst: Target) -> Self {
        CopyPair {
            src_original: src.clone(),
            src,
            src_abs: None,
            src_kind: NodeKind::Unknown,
            src_peg_revision: peg,
            src_op_revision: op,
            src_revnum: None,
            src_rel: None,
            dst,
            dst_parent: None,
            base_name: None,
            dst_rel: None,
        }
    }
}

impl Client {
    /// Turn user input into validated copy pairs; see the module docs for
    /// what normalization covers.
    pub(crate) fn normalize_copy_pairs(
        &self,
        sources: &[CopySource],
        dst_path: &str,
        is_move: bool,
    ) -> Result<Vec<CopyPair>> {
        let first = sources.first().ok_or_else(|| {
            Error::new(ErrorKind::UnsupportedFeature, "No copy source was given")
        })?;
        let srcs_are_urls = paths::is_url(&first.path);
        let dst_is_url = paths::is_url(dst_path);

        // Peg revisions that only make sense against a working copy cannot
        // be applied to a URL source.
        for source in sources {
            if paths::is_url(&source.path) && source.peg_revision.is_wc_only() {
                return Err(Error::new(
                    ErrorKind::ClientBadRevision,
                    "Revision type requires a working copy path, not a URL",
                ));
            }
        }

        // With several sources the destination is a directory each source is
        // copied into under its own basename.
        let mut pairs = Vec::with_capacity(sources.len());
        for source in sources {
            if paths::is_url(&source.path) != srcs_are_urls {
                return Err(Error::new(
                    ErrorKind::UnsupportedFeature,
                    "Cannot mix repository and working copy sources",
                ));
            }
            let (peg, op) = resolve_revisions(
                source.peg_revision,
                source.revision,
                paths::is_url(&source.path),
            );
            let dst = if sources.len() > 1 {
                paths::join(dst_path, paths::basename(&source.path))
            } else {
                dst_path.to_string()
            };
            pairs.push(CopyPair::new(
                Target::from_user_input(&source.path)?,
                peg,
                op,
                Target::from_user_input(&dst)?,
            ));
        }

        if !srcs_are_urls && !dst_is_url {
            for pair in &pairs {
                let src = pair.src.as_wc_path()?;
                let dst = pair.dst.as_wc_path()?;
                if paths::path_is_child(src, dst).is_some() {
                    return Err(Error::new(
                        ErrorKind::UnsupportedFeature,
                        format!(
                            "Cannot copy path '{}' into its own child '{}'",
                            src.display(),
                            dst.display()
                        ),
                    ));
                }
            }
        }

        if is_move {
            if srcs_are_urls != dst_is_url {
                return Err(Error::new(
                    ErrorKind::UnsupportedFeature,
                    "Moves between the working copy and the repository are not supported",
                ));
            }
            for pair in &pairs {
                if pair.src == pair.dst {
                    return Err(Error::new(
                        ErrorKind::UnsupportedFeature,
                        format!("Cannot move path '{}' into itself", pair.src),
                    ));
                }
            }
        } else if !srcs_are_urls {
            self.promote_wc_sources(&mut pairs)?;
        }

        Ok(pairs)
    }

    /// A working-copy copy whose operative revision is anything other than
    /// `unspecified`/`working` really wants repository content: replace each
    /// source with the URL its entry records, pegged at the entry's
    /// revision, turning the operation into a repository-to-* copy.
    fn promote_wc_sources(&self, pairs: &mut [CopyPair]) -> Result<()> {
        let need_repo_rev = pairs.iter().any(|pair| {
            !matches!(
                pair.src_op_revision,
                Revision::Unspecified | Revision::Working
            )
        });
        if !need_repo_rev {
            return Ok(());
        }

        for pair in pairs {
            let src_path = pair.src.as_wc_path()?.to_path_buf();
            let adm = self.wc().adm_probe_open(
                &src_path,
                false,
                LockDepth::This,
                self.callbacks(),
            )?;
            let entry = self.wc().entry(&src_path, adm.as_ref());
            adm.close()?;
            let entry = entry?.ok_or_else(|| {
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
            pair.src = Target::Repo(url);
            pair.src_peg_revision = Revision::Number(entry.revision);
        }
        Ok(())
    }
}
