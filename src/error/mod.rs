//! Structured errors with stable kind codes
//!
//! Every failure surfaced by this crate carries an [`ErrorKind`] that maps to
//! a stable integer code at the API boundary, a human-readable message that
//! names the offending path or URL, and an optional chain of causes. The
//! chain supports two operations mirroring how multi-phase operations report:
//!
//! - [`Error::wrap`] re-heads a chain with a new message of the same kind
//! - [`Error::compose`] appends an independent secondary chain to the end
//!
//! User-supplied callbacks report failures as [`anyhow::Error`]; those are
//! converted at the seam with [`Error::external`].

use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

/// Classifies an [`Error`]. Each kind has a stable integer code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum ErrorKind {
    /// Head of a composite error whose phases succeeded or failed separately.
    #[error("error")]
    Base,
    /// An underlying filesystem operation failed.
    #[error("I/O error")]
    Io,
    /// The cancellation callback requested an abort.
    #[error("operation cancelled")]
    Cancelled,
    /// A working-copy source path does not exist on disk.
    #[error("unknown node kind")]
    NodeUnknownKind,
    /// A working-copy destination already exists.
    #[error("entry already exists")]
    EntryExists,
    /// A repository destination already exists.
    #[error("path already exists in the repository")]
    FsAlreadyExists,
    /// The source is absent at the requested repository revision.
    #[error("path not found in the repository")]
    FsNotFound,
    /// A destination parent is not a directory.
    #[error("destination parent is not a directory")]
    WcNotDirectory,
    /// A working-copy entry obstructs the destination.
    #[error("obstructed update")]
    WcObstructedUpdate,
    /// The requested combination of endpoints or revisions is not supported.
    #[error("unsupported operation")]
    UnsupportedFeature,
    /// A revision selector is not valid for the given target.
    #[error("bad revision for target")]
    ClientBadRevision,
    /// The remote-access layer rejected the URL.
    #[error("illegal repository URL")]
    RaIllegalUrl,
    /// The repository does not expose a UUID.
    #[error("repository has no UUID")]
    RaNoReposUuid,
    /// Multiple sources were given without opting into child placement.
    #[error("multiple sources disallowed")]
    ClientMultipleSourcesDisallowed,
    /// A working-copy entry has no recorded repository URL.
    #[error("entry is missing a URL")]
    EntryMissingUrl,
    /// A path is not under version control.
    #[error("entry not found")]
    EntryNotFound,
    /// A mergeinfo string could not be parsed.
    #[error("invalid mergeinfo")]
    MergeinfoParse,
}

impl ErrorKind {
    /// Stable integer code for the API boundary.
    pub fn code(self) -> u32 {
        match self {
            ErrorKind::Base => 1000,
            ErrorKind::Io => 1001,
            ErrorKind::Cancelled => 1002,
            ErrorKind::NodeUnknownKind => 2001,
            ErrorKind::EntryExists => 2002,
            ErrorKind::FsAlreadyExists => 2003,
            ErrorKind::FsNotFound => 2004,
            ErrorKind::WcNotDirectory => 2005,
            ErrorKind::WcObstructedUpdate => 2006,
            ErrorKind::UnsupportedFeature => 2007,
            ErrorKind::ClientBadRevision => 2008,
            ErrorKind::RaIllegalUrl => 2009,
            ErrorKind::RaNoReposUuid => 2010,
            ErrorKind::ClientMultipleSourcesDisallowed => 2011,
            ErrorKind::EntryMissingUrl => 2012,
            ErrorKind::EntryNotFound => 2013,
            ErrorKind::MergeinfoParse => 2014,
        }
    }
}

/// An error chain: a kind, a message, and an optional boxed cause.
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: String,
    cause: Option<Box<Error>>,
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Error {
            kind,
            message: message.into(),
            cause: None,
        }
    }

    /// Convert a callback failure into an [`Error`] of the given kind.
    pub fn external(kind: ErrorKind, err: anyhow::Error) -> Self {
        Error::new(kind, format!("{err:#}"))
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn code(&self) -> u32 {
        self.kind.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn cause(&self) -> Option<&Error> {
        self.cause.as_deref()
    }

    /// Re-head this chain with a new message of the same kind.
    pub fn wrap(self, message: impl Into<String>) -> Self {
        Error {
            kind: self.kind,
            message: message.into(),
            cause: Some(Box::new(self)),
        }
    }

    /// Append `other` to the end of this chain.
    pub fn compose(&mut self, other: Error) {
        match self.cause.take() {
            Some(mut cause) => {
                cause.compose(other);
                self.cause = Some(cause);
            }
            None => self.cause = Some(Box::new(other)),
        }
    }

    /// All messages in the chain, head first.
    pub fn chain(&self) -> impl Iterator<Item = &Error> {
        std::iter::successors(Some(self), |e| e.cause())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if f.alternate() {
            for cause in self.chain().skip(1) {
                write!(f, ": {}", cause.message)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn std::error::Error + 'static))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::new(ErrorKind::Io, err.to_string())
    }
}
