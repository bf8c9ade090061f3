//! Client-side copy/move core of a Subversion-style version-control client.
//!
//! This crate implements the logic that takes a set of (source, destination)
//! pairs, where each endpoint is either a working-copy path or a repository
//! URL, and executes a copy or move that preserves version history. The four
//! locality combinations are handled by dedicated handlers; repository-side
//! operations batch all pairs into a single commit transaction and attach
//! merged mergeinfo to every copied node.
//!
//! The working-copy administrative layer, the remote-access layer, and the
//! commit (delta) editor are consumed through the traits in [`areas`]; this
//! crate ships no network or working-copy implementation of its own.

pub mod areas;
pub mod artifacts;
pub mod commands;
pub mod error;

pub use areas::context::{Callbacks, Client, Notification, NotifyAction};
pub use artifacts::commit::CommitInfo;
pub use artifacts::copy::pair::CopySource;
pub use artifacts::paths::{Target, Url};
pub use artifacts::revision::{Revision, Revnum};
pub use error::{Error, ErrorKind, Result};
