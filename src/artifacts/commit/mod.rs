//! Commit items and revision properties
//!
//! A commit item describes one node a pending commit will touch. The list of
//! items is what the log-message callback sees before any transaction is
//! opened, and what the working-copy commit drive consumes afterwards.

pub mod path_driver;

use crate::areas::NodeKind;
use crate::artifacts::paths::Url;
use crate::artifacts::revision::Revnum;
use bitflags::bitflags;
use derive_new::new;
use std::collections::BTreeMap;

/// Revision property carrying the commit log message.
pub const PROP_REVISION_LOG: &str = "svn:log";

bitflags! {
    /// What a commit will do to the node a [`CommitItem`] describes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CommitItemFlags: u8 {
        const ADD       = 0b00001;
        const DELETE    = 0b00010;
        const TEXT_MODS = 0b00100;
        const PROP_MODS = 0b01000;
        const IS_COPY   = 0b10000;
    }
}

/// One node of a pending commit.
#[derive(Debug, Clone, new)]
pub struct CommitItem {
    pub url: Url,
    pub kind: NodeKind,
    pub state_flags: CommitItemFlags,
    /// Copy history, when the node is committed as a copy.
    #[new(default)]
    pub copyfrom: Option<(Url, Revnum)>,
    /// Property changes to send alongside the node, e.g. mergeinfo.
    #[new(default)]
    pub outgoing_prop_changes: Vec<(String, String)>,
}

/// The result of a committed transaction.
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct CommitInfo {
    pub revision: Revnum,
    pub date: Option<String>,
    pub author: Option<String>,
}

/// Revision-property table for a commit with the given log message.
pub fn revprop_table(message: &str) -> BTreeMap<String, String> {
    BTreeMap::from([(PROP_REVISION_LOG.to_string(), message.to_string())])
}
