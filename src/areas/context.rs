//! Client facade and callbacks
//!
//! A [`Client`] bundles the two collaborator layers (working copy and
//! remote access) with the user-supplied [`Callbacks`]. It is the receiver
//! for every public operation; the handlers in `artifacts::copy` are
//! implemented as `impl Client` blocks across their own files.

use crate::areas::NodeKind;
use crate::areas::ra::RaConnector;
use crate::areas::wc::WcContext;
use crate::artifacts::commit::CommitItem;
use crate::artifacts::paths::Target;
use crate::error::{Error, ErrorKind, Result};
use derive_new::new;

type CancelFn = dyn Fn() -> anyhow::Result<()>;
type NotifyFn = dyn Fn(&Notification);
type LogMsgFn = dyn Fn(&[CommitItem]) -> anyhow::Result<Option<String>>;

/// An event reported to the notification callback.
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct Notification {
    pub target: Target,
    pub action: NotifyAction,
    pub kind: NodeKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyAction {
    Add,
    Copy,
    Delete,
}

/// User-supplied hooks, all optional.
///
/// - `cancel` is polled at every pair boundary and inside long loops; a
///   failure aborts the operation promptly.
/// - `notify` receives progress events.
/// - `get_log_msg` supplies the commit log message for repository-side
///   operations; returning `None` aborts the operation silently with
///   success, matching the long-standing client convention.
#[derive(Default)]
pub struct Callbacks {
    cancel: Option<Box<CancelFn>>,
    notify: Option<Box<NotifyFn>>,
    get_log_msg: Option<Box<LogMsgFn>>,
}

impl Callbacks {
    pub fn new() -> Self {
        Callbacks::default()
    }

    pub fn with_cancel(mut self, f: impl Fn() -> anyhow::Result<()> + 'static) -> Self {
        self.cancel = Some(Box::new(f));
        self
    }

    pub fn with_notify(mut self, f: impl Fn(&Notification) + 'static) -> Self {
        self.notify = Some(Box::new(f));
        self
    }

    pub fn with_log_msg(
        mut self,
        f: impl Fn(&[CommitItem]) -> anyhow::Result<Option<String>> + 'static,
    ) -> Self {
        self.get_log_msg = Some(Box::new(f));
        self
    }

    pub fn check_cancelled(&self) -> Result<()> {
        match &self.cancel {
            Some(f) => f().map_err(|err| Error::external(ErrorKind::Cancelled, err)),
            None => Ok(()),
        }
    }

    pub fn notify(&self, event: &Notification) {
        if let Some(f) = &self.notify {
            f(event);
        }
    }

    /// Resolve the commit log message for `items`. `Ok(None)` means the user
    /// declined to supply one and the operation should be abandoned quietly.
    pub(crate) fn resolve_log_message(&self, items: &[CommitItem]) -> Result<Option<String>> {
        match &self.get_log_msg {
            Some(f) => f(items).map_err(|err| Error::external(ErrorKind::Base, err)),
            None => Ok(Some(String::new())),
        }
    }

    pub(crate) fn has_log_msg_callback(&self) -> bool {
        self.get_log_msg.is_some()
    }
}

/// The copy/move client: collaborator layers plus callbacks.
pub struct Client {
    wc: Box<dyn WcContext>,
    ra: Box<dyn RaConnector>,
    callbacks: Callbacks,
}

impl Client {
    pub fn new(wc: Box<dyn WcContext>, ra: Box<dyn RaConnector>, callbacks: Callbacks) -> Self {
        Client { wc, ra, callbacks }
    }

    pub(crate) fn wc(&self) -> &dyn WcContext {
        self.wc.as_ref()
    }

    pub(crate) fn ra(&self) -> &dyn RaConnector {
        self.ra.as_ref()
    }

    pub fn callbacks(&self) -> &Callbacks {
        &self.callbacks
    }
}
