//! Directory-tree grants: the picker session and permission persistence.
//!
//! - **Pick session**: at most one picker request is in flight. A second
//!   request is refused with `Busy` and leaves the first untouched.
//! - **Completion**: the platform reports back with the ticket it was given.
//!   Only the outstanding ticket is honoured, exactly once.
//! - **Persistence**: a picked tree gets read+write access persisted
//!   best-effort; an explicit persist reports failures.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{BridgeError, Result};
use crate::fs_abstraction::DocumentTree;
use crate::types::TreeRef;

/// Token identifying one picker request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PickTicket(u64);

impl PickTicket {
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Payload delivered to the shell when a pick finishes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickCompletion {
    pub ticket: PickTicket,
    /// `None` when the user cancelled.
    pub tree_uri: Option<String>,
}

#[derive(Debug, Default)]
enum PickState {
    #[default]
    Idle,
    Pending(PickTicket),
}

#[derive(Debug, Default)]
pub struct PickSession {
    state: PickState,
    issued: u64,
}

impl PickSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new picker request.
    pub fn begin(&mut self) -> Result<PickTicket> {
        if let PickState::Pending(ticket) = self.state {
            warn!(ticket = ticket.get(), "pick requested while another is pending");
            return Err(BridgeError::Busy);
        }
        self.issued += 1;
        let ticket = PickTicket(self.issued);
        self.state = PickState::Pending(ticket);
        info!(ticket = ticket.get(), "directory pick started");
        Ok(ticket)
    }

    /// Consume the pending request if `ticket` matches it.
    fn finish(&mut self, ticket: PickTicket) -> bool {
        match self.state {
            PickState::Pending(pending) if pending == ticket => {
                self.state = PickState::Idle;
                true
            }
            _ => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, PickState::Pending(_))
    }

    pub fn pending(&self) -> Option<PickTicket> {
        match self.state {
            PickState::Pending(ticket) => Some(ticket),
            PickState::Idle => None,
        }
    }
}

/// Handle the platform's answer to a picker request.
///
/// Returns `None` if `ticket` is not the outstanding request. On success the
/// grant is persisted best-effort and the tree is reported either way.
pub fn complete_pick<T: DocumentTree>(
    session: &mut PickSession,
    tree: &T,
    ticket: PickTicket,
    picked: Option<String>,
) -> Option<PickCompletion> {
    if !session.finish(ticket) {
        warn!(ticket = ticket.get(), "ignoring completion for unknown pick");
        return None;
    }

    let tree_uri = picked.filter(|uri| !uri.trim().is_empty());
    match &tree_uri {
        Some(uri) => {
            info!(ticket = ticket.get(), "directory picked");
            if let Ok(tree_ref) = TreeRef::parse(uri) {
                if let Err(e) = tree.persist_permission(&tree_ref) {
                    warn!(error = %e, "failed to persist permission for picked tree");
                }
            }
        }
        None => info!(ticket = ticket.get(), "directory pick cancelled"),
    }

    Some(PickCompletion { ticket, tree_uri })
}

/// Explicitly persist access to a tree the shell already holds.
pub fn persist<T: DocumentTree>(tree: &T, tree_uri: Option<&str>) -> Result<()> {
    let tree_ref = TreeRef::parse(tree_uri.unwrap_or_default())?;
    tree.persist_permission(&tree_ref).map_err(|e| match e {
        BridgeError::PersistFailed(_) => e,
        other => BridgeError::PersistFailed(other.to_string()),
    })
}
