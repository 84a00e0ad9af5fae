//! # Write Journal
//!
//! Buffers every write, event and directory registration of the running
//! operation on top of the backing store.
//!
//! Reads consult the overlay first. A [`Checkpoint`] marks a position in the
//! undo log; reverting to it restores the overlay, truncates pending events
//! and drops directory registrations recorded after it. Nested operations
//! stack checkpoints, so a failed inner operation only unwinds itself.

use crate::domain::value_objects::{Address, Hash};
use crate::events::AmpEvent;
use crate::ports::outbound::WriteBatch;
use std::collections::BTreeMap;

/// A directory registration waiting for commit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DirectoryWrite {
    /// Account the implementer is registered for.
    pub account: Address,
    /// Interface hash.
    pub interface: Hash,
    /// Implementer (null clears the entry).
    pub implementer: Address,
}

/// Position in the journal to revert to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Checkpoint {
    undo_len: usize,
    events_len: usize,
    directory_len: usize,
}

/// Previous overlay state of a key, recorded on each write.
#[derive(Debug)]
struct UndoEntry {
    key: Vec<u8>,
    /// `None` if the key was not in the overlay before the write.
    previous: Option<Option<Vec<u8>>>,
}

/// Everything a committed operation hands to the outside world.
#[derive(Debug, Default)]
pub struct CommitSet {
    /// Store writes, ordered by key.
    pub batch: WriteBatch,
    /// Directory registrations in recording order.
    pub directory_writes: Vec<DirectoryWrite>,
    /// Events in emission order.
    pub events: Vec<AmpEvent>,
}

/// Overlay of uncommitted changes.
#[derive(Debug, Default)]
pub struct Journal {
    overlay: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
    undo: Vec<UndoEntry>,
    events: Vec<AmpEvent>,
    directory_writes: Vec<DirectoryWrite>,
}

impl Journal {
    /// Creates an empty journal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pending value of `key`.
    ///
    /// * `None` - key untouched, read the store
    /// * `Some(None)` - key deleted by this operation
    /// * `Some(Some(bytes))` - key written by this operation
    #[must_use]
    pub fn get(&self, key: &[u8]) -> Option<Option<&[u8]>> {
        self.overlay.get(key).map(Option::as_deref)
    }

    /// Buffer a write (`None` deletes).
    pub fn put(&mut self, key: Vec<u8>, value: Option<Vec<u8>>) {
        let previous = self.overlay.insert(key.clone(), value);
        self.undo.push(UndoEntry { key, previous });
    }

    /// Buffer an event.
    pub fn emit(&mut self, event: AmpEvent) {
        self.events.push(event);
    }

    /// Buffer a directory registration.
    pub fn register_interface(&mut self, account: Address, interface: Hash, implementer: Address) {
        self.directory_writes.push(DirectoryWrite {
            account,
            interface,
            implementer,
        });
    }

    /// Latest pending registration for `(account, interface)`.
    #[must_use]
    pub fn pending_implementer(&self, account: Address, interface: Hash) -> Option<Address> {
        self.directory_writes
            .iter()
            .rev()
            .find(|write| write.account == account && write.interface == interface)
            .map(|write| write.implementer)
    }

    /// Mark the current position.
    #[must_use]
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            undo_len: self.undo.len(),
            events_len: self.events.len(),
            directory_len: self.directory_writes.len(),
        }
    }

    /// Undo everything recorded after `checkpoint`.
    pub fn revert_to(&mut self, checkpoint: Checkpoint) {
        while self.undo.len() > checkpoint.undo_len {
            let Some(entry) = self.undo.pop() else { break };
            match entry.previous {
                Some(previous) => {
                    self.overlay.insert(entry.key, previous);
                }
                None => {
                    self.overlay.remove(&entry.key);
                }
            }
        }
        self.events.truncate(checkpoint.events_len);
        self.directory_writes.truncate(checkpoint.directory_len);
    }

    /// Drain the journal into a commit set, leaving it empty.
    pub fn take(&mut self) -> CommitSet {
        self.undo.clear();
        let overlay = std::mem::take(&mut self.overlay);
        CommitSet {
            batch: overlay.into_iter().collect(),
            directory_writes: std::mem::take(&mut self.directory_writes),
            events: std::mem::take(&mut self.events),
        }
    }

    /// Returns true if nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.overlay.is_empty() && self.events.is_empty() && self.directory_writes.is_empty()
    }

    /// Number of distinct keys touched.
    #[must_use]
    pub fn touched_keys(&self) -> usize {
        self.overlay.len()
    }
}

// =============================================================================
// TESTS
// =============================================================================
