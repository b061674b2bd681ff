use prefstore_store::ChangeStream;
use prefstore_types::StoreValue;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::task::JoinHandle;
use tracing::warn;

use crate::entry::StoreEntry;

/// The value of an entry after a change.
#[derive(Clone, Debug, PartialEq)]
pub struct EntryChange<C> {
    pub key: String,
    /// `None` once the key was deleted.
    pub value: Option<C>,
}

/// Changes to one entry, pulled by the caller.
///
/// Changes to other keys of the same store are skipped. A receiver that falls
/// too far behind skips the missed events. The observation ends when the
/// store's change stream closes.
pub struct Observation<C: StoreValue> {
    entry: StoreEntry<C>,
    changes: ChangeStream,
    pending: Option<EntryChange<C>>,
}

impl<C: StoreValue> Observation<C> {
    /// `changes` must be subscribed before the current value is read, so no
    /// change can fall between the two.
    pub(crate) fn new(entry: StoreEntry<C>, changes: ChangeStream, emit_current: bool) -> Self {
        let mut observation = Self {
            entry,
            changes,
            pending: None,
        };
        if emit_current {
            observation.pending = Some(observation.current());
        }
        observation
    }

    pub fn key(&self) -> &str {
        self.entry.key()
    }

    /// Next buffered change, without waiting.
    pub fn try_next(&mut self) -> Option<EntryChange<C>> {
        if let Some(current) = self.take_current() {
            return Some(current);
        }
        loop {
            match self.changes.try_recv() {
                Ok(key) if key == self.entry.key() => return Some(self.current()),
                Ok(_) => continue,
                Err(TryRecvError::Lagged(missed)) => self.lagged(missed),
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }

    /// Wait for the next change on the current thread.
    ///
    /// # Panics
    ///
    /// Panics when called from within an asynchronous runtime; use
    /// [`Observation::next`] there.
    pub fn next_blocking(&mut self) -> Option<EntryChange<C>> {
        if let Some(current) = self.take_current() {
            return Some(current);
        }
        loop {
            match self.changes.blocking_recv() {
                Ok(key) if key == self.entry.key() => return Some(self.current()),
                Ok(_) => continue,
                Err(RecvError::Lagged(missed)) => self.lagged(missed),
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Wait for the next change.
    pub async fn next(&mut self) -> Option<EntryChange<C>> {
        if let Some(current) = self.take_current() {
            return Some(current);
        }
        loop {
            match self.changes.recv().await {
                Ok(key) if key == self.entry.key() => return Some(self.current()),
                Ok(_) => continue,
                Err(RecvError::Lagged(missed)) => self.lagged(missed),
                Err(RecvError::Closed) => return None,
            }
        }
    }

    fn take_current(&mut self) -> Option<EntryChange<C>> {
        self.pending.take()
    }

    fn current(&self) -> EntryChange<C> {
        let value = self.entry.get().unwrap_or_else(|e| {
            warn!(key = self.entry.key(), error = %e, "observed value could not be read");
            None
        });
        EntryChange {
            key: self.entry.key().to_string(),
            value,
        }
    }

    fn lagged(&self, missed: u64) {
        warn!(key = self.entry.key(), missed, "observer lagged, skipping missed changes");
    }
}

/// Runtime-delivered observation of an entry.
///
/// Dropping the subscription, or calling [`Subscription::dispose`], stops
/// delivery. The store and other subscribers are unaffected.
#[derive(Debug)]
pub struct Subscription {
    task: JoinHandle<()>,
}

impl Subscription {
    pub(crate) fn new(task: JoinHandle<()>) -> Self {
        Self { task }
    }

    pub fn dispose(self) {
        self.task.abort();
    }

    /// Whether the delivery task is still running.
    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}
