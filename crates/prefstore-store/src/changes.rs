use tokio::sync::broadcast;
use tracing::trace;

/// Default buffer size of a store's change channel.
pub const DEFAULT_CAPACITY: usize = 256;

/// A broadcast receiver of changed keys.
///
/// Receivers that fall behind by more than the channel capacity get
/// `RecvError::Lagged` and skip the missed keys.
pub type ChangeStream = broadcast::Receiver<String>;

/// Hot multicast source of change events for one store.
///
/// Events are only delivered to receivers subscribed at the time of the
/// change; there is no replay.
#[derive(Debug)]
pub struct ChangeEmitter {
    sender: broadcast::Sender<String>,
}

impl ChangeEmitter {
    /// Create an emitter buffering up to `capacity` events per receiver.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish a change to `key`. Never blocks.
    pub fn emit(&self, key: &str) {
        // No subscribers is not an error.
        let delivered = self.sender.send(key.to_string()).unwrap_or(0);
        trace!(key, delivered, "change emitted");
    }

    /// Subscribe to changes published from now on.
    pub fn subscribe(&self) -> ChangeStream {
        self.sender.subscribe()
    }

    /// Number of live receivers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ChangeEmitter {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
