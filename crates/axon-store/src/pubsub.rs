//! Transaction-accepted pub-sub hub.
//!
//! `NewTransaction` handling registers interest in an address before
//! submitting to mining, then awaits the acceptance event. Subscriptions
//! are scoped: dropping one (including on task cancellation) removes it
//! from the hub on every exit path.

use axon_crypto::TaggedHash;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::debug;

#[derive(Default)]
struct Hub {
    subscribers: Mutex<HashMap<Vec<u8>, Vec<(u64, oneshot::Sender<()>)>>>,
    next_id: AtomicU64,
}

/// Shared pub-sub handle.
#[derive(Clone, Default)]
pub struct PubSub {
    hub: Arc<Hub>,
}

impl PubSub {
    /// Create an empty hub.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register interest in the acceptance of `address`.
    pub fn subscribe_transaction_accepted(&self, address: &TaggedHash) -> AcceptanceSubscription {
        let (tx, rx) = oneshot::channel();
        let id = self.hub.next_id.fetch_add(1, Ordering::Relaxed);
        self.hub
            .subscribers
            .lock()
            .entry(address.to_vec())
            .or_default()
            .push((id, tx));
        AcceptanceSubscription {
            hub: self.hub.clone(),
            address: address.to_vec(),
            id,
            rx,
        }
    }

    /// Signal that the transaction at `address` was accepted.
    pub fn notify_transaction_accepted(&self, address: &TaggedHash) {
        let senders = self.hub.subscribers.lock().remove(&address.to_vec());
        if let Some(senders) = senders {
            debug!(address = %address, count = senders.len(), "Notifying acceptance");
            for (_, sender) in senders {
                let _ = sender.send(());
            }
        }
    }
}

/// A scoped subscription; deregisters itself on drop.
pub struct AcceptanceSubscription {
    hub: Arc<Hub>,
    address: Vec<u8>,
    id: u64,
    rx: oneshot::Receiver<()>,
}

impl AcceptanceSubscription {
    /// Wait for the acceptance event. Returns `false` if the hub dropped
    /// the sender without firing (should not happen in practice).
    pub async fn wait(&mut self) -> bool {
        (&mut self.rx).await.is_ok()
    }
}

impl Drop for AcceptanceSubscription {
    fn drop(&mut self) {
        let mut subscribers = self.hub.subscribers.lock();
        if let Some(entries) = subscribers.get_mut(&self.address) {
            entries.retain(|(id, _)| *id != self.id);
            if entries.is_empty() {
                subscribers.remove(&self.address);
            }
        }
    }
}
