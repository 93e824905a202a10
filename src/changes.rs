//! Change notification hub.
//!
//! Two signals exist in the contract: the in-process event the store fires
//! after every successful write, and the storage medium's own cross-context
//! change signal. Both funnel through this one observer hub so a view only
//! ever subscribes in one place and re-reads the store on any `Change`.

use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOrigin {
    /// A write made through the store in this process.
    Local,
    /// The storage medium changed under us (another context wrote it).
    External,
}

#[derive(Debug, Clone)]
pub struct Change {
    pub key: String,
    pub origin: ChangeOrigin,
}

/// Cloneable fan-out handle. Subscribers that lag past the buffer miss old
/// changes, which is fine — a change is only a hint to re-read the store.
#[derive(Clone)]
pub struct ChangeHub {
    tx: broadcast::Sender<Change>,
}

impl ChangeHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(64);
        ChangeHub { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Change> {
        self.tx.subscribe()
    }

    /// Fire a change. No subscribers is not an error.
    pub fn emit(&self, key: &str, origin: ChangeOrigin) {
        let _ = self.tx.send(Change {
            key: key.to_string(),
            origin,
        });
    }

    /// Entry point for whatever watches the storage medium on behalf of
    /// other contexts: routes the platform-side signal into the same hub.
    pub fn notify_external(&self, key: &str) {
        self.emit(key, ChangeOrigin::External);
    }
}

impl Default for ChangeHub {
    fn default() -> Self {
        ChangeHub::new()
    }
}

// ── Tests ──────────────────────────────────────────────────────
