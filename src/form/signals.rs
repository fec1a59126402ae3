//! Reset signal bus.
//!
//! Field widgets subscribe independently (the store has no list of mounted
//! widgets) and unsubscribe by dropping their receiver. Two tags exist:
//! - `Reset`: user asked to reset the form; each widget applies its own
//!   `formResetBehavior`.
//! - `ForceReset`: the configuration was replaced; every widget reinitializes
//!   from the new defaults regardless of behavior.

use tokio::sync::broadcast;
use tracing::trace;

/// Default number of signals a slow subscriber may fall behind by.
pub const SIGNAL_CAPACITY: usize = 16;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ResetSignal {
    Reset,
    ForceReset,
}

impl ResetSignal {
    /// Event name used by the browser host.
    pub const fn event_name(self) -> &'static str {
        match self {
            ResetSignal::Reset => "resetFields",
            ResetSignal::ForceReset => "forceResetFields",
        }
    }
}

/// Process-wide publish/subscribe channel for [`ResetSignal`]s.
#[derive(Debug, Clone)]
pub struct ResetBus {
    tx: broadcast::Sender<ResetSignal>,
}

impl ResetBus {
    pub fn new() -> Self {
        Self::with_capacity(SIGNAL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Register a new listener. Dropping the receiver unsubscribes it.
    pub fn subscribe(&self) -> broadcast::Receiver<ResetSignal> {
        self.tx.subscribe()
    }

    /// Broadcast a signal, returning how many listeners received it.
    /// Having no listeners is not an error.
    pub fn emit(&self, signal: ResetSignal) -> usize {
        match self.tx.send(signal) {
            Ok(n) => {
                trace!(target: "qrscout::signals", event = signal.event_name(), listeners = n, "Signal emitted");
                n
            }
            Err(_) => {
                trace!(target: "qrscout::signals", event = signal.event_name(), "Signal emitted with no listeners");
                0
            }
        }
    }

    pub fn listener_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for ResetBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emit_without_listeners_is_fine() {
        let bus = ResetBus::new();
        assert_eq!(bus.emit(ResetSignal::Reset), 0);
    }

    #[tokio::test]
    async fn every_subscriber_sees_signals_in_order() {
        let bus = ResetBus::new();
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();

        assert_eq!(bus.emit(ResetSignal::Reset), 2);
        assert_eq!(bus.emit(ResetSignal::ForceReset), 2);

        assert_eq!(a.recv().await.unwrap(), ResetSignal::Reset);
        assert_eq!(a.recv().await.unwrap(), ResetSignal::ForceReset);
        assert_eq!(b.recv().await.unwrap(), ResetSignal::Reset);
        assert_eq!(b.recv().await.unwrap(), ResetSignal::ForceReset);
    }

    #[test]
    fn dropping_receiver_unsubscribes() {
        let bus = ResetBus::new();
        let rx = bus.subscribe();
        assert_eq!(bus.listener_count(), 1);
        drop(rx);
        assert_eq!(bus.listener_count(), 0);
        assert_eq!(bus.emit(ResetSignal::ForceReset), 0);
    }

    #[test]
    fn event_names_match_host_events() {
        assert_eq!(ResetSignal::Reset.event_name(), "resetFields");
        assert_eq!(ResetSignal::ForceReset.event_name(), "forceResetFields");
    }
}
