use std::sync::Arc;

use tokio::sync::broadcast;

use crate::types::NotificationCommand;

/// Broadcast command stream used by presentation-layer subscribers.
pub type NotificationStream = broadcast::Receiver<NotificationCommand>;

/// Presentation channel that accepts notification commands.
///
/// Delivery is fire-and-forget: a sink must not block and has no way to report
/// failure back to the dispatcher.
pub trait NotificationSink: Send + Sync {
    fn deliver(&self, command: NotificationCommand);
}

impl<S: NotificationSink + ?Sized> NotificationSink for Arc<S> {
    fn deliver(&self, command: NotificationCommand) {
        (**self).deliver(command)
    }
}

/// Sink that fans commands out to every subscriber.
#[derive(Clone, Debug)]
pub struct NotificationChannel {
    command_tx: broadcast::Sender<NotificationCommand>,
}

impl NotificationChannel {
    /// Create a channel buffering up to `buffer` commands per subscriber.
    pub fn new(buffer: usize) -> Self {
        let (command_tx, _) = broadcast::channel(buffer.max(1));
        Self { command_tx }
    }

    /// Subscribe to emitted commands.
    pub fn subscribe(&self) -> NotificationStream {
        self.command_tx.subscribe()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.command_tx.receiver_count()
    }
}

impl Default for NotificationChannel {
    fn default() -> Self {
        Self::new(64)
    }
}

impl NotificationSink for NotificationChannel {
    /// Emission is best-effort; commands sent with no subscribers are dropped
    /// and lagged subscribers are handled by `broadcast`.
    fn deliver(&self, command: NotificationCommand) {
        let _ = self.command_tx.send(command);
    }
}
