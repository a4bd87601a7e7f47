//! The single "data changed" notification emitted after every successful
//! mutating command's commit (§4.G, §6).

use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 64;

/// Broadcasts a payload-less "data changed" event to every subscriber.
///
/// A lagging subscriber that misses events should treat any received
/// notification, or a lag error, as "refresh"; the event itself carries no
/// information beyond "something changed".
#[derive(Debug, Clone)]
pub struct ChangeNotifier {
    sender: broadcast::Sender<()>,
}

impl ChangeNotifier {
    /// Creates a notifier with no subscribers yet.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _receiver) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Subscribes to future "data changed" notifications.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.sender.subscribe()
    }

    /// Emits a "data changed" notification. A result with no subscribers is
    /// not an error; collaborators are free to not be listening.
    pub fn notify_changed(&self) {
        let _ = self.sender.send(());
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscriber_receives_a_notification() {
        let notifier = ChangeNotifier::new();
        let mut receiver = notifier.subscribe();
        notifier.notify_changed();
        receiver.recv().await.expect("notification delivered");
    }

    #[test]
    fn notifying_with_no_subscribers_does_not_panic() {
        let notifier = ChangeNotifier::new();
        notifier.notify_changed();
    }
}
