//! Lifecycle notification fan-out
//!
//! Orchestrators expose their progress to embedding applications as a small
//! tagged union of notifications. [`Notifier`] keeps the subscriber list and
//! delivers each emission to every live subscriber; recipients whose mailbox
//! has gone away are dropped from the list on the next emit.

use actix::prelude::*;
use tracing::trace;

/// Envelope delivering one notification to a subscriber.
#[derive(Debug, Clone)]
pub struct Emitted<N: Clone + Send>(pub N);

impl<N: Clone + Send + 'static> Message for Emitted<N> {
    type Result = ();
}

/// Subscriber registry for one notification type.
#[derive(Default)]
pub struct Notifier<N: Clone + Send + 'static> {
    subscribers: Vec<Recipient<Emitted<N>>>,
}

impl<N: Clone + Send + 'static> Notifier<N> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self { subscribers: Vec::new() }
    }

    /// Register a subscriber.
    pub fn subscribe(&mut self, recipient: Recipient<Emitted<N>>) {
        self.subscribers.push(recipient);
    }

    /// Number of live subscribers.
    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    /// Whether no subscriber is registered.
    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Deliver `notification` to every subscriber, pruning dead mailboxes.
    pub fn emit(&mut self, notification: N) {
        self.subscribers.retain(
            |subscriber| match subscriber.try_send(Emitted(notification.clone())) {
                Ok(()) => true,
                Err(actix::dev::SendError::Full(_)) => {
                    trace!("subscriber mailbox full, dropping notification");
                    true
                }
                Err(actix::dev::SendError::Closed(_)) => false,
            },
        );
    }
}

impl<N: Clone + Send + 'static> std::fmt::Debug for Notifier<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::recorder;

    #[actix::test]
    async fn emissions_reach_every_subscriber() {
        let (first, first_seen) = recorder::<u32>();
        let (second, second_seen) = recorder::<u32>();

        let mut notifier = Notifier::new();
        notifier.subscribe(first.recipient());
        notifier.subscribe(second.recipient());

        notifier.emit(1);
        notifier.emit(2);

        first_seen.wait_for(|seen| seen.len() == 2).await;
        second_seen.wait_for(|seen| seen.len() == 2).await;
        assert_eq!(first_seen.snapshot(), vec![1, 2]);
        assert_eq!(second_seen.snapshot(), vec![1, 2]);
    }
}
