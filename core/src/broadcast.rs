//! Change notifications for observers of the persisted collections.
//!
//! After every successful collection write the engine announces
//! `{key, new blob}`. Observers are expected to reload the merged view
//! rather than patch their state from the payload.
//!
//! Delivery is best-effort and at-most-once per notification. There is no
//! ordering guarantee across different collection keys.

use std::fmt;
use std::sync::mpsc::{self, Receiver, Sender};

use crate::store::CollectionKey;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub key: CollectionKey,
    /// The full serialized blob now stored under `key`.
    pub value: String,
}

/// Outcome of handing one event to one subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    /// The subscriber can no longer receive; it is dropped.
    Disconnected,
}

pub trait ChangeSubscriber: Send {
    fn deliver(&mut self, event: &ChangeEvent) -> Delivery;
}

impl<F> ChangeSubscriber for F
where
    F: FnMut(&ChangeEvent) + Send,
{
    fn deliver(&mut self, event: &ChangeEvent) -> Delivery {
        self(event);
        Delivery::Delivered
    }
}

struct ChannelSubscriber(Sender<ChangeEvent>);

impl ChangeSubscriber for ChannelSubscriber {
    fn deliver(&mut self, event: &ChangeEvent) -> Delivery {
        match self.0.send(event.clone()) {
            Ok(()) => Delivery::Delivered,
            Err(_) => Delivery::Disconnected,
        }
    }
}

#[derive(Default)]
pub struct Broadcaster {
    subscribers: Vec<Box<dyn ChangeSubscriber>>,
}

impl fmt::Debug for Broadcaster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Broadcaster")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl Broadcaster {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, subscriber: impl ChangeSubscriber + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    /// Subscribe through a channel; drop the receiver to unsubscribe.
    pub fn channel(&mut self) -> Receiver<ChangeEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribe(ChannelSubscriber(tx));
        rx
    }

    /// Announce a successful write of `key`.
    pub fn notify(&mut self, key: CollectionKey, value: &str) {
        if self.subscribers.is_empty() {
            return;
        }

        let event = ChangeEvent {
            key,
            value: value.to_string(),
        };
        let before = self.subscribers.len();
        self.subscribers
            .retain_mut(|subscriber| subscriber.deliver(&event) == Delivery::Delivered);

        let dropped = before - self.subscribers.len();
        if dropped > 0 {
            tracing::debug!(collection = %key, dropped, "Dropped disconnected change subscribers");
        }
        tracing::debug!(
            collection = %key,
            subscribers = self.subscribers.len(),
            bytes = value.len(),
            "Change broadcast"
        );
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
