use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tracing::debug;

use crate::message::Message;

/// The consumer-facing streams a room can feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubscriptionKind {
    /// `chatmsg` messages.
    Chat,
    /// `uenter` messages.
    Join,
    /// Every decoded message.
    All,
}

impl SubscriptionKind {
    /// Stable lowercase name, used in logs and CLI output.
    pub fn name(self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::Join => "join",
            Self::All => "all",
        }
    }
}

impl fmt::Display for SubscriptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Default)]
struct Slots {
    chat: Option<mpsc::Sender<Message>>,
    join: Option<mpsc::Sender<Message>>,
    all: Option<mpsc::Sender<Message>>,
    closed: bool,
}

impl Slots {
    fn slot_mut(&mut self, kind: SubscriptionKind) -> &mut Option<mpsc::Sender<Message>> {
        match kind {
            SubscriptionKind::Chat => &mut self.chat,
            SubscriptionKind::Join => &mut self.join,
            SubscriptionKind::All => &mut self.all,
        }
    }
}

/// Registry of active subscriptions shared by a room and its dispatcher.
///
/// A slot is active from its first `subscribe` call until the room closes.
#[derive(Default)]
pub(crate) struct Subscriptions {
    slots: Mutex<Slots>,
}

impl Subscriptions {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Slots> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Activate `kind` with a fresh queue of `buffer` messages.
    ///
    /// A buffer of 0 gets capacity 1. Re-subscribing replaces the queue; the
    /// previous receiver closes once in-flight deliveries finish.
    pub(crate) fn subscribe(&self, kind: SubscriptionKind, buffer: usize) -> mpsc::Receiver<Message> {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        let mut slots = self.lock();
        if slots.closed {
            debug!(stream = %kind, "subscription requested after room closed");
            return rx;
        }
        if slots.slot_mut(kind).replace(tx).is_some() {
            debug!(stream = %kind, "replacing existing subscription");
        }
        rx
    }

    pub(crate) fn is_active(&self, kind: SubscriptionKind) -> bool {
        self.lock().slot_mut(kind).is_some()
    }

    /// Deliver `message` to `kind` if it is active.
    ///
    /// Waits while the queue is full. A dropped receiver deactivates the slot.
    pub(crate) async fn deliver(&self, kind: SubscriptionKind, message: &Message) {
        let sender = self.lock().slot_mut(kind).clone();
        let Some(tx) = sender else {
            return;
        };
        if tx.send(message.clone()).await.is_err() {
            debug!(stream = %kind, "subscriber dropped; deactivating");
            let mut slots = self.lock();
            let slot = slots.slot_mut(kind);
            if slot.as_ref().is_some_and(|current| current.same_channel(&tx)) {
                *slot = None;
            }
        }
    }

    /// Deactivate every slot; receivers see end-of-stream once drained.
    pub(crate) fn close(&self) {
        let mut slots = self.lock();
        slots.closed = true;
        slots.chat = None;
        slots.join = None;
        slots.all = None;
    }
}
