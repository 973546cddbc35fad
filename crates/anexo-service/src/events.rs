//! In-process change notifications for attachment records.

use anexo_core::Attachment;
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

const DEFAULT_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Created,
    Updated,
    Deleted,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Created => "created",
            EventKind::Updated => "updated",
            EventKind::Deleted => "deleted",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        match s {
            "created" => Some(EventKind::Created),
            "updated" => Some(EventKind::Updated),
            "deleted" => Some(EventKind::Deleted),
            _ => None,
        }
    }
}

/// Callback handed to `AttachmentRepository::subscribe`.
pub type EventCallback = Box<dyn FnMut(Attachment) + Send + 'static>;

#[derive(Debug, Clone, Serialize)]
pub struct AttachmentEvent {
    pub kind: EventKind,
    pub attachment: Attachment,
}

/// Fan-out of attachment events to any number of subscribers.
///
/// Cloning shares the underlying channel. Events are delivered to each
/// subscriber in the order they were published.
#[derive(Clone)]
pub struct EventHub {
    tx: broadcast::Sender<AttachmentEvent>,
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl EventHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Returns the number of subscribers that received the event.
    pub fn publish(&self, event: AttachmentEvent) -> usize {
        tracing::debug!(
            kind = event.kind.as_str(),
            id = %event.attachment.id,
            "publishing attachment event"
        );
        self.tx.send(event).unwrap_or(0)
    }

    pub fn receiver(&self) -> broadcast::Receiver<AttachmentEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Invoke `callback` for every `kind` event on records of `owner`.
    ///
    /// Must be called from within a tokio runtime. The subscription is
    /// registered before this returns, so events published afterwards
    /// are never missed unless the subscriber lags behind the channel
    /// capacity.
    pub fn subscribe<F>(
        &self,
        kind: EventKind,
        owner: impl Into<String>,
        mut callback: F,
    ) -> Subscription
    where
        F: FnMut(Attachment) + Send + 'static,
    {
        let owner = owner.into();
        let mut rx = self.tx.subscribe();
        let handle = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => {
                        if event.kind == kind && event.attachment.owner == owner {
                            callback(event.attachment);
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(
                            skipped,
                            kind = kind.as_str(),
                            "subscriber lagged, events dropped"
                        );
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        Subscription::from_handle(handle)
    }
}

/// Handle to a running subscription. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    handle: JoinHandle<()>,
}

impl Subscription {
    pub(crate) fn from_handle(handle: JoinHandle<()>) -> Self {
        Self { handle }
    }

    pub fn cancel(self) {
        self.handle.abort();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
