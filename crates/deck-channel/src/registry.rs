use std::collections::HashMap;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::task::{Context, Poll};

use futures_util::Stream;
use tokio::sync::mpsc;
use uuid::Uuid;

use podium_deck_interface::{DeckId, DeckSnapshot, Reaction, Role, StreamEvent, validate_emoji};

use crate::error::{DeckError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionHandle {
    pub id: Uuid,
    pub role: Role,
    pub deck_id: DeckId,
}

struct Subscriber {
    role: Role,
    tx: mpsc::Sender<StreamEvent>,
}

#[derive(Default)]
struct DeckChannel {
    current_slide: u32,
    subscribers: HashMap<Uuid, Subscriber>,
}

impl DeckChannel {
    // Called with the channel lock held, so every subscriber observes the
    // same publish order.
    fn fan_out(&mut self, deck_id: &DeckId, event: &StreamEvent) {
        self.subscribers
            .retain(|id, sub| match sub.tx.try_send(event.clone()) {
                Ok(()) => true,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::warn!(
                        deck_id = %deck_id,
                        connection_id = %id,
                        role = %sub.role,
                        "subscriber_lagging_dropped"
                    );
                    false
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    tracing::debug!(deck_id = %deck_id, connection_id = %id, "subscriber_closed_pruned");
                    false
                }
            });
    }

    fn count(&self, role: Role) -> usize {
        self.subscribers
            .values()
            .filter(|sub| sub.role == role)
            .count()
    }
}

struct RegistryInner {
    channels: Mutex<HashMap<DeckId, Arc<Mutex<DeckChannel>>>>,
    subscriber_buffer: usize,
    max_slides: u32,
}

impl RegistryInner {
    fn channel(&self, deck_id: &DeckId) -> Arc<Mutex<DeckChannel>> {
        lock(&self.channels)
            .entry(deck_id.clone())
            .or_default()
            .clone()
    }

    fn existing(&self, deck_id: &DeckId) -> Option<Arc<Mutex<DeckChannel>>> {
        lock(&self.channels).get(deck_id).cloned()
    }

    fn remove(&self, handle: &ConnectionHandle) -> bool {
        let Some(channel) = self.existing(&handle.deck_id) else {
            return false;
        };
        let removed = lock(&channel).subscribers.remove(&handle.id).is_some();
        if removed {
            tracing::info!(
                deck_id = %handle.deck_id,
                connection_id = %handle.id,
                role = %handle.role,
                "subscriber_left"
            );
        }
        removed
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Process-wide map of deck id to broadcast channel.
///
/// Cloning is cheap and every clone shares the same channels. A deck's
/// channel is created on first use and lives for the rest of the process.
#[derive(Clone)]
pub struct DeckRegistry {
    inner: Arc<RegistryInner>,
}

impl DeckRegistry {
    pub fn new(subscriber_buffer: usize, max_slides: u32) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                channels: Mutex::new(HashMap::new()),
                subscriber_buffer: subscriber_buffer.max(1),
                max_slides,
            }),
        }
    }

    pub fn max_slides(&self) -> u32 {
        self.inner.max_slides
    }

    /// Registers a connection. The returned subscription always yields
    /// `Init` with the slide current at join time before any live event.
    pub fn subscribe(&self, deck_id: &DeckId, role: Role) -> Subscription {
        let channel = self.inner.channel(deck_id);
        let (tx, rx) = mpsc::channel(self.inner.subscriber_buffer);
        let handle = ConnectionHandle {
            id: Uuid::new_v4(),
            role,
            deck_id: deck_id.clone(),
        };

        let slide = {
            let mut channel = lock(&channel);
            let slide = channel.current_slide;
            // Fresh channel with capacity >= 1, cannot be full.
            let _ = tx.try_send(StreamEvent::Init { slide });
            channel.subscribers.insert(handle.id, Subscriber { role, tx });
            slide
        };

        tracing::info!(
            deck_id = %deck_id,
            connection_id = %handle.id,
            role = %role,
            slide,
            "subscriber_joined"
        );

        Subscription {
            handle,
            events: rx,
            registry: Arc::downgrade(&self.inner),
        }
    }

    pub fn publish(&self, deck_id: &DeckId, role: Role, event: StreamEvent) -> Result<()> {
        match &event {
            StreamEvent::Init { .. } => {
                return Err(DeckError::Validation(
                    "init events cannot be published".to_string(),
                ));
            }
            StreamEvent::SlideChange { slide } => {
                if role != Role::Presenter {
                    return Err(DeckError::Unauthorized);
                }
                if *slide >= self.inner.max_slides {
                    return Err(DeckError::Validation(format!(
                        "slide {slide} out of range (max {})",
                        self.inner.max_slides
                    )));
                }
            }
            StreamEvent::Reaction { emoji, .. } => validate_emoji(emoji)?,
        }

        let channel = match &event {
            StreamEvent::SlideChange { .. } => self.inner.channel(deck_id),
            // Nobody is listening on a deck that was never joined.
            _ => match self.inner.existing(deck_id) {
                Some(channel) => channel,
                None => return Ok(()),
            },
        };

        let mut channel = lock(&channel);
        if let StreamEvent::SlideChange { slide } = &event {
            channel.current_slide = *slide;
        }
        channel.fan_out(deck_id, &event);
        Ok(())
    }

    pub fn publish_slide(&self, deck_id: &DeckId, role: Role, slide: u32) -> Result<()> {
        self.publish(deck_id, role, StreamEvent::SlideChange { slide })
    }

    /// Reactions are open to any role. The id and timestamp are assigned here.
    pub fn publish_reaction(&self, deck_id: &DeckId, emoji: &str) -> Result<Reaction> {
        let reaction = Reaction::new(Uuid::new_v4().to_string(), emoji);
        self.publish(deck_id, Role::Viewer, reaction.clone().into())?;
        Ok(reaction)
    }

    /// Idempotent. Returns whether the handle was still registered.
    pub fn unsubscribe(&self, handle: &ConnectionHandle) -> bool {
        self.inner.remove(handle)
    }

    pub fn snapshot(&self, deck_id: &DeckId) -> Option<DeckSnapshot> {
        let channel = self.inner.existing(deck_id)?;
        let channel = lock(&channel);
        Some(DeckSnapshot {
            deck_id: deck_id.clone(),
            slide: channel.current_slide,
            viewers: channel.count(Role::Viewer),
            presenters: channel.count(Role::Presenter),
        })
    }
}

/// Live view of one deck for one connection. Dropping it unsubscribes.
pub struct Subscription {
    handle: ConnectionHandle,
    events: mpsc::Receiver<StreamEvent>,
    registry: Weak<RegistryInner>,
}

impl Subscription {
    pub fn handle(&self) -> &ConnectionHandle {
        &self.handle
    }

    /// `None` once the registry has dropped this subscriber.
    pub async fn recv(&mut self) -> Option<StreamEvent> {
        self.events.recv().await
    }
}

impl Stream for Subscription {
    type Item = StreamEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.events.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.registry.upgrade() {
            inner.remove(&self.handle);
        }
    }
}
