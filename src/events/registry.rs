//! Subscription registry keyed by event kind

use std::collections::HashMap;

use super::types::{
    ChatMessageEvent, Event, EventKind, EventPayload, MediaPurchaseEvent, PrivateMessageEvent,
    RoomSubjectChangeEvent, TipEvent,
};
use crate::callbacks::{CallbackId, CallbackRegistry};
use crate::error::ChaturbateError;

/// Catch-all, per-kind and error channels of an events poller.
///
/// Dispatch is inline on the poll loop: each event goes to every catch-all
/// subscriber, then to every subscriber of its kind, before the next event
/// is looked at.
pub struct EventRegistry {
    any: CallbackRegistry<Event>,
    kinds: HashMap<EventKind, CallbackRegistry<Event>>,
    errors: CallbackRegistry<ChaturbateError>,
}

impl Default for EventRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl EventRegistry {
    pub fn new() -> Self {
        let kinds = EventKind::ALL
            .into_iter()
            .map(|kind| (kind, CallbackRegistry::with_group(kind.as_str())))
            .collect();

        Self {
            any: CallbackRegistry::with_group("event"),
            kinds,
            errors: CallbackRegistry::with_group("error"),
        }
    }

    /// Subscribe to every event
    pub fn on_any<F>(&self, callback: F) -> CallbackId
    where
        F: Fn(&Event) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.any.register(callback)
    }

    /// Subscribe to events of one kind
    pub fn on<F>(&self, kind: EventKind, callback: F) -> CallbackId
    where
        F: Fn(&Event) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.kind(kind).register(callback)
    }

    /// Subscribe to poll failures and undecodable events
    pub fn on_error<F>(&self, callback: F) -> CallbackId
    where
        F: Fn(&ChaturbateError) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.errors.register(callback)
    }

    pub fn on_tip<F>(&self, callback: F) -> CallbackId
    where
        F: Fn(&TipEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.on(EventKind::Tip, move |event| match &event.payload {
            EventPayload::Tip(tip) => callback(tip),
            _ => Ok(()),
        })
    }

    pub fn on_chat_message<F>(&self, callback: F) -> CallbackId
    where
        F: Fn(&ChatMessageEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.on(EventKind::ChatMessage, move |event| match &event.payload {
            EventPayload::ChatMessage(message) => callback(message),
            _ => Ok(()),
        })
    }

    pub fn on_private_message<F>(&self, callback: F) -> CallbackId
    where
        F: Fn(&PrivateMessageEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.on(EventKind::PrivateMessage, move |event| match &event.payload {
            EventPayload::PrivateMessage(message) => callback(message),
            _ => Ok(()),
        })
    }

    pub fn on_room_subject_change<F>(&self, callback: F) -> CallbackId
    where
        F: Fn(&RoomSubjectChangeEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.on(EventKind::RoomSubjectChange, move |event| match &event.payload {
            EventPayload::RoomSubjectChange(change) => callback(change),
            _ => Ok(()),
        })
    }

    pub fn on_media_purchase<F>(&self, callback: F) -> CallbackId
    where
        F: Fn(&MediaPurchaseEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.on(EventKind::MediaPurchase, move |event| match &event.payload {
            EventPayload::MediaPurchase(purchase) => callback(purchase),
            _ => Ok(()),
        })
    }

    /// Remove a subscription from whichever channel holds it
    pub fn unsubscribe(&self, id: CallbackId) -> bool {
        self.any.unregister(id)
            || self.errors.unregister(id)
            || self.kinds.values().any(|registry| registry.unregister(id))
    }

    /// Deliver one event to the catch-all channel, then to its kind's channel
    pub fn dispatch(&self, event: &Event) -> usize {
        self.any.trigger(event) + self.kind(event.kind()).trigger(event)
    }

    /// Deliver an error to the error channel
    pub fn dispatch_error(&self, error: &ChaturbateError) -> usize {
        self.errors.trigger(error)
    }

    /// Number of subscribers on a kind's channel
    pub fn count(&self, kind: EventKind) -> usize {
        self.kind(kind).count()
    }

    /// Drop every subscription on every channel
    pub fn clear(&self) {
        self.any.clear();
        self.errors.clear();
        for registry in self.kinds.values() {
            registry.clear();
        }
    }

    fn kind(&self, kind: EventKind) -> &CallbackRegistry<Event> {
        // Every kind is inserted in `new`.
        &self.kinds[&kind]
    }
}
