//! Events API long-poller

pub mod poller;
pub mod registry;
pub mod types;

pub use poller::{build_events_url, EventsPoller, PollerConfig};
pub use registry::EventRegistry;
pub use types::{
    BroadcastEvent, ChatMessageEvent, Event, EventKind, EventPayload, EventsBatch, Gender,
    Media, MediaPurchaseEvent, Message, PrivateMessageEvent, RecentTips, RoomSubjectChangeEvent,
    Tip, TipEvent, User,
};
