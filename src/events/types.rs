//! Types and data structures for Events API payloads

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::{ChaturbateError, ChaturbateResult};

/// Event kinds delivered by the Events API, named after their `method`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    BroadcastStart,
    BroadcastStop,
    UserEnter,
    UserLeave,
    Follow,
    Unfollow,
    FanclubJoin,
    ChatMessage,
    PrivateMessage,
    Tip,
    RoomSubjectChange,
    MediaPurchase,
}

impl EventKind {
    /// Every kind, in declaration order
    pub const ALL: [EventKind; 12] = [
        Self::BroadcastStart,
        Self::BroadcastStop,
        Self::UserEnter,
        Self::UserLeave,
        Self::Follow,
        Self::Unfollow,
        Self::FanclubJoin,
        Self::ChatMessage,
        Self::PrivateMessage,
        Self::Tip,
        Self::RoomSubjectChange,
        Self::MediaPurchase,
    ];

    /// Wire name of the kind
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BroadcastStart => "broadcastStart",
            Self::BroadcastStop => "broadcastStop",
            Self::UserEnter => "userEnter",
            Self::UserLeave => "userLeave",
            Self::Follow => "follow",
            Self::Unfollow => "unfollow",
            Self::FanclubJoin => "fanclubJoin",
            Self::ChatMessage => "chatMessage",
            Self::PrivateMessage => "privateMessage",
            Self::Tip => "tip",
            Self::RoomSubjectChange => "roomSubjectChange",
            Self::MediaPurchase => "mediaPurchase",
        }
    }

    /// Look up a kind by its wire name
    pub fn from_method(method: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == method)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = ChaturbateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_method(s)
            .ok_or_else(|| ChaturbateError::config(format!("unknown event kind '{}'", s)))
    }
}

/// How much a user has tipped recently
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecentTips {
    #[default]
    None,
    Some,
    Lots,
    Tons,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "m")]
    Male,
    #[serde(rename = "f")]
    Female,
    #[serde(rename = "t")]
    Trans,
    #[serde(rename = "c")]
    Couple,
    #[default]
    #[serde(other, rename = "unknown")]
    Unknown,
}

/// User descriptor attached to most events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub username: String,
    #[serde(default)]
    pub in_fanclub: bool,
    #[serde(default)]
    pub has_tokens: bool,
    #[serde(default)]
    pub is_mod: bool,
    #[serde(default)]
    pub recent_tips: RecentTips,
    #[serde(default)]
    pub gender: Gender,
    #[serde(default)]
    pub subgender: String,
}

/// Public or private chat line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub bg_color: Option<String>,
    pub message: String,
    #[serde(default)]
    pub font: String,
    #[serde(default)]
    pub from_user: Option<String>,
    #[serde(default)]
    pub to_user: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tip {
    pub tokens: u64,
    #[serde(default)]
    pub is_anon: bool,
    #[serde(default)]
    pub message: String,
}

/// Purchased photo set or video
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Media {
    pub id: u64,
    #[serde(rename = "type")]
    pub media_type: String,
    pub name: String,
    pub tokens: u64,
}

/// Payload of lifecycle and presence events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastEvent {
    pub broadcaster: String,
    pub user: User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessageEvent {
    pub broadcaster: String,
    pub user: User,
    pub message: Message,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivateMessageEvent {
    pub broadcaster: String,
    pub user: User,
    pub message: Message,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TipEvent {
    pub broadcaster: String,
    pub user: User,
    pub tip: Tip,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaPurchaseEvent {
    pub broadcaster: String,
    pub user: User,
    pub media: Media,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSubjectChangeEvent {
    pub broadcaster: String,
    pub subject: String,
}

/// Kind-specific payload of an [`Event`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventPayload {
    BroadcastStart(BroadcastEvent),
    BroadcastStop(BroadcastEvent),
    UserEnter(BroadcastEvent),
    UserLeave(BroadcastEvent),
    Follow(BroadcastEvent),
    Unfollow(BroadcastEvent),
    FanclubJoin(BroadcastEvent),
    ChatMessage(ChatMessageEvent),
    PrivateMessage(PrivateMessageEvent),
    Tip(TipEvent),
    RoomSubjectChange(RoomSubjectChangeEvent),
    MediaPurchase(MediaPurchaseEvent),
}

impl EventPayload {
    /// Decode the `object` of an event whose kind is already known
    pub fn decode(kind: EventKind, object: Value) -> serde_json::Result<Self> {
        Ok(match kind {
            EventKind::BroadcastStart => Self::BroadcastStart(serde_json::from_value(object)?),
            EventKind::BroadcastStop => Self::BroadcastStop(serde_json::from_value(object)?),
            EventKind::UserEnter => Self::UserEnter(serde_json::from_value(object)?),
            EventKind::UserLeave => Self::UserLeave(serde_json::from_value(object)?),
            EventKind::Follow => Self::Follow(serde_json::from_value(object)?),
            EventKind::Unfollow => Self::Unfollow(serde_json::from_value(object)?),
            EventKind::FanclubJoin => Self::FanclubJoin(serde_json::from_value(object)?),
            EventKind::ChatMessage => Self::ChatMessage(serde_json::from_value(object)?),
            EventKind::PrivateMessage => Self::PrivateMessage(serde_json::from_value(object)?),
            EventKind::Tip => Self::Tip(serde_json::from_value(object)?),
            EventKind::RoomSubjectChange => {
                Self::RoomSubjectChange(serde_json::from_value(object)?)
            }
            EventKind::MediaPurchase => Self::MediaPurchase(serde_json::from_value(object)?),
        })
    }

    pub fn kind(&self) -> EventKind {
        match self {
            Self::BroadcastStart(_) => EventKind::BroadcastStart,
            Self::BroadcastStop(_) => EventKind::BroadcastStop,
            Self::UserEnter(_) => EventKind::UserEnter,
            Self::UserLeave(_) => EventKind::UserLeave,
            Self::Follow(_) => EventKind::Follow,
            Self::Unfollow(_) => EventKind::Unfollow,
            Self::FanclubJoin(_) => EventKind::FanclubJoin,
            Self::ChatMessage(_) => EventKind::ChatMessage,
            Self::PrivateMessage(_) => EventKind::PrivateMessage,
            Self::Tip(_) => EventKind::Tip,
            Self::RoomSubjectChange(_) => EventKind::RoomSubjectChange,
            Self::MediaPurchase(_) => EventKind::MediaPurchase,
        }
    }

    pub fn broadcaster(&self) -> &str {
        match self {
            Self::BroadcastStart(e)
            | Self::BroadcastStop(e)
            | Self::UserEnter(e)
            | Self::UserLeave(e)
            | Self::Follow(e)
            | Self::Unfollow(e)
            | Self::FanclubJoin(e) => &e.broadcaster,
            Self::ChatMessage(e) => &e.broadcaster,
            Self::PrivateMessage(e) => &e.broadcaster,
            Self::Tip(e) => &e.broadcaster,
            Self::RoomSubjectChange(e) => &e.broadcaster,
            Self::MediaPurchase(e) => &e.broadcaster,
        }
    }

    /// User the event is about; subject changes carry none
    pub fn user(&self) -> Option<&User> {
        match self {
            Self::BroadcastStart(e)
            | Self::BroadcastStop(e)
            | Self::UserEnter(e)
            | Self::UserLeave(e)
            | Self::Follow(e)
            | Self::Unfollow(e)
            | Self::FanclubJoin(e) => Some(&e.user),
            Self::ChatMessage(e) => Some(&e.user),
            Self::PrivateMessage(e) => Some(&e.user),
            Self::Tip(e) => Some(&e.user),
            Self::MediaPurchase(e) => Some(&e.user),
            Self::RoomSubjectChange(_) => None,
        }
    }
}

/// One event from the feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Opaque identifier assigned by the service
    pub id: String,
    pub payload: EventPayload,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        self.payload.kind()
    }

    pub fn broadcaster(&self) -> &str {
        self.payload.broadcaster()
    }

    pub fn user(&self) -> Option<&User> {
        self.payload.user()
    }

    /// Decode one `{id, method, object}` entry of a batch
    pub fn from_value(raw: &Value) -> ChaturbateResult<Self> {
        let id = match raw.get("id") {
            Some(Value::String(id)) => id.clone(),
            Some(Value::Number(id)) => id.to_string(),
            _ => String::new(),
        };
        let method = raw
            .get("method")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let Some(kind) = EventKind::from_method(&method) else {
            return Err(ChaturbateError::Event {
                id,
                method,
                reason: "unknown event method".to_string(),
            });
        };

        let object = raw.get("object").cloned().unwrap_or(Value::Null);
        match EventPayload::decode(kind, object) {
            Ok(payload) => Ok(Self { id, payload }),
            Err(e) => Err(ChaturbateError::Event {
                id,
                method,
                reason: e.to_string(),
            }),
        }
    }
}

/// Body of an Events API response
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EventsBatch {
    /// Raw entries, decoded one by one so a bad entry does not sink the batch
    pub events: Option<Vec<Value>>,
    #[serde(rename = "nextUrl")]
    pub next_url: Option<String>,
}
