use indexmap::{IndexMap, IndexSet};
use matrix_sdk::ruma::{
    EventId, MilliSecondsSinceUnixEpoch, OwnedEventId, OwnedTransactionId, OwnedUserId,
};
use serde::{Deserialize, Serialize};

/// Reactions to an event, by reaction key then by sender, in the order they were first seen.
pub type ReactionsByKey = IndexMap<String, IndexSet<OwnedUserId>>;

/// A server-confirmed event of a room's timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineEvent {
    pub event_id: OwnedEventId,
    pub sender: OwnedUserId,
    /// The origin server timestamp. Missing for some redacted or malformed events.
    pub timestamp: Option<MilliSecondsSinceUnixEpoch>,
    pub content: EventContent,
    /// Set once a later event redacted this one.
    pub redaction: Option<Redaction>,
    /// The latest event that replaced (edited) this one, if any.
    pub edited_by: Option<OwnedEventId>,
    pub reactions: ReactionsByKey,
    pub in_reply_to: Option<OwnedEventId>,
    pub thread_root: Option<OwnedEventId>,
}

impl TimelineEvent {
    pub fn new(
        event_id: OwnedEventId,
        sender: OwnedUserId,
        timestamp: Option<MilliSecondsSinceUnixEpoch>,
        content: EventContent,
    ) -> Self {
        Self {
            event_id,
            sender,
            timestamp,
            content,
            redaction: None,
            edited_by: None,
            reactions: ReactionsByKey::new(),
            in_reply_to: None,
            thread_root: None,
        }
    }

    pub fn is_redacted(&self) -> bool {
        self.redaction.is_some()
    }

    /// Whether this event is an edit of *another* event, in which case it is
    /// folded into the original row rather than shown on its own.
    pub fn is_replacement(&self) -> bool {
        self.content
            .replaces()
            .is_some_and(|target| target != &*self.event_id)
    }
}

/// Why an event got redacted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Redaction {
    pub reason: Option<String>,
}

/// The local echo of an event the user submitted and the server has not confirmed yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEvent {
    pub transaction_id: OwnedTransactionId,
    /// Known once the server acknowledged the send, before the event comes back through sync.
    pub event_id: Option<OwnedEventId>,
    pub sender: OwnedUserId,
    pub status: DeliveryStatus,
    /// Time of the last status change, used as the display time until the event is merged.
    pub last_updated: MilliSecondsSinceUnixEpoch,
    pub content: EventContent,
    pub in_reply_to: Option<OwnedEventId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeliveryStatus {
    Submitted,
    Retrying,
    Failed,
}

/// The content of an event, by kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventContent {
    Text(MessageBody),
    Emote(MessageBody),
    Notice(MessageBody),
    Media(MediaContent),
    File(FileContent),
    Sticker { body: String },
    State(StateContent),
    Redaction { redacts: OwnedEventId },
    Reaction { relates_to: OwnedEventId, key: String },
    Other { event_type: String },
}

impl EventContent {
    pub fn text(body: impl Into<String>) -> Self {
        Self::Text(MessageBody::new(body))
    }

    /// The id of the event this content edits, if it is an edit.
    pub fn replaces(&self) -> Option<&EventId> {
        match self {
            Self::Text(msg) | Self::Emote(msg) | Self::Notice(msg) => msg.replaces.as_deref(),
            Self::Media(media) => media.replaces.as_deref(),
            Self::File(_)
            | Self::Sticker { .. }
            | Self::State(_)
            | Self::Redaction { .. }
            | Self::Reaction { .. }
            | Self::Other { .. } => None,
        }
    }

    /// The plain body of message-like contents.
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Text(msg) | Self::Emote(msg) | Self::Notice(msg) => Some(&msg.body),
            Self::Media(media) => Some(&media.body),
            Self::File(file) => Some(&file.body),
            Self::Sticker { body } => Some(body),
            Self::State(_)
            | Self::Redaction { .. }
            | Self::Reaction { .. }
            | Self::Other { .. } => None,
        }
    }

    /// Whether the content carries a file that can be uploaded or downloaded.
    pub fn has_file(&self) -> bool {
        matches!(self, Self::Media(_) | Self::File(_) | Self::Sticker { .. })
    }

    pub fn is_state(&self) -> bool {
        matches!(self, Self::State(_))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageBody {
    pub body: String,
    /// Set when this message is an edit (`m.replace`) of the given event.
    pub replaces: Option<OwnedEventId>,
}

impl MessageBody {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            replaces: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Image,
    Video,
    Audio,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaContent {
    pub kind: MediaKind,
    pub body: String,
    pub mimetype: Option<String>,
    pub replaces: Option<OwnedEventId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileContent {
    pub body: String,
    pub mimetype: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateContent {
    pub event_type: String,
    pub state_key: String,
    pub membership: Option<MembershipChange>,
    /// The event sets the same state the room already had.
    pub repeats_state: bool,
}

/// What an `m.room.member` event changed for its target user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MembershipChange {
    Joined,
    Left,
    /// Display name change without membership change.
    Renamed,
    /// Avatar change without membership change.
    AvatarChanged,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransferState {
    Started,
    Completed,
    Failed,
}

/// Upload or download state of the file attached to an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileTransfer {
    pub state: TransferState,
    /// Bytes transferred so far.
    pub progress: u64,
    /// Total size in bytes, 0 when unknown.
    pub total: u64,
}
