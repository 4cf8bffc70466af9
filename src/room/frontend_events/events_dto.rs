use matrix_sdk::ruma::{MilliSecondsSinceUnixEpoch, OwnedEventId, OwnedUserId};
use serde::Serialize;

use crate::models::events::{DeliveryStatus, EventContent, FileTransfer, MediaKind};

use super::{
    reactions::ReactionSummary, read_receipts::ReadReceiptSummary, timeline_item_id::RowItemId,
};

/// The delegate a view should use to draw a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DelegateType {
    Message,
    Emote,
    Notice,
    Image,
    Video,
    Audio,
    File,
    Sticker,
    State,
    ReadMarker,
    Other,
}

impl DelegateType {
    pub fn of(content: &EventContent) -> Self {
        match content {
            EventContent::Text(_) => Self::Message,
            EventContent::Emote(_) => Self::Emote,
            EventContent::Notice(_) => Self::Notice,
            EventContent::Media(media) => match media.kind {
                MediaKind::Image => Self::Image,
                MediaKind::Video => Self::Video,
                MediaKind::Audio => Self::Audio,
            },
            EventContent::File(_) => Self::File,
            EventContent::Sticker { .. } => Self::Sticker,
            EventContent::State(_) => Self::State,
            EventContent::Redaction { .. }
            | EventContent::Reaction { .. }
            | EventContent::Other { .. } => Self::Other,
        }
    }
}

/// Whether and how a row is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EventStatus {
    Normal,
    Hidden,
    Submitted,
    Retrying,
    Failed,
}

impl From<DeliveryStatus> for EventStatus {
    fn from(status: DeliveryStatus) -> Self {
        match status {
            DeliveryStatus::Submitted => Self::Submitted,
            DeliveryStatus::Retrying => Self::Retrying,
            DeliveryStatus::Failed => Self::Failed,
        }
    }
}

/// What is shown of the event a row replies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyPreview {
    pub event_id: OwnedEventId,
    /// False while the replied-to event is outside the loaded window.
    pub loaded: bool,
    pub author: Option<OwnedUserId>,
    pub delegate_type: Option<DelegateType>,
    pub body: Option<String>,
}

/// Display attributes of a single row, computed on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowView {
    pub row: usize,
    pub item_id: Option<RowItemId>,
    pub delegate_type: DelegateType,
    pub status: EventStatus,
    pub author: Option<OwnedUserId>,
    pub author_display_name: Option<String>,
    pub body: Option<String>,
    pub timestamp: Option<MilliSecondsSinceUnixEpoch>,
    pub time_string: Option<String>,
    /// Label of the day separator.
    pub section: Option<String>,
    pub is_pending: bool,
    pub is_redacted: bool,
    pub is_edited: bool,
    pub is_highlighted: bool,
    pub show_author: bool,
    pub show_section: bool,
    pub reactions: ReactionSummary,
    pub read_receipts: ReadReceiptSummary,
    /// Transfer state of the attached file, for file-like rows only.
    pub progress: Option<FileTransfer>,
    pub reply: Option<ReplyPreview>,
    pub thread_root: Option<OwnedEventId>,
}

impl RowView {
    pub(crate) fn read_marker(row: usize, hidden: bool) -> Self {
        Self {
            row,
            item_id: None,
            delegate_type: DelegateType::ReadMarker,
            status: if hidden {
                EventStatus::Hidden
            } else {
                EventStatus::Normal
            },
            author: None,
            author_display_name: None,
            body: None,
            timestamp: None,
            time_string: None,
            section: None,
            is_pending: false,
            is_redacted: false,
            is_edited: false,
            is_highlighted: false,
            show_author: false,
            show_section: false,
            reactions: ReactionSummary::default(),
            read_receipts: ReadReceiptSummary::default(),
            progress: None,
            reply: None,
            thread_root: None,
        }
    }
}
