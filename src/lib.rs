//! Turns a Matrix room's confirmed timeline and its queue of local echoes into
//! a flat, incrementally updated list model for a view layer.
//!
//! The adapter owns the room state (an [`EventSource`]) and feeds every change
//! it applied to a [`TimelineProjection`] as a [`SourceNotification`]. The
//! projection reports row edits to a [`ModelObserver`] and computes display
//! attributes of rows on demand.

use matrix_sdk::ruma::{OwnedEventId, OwnedRoomId};
use serde::{Serialize, ser::Serializer};

pub mod config;
pub mod models;
pub mod room;

pub use config::ProjectionConfig;
pub use models::{
    async_requests::{ProjectionRequest, RequestSender},
    changes::{ContentRefresh, ModelChange, ModelStatus, RowRoles, StructuralEdit},
    events::{
        DeliveryStatus, EventContent, FileTransfer, PendingEvent, ReactionsByKey, Redaction,
        TimelineEvent, TransferState,
    },
    observer::ModelObserver,
};
pub use room::{
    event_source::{EventSource, SourceNotification},
    frontend_events::{
        events_dto::{DelegateType, EventStatus, ReplyPreview, RowView},
        reactions::{ReactionGroup, ReactionSummary},
        read_receipts::ReadReceiptSummary,
        timeline_item_id::RowItemId,
    },
    row_index::RowRef,
    row_presenter::RowPresenter,
    timeline_projection::TimelineProjection,
};

pub type Result<T> = std::result::Result<T, Error>;

/// matrix-timeline-projection Error enum
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("event {0} is not part of the projected rows")]
    Unresolved(OwnedEventId),
    #[error("notification for room {notified}, but the attached room is {attached:?}")]
    RoomMismatch {
        notified: OwnedRoomId,
        attached: Option<OwnedRoomId>,
    },
    #[error("invariant violated: {0}")]
    Invariant(String),
    #[error("invalid projection config: {0}")]
    Config(#[from] serde_json::Error),
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Serialize for Error {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.to_string().as_ref())
    }
}
