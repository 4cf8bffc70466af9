use matrix_sdk::ruma::{EventId, OwnedEventId, OwnedUserId, RoomId, TransactionId, UserId};

use crate::models::events::{FileTransfer, PendingEvent, TimelineEvent};

/// A room as seen by the projection: its confirmed timeline and its queue of local echoes.
///
/// Both sequences are indexed newest first: offset `0` is the most recent
/// confirmed event, respectively the most recently submitted pending event.
/// The source is only ever borrowed for the duration of a call, so it cannot
/// change while the projection reports an edit.
pub trait EventSource {
    fn room_id(&self) -> &RoomId;

    fn local_user_id(&self) -> &UserId;

    fn timeline_len(&self) -> usize;

    /// The confirmed event at `offset`, newest first.
    fn timeline_event(&self, offset: usize) -> Option<&TimelineEvent>;

    fn pending_len(&self) -> usize;

    /// The pending event at `offset`, newest first.
    fn pending_event(&self, offset: usize) -> Option<&PendingEvent>;

    /// The event the local user has fully read up to.
    fn fully_read_event_id(&self) -> Option<&EventId>;

    /// Whether the loaded window starts at the room creation.
    fn all_history_loaded(&self) -> bool;

    fn is_direct(&self) -> bool {
        false
    }

    fn is_ignored(&self, _user_id: &UserId) -> bool {
        false
    }

    fn member_display_name(&self, _user_id: &UserId) -> Option<String> {
        None
    }

    /// Users whose latest read receipt is on the given event, most recent first.
    fn read_receipts(&self, _event_id: &EventId) -> Vec<OwnedUserId> {
        Vec::new()
    }

    /// Cached upload or download state of the given event's file.
    fn file_transfer(&self, _event_id: &EventId) -> Option<FileTransfer> {
        None
    }

    /// Offset of the given event in the confirmed timeline.
    fn find_in_timeline(&self, event_id: &EventId) -> Option<usize> {
        (0..self.timeline_len()).find(|&offset| {
            self.timeline_event(offset)
                .is_some_and(|event| &*event.event_id == event_id)
        })
    }

    /// Offset of the pending event that already got the given event id from the server.
    fn find_pending_by_event_id(&self, event_id: &EventId) -> Option<usize> {
        (0..self.pending_len()).find(|&offset| {
            self.pending_event(offset)
                .and_then(|pending| pending.event_id.as_deref())
                .is_some_and(|id| id == event_id)
        })
    }

    fn find_pending(&self, transaction_id: &TransactionId) -> Option<usize> {
        (0..self.pending_len()).find(|&offset| {
            self.pending_event(offset)
                .is_some_and(|pending| &*pending.transaction_id == transaction_id)
        })
    }
}

/// Changes of an [`EventSource`], reported after the source applied them.
///
/// Pending events are addressed by their position in the send queue, counted
/// from the oldest pending event (the next one to be delivered).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceNotification {
    /// Events were appended at the live edge of the timeline.
    NewEvents { count: usize },
    /// Older events were loaded by back pagination.
    HistoricalEvents { count: usize },
    /// The user submitted a new event.
    PendingEventAdded,
    /// A pending event came back from the server and is now the newest confirmed event.
    PendingEventMerged { queue_position: usize },
    /// The delivery status of a pending event changed.
    PendingEventChanged { queue_position: usize },
    /// A pending event was cancelled or failed for good.
    PendingEventDiscarded { queue_position: usize },
    /// The fully-read marker of the local user moved to the given event.
    ReadMarkerMoved { to: OwnedEventId },
    /// The event was edited by a later event.
    EventReplaced { event_id: OwnedEventId },
    EventRedacted { event_id: OwnedEventId },
    /// The event changed for another reason, e.g. it was decrypted.
    EventUpdated { event_id: OwnedEventId },
    /// A reaction to the event was added or removed.
    AnnotationChanged { event_id: OwnedEventId },
    /// The event the given event replies to was fetched.
    ReplyLoaded { event_id: OwnedEventId },
    /// Upload or download progress of the given event's file.
    FileTransferProgress { event_id: OwnedEventId },
    /// Read receipts of other users changed.
    ReceiptsChanged,
    /// The local user (un)ignored someone; visibility of many rows changed.
    IgnoredUsersChanged,
    /// Back pagination failed; the core does not retry.
    BackfillFailed { error: String },
    /// Back pagination reached the start of the room.
    HistoryExhausted,
}
