//! An in-memory room and a mirroring view used by the tests.

use std::collections::HashMap;

use matrix_sdk::ruma::{
    EventId, MilliSecondsSinceUnixEpoch, OwnedEventId, OwnedRoomId, OwnedTransactionId,
    OwnedUserId, RoomId, UInt, UserId,
};

use crate::{
    models::{
        changes::{ModelChange, StructuralEdit},
        events::{
            DeliveryStatus, EventContent, FileTransfer, PendingEvent, Redaction, TimelineEvent,
        },
        observer::ModelObserver,
    },
    room::event_source::{EventSource, SourceNotification},
};

/// 2023-11-14 12:00:00 UTC
pub const BASE_TS: u64 = 1_699_963_200_000;

pub fn ts(minutes: u64) -> MilliSecondsSinceUnixEpoch {
    MilliSecondsSinceUnixEpoch(UInt::new_saturating(BASE_TS + minutes * 60_000))
}

pub fn event_id(n: u32) -> OwnedEventId {
    EventId::parse(format!("$ev{n}")).unwrap()
}

pub fn user(name: &str) -> OwnedUserId {
    UserId::parse(format!("@{name}:example.org")).unwrap()
}

pub fn room_id(name: &str) -> OwnedRoomId {
    RoomId::parse(format!("!{name}:example.org")).unwrap()
}

/// A text message `n` of `sender`, sent `minutes` after [`BASE_TS`].
pub fn message(n: u32, sender: &str, minutes: u64) -> TimelineEvent {
    TimelineEvent::new(
        event_id(n),
        user(sender),
        Some(ts(minutes)),
        EventContent::text(format!("message {n}")),
    )
}

/// Room state kept oldest first, exposed newest first like a real timeline.
pub struct MockRoom {
    pub room_id: OwnedRoomId,
    pub local_user: OwnedUserId,
    pub timeline: Vec<TimelineEvent>,
    pub pending: Vec<PendingEvent>,
    pub fully_read: Option<OwnedEventId>,
    pub all_history_loaded: bool,
    pub direct: bool,
    pub ignored: Vec<OwnedUserId>,
    pub display_names: HashMap<OwnedUserId, String>,
    pub receipts: HashMap<OwnedEventId, Vec<OwnedUserId>>,
    pub transfers: HashMap<OwnedEventId, FileTransfer>,
    next_transaction: u32,
}

impl MockRoom {
    pub fn new(name: &str) -> Self {
        Self {
            room_id: room_id(name),
            local_user: user("me"),
            timeline: Vec::new(),
            pending: Vec::new(),
            fully_read: None,
            all_history_loaded: false,
            direct: false,
            ignored: Vec::new(),
            display_names: HashMap::new(),
            receipts: HashMap::new(),
            transfers: HashMap::new(),
            next_transaction: 0,
        }
    }

    /// A room holding `events`, given oldest first.
    pub fn with_events(name: &str, events: impl IntoIterator<Item = TimelineEvent>) -> Self {
        let mut room = Self::new(name);
        room.timeline.extend(events);
        room
    }

    /// `count` messages alternating between two senders, one minute apart.
    pub fn with_messages(name: &str, count: u32) -> Self {
        Self::with_events(
            name,
            (0..count).map(|n| message(n, if n % 2 == 0 { "alice" } else { "bob" }, n.into())),
        )
    }

    fn event_mut(&mut self, event_id: &EventId) -> &mut TimelineEvent {
        self.timeline
            .iter_mut()
            .find(|event| &*event.event_id == event_id)
            .unwrap()
    }

    /// Appends events, given oldest first, at the live edge.
    pub fn push_new(
        &mut self,
        events: impl IntoIterator<Item = TimelineEvent>,
    ) -> SourceNotification {
        let before = self.timeline.len();
        self.timeline.extend(events);
        SourceNotification::NewEvents {
            count: self.timeline.len() - before,
        }
    }

    /// Prepends older events, given oldest first.
    pub fn push_historical(&mut self, events: Vec<TimelineEvent>) -> SourceNotification {
        let count = events.len();
        self.timeline.splice(0..0, events);
        SourceNotification::HistoricalEvents { count }
    }

    /// Queues a text message from the local user.
    pub fn submit(&mut self, body: &str, minutes: u64) -> SourceNotification {
        self.submit_content(EventContent::text(body), minutes)
    }

    pub fn submit_content(&mut self, content: EventContent, minutes: u64) -> SourceNotification {
        self.next_transaction += 1;
        self.pending.push(PendingEvent {
            transaction_id: OwnedTransactionId::from(format!("txn{}", self.next_transaction)),
            event_id: None,
            sender: self.local_user.clone(),
            status: DeliveryStatus::Submitted,
            last_updated: ts(minutes),
            content,
            in_reply_to: None,
        });
        SourceNotification::PendingEventAdded
    }

    /// The server echoed the pending event at `queue_position` back as event `n`.
    pub fn merge(&mut self, queue_position: usize, n: u32, minutes: u64) -> SourceNotification {
        let pending = self.pending.remove(queue_position);
        let mut event = TimelineEvent::new(
            event_id(n),
            pending.sender,
            Some(ts(minutes)),
            pending.content,
        );
        event.in_reply_to = pending.in_reply_to;
        self.timeline.push(event);
        SourceNotification::PendingEventMerged { queue_position }
    }

    pub fn fail(&mut self, queue_position: usize) -> SourceNotification {
        self.pending[queue_position].status = DeliveryStatus::Failed;
        SourceNotification::PendingEventChanged { queue_position }
    }

    pub fn discard(&mut self, queue_position: usize) -> SourceNotification {
        self.pending.remove(queue_position);
        SourceNotification::PendingEventDiscarded { queue_position }
    }

    pub fn set_fully_read(&mut self, n: u32) -> SourceNotification {
        self.fully_read = Some(event_id(n));
        SourceNotification::ReadMarkerMoved { to: event_id(n) }
    }

    pub fn redact(&mut self, n: u32, reason: Option<&str>) -> SourceNotification {
        let event = self.event_mut(&event_id(n));
        event.redaction = Some(Redaction {
            reason: reason.map(ToOwned::to_owned),
        });
        event.reactions.clear();
        SourceNotification::EventRedacted {
            event_id: event_id(n),
        }
    }

    /// Moves the read receipt of `reader` to event `n`.
    pub fn read_up_to(&mut self, n: u32, reader: &str) -> SourceNotification {
        let reader = user(reader);
        for readers in self.receipts.values_mut() {
            readers.retain(|other| *other != reader);
        }
        self.receipts.entry(event_id(n)).or_default().insert(0, reader);
        SourceNotification::ReceiptsChanged
    }

    pub fn transfer(&mut self, n: u32, transfer: FileTransfer) -> SourceNotification {
        self.transfers.insert(event_id(n), transfer);
        SourceNotification::FileTransferProgress {
            event_id: event_id(n),
        }
    }

    pub fn react(&mut self, n: u32, key: &str, sender: &str) -> SourceNotification {
        self.event_mut(&event_id(n))
            .reactions
            .entry(key.to_owned())
            .or_default()
            .insert(user(sender));
        SourceNotification::AnnotationChanged {
            event_id: event_id(n),
        }
    }
}

impl EventSource for MockRoom {
    fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    fn local_user_id(&self) -> &UserId {
        &self.local_user
    }

    fn timeline_len(&self) -> usize {
        self.timeline.len()
    }

    fn timeline_event(&self, offset: usize) -> Option<&TimelineEvent> {
        self.timeline.iter().rev().nth(offset)
    }

    fn pending_len(&self) -> usize {
        self.pending.len()
    }

    fn pending_event(&self, offset: usize) -> Option<&PendingEvent> {
        self.pending.iter().rev().nth(offset)
    }

    fn fully_read_event_id(&self) -> Option<&EventId> {
        self.fully_read.as_deref()
    }

    fn all_history_loaded(&self) -> bool {
        self.all_history_loaded
    }

    fn is_direct(&self) -> bool {
        self.direct
    }

    fn is_ignored(&self, user_id: &UserId) -> bool {
        self.ignored.iter().any(|ignored| &**ignored == user_id)
    }

    fn member_display_name(&self, user_id: &UserId) -> Option<String> {
        self.display_names.get(user_id).cloned()
    }

    fn read_receipts(&self, event_id: &EventId) -> Vec<OwnedUserId> {
        self.receipts.get(event_id).cloned().unwrap_or_default()
    }

    fn file_transfer(&self, event_id: &EventId) -> Option<FileTransfer> {
        self.transfers.get(event_id).copied()
    }
}

/// A view that replays every change on a list of row tokens.
///
/// Rows keep their token while they are moved around, so tests can follow a
/// row's identity across edits.
#[derive(Debug, Default)]
pub struct MirrorView {
    pub rows: Vec<u64>,
    pub changes: Vec<ModelChange>,
    next_token: u64,
}

impl MirrorView {
    fn fresh(&mut self, count: usize) -> Vec<u64> {
        let start = self.next_token;
        self.next_token += count as u64;
        (start..self.next_token).collect()
    }

    /// Drains the changes recorded so far.
    pub fn take(&mut self) -> Vec<ModelChange> {
        std::mem::take(&mut self.changes)
    }

    pub fn structural(&self) -> Vec<StructuralEdit> {
        self.changes
            .iter()
            .filter_map(ModelChange::as_structural)
            .copied()
            .collect()
    }
}

impl ModelObserver for MirrorView {
    fn apply(&mut self, change: ModelChange) -> anyhow::Result<()> {
        match &change {
            ModelChange::Reset { row_count } => self.rows = self.fresh(*row_count),
            ModelChange::Structural(StructuralEdit::Insert { at, count }) => {
                assert!(*at <= self.rows.len(), "insert at {at} past {} rows", self.rows.len());
                let tokens = self.fresh(*count);
                self.rows.splice(*at..*at, tokens);
            }
            ModelChange::Structural(StructuralEdit::Remove { at, count }) => {
                assert!(at + count <= self.rows.len(), "remove past the end: {change:?}");
                self.rows.drain(*at..at + count);
            }
            ModelChange::Structural(StructuralEdit::Move { from, count, to }) => {
                assert!(from + count <= self.rows.len(), "move past the end: {change:?}");
                let moved: Vec<u64> = self.rows.drain(*from..from + count).collect();
                assert!(*to <= self.rows.len(), "move target past the end: {change:?}");
                self.rows.splice(*to..*to, moved);
            }
            ModelChange::Refresh(refresh) => assert!(
                refresh.first_row <= refresh.last_row && refresh.last_row < self.rows.len(),
                "refresh {refresh:?} out of range for {} rows",
                self.rows.len()
            ),
            ModelChange::Status(_) => {}
        }
        self.changes.push(change);
        Ok(())
    }
}
