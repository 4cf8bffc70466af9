use std::collections::{BTreeSet, HashSet};

use crossbeam_channel::Receiver;
use matrix_sdk::ruma::{EventId, OwnedEventId, OwnedRoomId, RoomId};
use tracing::{debug, error, trace, warn};

use crate::{
    Error, Result,
    config::ProjectionConfig,
    models::{
        async_requests::{ProjectionRequest, RequestSender, submit_async_request},
        changes::{ContentRefresh, ModelChange, ModelStatus, RowRoles, StructuralEdit},
        observer::ModelObserver,
    },
    room::{
        event_source::{EventSource, SourceNotification},
        frontend_events::{events_dto::RowView, timeline_item_id::RowItemId},
        read_marker::ReadMarkerTracker,
        row_index::{RowLayout, RowRef},
        row_presenter::RowPresenter,
    },
};

/// How far around a new event rows of the same sender get their author header refreshed.
const SENDER_RUN_RADIUS: usize = 10;

/// The message list model of one room at a time.
///
/// Pending events occupy the first rows, newest first, followed by the
/// confirmed timeline, newest first, with the read-marker row placed right
/// above the last read event. Every change of the source is reported to the
/// observer either as a structural edit or as a content refresh, never both
/// for the same logical change.
#[derive(Debug)]
pub struct TimelineProjection<O: ModelObserver> {
    config: ProjectionConfig,
    observer: O,
    request_sender: Option<RequestSender>,
    /// The room currently attached, if any.
    room_id: Option<OwnedRoomId>,
    /// Number of pending rows the view knows about.
    pending: usize,
    /// Number of confirmed rows the view knows about.
    confirmed: usize,
    read_marker: ReadMarkerTracker,
    /// Redactions already reported, so that repeats are no-ops.
    refreshed_redactions: HashSet<OwnedEventId>,
    status: ModelStatus,
}

impl<O: ModelObserver> TimelineProjection<O> {
    pub fn new(
        config: ProjectionConfig,
        observer: O,
        request_sender: Option<RequestSender>,
    ) -> Self {
        Self {
            config,
            observer,
            request_sender,
            room_id: None,
            pending: 0,
            confirmed: 0,
            read_marker: ReadMarkerTracker::default(),
            refreshed_redactions: HashSet::new(),
            status: ModelStatus::default(),
        }
    }

    pub fn config(&self) -> &ProjectionConfig {
        &self.config
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    pub fn room_id(&self) -> Option<&RoomId> {
        self.room_id.as_deref()
    }

    pub fn status(&self) -> &ModelStatus {
        &self.status
    }

    pub fn layout(&self) -> RowLayout {
        RowLayout {
            pending: self.pending,
            confirmed: self.confirmed,
            read_marker: self.read_marker.row(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.layout().row_count()
    }

    pub fn read_marker_row(&self) -> Option<usize> {
        self.read_marker.row()
    }

    /// What `row` stands for, `None` past the end of the list.
    pub fn row_ref(&self, row: usize) -> Option<RowRef> {
        (row < self.row_count()).then(|| self.layout().resolve(row))
    }

    /// Shows the given room, replacing whatever was shown before.
    ///
    /// Attaching the room that is already attached does nothing.
    pub fn attach<S: EventSource + ?Sized>(&mut self, source: &S) {
        if self.room_id.as_deref() == Some(source.room_id()) {
            return;
        }
        debug!(
            "Attaching timeline of room {} ({} events, {} pending)",
            source.room_id(),
            source.timeline_len(),
            source.pending_len()
        );
        self.room_id = Some(source.room_id().to_owned());
        self.status = ModelStatus {
            history_exhausted: source.all_history_loaded(),
            ..Default::default()
        };
        self.reset_from(source);

        // Don't hand the view a suspiciously short history.
        if self.confirmed < self.config.min_initial_history && !source.all_history_loaded() {
            debug!(
                "Sending a first-time backwards pagination request for room {}",
                source.room_id()
            );
            self.request_backfill(self.config.initial_backfill_batch);
        }
        self.emit(ModelChange::Status(self.status.clone()));
    }

    /// Stops showing any room.
    pub fn detach(&mut self) {
        let Some(room_id) = self.room_id.take() else {
            return;
        };
        debug!("Detaching timeline of room {room_id}");
        self.pending = 0;
        self.confirmed = 0;
        self.read_marker = ReadMarkerTracker::default();
        self.refreshed_redactions.clear();
        self.status = ModelStatus::default();
        self.emit(ModelChange::Reset { row_count: 0 });
    }

    /// Applies one change the source already went through.
    pub fn handle<S: EventSource + ?Sized>(
        &mut self,
        source: &S,
        notification: SourceNotification,
    ) {
        if !self.accepts(source) {
            return;
        }
        self.dispatch(source, notification);
        self.settle(source);
    }

    /// Processes all queued changes of the attached room, returning how many were applied.
    ///
    /// The source must already reflect every queued change.
    pub fn process_notifications<S: EventSource + ?Sized>(
        &mut self,
        source: &S,
        receiver: &Receiver<SourceNotification>,
    ) -> usize {
        if !self.accepts(source) {
            return 0;
        }
        let mut num_updates = 0;
        while let Ok(notification) = receiver.try_recv() {
            num_updates += 1;
            self.dispatch(source, notification);
        }
        if num_updates > 0 {
            trace!(
                "Applied {num_updates} timeline updates for room {}, now {} rows",
                source.room_id(),
                self.row_count()
            );
            self.settle(source);
        }
        num_updates
    }

    /// Whether older events can be requested right now.
    pub fn can_fetch_more(&self) -> bool {
        self.room_id.is_some() && !self.status.loading && !self.status.history_exhausted
    }

    /// Requests older events, returning whether a request was sent.
    pub fn fetch_more(&mut self) -> bool {
        if !self.can_fetch_more() {
            return false;
        }
        let sent = self.request_backfill(self.config.fetch_more_batch);
        if sent {
            self.emit(ModelChange::Status(self.status.clone()));
        }
        sent
    }

    /// The row showing the given event, pending or confirmed.
    pub fn event_id_to_row<S: EventSource + ?Sized>(
        &self,
        source: &S,
        event_id: &EventId,
    ) -> Option<usize> {
        if !self.is_attached_to(source) {
            return None;
        }
        let layout = self.layout();
        // Pending events first, there are almost always very few of them.
        if let Some(offset) = source.find_pending_by_event_id(event_id) {
            return (offset < layout.pending).then(|| layout.pending_row(offset));
        }
        source
            .find_in_timeline(event_id)
            .filter(|&offset| offset < layout.confirmed)
            .map(|offset| layout.confirmed_row(offset))
    }

    pub fn row_for_item<S: EventSource + ?Sized>(
        &self,
        source: &S,
        item_id: &RowItemId,
    ) -> Option<usize> {
        match item_id {
            RowItemId::EventId(event_id) => self.event_id_to_row(source, event_id),
            RowItemId::TransactionId(transaction_id) => {
                if !self.is_attached_to(source) {
                    return None;
                }
                let layout = self.layout();
                source
                    .find_pending(transaction_id)
                    .filter(|&offset| offset < layout.pending)
                    .map(|offset| layout.pending_row(offset))
            }
        }
    }

    pub fn presenter<'a, S: EventSource + ?Sized>(&'a self, source: &'a S) -> RowPresenter<'a, S> {
        RowPresenter::new(source, self.layout(), &self.config)
    }

    /// Display attributes of `row`, `None` for rows past the end or a foreign source.
    pub fn row_view<S: EventSource + ?Sized>(&self, source: &S, row: usize) -> Option<RowView> {
        if !self.is_attached_to(source) {
            return None;
        }
        if row >= self.row_count() {
            warn!("Row {row} is not valid, the model has {} rows", self.row_count());
            return None;
        }
        self.presenter(source).present(row)
    }

    fn is_attached_to<S: EventSource + ?Sized>(&self, source: &S) -> bool {
        self.room_id
            .as_ref()
            .is_some_and(|room_id| room_id.as_str() == source.room_id().as_str())
    }

    fn accepts<S: EventSource + ?Sized>(&self, source: &S) -> bool {
        if self.is_attached_to(source) {
            return true;
        }
        let err = Error::RoomMismatch {
            notified: source.room_id().to_owned(),
            attached: self.room_id.clone(),
        };
        warn!("Dropping timeline notification: {err}");
        false
    }

    fn dispatch<S: EventSource + ?Sized>(&mut self, source: &S, notification: SourceNotification) {
        if let Err(e) = self.apply(source, notification) {
            match e {
                Error::Unresolved(_) => debug!("Dropping timeline notification: {e}"),
                e => error!("Failed to apply timeline notification: {e}"),
            }
        }
    }

    fn apply<S: EventSource + ?Sized>(
        &mut self,
        source: &S,
        notification: SourceNotification,
    ) -> Result<()> {
        match notification {
            SourceNotification::NewEvents { count } => self.on_new_events(source, count),
            SourceNotification::HistoricalEvents { count } => {
                self.on_historical_events(source, count)
            }
            SourceNotification::PendingEventAdded => {
                self.pending += 1;
                self.structural(StructuralEdit::Insert { at: 0, count: 1 });
                Ok(())
            }
            SourceNotification::PendingEventMerged { queue_position } => {
                self.on_pending_merged(source, queue_position)
            }
            SourceNotification::PendingEventChanged { queue_position } => {
                let row = self.queued_row(queue_position)?;
                self.refresh(ContentRefresh::row(
                    row,
                    RowRoles::STATUS | RowRoles::TIME | RowRoles::PROGRESS,
                ));
                Ok(())
            }
            SourceNotification::PendingEventDiscarded { queue_position } => {
                let row = self.queued_row(queue_position)?;
                self.pending -= 1;
                self.structural(StructuralEdit::Remove { at: row, count: 1 });
                Ok(())
            }
            SourceNotification::ReadMarkerMoved { to } => {
                // Placed once the notification or batch is settled.
                self.read_marker.retarget(Some(to));
                Ok(())
            }
            SourceNotification::EventReplaced { event_id } => self.refresh_event(
                source,
                &event_id,
                RowRoles::DISPLAY | RowRoles::EDITED | RowRoles::REPLY | RowRoles::SHOW_AUTHOR,
                true,
            ),
            SourceNotification::EventRedacted { event_id } => {
                if self.refreshed_redactions.contains(&event_id) {
                    debug!("Redaction of {event_id} was already applied");
                    return Ok(());
                }
                self.refresh_event(
                    source,
                    &event_id,
                    RowRoles::DISPLAY
                        | RowRoles::REDACTED
                        | RowRoles::EDITED
                        | RowRoles::REACTIONS
                        | RowRoles::SHOW_AUTHOR
                        | RowRoles::SHOW_SECTION,
                    true,
                )?;
                self.refreshed_redactions.insert(event_id);
                Ok(())
            }
            SourceNotification::EventUpdated { event_id } => {
                self.refresh_event(source, &event_id, RowRoles::DISPLAY, false)
            }
            SourceNotification::AnnotationChanged { event_id } => {
                self.refresh_event(source, &event_id, RowRoles::REACTIONS, false)
            }
            SourceNotification::ReplyLoaded { event_id } => {
                self.refresh_event(source, &event_id, RowRoles::REPLY, false)
            }
            SourceNotification::FileTransferProgress { event_id } => {
                self.refresh_event(source, &event_id, RowRoles::PROGRESS, false)
            }
            SourceNotification::ReceiptsChanged => {
                if self.confirmed > 0 {
                    self.refresh(ContentRefresh {
                        first_row: self.layout().timeline_base(),
                        last_row: self.row_count() - 1,
                        roles: RowRoles::READ_RECEIPTS,
                    });
                }
                Ok(())
            }
            SourceNotification::IgnoredUsersChanged => {
                self.reset_from(source);
                Ok(())
            }
            SourceNotification::BackfillFailed { error } => {
                warn!("Back pagination failed in room {}: {error}", source.room_id());
                self.set_status(ModelStatus {
                    loading: false,
                    backfill_error: Some(error),
                    ..self.status.clone()
                });
                Ok(())
            }
            SourceNotification::HistoryExhausted => {
                self.set_status(ModelStatus {
                    loading: false,
                    history_exhausted: true,
                    backfill_error: None,
                });
                Ok(())
            }
        }
    }

    fn on_new_events<S: EventSource + ?Sized>(
        &mut self,
        source: &S,
        count: usize,
    ) -> Result<()> {
        if count == 0 {
            return Ok(());
        }
        let at = self.pending;
        self.confirmed += count;
        self.structural(StructuralEdit::Insert { at, count });

        let below = at + count;
        if below < self.row_count() {
            self.refresh(ContentRefresh::row(below, RowRoles::SHOW_AUTHOR));
        }
        self.refresh_sender_runs(source, 0..count);
        Ok(())
    }

    fn on_historical_events<S: EventSource + ?Sized>(
        &mut self,
        source: &S,
        count: usize,
    ) -> Result<()> {
        if count > 0 {
            // Older events land at the tail, the list is newest first.
            let at = self.row_count();
            self.confirmed += count;
            self.structural(StructuralEdit::Insert { at, count });
            if at > 0 {
                self.refresh(ContentRefresh::row(
                    at - 1,
                    RowRoles::SHOW_AUTHOR | RowRoles::SHOW_SECTION,
                ));
            }
        }
        self.set_status(ModelStatus {
            loading: false,
            history_exhausted: source.all_history_loaded(),
            backfill_error: None,
        });
        Ok(())
    }

    fn on_pending_merged<S: EventSource + ?Sized>(
        &mut self,
        source: &S,
        queue_position: usize,
    ) -> Result<()> {
        let row = self.queued_row(queue_position)?;
        // The merged event becomes the newest confirmed one, right below the
        // remaining pending rows.
        let base = self.pending - 1;
        self.refresh(ContentRefresh::row(row, RowRoles::IS_PENDING | RowRoles::STATUS));
        self.pending -= 1;
        self.confirmed += 1;
        if row != base {
            self.structural(StructuralEdit::Move {
                from: row,
                count: 1,
                to: base,
            });
        }
        self.refresh(ContentRefresh::row(base, RowRoles::all()));
        if base > 0 {
            self.refresh(ContentRefresh::row(base - 1, RowRoles::SHOW_AUTHOR));
        }
        self.refresh_sender_runs(source, 0..1);
        Ok(())
    }

    fn queued_row(&self, queue_position: usize) -> Result<usize> {
        self.layout().queued_row(queue_position).ok_or_else(|| {
            invariant_violation(format!(
                "pending queue position {queue_position} out of range for {} pending rows",
                self.pending
            ))
        })
    }

    fn refresh_event<S: EventSource + ?Sized>(
        &mut self,
        source: &S,
        event_id: &EventId,
        roles: RowRoles,
        with_neighbours: bool,
    ) -> Result<()> {
        let row = self
            .event_id_to_row(source, event_id)
            .ok_or_else(|| Error::Unresolved(event_id.to_owned()))?;
        let refresh = if with_neighbours {
            // Grouping attributes of the rows around depend on this one.
            ContentRefresh {
                first_row: row.saturating_sub(1),
                last_row: (row + 1).min(self.row_count() - 1),
                roles,
            }
        } else {
            ContentRefresh::row(row, roles)
        };
        self.refresh(refresh);
        Ok(())
    }

    /// Refreshes the author header of rows sent by the same users as the given new events.
    fn refresh_sender_runs<S: EventSource + ?Sized>(
        &mut self,
        source: &S,
        offsets: std::ops::Range<usize>,
    ) {
        let layout = self.layout();
        let mut rows = BTreeSet::new();
        for offset in offsets {
            let Some(sender) = source.timeline_event(offset).map(|event| &event.sender) else {
                continue;
            };
            let first = offset.saturating_sub(SENDER_RUN_RADIUS);
            let last = (offset + SENDER_RUN_RADIUS).min(layout.confirmed);
            for other in first..last {
                if source
                    .timeline_event(other)
                    .is_some_and(|event| &event.sender == sender)
                {
                    rows.insert(layout.confirmed_row(other));
                }
            }
        }

        let mut rows = rows.into_iter().peekable();
        while let Some(first_row) = rows.next() {
            let mut last_row = first_row;
            while rows.next_if_eq(&(last_row + 1)).is_some() {
                last_row += 1;
            }
            self.refresh(ContentRefresh {
                first_row,
                last_row,
                roles: RowRoles::AUTHOR | RowRoles::SHOW_AUTHOR,
            });
        }
    }

    /// Places the read marker where its target currently is, reporting at most one edit.
    ///
    /// Only called once the committed counts match the source, so offsets of
    /// the source are offsets of the rows.
    fn update_read_marker<S: EventSource + ?Sized>(&mut self, source: &S) {
        let target_offset = match self.read_marker.target() {
            Some(target) => match source.find_in_timeline(target) {
                Some(offset) => Some(offset),
                None => {
                    debug!("Read marker target {target} is not in the loaded window");
                    None
                }
            },
            None => None,
        };

        let transition = self.read_marker.plan(target_offset, self.pending);
        let Some(edit) = transition.as_edit() else {
            return;
        };
        self.read_marker.commit(transition);
        self.emit(ModelChange::Structural(edit));

        // The row above the marker starts a new group of messages, or stops starting one.
        let (first_row, last_row) = match edit {
            StructuralEdit::Insert { at, .. } | StructuralEdit::Remove { at, .. } => {
                (at.saturating_sub(1), at)
            }
            StructuralEdit::Move { from, to, .. } => {
                (from.min(to).saturating_sub(1), from.max(to))
            }
        };
        let last_row = last_row.min(self.row_count().saturating_sub(1));
        if self.row_count() > 0 && first_row <= last_row {
            self.refresh(ContentRefresh {
                first_row,
                last_row,
                roles: RowRoles::SHOW_AUTHOR,
            });
        }
    }

    /// Verifies the committed counts against the source once a notification or
    /// a batch of them is applied, then brings the read marker up to date.
    fn settle<S: EventSource + ?Sized>(&mut self, source: &S) {
        let committed = (self.pending, self.confirmed);
        let actual = (source.pending_len(), source.timeline_len());
        if committed != actual {
            let err = invariant_violation(format!(
                "projection of room {} is out of sync: (pending, confirmed) is {committed:?}, \
                 source has {actual:?}",
                source.room_id()
            ));
            error!("{err}, resetting");
            self.reset_from(source);
            return;
        }
        self.update_read_marker(source);
    }

    /// Replaces everything with the current content of `source`.
    fn reset_from<S: EventSource + ?Sized>(&mut self, source: &S) {
        self.pending = source.pending_len();
        self.confirmed = source.timeline_len();
        self.refreshed_redactions.clear();
        self.read_marker =
            ReadMarkerTracker::new(source.fully_read_event_id().map(ToOwned::to_owned));
        let target_offset = self
            .read_marker
            .target()
            .and_then(|target| source.find_in_timeline(target));
        let transition = self.read_marker.plan(target_offset, self.pending);
        self.read_marker.commit(transition);
        self.emit(ModelChange::Reset {
            row_count: self.row_count(),
        });
    }

    fn request_backfill(&mut self, num_events: u16) -> bool {
        let Some(room_id) = self.room_id.clone() else {
            return false;
        };
        let sent = submit_async_request(
            self.request_sender.as_ref(),
            ProjectionRequest::PaginateBackwards {
                room_id,
                num_events,
            },
        );
        if sent {
            self.status.loading = true;
            self.status.backfill_error = None;
        }
        sent
    }

    fn set_status(&mut self, status: ModelStatus) {
        if self.status != status {
            self.status = status;
            self.emit(ModelChange::Status(self.status.clone()));
        }
    }

    fn structural(&mut self, edit: StructuralEdit) {
        self.read_marker.shift_for(&edit);
        self.emit(ModelChange::Structural(edit));
    }

    fn refresh(&mut self, refresh: ContentRefresh) {
        debug_assert!(
            refresh.first_row <= refresh.last_row && refresh.last_row < self.row_count(),
            "refresh {refresh:?} out of range for {} rows",
            self.row_count()
        );
        self.emit(ModelChange::Refresh(refresh));
    }

    fn emit(&mut self, change: ModelChange) {
        if let Err(e) = self.observer.apply(change) {
            error!("Couldn't forward timeline change to the view: {e:?}");
        }
    }
}

/// Programming errors: fatal in debug builds, reported and recovered from otherwise.
fn invariant_violation(message: String) -> Error {
    if cfg!(debug_assertions) {
        panic!("{message}");
    }
    Error::Invariant(message)
}
