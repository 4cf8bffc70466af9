use chrono::{DateTime, Days, FixedOffset, NaiveDate, Utc};
use matrix_sdk::ruma::{EventId, MilliSecondsSinceUnixEpoch, UInt, UserId};
use tracing::error;

use crate::{
    config::ProjectionConfig,
    models::events::{EventContent, MembershipChange, PendingEvent, TimelineEvent},
    room::{
        event_source::EventSource,
        frontend_events::{
            events_dto::{DelegateType, EventStatus, ReplyPreview, RowView},
            reactions::ReactionSummary,
            read_receipts::ReadReceiptSummary,
            timeline_item_id::RowItemId,
        },
        row_index::{RowLayout, RowRef},
    },
};

#[derive(Clone, Copy)]
enum RowEntry<'a> {
    Pending(&'a PendingEvent),
    Confirmed(usize, &'a TimelineEvent),
    ReadMarker,
}

/// Derives display attributes of rows from the committed layout and the event source.
///
/// Nothing is cached: every call reads the rows it needs, so a presenter must
/// not outlive the layout it was created with.
pub struct RowPresenter<'a, S: EventSource + ?Sized> {
    source: &'a S,
    layout: RowLayout,
    config: &'a ProjectionConfig,
    time_zone: FixedOffset,
    /// Reference day for relative section labels.
    today: NaiveDate,
}

impl<'a, S: EventSource + ?Sized> RowPresenter<'a, S> {
    pub fn new(source: &'a S, layout: RowLayout, config: &'a ProjectionConfig) -> Self {
        let time_zone = config.time_zone();
        Self {
            source,
            layout,
            config,
            time_zone,
            today: Utc::now().with_timezone(&time_zone).date_naive(),
        }
    }

    /// Labels sections relative to `today` instead of the current date.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    fn entry(&self, row: usize) -> Option<RowEntry<'a>> {
        let source: &'a S = self.source;
        match self.layout.resolve(row) {
            RowRef::Pending(offset) => source.pending_event(offset).map(RowEntry::Pending),
            RowRef::Confirmed(offset) => source
                .timeline_event(offset)
                .map(|event| RowEntry::Confirmed(offset, event)),
            RowRef::ReadMarker => Some(RowEntry::ReadMarker),
            RowRef::Vacant => None,
        }
    }

    /// All display attributes of `row`.
    pub fn present(&self, row: usize) -> Option<RowView> {
        let view = match self.entry(row)? {
            RowEntry::ReadMarker => {
                let mut view = RowView::read_marker(row, self.read_marker_hidden(row));
                view.timestamp = self.timestamp(row);
                view.time_string = view.timestamp.and_then(|ts| self.format(ts, "%H:%M"));
                view
            }
            RowEntry::Pending(pending) => {
                let timestamp = Some(pending.last_updated);
                RowView {
                    row,
                    item_id: Some(RowItemId::TransactionId(pending.transaction_id.clone())),
                    delegate_type: DelegateType::of(&pending.content),
                    status: if pending.content.replaces().is_some() {
                        EventStatus::Hidden
                    } else {
                        pending.status.into()
                    },
                    author: Some(pending.sender.clone()),
                    author_display_name: self.source.member_display_name(&pending.sender),
                    body: self.display_body(&pending.sender, &pending.content),
                    timestamp,
                    time_string: self.format(pending.last_updated, "%H:%M"),
                    section: self.section_label(pending.last_updated),
                    is_pending: true,
                    is_redacted: false,
                    is_edited: false,
                    is_highlighted: false,
                    show_author: self.show_author(row),
                    show_section: self.show_section(row),
                    reactions: ReactionSummary::default(),
                    read_receipts: ReadReceiptSummary::default(),
                    progress: pending
                        .event_id
                        .as_deref()
                        .filter(|_| pending.content.has_file())
                        .and_then(|event_id| self.source.file_transfer(event_id)),
                    reply: self.reply_preview(pending.in_reply_to.as_deref()),
                    thread_root: None,
                }
            }
            RowEntry::Confirmed(_, event) => {
                let timestamp = self.timestamp(row);
                RowView {
                    row,
                    item_id: Some(RowItemId::EventId(event.event_id.clone())),
                    delegate_type: DelegateType::of(&event.content),
                    status: if self.is_hidden_event(event) {
                        EventStatus::Hidden
                    } else {
                        EventStatus::Normal
                    },
                    author: Some(event.sender.clone()),
                    author_display_name: self.source.member_display_name(&event.sender),
                    body: self.event_body(event),
                    timestamp,
                    time_string: timestamp.and_then(|ts| self.format(ts, "%H:%M")),
                    section: timestamp.and_then(|ts| self.section_label(ts)),
                    is_pending: false,
                    is_redacted: event.is_redacted(),
                    is_edited: event.edited_by.is_some(),
                    is_highlighted: self.is_highlighted(event),
                    show_author: self.show_author(row),
                    show_section: self.show_section(row),
                    reactions: ReactionSummary::from_reactions(
                        &event.reactions,
                        self.source.local_user_id(),
                    ),
                    read_receipts: ReadReceiptSummary::from_readers(
                        self.source.read_receipts(&event.event_id),
                        self.source.local_user_id(),
                    ),
                    progress: event
                        .content
                        .has_file()
                        .then(|| self.source.file_transfer(&event.event_id))
                        .flatten(),
                    reply: self.reply_preview(event.in_reply_to.as_deref()),
                    thread_root: event.thread_root.clone(),
                }
            }
        };
        Some(view)
    }

    /// Whether `row` is not drawn at all.
    pub fn is_hidden(&self, row: usize) -> bool {
        match self.entry(row) {
            Some(RowEntry::Pending(pending)) => pending.content.replaces().is_some(),
            Some(RowEntry::Confirmed(_, event)) => self.is_hidden_event(event),
            Some(RowEntry::ReadMarker) => self.read_marker_hidden(row),
            None => true,
        }
    }

    pub fn is_hidden_event(&self, event: &TimelineEvent) -> bool {
        if self.source.is_ignored(&event.sender) {
            return true;
        }
        match &event.content {
            EventContent::State(state) => {
                if !self.config.show_state_events || state.repeats_state {
                    return true;
                }
                match state.membership {
                    Some(MembershipChange::Joined | MembershipChange::Left) => {
                        !self.config.show_leave_join_events
                    }
                    Some(MembershipChange::Renamed) => !self.config.show_rename_events,
                    Some(MembershipChange::AvatarChanged) => !self.config.show_avatar_updates,
                    Some(MembershipChange::Other) | None => false,
                }
            }
            EventContent::Redaction { .. } | EventContent::Reaction { .. } => true,
            EventContent::Text(_)
            | EventContent::Emote(_)
            | EventContent::Notice(_)
            | EventContent::Media(_)
            | EventContent::File(_)
            | EventContent::Sticker { .. }
            | EventContent::Other { .. } => event.is_replacement(),
        }
    }

    // The marker is pointless when nothing above it is visible.
    fn read_marker_hidden(&self, row: usize) -> bool {
        (0..row).all(|above| self.is_hidden(above))
    }

    /// Whether the author header is drawn, i.e. `row` starts a new group of messages.
    pub fn show_author(&self, row: usize) -> bool {
        let Some(this) = self.entry(row) else {
            return false;
        };
        let (this_author, this_content) = match this {
            RowEntry::ReadMarker => return false,
            RowEntry::Pending(pending) => (&*pending.sender, &pending.content),
            RowEntry::Confirmed(_, event) => (&*event.sender, &event.content),
        };
        let this_time = self.timestamp(row);

        for older in row + 1..self.layout.row_count() {
            let Some(entry) = self.entry(older) else {
                break;
            };
            let (author, content, is_redacted) = match entry {
                RowEntry::ReadMarker => {
                    if self.read_marker_hidden(older) {
                        continue;
                    }
                    return true;
                }
                _ if self.is_hidden(older) => continue,
                RowEntry::Pending(pending) => (&*pending.sender, &pending.content, false),
                RowEntry::Confirmed(_, event) => {
                    (&*event.sender, &event.content, event.is_redacted())
                }
            };
            return author != this_author
                || this_content.is_state()
                || content.is_state()
                || DelegateType::of(content) != DelegateType::of(this_content)
                || is_redacted
                || !self.within_group_window(this_time, self.timestamp(older));
        }
        true
    }

    /// Whether a day separator is drawn below `row`.
    pub fn show_section(&self, row: usize) -> bool {
        if matches!(self.entry(row), Some(RowEntry::ReadMarker) | None) {
            return false;
        }
        let Some(this_day) = self.timestamp(row).and_then(|ts| self.local_date(ts)) else {
            return false;
        };
        for older in row + 1..self.layout.row_count() {
            match self.entry(older) {
                None => break,
                Some(RowEntry::ReadMarker) => continue,
                Some(_) if self.is_hidden(older) => continue,
                Some(_) => {
                    return self.timestamp(older).and_then(|ts| self.local_date(ts))
                        != Some(this_day);
                }
            }
        }
        // The oldest loaded row only starts a day when nothing older can show up.
        self.source.all_history_loaded()
    }

    fn within_group_window(
        &self,
        newer: Option<MilliSecondsSinceUnixEpoch>,
        older: Option<MilliSecondsSinceUnixEpoch>,
    ) -> bool {
        let (Some(newer), Some(older)) = (newer, older) else {
            return false;
        };
        millis(newer).saturating_sub(millis(older)) <= self.config.grouping_window_ms
            && self.local_date(newer).is_some()
            && self.local_date(newer) == self.local_date(older)
    }

    /// The time a row is displayed with.
    ///
    /// Pending rows use their last status change. Confirmed events without a
    /// valid origin timestamp get midnight of the nearest valid timestamp's day.
    pub fn timestamp(&self, row: usize) -> Option<MilliSecondsSinceUnixEpoch> {
        match self.entry(row)? {
            RowEntry::Pending(pending) => Some(pending.last_updated),
            RowEntry::Confirmed(offset, event) => {
                event.timestamp.or_else(|| self.fallback_timestamp(offset))
            }
            RowEntry::ReadMarker => {
                let below = row + 1;
                (below < self.layout.row_count())
                    .then(|| self.timestamp(below))
                    .flatten()
            }
        }
    }

    fn fallback_timestamp(&self, offset: usize) -> Option<MilliSecondsSinceUnixEpoch> {
        let valid = |o: usize| self.source.timeline_event(o).and_then(|event| event.timestamp);
        let nearest = (offset + 1..self.source.timeline_len())
            .find_map(valid)
            .or_else(|| (0..offset).rev().find_map(valid));
        match nearest {
            Some(ts) => self.start_of_day(ts),
            None => {
                error!(
                    "No valid timestamps in the timeline of room {}",
                    self.source.room_id()
                );
                None
            }
        }
    }

    fn local_time(&self, ts: MilliSecondsSinceUnixEpoch) -> Option<DateTime<FixedOffset>> {
        let ms = i64::try_from(millis(ts)).ok()?;
        DateTime::<Utc>::from_timestamp_millis(ms).map(|utc| utc.with_timezone(&self.time_zone))
    }

    fn local_date(&self, ts: MilliSecondsSinceUnixEpoch) -> Option<NaiveDate> {
        self.local_time(ts).map(|time| time.date_naive())
    }

    fn start_of_day(&self, ts: MilliSecondsSinceUnixEpoch) -> Option<MilliSecondsSinceUnixEpoch> {
        let midnight = self
            .local_date(ts)?
            .and_hms_opt(0, 0, 0)?
            .and_local_timezone(self.time_zone)
            .single()?;
        let ms = u64::try_from(midnight.timestamp_millis()).ok()?;
        Some(MilliSecondsSinceUnixEpoch(UInt::new_saturating(ms)))
    }

    fn format(&self, ts: MilliSecondsSinceUnixEpoch, pattern: &str) -> Option<String> {
        self.local_time(ts).map(|time| time.format(pattern).to_string())
    }

    /// Day label of a section: relative for the last week, the date otherwise.
    pub fn section_label(&self, ts: MilliSecondsSinceUnixEpoch) -> Option<String> {
        let day = self.local_date(ts)?;
        if !self.config.human_friendly_dates || day > self.today {
            return Some(day.format("%Y-%m-%d").to_string());
        }
        let days_ago = |n: u64| self.today.checked_sub_days(Days::new(n));
        let label = if day == self.today {
            "Today".to_owned()
        } else if Some(day) == days_ago(1) {
            "Yesterday".to_owned()
        } else if days_ago(7).is_some_and(|week_ago| day > week_ago) {
            day.format("%A").to_string()
        } else {
            day.format("%Y-%m-%d").to_string()
        };
        Some(label)
    }

    fn is_highlighted(&self, event: &TimelineEvent) -> bool {
        let local_user = self.source.local_user_id();
        if self.source.is_direct() || &*event.sender == local_user || event.is_redacted() {
            return false;
        }
        let Some(body) = event.content.body() else {
            return false;
        };
        body.contains(local_user.as_str())
            || self
                .source
                .member_display_name(local_user)
                .is_some_and(|name| !name.is_empty() && body.contains(&name))
    }

    fn event_body(&self, event: &TimelineEvent) -> Option<String> {
        match &event.redaction {
            Some(redaction) => Some(match &redaction.reason {
                Some(reason) if !reason.is_empty() => {
                    format!("[This message was deleted: {reason}]")
                }
                _ => "[This message was deleted]".to_owned(),
            }),
            None => self.display_body(&event.sender, &event.content),
        }
    }

    fn display_body(&self, sender: &UserId, content: &EventContent) -> Option<String> {
        match content {
            EventContent::Emote(msg) => {
                let name = self
                    .source
                    .member_display_name(sender)
                    .unwrap_or_else(|| sender.to_string());
                Some(format!("* {name} {}", msg.body))
            }
            EventContent::State(state) => Some(match state.membership {
                Some(MembershipChange::Joined) => "joined the room".to_owned(),
                Some(MembershipChange::Left) => "left the room".to_owned(),
                Some(MembershipChange::Renamed) => "changed their display name".to_owned(),
                Some(MembershipChange::AvatarChanged) => "changed their avatar".to_owned(),
                Some(MembershipChange::Other) | None => format!("updated {}", state.event_type),
            }),
            EventContent::Text(_)
            | EventContent::Notice(_)
            | EventContent::Media(_)
            | EventContent::File(_)
            | EventContent::Sticker { .. } => content.body().map(ToOwned::to_owned),
            EventContent::Redaction { .. }
            | EventContent::Reaction { .. }
            | EventContent::Other { .. } => None,
        }
    }

    fn reply_preview(&self, in_reply_to: Option<&EventId>) -> Option<ReplyPreview> {
        let reply_id = in_reply_to?;
        let replied = self
            .source
            .find_in_timeline(reply_id)
            .and_then(|offset| self.source.timeline_event(offset));
        Some(ReplyPreview {
            event_id: reply_id.to_owned(),
            loaded: replied.is_some(),
            author: replied.map(|event| event.sender.clone()),
            delegate_type: replied.map(|event| DelegateType::of(&event.content)),
            body: replied.and_then(|event| self.event_body(event)),
        })
    }
}

fn millis(ts: MilliSecondsSinceUnixEpoch) -> u64 {
    u64::from(ts.get())
}
