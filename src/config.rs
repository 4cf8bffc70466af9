use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Tunables of a [`crate::TimelineProjection`].
///
/// Adapters usually persist this next to their other settings and hand it over
/// as JSON; every field falls back to its default when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProjectionConfig {
    /// When a room is attached with fewer confirmed events than this,
    /// an initial back pagination is requested.
    pub min_initial_history: usize,
    /// Number of events requested by the initial back pagination.
    pub initial_backfill_batch: u16,
    /// Number of events requested by [`crate::TimelineProjection::fetch_more`].
    pub fetch_more_batch: u16,
    /// Two consecutive messages of the same sender are grouped under one
    /// author header when they are at most this far apart.
    pub grouping_window_ms: u64,
    /// Offset from UTC used to decide calendar days and format times.
    pub utc_offset_seconds: i32,
    /// Label recent day separators "Today", "Yesterday" or by weekday.
    pub human_friendly_dates: bool,
    pub show_state_events: bool,
    pub show_leave_join_events: bool,
    pub show_rename_events: bool,
    pub show_avatar_updates: bool,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            min_initial_history: 10,
            initial_backfill_batch: 50,
            fetch_more_batch: 20,
            grouping_window_ms: 10 * 60 * 1000,
            utc_offset_seconds: 0,
            human_friendly_dates: true,
            show_state_events: true,
            show_leave_join_events: true,
            show_rename_events: true,
            show_avatar_updates: true,
        }
    }
}

impl ProjectionConfig {
    /// Parses a serialized config, as stored by the adapter.
    pub fn from_json(serialized: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(serialized)?)
    }

    /// The time zone used for day separators, falling back to UTC when the
    /// configured offset is out of range.
    pub fn time_zone(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_seconds).unwrap_or_else(|| {
            warn!(
                "Invalid UTC offset of {} seconds, using UTC for day separators",
                self.utc_offset_seconds
            );
            Utc.fix()
        })
    }
}
