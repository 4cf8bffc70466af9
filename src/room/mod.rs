pub mod event_source;
pub mod frontend_events;
pub mod read_marker;
pub mod row_index;
pub mod row_presenter;
pub mod timeline_projection;

#[cfg(test)]
pub(crate) mod mock_room;
