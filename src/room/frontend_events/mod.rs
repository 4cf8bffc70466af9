pub mod events_dto;
pub mod reactions;
pub mod read_receipts;
pub mod timeline_item_id;
