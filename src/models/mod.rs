pub mod async_requests;
pub mod changes;
pub mod events;
pub mod observer;
