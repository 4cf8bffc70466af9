use matrix_sdk::ruma::OwnedRoomId;
use tokio::sync::mpsc::UnboundedSender;
use tracing::warn;

/// Work the projection asks the protocol layer to perform asynchronously.
///
/// Results come back as [`crate::SourceNotification`]s once the room's
/// timeline changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectionRequest {
    /// Request to paginate the older events of a room's timeline.
    PaginateBackwards {
        room_id: OwnedRoomId,
        /// The maximum number of timeline events to fetch.
        num_events: u16,
    },
}

/// The sending half handed to [`crate::TimelineProjection::new`].
pub type RequestSender = UnboundedSender<ProjectionRequest>;

/// Submits a request to the worker, returning whether it was accepted.
pub(crate) fn submit_async_request(sender: Option<&RequestSender>, req: ProjectionRequest) -> bool {
    let Some(sender) = sender else {
        warn!("No request sender configured, dropping {req:?}");
        return false;
    };
    match sender.send(req) {
        Ok(()) => true,
        Err(e) => {
            warn!("Async worker receiver has died, dropping {:?}", e.0);
            false
        }
    }
}
