use shared::domain::{PresentationId, SlideId, UserId};
use thiserror::Error;

/// Failure taxonomy for the host session core. Everything except
/// `UnauthorizedAccess` is recoverable: the session stays in its current
/// state and the failed operation runs again on a later event.
#[derive(Debug, Error)]
pub enum HostSessionError {
    /// Slide data has not arrived yet. A loading state, not a failure to
    /// surface to the user.
    #[error("slide sequence is empty or not loaded yet")]
    EmptySequence,

    #[error("slide {} is not part of the presentation", .slide_id.0)]
    SlideNotFound { slide_id: SlideId },

    /// The live channel could not be opened for a subscribe. Retried on
    /// the next navigation event or on an external reconnect signal.
    #[error("live channel connection unavailable: {source}")]
    ConnectionUnavailable { source: anyhow::Error },

    /// Only the presentation's host may drive this view. Terminal; the
    /// routing collaborator turns it into a redirect.
    #[error(
        "user {} is not the host of presentation {}",
        .user_id.0,
        .presentation_id.0
    )]
    UnauthorizedAccess {
        presentation_id: PresentationId,
        user_id: UserId,
    },

    #[error("slide data fetch failed: {source}")]
    Directory { source: anyhow::Error },

    /// Session used before `start` loaded a presentation.
    #[error("no presentation loaded")]
    NotStarted,
}
