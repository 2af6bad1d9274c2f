use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    domain::{ChoiceId, PresentationId, SlideId, UserId},
    error::ApiError,
};

/// Control frames the host sends on the live channel socket. Fire and
/// forget: no acknowledgment is awaited before proceeding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ControlMessage {
    Subscribe { slide_id: SlideId },
    Unsubscribe { slide_id: SlideId },
}

/// Events the server pushes to a subscribed host.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ChannelEvent {
    /// One guest cast one or more simultaneous choice selections. There is
    /// no per-vote identity on the wire; see the aggregator for what that
    /// means for idempotency.
    ChoicesSubmitted {
        slide_id: SlideId,
        voter_id: UserId,
        choice_ids: Vec<ChoiceId>,
    },
    Error(ApiError),
}

/// The ordered deck for one presentation, fetched once per session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresentationSlides {
    pub presentation_id: PresentationId,
    pub host_id: UserId,
    /// Short join token guests type to enter the poll.
    pub code: String,
    pub slide_ids: Vec<SlideId>,
}

/// One slide's question and choices, fetched once per slide entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlideDetail {
    pub slide_id: SlideId,
    pub question: String,
    pub choices: Vec<ChoiceDetail>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChoiceDetail {
    pub choice_id: ChoiceId,
    pub content: String,
    /// Votes already recorded server-side when the detail was fetched.
    #[serde(default)]
    pub votes: Vec<VotePayload>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VotePayload {
    pub voter_id: UserId,
    pub cast_at: DateTime<Utc>,
}
