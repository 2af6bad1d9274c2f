use chrono::{DateTime, Utc};
use shared::{
    domain::{ChoiceId, SlideId, UserId, VoteId},
    protocol::SlideDetail,
};
use tracing::debug;

/// One applied ballot. The wire event has no vote identity, so one is
/// minted at ingest; see [`AggregateTally::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vote {
    pub vote_id: VoteId,
    pub choice_id: ChoiceId,
    pub voter_id: UserId,
    pub cast_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceTally {
    pub choice_id: ChoiceId,
    pub content: String,
    pub votes: Vec<Vote>,
}

/// In-memory aggregate for the one slide currently on air. Created when
/// the slide's channel opens, discarded when navigation leaves the slide;
/// never merged across slides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateTally {
    pub slide_id: SlideId,
    pub question: String,
    pub choices: Vec<ChoiceTally>,
}

impl AggregateTally {
    /// Seeds the tally from the fetched slide detail. Votes already
    /// recorded server-side get synthesized identities exactly like live
    /// ones.
    pub fn from_detail(detail: &SlideDetail) -> Self {
        let choices = detail
            .choices
            .iter()
            .map(|choice| ChoiceTally {
                choice_id: choice.choice_id,
                content: choice.content.clone(),
                votes: choice
                    .votes
                    .iter()
                    .map(|vote| Vote {
                        vote_id: VoteId::generate(),
                        choice_id: choice.choice_id,
                        voter_id: vote.voter_id,
                        cast_at: vote.cast_at,
                    })
                    .collect(),
            })
            .collect();
        Self {
            slide_id: detail.slide_id,
            question: detail.question.clone(),
            choices,
        }
    }

    /// Folds one guest submission into the tally and returns how many
    /// votes were appended. Choice ids that don't match the fetched slide
    /// are ignored: late events can outrun slide data and must not fail
    /// the session. Each delivered event instance is applied exactly once;
    /// the event carries no idempotency key, so transport-level redelivery
    /// is not deduplicated here.
    pub fn apply(&mut self, voter_id: UserId, choice_ids: &[ChoiceId]) -> usize {
        let mut applied = 0;
        for &choice_id in choice_ids {
            let Some(choice) = self
                .choices
                .iter_mut()
                .find(|choice| choice.choice_id == choice_id)
            else {
                debug!(choice_id = choice_id.0, "vote for unknown choice ignored");
                continue;
            };
            choice.votes.push(Vote {
                vote_id: VoteId::generate(),
                choice_id,
                voter_id,
                cast_at: Utc::now(),
            });
            applied += 1;
        }
        applied
    }
}

#[cfg(test)]
#[path = "tests/tally_tests.rs"]
mod tests;
