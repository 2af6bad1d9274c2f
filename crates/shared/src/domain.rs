use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);
    };
}

id_newtype!(UserId);
id_newtype!(PresentationId);
id_newtype!(SlideId);
id_newtype!(ChoiceId);

/// Identity of a vote applied to the live tally. The inbound wire event
/// carries no per-vote id, so one is minted when the vote is folded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VoteId(pub Uuid);

impl VoteId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}
