use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ChannelId, ChoiceId, QuestionId};

/// A poll prompt together with its fixed set of choices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub channel_id: ChannelId,
    pub text: String,
    pub choices: Vec<Choice>,
    pub created_at: DateTime<Utc>,
}

impl Question {
    pub fn total_votes(&self) -> i64 {
        self.choices.iter().map(|c| c.votes).sum()
    }
}

/// One selectable option of a question. `votes` only ever grows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub id: ChoiceId,
    pub question_id: QuestionId,
    pub text: String,
    pub position: i64,
    pub votes: i64,
}
