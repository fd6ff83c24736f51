use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use pollbox_models::{Channel, ChannelId, Choice, ChoiceId, Question, QuestionId};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::CoreError;
use crate::store::{AtomicCounterStore, ChoiceDraft, PollStore, QuestionDraft};

#[derive(Debug, Clone)]
struct QuestionEntry {
    id: QuestionId,
    channel_id: ChannelId,
    text: String,
    created_at: chrono::DateTime<Utc>,
    choice_ids: Vec<ChoiceId>,
}

/// In-process [`PollStore`].
///
/// Vote counters live in a `DashMap`; an increment holds the shard write lock
/// for the entry, so concurrent votes on one choice serialize. A question and
/// its choices are published under one `questions` write guard.
#[derive(Default)]
pub struct MemoryStore {
    channels: RwLock<Vec<Channel>>,
    questions: RwLock<Vec<QuestionEntry>>,
    choices: DashMap<ChoiceId, Choice>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read_channels(&self) -> RwLockReadGuard<'_, Vec<Channel>> {
        match self.channels.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write_channels(&self) -> RwLockWriteGuard<'_, Vec<Channel>> {
        match self.channels.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn read_questions(&self) -> RwLockReadGuard<'_, Vec<QuestionEntry>> {
        match self.questions.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write_questions(&self) -> RwLockWriteGuard<'_, Vec<QuestionEntry>> {
        match self.questions.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn materialize(&self, entry: &QuestionEntry) -> Question {
        let choices = entry
            .choice_ids
            .iter()
            .filter_map(|id| self.choices.get(id).map(|c| c.value().clone()))
            .collect();
        Question {
            id: entry.id,
            channel_id: entry.channel_id,
            text: entry.text.clone(),
            choices,
            created_at: entry.created_at,
        }
    }

    fn channel_known(&self, id: ChannelId) -> bool {
        self.read_channels().iter().any(|c| c.id == id)
    }

    fn build_choices(question_id: QuestionId, offset: i64, drafts: &[ChoiceDraft]) -> Vec<Choice> {
        drafts
            .iter()
            .enumerate()
            .map(|(i, draft)| Choice {
                id: draft.id,
                question_id,
                text: draft.text.clone(),
                position: offset + i as i64,
                votes: 0,
            })
            .collect()
    }

    fn new_channel(id: ChannelId, name: &str) -> Channel {
        Channel {
            id,
            name: name.to_string(),
            created_at: Utc::now(),
        }
    }
}

#[async_trait]
impl AtomicCounterStore for MemoryStore {
    async fn increment_and_get(&self, id: ChoiceId) -> Result<i64, CoreError> {
        let mut choice = self.choices.get_mut(&id).ok_or(CoreError::NotFound)?;
        choice.votes = choice.votes.saturating_add(1);
        Ok(choice.votes)
    }
}

#[async_trait]
impl PollStore for MemoryStore {
    async fn list_channels(&self) -> Result<Vec<Channel>, CoreError> {
        Ok(self.read_channels().clone())
    }

    async fn get_channel(&self, id: ChannelId) -> Result<Option<Channel>, CoreError> {
        Ok(self.read_channels().iter().find(|c| c.id == id).cloned())
    }

    async fn insert_channel(&self, id: ChannelId, name: &str) -> Result<Channel, CoreError> {
        let channel = Self::new_channel(id, name);
        self.write_channels().push(channel.clone());
        Ok(channel)
    }

    async fn insert_channel_if_name_free(
        &self,
        id: ChannelId,
        name: &str,
    ) -> Result<Option<Channel>, CoreError> {
        let mut channels = self.write_channels();
        if channels.iter().any(|c| c.name == name) {
            return Ok(None);
        }
        let channel = Self::new_channel(id, name);
        channels.push(channel.clone());
        Ok(Some(channel))
    }

    async fn list_questions(&self, channel_id: ChannelId) -> Result<Vec<Question>, CoreError> {
        let questions = self.read_questions();
        Ok(questions
            .iter()
            .filter(|q| q.channel_id == channel_id)
            .map(|q| self.materialize(q))
            .collect())
    }

    async fn get_question(&self, id: QuestionId) -> Result<Option<Question>, CoreError> {
        let questions = self.read_questions();
        Ok(questions
            .iter()
            .find(|q| q.id == id)
            .map(|q| self.materialize(q)))
    }

    async fn get_choice(&self, id: ChoiceId) -> Result<Option<Choice>, CoreError> {
        Ok(self.choices.get(&id).map(|c| c.value().clone()))
    }

    async fn insert_question(
        &self,
        id: QuestionId,
        channel_id: ChannelId,
        text: &str,
    ) -> Result<Question, CoreError> {
        // Mirror the referential constraint a relational backend enforces.
        if !self.channel_known(channel_id) {
            return Err(CoreError::NotFound);
        }
        let entry = QuestionEntry {
            id,
            channel_id,
            text: text.to_string(),
            created_at: Utc::now(),
            choice_ids: Vec::new(),
        };
        let question = self.materialize(&entry);
        self.write_questions().push(entry);
        Ok(question)
    }

    async fn insert_choices(
        &self,
        question_id: QuestionId,
        choices: &[ChoiceDraft],
    ) -> Result<Vec<Choice>, CoreError> {
        let mut questions = self.write_questions();
        let entry = questions
            .iter_mut()
            .find(|q| q.id == question_id)
            .ok_or(CoreError::NotFound)?;

        let offset = entry.choice_ids.len() as i64;
        let inserted = Self::build_choices(question_id, offset, choices);

        for choice in &inserted {
            entry.choice_ids.push(choice.id);
            self.choices.insert(choice.id, choice.clone());
        }
        Ok(inserted)
    }

    async fn delete_question(&self, id: QuestionId) -> Result<(), CoreError> {
        let mut questions = self.write_questions();
        if let Some(index) = questions.iter().position(|q| q.id == id) {
            let entry = questions.remove(index);
            for choice_id in entry.choice_ids {
                self.choices.remove(&choice_id);
            }
        }
        Ok(())
    }

    async fn create_question(&self, draft: &QuestionDraft) -> Result<Question, CoreError> {
        if !self.channel_known(draft.channel_id) {
            return Err(CoreError::NotFound);
        }

        let mut questions = self.write_questions();
        let choices = Self::build_choices(draft.id, 0, &draft.choices);
        for choice in &choices {
            self.choices.insert(choice.id, choice.clone());
        }
        let entry = QuestionEntry {
            id: draft.id,
            channel_id: draft.channel_id,
            text: draft.text.clone(),
            created_at: Utc::now(),
            choice_ids: choices.iter().map(|c| c.id).collect(),
        };
        let question = Question {
            id: entry.id,
            channel_id: entry.channel_id,
            text: entry.text.clone(),
            choices,
            created_at: entry.created_at,
        };
        questions.push(entry);
        Ok(question)
    }
}
