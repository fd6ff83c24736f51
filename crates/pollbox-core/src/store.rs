//! Storage capabilities the poll components are written against.
//!
//! A backend implements [`PollStore`] for rows and [`AtomicCounterStore`] for
//! vote counters. Backends with multi-row transactions override
//! [`PollStore::create_question`]; the default runs a compensating saga.

use async_trait::async_trait;
use pollbox_models::{Channel, ChannelId, Choice, ChoiceId, Question, QuestionId};

use crate::error::CoreError;

/// A validated question ready to be persisted with its choices.
#[derive(Debug, Clone)]
pub struct QuestionDraft {
    pub id: QuestionId,
    pub channel_id: ChannelId,
    pub text: String,
    pub choices: Vec<ChoiceDraft>,
}

#[derive(Debug, Clone)]
pub struct ChoiceDraft {
    pub id: ChoiceId,
    pub text: String,
}

/// Atomic counter primitive backing the vote ledger.
///
/// Implementations must apply each increment in full before the next one is
/// observed; a read-then-write from the caller is not acceptable.
#[async_trait]
pub trait AtomicCounterStore: Send + Sync {
    /// Add one to the counter of `id` and return the new value.
    /// Fails with [`CoreError::NotFound`] and changes nothing if `id` is unknown.
    async fn increment_and_get(&self, id: ChoiceId) -> Result<i64, CoreError>;
}

#[async_trait]
pub trait PollStore: AtomicCounterStore {
    async fn list_channels(&self) -> Result<Vec<Channel>, CoreError>;

    async fn get_channel(&self, id: ChannelId) -> Result<Option<Channel>, CoreError>;

    async fn insert_channel(&self, id: ChannelId, name: &str) -> Result<Channel, CoreError>;

    /// Insert unless a channel already has `name`; `None` means it was taken.
    async fn insert_channel_if_name_free(
        &self,
        id: ChannelId,
        name: &str,
    ) -> Result<Option<Channel>, CoreError>;

    /// Questions of a channel in creation order with their choices attached.
    async fn list_questions(&self, channel_id: ChannelId) -> Result<Vec<Question>, CoreError>;

    async fn get_question(&self, id: QuestionId) -> Result<Option<Question>, CoreError>;

    async fn get_choice(&self, id: ChoiceId) -> Result<Option<Choice>, CoreError>;

    /// Insert the question row alone. The returned question has no choices.
    async fn insert_question(
        &self,
        id: QuestionId,
        channel_id: ChannelId,
        text: &str,
    ) -> Result<Question, CoreError>;

    async fn insert_choices(
        &self,
        question_id: QuestionId,
        choices: &[ChoiceDraft],
    ) -> Result<Vec<Choice>, CoreError>;

    /// Remove a question and any choices attached to it.
    async fn delete_question(&self, id: QuestionId) -> Result<(), CoreError>;

    /// Persist a question together with its choices.
    ///
    /// Question first, then choices. If the choices fail the question is
    /// deleted again and the original error returned; if that delete fails
    /// too the caller gets [`CoreError::PartialWriteFailure`].
    async fn create_question(&self, draft: &QuestionDraft) -> Result<Question, CoreError> {
        let mut question = self
            .insert_question(draft.id, draft.channel_id, &draft.text)
            .await?;

        match self.insert_choices(draft.id, &draft.choices).await {
            Ok(choices) => {
                question.choices = choices;
                Ok(question)
            }
            Err(err) => {
                tracing::warn!(
                    question_id = %draft.id,
                    error = %err,
                    "choice insert failed, removing question"
                );
                match self.delete_question(draft.id).await {
                    Ok(()) => Err(err),
                    Err(cleanup_err) => {
                        tracing::error!(
                            question_id = %draft.id,
                            error = %cleanup_err,
                            "compensating delete failed, question left without choices"
                        );
                        Err(CoreError::PartialWriteFailure {
                            question_id: draft.id,
                        })
                    }
                }
            }
        }
    }
}
