use pollbox_models::{ChannelId, ChoiceId, Question, QuestionId};

use crate::directory;
use crate::error::CoreError;
use crate::store::{ChoiceDraft, PollStore, QuestionDraft};
use crate::validation;
use crate::PollSettings;

/// Validate raw input into a draft. No store access happens here.
pub fn draft_question<S: AsRef<str>>(
    settings: &PollSettings,
    channel_id: ChannelId,
    text: &str,
    choice_texts: &[S],
) -> Result<QuestionDraft, CoreError> {
    let text = validation::required_text("question", text, settings.max_question_len)?;
    let choices = validation::choice_texts(
        choice_texts,
        settings.max_choice_len,
        settings.max_choices,
    )?
    .into_iter()
    .map(|text| ChoiceDraft {
        id: ChoiceId::new(),
        text,
    })
    .collect();

    Ok(QuestionDraft {
        id: QuestionId::new(),
        channel_id,
        text,
        choices,
    })
}

/// Questions in a channel with their choices, oldest first.
pub async fn list_questions(
    store: &dyn PollStore,
    settings: &PollSettings,
    channel_id: ChannelId,
) -> Result<Vec<Question>, CoreError> {
    if !directory::check_channel_scope(store, settings, channel_id).await? {
        return Ok(Vec::new());
    }
    store.list_questions(channel_id).await
}

pub async fn get_question(store: &dyn PollStore, id: QuestionId) -> Result<Question, CoreError> {
    store.get_question(id).await?.ok_or(CoreError::NotFound)
}

/// Post a question with its choices into a channel.
///
/// Input is validated before anything is written. Blank choices are dropped;
/// at least two must remain.
pub async fn create_question<S: AsRef<str>>(
    store: &dyn PollStore,
    settings: &PollSettings,
    channel_id: ChannelId,
    text: &str,
    choice_texts: &[S],
) -> Result<Question, CoreError> {
    let draft = draft_question(settings, channel_id, text, choice_texts)?;
    if settings.require_existing_channel {
        directory::check_channel_scope(store, settings, channel_id).await?;
    }

    let question = store.create_question(&draft).await?;
    tracing::debug!(
        question_id = %question.id,
        channel_id = %channel_id,
        choices = question.choices.len(),
        "question created"
    );
    Ok(question)
}
