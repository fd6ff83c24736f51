use async_trait::async_trait;
use pollbox_db::channels::ChannelRow;
use pollbox_db::choices::{ChoiceRow, NewChoice};
use pollbox_db::questions::QuestionRow;
use pollbox_db::{DbError, DbPool};
use pollbox_models::{Channel, ChannelId, Choice, ChoiceId, Question, QuestionId};
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use crate::error::CoreError;
use crate::store::{AtomicCounterStore, ChoiceDraft, PollStore, QuestionDraft};

pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(5);

/// [`PollStore`] over the SQLite pool. Every call is bounded by `op_timeout`.
#[derive(Clone)]
pub struct SqliteStore {
    pool: DbPool,
    op_timeout: Duration,
}

impl SqliteStore {
    pub fn new(pool: DbPool) -> Self {
        Self::with_timeout(pool, DEFAULT_OPERATION_TIMEOUT)
    }

    pub fn with_timeout(pool: DbPool, op_timeout: Duration) -> Self {
        Self { pool, op_timeout }
    }

    async fn timed<T, F>(&self, op: &'static str, fut: F) -> Result<T, CoreError>
    where
        F: Future<Output = Result<T, DbError>>,
    {
        match tokio::time::timeout(self.op_timeout, fut).await {
            Ok(result) => result.map_err(CoreError::from),
            Err(_) => {
                tracing::warn!(
                    op,
                    timeout_ms = self.op_timeout.as_millis() as u64,
                    "store operation timed out"
                );
                Err(CoreError::StoreUnavailable(format!(
                    "{op} timed out after {}ms",
                    self.op_timeout.as_millis()
                )))
            }
        }
    }
}

fn channel_from_row(row: ChannelRow) -> Channel {
    Channel {
        id: row.id,
        name: row.name,
        created_at: row.created_at,
    }
}

fn choice_from_row(row: ChoiceRow) -> Choice {
    Choice {
        id: row.id,
        question_id: row.question_id,
        text: row.text,
        position: row.position,
        votes: row.votes,
    }
}

fn question_from_row(row: QuestionRow, choices: Vec<Choice>) -> Question {
    Question {
        id: row.id,
        channel_id: row.channel_id,
        text: row.text,
        choices,
        created_at: row.created_at,
    }
}

async fn load_channel_questions(
    pool: &DbPool,
    channel_id: ChannelId,
) -> Result<(Vec<QuestionRow>, Vec<ChoiceRow>), DbError> {
    let rows = pollbox_db::questions::get_channel_questions(pool, channel_id).await?;
    let choice_rows = pollbox_db::choices::get_channel_choices(pool, channel_id).await?;
    Ok((rows, choice_rows))
}

async fn load_question(
    pool: &DbPool,
    id: QuestionId,
) -> Result<Option<(QuestionRow, Vec<ChoiceRow>)>, DbError> {
    let Some(row) = pollbox_db::questions::get_question(pool, id).await? else {
        return Ok(None);
    };
    let choices = pollbox_db::choices::get_question_choices(pool, id).await?;
    Ok(Some((row, choices)))
}

fn new_choices(choices: &[ChoiceDraft]) -> Vec<NewChoice<'_>> {
    choices
        .iter()
        .map(|c| NewChoice {
            id: c.id,
            text: &c.text,
        })
        .collect()
}

#[async_trait]
impl AtomicCounterStore for SqliteStore {
    async fn increment_and_get(&self, id: ChoiceId) -> Result<i64, CoreError> {
        self.timed(
            "increment_vote",
            pollbox_db::choices::increment_votes(&self.pool, id),
        )
        .await?
        .ok_or(CoreError::NotFound)
    }
}

#[async_trait]
impl PollStore for SqliteStore {
    async fn list_channels(&self) -> Result<Vec<Channel>, CoreError> {
        let rows = self
            .timed("list_channels", pollbox_db::channels::list_channels(&self.pool))
            .await?;
        Ok(rows.into_iter().map(channel_from_row).collect())
    }

    async fn get_channel(&self, id: ChannelId) -> Result<Option<Channel>, CoreError> {
        let row = self
            .timed("get_channel", pollbox_db::channels::get_channel(&self.pool, id))
            .await?;
        Ok(row.map(channel_from_row))
    }

    async fn insert_channel(&self, id: ChannelId, name: &str) -> Result<Channel, CoreError> {
        let row = self
            .timed(
                "insert_channel",
                pollbox_db::channels::create_channel(&self.pool, id, name),
            )
            .await?;
        Ok(channel_from_row(row))
    }

    async fn insert_channel_if_name_free(
        &self,
        id: ChannelId,
        name: &str,
    ) -> Result<Option<Channel>, CoreError> {
        let row = self
            .timed(
                "insert_channel",
                pollbox_db::channels::create_channel_if_name_free(&self.pool, id, name),
            )
            .await?;
        Ok(row.map(channel_from_row))
    }

    async fn list_questions(&self, channel_id: ChannelId) -> Result<Vec<Question>, CoreError> {
        let (rows, choice_rows) = self
            .timed(
                "list_questions",
                load_channel_questions(&self.pool, channel_id),
            )
            .await?;

        let mut by_question: HashMap<QuestionId, Vec<Choice>> = HashMap::new();
        for row in choice_rows {
            by_question
                .entry(row.question_id)
                .or_default()
                .push(choice_from_row(row));
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let choices = by_question.remove(&row.id).unwrap_or_default();
                question_from_row(row, choices)
            })
            .collect())
    }

    async fn get_question(&self, id: QuestionId) -> Result<Option<Question>, CoreError> {
        let loaded = self
            .timed("get_question", load_question(&self.pool, id))
            .await?;
        Ok(loaded.map(|(row, choices)| {
            question_from_row(row, choices.into_iter().map(choice_from_row).collect())
        }))
    }

    async fn get_choice(&self, id: ChoiceId) -> Result<Option<Choice>, CoreError> {
        let row = self
            .timed("get_choice", pollbox_db::choices::get_choice(&self.pool, id))
            .await?;
        Ok(row.map(choice_from_row))
    }

    async fn insert_question(
        &self,
        id: QuestionId,
        channel_id: ChannelId,
        text: &str,
    ) -> Result<Question, CoreError> {
        let row = self
            .timed(
                "insert_question",
                pollbox_db::questions::insert_question(&self.pool, id, channel_id, text),
            )
            .await?;
        Ok(question_from_row(row, Vec::new()))
    }

    async fn insert_choices(
        &self,
        question_id: QuestionId,
        choices: &[ChoiceDraft],
    ) -> Result<Vec<Choice>, CoreError> {
        let drafts = new_choices(choices);
        let rows = self
            .timed(
                "insert_choices",
                pollbox_db::choices::insert_choices(&self.pool, question_id, &drafts),
            )
            .await?;
        Ok(rows.into_iter().map(choice_from_row).collect())
    }

    async fn delete_question(&self, id: QuestionId) -> Result<(), CoreError> {
        self.timed(
            "delete_question",
            pollbox_db::questions::delete_question(&self.pool, id),
        )
        .await?;
        Ok(())
    }

    /// One transaction for the question and its choices.
    async fn create_question(&self, draft: &QuestionDraft) -> Result<Question, CoreError> {
        let drafts = new_choices(&draft.choices);
        let (row, choice_rows) = self
            .timed(
                "create_question",
                pollbox_db::questions::create_question_with_choices(
                    &self.pool,
                    draft.id,
                    draft.channel_id,
                    &draft.text,
                    &drafts,
                ),
            )
            .await?;
        Ok(question_from_row(
            row,
            choice_rows.into_iter().map(choice_from_row).collect(),
        ))
    }
}
