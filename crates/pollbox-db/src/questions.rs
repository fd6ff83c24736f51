use crate::choices::{self, ChoiceRow, NewChoice};
use crate::{id_from_row, DbError, DbPool};
use chrono::{DateTime, Utc};
use pollbox_models::{ChannelId, QuestionId};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

#[derive(Debug, Clone)]
pub struct QuestionRow {
    pub id: QuestionId,
    pub channel_id: ChannelId,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, SqliteRow> for QuestionRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: id_from_row(row, "id")?,
            channel_id: id_from_row(row, "channel_id")?,
            text: row.try_get("text")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

async fn insert_question_on(
    conn: &mut SqliteConnection,
    id: QuestionId,
    channel_id: ChannelId,
    text: &str,
) -> Result<QuestionRow, DbError> {
    let row = sqlx::query_as::<_, QuestionRow>(
        "INSERT INTO questions (id, channel_id, text, created_at)
         VALUES (?1, ?2, ?3, ?4)
         RETURNING id, channel_id, text, created_at",
    )
    .bind(id.to_string())
    .bind(channel_id.to_string())
    .bind(text)
    .bind(Utc::now())
    .fetch_one(&mut *conn)
    .await?;
    Ok(row)
}

/// Insert a bare question row. Callers are responsible for attaching
/// choices; prefer [`create_question_with_choices`].
pub async fn insert_question(
    pool: &DbPool,
    id: QuestionId,
    channel_id: ChannelId,
    text: &str,
) -> Result<QuestionRow, DbError> {
    let mut conn = pool.acquire().await?;
    insert_question_on(&mut conn, id, channel_id, text).await
}

/// Insert a question and all of its choices in one transaction.
/// Either both land or neither does.
pub async fn create_question_with_choices(
    pool: &DbPool,
    id: QuestionId,
    channel_id: ChannelId,
    text: &str,
    new_choices: &[NewChoice<'_>],
) -> Result<(QuestionRow, Vec<ChoiceRow>), DbError> {
    let mut tx = pool.begin().await?;
    let question = insert_question_on(&mut tx, id, channel_id, text).await?;
    let rows = choices::insert_choices_on(&mut tx, id, new_choices).await?;
    tx.commit().await?;
    Ok((question, rows))
}

/// Delete a question; its choices go with it. Returns whether a row was removed.
pub async fn delete_question(pool: &DbPool, id: QuestionId) -> Result<bool, DbError> {
    let result = sqlx::query("DELETE FROM questions WHERE id = ?1")
        .bind(id.to_string())
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn get_question(pool: &DbPool, id: QuestionId) -> Result<Option<QuestionRow>, DbError> {
    let row = sqlx::query_as::<_, QuestionRow>(
        "SELECT id, channel_id, text, created_at FROM questions WHERE id = ?1",
    )
    .bind(id.to_string())
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Questions of a channel in creation order.
pub async fn get_channel_questions(
    pool: &DbPool,
    channel_id: ChannelId,
) -> Result<Vec<QuestionRow>, DbError> {
    let rows = sqlx::query_as::<_, QuestionRow>(
        "SELECT id, channel_id, text, created_at
         FROM questions
         WHERE channel_id = ?1
         ORDER BY rowid ASC",
    )
    .bind(channel_id.to_string())
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{channels, test_pool};
    use pollbox_models::ChoiceId;

    async fn setup_channel(pool: &DbPool) -> ChannelId {
        let id = ChannelId::new();
        channels::create_channel(pool, id, "general").await.unwrap();
        id
    }

    #[tokio::test]
    async fn test_create_question_with_choices() {
        let pool = test_pool().await;
        let channel_id = setup_channel(&pool).await;
        let id = QuestionId::new();
        let (question, rows) = create_question_with_choices(
            &pool,
            id,
            channel_id,
            "Pizza or Tacos?",
            &[
                NewChoice { id: ChoiceId::new(), text: "Pizza" },
                NewChoice { id: ChoiceId::new(), text: "Tacos" },
            ],
        )
        .await
        .unwrap();
        assert_eq!(question.id, id);
        assert_eq!(question.channel_id, channel_id);
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.question_id == id && r.votes == 0));
    }

    #[tokio::test]
    async fn test_create_question_rolls_back_when_choices_fail() {
        let pool = test_pool().await;
        let channel_id = setup_channel(&pool).await;
        let id = QuestionId::new();
        // A blank choice trips the CHECK constraint after the question row is written.
        let err = create_question_with_choices(
            &pool,
            id,
            channel_id,
            "Q1",
            &[
                NewChoice { id: ChoiceId::new(), text: "A" },
                NewChoice { id: ChoiceId::new(), text: "  " },
            ],
        )
        .await
        .unwrap_err();
        assert!(matches!(err, DbError::Constraint(_)));
        assert!(get_question(&pool, id).await.unwrap().is_none());
        assert!(get_channel_questions(&pool, channel_id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_create_question_in_missing_channel() {
        let pool = test_pool().await;
        let err = create_question_with_choices(
            &pool,
            QuestionId::new(),
            ChannelId::new(),
            "Q1",
            &[
                NewChoice { id: ChoiceId::new(), text: "A" },
                NewChoice { id: ChoiceId::new(), text: "B" },
            ],
        )
        .await
        .unwrap_err();
        assert!(matches!(err, DbError::ForeignKey));
    }

    #[tokio::test]
    async fn test_delete_question_cascades_to_choices() {
        let pool = test_pool().await;
        let channel_id = setup_channel(&pool).await;
        let id = QuestionId::new();
        let choice_id = ChoiceId::new();
        create_question_with_choices(
            &pool,
            id,
            channel_id,
            "Q1",
            &[
                NewChoice { id: choice_id, text: "A" },
                NewChoice { id: ChoiceId::new(), text: "B" },
            ],
        )
        .await
        .unwrap();

        assert!(delete_question(&pool, id).await.unwrap());
        assert!(get_question(&pool, id).await.unwrap().is_none());
        assert!(choices::get_choice(&pool, choice_id)
            .await
            .unwrap()
            .is_none());
        assert!(!delete_question(&pool, id).await.unwrap());
    }

    #[tokio::test]
    async fn test_get_channel_questions_scoped_and_ordered() {
        let pool = test_pool().await;
        let channel_id = setup_channel(&pool).await;
        let other = setup_channel(&pool).await;
        insert_question(&pool, QuestionId::new(), channel_id, "one")
            .await
            .unwrap();
        insert_question(&pool, QuestionId::new(), other, "elsewhere")
            .await
            .unwrap();
        insert_question(&pool, QuestionId::new(), channel_id, "two")
            .await
            .unwrap();

        let texts: Vec<String> = get_channel_questions(&pool, channel_id)
            .await
            .unwrap()
            .into_iter()
            .map(|q| q.text)
            .collect();
        assert_eq!(texts, vec!["one", "two"]);
    }
}
