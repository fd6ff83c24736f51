use crate::{id_from_row, DbError, DbPool};
use pollbox_models::{ChannelId, ChoiceId, QuestionId};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqliteConnection};

#[derive(Debug, Clone)]
pub struct ChoiceRow {
    pub id: ChoiceId,
    pub question_id: QuestionId,
    pub text: String,
    pub position: i64,
    pub votes: i64,
}

impl<'r> sqlx::FromRow<'r, SqliteRow> for ChoiceRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: id_from_row(row, "id")?,
            question_id: id_from_row(row, "question_id")?,
            text: row.try_get("text")?,
            position: row.try_get("position")?,
            votes: row.try_get("votes")?,
        })
    }
}

/// A choice ready to be inserted. `position` is assigned from slice order.
#[derive(Debug, Clone, Copy)]
pub struct NewChoice<'a> {
    pub id: ChoiceId,
    pub text: &'a str,
}

/// Bulk-insert choices for a question on an existing connection or transaction.
pub async fn insert_choices_on(
    conn: &mut SqliteConnection,
    question_id: QuestionId,
    choices: &[NewChoice<'_>],
) -> Result<Vec<ChoiceRow>, DbError> {
    if choices.is_empty() {
        return Ok(Vec::new());
    }

    let question_id = question_id.to_string();
    let mut builder: QueryBuilder<'_, Sqlite> =
        QueryBuilder::new("INSERT INTO choices (id, question_id, text, position, votes) ");
    builder.push_values(choices.iter().enumerate(), |mut b, (position, choice)| {
        b.push_bind(choice.id.to_string())
            .push_bind(question_id.clone())
            .push_bind(choice.text)
            .push_bind(position as i64)
            .push_bind(0_i64);
    });
    builder.push(" RETURNING id, question_id, text, position, votes");

    let mut rows = builder
        .build_query_as::<ChoiceRow>()
        .fetch_all(&mut *conn)
        .await?;
    rows.sort_by_key(|row| row.position);
    Ok(rows)
}

/// Bulk-insert choices as one statement.
pub async fn insert_choices(
    pool: &DbPool,
    question_id: QuestionId,
    choices: &[NewChoice<'_>],
) -> Result<Vec<ChoiceRow>, DbError> {
    let mut conn = pool.acquire().await?;
    insert_choices_on(&mut conn, question_id, choices).await
}

pub async fn get_choice(pool: &DbPool, id: ChoiceId) -> Result<Option<ChoiceRow>, DbError> {
    let row = sqlx::query_as::<_, ChoiceRow>(
        "SELECT id, question_id, text, position, votes FROM choices WHERE id = ?1",
    )
    .bind(id.to_string())
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn get_question_choices(
    pool: &DbPool,
    question_id: QuestionId,
) -> Result<Vec<ChoiceRow>, DbError> {
    let rows = sqlx::query_as::<_, ChoiceRow>(
        "SELECT id, question_id, text, position, votes
         FROM choices
         WHERE question_id = ?1
         ORDER BY position ASC",
    )
    .bind(question_id.to_string())
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Every choice of every question in a channel, grouped by question creation
/// order and then by position.
pub async fn get_channel_choices(
    pool: &DbPool,
    channel_id: ChannelId,
) -> Result<Vec<ChoiceRow>, DbError> {
    let rows = sqlx::query_as::<_, ChoiceRow>(
        "SELECT c.id, c.question_id, c.text, c.position, c.votes
         FROM choices c
         INNER JOIN questions q ON q.id = c.question_id
         WHERE q.channel_id = ?1
         ORDER BY q.rowid ASC, c.position ASC",
    )
    .bind(channel_id.to_string())
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Add one vote in a single statement and return the new count.
/// `None` means the choice does not exist and nothing changed.
pub async fn increment_votes(pool: &DbPool, id: ChoiceId) -> Result<Option<i64>, DbError> {
    let votes: Option<i64> = sqlx::query_scalar(
        "UPDATE choices SET votes = votes + 1 WHERE id = ?1 RETURNING votes",
    )
    .bind(id.to_string())
    .fetch_optional(pool)
    .await?;
    Ok(votes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{channels, questions, test_pool};

    async fn setup_question(pool: &DbPool) -> (ChannelId, QuestionId) {
        let channel_id = ChannelId::new();
        channels::create_channel(pool, channel_id, "general")
            .await
            .unwrap();
        let question_id = QuestionId::new();
        questions::insert_question(pool, question_id, channel_id, "Pizza or Tacos?")
            .await
            .unwrap();
        (channel_id, question_id)
    }

    #[tokio::test]
    async fn test_insert_choices_assigns_positions_and_zero_votes() {
        let pool = test_pool().await;
        let (_, question_id) = setup_question(&pool).await;
        let rows = insert_choices(
            &pool,
            question_id,
            &[
                NewChoice { id: ChoiceId::new(), text: "Pizza" },
                NewChoice { id: ChoiceId::new(), text: "Tacos" },
            ],
        )
        .await
        .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].text, "Pizza");
        assert_eq!(rows[0].position, 0);
        assert_eq!(rows[1].text, "Tacos");
        assert_eq!(rows[1].position, 1);
        assert!(rows.iter().all(|r| r.votes == 0));
    }

    #[tokio::test]
    async fn test_insert_choices_for_missing_question_fails() {
        let pool = test_pool().await;
        let err = insert_choices(
            &pool,
            QuestionId::new(),
            &[NewChoice { id: ChoiceId::new(), text: "A" }],
        )
        .await
        .unwrap_err();
        assert!(matches!(err, DbError::ForeignKey));
    }

    #[tokio::test]
    async fn test_increment_votes() {
        let pool = test_pool().await;
        let (_, question_id) = setup_question(&pool).await;
        let id = ChoiceId::new();
        insert_choices(&pool, question_id, &[NewChoice { id, text: "A" }])
            .await
            .unwrap();
        assert_eq!(increment_votes(&pool, id).await.unwrap(), Some(1));
        assert_eq!(increment_votes(&pool, id).await.unwrap(), Some(2));
        let row = get_choice(&pool, id).await.unwrap().unwrap();
        assert_eq!(row.votes, 2);
    }

    #[tokio::test]
    async fn test_increment_votes_missing_choice() {
        let pool = test_pool().await;
        let (_, question_id) = setup_question(&pool).await;
        let id = ChoiceId::new();
        insert_choices(&pool, question_id, &[NewChoice { id, text: "A" }])
            .await
            .unwrap();
        assert_eq!(increment_votes(&pool, ChoiceId::new()).await.unwrap(), None);
        assert_eq!(get_choice(&pool, id).await.unwrap().unwrap().votes, 0);
    }

    #[tokio::test]
    async fn test_get_channel_choices_orders_by_question_then_position() {
        let pool = test_pool().await;
        let (channel_id, first) = setup_question(&pool).await;
        let second = QuestionId::new();
        questions::insert_question(&pool, second, channel_id, "Second?")
            .await
            .unwrap();
        insert_choices(
            &pool,
            second,
            &[
                NewChoice { id: ChoiceId::new(), text: "x" },
                NewChoice { id: ChoiceId::new(), text: "y" },
            ],
        )
        .await
        .unwrap();
        insert_choices(
            &pool,
            first,
            &[
                NewChoice { id: ChoiceId::new(), text: "a" },
                NewChoice { id: ChoiceId::new(), text: "b" },
            ],
        )
        .await
        .unwrap();

        let texts: Vec<String> = get_channel_choices(&pool, channel_id)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.text)
            .collect();
        assert_eq!(texts, vec!["a", "b", "x", "y"]);
    }

    #[tokio::test]
    async fn test_concurrent_increments_are_not_lost() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db_url = format!(
            "sqlite://{}?mode=rwc",
            dir.path()
                .join("votes.db")
                .to_string_lossy()
                .replace('\\', "/")
        );
        let pool = crate::create_pool(&db_url, 4).await.expect("pool");
        crate::run_migrations(&pool).await.expect("migrations");
        let (_, question_id) = setup_question(&pool).await;
        let id = ChoiceId::new();
        insert_choices(&pool, question_id, &[NewChoice { id, text: "A" }])
            .await
            .unwrap();

        let mut handles = Vec::new();
        for _ in 0..50 {
            let pool = pool.clone();
            handles.push(tokio::spawn(async move {
                increment_votes(&pool, id).await.unwrap()
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(get_choice(&pool, id).await.unwrap().unwrap().votes, 50);
    }
}
