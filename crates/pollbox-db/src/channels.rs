use crate::{id_from_row, DbError, DbPool};
use chrono::{DateTime, Utc};
use pollbox_models::ChannelId;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

#[derive(Debug, Clone)]
pub struct ChannelRow {
    pub id: ChannelId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, SqliteRow> for ChannelRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: id_from_row(row, "id")?,
            name: row.try_get("name")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

pub async fn create_channel(
    pool: &DbPool,
    id: ChannelId,
    name: &str,
) -> Result<ChannelRow, DbError> {
    let row = sqlx::query_as::<_, ChannelRow>(
        "INSERT INTO channels (id, name, created_at)
         VALUES (?1, ?2, ?3)
         RETURNING id, name, created_at",
    )
    .bind(id.to_string())
    .bind(name)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// Insert a channel only when no channel with the same name exists.
/// Returns `None` when the name is already taken.
pub async fn create_channel_if_name_free(
    pool: &DbPool,
    id: ChannelId,
    name: &str,
) -> Result<Option<ChannelRow>, DbError> {
    let row = sqlx::query_as::<_, ChannelRow>(
        "INSERT INTO channels (id, name, created_at)
         SELECT ?1, ?2, ?3
         WHERE NOT EXISTS (SELECT 1 FROM channels WHERE name = ?2)
         RETURNING id, name, created_at",
    )
    .bind(id.to_string())
    .bind(name)
    .bind(Utc::now())
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn get_channel(pool: &DbPool, id: ChannelId) -> Result<Option<ChannelRow>, DbError> {
    let row = sqlx::query_as::<_, ChannelRow>(
        "SELECT id, name, created_at FROM channels WHERE id = ?1",
    )
    .bind(id.to_string())
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// All channels in creation order.
pub async fn list_channels(pool: &DbPool) -> Result<Vec<ChannelRow>, DbError> {
    let rows = sqlx::query_as::<_, ChannelRow>(
        "SELECT id, name, created_at FROM channels ORDER BY rowid ASC",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
