pub mod channels;
pub mod choices;
pub mod questions;

pub use sqlx;

use sqlx::error::ErrorKind;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub type DbPool = sqlx::SqlitePool;

const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Primary result codes SQLite reports while another writer holds the lock.
const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(sqlx::Error),
    #[error("database unavailable: {0}")]
    Unavailable(sqlx::Error),
    #[error("referenced row does not exist")]
    ForeignKey,
    #[error("constraint violated: {0}")]
    Constraint(String),
    #[error("not found")]
    NotFound,
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound,
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => DbError::Unavailable(err),
            sqlx::Error::Database(db_err) => classify_database_error(db_err),
            other => DbError::Sqlx(other),
        }
    }
}

fn classify_database_error(db_err: Box<dyn sqlx::error::DatabaseError>) -> DbError {
    match db_err.kind() {
        ErrorKind::ForeignKeyViolation => DbError::ForeignKey,
        ErrorKind::UniqueViolation | ErrorKind::CheckViolation | ErrorKind::NotNullViolation => {
            DbError::Constraint(db_err.message().to_string())
        }
        _ if is_lock_contention(db_err.code().as_deref()) => {
            DbError::Unavailable(sqlx::Error::Database(db_err))
        }
        _ => DbError::Sqlx(sqlx::Error::Database(db_err)),
    }
}

fn is_lock_contention(code: Option<&str>) -> bool {
    // Extended codes keep the primary code in the low byte.
    code.and_then(|c| c.parse::<i32>().ok())
        .map(|c| matches!(c & 0xff, SQLITE_BUSY | SQLITE_LOCKED))
        .unwrap_or(false)
}

pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<DbPool, sqlx::Error> {
    create_pool_with_acquire_timeout(database_url, max_connections, DEFAULT_ACQUIRE_TIMEOUT).await
}

pub async fn create_pool_with_acquire_timeout(
    database_url: &str,
    max_connections: u32,
    acquire_timeout: Duration,
) -> Result<DbPool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .journal_mode(SqliteJournalMode::Wal)
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(acquire_timeout);

    SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .acquire_timeout(acquire_timeout)
        .connect_with(options)
        .await
}

pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("migrations: applied successfully");
    Ok(())
}

/// Decode a TEXT id column into one of the uuid-backed id newtypes.
pub(crate) fn id_from_row<T>(row: &SqliteRow, column: &str) -> Result<T, sqlx::Error>
where
    T: FromStr<Err = uuid::Error>,
{
    let raw: String = row.try_get(column)?;
    raw.parse().map_err(|e: uuid::Error| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

#[cfg(test)]
pub(crate) async fn test_pool() -> DbPool {
    let pool = create_pool("sqlite::memory:", 1).await.expect("pool");
    run_migrations(&pool).await.expect("migrations");
    pool
}
