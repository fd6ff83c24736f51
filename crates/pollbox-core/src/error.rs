use pollbox_db::DbError;
use pollbox_models::QuestionId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("question {question_id} was persisted without its choices")]
    PartialWriteFailure { question_id: QuestionId },
}

impl From<DbError> for CoreError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound | DbError::ForeignKey => CoreError::NotFound,
            DbError::Constraint(msg) => CoreError::InvalidInput(msg),
            DbError::Unavailable(err) => CoreError::StoreUnavailable(err.to_string()),
            DbError::Sqlx(err) => {
                tracing::warn!("unclassified store error: {err}");
                CoreError::StoreUnavailable("store returned an unexpected error".to_string())
            }
        }
    }
}
