use sqlx::{Pool, Postgres};

mod user;
pub use user::UserExt;

mod project;
pub use project::{ProjectExt, ProjectFilter};

mod chapter;
pub use chapter::ChapterExt;

mod draft;
pub use draft::{DraftExt, DraftFilter};

mod final_chapter;
pub use final_chapter::FinalChapterExt;

mod feedback;
pub use feedback::FeedbackExt;

/// Store-level failure, classified by the code Postgres reports.
///
/// Handlers match on `NotFound` and `UniqueViolation` to answer 404 / 409; every
/// other variant becomes a generic 500.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("no row found")]
    NotFound,

    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("foreign key violated: {0}")]
    ForeignKeyViolation(String),

    #[error(transparent)]
    Sqlx(sqlx::Error),
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound,
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                DbError::UniqueViolation(db_err.message().to_string())
            }
            sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                DbError::ForeignKeyViolation(db_err.message().to_string())
            }
            other => DbError::Sqlx(other),
        }
    }
}

pub type DbResult<T> = Result<T, DbError>;

/// Everything a request handler needs from persistence.
///
/// `AppState` holds an `Arc<dyn Store>` so handlers never see a concrete
/// backend; `DBClient` is the Postgres implementation.
pub trait Store:
    UserExt + ProjectExt + ChapterExt + DraftExt + FinalChapterExt + FeedbackExt + Send + Sync
{
}

impl<T> Store for T where
    T: UserExt + ProjectExt + ChapterExt + DraftExt + FinalChapterExt + FeedbackExt + Send + Sync
{
}

#[derive(Debug, Clone)]
pub struct DBClient {
    pool: Pool<Postgres>,
}

impl DBClient {
    pub fn new(pool: Pool<Postgres>) -> Self {
        DBClient { pool }
    }
}
