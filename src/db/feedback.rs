use super::{DBClient, DbResult};
use crate::dtos::CreateFeedbackDto;
use crate::models::Feedback;
use async_trait::async_trait;
use uuid::Uuid;

/// Feedback rows are write-once: there is no update or delete here.
#[async_trait]
pub trait FeedbackExt {
    /// A project's feedback, newest first
    async fn get_project_feedback(&self, project_id: Uuid) -> DbResult<Vec<Feedback>>;

    async fn create_feedback(
        &self,
        reader_id: Uuid,
        input: &CreateFeedbackDto,
    ) -> DbResult<Feedback>;
}

const FEEDBACK_COLUMNS: &str = "id, project_id, reader_id, chapter_id, rating, comments, feedback_type, created_at, updated_at";

#[async_trait]
impl FeedbackExt for DBClient {
    async fn get_project_feedback(&self, project_id: Uuid) -> DbResult<Vec<Feedback>> {
        let feedback = sqlx::query_as::<_, Feedback>(&format!(
            "SELECT {FEEDBACK_COLUMNS} FROM feedback WHERE project_id = $1 ORDER BY created_at DESC"
        ))
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(feedback)
    }

    async fn create_feedback(
        &self,
        reader_id: Uuid,
        input: &CreateFeedbackDto,
    ) -> DbResult<Feedback> {
        let query = format!(
            r#"
            INSERT INTO feedback (project_id, reader_id, chapter_id, rating, comments, feedback_type)
            VALUES ($1, $2, $3, $4, $5, COALESCE($6, 'general'))
            RETURNING {FEEDBACK_COLUMNS}
            "#
        );

        let feedback = sqlx::query_as::<_, Feedback>(&query)
            .bind(input.project_id)
            .bind(reader_id)
            .bind(input.chapter_id)
            .bind(input.rating)
            .bind(input.comments.as_deref())
            .bind(input.feedback_type.as_deref())
            .fetch_one(&self.pool)
            .await?;

        Ok(feedback)
    }
}
