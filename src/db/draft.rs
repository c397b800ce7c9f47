use super::{DBClient, DbError, DbResult};
use crate::dtos::NewDraft;
use crate::models::AiDraft;
use async_trait::async_trait;
use uuid::Uuid;

/// Draft filters; `project_id` is resolved through the owning chapter
#[derive(Debug, Default, Clone)]
pub struct DraftFilter {
    pub chapter_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
}

#[async_trait]
pub trait DraftExt {
    /// Newest first
    async fn get_drafts(&self, filter: &DraftFilter, limit: i64) -> DbResult<Vec<AiDraft>>;

    /// One chapter's drafts, highest pass first
    async fn get_chapter_drafts(&self, chapter_id: Uuid) -> DbResult<Vec<AiDraft>>;

    async fn get_drafts_for_chapters(&self, chapter_ids: &[Uuid]) -> DbResult<Vec<AiDraft>>;

    async fn get_draft(&self, draft_id: Uuid) -> DbResult<Option<AiDraft>>;

    /// The draft with the highest pass number
    async fn get_latest_draft(&self, chapter_id: Uuid) -> DbResult<Option<AiDraft>>;

    /// Highest pass number recorded for the chapter, `None` when it has no drafts
    async fn get_max_pass_number(&self, chapter_id: Uuid) -> DbResult<Option<i32>>;

    async fn create_draft(&self, draft: &NewDraft) -> DbResult<AiDraft>;

    async fn delete_draft(&self, draft_id: Uuid) -> DbResult<()>;
}

const DRAFT_COLUMNS: &str = "d.id, d.chapter_id, d.content, d.model_used, d.pass_number, d.prompt_tokens, d.completion_tokens, d.total_cost, d.created_at";

#[async_trait]
impl DraftExt for DBClient {
    async fn get_drafts(&self, filter: &DraftFilter, limit: i64) -> DbResult<Vec<AiDraft>> {
        let query = format!(
            r#"
            SELECT {DRAFT_COLUMNS}
            FROM ai_drafts d
            INNER JOIN chapters c ON d.chapter_id = c.id
            WHERE ($1::uuid IS NULL OR d.chapter_id = $1)
              AND ($2::uuid IS NULL OR c.project_id = $2)
            ORDER BY d.created_at DESC
            LIMIT $3
            "#
        );

        let drafts = sqlx::query_as::<_, AiDraft>(&query)
            .bind(filter.chapter_id)
            .bind(filter.project_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(drafts)
    }

    async fn get_chapter_drafts(&self, chapter_id: Uuid) -> DbResult<Vec<AiDraft>> {
        let drafts = sqlx::query_as::<_, AiDraft>(&format!(
            "SELECT {DRAFT_COLUMNS} FROM ai_drafts d WHERE d.chapter_id = $1 ORDER BY d.pass_number DESC"
        ))
        .bind(chapter_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(drafts)
    }

    async fn get_drafts_for_chapters(&self, chapter_ids: &[Uuid]) -> DbResult<Vec<AiDraft>> {
        let drafts = sqlx::query_as::<_, AiDraft>(&format!(
            "SELECT {DRAFT_COLUMNS} FROM ai_drafts d WHERE d.chapter_id = ANY($1) ORDER BY d.pass_number ASC"
        ))
        .bind(chapter_ids.to_vec())
        .fetch_all(&self.pool)
        .await?;

        Ok(drafts)
    }

    async fn get_draft(&self, draft_id: Uuid) -> DbResult<Option<AiDraft>> {
        let draft = sqlx::query_as::<_, AiDraft>(&format!(
            "SELECT {DRAFT_COLUMNS} FROM ai_drafts d WHERE d.id = $1"
        ))
        .bind(draft_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(draft)
    }

    async fn get_latest_draft(&self, chapter_id: Uuid) -> DbResult<Option<AiDraft>> {
        let draft = sqlx::query_as::<_, AiDraft>(&format!(
            "SELECT {DRAFT_COLUMNS} FROM ai_drafts d WHERE d.chapter_id = $1 ORDER BY d.pass_number DESC LIMIT 1"
        ))
        .bind(chapter_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(draft)
    }

    async fn get_max_pass_number(&self, chapter_id: Uuid) -> DbResult<Option<i32>> {
        let max = sqlx::query_scalar::<_, Option<i32>>(
            "SELECT MAX(pass_number) FROM ai_drafts WHERE chapter_id = $1",
        )
        .bind(chapter_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(max)
    }

    async fn create_draft(&self, draft: &NewDraft) -> DbResult<AiDraft> {
        let query = format!(
            r#"
            INSERT INTO ai_drafts AS d
                (chapter_id, content, model_used, pass_number, prompt_tokens, completion_tokens, total_cost)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {DRAFT_COLUMNS}
            "#
        );

        let created = sqlx::query_as::<_, AiDraft>(&query)
            .bind(draft.chapter_id)
            .bind(&draft.content)
            .bind(&draft.model_used)
            .bind(draft.pass_number)
            .bind(draft.prompt_tokens)
            .bind(draft.completion_tokens)
            .bind(draft.total_cost)
            .fetch_one(&self.pool)
            .await?;

        Ok(created)
    }

    async fn delete_draft(&self, draft_id: Uuid) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM ai_drafts WHERE id = $1")
            .bind(draft_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }

        Ok(())
    }
}
