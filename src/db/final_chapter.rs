use super::{DBClient, DbResult};
use crate::models::FinalChapter;
use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
pub trait FinalChapterExt {
    async fn get_final_chapter_for_chapter(
        &self,
        chapter_id: Uuid,
    ) -> DbResult<Option<FinalChapter>>;

    async fn get_final_chapters_for_chapters(
        &self,
        chapter_ids: &[Uuid],
    ) -> DbResult<Vec<FinalChapter>>;

    /// Create the chapter's final text, or overwrite it and clear any approval
    async fn upsert_final_chapter(
        &self,
        chapter_id: Uuid,
        content: &str,
        word_count: i32,
    ) -> DbResult<FinalChapter>;

    async fn approve_final_chapter(
        &self,
        final_chapter_id: Uuid,
        approved_by: Uuid,
    ) -> DbResult<FinalChapter>;
}

const FINAL_COLUMNS: &str = "id, chapter_id, content, approved, approved_by, approved_at, word_count, created_at, updated_at";

#[async_trait]
impl FinalChapterExt for DBClient {
    async fn get_final_chapter_for_chapter(
        &self,
        chapter_id: Uuid,
    ) -> DbResult<Option<FinalChapter>> {
        let final_chapter = sqlx::query_as::<_, FinalChapter>(&format!(
            "SELECT {FINAL_COLUMNS} FROM final_chapters WHERE chapter_id = $1"
        ))
        .bind(chapter_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(final_chapter)
    }

    async fn get_final_chapters_for_chapters(
        &self,
        chapter_ids: &[Uuid],
    ) -> DbResult<Vec<FinalChapter>> {
        let final_chapters = sqlx::query_as::<_, FinalChapter>(&format!(
            "SELECT {FINAL_COLUMNS} FROM final_chapters WHERE chapter_id = ANY($1)"
        ))
        .bind(chapter_ids.to_vec())
        .fetch_all(&self.pool)
        .await?;

        Ok(final_chapters)
    }

    async fn upsert_final_chapter(
        &self,
        chapter_id: Uuid,
        content: &str,
        word_count: i32,
    ) -> DbResult<FinalChapter> {
        // chapter_id is UNIQUE, so the conflict target keeps one row per chapter
        let query = format!(
            r#"
            INSERT INTO final_chapters (chapter_id, content, word_count, approved)
            VALUES ($1, $2, $3, FALSE)
            ON CONFLICT (chapter_id) DO UPDATE SET
                content = EXCLUDED.content,
                word_count = EXCLUDED.word_count,
                approved = FALSE,
                approved_by = NULL,
                approved_at = NULL,
                updated_at = NOW()
            RETURNING {FINAL_COLUMNS}
            "#
        );

        let final_chapter = sqlx::query_as::<_, FinalChapter>(&query)
            .bind(chapter_id)
            .bind(content)
            .bind(word_count)
            .fetch_one(&self.pool)
            .await?;

        Ok(final_chapter)
    }

    async fn approve_final_chapter(
        &self,
        final_chapter_id: Uuid,
        approved_by: Uuid,
    ) -> DbResult<FinalChapter> {
        let query = format!(
            r#"
            UPDATE final_chapters
            SET approved = TRUE, approved_by = $2, approved_at = NOW(), updated_at = NOW()
            WHERE id = $1
            RETURNING {FINAL_COLUMNS}
            "#
        );

        let final_chapter = sqlx::query_as::<_, FinalChapter>(&query)
            .bind(final_chapter_id)
            .bind(approved_by)
            .fetch_one(&self.pool)
            .await?;

        Ok(final_chapter)
    }
}
