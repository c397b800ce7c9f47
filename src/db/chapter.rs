use super::{DBClient, DbError, DbResult};
use crate::dtos::{CreateChapterDto, UpdateChapterDto};
use crate::models::{Chapter, ChapterStatus};
use async_trait::async_trait;
use uuid::Uuid;

/// Chapter database operations trait
#[async_trait]
pub trait ChapterExt {
    /// A project's chapters in reading order (chapter_number ascending)
    async fn get_chapters(
        &self,
        project_id: Uuid,
        status: Option<ChapterStatus>,
    ) -> DbResult<Vec<Chapter>>;

    async fn get_chapter(&self, chapter_id: Uuid) -> DbResult<Option<Chapter>>;

    async fn get_chapters_by_ids(&self, chapter_ids: &[Uuid]) -> DbResult<Vec<Chapter>>;

    async fn get_chapter_by_number(
        &self,
        project_id: Uuid,
        chapter_number: i32,
    ) -> DbResult<Option<Chapter>>;

    /// Insert one chapter. A taken number surfaces as `UniqueViolation`
    async fn create_chapter(&self, input: &CreateChapterDto) -> DbResult<Chapter>;

    /// Insert chapters 1..=count titled "Chapter {n}" in one transaction, so a
    /// conflict on any number leaves the project untouched
    async fn create_chapters_bulk(
        &self,
        project_id: Uuid,
        count: i32,
        target_word_count: i32,
    ) -> DbResult<Vec<Chapter>>;

    async fn update_chapter(&self, chapter_id: Uuid, patch: &UpdateChapterDto)
    -> DbResult<Chapter>;

    /// Drafts and the final chapter are removed by cascade
    async fn delete_chapter(&self, chapter_id: Uuid) -> DbResult<()>;

    /// `not_started -> in_progress`; any other status is left as is
    async fn mark_chapter_started(&self, chapter_id: Uuid) -> DbResult<()>;

    /// Set status and/or word count, leaving `None` fields unchanged
    async fn update_chapter_progress(
        &self,
        chapter_id: Uuid,
        status: Option<ChapterStatus>,
        word_count: Option<i32>,
    ) -> DbResult<()>;
}

const CHAPTER_COLUMNS: &str = "id, project_id, chapter_number, title, status, word_count, target_word_count, created_at, updated_at";

#[async_trait]
impl ChapterExt for DBClient {
    async fn get_chapters(
        &self,
        project_id: Uuid,
        status: Option<ChapterStatus>,
    ) -> DbResult<Vec<Chapter>> {
        let query = format!(
            r#"
            SELECT {CHAPTER_COLUMNS}
            FROM chapters
            WHERE project_id = $1
              AND ($2::chapter_status IS NULL OR status = $2)
            ORDER BY chapter_number ASC
            "#
        );

        let chapters = sqlx::query_as::<_, Chapter>(&query)
            .bind(project_id)
            .bind(status)
            .fetch_all(&self.pool)
            .await?;

        Ok(chapters)
    }

    async fn get_chapter(&self, chapter_id: Uuid) -> DbResult<Option<Chapter>> {
        let chapter = sqlx::query_as::<_, Chapter>(&format!(
            "SELECT {CHAPTER_COLUMNS} FROM chapters WHERE id = $1"
        ))
        .bind(chapter_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(chapter)
    }

    async fn get_chapters_by_ids(&self, chapter_ids: &[Uuid]) -> DbResult<Vec<Chapter>> {
        let chapters = sqlx::query_as::<_, Chapter>(&format!(
            "SELECT {CHAPTER_COLUMNS} FROM chapters WHERE id = ANY($1)"
        ))
        .bind(chapter_ids.to_vec())
        .fetch_all(&self.pool)
        .await?;

        Ok(chapters)
    }

    async fn get_chapter_by_number(
        &self,
        project_id: Uuid,
        chapter_number: i32,
    ) -> DbResult<Option<Chapter>> {
        let chapter = sqlx::query_as::<_, Chapter>(&format!(
            "SELECT {CHAPTER_COLUMNS} FROM chapters WHERE project_id = $1 AND chapter_number = $2"
        ))
        .bind(project_id)
        .bind(chapter_number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(chapter)
    }

    async fn create_chapter(&self, input: &CreateChapterDto) -> DbResult<Chapter> {
        let query = format!(
            r#"
            INSERT INTO chapters (project_id, chapter_number, title, status, target_word_count)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {CHAPTER_COLUMNS}
            "#
        );

        let chapter = sqlx::query_as::<_, Chapter>(&query)
            .bind(input.project_id)
            .bind(input.chapter_number)
            .bind(input.title.as_deref())
            .bind(input.status.unwrap_or_default())
            .bind(input.target_word_count())
            .fetch_one(&self.pool)
            .await?;

        Ok(chapter)
    }

    async fn create_chapters_bulk(
        &self,
        project_id: Uuid,
        count: i32,
        target_word_count: i32,
    ) -> DbResult<Vec<Chapter>> {
        let query = format!(
            r#"
            INSERT INTO chapters (project_id, chapter_number, title, status, target_word_count)
            VALUES ($1, $2, $3, 'not_started', $4)
            RETURNING {CHAPTER_COLUMNS}
            "#
        );

        let mut tx = self.pool.begin().await?;
        let mut chapters = Vec::with_capacity(count.max(0) as usize);

        for number in 1..=count {
            let chapter = sqlx::query_as::<_, Chapter>(&query)
                .bind(project_id)
                .bind(number)
                .bind(format!("Chapter {}", number))
                .bind(target_word_count)
                .fetch_one(&mut *tx)
                .await?;
            chapters.push(chapter);
        }

        tx.commit().await?;

        Ok(chapters)
    }

    async fn update_chapter(
        &self,
        chapter_id: Uuid,
        patch: &UpdateChapterDto,
    ) -> DbResult<Chapter> {
        let query = format!(
            r#"
            UPDATE chapters SET
                chapter_number = COALESCE($2, chapter_number),
                title = CASE WHEN $3 THEN $4 ELSE title END,
                status = COALESCE($5, status),
                word_count = COALESCE($6, word_count),
                target_word_count = COALESCE($7, target_word_count),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {CHAPTER_COLUMNS}
            "#
        );

        let chapter = sqlx::query_as::<_, Chapter>(&query)
            .bind(chapter_id)
            .bind(patch.chapter_number)
            .bind(patch.title.is_some())
            .bind(patch.title.clone().flatten())
            .bind(patch.status)
            .bind(patch.word_count)
            .bind(patch.target_word_count)
            .fetch_one(&self.pool)
            .await?;

        Ok(chapter)
    }

    async fn delete_chapter(&self, chapter_id: Uuid) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM chapters WHERE id = $1")
            .bind(chapter_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }

        Ok(())
    }

    async fn mark_chapter_started(&self, chapter_id: Uuid) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE chapters
            SET status = 'in_progress', updated_at = NOW()
            WHERE id = $1 AND status = 'not_started'
            "#,
        )
        .bind(chapter_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_chapter_progress(
        &self,
        chapter_id: Uuid,
        status: Option<ChapterStatus>,
        word_count: Option<i32>,
    ) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE chapters SET
                status = COALESCE($2, status),
                word_count = COALESCE($3, word_count),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(chapter_id)
        .bind(status)
        .bind(word_count)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }

        Ok(())
    }
}
