use super::{DBClient, DbError, DbResult};
use crate::dtos::{CreateProjectDto, UpdateProjectDto};
use crate::models::{Project, ProjectOverview, ProjectStatus};
use async_trait::async_trait;
use uuid::Uuid;

/// Filters accepted by the project listing. All of them are optional and combine with AND.
#[derive(Debug, Default, Clone)]
pub struct ProjectFilter {
    pub status: Option<ProjectStatus>,
    pub genre: Option<String>,
    pub created_by: Option<Uuid>,
}

#[async_trait]
pub trait ProjectExt {
    /// Newest first, windowed by limit/offset
    async fn get_projects(
        &self,
        filter: &ProjectFilter,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<Project>>;

    async fn get_project(&self, project_id: Uuid) -> DbResult<Option<Project>>;

    async fn create_project(
        &self,
        created_by: Uuid,
        input: &CreateProjectDto,
    ) -> DbResult<Project>;

    /// Partial patch; `NotFound` when the id doesn't exist
    async fn update_project(&self, project_id: Uuid, patch: &UpdateProjectDto)
    -> DbResult<Project>;

    /// Chapters, drafts, final chapters and feedback go with it (ON DELETE CASCADE)
    async fn delete_project(&self, project_id: Uuid) -> DbResult<()>;

    /// Adds generation spend to the project's accumulated cost
    async fn add_project_cost(&self, project_id: Uuid, amount: f64) -> DbResult<()>;

    async fn get_project_overview(&self, project_id: Uuid) -> DbResult<ProjectOverview>;
}

/// `%input%` for ILIKE, with the input's own wildcards matched literally.
fn contains_pattern(input: &str) -> String {
    let mut pattern = String::with_capacity(input.len() + 2);
    pattern.push('%');
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

const PROJECT_COLUMNS: &str = "id, title, genre, tropes, pov, heat_level, status, deadline, cost, roi, created_by, created_at, updated_at";

#[async_trait]
impl ProjectExt for DBClient {
    async fn get_projects(
        &self,
        filter: &ProjectFilter,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<Project>> {
        let query = format!(
            r#"
            SELECT {PROJECT_COLUMNS}
            FROM projects
            WHERE ($1::project_status IS NULL OR status = $1)
              AND ($2::text IS NULL OR genre ILIKE $2 ESCAPE '\')
              AND ($3::uuid IS NULL OR created_by = $3)
            ORDER BY created_at DESC
            LIMIT $4 OFFSET $5
            "#
        );

        let projects = sqlx::query_as::<_, Project>(&query)
            .bind(filter.status)
            .bind(filter.genre.as_deref().map(contains_pattern))
            .bind(filter.created_by)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(projects)
    }

    async fn get_project(&self, project_id: Uuid) -> DbResult<Option<Project>> {
        let project = sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1"
        ))
        .bind(project_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(project)
    }

    async fn create_project(
        &self,
        created_by: Uuid,
        input: &CreateProjectDto,
    ) -> DbResult<Project> {
        let query = format!(
            r#"
            INSERT INTO projects (title, genre, tropes, pov, heat_level, status, deadline, cost, roi, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {PROJECT_COLUMNS}
            "#
        );

        let project = sqlx::query_as::<_, Project>(&query)
            .bind(&input.title)
            .bind(&input.genre)
            .bind(input.tropes.clone())
            .bind(input.pov)
            .bind(input.heat_level)
            .bind(input.status.unwrap_or_default())
            .bind(input.deadline)
            .bind(input.cost.unwrap_or(0.0))
            .bind(input.roi.unwrap_or(0.0))
            .bind(created_by)
            .fetch_one(&self.pool)
            .await?;

        Ok(project)
    }

    async fn update_project(
        &self,
        project_id: Uuid,
        patch: &UpdateProjectDto,
    ) -> DbResult<Project> {
        // deadline is nullable, so "absent" and "set to null" need separate parameters
        let query = format!(
            r#"
            UPDATE projects SET
                title = COALESCE($2, title),
                genre = COALESCE($3, genre),
                tropes = COALESCE($4, tropes),
                pov = COALESCE($5, pov),
                heat_level = COALESCE($6, heat_level),
                status = COALESCE($7, status),
                deadline = CASE WHEN $8 THEN $9 ELSE deadline END,
                cost = COALESCE($10, cost),
                roi = COALESCE($11, roi),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {PROJECT_COLUMNS}
            "#
        );

        let project = sqlx::query_as::<_, Project>(&query)
            .bind(project_id)
            .bind(patch.title.as_deref())
            .bind(patch.genre.as_deref())
            .bind(patch.tropes.clone())
            .bind(patch.pov)
            .bind(patch.heat_level)
            .bind(patch.status)
            .bind(patch.deadline.is_some())
            .bind(patch.deadline.flatten())
            .bind(patch.cost)
            .bind(patch.roi)
            .fetch_one(&self.pool)
            .await?;

        Ok(project)
    }

    async fn delete_project(&self, project_id: Uuid) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(project_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }

        Ok(())
    }

    async fn add_project_cost(&self, project_id: Uuid, amount: f64) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE projects SET cost = cost + $1, updated_at = NOW() WHERE id = $2",
        )
        .bind(amount)
        .bind(project_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }

        Ok(())
    }

    async fn get_project_overview(&self, project_id: Uuid) -> DbResult<ProjectOverview> {
        let overview = sqlx::query_as::<_, ProjectOverview>(
            r#"
            SELECT
                p.id,
                p.title,
                p.genre,
                p.status,
                (SELECT COUNT(*) FROM chapters c WHERE c.project_id = p.id) AS total_chapters,
                (SELECT COUNT(*) FROM chapters c
                    WHERE c.project_id = p.id AND c.status = 'approved') AS approved_chapters,
                (SELECT AVG(f.rating)::float8 FROM feedback f WHERE f.project_id = p.id) AS average_rating,
                (SELECT COUNT(*) FROM feedback f WHERE f.project_id = p.id) AS total_feedback
            FROM projects p
            WHERE p.id = $1
            "#,
        )
        .bind(project_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(overview)
    }
}
