//! In-memory `Store` with the same observable rules as the Postgres schema:
//! unique emails, unique (project_id, chapter_number), cascading deletes and
//! "no row" errors on updates that miss.

use async_trait::async_trait;
use book_backend::db::{
    ChapterExt, DbError, DbResult, DraftExt, DraftFilter, FeedbackExt, FinalChapterExt,
    ProjectExt, ProjectFilter, UserExt,
};
use book_backend::dtos::{
    CreateChapterDto, CreateFeedbackDto, CreateProjectDto, NewDraft, UpdateChapterDto,
    UpdateProjectDto,
};
use book_backend::models::{
    AiDraft, Chapter, ChapterStatus, Feedback, FinalChapter, Project, ProjectOverview, User,
    UserRole,
};
use chrono::Utc;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryStore {
    pub users: DashMap<Uuid, User>,
    pub projects: DashMap<Uuid, Project>,
    pub chapters: DashMap<Uuid, Chapter>,
    pub drafts: DashMap<Uuid, AiDraft>,
    pub final_chapters: DashMap<Uuid, FinalChapter>,
    pub feedback: DashMap<Uuid, Feedback>,
    /// When set, chapter progress and project cost updates fail
    pub fail_secondary_updates: AtomicBool,
}

fn unavailable() -> DbError {
    DbError::Sqlx(sqlx::Error::PoolTimedOut)
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a user row directly, bypassing registration
    pub fn insert_user(&self, name: &str, role: UserRole) -> User {
        let user = User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: format!("{}-{}@example.com", name.to_lowercase(), Uuid::new_v4()),
            password: String::new(),
            role,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.users.insert(user.id, user.clone());
        user
    }

    fn number_taken(&self, project_id: Uuid, chapter_number: i32, except: Option<Uuid>) -> bool {
        self.chapters.iter().any(|c| {
            c.project_id == project_id
                && c.chapter_number == chapter_number
                && Some(c.id) != except
        })
    }

    fn insert_chapter(
        &self,
        project_id: Uuid,
        chapter_number: i32,
        title: Option<String>,
        status: ChapterStatus,
        target_word_count: i32,
    ) -> Chapter {
        let chapter = Chapter {
            id: Uuid::new_v4(),
            project_id,
            chapter_number,
            title,
            status,
            word_count: 0,
            target_word_count,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.chapters.insert(chapter.id, chapter.clone());
        chapter
    }

    fn remove_chapter_cascade(&self, chapter_id: Uuid) {
        self.chapters.remove(&chapter_id);
        self.drafts.retain(|_, d| d.chapter_id != chapter_id);
        self.final_chapters.retain(|_, f| f.chapter_id != chapter_id);
    }
}

#[async_trait]
impl UserExt for MemoryStore {
    async fn get_user(&self, user_id: Uuid) -> DbResult<Option<User>> {
        Ok(self.users.get(&user_id).map(|u| u.value().clone()))
    }

    async fn get_user_by_email(&self, email: &str) -> DbResult<Option<User>> {
        Ok(self
            .users
            .iter()
            .find(|u| u.email == email)
            .map(|u| u.value().clone()))
    }

    async fn get_users(&self, page: u32, limit: usize) -> DbResult<Vec<User>> {
        let mut users: Vec<User> = self.users.iter().map(|u| u.value().clone()).collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let skip = (page.saturating_sub(1) as usize) * limit;
        Ok(users.into_iter().skip(skip).take(limit).collect())
    }

    async fn save_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        role: UserRole,
    ) -> DbResult<User> {
        if self.users.iter().any(|u| u.email == email) {
            return Err(DbError::UniqueViolation("users_email_key".to_string()));
        }
        let user = User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            password: password_hash.to_string(),
            role,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_user_name(&self, user_id: Uuid, name: &str) -> DbResult<User> {
        let mut user = self.users.get_mut(&user_id).ok_or(DbError::NotFound)?;
        user.name = name.to_string();
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn update_user_role(&self, user_id: Uuid, role: UserRole) -> DbResult<User> {
        let mut user = self.users.get_mut(&user_id).ok_or(DbError::NotFound)?;
        user.role = role;
        user.updated_at = Utc::now();
        Ok(user.clone())
    }
}

#[async_trait]
impl ProjectExt for MemoryStore {
    async fn get_projects(
        &self,
        filter: &ProjectFilter,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<Project>> {
        let genre = filter.genre.as_ref().map(|g| g.to_lowercase());
        let mut projects: Vec<Project> = self
            .projects
            .iter()
            .filter(|p| filter.status.is_none_or(|s| p.status == s))
            .filter(|p| {
                genre
                    .as_ref()
                    .is_none_or(|g| p.genre.to_lowercase().contains(g.as_str()))
            })
            .filter(|p| filter.created_by.is_none_or(|id| p.created_by == Some(id)))
            .map(|p| p.value().clone())
            .collect();
        projects.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(projects
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn get_project(&self, project_id: Uuid) -> DbResult<Option<Project>> {
        Ok(self.projects.get(&project_id).map(|p| p.value().clone()))
    }

    async fn create_project(
        &self,
        created_by: Uuid,
        input: &CreateProjectDto,
    ) -> DbResult<Project> {
        let project = Project {
            id: Uuid::new_v4(),
            title: input.title.clone(),
            genre: input.genre.clone(),
            tropes: input.tropes.clone(),
            pov: input.pov,
            heat_level: input.heat_level,
            status: input.status.unwrap_or_default(),
            deadline: input.deadline,
            cost: input.cost.unwrap_or(0.0),
            roi: input.roi.unwrap_or(0.0),
            created_by: Some(created_by),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.projects.insert(project.id, project.clone());
        Ok(project)
    }

    async fn update_project(
        &self,
        project_id: Uuid,
        patch: &UpdateProjectDto,
    ) -> DbResult<Project> {
        let mut project = self.projects.get_mut(&project_id).ok_or(DbError::NotFound)?;
        if let Some(title) = &patch.title {
            project.title = title.clone();
        }
        if let Some(genre) = &patch.genre {
            project.genre = genre.clone();
        }
        if let Some(tropes) = &patch.tropes {
            project.tropes = tropes.clone();
        }
        if let Some(pov) = patch.pov {
            project.pov = pov;
        }
        if let Some(heat_level) = patch.heat_level {
            project.heat_level = heat_level;
        }
        if let Some(status) = patch.status {
            project.status = status;
        }
        if let Some(deadline) = patch.deadline {
            project.deadline = deadline;
        }
        if let Some(cost) = patch.cost {
            project.cost = cost;
        }
        if let Some(roi) = patch.roi {
            project.roi = roi;
        }
        project.updated_at = Utc::now();
        Ok(project.clone())
    }

    async fn delete_project(&self, project_id: Uuid) -> DbResult<()> {
        self.projects
            .remove(&project_id)
            .ok_or(DbError::NotFound)?;

        let chapter_ids: Vec<Uuid> = self
            .chapters
            .iter()
            .filter(|c| c.project_id == project_id)
            .map(|c| c.id)
            .collect();
        for chapter_id in chapter_ids {
            self.remove_chapter_cascade(chapter_id);
        }
        self.feedback.retain(|_, f| f.project_id != project_id);
        Ok(())
    }

    async fn add_project_cost(&self, project_id: Uuid, amount: f64) -> DbResult<()> {
        if self.fail_secondary_updates.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        let mut project = self.projects.get_mut(&project_id).ok_or(DbError::NotFound)?;
        project.cost += amount;
        project.updated_at = Utc::now();
        Ok(())
    }

    async fn get_project_overview(&self, project_id: Uuid) -> DbResult<ProjectOverview> {
        let project = self
            .projects
            .get(&project_id)
            .map(|p| p.value().clone())
            .ok_or(DbError::NotFound)?;

        let chapters: Vec<ChapterStatus> = self
            .chapters
            .iter()
            .filter(|c| c.project_id == project_id)
            .map(|c| c.status)
            .collect();
        let ratings: Vec<i32> = self
            .feedback
            .iter()
            .filter(|f| f.project_id == project_id)
            .map(|f| f.rating)
            .collect();

        let average_rating = if ratings.is_empty() {
            None
        } else {
            Some(ratings.iter().map(|r| *r as f64).sum::<f64>() / ratings.len() as f64)
        };

        Ok(ProjectOverview {
            id: project.id,
            title: project.title,
            genre: project.genre,
            status: project.status,
            total_chapters: chapters.len() as i64,
            approved_chapters: chapters
                .iter()
                .filter(|s| **s == ChapterStatus::Approved)
                .count() as i64,
            average_rating,
            total_feedback: ratings.len() as i64,
        })
    }
}

#[async_trait]
impl ChapterExt for MemoryStore {
    async fn get_chapters(
        &self,
        project_id: Uuid,
        status: Option<ChapterStatus>,
    ) -> DbResult<Vec<Chapter>> {
        let mut chapters: Vec<Chapter> = self
            .chapters
            .iter()
            .filter(|c| c.project_id == project_id && status.is_none_or(|s| c.status == s))
            .map(|c| c.value().clone())
            .collect();
        chapters.sort_by_key(|c| c.chapter_number);
        Ok(chapters)
    }

    async fn get_chapter(&self, chapter_id: Uuid) -> DbResult<Option<Chapter>> {
        Ok(self.chapters.get(&chapter_id).map(|c| c.value().clone()))
    }

    async fn get_chapters_by_ids(&self, chapter_ids: &[Uuid]) -> DbResult<Vec<Chapter>> {
        Ok(chapter_ids
            .iter()
            .filter_map(|id| self.chapters.get(id).map(|c| c.value().clone()))
            .collect())
    }

    async fn get_chapter_by_number(
        &self,
        project_id: Uuid,
        chapter_number: i32,
    ) -> DbResult<Option<Chapter>> {
        Ok(self
            .chapters
            .iter()
            .find(|c| c.project_id == project_id && c.chapter_number == chapter_number)
            .map(|c| c.value().clone()))
    }

    async fn create_chapter(&self, input: &CreateChapterDto) -> DbResult<Chapter> {
        if !self.projects.contains_key(&input.project_id) {
            return Err(DbError::ForeignKeyViolation("chapters_project_id_fkey".to_string()));
        }
        if self.number_taken(input.project_id, input.chapter_number, None) {
            return Err(DbError::UniqueViolation(
                "chapters_project_number_key".to_string(),
            ));
        }
        Ok(self.insert_chapter(
            input.project_id,
            input.chapter_number,
            input.title.clone(),
            input.status.unwrap_or_default(),
            input.target_word_count(),
        ))
    }

    async fn create_chapters_bulk(
        &self,
        project_id: Uuid,
        count: i32,
        target_word_count: i32,
    ) -> DbResult<Vec<Chapter>> {
        if !self.projects.contains_key(&project_id) {
            return Err(DbError::ForeignKeyViolation("chapters_project_id_fkey".to_string()));
        }
        if (1..=count).any(|n| self.number_taken(project_id, n, None)) {
            return Err(DbError::UniqueViolation(
                "chapters_project_number_key".to_string(),
            ));
        }
        Ok((1..=count)
            .map(|n| {
                self.insert_chapter(
                    project_id,
                    n,
                    Some(format!("Chapter {}", n)),
                    ChapterStatus::NotStarted,
                    target_word_count,
                )
            })
            .collect())
    }

    async fn update_chapter(
        &self,
        chapter_id: Uuid,
        patch: &UpdateChapterDto,
    ) -> DbResult<Chapter> {
        let project_id = self
            .chapters
            .get(&chapter_id)
            .map(|c| c.project_id)
            .ok_or(DbError::NotFound)?;
        if let Some(number) = patch.chapter_number {
            if self.number_taken(project_id, number, Some(chapter_id)) {
                return Err(DbError::UniqueViolation(
                    "chapters_project_number_key".to_string(),
                ));
            }
        }

        let mut chapter = self.chapters.get_mut(&chapter_id).ok_or(DbError::NotFound)?;
        if let Some(number) = patch.chapter_number {
            chapter.chapter_number = number;
        }
        if let Some(title) = &patch.title {
            chapter.title = title.clone();
        }
        if let Some(status) = patch.status {
            chapter.status = status;
        }
        if let Some(word_count) = patch.word_count {
            chapter.word_count = word_count;
        }
        if let Some(target) = patch.target_word_count {
            chapter.target_word_count = target;
        }
        chapter.updated_at = Utc::now();
        Ok(chapter.clone())
    }

    async fn delete_chapter(&self, chapter_id: Uuid) -> DbResult<()> {
        if !self.chapters.contains_key(&chapter_id) {
            return Err(DbError::NotFound);
        }
        self.remove_chapter_cascade(chapter_id);
        Ok(())
    }

    async fn mark_chapter_started(&self, chapter_id: Uuid) -> DbResult<()> {
        if let Some(mut chapter) = self.chapters.get_mut(&chapter_id) {
            if chapter.status == ChapterStatus::NotStarted {
                chapter.status = ChapterStatus::InProgress;
                chapter.updated_at = Utc::now();
            }
        }
        Ok(())
    }

    async fn update_chapter_progress(
        &self,
        chapter_id: Uuid,
        status: Option<ChapterStatus>,
        word_count: Option<i32>,
    ) -> DbResult<()> {
        if self.fail_secondary_updates.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        let mut chapter = self.chapters.get_mut(&chapter_id).ok_or(DbError::NotFound)?;
        if let Some(status) = status {
            chapter.status = status;
        }
        if let Some(word_count) = word_count {
            chapter.word_count = word_count;
        }
        chapter.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl DraftExt for MemoryStore {
    async fn get_drafts(&self, filter: &DraftFilter, limit: i64) -> DbResult<Vec<AiDraft>> {
        let mut drafts: Vec<AiDraft> = self
            .drafts
            .iter()
            .filter(|d| filter.chapter_id.is_none_or(|id| d.chapter_id == id))
            .map(|d| d.value().clone())
            .collect();
        if let Some(project_id) = filter.project_id {
            drafts.retain(|d| {
                self.chapters
                    .get(&d.chapter_id)
                    .is_some_and(|c| c.project_id == project_id)
            });
        }
        drafts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        drafts.truncate(limit.max(0) as usize);
        Ok(drafts)
    }

    async fn get_chapter_drafts(&self, chapter_id: Uuid) -> DbResult<Vec<AiDraft>> {
        let mut drafts: Vec<AiDraft> = self
            .drafts
            .iter()
            .filter(|d| d.chapter_id == chapter_id)
            .map(|d| d.value().clone())
            .collect();
        drafts.sort_by(|a, b| b.pass_number.cmp(&a.pass_number));
        Ok(drafts)
    }

    async fn get_drafts_for_chapters(&self, chapter_ids: &[Uuid]) -> DbResult<Vec<AiDraft>> {
        let mut drafts: Vec<AiDraft> = self
            .drafts
            .iter()
            .filter(|d| chapter_ids.contains(&d.chapter_id))
            .map(|d| d.value().clone())
            .collect();
        drafts.sort_by_key(|d| d.pass_number);
        Ok(drafts)
    }

    async fn get_draft(&self, draft_id: Uuid) -> DbResult<Option<AiDraft>> {
        Ok(self.drafts.get(&draft_id).map(|d| d.value().clone()))
    }

    async fn get_latest_draft(&self, chapter_id: Uuid) -> DbResult<Option<AiDraft>> {
        Ok(self
            .drafts
            .iter()
            .filter(|d| d.chapter_id == chapter_id)
            .max_by_key(|d| d.pass_number)
            .map(|d| d.value().clone()))
    }

    async fn get_max_pass_number(&self, chapter_id: Uuid) -> DbResult<Option<i32>> {
        Ok(self
            .drafts
            .iter()
            .filter(|d| d.chapter_id == chapter_id)
            .map(|d| d.pass_number)
            .max())
    }

    async fn create_draft(&self, draft: &NewDraft) -> DbResult<AiDraft> {
        if !self.chapters.contains_key(&draft.chapter_id) {
            return Err(DbError::ForeignKeyViolation("ai_drafts_chapter_id_fkey".to_string()));
        }
        let row = AiDraft {
            id: Uuid::new_v4(),
            chapter_id: draft.chapter_id,
            content: draft.content.clone(),
            model_used: draft.model_used.clone(),
            pass_number: draft.pass_number,
            prompt_tokens: draft.prompt_tokens,
            completion_tokens: draft.completion_tokens,
            total_cost: draft.total_cost,
            created_at: Utc::now(),
        };
        self.drafts.insert(row.id, row.clone());
        Ok(row)
    }

    async fn delete_draft(&self, draft_id: Uuid) -> DbResult<()> {
        self.drafts.remove(&draft_id).ok_or(DbError::NotFound)?;
        Ok(())
    }
}

#[async_trait]
impl FinalChapterExt for MemoryStore {
    async fn get_final_chapter_for_chapter(
        &self,
        chapter_id: Uuid,
    ) -> DbResult<Option<FinalChapter>> {
        Ok(self
            .final_chapters
            .iter()
            .find(|f| f.chapter_id == chapter_id)
            .map(|f| f.value().clone()))
    }

    async fn get_final_chapters_for_chapters(
        &self,
        chapter_ids: &[Uuid],
    ) -> DbResult<Vec<FinalChapter>> {
        Ok(self
            .final_chapters
            .iter()
            .filter(|f| chapter_ids.contains(&f.chapter_id))
            .map(|f| f.value().clone())
            .collect())
    }

    async fn upsert_final_chapter(
        &self,
        chapter_id: Uuid,
        content: &str,
        word_count: i32,
    ) -> DbResult<FinalChapter> {
        let existing = self
            .final_chapters
            .iter()
            .find(|f| f.chapter_id == chapter_id)
            .map(|f| f.id);

        if let Some(id) = existing {
            let mut row = self.final_chapters.get_mut(&id).ok_or(DbError::NotFound)?;
            row.content = content.to_string();
            row.word_count = word_count;
            row.approved = false;
            row.approved_by = None;
            row.approved_at = None;
            row.updated_at = Utc::now();
            return Ok(row.clone());
        }

        let row = FinalChapter {
            id: Uuid::new_v4(),
            chapter_id,
            content: content.to_string(),
            approved: false,
            approved_by: None,
            approved_at: None,
            word_count,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.final_chapters.insert(row.id, row.clone());
        Ok(row)
    }

    async fn approve_final_chapter(
        &self,
        final_chapter_id: Uuid,
        approved_by: Uuid,
    ) -> DbResult<FinalChapter> {
        let mut row = self
            .final_chapters
            .get_mut(&final_chapter_id)
            .ok_or(DbError::NotFound)?;
        row.approved = true;
        row.approved_by = Some(approved_by);
        row.approved_at = Some(Utc::now());
        row.updated_at = Utc::now();
        Ok(row.clone())
    }
}

#[async_trait]
impl FeedbackExt for MemoryStore {
    async fn get_project_feedback(&self, project_id: Uuid) -> DbResult<Vec<Feedback>> {
        let mut feedback: Vec<Feedback> = self
            .feedback
            .iter()
            .filter(|f| f.project_id == project_id)
            .map(|f| f.value().clone())
            .collect();
        feedback.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(feedback)
    }

    async fn create_feedback(
        &self,
        reader_id: Uuid,
        input: &CreateFeedbackDto,
    ) -> DbResult<Feedback> {
        if !self.projects.contains_key(&input.project_id) {
            return Err(DbError::ForeignKeyViolation("feedback_project_id_fkey".to_string()));
        }
        let row = Feedback {
            id: Uuid::new_v4(),
            project_id: input.project_id,
            reader_id,
            chapter_id: input.chapter_id,
            rating: input.rating,
            comments: input.comments.clone(),
            feedback_type: input
                .feedback_type
                .clone()
                .unwrap_or_else(|| "general".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.feedback.insert(row.id, row.clone());
        Ok(row)
    }
}
