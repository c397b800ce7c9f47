use chrono::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account role used for role-based access control.
///
/// Stored in Postgres as the `user_role` ENUM. `generation_agent` is the default
/// role for new sign-ups; admins can act on every project regardless of owner.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    GenerationAgent,
    Reviewer,
}

impl UserRole {
    pub fn to_str(&self) -> &str {
        match self {
            UserRole::Admin => "admin",
            UserRole::GenerationAgent => "generation_agent",
            UserRole::Reviewer => "reviewer",
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Default)]
#[sqlx(type_name = "project_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    Planning,
    Writing,
    Editing,
    Review,
    Published,
    Cancelled,
}

/// Narrative point of view of a project.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "point_of_view", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PointOfView {
    FirstPerson,
    ThirdPersonLimited,
    ThirdPersonOmniscient,
    DualPov,
    MultiPov,
}

impl PointOfView {
    /// Human-readable form used in generation prompts.
    pub fn label(&self) -> &'static str {
        match self {
            PointOfView::FirstPerson => "first person",
            PointOfView::ThirdPersonLimited => "third person limited",
            PointOfView::ThirdPersonOmniscient => "third person omniscient",
            PointOfView::DualPov => "dual pov",
            PointOfView::MultiPov => "multi pov",
        }
    }
}

/// Content-intensity classification of a project.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "heat_level", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum HeatLevel {
    Sweet,
    Mild,
    Moderate,
    Steamy,
    Explicit,
}

impl HeatLevel {
    pub fn to_str(&self) -> &'static str {
        match self {
            HeatLevel::Sweet => "sweet",
            HeatLevel::Mild => "mild",
            HeatLevel::Moderate => "moderate",
            HeatLevel::Steamy => "steamy",
            HeatLevel::Explicit => "explicit",
        }
    }
}

/// Chapter lifecycle.
///
/// `NotStarted -> InProgress` happens on the first saved draft, `AiDraft` after a
/// generation pass, `DraftComplete` once a draft is finalized and `Approved` when
/// a reviewer signs off the final chapter.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Default)]
#[sqlx(type_name = "chapter_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ChapterStatus {
    #[default]
    NotStarted,
    InProgress,
    DraftComplete,
    AiDraft,
    UnderReview,
    Approved,
    Published,
}

/// Account row. `password` holds the argon2 PHC string and is never sent to clients;
/// responses go through `FilterUserDto`.
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A book-writing effort.
///
/// `cost` is the accumulated generation spend; it only grows through
/// `ProjectExt::add_project_cost` after each generation pass.
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct Project {
    pub id: Uuid,
    pub title: String,
    pub genre: String,
    pub tropes: Vec<String>,
    pub pov: PointOfView,
    pub heat_level: HeatLevel,
    pub status: ProjectStatus,
    pub deadline: Option<NaiveDate>,
    pub cost: f64,
    pub roi: f64,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct Chapter {
    pub id: Uuid,
    pub project_id: Uuid,
    pub chapter_number: i32,
    pub title: Option<String>,
    pub status: ChapterStatus,
    pub word_count: i32,
    pub target_word_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One generated or manually edited version of a chapter. Rows are never updated;
/// an edit is saved as a new pass.
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct AiDraft {
    pub id: Uuid,
    pub chapter_id: Uuid,
    pub content: String,
    pub model_used: String,
    pub pass_number: i32,
    pub prompt_tokens: Option<i32>,
    pub completion_tokens: Option<i32>,
    pub total_cost: f64,
    pub created_at: DateTime<Utc>,
}

/// The canonical text of a chapter (at most one per chapter).
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct FinalChapter {
    pub id: Uuid,
    pub chapter_id: Uuid,
    pub content: String,
    pub approved: bool,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub word_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct Feedback {
    pub id: Uuid,
    pub project_id: Uuid,
    pub reader_id: Uuid,
    pub chapter_id: Option<Uuid>,
    pub rating: i32,
    pub comments: Option<String>,
    pub feedback_type: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Aggregates shown on a project dashboard.
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone, PartialEq)]
pub struct ProjectOverview {
    pub id: Uuid,
    pub title: String,
    pub genre: String,
    pub status: ProjectStatus,
    pub total_chapters: i64,
    pub approved_chapters: i64,
    pub average_rating: Option<f64>,
    pub total_feedback: i64,
}
