use crate::models::{
    AiDraft, Chapter, ChapterStatus, FinalChapter, Feedback, HeatLevel, PointOfView, Project,
    ProjectStatus, User, UserRole,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::Validate;

// DTOs define exactly what crosses the HTTP boundary. Request DTOs carry their
// validation rules; response DTOs decide which related rows are nested.

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`)
/// in partial updates, so `"deadline": null` clears the column while omitting it
/// leaves the column alone.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// ============================================================================
// Authentication / users
// ============================================================================

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct RegisterUserDto {
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,

    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Email is invalid")
    )]
    pub email: String,

    #[validate(length(min = 6, max = 64, message = "Password must be 6-64 characters"))]
    pub password: String,

    /// Defaults to `generation_agent`. `admin` cannot be self-assigned.
    pub role: Option<UserRole>,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct LoginUserDto {
    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Email is invalid")
    )]
    pub email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

/// Client-safe view of a `User` (no password hash).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FilterUserDto {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FilterUserDto {
    pub fn filter_user(user: &User) -> Self {
        FilterUserDto {
            id: user.id.to_string(),
            name: user.name.to_owned(),
            email: user.email.to_owned(),
            role: user.role.to_str().to_string(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }

    pub fn filter_users(users: &[User]) -> Vec<FilterUserDto> {
        users.iter().map(FilterUserDto::filter_user).collect()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserLoginResponseDto {
    pub token: String,
    pub user: FilterUserDto,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct NameUpdateDto {
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,
}

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct RoleUpdateDto {
    pub role: UserRole,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct RequestQueryDto {
    #[validate(range(min = 1, max = 100000))]
    pub page: Option<usize>,
    #[validate(range(min = 1, max = 50))]
    pub limit: Option<usize>,
}

// ============================================================================
// Projects
// ============================================================================

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct ProjectsQueryParams {
    pub status: Option<ProjectStatus>,

    /// Case-insensitive substring match.
    #[validate(length(min = 1, max = 100))]
    pub genre: Option<String>,

    pub created_by: Option<Uuid>,

    #[validate(range(min = 1, max = 100))]
    pub limit: Option<i64>,

    #[validate(range(min = 0))]
    pub offset: Option<i64>,
}

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct CreateProjectDto {
    #[validate(length(min = 1, max = 500, message = "Title must be 1-500 characters"))]
    pub title: String,

    #[validate(length(min = 1, max = 100, message = "Genre must be 1-100 characters"))]
    pub genre: String,

    pub tropes: Vec<String>,

    pub pov: PointOfView,

    pub heat_level: HeatLevel,

    pub status: Option<ProjectStatus>,

    pub deadline: Option<NaiveDate>,

    #[validate(range(min = 0.0, message = "Cost cannot be negative"))]
    pub cost: Option<f64>,

    pub roi: Option<f64>,
}

/// Partial project patch; omitted fields are left untouched.
#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct UpdateProjectDto {
    #[validate(length(min = 1, max = 500, message = "Title must be 1-500 characters"))]
    pub title: Option<String>,

    #[validate(length(min = 1, max = 100, message = "Genre must be 1-100 characters"))]
    pub genre: Option<String>,

    pub tropes: Option<Vec<String>>,

    pub pov: Option<PointOfView>,

    pub heat_level: Option<HeatLevel>,

    pub status: Option<ProjectStatus>,

    #[serde(default, deserialize_with = "double_option")]
    pub deadline: Option<Option<NaiveDate>>,

    #[validate(range(min = 0.0, message = "Cost cannot be negative"))]
    pub cost: Option<f64>,

    pub roi: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProjectDetailDto {
    #[serde(flatten)]
    pub project: Project,
    pub chapters: Vec<Chapter>,
    pub feedback: Vec<Feedback>,
}

// ============================================================================
// Chapters
// ============================================================================

pub const DEFAULT_TARGET_WORD_COUNT: i32 = 3000;

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct ChaptersQueryParams {
    pub project_id: Option<Uuid>,
    pub status: Option<ChapterStatus>,
}

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct CreateChapterDto {
    pub project_id: Uuid,

    #[validate(range(min = 1, message = "Chapter number must be positive"))]
    pub chapter_number: i32,

    #[validate(length(max = 500, message = "Title must be at most 500 characters"))]
    pub title: Option<String>,

    pub status: Option<ChapterStatus>,

    #[validate(range(min = 1, message = "Target word count must be positive"))]
    pub target_word_count: Option<i32>,
}

impl CreateChapterDto {
    pub fn target_word_count(&self) -> i32 {
        self.target_word_count.unwrap_or(DEFAULT_TARGET_WORD_COUNT)
    }
}

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct BulkCreateChaptersDto {
    pub project_id: Uuid,

    #[validate(range(min = 1, max = 200, message = "Chapter count must be between 1 and 200"))]
    pub chapter_count: i32,

    #[validate(range(min = 1, message = "Target word count must be positive"))]
    pub target_word_count: Option<i32>,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct UpdateChapterDto {
    #[validate(range(min = 1, message = "Chapter number must be positive"))]
    pub chapter_number: Option<i32>,

    #[serde(default, deserialize_with = "double_option")]
    #[validate(length(max = 500, message = "Title must be at most 500 characters"))]
    pub title: Option<Option<String>>,

    pub status: Option<ChapterStatus>,

    #[validate(range(min = 0, message = "Word count cannot be negative"))]
    pub word_count: Option<i32>,

    #[validate(range(min = 1, message = "Target word count must be positive"))]
    pub target_word_count: Option<i32>,
}

/// Chapter as listed under a project: with its drafts and final text.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChapterWithDraftsDto {
    #[serde(flatten)]
    pub chapter: Chapter,
    pub ai_drafts: Vec<AiDraft>,
    pub final_chapters: Vec<FinalChapter>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChapterDetailDto {
    #[serde(flatten)]
    pub chapter: Chapter,
    pub project: Project,
    pub ai_drafts: Vec<AiDraft>,
    pub final_chapters: Vec<FinalChapter>,
}

// ============================================================================
// Drafts
// ============================================================================

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct DraftsQueryParams {
    pub chapter_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<i64>,
}

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct CreateDraftDto {
    pub chapter_id: Uuid,

    #[validate(length(min = 1, message = "Content is required"))]
    pub content: String,

    #[validate(length(min = 1, max = 100, message = "Model must be 1-100 characters"))]
    pub model_used: String,

    #[validate(range(min = 1, message = "Pass number must be positive"))]
    pub pass_number: Option<i32>,

    #[validate(range(min = 0))]
    pub prompt_tokens: Option<i32>,

    #[validate(range(min = 0))]
    pub completion_tokens: Option<i32>,

    #[validate(range(min = 0.0, message = "Cost cannot be negative"))]
    pub total_cost: Option<f64>,
}

/// Insert shape for `ai_drafts`, with the pass number already resolved.
#[derive(Debug, Clone)]
pub struct NewDraft {
    pub chapter_id: Uuid,
    pub content: String,
    pub model_used: String,
    pub pass_number: i32,
    pub prompt_tokens: Option<i32>,
    pub completion_tokens: Option<i32>,
    pub total_cost: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DraftWithChapterDto {
    #[serde(flatten)]
    pub draft: AiDraft,
    pub chapter: Chapter,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChapterWithProjectDto {
    #[serde(flatten)]
    pub chapter: Chapter,
    pub project: Project,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DraftDetailDto {
    #[serde(flatten)]
    pub draft: AiDraft,
    pub chapter: ChapterWithProjectDto,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FinalizeResponseDto {
    pub message: String,
    pub final_chapter: FinalChapter,
}

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct GenerateDraftDto {
    #[serde(rename = "chapterId")]
    pub chapter_id: Uuid,
    #[serde(rename = "projectId")]
    pub project_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateDraftResponseDto {
    pub success: bool,
    pub draft: AiDraft,
    pub message: String,
}

// ============================================================================
// Feedback
// ============================================================================

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct FeedbackQueryParams {
    pub project_id: Option<Uuid>,
}

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct CreateFeedbackDto {
    pub project_id: Uuid,

    pub chapter_id: Option<Uuid>,

    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i32,

    #[validate(length(max = 5000))]
    pub comments: Option<String>,

    #[validate(length(min = 1, max = 50))]
    pub feedback_type: Option<String>,
}

// ============================================================================
// Shared
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        MessageResponse {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_project_distinguishes_null_from_absent() {
        let cleared: UpdateProjectDto = serde_json::from_str(r#"{"deadline": null}"#).unwrap();
        assert_eq!(cleared.deadline, Some(None));

        let untouched: UpdateProjectDto = serde_json::from_str(r#"{"title": "New"}"#).unwrap();
        assert_eq!(untouched.deadline, None);
        assert_eq!(untouched.title.as_deref(), Some("New"));
    }

    #[test]
    fn create_project_rejects_every_bad_field() {
        let dto = CreateProjectDto {
            title: String::new(),
            genre: "g".repeat(101),
            tropes: vec![],
            pov: PointOfView::FirstPerson,
            heat_level: HeatLevel::Sweet,
            status: None,
            deadline: None,
            cost: Some(-1.0),
            roi: None,
        };
        let errors = dto.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("title"));
        assert!(fields.contains_key("genre"));
        assert!(fields.contains_key("cost"));
    }

    #[test]
    fn unknown_enum_values_fail_to_deserialize() {
        let body = r#"{"title":"T","genre":"G","tropes":[],"pov":"second_person","heat_level":"sweet"}"#;
        assert!(serde_json::from_str::<CreateProjectDto>(body).is_err());
    }

    #[test]
    fn chapter_target_defaults_to_3000() {
        let dto: CreateChapterDto = serde_json::from_str(
            r#"{"project_id":"6f1c1b8e-2a43-4c4e-9b1a-0c6f0e1d2a3b","chapter_number":1}"#,
        )
        .unwrap();
        assert!(dto.validate().is_ok());
        assert_eq!(dto.target_word_count(), 3000);
    }

    #[test]
    fn generate_draft_uses_camel_case_ids() {
        let dto: GenerateDraftDto = serde_json::from_str(
            r#"{"chapterId":"6f1c1b8e-2a43-4c4e-9b1a-0c6f0e1d2a3b","projectId":"0b7a3f5e-8d6c-4b2a-9e1f-3c4d5e6f7a8b"}"#,
        )
        .unwrap();
        assert_eq!(
            dto.chapter_id.to_string(),
            "6f1c1b8e-2a43-4c4e-9b1a-0c6f0e1d2a3b"
        );
    }

    #[test]
    fn feedback_rating_is_bounded() {
        let dto = CreateFeedbackDto {
            project_id: Uuid::new_v4(),
            chapter_id: None,
            rating: 6,
            comments: None,
            feedback_type: None,
        };
        assert!(dto.validate().is_err());
    }
}
