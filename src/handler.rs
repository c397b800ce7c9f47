pub mod ai_draft;
pub mod auth;
pub mod chapter;
pub mod draft;
pub mod feedback;
pub mod final_chapter;
pub mod health;
pub mod project;
pub mod users;
