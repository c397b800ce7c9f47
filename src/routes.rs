use axum::{Router, middleware, routing::get};
use tower_http::trace::TraceLayer;

use crate::{
    AppState,
    handler::{
        ai_draft::ai_draft_handler, auth::auth_handler, chapter::chapter_handler,
        draft::draft_handler, feedback::feedback_handler, final_chapter::final_chapter_handler,
        health::health_check, project::project_handler, users::users_handler,
    },
    middleware::auth,
};

pub fn create_router(app_state: AppState) -> Router {
    // everything in here needs a bearer token
    let protected = Router::new()
        .nest("/users", users_handler())
        .nest("/projects", project_handler())
        .nest("/chapters", chapter_handler())
        .nest("/drafts", draft_handler())
        .nest("/final-chapters", final_chapter_handler())
        .nest("/feedback", feedback_handler())
        .nest("/ai-draft", ai_draft_handler())
        .layer(middleware::from_fn_with_state(app_state.clone(), auth));

    let api_route = Router::new()
        .route("/health", get(health_check))
        .nest("/auth", auth_handler())
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    Router::new().nest("/api", api_route)
}
