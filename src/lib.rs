pub mod access;
pub mod config;
pub mod db;
pub mod dtos;
pub mod error;
pub mod extract;
pub mod handler;
pub mod http;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod tracing_config;
pub mod utils;

use std::sync::Arc;

use config::Config;
use db::Store;
use http::TextGenerator;

/// Shared by every handler. Both collaborators sit behind trait objects so the
/// router can be driven against in-memory doubles.
#[derive(Clone)]
pub struct AppState {
    pub env: Arc<Config>,
    pub db_client: Arc<dyn Store>,
    pub generator: Arc<dyn TextGenerator>,
}
