pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::bookmarks;
use crate::insights;
use crate::save;
use crate::state::AppState;
use crate::sync;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Save pipeline (browser extension entry point)
        .route("/api/v1/save", post(save::handle_save))
        // Notion → local mirror sync
        .route("/api/v1/sync", post(sync::handle_sync))
        // Dashboard reads
        .route("/api/v1/bookmarks", get(bookmarks::handle_list))
        .route("/api/v1/stats", get(bookmarks::handle_stats))
        .route("/api/v1/insights", get(insights::handle_insights))
        .with_state(state)
}
