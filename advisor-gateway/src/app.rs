use crate::{files, threads, transcribe};
use advisor_core::config::AdvisorConfig;
use axum::Router;
use axum::routing::{get, post};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<AdvisorConfig>,
}

pub fn router(cfg: Arc<AdvisorConfig>) -> Router {
    let state = AppState { cfg };
    Router::new()
        .route("/api/assistants", post(threads::assistant_id))
        .route("/api/assistants/threads", post(threads::create_thread))
        .route(
            "/api/assistants/threads/:thread_id/messages",
            post(threads::send_message),
        )
        .route(
            "/api/assistants/threads/:thread_id/actions",
            post(threads::submit_actions),
        )
        .route("/api/upload", post(files::upload))
        .route("/api/files/:file_id", get(files::download))
        .route("/api/transcribe", post(transcribe::transcribe))
        .with_state(state)
}
