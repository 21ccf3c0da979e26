//! REST surface: multi-user HTTP access to the memory engine, JWT-authenticated
//! per request (unlike the MCP stdio binary, which resolves one fixed owner id
//! at startup since it has no notion of separate callers).

pub mod handlers;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use memoria_core::MemoryEngine;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<MemoryEngine>,
    pub jwt_secret: String,
    pub token_ttl_seconds: i64,
}

pub fn build_router(engine: Arc<MemoryEngine>, jwt_secret: String, token_ttl_seconds: i64) -> Router {
    let state = AppState { engine, jwt_secret, token_ttl_seconds };

    Router::new()
        .route("/health", get(handlers::health))
        .route("/auth/register", post(handlers::register))
        .route("/auth/login", post(handlers::login))
        .route("/memories", get(handlers::search_memories).post(handlers::create_memory))
        .route(
            "/memories/{id}",
            get(handlers::get_memory).put(handlers::update_memory).delete(handlers::delete_memory),
        )
        .route("/contexts", post(handlers::create_context))
        .route("/relations", post(handlers::create_relation))
        .route("/relations/{memory_id}", get(handlers::get_memory_relations))
        .route("/search", get(handlers::search_memories))
        .route("/search/semantic", get(handlers::search_semantic))
        .route("/knowledge/ingest", post(handlers::ingest_knowledge))
        .route("/stats", get(handlers::stats))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive()))
        .with_state(state)
}
