//! REST endpoint handlers: thin translation between HTTP and the
//! engine's own operations. Each handler maps an [`EngineError`] to
//! its stable HTTP status via `ErrorCode::http_status`.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use memoria_core::{
    CreateContextInput, CreateMemoryInput, CreateRelationInput, EngineError, SearchQuery,
    SemanticSearchQuery, UpdateMemoryInput,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::AppState;
use crate::auth::{self, AuthenticatedUser};

fn engine_error_response(err: EngineError) -> (StatusCode, Json<Value>) {
    let status = StatusCode::from_u16(err.code().http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(json!({"error": err.to_string()})))
}

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let db_ok = state.engine.get_memory_statistics("__healthcheck__").is_ok();
    Json(json!({
        "status": "ok",
        "components": {
            "db": if db_ok { "ok" } else { "error" },
            "cache": "ok",
            "vector": "ok",
            "embedding": "ok",
        }
    }))
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

pub async fn register(State(state): State<AppState>, Json(body): Json<RegisterRequest>) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    if body.username.trim().is_empty() || body.password.len() < 8 {
        return Err((StatusCode::BAD_REQUEST, Json(json!({"error": "username must be non-empty and password at least 8 characters"}))));
    }

    let hash = auth::hash_password(&body.password)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": e.to_string()}))))?;

    let user = state
        .engine
        .storage()
        .create_user(&body.username, &hash)
        .map_err(|e| (StatusCode::CONFLICT, Json(json!({"error": e.to_string()}))))?;

    let token = auth::issue_token(&user.id, &state.jwt_secret, state.token_ttl_seconds)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": e.to_string()}))))?;

    Ok(Json(json!({"userId": user.id, "token": token})))
}

pub async fn login(State(state): State<AppState>, Json(body): Json<RegisterRequest>) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let user = state
        .engine
        .storage()
        .get_user_by_username(&body.username)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": e.to_string()}))))?
        .ok_or((StatusCode::UNAUTHORIZED, Json(json!({"error": "invalid username or password"}))))?;

    let valid = auth::verify_password(&body.password, &user.password_hash)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": e.to_string()}))))?;
    if !valid {
        return Err((StatusCode::UNAUTHORIZED, Json(json!({"error": "invalid username or password"}))));
    }

    let token = auth::issue_token(&user.id, &state.jwt_secret, state.token_ttl_seconds)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": e.to_string()}))))?;

    Ok(Json(json!({"userId": user.id, "token": token})))
}

#[derive(Debug, Deserialize)]
pub struct CreateMemoryBody {
    pub title: String,
    pub content: String,
    #[serde(rename = "contextId")]
    pub context_id: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
}

pub async fn create_memory(
    State(state): State<AppState>,
    AuthenticatedUser(owner_id): AuthenticatedUser,
    Json(body): Json<CreateMemoryBody>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let input = CreateMemoryInput {
        owner_id,
        context_id: body.context_id,
        title: body.title,
        content: body.content,
        access_level: Default::default(),
        importance: 5,
        category: body.category,
        tags: body.tags.unwrap_or_default(),
        metadata: Default::default(),
    };
    let memory = state
        .engine
        .create_memory(input, Default::default())
        .await
        .map_err(engine_error_response)?;
    Ok(Json(serde_json::to_value(memory).unwrap()))
}

pub async fn get_memory(
    State(state): State<AppState>,
    AuthenticatedUser(owner_id): AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let memory = state.engine.get_memory(&owner_id, &id).await.map_err(engine_error_response)?;
    Ok(Json(serde_json::to_value(memory).unwrap()))
}

pub async fn update_memory(
    State(state): State<AppState>,
    AuthenticatedUser(owner_id): AuthenticatedUser,
    Path(id): Path<String>,
    Json(patch): Json<UpdateMemoryInput>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let memory = state.engine.update_memory(&owner_id, &id, patch).await.map_err(engine_error_response)?;
    Ok(Json(serde_json::to_value(memory).unwrap()))
}

pub async fn delete_memory(
    State(state): State<AppState>,
    AuthenticatedUser(owner_id): AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<StatusCode, (StatusCode, Json<Value>)> {
    state.engine.delete_memory(&owner_id, &id).await.map_err(engine_error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub query: Option<String>,
    #[serde(rename = "contextId")]
    pub context_id: Option<String>,
    pub category: Option<String>,
    pub tags: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub async fn search_memories(
    State(state): State<AppState>,
    AuthenticatedUser(owner_id): AuthenticatedUser,
    Query(params): Query<SearchParams>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let query = SearchQuery {
        owner_id,
        query: params.query,
        context_id: params.context_id,
        category: params.category,
        tags: params.tags.map(|t| t.split(',').map(str::to_string).collect()),
        limit: params.limit.map(|l| l.clamp(1, 200)),
        offset: params.offset.map(|o| o.max(0)),
    };
    let results = state.engine.search_memories(&query).map_err(engine_error_response)?;
    Ok(Json(json!({"total": results.len(), "results": results})))
}

#[derive(Debug, Deserialize)]
pub struct SemanticSearchParams {
    pub query: String,
    #[serde(rename = "topK")]
    pub top_k: Option<usize>,
    #[serde(rename = "contextId")]
    pub context_id: Option<String>,
    #[serde(rename = "minSimilarity")]
    pub min_similarity: Option<f32>,
}

pub async fn search_semantic(
    State(state): State<AppState>,
    AuthenticatedUser(owner_id): AuthenticatedUser,
    Query(params): Query<SemanticSearchParams>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let query = SemanticSearchQuery {
        owner_id,
        query: params.query,
        top_k: params.top_k.unwrap_or(10).clamp(1, 200),
        context_id: params.context_id,
        min_similarity: params.min_similarity,
    };
    let results = state.engine.search_semantic(query).await.map_err(engine_error_response)?;
    Ok(Json(json!({"total": results.len(), "results": results})))
}

#[derive(Debug, Deserialize)]
pub struct CreateContextBody {
    pub name: String,
    pub description: Option<String>,
}

pub async fn create_context(
    State(state): State<AppState>,
    AuthenticatedUser(owner_id): AuthenticatedUser,
    Json(body): Json<CreateContextBody>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let input = CreateContextInput { owner_id, name: body.name, description: body.description };
    let context = state.engine.create_context(input).map_err(engine_error_response)?;
    Ok(Json(serde_json::to_value(context).unwrap()))
}

#[derive(Debug, Deserialize)]
pub struct CreateRelationBody {
    #[serde(rename = "sourceId")]
    pub source_id: String,
    #[serde(rename = "targetId")]
    pub target_id: String,
    #[serde(rename = "relationType")]
    pub relation_type: String,
    pub strength: Option<f64>,
}

pub async fn create_relation(
    State(state): State<AppState>,
    AuthenticatedUser(owner_id): AuthenticatedUser,
    Json(body): Json<CreateRelationBody>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let input = CreateRelationInput {
        owner_id,
        source_id: body.source_id,
        target_id: body.target_id,
        relation_type: body.relation_type,
        strength: body.strength.unwrap_or(1.0),
    };
    let relation = state.engine.create_relation(input).map_err(engine_error_response)?;
    Ok(Json(serde_json::to_value(relation).unwrap()))
}

pub async fn get_memory_relations(
    State(state): State<AppState>,
    AuthenticatedUser(owner_id): AuthenticatedUser,
    Path(memory_id): Path<String>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let relations = state.engine.get_memory_relations(&owner_id, &memory_id).map_err(engine_error_response)?;
    Ok(Json(json!({"memoryId": memory_id, "relations": relations})))
}

#[derive(Debug, Deserialize)]
pub struct IngestBody {
    pub content: String,
    pub title: Option<String>,
    #[serde(rename = "contextId")]
    pub context_id: Option<String>,
}

pub async fn ingest_knowledge(
    State(state): State<AppState>,
    AuthenticatedUser(owner_id): AuthenticatedUser,
    Json(body): Json<IngestBody>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let result = state
        .engine
        .ingest_knowledge(&owner_id, body.content.as_bytes(), body.title, body.context_id)
        .await
        .map_err(engine_error_response)?;
    Ok(Json(serde_json::to_value(result).unwrap()))
}

pub async fn stats(
    State(state): State<AppState>,
    AuthenticatedUser(owner_id): AuthenticatedUser,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let stats = state.engine.get_memory_statistics(&owner_id).map_err(engine_error_response)?;
    Ok(Json(serde_json::to_value(stats).unwrap()))
}
