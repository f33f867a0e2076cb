use axum::{
    Json, Router,
    extract::{Extension, Path, State},
    http::StatusCode,
    routing::{get, patch},
};
use serde::Deserialize;
use std::sync::Arc;

use crate::db::services;
use crate::web::models::{AuthenticatedUser, TagResponse};
use crate::web::{AppError, AppJson, AppState};

// --- Request Structs ---

#[derive(Deserialize)]
pub struct CreateTagRequest {
    name: String,
}

#[derive(Deserialize)]
pub struct UpdateTagRequest {
    name: String,
}

// --- Route Handlers ---

async fn list_tags_handler(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<TagResponse>>, AppError> {
    let tags = services::list_tags(&app_state.db, authenticated_user.id).await?;
    Ok(Json(tags.into_iter().map(TagResponse::from).collect()))
}

async fn create_tag_handler(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    AppJson(payload): AppJson<CreateTagRequest>,
) -> Result<(StatusCode, Json<TagResponse>), AppError> {
    let tag = services::create_tag(&app_state.db, authenticated_user.id, &payload.name).await?;
    Ok((StatusCode::CREATED, Json(TagResponse::from(tag))))
}

async fn update_tag_handler(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(tag_id): Path<i32>,
    AppJson(payload): AppJson<UpdateTagRequest>,
) -> Result<Json<TagResponse>, AppError> {
    let tag =
        services::update_tag(&app_state.db, tag_id, authenticated_user.id, &payload.name).await?;
    Ok(Json(TagResponse::from(tag)))
}

async fn delete_tag_handler(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(tag_id): Path<i32>,
) -> Result<StatusCode, AppError> {
    services::delete_tag(&app_state.db, tag_id, authenticated_user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Router ---

pub fn create_tags_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_tags_handler).post(create_tag_handler))
        .route(
            "/{tag_id}",
            patch(update_tag_handler).delete(delete_tag_handler),
        )
}
