use axum::{
    Json, Router,
    extract::{Extension, State},
    http::StatusCode,
    routing::post,
};
use std::sync::Arc;

use crate::services::auth_service;
use crate::web::models::{
    AuthenticatedUser, LoginRequest, LoginResponse, RegisterRequest, UserResponse,
};
use crate::web::{AppError, AppJson, AppState};

async fn create_user_handler(
    State(app_state): State<Arc<AppState>>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let user = auth_service::register_user(&app_state.db, payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn token_handler(
    State(app_state): State<Arc<AppState>>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let response =
        auth_service::login_user(&app_state.db, payload, &app_state.config.jwt_secret).await?;
    Ok(Json(response))
}

pub async fn me_handler(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<UserResponse>, AppError> {
    let user = crate::db::services::user_service::find_by_id(&app_state.db, authenticated_user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    Ok(Json(UserResponse::from(user)))
}

/// Public user endpoints: registration and token issuance. The `/me` route
/// is mounted directly in `create_router` behind the auth middleware.
pub fn create_users_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_user_handler))
        .route("/token", post(token_handler))
}
