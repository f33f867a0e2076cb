use axum::{
    Json, Router,
    extract::{Extension, Path, State},
    http::StatusCode,
    routing::get,
};
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use std::sync::Arc;

use crate::db::entities::recipe;
use crate::db::services::{self, NewRecipe, RecipeChanges};
use crate::web::models::{AuthenticatedUser, RecipeDetail, RecipeSummary};
use crate::web::{AppError, AppJson, AppState};

// --- Request Structs ---

#[derive(Deserialize)]
pub struct TagName {
    name: String,
}

#[derive(Deserialize)]
pub struct CreateRecipeRequest {
    title: String,
    price: Decimal,
    time_minutes: i32,
    description: String,
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    tags: Option<Vec<TagName>>,
}

/// Partial update. Unknown fields in the payload (notably `user`) are
/// dropped by serde and can never reach the merge logic. An absent `tags`
/// field leaves the recipe's tag set untouched.
#[derive(Deserialize, Default)]
pub struct PatchRecipeRequest {
    title: Option<String>,
    price: Option<Decimal>,
    time_minutes: Option<i32>,
    description: Option<String>,
    link: Option<String>,
    tags: Option<Vec<TagName>>,
}

#[derive(Deserialize)]
pub struct ReplaceRecipeRequest {
    title: String,
    price: Decimal,
    time_minutes: i32,
    description: String,
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    tags: Option<Vec<TagName>>,
}

fn tag_names(tags: Option<Vec<TagName>>) -> Option<Vec<String>> {
    tags.map(|tags| tags.into_iter().map(|t| t.name).collect())
}

async fn to_detail(db: &DatabaseConnection, model: recipe::Model) -> Result<RecipeDetail, AppError> {
    let tags = services::tags_for_recipe(db, model.id).await?;
    Ok(RecipeDetail::from_model(model, tags))
}

// --- Route Handlers ---

async fn list_recipes_handler(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<RecipeSummary>>, AppError> {
    let recipes = services::list_recipes(&app_state.db, authenticated_user.id).await?;
    let recipe_ids: Vec<i32> = recipes.iter().map(|r| r.id).collect();
    let mut tags_by_recipe = services::tags_for_recipes(&app_state.db, &recipe_ids).await?;

    let summaries = recipes
        .into_iter()
        .map(|model| {
            let tags = tags_by_recipe.remove(&model.id).unwrap_or_default();
            RecipeSummary::from_model(model, tags)
        })
        .collect();
    Ok(Json(summaries))
}

async fn create_recipe_handler(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    AppJson(payload): AppJson<CreateRecipeRequest>,
) -> Result<(StatusCode, Json<RecipeDetail>), AppError> {
    let data = NewRecipe {
        title: payload.title,
        price: payload.price,
        time_minutes: payload.time_minutes,
        description: payload.description,
        link: payload.link,
    };
    let created = services::create_recipe(
        &app_state.db,
        authenticated_user.id,
        data,
        tag_names(payload.tags),
    )
    .await?;
    let detail = to_detail(&app_state.db, created).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

async fn get_recipe_handler(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(recipe_id): Path<i32>,
) -> Result<Json<RecipeDetail>, AppError> {
    let model = services::get_recipe(&app_state.db, recipe_id, authenticated_user.id).await?;
    Ok(Json(to_detail(&app_state.db, model).await?))
}

async fn patch_recipe_handler(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(recipe_id): Path<i32>,
    AppJson(payload): AppJson<PatchRecipeRequest>,
) -> Result<Json<RecipeDetail>, AppError> {
    let changes = RecipeChanges {
        title: payload.title,
        price: payload.price,
        time_minutes: payload.time_minutes,
        description: payload.description,
        link: payload.link,
    };
    let updated = services::update_recipe(
        &app_state.db,
        recipe_id,
        authenticated_user.id,
        changes,
        tag_names(payload.tags),
    )
    .await?;
    Ok(Json(to_detail(&app_state.db, updated).await?))
}

async fn replace_recipe_handler(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(recipe_id): Path<i32>,
    AppJson(payload): AppJson<ReplaceRecipeRequest>,
) -> Result<Json<RecipeDetail>, AppError> {
    let changes = RecipeChanges {
        title: Some(payload.title),
        price: Some(payload.price),
        time_minutes: Some(payload.time_minutes),
        description: Some(payload.description),
        link: Some(payload.link.unwrap_or_default()),
    };
    let updated = services::update_recipe(
        &app_state.db,
        recipe_id,
        authenticated_user.id,
        changes,
        tag_names(payload.tags),
    )
    .await?;
    Ok(Json(to_detail(&app_state.db, updated).await?))
}

async fn delete_recipe_handler(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(recipe_id): Path<i32>,
) -> Result<StatusCode, AppError> {
    services::delete_recipe(&app_state.db, recipe_id, authenticated_user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Router ---

pub fn create_recipes_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_recipes_handler).post(create_recipe_handler))
        .route(
            "/{recipe_id}",
            get(get_recipe_handler)
                .patch(patch_recipe_handler)
                .put(replace_recipe_handler)
                .delete(delete_recipe_handler),
        )
}
