use axum::{
    Router,
    http::Method,
    middleware as axum_middleware,
    routing::get,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::AppConfig;
use crate::web::middleware::auth;
use crate::web::routes::{recipe_routes, tag_routes, user_routes};

pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;

pub use error::{AppError, AppJson};

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<AppConfig>,
}

async fn health_check_handler() -> &'static str {
    "OK"
}

pub fn create_router(db: DatabaseConnection, config: Arc<AppConfig>) -> Router {
    let app_state = Arc::new(AppState { db, config });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(vec![
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health_check_handler))
        .route(
            "/api/users/me",
            get(user_routes::me_handler).route_layer(axum_middleware::from_fn_with_state(
                app_state.clone(),
                auth::auth,
            )),
        )
        .nest("/api/users", user_routes::create_users_router())
        .nest(
            "/api/recipes",
            recipe_routes::create_recipes_router().route_layer(
                axum_middleware::from_fn_with_state(app_state.clone(), auth::auth),
            ),
        )
        .nest(
            "/api/tags",
            tag_routes::create_tags_router().route_layer(axum_middleware::from_fn_with_state(
                app_state.clone(),
                auth::auth,
            )),
        )
        .with_state(app_state)
        .layer(cors)
}
