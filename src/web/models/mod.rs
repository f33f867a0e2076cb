use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::db::entities::{recipe, tag, user};

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i32,
    pub email: String,
    pub name: String,
}

impl From<user::Model> for UserResponse {
    fn from(model: user::Model) -> Self {
        UserResponse {
            id: model.id,
            email: model.email,
            name: model.name,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user_id: i32,
    pub email: String,
}

// JWT Claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // email
    pub user_id: i32,
    pub exp: usize,
}

/// Authenticated caller details, passed to handlers as a request extension.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: i32,
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TagResponse {
    pub id: i32,
    pub name: String,
}

impl From<tag::Model> for TagResponse {
    fn from(model: tag::Model) -> Self {
        TagResponse {
            id: model.id,
            name: model.name,
        }
    }
}

/// List-view shape of a recipe: everything but the description.
#[derive(Debug, Serialize, Deserialize)]
pub struct RecipeSummary {
    pub id: i32,
    pub title: String,
    pub price: Decimal,
    pub time_minutes: i32,
    pub link: Option<String>,
    pub tags: Vec<TagResponse>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecipeDetail {
    pub id: i32,
    pub title: String,
    pub price: Decimal,
    pub time_minutes: i32,
    pub description: String,
    pub link: Option<String>,
    pub tags: Vec<TagResponse>,
}

impl RecipeSummary {
    pub fn from_model(model: recipe::Model, tags: Vec<tag::Model>) -> Self {
        RecipeSummary {
            id: model.id,
            title: model.title,
            price: model.price,
            time_minutes: model.time_minutes,
            link: model.link,
            tags: tags.into_iter().map(TagResponse::from).collect(),
        }
    }
}

impl RecipeDetail {
    pub fn from_model(model: recipe::Model, tags: Vec<tag::Model>) -> Self {
        RecipeDetail {
            id: model.id,
            title: model.title,
            price: model.price,
            time_minutes: model.time_minutes,
            description: model.description,
            link: model.link,
            tags: tags.into_iter().map(TagResponse::from).collect(),
        }
    }
}
