use bcrypt::verify;
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use sea_orm::DatabaseConnection;

use crate::db::entities::user;
use crate::db::services::user_service;
use crate::web::error::AppError;
use crate::web::models::{Claims, LoginRequest, LoginResponse, RegisterRequest, UserResponse};

pub async fn register_user(
    db: &DatabaseConnection,
    req: RegisterRequest,
) -> Result<UserResponse, AppError> {
    if req.password.len() < 8 {
        return Err(AppError::InvalidInput(
            "password: must be at least 8 characters long".to_string(),
        ));
    }

    let created = user_service::create_user(db, &req.email, Some(&req.password), &req.name).await?;
    Ok(UserResponse::from(created))
}

pub async fn login_user(
    db: &DatabaseConnection,
    req: LoginRequest,
    jwt_secret: &str,
) -> Result<LoginResponse, AppError> {
    if req.email.is_empty() || req.password.is_empty() {
        return Err(AppError::InvalidInput(
            "email and password must not be empty".to_string(),
        ));
    }

    let email = user_service::normalize_email(&req.email);
    let user = user_service::find_by_email(db, &email)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if !user.is_active {
        return Err(AppError::InvalidCredentials);
    }

    let password_hash = user
        .password_hash
        .as_ref()
        .ok_or(AppError::InvalidCredentials)?;

    let valid = verify(&req.password, password_hash)
        .map_err(|e| AppError::InternalServerError(format!("Password verification failed: {e}")))?;
    if !valid {
        return Err(AppError::InvalidCredentials);
    }

    create_jwt_for_user(&user, jwt_secret)
}

pub fn create_jwt_for_user(user: &user::Model, jwt_secret: &str) -> Result<LoginResponse, AppError> {
    let now = Utc::now();
    // Token valid for 24 hours
    let expiration = (now + Duration::hours(24)).timestamp() as usize;

    let claims = Claims {
        sub: user.email.clone(),
        user_id: user.id,
        exp: expiration,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_ref()),
    )
    .map_err(|e| AppError::TokenCreationError(e.to_string()))?;

    Ok(LoginResponse {
        token,
        user_id: user.id,
        email: user.email.clone(),
    })
}
