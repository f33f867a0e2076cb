use bcrypt::{DEFAULT_COST, hash};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait, error::SqlErr,
};

use crate::db::entities::{recipe, recipe_tag, tag, user};
use crate::web::error::AppError;

/// Lower-cases the domain part of an email address, leaving the local part
/// untouched. Inputs without an `@` pass through unchanged.
pub fn normalize_email(email: &str) -> String {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{local}@{}", domain.to_lowercase()),
        None => email.to_string(),
    }
}

/// Creates a new user. The email is validated and normalized before any
/// persistence happens.
pub async fn create_user(
    db: &DatabaseConnection,
    email: &str,
    password: Option<&str>,
    name: &str,
) -> Result<user::Model, AppError> {
    if email.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "email: must not be empty".to_string(),
        ));
    }
    let email = normalize_email(email);

    let password_hash = match password {
        Some(raw) => Some(
            hash(raw, DEFAULT_COST)
                .map_err(|e| AppError::PasswordHashingError(e.to_string()))?,
        ),
        None => None,
    };

    let now = Utc::now();
    let new_user = user::ActiveModel {
        email: Set(email),
        name: Set(name.to_string()),
        password_hash: Set(password_hash),
        is_active: Set(true),
        is_staff: Set(false),
        is_superuser: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    new_user.insert(db).await.map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::UserAlreadyExists("A user with this email already exists.".to_string())
        }
        _ => AppError::DatabaseError(e.to_string()),
    })
}

/// Creates a user with the staff and superuser flags set.
pub async fn create_superuser(
    db: &DatabaseConnection,
    email: &str,
    password: &str,
) -> Result<user::Model, AppError> {
    let created = create_user(db, email, Some(password), "").await?;
    let mut admin: user::ActiveModel = created.into();
    admin.is_staff = Set(true);
    admin.is_superuser = Set(true);
    Ok(admin.update(db).await?)
}

pub async fn find_by_email(
    db: &DatabaseConnection,
    email: &str,
) -> Result<Option<user::Model>, AppError> {
    Ok(user::Entity::find()
        .filter(user::Column::Email.eq(email))
        .one(db)
        .await?)
}

pub async fn find_by_id(
    db: &DatabaseConnection,
    user_id: i32,
) -> Result<Option<user::Model>, AppError> {
    Ok(user::Entity::find_by_id(user_id).one(db).await?)
}

/// Deletes a user together with everything they own: recipes, tags, and the
/// recipe-tag rows referencing either. One transaction, explicit cascade.
pub async fn delete_user(db: &DatabaseConnection, user_id: i32) -> Result<(), AppError> {
    let txn = db.begin().await?;

    let recipe_ids: Vec<i32> = recipe::Entity::find()
        .filter(recipe::Column::UserId.eq(user_id))
        .all(&txn)
        .await?
        .into_iter()
        .map(|r| r.id)
        .collect();
    let tag_ids: Vec<i32> = tag::Entity::find()
        .filter(tag::Column::UserId.eq(user_id))
        .all(&txn)
        .await?
        .into_iter()
        .map(|t| t.id)
        .collect();

    if !recipe_ids.is_empty() {
        recipe_tag::Entity::delete_many()
            .filter(recipe_tag::Column::RecipeId.is_in(recipe_ids.clone()))
            .exec(&txn)
            .await?;
    }
    if !tag_ids.is_empty() {
        recipe_tag::Entity::delete_many()
            .filter(recipe_tag::Column::TagId.is_in(tag_ids))
            .exec(&txn)
            .await?;
    }
    recipe::Entity::delete_many()
        .filter(recipe::Column::UserId.eq(user_id))
        .exec(&txn)
        .await?;
    tag::Entity::delete_many()
        .filter(tag::Column::UserId.eq(user_id))
        .exec(&txn)
        .await?;
    user::Entity::delete_by_id(user_id).exec(&txn).await?;

    txn.commit().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{ConnectOptions, Database, PaginatorTrait};

    async fn setup_db() -> DatabaseConnection {
        let mut options = ConnectOptions::new("sqlite::memory:");
        options.max_connections(1);
        let db = Database::connect(options).await.unwrap();
        crate::db::schema::create_schema(&db).await.unwrap();
        db
    }

    #[test]
    fn test_normalize_email_lowers_domain_only() {
        assert_eq!(normalize_email("Test1@ExamplE.com"), "Test1@example.com");
        assert_eq!(normalize_email("UPPER@LOWER.ORG"), "UPPER@lower.org");
    }

    #[test]
    fn test_normalize_email_trims_whitespace() {
        assert_eq!(normalize_email("  a@B.com "), "a@b.com");
    }

    #[test]
    fn test_normalize_email_without_at_passes_through() {
        assert_eq!(normalize_email("not-an-email"), "not-an-email");
    }

    #[test]
    fn test_normalize_email_uses_rightmost_at() {
        assert_eq!(normalize_email("we@ird@Domain.COM"), "we@ird@domain.com");
    }

    #[tokio::test]
    async fn test_create_user_empty_email_persists_nothing() {
        let db = setup_db().await;
        let err = create_user(&db, "   ", Some("password123"), "U")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
        assert_eq!(user::Entity::find().count(&db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_create_superuser_sets_flags() {
        let db = setup_db().await;
        let admin = create_superuser(&db, "admin@example.com", "password123")
            .await
            .unwrap();
        assert!(admin.is_staff);
        assert!(admin.is_superuser);
        assert!(admin.is_active);
    }
}
