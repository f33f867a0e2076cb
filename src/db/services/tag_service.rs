use chrono::Utc;
use std::collections::HashMap;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, JoinType,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait, error::SqlErr,
};

use crate::db::entities::{recipe_tag, tag};
use crate::web::error::AppError;

fn validate_name(name: &str) -> Result<&str, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::InvalidInput("name: must not be empty".to_string()));
    }
    Ok(name)
}

/// Retrieves all tags owned by a user, ordered by name descending.
pub async fn list_tags(
    db: &DatabaseConnection,
    user_id: i32,
) -> Result<Vec<tag::Model>, AppError> {
    Ok(tag::Entity::find()
        .filter(tag::Column::UserId.eq(user_id))
        .order_by_desc(tag::Column::Name)
        .all(db)
        .await?)
}

/// Creates a new tag for a user.
pub async fn create_tag(
    db: &DatabaseConnection,
    user_id: i32,
    name: &str,
) -> Result<tag::Model, AppError> {
    let name = validate_name(name)?;
    let now = Utc::now();
    let new_tag = tag::ActiveModel {
        user_id: Set(user_id),
        name: Set(name.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    new_tag.insert(db).await.map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("A tag with this name already exists.".to_string())
        }
        _ => AppError::DatabaseError(e.to_string()),
    })
}

/// Renames a tag. A tag id owned by another user is reported as not found.
pub async fn update_tag(
    db: &DatabaseConnection,
    tag_id: i32,
    user_id: i32,
    name: &str,
) -> Result<tag::Model, AppError> {
    let name = validate_name(name)?;
    let existing = tag::Entity::find_by_id(tag_id)
        .filter(tag::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Tag not found".to_string()))?;

    let mut active: tag::ActiveModel = existing.into();
    active.name = Set(name.to_string());
    active.updated_at = Set(Utc::now());
    active.update(db).await.map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("A tag with this name already exists.".to_string())
        }
        _ => AppError::DatabaseError(e.to_string()),
    })
}

/// Deletes a tag and its recipe associations. The tag's recipes themselves
/// are untouched. Cross-owner ids are reported as not found.
pub async fn delete_tag(
    db: &DatabaseConnection,
    tag_id: i32,
    user_id: i32,
) -> Result<(), AppError> {
    let txn = db.begin().await?;

    tag::Entity::find_by_id(tag_id)
        .filter(tag::Column::UserId.eq(user_id))
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Tag not found".to_string()))?;

    recipe_tag::Entity::delete_many()
        .filter(recipe_tag::Column::TagId.eq(tag_id))
        .exec(&txn)
        .await?;
    tag::Entity::delete_by_id(tag_id).exec(&txn).await?;

    txn.commit().await?;
    Ok(())
}

/// Returns the existing tag for `(user_id, name)` or creates it.
///
/// The insert is issued as a single on-conflict-do-nothing statement rather
/// than a separate existence check, so two concurrent callers for the same
/// owner and name converge on one row (backed by the unique index on
/// `(user_id, name)`).
pub async fn get_or_create_tag<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    name: &str,
) -> Result<tag::Model, AppError> {
    let name = validate_name(name)?;
    let now = Utc::now();
    let candidate = tag::ActiveModel {
        user_id: Set(user_id),
        name: Set(name.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    tag::Entity::insert(candidate)
        .on_conflict(
            OnConflict::columns([tag::Column::UserId, tag::Column::Name])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;

    tag::Entity::find()
        .filter(tag::Column::UserId.eq(user_id))
        .filter(tag::Column::Name.eq(name))
        .one(conn)
        .await?
        .ok_or_else(|| {
            AppError::DatabaseError(format!("tag '{name}' missing after get-or-create"))
        })
}

/// Retrieves the tags attached to each of the given recipes in one query,
/// keyed by recipe id. Tags within a recipe are ordered by name descending.
pub async fn tags_for_recipes<C: ConnectionTrait>(
    conn: &C,
    recipe_ids: &[i32],
) -> Result<HashMap<i32, Vec<tag::Model>>, AppError> {
    if recipe_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = recipe_tag::Entity::find()
        .find_also_related(tag::Entity)
        .filter(recipe_tag::Column::RecipeId.is_in(recipe_ids.to_vec()))
        .order_by_desc(tag::Column::Name)
        .all(conn)
        .await?;

    let mut by_recipe: HashMap<i32, Vec<tag::Model>> = HashMap::new();
    for (link, tag) in rows {
        if let Some(tag) = tag {
            by_recipe.entry(link.recipe_id).or_default().push(tag);
        }
    }
    Ok(by_recipe)
}

/// Retrieves the tags attached to a recipe, ordered by name descending.
pub async fn tags_for_recipe<C: ConnectionTrait>(
    conn: &C,
    recipe_id: i32,
) -> Result<Vec<tag::Model>, AppError> {
    Ok(tag::Entity::find()
        .join(JoinType::InnerJoin, recipe_tag::Relation::Tag.def().rev())
        .filter(recipe_tag::Column::RecipeId.eq(recipe_id))
        .order_by_desc(tag::Column::Name)
        .all(conn)
        .await?)
}
