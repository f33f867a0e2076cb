use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};

use crate::db::entities::{recipe, recipe_tag};
use crate::db::services::tag_service;
use crate::web::error::AppError;

pub struct NewRecipe {
    pub title: String,
    pub price: Decimal,
    pub time_minutes: i32,
    pub description: String,
    pub link: Option<String>,
}

/// Field-by-field changes for a recipe update. Every mutable field is
/// enumerated here; the owner deliberately is not, so no payload can move a
/// recipe to another user.
///
/// `link: Some("")` stores NULL — the empty string is the wire form for
/// clearing the link, since an absent field means "leave unchanged".
#[derive(Default)]
pub struct RecipeChanges {
    pub title: Option<String>,
    pub price: Option<Decimal>,
    pub time_minutes: Option<i32>,
    pub description: Option<String>,
    pub link: Option<String>,
}

fn apply_changes(model: recipe::Model, changes: RecipeChanges) -> recipe::ActiveModel {
    let mut active: recipe::ActiveModel = model.into();
    if let Some(title) = changes.title {
        active.title = Set(title);
    }
    if let Some(price) = changes.price {
        active.price = Set(price);
    }
    if let Some(time_minutes) = changes.time_minutes {
        active.time_minutes = Set(time_minutes);
    }
    if let Some(description) = changes.description {
        active.description = Set(description);
    }
    if let Some(link) = changes.link {
        active.link = Set(if link.is_empty() { None } else { Some(link) });
    }
    active.updated_at = Set(Utc::now());
    active
}

/// Retrieves all recipes owned by a user, most recently created first.
pub async fn list_recipes(
    db: &DatabaseConnection,
    user_id: i32,
) -> Result<Vec<recipe::Model>, AppError> {
    Ok(recipe::Entity::find()
        .filter(recipe::Column::UserId.eq(user_id))
        .order_by_desc(recipe::Column::Id)
        .all(db)
        .await?)
}

/// Retrieves one recipe by id, scoped to its owner. An id owned by another
/// user is indistinguishable from a missing one.
pub async fn get_recipe(
    db: &DatabaseConnection,
    recipe_id: i32,
    user_id: i32,
) -> Result<recipe::Model, AppError> {
    recipe::Entity::find_by_id(recipe_id)
        .filter(recipe::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Recipe not found".to_string()))
}

/// Creates a recipe for a user and attaches its tags, in one transaction.
pub async fn create_recipe(
    db: &DatabaseConnection,
    user_id: i32,
    data: NewRecipe,
    tag_names: Option<Vec<String>>,
) -> Result<recipe::Model, AppError> {
    let txn = db.begin().await?;

    let now = Utc::now();
    let created = recipe::ActiveModel {
        user_id: Set(user_id),
        title: Set(data.title),
        price: Set(data.price),
        time_minutes: Set(data.time_minutes),
        description: Set(data.description),
        link: Set(data.link),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    if let Some(names) = tag_names {
        reconcile_tags(&txn, user_id, created.id, &names).await?;
    }

    txn.commit().await?;
    Ok(created)
}

/// Updates a recipe's fields and, when `tag_names` is present, reconciles its
/// tag set. An absent tag list leaves the associations untouched.
pub async fn update_recipe(
    db: &DatabaseConnection,
    recipe_id: i32,
    user_id: i32,
    changes: RecipeChanges,
    tag_names: Option<Vec<String>>,
) -> Result<recipe::Model, AppError> {
    let txn = db.begin().await?;

    let existing = recipe::Entity::find_by_id(recipe_id)
        .filter(recipe::Column::UserId.eq(user_id))
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Recipe not found".to_string()))?;

    let updated = apply_changes(existing, changes).update(&txn).await?;

    if let Some(names) = tag_names {
        reconcile_tags(&txn, user_id, recipe_id, &names).await?;
    }

    txn.commit().await?;
    Ok(updated)
}

/// Deletes a recipe and its tag associations. Tags survive. Cross-owner ids
/// are reported as not found and nothing is removed.
pub async fn delete_recipe(
    db: &DatabaseConnection,
    recipe_id: i32,
    user_id: i32,
) -> Result<(), AppError> {
    let txn = db.begin().await?;

    recipe::Entity::find_by_id(recipe_id)
        .filter(recipe::Column::UserId.eq(user_id))
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Recipe not found".to_string()))?;

    recipe_tag::Entity::delete_many()
        .filter(recipe_tag::Column::RecipeId.eq(recipe_id))
        .exec(&txn)
        .await?;
    recipe::Entity::delete_by_id(recipe_id).exec(&txn).await?;

    txn.commit().await?;
    Ok(())
}

/// Makes the recipe's tag set match `names`: clears the current associations,
/// then get-or-creates each name within the caller's scope and attaches it.
///
/// Tags are always resolved against the calling user, never another owner,
/// so a payload naming a foreign user's tag gets a fresh tag for the caller
/// instead. Duplicate names in the input attach once. An empty list just
/// clears.
pub async fn reconcile_tags<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    recipe_id: i32,
    names: &[String],
) -> Result<(), AppError> {
    recipe_tag::Entity::delete_many()
        .filter(recipe_tag::Column::RecipeId.eq(recipe_id))
        .exec(conn)
        .await?;

    for name in names {
        let tag = tag_service::get_or_create_tag(conn, user_id, name).await?;
        recipe_tag::Entity::insert(recipe_tag::ActiveModel {
            recipe_id: Set(recipe_id),
            tag_id: Set(tag.id),
        })
        .on_conflict(
            OnConflict::columns([recipe_tag::Column::RecipeId, recipe_tag::Column::TagId])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::entities::tag;
    use crate::db::services::user_service;
    use sea_orm::{ConnectOptions, Database, DatabaseConnection, PaginatorTrait};

    async fn setup_db() -> DatabaseConnection {
        let mut options = ConnectOptions::new("sqlite::memory:");
        options.max_connections(1);
        let db = Database::connect(options).await.unwrap();
        crate::db::schema::create_schema(&db).await.unwrap();
        db
    }

    async fn seed_user(db: &DatabaseConnection, email: &str) -> i32 {
        user_service::create_user(db, email, Some("password123"), "Test User")
            .await
            .unwrap()
            .id
    }

    fn sample_recipe(title: &str) -> NewRecipe {
        NewRecipe {
            title: title.to_string(),
            price: "5.50".parse().unwrap(),
            time_minutes: 10,
            description: "Sample".to_string(),
            link: None,
        }
    }

    #[tokio::test]
    async fn test_get_or_create_reuses_existing_tag() {
        let db = setup_db().await;
        let user_id = seed_user(&db, "u1@example.com").await;

        let first = tag_service::get_or_create_tag(&db, user_id, "thai")
            .await
            .unwrap();
        let second = tag_service::get_or_create_tag(&db, user_id, "thai")
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        let count = tag::Entity::find().count(&db).await.unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_get_or_create_scopes_by_owner() {
        let db = setup_db().await;
        let u1 = seed_user(&db, "u1@example.com").await;
        let u2 = seed_user(&db, "u2@example.com").await;

        let t1 = tag_service::get_or_create_tag(&db, u1, "thai").await.unwrap();
        let t2 = tag_service::get_or_create_tag(&db, u2, "thai").await.unwrap();

        assert_ne!(t1.id, t2.id);
    }

    #[tokio::test]
    async fn test_reconcile_empty_list_clears_associations() {
        let db = setup_db().await;
        let user_id = seed_user(&db, "u1@example.com").await;
        let created = create_recipe(
            &db,
            user_id,
            sample_recipe("Pad Thai"),
            Some(vec!["thai".to_string(), "dinner".to_string()]),
        )
        .await
        .unwrap();

        reconcile_tags(&db, user_id, created.id, &[]).await.unwrap();

        let attached = tag_service::tags_for_recipe(&db, created.id).await.unwrap();
        assert!(attached.is_empty());
        // The tags themselves survive detachment.
        let count = tag::Entity::find().count(&db).await.unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn test_reconcile_replaces_and_reuses() {
        let db = setup_db().await;
        let user_id = seed_user(&db, "u1@example.com").await;
        let created = create_recipe(
            &db,
            user_id,
            sample_recipe("Pad Thai"),
            Some(vec!["thai".to_string(), "dinner".to_string()]),
        )
        .await
        .unwrap();

        reconcile_tags(
            &db,
            user_id,
            created.id,
            &["thai".to_string(), "indian".to_string()],
        )
        .await
        .unwrap();

        let attached = tag_service::tags_for_recipe(&db, created.id).await.unwrap();
        let mut names: Vec<&str> = attached.iter().map(|t| t.name.as_str()).collect();
        names.sort();
        assert_eq!(names, vec!["indian", "thai"]);
        // "thai" was reused, so three distinct tags exist in total.
        let count = tag::Entity::find().count(&db).await.unwrap();
        assert_eq!(count, 3);
    }

    #[tokio::test]
    async fn test_reconcile_duplicate_names_attach_once() {
        let db = setup_db().await;
        let user_id = seed_user(&db, "u1@example.com").await;
        let created = create_recipe(&db, user_id, sample_recipe("Pad Thai"), None)
            .await
            .unwrap();

        reconcile_tags(
            &db,
            user_id,
            created.id,
            &["thai".to_string(), "thai".to_string()],
        )
        .await
        .unwrap();

        let attached = tag_service::tags_for_recipe(&db, created.id).await.unwrap();
        assert_eq!(attached.len(), 1);
    }

    #[tokio::test]
    async fn test_update_absent_tags_leaves_associations() {
        let db = setup_db().await;
        let user_id = seed_user(&db, "u1@example.com").await;
        let created = create_recipe(
            &db,
            user_id,
            sample_recipe("Pad Thai"),
            Some(vec!["thai".to_string()]),
        )
        .await
        .unwrap();

        let changes = RecipeChanges {
            title: Some("Pad See Ew".to_string()),
            ..Default::default()
        };
        let updated = update_recipe(&db, created.id, user_id, changes, None)
            .await
            .unwrap();

        assert_eq!(updated.title, "Pad See Ew");
        let attached = tag_service::tags_for_recipe(&db, created.id).await.unwrap();
        assert_eq!(attached.len(), 1);
        assert_eq!(attached[0].name, "thai");
    }

    #[tokio::test]
    async fn test_update_empty_link_clears_stored_link() {
        let db = setup_db().await;
        let user_id = seed_user(&db, "u1@example.com").await;
        let mut new_recipe = sample_recipe("Pad Thai");
        new_recipe.link = Some("https://example.com/pad-thai".to_string());
        let created = create_recipe(&db, user_id, new_recipe, None).await.unwrap();
        assert!(created.link.is_some());

        let changes = RecipeChanges {
            link: Some(String::new()),
            ..Default::default()
        };
        let updated = update_recipe(&db, created.id, user_id, changes, None)
            .await
            .unwrap();

        assert_eq!(updated.link, None);
    }

    #[tokio::test]
    async fn test_scoped_get_masks_foreign_recipe() {
        let db = setup_db().await;
        let u1 = seed_user(&db, "u1@example.com").await;
        let u2 = seed_user(&db, "u2@example.com").await;
        let created = create_recipe(&db, u1, sample_recipe("Pad Thai"), None)
            .await
            .unwrap();

        let err = get_recipe(&db, created.id, u2).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(list_recipes(&db, u2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_user_cascades_explicitly() {
        let db = setup_db().await;
        let user_id = seed_user(&db, "u1@example.com").await;
        create_recipe(
            &db,
            user_id,
            sample_recipe("Pad Thai"),
            Some(vec!["thai".to_string()]),
        )
        .await
        .unwrap();

        user_service::delete_user(&db, user_id).await.unwrap();

        assert_eq!(recipe::Entity::find().count(&db).await.unwrap(), 0);
        assert_eq!(tag::Entity::find().count(&db).await.unwrap(), 0);
        assert_eq!(recipe_tag::Entity::find().count(&db).await.unwrap(), 0);
    }
}
