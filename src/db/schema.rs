//! Creates the tables and indexes from the entity definitions.
//!
//! Used for the SQLite backend (development and tests). Postgres deployments
//! are expected to manage the schema with external migration tooling.

use sea_orm::sea_query::Index;
use sea_orm::{ConnectionTrait, DbErr, Schema};

use super::entities::{recipe, recipe_tag, tag, user};

pub async fn create_schema<C: ConnectionTrait>(db: &C) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    let mut users = schema.create_table_from_entity(user::Entity);
    users.if_not_exists();
    db.execute(backend.build(&users)).await?;

    let mut tags = schema.create_table_from_entity(tag::Entity);
    tags.if_not_exists();
    db.execute(backend.build(&tags)).await?;

    let mut recipes = schema.create_table_from_entity(recipe::Entity);
    recipes.if_not_exists();
    db.execute(backend.build(&recipes)).await?;

    let mut recipe_tags = schema.create_table_from_entity(recipe_tag::Entity);
    recipe_tags.if_not_exists();
    db.execute(backend.build(&recipe_tags)).await?;

    // (user_id, name) uniqueness backs the atomic get-or-create used by tag
    // reconciliation: concurrent racers lose the insert and reuse the
    // winner's row.
    let tag_owner_name = Index::create()
        .name("idx_tags_user_id_name")
        .table(tag::Entity)
        .col(tag::Column::UserId)
        .col(tag::Column::Name)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(backend.build(&tag_owner_name)).await?;

    Ok(())
}
