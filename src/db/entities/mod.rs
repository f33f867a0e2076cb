//! SeaORM entities mapping to database tables.
//!
//! Each entity lives in its own module. Cascade behavior across these tables
//! is performed explicitly by the service layer, inside one transaction per
//! request, rather than relying on the relation annotations alone.

pub mod recipe;
pub mod recipe_tag;
pub mod tag;
pub mod user;
