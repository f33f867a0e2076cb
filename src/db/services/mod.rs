//! Data access services. Functions take a connection handle and a caller id;
//! every read and write is scoped to the owning user.

pub mod recipe_service;
pub mod tag_service;
pub mod user_service;

pub use recipe_service::*;
pub use tag_service::*;
pub use user_service::*;
