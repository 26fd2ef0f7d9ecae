//! The `services` module provides a high-level API for interacting with the
//! database. It encapsulates the query logic and data access patterns so the
//! HTTP handlers can work with domain models without knowing about the
//! underlying schema.
//!
//! One sub-module per domain area; public items are re-exported here for
//! convenient access under the `crate::db::services::` path.

use sea_orm::DbErr;

pub mod cart_service;
pub mod favorite_service;
pub mod ingredient_service;
pub mod recipe_service;
pub mod shopping_list_service;
pub mod subscription_service;
pub mod tag_service;
pub mod user_service;

pub use cart_service::*;
pub use favorite_service::*;
pub use ingredient_service::*;
pub use recipe_service::*;
pub use shopping_list_service::*;
pub use subscription_service::*;
pub use tag_service::*;
pub use user_service::*;

/// Error surface shared by every data-access service. All variants except
/// `Db` map to client-facing 4xx responses; see `web::error`.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    Db(#[from] DbErr),
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("{0} already exists")]
    Duplicate(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("Operation allowed only for the author")]
    Forbidden,
}
