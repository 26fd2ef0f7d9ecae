use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryOrder, Set};

use crate::db::entities::{prelude::*, user};

use super::ServiceError;

pub async fn get_user(db: &DatabaseConnection, id: i32) -> Result<user::Model, ServiceError> {
    User::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("User {id}")))
}

/// Users in username order with the total count for pagination.
pub async fn list_users(
    db: &DatabaseConnection,
    page: u64,
    limit: u64,
) -> Result<(u64, Vec<user::Model>), ServiceError> {
    let paginator = User::find()
        .order_by_asc(user::Column::Username)
        .paginate(db, limit.max(1));
    let total = paginator.num_items().await?;
    let models = paginator.fetch_page(page.saturating_sub(1)).await?;
    Ok((total, models))
}

/// Replaces the avatar; the value is an opaque string (URL or data URI).
pub async fn set_avatar(
    db: &DatabaseConnection,
    user_id: i32,
    avatar: Option<String>,
) -> Result<user::Model, ServiceError> {
    let existing = get_user(db, user_id).await?;
    let mut active: user::ActiveModel = existing.into();
    active.avatar = Set(avatar);
    active.updated_at = Set(chrono::Utc::now());
    Ok(active.update(db).await?)
}
