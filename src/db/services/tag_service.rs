use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder};

use crate::db::entities::{tag, prelude::*};

use super::ServiceError;

pub async fn list_tags(db: &DatabaseConnection) -> Result<Vec<tag::Model>, ServiceError> {
    Ok(Tag::find().order_by_asc(tag::Column::Id).all(db).await?)
}

pub async fn get_tag(db: &DatabaseConnection, id: i32) -> Result<tag::Model, ServiceError> {
    Tag::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Tag {id}")))
}
