use std::collections::HashSet;

use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter, Set};

use crate::db::entities::{favorite_recipe, prelude::*};

use super::ServiceError;

/// Bookmarks a recipe for the user. Same contract as the cart store:
/// `NotFound` for an unknown recipe, `Duplicate` for an existing pair.
pub async fn add_to_favorites(
    db: &DatabaseConnection,
    user_id: i32,
    recipe_id: i32,
) -> Result<(), ServiceError> {
    if Recipe::find_by_id(recipe_id).one(db).await?.is_none() {
        return Err(ServiceError::NotFound(format!("Recipe {recipe_id}")));
    }
    if FavoriteRecipe::find_by_id((user_id, recipe_id))
        .one(db)
        .await?
        .is_some()
    {
        return Err(ServiceError::Duplicate(format!(
            "Favorite entry for recipe {recipe_id}"
        )));
    }

    favorite_recipe::ActiveModel {
        user_id: Set(user_id),
        recipe_id: Set(recipe_id),
    }
    .insert(db)
    .await?;
    Ok(())
}

pub async fn remove_from_favorites(
    db: &DatabaseConnection,
    user_id: i32,
    recipe_id: i32,
) -> Result<(), ServiceError> {
    let entry = FavoriteRecipe::find_by_id((user_id, recipe_id))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Favorite entry for recipe {recipe_id}")))?;
    entry.delete(db).await?;
    Ok(())
}

/// Membership check backing the `is_favorited` flag; anonymous → `false`
/// without querying.
pub async fn is_favorited(
    db: &DatabaseConnection,
    user_id: Option<i32>,
    recipe_id: i32,
) -> Result<bool, ServiceError> {
    let Some(user_id) = user_id else {
        return Ok(false);
    };
    Ok(FavoriteRecipe::find_by_id((user_id, recipe_id))
        .one(db)
        .await?
        .is_some())
}

/// Which of `recipe_ids` the user has favorited, in one query.
pub async fn favorited_recipe_ids(
    db: &DatabaseConnection,
    user_id: Option<i32>,
    recipe_ids: &[i32],
) -> Result<HashSet<i32>, ServiceError> {
    let Some(user_id) = user_id else {
        return Ok(HashSet::new());
    };
    if recipe_ids.is_empty() {
        return Ok(HashSet::new());
    }
    let entries = FavoriteRecipe::find()
        .filter(favorite_recipe::Column::UserId.eq(user_id))
        .filter(favorite_recipe::Column::RecipeId.is_in(recipe_ids.iter().copied()))
        .all(db)
        .await?;
    Ok(entries.into_iter().map(|e| e.recipe_id).collect())
}

/// Ids of every recipe the user has favorited, for the `is_favorited` list
/// filter.
pub async fn favorite_recipe_ids_of_user(
    db: &DatabaseConnection,
    user_id: i32,
) -> Result<Vec<i32>, ServiceError> {
    let entries = FavoriteRecipe::find()
        .filter(favorite_recipe::Column::UserId.eq(user_id))
        .all(db)
        .await?;
    Ok(entries.into_iter().map(|e| e.recipe_id).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn anonymous_is_favorited_is_false() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        assert!(!is_favorited(&db, None, 42).await.unwrap());
    }

    #[tokio::test]
    async fn double_remove_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<favorite_recipe::Model>::new()])
            .into_connection();
        let err = remove_from_favorites(&db, 1, 2).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}
