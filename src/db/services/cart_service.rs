use std::collections::HashSet;

use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter, Set};

use crate::db::entities::{cart_recipe, prelude::*};

use super::ServiceError;

/// Adds a recipe to the user's shopping cart.
///
/// Fails with `NotFound` when the recipe does not exist and with
/// `Duplicate` when the pair is already present; a duplicate is rejected,
/// never merged.
pub async fn add_to_cart(
    db: &DatabaseConnection,
    user_id: i32,
    recipe_id: i32,
) -> Result<(), ServiceError> {
    if Recipe::find_by_id(recipe_id).one(db).await?.is_none() {
        return Err(ServiceError::NotFound(format!("Recipe {recipe_id}")));
    }
    if CartRecipe::find_by_id((user_id, recipe_id))
        .one(db)
        .await?
        .is_some()
    {
        return Err(ServiceError::Duplicate(format!(
            "Cart entry for recipe {recipe_id}"
        )));
    }

    cart_recipe::ActiveModel {
        user_id: Set(user_id),
        recipe_id: Set(recipe_id),
    }
    .insert(db)
    .await?;
    Ok(())
}

/// Removes a recipe from the user's cart; `NotFound` when it was not there.
pub async fn remove_from_cart(
    db: &DatabaseConnection,
    user_id: i32,
    recipe_id: i32,
) -> Result<(), ServiceError> {
    let entry = CartRecipe::find_by_id((user_id, recipe_id))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Cart entry for recipe {recipe_id}")))?;
    entry.delete(db).await?;
    Ok(())
}

/// Ids of every recipe currently in the user's cart. Order is irrelevant to
/// the callers.
pub async fn cart_recipe_ids(
    db: &DatabaseConnection,
    user_id: i32,
) -> Result<Vec<i32>, ServiceError> {
    let entries = CartRecipe::find()
        .filter(cart_recipe::Column::UserId.eq(user_id))
        .all(db)
        .await?;
    Ok(entries.into_iter().map(|e| e.recipe_id).collect())
}

/// Membership check backing the `is_in_shopping_cart` flag. An anonymous
/// requester always resolves to `false` without touching the store.
pub async fn is_in_shopping_cart(
    db: &DatabaseConnection,
    user_id: Option<i32>,
    recipe_id: i32,
) -> Result<bool, ServiceError> {
    let Some(user_id) = user_id else {
        return Ok(false);
    };
    Ok(CartRecipe::find_by_id((user_id, recipe_id))
        .one(db)
        .await?
        .is_some())
}

/// Batch variant of [`is_in_shopping_cart`] used when serializing recipe
/// lists: one query instead of one per recipe.
pub async fn in_cart_recipe_ids(
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
    let entries = CartRecipe::find()
        .filter(cart_recipe::Column::UserId.eq(user_id))
        .filter(cart_recipe::Column::RecipeId.is_in(recipe_ids.iter().copied()))
        .all(db)
        .await?;
    Ok(entries.into_iter().map(|e| e.recipe_id).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn recipe_row(id: i32) -> crate::db::entities::recipe::Model {
        crate::db::entities::recipe::Model {
            id,
            author_id: 1,
            name: "Борщ".to_string(),
            text: "Варить.".to_string(),
            image: "data:image/png;base64,xyz".to_string(),
            cooking_time: 90,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn add_existing_pair_is_rejected() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![recipe_row(7)]])
            .append_query_results([vec![cart_recipe::Model {
                user_id: 3,
                recipe_id: 7,
            }]])
            .into_connection();

        let err = add_to_cart(&db, 3, 7).await.unwrap_err();
        assert!(matches!(err, ServiceError::Duplicate(_)));
    }

    #[tokio::test]
    async fn add_unknown_recipe_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<crate::db::entities::recipe::Model>::new()])
            .into_connection();

        let err = add_to_cart(&db, 3, 99).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn remove_missing_pair_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<cart_recipe::Model>::new()])
            .into_connection();

        let err = remove_from_cart(&db, 3, 7).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn anonymous_flag_is_false_without_queries() {
        // No results queued: any query would make the mock error out.
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        assert!(!is_in_shopping_cart(&db, None, 7).await.unwrap());
        assert!(in_cart_recipe_ids(&db, None, &[1, 2]).await.unwrap().is_empty());
    }
}
