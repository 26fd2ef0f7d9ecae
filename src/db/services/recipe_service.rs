use std::collections::{HashMap, HashSet};

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};

use crate::db::entities::{
    ingredient, ingredient_amount, prelude::*, recipe, recipe_ingredient, recipe_tag, tag, user,
};

use super::ServiceError;

pub const MIN_AMOUNT: i32 = 1;
pub const MAX_AMOUNT: i32 = 32000;
pub const MIN_COOKING_TIME: i32 = 1;
pub const MAX_COOKING_TIME: i32 = 32000;

/// One (ingredient, amount) pair as supplied by the author.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngredientEntry {
    pub ingredient_id: i32,
    pub amount: i32,
}

#[derive(Debug, Clone)]
pub struct NewRecipe {
    pub name: String,
    pub text: String,
    pub image: String,
    pub cooking_time: i32,
    pub tag_ids: Vec<i32>,
    pub ingredients: Vec<IngredientEntry>,
}

/// Partial update: `None` fields mean "leave unchanged". A present tag or
/// ingredient list fully replaces the existing links and is validated the
/// same way as on create, so an empty or duplicated list is rejected.
#[derive(Debug, Clone, Default)]
pub struct RecipeUpdate {
    pub name: Option<String>,
    pub text: Option<String>,
    pub image: Option<String>,
    pub cooking_time: Option<i32>,
    pub tag_ids: Option<Vec<i32>>,
    pub ingredients: Option<Vec<IngredientEntry>>,
}

/// A recipe with everything its representation needs resolved.
#[derive(Debug, Clone)]
pub struct RecipeDetails {
    pub recipe: recipe::Model,
    pub author: user::Model,
    pub tags: Vec<tag::Model>,
    /// In line order: the resolved ingredient plus its amount.
    pub ingredients: Vec<(ingredient::Model, i32)>,
}

#[derive(Debug, Clone, Default)]
pub struct RecipeFilter {
    pub author_id: Option<i32>,
    pub tag_slugs: Vec<String>,
    /// Only recipes favorited by this user.
    pub favorited_by: Option<i32>,
    /// Only recipes in this user's cart.
    pub in_cart_of: Option<i32>,
}

pub fn validate_tag_ids(tag_ids: &[i32]) -> Result<(), ServiceError> {
    if tag_ids.is_empty() {
        return Err(ServiceError::Validation(
            "A recipe needs at least one tag".to_string(),
        ));
    }
    let unique: HashSet<i32> = tag_ids.iter().copied().collect();
    if unique.len() != tag_ids.len() {
        return Err(ServiceError::Validation(
            "Duplicate tags are not allowed".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_ingredients(entries: &[IngredientEntry]) -> Result<(), ServiceError> {
    if entries.is_empty() {
        return Err(ServiceError::Validation(
            "A recipe needs at least one ingredient".to_string(),
        ));
    }
    let mut seen = HashSet::new();
    for entry in entries {
        if !seen.insert(entry.ingredient_id) {
            return Err(ServiceError::Validation(format!(
                "Ingredient {} is listed twice",
                entry.ingredient_id
            )));
        }
        if !(MIN_AMOUNT..=MAX_AMOUNT).contains(&entry.amount) {
            return Err(ServiceError::Validation(format!(
                "Amount must be between {MIN_AMOUNT} and {MAX_AMOUNT}"
            )));
        }
    }
    Ok(())
}

pub fn validate_cooking_time(cooking_time: i32) -> Result<(), ServiceError> {
    if !(MIN_COOKING_TIME..=MAX_COOKING_TIME).contains(&cooking_time) {
        return Err(ServiceError::Validation(format!(
            "Cooking time must be between {MIN_COOKING_TIME} and {MAX_COOKING_TIME} minutes"
        )));
    }
    Ok(())
}

/// Reuses an existing (ingredient, amount) line or creates one. The sharing
/// is an optimization; consumers must not rely on line identity.
async fn get_or_create_amount<C: ConnectionTrait>(
    conn: &C,
    entry: IngredientEntry,
) -> Result<ingredient_amount::Model, ServiceError> {
    if let Some(existing) = IngredientAmount::find()
        .filter(ingredient_amount::Column::IngredientId.eq(entry.ingredient_id))
        .filter(ingredient_amount::Column::Amount.eq(entry.amount))
        .one(conn)
        .await?
    {
        return Ok(existing);
    }
    Ok(ingredient_amount::ActiveModel {
        ingredient_id: Set(entry.ingredient_id),
        amount: Set(entry.amount),
        ..Default::default()
    }
    .insert(conn)
    .await?)
}

/// Fails with `NotFound` unless every referenced tag id exists.
async fn check_tags_exist<C: ConnectionTrait>(conn: &C, tag_ids: &[i32]) -> Result<(), ServiceError> {
    let found = Tag::find()
        .filter(tag::Column::Id.is_in(tag_ids.iter().copied()))
        .count(conn)
        .await?;
    if found != tag_ids.len() as u64 {
        return Err(ServiceError::NotFound("One of the referenced tags".to_string()));
    }
    Ok(())
}

async fn check_ingredients_exist<C: ConnectionTrait>(
    conn: &C,
    entries: &[IngredientEntry],
) -> Result<(), ServiceError> {
    let ids: Vec<i32> = entries.iter().map(|e| e.ingredient_id).collect();
    let found = Ingredient::find()
        .filter(ingredient::Column::Id.is_in(ids))
        .count(conn)
        .await?;
    if found != entries.len() as u64 {
        return Err(ServiceError::NotFound(
            "One of the referenced ingredients".to_string(),
        ));
    }
    Ok(())
}

async fn link_tags<C: ConnectionTrait>(
    conn: &C,
    recipe_id: i32,
    tag_ids: &[i32],
) -> Result<(), ServiceError> {
    RecipeTag::insert_many(tag_ids.iter().map(|&tag_id| recipe_tag::ActiveModel {
        recipe_id: Set(recipe_id),
        tag_id: Set(tag_id),
    }))
    .exec(conn)
    .await?;
    Ok(())
}

async fn link_ingredients<C: ConnectionTrait>(
    conn: &C,
    recipe_id: i32,
    entries: &[IngredientEntry],
) -> Result<(), ServiceError> {
    // Sequential inserts keep the line order stable through the serial ids.
    for &entry in entries {
        let line = get_or_create_amount(conn, entry).await?;
        recipe_ingredient::ActiveModel {
            recipe_id: Set(recipe_id),
            ingredient_amount_id: Set(line.id),
            ..Default::default()
        }
        .insert(conn)
        .await?;
    }
    Ok(())
}

/// Creates the recipe row plus its tag and ingredient links in one
/// transaction, so a failure leaves nothing behind.
pub async fn create_recipe(
    db: &DatabaseConnection,
    author_id: i32,
    input: NewRecipe,
) -> Result<recipe::Model, ServiceError> {
    validate_tag_ids(&input.tag_ids)?;
    validate_ingredients(&input.ingredients)?;
    validate_cooking_time(input.cooking_time)?;

    let txn = db.begin().await?;
    check_tags_exist(&txn, &input.tag_ids).await?;
    check_ingredients_exist(&txn, &input.ingredients).await?;

    let created = recipe::ActiveModel {
        author_id: Set(author_id),
        name: Set(input.name),
        text: Set(input.text),
        image: Set(input.image),
        cooking_time: Set(input.cooking_time),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    link_tags(&txn, created.id, &input.tag_ids).await?;
    link_ingredients(&txn, created.id, &input.ingredients).await?;
    txn.commit().await?;
    Ok(created)
}

/// Applies a partial update. Only the author may edit; scalar fields are
/// replaced when present, link lists are cleared and recreated when present.
pub async fn update_recipe(
    db: &DatabaseConnection,
    recipe_id: i32,
    user_id: i32,
    update: RecipeUpdate,
) -> Result<recipe::Model, ServiceError> {
    if let Some(ref tag_ids) = update.tag_ids {
        validate_tag_ids(tag_ids)?;
    }
    if let Some(ref ingredients) = update.ingredients {
        validate_ingredients(ingredients)?;
    }
    if let Some(cooking_time) = update.cooking_time {
        validate_cooking_time(cooking_time)?;
    }

    let existing = Recipe::find_by_id(recipe_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Recipe {recipe_id}")))?;
    if existing.author_id != user_id {
        return Err(ServiceError::Forbidden);
    }

    let txn = db.begin().await?;

    let mut active: recipe::ActiveModel = existing.into();
    if let Some(name) = update.name {
        active.name = Set(name);
    }
    if let Some(text) = update.text {
        active.text = Set(text);
    }
    if let Some(image) = update.image {
        active.image = Set(image);
    }
    if let Some(cooking_time) = update.cooking_time {
        active.cooking_time = Set(cooking_time);
    }
    let updated = active.update(&txn).await?;

    if let Some(tag_ids) = update.tag_ids {
        check_tags_exist(&txn, &tag_ids).await?;
        RecipeTag::delete_many()
            .filter(recipe_tag::Column::RecipeId.eq(recipe_id))
            .exec(&txn)
            .await?;
        link_tags(&txn, recipe_id, &tag_ids).await?;
    }
    if let Some(ingredients) = update.ingredients {
        check_ingredients_exist(&txn, &ingredients).await?;
        RecipeIngredient::delete_many()
            .filter(recipe_ingredient::Column::RecipeId.eq(recipe_id))
            .exec(&txn)
            .await?;
        link_ingredients(&txn, recipe_id, &ingredients).await?;
    }

    txn.commit().await?;
    Ok(updated)
}

/// Author-only delete; the link rows go away through the FK cascades.
pub async fn delete_recipe(
    db: &DatabaseConnection,
    recipe_id: i32,
    user_id: i32,
) -> Result<(), ServiceError> {
    let existing = Recipe::find_by_id(recipe_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Recipe {recipe_id}")))?;
    if existing.author_id != user_id {
        return Err(ServiceError::Forbidden);
    }
    existing.delete(db).await?;
    Ok(())
}

pub async fn get_recipe(
    db: &DatabaseConnection,
    recipe_id: i32,
) -> Result<recipe::Model, ServiceError> {
    Recipe::find_by_id(recipe_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Recipe {recipe_id}")))
}

/// Everything an author has published, newest first.
pub async fn recipes_by_author(
    db: &DatabaseConnection,
    author_id: i32,
) -> Result<Vec<recipe::Model>, ServiceError> {
    Ok(Recipe::find()
        .filter(recipe::Column::AuthorId.eq(author_id))
        .order_by_desc(recipe::Column::CreatedAt)
        .all(db)
        .await?)
}

/// Newest-first recipe page plus the total count for the pagination
/// envelope.
pub async fn list_recipes(
    db: &DatabaseConnection,
    filter: &RecipeFilter,
    page: u64,
    limit: u64,
) -> Result<(u64, Vec<recipe::Model>), ServiceError> {
    let mut query = Recipe::find().order_by_desc(recipe::Column::CreatedAt);

    if let Some(author_id) = filter.author_id {
        query = query.filter(recipe::Column::AuthorId.eq(author_id));
    }
    if !filter.tag_slugs.is_empty() {
        let tags = Tag::find()
            .filter(tag::Column::Slug.is_in(filter.tag_slugs.iter().cloned()))
            .all(db)
            .await?;
        let tag_ids: Vec<i32> = tags.into_iter().map(|t| t.id).collect();
        let links = RecipeTag::find()
            .filter(recipe_tag::Column::TagId.is_in(tag_ids))
            .all(db)
            .await?;
        let recipe_ids: HashSet<i32> = links.into_iter().map(|l| l.recipe_id).collect();
        query = query.filter(recipe::Column::Id.is_in(recipe_ids));
    }
    if let Some(user_id) = filter.favorited_by {
        let ids = super::favorite_recipe_ids_of_user(db, user_id).await?;
        query = query.filter(recipe::Column::Id.is_in(ids));
    }
    if let Some(user_id) = filter.in_cart_of {
        let ids = super::cart_recipe_ids(db, user_id).await?;
        query = query.filter(recipe::Column::Id.is_in(ids));
    }

    let paginator = query.paginate(db, limit.max(1));
    let total = paginator.num_items().await?;
    let models = paginator.fetch_page(page.saturating_sub(1)).await?;
    Ok((total, models))
}

/// Resolves authors, tags and ingredient lines for a batch of recipes,
/// preserving the input order. Six queries regardless of batch size.
pub async fn recipe_details(
    db: &DatabaseConnection,
    recipes: Vec<recipe::Model>,
) -> Result<Vec<RecipeDetails>, ServiceError> {
    if recipes.is_empty() {
        return Ok(Vec::new());
    }
    let recipe_ids: Vec<i32> = recipes.iter().map(|r| r.id).collect();
    let author_ids: HashSet<i32> = recipes.iter().map(|r| r.author_id).collect();

    let authors: HashMap<i32, user::Model> = User::find()
        .filter(user::Column::Id.is_in(author_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

    let tag_links = RecipeTag::find()
        .filter(recipe_tag::Column::RecipeId.is_in(recipe_ids.clone()))
        .all(db)
        .await?;
    let tags: HashMap<i32, tag::Model> = Tag::find()
        .filter(tag::Column::Id.is_in(tag_links.iter().map(|l| l.tag_id)))
        .all(db)
        .await?
        .into_iter()
        .map(|t| (t.id, t))
        .collect();

    let line_links = RecipeIngredient::find()
        .filter(recipe_ingredient::Column::RecipeId.is_in(recipe_ids))
        .order_by_asc(recipe_ingredient::Column::Id)
        .all(db)
        .await?;
    let amounts: HashMap<i32, ingredient_amount::Model> = IngredientAmount::find()
        .filter(
            ingredient_amount::Column::Id.is_in(line_links.iter().map(|l| l.ingredient_amount_id)),
        )
        .all(db)
        .await?
        .into_iter()
        .map(|a| (a.id, a))
        .collect();
    let ingredients: HashMap<i32, ingredient::Model> = Ingredient::find()
        .filter(ingredient::Column::Id.is_in(amounts.values().map(|a| a.ingredient_id)))
        .all(db)
        .await?
        .into_iter()
        .map(|i| (i.id, i))
        .collect();

    let mut details = Vec::with_capacity(recipes.len());
    for model in recipes {
        let author = authors
            .get(&model.author_id)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(format!("User {}", model.author_id)))?;

        let recipe_tags: Vec<tag::Model> = tag_links
            .iter()
            .filter(|l| l.recipe_id == model.id)
            .filter_map(|l| tags.get(&l.tag_id).cloned())
            .collect();

        let mut lines = Vec::new();
        for link in line_links.iter().filter(|l| l.recipe_id == model.id) {
            let amount = amounts.get(&link.ingredient_amount_id).ok_or_else(|| {
                ServiceError::NotFound(format!("Ingredient line {}", link.ingredient_amount_id))
            })?;
            let ingredient = ingredients.get(&amount.ingredient_id).ok_or_else(|| {
                ServiceError::NotFound(format!("Ingredient {}", amount.ingredient_id))
            })?;
            lines.push((ingredient.clone(), amount.amount));
        }

        details.push(RecipeDetails {
            recipe: model,
            author,
            tags: recipe_tags,
            ingredients: lines,
        });
    }
    Ok(details)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(ingredient_id: i32, amount: i32) -> IngredientEntry {
        IngredientEntry {
            ingredient_id,
            amount,
        }
    }

    #[test]
    fn empty_ingredient_list_is_invalid() {
        assert!(matches!(
            validate_ingredients(&[]),
            Err(ServiceError::Validation(_))
        ));
    }

    #[test]
    fn duplicated_ingredient_is_invalid() {
        let entries = [entry(1, 100), entry(2, 50), entry(1, 200)];
        assert!(matches!(
            validate_ingredients(&entries),
            Err(ServiceError::Validation(_))
        ));
    }

    #[test]
    fn amount_bounds_are_enforced() {
        assert!(validate_ingredients(&[entry(1, 0)]).is_err());
        assert!(validate_ingredients(&[entry(1, 32001)]).is_err());
        assert!(validate_ingredients(&[entry(1, 1), entry(2, 32000)]).is_ok());
    }

    #[test]
    fn tag_list_must_be_non_empty_and_unique() {
        assert!(validate_tag_ids(&[]).is_err());
        assert!(validate_tag_ids(&[3, 1, 3]).is_err());
        assert!(validate_tag_ids(&[1, 2, 3]).is_ok());
    }

    #[test]
    fn cooking_time_bounds_are_enforced() {
        assert!(validate_cooking_time(0).is_err());
        assert!(validate_cooking_time(32001).is_err());
        assert!(validate_cooking_time(45).is_ok());
    }
}
