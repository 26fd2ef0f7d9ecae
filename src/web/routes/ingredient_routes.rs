use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::db::entities::ingredient;
use crate::db::services;
use crate::web::{error::AppError, AppState};

#[derive(Deserialize)]
pub struct IngredientQuery {
    name: Option<String>,
}

async fn list_ingredients_handler(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<IngredientQuery>,
) -> Result<Json<Vec<ingredient::Model>>, AppError> {
    let ingredients =
        services::list_ingredients(&app_state.db_pool, query.name.as_deref()).await?;
    Ok(Json(ingredients))
}

async fn get_ingredient_handler(
    State(app_state): State<Arc<AppState>>,
    Path(ingredient_id): Path<i32>,
) -> Result<Json<ingredient::Model>, AppError> {
    let ingredient = services::get_ingredient(&app_state.db_pool, ingredient_id).await?;
    Ok(Json(ingredient))
}

pub fn create_ingredients_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_ingredients_handler))
        .route("/{ingredient_id}", get(get_ingredient_handler))
}
