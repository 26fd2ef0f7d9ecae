use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use std::sync::Arc;

use crate::db::entities::tag;
use crate::db::services;
use crate::web::{error::AppError, AppState};

async fn list_tags_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<tag::Model>>, AppError> {
    let tags = services::list_tags(&app_state.db_pool).await?;
    Ok(Json(tags))
}

async fn get_tag_handler(
    State(app_state): State<Arc<AppState>>,
    Path(tag_id): Path<i32>,
) -> Result<Json<tag::Model>, AppError> {
    let tag = services::get_tag(&app_state.db_pool, tag_id).await?;
    Ok(Json(tag))
}

pub fn create_tags_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_tags_handler))
        .route("/{tag_id}", get(get_tag_handler))
}
