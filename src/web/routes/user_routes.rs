use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use std::sync::Arc;

use crate::db::services;
use crate::services::auth_service;
use crate::web::models::recipe_models::{ShortRecipeResponse, SubscriptionResponse};
use crate::web::models::{MaybeUser, Page, PageQuery, SetAvatarRequest, SetPasswordRequest, UserResponse};
use crate::web::{error::AppError, AppState};

async fn list_users_handler(
    Extension(maybe_user): Extension<MaybeUser>,
    State(app_state): State<Arc<AppState>>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Page<UserResponse>>, AppError> {
    let (count, users) =
        services::list_users(&app_state.db_pool, page.page(), page.limit()).await?;

    let mut results = Vec::with_capacity(users.len());
    for user in users {
        let subscribed =
            services::is_subscribed(&app_state.db_pool, maybe_user.id(), user.id).await?;
        results.push(UserResponse::from_model(&user, subscribed));
    }
    Ok(Json(Page { count, results }))
}

async fn get_user_handler(
    Extension(maybe_user): Extension<MaybeUser>,
    State(app_state): State<Arc<AppState>>,
    Path(user_id): Path<i32>,
) -> Result<Json<UserResponse>, AppError> {
    let user = services::get_user(&app_state.db_pool, user_id).await?;
    let subscribed = services::is_subscribed(&app_state.db_pool, maybe_user.id(), user.id).await?;
    Ok(Json(UserResponse::from_model(&user, subscribed)))
}

async fn me_handler(
    Extension(maybe_user): Extension<MaybeUser>,
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<UserResponse>, AppError> {
    let identity = maybe_user.require()?;
    let user = services::get_user(&app_state.db_pool, identity.id).await?;
    Ok(Json(UserResponse::from_model(&user, false)))
}

async fn set_password_handler(
    Extension(maybe_user): Extension<MaybeUser>,
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<SetPasswordRequest>,
) -> Result<StatusCode, AppError> {
    let identity = maybe_user.require()?;
    auth_service::set_password(
        &app_state.db_pool,
        identity.id,
        &payload.current_password,
        &payload.new_password,
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn set_avatar_handler(
    Extension(maybe_user): Extension<MaybeUser>,
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<SetAvatarRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let identity = maybe_user.require()?;
    let updated =
        services::set_avatar(&app_state.db_pool, identity.id, Some(payload.avatar)).await?;
    Ok(Json(serde_json::json!({ "avatar": updated.avatar })))
}

async fn delete_avatar_handler(
    Extension(maybe_user): Extension<MaybeUser>,
    State(app_state): State<Arc<AppState>>,
) -> Result<StatusCode, AppError> {
    let identity = maybe_user.require()?;
    services::set_avatar(&app_state.db_pool, identity.id, None).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn subscribe_handler(
    Extension(maybe_user): Extension<MaybeUser>,
    State(app_state): State<Arc<AppState>>,
    Path(user_id): Path<i32>,
) -> Result<(StatusCode, Json<SubscriptionResponse>), AppError> {
    let identity = maybe_user.require()?;
    services::subscribe(&app_state.db_pool, identity.id, user_id).await?;

    let author = services::get_user(&app_state.db_pool, user_id).await?;
    let response = author_with_recipes(&app_state, author, true).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn unsubscribe_handler(
    Extension(maybe_user): Extension<MaybeUser>,
    State(app_state): State<Arc<AppState>>,
    Path(user_id): Path<i32>,
) -> Result<StatusCode, AppError> {
    let identity = maybe_user.require()?;
    services::unsubscribe(&app_state.db_pool, identity.id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn subscriptions_handler(
    Extension(maybe_user): Extension<MaybeUser>,
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<SubscriptionResponse>>, AppError> {
    let identity = maybe_user.require()?;
    let authors = services::followed_authors(&app_state.db_pool, identity.id).await?;

    let mut results = Vec::with_capacity(authors.len());
    for author in authors {
        results.push(author_with_recipes(&app_state, author, true).await?);
    }
    Ok(Json(results))
}

async fn author_with_recipes(
    app_state: &AppState,
    author: crate::db::entities::user::Model,
    is_subscribed: bool,
) -> Result<SubscriptionResponse, AppError> {
    let recipes = services::recipes_by_author(&app_state.db_pool, author.id).await?;
    Ok(SubscriptionResponse {
        user: UserResponse::from_model(&author, is_subscribed),
        recipes_count: recipes.len(),
        recipes: recipes.into_iter().map(ShortRecipeResponse::from).collect(),
    })
}

pub fn create_users_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_users_handler))
        .route("/me", get(me_handler))
        .route("/me/avatar", put(set_avatar_handler).delete(delete_avatar_handler))
        .route("/set_password", post(set_password_handler))
        .route("/subscriptions", get(subscriptions_handler))
        .route("/{user_id}", get(get_user_handler))
        .route(
            "/{user_id}/subscribe",
            post(subscribe_handler).delete(unsubscribe_handler),
        )
}
