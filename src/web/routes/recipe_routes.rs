use axum::{
    extract::{Extension, Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use axum_extra::extract::Query;
use serde::Deserialize;
use std::sync::Arc;

use crate::db::entities::recipe;
use crate::db::services::{self, RecipeFilter};
use crate::web::models::recipe_models::{
    CreateRecipeRequest, RecipeResponse, ShortRecipeResponse, UpdateRecipeRequest,
};
use crate::web::models::{MaybeUser, Page, PageQuery};
use crate::web::{error::AppError, AppState};

#[derive(Deserialize)]
pub struct RecipeListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub author: Option<i32>,
    /// Repeatable query parameter with tag slugs.
    #[serde(default)]
    pub tags: Vec<String>,
    pub is_favorited: Option<u8>,
    pub is_in_shopping_cart: Option<u8>,
}

/// Serializes a batch of recipes, resolving the per-user flags with two
/// batched lookups.
async fn to_responses(
    app_state: &AppState,
    user_id: Option<i32>,
    recipes: Vec<recipe::Model>,
) -> Result<Vec<RecipeResponse>, AppError> {
    let recipe_ids: Vec<i32> = recipes.iter().map(|r| r.id).collect();
    let favorited = services::favorited_recipe_ids(&app_state.db_pool, user_id, &recipe_ids).await?;
    let in_cart = services::in_cart_recipe_ids(&app_state.db_pool, user_id, &recipe_ids).await?;

    let details = services::recipe_details(&app_state.db_pool, recipes).await?;
    let mut responses = Vec::with_capacity(details.len());
    for item in details {
        let author_subscribed =
            services::is_subscribed(&app_state.db_pool, user_id, item.author.id).await?;
        let id = item.recipe.id;
        responses.push(RecipeResponse::from_details(
            item,
            author_subscribed,
            favorited.contains(&id),
            in_cart.contains(&id),
        ));
    }
    Ok(responses)
}

async fn list_recipes_handler(
    Extension(maybe_user): Extension<MaybeUser>,
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<RecipeListQuery>,
) -> Result<Json<Page<RecipeResponse>>, AppError> {
    let user_id = maybe_user.id();
    // The user-relative filters only make sense for authenticated requests;
    // anonymous requests ignore them, as the historical API did.
    let mut filter = RecipeFilter {
        author_id: query.author,
        tag_slugs: query.tags,
        ..Default::default()
    };
    if let Some(user_id) = user_id {
        if query.is_favorited == Some(1) {
            filter.favorited_by = Some(user_id);
        }
        if query.is_in_shopping_cart == Some(1) {
            filter.in_cart_of = Some(user_id);
        }
    }

    let page = PageQuery {
        page: query.page,
        limit: query.limit,
    };
    let (count, recipes) =
        services::list_recipes(&app_state.db_pool, &filter, page.page(), page.limit()).await?;
    let results = to_responses(&app_state, user_id, recipes).await?;
    Ok(Json(Page { count, results }))
}

async fn get_recipe_handler(
    Extension(maybe_user): Extension<MaybeUser>,
    State(app_state): State<Arc<AppState>>,
    Path(recipe_id): Path<i32>,
) -> Result<Json<RecipeResponse>, AppError> {
    let recipe = services::get_recipe(&app_state.db_pool, recipe_id).await?;
    let mut responses = to_responses(&app_state, maybe_user.id(), vec![recipe]).await?;
    let response = responses
        .pop()
        .ok_or_else(|| AppError::NotFound(format!("Recipe {recipe_id} not found")))?;
    Ok(Json(response))
}

async fn create_recipe_handler(
    Extension(maybe_user): Extension<MaybeUser>,
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<CreateRecipeRequest>,
) -> Result<(StatusCode, Json<RecipeResponse>), AppError> {
    let user = maybe_user.require()?;
    let created =
        services::create_recipe(&app_state.db_pool, user.id, payload.into()).await?;
    let mut responses = to_responses(&app_state, Some(user.id), vec![created]).await?;
    let response = responses
        .pop()
        .ok_or_else(|| AppError::InternalServerError("Recipe vanished after create".to_string()))?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn update_recipe_handler(
    Extension(maybe_user): Extension<MaybeUser>,
    State(app_state): State<Arc<AppState>>,
    Path(recipe_id): Path<i32>,
    Json(payload): Json<UpdateRecipeRequest>,
) -> Result<Json<RecipeResponse>, AppError> {
    let user = maybe_user.require()?;
    let updated =
        services::update_recipe(&app_state.db_pool, recipe_id, user.id, payload.into()).await?;
    let mut responses = to_responses(&app_state, Some(user.id), vec![updated]).await?;
    let response = responses
        .pop()
        .ok_or_else(|| AppError::InternalServerError("Recipe vanished after update".to_string()))?;
    Ok(Json(response))
}

async fn delete_recipe_handler(
    Extension(maybe_user): Extension<MaybeUser>,
    State(app_state): State<Arc<AppState>>,
    Path(recipe_id): Path<i32>,
) -> Result<StatusCode, AppError> {
    let user = maybe_user.require()?;
    services::delete_recipe(&app_state.db_pool, recipe_id, user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn favorite_handler(
    Extension(maybe_user): Extension<MaybeUser>,
    State(app_state): State<Arc<AppState>>,
    Path(recipe_id): Path<i32>,
) -> Result<(StatusCode, Json<ShortRecipeResponse>), AppError> {
    let user = maybe_user.require()?;
    services::add_to_favorites(&app_state.db_pool, user.id, recipe_id).await?;
    let recipe = services::get_recipe(&app_state.db_pool, recipe_id).await?;
    Ok((StatusCode::CREATED, Json(recipe.into())))
}

async fn unfavorite_handler(
    Extension(maybe_user): Extension<MaybeUser>,
    State(app_state): State<Arc<AppState>>,
    Path(recipe_id): Path<i32>,
) -> Result<StatusCode, AppError> {
    let user = maybe_user.require()?;
    services::remove_from_favorites(&app_state.db_pool, user.id, recipe_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn add_to_cart_handler(
    Extension(maybe_user): Extension<MaybeUser>,
    State(app_state): State<Arc<AppState>>,
    Path(recipe_id): Path<i32>,
) -> Result<(StatusCode, Json<ShortRecipeResponse>), AppError> {
    let user = maybe_user.require()?;
    services::add_to_cart(&app_state.db_pool, user.id, recipe_id).await?;
    let recipe = services::get_recipe(&app_state.db_pool, recipe_id).await?;
    Ok((StatusCode::CREATED, Json(recipe.into())))
}

async fn remove_from_cart_handler(
    Extension(maybe_user): Extension<MaybeUser>,
    State(app_state): State<Arc<AppState>>,
    Path(recipe_id): Path<i32>,
) -> Result<StatusCode, AppError> {
    let user = maybe_user.require()?;
    services::remove_from_cart(&app_state.db_pool, user.id, recipe_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Streams the aggregated shopping list as a plain-text attachment. The
/// filename and MIME type live here, not in the aggregator.
async fn download_shopping_cart_handler(
    Extension(maybe_user): Extension<MaybeUser>,
    State(app_state): State<Arc<AppState>>,
) -> Result<Response, AppError> {
    let user = maybe_user.require()?;
    let report = services::generate_report(&app_state.db_pool, user.id).await?;

    let mut response = report.into_response();
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response.headers_mut().insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_static("attachment; filename=shopping_list.txt"),
    );
    Ok(response)
}

async fn get_link_handler(
    State(app_state): State<Arc<AppState>>,
    Path(recipe_id): Path<i32>,
) -> Result<Json<serde_json::Value>, AppError> {
    // 404 for dangling ids, like every other recipe endpoint.
    services::get_recipe(&app_state.db_pool, recipe_id).await?;
    let link = format!("{}/recipes/{}", app_state.config.public_url, recipe_id);
    Ok(Json(serde_json::json!({ "short-link": link })))
}

pub fn create_recipes_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_recipes_handler).post(create_recipe_handler))
        .route("/download_shopping_cart", get(download_shopping_cart_handler))
        .route(
            "/{recipe_id}",
            get(get_recipe_handler)
                .patch(update_recipe_handler)
                .delete(delete_recipe_handler),
        )
        .route(
            "/{recipe_id}/favorite",
            axum::routing::post(favorite_handler).delete(unfavorite_handler),
        )
        .route(
            "/{recipe_id}/shopping_cart",
            axum::routing::post(add_to_cart_handler).delete(remove_from_cart_handler),
        )
        .route("/{recipe_id}/get-link", get(get_link_handler))
}
