use axum::{
    extract::State,
    http::Method,
    middleware as axum_middleware,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, SameSite};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::server::config::ServerConfig;
use crate::services::auth_service;
use crate::web::{
    error::AppError,
    middleware::auth,
    models::{LoginRequest, RegisterRequest},
    routes::*,
};

pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;

pub struct AppState {
    pub db_pool: DatabaseConnection,
    pub config: Arc<ServerConfig>,
}

async fn register_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<models::UserResponse>, AppError> {
    let user_response = auth_service::register_user(&app_state.db_pool, payload).await?;
    Ok(Json(user_response))
}

async fn login_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let login_response =
        auth_service::login_user(&app_state.db_pool, payload, &app_state.config.jwt_secret).await?;

    let auth_cookie = Cookie::build(("token", login_response.token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(true)
        .build();

    let mut response = Json(login_response).into_response();
    response.headers_mut().insert(
        axum::http::header::SET_COOKIE,
        auth_cookie
            .to_string()
            .parse()
            .map_err(|_| AppError::InternalServerError("Invalid cookie value".to_string()))?,
    );
    Ok(response)
}

async fn logout_handler() -> Result<impl IntoResponse, AppError> {
    let mut auth_cookie = Cookie::build(("token", ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(true)
        .build();
    auth_cookie.make_removal();

    let mut response = axum::http::StatusCode::NO_CONTENT.into_response();
    response.headers_mut().insert(
        axum::http::header::SET_COOKIE,
        auth_cookie
            .to_string()
            .parse()
            .map_err(|_| AppError::InternalServerError("Invalid cookie value".to_string()))?,
    );
    Ok(response)
}

async fn me_handler(
    axum::extract::Extension(user): axum::extract::Extension<models::AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<models::UserResponse>, AppError> {
    let model = crate::db::services::get_user(&app_state.db_pool, user.id).await?;
    Ok(Json(models::UserResponse::from_model(&model, false)))
}

async fn health_check_handler() -> &'static str {
    "OK"
}

pub fn create_axum_router(db_pool: DatabaseConnection, config: Arc<ServerConfig>) -> Router {
    let app_state = Arc::new(AppState { db_pool, config });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(vec![
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health_check_handler))
        .route("/api/auth/register", post(register_handler))
        .route("/api/auth/login", post(login_handler))
        .route("/api/auth/logout", post(logout_handler))
        .route(
            "/api/auth/me",
            get(me_handler).route_layer(axum_middleware::from_fn_with_state(
                app_state.clone(),
                auth::auth,
            )),
        )
        .nest("/api/tags", tag_routes::create_tags_router())
        .nest(
            "/api/ingredients",
            ingredient_routes::create_ingredients_router(),
        )
        // Recipes and users mix public reads with author-only writes; the
        // optional-auth layer resolves the identity once and the handlers
        // enforce their own operation-level permission.
        .nest(
            "/api/recipes",
            recipe_routes::create_recipes_router().route_layer(
                axum_middleware::from_fn_with_state(app_state.clone(), auth::optional_auth),
            ),
        )
        .nest(
            "/api/users",
            user_routes::create_users_router().route_layer(
                axum_middleware::from_fn_with_state(app_state.clone(), auth::optional_auth),
            ),
        )
        .with_state(app_state)
        .layer(cors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header::SET_COOKIE, StatusCode};

    #[tokio::test]
    async fn logout_expires_the_auth_cookie() {
        let response = logout_handler().await.unwrap().into_response();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let set_cookie = response
            .headers()
            .get(SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(set_cookie.starts_with("token="));
        assert!(set_cookie.contains("Max-Age=0"));
    }
}
