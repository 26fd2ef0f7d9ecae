use serde::{Deserialize, Serialize};

use crate::db::entities::user;

pub mod recipe_models;

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user_id: i32,
    pub username: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SetPasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SetAvatarRequest {
    pub avatar: String,
}

// JWT Claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub user_id: i32,
    pub exp: usize,
}

/// Authenticated identity, passed to handlers as a request extension.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: i32,
    pub username: String,
}

/// Identity on routes that work both authenticated and anonymous. The
/// optional-auth middleware always inserts this extension, holding `None`
/// for anonymous requests.
#[derive(Debug, Clone, Default)]
pub struct MaybeUser(pub Option<AuthenticatedUser>);

impl MaybeUser {
    pub fn id(&self) -> Option<i32> {
        self.0.as_ref().map(|u| u.id)
    }

    /// For operations open to authenticated users only; mirrors the
    /// per-operation permission checks of the API contract.
    pub fn require(&self) -> Result<&AuthenticatedUser, crate::web::error::AppError> {
        self.0
            .as_ref()
            .ok_or(crate::web::error::AppError::InvalidCredentials)
    }
}

/// Public profile representation; `is_subscribed` is relative to the
/// requesting user and `false` for anonymous requests.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i32,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub avatar: Option<String>,
    pub is_subscribed: bool,
}

impl UserResponse {
    pub fn from_model(user: &user::Model, is_subscribed: bool) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            avatar: user.avatar.clone(),
            is_subscribed,
        }
    }
}

pub const DEFAULT_PAGE_SIZE: u64 = 6;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

impl PageQuery {
    pub fn page(&self) -> u64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> u64 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).max(1)
    }
}

/// Pagination envelope shared by every list endpoint.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub count: u64,
    pub results: Vec<T>,
}
