use axum::{
    body::Body as AxumBody,
    extract::State,
    http::{header, Request},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{decode, DecodingKey, Validation};
use std::sync::Arc;
use tracing::warn;

use crate::web::models::{AuthenticatedUser, Claims, MaybeUser};
use crate::web::{error::AppError, AppState};

fn extract_token(req: &Request<AxumBody>, jar: &CookieJar) -> Option<String> {
    // Authorization header first, `token` cookie as the fallback.
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(|s| s.to_string())
        .or_else(|| jar.get("token").map(|c| c.value().to_string()))
}

fn decode_user(token: &str, jwt_secret: &str) -> Result<AuthenticatedUser, AppError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_ref()),
        &Validation::default(),
    )
    .map_err(|e| {
        warn!(error = ?e, "JWT decoding error during auth middleware.");
        AppError::InvalidCredentials
    })?;
    Ok(AuthenticatedUser {
        id: token_data.claims.user_id,
        username: token_data.claims.sub,
    })
}

/// Rejects the request unless a valid token is present.
pub async fn auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut req: Request<AxumBody>,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_token(&req, &jar).ok_or(AppError::InvalidCredentials)?;
    let authenticated_user = decode_user(&token, &state.config.jwt_secret)?;
    req.extensions_mut().insert(authenticated_user);
    Ok(next.run(req).await)
}

/// Never rejects: always inserts a [`MaybeUser`], holding the identity when
/// a valid token is present. Public endpoints use this to compute the
/// per-user flags, which stay `false` for anonymous requests.
pub async fn optional_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut req: Request<AxumBody>,
    next: Next,
) -> Response {
    let identity = extract_token(&req, &jar)
        .and_then(|token| decode_user(&token, &state.config.jwt_secret).ok());
    req.extensions_mut().insert(MaybeUser(identity));
    next.run(req).await
}
