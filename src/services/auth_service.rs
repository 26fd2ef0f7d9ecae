use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use sea_orm::{ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set};

use crate::db::entities::user;
use crate::web::error::AppError;
use crate::web::models::{Claims, LoginRequest, LoginResponse, RegisterRequest, UserResponse};

pub async fn register_user(
    db: &DatabaseConnection,
    req: RegisterRequest,
) -> Result<UserResponse, AppError> {
    if req.email.is_empty() || req.username.is_empty() {
        return Err(AppError::InvalidInput(
            "Email and username must not be empty.".to_string(),
        ));
    }
    if !req
        .username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '@' | '+' | '-'))
    {
        return Err(AppError::InvalidInput(
            "Username may only contain letters, digits and _.@+- characters.".to_string(),
        ));
    }
    if req.password.len() < 8 {
        return Err(AppError::InvalidInput(
            "Password must be at least 8 characters.".to_string(),
        ));
    }

    let existing: Option<user::Model> = user::Entity::find()
        .filter(
            Condition::any()
                .add(user::Column::Email.eq(&req.email))
                .add(user::Column::Username.eq(&req.username)),
        )
        .one(db)
        .await
        .map_err(|e: DbErr| AppError::DatabaseError(e.to_string()))?;
    if existing.is_some() {
        return Err(AppError::UserAlreadyExists(
            "A user with this email or username already exists.".to_string(),
        ));
    }

    let password_hash = hash(&req.password, DEFAULT_COST)
        .map_err(|e| AppError::PasswordHashingError(e.to_string()))?;

    let now = Utc::now();
    let new_user = user::ActiveModel {
        email: Set(req.email),
        username: Set(req.username),
        first_name: Set(req.first_name),
        last_name: Set(req.last_name),
        password_hash: Set(password_hash),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let user_model = new_user
        .insert(db)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;
    Ok(UserResponse::from_model(&user_model, false))
}

/// Login is by email, matching the user model's username field.
pub async fn login_user(
    db: &DatabaseConnection,
    req: LoginRequest,
    jwt_secret: &str,
) -> Result<LoginResponse, AppError> {
    if req.email.is_empty() || req.password.is_empty() {
        return Err(AppError::InvalidInput(
            "Email and password must not be empty.".to_string(),
        ));
    }

    let user = user::Entity::find()
        .filter(user::Column::Email.eq(&req.email))
        .one(db)
        .await
        .map_err(|e: DbErr| AppError::DatabaseError(e.to_string()))?
        .ok_or(AppError::InvalidCredentials)?;

    let valid = verify(&req.password, &user.password_hash)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;
    if !valid {
        return Err(AppError::InvalidCredentials);
    }

    create_jwt_for_user(&user, jwt_secret)
}

pub fn create_jwt_for_user(
    user: &user::Model,
    jwt_secret: &str,
) -> Result<LoginResponse, AppError> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::days(7))
        .ok_or_else(|| AppError::TokenCreationError("Invalid expiration".to_string()))?
        .timestamp() as usize;

    let claims = Claims {
        sub: user.username.clone(),
        user_id: user.id,
        exp: expiration,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_ref()),
    )
    .map_err(|e| AppError::TokenCreationError(e.to_string()))?;

    Ok(LoginResponse {
        token,
        user_id: user.id,
        username: user.username.clone(),
    })
}

pub async fn set_password(
    db: &DatabaseConnection,
    user_id: i32,
    current_password: &str,
    new_password: &str,
) -> Result<(), AppError> {
    if new_password.len() < 8 {
        return Err(AppError::InvalidInput(
            "Password must be at least 8 characters.".to_string(),
        ));
    }

    let user = user::Entity::find_by_id(user_id)
        .one(db)
        .await
        .map_err(|e: DbErr| AppError::DatabaseError(e.to_string()))?
        .ok_or(AppError::UserNotFound)?;

    let valid = verify(current_password, &user.password_hash)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;
    if !valid {
        return Err(AppError::InvalidCredentials);
    }

    let password_hash =
        hash(new_password, DEFAULT_COST).map_err(|e| AppError::PasswordHashingError(e.to_string()))?;
    let mut active: user::ActiveModel = user.into();
    active.password_hash = Set(password_hash);
    active.updated_at = Set(Utc::now());
    active
        .update(db)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{decode, DecodingKey, Validation};

    fn sample_user() -> user::Model {
        user::Model {
            id: 11,
            email: "cook@example.com".to_string(),
            username: "cook".to_string(),
            first_name: "Пётр".to_string(),
            last_name: "Смирнов".to_string(),
            password_hash: "$2b$12$abcdefghijklmnopqrstuv".to_string(),
            avatar: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn issued_token_round_trips() {
        let secret = "test-secret";
        let response = create_jwt_for_user(&sample_user(), secret).unwrap();

        let decoded = decode::<Claims>(
            &response.token,
            &DecodingKey::from_secret(secret.as_ref()),
            &Validation::default(),
        )
        .unwrap();
        assert_eq!(decoded.claims.user_id, 11);
        assert_eq!(decoded.claims.sub, "cook");
    }

    #[test]
    fn token_fails_with_wrong_secret() {
        let response = create_jwt_for_user(&sample_user(), "secret-a").unwrap();
        let result = decode::<Claims>(
            &response.token,
            &DecodingKey::from_secret("secret-b".as_ref()),
            &Validation::default(),
        );
        assert!(result.is_err());
    }
}
