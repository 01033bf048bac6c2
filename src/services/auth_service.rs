use axum::Extension;
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter, Set};
use tracing::info;

use crate::db::entities::user;
use crate::web::error::AppError;
use crate::web::models::{AuthenticatedUser, Claims, LoginRequest, LoginResponse, RegisterRequest, UserResponse};

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_STAFF: &str = "staff";

/// The first account registered becomes the administrator.
pub async fn register_user(pool: &DatabaseConnection, req: RegisterRequest) -> Result<UserResponse, AppError> {
    let username = req.username.trim();
    if username.is_empty() || req.password.len() < 8 {
        return Err(AppError::InvalidInput(
            "Username must not be empty and the password needs at least 8 characters.".to_string(),
        ));
    }

    let existing_user_by_username: Option<user::Model> = user::Entity::find()
        .filter(user::Column::Username.eq(username))
        .one(pool)
        .await
        .map_err(|e: DbErr| AppError::DatabaseError(format!("Failed to check username: {e}")))?;

    if existing_user_by_username.is_some() {
        return Err(AppError::UserAlreadyExists("Username is already taken.".to_string()));
    }

    let password_hash = hash(&req.password, DEFAULT_COST)
        .map_err(|e| AppError::PasswordHashingError(format!("Failed to hash password: {e}")))?;

    let role = if user::Entity::find().count(pool).await? == 0 {
        ROLE_ADMIN
    } else {
        ROLE_STAFF
    };

    let now = Utc::now();
    let new_user = user::ActiveModel {
        username: Set(username.to_string()),
        password_hash: Set(password_hash),
        role: Set(role.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    match new_user.insert(pool).await {
        Ok(user_model) => {
            info!(user_id = user_model.id, role = %user_model.role, "User registered.");
            Ok(UserResponse {
                id: user_model.id,
                username: user_model.username,
                role: user_model.role,
            })
        }
        Err(e) => Err(AppError::DatabaseError(format!("Failed to create user: {e}"))),
    }
}

pub async fn login_user(pool: &DatabaseConnection, req: LoginRequest, jwt_secret: &str) -> Result<LoginResponse, AppError> {
    if req.username.is_empty() || req.password.is_empty() {
        return Err(AppError::InvalidInput("Username and password must not be empty.".to_string()));
    }

    let user = user::Entity::find()
        .filter(user::Column::Username.eq(req.username.trim()))
        .one(pool)
        .await
        .map_err(|e: DbErr| AppError::DatabaseError(format!("Failed to look up user: {e}")))?
        .ok_or(AppError::InvalidCredentials)?;

    let valid_password = verify(&req.password, &user.password_hash)
        .map_err(|e| AppError::InternalServerError(format!("Password verification failed: {e}")))?;

    if !valid_password {
        return Err(AppError::InvalidCredentials);
    }

    create_jwt_for_user(&user, jwt_secret)
}

pub fn create_jwt_for_user(user: &user::Model, jwt_secret: &str) -> Result<LoginResponse, AppError> {
    let now = Utc::now();
    // Token valid for 24 hours
    let expiration = (now + Duration::hours(24)).timestamp() as usize;

    let claims = Claims {
        sub: user.username.clone(),
        user_id: user.id,
        role: user.role.clone(),
        exp: expiration,
    };

    let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(jwt_secret.as_ref()))
        .map_err(|e| AppError::TokenCreationError(format!("Failed to sign token: {e}")))?;

    Ok(LoginResponse {
        token,
        user_id: user.id,
        username: user.username.clone(),
        role: user.role.clone(),
    })
}

pub async fn me(Extension(user): Extension<AuthenticatedUser>) -> Result<axum::Json<UserResponse>, AppError> {
    Ok(axum::Json(UserResponse {
        id: user.id,
        username: user.username,
        role: user.role,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{decode, DecodingKey, Validation};

    #[test]
    fn issued_token_carries_identity_and_role() {
        let now = Utc::now();
        let user = user::Model {
            id: 7,
            username: "manager".to_string(),
            password_hash: String::new(),
            role: ROLE_ADMIN.to_string(),
            created_at: now,
            updated_at: now,
        };
        let response = create_jwt_for_user(&user, "test-secret").unwrap();
        assert_eq!(response.user_id, 7);

        let decoded = decode::<Claims>(
            &response.token,
            &DecodingKey::from_secret(b"test-secret"),
            &Validation::default(),
        )
        .unwrap();
        assert_eq!(decoded.claims.sub, "manager");
        assert_eq!(decoded.claims.role, ROLE_ADMIN);
        assert!(decoded.claims.exp as i64 > now.timestamp());
    }
}
