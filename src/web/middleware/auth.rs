use axum::{
    body::Body as AxumBody,
    extract::State,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{decode, DecodingKey, Validation};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::web::models::{AuthenticatedUser, Claims};
use crate::web::{error::AppError, AppState};

/// Cookie set by the login handler.
pub const TOKEN_COOKIE: &str = "token";

/// API clients send `Authorization: Bearer`; the browser UI relies on the
/// login cookie.
fn request_token(headers: &HeaderMap, jar: &CookieJar) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_string)
        .or_else(|| jar.get(TOKEN_COOKIE).map(|cookie| cookie.value().to_string()))
}

/// Checks signature and expiry and turns the claims into the staff member
/// acting on this request.
pub fn verify_token(token: &str, jwt_secret: &str) -> Result<AuthenticatedUser, AppError> {
    let claims = decode::<Claims>(token, &DecodingKey::from_secret(jwt_secret.as_ref()), &Validation::default())
        .map_err(|e| {
            warn!(error = ?e, "Rejected staff token.");
            AppError::Unauthorized("Invalid or expired token".to_string())
        })?
        .claims;
    Ok(AuthenticatedUser {
        id: claims.user_id,
        username: claims.sub,
        role: claims.role,
    })
}

pub async fn auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut req: Request<AxumBody>,
    next: Next,
) -> Result<Response, AppError> {
    let token = request_token(req.headers(), &jar)
        .ok_or_else(|| AppError::Unauthorized("Missing authentication token".to_string()))?;
    let user = verify_token(&token, &state.config.jwt_secret)?;

    debug!(user_id = user.id, role = %user.role, path = %req.uri().path(), "Staff request authenticated.");
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use axum_extra::extract::cookie::Cookie;
    use chrono::Utc;

    use crate::db::entities::user;
    use crate::services::auth_service::{create_jwt_for_user, ROLE_STAFF};

    fn staff_token(secret: &str) -> String {
        let now = Utc::now();
        let staff = user::Model {
            id: 4,
            username: "front-desk".to_string(),
            password_hash: String::new(),
            role: ROLE_STAFF.to_string(),
            created_at: now,
            updated_at: now,
        };
        create_jwt_for_user(&staff, secret).unwrap().token
    }

    #[test]
    fn header_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        let jar = CookieJar::new().add(Cookie::new(TOKEN_COOKIE, "from-cookie"));
        assert_eq!(request_token(&headers, &jar).as_deref(), Some("from-header"));

        assert_eq!(request_token(&HeaderMap::new(), &jar).as_deref(), Some("from-cookie"));
        assert_eq!(request_token(&HeaderMap::new(), &CookieJar::new()), None);
    }

    #[test]
    fn non_bearer_header_falls_back_to_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic Zm9vOmJhcg=="));
        assert_eq!(request_token(&headers, &CookieJar::new()), None);
    }

    #[test]
    fn valid_token_carries_the_role() {
        let user = verify_token(&staff_token("desk-secret"), "desk-secret").unwrap();
        assert_eq!(user.id, 4);
        assert_eq!(user.username, "front-desk");
        assert_eq!(user.role, ROLE_STAFF);
    }

    #[test]
    fn token_signed_with_another_secret_is_rejected() {
        let err = verify_token(&staff_token("desk-secret"), "other-secret").unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }
}
