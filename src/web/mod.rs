use axum::{
    extract::State,
    http::Method,
    middleware as axum_middleware,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::db::schema::{self, TableCount};
use crate::db::services::LifecycleSettings;
use crate::server::config::ServerConfig;
use crate::services::auth_service;
use crate::web::{
    middleware::auth,
    models::{LoginRequest, RegisterRequest},
    routes::*,
};

pub use error::AppError;

pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;

pub struct AppState {
    pub db_pool: DatabaseConnection,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Lifecycle settings pinned to the current UTC day.
    pub fn lifecycle(&self) -> LifecycleSettings {
        LifecycleSettings::from_config(&self.config, Utc::now().date_naive())
    }
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
    let login_response = auth_service::login_user(&app_state.db_pool, payload, &app_state.config.jwt_secret).await?;

    let auth_cookie = Cookie::build((auth::TOKEN_COOKIE, login_response.token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(true)
        .build();
    let cookie_value = auth_cookie
        .to_string()
        .parse()
        .map_err(|e| AppError::InternalServerError(format!("Failed to build auth cookie: {e}")))?;

    let mut response = Json(login_response).into_response();
    response.headers_mut().insert(axum::http::header::SET_COOKIE, cookie_value);

    Ok(response)
}

async fn health_check_handler() -> &'static str {
    "OK"
}

async fn table_health_handler(State(app_state): State<Arc<AppState>>) -> Result<Json<Vec<TableCount>>, AppError> {
    Ok(Json(schema::table_counts(&app_state.db_pool).await?))
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

    let protected = |router: Router<Arc<AppState>>| {
        router.route_layer(axum_middleware::from_fn_with_state(app_state.clone(), auth::auth))
    };

    Router::new()
        .route("/api/health", get(health_check_handler))
        .route("/api/auth/register", post(register_handler))
        .route("/api/auth/login", post(login_handler))
        .route(
            "/api/auth/me",
            get(auth_service::me).route_layer(axum_middleware::from_fn_with_state(app_state.clone(), auth::auth)),
        )
        .merge(protected(Router::new().route("/api/health/tables", get(table_health_handler))))
        .nest("/api/rooms", protected(room_routes::create_rooms_router()))
        .nest("/api/tenants", protected(tenant_routes::create_tenants_router()))
        .nest("/api/residency-records", protected(residency_routes::create_residency_router()))
        .nest("/api/contracts", protected(contract_routes::create_contracts_router()))
        .nest("/api/bills", protected(bill_routes::create_bills_router()))
        .nest("/api/reports", protected(report_routes::create_reports_router()))
        .nest("/api/settings", protected(settings_routes::create_settings_router()))
        .nest("/api/dashboard", protected(dashboard_routes::create_dashboard_router()))
        .with_state(app_state.clone())
        .layer(cors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_router() -> Router {
        let config: ServerConfig = toml::from_str(
            r#"
            database_url = "postgres://localhost/unused"
            jwt_secret = "router-test-secret"
            "#,
        )
        .unwrap();
        create_axum_router(DatabaseConnection::default(), Arc::new(config))
    }

    #[tokio::test]
    async fn health_is_public() {
        let response = test_router()
            .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"OK");
    }

    #[tokio::test]
    async fn protected_routes_require_a_token() {
        for uri in ["/api/rooms", "/api/contracts", "/api/reports/revenue", "/api/health/tables"] {
            let response = test_router()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "uri = {uri}");
        }
    }

    #[tokio::test]
    async fn forged_tokens_are_rejected() {
        let response = test_router()
            .oneshot(
                Request::builder()
                    .uri("/api/dashboard")
                    .header(header::AUTHORIZATION, "Bearer not-a-jwt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn bad_report_range_is_rejected_before_touching_the_database() {
        let now = Utc::now();
        let user = crate::db::entities::user::Model {
            id: 1,
            username: "admin".to_string(),
            password_hash: String::new(),
            role: auth_service::ROLE_ADMIN.to_string(),
            created_at: now,
            updated_at: now,
        };
        let token = auth_service::create_jwt_for_user(&user, "router-test-secret").unwrap().token;

        let response = test_router()
            .oneshot(
                Request::builder()
                    .uri("/api/reports/revenue?startDate=2024-03-01&endDate=2024-01-01")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
