//! Console Rental API Library
//!
//! Bookings, availability and the back office for a console rental, resale
//! and repair shop.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod health;
pub mod middleware_helpers;
pub mod openapi;
pub mod services;
pub mod tracing;

use axum::{
    extract::FromRef,
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::auth::AuthService;
use crate::events::{EventSender, UnitStatusFeed};

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub auth: Arc<AuthService>,
    pub event_sender: EventSender,
    pub stock_feed: UnitStatusFeed,
    pub services: handlers::AppServices,
}

impl AppState {
    /// Builds the service graph over an established pool.
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: config::AppConfig,
        event_sender: EventSender,
        stock_feed: UnitStatusFeed,
    ) -> Self {
        let auth = Arc::new(AuthService::new(auth::AuthConfig::from(&config)));
        let services =
            handlers::AppServices::new(db.clone(), &config, event_sender.clone(), stock_feed.clone());
        Self {
            db,
            config,
            auth,
            event_sender,
            stock_feed,
            services,
        }
    }
}

impl FromRef<AppState> for Arc<AuthService> {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}

// Common response wrappers
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            request_id: crate::tracing::current_request_id().map(|rid| rid.as_str().to_string()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::success(data)
        }
    }
}

#[cfg(test)]
mod response_tests {
    use super::*;
    use chrono::DateTime;

    #[tokio::test]
    async fn success_response_includes_request_metadata() {
        let response =
            crate::tracing::scope_request_id(crate::tracing::RequestId::new("meta-123"), async {
                ApiResponse::success("ok")
            })
            .await;

        let meta = response.meta.expect("metadata expected");
        assert_eq!(meta.request_id.as_deref(), Some("meta-123"));
        DateTime::parse_from_rfc3339(&meta.timestamp).expect("timestamp should parse");
    }

    #[test]
    fn message_is_attached() {
        let response = ApiResponse::with_message(1, "done");
        assert!(response.success);
        assert_eq!(response.message.as_deref(), Some("done"));
        assert!(response.meta.unwrap().request_id.is_none());
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

/// Routes mounted under `/api`.
pub fn api_routes() -> Router<AppState> {
    // Storefront, no token required (booking checks its own caller)
    let public = Router::new()
        .route("/book", post(handlers::bookings::book))
        .route(
            "/availability",
            get(handlers::availability::monthly_calendar),
        )
        .route("/stock", get(handlers::stock::stock_summary))
        .route("/stock/events", get(handlers::stock::stock_events))
        .route(
            "/service-bookings",
            post(handlers::service_bookings::create_service_booking),
        )
        .route("/trade-ins", post(handlers::trade_ins::create_trade_in));

    // Signed-in customer
    let account = Router::new()
        .route("/me", get(handlers::users::me))
        .route(
            "/notifications",
            get(handlers::notifications::list_notifications),
        )
        .route(
            "/notifications/:id/read",
            post(handlers::notifications::mark_notification_read),
        );

    // Back office; every handler takes an AdminUser
    let admin = Router::new()
        .route("/rentals", get(handlers::rentals::list_rentals))
        .route(
            "/rentals/mark-overdue",
            post(handlers::rentals::mark_overdue),
        )
        .route("/rentals/:id", get(handlers::rentals::get_rental))
        .route(
            "/rentals/:id/approve",
            post(handlers::rentals::approve_rental),
        )
        .route(
            "/rentals/:id/complete",
            post(handlers::rentals::complete_rental),
        )
        .route(
            "/rentals/:id/cancel",
            post(handlers::rentals::cancel_rental),
        )
        .route(
            "/rentals/:id/payment",
            put(handlers::rentals::update_payment),
        )
        .route(
            "/consoles",
            get(handlers::consoles::list_consoles).post(handlers::consoles::create_console),
        )
        .route(
            "/consoles/:id/status",
            put(handlers::consoles::update_console_status),
        )
        .route(
            "/service-bookings",
            get(handlers::service_bookings::list_service_bookings),
        )
        .route(
            "/service-bookings/:id/status",
            put(handlers::service_bookings::update_service_booking_status),
        )
        .route("/trade-ins", get(handlers::trade_ins::list_trade_ins))
        .route("/trade-ins/:id", put(handlers::trade_ins::update_trade_in))
        .route(
            "/analytics/payments",
            get(handlers::analytics::payment_summary),
        )
        .route("/users/:id/kyc", put(handlers::users::update_kyc));

    Router::new()
        .merge(public)
        .merge(account)
        .nest("/admin", admin)
}

/// The full application router with request-id and HTTP tracing layers.
/// CORS and compression are added by the binary.
pub fn app_router(state: AppState) -> Router {
    let db = state.db.clone();
    Router::new()
        .nest("/api", api_routes())
        .with_state(state)
        .nest("/health", health::health_routes(db))
        .merge(openapi::openapi_routes())
        .layer(crate::tracing::configure_http_tracing())
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id_middleware,
        ))
}
