#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::{DateTime, Utc};
use console_rental_api::{
    auth::AuthService,
    config::AppConfig,
    db,
    entities::{
        console::{self, ConsoleStatus},
        profile::{self, KycStatus, UserRole},
        rental::{self, DeliveryType, PaymentStatus, RentalStatus},
    },
    events::{self, EventSender, EventWorkerConfig, UnitStatusFeed},
    AppState,
};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::Value;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tower::ServiceExt;

pub const TEST_JWT_SECRET: &str = "test_secret_key_for_testing_purposes_only_32chars";

/// Helper harness for spinning up the application against a throwaway SQLite file.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    _db_dir: TempDir,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Construct a test application, letting the caller adjust configuration first.
    pub async fn with_config(adjust: impl FnOnce(&mut AppConfig)) -> Self {
        let db_dir = tempfile::tempdir().expect("temp dir for test database");
        let db_path = db_dir.path().join("console_rental_test.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            TEST_JWT_SECRET.to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        // SQLite allows a single writer
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        cfg.demo_user_prefix = String::new();
        adjust(&mut cfg);

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(cfg.event_channel_capacity);
        let event_task = tokio::spawn(events::process_events(
            event_rx,
            db_arc.clone(),
            EventWorkerConfig {
                loyalty_points_per_booking: cfg.loyalty_points_per_booking,
            },
        ));

        let state = AppState::new(
            db_arc,
            cfg,
            EventSender::new(event_tx),
            UnitStatusFeed::new(64),
        );
        let router = console_rental_api::app_router(state.clone());

        Self {
            router,
            state,
            _db_dir: db_dir,
            _event_task: event_task,
        }
    }

    pub fn auth(&self) -> Arc<AuthService> {
        self.state.auth.clone()
    }

    pub fn token_for(&self, user_id: &str) -> String {
        self.auth()
            .issue_token(user_id, &[], chrono::Duration::hours(1))
            .expect("customer token")
    }

    pub fn admin_token(&self) -> String {
        self.auth()
            .issue_token("admin-1", &["admin"], chrono::Duration::hours(1))
            .expect("admin token")
    }

    pub fn guest_token(&self) -> String {
        let auth = self.auth();
        let mut claims = auth.claims_for("guest-session", &[], chrono::Duration::hours(1));
        claims.is_guest = true;
        auth.sign(&claims).expect("guest token")
    }

    /// Send a request against the router with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request");

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read response body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub async fn book(&self, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, "/api/book", Some(body), token)
            .await
    }

    pub async fn seed_profile(&self, user_id: &str, kyc_status: KycStatus, total_bookings: i32) {
        let now = Utc::now();
        profile::ActiveModel {
            id: Set(user_id.to_string()),
            email: Set(Some(format!("{}@example.com", user_id))),
            full_name: Set(None),
            phone: Set(None),
            kyc_status: Set(kyc_status),
            total_bookings: Set(total_bookings),
            xp: Set(0),
            role: Set(UserRole::Customer),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        }
        .insert(&*self.state.db)
        .await
        .expect("seed profile");
    }

    pub async fn seed_unit(&self, unit_id: &str, category: &str, status: ConsoleStatus) -> console::Model {
        console::ActiveModel {
            unit_id: Set(unit_id.to_string()),
            category: Set(category.to_string()),
            status: Set(status),
            notes: Set(None),
            ..Default::default()
        }
        .insert(&*self.state.db)
        .await
        .expect("seed console")
    }

    pub async fn seed_rental(
        &self,
        unit: &console::Model,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        status: RentalStatus,
    ) -> rental::Model {
        rental::ActiveModel {
            user_id: Set("seeded-customer".to_string()),
            console_id: Set(unit.id),
            product_id: Set(None),
            plan_id: Set(None),
            start_date: Set(start),
            end_date: Set(end),
            status: Set(status),
            payment_status: Set(PaymentStatus::Pending),
            total_price: Set(Decimal::ZERO),
            delivery_type: Set(DeliveryType::Delivery),
            address: Set(None),
            notes: Set(None),
            addons: Set(None),
            ..Default::default()
        }
        .insert(&*self.state.db)
        .await
        .expect("seed rental")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}

pub fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    use chrono::TimeZone;
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0)
        .single()
        .expect("valid test date")
}
