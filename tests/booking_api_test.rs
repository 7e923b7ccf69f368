mod common;

use std::time::Duration;

use axum::http::{Method, StatusCode};
use common::{utc, TestApp};
use console_rental_api::entities::{
    console::{self, ConsoleStatus},
    profile::{self, KycStatus},
    rental::{self, RentalStatus},
};
use futures::future::join_all;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::json;

fn ps5_request(start: &str, end: &str) -> serde_json::Value {
    json!({
        "productCategory": "PS5",
        "startDate": start,
        "endDate": end,
        "deliveryType": "DELIVERY",
        "address": "12 Example Street",
    })
}

async fn rental_count(app: &TestApp) -> u64 {
    rental::Entity::find()
        .count(&*app.state.db)
        .await
        .expect("count rentals")
}

#[tokio::test]
async fn overlapping_range_is_rejected_and_boundary_range_succeeds() {
    let app = TestApp::new().await;
    app.seed_profile("user-1", KycStatus::Approved, 2).await;
    let unit = app.seed_unit("PS5-001", "PS5", ConsoleStatus::Active).await;
    app.seed_rental(&unit, utc(2025, 1, 1), utc(2025, 1, 5), RentalStatus::Active)
        .await;
    let token = app.token_for("user-1");

    let (status, body) = app
        .book(Some(&token), ps5_request("2025-01-03", "2025-01-06"))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "NO_AVAILABILITY");

    let (status, body) = app
        .book(Some(&token), ps5_request("2025-01-05", "2025-01-06"))
        .await;
    assert_eq!(status, StatusCode::OK, "body: {}", body);
    assert_eq!(body["success"], true);
    assert_eq!(body["unitId"], "PS5-001");

    let stored = console::Entity::find_by_id(unit.id)
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, ConsoleStatus::Rented);

    let booking_id: uuid::Uuid = body["bookingId"].as_str().unwrap().parse().unwrap();
    let rental = rental::Entity::find_by_id(booking_id)
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(rental.status, RentalStatus::Pending);
    assert_eq!(rental.user_id, "user-1");
}

#[tokio::test]
async fn guests_and_anonymous_callers_get_401() {
    let app = TestApp::new().await;
    app.seed_unit("PS5-001", "PS5", ConsoleStatus::Active).await;

    let (status, body) = app.book(None, ps5_request("2025-02-01", "2025-02-03")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "GUEST_NOT_ALLOWED");

    let guest = app.guest_token();
    let (status, _) = app
        .book(Some(&guest), ps5_request("2025-02-01", "2025-02-03"))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let mut flagged = ps5_request("2025-02-01", "2025-02-03");
    flagged["isGuest"] = json!(true);
    let token = app.token_for("user-1");
    let (status, _) = app.book(Some(&token), flagged).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    assert_eq!(rental_count(&app).await, 0);
}

#[tokio::test]
async fn missing_start_date_is_a_400_and_creates_nothing() {
    let app = TestApp::new().await;
    app.seed_profile("user-1", KycStatus::Approved, 1).await;
    app.seed_unit("PS5-001", "PS5", ConsoleStatus::Active).await;
    let token = app.token_for("user-1");

    let (status, body) = app
        .book(
            Some(&token),
            json!({ "productCategory": "PS5", "endDate": "2025-02-03" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap_or_default().contains("startDate"));
    assert_eq!(rental_count(&app).await, 0);
}

#[tokio::test]
async fn unverified_customers_are_refused() {
    let app = TestApp::new().await;
    app.seed_profile("user-pending", KycStatus::Pending, 0).await;
    app.seed_unit("PS5-001", "PS5", ConsoleStatus::Active).await;

    let token = app.token_for("user-pending");
    let (status, body) = app
        .book(Some(&token), ps5_request("2025-02-01", "2025-02-03"))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "KYC_REQUIRED");

    // no profile at all fails closed
    let stranger = app.token_for("user-unknown");
    let (status, body) = app
        .book(Some(&stranger), ps5_request("2025-02-01", "2025-02-03"))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "KYC_REQUIRED");
    assert_eq!(rental_count(&app).await, 0);
}

#[tokio::test]
async fn first_time_customers_cannot_pick_up() {
    let app = TestApp::new().await;
    app.seed_profile("user-new", KycStatus::Approved, 0).await;
    app.seed_profile("user-regular", KycStatus::Approved, 4).await;
    app.seed_unit("PS5-001", "PS5", ConsoleStatus::Active).await;

    let mut pickup = ps5_request("2025-02-01", "2025-02-03");
    pickup["deliveryType"] = json!("PICKUP");

    let (status, body) = app
        .book(Some(&app.token_for("user-new")), pickup.clone())
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "PICKUP_RESTRICTED");

    let (status, _) = app
        .book(Some(&app.token_for("user-regular")), pickup)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn booking_for_someone_else_is_forbidden() {
    let app = TestApp::new().await;
    app.seed_profile("user-1", KycStatus::Approved, 1).await;
    app.seed_unit("PS5-001", "PS5", ConsoleStatus::Active).await;

    let mut request = ps5_request("2025-02-01", "2025-02-03");
    request["userId"] = json!("user-2");
    let (status, body) = app.book(Some(&app.token_for("user-1")), request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "USER_MISMATCH");
}

#[tokio::test]
async fn concurrent_requests_for_one_unit_have_a_single_winner() {
    let app = TestApp::new().await;
    for i in 0..6 {
        app.seed_profile(&format!("user-{}", i), KycStatus::Approved, 1)
            .await;
    }
    app.seed_unit("PS5-001", "PS5", ConsoleStatus::Active).await;

    let tokens: Vec<String> = (0..6).map(|i| app.token_for(&format!("user-{}", i))).collect();
    let results = join_all(
        tokens
            .iter()
            .map(|t| app.book(Some(t.as_str()), ps5_request("2025-03-01", "2025-03-04"))),
    )
    .await;

    let winners = results.iter().filter(|(s, _)| *s == StatusCode::OK).count();
    let conflicts = results
        .iter()
        .filter(|(s, _)| *s == StatusCode::CONFLICT)
        .count();
    assert_eq!(winners, 1, "results: {:?}", results);
    assert_eq!(conflicts, 5);
    assert_eq!(rental_count(&app).await, 1);
}

#[tokio::test]
async fn client_supplied_total_is_kept() {
    let app = TestApp::new().await;
    app.seed_profile("user-1", KycStatus::Approved, 1).await;
    app.seed_unit("PS5-001", "PS5", ConsoleStatus::Active).await;

    let mut request = ps5_request("2025-04-01", "2025-04-03");
    request["totalAmount"] = json!("55.50");
    let (status, body) = app.book(Some(&app.token_for("user-1")), request).await;
    assert_eq!(status, StatusCode::OK, "body: {}", body);
    let total: Decimal = body["totalPrice"].as_str().unwrap().parse().unwrap();
    assert_eq!(total, dec!(55.50));
}

#[tokio::test]
async fn confirmed_booking_credits_points_and_notifies() {
    let app = TestApp::new().await;
    app.seed_profile("user-1", KycStatus::Approved, 1).await;
    app.seed_unit("PS5-001", "PS5", ConsoleStatus::Active).await;
    let token = app.token_for("user-1");

    let (status, _) = app
        .book(Some(&token), ps5_request("2025-05-01", "2025-05-02"))
        .await;
    assert_eq!(status, StatusCode::OK);

    // side effects run on the event worker
    let mut notifications = serde_json::Value::Null;
    for _ in 0..50 {
        let (_, body) = app
            .request(Method::GET, "/api/notifications", None, Some(&token))
            .await;
        if body["data"].as_array().map(|a| !a.is_empty()).unwrap_or(false) {
            notifications = body;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(notifications["data"][0]["title"], "Booking received");

    let profile = profile::Entity::find_by_id("user-1".to_string())
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(profile.total_bookings, 2);
    assert!(profile.xp > 0);
}

#[tokio::test]
async fn hostile_addons_are_rejected_with_400() {
    let app = TestApp::new().await;
    app.seed_profile("user-1", KycStatus::Approved, 1).await;
    app.seed_unit("PS5-001", "PS5", ConsoleStatus::Active).await;
    let token = app.token_for("user-1");

    let mut huge = ps5_request("2025-08-01", "2025-08-02");
    huge["addons"] = json!([
        { "name": "Cable", "quantity": 4_000_000_000u32, "price": "79228162514264337593543950335" }
    ]);
    let (status, _) = app.book(Some(&token), huge).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut negative = ps5_request("2025-08-01", "2025-08-02");
    negative["addons"] = json!([{ "name": "Refund", "quantity": 1, "price": "-500" }]);
    let (status, _) = app.book(Some(&token), negative).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut oversized_total = ps5_request("2025-08-01", "2025-08-02");
    oversized_total["totalAmount"] = json!("79228162514264337593543950335");
    let (status, _) = app.book(Some(&token), oversized_total).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(rental_count(&app).await, 0);

    // the analytics report still renders afterwards
    let (status, _) = app
        .request(
            Method::GET,
            "/api/admin/analytics/payments",
            None,
            Some(&app.admin_token()),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}
