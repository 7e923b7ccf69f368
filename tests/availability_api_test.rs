mod common;

use axum::http::{Method, StatusCode};
use common::{utc, TestApp};
use console_rental_api::entities::{
    console::ConsoleStatus, profile::KycStatus, rental::RentalStatus,
};
use serde_json::{json, Value};

fn day_status<'a>(body: &'a Value, date: &str) -> &'a str {
    body["data"]["days"]
        .as_array()
        .expect("days array")
        .iter()
        .find(|d| d["date"] == date)
        .and_then(|d| d["status"].as_str())
        .unwrap_or_else(|| panic!("no entry for {}", date))
}

#[tokio::test]
async fn day_covered_by_every_unit_is_full() {
    let app = TestApp::new().await;
    let a = app.seed_unit("PS5-001", "PS5", ConsoleStatus::Active).await;
    let b = app.seed_unit("PS5-002", "PS5", ConsoleStatus::Active).await;
    app.seed_rental(&a, utc(2025, 1, 8), utc(2025, 1, 11), RentalStatus::Active)
        .await;
    app.seed_rental(&b, utc(2025, 1, 10), utc(2025, 1, 11), RentalStatus::Pending)
        .await;

    let (status, body) = app
        .request(
            Method::GET,
            "/api/availability?category=PS5&year=2025&month=1",
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["days"].as_array().unwrap().len(), 31);
    assert_eq!(day_status(&body, "2025-01-10"), "FULL");
    assert_eq!(day_status(&body, "2025-01-11"), "AVAILABLE");
    assert_eq!(day_status(&body, "2025-01-09"), "AVAILABLE");
}

#[tokio::test]
async fn calendar_agrees_with_booking_after_a_real_reservation() {
    let app = TestApp::new().await;
    app.seed_profile("user-1", KycStatus::Approved, 1).await;
    app.seed_unit("PS5-001", "PS5", ConsoleStatus::Active).await;
    app.seed_unit("PS5-002", "PS5", ConsoleStatus::Active).await;
    let token = app.token_for("user-1");
    let calendar = "/api/availability?category=PS5&year=2025&month=1";
    let request = json!({
        "productCategory": "PS5",
        "startDate": "2025-01-10",
        "endDate": "2025-01-11",
    });

    let (status, _) = app.book(Some(&token), request.clone()).await;
    assert_eq!(status, StatusCode::OK);

    // one unit is still free, so the day stays open
    let (_, body) = app.request(Method::GET, calendar, None, None).await;
    assert_eq!(day_status(&body, "2025-01-10"), "AVAILABLE");

    let (status, _) = app.book(Some(&token), request.clone()).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app.request(Method::GET, calendar, None, None).await;
    assert_eq!(day_status(&body, "2025-01-10"), "FULL");

    let (status, _) = app.book(Some(&token), request).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn cancelled_rentals_do_not_block_days() {
    let app = TestApp::new().await;
    let a = app.seed_unit("XBOX-001", "Xbox", ConsoleStatus::Active).await;
    app.seed_rental(&a, utc(2025, 2, 1), utc(2025, 2, 5), RentalStatus::Cancelled)
        .await;

    let (_, body) = app
        .request(
            Method::GET,
            "/api/availability?category=Xbox&year=2025&month=2",
            None,
            None,
        )
        .await;
    assert_eq!(body["data"]["days"].as_array().unwrap().len(), 28);
    assert_eq!(day_status(&body, "2025-02-02"), "AVAILABLE");
}

#[tokio::test]
async fn calendar_requires_category_and_valid_month() {
    let app = TestApp::new().await;

    let (status, _) = app
        .request(Method::GET, "/api/availability?year=2025&month=1", None, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .request(
            Method::GET,
            "/api/availability?category=PS5&year=2025&month=13",
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn stock_counts_only_active_units_as_available() {
    let app = TestApp::new().await;
    app.seed_unit("PS5-001", "PS5", ConsoleStatus::Active).await;
    app.seed_unit("PS5-002", "PS5", ConsoleStatus::Rented).await;
    app.seed_unit("PS5-003", "PS5", ConsoleStatus::Maintenance).await;
    app.seed_unit("PS5-004", "PS5", ConsoleStatus::Retired).await;
    app.seed_unit("SW-001", "Switch", ConsoleStatus::Active).await;

    let (status, body) = app.request(Method::GET, "/api/stock", None, None).await;
    assert_eq!(status, StatusCode::OK);

    let rows = body["data"].as_array().unwrap();
    let ps5 = rows.iter().find(|r| r["category"] == "PS5").unwrap();
    assert_eq!(ps5["available"], 1);
    assert_eq!(ps5["total"], 3);
    let switch = rows.iter().find(|r| r["category"] == "Switch").unwrap();
    assert_eq!(switch["available"], 1);
}

#[tokio::test]
async fn health_and_openapi_are_served() {
    let app = TestApp::new().await;

    let (status, _) = app.request(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, doc) = app
        .request(Method::GET, "/api-docs/openapi.json", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(doc["info"]["title"], "Console Rental API");
}
