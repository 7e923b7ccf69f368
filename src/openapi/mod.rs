use axum::{routing::get, Json, Router};
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Console Rental API",
        version = "0.1.0",
        description = r#"
Bookings, availability and back-office endpoints for a console rental shop.

## Authentication

Customer and admin endpoints take a bearer JWT:

```
Authorization: Bearer <your-jwt-token>
```

Admin routes additionally require the `admin` role claim.

## Error Handling

Every failure uses one body shape. `code` is present for booking and auth
failures; `details` only outside production.

```json
{
  "success": false,
  "error": "Forbidden",
  "code": "KYC_REQUIRED",
  "message": "Identity verification is required before booking",
  "timestamp": "2025-01-01T00:00:00Z"
}
```
        "#
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Bookings", description = "Customer booking"),
        (name = "Availability", description = "Availability calendar"),
        (name = "Stock", description = "Stock levels and live unit changes"),
        (name = "Admin", description = "Back-office endpoints")
    ),
    paths(
        crate::handlers::bookings::book,
        crate::handlers::availability::monthly_calendar,
        crate::handlers::stock::stock_summary,
        crate::handlers::rentals::list_rentals,
        crate::handlers::analytics::payment_summary,
    ),
    components(
        schemas(
            crate::handlers::bookings::BookingRequest,
            crate::handlers::bookings::BookingResponse,
            crate::handlers::availability::CalendarResponse,
            crate::handlers::rentals::RentalSummary,
            crate::handlers::rentals::UpdatePaymentRequest,
            crate::handlers::consoles::CreateConsoleRequest,
            crate::handlers::consoles::UpdateConsoleStatusRequest,
            crate::handlers::service_bookings::CreateServiceBookingRequest,
            crate::handlers::service_bookings::UpdateServiceBookingStatusRequest,
            crate::handlers::trade_ins::CreateTradeInRequest,
            crate::handlers::trade_ins::UpdateTradeInRequest,
            crate::handlers::users::UpdateKycRequest,
            crate::services::availability::DayAvailability,
            crate::services::availability::DayStatus,
            crate::services::consoles::CategoryStock,
            crate::services::analytics::PaymentSummary,
            crate::services::eligibility::Eligibility,
            crate::entities::rental::Addon,
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}

/// Serves the generated document at `/api-docs/openapi.json`.
pub fn openapi_routes() -> Router {
    Router::new().route(
        "/api-docs/openapi.json",
        get(|| async { Json(ApiDoc::openapi()) }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_lists_booking_and_auth() {
        let json = serde_json::to_string(&ApiDoc::openapi()).unwrap();
        assert!(json.contains("Console Rental API"));
        assert!(json.contains("/api/book"));
        assert!(json.contains("/api/availability"));
        assert!(json.contains("bearer_auth"));
    }
}
