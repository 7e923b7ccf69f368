use crate::errors::ServiceError;
use axum::extract::rejection::JsonRejection;
use axum::Json;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use validator::Validate;

pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 100;

/// Normalizes `page`/`limit` query values: 1-based page, limit in `1..=100`.
pub fn page_and_limit(page: Option<u64>, limit: Option<u64>) -> (u64, u64) {
    (
        page.unwrap_or(1).max(1),
        limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
    )
}

pub fn total_pages(total: u64, limit: u64) -> u64 {
    if total == 0 {
        0
    } else {
        (total + limit - 1) / limit
    }
}

/// Unwraps a JSON body, turning malformed input into a 400 with our error body.
pub fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ServiceError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ServiceError::ValidationError(rejection.body_text()))
}

/// Validate request input
pub fn validate_input<T: Validate>(input: &T) -> Result<(), ServiceError> {
    input.validate().map_err(ServiceError::from)
}

/// Accepts RFC 3339 timestamps, naive `YYYY-MM-DDTHH:MM:SS` (read as UTC) or
/// a bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_instant(field: &str, raw: &str) -> Result<DateTime<Utc>, ServiceError> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(naive.and_utc());
    }
    if let Some(midnight) = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Ok(midnight.and_utc());
    }
    Err(ServiceError::ValidationError(format!(
        "{} is not a valid date: {}",
        field, raw
    )))
}

/// Optional text field that treats blank strings as absent.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn page_defaults_and_clamps() {
        assert_eq!(page_and_limit(None, None), (1, 20));
        assert_eq!(page_and_limit(Some(0), Some(500)), (1, 100));
        assert_eq!(total_pages(41, 20), 3);
        assert_eq!(total_pages(0, 20), 0);
    }

    #[test]
    fn dates_parse_in_common_shapes() {
        let expected = Utc.with_ymd_and_hms(2025, 1, 3, 0, 0, 0).unwrap();
        assert_eq!(parse_instant("startDate", "2025-01-03").unwrap(), expected);
        assert_eq!(
            parse_instant("startDate", "2025-01-03T00:00:00Z").unwrap(),
            expected
        );
        assert_eq!(
            parse_instant("startDate", "2025-01-03T02:00:00+02:00").unwrap(),
            expected
        );
        assert_eq!(
            parse_instant("startDate", "2025-01-03T00:00:00").unwrap(),
            expected
        );
        assert!(parse_instant("startDate", "next tuesday").is_err());
    }

    #[test]
    fn blank_text_is_absent() {
        assert_eq!(non_blank(Some("  ".into())), None);
        assert_eq!(non_blank(Some(" PS5 ".into())).as_deref(), Some("PS5"));
    }
}
