//! Console availability.
//!
//! Two read paths share one overlap rule: the resolver picks a free unit for a
//! requested window, and the calendar reports per-day `AVAILABLE`/`FULL`
//! status for a category. Windows are half-open `[start, end)`.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::console::{self, ConsoleStatus};
use crate::entities::rental::{self, RentalStatus};
use crate::errors::ServiceError;

/// Half-open interval overlap: `a` and `b` share at least one instant.
pub fn overlaps(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && a_end > b_start
}

/// The window a live rental occupies on a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookedWindow {
    pub console_id: Uuid,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl From<&rental::Model> for BookedWindow {
    fn from(rental: &rental::Model) -> Self {
        Self {
            console_id: rental.console_id,
            start: rental.start_date,
            end: rental.end_date,
        }
    }
}

/// Returns the first unit in `units` with no booked window overlapping `[start, end)`.
pub fn select_free_unit(
    units: &[Uuid],
    booked: &[BookedWindow],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Option<Uuid> {
    units.iter().copied().find(|unit| {
        !booked
            .iter()
            .any(|b| b.console_id == *unit && overlaps(b.start, b.end, start, end))
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DayStatus {
    Available,
    Full,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CalendarMode {
    /// A rental touching any part of the day counts against the whole day
    #[default]
    Approximate,
    /// Peak simultaneous rentals within the day
    Exact,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DayAvailability {
    pub date: NaiveDate,
    pub status: DayStatus,
}

/// `[first day of month, first day of next month)` in UTC.
pub fn month_bounds(year: i32, month: u32) -> Result<(DateTime<Utc>, DateTime<Utc>), ServiceError> {
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
        ServiceError::ValidationError(format!("invalid month {}-{:02}", year, month))
    })?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(|| ServiceError::ValidationError(format!("invalid month {}-{:02}", year, month)))?;

    Ok((midnight(first), midnight(next)))
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN))
}

/// Peak number of windows simultaneously open inside `[from, to)`.
fn peak_concurrency(booked: &[BookedWindow], from: DateTime<Utc>, to: DateTime<Utc>) -> usize {
    let mut edges: Vec<(DateTime<Utc>, i32)> = booked
        .iter()
        .filter(|b| overlaps(b.start, b.end, from, to))
        .flat_map(|b| [(b.start.max(from), 1), (b.end.min(to), -1)])
        .collect();
    // ends sort before starts at the same instant
    edges.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));

    let mut open = 0i32;
    let mut peak = 0i32;
    for (_, delta) in edges {
        open += delta;
        peak = peak.max(open);
    }
    peak.max(0) as usize
}

/// Builds the per-day calendar for a month from already-fetched windows.
pub fn build_calendar(
    year: i32,
    month: u32,
    total_units: usize,
    booked: &[BookedWindow],
    mode: CalendarMode,
) -> Result<Vec<DayAvailability>, ServiceError> {
    let (month_start, month_end) = month_bounds(year, month)?;
    let mut days = Vec::with_capacity(31);
    let mut day_start = month_start;

    while day_start < month_end {
        let day_end = day_start + Duration::days(1);
        let busy = match mode {
            CalendarMode::Approximate => booked
                .iter()
                .filter(|b| overlaps(b.start, b.end, day_start, day_end))
                .count(),
            CalendarMode::Exact => peak_concurrency(booked, day_start, day_end),
        };

        let status = if total_units == 0 || busy >= total_units {
            DayStatus::Full
        } else {
            DayStatus::Available
        };
        days.push(DayAvailability {
            date: day_start.date_naive(),
            status,
        });
        day_start = day_end;
    }

    debug_assert!(days.iter().all(|d| d.date.month() == month));
    Ok(days)
}

/// Number of live rentals on `console_id` overlapping `[start, end)`.
pub async fn count_live_overlaps<C: ConnectionTrait>(
    conn: &C,
    console_id: Uuid,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<u64, DbErr> {
    rental::Entity::find()
        .filter(rental::Column::ConsoleId.eq(console_id))
        .filter(rental::Column::Status.is_not_in(RentalStatus::RELEASED))
        .filter(rental::Column::StartDate.lt(end))
        .filter(rental::Column::EndDate.gt(start))
        .count(conn)
        .await
}

#[derive(Clone)]
pub struct AvailabilityService {
    db_pool: Arc<DatabaseConnection>,
}

impl AvailabilityService {
    pub fn new(db_pool: Arc<DatabaseConnection>) -> Self {
        Self { db_pool }
    }

    /// Picks a free `ACTIVE` unit of `category` for `[start, end)`.
    ///
    /// Lookup failures are logged and reported as "none available".
    #[instrument(skip(self))]
    pub async fn find_available_console(
        &self,
        category: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Option<Uuid> {
        match self.resolve(category, start, end).await {
            Ok(found) => found,
            Err(e) => {
                error!(category, error = %e, "availability lookup failed");
                None
            }
        }
    }

    async fn resolve(
        &self,
        category: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Option<Uuid>, DbErr> {
        let db = &*self.db_pool;

        let units: Vec<Uuid> = console::Entity::find()
            .select_only()
            .column(console::Column::Id)
            .filter(console::Column::Category.eq(category))
            .filter(console::Column::Status.eq(ConsoleStatus::Active))
            .order_by_asc(console::Column::UnitId)
            .into_tuple()
            .all(db)
            .await?;

        if units.is_empty() {
            debug!(category, "no active units in category");
            return Ok(None);
        }

        let booked: Vec<BookedWindow> = rental::Entity::find()
            .filter(rental::Column::ConsoleId.is_in(units.clone()))
            .filter(rental::Column::Status.is_not_in(RentalStatus::RELEASED))
            .filter(rental::Column::StartDate.lt(end))
            .filter(rental::Column::EndDate.gt(start))
            .all(db)
            .await?
            .iter()
            .map(BookedWindow::from)
            .collect();

        Ok(select_free_unit(&units, &booked, start, end))
    }

    /// Per-day availability for `category` in `year`/`month`.
    #[instrument(skip(self))]
    pub async fn monthly_calendar(
        &self,
        category: &str,
        year: i32,
        month: u32,
        mode: CalendarMode,
    ) -> Result<Vec<DayAvailability>, ServiceError> {
        let (month_start, month_end) = month_bounds(year, month)?;
        let db = &*self.db_pool;

        let total_units = console::Entity::find()
            .filter(console::Column::Category.eq(category))
            .filter(console::Column::Status.eq(ConsoleStatus::Active))
            .count(db)
            .await
            .map_err(ServiceError::db_error)? as usize;

        // load is measured on the same units the capacity counts
        let booked: Vec<BookedWindow> = rental::Entity::find()
            .inner_join(console::Entity)
            .filter(console::Column::Category.eq(category))
            .filter(console::Column::Status.eq(ConsoleStatus::Active))
            .filter(rental::Column::Status.is_not_in(RentalStatus::RELEASED))
            .filter(rental::Column::StartDate.lt(month_end))
            .filter(rental::Column::EndDate.gt(month_start))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?
            .iter()
            .map(BookedWindow::from)
            .collect();

        build_calendar(year, month, total_units, &booked, mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, d, 0, 0, 0).unwrap()
    }

    fn at(d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, d, h, 0, 0).unwrap()
    }

    #[rstest]
    #[case(day(1), day(5), day(3), day(6), true)]
    #[case(day(1), day(5), day(5), day(6), false)]
    #[case(day(5), day(6), day(1), day(5), false)]
    #[case(day(1), day(10), day(3), day(4), true)]
    #[case(day(3), day(4), day(1), day(10), true)]
    fn overlap_is_half_open(
        #[case] a_start: DateTime<Utc>,
        #[case] a_end: DateTime<Utc>,
        #[case] b_start: DateTime<Utc>,
        #[case] b_end: DateTime<Utc>,
        #[case] expected: bool,
    ) {
        assert_eq!(overlaps(a_start, a_end, b_start, b_end), expected);
    }

    #[test]
    fn single_unit_boundary_scenario() {
        let unit = Uuid::new_v4();
        let booked = [BookedWindow {
            console_id: unit,
            start: day(1),
            end: day(5),
        }];
        assert_eq!(select_free_unit(&[unit], &booked, day(3), day(6)), None);
        assert_eq!(select_free_unit(&[unit], &booked, day(5), day(6)), Some(unit));
    }

    #[test]
    fn first_free_unit_in_order_wins() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let booked = [BookedWindow {
            console_id: a,
            start: day(1),
            end: day(9),
        }];
        assert_eq!(select_free_unit(&[a, b, c], &booked, day(2), day(3)), Some(b));
    }

    #[test]
    fn calendar_two_units_two_rentals() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let booked = [
            BookedWindow {
                console_id: a,
                start: day(9),
                end: day(11),
            },
            BookedWindow {
                console_id: b,
                start: day(10),
                end: day(11),
            },
        ];
        let days = build_calendar(2025, 1, 2, &booked, CalendarMode::Approximate).unwrap();
        assert_eq!(days.len(), 31);
        assert_eq!(days[9].date, day(10).date_naive());
        assert_eq!(days[9].status, DayStatus::Full);
        assert_eq!(days[10].status, DayStatus::Available);
    }

    #[test]
    fn exact_mode_ignores_back_to_back_rentals_on_one_day() {
        let unit = Uuid::new_v4();
        // morning and evening rentals on the same day never run at once
        let booked = [
            BookedWindow {
                console_id: unit,
                start: at(10, 8),
                end: at(10, 12),
            },
            BookedWindow {
                console_id: unit,
                start: at(10, 14),
                end: at(10, 18),
            },
        ];
        let approx = build_calendar(2025, 1, 2, &booked, CalendarMode::Approximate).unwrap();
        let exact = build_calendar(2025, 1, 2, &booked, CalendarMode::Exact).unwrap();
        assert_eq!(approx[9].status, DayStatus::Full);
        assert_eq!(exact[9].status, DayStatus::Available);
    }

    #[test]
    fn category_without_units_is_always_full() {
        let days = build_calendar(2024, 2, 0, &[], CalendarMode::Approximate).unwrap();
        assert_eq!(days.len(), 29);
        assert!(days.iter().all(|d| d.status == DayStatus::Full));
    }

    #[test]
    fn invalid_month_is_rejected() {
        assert!(build_calendar(2025, 13, 1, &[], CalendarMode::Approximate).is_err());
        assert!(month_bounds(2025, 0).is_err());
    }

    #[test]
    fn december_rolls_into_next_year() {
        let (start, end) = month_bounds(2025, 12).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 12, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
    }

    fn window_strategy() -> impl Strategy<Value = (i64, i64)> {
        (0i64..200, 1i64..48).prop_map(|(start, len)| (start, start + len))
    }

    fn hours(h: i64) -> DateTime<Utc> {
        day(1) + Duration::hours(h)
    }

    proptest! {
        #[test]
        fn selected_unit_has_no_overlap(
            bookings in prop::collection::vec((0usize..4, window_strategy()), 0..20),
            request in window_strategy(),
        ) {
            let units: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
            let booked: Vec<BookedWindow> = bookings
                .iter()
                .map(|(u, (s, e))| BookedWindow { console_id: units[*u], start: hours(*s), end: hours(*e) })
                .collect();
            let (start, end) = (hours(request.0), hours(request.1));

            match select_free_unit(&units, &booked, start, end) {
                Some(unit) => {
                    for b in booked.iter().filter(|b| b.console_id == unit) {
                        prop_assert!(b.end <= start || b.start >= end);
                    }
                }
                None => {
                    for unit in &units {
                        prop_assert!(booked
                            .iter()
                            .any(|b| b.console_id == *unit && overlaps(b.start, b.end, start, end)));
                    }
                }
            }
        }

        #[test]
        fn fully_covered_units_yield_none(request in window_strategy(), n in 1usize..5) {
            let units: Vec<Uuid> = (0..n).map(|_| Uuid::new_v4()).collect();
            let (start, end) = (hours(request.0), hours(request.1));
            let booked: Vec<BookedWindow> = units
                .iter()
                .map(|u| BookedWindow { console_id: *u, start: start - Duration::hours(1), end })
                .collect();
            prop_assert_eq!(select_free_unit(&units, &booked, start, end), None);
        }

        #[test]
        fn overlap_is_symmetric(a in window_strategy(), b in window_strategy()) {
            prop_assert_eq!(
                overlaps(hours(a.0), hours(a.1), hours(b.0), hours(b.1)),
                overlaps(hours(b.0), hours(b.1), hours(a.0), hours(a.1))
            );
        }

        #[test]
        fn exact_never_busier_than_approximate(
            bookings in prop::collection::vec(window_strategy(), 0..10),
            units in 1usize..4,
        ) {
            let unit = Uuid::new_v4();
            let booked: Vec<BookedWindow> = bookings
                .iter()
                .map(|(s, e)| BookedWindow { console_id: unit, start: hours(*s), end: hours(*e) })
                .collect();
            let approx = build_calendar(2025, 1, units, &booked, CalendarMode::Approximate).unwrap();
            let exact = build_calendar(2025, 1, units, &booked, CalendarMode::Exact).unwrap();
            for (a, e) in approx.iter().zip(exact.iter()) {
                if a.status == DayStatus::Available {
                    prop_assert_eq!(e.status, DayStatus::Available);
                }
            }
        }
    }
}
