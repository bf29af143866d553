use chrono::NaiveDate;
use rusqlite::Connection;

use crate::db::queries;
use crate::models::{Booking, BookingKind, HalfDaySlot};

#[derive(Debug)]
pub enum SchedulingError {
    Overlap,
    Storage(anyhow::Error),
}

impl std::fmt::Display for SchedulingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchedulingError::Overlap => {
                write!(f, "booking overlaps with an existing booking")
            }
            SchedulingError::Storage(e) => write!(f, "failed to load bookings: {e}"),
        }
    }
}

// `existing` must all be on the candidate's date.
pub fn has_overlap(existing: &[Booking], candidate: &BookingKind) -> bool {
    existing.iter().any(|b| conflicts(candidate, &b.kind))
}

fn conflicts(candidate: &BookingKind, existing: &BookingKind) -> bool {
    match (candidate, existing) {
        (BookingKind::FullDay, _) => true,
        (_, BookingKind::FullDay) => true,

        (BookingKind::HalfDay(want), BookingKind::HalfDay(have)) => want == have,
        // A half day only yields to a full day or the same half.
        (BookingKind::HalfDay(_), BookingKind::Custom(_)) => false,

        (BookingKind::Custom(range), BookingKind::HalfDay(HalfDaySlot::FirstHalf)) => {
            range.touches_first_half()
        }
        (BookingKind::Custom(range), BookingKind::HalfDay(HalfDaySlot::SecondHalf)) => {
            range.touches_second_half()
        }
        (BookingKind::Custom(want), BookingKind::Custom(have)) => want.overlaps(have),
    }
}

// `exclude_id` skips the booking being replaced by an update.
pub fn ensure_no_overlap(
    conn: &Connection,
    date: NaiveDate,
    candidate: &BookingKind,
    exclude_id: Option<&str>,
) -> Result<(), SchedulingError> {
    let bookings =
        queries::get_bookings_on_date(conn, date, exclude_id).map_err(SchedulingError::Storage)?;

    if has_overlap(&bookings, candidate) {
        tracing::debug!(
            date = %date,
            kind = candidate.as_str(),
            existing = bookings.len(),
            "booking rejected: overlap"
        );
        return Err(SchedulingError::Overlap);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::{TimeRange, User};
    use chrono::Utc;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn custom(from: &str, to: &str) -> BookingKind {
        BookingKind::Custom(TimeRange::parse(from, to).unwrap())
    }

    fn first_half() -> BookingKind {
        BookingKind::HalfDay(HalfDaySlot::FirstHalf)
    }

    fn second_half() -> BookingKind {
        BookingKind::HalfDay(HalfDaySlot::SecondHalf)
    }

    fn booking(id: &str, date: &str, kind: BookingKind) -> Booking {
        let now = Utc::now().naive_utc();
        Booking {
            id: id.to_string(),
            user_id: "user-1".to_string(),
            customer_name: "Alice".to_string(),
            customer_email: "alice@example.com".to_string(),
            booking_date: day(date),
            kind,
            created_at: now,
            updated_at: now,
        }
    }

    fn on_day(kinds: &[BookingKind]) -> Vec<Booking> {
        kinds
            .iter()
            .enumerate()
            .map(|(i, k)| booking(&format!("b-{i}"), "2025-06-16", *k))
            .collect()
    }

    #[test]
    fn test_empty_day_accepts_everything() {
        assert!(!has_overlap(&[], &BookingKind::FullDay));
        assert!(!has_overlap(&[], &first_half()));
        assert!(!has_overlap(&[], &custom("09:00", "10:00")));
    }

    #[test]
    fn test_full_day_conflicts_with_any_booking() {
        for existing in [
            BookingKind::FullDay,
            first_half(),
            second_half(),
            custom("18:00", "19:00"),
        ] {
            assert!(has_overlap(&on_day(&[existing]), &BookingKind::FullDay));
        }
    }

    #[test]
    fn test_everything_conflicts_with_existing_full_day() {
        let day = on_day(&[BookingKind::FullDay]);
        assert!(has_overlap(&day, &first_half()));
        assert!(has_overlap(&day, &second_half()));
        assert!(has_overlap(&day, &custom("23:00", "23:30")));
    }

    #[test]
    fn test_different_half_days_do_not_conflict() {
        assert!(!has_overlap(&on_day(&[first_half()]), &second_half()));
        assert!(!has_overlap(&on_day(&[second_half()]), &first_half()));
    }

    #[test]
    fn test_same_half_day_conflicts() {
        assert!(has_overlap(&on_day(&[first_half()]), &first_half()));
        assert!(has_overlap(&on_day(&[second_half()]), &second_half()));
    }

    #[test]
    fn test_half_day_ignores_custom_bookings() {
        let day = on_day(&[custom("09:00", "10:00")]);
        assert!(!has_overlap(&day, &first_half()));
    }

    #[test]
    fn test_morning_custom_conflicts_with_first_half() {
        let day = on_day(&[first_half()]);
        assert!(has_overlap(&day, &custom("09:00", "11:00")));
        assert!(!has_overlap(&day, &custom("13:00", "15:00")));
        assert!(!has_overlap(&day, &custom("12:00", "13:00")));
    }

    #[test]
    fn test_afternoon_custom_conflicts_with_second_half() {
        let day = on_day(&[second_half()]);
        assert!(has_overlap(&day, &custom("14:00", "15:00")));
        assert!(has_overlap(&day, &custom("11:00", "12:30")));
        assert!(!has_overlap(&day, &custom("10:00", "12:00")));
    }

    #[test]
    fn test_custom_ranges() {
        let day = on_day(&[custom("09:00", "10:00")]);
        assert!(has_overlap(&day, &custom("09:30", "10:30")));
        assert!(has_overlap(&day, &custom("08:00", "11:00")));
        assert!(has_overlap(&day, &custom("09:15", "09:45")));
        assert!(!has_overlap(&day, &custom("10:00", "11:00")));
        assert!(!has_overlap(&day, &custom("08:00", "09:00")));
    }

    // ── Against the database ──

    fn setup_db() -> Connection {
        let conn = db::init_db(":memory:").unwrap();
        let now = Utc::now().naive_utc();
        queries::create_user(
            &conn,
            &User {
                id: "user-1".to_string(),
                first_name: "Alice".to_string(),
                last_name: "Smith".to_string(),
                email: "alice@example.com".to_string(),
                password_hash: "x".to_string(),
                is_verified: true,
                verification_token: None,
                created_at: now,
            },
        )
        .unwrap();
        conn
    }

    #[test]
    fn test_ensure_no_overlap_only_checks_same_date() {
        let conn = setup_db();
        queries::create_booking(&conn, &booking("b-1", "2025-06-16", BookingKind::FullDay)).unwrap();

        let result = ensure_no_overlap(&conn, day("2025-06-16"), &first_half(), None);
        assert!(matches!(result, Err(SchedulingError::Overlap)));

        let result = ensure_no_overlap(&conn, day("2025-06-17"), &BookingKind::FullDay, None);
        assert!(result.is_ok());
    }

    #[test]
    fn test_ensure_no_overlap_excludes_updated_booking() {
        let conn = setup_db();
        queries::create_booking(&conn, &booking("b-1", "2025-06-16", custom("09:00", "10:00")))
            .unwrap();

        let moved = custom("09:30", "10:30");
        assert!(ensure_no_overlap(&conn, day("2025-06-16"), &moved, None).is_err());
        assert!(ensure_no_overlap(&conn, day("2025-06-16"), &moved, Some("b-1")).is_ok());
    }
}
