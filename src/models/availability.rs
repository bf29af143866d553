use serde::Serialize;

use super::booking::{format_minute, Booking, BookingKind, HalfDaySlot, TimeRange, END_OF_DAY_MINUTE};
use crate::services::scheduling::has_overlap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayAvailability {
    pub full_day: bool,
    pub first_half: bool,
    pub second_half: bool,
    pub booked_ranges: Vec<TimeRange>,
    pub open_ranges: Vec<OpenRange>,
}

// A free `[from, to)` stretch; `to` may be "24:00".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenRange {
    pub from: String,
    pub to: String,
}

impl DayAvailability {
    // `bookings` must all be on the same date.
    pub fn from_bookings(bookings: &[Booking]) -> Self {
        let mut booked_ranges: Vec<TimeRange> =
            bookings.iter().filter_map(|b| b.kind.time_range()).collect();
        booked_ranges.sort();

        Self {
            full_day: !has_overlap(bookings, &BookingKind::FullDay),
            first_half: !has_overlap(bookings, &BookingKind::HalfDay(HalfDaySlot::FirstHalf)),
            second_half: !has_overlap(bookings, &BookingKind::HalfDay(HalfDaySlot::SecondHalf)),
            booked_ranges,
            open_ranges: open_ranges(bookings),
        }
    }
}

fn open_ranges(bookings: &[Booking]) -> Vec<OpenRange> {
    let mut blocked: Vec<(u32, u32)> = bookings.iter().map(|b| b.kind.blocked_minutes()).collect();
    blocked.sort_unstable();

    let mut open = Vec::new();
    let mut cursor = 0;
    for (start, end) in blocked {
        if start > cursor {
            open.push(OpenRange {
                from: format_minute(cursor),
                to: format_minute(start),
            });
        }
        cursor = cursor.max(end);
    }
    if cursor < END_OF_DAY_MINUTE {
        open.push(OpenRange {
            from: format_minute(cursor),
            to: format_minute(END_OF_DAY_MINUTE),
        });
    }
    open
}
