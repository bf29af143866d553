use anyhow::{anyhow, bail};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::Serialize;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M";

pub const NOON_MINUTE: u32 = 12 * 60;
pub const END_OF_DAY_MINUTE: u32 = 24 * 60;

#[derive(Debug, Clone)]
pub struct Booking {
    pub id: String,
    pub user_id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub booking_date: NaiveDate,
    pub kind: BookingKind,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingKind {
    FullDay,
    HalfDay(HalfDaySlot),
    Custom(TimeRange),
}

impl BookingKind {
    // Client-facing labels: "Half Day", "First Half", "09:30".
    pub fn from_labels(
        booking_type: &str,
        slot: Option<&str>,
        time_from: Option<&str>,
        time_to: Option<&str>,
    ) -> anyhow::Result<Self> {
        match booking_type.trim() {
            "Full Day" => Ok(BookingKind::FullDay),
            "Half Day" => {
                let slot = slot
                    .filter(|s| !s.trim().is_empty())
                    .ok_or_else(|| anyhow!("Booking slot is required for Half Day bookings"))?;
                let slot = HalfDaySlot::from_label(slot)
                    .ok_or_else(|| anyhow!("invalid booking slot: {slot}"))?;
                Ok(BookingKind::HalfDay(slot))
            }
            "Custom" => match (time_from, time_to) {
                (Some(from), Some(to)) if !from.trim().is_empty() && !to.trim().is_empty() => {
                    Ok(BookingKind::Custom(TimeRange::parse(from, to)?))
                }
                _ => bail!("Booking time range is required for Custom bookings"),
            },
            other => bail!("invalid booking type: {other}"),
        }
    }

    pub fn from_columns(
        booking_type: &str,
        slot: Option<&str>,
        time_from: Option<&str>,
        time_to: Option<&str>,
    ) -> anyhow::Result<Self> {
        match booking_type {
            "full_day" => Ok(BookingKind::FullDay),
            "half_day" => {
                let slot = slot.and_then(HalfDaySlot::parse).ok_or_else(|| {
                    anyhow!("half day booking stored without a valid slot: {slot:?}")
                })?;
                Ok(BookingKind::HalfDay(slot))
            }
            "custom" => match (time_from, time_to) {
                (Some(from), Some(to)) => Ok(BookingKind::Custom(TimeRange::parse(from, to)?)),
                _ => bail!("custom booking stored without a time range"),
            },
            other => bail!("unknown stored booking type: {other}"),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingKind::FullDay => "full_day",
            BookingKind::HalfDay(_) => "half_day",
            BookingKind::Custom(_) => "custom",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BookingKind::FullDay => "Full Day",
            BookingKind::HalfDay(_) => "Half Day",
            BookingKind::Custom(_) => "Custom",
        }
    }

    pub fn slot(&self) -> Option<HalfDaySlot> {
        match self {
            BookingKind::HalfDay(slot) => Some(*slot),
            _ => None,
        }
    }

    pub fn time_range(&self) -> Option<TimeRange> {
        match self {
            BookingKind::Custom(range) => Some(*range),
            _ => None,
        }
    }

    // Half-open `[start, end)`.
    pub fn blocked_minutes(&self) -> (u32, u32) {
        match self {
            BookingKind::FullDay => (0, END_OF_DAY_MINUTE),
            BookingKind::HalfDay(HalfDaySlot::FirstHalf) => (0, NOON_MINUTE),
            BookingKind::HalfDay(HalfDaySlot::SecondHalf) => (NOON_MINUTE, END_OF_DAY_MINUTE),
            BookingKind::Custom(range) => (range.start_minute(), range.end_minute()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HalfDaySlot {
    FirstHalf,
    SecondHalf,
}

impl HalfDaySlot {
    pub fn as_str(&self) -> &'static str {
        match self {
            HalfDaySlot::FirstHalf => "first_half",
            HalfDaySlot::SecondHalf => "second_half",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "first_half" => Some(HalfDaySlot::FirstHalf),
            "second_half" => Some(HalfDaySlot::SecondHalf),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            HalfDaySlot::FirstHalf => "First Half",
            HalfDaySlot::SecondHalf => "Second Half",
        }
    }

    pub fn from_label(s: &str) -> Option<Self> {
        match s.trim() {
            "First Half" => Some(HalfDaySlot::FirstHalf),
            "Second Half" => Some(HalfDaySlot::SecondHalf),
            _ => None,
        }
    }
}

// Half-open `[from, to)` in minutes of the day; `to` may be 24:00.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct TimeRange {
    #[serde(serialize_with = "serialize_minute")]
    from: u32,
    #[serde(serialize_with = "serialize_minute")]
    to: u32,
}

impl TimeRange {
    pub fn from_minutes(from: u32, to: u32) -> anyhow::Result<Self> {
        if to > END_OF_DAY_MINUTE {
            bail!("booking time to ({}) is past the end of the day", format_minute(to));
        }
        if from >= to {
            bail!(
                "booking time from ({}) must be before time to ({})",
                format_minute(from),
                format_minute(to)
            );
        }
        Ok(Self { from, to })
    }

    pub fn parse(from: &str, to: &str) -> anyhow::Result<Self> {
        Self::from_minutes(parse_minute(from, false)?, parse_minute(to, true)?)
    }

    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.from < other.to && other.from < self.to
    }

    pub fn start_minute(&self) -> u32 {
        self.from
    }

    pub fn end_minute(&self) -> u32 {
        self.to
    }

    pub fn start_hhmm(&self) -> String {
        format_minute(self.from)
    }

    pub fn end_hhmm(&self) -> String {
        format_minute(self.to)
    }

    // Any part of the range before noon.
    pub fn touches_first_half(&self) -> bool {
        self.from < NOON_MINUTE
    }

    // Any part of the range after noon.
    pub fn touches_second_half(&self) -> bool {
        self.to > NOON_MINUTE
    }
}

pub fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
        .map_err(|_| anyhow!("invalid date (expected YYYY-MM-DD): {s}"))
}

// Times are minute precision; seconds are rejected rather than truncated.
fn parse_minute(s: &str, allow_end_of_day: bool) -> anyhow::Result<u32> {
    let s = s.trim();
    if allow_end_of_day && s == "24:00" {
        return Ok(END_OF_DAY_MINUTE);
    }
    let t = NaiveTime::parse_from_str(s, TIME_FORMAT)
        .map_err(|_| anyhow!("invalid time (expected HH:MM): {s}"))?;
    Ok(t.hour() * 60 + t.minute())
}

pub fn format_minute(minute: u32) -> String {
    format!("{:02}:{:02}", minute / 60, minute % 60)
}

fn serialize_minute<S: serde::Serializer>(minute: &u32, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&format_minute(*minute))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(from: &str, to: &str) -> TimeRange {
        TimeRange::parse(from, to).unwrap()
    }

    #[test]
    fn test_time_range_rejects_empty_and_inverted() {
        assert!(TimeRange::parse("10:00", "10:00").is_err());
        assert!(TimeRange::parse("11:00", "10:00").is_err());
        assert!(TimeRange::parse("25:00", "26:00").is_err());
    }

    #[test]
    fn test_time_range_rejects_seconds() {
        assert!(TimeRange::parse("09:00:10", "09:00:50").is_err());
        assert!(TimeRange::parse("11:00", "12:00:30").is_err());
    }

    #[test]
    fn test_time_range_end_of_day() {
        let r = range("23:00", "24:00");
        assert_eq!(r.end_minute(), END_OF_DAY_MINUTE);
        assert_eq!(r.end_hhmm(), "24:00");
        assert!(TimeRange::parse("24:00", "24:00").is_err());
        assert!(TimeRange::parse("23:00", "24:01").is_err());
    }

    #[test]
    fn test_overlap_is_half_open() {
        assert!(range("09:00", "10:00").overlaps(&range("09:30", "10:30")));
        assert!(!range("09:00", "10:00").overlaps(&range("10:00", "11:00")));
        assert!(range("08:00", "12:00").overlaps(&range("09:00", "10:00")));
    }

    #[test]
    fn test_noon_halves() {
        assert!(range("09:00", "11:00").touches_first_half());
        assert!(!range("09:00", "11:00").touches_second_half());
        assert!(!range("10:00", "12:00").touches_second_half());
        assert!(range("11:30", "12:30").touches_first_half());
        assert!(range("11:30", "12:30").touches_second_half());
        assert!(!range("12:00", "13:00").touches_first_half());
    }

    #[test]
    fn test_kind_from_labels() {
        assert_eq!(
            BookingKind::from_labels("Full Day", None, None, None).unwrap(),
            BookingKind::FullDay
        );
        assert_eq!(
            BookingKind::from_labels("Half Day", Some("Second Half"), None, None).unwrap(),
            BookingKind::HalfDay(HalfDaySlot::SecondHalf)
        );
        assert!(BookingKind::from_labels("Half Day", None, None, None).is_err());
        assert!(BookingKind::from_labels("Half Day", Some("Evening"), None, None).is_err());
        assert!(BookingKind::from_labels("Custom", None, Some("09:00"), None).is_err());
        assert!(BookingKind::from_labels("Weekly", None, None, None).is_err());
    }

    #[test]
    fn test_kind_columns_match_labels() {
        let kind = BookingKind::from_labels("Custom", None, Some("09:00"), Some("10:15")).unwrap();
        let range = kind.time_range().unwrap();
        let (from, to) = (range.start_hhmm(), range.end_hhmm());
        let restored =
            BookingKind::from_columns(kind.as_str(), None, Some(&from), Some(&to)).unwrap();
        assert_eq!(restored, kind);
    }

    #[test]
    fn test_time_range_serializes_as_hhmm() {
        let json = serde_json::to_value(range("09:05", "17:30")).unwrap();
        assert_eq!(json, serde_json::json!({"from": "09:05", "to": "17:30"}));
    }
}
