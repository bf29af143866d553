use chrono::{NaiveDate, NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::models::booking::DATE_FORMAT;
use crate::models::{Booking, BookingKind, User};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const BOOKING_COLUMNS: &str = "id, user_id, customer_name, customer_email, booking_date, booking_type, booking_slot, time_from, time_to, created_at, updated_at";

const USER_COLUMNS: &str =
    "id, first_name, last_name, email, password_hash, is_verified, verification_token, created_at";

// ── Users ──

pub fn create_user(conn: &Connection, user: &User) -> anyhow::Result<()> {
    let created_at = user.created_at.format(TIMESTAMP_FORMAT).to_string();

    conn.execute(
        "INSERT INTO users (id, first_name, last_name, email, password_hash, is_verified, verification_token, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            user.id,
            user.first_name,
            user.last_name,
            user.email,
            user.password_hash,
            user.is_verified as i32,
            user.verification_token,
            created_at,
        ],
    )?;
    Ok(())
}

pub fn get_user_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<User>> {
    get_user_where(conn, "id = ?1", id)
}

pub fn get_user_by_email(conn: &Connection, email: &str) -> anyhow::Result<Option<User>> {
    get_user_where(conn, "email = ?1", email)
}

pub fn get_user_by_verification_token(
    conn: &Connection,
    token: &str,
) -> anyhow::Result<Option<User>> {
    get_user_where(conn, "verification_token = ?1", token)
}

fn get_user_where(conn: &Connection, filter: &str, value: &str) -> anyhow::Result<Option<User>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {filter}");
    let user = conn
        .query_row(&sql, params![value], |row| Ok(parse_user_row(row)))
        .optional()?;
    user.transpose()
}

pub fn mark_user_verified(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE users SET is_verified = 1, verification_token = NULL WHERE id = ?1",
        params![id],
    )?;
    Ok(count > 0)
}

pub fn set_verification_token(conn: &Connection, id: &str, token: &str) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE users SET verification_token = ?1 WHERE id = ?2",
        params![token, id],
    )?;
    Ok(count > 0)
}

fn parse_user_row(row: &rusqlite::Row) -> anyhow::Result<User> {
    let created_at_str: String = row.get(7)?;

    Ok(User {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        email: row.get(3)?,
        password_hash: row.get(4)?,
        is_verified: row.get::<_, i32>(5)? != 0,
        verification_token: row.get(6)?,
        created_at: parse_timestamp(&created_at_str),
    })
}

// ── Bookings ──

pub fn create_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<()> {
    let columns = BookingColumns::from(booking);

    conn.execute(
        &format!(
            "INSERT INTO bookings ({BOOKING_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
        ),
        params![
            booking.id,
            booking.user_id,
            booking.customer_name,
            booking.customer_email,
            columns.date,
            booking.kind.as_str(),
            columns.slot,
            columns.time_from,
            columns.time_to,
            columns.created_at,
            columns.updated_at,
        ],
    )?;
    Ok(())
}

pub fn update_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<bool> {
    let columns = BookingColumns::from(booking);

    let count = conn.execute(
        "UPDATE bookings SET
           customer_name = ?1,
           customer_email = ?2,
           booking_date = ?3,
           booking_type = ?4,
           booking_slot = ?5,
           time_from = ?6,
           time_to = ?7,
           updated_at = ?8
         WHERE id = ?9 AND user_id = ?10",
        params![
            booking.customer_name,
            booking.customer_email,
            columns.date,
            booking.kind.as_str(),
            columns.slot,
            columns.time_from,
            columns.time_to,
            columns.updated_at,
            booking.id,
            booking.user_id,
        ],
    )?;
    Ok(count > 0)
}

pub fn delete_booking_for_user(conn: &Connection, id: &str, user_id: &str) -> anyhow::Result<bool> {
    let count = conn.execute(
        "DELETE FROM bookings WHERE id = ?1 AND user_id = ?2",
        params![id, user_id],
    )?;
    Ok(count > 0)
}

pub fn get_booking_for_user(
    conn: &Connection,
    id: &str,
    user_id: &str,
) -> anyhow::Result<Option<Booking>> {
    let booking = conn
        .query_row(
            &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1 AND user_id = ?2"),
            params![id, user_id],
            |row| Ok(parse_booking_row(row)),
        )
        .optional()?;
    booking.transpose()
}

pub fn get_bookings_for_user(
    conn: &Connection,
    user_id: &str,
    limit: i64,
) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings WHERE user_id = ?1
         ORDER BY booking_date DESC, created_at DESC LIMIT ?2"
    ))?;

    let rows = stmt.query_map(params![user_id, limit], |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn count_bookings_for_user(conn: &Connection, user_id: &str) -> anyhow::Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM bookings WHERE user_id = ?1",
        params![user_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

// Regardless of owner.
pub fn get_bookings_on_date(
    conn: &Connection,
    date: NaiveDate,
    exclude_id: Option<&str>,
) -> anyhow::Result<Vec<Booking>> {
    let date_str = date.format(DATE_FORMAT).to_string();

    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings
         WHERE booking_date = ?1 AND (?2 IS NULL OR id != ?2)
         ORDER BY created_at ASC"
    ))?;

    let rows = stmt.query_map(params![date_str, exclude_id], |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

struct BookingColumns {
    date: String,
    slot: Option<&'static str>,
    time_from: Option<String>,
    time_to: Option<String>,
    created_at: String,
    updated_at: String,
}

impl From<&Booking> for BookingColumns {
    fn from(booking: &Booking) -> Self {
        let range = booking.kind.time_range();
        Self {
            date: booking.booking_date.format(DATE_FORMAT).to_string(),
            slot: booking.kind.slot().map(|s| s.as_str()),
            time_from: range.map(|r| r.start_hhmm()),
            time_to: range.map(|r| r.end_hhmm()),
            created_at: booking.created_at.format(TIMESTAMP_FORMAT).to_string(),
            updated_at: booking.updated_at.format(TIMESTAMP_FORMAT).to_string(),
        }
    }
}

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let booking_date_str: String = row.get(4)?;
    let booking_type: String = row.get(5)?;
    let booking_slot: Option<String> = row.get(6)?;
    let time_from: Option<String> = row.get(7)?;
    let time_to: Option<String> = row.get(8)?;
    let created_at_str: String = row.get(9)?;
    let updated_at_str: String = row.get(10)?;

    let booking_date = NaiveDate::parse_from_str(&booking_date_str, DATE_FORMAT)?;
    let kind = BookingKind::from_columns(
        &booking_type,
        booking_slot.as_deref(),
        time_from.as_deref(),
        time_to.as_deref(),
    )?;

    Ok(Booking {
        id: row.get(0)?,
        user_id: row.get(1)?,
        customer_name: row.get(2)?,
        customer_email: row.get(3)?,
        booking_date,
        kind,
        created_at: parse_timestamp(&created_at_str),
        updated_at: parse_timestamp(&updated_at_str),
    })
}

fn parse_timestamp(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).unwrap_or_else(|_| Utc::now().naive_utc())
}
