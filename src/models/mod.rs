pub mod availability;
pub mod booking;
pub mod user;

pub use availability::{DayAvailability, OpenRange};
pub use booking::{Booking, BookingKind, HalfDaySlot, TimeRange};
pub use user::{PublicUser, User};
