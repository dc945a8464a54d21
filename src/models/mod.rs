pub mod booking;
pub mod schedule;

pub use booking::{phone_digits, Booking, BookingForm, BookingStatus, NewBooking};
pub use schedule::Schedule;
