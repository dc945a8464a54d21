use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::Connection;

use super::{BookingStore, StoreError};
use crate::clock::Clock;
use crate::db::{self, queries};
use crate::models::{phone_digits, Booking, BookingStatus, NewBooking};

/// SQLite-backed store. Scoped to one database file on one host; nothing is
/// shared with other machines.
pub struct LocalStore {
    conn: Arc<Mutex<Connection>>,
    clock: Arc<dyn Clock>,
}

impl LocalStore {
    pub fn new(conn: Connection, clock: Arc<dyn Clock>) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
            clock,
        }
    }

    pub fn open(path: &str, clock: Arc<dyn Clock>) -> anyhow::Result<Self> {
        Ok(Self::new(db::init_db(path)?, clock))
    }

    fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| anyhow::anyhow!("database lock poisoned"))?;
        f(&conn)
    }
}

#[async_trait]
impl BookingStore for LocalStore {
    async fn create(&self, booking: NewBooking) -> Result<Booking, StoreError> {
        let now = self.clock.now();
        let booking = Booking {
            id: uuid::Uuid::new_v4().to_string(),
            name: booking.name,
            email: booking.email.to_lowercase(),
            phone: booking.phone,
            service: booking.service,
            date: booking.date,
            time: booking.time,
            notes: booking.notes,
            status: BookingStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        self.with_conn(|conn| Ok(queries::create_booking(conn, &booking)?))?;
        tracing::info!(booking_id = %booking.id, "booking stored");
        Ok(booking)
    }

    async fn list_all(&self) -> Result<Vec<Booking>, StoreError> {
        self.with_conn(|conn| Ok(queries::get_all_bookings(conn)?))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>, StoreError> {
        self.with_conn(|conn| Ok(queries::get_booking_by_id(conn, id)?))
    }

    async fn find_by_email(&self, email: &str) -> Result<Vec<Booking>, StoreError> {
        let email = email.trim().to_lowercase();
        self.with_conn(|conn| Ok(queries::get_bookings_by_email(conn, &email)?))
    }

    async fn find_by_phone(&self, phone: &str) -> Result<Vec<Booking>, StoreError> {
        let digits = phone_digits(phone);
        if digits.is_empty() {
            return Ok(Vec::new());
        }
        self.with_conn(|conn| Ok(queries::get_bookings_by_phone_digits(conn, &digits)?))
    }

    async fn update_status(&self, id: &str, status: BookingStatus) -> Result<(), StoreError> {
        let now = self.clock.now();
        self.with_conn(|conn| {
            let current = queries::get_booking_status(conn, id)?
                .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
            if !current.can_transition_to(status) {
                return Err(StoreError::InvalidTransition {
                    from: current,
                    to: status,
                });
            }
            if !queries::update_booking_status_from(conn, id, current, status, &now)? {
                // Another writer on the same file got there first.
                return match queries::get_booking_status(conn, id)? {
                    Some(from) => Err(StoreError::InvalidTransition { from, to: status }),
                    None => Err(StoreError::NotFound(id.to_string())),
                };
            }
            Ok(())
        })?;

        tracing::info!(booking_id = %id, status = %status, "booking status updated");
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let removed = self.with_conn(|conn| Ok(queries::delete_booking(conn, id)?))?;
        if !removed {
            return Err(StoreError::NotFound(id.to_string()));
        }
        tracing::info!(booking_id = %id, "booking deleted");
        Ok(())
    }
}
