pub mod local;
pub mod remote;

use async_trait::async_trait;

use crate::models::{Booking, BookingStatus, NewBooking};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("booking not found: {0}")]
    NotFound(String),

    #[error("cannot change booking status from {from} to {to}")]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },

    #[error("storage backend error: {0}")]
    Transport(#[from] anyhow::Error),
}

/// Persistence contract shared by every backend.
///
/// Both implementations order listings newest-created first, match emails on
/// the lower-cased value and phones on their digits only. `delete` of an
/// unknown id reports [`StoreError::NotFound`].
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Stores a new booking with status `pending` and returns the stored
    /// record, including its assigned id and timestamps.
    async fn create(&self, booking: NewBooking) -> Result<Booking, StoreError>;

    async fn list_all(&self) -> Result<Vec<Booking>, StoreError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Vec<Booking>, StoreError>;

    async fn find_by_phone(&self, phone: &str) -> Result<Vec<Booking>, StoreError>;

    /// Applies a status change permitted by the booking state machine.
    /// Fails with `NotFound` for an unknown id and `InvalidTransition` when
    /// the current status does not allow `status`.
    async fn update_status(&self, id: &str, status: BookingStatus) -> Result<(), StoreError>;

    async fn delete(&self, id: &str) -> Result<(), StoreError>;
}
