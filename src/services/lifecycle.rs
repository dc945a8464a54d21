use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::clock::Clock;
use crate::errors::AppError;
use crate::models::{Booking, BookingForm, BookingStatus, Schedule};
use crate::services::notifications::Notifier;
use crate::services::store::BookingStore;
use crate::services::validation::{self, Field, ValidationErrors};

/// Result of one notification attempt. Failures are reported, never raised.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "lowercase")]
pub enum Delivery {
    Sent,
    Failed(String),
    Skipped,
}

impl Delivery {
    fn from_result(result: anyhow::Result<()>, kind: &str, booking_id: &str) -> Self {
        match result {
            Ok(()) => Delivery::Sent,
            Err(e) => {
                tracing::warn!(booking_id = %booking_id, error = %e, "{kind} notification failed");
                Delivery::Failed(e.to_string())
            }
        }
    }

    pub fn is_sent(&self) -> bool {
        matches!(self, Delivery::Sent)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateOutcome {
    pub booking: Booking,
    pub customer: Delivery,
    pub staff: Delivery,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusOutcome {
    pub booking: Booking,
    pub customer: Delivery,
    pub message: String,
}

/// Booking counts per status for the staff overview.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BookingStats {
    pub total: usize,
    pub pending: usize,
    pub confirmed: usize,
    pub cancelled: usize,
}

/// Coordinates validation, persistence and notification for bookings.
/// Works against any [`BookingStore`]; the backend is picked by whoever
/// builds the controller.
pub struct BookingLifecycle {
    store: Arc<dyn BookingStore>,
    notifier: Notifier,
    schedule: Schedule,
    clock: Arc<dyn Clock>,
}

impl BookingLifecycle {
    pub fn new(
        store: Arc<dyn BookingStore>,
        notifier: Notifier,
        schedule: Schedule,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            notifier,
            schedule,
            clock,
        }
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    fn local_now(&self) -> NaiveDateTime {
        self.schedule.local_now(self.clock.now())
    }

    /// A send that only reached the log counts as skipped, not sent.
    fn delivery(&self, result: anyhow::Result<()>, kind: &str, booking_id: &str) -> Delivery {
        match Delivery::from_result(result, kind, booking_id) {
            Delivery::Sent if !self.notifier.delivers() => Delivery::Skipped,
            other => other,
        }
    }

    /// Public booking form submission.
    ///
    /// Nothing is stored unless every field passes. Once stored, the booking
    /// stands even if the customer or staff notification fails; the outcome
    /// says which messages went out.
    pub async fn create(&self, form: &BookingForm) -> Result<CreateOutcome, AppError> {
        let new_booking = validation::validate_form(form, &self.schedule, self.local_now())
            .map_err(|errors| {
                tracing::info!(first_invalid = ?errors.first_field(), "booking form rejected");
                AppError::Validation(errors)
            })?;

        let booking = self.store.create(new_booking).await?;
        tracing::info!(
            booking_id = %booking.id,
            service = %booking.service,
            date = %booking.date,
            time = %booking.time,
            "booking created"
        );

        let customer = self.delivery(
            self.notifier.notify_customer_created(&booking).await,
            "customer",
            &booking.id,
        );
        let staff = if self.notifier.staff_configured() {
            self.delivery(
                self.notifier.notify_staff_created(&booking).await,
                "staff",
                &booking.id,
            )
        } else {
            Delivery::Skipped
        };

        let message = match (&customer, &staff) {
            (Delivery::Sent, Delivery::Sent | Delivery::Skipped) => {
                "Booking submitted! Check your email for confirmation."
            }
            (Delivery::Sent, _) => "Booking submitted! Confirmation email sent.",
            _ => "Booking submitted! We'll contact you soon.",
        };

        Ok(CreateOutcome {
            booking,
            customer,
            staff,
            message: message.to_string(),
        })
    }

    pub async fn confirm(&self, id: &str) -> Result<StatusOutcome, AppError> {
        self.change_status(id, BookingStatus::Confirmed).await
    }

    /// Cancelling notifies the customer, so it needs an explicit go-ahead.
    pub async fn cancel(&self, id: &str, confirmed: bool) -> Result<StatusOutcome, AppError> {
        if !confirmed {
            return Err(AppError::ConfirmationRequired(
                "Cancelling a booking notifies the customer; confirm to proceed",
            ));
        }
        self.change_status(id, BookingStatus::Cancelled).await
    }

    async fn change_status(
        &self,
        id: &str,
        status: BookingStatus,
    ) -> Result<StatusOutcome, AppError> {
        let before = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("booking {id}")))?;

        self.store.update_status(id, status).await?;

        let booking = match self.store.find_by_id(id).await {
            Ok(Some(updated)) => updated,
            Ok(None) | Err(_) => {
                tracing::warn!(booking_id = %id, "could not re-read booking after status change");
                Booking {
                    status,
                    updated_at: self.clock.now(),
                    ..before
                }
            }
        };

        let customer = self.delivery(
            self.notifier.notify_customer_status(&booking, status).await,
            "status",
            id,
        );

        let message = match (status, customer.is_sent()) {
            (BookingStatus::Cancelled, true) => {
                "Booking cancelled. Customer has been notified via email."
            }
            (BookingStatus::Cancelled, false) => "Booking cancelled. (Email notification failed)",
            (_, true) => "Booking confirmed! Customer has been notified via email.",
            (_, false) => "Booking confirmed! (Email notification failed)",
        };

        Ok(StatusOutcome {
            booking,
            customer,
            message: message.to_string(),
        })
    }

    pub async fn delete(&self, id: &str, confirmed: bool) -> Result<(), AppError> {
        if !confirmed {
            return Err(AppError::ConfirmationRequired(
                "Deleting a booking cannot be undone; confirm to proceed",
            ));
        }
        self.store.delete(id).await?;
        Ok(())
    }

    pub async fn list_all(&self) -> Result<Vec<Booking>, AppError> {
        Ok(self.store.list_all().await?)
    }

    pub async fn lookup_by_email(&self, email: &str) -> Result<Vec<Booking>, AppError> {
        Ok(self.store.find_by_email(email).await?)
    }

    pub async fn lookup_by_phone(&self, phone: &str) -> Result<Vec<Booking>, AppError> {
        Ok(self.store.find_by_phone(phone).await?)
    }

    pub async fn stats(&self) -> Result<BookingStats, AppError> {
        let bookings = self.store.list_all().await?;
        let mut stats = BookingStats {
            total: bookings.len(),
            ..BookingStats::default()
        };
        for booking in &bookings {
            match booking.status {
                BookingStatus::Pending => stats.pending += 1,
                BookingStatus::Confirmed => stats.confirmed += 1,
                BookingStatus::Cancelled => stats.cancelled += 1,
            }
        }
        Ok(stats)
    }

    pub fn available_slots(&self, date: &str) -> Result<Vec<String>, AppError> {
        let date: NaiveDate = validation::parse_date(date).ok_or_else(|| {
            AppError::Validation(ValidationErrors::single(
                Field::Date,
                "Please enter a valid date",
            ))
        })?;
        Ok(self.schedule.available_slots(date, self.local_now()))
    }
}
