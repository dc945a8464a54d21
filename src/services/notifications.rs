use chrono::NaiveDate;

use crate::config::SalonIdentity;
use crate::models::{Booking, BookingStatus};
use crate::services::messaging::{MailTransport, MessageParams, OutboundMessage, Template};

const CREATED_MESSAGE: &str = "Thank you for booking with us! We've received your appointment request and will confirm it shortly. You'll receive another email once your booking is confirmed.";
const CONFIRMED_MESSAGE: &str = "🎉 Great news! Your appointment has been CONFIRMED. We look forward to seeing you! If you need to make any changes, please contact us.";
const CANCELLED_MESSAGE: &str = "❌ Unfortunately, your appointment has been CANCELLED. We apologize for any inconvenience. Please contact us to reschedule at your convenience.";
const STAFF_MESSAGE: &str = "A new booking request is waiting for review in the admin panel.";

/// Formats booking messages and hands them to the mail transport.
pub struct Notifier {
    transport: Box<dyn MailTransport>,
    salon: SalonIdentity,
    staff_email: Option<String>,
}

/// e.g. "Wednesday, June 18, 2025"
pub fn format_booking_date(date: NaiveDate) -> String {
    date.format("%A, %B %-d, %Y").to_string()
}

pub fn status_label(status: BookingStatus) -> &'static str {
    match status {
        BookingStatus::Pending => "⏳ PENDING",
        BookingStatus::Confirmed => "✅ CONFIRMED",
        BookingStatus::Cancelled => "❌ CANCELLED",
    }
}

impl Notifier {
    pub fn new(
        transport: Box<dyn MailTransport>,
        salon: SalonIdentity,
        staff_email: Option<String>,
    ) -> Self {
        Self {
            transport,
            salon,
            staff_email,
        }
    }

    pub fn staff_configured(&self) -> bool {
        self.staff_email.is_some()
    }

    /// False when messages are only logged.
    pub fn delivers(&self) -> bool {
        self.transport.delivers()
    }

    fn customer_params(
        &self,
        booking: &Booking,
        subject_line: String,
        email_title: &str,
        status: BookingStatus,
        main_message: &str,
    ) -> MessageParams {
        MessageParams {
            to_email: booking.email.clone(),
            subject_line,
            email_title: email_title.to_string(),
            customer_name: booking.name.clone(),
            service_name: booking.service.clone(),
            booking_date: format_booking_date(booking.date),
            booking_time: booking.time.clone(),
            booking_status: status_label(status).to_string(),
            main_message: main_message.to_string(),
            customer_email: None,
            customer_phone: None,
            customer_notes: None,
            salon: self.salon.clone(),
        }
    }

    pub async fn notify_customer_created(&self, booking: &Booking) -> anyhow::Result<()> {
        let params = self.customer_params(
            booking,
            format!("Booking Received - {}", self.salon.salon_name),
            "Booking Confirmation",
            BookingStatus::Pending,
            CREATED_MESSAGE,
        );
        self.transport
            .send(&OutboundMessage {
                template: Template::Customer,
                params,
            })
            .await
    }

    pub async fn notify_customer_status(
        &self,
        booking: &Booking,
        status: BookingStatus,
    ) -> anyhow::Result<()> {
        let (subject, message) = match status {
            BookingStatus::Confirmed => ("CONFIRMED", CONFIRMED_MESSAGE),
            BookingStatus::Cancelled => ("CANCELLED", CANCELLED_MESSAGE),
            BookingStatus::Pending => anyhow::bail!("no customer message for status pending"),
        };
        let params = self.customer_params(
            booking,
            format!("Booking {subject} - {}", self.salon.salon_name),
            "Booking Update",
            status,
            message,
        );
        self.transport
            .send(&OutboundMessage {
                template: Template::Customer,
                params,
            })
            .await
    }

    pub async fn notify_staff_created(&self, booking: &Booking) -> anyhow::Result<()> {
        let Some(staff_email) = self.staff_email.as_ref() else {
            anyhow::bail!("no staff notification address configured");
        };
        let params = MessageParams {
            to_email: staff_email.clone(),
            subject_line: format!("New Booking - {}", booking.name),
            email_title: "New Booking Request".to_string(),
            customer_name: booking.name.clone(),
            service_name: booking.service.clone(),
            booking_date: format_booking_date(booking.date),
            booking_time: booking.time.clone(),
            booking_status: status_label(booking.status).to_string(),
            main_message: STAFF_MESSAGE.to_string(),
            customer_email: Some(booking.email.clone()),
            customer_phone: Some(booking.phone.clone()),
            customer_notes: Some(booking.notes.clone().unwrap_or_else(|| "None".to_string())),
            salon: self.salon.clone(),
        };
        self.transport
            .send(&OutboundMessage {
                template: Template::Staff,
                params,
            })
            .await
    }
}
