use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::models::{phone_digits, BookingForm, NewBooking, Schedule};

pub const NAME_MIN_LEN: usize = 2;
pub const NAME_MAX_LEN: usize = 50;
pub const PHONE_MIN_DIGITS: usize = 10;
pub const PHONE_MAX_DIGITS: usize = 15;
pub const NOTES_MAX_LEN: usize = 500;

/// Form fields in the order a form presents them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Name,
    Email,
    Phone,
    Service,
    Date,
    Time,
    Notes,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Email => "email",
            Field::Phone => "phone",
            Field::Service => "service",
            Field::Date => "date",
            Field::Time => "time",
            Field::Notes => "notes",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: Field,
    pub message: String,
}

/// Every failing field of one submission, in field order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn single(field: Field, message: impl Into<String>) -> Self {
        Self {
            errors: vec![FieldError {
                field,
                message: message.into(),
            }],
        }
    }

    fn check(&mut self, field: Field, result: Option<String>) {
        if let Some(message) = result {
            self.errors.push(FieldError { field, message });
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// The field a form should focus.
    pub fn first_field(&self) -> Option<Field> {
        self.errors.first().map(|e| e.field)
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field.as_str(), e.message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

pub fn validate_name(name: &str) -> Option<String> {
    let name = name.trim();
    if name.is_empty() {
        return Some("Name is required".to_string());
    }
    let len = name.chars().count();
    if len < NAME_MIN_LEN {
        return Some(format!("Name must be at least {NAME_MIN_LEN} characters"));
    }
    if len > NAME_MAX_LEN {
        return Some(format!("Name must be at most {NAME_MAX_LEN} characters"));
    }
    let allowed = |c: char| c.is_ascii_alphabetic() || c == ' ' || c == '-' || c == '\'';
    if !name.chars().all(allowed) {
        return Some(
            "Name can only contain letters, spaces, hyphens, and apostrophes".to_string(),
        );
    }
    None
}

pub fn validate_email(email: &str) -> Option<String> {
    let email = email.trim();
    if email.is_empty() {
        return Some("Email is required".to_string());
    }
    if !is_email_shaped(email) {
        return Some("Please enter a valid email address".to_string());
    }
    None
}

// local@domain.tld, no whitespace or extra '@' anywhere
fn is_email_shaped(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    let part_ok = |s: &str| !s.is_empty() && !s.chars().any(|c| c.is_whitespace() || c == '@');
    if !part_ok(local) || !part_ok(domain) {
        return false;
    }
    domain
        .match_indices('.')
        .any(|(i, _)| i > 0 && i + 1 < domain.len())
}

pub fn validate_phone(phone: &str) -> Option<String> {
    if phone.trim().is_empty() {
        return Some("Phone number is required".to_string());
    }
    let digits = phone_digits(phone).len();
    if digits < PHONE_MIN_DIGITS {
        return Some(format!(
            "Phone number must be at least {PHONE_MIN_DIGITS} digits"
        ));
    }
    if digits > PHONE_MAX_DIGITS {
        return Some("Phone number is too long".to_string());
    }
    None
}

pub fn validate_service(service: &str) -> Option<String> {
    if service.trim().is_empty() {
        return Some("Please select a service".to_string());
    }
    None
}

pub fn parse_date(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok()
}

/// `now` is salon-local wall-clock time.
pub fn validate_date(date: &str, schedule: &Schedule, now: NaiveDateTime) -> Option<String> {
    if date.trim().is_empty() {
        return Some("Please select a date".to_string());
    }
    let Some(date) = parse_date(date) else {
        return Some("Please enter a valid date".to_string());
    };
    let today = now.date();
    if date < today {
        return Some("Cannot book appointments in the past".to_string());
    }
    if date > schedule.last_bookable_day(today) {
        return Some(format!(
            "Cannot book more than {} days in advance",
            schedule.horizon_days
        ));
    }
    if date.weekday() == schedule.closed_day {
        return Some(format!("We are closed on {}", schedule.closed_day_label()));
    }
    None
}

pub fn validate_time(
    time: &str,
    date: &str,
    schedule: &Schedule,
    now: NaiveDateTime,
) -> Option<String> {
    if date.trim().is_empty() {
        return Some("Please select a date before selecting a time".to_string());
    }
    let time = time.trim();
    if time.is_empty() {
        return Some("Please select a time".to_string());
    }
    let Some(start) = schedule.slot_start(time) else {
        return Some("Please select a valid time slot".to_string());
    };
    if let Some(date) = parse_date(date) {
        if date == now.date() && date.and_time(start) <= now {
            return Some("This time slot has passed".to_string());
        }
    }
    None
}

pub fn validate_notes(notes: &str) -> Option<String> {
    if notes.chars().count() > NOTES_MAX_LEN {
        return Some(format!("Notes cannot exceed {NOTES_MAX_LEN} characters"));
    }
    None
}

/// Runs every field check and, when all pass, returns the normalized booking.
pub fn validate_form(
    form: &BookingForm,
    schedule: &Schedule,
    now: NaiveDateTime,
) -> Result<NewBooking, ValidationErrors> {
    let mut errors = ValidationErrors::default();
    errors.check(Field::Name, validate_name(&form.name));
    errors.check(Field::Email, validate_email(&form.email));
    errors.check(Field::Phone, validate_phone(&form.phone));
    errors.check(Field::Service, validate_service(&form.service));
    errors.check(Field::Date, validate_date(&form.date, schedule, now));
    errors.check(Field::Time, validate_time(&form.time, &form.date, schedule, now));
    errors.check(Field::Notes, validate_notes(&form.notes));

    if !errors.is_empty() {
        return Err(errors);
    }
    let Some(date) = parse_date(&form.date) else {
        return Err(ValidationErrors::single(
            Field::Date,
            "Please enter a valid date",
        ));
    };

    let notes = form.notes.trim();
    Ok(NewBooking {
        name: form.name.trim().to_string(),
        email: form.email.trim().to_lowercase(),
        phone: form.phone.trim().to_string(),
        service: form.service.trim().to_string(),
        date,
        time: form.time.trim().to_string(),
        notes: (!notes.is_empty()).then(|| notes.to_string()),
    })
}
