use std::env;

use chrono::{FixedOffset, Weekday};
use serde::Serialize;

use crate::models::Schedule;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    Local,
    Remote,
}

#[derive(Clone)]
pub struct AdminCredentials {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Contact block appended to every outbound message.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct SalonIdentity {
    pub salon_name: String,
    pub salon_phone: String,
    pub salon_email: String,
}

#[derive(Clone, Debug, Default)]
pub struct EmailJsConfig {
    pub service_id: String,
    pub public_key: String,
    pub customer_template: String,
    pub staff_template: String,
}

impl EmailJsConfig {
    pub fn is_configured(&self) -> bool {
        !self.service_id.is_empty() && !self.public_key.is_empty()
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub store_backend: StoreBackend,
    pub remote_store_url: String,
    pub remote_store_key: String,
    pub admin: AdminCredentials,
    pub salon: SalonIdentity,
    /// Where new-booking notices go; `None` disables them.
    pub staff_notification_email: Option<String>,
    pub emailjs: EmailJsConfig,
    pub schedule: Schedule,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Schedule::default();
        let (open_hour, close_hour) = opening_hours(
            parse_var("SALON_OPEN_HOUR"),
            parse_var("SALON_CLOSE_HOUR"),
            &defaults,
        );
        let schedule = Schedule {
            open_hour,
            close_hour,
            closed_day: parse_var::<Weekday>("SALON_CLOSED_DAY").unwrap_or(defaults.closed_day),
            horizon_days: defaults.horizon_days,
            utc_offset: parse_var::<FixedOffset>("SALON_UTC_OFFSET")
                .unwrap_or(defaults.utc_offset),
        };

        let store_backend = match env::var("STORE_BACKEND").as_deref() {
            Ok("remote") => StoreBackend::Remote,
            _ => StoreBackend::Local,
        };

        Self {
            port: parse_var("PORT").unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "salonbook.db".to_string()),
            store_backend,
            remote_store_url: env::var("REMOTE_STORE_URL").unwrap_or_default(),
            remote_store_key: env::var("REMOTE_STORE_KEY").unwrap_or_default(),
            admin: AdminCredentials {
                email: env::var("ADMIN_EMAIL").unwrap_or_default(),
                password: env::var("ADMIN_PASSWORD").unwrap_or_default(),
            },
            salon: SalonIdentity {
                salon_name: env::var("SALON_NAME")
                    .unwrap_or_else(|_| "The Pebbles Unisex Salon".to_string()),
                salon_phone: env::var("SALON_PHONE").unwrap_or_default(),
                salon_email: env::var("SALON_EMAIL").unwrap_or_default(),
            },
            staff_notification_email: env::var("STAFF_NOTIFICATION_EMAIL")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            emailjs: EmailJsConfig {
                service_id: env::var("EMAILJS_SERVICE_ID").unwrap_or_default(),
                public_key: env::var("EMAILJS_PUBLIC_KEY").unwrap_or_default(),
                customer_template: env::var("EMAILJS_TEMPLATE_CUSTOMER").unwrap_or_default(),
                staff_template: env::var("EMAILJS_TEMPLATE_ADMIN").unwrap_or_default(),
            },
            schedule,
        }
    }
}

/// Slots run from `open` up to the hour before `close`, all within one day.
fn opening_hours(open: Option<u32>, close: Option<u32>, defaults: &Schedule) -> (u32, u32) {
    let open = open.unwrap_or(defaults.open_hour);
    let close = close.unwrap_or(defaults.close_hour);
    if open < close && close <= 24 {
        return (open, close);
    }
    tracing::warn!(
        open_hour = open,
        close_hour = close,
        "ignoring invalid opening hours"
    );
    (defaults.open_hour, defaults.close_hour)
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(var = name, value = %raw, "ignoring unparseable setting");
            None
        }
    }
}
