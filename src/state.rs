use crate::services::lifecycle::BookingLifecycle;
use crate::services::session::SessionGate;

pub struct AppState {
    pub bookings: BookingLifecycle,
    pub sessions: SessionGate,
}
