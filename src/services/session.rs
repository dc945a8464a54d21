use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::clock::Clock;
use crate::config::AdminCredentials;
use crate::errors::AppError;

pub const SESSION_TTL_HOURS: i64 = 8;

/// Staff session data. The three fields are always written together and
/// cleared together; a session is either fully present or fully absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Session {
    pub is_admin: bool,
    pub admin_email: Option<String>,
    pub login_time: Option<DateTime<Utc>>,
}

impl Session {
    pub fn ttl() -> Duration {
        Duration::hours(SESSION_TTL_HOURS)
    }

    /// Exact match against the single configured identity. A mismatch leaves
    /// the session untouched and never says which half was wrong.
    pub fn login(
        &mut self,
        credentials: &AdminCredentials,
        email: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let configured = !credentials.email.is_empty() && !credentials.password.is_empty();
        if !configured || email != credentials.email || password != credentials.password {
            return Err(AppError::InvalidCredentials);
        }
        self.is_admin = true;
        self.admin_email = Some(email.to_string());
        self.login_time = Some(now);
        Ok(())
    }

    /// Valid while the admin flag is set and less than the TTL has passed
    /// since login. An invalid session is cleared.
    pub fn validate(&mut self, now: DateTime<Utc>) -> bool {
        let valid = match (self.is_admin, self.login_time) {
            (true, Some(login_time)) => now - login_time < Self::ttl(),
            _ => false,
        };
        if !valid {
            self.logout();
        }
        valid
    }

    pub fn logout(&mut self) {
        self.is_admin = false;
        self.admin_email = None;
        self.login_time = None;
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.login_time.map(|t| t + Self::ttl())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IssuedSession {
    pub token: String,
    #[serde(flatten)]
    pub session: Session,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Issues bearer tokens for staff sessions and checks them on every
/// staff request.
pub struct SessionGate {
    credentials: AdminCredentials,
    clock: Arc<dyn Clock>,
    sessions: Mutex<HashMap<String, Session>>,
}

impl SessionGate {
    pub fn new(credentials: AdminCredentials, clock: Arc<dyn Clock>) -> Self {
        Self {
            credentials,
            clock,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<String, Session>> {
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn login(&self, email: &str, password: &str) -> Result<IssuedSession, AppError> {
        let now = self.clock.now();
        let mut session = Session::default();
        if let Err(e) = session.login(&self.credentials, email, password, now) {
            tracing::warn!("admin login rejected");
            return Err(e);
        }

        let token = uuid::Uuid::new_v4().to_string();
        let mut sessions = self.sessions();
        sessions.retain(|_, s| s.validate(now));
        sessions.insert(token.clone(), session.clone());

        tracing::info!("admin logged in");
        Ok(IssuedSession {
            token,
            expires_at: session.expires_at(),
            session,
        })
    }

    /// Returns the session behind `token`, dropping it if it has expired.
    pub fn authorize(&self, token: &str) -> Result<Session, AppError> {
        let now = self.clock.now();
        let mut sessions = self.sessions();
        let Some(session) = sessions.get_mut(token) else {
            return Err(AppError::Unauthorized);
        };
        if !session.validate(now) {
            sessions.remove(token);
            tracing::info!("admin session expired");
            return Err(AppError::Unauthorized);
        }
        Ok(session.clone())
    }

    pub fn logout(&self, token: &str) {
        if let Some(mut session) = self.sessions().remove(token) {
            session.logout();
            tracing::info!("admin logged out");
        }
    }
}
