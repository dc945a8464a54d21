use std::sync::Arc;

use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use salonbook::clock::{Clock, SystemClock};
use salonbook::config::{AppConfig, StoreBackend};
use salonbook::handlers;
use salonbook::services::lifecycle::BookingLifecycle;
use salonbook::services::messaging::emailjs::EmailJsTransport;
use salonbook::services::messaging::log::LogTransport;
use salonbook::services::messaging::MailTransport;
use salonbook::services::notifications::Notifier;
use salonbook::services::session::SessionGate;
use salonbook::services::store::local::LocalStore;
use salonbook::services::store::remote::RemoteStore;
use salonbook::services::store::BookingStore;
use salonbook::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    if config.admin.email.is_empty() || config.admin.password.is_empty() {
        tracing::warn!("ADMIN_EMAIL/ADMIN_PASSWORD not set, staff login is disabled");
    }

    let store: Arc<dyn BookingStore> = match config.store_backend {
        StoreBackend::Remote => {
            anyhow::ensure!(
                !config.remote_store_url.is_empty() && !config.remote_store_key.is_empty(),
                "REMOTE_STORE_URL and REMOTE_STORE_KEY must be set when STORE_BACKEND=remote"
            );
            tracing::info!("using remote booking store ({})", config.remote_store_url);
            Arc::new(RemoteStore::new(
                config.remote_store_url.clone(),
                config.remote_store_key.clone(),
                clock.clone(),
            ))
        }
        StoreBackend::Local => {
            tracing::info!("using local booking store ({})", config.database_url);
            Arc::new(LocalStore::open(&config.database_url, clock.clone())?)
        }
    };

    let transport: Box<dyn MailTransport> = if config.emailjs.is_configured() {
        tracing::info!("sending mail through EmailJS");
        Box::new(EmailJsTransport::new(
            config.emailjs.service_id.clone(),
            config.emailjs.public_key.clone(),
            config.emailjs.customer_template.clone(),
            config.emailjs.staff_template.clone(),
        ))
    } else {
        tracing::warn!("EmailJS not configured, notifications will only be logged");
        Box::new(LogTransport)
    };

    let notifier = Notifier::new(
        transport,
        config.salon.clone(),
        config.staff_notification_email.clone(),
    );

    let state = Arc::new(AppState {
        bookings: BookingLifecycle::new(store, notifier, config.schedule.clone(), clock.clone()),
        sessions: SessionGate::new(config.admin.clone(), clock),
    });

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/bookings", post(handlers::bookings::create_booking))
        .route(
            "/api/bookings/lookup",
            get(handlers::bookings::lookup_bookings),
        )
        .route("/api/slots", get(handlers::bookings::available_slots))
        .route("/api/admin/login", post(handlers::admin::login))
        .route("/api/admin/logout", post(handlers::admin::logout))
        .route("/api/admin/session", get(handlers::admin::get_session))
        .route("/api/admin/stats", get(handlers::admin::get_stats))
        .route("/api/admin/bookings", get(handlers::admin::get_bookings))
        .route(
            "/api/admin/bookings/:id",
            delete(handlers::admin::delete_booking),
        )
        .route(
            "/api/admin/bookings/:id/confirm",
            post(handlers::admin::confirm_booking),
        )
        .route(
            "/api/admin/bookings/:id/cancel",
            post(handlers::admin::cancel_booking),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
