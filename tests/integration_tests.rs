use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::{delete, get, post};
use axum::Router;
use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;

use salonbook::clock::FixedClock;
use salonbook::config::{
    AdminCredentials, AppConfig, EmailJsConfig, SalonIdentity, StoreBackend,
};
use salonbook::handlers;
use salonbook::models::Schedule;
use salonbook::services::lifecycle::BookingLifecycle;
use salonbook::services::messaging::{MailTransport, OutboundMessage};
use salonbook::services::notifications::Notifier;
use salonbook::services::session::SessionGate;
use salonbook::services::store::local::LocalStore;
use salonbook::state::AppState;

// ── Mock Transport ──

struct MockMail {
    sent: Arc<Mutex<Vec<OutboundMessage>>>,
}

#[async_trait]
impl MailTransport for MockMail {
    async fn send(&self, message: &OutboundMessage) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

// ── Helpers ──

const ADMIN_EMAIL: &str = "owner@pebbles.example";
const ADMIN_PASSWORD: &str = "s3cret";

fn t0() -> DateTime<Utc> {
    // Monday, 13:30 salon time
    DateTime::parse_from_rfc3339("2025-06-16T13:30:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

fn test_config() -> AppConfig {
    AppConfig {
        port: 3000,
        database_url: ":memory:".to_string(),
        store_backend: StoreBackend::Local,
        remote_store_url: String::new(),
        remote_store_key: String::new(),
        admin: AdminCredentials {
            email: ADMIN_EMAIL.to_string(),
            password: ADMIN_PASSWORD.to_string(),
        },
        salon: SalonIdentity {
            salon_name: "Pebbles".to_string(),
            salon_phone: "+1 555 000 1111".to_string(),
            salon_email: "hello@pebbles.example".to_string(),
        },
        staff_notification_email: Some("staff@pebbles.example".to_string()),
        emailjs: EmailJsConfig::default(),
        schedule: Schedule::default(),
    }
}

struct TestApp {
    state: Arc<AppState>,
    clock: Arc<FixedClock>,
    sent: Arc<Mutex<Vec<OutboundMessage>>>,
}

fn test_state() -> TestApp {
    let config = test_config();
    let clock = Arc::new(FixedClock::new(t0()));
    let store = Arc::new(LocalStore::open(":memory:", clock.clone()).unwrap());
    let sent = Arc::new(Mutex::new(vec![]));
    let notifier = Notifier::new(
        Box::new(MockMail {
            sent: Arc::clone(&sent),
        }),
        config.salon.clone(),
        config.staff_notification_email.clone(),
    );
    let state = Arc::new(AppState {
        bookings: BookingLifecycle::new(store, notifier, config.schedule.clone(), clock.clone()),
        sessions: SessionGate::new(config.admin.clone(), clock.clone()),
    });
    TestApp { state, clock, sent }
}

fn test_app(state: Arc<AppState>) -> Router {
    Router::new()
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
        .with_state(state)
}

async fn call(state: &Arc<AppState>, request: Request<Body>) -> (StatusCode, Value) {
    let res = test_app(state.clone()).oneshot(request).await.unwrap();
    let status = res.status();
    let body = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn admin_request(method: &str, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

fn booking_form() -> Value {
    json!({
        "name": "Jane Doe",
        "email": "Jane@Example.com",
        "phone": "(555) 123-4567",
        "service": "Hair Treatment",
        "date": "2025-06-18",
        "time": "11:00",
        "notes": "First visit"
    })
}

async fn login(state: &Arc<AppState>) -> String {
    let (status, json) = call(
        state,
        json_request(
            "POST",
            "/api/admin/login",
            json!({"email": ADMIN_EMAIL, "password": ADMIN_PASSWORD}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    json["token"].as_str().unwrap().to_string()
}

async fn create_booking(state: &Arc<AppState>) -> String {
    let (status, json) = call(state, json_request("POST", "/api/bookings", booking_form())).await;
    assert_eq!(status, StatusCode::CREATED);
    json["booking"]["id"].as_str().unwrap().to_string()
}

// ── Public API Tests ──

#[tokio::test]
async fn test_health() {
    let t = test_state();
    let res = test_app(t.state)
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_create_booking_notifies_customer_and_staff() {
    let t = test_state();
    let (status, json) = call(&t.state, json_request("POST", "/api/bookings", booking_form())).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["booking"]["status"], "pending");
    assert_eq!(json["booking"]["email"], "jane@example.com");
    assert_eq!(json["booking"]["notes"], "First visit");
    assert_eq!(json["customer"]["state"], "sent");
    assert_eq!(json["staff"]["state"], "sent");
    assert_eq!(
        json["message"],
        "Booking submitted! Check your email for confirmation."
    );

    let sent = t.sent.lock().unwrap();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].params.to_email, "jane@example.com");
    assert_eq!(sent[1].params.to_email, "staff@pebbles.example");
}

#[tokio::test]
async fn test_invalid_booking_rejected_and_not_stored() {
    let t = test_state();
    let mut form = booking_form();
    form["name"] = json!("J");
    form["date"] = json!("2025-06-22");

    let (status, json) = call(&t.state, json_request("POST", "/api/bookings", form)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["first_invalid"], "name");
    let fields = json["fields"].as_array().unwrap();
    assert_eq!(fields.len(), 2);
    assert_eq!(fields[0]["message"], "Name must be at least 2 characters");
    assert_eq!(fields[1]["field"], "date");
    assert!(t.sent.lock().unwrap().is_empty());

    let token = login(&t.state).await;
    let (_, json) = call(&t.state, admin_request("GET", "/api/admin/bookings", &token)).await;
    assert_eq!(json.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_unknown_form_field_rejected() {
    let t = test_state();
    let mut form = booking_form();
    form["status"] = json!("confirmed");

    let res = test_app(t.state)
        .oneshot(json_request("POST", "/api/bookings", form))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_lookup_by_email_and_phone() {
    let t = test_state();
    let id = create_booking(&t.state).await;

    let (status, json) = call(
        &t.state,
        admin_request("GET", "/api/bookings/lookup?email=jane@example.com", ""),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json[0]["id"], id.as_str());

    let (status, json) = call(
        &t.state,
        admin_request("GET", "/api/bookings/lookup?phone=555-123-4567", ""),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 1);

    let (status, json) = call(
        &t.state,
        admin_request("GET", "/api/bookings/lookup?email=nobody@example.com", ""),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 0);

    let (status, _) = call(&t.state, admin_request("GET", "/api/bookings/lookup", "")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_available_slots() {
    let t = test_state();

    let (status, json) = call(&t.state, admin_request("GET", "/api/slots?date=2025-06-16", "")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["slots"][0], "14:00");

    assert_eq!(json["schedule"]["open_hour"], 9);
    assert_eq!(json["schedule"]["close_hour"], 19);
    assert_eq!(json["schedule"]["closed_day"], "sun");

    let (_, json) = call(&t.state, admin_request("GET", "/api/slots?date=2025-06-22", "")).await;
    assert_eq!(json["slots"].as_array().unwrap().len(), 0);
}

// ── Admin API Tests ──

#[tokio::test]
async fn test_admin_requires_auth() {
    let t = test_state();
    let res = test_app(t.state)
        .oneshot(
            Request::builder()
                .uri("/api/admin/bookings")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_wrong_token() {
    let t = test_state();
    let (status, json) = call(
        &t.state,
        admin_request("GET", "/api/admin/bookings", "wrong-token"),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "unauthorized");
}

#[tokio::test]
async fn test_login_rejects_bad_credentials() {
    let t = test_state();
    let (status, json) = call(
        &t.state,
        json_request(
            "POST",
            "/api/admin/login",
            json!({"email": ADMIN_EMAIL, "password": "nope"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "invalid email or password");
}

#[tokio::test]
async fn test_session_and_logout() {
    let t = test_state();
    let token = login(&t.state).await;

    let (status, json) = call(&t.state, admin_request("GET", "/api/admin/session", &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["is_admin"], true);
    assert_eq!(json["admin_email"], ADMIN_EMAIL);

    let (status, _) = call(&t.state, admin_request("POST", "/api/admin/logout", &token)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = call(&t.state, admin_request("GET", "/api/admin/session", &token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_session_expires_after_eight_hours() {
    let t = test_state();
    let token = login(&t.state).await;

    t.clock.advance(Duration::hours(7) + Duration::minutes(59));
    let (status, _) = call(&t.state, admin_request("GET", "/api/admin/bookings", &token)).await;
    assert_eq!(status, StatusCode::OK);

    t.clock.advance(Duration::minutes(2));
    let (status, _) = call(&t.state, admin_request("GET", "/api/admin/bookings", &token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_booking_lifecycle() {
    let t = test_state();
    let id = create_booking(&t.state).await;
    let token = login(&t.state).await;

    // List
    let (status, json) = call(&t.state, admin_request("GET", "/api/admin/bookings", &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json[0]["id"], id.as_str());
    assert_eq!(json[0]["status"], "pending");

    // Confirm
    let (status, json) = call(
        &t.state,
        admin_request("POST", &format!("/api/admin/bookings/{id}/confirm"), &token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["booking"]["status"], "confirmed");
    assert_eq!(
        json["message"],
        "Booking confirmed! Customer has been notified via email."
    );
    assert_eq!(t.sent.lock().unwrap().len(), 3);

    // Cancel needs an explicit go-ahead
    let (status, _) = call(
        &t.state,
        admin_request("POST", &format!("/api/admin/bookings/{id}/cancel"), &token),
    )
    .await;
    assert_eq!(status, StatusCode::PRECONDITION_REQUIRED);

    let (status, json) = call(
        &t.state,
        admin_request(
            "POST",
            &format!("/api/admin/bookings/{id}/cancel?confirm=true"),
            &token,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["booking"]["status"], "cancelled");

    // Cancelled is terminal
    let (status, _) = call(
        &t.state,
        admin_request("POST", &format!("/api/admin/bookings/{id}/confirm"), &token),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(t.sent.lock().unwrap().len(), 4);

    // Delete
    let (status, _) = call(
        &t.state,
        admin_request("DELETE", &format!("/api/admin/bookings/{id}"), &token),
    )
    .await;
    assert_eq!(status, StatusCode::PRECONDITION_REQUIRED);

    let (status, json) = call(
        &t.state,
        admin_request(
            "DELETE",
            &format!("/api/admin/bookings/{id}?confirm=true"),
            &token,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({"ok": true, "id": id.as_str()}));

    let (status, _) = call(
        &t.state,
        admin_request(
            "DELETE",
            &format!("/api/admin/bookings/{id}?confirm=true"),
            &token,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, json) = call(&t.state, admin_request("GET", "/api/admin/bookings", &token)).await;
    assert_eq!(json.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_confirm_unknown_booking() {
    let t = test_state();
    let token = login(&t.state).await;
    let (status, _) = call(
        &t.state,
        admin_request("POST", "/api/admin/bookings/missing/confirm", &token),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_login_email_must_match_exactly() {
    let t = test_state();
    let (status, _) = call(
        &t.state,
        json_request(
            "POST",
            "/api/admin/login",
            json!({"email": format!(" {ADMIN_EMAIL} "), "password": ADMIN_PASSWORD}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_stats() {
    let t = test_state();
    let token = login(&t.state).await;

    let (status, _) = call(&t.state, admin_request("GET", "/api/admin/stats", "wrong")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let first = create_booking(&t.state).await;
    let second = create_booking(&t.state).await;
    create_booking(&t.state).await;
    call(
        &t.state,
        admin_request("POST", &format!("/api/admin/bookings/{first}/confirm"), &token),
    )
    .await;
    call(
        &t.state,
        admin_request(
            "POST",
            &format!("/api/admin/bookings/{second}/cancel?confirm=true"),
            &token,
        ),
    )
    .await;

    let (status, json) = call(&t.state, admin_request("GET", "/api/admin/stats", &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json,
        json!({"total": 3, "pending": 1, "confirmed": 1, "cancelled": 1})
    );
}
