//! Booking and review handlers against a mock database and a recording
//! payment gateway.
//!
//! Each test queues the rows the handler will read, in order, then checks the
//! response status, the gateway calls made and the SQL that ran.
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use actix_web::body::to_bytes;
use actix_web::http::StatusCode;
use actix_web::{ResponseError, web};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sea_orm::{
    DatabaseBackend, DatabaseConnection, DbErr, MockDatabase, MockExecResult, Value,
};
use serde_json::Value as Json;
use uuid::Uuid;

use uso_backend::auth::middleware::{AuthenticatedUser, CastUser, GuestUser};
use uso_backend::config::AppConfig;
use uso_backend::handlers::{bookings as booking_handlers, cast, reviews as review_handlers};
use uso_backend::models::bookings::{
    self, CreateBookingRequest, RespondRequest, ResponseAction, Status,
};
use uso_backend::models::cast_profiles::{self, ApprovalStatus, Rank};
use uso_backend::models::reviews::CreateReviewRequest;
use uso_backend::models::time_of_day;
use uso_backend::models::users::{self, Roles};
use uso_backend::services::email::{LogMailer, Notifier};
use uso_backend::services::payments::{
    AuthorizationRequest, PaymentError, PaymentGateway, PaymentIntent, Refund,
};

const INTENT: &str = "pi_test";

/// Gateway that records every call and never talks to the network.
#[derive(Default)]
struct RecordingGateway {
    calls: Mutex<Vec<String>>,
    decline_cards: bool,
}

impl RecordingGateway {
    fn declining() -> Self {
        Self {
            decline_cards: true,
            ..Default::default()
        }
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

fn intent(status: &str) -> PaymentIntent {
    PaymentIntent {
        id: INTENT.into(),
        client_secret: Some(format!("{INTENT}_secret")),
        status: status.into(),
    }
}

#[async_trait]
impl PaymentGateway for RecordingGateway {
    async fn authorize(&self, _request: AuthorizationRequest) -> Result<PaymentIntent, PaymentError> {
        self.record("authorize".into());
        if self.decline_cards {
            return Err(PaymentError::Api {
                status: 402,
                message: "card_declined".into(),
            });
        }
        Ok(intent("requires_capture"))
    }

    async fn capture(&self, intent_id: &str, _booking_id: Uuid) -> Result<PaymentIntent, PaymentError> {
        self.record(format!("capture {intent_id}"));
        Ok(intent("succeeded"))
    }

    async fn cancel(&self, intent_id: &str, _booking_id: Uuid) -> Result<PaymentIntent, PaymentError> {
        self.record(format!("cancel {intent_id}"));
        Ok(intent("canceled"))
    }

    async fn refund(&self, intent_id: &str, _booking_id: Uuid) -> Result<Refund, PaymentError> {
        self.record(format!("refund {intent_id}"));
        Ok(Refund {
            id: "re_test".into(),
            status: "succeeded".into(),
        })
    }
}

fn config() -> web::Data<AppConfig> {
    let config = AppConfig::from_lookup(|key| {
        match key {
            "DATABASE_URL" => Some("postgres://localhost/uso_test"),
            "JWT_SECRET" => Some("booking-flow-secret"),
            "ADMIN_PASSWORD" => Some("admin-secret"),
            "STRIPE_SECRET_KEY" => Some("sk_test_flow"),
            _ => None,
        }
        .map(str::to_string)
    })
    .expect("test config is complete");
    web::Data::new(config)
}

fn notifier() -> web::Data<Notifier> {
    web::Data::new(Notifier::new(Arc::new(LogMailer), "http://localhost:3000"))
}

fn payments(gateway: &Arc<RecordingGateway>) -> web::Data<dyn PaymentGateway> {
    let gateway: Arc<dyn PaymentGateway> = gateway.clone();
    web::Data::from(gateway)
}

fn user(id: Uuid, role: Roles) -> AuthenticatedUser {
    AuthenticatedUser {
        id,
        email: format!("{id}@example.com"),
        role,
    }
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2030, 3, 10).unwrap()
}

fn profile(user_id: Uuid, approval_status: ApprovalStatus) -> cast_profiles::Model {
    let now = Utc::now();
    cast_profiles::Model {
        id: Uuid::new_v4(),
        user_id,
        bio: None,
        hourly_rate: 100.0,
        rank: Rank::Premium,
        service_areas: vec!["Shibuya".into()],
        approval_status,
        approved_at: None,
        created_at: now,
        updated_at: now,
    }
}

fn booking(guest_id: Uuid, cast_id: Uuid, status: Status, start: &str, hours: i32) -> bookings::Model {
    let now = Utc::now();
    bookings::Model {
        id: Uuid::new_v4(),
        guest_id,
        cast_id,
        booking_date: date(),
        start_time: time_of_day::parse(start).unwrap(),
        duration_hours: hours,
        location: "Shibuya".into(),
        amount: 100.0 * hours as f64,
        status,
        payment_intent_id: Some(INTENT.into()),
        accepted_at: None,
        declined_at: None,
        completed_at: None,
        cancelled_at: None,
        created_at: now,
        updated_at: now,
    }
}

fn request(cast_id: Uuid, start: &str, hours: i32) -> web::Json<CreateBookingRequest> {
    web::Json(CreateBookingRequest {
        cast_id,
        booking_date: date(),
        start_time: time_of_day::parse(start).unwrap(),
        duration_hours: hours,
        location: "Shibuya".into(),
    })
}

fn count_row(n: i64) -> BTreeMap<&'static str, Value> {
    BTreeMap::from([("num_items", Value::BigInt(Some(n)))])
}

fn no_users() -> Vec<users::Model> {
    Vec::new()
}

fn updated(rows: u64) -> MockExecResult {
    MockExecResult {
        last_insert_id: 0,
        rows_affected: rows,
    }
}

/// Every statement the connection ran, with parameters inlined.
fn statements(db: DatabaseConnection) -> Vec<String> {
    db.into_transaction_log()
        .iter()
        .flat_map(|txn| txn.statements().iter().map(|s| s.to_string()).collect::<Vec<_>>())
        .collect()
}

fn ran(statements: &[String], fragment: &str) -> bool {
    statements.iter().any(|s| s.contains(fragment))
}

async fn json_body(resp: actix_web::HttpResponse) -> Json {
    let bytes = to_bytes(resp.into_body()).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// ── create ──

#[actix_web::test]
async fn unapproved_cast_is_rejected_before_payment() {
    let (guest_id, cast_id) = (Uuid::new_v4(), Uuid::new_v4());
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[profile(cast_id, ApprovalStatus::Pending)]])
        .into_connection();
    let gateway = Arc::new(RecordingGateway::default());

    let err = booking_handlers::create_booking(
        GuestUser(user(guest_id, Roles::Guest)),
        web::Data::new(db.clone()),
        config(),
        payments(&gateway),
        notifier(),
        request(cast_id, "10:00", 2),
    )
    .await
    .unwrap_err();

    assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    assert!(gateway.calls().is_empty());

    let sql = statements(db);
    assert!(ran(&sql, "FOR UPDATE"), "{sql:?}");
    assert!(!ran(&sql, "INSERT INTO \"bookings\""), "{sql:?}");
}

#[actix_web::test]
async fn declined_card_creates_no_booking() {
    let (guest_id, cast_id) = (Uuid::new_v4(), Uuid::new_v4());
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[profile(cast_id, ApprovalStatus::Approved)]])
        .append_query_results([Vec::<bookings::Model>::new()])
        .append_query_results([[count_row(0)]])
        .into_connection();
    let gateway = Arc::new(RecordingGateway::declining());

    let err = booking_handlers::create_booking(
        GuestUser(user(guest_id, Roles::Guest)),
        web::Data::new(db.clone()),
        config(),
        payments(&gateway),
        notifier(),
        request(cast_id, "10:00", 2),
    )
    .await
    .unwrap_err();

    assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(gateway.calls(), vec!["authorize"]);
    assert!(!ran(&statements(db), "INSERT INTO \"bookings\""));
}

#[actix_web::test]
async fn failed_insert_releases_the_hold() {
    let (guest_id, cast_id) = (Uuid::new_v4(), Uuid::new_v4());
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[profile(cast_id, ApprovalStatus::Approved)]])
        .append_query_results([Vec::<bookings::Model>::new()])
        .append_query_results([[count_row(0)]])
        .append_query_errors([DbErr::Custom("connection reset".into())])
        .into_connection();
    let gateway = Arc::new(RecordingGateway::default());

    let err = booking_handlers::create_booking(
        GuestUser(user(guest_id, Roles::Guest)),
        web::Data::new(db.clone()),
        config(),
        payments(&gateway),
        notifier(),
        request(cast_id, "10:00", 2),
    )
    .await
    .unwrap_err();

    assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(gateway.calls(), vec!["authorize".to_string(), format!("cancel {INTENT}")]);

    let sql = statements(db);
    assert!(ran(&sql, "INSERT INTO \"bookings\""), "{sql:?}");
    assert!(ran(&sql, "ROLLBACK"), "{sql:?}");
}

#[actix_web::test]
async fn overlapping_request_conflicts() {
    let (guest_id, cast_id) = (Uuid::new_v4(), Uuid::new_v4());
    // Accepted 10:00-12:00; the new request starts at 11:00.
    let existing = booking(Uuid::new_v4(), cast_id, Status::Accepted, "10:00", 2);
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[profile(cast_id, ApprovalStatus::Approved)]])
        .append_query_results([[existing]])
        .into_connection();
    let gateway = Arc::new(RecordingGateway::default());

    let err = booking_handlers::create_booking(
        GuestUser(user(guest_id, Roles::Guest)),
        web::Data::new(db.clone()),
        config(),
        payments(&gateway),
        notifier(),
        request(cast_id, "11:00", 1),
    )
    .await
    .unwrap_err();

    assert_eq!(err.status_code(), StatusCode::CONFLICT);
    assert!(gateway.calls().is_empty());
    assert!(!ran(&statements(db), "INSERT INTO \"bookings\""));
}

#[actix_web::test]
async fn back_to_back_request_is_created() {
    let (guest_id, cast_id) = (Uuid::new_v4(), Uuid::new_v4());
    let existing = booking(Uuid::new_v4(), cast_id, Status::Accepted, "10:00", 2);
    let created = booking(guest_id, cast_id, Status::Pending, "12:00", 3);
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[profile(cast_id, ApprovalStatus::Approved)]])
        .append_query_results([[existing]])
        .append_query_results([[count_row(0)]])
        .append_query_results([[created]])
        .append_query_results([no_users()])
        .into_connection();
    let gateway = Arc::new(RecordingGateway::default());

    let resp = booking_handlers::create_booking(
        GuestUser(user(guest_id, Roles::Guest)),
        web::Data::new(db.clone()),
        config(),
        payments(&gateway),
        notifier(),
        request(cast_id, "12:00", 3),
    )
    .await
    .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(gateway.calls(), vec!["authorize"]);

    let body = json_body(resp).await;
    assert_eq!(body["amount"], 300.0);
    assert_eq!(body["status"], "pending");
    assert_eq!(body["payment_intent"], INTENT);

    let sql = statements(db);
    assert!(ran(&sql, "INSERT INTO \"bookings\""), "{sql:?}");
    assert!(ran(&sql, "COMMIT"), "{sql:?}");
}

#[actix_web::test]
async fn only_active_bookings_hold_a_slot() {
    // A cancelled 10:00 booking is filtered out by the query, so 10:00 is free.
    let (guest_id, cast_id) = (Uuid::new_v4(), Uuid::new_v4());
    let created = booking(guest_id, cast_id, Status::Pending, "10:00", 2);
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[profile(cast_id, ApprovalStatus::Approved)]])
        .append_query_results([Vec::<bookings::Model>::new()])
        .append_query_results([[count_row(0)]])
        .append_query_results([[created]])
        .append_query_results([no_users()])
        .into_connection();
    let gateway = Arc::new(RecordingGateway::default());

    let resp = booking_handlers::create_booking(
        GuestUser(user(guest_id, Roles::Guest)),
        web::Data::new(db.clone()),
        config(),
        payments(&gateway),
        notifier(),
        request(cast_id, "10:00", 2),
    )
    .await
    .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let sql = statements(db);
    assert!(ran(&sql, "IN ('pending', 'accepted')"), "{sql:?}");
}

#[actix_web::test]
async fn blocked_guest_is_forbidden() {
    let (guest_id, cast_id) = (Uuid::new_v4(), Uuid::new_v4());
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[profile(cast_id, ApprovalStatus::Approved)]])
        .append_query_results([Vec::<bookings::Model>::new()])
        .append_query_results([[count_row(1)]])
        .into_connection();
    let gateway = Arc::new(RecordingGateway::default());

    let err = booking_handlers::create_booking(
        GuestUser(user(guest_id, Roles::Guest)),
        web::Data::new(db),
        config(),
        payments(&gateway),
        notifier(),
        request(cast_id, "10:00", 2),
    )
    .await
    .unwrap_err();

    assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    assert!(gateway.calls().is_empty());
}

// ── cancel ──

#[actix_web::test]
async fn cancel_releases_hold_after_status_change() {
    let (guest_id, cast_id) = (Uuid::new_v4(), Uuid::new_v4());
    let pending = booking(guest_id, cast_id, Status::Pending, "10:00", 2);
    let cancelled = bookings::Model {
        status: Status::Cancelled,
        cancelled_at: Some(Utc::now()),
        ..pending.clone()
    };
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[pending.clone()]])
        .append_exec_results([updated(1)])
        .append_query_results([[cancelled]])
        .append_query_results([no_users()])
        .into_connection();
    let gateway = Arc::new(RecordingGateway::default());

    let resp = booking_handlers::cancel_booking(
        GuestUser(user(guest_id, Roles::Guest)),
        web::Data::new(db.clone()),
        payments(&gateway),
        notifier(),
        web::Path::from(pending.id),
    )
    .await
    .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(gateway.calls(), vec![format!("cancel {INTENT}")]);
    assert_eq!(json_body(resp).await["status"], "cancelled");

    let sql = statements(db);
    assert!(ran(&sql, "UPDATE \"bookings\""), "{sql:?}");
    assert!(ran(&sql, "'cancelled'"), "{sql:?}");
}

#[actix_web::test]
async fn cancel_that_loses_to_accept_keeps_the_payment() {
    let (guest_id, cast_id) = (Uuid::new_v4(), Uuid::new_v4());
    let pending = booking(guest_id, cast_id, Status::Pending, "10:00", 2);
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[pending.clone()]])
        .append_exec_results([updated(0)])
        .into_connection();
    let gateway = Arc::new(RecordingGateway::default());

    let err = booking_handlers::cancel_booking(
        GuestUser(user(guest_id, Roles::Guest)),
        web::Data::new(db),
        payments(&gateway),
        notifier(),
        web::Path::from(pending.id),
    )
    .await
    .unwrap_err();

    assert_eq!(err.status_code(), StatusCode::CONFLICT);
    assert!(gateway.calls().is_empty());
}

// ── respond ──

#[actix_web::test]
async fn accept_that_loses_to_cancel_refunds_the_capture() {
    let (guest_id, cast_id) = (Uuid::new_v4(), Uuid::new_v4());
    let pending = booking(guest_id, cast_id, Status::Pending, "10:00", 2);
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[pending.clone()]])
        .append_exec_results([updated(0)])
        .into_connection();
    let gateway = Arc::new(RecordingGateway::default());

    let err = cast::respond_to_booking(
        CastUser(user(cast_id, Roles::Cast)),
        web::Data::new(db),
        payments(&gateway),
        notifier(),
        web::Path::from(pending.id),
        web::Json(RespondRequest {
            action: ResponseAction::Accept,
        }),
    )
    .await
    .unwrap_err();

    assert_eq!(err.status_code(), StatusCode::CONFLICT);
    assert_eq!(
        gateway.calls(),
        vec![format!("capture {INTENT}"), format!("refund {INTENT}")]
    );
}

#[actix_web::test]
async fn accept_captures_then_records_the_response() {
    let (guest_id, cast_id) = (Uuid::new_v4(), Uuid::new_v4());
    let pending = booking(guest_id, cast_id, Status::Pending, "10:00", 2);
    let accepted = bookings::Model {
        status: Status::Accepted,
        accepted_at: Some(Utc::now()),
        ..pending.clone()
    };
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[pending.clone()]])
        .append_exec_results([updated(1)])
        .append_query_results([[accepted]])
        .append_query_results([no_users()])
        .into_connection();
    let gateway = Arc::new(RecordingGateway::default());

    let resp = cast::respond_to_booking(
        CastUser(user(cast_id, Roles::Cast)),
        web::Data::new(db),
        payments(&gateway),
        notifier(),
        web::Path::from(pending.id),
        web::Json(RespondRequest {
            action: ResponseAction::Accept,
        }),
    )
    .await
    .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(gateway.calls(), vec![format!("capture {INTENT}")]);
    assert_eq!(json_body(resp).await["status"], "accepted");
}

#[actix_web::test]
async fn decline_releases_the_hold() {
    let (guest_id, cast_id) = (Uuid::new_v4(), Uuid::new_v4());
    let pending = booking(guest_id, cast_id, Status::Pending, "10:00", 2);
    let declined = bookings::Model {
        status: Status::Declined,
        declined_at: Some(Utc::now()),
        ..pending.clone()
    };
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[pending.clone()]])
        .append_exec_results([updated(1)])
        .append_query_results([[declined]])
        .append_query_results([no_users()])
        .into_connection();
    let gateway = Arc::new(RecordingGateway::default());

    let resp = cast::respond_to_booking(
        CastUser(user(cast_id, Roles::Cast)),
        web::Data::new(db),
        payments(&gateway),
        notifier(),
        web::Path::from(pending.id),
        web::Json(RespondRequest {
            action: ResponseAction::Decline,
        }),
    )
    .await
    .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(gateway.calls(), vec![format!("cancel {INTENT}")]);
}

// ── reviews ──

#[actix_web::test]
async fn second_review_of_a_booking_conflicts() {
    let (guest_id, cast_id) = (Uuid::new_v4(), Uuid::new_v4());
    let completed = booking(guest_id, cast_id, Status::Completed, "10:00", 2);
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[completed.clone()]])
        .append_query_results([[count_row(1)]])
        .into_connection();

    let err = review_handlers::create_review(
        user(guest_id, Roles::Guest),
        web::Data::new(db.clone()),
        web::Json(CreateReviewRequest {
            booking_id: completed.id,
            rating: 5,
            comment: Some("Lovely evening".into()),
        }),
    )
    .await
    .unwrap_err();

    assert_eq!(err.status_code(), StatusCode::CONFLICT);
    assert!(!ran(&statements(db), "INSERT INTO \"reviews\""));
}
