use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chairbook_server::config::Config;
use chairbook_server::domain::AppointmentStatus;
use chairbook_server::scheduling::SchedulingPolicy;
use chairbook_server::App;
use chrono::{Datelike, Duration as ChronoDuration, Local, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use testcontainers::{runners::AsyncRunner, ContainerAsync};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;
use tower::ServiceExt;

static TEST_CONTAINER: OnceCell<Arc<ContainerAsync<Postgres>>> = OnceCell::const_new();

async fn get_database_url() -> String {
    let container = TEST_CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default()
                .start()
                .await
                .expect("Failed to start postgres container");
            Arc::new(container)
        })
        .await;

    let host = container.get_host().await.expect("Failed to get host");
    let port = container
        .get_host_port_ipv4(5432)
        .await
        .expect("Failed to get port");
    format!("postgres://postgres:postgres@{}:{}/postgres", host, port)
}

async fn setup() -> Router {
    setup_with(SchedulingPolicy::default()).await
}

// Tests share one database and never truncate; each one works on freshly
// created providers so their calendars cannot collide.
async fn setup_with(scheduling: SchedulingPolicy) -> Router {
    let config = Config {
        database_url: get_database_url().await,
        bind_address: "0.0.0.0:8080".to_string(),
        db_max_connections: 10,
        db_acquire_timeout: Duration::from_secs(10),
        db_lock_timeout: Duration::from_secs(10),
        otlp_endpoint: None,
        scheduling,
    };

    let app = App::new(config).await.expect("Failed to create app");
    app.router()
}

async fn send(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    send_with_key(router, method, uri, body, None).await
}

async fn send_with_key(
    router: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
    idempotency_key: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(key) = idempotency_key {
        builder = builder.header("idempotency-key", key);
    }
    let body = match body {
        Some(value) => Body::from(value.to_string()),
        None => Body::empty(),
    };

    let res = router
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

fn days_from_today(days: i64) -> NaiveDate {
    Local::now().date_naive() + ChronoDuration::days(days)
}

fn weekday(date: NaiveDate) -> u32 {
    date.weekday().num_days_from_sunday()
}

async fn create_provider(router: &Router) -> String {
    let (status, json) = send(router, "POST", "/v1/providers", Some(json!({ "name": "Studio" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    json["id"].as_str().unwrap().to_string()
}

async fn create_client(router: &Router, name: &str) -> String {
    let (status, json) = send(router, "POST", "/v1/clients", Some(json!({ "name": name }))).await;
    assert_eq!(status, StatusCode::CREATED);
    json["id"].as_str().unwrap().to_string()
}

async fn create_service(router: &Router, provider_id: &str, minutes: u32, price: &str) -> String {
    let (status, json) = send(
        router,
        "POST",
        &format!("/v1/providers/{}/services", provider_id),
        Some(json!({ "name": format!("{} min", minutes), "duration_minutes": minutes, "price": price })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    json["id"].as_str().unwrap().to_string()
}

async fn set_hours(router: &Router, provider_id: &str, date: NaiveDate, start: &str, end: &str, intervals: Value) {
    let (status, _) = send(
        router,
        "PUT",
        &format!("/v1/providers/{}/working-hours/{}", provider_id, weekday(date)),
        Some(json!({ "active": true, "start_time": start, "end_time": end, "intervals": intervals })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

async fn open_day(router: &Router, provider_id: &str, date: NaiveDate) {
    set_hours(router, provider_id, date, "08:00", "18:00", json!([{ "start": "08:00", "end": "18:00" }])).await;
}

async fn slots(router: &Router, provider_id: &str, date: NaiveDate, duration: u32) -> Vec<String> {
    let (status, json) = send(
        router,
        "GET",
        &format!("/v1/providers/{}/availability?date={}&duration={}", provider_id, date, duration),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    json["slots"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s.as_str().unwrap().to_string())
        .collect()
}

fn provider_booking(provider_id: &str, date: NaiveDate, start: &str, services: &[&str]) -> Value {
    json!({
        "actor": { "role": "provider", "id": provider_id },
        "provider_id": provider_id,
        "client": { "kind": "guest", "name": "Walk-in" },
        "date": date,
        "start_time": start,
        "service_ids": services
    })
}

fn client_booking(provider_id: &str, client_id: &str, date: NaiveDate, start: &str, services: &[&str]) -> Value {
    json!({
        "actor": { "role": "client", "id": client_id },
        "provider_id": provider_id,
        "client": { "kind": "registered", "id": client_id },
        "date": date,
        "start_time": start,
        "service_ids": services
    })
}

async fn book(router: &Router, body: Value) -> (StatusCode, Value) {
    send(router, "POST", "/v1/appointments", Some(body)).await
}

fn half_hours(from: &str, count: usize) -> Vec<String> {
    let (h, m) = from.split_once(':').unwrap();
    let start: u32 = h.parse::<u32>().unwrap() * 60 + m.parse::<u32>().unwrap();
    (0..count as u32)
        .map(|i| {
            let t = start + i * 30;
            format!("{:02}:{:02}", t / 60, t % 60)
        })
        .collect()
}

// =============================================================================
// AVAILABILITY TESTS
// =============================================================================

#[tokio::test]
async fn test_open_morning_offers_eight_slots() {
    let router = setup().await;
    let provider = create_provider(&router).await;
    let date = days_from_today(7);
    set_hours(&router, &provider, date, "08:00", "12:00", json!([{ "start": "08:00", "end": "12:00" }])).await;

    assert_eq!(slots(&router, &provider, date, 30).await, half_hours("08:00", 8));
}

#[tokio::test]
async fn test_booked_hour_removes_overlapping_slots() {
    let router = setup().await;
    let provider = create_provider(&router).await;
    let hour = create_service(&router, &provider, 60, "40.00").await;
    let date = days_from_today(7);
    set_hours(&router, &provider, date, "08:00", "12:00", json!([{ "start": "08:00", "end": "12:00" }])).await;

    let (status, _) = book(&router, provider_booking(&provider, date, "09:00", &[&hour])).await;
    assert_eq!(status, StatusCode::CREATED);

    assert_eq!(
        slots(&router, &provider, date, 30).await,
        ["08:00", "08:30", "10:00", "10:30", "11:00", "11:30"]
    );
}

#[tokio::test]
async fn test_blocked_date_has_no_slots() {
    let router = setup().await;
    let provider = create_provider(&router).await;
    let date = days_from_today(8);
    set_hours(&router, &provider, date, "08:00", "12:00", json!([{ "start": "08:00", "end": "12:00" }])).await;

    let (status, _) = send(
        &router,
        "POST",
        &format!("/v1/providers/{}/blocked-days", provider),
        Some(json!({ "date": date, "reason": "holiday" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(slots(&router, &provider, date, 30).await.is_empty());

    let (status, _) = send(
        &router,
        "DELETE",
        &format!("/v1/providers/{}/blocked-days/{}", provider, date),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(slots(&router, &provider, date, 30).await.len(), 8);
}

#[tokio::test]
async fn test_inactive_weekday_has_no_slots() {
    let router = setup().await;
    let provider = create_provider(&router).await;
    let date = days_from_today(9);

    let (status, _) = send(
        &router,
        "PUT",
        &format!("/v1/providers/{}/working-hours/{}", provider, weekday(date)),
        Some(json!({
            "active": false,
            "start_time": "08:00",
            "end_time": "12:00",
            "intervals": [{ "start": "08:00", "end": "12:00" }]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    assert!(slots(&router, &provider, date, 30).await.is_empty());
    assert!(slots(&router, &provider, date + ChronoDuration::days(7), 30).await.is_empty());
}

#[tokio::test]
async fn test_duration_wider_than_interval_has_no_slots() {
    let router = setup().await;
    let provider = create_provider(&router).await;
    let date = days_from_today(7);
    set_hours(&router, &provider, date, "08:00", "09:00", json!([{ "start": "08:00", "end": "09:00" }])).await;

    assert!(slots(&router, &provider, date, 90).await.is_empty());
}

#[tokio::test]
async fn test_out_of_range_duration_is_rejected() {
    let router = setup().await;
    let provider = create_provider(&router).await;
    let date = days_from_today(7);
    set_hours(&router, &provider, date, "08:00", "12:00", json!([{ "start": "08:00", "end": "12:00" }])).await;

    for duration in ["4294967295", "1441", "0"] {
        let (status, json) = send(
            &router,
            "GET",
            &format!("/v1/providers/{}/availability?date={}&duration={}", provider, date, duration),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "duration {duration}");
        assert_eq!(json["error"]["code"], "validation_error");
    }

    assert!(slots(&router, &provider, date, 1440).await.is_empty());
}

#[tokio::test]
async fn test_unconfigured_provider_and_past_dates_are_empty() {
    let router = setup().await;
    let provider = create_provider(&router).await;

    assert!(slots(&router, &provider, days_from_today(3), 30).await.is_empty());

    let yesterday = days_from_today(-1);
    set_hours(&router, &provider, yesterday, "08:00", "12:00", json!([{ "start": "08:00", "end": "12:00" }])).await;
    assert!(slots(&router, &provider, yesterday, 30).await.is_empty());
}

#[tokio::test]
async fn test_availability_from_service_durations() {
    let router = setup().await;
    let provider = create_provider(&router).await;
    let cut = create_service(&router, &provider, 30, "25.00").await;
    let wash = create_service(&router, &provider, 30, "10.00").await;
    let date = days_from_today(7);
    set_hours(
        &router,
        &provider,
        date,
        "08:00",
        "12:00",
        json!([{ "start": "08:00", "end": "10:00" }, { "start": "11:00", "end": "12:00" }]),
    )
    .await;

    let (status, json) = send(
        &router,
        "GET",
        &format!("/v1/providers/{}/availability?date={}&service_ids={},{}", provider, date, cut, wash),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["duration_minutes"], 60);
    assert_eq!(json["slots"], json!(["08:00", "08:30", "09:00", "11:00"]));
}

#[tokio::test]
async fn test_availability_requires_a_duration() {
    let router = setup().await;
    let provider = create_provider(&router).await;

    let (status, json) = send(
        &router,
        "GET",
        &format!("/v1/providers/{}/availability?date={}", provider, days_from_today(2)),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "validation_error");
}

// =============================================================================
// BOOKING TESTS
// =============================================================================

#[tokio::test]
async fn test_client_booking_sums_services() {
    let router = setup().await;
    let provider = create_provider(&router).await;
    let client = create_client(&router, "Ana").await;
    let cut = create_service(&router, &provider, 45, "30.00").await;
    let beard = create_service(&router, &provider, 15, "12.50").await;
    let date = days_from_today(5);
    open_day(&router, &provider, date).await;

    let (status, json) = book(&router, client_booking(&provider, &client, date, "14:00", &[&cut, &beard])).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["status"], "confirmed");
    assert_eq!(json["start_time"], "14:00");
    assert_eq!(json["end_time"], "15:00");
    assert_eq!(json["duration_minutes"], 60);
    assert_eq!(json["total_value"], "42.50");
    assert_eq!(json["client"], json!({ "kind": "registered", "id": client }));
    assert_eq!(json["service_ids"], json!([cut, beard]));
}

#[tokio::test]
async fn test_guest_booking_by_provider() {
    let router = setup().await;
    let provider = create_provider(&router).await;
    let service = create_service(&router, &provider, 30, "20.00").await;
    let date = days_from_today(5);

    let (status, json) = book(&router, provider_booking(&provider, date, "10:00", &[&service])).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["client"], json!({ "kind": "guest", "name": "Walk-in" }));

    let mut body = provider_booking(&provider, date, "11:00", &[&service]);
    body["client"]["name"] = json!("  ");
    let (status, _) = book(&router, body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_clients_cannot_book_guests_or_others() {
    let router = setup().await;
    let provider = create_provider(&router).await;
    let client = create_client(&router, "Ana").await;
    let other = create_client(&router, "Bruno").await;
    let service = create_service(&router, &provider, 30, "20.00").await;
    let date = days_from_today(5);

    let mut guest = provider_booking(&provider, date, "10:00", &[&service]);
    guest["actor"] = json!({ "role": "client", "id": client });
    let (status, json) = book(&router, guest).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["error"]["code"], "forbidden");

    let mut for_other = client_booking(&provider, &other, date, "10:00", &[&service]);
    for_other["actor"] = json!({ "role": "client", "id": client });
    let (status, _) = book(&router, for_other).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_client_bookings_must_fall_inside_working_hours() {
    let router = setup().await;
    let provider = create_provider(&router).await;
    let client = create_client(&router, "Ana").await;
    let service = create_service(&router, &provider, 30, "20.00").await;
    let date = days_from_today(5);
    set_hours(&router, &provider, date, "08:00", "12:00", json!([{ "start": "08:00", "end": "12:00" }])).await;

    let (status, json) = book(&router, client_booking(&provider, &client, date, "03:00", &[&service])).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"]["code"], "slot_unavailable");

    let (status, _) = book(&router, client_booking(&provider, &client, date, "11:45", &[&service])).await;
    assert_eq!(status, StatusCode::CONFLICT);

    // No hours published for that weekday.
    let closed = date + ChronoDuration::days(1);
    let (status, _) = book(&router, client_booking(&provider, &client, closed, "09:00", &[&service])).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &router,
        "POST",
        &format!("/v1/providers/{}/blocked-days", provider),
        Some(json!({ "date": date, "reason": "holiday" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, json) = book(&router, client_booking(&provider, &client, date, "09:00", &[&service])).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(json["error"]["message"].as_str().unwrap().contains("blocked"));

    // The provider can still squeeze in a walk-in.
    let (status, _) = book(&router, provider_booking(&provider, date, "03:00", &[&service])).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_overlapping_booking_is_rejected() {
    let router = setup().await;
    let provider = create_provider(&router).await;
    let hour = create_service(&router, &provider, 60, "40.00").await;
    let half = create_service(&router, &provider, 30, "20.00").await;
    let date = days_from_today(6);

    let (status, _) = book(&router, provider_booking(&provider, date, "09:00", &[&hour])).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, json) = book(&router, provider_booking(&provider, date, "09:30", &[&half])).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"]["code"], "slot_unavailable");

    // Back-to-back is fine: windows are half-open.
    let (status, _) = book(&router, provider_booking(&provider, date, "10:00", &[&half])).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = book(&router, provider_booking(&provider, date, "08:30", &[&half])).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_booking_validation_errors() {
    let router = setup().await;
    let provider = create_provider(&router).await;
    let other_provider = create_provider(&router).await;
    let service = create_service(&router, &provider, 60, "40.00").await;
    let foreign = create_service(&router, &other_provider, 30, "20.00").await;
    let date = days_from_today(4);

    let (status, json) = book(&router, provider_booking(&provider, days_from_today(-1), "10:00", &[&service])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "validation_error");

    let (status, _) = book(&router, provider_booking(&provider, date, "23:30", &[&service])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = book(&router, provider_booking(&provider, date, "10:00", &[])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = book(&router, provider_booking(&provider, date, "25:00", &[&service])).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, json) = book(&router, provider_booking(&provider, date, "10:00", &[&foreign])).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["code"], "service_not_found");
}

#[tokio::test]
async fn test_booking_unknown_provider_returns_404() {
    let router = setup().await;
    let ghost = uuid::Uuid::new_v4().to_string();

    let (status, json) = book(&router, provider_booking(&ghost, days_from_today(3), "10:00", &[&ghost])).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["code"], "provider_not_found");
}

// =============================================================================
// IDEMPOTENCY TESTS
// =============================================================================

#[tokio::test]
async fn test_idempotent_booking() {
    let router = setup().await;
    let provider = create_provider(&router).await;
    let service = create_service(&router, &provider, 30, "20.00").await;
    let date = days_from_today(5);
    let key = format!("booking-{}", uuid::Uuid::new_v4());
    let body = provider_booking(&provider, date, "10:00", &[&service]);

    let (first_status, first) =
        send_with_key(&router, "POST", "/v1/appointments", Some(body.clone()), Some(&key)).await;
    let (second_status, second) =
        send_with_key(&router, "POST", "/v1/appointments", Some(body), Some(&key)).await;

    assert_eq!(first_status, StatusCode::CREATED);
    assert_eq!(second_status, StatusCode::OK);
    assert_eq!(first["id"], second["id"]);

    let different = provider_booking(&provider, date, "11:00", &[&service]);
    let (status, json) =
        send_with_key(&router, "POST", "/v1/appointments", Some(different), Some(&key)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"]["code"], "idempotency_conflict");
}

// =============================================================================
// LIFECYCLE TESTS
// =============================================================================

#[tokio::test]
async fn test_pending_booking_confirm_then_complete() {
    let router = setup_with(SchedulingPolicy {
        client_booking_status: AppointmentStatus::Pending,
        ..SchedulingPolicy::default()
    })
    .await;
    let provider = create_provider(&router).await;
    let client = create_client(&router, "Ana").await;
    let service = create_service(&router, &provider, 30, "20.00").await;
    let date = days_from_today(3);
    open_day(&router, &provider, date).await;

    let (_, json) = book(&router, client_booking(&provider, &client, date, "10:00", &[&service])).await;
    assert_eq!(json["status"], "pending");
    let id = json["id"].as_str().unwrap().to_string();

    let as_client = json!({ "actor": { "role": "client", "id": client } });
    let as_provider = json!({ "actor": { "role": "provider", "id": provider } });

    let (status, _) = send(&router, "POST", &format!("/v1/appointments/{}/confirm", id), Some(as_client)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, json) =
        send(&router, "POST", &format!("/v1/appointments/{}/confirm", id), Some(as_provider.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "confirmed");

    let (status, json) =
        send(&router, "POST", &format!("/v1/appointments/{}/confirm", id), Some(as_provider.clone())).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"]["code"], "invalid_transition");

    let (status, json) =
        send(&router, "POST", &format!("/v1/appointments/{}/complete", id), Some(as_provider.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "completed");

    let (status, _) = send(&router, "POST", &format!("/v1/appointments/{}/cancel", id), Some(as_provider)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_cancellation_frees_the_slot() {
    let router = setup().await;
    let provider = create_provider(&router).await;
    let client = create_client(&router, "Ana").await;
    let service = create_service(&router, &provider, 30, "20.00").await;
    let date = days_from_today(7);
    set_hours(&router, &provider, date, "08:00", "12:00", json!([{ "start": "08:00", "end": "12:00" }])).await;

    let (_, json) = book(&router, client_booking(&provider, &client, date, "10:00", &[&service])).await;
    let id = json["id"].as_str().unwrap().to_string();
    assert!(!slots(&router, &provider, date, 30).await.contains(&"10:00".to_string()));

    let (status, json) = send(
        &router,
        "POST",
        &format!("/v1/appointments/{}/cancel", id),
        Some(json!({ "actor": { "role": "client", "id": client } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "cancelled_by_client");
    assert!(slots(&router, &provider, date, 30).await.contains(&"10:00".to_string()));

    let (status, _) = book(&router, provider_booking(&provider, date, "10:00", &[&service])).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_get_and_list_appointments() {
    let router = setup().await;
    let provider = create_provider(&router).await;
    let service = create_service(&router, &provider, 30, "20.00").await;
    let beard = create_service(&router, &provider, 15, "10.00").await;
    let date = days_from_today(4);

    let bookings: [(&str, Vec<&str>); 3] = [
        ("11:00", vec![&beard, &service]),
        ("09:00", vec![&service, &beard]),
        ("10:00", vec![&service]),
    ];
    for (start, services) in bookings {
        let (status, _) = book(&router, provider_booking(&provider, date, start, &services)).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, json) = send(
        &router,
        "GET",
        &format!("/v1/appointments?provider_id={}&date={}", provider, date),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let starts: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["start_time"].as_str().unwrap())
        .collect();
    assert_eq!(starts, ["09:00", "10:00", "11:00"]);
    assert_eq!(json[0]["service_ids"], json!([service, beard]));
    assert_eq!(json[1]["service_ids"], json!([service]));
    assert_eq!(json[2]["service_ids"], json!([beard, service]));

    let id = json[0]["id"].as_str().unwrap();
    let (status, single) = send(&router, "GET", &format!("/v1/appointments/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(single["start_time"], "09:00");

    let (status, _) = send(&router, "GET", &format!("/v1/appointments/{}", uuid::Uuid::new_v4()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// RESCHEDULE TESTS
// =============================================================================

#[tokio::test]
async fn test_reschedule_into_own_window() {
    let router = setup_with(SchedulingPolicy {
        client_booking_status: AppointmentStatus::Pending,
        ..SchedulingPolicy::default()
    })
    .await;
    let provider = create_provider(&router).await;
    let client = create_client(&router, "Ana").await;
    let hour = create_service(&router, &provider, 60, "40.00").await;
    let date = days_from_today(6);
    open_day(&router, &provider, date).await;

    let (_, json) = book(&router, client_booking(&provider, &client, date, "10:00", &[&hour])).await;
    assert_eq!(json["status"], "pending");
    let id = json["id"].as_str().unwrap().to_string();

    let (status, json) = send(
        &router,
        "POST",
        &format!("/v1/appointments/{}/reschedule", id),
        Some(json!({
            "actor": { "role": "client", "id": client },
            "date": date,
            "start_time": "10:30",
            "service_ids": [hour]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["id"], id.as_str());
    assert_eq!(json["start_time"], "10:30");
    assert_eq!(json["end_time"], "11:30");
    assert_eq!(json["status"], "confirmed");
}

#[tokio::test]
async fn test_reschedule_onto_another_booking_conflicts() {
    let router = setup().await;
    let provider = create_provider(&router).await;
    let hour = create_service(&router, &provider, 60, "40.00").await;
    let date = days_from_today(6);

    let (_, first) = book(&router, provider_booking(&provider, date, "09:00", &[&hour])).await;
    let (_, _second) = book(&router, provider_booking(&provider, date, "11:00", &[&hour])).await;

    let (status, json) = send(
        &router,
        "POST",
        &format!("/v1/appointments/{}/reschedule", first["id"].as_str().unwrap()),
        Some(json!({
            "actor": { "role": "provider", "id": provider },
            "date": date,
            "start_time": "10:30",
            "service_ids": [hour]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"]["code"], "slot_unavailable");

    let (_, unchanged) = send(&router, "GET", &format!("/v1/appointments/{}", first["id"].as_str().unwrap()), None).await;
    assert_eq!(unchanged["start_time"], "09:00");
}

#[tokio::test]
async fn test_reschedule_to_another_provider_recomputes_totals() {
    let router = setup().await;
    let provider = create_provider(&router).await;
    let other = create_provider(&router).await;
    let client = create_client(&router, "Ana").await;
    let short = create_service(&router, &provider, 30, "20.00").await;
    let long = create_service(&router, &other, 90, "75.00").await;
    let date = days_from_today(6);
    open_day(&router, &provider, date).await;
    open_day(&router, &other, date + ChronoDuration::days(1)).await;

    let (_, json) = book(&router, client_booking(&provider, &client, date, "10:00", &[&short])).await;
    let id = json["id"].as_str().unwrap().to_string();

    // Services must come from the destination provider's catalogue.
    let (status, _) = send(
        &router,
        "POST",
        &format!("/v1/appointments/{}/reschedule", id),
        Some(json!({
            "actor": { "role": "client", "id": client },
            "provider_id": other,
            "date": date,
            "start_time": "10:00",
            "service_ids": [short]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, json) = send(
        &router,
        "POST",
        &format!("/v1/appointments/{}/reschedule", id),
        Some(json!({
            "actor": { "role": "client", "id": client },
            "provider_id": other,
            "date": date + ChronoDuration::days(1),
            "start_time": "13:00",
            "service_ids": [long]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["provider_id"], other.as_str());
    assert_eq!(json["duration_minutes"], 90);
    assert_eq!(json["total_value"], "75.00");
    assert_eq!(json["end_time"], "14:30");
}

#[tokio::test]
async fn test_terminal_appointments_cannot_be_rescheduled() {
    let router = setup().await;
    let provider = create_provider(&router).await;
    let service = create_service(&router, &provider, 30, "20.00").await;
    let date = days_from_today(6);

    let (_, json) = book(&router, provider_booking(&provider, date, "10:00", &[&service])).await;
    let id = json["id"].as_str().unwrap().to_string();
    let as_provider = json!({ "actor": { "role": "provider", "id": provider } });

    send(&router, "POST", &format!("/v1/appointments/{}/cancel", id), Some(as_provider)).await;

    let (status, json) = send(
        &router,
        "POST",
        &format!("/v1/appointments/{}/reschedule", id),
        Some(json!({
            "actor": { "role": "provider", "id": provider },
            "date": date,
            "start_time": "11:00",
            "service_ids": [service]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"]["code"], "invalid_transition");
}

// =============================================================================
// NOTIFICATION AND SUMMARY TESTS
// =============================================================================

async fn notifications(router: &Router, recipient: &str) -> Vec<Value> {
    let (status, json) = send(router, "GET", &format!("/v1/notifications?recipient_id={}", recipient), None).await;
    assert_eq!(status, StatusCode::OK);
    json.as_array().unwrap().clone()
}

#[tokio::test]
async fn test_booking_and_cancellation_notify_the_other_side() {
    let router = setup().await;
    let provider = create_provider(&router).await;
    let client = create_client(&router, "Ana").await;
    let service = create_service(&router, &provider, 30, "20.00").await;
    let date = days_from_today(5);
    open_day(&router, &provider, date).await;

    let (_, json) = book(&router, client_booking(&provider, &client, date, "10:00", &[&service])).await;
    let id = json["id"].as_str().unwrap().to_string();

    let provider_inbox = notifications(&router, &provider).await;
    assert_eq!(provider_inbox.len(), 1);
    assert_eq!(provider_inbox[0]["category"], "appointment_booked");
    assert_eq!(notifications(&router, &client).await.len(), 1);

    send(
        &router,
        "POST",
        &format!("/v1/appointments/{}/cancel", id),
        Some(json!({ "actor": { "role": "provider", "id": provider } })),
    )
    .await;

    let client_inbox = notifications(&router, &client).await;
    assert_eq!(client_inbox.len(), 2);
    assert_eq!(client_inbox[0]["category"], "appointment_cancelled");
    assert_eq!(notifications(&router, &provider).await.len(), 1);

    let notification_id = client_inbox[0]["id"].as_str().unwrap();
    let (status, json) = send(
        &router,
        "POST",
        &format!("/v1/notifications/{}/read", notification_id),
        Some(json!({ "recipient_id": client })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["read_at"].is_string());

    let (_, unread) = send(
        &router,
        "GET",
        &format!("/v1/notifications?recipient_id={}&unread_only=true", client),
        None,
    )
    .await;
    assert_eq!(unread.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_summary_counts_only_completed_revenue() {
    let router = setup().await;
    let provider = create_provider(&router).await;
    let cheap = create_service(&router, &provider, 30, "20.00").await;
    let pricey = create_service(&router, &provider, 30, "55.50").await;
    let date = days_from_today(3);
    let as_provider = json!({ "actor": { "role": "provider", "id": provider } });

    let (_, done) = book(&router, provider_booking(&provider, date, "09:00", &[&pricey])).await;
    let (_, cancelled) = book(&router, provider_booking(&provider, date, "10:00", &[&pricey])).await;
    let (_, _open) = book(&router, provider_booking(&provider, date, "11:00", &[&cheap])).await;

    send(&router, "POST", &format!("/v1/appointments/{}/complete", done["id"].as_str().unwrap()), Some(as_provider.clone())).await;
    send(&router, "POST", &format!("/v1/appointments/{}/cancel", cancelled["id"].as_str().unwrap()), Some(as_provider)).await;

    let (status, json) = send(
        &router,
        "GET",
        &format!("/v1/providers/{}/summary?from={}&to={}", provider, date, date),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["completed_count"], 1);
    assert_eq!(json["cancelled_count"], 1);
    assert_eq!(json["scheduled_count"], 1);
    assert_eq!(json["revenue"], "55.50");
}

// =============================================================================
// HEALTH CHECK TESTS
// =============================================================================

#[tokio::test]
async fn test_health_and_ready() {
    let router = setup().await;

    let (status, json) = send(&router, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");

    let (status, json) = send(&router, "GET", "/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ready");

    let (status, json) = send(&router, "GET", "/v1/nowhere", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["code"], "not_found");
}

// =============================================================================
// CONCURRENT BOOKING TESTS
// =============================================================================

#[tokio::test]
async fn test_concurrent_identical_bookings_admit_exactly_one() {
    let router = setup().await;
    let provider = create_provider(&router).await;
    let service = create_service(&router, &provider, 30, "20.00").await;
    let date = days_from_today(10);

    let mut handles = vec![];
    for _ in 0..8 {
        let router = router.clone();
        let body = provider_booking(&provider, date, "10:00", &[&service]);
        handles.push(tokio::spawn(async move { book(&router, body).await }));
    }

    let mut created = 0;
    let mut rejected = 0;
    for handle in handles {
        let (status, json) = handle.await.unwrap();
        match status {
            StatusCode::CREATED => created += 1,
            StatusCode::CONFLICT => {
                assert_eq!(json["error"]["code"], "slot_unavailable");
                rejected += 1;
            }
            other => panic!("unexpected status {other}: {json}"),
        }
    }
    assert_eq!(created, 1);
    assert_eq!(rejected, 7);

    let (_, json) = send(
        &router,
        "GET",
        &format!("/v1/appointments?provider_id={}&date={}", provider, date),
        None,
    )
    .await;
    let stored = json.as_array().unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0]["status"], "confirmed");
}

fn window(appointment: &Value) -> (u32, u32) {
    let (h, m) = appointment["start_time"].as_str().unwrap().split_once(':').unwrap();
    let start = h.parse::<u32>().unwrap() * 60 + m.parse::<u32>().unwrap();
    (start, start + appointment["duration_minutes"].as_u64().unwrap() as u32)
}

#[tokio::test]
async fn test_randomized_concurrent_bookings_never_overlap() {
    let router = setup().await;
    let provider = create_provider(&router).await;
    let mut services = vec![];
    for minutes in [15, 30, 45, 60, 90] {
        services.push(create_service(&router, &provider, minutes, "10.00").await);
    }
    let date = days_from_today(11);
    let mut rng = StdRng::seed_from_u64(0x5eed);

    let mut handles = vec![];
    for _ in 0..60 {
        let start = 8 * 60 + rng.gen_range(0..40) * 15;
        let start = format!("{:02}:{:02}", start / 60, start % 60);
        let picked: Vec<String> = (0..rng.gen_range(1..=2))
            .map(|_| services[rng.gen_range(0..services.len())].clone())
            .collect();
        let refs: Vec<&str> = picked.iter().map(String::as_str).collect();
        let body = provider_booking(&provider, date, &start, &refs);
        let router = router.clone();
        handles.push(tokio::spawn(async move { book(&router, body).await }));
    }

    let mut created = 0;
    for handle in handles {
        let (status, _) = handle.await.unwrap();
        assert!(
            status == StatusCode::CREATED || status == StatusCode::CONFLICT,
            "unexpected status {status}"
        );
        if status == StatusCode::CREATED {
            created += 1;
        }
    }
    assert!(created > 0);

    let (_, json) = send(
        &router,
        "GET",
        &format!("/v1/appointments?provider_id={}&date={}&limit=100", provider, date),
        None,
    )
    .await;
    let booked: Vec<(u32, u32)> = json.as_array().unwrap().iter().map(window).collect();
    assert_eq!(booked.len(), created);

    for (i, a) in booked.iter().enumerate() {
        for b in &booked[i + 1..] {
            assert!(a.1 <= b.0 || b.1 <= a.0, "{:?} overlaps {:?}", a, b);
        }
    }
}
