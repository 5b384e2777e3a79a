use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::api::handlers::{
    appointments, availability, health, notifications, parties, schedule, services, summary,
};
use crate::AppState;

async fn fallback() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": {
                "code": "not_found",
                "message": "The requested endpoint does not exist"
            }
        })),
    )
}

pub fn build(state: Arc<AppState>) -> Router {
    let v1 = Router::new()
        .route("/providers", post(parties::create_provider))
        .route("/providers/:id", get(parties::get_provider))
        .route("/clients", post(parties::create_client))
        .route("/clients/:id", get(parties::get_client))
        .route(
            "/providers/:id/services",
            get(services::list).post(services::create),
        )
        .route("/providers/:id/working-hours", get(schedule::list_working_hours))
        .route(
            "/providers/:id/working-hours/:weekday",
            put(schedule::upsert_working_hour),
        )
        .route(
            "/providers/:id/blocked-days",
            get(schedule::list_blocked_days).post(schedule::create_blocked_day),
        )
        .route(
            "/providers/:id/blocked-days/:date",
            delete(schedule::delete_blocked_day),
        )
        .route("/providers/:id/availability", get(availability::slots))
        .route("/providers/:id/summary", get(summary::get))
        .route("/appointments", get(appointments::list).post(appointments::create))
        .route("/appointments/:id", get(appointments::get))
        .route("/appointments/:id/confirm", post(appointments::confirm))
        .route("/appointments/:id/complete", post(appointments::complete))
        .route("/appointments/:id/cancel", post(appointments::cancel))
        .route("/appointments/:id/reschedule", post(appointments::reschedule))
        .route("/notifications", get(notifications::list))
        .route("/notifications/:id/read", post(notifications::mark_read));

    let public = Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready));

    let api = Router::new()
        .nest("/v1", v1)
        .merge(public)
        .fallback(fallback);

    api.with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(CompressionLayer::new())
                .layer(CorsLayer::permissive()),
        )
}
