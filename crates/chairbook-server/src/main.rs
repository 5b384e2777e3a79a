use anyhow::Result;
use chairbook_server::{config::Config, telemetry, App};
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    telemetry::init(&config)?;

    let app = App::new(config.clone()).await?;
    let router = app.router();

    let listener = TcpListener::bind(&config.bind_address).await?;
    let policy = &config.scheduling;
    info!(
        address = %config.bind_address,
        slot_step_minutes = policy.slot_step_minutes,
        fallback_service_minutes = ?policy.fallback_service_minutes,
        client_booking_status = policy.client_booking_status.as_str(),
        provider_booking_status = policy.provider_booking_status.as_str(),
        "chairbook listening"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    opentelemetry::global::shutdown_tracer_provider();
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install ctrl+c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
