use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Result;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use checkin_application::AppState;
use checkin_infrastructure::AppConfig;
use checkin_interfaces_http::build_router;

use crate::context::AppContext;

pub fn build_router_with_layers(state: AppState) -> Router {
    build_router(state.clone())
        .layer(CorsLayer::permissive())
        .layer(RequestBodyLimitLayer::new(
            usize::try_from(state.config.max_body_bytes).unwrap_or(usize::MAX),
        ))
        .layer(TimeoutLayer::new(scan_request_timeout(&state)))
        .layer(TraceLayer::new_for_http())
}

// A manual scan answers after status, identity and submission steps.
fn scan_request_timeout(state: &AppState) -> Duration {
    let steps = state.config.step_timeout_seconds.saturating_mul(3);
    Duration::from_secs(steps.max(state.config.request_timeout_seconds) + 1)
}

pub async fn run(config: AppConfig) -> Result<()> {
    let context = AppContext::new(&config).await?;
    let state = context.state;

    if let Some(camera) = state.camera.clone() {
        tokio::spawn(async move {
            let status = camera.start().await;
            info!(state = ?status.state, "camera startup finished");
        });
    }

    let app = build_router_with_layers(state.clone());
    let addr: SocketAddr = state.config.bind_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!("check-in station listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    if let Some(camera) = &state.camera {
        camera.teardown().await;
    }
    info!("check-in station stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "sigterm handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
