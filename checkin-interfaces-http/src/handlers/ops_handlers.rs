use std::net::SocketAddr;

use axum::extract::{ConnectInfo, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use tracing::warn;

use checkin_application::AppState;
use checkin_domain::CameraState;

use crate::middleware::{authorize_admin, client_ip};

pub async fn health_live() -> StatusCode {
    StatusCode::OK
}

/// Not ready while the camera sits in the failed state waiting for a retry.
pub async fn health_ready(State(state): State<AppState>) -> StatusCode {
    match &state.camera {
        Some(camera) if camera.status().state == CameraState::Failed => {
            warn!("ready check failed: camera unavailable");
            StatusCode::SERVICE_UNAVAILABLE
        }
        _ => StatusCode::OK,
    }
}

pub async fn metrics_prometheus(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let ip = client_ip(&state.config, &headers, peer);
    if !authorize_admin(&state.config, &headers, ip) {
        return (StatusCode::UNAUTHORIZED, "unauthorized".to_string()).into_response();
    }
    let payload = state.metrics.render_prometheus();
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; version=0.0.4; charset=utf-8"),
    );
    (headers, payload).into_response()
}
