use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;

use checkin_application::queries::station_queries;
use checkin_application::{AppState, CameraSessionManager};
use checkin_domain::CameraStatus;

use crate::error::HttpError;
use crate::middleware::guard_station;

#[derive(Deserialize)]
pub struct CameraSelection {
    pub index: usize,
}

#[derive(Deserialize)]
pub struct VisibilityChange {
    pub visible: bool,
}

pub async fn get_camera(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Result<Json<CameraStatus>, HttpError> {
    guard_station(&state, &headers, peer).await?;
    Ok(Json(station_queries::camera_status(&state)?))
}

pub async fn select_camera(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(payload): Json<CameraSelection>,
) -> Result<Json<CameraStatus>, HttpError> {
    guard_station(&state, &headers, peer).await?;
    let status = camera(&state)?.select(payload.index).await?;
    Ok(Json(status))
}

pub async fn retry_camera(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Result<Json<CameraStatus>, HttpError> {
    guard_station(&state, &headers, peer).await?;
    let status = camera(&state)?.retry().await?;
    Ok(Json(status))
}

pub async fn camera_visibility(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(payload): Json<VisibilityChange>,
) -> Result<Json<CameraStatus>, HttpError> {
    guard_station(&state, &headers, peer).await?;
    let status = camera(&state)?.visibility_changed(payload.visible).await;
    Ok(Json(status))
}

fn camera(state: &AppState) -> Result<Arc<CameraSessionManager>, HttpError> {
    state
        .camera
        .clone()
        .ok_or_else(|| HttpError::NotFound("camera is disabled".to_string()))
}
