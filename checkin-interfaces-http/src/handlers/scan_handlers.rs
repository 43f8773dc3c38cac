use std::net::SocketAddr;

use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Serialize;

use checkin_application::commands::station_commands::{self, DecodedScan, ManualScan};
use checkin_application::scan::ScanOutcome;
use checkin_application::AppState;

use crate::error::HttpError;
use crate::middleware::guard_station;

#[derive(Serialize)]
pub struct DecodeAck {
    pub accepted: bool,
}

pub async fn manual_scan(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(payload): Json<ManualScan>,
) -> Result<Json<ScanOutcome>, HttpError> {
    guard_station(&state, &headers, peer).await?;
    let outcome = station_commands::manual_scan(&state, payload).await?;
    Ok(Json(outcome))
}

pub async fn decoded_scan(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(payload): Json<DecodedScan>,
) -> Result<(StatusCode, Json<DecodeAck>), HttpError> {
    guard_station(&state, &headers, peer).await?;
    let accepted = station_commands::decoded_scan(&state, payload);
    Ok((StatusCode::ACCEPTED, Json(DecodeAck { accepted })))
}
