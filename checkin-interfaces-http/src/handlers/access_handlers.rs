use std::net::SocketAddr;

use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;

use checkin_application::commands::access_commands::{self, NewAccessRequest};
use checkin_application::queries::access_queries::{self, AccessCheck};
use checkin_application::AppState;
use checkin_domain::AccessRequest;

use crate::error::HttpError;
use crate::middleware::client_ip;

pub async fn check_access(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Json<AccessCheck> {
    let ip = client_ip(&state.config, &headers, peer);
    Json(access_queries::check_access(&state, &ip).await)
}

pub async fn submit_request(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(payload): Json<NewAccessRequest>,
) -> Result<(StatusCode, Json<AccessRequest>), HttpError> {
    let ip = client_ip(&state.config, &headers, peer);
    let request = access_commands::request_access(&state, &ip.to_string(), payload).await?;
    Ok((StatusCode::CREATED, Json(request)))
}
