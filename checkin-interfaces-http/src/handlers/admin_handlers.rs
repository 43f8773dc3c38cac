use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;

use checkin_application::commands::access_commands::{self, NewWhitelistEntry};
use checkin_application::queries::access_queries;
use checkin_application::AppState;
use checkin_domain::{AccessRequest, WhitelistEntry};

use crate::error::HttpError;
use crate::middleware::{require_admin, ADMIN_ACTOR};

#[derive(Deserialize)]
pub struct RequestFilter {
    pub status: Option<String>,
}

pub async fn list_requests(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Query(filter): Query<RequestFilter>,
) -> Result<Json<Vec<AccessRequest>>, HttpError> {
    require_admin(&state, &headers, peer)?;
    let list = access_queries::list_requests(&state, filter.status.as_deref()).await?;
    Ok(Json(list))
}

pub async fn approve_request(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<AccessRequest>, HttpError> {
    require_admin(&state, &headers, peer)?;
    let request = access_commands::approve_request(&state, &id, ADMIN_ACTOR).await?;
    Ok(Json(request))
}

pub async fn reject_request(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<AccessRequest>, HttpError> {
    require_admin(&state, &headers, peer)?;
    let request = access_commands::reject_request(&state, &id, ADMIN_ACTOR).await?;
    Ok(Json(request))
}

pub async fn list_whitelist(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Result<Json<Vec<WhitelistEntry>>, HttpError> {
    require_admin(&state, &headers, peer)?;
    Ok(Json(access_queries::list_whitelist(&state).await))
}

pub async fn add_whitelist(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(payload): Json<NewWhitelistEntry>,
) -> Result<Json<WhitelistEntry>, HttpError> {
    require_admin(&state, &headers, peer)?;
    let entry = access_commands::add_whitelist(&state, payload, ADMIN_ACTOR).await?;
    Ok(Json(entry))
}

pub async fn remove_whitelist(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(ip): Path<String>,
) -> Result<StatusCode, HttpError> {
    require_admin(&state, &headers, peer)?;
    access_commands::remove_whitelist(&state, &ip).await?;
    Ok(StatusCode::NO_CONTENT)
}
