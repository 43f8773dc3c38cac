use std::net::{IpAddr, SocketAddr};

use axum::http::HeaderMap;
use tracing::debug;

use checkin_application::queries::access_queries;
use checkin_application::AppState;
use checkin_domain::RuntimeConfig;

use crate::error::HttpError;

pub const ADMIN_ACTOR: &str = "admin";

/// Bearer token check for admin endpoints. Without a configured token only
/// loopback callers are admins.
pub fn authorize_admin(config: &RuntimeConfig, headers: &HeaderMap, client: IpAddr) -> bool {
    match &config.admin_token {
        Some(token) => extract_bearer(headers)
            .map(|value| value == *token)
            .unwrap_or(false),
        None => client.is_loopback(),
    }
}

/// Caller address: the first `X-Forwarded-For` hop when the station sits
/// behind a trusted proxy, the socket peer otherwise.
pub fn client_ip(config: &RuntimeConfig, headers: &HeaderMap, peer: SocketAddr) -> IpAddr {
    if config.trust_forwarded_for {
        let forwarded = headers
            .get("X-Forwarded-For")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .and_then(|value| value.trim().parse::<IpAddr>().ok());
        if let Some(ip) = forwarded {
            return ip;
        }
    }
    peer.ip()
}

/// Admits whitelisted devices (and admins) to station endpoints.
pub async fn guard_station(
    state: &AppState,
    headers: &HeaderMap,
    peer: SocketAddr,
) -> Result<IpAddr, HttpError> {
    let ip = client_ip(&state.config, headers, peer);
    if authorize_admin(&state.config, headers, ip)
        || access_queries::is_allowed(state, &ip).await
    {
        return Ok(ip);
    }
    debug!(ip = %ip, "station request from non-whitelisted device");
    Err(HttpError::Forbidden)
}

pub fn require_admin(
    state: &AppState,
    headers: &HeaderMap,
    peer: SocketAddr,
) -> Result<(), HttpError> {
    let ip = client_ip(&state.config, headers, peer);
    if authorize_admin(&state.config, headers, ip) {
        Ok(())
    } else {
        Err(HttpError::Unauthorized)
    }
}

fn extract_bearer(headers: &HeaderMap) -> Option<String> {
    let value = headers.get("Authorization")?.to_str().ok()?.trim();
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}
