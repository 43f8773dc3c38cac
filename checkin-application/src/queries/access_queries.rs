use std::net::IpAddr;

use serde::Serialize;

use checkin_domain::{AccessRequest, AccessRequestStatus, WhitelistEntry};

use crate::{AppError, AppState};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessCheck {
    pub ip: String,
    pub allowed: bool,
    pub pending: bool,
}

/// Loopback callers are always let through, as is everyone when enforcement
/// is switched off.
pub async fn is_allowed(state: &AppState, ip: &IpAddr) -> bool {
    if !state.config.enforce_whitelist || ip.is_loopback() {
        return true;
    }
    state
        .access_book
        .read()
        .await
        .is_whitelisted(&ip.to_string())
}

pub async fn check_access(state: &AppState, ip: &IpAddr) -> AccessCheck {
    let allowed = is_allowed(state, ip).await;
    let pending = state
        .access_book
        .read()
        .await
        .pending_for(&ip.to_string())
        .is_some();
    AccessCheck {
        ip: ip.to_string(),
        allowed,
        pending,
    }
}

pub async fn list_requests(
    state: &AppState,
    status: Option<&str>,
) -> Result<Vec<AccessRequest>, AppError> {
    let filter = match status.map(str::trim).filter(|value| !value.is_empty()) {
        Some(raw) => Some(
            AccessRequestStatus::parse(raw)
                .ok_or_else(|| AppError::BadRequest(format!("unknown status '{}'", raw)))?,
        ),
        None => None,
    };
    let book = state.access_book.read().await;
    let mut list = book
        .requests
        .iter()
        .filter(|request| filter.map_or(true, |status| request.status == status))
        .cloned()
        .collect::<Vec<_>>();
    list.sort_by(|a, b| b.requested_at.cmp(&a.requested_at));
    Ok(list)
}

pub async fn list_whitelist(state: &AppState) -> Vec<WhitelistEntry> {
    state.access_book.read().await.whitelist.clone()
}
