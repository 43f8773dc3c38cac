use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use checkin_domain::{
    sanitize_text, validate_email, validate_ip, AccessBook, AccessRequest, AccessRequestStatus,
    WhitelistEntry,
};

use crate::{AppError, AppState};

const MAX_NAME_LEN: usize = 100;
const MAX_REASON_LEN: usize = 500;
const MAX_LABEL_LEN: usize = 100;

#[derive(Debug, Clone, Deserialize)]
pub struct NewAccessRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewWhitelistEntry {
    pub ip: String,
    #[serde(default)]
    pub label: Option<String>,
}

pub async fn request_access(
    state: &AppState,
    client_ip: &str,
    payload: NewAccessRequest,
) -> Result<AccessRequest, AppError> {
    let ip = validate_ip(client_ip)?.to_string();
    if !state.request_limiter.check(&ip) {
        warn!(ip = %ip, "access request rate limited");
        return Err(AppError::RateLimited);
    }

    let name = sanitize_text(&payload.name, MAX_NAME_LEN);
    if name.is_empty() {
        return Err(AppError::BadRequest("name is required".to_string()));
    }
    let email = validate_email(&payload.email)?;
    let reason = optional_text(payload.reason, MAX_REASON_LEN);

    let request = update_book(state, |book| {
        if book.is_whitelisted(&ip) {
            return Err(AppError::Conflict(format!("{} is already whitelisted", ip)));
        }
        if book.pending_for(&ip).is_some() {
            return Err(AppError::Conflict(format!(
                "an access request for {} is already pending",
                ip
            )));
        }
        let request = AccessRequest {
            id: Uuid::new_v4().to_string(),
            ip: ip.clone(),
            name,
            email,
            reason,
            status: AccessRequestStatus::Pending,
            requested_at: Utc::now().timestamp_millis(),
            decided_at: None,
            decided_by: None,
        };
        book.requests.push(request.clone());
        Ok(request)
    })
    .await?;

    state.metrics.record_access_request();
    info!(id = %request.id, ip = %request.ip, "access request received");
    Ok(request)
}

pub async fn approve_request(
    state: &AppState,
    id: &str,
    decided_by: &str,
) -> Result<AccessRequest, AppError> {
    let request = update_book(state, |book| {
        let now = Utc::now().timestamp_millis();
        let request = decide(book, id, AccessRequestStatus::Approved, decided_by, now)?;
        book.allow(WhitelistEntry {
            ip: request.ip.clone(),
            label: Some(request.name.clone()),
            added_at: now,
            added_by: Some(decided_by.to_string()),
        });
        Ok(request)
    })
    .await?;
    info!(id = %request.id, ip = %request.ip, "access request approved");
    Ok(request)
}

pub async fn reject_request(
    state: &AppState,
    id: &str,
    decided_by: &str,
) -> Result<AccessRequest, AppError> {
    let request = update_book(state, |book| {
        decide(
            book,
            id,
            AccessRequestStatus::Rejected,
            decided_by,
            Utc::now().timestamp_millis(),
        )
    })
    .await?;
    info!(id = %request.id, ip = %request.ip, "access request rejected");
    Ok(request)
}

pub async fn add_whitelist(
    state: &AppState,
    payload: NewWhitelistEntry,
    added_by: &str,
) -> Result<WhitelistEntry, AppError> {
    let ip = validate_ip(&payload.ip)?.to_string();
    let entry = WhitelistEntry {
        ip,
        label: optional_text(payload.label, MAX_LABEL_LEN),
        added_at: Utc::now().timestamp_millis(),
        added_by: Some(added_by.to_string()),
    };
    let stored = update_book(state, |book| {
        book.allow(entry.clone());
        Ok(book
            .whitelist
            .iter()
            .find(|item| item.ip == entry.ip)
            .cloned()
            .unwrap_or(entry))
    })
    .await?;
    info!(ip = %stored.ip, "whitelist entry saved");
    Ok(stored)
}

pub async fn remove_whitelist(state: &AppState, ip: &str) -> Result<(), AppError> {
    let ip = validate_ip(ip)?.to_string();
    update_book(state, |book| {
        if book.revoke(&ip) {
            Ok(())
        } else {
            Err(AppError::NotFound(format!("{} is not whitelisted", ip)))
        }
    })
    .await?;
    info!(ip = %ip, "whitelist entry removed");
    Ok(())
}

/// Applies `change` to a copy of the book and swaps it in only after it was
/// persisted.
async fn update_book<T, F>(state: &AppState, change: F) -> Result<T, AppError>
where
    F: FnOnce(&mut AccessBook) -> Result<T, AppError>,
{
    let mut book = state.access_book.write().await;
    let mut next = book.clone();
    let value = change(&mut next)?;
    state.access_repo.save(&next).await?;
    *book = next;
    Ok(value)
}

fn decide(
    book: &mut AccessBook,
    id: &str,
    status: AccessRequestStatus,
    decided_by: &str,
    now: i64,
) -> Result<AccessRequest, AppError> {
    let request = book
        .request_mut(id)
        .ok_or_else(|| AppError::NotFound(format!("access request '{}' not found", id)))?;
    if request.status != AccessRequestStatus::Pending {
        return Err(AppError::Conflict(format!(
            "access request '{}' was already decided",
            id
        )));
    }
    request.status = status;
    request.decided_at = Some(now);
    request.decided_by = Some(decided_by.to_string());
    Ok(request.clone())
}

fn optional_text(value: Option<String>, max_len: usize) -> Option<String> {
    value
        .map(|text| sanitize_text(&text, max_len))
        .filter(|text| !text.is_empty())
}
