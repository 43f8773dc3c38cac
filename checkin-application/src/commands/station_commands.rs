use anyhow::anyhow;
use serde::Deserialize;
use tracing::info;

use checkin_domain::{OperatorSession, ScanIntent, ScanMode, ScanRequest};

use crate::ops::BoardSnapshot;
use crate::scan::ScanOutcome;
use crate::{AppError, AppState};

#[derive(Debug, Clone, Deserialize)]
pub struct ModeChange {
    pub mode: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionChange {
    pub user_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ManualScan {
    pub code: String,
    #[serde(default)]
    pub intent: ScanIntent,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DecodedScan {
    pub text: String,
}

pub async fn set_mode(state: &AppState, payload: ModeChange) -> Result<BoardSnapshot, AppError> {
    let mode = ScanMode::parse(&payload.mode)
        .ok_or_else(|| AppError::BadRequest(format!("unknown scan mode '{}'", payload.mode)))?;
    Ok(state.scanner.set_mode(mode).await)
}

pub fn set_session(state: &AppState, client_ip: &str, payload: SessionChange) -> OperatorSession {
    let session = state.scanner.set_operator(&payload.user_name, client_ip);
    info!(user = %session.user_name, ip = %session.ip, "operator session updated");
    session
}

/// The run lives on its own task, so a dropped request cannot strand the
/// lock or lose the scan event.
pub async fn manual_scan(state: &AppState, payload: ManualScan) -> Result<ScanOutcome, AppError> {
    let run = state
        .scanner
        .spawn(ScanRequest::manual(payload.code, payload.intent));
    let outcome = run
        .await
        .map_err(|err| AppError::Internal(anyhow!("scan task failed: {}", err)))??;
    Ok(outcome)
}

/// Camera-path feed from a browser-side decoder. Returns whether the decode
/// started a run; a held lock drops it silently.
pub fn decoded_scan(state: &AppState, payload: DecodedScan) -> bool {
    state.scanner.accept_camera_decode(payload.text)
}
