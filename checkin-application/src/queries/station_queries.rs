use checkin_domain::{CameraStatus, OperatorSession, ScanMode};
use serde::Serialize;

use crate::ops::BoardSnapshot;
use crate::{AppError, AppState};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeView {
    pub mode: ScanMode,
    pub modes: [ScanMode; 2],
    pub session: OperatorSession,
}

pub async fn board(state: &AppState) -> BoardSnapshot {
    state.board.snapshot().await
}

pub fn mode(state: &AppState) -> ModeView {
    ModeView {
        mode: state.scanner.mode(),
        modes: [ScanMode::CheckIn, ScanMode::GoodieBag],
        session: state.scanner.session(),
    }
}

pub fn camera_status(state: &AppState) -> Result<CameraStatus, AppError> {
    state
        .camera
        .as_ref()
        .map(|camera| camera.status())
        .ok_or_else(|| AppError::NotFound("camera is disabled".to_string()))
}
