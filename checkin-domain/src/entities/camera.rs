// Camera entities

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraDescriptor {
    pub id: String,
    pub label: String,
}

/// What to ask the platform for when opening a capture session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum CaptureTarget {
    Device(String),
    FacingEnvironment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraState {
    Uninitialized,
    Enumerating,
    Starting,
    Running,
    Stopping,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct CameraStatus {
    pub state: CameraState,
    pub devices: Vec<CameraDescriptor>,
    pub selected: Option<usize>,
    pub attempt: u32,
    pub retry_available: bool,
    pub last_error: Option<String>,
}
