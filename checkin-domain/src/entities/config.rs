// Runtime configuration shared by every layer

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    pub bind_addr: String,
    pub admin_token: Option<String>,
    pub status_url: String,
    pub identity_url: String,
    pub request_timeout_seconds: u64,
    pub step_timeout_seconds: u64,
    pub lock_safety_seconds: u64,
    pub camera_enabled: bool,
    pub camera_max_attempts: u32,
    pub camera_restart_delay_seconds: u64,
    pub zbarcam_path: String,
    pub video_sysfs_dir: String,
    pub access_book_path: String,
    pub enforce_whitelist: bool,
    pub trust_forwarded_for: bool,
    pub access_request_limit: u32,
    pub access_request_window_seconds: u64,
    pub max_body_bytes: u64,
}
