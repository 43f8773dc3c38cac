use std::env;
use std::path::Path;

use anyhow::{anyhow, Result};
use serde::Deserialize;
use tokio::fs;
use tracing::warn;

use checkin_domain::{RuntimeConfig, DEFAULT_LOCK_SAFETY, DEFAULT_STEP_TIMEOUT, PIPELINE_STEPS};

const ENV_PREFIX: &str = "CHECKIN_";

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
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
    pub log_dir: Option<String>,
    pub log_json: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3240".to_string(),
            admin_token: None,
            status_url: String::new(),
            identity_url: String::new(),
            request_timeout_seconds: 10,
            step_timeout_seconds: DEFAULT_STEP_TIMEOUT.as_secs(),
            lock_safety_seconds: DEFAULT_LOCK_SAFETY.as_secs(),
            camera_enabled: true,
            camera_max_attempts: 3,
            camera_restart_delay_seconds: 2,
            zbarcam_path: "zbarcam".to_string(),
            video_sysfs_dir: "/sys/class/video4linux".to_string(),
            access_book_path: "./access_book.json".to_string(),
            enforce_whitelist: true,
            trust_forwarded_for: false,
            access_request_limit: 5,
            access_request_window_seconds: 600,
            max_body_bytes: 64 * 1024,
            log_dir: None,
            log_json: false,
        }
    }
}

impl AppConfig {
    /// Reads `path`, or `CHECKIN_CONFIG`, or `./config.toml`. A missing file
    /// falls back to defaults; environment overrides always apply.
    pub async fn load(path: Option<&str>) -> Result<Self> {
        let path = path
            .map(ToString::to_string)
            .or_else(|| env::var("CHECKIN_CONFIG").ok())
            .unwrap_or_else(|| "./config.toml".to_string());
        let file_path = Path::new(&path);
        let base_dir = file_path.parent();

        let mut config = if file_path.exists() {
            let content = fs::read_to_string(file_path).await?;
            Self::parse(&content)?
        } else {
            warn!(path = %path, "config file not found, using defaults");
            AppConfig::default()
        };
        config.apply_overrides(|key| env::var(format!("{}{}", ENV_PREFIX, key)).ok());
        config.resolve_paths(base_dir);
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|err| anyhow!("invalid config: {}", err))
    }

    pub fn normalize(&mut self) {
        self.admin_token = non_blank(self.admin_token.take());
        self.log_dir = non_blank(self.log_dir.take());
        self.status_url = self.status_url.trim().to_string();
        self.identity_url = self.identity_url.trim().to_string();
        self.zbarcam_path = self.zbarcam_path.trim().to_string();
    }

    fn resolve_paths(&mut self, base_dir: Option<&Path>) {
        let Some(base) = base_dir else {
            return;
        };
        self.access_book_path = resolve_path(base, &self.access_book_path);
        if let Some(log_dir) = &self.log_dir {
            self.log_dir = Some(resolve_path(base, log_dir));
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.bind_addr
            .parse::<std::net::SocketAddr>()
            .map_err(|err| anyhow!("invalid bind_addr: {}", err))?;
        validate_url("status_url", &self.status_url)?;
        validate_url("identity_url", &self.identity_url)?;
        if self.request_timeout_seconds == 0 || self.step_timeout_seconds == 0 {
            return Err(anyhow!("request and step timeouts must be greater than 0"));
        }
        if self.lock_safety_seconds == 0 {
            return Err(anyhow!("lock_safety_seconds must be greater than 0"));
        }
        // A run that settles in time must not be force-released mid-flight.
        if self.step_timeout_seconds.saturating_mul(PIPELINE_STEPS) > self.lock_safety_seconds {
            return Err(anyhow!(
                "{} x step_timeout_seconds ({}) must not exceed lock_safety_seconds ({})",
                PIPELINE_STEPS,
                self.step_timeout_seconds,
                self.lock_safety_seconds
            ));
        }
        if self.camera_max_attempts == 0 {
            return Err(anyhow!("camera_max_attempts must be at least 1"));
        }
        if self.access_request_limit == 0 || self.access_request_window_seconds == 0 {
            return Err(anyhow!("access request limit and window must be greater than 0"));
        }
        if self.access_book_path.trim().is_empty() {
            return Err(anyhow!("access_book_path must not be empty"));
        }
        if self.max_body_bytes == 0 {
            return Err(anyhow!("max_body_bytes must be greater than 0"));
        }
        Ok(())
    }

    pub fn to_runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            bind_addr: self.bind_addr.clone(),
            admin_token: self.admin_token.clone(),
            status_url: self.status_url.clone(),
            identity_url: self.identity_url.clone(),
            request_timeout_seconds: self.request_timeout_seconds,
            step_timeout_seconds: self.step_timeout_seconds,
            lock_safety_seconds: self.lock_safety_seconds,
            camera_enabled: self.camera_enabled,
            camera_max_attempts: self.camera_max_attempts,
            camera_restart_delay_seconds: self.camera_restart_delay_seconds,
            zbarcam_path: self.zbarcam_path.clone(),
            video_sysfs_dir: self.video_sysfs_dir.clone(),
            access_book_path: self.access_book_path.clone(),
            enforce_whitelist: self.enforce_whitelist,
            trust_forwarded_for: self.trust_forwarded_for,
            access_request_limit: self.access_request_limit,
            access_request_window_seconds: self.access_request_window_seconds,
            max_body_bytes: self.max_body_bytes,
        }
    }

    /// `lookup` receives keys without the `CHECKIN_` prefix.
    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("BIND_ADDR") {
            self.bind_addr = value;
        }
        if let Some(value) = lookup("ADMIN_TOKEN") {
            self.admin_token = Some(value);
        }
        if let Some(value) = lookup("STATUS_URL") {
            self.status_url = value;
        }
        if let Some(value) = lookup("IDENTITY_URL") {
            self.identity_url = value;
        }
        if let Some(value) = lookup("REQUEST_TIMEOUT_SECONDS") {
            self.request_timeout_seconds = value.parse().unwrap_or(self.request_timeout_seconds);
        }
        if let Some(value) = lookup("STEP_TIMEOUT_SECONDS") {
            self.step_timeout_seconds = value.parse().unwrap_or(self.step_timeout_seconds);
        }
        if let Some(value) = lookup("LOCK_SAFETY_SECONDS") {
            self.lock_safety_seconds = value.parse().unwrap_or(self.lock_safety_seconds);
        }
        if let Some(value) = lookup("CAMERA_ENABLED") {
            self.camera_enabled = value.parse().unwrap_or(self.camera_enabled);
        }
        if let Some(value) = lookup("CAMERA_MAX_ATTEMPTS") {
            self.camera_max_attempts = value.parse().unwrap_or(self.camera_max_attempts);
        }
        if let Some(value) = lookup("CAMERA_RESTART_DELAY_SECONDS") {
            self.camera_restart_delay_seconds =
                value.parse().unwrap_or(self.camera_restart_delay_seconds);
        }
        if let Some(value) = lookup("ZBARCAM_PATH") {
            self.zbarcam_path = value;
        }
        if let Some(value) = lookup("VIDEO_SYSFS_DIR") {
            self.video_sysfs_dir = value;
        }
        if let Some(value) = lookup("ACCESS_BOOK_PATH") {
            self.access_book_path = value;
        }
        if let Some(value) = lookup("ENFORCE_WHITELIST") {
            self.enforce_whitelist = value.parse().unwrap_or(self.enforce_whitelist);
        }
        if let Some(value) = lookup("TRUST_FORWARDED_FOR") {
            self.trust_forwarded_for = value.parse().unwrap_or(self.trust_forwarded_for);
        }
        if let Some(value) = lookup("ACCESS_REQUEST_LIMIT") {
            self.access_request_limit = value.parse().unwrap_or(self.access_request_limit);
        }
        if let Some(value) = lookup("ACCESS_REQUEST_WINDOW_SECONDS") {
            self.access_request_window_seconds =
                value.parse().unwrap_or(self.access_request_window_seconds);
        }
        if let Some(value) = lookup("MAX_BODY_BYTES") {
            self.max_body_bytes = value.parse().unwrap_or(self.max_body_bytes);
        }
        if let Some(value) = lookup("LOG_DIR") {
            self.log_dir = Some(value);
        }
        if let Some(value) = lookup("LOG_JSON") {
            self.log_json = value.parse().unwrap_or(self.log_json);
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
}

fn validate_url(key: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(anyhow!("{} must be configured", key));
    }
    if !(value.starts_with("http://") || value.starts_with("https://")) {
        return Err(anyhow!("{} must be an http(s) url", key));
    }
    Ok(())
}

fn resolve_path(base: &Path, value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return trimmed.to_string();
    }
    let path = Path::new(trimmed);
    if path.is_absolute() {
        trimmed.to_string()
    } else {
        base.join(path).to_string_lossy().to_string()
    }
}
