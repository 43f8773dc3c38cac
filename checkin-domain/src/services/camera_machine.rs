// Camera session state machine
// Transitions are pure: each event yields the next state plus the effects
// the session driver has to perform.

use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::entities::{CameraDescriptor, CameraState, CameraStatus, CaptureTarget};
use crate::error::CaptureError;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_RESTART_DELAY: Duration = Duration::from_secs(2);

static BACK_CAMERA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)back|rear|environment").expect("back camera pattern"));

pub fn pick_default_camera(devices: &[CameraDescriptor]) -> Option<usize> {
    if devices.is_empty() {
        return None;
    }
    Some(
        devices
            .iter()
            .position(|device| BACK_CAMERA.is_match(&device.label))
            .unwrap_or(0),
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraEvent {
    Start,
    Listed(Vec<CameraDescriptor>),
    ListFailed(String),
    Opened,
    OpenFailed(String),
    Stopped,
    Capture(CaptureError),
    RestartDue,
    VisibilityRegained,
    Select(usize),
    Teardown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraEffect {
    Enumerate,
    Open(CaptureTarget),
    Stop,
    ScheduleRestart(Duration),
    ShowRetry,
    LogError(String),
}

#[derive(Debug, Clone, Copy)]
pub struct CameraPolicy {
    pub max_attempts: u32,
    pub restart_delay: Duration,
}

impl Default for CameraPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            restart_delay: DEFAULT_RESTART_DELAY,
        }
    }
}

#[derive(Debug)]
pub struct CameraMachine {
    policy: CameraPolicy,
    state: CameraState,
    devices: Vec<CameraDescriptor>,
    selected: Option<usize>,
    attempt: u32,
    retry_available: bool,
    last_error: Option<String>,
    resume: Option<CaptureTarget>,
    torn_down: bool,
}

impl CameraMachine {
    pub fn new(policy: CameraPolicy) -> Self {
        Self {
            policy,
            state: CameraState::Uninitialized,
            devices: Vec::new(),
            selected: None,
            attempt: 0,
            retry_available: false,
            last_error: None,
            resume: None,
            torn_down: false,
        }
    }

    pub fn state(&self) -> CameraState {
        self.state
    }

    pub fn devices(&self) -> &[CameraDescriptor] {
        &self.devices
    }

    pub fn status(&self) -> CameraStatus {
        CameraStatus {
            state: self.state,
            devices: self.devices.clone(),
            selected: self.selected,
            attempt: self.attempt,
            retry_available: self.retry_available,
            last_error: self.last_error.clone(),
        }
    }

    pub fn handle(&mut self, event: CameraEvent) -> Vec<CameraEffect> {
        match event {
            CameraEvent::Start => self.on_start(),
            CameraEvent::Listed(devices) => self.on_listed(devices),
            CameraEvent::ListFailed(message) => self.on_list_failed(message),
            CameraEvent::Opened => self.on_opened(),
            CameraEvent::OpenFailed(message) => self.on_open_failed(message),
            CameraEvent::Stopped => self.on_stopped(),
            CameraEvent::Capture(error) => self.on_capture_error(error),
            CameraEvent::RestartDue | CameraEvent::VisibilityRegained => self.on_resume(),
            CameraEvent::Select(index) => self.on_select(index),
            CameraEvent::Teardown => self.on_teardown(),
        }
    }

    fn is_idle(&self) -> bool {
        matches!(self.state, CameraState::Uninitialized | CameraState::Failed)
    }

    fn preferred_target(&self) -> CaptureTarget {
        self.selected
            .and_then(|index| self.devices.get(index))
            .map(|device| CaptureTarget::Device(device.id.clone()))
            .unwrap_or(CaptureTarget::FacingEnvironment)
    }

    fn begin_open(&mut self, target: CaptureTarget) -> Vec<CameraEffect> {
        self.state = CameraState::Starting;
        self.attempt = 1;
        self.retry_available = false;
        vec![CameraEffect::Open(target)]
    }

    fn on_start(&mut self) -> Vec<CameraEffect> {
        if !self.is_idle() {
            return Vec::new();
        }
        self.torn_down = false;
        self.state = CameraState::Enumerating;
        self.attempt = 0;
        self.retry_available = false;
        vec![CameraEffect::Enumerate]
    }

    fn on_listed(&mut self, devices: Vec<CameraDescriptor>) -> Vec<CameraEffect> {
        if self.state != CameraState::Enumerating {
            return Vec::new();
        }
        if self.torn_down {
            self.state = CameraState::Uninitialized;
            return Vec::new();
        }
        let previous = self
            .selected
            .and_then(|index| self.devices.get(index))
            .map(|device| device.id.clone());
        self.selected = previous
            .and_then(|id| devices.iter().position(|device| device.id == id))
            .or_else(|| pick_default_camera(&devices));
        self.devices = devices;
        let target = self.preferred_target();
        self.begin_open(target)
    }

    fn on_list_failed(&mut self, message: String) -> Vec<CameraEffect> {
        if self.state != CameraState::Enumerating {
            return Vec::new();
        }
        if self.torn_down {
            self.state = CameraState::Uninitialized;
            return Vec::new();
        }
        let mut effects = vec![CameraEffect::LogError(format!(
            "camera enumeration failed: {}",
            message
        ))];
        self.last_error = Some(message);
        effects.extend(self.begin_open(CaptureTarget::FacingEnvironment));
        effects
    }

    fn on_opened(&mut self) -> Vec<CameraEffect> {
        if self.state != CameraState::Starting {
            return Vec::new();
        }
        if self.torn_down || self.resume.is_some() {
            self.state = CameraState::Stopping;
            return vec![CameraEffect::Stop];
        }
        self.state = CameraState::Running;
        self.last_error = None;
        Vec::new()
    }

    fn on_open_failed(&mut self, message: String) -> Vec<CameraEffect> {
        if self.state != CameraState::Starting {
            return Vec::new();
        }
        if self.torn_down {
            self.state = CameraState::Uninitialized;
            return Vec::new();
        }
        let mut effects = vec![CameraEffect::LogError(format!(
            "camera start attempt {}/{} failed: {}",
            self.attempt, self.policy.max_attempts, message
        ))];
        self.last_error = Some(message);
        if self.attempt < self.policy.max_attempts {
            self.attempt += 1;
            effects.push(CameraEffect::Open(CaptureTarget::FacingEnvironment));
        } else {
            self.state = CameraState::Failed;
            self.retry_available = true;
            effects.push(CameraEffect::ShowRetry);
        }
        effects
    }

    fn on_stopped(&mut self) -> Vec<CameraEffect> {
        if self.state != CameraState::Stopping {
            return Vec::new();
        }
        self.state = CameraState::Uninitialized;
        if self.torn_down {
            self.resume = None;
            return Vec::new();
        }
        match self.resume.take() {
            Some(target) => self.begin_open(target),
            None => Vec::new(),
        }
    }

    fn on_capture_error(&mut self, error: CaptureError) -> Vec<CameraEffect> {
        match error {
            CaptureError::DecodeMiss => Vec::new(),
            CaptureError::StreamInterrupted(message) => {
                let log = CameraEffect::LogError(format!("camera stream interrupted: {}", message));
                self.last_error = Some(message);
                if self.state != CameraState::Running {
                    return vec![log];
                }
                self.state = CameraState::Stopping;
                self.resume = None;
                vec![
                    log,
                    CameraEffect::Stop,
                    CameraEffect::ScheduleRestart(self.policy.restart_delay),
                ]
            }
            CaptureError::Other(message) => {
                vec![CameraEffect::LogError(format!("camera error: {}", message))]
            }
        }
    }

    fn on_resume(&mut self) -> Vec<CameraEffect> {
        if self.torn_down || !self.is_idle() {
            return Vec::new();
        }
        let target = self.preferred_target();
        self.begin_open(target)
    }

    fn on_select(&mut self, index: usize) -> Vec<CameraEffect> {
        let Some(device) = self.devices.get(index) else {
            return Vec::new();
        };
        let target = CaptureTarget::Device(device.id.clone());
        self.selected = Some(index);
        match self.state {
            CameraState::Running => {
                self.state = CameraState::Stopping;
                self.resume = Some(target);
                vec![CameraEffect::Stop]
            }
            CameraState::Starting => {
                self.resume = Some(target);
                Vec::new()
            }
            CameraState::Uninitialized | CameraState::Failed if !self.torn_down => {
                self.begin_open(target)
            }
            _ => Vec::new(),
        }
    }

    fn on_teardown(&mut self) -> Vec<CameraEffect> {
        self.torn_down = true;
        self.retry_available = false;
        self.resume = None;
        match self.state {
            CameraState::Running => {
                self.state = CameraState::Stopping;
                vec![CameraEffect::Stop]
            }
            CameraState::Failed => {
                self.state = CameraState::Uninitialized;
                Vec::new()
            }
            _ => Vec::new(),
        }
    }
}
