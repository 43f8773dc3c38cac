use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use checkin_domain::{
    CameraEffect, CameraEvent, CameraMachine, CameraPlatform, CameraPolicy, CameraState,
    CameraStatus, CaptureError, CaptureSession, CaptureSink,
};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::AppError;

pub type DecodeCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Drives the camera state machine against a capture platform. Events are
/// processed one at a time; effects that complete synchronously feed their
/// result back before the next queued event.
pub struct CameraSessionManager {
    machine: Mutex<CameraMachine>,
    serial: tokio::sync::Mutex<()>,
    platform: Arc<dyn CameraPlatform>,
    on_decode: DecodeCallback,
    session: Mutex<Option<Box<dyn CaptureSession>>>,
    generation: AtomicU64,
}

impl CameraSessionManager {
    pub fn new(
        platform: Arc<dyn CameraPlatform>,
        policy: CameraPolicy,
        on_decode: DecodeCallback,
    ) -> Self {
        Self {
            machine: Mutex::new(CameraMachine::new(policy)),
            serial: tokio::sync::Mutex::new(()),
            platform,
            on_decode,
            session: Mutex::new(None),
            generation: AtomicU64::new(0),
        }
    }

    fn machine(&self) -> MutexGuard<'_, CameraMachine> {
        self.machine.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn active_session(&self) -> MutexGuard<'_, Option<Box<dyn CaptureSession>>> {
        self.session.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn status(&self) -> CameraStatus {
        self.machine().status()
    }

    pub fn is_running(&self) -> bool {
        self.machine().state() == CameraState::Running
    }

    pub async fn start(self: &Arc<Self>) -> CameraStatus {
        self.dispatch(CameraEvent::Start).await
    }

    pub async fn retry(self: &Arc<Self>) -> Result<CameraStatus, AppError> {
        if !self.status().retry_available {
            return Err(AppError::Conflict("camera retry is not available".to_string()));
        }
        info!("manual camera retry requested");
        Ok(self.dispatch(CameraEvent::Start).await)
    }

    pub async fn select(self: &Arc<Self>, index: usize) -> Result<CameraStatus, AppError> {
        let count = self.machine().devices().len();
        if index >= count {
            return Err(AppError::BadRequest(format!(
                "camera index {} out of range ({} available)",
                index, count
            )));
        }
        Ok(self.dispatch(CameraEvent::Select(index)).await)
    }

    pub async fn visibility_changed(self: &Arc<Self>, visible: bool) -> CameraStatus {
        if !visible {
            debug!("station hidden");
            return self.status();
        }
        self.dispatch(CameraEvent::VisibilityRegained).await
    }

    pub async fn teardown(self: &Arc<Self>) -> CameraStatus {
        self.dispatch(CameraEvent::Teardown).await
    }

    async fn dispatch(self: &Arc<Self>, event: CameraEvent) -> CameraStatus {
        let _serial = self.serial.lock().await;
        let mut pending = VecDeque::from([event]);
        while let Some(event) = pending.pop_front() {
            let effects = self.machine().handle(event);
            for effect in effects {
                if let Some(next) = self.perform(effect).await {
                    pending.push_back(next);
                }
            }
        }
        self.status()
    }

    async fn perform(self: &Arc<Self>, effect: CameraEffect) -> Option<CameraEvent> {
        match effect {
            CameraEffect::Enumerate => match self.platform.list_cameras().await {
                Ok(devices) => {
                    info!(count = devices.len(), "cameras enumerated");
                    Some(CameraEvent::Listed(devices))
                }
                Err(err) => Some(CameraEvent::ListFailed(err.to_string())),
            },
            CameraEffect::Open(target) => {
                let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
                let sink: Arc<dyn CaptureSink> = Arc::new(SessionSink {
                    generation,
                    manager: Arc::downgrade(self),
                });
                match self.platform.open(&target, sink).await {
                    Ok(session) => {
                        *self.active_session() = Some(session);
                        info!(target = ?target, generation, "camera session running");
                        Some(CameraEvent::Opened)
                    }
                    Err(err) => Some(CameraEvent::OpenFailed(err.to_string())),
                }
            }
            CameraEffect::Stop => {
                self.generation.fetch_add(1, Ordering::SeqCst);
                let session = self.active_session().take();
                if let Some(session) = session {
                    if let Err(err) = session.stop().await {
                        debug!(error = %err, "camera stop failed, ignored");
                    }
                }
                Some(CameraEvent::Stopped)
            }
            CameraEffect::ScheduleRestart(delay) => {
                info!(delay_ms = delay.as_millis() as u64, "camera restart scheduled");
                self.schedule(delay, CameraEvent::RestartDue);
                None
            }
            CameraEffect::ShowRetry => {
                warn!("camera unavailable, manual retry required");
                None
            }
            CameraEffect::LogError(message) => {
                warn!("{}", message);
                None
            }
        }
    }

    fn schedule(self: &Arc<Self>, delay: Duration, event: CameraEvent) {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            sleep(delay).await;
            manager.dispatch(event).await;
        });
    }

    fn is_live(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }
}

struct SessionSink {
    generation: u64,
    manager: Weak<CameraSessionManager>,
}

impl SessionSink {
    fn live_manager(&self) -> Option<Arc<CameraSessionManager>> {
        self.manager
            .upgrade()
            .filter(|manager| manager.is_live(self.generation))
    }
}

impl CaptureSink for SessionSink {
    fn decoded(&self, text: String) {
        if let Some(manager) = self.live_manager() {
            (manager.on_decode)(text);
        }
    }

    fn failed(&self, error: CaptureError) {
        if error == CaptureError::DecodeMiss {
            return;
        }
        if let Some(manager) = self.live_manager() {
            manager.schedule(Duration::ZERO, CameraEvent::Capture(error));
        }
    }
}
