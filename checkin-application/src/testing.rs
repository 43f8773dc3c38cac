// In-memory port fakes shared by the application tests

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use checkin_domain::{
    AccessBook, AccessRepository, AttendeeCode, AttendeeStore, CameraDescriptor, CameraPlatform,
    CaptureSession, CaptureSink, CaptureTarget, IdentitySnapshot, RuntimeConfig, ScanEvent,
    StatusSnapshot,
};

pub fn runtime_config() -> RuntimeConfig {
    RuntimeConfig {
        bind_addr: "127.0.0.1:0".to_string(),
        admin_token: Some("secret".to_string()),
        status_url: "http://sheet.invalid/status".to_string(),
        identity_url: "http://sheet.invalid/identity".to_string(),
        request_timeout_seconds: 5,
        step_timeout_seconds: 5,
        lock_safety_seconds: 15,
        camera_enabled: false,
        camera_max_attempts: 3,
        camera_restart_delay_seconds: 2,
        zbarcam_path: "zbarcam".to_string(),
        video_sysfs_dir: "/sys/class/video4linux".to_string(),
        access_book_path: "access.json".to_string(),
        enforce_whitelist: true,
        trust_forwarded_for: false,
        access_request_limit: 5,
        access_request_window_seconds: 600,
        max_body_bytes: 64 * 1024,
    }
}

#[derive(Default)]
pub struct StaticStore {
    pub submitted: Mutex<Vec<ScanEvent>>,
}

#[async_trait]
impl AttendeeStore for StaticStore {
    async fn fetch_status(&self, _code: &AttendeeCode) -> anyhow::Result<StatusSnapshot> {
        Ok(StatusSnapshot::default())
    }

    async fn fetch_identity(&self, _code: &AttendeeCode) -> anyhow::Result<IdentitySnapshot> {
        Ok(IdentitySnapshot {
            firstname: "Jane".to_string(),
            lastname: "Doe".to_string(),
            email: "j@x.com".to_string(),
            timestamp: "2025-05-06".to_string(),
        })
    }

    async fn submit(&self, event: &ScanEvent) -> anyhow::Result<()> {
        self.submitted.lock().unwrap().push(event.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryAccessRepository {
    pub saved: Mutex<Option<AccessBook>>,
    pub fail: bool,
}

#[async_trait]
impl AccessRepository for MemoryAccessRepository {
    async fn load(&self) -> anyhow::Result<AccessBook> {
        Ok(self.saved.lock().unwrap().clone().unwrap_or_default())
    }

    async fn save(&self, book: &AccessBook) -> anyhow::Result<()> {
        if self.fail {
            anyhow::bail!("disk full");
        }
        *self.saved.lock().unwrap() = Some(book.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeCamera {
    sinks: Mutex<Vec<Arc<dyn CaptureSink>>>,
}

impl FakeCamera {
    pub fn emit(&self, text: &str) {
        let sink = self.sinks.lock().unwrap().last().cloned();
        if let Some(sink) = sink {
            sink.decoded(text.to_string());
        }
    }
}

struct IdleSession;

#[async_trait]
impl CaptureSession for IdleSession {
    async fn stop(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

#[async_trait]
impl CameraPlatform for FakeCamera {
    async fn list_cameras(&self) -> anyhow::Result<Vec<CameraDescriptor>> {
        Ok(vec![CameraDescriptor {
            id: "/dev/video0".to_string(),
            label: "Back Camera".to_string(),
        }])
    }

    async fn open(
        &self,
        _target: &CaptureTarget,
        sink: Arc<dyn CaptureSink>,
    ) -> anyhow::Result<Box<dyn CaptureSession>> {
        self.sinks.lock().unwrap().push(sink);
        Ok(Box::new(IdleSession))
    }
}
