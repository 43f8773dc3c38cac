use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use tokio::fs;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info};

use checkin_domain::{
    CameraDescriptor, CameraPlatform, CaptureError, CaptureSession, CaptureSink, CaptureTarget,
    RuntimeConfig,
};

const STARTUP_GRACE: Duration = Duration::from_millis(500);

/// Capture platform built on `zbarcam`: video4linux devices are listed from
/// sysfs and every session is one `zbarcam --raw --nodisplay` process whose
/// stdout lines are decoded codes.
pub struct ZbarCameraPlatform {
    binary: String,
    sysfs_dir: PathBuf,
    startup_grace: Duration,
}

impl ZbarCameraPlatform {
    pub fn new(config: &RuntimeConfig) -> Self {
        Self {
            binary: config.zbarcam_path.clone(),
            sysfs_dir: PathBuf::from(&config.video_sysfs_dir),
            startup_grace: STARTUP_GRACE,
        }
    }

    fn command(&self, target: &CaptureTarget) -> Command {
        let mut command = Command::new(&self.binary);
        command.arg("--raw").arg("--nodisplay");
        if let CaptureTarget::Device(device) = target {
            command.arg(device);
        }
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }
}

#[async_trait]
impl CameraPlatform for ZbarCameraPlatform {
    async fn list_cameras(&self) -> Result<Vec<CameraDescriptor>> {
        let mut entries = fs::read_dir(&self.sysfs_dir)
            .await
            .with_context(|| format!("list {}", self.sysfs_dir.display()))?;
        let mut devices = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let node = entry.file_name().to_string_lossy().to_string();
            if !node.starts_with("video") {
                continue;
            }
            let label = fs::read_to_string(entry.path().join("name"))
                .await
                .map(|name| name.trim().to_string())
                .ok()
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| node.clone());
            devices.push(CameraDescriptor {
                id: format!("/dev/{}", node),
                label,
            });
        }
        devices.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(devices)
    }

    async fn open(
        &self,
        target: &CaptureTarget,
        sink: Arc<dyn CaptureSink>,
    ) -> Result<Box<dyn CaptureSession>> {
        let mut child = self
            .command(target)
            .spawn()
            .with_context(|| format!("spawn {}", self.binary))?;

        if let Ok(status) = timeout(self.startup_grace, child.wait()).await {
            let status = status?;
            return Err(anyhow!("{} exited during startup ({})", self.binary, status));
        }

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow!("zbarcam stdout unavailable"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| anyhow!("zbarcam stderr unavailable"))?;

        let decode_sink = Arc::clone(&sink);
        let decoder = tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let text = line.trim();
                        if text.is_empty() {
                            decode_sink.failed(CaptureError::DecodeMiss);
                        } else {
                            decode_sink.decoded(text.to_string());
                        }
                    }
                    Ok(None) => {
                        decode_sink.failed(CaptureError::StreamInterrupted(
                            "zbarcam output closed".to_string(),
                        ));
                        break;
                    }
                    Err(err) => {
                        decode_sink.failed(CaptureError::StreamInterrupted(err.to_string()));
                        break;
                    }
                }
            }
        });

        let diagnostics = tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                let text = line.trim();
                if !text.is_empty() {
                    sink.failed(CaptureError::Other(text.to_string()));
                }
            }
        });

        info!(target = ?target, pid = child.id(), "zbarcam session started");
        Ok(Box::new(ZbarSession {
            child: Mutex::new(child),
            readers: vec![decoder, diagnostics],
        }))
    }
}

struct ZbarSession {
    child: Mutex<Child>,
    readers: Vec<JoinHandle<()>>,
}

#[async_trait]
impl CaptureSession for ZbarSession {
    async fn stop(&self) -> Result<()> {
        let mut child = self.child.lock().await;
        let result = child.kill().await;
        for reader in &self.readers {
            reader.abort();
        }
        debug!("zbarcam session stopped");
        result.map_err(Into::into)
    }
}
