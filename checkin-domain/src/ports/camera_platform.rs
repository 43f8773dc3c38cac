use std::sync::Arc;

use async_trait::async_trait;

use crate::entities::{CameraDescriptor, CaptureTarget};
use crate::error::CaptureError;

/// Decode and error callbacks bound to one capture session.
pub trait CaptureSink: Send + Sync {
    fn decoded(&self, text: String);
    fn failed(&self, error: CaptureError);
}

#[async_trait]
pub trait CaptureSession: Send + Sync {
    async fn stop(&self) -> anyhow::Result<()>;
}

#[async_trait]
pub trait CameraPlatform: Send + Sync {
    async fn list_cameras(&self) -> anyhow::Result<Vec<CameraDescriptor>>;
    async fn open(
        &self,
        target: &CaptureTarget,
        sink: Arc<dyn CaptureSink>,
    ) -> anyhow::Result<Box<dyn CaptureSession>>;
}
