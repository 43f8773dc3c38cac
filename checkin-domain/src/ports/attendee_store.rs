use async_trait::async_trait;

use crate::entities::{IdentitySnapshot, ScanEvent, StatusSnapshot};
use crate::value_objects::AttendeeCode;

/// The spreadsheet-backed attendee API. Writes are serialized on its side.
#[async_trait]
pub trait AttendeeStore: Send + Sync {
    async fn fetch_status(&self, code: &AttendeeCode) -> anyhow::Result<StatusSnapshot>;
    async fn fetch_identity(&self, code: &AttendeeCode) -> anyhow::Result<IdentitySnapshot>;
    /// Fire-and-forget relative to the response body: `Ok` only means the
    /// request left without a transport error.
    async fn submit(&self, event: &ScanEvent) -> anyhow::Result<()>;
}
