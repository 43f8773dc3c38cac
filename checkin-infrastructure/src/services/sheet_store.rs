use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use checkin_domain::{
    AttendeeCode, AttendeeStore, IdentitySnapshot, RuntimeConfig, ScanEvent, StatusSnapshot,
};

const UNKNOWN_ERROR: &str = "Unknown error";

/// `{ success, message?, data? }` wrapper the spreadsheet web app answers with.
#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    fn into_result(self) -> Result<T> {
        if !self.success {
            let message = self
                .message
                .map(|text| text.trim().to_string())
                .filter(|text| !text.is_empty())
                .unwrap_or_else(|| UNKNOWN_ERROR.to_string());
            return Err(anyhow!(message));
        }
        self.data.ok_or_else(|| anyhow!("response carried no data"))
    }
}

/// Attendee store backed by the spreadsheet web app endpoints.
pub struct SheetAttendeeStore {
    client: Client,
    status_url: String,
    identity_url: String,
}

impl SheetAttendeeStore {
    pub fn new(config: &RuntimeConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds.max(1)))
            .build()?;
        Ok(Self {
            client,
            status_url: config.status_url.clone(),
            identity_url: config.identity_url.clone(),
        })
    }

    async fn fetch<T: DeserializeOwned>(&self, url: &str, code: &AttendeeCode) -> Result<T> {
        let response = self
            .client
            .get(url)
            .query(&[("code", code.as_str())])
            .send()
            .await?;
        let status = response.status();
        match response.json::<ApiEnvelope<T>>().await {
            Ok(envelope) => envelope.into_result(),
            Err(_) if !status.is_success() => Err(anyhow!("attendee api responded {}", status)),
            Err(err) => Err(anyhow!("malformed attendee api response: {}", err)),
        }
    }
}

#[async_trait]
impl AttendeeStore for SheetAttendeeStore {
    async fn fetch_status(&self, code: &AttendeeCode) -> Result<StatusSnapshot> {
        self.fetch(&self.status_url, code).await
    }

    async fn fetch_identity(&self, code: &AttendeeCode) -> Result<IdentitySnapshot> {
        self.fetch(&self.identity_url, code).await
    }

    async fn submit(&self, event: &ScanEvent) -> Result<()> {
        let response = self.client.post(&self.status_url).json(event).send().await?;
        debug!(code = %event.code, status = %response.status(), "scan event posted");
        Ok(())
    }
}
