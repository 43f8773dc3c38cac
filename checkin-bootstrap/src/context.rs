use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use checkin_application::{AppState, StationPorts};
use checkin_domain::{AccessRepository, CameraPlatform};
use checkin_infrastructure::{
    AppConfig, JsonAccessRepository, SheetAttendeeStore, ZbarCameraPlatform,
};

pub struct AppContext {
    pub state: AppState,
}

impl AppContext {
    pub async fn new(config: &AppConfig) -> Result<Self> {
        let runtime_config = config.to_runtime_config();

        let store = Arc::new(SheetAttendeeStore::new(&runtime_config)?);
        let access_repo = Arc::new(JsonAccessRepository::new(&runtime_config.access_book_path));
        let access_book = access_repo.load().await?;
        info!(
            path = %access_repo.path().display(),
            whitelist = access_book.whitelist.len(),
            requests = access_book.requests.len(),
            "access book loaded"
        );

        let camera: Option<Arc<dyn CameraPlatform>> = if runtime_config.camera_enabled {
            Some(Arc::new(ZbarCameraPlatform::new(&runtime_config)))
        } else {
            None
        };

        let state = AppState::new(
            runtime_config,
            StationPorts {
                store,
                camera,
                access_repo,
            },
            access_book,
        );
        Ok(Self { state })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(dir: &std::path::Path, camera: bool) -> AppConfig {
        let mut config = AppConfig::default();
        config.status_url = "http://127.0.0.1:9/status".to_string();
        config.identity_url = "http://127.0.0.1:9/identity".to_string();
        config.access_book_path = dir.join("access_book.json").to_string_lossy().to_string();
        config.camera_enabled = camera;
        config
    }

    #[tokio::test]
    async fn wires_state_from_config() {
        let dir = tempfile::tempdir().expect("tempdir");
        let book = r#"{ "whitelist": [{ "ip": "10.0.0.2", "addedAt": 1 }], "requests": [] }"#;
        std::fs::write(dir.path().join("access_book.json"), book).expect("write");

        let context = AppContext::new(&config(dir.path(), true))
            .await
            .expect("context");

        assert!(context.state.camera.is_some());
        assert_eq!(context.state.access_book.read().await.whitelist.len(), 1);
    }

    #[tokio::test]
    async fn camera_disabled_leaves_no_manager() {
        let dir = tempfile::tempdir().expect("tempdir");
        let context = AppContext::new(&config(dir.path(), false))
            .await
            .expect("context");
        assert!(context.state.camera.is_none());
    }
}
