use std::sync::Arc;
use std::time::Duration;

use checkin_domain::ports::{AccessRepository, AttendeeStore, CameraPlatform};
use checkin_domain::{AccessBook, CameraPolicy, RuntimeConfig};
use tokio::sync::RwLock;

use crate::camera::DecodeCallback;
use crate::scan::ScanSettings;
use crate::{CameraSessionManager, Metrics, RateLimiter, ScanBoard, ScanService};

/// Infrastructure adapters the station is wired against.
pub struct StationPorts {
    pub store: Arc<dyn AttendeeStore>,
    pub camera: Option<Arc<dyn CameraPlatform>>,
    pub access_repo: Arc<dyn AccessRepository>,
}

#[derive(Clone)]
pub struct AppState {
    pub config: RuntimeConfig,
    pub scanner: Arc<ScanService>,
    pub camera: Option<Arc<CameraSessionManager>>,
    pub board: Arc<ScanBoard>,
    pub access_repo: Arc<dyn AccessRepository>,
    pub access_book: Arc<RwLock<AccessBook>>,
    pub request_limiter: Arc<RateLimiter>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(config: RuntimeConfig, ports: StationPorts, access_book: AccessBook) -> Self {
        let metrics = Arc::new(Metrics::default());
        let board = Arc::new(ScanBoard::new());
        let scanner = Arc::new(ScanService::new(
            ports.store,
            Arc::clone(&board),
            Arc::clone(&metrics),
            ScanSettings {
                step_timeout: Duration::from_secs(config.step_timeout_seconds),
                lock_safety: Duration::from_secs(config.lock_safety_seconds),
            },
        ));

        let camera = ports
            .camera
            .filter(|_| config.camera_enabled)
            .map(|platform| {
                let decoder = Arc::clone(&scanner);
                let on_decode: DecodeCallback = Arc::new(move |text| {
                    decoder.accept_camera_decode(text);
                });
                Arc::new(CameraSessionManager::new(
                    platform,
                    CameraPolicy {
                        max_attempts: config.camera_max_attempts,
                        restart_delay: Duration::from_secs(config.camera_restart_delay_seconds),
                    },
                    on_decode,
                ))
            });

        let request_limiter = Arc::new(RateLimiter::new(
            config.access_request_limit,
            Duration::from_secs(config.access_request_window_seconds),
        ));

        Self {
            config,
            scanner,
            camera,
            board,
            access_repo: ports.access_repo,
            access_book: Arc::new(RwLock::new(access_book)),
            request_limiter,
            metrics,
        }
    }
}
