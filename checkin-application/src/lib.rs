// Check-in Station Application Layer

pub mod camera;
pub mod commands;
pub mod error;
pub mod metrics;
pub mod ops;
pub mod queries;
pub mod scan;
pub mod state;

#[cfg(test)]
mod testing;

pub use camera::CameraSessionManager;
pub use error::AppError;
pub use metrics::Metrics;
pub use ops::{RateLimiter, ScanBoard};
pub use scan::{ScanGate, ScanService};
pub use state::{AppState, StationPorts};
