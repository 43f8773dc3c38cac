pub mod access_handlers;
pub mod admin_handlers;
pub mod camera_handlers;
pub mod ops_handlers;
pub mod scan_handlers;
pub mod station_handlers;
