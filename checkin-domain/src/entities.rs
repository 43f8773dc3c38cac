// Domain entities
pub mod access;
pub mod attendee;
pub mod camera;
pub mod config;
pub mod scan_event;
pub mod session;

pub use access::*;
pub use attendee::*;
pub use camera::*;
pub use config::*;
pub use scan_event::*;
pub use session::*;
