// Repository and Service Port Traits (Interfaces)
// Define what the domain needs from infrastructure

pub mod attendee_store;
pub mod camera_platform;
pub mod repositories;

pub use attendee_store::*;
pub use camera_platform::*;
pub use repositories::*;
