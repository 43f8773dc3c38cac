// Pure domain services
pub mod camera_machine;
pub mod projection;
pub mod scan_lock;
pub mod validator;

pub use camera_machine::*;
pub use projection::*;
pub use scan_lock::*;
pub use validator::*;
