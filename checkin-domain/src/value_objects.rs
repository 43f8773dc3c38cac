// Domain value objects
pub mod attendee_code;
pub mod scan_mode;

pub use attendee_code::*;
pub use scan_mode::*;
