pub mod board_hub;
pub mod rate_limiter;

pub use board_hub::*;
pub use rate_limiter::*;
