pub mod gate;
pub mod service;

pub use gate::*;
pub use service::*;
