pub mod sheet_store;
pub mod zbar_camera;

pub use sheet_store::*;
pub use zbar_camera::*;
