// Shared services
pub mod app_state;

pub use app_state::*;
