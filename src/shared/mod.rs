// Shared module
pub mod config;
pub mod database;
pub mod errors;
pub mod middleware;
pub mod rate_limit;
pub mod services;
pub mod utils;

pub use errors::*;
pub use services::*;
