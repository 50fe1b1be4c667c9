pub mod auth;
pub mod client;
pub mod rate_limit;

pub use auth::*;
pub use client::*;
pub use rate_limit::*;
