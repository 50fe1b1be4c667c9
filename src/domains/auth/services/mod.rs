// Auth domain services
pub mod auth_service;
pub mod jwt_service;
pub mod password;
pub mod state;
pub mod user_service;

pub use auth_service::*;
pub use jwt_service::*;
pub use password::*;
pub use state::*;
pub use user_service::*;
