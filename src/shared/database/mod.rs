// Credential store: trait, Postgres and in-memory implementations
pub mod connection;
pub mod memory;
pub mod postgres;
pub mod repositories;
pub mod store;

pub use connection::*;
pub use memory::*;
pub use postgres::*;
pub use repositories::*;
pub use store::*;
