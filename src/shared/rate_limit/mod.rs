pub mod limiter;
pub mod policy;

pub use limiter::*;
pub use policy::*;
