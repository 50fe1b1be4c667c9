// Shared utilities
pub mod clock;
pub mod logging;
pub mod validation;

pub use clock::*;
pub use logging::mask_sensitive;
pub use validation::*;
