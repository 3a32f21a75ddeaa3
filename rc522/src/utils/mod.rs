//! Small, reusable helpers used across the crate: hex dumps for debug
//! logging and the shared timeout defaults.

pub mod hex;
pub mod timeout;

pub use hex::*;
pub use timeout::*;
