//! rc522
//!
//! Pure Rust driver for the NXP MFRC522 contactless reader IC
//! (ISO/IEC 14443 type A), including the Crypto-1 stream cipher needed
//! for MIFARE Classic mutual authentication and block I/O.
//!
//! The crate is layered the way the hardware is: a byte [`transport`]
//! (SPI plus the reset and IRQ lines), the register-level [`device`]
//! engine, the ISO 14443-3 [`picc`] session, and the [`crypto1`] cipher
//! that keys authenticated [`mifare`] traffic. Everything above the
//! transport is hardware-free and test-driven through mocks.
#![warn(missing_docs)]

pub mod constants;
pub mod crypto1;
pub mod device;
pub mod error;
pub mod mifare;
pub mod picc;
pub mod prelude;
pub mod test_support;
pub mod transport;
pub mod types;
pub mod utils;

// Re-export the common types at the crate root so `crate::Error`,
// `crate::Result` and the records in `types` are available directly.
pub use crate::error::*;
pub use crate::types::*;

pub use prelude::*;
