//! Convenience re-exports for host applications.

pub use crate::crypto1::{Crypto1, ParityData, Role};
pub use crate::device::{CrcPreset, Mfrc522, PcdDevice};
pub use crate::mifare::{generate_nuid, KeyType, MifareSession};
pub use crate::picc::{crc_a, Iso14443};
pub use crate::transport::Transport;
pub use crate::{Atqa, BlockData, Error, MifareKey, PiccType, Result, Uid};

// Re-export small utilities for convenience
pub use crate::utils::{bytes_to_hex, bytes_to_hex_spaced, ms};
