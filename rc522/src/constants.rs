//! ISO 14443-3 / MIFARE command bytes and other protocol constants

/// REQuest command, Type A. Invites PICCs in state IDLE to go to READY
/// and prepare for anticollision or selection. 7 bit frame.
pub const PICC_CMD_REQA: u8 = 0x26;

/// Wake-UP command, Type A. Invites PICCs in state IDLE and HALT to go
/// to READY(*) and prepare for anticollision or selection. 7 bit frame.
pub const PICC_CMD_WUPA: u8 = 0x52;

/// HaLT command, Type A. Instructs an ACTIVE PICC to go to state HALT.
pub const PICC_CMD_HLTA: u8 = 0x50;

/// Cascade Tag. Not really a command, but used during anti collision.
pub const PICC_CMD_CT: u8 = 0x88;

/// Anti collision/Select, Cascade Level 1
pub const PICC_CMD_SEL_CL1: u8 = 0x93;
/// Anti collision/Select, Cascade Level 2
pub const PICC_CMD_SEL_CL2: u8 = 0x95;
/// Anti collision/Select, Cascade Level 3
pub const PICC_CMD_SEL_CL3: u8 = 0x97;

/// Perform MIFARE Classic authentication with key A
pub const PICC_CMD_MF_AUTH_KEY_A: u8 = 0x60;
/// Perform MIFARE Classic authentication with key B
pub const PICC_CMD_MF_AUTH_KEY_B: u8 = 0x61;
/// Read one 16 byte block from the authenticated sector
pub const PICC_CMD_MF_READ: u8 = 0x30;
/// Write one 16 byte block to the authenticated sector
pub const PICC_CMD_MF_WRITE: u8 = 0xA0;

/// NVB value requesting the full UID of the current cascade level
pub const SEL_NVB_ALL: u8 = 0x20;
/// NVB value announcing that all UID bits of the level are transmitted
pub const SEL_NVB_COMPLETE: u8 = 0x70;

/// The 4-bit ACK nibble a MIFARE Classic PICC answers a write step with
pub const MIFARE_ACK: u8 = 0x0A;

/// MIFARE Classic sector key length in bytes
pub const MIFARE_KEY_SIZE: usize = 6;

/// MIFARE Classic block payload length in bytes
pub const MIFARE_BLOCK_SIZE: usize = 16;

/// VersionReg value for MFRC522 silicon revision 1.0
pub const VERSION_1_0: u8 = 0x91;
/// VersionReg value for MFRC522 silicon revision 2.0
pub const VERSION_2_0: u8 = 0x92;

/// MFRC522 FIFO depth in bytes
pub const FIFO_SIZE: usize = 64;
