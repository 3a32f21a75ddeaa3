use crate::constants::{MIFARE_BLOCK_SIZE, MIFARE_KEY_SIZE};
use crate::Error;
use std::convert::TryFrom;

/// PICC type derived from the SAK byte, per NXP AN 10833.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PiccType {
    Unknown,
    /// PICC compliant with ISO/IEC 14443-4
    Iso14443_4,
    /// PICC compliant with ISO/IEC 18092 (NFC)
    Iso18092,
    /// MIFARE Classic protocol, 320 bytes
    MifareMini,
    /// MIFARE Classic protocol, 1KB
    Mifare1K,
    /// MIFARE Classic protocol, 4KB
    Mifare4K,
    /// MIFARE Ultralight or Ultralight C
    MifareUl,
    /// MIFARE Plus
    MifarePlus,
    /// MIFARE DESFire
    MifareDesfire,
    /// Only mentioned in NXP AN 10833 MIFARE Type Identification Procedure
    Tnp3xxx,
    /// SAK indicates the UID is not complete
    NotComplete,
}

impl PiccType {
    /// Classify a PICC from its SAK byte. Bit 7 is reserved for future use.
    pub fn from_sak(sak: u8) -> Self {
        match sak & 0x7F {
            0x04 => PiccType::NotComplete,
            0x09 => PiccType::MifareMini,
            0x08 => PiccType::Mifare1K,
            0x18 => PiccType::Mifare4K,
            0x00 => PiccType::MifareUl,
            0x10 | 0x11 => PiccType::MifarePlus,
            0x01 => PiccType::Tnp3xxx,
            0x20 => PiccType::Iso14443_4,
            0x40 => PiccType::Iso18092,
            _ => PiccType::Unknown,
        }
    }

    /// True for the MIFARE Classic family that speaks Crypto-1.
    pub fn is_mifare_classic(&self) -> bool {
        matches!(
            self,
            PiccType::MifareMini | PiccType::Mifare1K | PiccType::Mifare4K
        )
    }
}

/// The UID of a selected PICC: 4, 7 or 10 bytes plus the SAK.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Uid {
    bytes: Vec<u8>,
    sak: u8,
}

impl Uid {
    /// Build a UID record, enforcing the 4/7/10 byte invariant.
    pub fn new(bytes: Vec<u8>, sak: u8) -> crate::Result<Self> {
        match bytes.len() {
            4 | 7 | 10 => Ok(Self { bytes, sak }),
            n => Err(Error::Usage(format!(
                "uid length {} not in {{4, 7, 10}}",
                n
            ))),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn sak(&self) -> u8 {
        self.sak
    }

    pub fn pic_type(&self) -> PiccType {
        PiccType::from_sak(self.sak)
    }

    /// The last four UID bytes as a big-endian word. This is the value
    /// MIFARE Classic authentication mixes into the cipher IV (AN 10927
    /// section 3.2.5 uses the trailing bytes for double/triple UIDs).
    pub fn auth_word(&self) -> u32 {
        let b = &self.bytes[self.bytes.len() - 4..];
        u32::from_be_bytes([b[0], b[1], b[2], b[3]])
    }

    pub fn to_hex(&self) -> String {
        crate::utils::bytes_to_hex(&self.bytes)
    }
}

impl TryFrom<&[u8]> for Uid {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Uid::new(bytes.to_vec(), 0)
    }
}

/// Answer To reQuest, Type A (2 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Atqa([u8; 2]);

impl Atqa {
    pub fn from_bytes(bytes: [u8; 2]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 2] {
        &self.0
    }
}

/// MIFARE Classic sector key (6 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MifareKey([u8; MIFARE_KEY_SIZE]);

impl MifareKey {
    /// The transport key all sectors carry at chip delivery.
    pub const DEFAULT: Self = Self([0xFF; MIFARE_KEY_SIZE]);

    pub fn from_bytes(bytes: [u8; MIFARE_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; MIFARE_KEY_SIZE] {
        &self.0
    }

    /// The key as a 48-bit word in the written order, key[0] most
    /// significant (the order keys are printed in data sheets).
    pub fn to_word(&self) -> u64 {
        self.0.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64)
    }
}

impl TryFrom<&[u8]> for MifareKey {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        if bytes.len() != MIFARE_KEY_SIZE {
            return Err(Error::Usage(format!(
                "key length {} != {}",
                bytes.len(),
                MIFARE_KEY_SIZE
            )));
        }
        let mut arr = [0u8; MIFARE_KEY_SIZE];
        arr.copy_from_slice(bytes);
        Ok(Self(arr))
    }
}

/// One 16 byte MIFARE Classic block payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockData([u8; MIFARE_BLOCK_SIZE]);

impl BlockData {
    pub fn from_bytes(bytes: [u8; MIFARE_BLOCK_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; MIFARE_BLOCK_SIZE] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        crate::utils::bytes_to_hex_spaced(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sak_classification_table() {
        assert_eq!(PiccType::from_sak(0x04), PiccType::NotComplete);
        assert_eq!(PiccType::from_sak(0x09), PiccType::MifareMini);
        assert_eq!(PiccType::from_sak(0x08), PiccType::Mifare1K);
        assert_eq!(PiccType::from_sak(0x18), PiccType::Mifare4K);
        assert_eq!(PiccType::from_sak(0x00), PiccType::MifareUl);
        assert_eq!(PiccType::from_sak(0x10), PiccType::MifarePlus);
        assert_eq!(PiccType::from_sak(0x11), PiccType::MifarePlus);
        assert_eq!(PiccType::from_sak(0x01), PiccType::Tnp3xxx);
        assert_eq!(PiccType::from_sak(0x20), PiccType::Iso14443_4);
        assert_eq!(PiccType::from_sak(0x40), PiccType::Iso18092);
        assert_eq!(PiccType::from_sak(0x7F), PiccType::Unknown);
    }

    #[test]
    fn sak_bit7_is_masked() {
        assert_eq!(PiccType::from_sak(0x88), PiccType::Mifare1K);
    }

    #[test]
    fn uid_length_invariant() {
        assert!(Uid::new(vec![1, 2, 3, 4], 0x08).is_ok());
        assert!(Uid::new(vec![1, 2, 3, 4, 5, 6, 7], 0x00).is_ok());
        assert!(Uid::new(vec![1; 10], 0x00).is_ok());
        assert!(Uid::new(vec![1, 2, 3], 0x08).is_err());
        assert!(Uid::new(vec![1; 5], 0x08).is_err());
    }

    #[test]
    fn uid_auth_word_uses_trailing_bytes() {
        let single = Uid::new(vec![0xB4, 0x79, 0xF7, 0xD7], 0x08).unwrap();
        assert_eq!(single.auth_word(), 0xB479F7D7);

        let double = Uid::new(vec![0x01, 0x02, 0x03, 0xB4, 0x79, 0xF7, 0xD7], 0x00).unwrap();
        assert_eq!(double.auth_word(), 0xB479F7D7);
    }

    #[test]
    fn mifare_key_word_order() {
        let key = MifareKey::from_bytes([0xA0, 0xA1, 0xA2, 0xA3, 0xA4, 0xA5]);
        assert_eq!(key.to_word(), 0xA0A1_A2A3_A4A5);
        assert_eq!(MifareKey::DEFAULT.to_word(), 0xFFFF_FFFF_FFFF);
    }

    #[test]
    fn mifare_key_try_from_rejects_short() {
        assert!(MifareKey::try_from(&[0u8; 5][..]).is_err());
        assert!(MifareKey::try_from(&[0u8; 6][..]).is_ok());
    }
}
