//! MIFARE Classic authenticated block I/O over a Crypto-1 session, plus
//! NUID derivation for legacy 4-byte-UID hosts.

pub mod wire;

pub use wire::{pack_parity_frame, unpack_parity_frame};

use log::debug;

use crate::constants::{
    MIFARE_ACK, PICC_CMD_MF_AUTH_KEY_A, PICC_CMD_MF_AUTH_KEY_B, PICC_CMD_MF_READ,
    PICC_CMD_MF_WRITE,
};
use crate::crypto1::{Crypto1, ParityData};
use crate::device::registers::ERR_PARITY;
use crate::device::{CrcPreset, PcdDevice};
use crate::picc::Iso14443;
use crate::types::{BlockData, MifareKey, Uid};
use crate::utils::timeout::INTERRUPT_TIMEOUT;
use crate::{Error, Result};

/// Which sector key to authenticate with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyType {
    KeyA,
    KeyB,
}

impl KeyType {
    fn command(self) -> u8 {
        match self {
            KeyType::KeyA => PICC_CMD_MF_AUTH_KEY_A,
            KeyType::KeyB => PICC_CMD_MF_AUTH_KEY_B,
        }
    }
}

/// An authenticated MIFARE Classic session on a selected PICC.
///
/// The cipher state lives from a successful
/// [`authenticate`](MifareSession::authenticate) until
/// [`halt`](MifareSession::halt) or an authentication failure; every
/// frame in between is transciphered through it, parity bits included.
pub struct MifareSession<'d, D: PcdDevice> {
    device: &'d mut D,
    cipher: Option<Crypto1>,
}

impl<'d, D: PcdDevice> MifareSession<'d, D> {
    pub fn new(device: &'d mut D) -> Self {
        Self {
            device,
            cipher: None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.cipher.is_some()
    }

    /// Mutual authentication for the sector containing `block`.
    ///
    /// Sends the AUTH command, receives the card nonce, then runs the
    /// three Crypto-1 stages with `reader_nonce` as the reader-chosen
    /// challenge. On success the session is keyed; on failure the
    /// cipher state is destroyed and the card must be reselected.
    pub fn authenticate(
        &mut self,
        key_type: KeyType,
        block: u8,
        key: &MifareKey,
        uid: &Uid,
        reader_nonce: u32,
    ) -> Result<()> {
        self.cipher = None;

        // AUTH request travels in the clear with hardware parity.
        let mut frame = vec![key_type.command(), block];
        let crc = self
            .device
            .calculate_crc(CrcPreset::Iso14443a, &frame, INTERRUPT_TIMEOUT)?;
        frame.extend_from_slice(&crc);

        let mut valid_bits = 0u8;
        let reply =
            self.device
                .communicate_with_picc(&frame, &mut valid_bits, INTERRUPT_TIMEOUT)?;
        if reply.len() != 4 {
            return Err(Error::Selection {
                expected: 4,
                actual: reply.len(),
            });
        }
        let card_nonce = u32::from_be_bytes([reply[0], reply[1], reply[2], reply[3]]);
        debug!("auth block {:#04x}, card nonce {:08x}", block, card_nonce);

        let mut cipher = Crypto1::reader(key);
        cipher.mutual_1(uid.auth_word(), card_nonce);

        // Everything from here until halt carries explicit parity bits.
        self.device.set_raw_framing(true)?;
        match self.run_challenge_response(&mut cipher, reader_nonce) {
            Ok(()) => {
                self.cipher = Some(cipher);
                Ok(())
            }
            Err(e) => {
                self.device.set_raw_framing(false)?;
                Err(e)
            }
        }
    }

    fn run_challenge_response(&mut self, cipher: &mut Crypto1, reader_nonce: u32) -> Result<()> {
        let mut response = [ParityData::default(); 8];
        response[..4].copy_from_slice(&crate::crypto1::word_to_parity(reader_nonce));
        cipher.mutual_2(&mut response);

        let (frame, mut valid_bits) = pack_parity_frame(&response);
        let reply =
            self.device
                .communicate_with_picc(&frame, &mut valid_bits, INTERRUPT_TIMEOUT)?;

        let units = unpack_parity_frame(&reply, 4)?;
        let mut card_response = [units[0], units[1], units[2], units[3]];
        if !cipher.mutual_3(&mut card_response) {
            debug!("card response mismatch");
            return Err(Error::AuthenticationFailure);
        }
        Ok(())
    }

    /// Read one 16 byte block from the authenticated sector.
    pub fn read_block(&mut self, block: u8) -> Result<BlockData> {
        let reply = self.transcrypted_request(&[PICC_CMD_MF_READ, block], 18)?;

        let plain: Vec<u8> = reply.iter().map(|u| u.data()).collect();
        let crc = self
            .device
            .calculate_crc(CrcPreset::Iso14443a, &plain[..16], INTERRUPT_TIMEOUT)?;
        if crc != [plain[16], plain[17]] {
            return Err(Error::CrcCheck {
                expected: crc,
                actual: [plain[16], plain[17]],
            });
        }

        let mut data = [0u8; 16];
        data.copy_from_slice(&plain[..16]);
        Ok(BlockData::from_bytes(data))
    }

    /// Write one 16 byte block. The PICC acknowledges the command and
    /// the payload separately with a 4-bit code.
    pub fn write_block(&mut self, block: u8, data: &BlockData) -> Result<()> {
        self.transcrypted_command_ack(&[PICC_CMD_MF_WRITE, block])?;
        self.transcrypted_command_ack(data.as_bytes())?;
        Ok(())
    }

    /// End the session: discard the cipher, clear MFCrypto1On, restore
    /// hardware parity and halt the card.
    pub fn halt(&mut self) -> Result<()> {
        self.cipher = None;
        self.device.stop_crypto()?;
        self.device.set_raw_framing(false)?;
        Iso14443::new(&mut *self.device).halt_a()
    }

    /// Encipher `plain` + CRC_A, exchange it, and decipher a reply of
    /// `reply_units` parity units, verifying their parity.
    fn transcrypted_request(
        &mut self,
        plain: &[u8],
        reply_units: usize,
    ) -> Result<Vec<ParityData>> {
        let reply = self.transcrypted_exchange(plain)?;
        let cipher = self
            .cipher
            .as_mut()
            .ok_or_else(|| Error::Usage("no authenticated session".into()))?;

        let mut units = unpack_parity_frame(&reply, reply_units)?;
        cipher.transcrypt(&mut units);
        if units.iter().any(|u| !u.parity_valid()) {
            return Err(Error::Protocol {
                error_bits: ERR_PARITY,
            });
        }
        Ok(units)
    }

    /// Encipher `plain` + CRC_A, exchange it, and decipher the 4-bit
    /// acknowledge nibble. Anything but 0xA rejects the step.
    fn transcrypted_command_ack(&mut self, plain: &[u8]) -> Result<()> {
        let reply = self.transcrypted_exchange(plain)?;
        let cipher = self
            .cipher
            .as_mut()
            .ok_or_else(|| Error::Usage("no authenticated session".into()))?;

        if reply.len() != 1 {
            return Err(Error::Selection {
                expected: 1,
                actual: reply.len(),
            });
        }
        let mut ack = [ParityData::new(reply[0] & 0x0F, 0)];
        cipher.transcrypt_bits(&mut ack, 4);
        let nibble = ack[0].data() & 0x0F;
        if nibble != MIFARE_ACK {
            return Err(Error::WriteRejected { ack: nibble });
        }
        Ok(())
    }

    fn transcrypted_exchange(&mut self, plain: &[u8]) -> Result<Vec<u8>> {
        let cipher = self
            .cipher
            .as_mut()
            .ok_or_else(|| Error::Usage("no authenticated session".into()))?;

        let mut frame = plain.to_vec();
        let crc = self
            .device
            .calculate_crc(CrcPreset::Iso14443a, plain, INTERRUPT_TIMEOUT)?;
        frame.extend_from_slice(&crc);

        let mut units: Vec<ParityData> = frame
            .iter()
            .map(|&b| ParityData::with_odd_parity(b))
            .collect();
        cipher.transcrypt(&mut units);

        let (wire_frame, mut valid_bits) = pack_parity_frame(&units);
        self.device
            .communicate_with_picc(&wire_frame, &mut valid_bits, INTERRUPT_TIMEOUT)
    }
}

/// Derive the 4-byte NUID of a PICC per NXP AN 10927.
///
/// Single-size UIDs are masked directly; double-size UIDs run through
/// two CRC_A passes seeded with the ISO preset. Other lengths have no
/// defined NUID.
pub fn generate_nuid<D: PcdDevice>(uid: &Uid, device: &mut D) -> Result<[u8; 4]> {
    let bytes = uid.as_bytes();
    match bytes.len() {
        4 => Ok([bytes[0] | 0x0F, bytes[1], bytes[2], bytes[3]]),
        7 => {
            let head = device.calculate_crc(CrcPreset::Iso14443a, &bytes[..3], INTERRUPT_TIMEOUT)?;
            let tail = device.calculate_crc(CrcPreset::Iso14443a, &bytes[3..], INTERRUPT_TIMEOUT)?;
            Ok([head[0] | 0x0F, head[1], tail[0], tail[1]])
        }
        n => Err(Error::Usage(format!(
            "wrong uid length {}, expected 4 or 7",
            n
        ))),
    }
}
