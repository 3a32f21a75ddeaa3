//! Test support helpers shared by unit and integration tests: a
//! scripted [`MockPcd`], a Crypto-1 card-role simulator that exercises
//! the full authenticated wire path without hardware, and a parser for
//! the `"7C 1! 74 1 ..."` trace notation the cipher fixtures use.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use crate::constants::{
    MIFARE_ACK, PICC_CMD_HLTA, PICC_CMD_MF_AUTH_KEY_A, PICC_CMD_MF_AUTH_KEY_B, PICC_CMD_MF_READ,
    PICC_CMD_MF_WRITE,
};
use crate::crypto1::{Crypto1, ParityData};
use crate::device::registers::ERR_PARITY;
use crate::device::{CrcPreset, PcdDevice};
use crate::mifare::wire::{pack_parity_frame, unpack_parity_frame};
use crate::picc::crc::crc_a_with_preset;
use crate::types::{MifareKey, Uid};
use crate::{Error, Result};

/// How a scripted PCD computes CRC_A.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CrcMode {
    /// The real function, seeded with the requested preset.
    #[default]
    Software,
    /// Echo the first two input bytes (the NUID derivation stub).
    FirstTwoBytes,
}

/// Scripted reader device: records transmitted frames and replays
/// queued replies, like the transport mock one layer further up.
#[derive(Default)]
pub struct MockPcd {
    /// Frames passed to `communicate_with_picc` with their TxLastBits.
    pub sent: Vec<(Vec<u8>, u8)>,
    /// Queued outcomes: reply bytes plus RxLastBits, or an error.
    pub replies: VecDeque<Result<(Vec<u8>, u8)>>,
    /// Queued answers for `collision_occurred` (false when exhausted).
    pub collisions: VecDeque<bool>,
    pub crc_mode: CrcMode,
    pub raw_framing: bool,
    pub crypto_stopped: bool,
}

impl MockPcd {
    pub fn new(crc_mode: CrcMode) -> Self {
        Self {
            crc_mode,
            ..Self::default()
        }
    }

    pub fn push_reply(&mut self, data: Vec<u8>, valid_bits: u8) {
        self.replies.push_back(Ok((data, valid_bits)));
    }

    pub fn push_error(&mut self, error: Error) {
        self.replies.push_back(Err(error));
    }
}

impl PcdDevice for MockPcd {
    fn init(&mut self) -> Result<()> {
        Ok(())
    }

    fn reset(&mut self) -> Result<()> {
        Ok(())
    }

    fn self_test(&mut self) -> Result<()> {
        Ok(())
    }

    fn antenna_on(&mut self) -> Result<()> {
        Ok(())
    }

    fn antenna_off(&mut self) -> Result<()> {
        Ok(())
    }

    fn communicate_with_picc(
        &mut self,
        data: &[u8],
        valid_bits: &mut u8,
        _timeout: Duration,
    ) -> Result<Vec<u8>> {
        self.sent.push((data.to_vec(), *valid_bits));
        match self.replies.pop_front() {
            Some(Ok((reply, rx_bits))) => {
                if *valid_bits > 0 {
                    *valid_bits = rx_bits;
                }
                Ok(reply)
            }
            Some(Err(e)) => Err(e),
            None => Err(Error::Timeout),
        }
    }

    fn collision_occurred(&mut self) -> Result<bool> {
        Ok(self.collisions.pop_front().unwrap_or(false))
    }

    fn calculate_crc(
        &mut self,
        preset: CrcPreset,
        data: &[u8],
        _timeout: Duration,
    ) -> Result<[u8; 2]> {
        match self.crc_mode {
            CrcMode::Software => Ok(crc_a_with_preset(preset.value(), data)),
            CrcMode::FirstTwoBytes => {
                if data.len() < 2 {
                    Ok([0x00, 0x00])
                } else {
                    Ok([data[0], data[1]])
                }
            }
        }
    }

    fn set_raw_framing(&mut self, enabled: bool) -> Result<()> {
        self.raw_framing = enabled;
        Ok(())
    }

    fn stop_crypto(&mut self) -> Result<()> {
        self.crypto_stopped = true;
        Ok(())
    }
}

/// A MIFARE Classic card simulated behind the PCD interface.
///
/// It answers AUTH requests with its nonce, runs the card side of the
/// Crypto-1 handshake, and serves enciphered block reads and writes, so
/// the reader-side session code can be exercised end to end in memory.
pub struct MifareCardSim {
    key: MifareKey,
    uid: Uid,
    nonce: u32,
    blocks: HashMap<u8, [u8; 16]>,
    cipher: Option<Crypto1>,
    auth_pending: bool,
    raw_framing: bool,
    pending_write: Option<u8>,
    /// Flip a bit in the stage 3 response to provoke an
    /// authentication failure on the reader side.
    pub corrupt_card_response: bool,
    pub halted: bool,
}

impl MifareCardSim {
    pub fn new(key: MifareKey, uid: Uid, nonce: u32) -> Self {
        Self {
            key,
            uid,
            nonce,
            blocks: HashMap::new(),
            cipher: None,
            auth_pending: false,
            raw_framing: false,
            pending_write: None,
            corrupt_card_response: false,
            halted: false,
        }
    }

    pub fn set_block(&mut self, block: u8, data: [u8; 16]) {
        self.blocks.insert(block, data);
    }

    pub fn block(&self, block: u8) -> [u8; 16] {
        self.blocks.get(&block).copied().unwrap_or([0u8; 16])
    }

    fn crc(&self, data: &[u8]) -> [u8; 2] {
        crc_a_with_preset(0x6363, data)
    }

    fn check_crc(&self, frame: &[u8]) -> Result<()> {
        let (payload, crc) = frame.split_at(frame.len() - 2);
        let expected = self.crc(payload);
        if crc != expected {
            return Err(Error::CrcCheck {
                expected,
                actual: [crc[0], crc[1]],
            });
        }
        Ok(())
    }

    /// Decode an incoming raw frame into parity units, using the frame
    /// length and TxLastBits to recover the unit count.
    fn decode_units(&self, data: &[u8], valid_bits: u8) -> Result<Vec<ParityData>> {
        if data.is_empty() {
            return Err(Error::Protocol {
                error_bits: ERR_PARITY,
            });
        }
        let total_bits = if valid_bits > 0 {
            (data.len() - 1) * 8 + valid_bits as usize
        } else {
            data.len() * 8
        };
        if total_bits % 9 != 0 {
            return Err(Error::Protocol {
                error_bits: ERR_PARITY,
            });
        }
        unpack_parity_frame(data, total_bits / 9)
    }

    fn handshake(&mut self, data: &[u8], valid_bits: &mut u8) -> Result<Vec<u8>> {
        let mut units = self.decode_units(data, *valid_bits)?;
        if units.len() != 8 {
            return Err(Error::Timeout);
        }
        let mut response = [units[0], units[1], units[2], units[3], units[4], units[5],
            units[6], units[7]];
        let cipher = self.cipher.as_mut().ok_or(Error::Timeout)?;
        if !cipher.mutual_2(&mut response) {
            // A card that rejects the reader response stays silent.
            self.cipher = None;
            return Err(Error::Timeout);
        }

        let mut card_response = [ParityData::default(); 4];
        cipher.mutual_3(&mut card_response);
        if self.corrupt_card_response {
            card_response[0].0 ^= 0x01;
        }

        units.clear();
        units.extend_from_slice(&card_response);
        let (reply, rx_bits) = pack_parity_frame(&units);
        if *valid_bits > 0 {
            *valid_bits = rx_bits;
        }
        self.auth_pending = false;
        Ok(reply)
    }

    fn serve_encrypted(&mut self, data: &[u8], valid_bits: &mut u8) -> Result<Vec<u8>> {
        let mut units = self.decode_units(data, *valid_bits)?;
        let Some(cipher) = self.cipher.as_mut() else {
            return Err(Error::Timeout);
        };
        cipher.transcrypt(&mut units);
        if units.iter().any(|u| !u.parity_valid()) {
            return Err(Error::Protocol {
                error_bits: ERR_PARITY,
            });
        }
        let plain: Vec<u8> = units.iter().map(|u| u.data()).collect();

        if let Some(block) = self.pending_write.take() {
            // 16 byte payload plus CRC_A.
            if plain.len() != 18 {
                return Err(Error::Timeout);
            }
            self.check_crc(&plain)?;
            let mut stored = [0u8; 16];
            stored.copy_from_slice(&plain[..16]);
            self.blocks.insert(block, stored);
            return self.ack(valid_bits);
        }

        self.check_crc(&plain)?;
        match plain[0] {
            PICC_CMD_MF_READ => {
                let mut reply_plain = self.block(plain[1]).to_vec();
                let crc = self.crc(&reply_plain);
                reply_plain.extend_from_slice(&crc);

                let cipher = self.cipher.as_mut().ok_or(Error::Timeout)?;
                let mut reply_units: Vec<ParityData> = reply_plain
                    .iter()
                    .map(|&b| ParityData::with_odd_parity(b))
                    .collect();
                cipher.transcrypt(&mut reply_units);
                let (reply, rx_bits) = pack_parity_frame(&reply_units);
                if *valid_bits > 0 {
                    *valid_bits = rx_bits;
                }
                Ok(reply)
            }
            PICC_CMD_MF_WRITE => {
                self.pending_write = Some(plain[1]);
                self.ack(valid_bits)
            }
            _ => Err(Error::Timeout),
        }
    }

    fn ack(&mut self, valid_bits: &mut u8) -> Result<Vec<u8>> {
        let cipher = self.cipher.as_mut().ok_or(Error::Timeout)?;
        let mut ack = [ParityData::new(MIFARE_ACK, 0)];
        cipher.transcrypt_bits(&mut ack, 4);
        if *valid_bits > 0 {
            *valid_bits = 4;
        }
        Ok(vec![ack[0].data() & 0x0F])
    }
}

impl PcdDevice for MifareCardSim {
    fn init(&mut self) -> Result<()> {
        Ok(())
    }

    fn reset(&mut self) -> Result<()> {
        Ok(())
    }

    fn self_test(&mut self) -> Result<()> {
        Ok(())
    }

    fn antenna_on(&mut self) -> Result<()> {
        Ok(())
    }

    fn antenna_off(&mut self) -> Result<()> {
        Ok(())
    }

    fn communicate_with_picc(
        &mut self,
        data: &[u8],
        valid_bits: &mut u8,
        _timeout: Duration,
    ) -> Result<Vec<u8>> {
        if self.raw_framing {
            if self.auth_pending {
                return self.handshake(data, valid_bits);
            }
            return self.serve_encrypted(data, valid_bits);
        }

        match data.first().copied() {
            Some(cmd) if cmd == PICC_CMD_MF_AUTH_KEY_A || cmd == PICC_CMD_MF_AUTH_KEY_B => {
                self.check_crc(data)?;
                let mut cipher = Crypto1::card(&self.key);
                cipher.mutual_1(self.uid.auth_word(), self.nonce);
                self.cipher = Some(cipher);
                self.auth_pending = true;
                Ok(self.nonce.to_be_bytes().to_vec())
            }
            Some(PICC_CMD_HLTA) => {
                self.halted = true;
                Err(Error::Timeout)
            }
            _ => Err(Error::Timeout),
        }
    }

    fn collision_occurred(&mut self) -> Result<bool> {
        Ok(false)
    }

    fn calculate_crc(
        &mut self,
        preset: CrcPreset,
        data: &[u8],
        _timeout: Duration,
    ) -> Result<[u8; 2]> {
        Ok(crc_a_with_preset(preset.value(), data))
    }

    fn set_raw_framing(&mut self, enabled: bool) -> Result<()> {
        self.raw_framing = enabled;
        Ok(())
    }

    fn stop_crypto(&mut self) -> Result<()> {
        self.cipher = None;
        Ok(())
    }
}

/// Parse the `"7C 1! 74 1 ..."` notation of the cipher fixtures: hex
/// byte, then its transmitted parity bit. A trailing `!` marks slots
/// whose enciphered parity differs from the byte's own odd parity.
pub fn parse_parity_fixture(s: &str) -> Vec<ParityData> {
    let tokens: Vec<&str> = s.split_whitespace().collect();
    tokens
        .chunks(2)
        .map(|pair| {
            let data = u8::from_str_radix(pair[0], 16).expect("hex byte in fixture");
            let parity: u8 = pair[1].trim_end_matches('!').parse().expect("parity bit");
            ParityData::new(data, parity)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_parser_reads_bytes_and_parities() {
        let units = parse_parity_fixture("7C 1! 74 1 07 1! EB 1");
        assert_eq!(units.len(), 4);
        assert_eq!(units[0].data(), 0x7C);
        assert_eq!(units[0].parity(), 1);
        assert_eq!(units[2].data(), 0x07);
        assert_eq!(units[3].parity(), 1);
    }

    #[test]
    fn mock_pcd_replays_and_times_out() {
        let mut pcd = MockPcd::new(CrcMode::Software);
        pcd.push_reply(vec![0x04, 0x00], 0);
        let mut vb = 7u8;
        let r = pcd
            .communicate_with_picc(&[0x26], &mut vb, Duration::from_millis(1))
            .unwrap();
        assert_eq!(r, vec![0x04, 0x00]);
        assert!(matches!(
            pcd.communicate_with_picc(&[0x26], &mut vb, Duration::from_millis(1)),
            Err(Error::Timeout)
        ));
    }
}
