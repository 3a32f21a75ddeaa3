//! The Crypto-1 stream cipher used by MIFARE Classic.
//!
//! A 48-bit LFSR feeds a three-layer nonlinear filter producing one
//! keystream bit per clock; a 16-bit card PRNG generates the nonce
//! successors exchanged during mutual authentication. Analysis:
//! Garcia et al., "Dismantling MIFARE Classic" and SAR-PR-2008-21.
//!
//! Both protocol roles are implemented so the engine can be exercised
//! against recorded traces without hardware: a reader-role instance
//! produces the challenge/response frames a card-role instance verifies,
//! and vice versa.

pub mod prng;

use crate::types::MifareKey;

const FILTER_A: u16 = 0x9E98;
const FILTER_B: u16 = 0xB48E;
const FILTER_C: u32 = 0xEC57_E80A;

/// LFSR feedback taps, numbered from the least significant bit.
const TAPS: [u8; 18] = [
    0, 5, 9, 10, 12, 14, 15, 17, 19, 24, 25, 27, 29, 35, 39, 41, 42, 43,
];

/// One 9-bit wire unit: data in the low byte, the parity bit at bit 8.
///
/// Everything the cipher layer touches is a sequence of these; the wire
/// layer serialises each as 8 data bits followed by the parity bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParityData(pub u16);

impl ParityData {
    pub fn new(data: u8, parity: u8) -> Self {
        Self(data as u16 | ((parity as u16 & 1) << 8))
    }

    /// Annotate a plaintext byte with its natural odd parity.
    pub fn with_odd_parity(data: u8) -> Self {
        Self::new(data, odd_parity(data))
    }

    pub fn data(self) -> u8 {
        (self.0 & 0xFF) as u8
    }

    pub fn parity(self) -> u8 {
        ((self.0 >> 8) & 1) as u8
    }

    /// True when the parity bit matches the data byte's odd parity.
    pub fn parity_valid(self) -> bool {
        self.parity() == odd_parity(self.data())
    }
}

/// Odd parity over one byte: the XOR of all eight bits, inverted.
pub fn odd_parity(b: u8) -> u8 {
    let x = b ^ (b >> 1) ^ (b >> 2) ^ (b >> 3) ^ (b >> 4) ^ (b >> 5) ^ (b >> 6) ^ (b >> 7);
    (x ^ 1) & 1
}

/// Serialise a 32-bit word MSByte first, annotating each slot with its
/// own odd parity.
pub fn word_to_parity(word: u32) -> [ParityData; 4] {
    let bytes = word.to_be_bytes();
    [
        ParityData::with_odd_parity(bytes[0]),
        ParityData::with_odd_parity(bytes[1]),
        ParityData::with_odd_parity(bytes[2]),
        ParityData::with_odd_parity(bytes[3]),
    ]
}

/// Read four units back into a 32-bit word, MSByte first. Parity bits
/// are ignored.
pub fn parity_to_word(units: &[ParityData]) -> u32 {
    u32::from_be_bytes([
        units[0].data(),
        units[1].data(),
        units[2].data(),
        units[3].data(),
    ])
}

/// Select the four bits at offsets a, a+2, a+4, a+6 of `x` as a nibble.
fn window(x: u64, a: u8) -> u32 {
    (((x >> a) & 1) | (((x >> (a + 2)) & 1) << 1) | (((x >> (a + 4)) & 1) << 2)
        | (((x >> (a + 6)) & 1) << 3)) as u32
}

/// One bit of nonlinear filter output for 48 bits of LFSR state.
fn filter(x: u64) -> u8 {
    // d: cycles between keystream production and use. Irrelevant in
    // software, but part of the published filter layout.
    const D: u8 = 2;

    let i5 = (((FILTER_B >> window(x, 7 + D)) as u32 & 1) << 0)
        | (((FILTER_A >> window(x, 15 + D)) as u32 & 1) << 1)
        | (((FILTER_A >> window(x, 23 + D)) as u32 & 1) << 2)
        | (((FILTER_B >> window(x, 31 + D)) as u32 & 1) << 3)
        | (((FILTER_A >> window(x, 39 + D)) as u32 & 1) << 4);
    ((FILTER_C >> i5) & 1) as u8
}

/// Protocol role selected at construction. The two roles share the
/// cipher core; they differ in which side of the stage 2/3 exchanges
/// they generate and which they verify.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Reader,
    Card,
}

/// Crypto-1 cipher state for one authentication session.
///
/// Created when authentication starts, destroyed on halt or failure.
/// Once authentication succeeds every byte exchanged with the card is
/// XORed with the keystream, its parity bit with the corresponding
/// filter output, until the session ends.
pub struct Crypto1 {
    lfsr: u64,
    nonce: u32,
    role: Role,
}

impl Crypto1 {
    /// Reader-side engine keyed with a sector key.
    pub fn reader(key: &MifareKey) -> Self {
        Self::with_role(key, Role::Reader)
    }

    /// Card-side engine keyed with a sector key.
    pub fn card(key: &MifareKey) -> Self {
        Self::with_role(key, Role::Card)
    }

    fn with_role(key: &MifareKey, role: Role) -> Self {
        let mut lfsr = 0u64;
        let mut k = key.to_word();
        for _ in 0..6 {
            lfsr = (lfsr << 8) | (k & 0xFF);
            k >>= 8;
        }
        Self {
            lfsr,
            nonce: 0,
            role,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Clock the LFSR once. `injection` XORs one bit into the feedback;
    /// `feedback` additionally XORs in the current keystream bit (only
    /// engaged while the card side absorbs the reader challenge).
    /// Returns the keystream bit produced by this clock.
    fn update(&mut self, injection: u8, feedback: bool) -> u8 {
        let x = self.lfsr;
        let ks = filter(x);
        let fb = if feedback { ks } else { 0 };
        let mut t = 0u64;
        for &tap in TAPS.iter() {
            t ^= x >> tap;
        }
        self.lfsr = (x >> 1) | (((t ^ (injection ^ fb) as u64) & 1) << 47);
        ks
    }

    /// Eight clocks, injecting `injection` LSBit first. Returns the
    /// keystream byte in the same bit order.
    fn update_byte(&mut self, injection: u8, feedback: bool) -> u8 {
        let mut ret = 0u8;
        for i in 0..8 {
            ret |= self.update((injection >> i) & 1, feedback) << i;
        }
        ret
    }

    /// Thirty-two clocks, injecting `injection` MSByte first (and each
    /// byte LSBit first). Returns the corresponding keystream word.
    fn update_word(&mut self, injection: u32, feedback: bool) -> u32 {
        let mut ret = 0u32;
        for i in (0..4).rev() {
            let ks = self.update_byte(((injection >> (i * 8)) & 0xFF) as u8, feedback);
            ret |= (ks as u32) << (i * 8);
        }
        ret
    }

    /// Stage 1: shift UID ⊕ card-nonce into the LFSR without feedback
    /// and load the card's PRNG state.
    pub fn mutual_1(&mut self, uid: u32, card_nonce: u32) {
        self.update_word(uid ^ card_nonce, false);
        self.nonce = card_nonce;
    }

    /// Stage 2 over the 8-unit reader response buffer.
    ///
    /// Reader role: units 0..4 must be preloaded with the reader nonce
    /// and its parity; the whole buffer is rewritten to the enciphered
    /// challenge ‖ response and `true` is returned.
    ///
    /// Card role: the buffer holds the received reader frames; the
    /// challenge is absorbed (with keystream feedback) and the result
    /// is whether the enciphered reader response checks out.
    pub fn mutual_2(&mut self, reader_response: &mut [ParityData; 8]) -> bool {
        match self.role {
            Role::Reader => {
                let reader_nonce = parity_to_word(&reader_response[..4]);
                // Feed the nonce into the state while enciphering it in place.
                for i in (0..4).rev() {
                    let injection = ((reader_nonce >> (i * 8)) & 0xFF) as u8;
                    reader_response[3 - i].0 ^= self.update_byte(injection, false) as u16;
                    reader_response[3 - i].0 ^= (filter(self.lfsr) as u16) << 8;
                }
                let answer = prng::suc64(self.nonce);
                let tail = word_to_parity(answer);
                reader_response[4..8].copy_from_slice(&tail);
                self.transcrypt(&mut reader_response[4..8]);
                true
            }
            Role::Card => {
                let reader_challenge = parity_to_word(&reader_response[..4]);
                let response_is = parity_to_word(&reader_response[4..8]);
                self.update_word(reader_challenge, true);
                let response_should = prng::suc64(self.nonce) ^ self.update_word(0, false);
                response_should == response_is
            }
        }
    }

    /// Stage 3 over the 4-unit card response buffer.
    ///
    /// Reader role: the buffer holds the received card response; the
    /// result is whether it equals suc96(nT) ⊕ ks3, with ks3 the four
    /// keystream bytes sampled immediately after the second nonce
    /// exchange.
    ///
    /// Card role: the buffer is rewritten to the enciphered card
    /// response and `true` is returned.
    pub fn mutual_3(&mut self, card_response: &mut [ParityData; 4]) -> bool {
        match self.role {
            Role::Reader => {
                let tag_is = parity_to_word(&card_response[..]);
                let tag_should = prng::suc96(self.nonce) ^ self.update_word(0, false);
                tag_is == tag_should
            }
            Role::Card => {
                let mut out = word_to_parity(prng::suc96(self.nonce));
                self.transcrypt(&mut out);
                card_response.copy_from_slice(&out);
                true
            }
        }
    }

    /// Encipher or decipher whole bytes in place: each data byte is
    /// XORed with a keystream byte, each parity bit with the filter
    /// output sampled after that byte's clocks.
    pub fn transcrypt(&mut self, data: &mut [ParityData]) {
        for unit in data.iter_mut() {
            unit.0 ^= self.update_byte(0, false) as u16;
            unit.0 ^= (filter(self.lfsr) as u16) << 8;
        }
    }

    /// Like [`transcrypt`](Self::transcrypt) but the final element only
    /// carries `trailing_bits` valid data bits (and no parity), handled
    /// as single-bit updates.
    pub fn transcrypt_bits(&mut self, data: &mut [ParityData], trailing_bits: usize) {
        debug_assert!(trailing_bits < 8);
        let full = if trailing_bits > 0 {
            data.len() - 1
        } else {
            data.len()
        };
        let (head, tail) = data.split_at_mut(full);
        self.transcrypt(head);
        for i in 0..trailing_bits {
            tail[0].0 ^= (self.update(0, false) as u16) << i;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn odd_parity_over_byte() {
        assert_eq!(odd_parity(0x00), 1);
        assert_eq!(odd_parity(0x01), 0);
        assert_eq!(odd_parity(0xFF), 1);
        assert_eq!(odd_parity(0x30), 1);
        assert_eq!(odd_parity(0x02), 0);
        assert_eq!(odd_parity(0xA8), 0);
    }

    #[test]
    fn word_serialisation_gives_each_slot_its_own_parity() {
        let units = word_to_parity(0x0102_03F0);
        assert_eq!(units[0].data(), 0x01);
        assert_eq!(units[0].parity(), 0);
        assert_eq!(units[1].data(), 0x02);
        assert_eq!(units[1].parity(), 0);
        assert_eq!(units[2].data(), 0x03);
        assert_eq!(units[2].parity(), 1);
        assert_eq!(units[3].data(), 0xF0);
        assert_eq!(units[3].parity(), 1);
        assert_eq!(parity_to_word(&units), 0x0102_03F0);
    }

    #[test]
    fn keystream_is_deterministic() {
        let key = MifareKey::DEFAULT;
        let mut a = Crypto1::reader(&key);
        let mut b = Crypto1::reader(&key);
        a.mutual_1(0xB479_F7D7, 0xF3FB_AEED);
        b.mutual_1(0xB479_F7D7, 0xF3FB_AEED);
        for _ in 0..64 {
            assert_eq!(a.update_byte(0, false), b.update_byte(0, false));
        }
    }

    #[test]
    fn key_load_order() {
        // With key a0..a5 the LSByte of the written key ends up in the
        // high byte of the register.
        let key = MifareKey::from_bytes([0xA0, 0xA1, 0xA2, 0xA3, 0xA4, 0xA5]);
        let c = Crypto1::reader(&key);
        assert_eq!(c.lfsr >> 40, 0xA5);
        assert_eq!(c.lfsr & 0xFF, 0xA0);
    }

    #[test]
    fn roles_are_tagged_at_construction() {
        let key = MifareKey::DEFAULT;
        assert_eq!(Crypto1::reader(&key).role(), Role::Reader);
        assert_eq!(Crypto1::card(&key).role(), Role::Card);
    }

    #[test]
    fn transcrypt_bits_handles_partial_ack() {
        // A 4-bit unit enciphers through four single-bit updates; two
        // engines in the same state must agree.
        let key = MifareKey::DEFAULT;
        let mut a = Crypto1::reader(&key);
        let mut b = Crypto1::reader(&key);
        a.mutual_1(0x1234_5678, 0x9ABC_DEF0);
        b.mutual_1(0x1234_5678, 0x9ABC_DEF0);

        let mut ack = [ParityData::new(0x0A, 0)];
        a.transcrypt_bits(&mut ack, 4);
        let mut back = [ParityData::new(ack[0].data(), 0)];
        b.transcrypt_bits(&mut back, 4);
        assert_eq!(back[0].data(), 0x0A);
    }
}
