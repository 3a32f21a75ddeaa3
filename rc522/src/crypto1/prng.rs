//! The MIFARE card PRNG: a 16-bit LFSR with taps at bits 16, 14, 13
//! and 11 of the generating polynomial, clocked to produce the nonce
//! successors `suc64` and `suc96` used during mutual authentication.

/// Advance the PRNG register by `n` steps and return the new window.
///
/// The register travels byte-swapped so that the value reads in wire
/// order. After at least 16 steps the upper half of the result is the
/// residual 16-bit state and the lower half holds the clocked-out bits;
/// windows for smaller `n` still contain seed bits.
pub fn successor(x: u32, n: u32) -> u32 {
    let mut x = x.swap_bytes();
    for _ in 0..n {
        x = (x >> 1) | ((((x >> 16) ^ (x >> 18) ^ (x >> 19) ^ (x >> 21)) & 1) << 31);
    }
    x.swap_bytes()
}

/// `suc^64` of a card nonce: the expected reader response word.
pub fn suc64(nonce: u32) -> u32 {
    successor(nonce, 64)
}

/// `suc^96` of a card nonce: the expected card response word.
pub fn suc96(nonce: u32) -> u32 {
    successor(nonce, 96)
}
