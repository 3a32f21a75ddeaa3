//! Serialisation between cipher-layer parity units and the raw bit
//! stream the transceiver speaks once parity generation is bypassed.
//!
//! Each 9-bit unit travels as its 8 data bits LSBit first, then the
//! parity bit; the stream is packed into FIFO bytes LSBit first with
//! the residue reported as valid bits of the last byte.

use crate::crypto1::ParityData;
use crate::{Error, Result};

/// Number of FIFO bytes a frame of `units` parity units occupies.
pub fn frame_len(units: usize) -> usize {
    (units * 9).div_ceil(8)
}

/// Pack parity units into FIFO bytes. Returns the bytes and the number
/// of valid bits in the last byte (0 = all eight).
pub fn pack_parity_frame(units: &[ParityData]) -> (Vec<u8>, u8) {
    let total_bits = units.len() * 9;
    let mut out = vec![0u8; frame_len(units.len())];
    let mut pos = 0usize;
    for unit in units {
        let data = unit.data();
        for i in 0..8 {
            out[pos / 8] |= ((data >> i) & 1) << (pos % 8);
            pos += 1;
        }
        out[pos / 8] |= unit.parity() << (pos % 8);
        pos += 1;
    }
    (out, (total_bits % 8) as u8)
}

/// Unpack `unit_count` parity units out of FIFO bytes.
pub fn unpack_parity_frame(bytes: &[u8], unit_count: usize) -> Result<Vec<ParityData>> {
    let needed = frame_len(unit_count);
    if bytes.len() != needed {
        return Err(Error::Selection {
            expected: needed,
            actual: bytes.len(),
        });
    }

    let bit = |pos: usize| (bytes[pos / 8] >> (pos % 8)) & 1;

    let mut units = Vec::with_capacity(unit_count);
    let mut pos = 0usize;
    for _ in 0..unit_count {
        let mut data = 0u8;
        for i in 0..8 {
            data |= bit(pos) << i;
            pos += 1;
        }
        let parity = bit(pos);
        pos += 1;
        units.push(ParityData::new(data, parity));
    }
    Ok(units)
}
