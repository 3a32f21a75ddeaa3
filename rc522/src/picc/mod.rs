//! ISO/IEC 14443-3 type A card session: REQA/WUPA, the anticollision
//! and selection cascade, and HLTA.

pub mod crc;

pub use crc::{crc_a, crc_a_with_preset};

use log::debug;

use crate::constants::{
    PICC_CMD_CT, PICC_CMD_HLTA, PICC_CMD_REQA, PICC_CMD_SEL_CL1, PICC_CMD_SEL_CL2,
    PICC_CMD_SEL_CL3, PICC_CMD_WUPA, SEL_NVB_ALL, SEL_NVB_COMPLETE,
};
use crate::device::{CrcPreset, PcdDevice};
use crate::types::{Atqa, Uid};
use crate::utils::timeout::INTERRUPT_TIMEOUT;
use crate::{Error, Result};

/// ISO 14443-3 driver over a reader device.
pub struct Iso14443<'d, D: PcdDevice> {
    device: &'d mut D,
}

impl<'d, D: PcdDevice> Iso14443<'d, D> {
    pub fn new(device: &'d mut D) -> Self {
        Self { device }
    }

    /// Transmit REQA. Invites PICCs in state IDLE to go to READY;
    /// sleeping cards in state HALT do not answer.
    pub fn request_a(&mut self) -> Result<Atqa> {
        self.request_or_wakeup(PICC_CMD_REQA)
    }

    /// Transmit WUPA. Also wakes cards in state HALT.
    pub fn wakeup_a(&mut self) -> Result<Atqa> {
        self.request_or_wakeup(PICC_CMD_WUPA)
    }

    fn request_or_wakeup(&mut self, command: u8) -> Result<Atqa> {
        // Short frame: only 7 bits of the single command byte.
        let mut valid_bits = 7u8;
        let reply =
            self.device
                .communicate_with_picc(&[command], &mut valid_bits, INTERRUPT_TIMEOUT)?;
        if reply.len() != 2 {
            // The ATQA is exactly 16 bits.
            return Err(Error::Selection {
                expected: 2,
                actual: reply.len(),
            });
        }
        Ok(Atqa::from_bytes([reply[0], reply[1]]))
    }

    /// Presence of a card is defined as a two-byte ATQA reply.
    pub fn is_new_card_present(&mut self) -> bool {
        self.request_a().is_ok()
    }

    /// One cascade level: anticollision request, collision check, then
    /// the full SELECT. Returns the four UIDcl bytes (the first may be
    /// the cascade tag) and the SAK.
    fn select_level(&mut self, level: u8) -> Result<([u8; 4], u8)> {
        debug!("select level {}", level);

        let sel = match level {
            1 => PICC_CMD_SEL_CL1,
            2 => PICC_CMD_SEL_CL2,
            3 => PICC_CMD_SEL_CL3,
            _ => {
                return Err(Error::Usage(format!("cascade level {} out of range", level)));
            }
        };

        // Anticollision: request all UID bits of this level.
        let mut valid_bits = 0u8;
        let reply = self.device.communicate_with_picc(
            &[sel, SEL_NVB_ALL],
            &mut valid_bits,
            INTERRUPT_TIMEOUT,
        )?;
        if reply.len() != 5 {
            // UIDcl0..3 plus the BCC.
            return Err(Error::Selection {
                expected: 5,
                actual: reply.len(),
            });
        }

        if self.device.collision_occurred()? {
            // The collision cycle is deliberately unimplemented.
            return Err(Error::CollisionUnsupported);
        }

        // SELECT: echo the five reply bytes back with NVB 0x70 and CRC_A.
        let mut frame = vec![sel, SEL_NVB_COMPLETE];
        frame.extend_from_slice(&reply);
        let crc = self
            .device
            .calculate_crc(CrcPreset::Iso14443a, &frame, INTERRUPT_TIMEOUT)?;
        frame.extend_from_slice(&crc);

        let uid_cl = [reply[0], reply[1], reply[2], reply[3]];

        let mut valid_bits = 0u8;
        let reply =
            self.device
                .communicate_with_picc(&frame, &mut valid_bits, INTERRUPT_TIMEOUT)?;
        if reply.len() != 3 {
            // The SAK is exactly 24 bits: 1 byte plus CRC_A.
            return Err(Error::Selection {
                expected: 3,
                actual: reply.len(),
            });
        }

        let crc =
            self.device
                .calculate_crc(CrcPreset::Iso14443a, &reply[..1], INTERRUPT_TIMEOUT)?;
        if crc != [reply[1], reply[2]] {
            return Err(Error::CrcCheck {
                expected: crc,
                actual: [reply[1], reply[2]],
            });
        }

        Ok((uid_cl, reply[0]))
    }

    /// Run the selection cascade until the UID is complete.
    ///
    /// The caller is expected to have put the PICC in READY state via
    /// [`request_a`](Self::request_a) or [`wakeup_a`](Self::wakeup_a).
    pub fn select(&mut self) -> Result<Uid> {
        let mut uid_bytes = Vec::new();

        let mut level = 1u8;
        loop {
            let (uid_cl, sak) = self.select_level(level)?;

            if uid_cl[0] == PICC_CMD_CT {
                // Intermediate level: strip the cascade tag.
                uid_bytes.extend_from_slice(&uid_cl[1..]);
            } else {
                uid_bytes.extend_from_slice(&uid_cl);
            }

            if sak & 0x04 == 0 {
                let uid = Uid::new(uid_bytes, sak)?;
                debug!("selected uid {} sak {:#04x}", uid.to_hex(), sak);
                return Ok(uid);
            }

            debug!("level {}: uid not complete, sak {:#010b}", level, sak);
            level += 1;
        }
    }

    /// Transmit HLTA. The standard treats any reply within 1 ms as a
    /// NAK, so the timeout is the success path here.
    pub fn halt_a(&mut self) -> Result<()> {
        let mut frame = vec![PICC_CMD_HLTA, 0x00];
        let crc = self
            .device
            .calculate_crc(CrcPreset::Iso14443a, &frame, INTERRUPT_TIMEOUT)?;
        frame.extend_from_slice(&crc);

        let mut valid_bits = 0u8;
        match self
            .device
            .communicate_with_picc(&frame, &mut valid_bits, INTERRUPT_TIMEOUT)
        {
            Err(Error::Timeout) => Ok(()),
            Ok(reply) => Err(Error::Selection {
                expected: 0,
                actual: reply.len(),
            }),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{CrcMode, MockPcd};
    use crate::types::PiccType;

    #[test]
    fn request_a_returns_atqa() {
        let mut pcd = MockPcd::new(CrcMode::Software);
        pcd.push_reply(vec![0x04, 0x00], 0);
        let mut session = Iso14443::new(&mut pcd);
        let atqa = session.request_a().unwrap();
        assert_eq!(atqa.as_bytes(), &[0x04, 0x00]);
    }

    #[test]
    fn request_a_sends_short_frame() {
        let mut pcd = MockPcd::new(CrcMode::Software);
        pcd.push_reply(vec![0x04, 0x00], 0);
        let mut session = Iso14443::new(&mut pcd);
        session.request_a().unwrap();
        assert_eq!(pcd.sent[0], (vec![PICC_CMD_REQA], 7));
    }

    #[test]
    fn short_atqa_is_a_selection_error() {
        let mut pcd = MockPcd::new(CrcMode::Software);
        pcd.push_reply(vec![0x04], 0);
        let mut session = Iso14443::new(&mut pcd);
        assert!(matches!(
            session.request_a(),
            Err(Error::Selection {
                expected: 2,
                actual: 1
            })
        ));
    }

    #[test]
    fn no_card_means_not_present() {
        let mut pcd = MockPcd::new(CrcMode::Software);
        pcd.push_error(Error::Timeout);
        let mut session = Iso14443::new(&mut pcd);
        assert!(!session.is_new_card_present());
    }

    #[test]
    fn select_single_size_uid() {
        let uid = [0xB4, 0x79, 0xF7, 0xD7];
        let bcc = uid[0] ^ uid[1] ^ uid[2] ^ uid[3];
        let sak = 0x08u8; // MIFARE 1K
        let sak_crc = crc_a(&[sak]);

        let mut pcd = MockPcd::new(CrcMode::Software);
        pcd.push_reply(vec![uid[0], uid[1], uid[2], uid[3], bcc], 0);
        pcd.push_reply(vec![sak, sak_crc[0], sak_crc[1]], 0);

        let mut session = Iso14443::new(&mut pcd);
        let selected = session.select().unwrap();
        assert_eq!(selected.as_bytes(), &uid);
        assert_eq!(selected.sak(), sak);
        assert_eq!(selected.pic_type(), PiccType::Mifare1K);
        assert!(selected.pic_type().is_mifare_classic());

        // First frame: anticollision with NVB 0x20. Second: full select.
        assert_eq!(pcd.sent[0], (vec![PICC_CMD_SEL_CL1, SEL_NVB_ALL], 0));
        let select_frame = &pcd.sent[1].0;
        assert_eq!(&select_frame[..2], &[PICC_CMD_SEL_CL1, SEL_NVB_COMPLETE]);
        assert_eq!(&select_frame[2..7], &[uid[0], uid[1], uid[2], uid[3], bcc]);
        assert_eq!(select_frame.len(), 9);
    }

    #[test]
    fn select_double_size_uid_strips_cascade_tag() {
        let uid = [0x04, 0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC];

        // Level 1 carries CT + uid0..2, SAK has the cascade bit set.
        let l1 = [PICC_CMD_CT, uid[0], uid[1], uid[2]];
        let bcc1 = l1[0] ^ l1[1] ^ l1[2] ^ l1[3];
        let sak1 = 0x04u8;
        let sak1_crc = crc_a(&[sak1]);

        // Level 2 carries uid3..6, SAK 0x00 (Ultralight).
        let l2 = [uid[3], uid[4], uid[5], uid[6]];
        let bcc2 = l2[0] ^ l2[1] ^ l2[2] ^ l2[3];
        let sak2 = 0x00u8;
        let sak2_crc = crc_a(&[sak2]);

        let mut pcd = MockPcd::new(CrcMode::Software);
        pcd.push_reply(vec![l1[0], l1[1], l1[2], l1[3], bcc1], 0);
        pcd.push_reply(vec![sak1, sak1_crc[0], sak1_crc[1]], 0);
        pcd.push_reply(vec![l2[0], l2[1], l2[2], l2[3], bcc2], 0);
        pcd.push_reply(vec![sak2, sak2_crc[0], sak2_crc[1]], 0);

        let mut session = Iso14443::new(&mut pcd);
        let selected = session.select().unwrap();
        assert_eq!(selected.as_bytes(), &uid);
        assert_eq!(selected.pic_type(), PiccType::MifareUl);

        // Level 2 used SEL_CL2.
        assert_eq!(pcd.sent[2].0[0], PICC_CMD_SEL_CL2);
    }

    #[test]
    fn collision_aborts_selection() {
        let mut pcd = MockPcd::new(CrcMode::Software);
        pcd.push_reply(vec![0x88, 0x01, 0x02, 0x03, 0x88], 0);
        pcd.collisions.push_back(true);
        let mut session = Iso14443::new(&mut pcd);
        assert!(matches!(
            session.select(),
            Err(Error::CollisionUnsupported)
        ));
    }

    #[test]
    fn truncated_anticollision_reply_is_rejected() {
        let mut pcd = MockPcd::new(CrcMode::Software);
        pcd.push_reply(vec![0x01, 0x02, 0x03], 0);
        let mut session = Iso14443::new(&mut pcd);
        assert!(matches!(
            session.select(),
            Err(Error::Selection {
                expected: 5,
                actual: 3
            })
        ));
    }

    #[test]
    fn corrupt_sak_crc_is_rejected() {
        let uid = [0x01, 0x02, 0x03, 0x04];
        let bcc = uid[0] ^ uid[1] ^ uid[2] ^ uid[3];
        let mut pcd = MockPcd::new(CrcMode::Software);
        pcd.push_reply(vec![uid[0], uid[1], uid[2], uid[3], bcc], 0);
        pcd.push_reply(vec![0x08, 0xDE, 0xAD], 0);
        let mut session = Iso14443::new(&mut pcd);
        assert!(matches!(session.select(), Err(Error::CrcCheck { .. })));
    }

    #[test]
    fn halt_a_succeeds_on_timeout() {
        let mut pcd = MockPcd::new(CrcMode::Software);
        pcd.push_error(Error::Timeout);
        let mut session = Iso14443::new(&mut pcd);
        session.halt_a().unwrap();
        let (frame, _) = &pcd.sent[0];
        assert_eq!(&frame[..2], &[PICC_CMD_HLTA, 0x00]);
        assert_eq!(&frame[2..], &crc_a(&[PICC_CMD_HLTA, 0x00]));
    }

    #[test]
    fn halt_a_reply_is_a_nak() {
        let mut pcd = MockPcd::new(CrcMode::Software);
        pcd.push_reply(vec![0x00], 0);
        let mut session = Iso14443::new(&mut pcd);
        assert!(session.halt_a().is_err());
    }
}
