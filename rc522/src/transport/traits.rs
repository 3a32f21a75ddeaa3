use crate::Result;

/// Transport abstracts the serial link and discrete signals away from
/// the register and protocol logic.
///
/// The link is SPI mode 0 (clock phase and polarity both zero), up to
/// 10 MHz, 8 bits per word. Frames are two bytes: the first encodes the
/// register address and direction, the second carries data.
pub trait Transport {
    /// Full-duplex exchange: clock `tx` out while filling `rx`.
    fn exchange(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<()>;

    /// Write-only frame.
    fn write(&mut self, tx: &[u8]) -> Result<()>;

    /// Drive the reset output. The line is actively driven low during a
    /// reset strobe and high otherwise.
    fn set_reset(&mut self, high: bool) -> Result<()>;

    /// Sample the interrupt input. The pin is polled, not edge-triggered.
    fn irq_level(&mut self) -> Result<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::MockTransport;

    #[test]
    fn trait_object_exchange() {
        let mut m = MockTransport::new();
        m.push_reply(vec![0x00, 0x42]);
        let t: &mut dyn Transport = &mut m;
        let mut rx = [0u8; 2];
        t.exchange(&[0x82, 0x00], &mut rx).unwrap();
        assert_eq!(rx, [0x00, 0x42]);
    }

    #[test]
    fn trait_object_reset_line() {
        let mut m = MockTransport::new();
        let t: &mut dyn Transport = &mut m;
        t.set_reset(false).unwrap();
        t.set_reset(true).unwrap();
        assert_eq!(m.reset_transitions, vec![false, true]);
    }
}
