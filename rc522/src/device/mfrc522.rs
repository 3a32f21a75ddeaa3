use std::thread;
use std::time::Duration;

use log::{debug, trace, warn};

use crate::constants::{FIFO_SIZE, VERSION_1_0, VERSION_2_0};
use crate::device::registers::{self, Command, Register};
use crate::device::{CrcPreset, PcdDevice};
use crate::transport::Transport;
use crate::utils::timeout::{INTERRUPT_TIMEOUT, RESET_POLL_INTERVAL};
use crate::{Error, Result};

/// Self-test FIFO fingerprint for silicon revision 1.0 (VersionReg 0x91).
pub const SELFTEST_FINGERPRINT_V1: [u8; 64] = [
    0x00, 0xC6, 0x37, 0xD5, 0x32, 0xB7, 0x57, 0x5C, 0xC2, 0xD8, 0x7C, 0x4D, 0xD9, 0x70, 0xC7,
    0x73, 0x10, 0xE6, 0xD2, 0xAA, 0x5E, 0xA1, 0x3E, 0x5A, 0x14, 0xAF, 0x30, 0x61, 0xC9, 0x70,
    0xDB, 0x2E, 0x64, 0x22, 0x72, 0xB5, 0xBD, 0x65, 0xF4, 0xEC, 0x22, 0xBC, 0xD3, 0x72, 0x35,
    0xCD, 0xAA, 0x41, 0x1F, 0xA7, 0xF3, 0x53, 0x14, 0xDE, 0x7E, 0x02, 0xD9, 0x0F, 0xB5, 0x5E,
    0x25, 0x1D, 0x29, 0x79,
];

/// Self-test FIFO fingerprint for silicon revision 2.0 (VersionReg 0x92).
pub const SELFTEST_FINGERPRINT_V2: [u8; 64] = [
    0x00, 0xEB, 0x66, 0xBA, 0x57, 0xBF, 0x23, 0x95, 0xD0, 0xE3, 0x0D, 0x3D, 0x27, 0x89, 0x5C,
    0xDE, 0x9D, 0x3B, 0xA7, 0x00, 0x21, 0x5B, 0x89, 0x82, 0x51, 0x3A, 0xEB, 0x02, 0x0C, 0xA5,
    0x00, 0x49, 0x7C, 0x84, 0x4D, 0xB3, 0xCC, 0xD2, 0x1B, 0x81, 0x5D, 0x48, 0x76, 0xD5, 0x71,
    0x61, 0x21, 0xA9, 0x86, 0x96, 0x83, 0x38, 0xCF, 0x9D, 0x5B, 0x6D, 0xDC, 0x15, 0xBA, 0x3E,
    0x7D, 0x95, 0x3B, 0x2F,
];

/// Handle to one MFRC522 reader.
///
/// The handle exclusively owns its transport (serial link, reset output
/// and interrupt input); operations on it are strictly sequential. More
/// than one reader can exist in a process, each on its own transport.
pub struct Mfrc522 {
    transport: Box<dyn Transport>,
    interrupt_timeout: Duration,
}

impl Mfrc522 {
    pub fn new(transport: Box<dyn Transport>) -> Self {
        Self {
            transport,
            interrupt_timeout: INTERRUPT_TIMEOUT,
        }
    }

    /// Override the IRQ poll timeout (default 5 ms).
    pub fn with_interrupt_timeout(mut self, timeout: Duration) -> Self {
        self.interrupt_timeout = timeout;
        self
    }

    pub fn interrupt_timeout(&self) -> Duration {
        self.interrupt_timeout
    }

    // ---- register primitives (datasheet section 8.1.2) ----

    fn write_register(&mut self, reg: Register, value: u8) -> Result<()> {
        self.transport.write(&[reg.write_address(), value])
    }

    fn read_register(&mut self, reg: Register) -> Result<u8> {
        let tx = [reg.read_address(), 0];
        let mut rx = [0u8; 2];
        self.transport.exchange(&tx, &mut rx)?;
        // The value arrives in the second byte of the duplex frame.
        Ok(rx[1])
    }

    fn set_register_bitmask(&mut self, reg: Register, mask: u8) -> Result<()> {
        let current = self.read_register(reg)?;
        self.write_register(reg, current | mask)
    }

    fn clear_register_bitmask(&mut self, reg: Register, mask: u8) -> Result<()> {
        let current = self.read_register(reg)?;
        self.write_register(reg, current & !mask)
    }

    fn write_fifo(&mut self, data: &[u8]) -> Result<()> {
        for &byte in data {
            self.write_register(Register::FifoDataReg, byte)?;
        }
        Ok(())
    }

    fn read_fifo(&mut self, count: usize) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            out.push(self.read_register(Register::FifoDataReg)?);
        }
        Ok(out)
    }

    // ---- chip level helpers ----

    /// Read the VersionReg (0x91 for v1.0 silicon, 0x92 for v2.0).
    pub fn version(&mut self) -> Result<u8> {
        self.read_register(Register::VersionReg)
    }

    /// Sample the IRQ line. The pin idles high through its pull-up and
    /// is driven low while an enabled interrupt request is pending, so
    /// hosts can skip the ComIrqReg poll when the line is still high.
    pub fn irq_pending(&mut self) -> Result<bool> {
        Ok(!self.transport.irq_level()?)
    }

    /// Current RxGain[2:0] field, scrubbed to the three used bits.
    pub fn antenna_gain(&mut self) -> Result<u8> {
        Ok(self.read_register(Register::RfCfgReg)? & registers::RX_GAIN_MASK)
    }

    /// Program the receiver gain. Only the RxGain[2:0] bits are touched,
    /// and only when they differ from the requested value.
    pub fn set_antenna_gain(&mut self, mask: u8) -> Result<()> {
        if self.antenna_gain()? != mask & registers::RX_GAIN_MASK {
            self.clear_register_bitmask(Register::RfCfgReg, registers::RX_GAIN_MASK)?;
            self.set_register_bitmask(Register::RfCfgReg, mask & registers::RX_GAIN_MASK)?;
        }
        Ok(())
    }

    /// Issue a command with payload and wait for its completion flags.
    /// `valid_bits` is the TxLastBits value going out; on the way back,
    /// if it was non-zero, it is replaced with RxLastBits of the reply.
    fn communicate(
        &mut self,
        command: Command,
        data: &[u8],
        valid_bits: &mut u8,
        timeout: Duration,
    ) -> Result<Vec<u8>> {
        // Bits received after a collision would otherwise be cleared.
        self.clear_register_bitmask(Register::CollReg, registers::COLL_VALUES_AFTER_COLL)?;

        // Stop any active command, flush the FIFO, load the payload.
        self.write_register(Register::CommandReg, Command::Idle as u8)?;
        self.set_register_bitmask(Register::FifoLevelReg, registers::FIFO_FLUSH)?;
        self.write_fifo(data)?;
        self.write_register(Register::BitFramingReg, *valid_bits & 0x07)?;

        self.write_register(Register::CommandReg, command as u8)?;
        if command == Command::Transceive {
            self.set_register_bitmask(Register::BitFramingReg, registers::BIT_FRAMING_START_SEND)?;
        }

        thread::sleep(timeout);

        let irq = self.read_register(Register::ComIrqReg)?;
        trace!("ComIrqReg: {:#010b}", irq);

        if irq & (registers::IRQ_RX | registers::IRQ_IDLE) == 0 {
            if irq & registers::IRQ_TIMER != 0 {
                return Err(Error::Timeout);
            }
            if irq & registers::IRQ_ERR != 0 {
                let error_bits = self.read_register(Register::ErrorReg)?;
                if error_bits & registers::ERR_FATAL_MASK != 0 {
                    debug!("contactless UART error, ErrorReg: {:#010b}", error_bits);
                    return Err(Error::Protocol { error_bits });
                }
                // CollErr alone is not fatal here; callers ask for it
                // through collision_occurred().
            } else {
                return Err(Error::UnexpectedIrq { irq });
            }
        }

        let count = self.read_register(Register::FifoLevelReg)? as usize;
        trace!("FIFOLevelReg: {}", count);
        let result = self.read_fifo(count.min(FIFO_SIZE))?;

        if *valid_bits > 0 {
            *valid_bits = self.read_register(Register::ControlReg)? & 0x07;
        }

        Ok(result)
    }
}

impl PcdDevice for Mfrc522 {
    /// Program the ~25 ms auto-start timer, reset the baud registers and
    /// force 100 % ASK. The CRC preset is deliberately not set here; it
    /// is programmed per call by `calculate_crc`.
    fn init(&mut self) -> Result<()> {
        // f_timer = 13.56 MHz / (2*TPreScaler+1), TPreScaler = 0x0A9
        // => 40 kHz, 25 us per tick; TReload 0x3E8 => 25 ms to timeout.
        self.write_register(Register::TModeReg, 0x80)?;
        self.write_register(Register::TPrescalerReg, 0xA9)?;
        self.write_register(Register::TReloadRegHigh, 0x03)?;
        self.write_register(Register::TReloadRegLow, 0xE8)?;

        self.write_register(Register::TxModeReg, 0x00)?;
        self.write_register(Register::RxModeReg, 0x00)?;
        self.write_register(Register::ModWidthReg, 0x26)?;

        // Force 100 % ASK modulation regardless of ModGsPReg.
        self.write_register(Register::TxAskReg, 0x40)?;
        Ok(())
    }

    /// Strobe the reset line low for at least 50 us, then wait for the
    /// PowerDown bit to clear. Section 8.8.2: oscillator start-up is the
    /// crystal start-up plus 37.74 us; we allow three 50 ms intervals.
    fn reset(&mut self) -> Result<()> {
        self.transport.set_reset(false)?;
        thread::sleep(Duration::from_micros(50));
        self.transport.set_reset(true)?;

        for _ in 0..3 {
            thread::sleep(RESET_POLL_INTERVAL);
            let value = self.read_register(Register::CommandReg)?;
            if value & registers::CMD_POWER_DOWN == 0 {
                return Ok(());
            }
        }
        Err(Error::ResetTimeout)
    }

    /// Digital self test, datasheet section 16.1.1. Retries once after
    /// an extra reset; some boards fail the first pass after power-up.
    fn self_test(&mut self) -> Result<()> {
        match self.self_test_once() {
            Err(Error::SelfTestMismatch { version }) => {
                warn!(
                    "self test failed on version {:#04x} chip, retrying after reset",
                    version
                );
                self.reset()?;
                self.self_test_once()
            }
            other => other,
        }
    }

    fn antenna_on(&mut self) -> Result<()> {
        let value = self.read_register(Register::TxControlReg)?;
        if value & registers::TX_RF_EN != registers::TX_RF_EN {
            self.set_register_bitmask(Register::TxControlReg, registers::TX_RF_EN)?;
            // Let the field settle before the first frame.
            thread::sleep(self.interrupt_timeout);
        }
        Ok(())
    }

    fn antenna_off(&mut self) -> Result<()> {
        let value = self.read_register(Register::TxControlReg)?;
        if value & registers::TX_RF_EN == registers::TX_RF_EN {
            self.clear_register_bitmask(Register::TxControlReg, registers::TX_RF_EN)?;
            thread::sleep(self.interrupt_timeout);
        }
        Ok(())
    }

    fn communicate_with_picc(
        &mut self,
        data: &[u8],
        valid_bits: &mut u8,
        timeout: Duration,
    ) -> Result<Vec<u8>> {
        self.communicate(Command::Transceive, data, valid_bits, timeout)
    }

    fn collision_occurred(&mut self) -> Result<bool> {
        let error_bits = self.read_register(Register::ErrorReg)?;
        Ok(error_bits & registers::ERR_COLL != 0)
    }

    /// Run the CRC coprocessor. The requested preset is programmed into
    /// ModeReg[1:0] before each calculation; only the first 64 input
    /// bytes fit the FIFO.
    fn calculate_crc(
        &mut self,
        preset: CrcPreset,
        data: &[u8],
        timeout: Duration,
    ) -> Result<[u8; 2]> {
        let mode = self.read_register(Register::ModeReg)?;
        self.write_register(Register::ModeReg, (mode & !0x03) | preset.mode_bits())?;

        self.write_register(Register::CommandReg, Command::Idle as u8)?;
        self.set_register_bitmask(Register::FifoLevelReg, registers::FIFO_FLUSH)?;
        self.write_register(Register::CommandReg, Command::CalcCrc as u8)?;
        self.write_fifo(&data[..data.len().min(FIFO_SIZE)])?;

        thread::sleep(timeout);

        let irq = self.read_register(Register::DivIrqReg)?;
        if irq & registers::IRQ_CRC == 0 {
            return Err(Error::CrcTimeout);
        }

        // Stop calculating CRC for new FIFO content.
        self.write_register(Register::CommandReg, Command::Idle as u8)?;

        let low = self.read_register(Register::CrcResultRegLow)?;
        let high = self.read_register(Register::CrcResultRegHigh)?;
        Ok([low, high])
    }

    fn set_raw_framing(&mut self, enabled: bool) -> Result<()> {
        if enabled {
            self.set_register_bitmask(Register::MfTxReg, registers::MF_PARITY_DISABLE)?;
            self.set_register_bitmask(Register::MfRxReg, registers::MF_PARITY_DISABLE)
        } else {
            self.clear_register_bitmask(Register::MfTxReg, registers::MF_PARITY_DISABLE)?;
            self.clear_register_bitmask(Register::MfRxReg, registers::MF_PARITY_DISABLE)
        }
    }

    fn stop_crypto(&mut self) -> Result<()> {
        self.clear_register_bitmask(Register::Status2Reg, registers::MF_CRYPTO1_ON)
    }
}

impl Mfrc522 {
    fn self_test_once(&mut self) -> Result<()> {
        // 1. Soft reset.
        self.reset()?;

        // 2. Clear the internal buffer: 25 bytes of 00h, then Mem.
        self.set_register_bitmask(Register::FifoLevelReg, registers::FIFO_FLUSH)?;
        self.write_fifo(&[0u8; 25])?;
        self.write_register(Register::CommandReg, Command::Mem as u8)?;

        // 3. Enable the self test.
        self.write_register(Register::AutoTestReg, 0x09)?;

        // 4. Write 00h to the FIFO.
        self.write_register(Register::FifoDataReg, 0x00)?;

        // 5. Start the self test with CalcCRC.
        self.write_register(Register::CommandReg, Command::CalcCrc as u8)?;

        // 6. Wait for completion. Some devices never raise CRCIRq during
        // the self test, so a full FIFO also counts as done.
        let mut done = false;
        for _ in 0..0xFF {
            let irq = self.read_register(Register::DivIrqReg)?;
            if irq & registers::IRQ_CRC != 0 {
                done = true;
                break;
            }
            let level = self.read_register(Register::FifoLevelReg)?;
            if level as usize >= FIFO_SIZE {
                done = true;
                break;
            }
        }
        if !done {
            let version = self.version()?;
            return Err(Error::SelfTestMismatch { version });
        }

        self.write_register(Register::CommandReg, Command::Idle as u8)?;

        // 7. Read the 64 byte fingerprint and leave auto-test mode.
        let result = self.read_fifo(FIFO_SIZE)?;
        self.write_register(Register::AutoTestReg, 0x00)?;

        let version = self.version()?;
        let expected: &[u8; 64] = match version {
            VERSION_1_0 => &SELFTEST_FINGERPRINT_V1,
            VERSION_2_0 => &SELFTEST_FINGERPRINT_V2,
            _ => return Err(Error::SelfTestMismatch { version }),
        };

        if result != expected {
            debug!(
                "self test mismatch\nexpected: {}\n  actual: {}",
                crate::utils::bytes_to_hex_spaced(expected),
                crate::utils::bytes_to_hex_spaced(&result)
            );
            return Err(Error::SelfTestMismatch { version });
        }
        debug!("self test passed, version {:#04x}", version);
        Ok(())
    }
}
