//! Timeout defaults shared by the device engine and the PICC session.

use std::time::Duration;

/// Default time allowed for the ComIrq/DivIrq flags to assert after a
/// command is issued. The 25 ms chip timer (TReload = 0x3E8 at 40 kHz)
/// fires well within a handful of these polls.
pub const INTERRUPT_TIMEOUT: Duration = Duration::from_millis(5);

/// Interval between CommandReg polls while waiting out a reset strobe.
pub const RESET_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Convert milliseconds to Duration.
pub fn ms(ms: u64) -> Duration {
    Duration::from_millis(ms)
}
