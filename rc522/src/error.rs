use thiserror::Error;

/// Crate-wide error type.
#[derive(Error, Debug)]
pub enum Error {
    /// The underlying serial link or a discrete signal failed.
    #[error("transport error: {0}")]
    Transport(String),

    // SPI/GPIO backends are optional so the protocol and cipher layers
    // stay buildable on hosts without the hardware stack.
    #[cfg(feature = "rppal")]
    #[error("spi error: {0}")]
    Spi(#[from] rppal::spi::Error),

    #[cfg(feature = "rppal")]
    #[error("gpio error: {0}")]
    Gpio(#[from] rppal::gpio::Error),

    /// The PowerDown bit did not clear after a reset strobe.
    #[error("reset timeout: PowerDown bit not cleared")]
    ResetTimeout,

    /// No PICC answered within the interrupt timeout.
    #[error("operation timed out")]
    Timeout,

    /// The CRC coprocessor never raised CRCIRq.
    #[error("crc coprocessor timed out")]
    CrcTimeout,

    /// ErrorReg reported BufferOvfl, ParityErr or ProtocolErr.
    #[error("protocol error: ErrorReg={error_bits:#04x}")]
    Protocol { error_bits: u8 },

    /// More than one PICC answered; the collision cycle is not implemented.
    #[error("collision detected: collision cycle not supported")]
    CollisionUnsupported,

    /// A selection frame had an unexpected shape.
    #[error("selection error: expected {expected} byte reply, got {actual}")]
    Selection { expected: usize, actual: usize },

    /// A received CRC_A did not match the recomputed one.
    #[error("crc check failed: expected {expected:02x?}, got {actual:02x?}")]
    CrcCheck { expected: [u8; 2], actual: [u8; 2] },

    /// The card response did not match the expected Crypto-1 response.
    #[error("mutual authentication failed")]
    AuthenticationFailure,

    /// The PICC answered a write with a NAK nibble.
    #[error("write rejected: ack nibble {ack:#03x}")]
    WriteRejected { ack: u8 },

    /// The self-test fingerprint did not match the silicon revision.
    #[error("self test mismatch (version {version:#04x})")]
    SelfTestMismatch { version: u8 },

    /// ComIrqReg held a flag combination no outcome maps to.
    #[error("unexpected irq flags: ComIrqReg={irq:#04x}")]
    UnexpectedIrq { irq: u8 },

    /// Caller passed arguments outside the supported domain.
    #[error("usage error: {0}")]
    Usage(String),
}

pub type Result<T> = std::result::Result<T, Error>;
