//! MFRC522 register map and command set.
//!
//! Datasheet: <https://www.nxp.com/docs/en/data-sheet/MFRC522.pdf>,
//! sections 9 (registers) and 10 (commands).

/// The 6-bit register addresses of the MFRC522.
#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    // Page 0: Command and status
    CommandReg = 0x01,
    ComIEnReg = 0x02,
    DivIEnReg = 0x03,
    ComIrqReg = 0x04,
    DivIrqReg = 0x05,
    ErrorReg = 0x06,
    Status1Reg = 0x07,
    Status2Reg = 0x08,
    FifoDataReg = 0x09,
    FifoLevelReg = 0x0A,
    WaterLevelReg = 0x0B,
    ControlReg = 0x0C,
    BitFramingReg = 0x0D,
    CollReg = 0x0E,
    // Page 1: Command
    ModeReg = 0x11,
    TxModeReg = 0x12,
    RxModeReg = 0x13,
    TxControlReg = 0x14,
    TxAskReg = 0x15,
    TxSelReg = 0x16,
    RxSelReg = 0x17,
    RxThresholdReg = 0x18,
    DemodReg = 0x19,
    MfTxReg = 0x1C,
    MfRxReg = 0x1D,
    SerialSpeedReg = 0x1F,
    // Page 2: Configuration
    CrcResultRegHigh = 0x21,
    CrcResultRegLow = 0x22,
    ModWidthReg = 0x24,
    RfCfgReg = 0x26,
    GsNReg = 0x27,
    CwGsPReg = 0x28,
    ModGsPReg = 0x29,
    TModeReg = 0x2A,
    TPrescalerReg = 0x2B,
    TReloadRegHigh = 0x2C,
    TReloadRegLow = 0x2D,
    TCounterValRegHigh = 0x2E,
    TCounterValRegLow = 0x2F,
    // Page 3: Test
    TestSel1Reg = 0x31,
    TestSel2Reg = 0x32,
    TestPinEnReg = 0x33,
    TestPinValueReg = 0x34,
    TestBusReg = 0x35,
    AutoTestReg = 0x36,
    VersionReg = 0x37,
    AnalogTestReg = 0x38,
    TestDac1Reg = 0x39,
    TestDac2Reg = 0x3A,
    TestAdcReg = 0x3B,
}

impl Register {
    /// Address byte for a register write: `(addr << 1) & 0x7E`.
    pub fn write_address(self) -> u8 {
        ((self as u8) << 1) & 0x7E
    }

    /// Address byte for a register read: the write address with bit 7 set.
    pub fn read_address(self) -> u8 {
        self.write_address() | 0x80
    }
}

/// MFRC522 command set (CommandReg[3:0]).
#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// No action, cancels current command execution
    Idle = 0x00,
    /// Stores 25 bytes into the internal buffer
    Mem = 0x01,
    /// Generates a 10-byte random ID number
    GenerateRandomId = 0x02,
    /// Activates the CRC coprocessor or performs a self test
    CalcCrc = 0x03,
    /// Transmits data from the FIFO buffer
    Transmit = 0x04,
    /// No command change; modifies CommandReg bits without touching the command
    NoCmdChange = 0x07,
    /// Activates the receiver circuits
    Receive = 0x08,
    /// Transmits from the FIFO and automatically activates the receiver
    Transceive = 0x0C,
    /// Performs the MIFARE standard authentication as a reader
    MfAuthent = 0x0E,
    /// Resets the MFRC522
    SoftReset = 0x0F,
}

// ComIrqReg flags
pub const IRQ_TIMER: u8 = 0x01;
pub const IRQ_ERR: u8 = 0x02;
pub const IRQ_IDLE: u8 = 0x10;
pub const IRQ_RX: u8 = 0x20;

// DivIrqReg flags
pub const IRQ_CRC: u8 = 0x04;

// ErrorReg flags: WrErr TempErr - BufferOvfl CollErr CRCErr ParityErr ProtocolErr
pub const ERR_PROTOCOL: u8 = 0x01;
pub const ERR_PARITY: u8 = 0x02;
pub const ERR_COLL: u8 = 0x08;
pub const ERR_BUFFER_OVFL: u8 = 0x10;
/// The ErrorReg bits that abort a transceive outright.
pub const ERR_FATAL_MASK: u8 = ERR_BUFFER_OVFL | ERR_PARITY | ERR_PROTOCOL;

// CommandReg
pub const CMD_POWER_DOWN: u8 = 1 << 4;

// FIFOLevelReg
pub const FIFO_FLUSH: u8 = 0x80;

// BitFramingReg
pub const BIT_FRAMING_START_SEND: u8 = 0x80;

// CollReg
pub const COLL_VALUES_AFTER_COLL: u8 = 0x80;

// TxControlReg
pub const TX_RF_EN: u8 = 0x03;

// Status2Reg
pub const MF_CRYPTO1_ON: u8 = 0x08;

// MfTxReg / MfRxReg: transmit and receive with the parity logic bypassed
pub const MF_PARITY_DISABLE: u8 = 0x10;

// RFCfgReg receiver gain field
pub const RX_GAIN_MASK: u8 = 0x07 << 4;
