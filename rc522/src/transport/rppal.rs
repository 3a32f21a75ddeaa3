use rppal::gpio::{Gpio, InputPin, OutputPin};
use rppal::spi::{Bus, Mode, SlaveSelect, Spi};

use crate::transport::traits::Transport;
use crate::Result;

/// Maximum SPI clock the MFRC522 supports (datasheet section 8.1.2).
pub const SPI_CLOCK_HZ: u32 = 10_000_000;

/// Raspberry Pi transport: hardware SPI plus the reset output and the
/// interrupt input on GPIO.
pub struct SpiTransport {
    spi: Spi,
    reset_pin: OutputPin,
    irq_pin: InputPin,
}

impl SpiTransport {
    /// Open the given SPI bus in mode 0 and claim the two GPIO pins.
    /// The reset pin is driven high, the IRQ pin is left as a plain
    /// input; the MFRC522 board's pull-up keeps it high when idle.
    pub fn open(bus: Bus, slave: SlaveSelect, reset_bcm: u8, irq_bcm: u8) -> Result<Self> {
        let spi = Spi::new(bus, slave, SPI_CLOCK_HZ, Mode::Mode0)?;
        let gpio = Gpio::new()?;
        let mut reset_pin = gpio.get(reset_bcm)?.into_output();
        let irq_pin = gpio.get(irq_bcm)?.into_input_pullup();

        reset_pin.set_high();

        Ok(Self {
            spi,
            reset_pin,
            irq_pin,
        })
    }
}

impl Transport for SpiTransport {
    fn exchange(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<()> {
        self.spi.transfer(rx, tx)?;
        Ok(())
    }

    fn write(&mut self, tx: &[u8]) -> Result<()> {
        self.spi.write(tx)?;
        Ok(())
    }

    fn set_reset(&mut self, high: bool) -> Result<()> {
        if high {
            self.reset_pin.set_high();
        } else {
            self.reset_pin.set_low();
        }
        Ok(())
    }

    fn irq_level(&mut self) -> Result<bool> {
        Ok(self.irq_pin.is_high())
    }
}
