//! Register-level model of one MCP23017 "16-Bit I/O Expander with Serial
//! Interface", the chip used twice on the IO Pi board.
//!
//! Datasheet: https://ww1.microchip.com/downloads/en/devicedoc/20001952c.pdf
//!
//! The chip exposes two eight-bit GPIO ports, A and B.  In all 16-bit values
//! handled here, the lower byte corresponds to port A (pins 7..0) and the
//! upper byte to port B (pins 7..0).

use crate::bus::RegisterTransport;
use crate::common::Direction;

/// Register addresses for BANK=0, which is the reset state of the chip (and
/// which this driver does not change).
///
/// All registers reset to 0x00, except IODIR{A,B} which reset to 0xFF
/// (making all pins inputs).
#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Regs {
    /// IODIR: input/output direction: 0=output; 1=input
    IODIRA = 0x00,
    IODIRB = 0x01,
    /// IPOL: input polarity: 0=register values match input pins; 1=opposite
    IPOLA = 0x02,
    IPOLB = 0x03,
    /// GPINTEN: interrupt-on-change: 0=disable; 1=enable
    GPINTENA = 0x04,
    GPINTENB = 0x05,
    /// DEFVAL: default values for interrupt-on-change
    DEFVALA = 0x06,
    DEFVALB = 0x07,
    /// INTCON: interrupt-on-change config: 0=compare to previous pin value;
    ///   1=compare to corresponding bit in DEFVAL
    INTCONA = 0x08,
    INTCONB = 0x09,
    /// IOCON: configuration register (BANK, MIRROR, SEQOP, DISSLW, HAEN,
    ///   ODR, INTPOL)
    IOCONA = 0x0a,
    IOCONB = 0x0b,
    /// GPPU: enables the weak internal pull-up on each pin (when configured
    ///   as an input)
    GPPUA = 0x0c,
    GPPUB = 0x0d,
    /// INTF: interrupt flags: 1=corresponding pin caused interrupt
    INTFA = 0x0e,
    INTFB = 0x0f,
    /// INTCAP: value of each pin at the time it caused an interrupt
    INTCAPA = 0x10,
    INTCAPB = 0x11,
    /// GPIO: reflects the logic level on the pins
    GPIOA = 0x12,
    GPIOB = 0x13,
    /// OLAT: output latches: stored state for pins configured as outputs
    OLATA = 0x14,
    OLATB = 0x15,
}

impl From<Regs> for u8 {
    fn from(r: Regs) -> u8 {
        r as u8
    }
}

/// One expander chip: its bus address plus the cached direction, output-latch
/// and pull-up registers.
///
/// The cache mirrors the chip's reset state at construction and is only ever
/// committed after the corresponding bus write succeeded, so it cannot
/// diverge from confirmed hardware state.
pub struct Expander {
    addr: u8,
    /// IODIR cache, 1=input.  Reset state: all inputs.
    dir: u16,
    /// OLAT cache.
    out: u16,
    /// GPPU cache.
    pull: u16,
}

impl Expander {
    pub fn new(addr: u8) -> Self {
        Self {
            addr,
            dir: 0xffff,
            out: 0x0000,
            pull: 0x0000,
        }
    }

    /// Mask of pins currently configured as inputs (1=input, IODIR layout).
    pub fn input_mask(&self) -> u16 {
        self.dir
    }

    /// Cached output-latch value.
    pub fn output_latch(&self) -> u16 {
        self.out
    }

    /// Configure the direction of all pins in `mask`.
    pub fn set_direction<B: RegisterTransport>(
        &mut self,
        bus: &mut B,
        mask: u16,
        dir: Direction,
    ) -> Result<(), B::BusError> {
        let (mask_set, mask_clear) = match dir {
            Direction::Input => (mask, 0),
            Direction::Output => (0, mask),
        };
        if mask & 0x00ff != 0 {
            bus.update_register(
                self.addr,
                Regs::IODIRA,
                (mask_set & 0xff) as u8,
                (mask_clear & 0xff) as u8,
            )?;
            self.dir = (self.dir | (mask_set & 0x00ff)) & !(mask_clear & 0x00ff);
        }
        if mask & 0xff00 != 0 {
            bus.update_register(
                self.addr,
                Regs::IODIRB,
                (mask_set >> 8) as u8,
                (mask_clear >> 8) as u8,
            )?;
            self.dir = (self.dir | (mask_set & 0xff00)) & !(mask_clear & 0xff00);
        }
        Ok(())
    }

    /// Enable or disable the internal pull-up for all pins in `mask`.
    ///
    /// The pull-up only has an effect on pins configured as inputs.
    pub fn set_pull_up<B: RegisterTransport>(
        &mut self,
        bus: &mut B,
        mask: u16,
        enable: bool,
    ) -> Result<(), B::BusError> {
        let (mask_set, mask_clear) = if enable { (mask, 0) } else { (0, mask) };
        if mask & 0x00ff != 0 {
            bus.update_register(
                self.addr,
                Regs::GPPUA,
                (mask_set & 0xff) as u8,
                (mask_clear & 0xff) as u8,
            )?;
            self.pull = (self.pull | (mask_set & 0x00ff)) & !(mask_clear & 0x00ff);
        }
        if mask & 0xff00 != 0 {
            bus.update_register(
                self.addr,
                Regs::GPPUB,
                (mask_set >> 8) as u8,
                (mask_clear >> 8) as u8,
            )?;
            self.pull = (self.pull | (mask_set & 0xff00)) & !(mask_clear & 0xff00);
        }
        Ok(())
    }

    /// Drive all pins in `mask_high` high and all pins in `mask_low` low.
    ///
    /// Only the GPIO register bytes actually touched by the masks are
    /// written, and each byte of the latch cache is committed right after
    /// its own write succeeded.  A failed transaction therefore leaves the
    /// cache at the last confirmed value.
    pub fn write_outputs<B: RegisterTransport>(
        &mut self,
        bus: &mut B,
        mask_high: u16,
        mask_low: u16,
    ) -> Result<(), B::BusError> {
        let next = (self.out | mask_high) & !mask_low;
        if (mask_high | mask_low) & 0x00ff != 0 {
            bus.write_register(self.addr, Regs::GPIOA, (next & 0xff) as u8)?;
            self.out = (self.out & 0xff00) | (next & 0x00ff);
        }
        if (mask_high | mask_low) & 0xff00 != 0 {
            bus.write_register(self.addr, Regs::GPIOB, (next >> 8) as u8)?;
            self.out = (self.out & 0x00ff) | (next & 0xff00);
        }
        Ok(())
    }

    /// Read the state of all pins in `mask`.
    ///
    /// Input-configured pins are read from the GPIO register; output pins are
    /// answered from the cached output latch without a bus transaction (the
    /// conventional read-back for a write-only latch).
    pub fn read_pins<B: RegisterTransport>(
        &mut self,
        bus: &mut B,
        mask: u16,
    ) -> Result<u16, B::BusError> {
        let input_mask = mask & self.dir;
        let mut value = self.out & mask & !self.dir;
        if input_mask & 0x00ff != 0 {
            value |= bus.read_register(self.addr, Regs::GPIOA)? as u16 & input_mask & 0x00ff;
        }
        if input_mask & 0xff00 != 0 {
            value |= ((bus.read_register(self.addr, Regs::GPIOB)? as u16) << 8) & input_mask;
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::i2c as mock_i2c;

    #[test]
    fn direction_cache_commits_per_register() {
        let expectations = [
            mock_i2c::Transaction::write_read(0x20, vec![0x00], vec![0xff]),
            mock_i2c::Transaction::write(0x20, vec![0x00, 0x00]),
            // port B update fails
            mock_i2c::Transaction::write_read(0x20, vec![0x01], vec![0xff]),
            mock_i2c::Transaction::write(0x20, vec![0x01, 0x00])
                .with_error(embedded_hal::i2c::ErrorKind::Other),
        ];
        let mut bus = mock_i2c::Mock::new(&expectations);

        let mut exp = Expander::new(0x20);
        assert!(exp
            .set_direction(&mut bus, 0xffff, Direction::Output)
            .is_err());
        // port A committed, port B still at the confirmed reset state
        assert_eq!(exp.input_mask(), 0xff00);

        bus.done();
    }

    #[test]
    fn read_merges_latch_and_gpio() {
        let expectations = [
            // make pins 0..4 outputs
            mock_i2c::Transaction::write_read(0x20, vec![0x00], vec![0xff]),
            mock_i2c::Transaction::write(0x20, vec![0x00, 0xf0]),
            // drive pin 0 high
            mock_i2c::Transaction::write(0x20, vec![0x12, 0x01]),
            // GPIO read for the input half of the port
            mock_i2c::Transaction::write_read(0x20, vec![0x12], vec![0x50]),
        ];
        let mut bus = mock_i2c::Mock::new(&expectations);

        let mut exp = Expander::new(0x20);
        exp.set_direction(&mut bus, 0x000f, Direction::Output)
            .unwrap();
        exp.write_outputs(&mut bus, 0x0001, 0x0000).unwrap();
        let value = exp.read_pins(&mut bus, 0x00ff).unwrap();
        assert_eq!(value, 0x0051);

        bus.done();
    }
}
