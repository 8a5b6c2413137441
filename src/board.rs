//! The IO Pi board: two MCP23017 expanders behind one I2C bus, presented as a
//! flat 32-pin address space.
//!
//! Pins 0..=15 live on the first expander, 16..=31 on the second.  Within one
//! expander, bits 0..=7 are bank A and bits 8..=15 are bank B.

use crate::bus::RegisterTransport;
use crate::common::{Direction, Error};
use crate::expander::Expander;
use crate::mutex::BusMutex;
use crate::pin::{DigitalInput, DigitalOutput, Pin};
use crate::port::Port;

/// Factory-default address of the first expander chip.
pub const EXP1_DEFAULT_ADDRESS: u8 = 0x20;
/// Factory-default address of the second expander chip (first address + 1,
/// matching the board's jumper convention).
pub const EXP2_DEFAULT_ADDRESS: u8 = 0x21;

/// Number of IO pins on the board.
pub const PIN_COUNT: u8 = 32;
/// Number of 8-bit ports on the board (two per expander).
pub const PORT_COUNT: u8 = 4;

/// The register-level driver for a whole board.
///
/// Owns the bus and routes 32-bit pin masks to the two expander chips.  All
/// accesses go through [`IoPiBoard`], which serializes them behind a mutex.
pub struct Driver<B> {
    bus: B,
    expanders: [Expander; 2],
}

impl<B: RegisterTransport> Driver<B> {
    pub fn new(bus: B, exp1_addr: u8, exp2_addr: u8) -> Self {
        Self {
            bus,
            expanders: [Expander::new(exp1_addr), Expander::new(exp2_addr)],
        }
    }

    /// Combined IODIR view of both chips, 1=input.
    pub(crate) fn input_mask(&self) -> u32 {
        self.expanders[0].input_mask() as u32 | (self.expanders[1].input_mask() as u32) << 16
    }

    /// Combined cached output latch of both chips.
    pub(crate) fn output_latch(&self) -> u32 {
        self.expanders[0].output_latch() as u32 | (self.expanders[1].output_latch() as u32) << 16
    }

    /// Drive all pins in `mask_high` high and all pins in `mask_low` low.
    pub(crate) fn set_pins(&mut self, mask_high: u32, mask_low: u32) -> Result<(), B::BusError> {
        if (mask_high | mask_low) & 0xffff != 0 {
            self.expanders[0].write_outputs(
                &mut self.bus,
                (mask_high & 0xffff) as u16,
                (mask_low & 0xffff) as u16,
            )?;
        }
        if (mask_high | mask_low) & 0xffff_0000 != 0 {
            self.expanders[1].write_outputs(
                &mut self.bus,
                (mask_high >> 16) as u16,
                (mask_low >> 16) as u16,
            )?;
        }
        Ok(())
    }

    /// Read the state of all pins in `mask`; inputs from the GPIO registers,
    /// outputs from the cached latch.
    pub(crate) fn read_pins(&mut self, mask: u32) -> Result<u32, B::BusError> {
        let mut value = 0u32;
        if mask & 0xffff != 0 {
            value |= self.expanders[0].read_pins(&mut self.bus, (mask & 0xffff) as u16)? as u32;
        }
        if mask & 0xffff_0000 != 0 {
            value |=
                (self.expanders[1].read_pins(&mut self.bus, (mask >> 16) as u16)? as u32) << 16;
        }
        Ok(value)
    }

    /// Invert the latch state of all output pins in `mask`.
    pub(crate) fn toggle_pins(&mut self, mask: u32) -> Result<(), B::BusError> {
        let latch = self.output_latch();
        self.set_pins(!latch & mask, latch & mask)
    }

    /// Configure the direction of all pins in `mask`.
    ///
    /// When switching pins to output, their latch is written to `state`
    /// first, so they come up at a defined level instead of glitching.
    pub(crate) fn set_direction(
        &mut self,
        mask: u32,
        dir: Direction,
        state: bool,
    ) -> Result<(), B::BusError> {
        if dir == Direction::Output {
            let (mask_high, mask_low) = if state { (mask, 0) } else { (0, mask) };
            self.set_pins(mask_high, mask_low)?;
        }
        if mask & 0xffff != 0 {
            self.expanders[0].set_direction(&mut self.bus, (mask & 0xffff) as u16, dir)?;
        }
        if mask & 0xffff_0000 != 0 {
            self.expanders[1].set_direction(&mut self.bus, (mask >> 16) as u16, dir)?;
        }
        Ok(())
    }

    /// Enable or disable the internal pull-up for all pins in `mask`.
    pub(crate) fn set_pull_up(&mut self, mask: u32, enable: bool) -> Result<(), B::BusError> {
        if mask & 0xffff != 0 {
            self.expanders[0].set_pull_up(&mut self.bus, (mask & 0xffff) as u16, enable)?;
        }
        if mask & 0xffff_0000 != 0 {
            self.expanders[1].set_pull_up(&mut self.bus, (mask >> 16) as u16, enable)?;
        }
        Ok(())
    }
}

pub(crate) fn pin_mask<E>(pin: u8) -> Result<u32, Error<E>> {
    if pin < PIN_COUNT {
        Ok(1 << pin)
    } else {
        Err(Error::InvalidPin(pin))
    }
}

pub(crate) fn port_shift<E>(port: u8) -> Result<u8, Error<E>> {
    if port < PORT_COUNT {
        Ok(port * 8)
    } else {
        Err(Error::InvalidPort(port))
    }
}

/// An IO Pi board.
///
/// This is the application-facing entry point.  It wraps the board driver in
/// a [`BusMutex`] so that pin handles, port handles and the flat-index
/// methods below can never interleave their bus transactions.
pub struct IoPiBoard<M>(pub(crate) M);

impl<B> IoPiBoard<core::cell::RefCell<Driver<B>>>
where
    B: RegisterTransport,
{
    /// Create a board with the factory-default chip addresses.
    pub fn new(bus: B) -> Self {
        Self::with_addresses(bus, EXP1_DEFAULT_ADDRESS, EXP2_DEFAULT_ADDRESS)
    }

    /// Create a board with re-jumpered chip addresses.
    pub fn with_addresses(bus: B, exp1_addr: u8, exp2_addr: u8) -> Self {
        Self::with_mutex(bus, exp1_addr, exp2_addr)
    }
}

impl<B, M> IoPiBoard<M>
where
    B: RegisterTransport,
    M: BusMutex<Bus = Driver<B>>,
{
    /// Create a board guarded by a caller-chosen mutex type.
    pub fn with_mutex(bus: B, exp1_addr: u8, exp2_addr: u8) -> Self {
        Self(BusMutex::create(Driver::new(bus, exp1_addr, exp2_addr)))
    }

    /// Configure a pin (flat index 0..=31) as input or output.
    ///
    /// Pins switched to output are driven low.
    pub fn configure(&self, pin: u8, dir: Direction) -> Result<(), Error<B::BusError>> {
        let mask = pin_mask(pin)?;
        self.0
            .lock(|drv| drv.set_direction(mask, dir, false))
            .map_err(Error::Bus)
    }

    /// Enable or disable the internal pull-up of a pin.
    pub fn set_pull_up(&self, pin: u8, enable: bool) -> Result<(), Error<B::BusError>> {
        let mask = pin_mask(pin)?;
        self.0
            .lock(|drv| drv.set_pull_up(mask, enable))
            .map_err(Error::Bus)
    }

    /// Read the state of a pin.
    ///
    /// Input pins cost one bus transaction; output pins are answered from the
    /// cached output latch.
    pub fn read(&self, pin: u8) -> Result<bool, Error<B::BusError>> {
        let mask = pin_mask(pin)?;
        self.0
            .lock(|drv| drv.read_pins(mask))
            .map(|v| v & mask != 0)
            .map_err(Error::Bus)
    }

    /// Drive an output pin high or low.
    ///
    /// Fails with [`Error::Direction`] if the pin is configured as an input.
    pub fn write(&self, pin: u8, value: bool) -> Result<(), Error<B::BusError>> {
        let mask = pin_mask(pin)?;
        self.0.lock(|drv| {
            if drv.input_mask() & mask != 0 {
                return Err(Error::Direction(pin));
            }
            let (mask_high, mask_low) = if value { (mask, 0) } else { (0, mask) };
            drv.set_pins(mask_high, mask_low).map_err(Error::Bus)
        })
    }

    /// Invert the state of an output pin.
    pub fn toggle(&self, pin: u8) -> Result<(), Error<B::BusError>> {
        let mask = pin_mask(pin)?;
        self.0.lock(|drv| {
            if drv.input_mask() & mask != 0 {
                return Err(Error::Direction(pin));
            }
            drv.toggle_pins(mask).map_err(Error::Bus)
        })
    }

    /// Configure all 8 pins of a port (flat index 0..=3) at once.
    pub fn configure_port(&self, port: u8, dir: Direction) -> Result<(), Error<B::BusError>> {
        let mask = 0xffu32 << port_shift(port)?;
        self.0
            .lock(|drv| drv.set_direction(mask, dir, false))
            .map_err(Error::Bus)
    }

    /// Read all 8 pins of a port as one byte (bit 0 = lowest pin).
    pub fn read_port(&self, port: u8) -> Result<u8, Error<B::BusError>> {
        let shift = port_shift(port)?;
        self.0
            .lock(|drv| drv.read_pins(0xffu32 << shift))
            .map(|v| (v >> shift) as u8)
            .map_err(Error::Bus)
    }

    /// Write all 8 pins of a port as one byte, in a single register
    /// transaction.
    ///
    /// Latch bits belonging to input-configured pins are stored by the chip
    /// but have no electrical effect until those pins become outputs.
    pub fn write_port(&self, port: u8, value: u8) -> Result<(), Error<B::BusError>> {
        let shift = port_shift(port)?;
        let mask_high = (value as u32) << shift;
        let mask_low = (!value as u32) << shift;
        self.0
            .lock(|drv| drv.set_pins(mask_high, mask_low))
            .map_err(Error::Bus)
    }

    /// Get a handle for batch access to one 8-bit port.
    pub fn port(&self, port: u8) -> Result<Port<'_, M>, Error<B::BusError>> {
        let shift = port_shift(port)?;
        Ok(Port::new(shift, &self.0))
    }

    /// Configure a pin as an input and return a read-only handle for it.
    pub fn digital_input(
        &self,
        pin: u8,
        pull_up: bool,
    ) -> Result<DigitalInput<'_, M>, Error<B::BusError>> {
        let mask = pin_mask(pin)?;
        self.0
            .lock(|drv| {
                drv.set_direction(mask, Direction::Input, false)?;
                drv.set_pull_up(mask, pull_up)
            })
            .map_err(Error::Bus)?;
        Ok(Pin::new(pin, &self.0))
    }

    /// Configure a pin as an output, drive it to `state` and return a
    /// writable handle for it.
    pub fn digital_output(
        &self,
        pin: u8,
        state: bool,
    ) -> Result<DigitalOutput<'_, M>, Error<B::BusError>> {
        let mask = pin_mask(pin)?;
        self.0
            .lock(|drv| drv.set_direction(mask, Direction::Output, state))
            .map_err(Error::Bus)?;
        Ok(Pin::new(pin, &self.0))
    }
}
