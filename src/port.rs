use crate::board::Driver;
use crate::bus::RegisterTransport;
use crate::common::{Direction, Error};
use crate::mutex::BusMutex;

/// Batch access to one 8-bit port of the board.
///
/// A port is a pure bit-window onto its expander: all 8 pins read or written
/// as a single byte in one register transaction.  Handles are obtained from
/// [`IoPiBoard::port`][crate::IoPiBoard::port].
pub struct Port<'a, MUTEX> {
    shift: u8,
    driver: &'a MUTEX,
}

impl<'a, B, MUTEX> Port<'a, MUTEX>
where
    B: RegisterTransport,
    MUTEX: BusMutex<Bus = Driver<B>>,
{
    pub(crate) fn new(shift: u8, driver: &'a MUTEX) -> Self {
        Self { shift, driver }
    }

    fn port_mask(&self) -> u32 {
        0xffu32 << self.shift
    }

    /// Configure all 8 pins of this port at once.  Pins switched to output
    /// are driven low.
    pub fn set_direction(&mut self, dir: Direction) -> Result<(), Error<B::BusError>> {
        self.driver
            .lock(|drv| drv.set_direction(self.port_mask(), dir, false))
            .map_err(Error::Bus)
    }

    /// Enable the internal pull-up on all pins of `mask` and disable it on
    /// the others (bit 0 = lowest pin of the port).
    pub fn set_pull_ups(&mut self, mask: u8) -> Result<(), Error<B::BusError>> {
        self.driver
            .lock(|drv| {
                drv.set_pull_up((mask as u32) << self.shift, true)?;
                drv.set_pull_up((!mask as u32) << self.shift, false)
            })
            .map_err(Error::Bus)
    }

    /// Read all 8 pins as one byte; input pins from the GPIO register,
    /// output pins from the cached latch.
    pub fn read(&self) -> Result<u8, Error<B::BusError>> {
        self.driver
            .lock(|drv| drv.read_pins(self.port_mask()))
            .map(|v| (v >> self.shift) as u8)
            .map_err(Error::Bus)
    }

    /// Write all 8 pins as one byte in a single register transaction.
    pub fn write(&mut self, value: u8) -> Result<(), Error<B::BusError>> {
        let mask_high = (value as u32) << self.shift;
        let mask_low = (!value as u32) << self.shift;
        self.driver
            .lock(|drv| drv.set_pins(mask_high, mask_low))
            .map_err(Error::Bus)
    }

    /// Read a single pin of this port (bit index 0..=7).
    pub fn pin_is_high(&self, bit: u8) -> Result<bool, Error<B::BusError>> {
        let mask = self.bit_mask(bit)?;
        self.driver
            .lock(|drv| drv.read_pins(mask))
            .map(|v| v & mask != 0)
            .map_err(Error::Bus)
    }

    /// Drive a single output pin of this port (bit index 0..=7).
    ///
    /// Errors carry the port-local bit index, like [`Port::pin_is_high`].
    pub fn set_pin(&mut self, bit: u8, value: bool) -> Result<(), Error<B::BusError>> {
        let mask = self.bit_mask(bit)?;
        self.driver.lock(|drv| {
            if drv.input_mask() & mask != 0 {
                return Err(Error::Direction(bit));
            }
            let (mask_high, mask_low) = if value { (mask, 0) } else { (0, mask) };
            drv.set_pins(mask_high, mask_low).map_err(Error::Bus)
        })
    }

    fn bit_mask(&self, bit: u8) -> Result<u32, Error<B::BusError>> {
        if bit < 8 {
            Ok(1u32 << (self.shift + bit))
        } else {
            Err(Error::InvalidPin(bit))
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{Direction, Error, IoPiBoard};
    use embedded_hal_mock::eh1::i2c as mock_i2c;

    #[test]
    fn port_handle_batch_io() {
        let expectations = [
            // port 2 (second chip, bank A) all outputs
            mock_i2c::Transaction::write(0x21, vec![0x12, 0x00]),
            mock_i2c::Transaction::write_read(0x21, vec![0x00], vec![0xff]),
            mock_i2c::Transaction::write(0x21, vec![0x00, 0x00]),
            mock_i2c::Transaction::write(0x21, vec![0x12, 0x3c]),
            // set_pin(0, true)
            mock_i2c::Transaction::write(0x21, vec![0x12, 0x3d]),
        ];
        let mut bus = mock_i2c::Mock::new(&expectations);

        let board = IoPiBoard::new(bus.clone());
        let mut port = board.port(2).unwrap();

        port.set_direction(Direction::Output).unwrap();
        port.write(0x3c).unwrap();
        assert_eq!(port.read().unwrap(), 0x3c);

        port.set_pin(0, true).unwrap();
        assert!(port.pin_is_high(0).unwrap());
        assert_eq!(port.read().unwrap(), 0x3d);

        assert_eq!(port.set_pin(8, true), Err(Error::InvalidPin(8)));

        bus.done();
    }

    #[test]
    fn input_port_with_pull_ups() {
        let expectations = [
            // all inputs is the reset state, IODIRA update writes it back
            mock_i2c::Transaction::write_read(0x20, vec![0x00], vec![0xff]),
            mock_i2c::Transaction::write(0x20, vec![0x00, 0xff]),
            // pull-ups on the low nibble, off on the high nibble
            mock_i2c::Transaction::write_read(0x20, vec![0x0c], vec![0x00]),
            mock_i2c::Transaction::write(0x20, vec![0x0c, 0x0f]),
            mock_i2c::Transaction::write_read(0x20, vec![0x0c], vec![0x0f]),
            mock_i2c::Transaction::write(0x20, vec![0x0c, 0x0f]),
            mock_i2c::Transaction::write_read(0x20, vec![0x12], vec![0x81]),
        ];
        let mut bus = mock_i2c::Mock::new(&expectations);

        let board = IoPiBoard::new(bus.clone());
        let mut port = board.port(0).unwrap();

        port.set_direction(Direction::Input).unwrap();
        port.set_pull_ups(0x0f).unwrap();
        assert_eq!(port.read().unwrap(), 0x81);

        // writing through an input-configured pin is refused
        assert_eq!(port.set_pin(3, true), Err(Error::Direction(3)));

        bus.done();
    }

    #[test]
    fn set_pin_errors_carry_the_port_local_bit() {
        let expectations = [
            mock_i2c::Transaction::write_read(0x20, vec![0x01], vec![0xff]),
            mock_i2c::Transaction::write(0x20, vec![0x01, 0xff]),
        ];
        let mut bus = mock_i2c::Mock::new(&expectations);

        let board = IoPiBoard::new(bus.clone());
        let mut port = board.port(1).unwrap();
        port.set_direction(Direction::Input).unwrap();

        // bit 3 of port 1 is board pin 11; the error still names bit 3
        assert_eq!(port.set_pin(3, true), Err(Error::Direction(3)));

        bus.done();
    }
}
