use crate::board::Driver;
use crate::bus::RegisterTransport;
use crate::common::{mode, Direction, Error};
use crate::mutex::BusMutex;
use core::marker::PhantomData;

/// A single IO pin of the board.
///
/// `Pin` is not constructed directly; handles are obtained from
/// [`IoPiBoard::digital_input`][crate::IoPiBoard::digital_input] and
/// [`IoPiBoard::digital_output`][crate::IoPiBoard::digital_output], or by
/// converting an existing handle with `into_input()`/`into_output()`.
///
/// The `MODE` parameter encodes the configured direction, so reading a pin is
/// only available on inputs and driving it only on outputs.
pub struct Pin<'a, MODE, MUTEX> {
    pin_mask: u32,
    driver: &'a MUTEX,
    _m: PhantomData<MODE>,
}

/// Read-only handle for a pin configured as an input.
pub type DigitalInput<'a, MUTEX> = Pin<'a, mode::Input, MUTEX>;
/// Writable handle for a pin configured as an output.
pub type DigitalOutput<'a, MUTEX> = Pin<'a, mode::Output, MUTEX>;

impl<'a, MODE, B, MUTEX> Pin<'a, MODE, MUTEX>
where
    B: RegisterTransport,
    MUTEX: BusMutex<Bus = Driver<B>>,
{
    pub(crate) fn new(pin: u8, driver: &'a MUTEX) -> Self {
        debug_assert!(pin < crate::board::PIN_COUNT);
        Self {
            pin_mask: 1 << pin,
            driver,
            _m: PhantomData,
        }
    }

    /// Flat index of this pin on the board.
    pub fn pin_number(&self) -> u8 {
        self.pin_mask.trailing_zeros() as u8
    }

    /// Reconfigure this pin as a floating input.
    pub fn into_input(self) -> Result<DigitalInput<'a, MUTEX>, Error<B::BusError>> {
        self.driver
            .lock(|drv| {
                drv.set_direction(self.pin_mask, Direction::Input, false)?;
                drv.set_pull_up(self.pin_mask, false)
            })
            .map_err(Error::Bus)?;
        Ok(Pin {
            pin_mask: self.pin_mask,
            driver: self.driver,
            _m: PhantomData,
        })
    }

    /// Reconfigure this pin as an input with the internal pull-up enabled.
    pub fn into_input_pull_up(self) -> Result<DigitalInput<'a, MUTEX>, Error<B::BusError>> {
        self.driver
            .lock(|drv| {
                drv.set_direction(self.pin_mask, Direction::Input, false)?;
                drv.set_pull_up(self.pin_mask, true)
            })
            .map_err(Error::Bus)?;
        Ok(Pin {
            pin_mask: self.pin_mask,
            driver: self.driver,
            _m: PhantomData,
        })
    }

    /// Reconfigure this pin as an output, driven low.
    pub fn into_output(self) -> Result<DigitalOutput<'a, MUTEX>, Error<B::BusError>> {
        self.into_output_with_state(false)
    }

    /// Reconfigure this pin as an output, driven to `state` before the
    /// direction switches so it never glitches.
    pub fn into_output_with_state(
        self,
        state: bool,
    ) -> Result<DigitalOutput<'a, MUTEX>, Error<B::BusError>> {
        self.driver
            .lock(|drv| drv.set_direction(self.pin_mask, Direction::Output, state))
            .map_err(Error::Bus)?;
        Ok(Pin {
            pin_mask: self.pin_mask,
            driver: self.driver,
            _m: PhantomData,
        })
    }
}

impl<'a, MODE: mode::HasInput, B, MUTEX> Pin<'a, MODE, MUTEX>
where
    B: RegisterTransport,
    MUTEX: BusMutex<Bus = Driver<B>>,
{
    /// Read the level on the pin.  One bus transaction per call; callers that
    /// need edge detection poll and diff across calls.
    pub fn is_high(&self) -> Result<bool, Error<B::BusError>> {
        self.driver
            .lock(|drv| drv.read_pins(self.pin_mask))
            .map(|v| v & self.pin_mask != 0)
            .map_err(Error::Bus)
    }

    pub fn is_low(&self) -> Result<bool, Error<B::BusError>> {
        self.is_high().map(|v| !v)
    }
}

impl<'a, MODE: mode::HasOutput, B, MUTEX> Pin<'a, MODE, MUTEX>
where
    B: RegisterTransport,
    MUTEX: BusMutex<Bus = Driver<B>>,
{
    pub fn set_high(&mut self) -> Result<(), Error<B::BusError>> {
        self.driver
            .lock(|drv| drv.set_pins(self.pin_mask, 0))
            .map_err(Error::Bus)
    }

    pub fn set_low(&mut self) -> Result<(), Error<B::BusError>> {
        self.driver
            .lock(|drv| drv.set_pins(0, self.pin_mask))
            .map_err(Error::Bus)
    }

    pub fn set_state(&mut self, state: bool) -> Result<(), Error<B::BusError>> {
        if state {
            self.set_high()
        } else {
            self.set_low()
        }
    }

    /// Last value written to this pin, read back from the cached output
    /// latch without a bus transaction.
    pub fn is_set_high(&self) -> Result<bool, Error<B::BusError>> {
        Ok(self.driver.lock(|drv| drv.output_latch()) & self.pin_mask != 0)
    }

    pub fn is_set_low(&self) -> Result<bool, Error<B::BusError>> {
        self.is_set_high().map(|v| !v)
    }

    pub fn toggle(&mut self) -> Result<(), Error<B::BusError>> {
        self.driver
            .lock(|drv| drv.toggle_pins(self.pin_mask))
            .map_err(Error::Bus)
    }
}

impl<'a, MODE, B, MUTEX> embedded_hal::digital::ErrorType for Pin<'a, MODE, MUTEX>
where
    B: RegisterTransport,
    B::BusError: core::fmt::Debug,
    MUTEX: BusMutex<Bus = Driver<B>>,
{
    type Error = Error<B::BusError>;
}

impl<'a, MODE: mode::HasInput, B, MUTEX> embedded_hal::digital::InputPin for Pin<'a, MODE, MUTEX>
where
    B: RegisterTransport,
    B::BusError: core::fmt::Debug,
    MUTEX: BusMutex<Bus = Driver<B>>,
{
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Pin::is_high(self)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Pin::is_low(self)
    }
}

impl<'a, MODE: mode::HasOutput, B, MUTEX> embedded_hal::digital::OutputPin for Pin<'a, MODE, MUTEX>
where
    B: RegisterTransport,
    B::BusError: core::fmt::Debug,
    MUTEX: BusMutex<Bus = Driver<B>>,
{
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Pin::set_low(self)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Pin::set_high(self)
    }
}

impl<'a, MODE: mode::HasOutput, B, MUTEX> embedded_hal::digital::StatefulOutputPin
    for Pin<'a, MODE, MUTEX>
where
    B: RegisterTransport,
    B::BusError: core::fmt::Debug,
    MUTEX: BusMutex<Bus = Driver<B>>,
{
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        Pin::is_set_high(self)
    }

    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        Pin::is_set_low(self)
    }

    fn toggle(&mut self) -> Result<(), Self::Error> {
        Pin::toggle(self)
    }
}

#[cfg(test)]
mod tests {
    use crate::IoPiBoard;
    use embedded_hal_mock::eh1::i2c as mock_i2c;

    #[test]
    fn output_handle() {
        let expectations = [
            // digital_output(1, true): latch high, then direction
            mock_i2c::Transaction::write(0x20, vec![0x12, 0x02]),
            mock_i2c::Transaction::write_read(0x20, vec![0x00], vec![0xff]),
            mock_i2c::Transaction::write(0x20, vec![0x00, 0xfd]),
            mock_i2c::Transaction::write(0x20, vec![0x12, 0x00]),
            mock_i2c::Transaction::write(0x20, vec![0x12, 0x02]),
        ];
        let mut bus = mock_i2c::Mock::new(&expectations);

        let board = IoPiBoard::new(bus.clone());
        let mut out = board.digital_output(1, true).unwrap();

        assert!(out.is_set_high().unwrap());
        out.set_low().unwrap();
        assert!(out.is_set_low().unwrap());
        out.toggle().unwrap();
        assert!(out.is_set_high().unwrap());

        bus.done();
    }

    #[test]
    fn input_handle_with_pull_up() {
        let expectations = [
            // digital_input(9, true): IODIRB, then GPPUB
            mock_i2c::Transaction::write_read(0x20, vec![0x01], vec![0xff]),
            mock_i2c::Transaction::write(0x20, vec![0x01, 0xff]),
            mock_i2c::Transaction::write_read(0x20, vec![0x0d], vec![0x00]),
            mock_i2c::Transaction::write(0x20, vec![0x0d, 0x02]),
            // two GPIO reads
            mock_i2c::Transaction::write_read(0x20, vec![0x13], vec![0x02]),
            mock_i2c::Transaction::write_read(0x20, vec![0x13], vec![0x00]),
        ];
        let mut bus = mock_i2c::Mock::new(&expectations);

        let board = IoPiBoard::new(bus.clone());
        let input = board.digital_input(9, true).unwrap();

        assert!(input.is_high().unwrap());
        assert!(input.is_low().unwrap());

        bus.done();
    }

    #[test]
    fn mode_conversion_round_trip() {
        let expectations = [
            // digital_input(0, false)
            mock_i2c::Transaction::write_read(0x20, vec![0x00], vec![0xff]),
            mock_i2c::Transaction::write(0x20, vec![0x00, 0xff]),
            mock_i2c::Transaction::write_read(0x20, vec![0x0c], vec![0x00]),
            mock_i2c::Transaction::write(0x20, vec![0x0c, 0x00]),
            // into_output_with_state(true)
            mock_i2c::Transaction::write(0x20, vec![0x12, 0x01]),
            mock_i2c::Transaction::write_read(0x20, vec![0x00], vec![0xff]),
            mock_i2c::Transaction::write(0x20, vec![0x00, 0xfe]),
            // back to a pulled-up input
            mock_i2c::Transaction::write_read(0x20, vec![0x00], vec![0xfe]),
            mock_i2c::Transaction::write(0x20, vec![0x00, 0xff]),
            mock_i2c::Transaction::write_read(0x20, vec![0x0c], vec![0x00]),
            mock_i2c::Transaction::write(0x20, vec![0x0c, 0x01]),
        ];
        let mut bus = mock_i2c::Mock::new(&expectations);

        let board = IoPiBoard::new(bus.clone());
        let input = board.digital_input(0, false).unwrap();
        let output = input.into_output_with_state(true).unwrap();
        assert!(output.is_set_high().unwrap());
        let _input = output.into_input_pull_up().unwrap();

        bus.done();
    }

    #[test]
    fn hal_trait_object_compatibility() {
        use embedded_hal::digital::{InputPin, StatefulOutputPin};

        let expectations = [
            mock_i2c::Transaction::write(0x20, vec![0x12, 0x00]),
            mock_i2c::Transaction::write_read(0x20, vec![0x00], vec![0xff]),
            mock_i2c::Transaction::write(0x20, vec![0x00, 0xfe]),
            mock_i2c::Transaction::write_read(0x20, vec![0x01], vec![0xff]),
            mock_i2c::Transaction::write(0x20, vec![0x01, 0xff]),
            mock_i2c::Transaction::write_read(0x20, vec![0x0d], vec![0x00]),
            mock_i2c::Transaction::write(0x20, vec![0x0d, 0x00]),
            mock_i2c::Transaction::write(0x20, vec![0x12, 0x01]),
            mock_i2c::Transaction::write_read(0x20, vec![0x13], vec![0x01]),
        ];
        let mut bus = mock_i2c::Mock::new(&expectations);

        let board = IoPiBoard::new(bus.clone());
        let mut out = board.digital_output(0, false).unwrap();
        let mut inp = board.digital_input(8, false).unwrap();

        fn drive(pin: &mut impl StatefulOutputPin) {
            pin.set_high().unwrap();
        }
        fn sense(pin: &mut impl InputPin) -> bool {
            pin.is_high().unwrap()
        }

        drive(&mut out);
        assert!(sense(&mut inp));

        bus.done();
    }
}
