/// Blanket trait for I2C buses which can carry register transactions for the
/// expander chips.
///
/// This is implemented for any type implementing [`embedded_hal::i2c::I2c`];
/// it only exists to give the bus error type a single name.
pub trait I2cBus: embedded_hal::i2c::I2c {
    type BusError: From<<Self as embedded_hal::i2c::ErrorType>::Error>;
}

impl<T, E> I2cBus for T
where
    T: embedded_hal::i2c::I2c<Error = E>,
{
    type BusError = E;
}

/// Byte-level access to the registers of one expander chip.
///
/// This is the lowest layer of the driver: a single register read or write as
/// one bus transaction.  A failed transaction (NACK, device absent) surfaces
/// as `BusError` to the caller; no transaction is ever retried internally,
/// since a repeated write can re-actuate outputs.
pub trait RegisterTransport {
    type BusError;

    /// Write `value` into register `reg` of the chip at `addr`.
    fn write_register<R: Into<u8>>(
        &mut self,
        addr: u8,
        reg: R,
        value: u8,
    ) -> Result<(), Self::BusError>;

    /// Read back register `reg` of the chip at `addr`.
    fn read_register<R: Into<u8>>(&mut self, addr: u8, reg: R) -> Result<u8, Self::BusError>;

    /// Read-modify-write: set all bits of `mask_set` and clear all bits of
    /// `mask_clear` in register `reg`.
    fn update_register<R: Into<u8>>(
        &mut self,
        addr: u8,
        reg: R,
        mask_set: u8,
        mask_clear: u8,
    ) -> Result<(), Self::BusError> {
        let reg = reg.into();
        let mut value = self.read_register(addr, reg)?;
        value |= mask_set;
        value &= !mask_clear;
        self.write_register(addr, reg, value)?;
        Ok(())
    }
}

impl<I2C: I2cBus> RegisterTransport for I2C {
    type BusError = I2C::BusError;

    fn write_register<R: Into<u8>>(
        &mut self,
        addr: u8,
        reg: R,
        value: u8,
    ) -> Result<(), Self::BusError> {
        self.write(addr, &[reg.into(), value])?;
        Ok(())
    }

    fn read_register<R: Into<u8>>(&mut self, addr: u8, reg: R) -> Result<u8, Self::BusError> {
        let mut buf = [0x00];
        self.write_read(addr, &[reg.into()], &mut buf)?;
        Ok(buf[0])
    }
}
