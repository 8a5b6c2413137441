/// Common interface for mutex implementations.
///
/// All expander chips of one board sit behind the same I2C bus, and a
/// register update is a multi-byte transaction.  `iopi` therefore keeps the
/// board driver inside a mutex so that pin and port handles can never
/// interleave their transactions.  Implementations are provided for a few
/// common mutex types:
///
/// | Mutex | Feature Name | Notes |
/// | --- | --- | --- |
/// | [`core::cell::RefCell`] | _always available_ | For sharing within a single execution context. |
/// | [`std::sync::Mutex`][mutex-std] | `std` | For platforms where `std` is available. |
/// | [`critical_section::Mutex`] | `critical-section` | For sharing between interrupt context and main thread. |
///
/// [mutex-std]: https://doc.rust-lang.org/std/sync/struct.Mutex.html
///
/// For other mutex types, a custom implementation is needed.  Due to the
/// orphan rule, it might be necessary to wrap it in a newtype:
///
/// ```
/// struct MyMutex<T>(std::sync::Mutex<T>);
///
/// impl<T> iopi::BusMutex for MyMutex<T> {
///     type Bus = T;
///
///     fn create(v: T) -> Self {
///         Self(std::sync::Mutex::new(v))
///     }
///
///     fn lock<R, F: FnOnce(&mut Self::Bus) -> R>(&self, f: F) -> R {
///         let mut v = self.0.lock().unwrap();
///         f(&mut v)
///     }
/// }
/// ```
pub trait BusMutex {
    /// The board driver that is wrapped inside this mutex.
    type Bus;

    /// Create a new mutex of this type.
    fn create(v: Self::Bus) -> Self;

    /// Lock the mutex and give a closure access to the driver inside.
    fn lock<R, F: FnOnce(&mut Self::Bus) -> R>(&self, f: F) -> R;
}

impl<T> BusMutex for core::cell::RefCell<T> {
    type Bus = T;

    fn create(v: Self::Bus) -> Self {
        core::cell::RefCell::new(v)
    }

    fn lock<R, F: FnOnce(&mut Self::Bus) -> R>(&self, f: F) -> R {
        let mut v = self.borrow_mut();
        f(&mut v)
    }
}

#[cfg(any(test, feature = "std"))]
impl<T> BusMutex for std::sync::Mutex<T> {
    type Bus = T;

    fn create(v: Self::Bus) -> Self {
        std::sync::Mutex::new(v)
    }

    fn lock<R, F: FnOnce(&mut Self::Bus) -> R>(&self, f: F) -> R {
        let mut v = self.lock().unwrap();
        f(&mut v)
    }
}

#[cfg(feature = "critical-section")]
impl<T> BusMutex for critical_section::Mutex<core::cell::RefCell<T>> {
    type Bus = T;

    fn create(v: Self::Bus) -> Self {
        critical_section::Mutex::new(core::cell::RefCell::new(v))
    }

    fn lock<R, F: FnOnce(&mut Self::Bus) -> R>(&self, f: F) -> R {
        critical_section::with(|cs| {
            let mut v = self.borrow_ref_mut(cs);
            f(&mut v)
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::{Direction, IoPiBoard};
    use embedded_hal_mock::eh1::i2c as mock_i2c;

    #[test]
    fn std_mutex_guards_the_driver() {
        let expectations = [
            mock_i2c::Transaction::write(0x20, vec![0x12, 0x00]),
            mock_i2c::Transaction::write_read(0x20, vec![0x00], vec![0xff]),
            mock_i2c::Transaction::write(0x20, vec![0x00, 0xfe]),
            mock_i2c::Transaction::write(0x20, vec![0x12, 0x01]),
        ];
        let mut bus = mock_i2c::Mock::new(&expectations);

        let board =
            IoPiBoard::<std::sync::Mutex<_>>::with_mutex(bus.clone(), 0x20, 0x21);
        board.configure(0, Direction::Output).unwrap();
        board.write(0, true).unwrap();
        assert_eq!(board.read(0).unwrap(), true);

        bus.done();
    }
}
