/// Direction of a single IO pin.
///
/// Every pin is either an input or an output; the MCP23017 has no tri-state
/// or high-impedance mode beyond "input".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

/// Errors reported by board, port and pin operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error<E> {
    /// Pin index outside the board's `0..=31` range.
    InvalidPin(u8),
    /// Port index outside the board's `0..=3` range.
    InvalidPort(u8),
    /// Write attempted on the given pin while it is configured as an input.
    Direction(u8),
    /// The underlying bus transaction failed.
    ///
    /// Cached register state is only committed after the corresponding bus
    /// write succeeded, so a `Bus` error never leaves the cache out of sync
    /// with confirmed hardware state.
    Bus(E),
}

impl<E: core::fmt::Debug> embedded_hal::digital::Error for Error<E> {
    fn kind(&self) -> embedded_hal::digital::ErrorKind {
        embedded_hal::digital::ErrorKind::Other
    }
}

/// Pin modes.
pub mod mode {
    /// Trait for pin-modes which can be used to set a logic level.
    pub trait HasOutput {}
    /// Trait for pin-modes which can be used to read a logic level.
    pub trait HasInput {}

    /// Pin configured as an input.
    pub struct Input;
    impl HasInput for Input {}

    /// Pin configured as an output.
    pub struct Output;
    impl HasOutput for Output {}
}
