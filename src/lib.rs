//! Driver for the AB Electronics "IO Pi" Raspberry Pi expansion board.
//!
//! The board carries two MCP23017 16-bit I/O expander chips on the I2C bus,
//! giving 32 digital IO pins.  This crate models the board as a flat 0..=31
//! pin address space on top of a layered abstraction:
//!
//! - [`IoPiBoard`] — the application-facing facade, addressing pins by flat
//!   index and ports (8-bit groups) by index 0..=3.
//! - [`Port`] — batch access to 8 pins as a single byte.
//! - [`Pin`] (with the [`DigitalInput`] / [`DigitalOutput`] aliases) —
//!   type-state per-pin handles implementing the `embedded-hal` digital
//!   traits.
//! - [`RegisterTransport`] — raw register reads and writes, implemented for
//!   any [`embedded_hal::i2c::I2c`] bus.
//!
//! All accesses to one board are serialized through a [`BusMutex`]; every
//! read and write is a single blocking bus transaction, with no buffering
//! and no internal retries.  Output pins are read back from a cached copy of
//! the chip's output latch, which is only updated after the hardware
//! confirmed the write.
//!
//! # Example
//! ```no_run
//! # let i2c = embedded_hal_mock::eh1::i2c::Mock::new(&[]);
//! use iopi::{Direction, IoPiBoard};
//!
//! let board = IoPiBoard::new(i2c);
//!
//! let button = board.digital_input(0, true).unwrap();
//! let mut relay = board.digital_output(16, false).unwrap();
//!
//! if button.is_high().unwrap() {
//!     relay.set_high().unwrap();
//! }
//!
//! // flat-index and port-wide access through the board itself
//! board.configure_port(1, Direction::Output).unwrap();
//! board.write_port(1, 0xa5).unwrap();
//! ```
#![cfg_attr(not(test), no_std)]

#[cfg(feature = "std")]
extern crate std;

mod board;
mod bus;
mod common;
mod expander;
mod mutex;
mod pin;
mod port;

pub use board::{
    Driver, IoPiBoard, EXP1_DEFAULT_ADDRESS, EXP2_DEFAULT_ADDRESS, PIN_COUNT, PORT_COUNT,
};
pub use bus::{I2cBus, RegisterTransport};
pub use common::{mode, Direction, Error};
pub use expander::Expander;
pub use mutex::BusMutex;
pub use pin::{DigitalInput, DigitalOutput, Pin};
pub use port::Port;
