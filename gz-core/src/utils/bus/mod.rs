//! Bus seam for Grove Zero modules.
//!
//! - `transport`: the byte-level send/receive contract, implemented for every
//!   `embedded_hal::i2c::I2c` bus
//! - `frames`: bit-exact command buffers understood by the module firmware

pub mod frames;
pub mod transport;

pub use transport::{le_u16, le_u24, Transport};

/// 7-bit bus addresses of the kit modules.
pub mod address {
    pub const SOUND: u8 = 0x06;
    pub const BUZZER: u8 = 0x08;
    pub const GESTURE: u8 = 0x0C;
    pub const ENCODER: u8 = 0x10;
    /// Shared by the color stream and the line follower.
    pub const LINER: u8 = 0x27;
}

/// Errors that can occur when talking to Grove Zero modules.
///
/// `E` is the error type of the underlying transport (NACK, timeout, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HubError<E: core::fmt::Debug> {
    Transport(E),
}
