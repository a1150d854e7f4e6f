//! Byte-level transport used by every driver in this crate.
//!
//! The module firmware speaks a "write a command, then read the answer"
//! protocol rather than register-addressed `write_read`, so the contract is
//! expressed as four plain operations.

use embedded_hal::i2c::I2c;

/// Blocking send/receive of bytes to a 7-bit device address.
pub trait Transport {
    type Error: core::fmt::Debug;

    fn send_bytes(
        &mut self,
        address: u8,
        data: &[u8],
    ) -> Result<(), Self::Error>;

    fn receive_bytes(
        &mut self,
        address: u8,
        buffer: &mut [u8],
    ) -> Result<(), Self::Error>;

    fn send_byte(
        &mut self,
        address: u8,
        value: u8,
    ) -> Result<(), Self::Error> {
        self.send_bytes(address, &[value])
    }

    fn receive_byte(
        &mut self,
        address: u8,
    ) -> Result<u8, Self::Error> {
        let mut byte = [0u8; 1];
        self.receive_bytes(address, &mut byte)?;
        Ok(byte[0])
    }
}

impl<I: I2c> Transport for I {
    type Error = I::Error;

    fn send_bytes(
        &mut self,
        address: u8,
        data: &[u8],
    ) -> Result<(), Self::Error> {
        self.write(address, data)
    }

    fn receive_bytes(
        &mut self,
        address: u8,
        buffer: &mut [u8],
    ) -> Result<(), Self::Error> {
        self.read(address, buffer)
    }
}

/// Little-endian 16-bit quantity (`low + high * 256`).
pub fn le_u16(bytes: [u8; 2]) -> u16 {
    u16::from_le_bytes(bytes)
}

/// Little-endian 24-bit quantity (`b0 + b1 * 256 + b2 * 65536`).
///
/// Bytes past the third are ignored.
pub fn le_u24(bytes: [u8; 4]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], 0])
}
