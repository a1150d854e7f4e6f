//! Event model shared by every sensor module.
//!
//! - `codes`: device classes, their descriptors and typed event codes
//! - `dispatch`: the publish/subscribe capability events are raised into

pub mod codes;
pub mod dispatch;

use serde::{Deserialize, Serialize};

pub use codes::{
    ColorEvent, DeviceClass, Descriptor, EncoderEvent, GestureEvent, LineEvent, LineProbe,
    SoundEvent, Source,
};
pub use dispatch::{EventDispatch, Handler, HandlerTable};

/// Logical id grouping all events raised for one device class.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventChannel(pub u16);

/// A typed event a device class can raise.
///
/// `code` is the discriminant the module reports in its status byte and the
/// value events are raised with on the class's channel.
pub trait SensorEvent: Copy + core::fmt::Debug {
    const CLASS: DeviceClass;

    fn code(self) -> u8;

    fn from_code(code: u8) -> Option<Self>;
}
