//! Device classes and the event codes their status bytes carry.
//!
//! Each class is described once by a [`Descriptor`]; the hub drives every
//! class through that table instead of per-sensor code.

use embassy_time::Duration;
use serde::{Deserialize, Serialize};

use super::{EventChannel, SensorEvent};
use crate::utils::bus::{address, frames};

/// Physical sensor category addressed as one logical unit on the bus.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    Sound,
    Gesture,
    Encoder,
    Color,
    Line,
}

impl DeviceClass {
    pub const COUNT: usize = 5;
    pub const ALL: [DeviceClass; Self::COUNT] = [
        DeviceClass::Sound,
        DeviceClass::Gesture,
        DeviceClass::Encoder,
        DeviceClass::Color,
        DeviceClass::Line,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn descriptor(self) -> &'static Descriptor {
        &DESCRIPTORS[self.index()]
    }
}

/// How a device class gets its status to the hub.
#[derive(Debug, Clone, Copy)]
pub enum Source {
    /// The module reports events itself once `enable` has been written to it;
    /// the host reads `status` when the module signals.
    Notified { enable: u8, status: u8 },
    /// The module has no event report; `status` is sampled every `interval`
    /// and `decode` maps the raw byte to an event value (`None` = unusable).
    Polled {
        status: u8,
        interval: Duration,
        decode: fn(u8) -> Option<u8>,
    },
}

/// Static description of one device class.
#[derive(Debug, Clone, Copy)]
pub struct Descriptor {
    pub class: DeviceClass,
    pub address: u8,
    pub channel: EventChannel,
    pub source: Source,
}

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

const fn notified_channel(address: u8) -> EventChannel {
    EventChannel(0x0100 | address as u16)
}

const fn notified(
    class: DeviceClass,
    address: u8,
) -> Descriptor {
    Descriptor {
        class,
        address,
        channel: notified_channel(address),
        source: Source::Notified {
            enable: frames::sensor::EVENT_ENABLE,
            status: frames::sensor::EVENT_STATUS,
        },
    }
}

pub static DESCRIPTORS: [Descriptor; DeviceClass::COUNT] = [
    notified(DeviceClass::Sound, address::SOUND),
    notified(DeviceClass::Gesture, address::GESTURE),
    notified(DeviceClass::Encoder, address::ENCODER),
    notified(DeviceClass::Color, address::LINER),
    Descriptor {
        class: DeviceClass::Line,
        address: address::LINER,
        channel: EventChannel(9000),
        source: Source::Polled {
            status: frames::sensor::LINE_STATUS,
            interval: DEFAULT_POLL_INTERVAL,
            decode: decode_line,
        },
    },
];

/// Line follower status: `0` means no line event, `1..=4` are [`LineEvent`]s.
/// Anything else is bus noise.
fn decode_line(raw: u8) -> Option<u8> {
    (raw <= LineEvent::End as u8).then_some(raw)
}

macro_rules! sensor_event {
    (
        $(#[$meta:meta])*
        $name:ident => $class:ident {
            $($variant:ident = $code:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
        #[serde(rename_all = "snake_case")]
        #[repr(u8)]
        pub enum $name {
            $($variant = $code),+
        }

        impl SensorEvent for $name {
            const CLASS: DeviceClass = DeviceClass::$class;

            fn code(self) -> u8 {
                self as u8
            }

            fn from_code(code: u8) -> Option<Self> {
                match code {
                    $($code => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

sensor_event! {
    /// The sound module only reports one event: level above threshold.
    SoundEvent => Sound { Loud = 3 }
}

sensor_event! {
    GestureEvent => Gesture {
        Right = 1,
        Left = 2,
        Up = 3,
        Down = 4,
        Forward = 5,
        Backward = 6,
        Clockwise = 7,
        Anticlockwise = 8,
        Wave = 9,
    }
}

sensor_event! {
    EncoderEvent => Encoder {
        Increase = 1,
        Decrease = 2,
        Press = 3,
    }
}

sensor_event! {
    ColorEvent => Color {
        Black = 1,
        Red = 2,
        Green = 3,
        Blue = 4,
        Other = 5,
    }
}

sensor_event! {
    LineEvent => Line {
        Left = 1,
        Right = 2,
        Straight = 3,
        End = 4,
    }
}

/// Individual probes of the line follower, as bits of its probe byte.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LineProbe {
    A = 0x10,
    B = 0x08,
    C = 0x04,
    D = 0x02,
    E = 0x01,
}

impl LineProbe {
    pub const fn mask(self) -> u8 {
        self as u8
    }
}
