//! Utility re-exports and helper macros for Grove Zero modules.
//!
//! - `bus`: transport seam over `embedded-hal` I2C, error type and bit-exact
//!   command frames
//! - `events`: device classes, typed event codes and the handler dispatch
//! - `controllers`: the sensor hub, its polling task and the buzzer driver
//!
//! The `mk_static!` macro simplifies static initialization in no-std contexts.

pub mod bus;
pub mod controllers;
pub mod events;

pub use bus::{HubError, Transport};
pub use controllers::{Buzzer, Poller, SensorHub, SystemCommand};
pub use embassy_time::{Duration, Timer};
pub use events::{DeviceClass, EventChannel, EventDispatch, HandlerTable, SensorEvent};

#[doc(hidden)]
pub use static_cell;

#[macro_export]
/// Initialize a no-std static cell and write the given value into it.
///
/// This macro creates a `static_cell::StaticCell` for type `$t` and initializes
/// it with `$val`, returning a mutable reference to the stored value. A hub
/// shared between the polling task and application tasks is usually placed here.
macro_rules! mk_static {
    ($t:ty, $val:expr) => {{
        static STATIC_CELL: $crate::utils::static_cell::StaticCell<$t> =
            $crate::utils::static_cell::StaticCell::new();
        STATIC_CELL.uninit().write($val)
    }};
}
