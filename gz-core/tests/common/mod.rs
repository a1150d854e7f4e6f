#![allow(dead_code)]

use core::cell::RefCell;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embedded_hal_bus::i2c::RefCellDevice;
use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTrans};
use gz_core::utils::{
    events::{EventChannel, EventDispatch, Handler, HandlerTable},
    SensorHub,
};

pub use embedded_hal::i2c::ErrorKind;

pub const SOUND_ADDRESS: u8 = 0x06;
pub const BUZZER_ADDRESS: u8 = 0x08;
pub const GESTURE_ADDRESS: u8 = 0x0C;
pub const ENCODER_ADDRESS: u8 = 0x10;
pub const LINER_ADDRESS: u8 = 0x27;

pub type Bus<'a> = RefCellDevice<'a, I2cMock>;
pub type TestHub<'a> = SensorHub<NoopRawMutex, Bus<'a>, HandlerTable<NoopRawMutex>>;
pub type RecordingHub<'a> = SensorHub<NoopRawMutex, Bus<'a>, RecordingDispatch>;

/// Create a write transaction for the given I2C address and data payload.
pub fn write(
    addr: u8,
    data: Vec<u8>,
) -> I2cTrans {
    I2cTrans::write(addr, data)
}

/// Create a read transaction for the given I2C address and expected data.
pub fn read(
    addr: u8,
    data: Vec<u8>,
) -> I2cTrans {
    I2cTrans::read(addr, data)
}

/// Event-enable write sent once when a notified class is activated.
pub fn activate(addr: u8) -> I2cTrans {
    write(addr, vec![0x01])
}

/// One poll of the line follower returning `status`.
pub fn line_poll(status: u8) -> Vec<I2cTrans> {
    vec![
        write(LINER_ADDRESS, vec![0x02]),
        read(LINER_ADDRESS, vec![status]),
    ]
}

pub fn hub(bus: &RefCell<I2cMock>) -> TestHub<'_> {
    SensorHub::new(RefCellDevice::new(bus), HandlerTable::new(), None)
}

pub fn recording_hub(bus: &RefCell<I2cMock>) -> RecordingHub<'_> {
    SensorHub::new(RefCellDevice::new(bus), RecordingDispatch::default(), None)
}

/// Handler that counts its invocations.
pub fn counter() -> (Arc<AtomicUsize>, impl FnMut() + Send + 'static) {
    let hits = Arc::new(AtomicUsize::new(0));
    let inner = hits.clone();
    (hits, move || {
        inner.fetch_add(1, Ordering::SeqCst);
    })
}

pub fn hits(counter: &Arc<AtomicUsize>) -> usize {
    counter.load(Ordering::SeqCst)
}

/// Dispatch that only records what was subscribed and raised.
#[derive(Default)]
pub struct RecordingDispatch {
    pub subscribed: Mutex<Vec<(EventChannel, u8)>>,
    pub raised: Mutex<Vec<(EventChannel, u8)>>,
}

impl RecordingDispatch {
    pub fn raised_values(&self) -> Vec<u8> {
        self.raised.lock().unwrap().iter().map(|(_, v)| *v).collect()
    }
}

impl EventDispatch for RecordingDispatch {
    fn subscribe(
        &self,
        channel: EventChannel,
        value: u8,
        _handler: Handler,
    ) {
        self.subscribed.lock().unwrap().push((channel, value));
    }

    fn raise(
        &self,
        channel: EventChannel,
        value: u8,
    ) {
        self.raised.lock().unwrap().push((channel, value));
    }
}
