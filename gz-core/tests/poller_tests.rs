use core::cell::RefCell;

use embassy_futures::block_on;
use embedded_hal_bus::i2c::RefCellDevice;
use embedded_hal_mock::eh1::i2c::Mock as I2cMock;
use gz_core::utils::{
    events::{DeviceClass, EventChannel, LineEvent},
    Duration, HandlerTable, SensorHub,
};

mod common;
use common::*;

#[test]
fn test_repeated_readings_raise_once() {
    let expectations: Vec<_> = [1, 1, 2, 2, 2, 3]
        .into_iter()
        .flat_map(line_poll)
        .collect();

    let i2c_bus = RefCell::new(I2cMock::new(&expectations));
    let hub = recording_hub(&i2c_bus);
    hub.on_line(LineEvent::Left, || {}).unwrap();

    let mut poller = hub.poller(DeviceClass::Line).unwrap();
    let ticks: Vec<_> = (0..6).map(|_| poller.tick()).collect();

    assert_eq!(ticks, [Some(1), None, Some(2), None, None, Some(3)]);
    assert_eq!(hub.dispatch().raised_values(), [1, 2, 3]);
    assert!(hub
        .dispatch()
        .raised
        .lock()
        .unwrap()
        .iter()
        .all(|(channel, _)| *channel == EventChannel(9000)));
    i2c_bus.borrow_mut().done();
}

#[test]
fn test_initial_no_event_reading_is_silent() {
    let expectations: Vec<_> = [0, 0, 4, 0].into_iter().flat_map(line_poll).collect();

    let i2c_bus = RefCell::new(I2cMock::new(&expectations));
    let hub = recording_hub(&i2c_bus);
    hub.ensure_subscribed(DeviceClass::Line).unwrap();

    let mut poller = hub.poller(DeviceClass::Line).unwrap();
    for _ in 0..4 {
        poller.tick();
    }

    assert_eq!(hub.dispatch().raised_values(), [4, 0]);
    assert_eq!(hub.last_status(DeviceClass::Line), Some(0));
    i2c_bus.borrow_mut().done();
}

#[test]
fn test_bus_failure_skips_tick() {
    let mut expectations = line_poll(2);
    expectations.push(write(LINER_ADDRESS, vec![0x02]).with_error(ErrorKind::Other));
    expectations.extend(line_poll(2));
    expectations.extend(line_poll(3));

    let i2c_bus = RefCell::new(I2cMock::new(&expectations));
    let hub = recording_hub(&i2c_bus);
    hub.ensure_subscribed(DeviceClass::Line).unwrap();

    let mut poller = hub.poller(DeviceClass::Line).unwrap();
    assert_eq!(poller.tick(), Some(2));
    assert_eq!(poller.tick(), None);
    assert_eq!(poller.tick(), None);
    assert_eq!(poller.tick(), Some(3));

    assert_eq!(hub.dispatch().raised_values(), [2, 3]);
    i2c_bus.borrow_mut().done();
}

#[test]
fn test_undecodable_reading_is_ignored() {
    let expectations: Vec<_> = [1, 0xFF, 1].into_iter().flat_map(line_poll).collect();

    let i2c_bus = RefCell::new(I2cMock::new(&expectations));
    let hub = recording_hub(&i2c_bus);
    hub.ensure_subscribed(DeviceClass::Line).unwrap();

    let mut poller = hub.poller(DeviceClass::Line).unwrap();
    assert_eq!(poller.tick(), Some(1));
    assert_eq!(poller.tick(), None);
    assert_eq!(poller.tick(), None);
    assert_eq!(hub.dispatch().raised_values(), [1]);
    i2c_bus.borrow_mut().done();
}

#[test]
fn test_line_pull_matches_handlers() {
    let expectations: Vec<_> = [3, 2].into_iter().flat_map(line_poll).collect();

    let i2c_bus = RefCell::new(I2cMock::new(&expectations));
    let hub = hub(&i2c_bus);
    let (straight, handler) = counter();
    hub.on_line(LineEvent::Straight, handler).unwrap();

    let mut poller = hub.poller(DeviceClass::Line).unwrap();
    poller.tick();
    assert_eq!(hits(&straight), 1);
    assert!(hub.was_line_triggered(LineEvent::Straight).unwrap());
    assert!(!hub.was_line_triggered(LineEvent::Right).unwrap());

    poller.tick();
    assert_eq!(hits(&straight), 1);
    assert!(hub.was_line_triggered(LineEvent::Right).unwrap());
    i2c_bus.borrow_mut().done();
}

#[test]
fn test_only_one_poller_per_class() {
    let i2c_bus = RefCell::new(I2cMock::new(&[]));
    let hub = hub(&i2c_bus);

    assert!(hub.poller(DeviceClass::Gesture).is_none());
    assert!(hub.poller(DeviceClass::Line).is_some());
    assert!(hub.poller(DeviceClass::Line).is_none());
    i2c_bus.borrow_mut().done();
}

#[test]
fn test_poll_interval_override() {
    let i2c_bus = RefCell::new(I2cMock::new(&[]));
    let hub: TestHub<'_> = SensorHub::new(
        RefCellDevice::new(&i2c_bus),
        HandlerTable::new(),
        Some(Duration::from_millis(10)),
    );

    let poller = hub.poller(DeviceClass::Line).unwrap();
    assert_eq!(poller.interval(), Duration::from_millis(10));
    assert_eq!(poller.class(), DeviceClass::Line);
    i2c_bus.borrow_mut().done();
}

#[test]
fn test_default_poll_interval() {
    let i2c_bus = RefCell::new(I2cMock::new(&[]));
    let hub = hub(&i2c_bus);
    assert_eq!(
        hub.poller(DeviceClass::Line).unwrap().interval(),
        Duration::from_millis(50)
    );
    i2c_bus.borrow_mut().done();
}

#[test]
fn test_shutdown_before_subscription_stops_idle_poller() {
    let i2c_bus = RefCell::new(I2cMock::new(&[]));
    let hub = hub(&i2c_bus);
    let poller = hub.poller(DeviceClass::Line).unwrap();

    hub.shutdown();
    block_on(poller.run());

    assert!(!hub.is_subscribed(DeviceClass::Line));
    i2c_bus.borrow_mut().done();
}

#[test]
fn test_running_poller_stops_on_shutdown() {
    let expectations = line_poll(LineEvent::End as u8);

    let i2c_bus = RefCell::new(I2cMock::new(&expectations));
    let hub = recording_hub(&i2c_bus);
    let poller = hub.poller(DeviceClass::Line).unwrap();

    hub.on_line(LineEvent::End, || {}).unwrap();
    hub.shutdown();
    // released from Idle, samples once, then sees the stop request
    block_on(poller.run());

    assert_eq!(hub.dispatch().raised_values(), [4]);
    assert!(hub.was_line_triggered(LineEvent::End).unwrap());
    i2c_bus.borrow_mut().done();
}

#[test]
fn test_tick_before_subscription_keeps_reading() {
    let expectations: Vec<_> = [2, 2].into_iter().flat_map(line_poll).collect();

    let i2c_bus = RefCell::new(I2cMock::new(&expectations));
    let hub = recording_hub(&i2c_bus);
    let mut poller = hub.poller(DeviceClass::Line).unwrap();

    assert_eq!(poller.tick(), None);
    assert!(hub.dispatch().raised_values().is_empty());

    hub.ensure_subscribed(DeviceClass::Line).unwrap();
    assert_eq!(poller.tick(), Some(2));
    assert_eq!(hub.dispatch().raised_values(), [2]);
    assert_eq!(hub.last_status(DeviceClass::Line), Some(2));
    i2c_bus.borrow_mut().done();
}

#[test]
fn test_notify_rejects_polled_class() {
    let i2c_bus = RefCell::new(I2cMock::new(&[]));
    let hub = recording_hub(&i2c_bus);
    hub.ensure_subscribed(DeviceClass::Line).unwrap();

    assert!(!hub.notify(DeviceClass::Line, LineEvent::Straight as u8));
    assert!(!hub.notify(DeviceClass::Line, LineEvent::Straight as u8));

    assert!(hub.dispatch().raised_values().is_empty());
    assert_eq!(hub.last_status(DeviceClass::Line), None);
    i2c_bus.borrow_mut().done();
}

#[test]
fn test_line_query_releases_idle_poller() {
    let expectations = line_poll(LineEvent::Right as u8);

    let i2c_bus = RefCell::new(I2cMock::new(&expectations));
    let hub = hub(&i2c_bus);
    let poller = hub.poller(DeviceClass::Line).unwrap();

    // priming the class is the only start request the poller gets
    assert!(!hub.was_line_triggered(LineEvent::Right).unwrap());
    assert!(hub.is_subscribed(DeviceClass::Line));
    assert_eq!(hub.dispatch().handler_count(EventChannel(9000), 2), 0);

    hub.shutdown();
    block_on(poller.run());

    assert_eq!(hub.last_status(DeviceClass::Line), Some(2));
    assert!(hub.was_line_triggered(LineEvent::Right).unwrap());
    i2c_bus.borrow_mut().done();
}
