//! Sensor hub: event source activation, status cache and the public
//! subscribe/query API.
//!
//! One `SensorHub` owns the bus and all per-class state for the process. It
//! is shared by reference between application code and the polling task, so
//! every mutable part sits behind a blocking mutex parameterised by `M`
//! (`NoopRawMutex` on a single executor, `CriticalSectionRawMutex` across
//! interrupt priorities or threads).

use alloc::boxed::Box;
use core::cell::RefCell;

use embassy_sync::{
    blocking_mutex::{raw::RawMutex, Mutex},
    signal::Signal,
};
use embassy_time::Duration;

use super::{
    poller::Poller,
    status::{SourceRegistry, StatusCache},
};
use crate::utils::{
    bus::{HubError, Transport},
    events::{
        ColorEvent, DeviceClass, EncoderEvent, EventChannel, EventDispatch, GestureEvent,
        LineEvent, SensorEvent, SoundEvent, Source,
    },
};

#[derive(Default)]
struct HubState {
    registry: SourceRegistry,
    cache: StatusCache,
}

/// Event subscription and polling core for every sensor module on one bus.
pub struct SensorHub<M: RawMutex, BUS, D> {
    bus: Mutex<M, RefCell<BUS>>,
    state: Mutex<M, RefCell<HubState>>,
    dispatch: D,
    start: [Signal<M, ()>; DeviceClass::COUNT],
    stop: [Signal<M, ()>; DeviceClass::COUNT],
    poll_interval: Option<Duration>,
}

impl<M, BUS, D> SensorHub<M, BUS, D>
where
    M: RawMutex,
    BUS: Transport,
    D: EventDispatch,
{
    /// Create a hub over `bus`, raising events into `dispatch`.
    ///
    /// `poll_interval` overrides the sampling interval of every polled class
    /// (50 ms by default).
    pub fn new(
        bus: BUS,
        dispatch: D,
        poll_interval: Option<Duration>,
    ) -> Self {
        SensorHub {
            bus: Mutex::new(RefCell::new(bus)),
            state: Mutex::new(RefCell::new(HubState::default())),
            dispatch,
            start: [const { Signal::new() }; DeviceClass::COUNT],
            stop: [const { Signal::new() }; DeviceClass::COUNT],
            poll_interval,
        }
    }

    pub fn dispatch(&self) -> &D {
        &self.dispatch
    }

    /// Activate the event source of `class` if that has not happened yet and
    /// return its channel.
    ///
    /// Notified classes get the event-enable command written to them; polled
    /// classes get their polling task released from `Idle`. A failed write
    /// leaves the class inactive so the next call tries again.
    pub fn ensure_subscribed(
        &self,
        class: DeviceClass,
    ) -> Result<EventChannel, HubError<BUS::Error>> {
        let descriptor = class.descriptor();
        self.state.lock(|state| {
            let mut state = state.borrow_mut();
            if state.registry.is_active(class) {
                return Ok(descriptor.channel);
            }

            match descriptor.source {
                Source::Notified { enable, .. } => {
                    self.bus
                        .lock(|bus| bus.borrow_mut().send_byte(descriptor.address, enable))
                        .map_err(HubError::Transport)?;
                }
                Source::Polled { .. } => self.start[class.index()].signal(()),
            }

            state.registry.confirm(class);
            state.cache.mark_subscribed(class);
            tracing::info!(?class, channel = descriptor.channel.0, "event source activated");
            Ok(descriptor.channel)
        })
    }

    pub fn is_subscribed(
        &self,
        class: DeviceClass,
    ) -> bool {
        self.state.lock(|state| state.borrow().registry.is_active(class))
    }

    /// Register `handler` to run whenever `event` is raised.
    pub fn on_event<E: SensorEvent>(
        &self,
        event: E,
        handler: impl FnMut() + Send + 'static,
    ) -> Result<(), HubError<BUS::Error>> {
        let channel = self.ensure_subscribed(E::CLASS)?;
        self.dispatch.subscribe(channel, event.code(), Box::new(handler));
        Ok(())
    }

    /// Whether `event` is the status most recently reported by its class.
    ///
    /// A never-subscribed class is activated first, without registering any
    /// handler, so later reports land in the cache.
    pub fn was_triggered<E: SensorEvent>(
        &self,
        event: E,
    ) -> Result<bool, HubError<BUS::Error>> {
        self.ensure_subscribed(E::CLASS)?;
        Ok(self.last_status(E::CLASS) == Some(event.code()))
    }

    /// Cached status of `class`. Never touches the bus.
    pub fn last_status(
        &self,
        class: DeviceClass,
    ) -> Option<u8> {
        self.state.lock(|state| state.borrow().cache.read(class))
    }

    /// Record a status report for `class` and raise it on the class channel.
    ///
    /// Reports for inactive classes are dropped, as are reports for polled
    /// classes, whose only source is their polling task. Returns whether the
    /// report was accepted.
    pub fn notify(
        &self,
        class: DeviceClass,
        raw: u8,
    ) -> bool {
        if let Source::Polled { .. } = class.descriptor().source {
            tracing::debug!(?class, raw, "status ignored, class is polled");
            return false;
        }
        self.record(class, raw)
    }

    /// Cache `raw` and raise it if `class` is active.
    pub(crate) fn record(
        &self,
        class: DeviceClass,
        raw: u8,
    ) -> bool {
        let channel = self.state.lock(|state| {
            let mut state = state.borrow_mut();
            if !state.cache.is_subscribed(class) {
                return None;
            }
            state.cache.observe(class, raw);
            Some(SourceRegistry::channel(class))
        });

        match channel {
            Some(channel) => {
                tracing::debug!(?class, raw, "raising sensor event");
                self.dispatch.raise(channel, raw);
                true
            }
            None => {
                tracing::debug!(?class, raw, "status ignored, source not active");
                false
            }
        }
    }

    /// Fetch the status byte of a notified class and feed it to
    /// [`notify`](Self::notify). Call this when the module signals.
    ///
    /// Returns `None` without bus traffic for inactive or polled classes.
    pub fn service(
        &self,
        class: DeviceClass,
    ) -> Result<Option<u8>, HubError<BUS::Error>> {
        let descriptor = class.descriptor();
        let Source::Notified { status, .. } = descriptor.source else {
            return Ok(None);
        };
        if !self.is_subscribed(class) {
            return Ok(None);
        }

        let raw = self.read_register(descriptor.address, status)?;
        self.notify(class, raw);
        Ok(Some(raw))
    }

    /// Hand out the polling task of a polled class.
    ///
    /// Only one task per class ever exists: later calls, and calls for
    /// notified classes, return `None`. The task stays idle until the class
    /// is first subscribed.
    pub fn poller(
        &self,
        class: DeviceClass,
    ) -> Option<Poller<'_, M, BUS, D>> {
        let Source::Polled {
            status,
            interval,
            decode,
        } = class.descriptor().source
        else {
            return None;
        };

        let claimed = self
            .state
            .lock(|state| state.borrow_mut().registry.claim_poller(class));
        claimed.then(|| {
            Poller::new(
                self,
                class,
                status,
                self.poll_interval.unwrap_or(interval),
                decode,
            )
        })
    }

    /// Stop every polling task at its next suspension point, idle or running.
    pub fn shutdown(&self) {
        tracing::info!("sensor hub shutdown requested");
        for stop in &self.stop {
            stop.signal(());
        }
    }

    pub(crate) fn start_signal(
        &self,
        class: DeviceClass,
    ) -> &Signal<M, ()> {
        &self.start[class.index()]
    }

    pub(crate) fn stop_signal(
        &self,
        class: DeviceClass,
    ) -> &Signal<M, ()> {
        &self.stop[class.index()]
    }

    /// Write `command` to `address`, then read one byte back.
    pub(crate) fn read_register(
        &self,
        address: u8,
        command: u8,
    ) -> Result<u8, HubError<BUS::Error>> {
        self.bus
            .lock(|bus| {
                let mut bus = bus.borrow_mut();
                bus.send_byte(address, command)?;
                bus.receive_byte(address)
            })
            .map_err(HubError::Transport)
    }

    /// Write `command` to `address`, then fill `buffer` from it.
    pub(crate) fn read_registers(
        &self,
        address: u8,
        command: u8,
        buffer: &mut [u8],
    ) -> Result<(), HubError<BUS::Error>> {
        self.bus
            .lock(|bus| {
                let mut bus = bus.borrow_mut();
                bus.send_byte(address, command)?;
                bus.receive_bytes(address, buffer)
            })
            .map_err(HubError::Transport)
    }

    pub(crate) fn write(
        &self,
        address: u8,
        data: &[u8],
    ) -> Result<(), HubError<BUS::Error>> {
        self.bus
            .lock(|bus| bus.borrow_mut().send_bytes(address, data))
            .map_err(HubError::Transport)
    }

    // Per-sensor shorthands over `on_event` / `was_triggered`.

    pub fn on_loud_sound(
        &self,
        handler: impl FnMut() + Send + 'static,
    ) -> Result<(), HubError<BUS::Error>> {
        self.on_event(SoundEvent::Loud, handler)
    }

    pub fn on_gesture(
        &self,
        event: GestureEvent,
        handler: impl FnMut() + Send + 'static,
    ) -> Result<(), HubError<BUS::Error>> {
        self.on_event(event, handler)
    }

    pub fn on_encoder(
        &self,
        event: EncoderEvent,
        handler: impl FnMut() + Send + 'static,
    ) -> Result<(), HubError<BUS::Error>> {
        self.on_event(event, handler)
    }

    pub fn on_color(
        &self,
        event: ColorEvent,
        handler: impl FnMut() + Send + 'static,
    ) -> Result<(), HubError<BUS::Error>> {
        self.on_event(event, handler)
    }

    pub fn on_line(
        &self,
        event: LineEvent,
        handler: impl FnMut() + Send + 'static,
    ) -> Result<(), HubError<BUS::Error>> {
        self.on_event(event, handler)
    }

    pub fn was_loud_sound_triggered(&self) -> Result<bool, HubError<BUS::Error>> {
        self.was_triggered(SoundEvent::Loud)
    }

    pub fn was_gesture_triggered(
        &self,
        event: GestureEvent,
    ) -> Result<bool, HubError<BUS::Error>> {
        self.was_triggered(event)
    }

    pub fn was_encoder_triggered(
        &self,
        event: EncoderEvent,
    ) -> Result<bool, HubError<BUS::Error>> {
        self.was_triggered(event)
    }

    pub fn was_color_triggered(
        &self,
        event: ColorEvent,
    ) -> Result<bool, HubError<BUS::Error>> {
        self.was_triggered(event)
    }

    pub fn was_line_triggered(
        &self,
        event: LineEvent,
    ) -> Result<bool, HubError<BUS::Error>> {
        self.was_triggered(event)
    }
}
