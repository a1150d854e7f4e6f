//! Polling task for modules without an event report (the line follower).
//!
//! The task samples the module's status every interval and raises an event
//! only when the decoded value changes. It starts in `Idle` and moves to
//! `Running` when its class is first subscribed; [`SensorHub::shutdown`] ends
//! it in either state.

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::{Duration, Timer};

use super::hub::SensorHub;
use crate::utils::{
    bus::Transport,
    events::{DeviceClass, EventDispatch},
};

/// Last decoded value, used only for change detection.
///
/// Starts at 0 ("no event"), so a module that never sees a line raises
/// nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct PolledState {
    last: u8,
}

/// The single polling task of one polled device class.
///
/// Obtained from [`SensorHub::poller`]; spawn [`Poller::run`] on the
/// executor that owns the hub.
pub struct Poller<'h, M: RawMutex, BUS, D> {
    hub: &'h SensorHub<M, BUS, D>,
    class: DeviceClass,
    command: u8,
    interval: Duration,
    decode: fn(u8) -> Option<u8>,
    state: PolledState,
}

impl<'h, M, BUS, D> Poller<'h, M, BUS, D>
where
    M: RawMutex,
    BUS: Transport,
    D: EventDispatch,
{
    pub(crate) fn new(
        hub: &'h SensorHub<M, BUS, D>,
        class: DeviceClass,
        command: u8,
        interval: Duration,
        decode: fn(u8) -> Option<u8>,
    ) -> Self {
        Poller {
            hub,
            class,
            command,
            interval,
            decode,
            state: PolledState::default(),
        }
    }

    pub fn class(&self) -> DeviceClass {
        self.class
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Sample the module once.
    ///
    /// Returns the value raised, or `None` when the reading was unchanged,
    /// undecodable, not accepted because the class is inactive, or the bus
    /// failed. Bus failures are logged and retried on the next tick.
    pub fn tick(&mut self) -> Option<u8> {
        let address = self.class.descriptor().address;
        let raw = match self.hub.read_register(address, self.command) {
            Ok(raw) => raw,
            Err(error) => {
                tracing::warn!(class = ?self.class, ?error, "poll read failed, retrying next tick");
                return None;
            }
        };

        let Some(value) = (self.decode)(raw) else {
            tracing::warn!(class = ?self.class, raw, "undecodable status, ignored");
            return None;
        };
        if value == self.state.last {
            return None;
        }

        // an inactive class keeps its old value so the reading is raised
        // once the class is subscribed
        if !self.hub.record(self.class, value) {
            return None;
        }
        self.state.last = value;
        Some(value)
    }

    /// Run until the hub shuts down.
    pub async fn run(mut self) {
        let hub = self.hub;
        let stop = hub.stop_signal(self.class);

        if let Either::Second(()) = select(hub.start_signal(self.class).wait(), stop.wait()).await {
            tracing::info!(class = ?self.class, "poller stopped before first subscription");
            return;
        }

        tracing::info!(class = ?self.class, interval_ms = self.interval.as_millis(), "poller running");
        loop {
            self.tick();
            if let Either::Second(()) = select(Timer::after(self.interval), stop.wait()).await {
                break;
            }
        }
        tracing::info!(class = ?self.class, "poller stopped");
    }
}
