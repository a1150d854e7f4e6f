//! Per-class bookkeeping behind the hub: which event sources are active and
//! the last status each one reported.
//!
//! Neither type locks; the hub keeps both inside one blocking mutex so that
//! the activation check and the activation itself happen atomically.

use crate::utils::events::{DeviceClass, EventChannel};

#[derive(Debug, Default, Clone, Copy)]
struct StatusEntry {
    subscribed: bool,
    last: Option<u8>,
}

/// Latest known raw status per device class.
#[derive(Debug, Default)]
pub struct StatusCache {
    entries: [StatusEntry; DeviceClass::COUNT],
}

impl StatusCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_subscribed(
        &mut self,
        class: DeviceClass,
    ) {
        self.entries[class.index()].subscribed = true;
    }

    pub fn is_subscribed(
        &self,
        class: DeviceClass,
    ) -> bool {
        self.entries[class.index()].subscribed
    }

    /// Overwrite the last status of `class`. No history is kept.
    pub fn observe(
        &mut self,
        class: DeviceClass,
        raw: u8,
    ) {
        self.entries[class.index()].last = Some(raw);
    }

    /// Last status of `class`, or `None` if it was never subscribed or has not
    /// reported yet.
    pub fn read(
        &self,
        class: DeviceClass,
    ) -> Option<u8> {
        let entry = &self.entries[class.index()];
        if entry.subscribed {
            entry.last
        } else {
            None
        }
    }
}

/// Tracks which device classes have been activated and which polling tasks
/// have been handed out.
#[derive(Debug, Default)]
pub struct SourceRegistry {
    active: [bool; DeviceClass::COUNT],
    pollers: [bool; DeviceClass::COUNT],
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn channel(class: DeviceClass) -> EventChannel {
        class.descriptor().channel
    }

    pub fn is_active(
        &self,
        class: DeviceClass,
    ) -> bool {
        self.active[class.index()]
    }

    /// Record a successful activation.
    pub fn confirm(
        &mut self,
        class: DeviceClass,
    ) {
        self.active[class.index()] = true;
    }

    /// Returns `true` exactly once per class.
    pub fn claim_poller(
        &mut self,
        class: DeviceClass,
    ) -> bool {
        let taken = core::mem::replace(&mut self.pollers[class.index()], true);
        !taken
    }
}
