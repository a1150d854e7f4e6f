//! Publish/subscribe dispatch keyed by `(channel, event value)`.
//!
//! The hub only produces events into an [`EventDispatch`]; how handlers get
//! stored and invoked is up to the implementation. [`HandlerTable`] is the
//! in-process one used by the host and the tests.

use alloc::{boxed::Box, vec::Vec};
use core::cell::RefCell;

use embassy_sync::blocking_mutex::{raw::RawMutex, Mutex};
use hashbrown::HashMap;

use super::EventChannel;

/// Zero-argument callback run when a matching event is raised.
pub type Handler = Box<dyn FnMut() + Send>;

/// Capability the sensor hub raises events into.
pub trait EventDispatch {
    /// Register `handler` for `(channel, value)`. Handlers accumulate.
    fn subscribe(
        &self,
        channel: EventChannel,
        value: u8,
        handler: Handler,
    );

    /// Invoke every handler registered for `(channel, value)`.
    fn raise(
        &self,
        channel: EventChannel,
        value: u8,
    );
}

#[derive(Default)]
struct Slot {
    /// `None` while a raiser is running the handlers.
    handlers: Option<Vec<Handler>>,
    /// Handlers subscribed while the list was out.
    added: Vec<Handler>,
    /// Raises that arrived while the list was out.
    pending: usize,
}

/// Handler table guarded by a blocking mutex.
///
/// Handlers run outside the lock, so a handler may subscribe new handlers or
/// query the hub. A raise that arrives while the handlers of its
/// `(channel, value)` are already running, nested from a handler or from
/// another context, is queued: the running raiser invokes every handler
/// once more for each queued raise before putting the list back.
pub struct HandlerTable<M: RawMutex> {
    slots: Mutex<M, RefCell<HashMap<(EventChannel, u8), Slot>>>,
}

impl<M: RawMutex> HandlerTable<M> {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(RefCell::new(HashMap::new())),
        }
    }

    /// Number of handlers registered for `(channel, value)`.
    pub fn handler_count(
        &self,
        channel: EventChannel,
        value: u8,
    ) -> usize {
        self.slots.lock(|slots| {
            slots.borrow().get(&(channel, value)).map_or(0, |slot| {
                slot.handlers.as_ref().map_or(0, Vec::len) + slot.added.len()
            })
        })
    }
}

impl<M: RawMutex> Default for HandlerTable<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMutex> EventDispatch for HandlerTable<M> {
    fn subscribe(
        &self,
        channel: EventChannel,
        value: u8,
        handler: Handler,
    ) {
        self.slots.lock(|slots| {
            let mut slots = slots.borrow_mut();
            let slot = slots.entry((channel, value)).or_insert_with(|| Slot {
                handlers: Some(Vec::new()),
                ..Slot::default()
            });
            match slot.handlers.as_mut() {
                Some(handlers) => handlers.push(handler),
                None => slot.added.push(handler),
            }
        });
    }

    fn raise(
        &self,
        channel: EventChannel,
        value: u8,
    ) {
        let key = (channel, value);
        let taken = self.slots.lock(|slots| {
            let mut slots = slots.borrow_mut();
            let slot = slots.get_mut(&key)?;
            if slot.handlers.is_none() {
                slot.pending += 1;
            }
            slot.handlers.take()
        });
        let Some(mut running) = taken else {
            tracing::trace!(channel = channel.0, value, "no idle handlers, raise queued or dropped");
            return;
        };

        loop {
            for handler in running.iter_mut() {
                handler();
            }

            // keep registration order: handlers added while running go last
            let again = self.slots.lock(|slots| {
                let mut slots = slots.borrow_mut();
                let slot = slots.entry(key).or_default();
                running.append(&mut slot.added);
                if slot.pending > 0 {
                    slot.pending -= 1;
                    true
                } else {
                    slot.handlers = Some(core::mem::take(&mut running));
                    false
                }
            });
            if !again {
                break;
            }
        }
    }
}
