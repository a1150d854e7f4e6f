//! Sensor event subscription, polling and buzzer drivers for Grove Zero modules
//! on no-std embedded platforms.
//!
//! For a runnable host, see the `gz-app/mock-hub` binary.
#![no_std]

extern crate alloc;

pub mod utils;
