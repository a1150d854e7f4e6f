//! Command bytes and fixed-size command buffers for Grove Zero modules.
//!
//! Every multi-byte quantity goes out little-endian. The layouts here are
//! what the module firmware expects on the wire and must not change.

use serde::{Deserialize, Serialize};

/// Command bytes for the event-reporting sensor modules.
pub mod sensor {
    /// Starts the module's event report stream.
    pub const EVENT_ENABLE: u8 = 0x01;
    /// Requests the latest event status byte.
    pub const EVENT_STATUS: u8 = 0x00;
    pub const SOUND_LEVEL: u8 = 0x02;
    pub const SET_SOUND_THRESHOLD: u8 = 0x03;
    pub const LINE_STATUS: u8 = 0x02;
    pub const LINE_PROBES: u8 = 0x03;
    pub const COLOR_RGB: u8 = 0x04;
}

/// Command bytes for the buzzer module.
pub mod buzzer {
    pub const MELODY: u8 = 0x03;
    pub const STOP: u8 = 0x04;
    pub const SET_TEMPO: u8 = 0x05;
    pub const CHANGE_TEMPO: u8 = 0x06;
    pub const GET_TEMPO: u8 = 0x07;
    pub const TONE: u8 = 0x12;
}

/// Where a module stores a changed setting.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Persist {
    #[default]
    Ram = 0,
    Flash = 1,
}

/// Which of the sound module's two thresholds to set.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdLevel {
    Low = 0,
    #[default]
    High = 1,
}

/// Built-in melodies of the buzzer module.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Melody {
    BaDing = 0,
    Wawawawaa = 1,
    JumpUp = 2,
    JumpDown = 3,
    PowerUp = 4,
    PowerDown = 5,
    MagicWand = 6,
    Siren = 7,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Repeat {
    #[default]
    Once = 0,
    Forever = 1,
}

/// `[0x03, level, value_lo, value_hi, persist]`
pub const fn sound_threshold(
    level: ThresholdLevel,
    value: u16,
    persist: Persist,
) -> [u8; 5] {
    let [lo, hi] = value.to_le_bytes();
    [sensor::SET_SOUND_THRESHOLD, level as u8, lo, hi, persist as u8]
}

/// `[0x12, freq_lo, freq_hi, ms_lo, ms_hi]`
///
/// A duration of 0 means "play until stopped" to the firmware, so a timed
/// tone of 0 ms is sent as 1 ms.
pub const fn tone(
    frequency: u16,
    ms: u16,
) -> [u8; 5] {
    let ms = if ms == 0 { 1 } else { ms };
    let [f_lo, f_hi] = frequency.to_le_bytes();
    let [ms_lo, ms_hi] = ms.to_le_bytes();
    [buzzer::TONE, f_lo, f_hi, ms_lo, ms_hi]
}

/// Tone that plays until the next stop command.
pub const fn ring_tone(frequency: u16) -> [u8; 5] {
    let [f_lo, f_hi] = frequency.to_le_bytes();
    [buzzer::TONE, f_lo, f_hi, 0, 0]
}

/// `[0x03, melody, repeat]`
pub const fn melody(
    melody: Melody,
    repeat: Repeat,
) -> [u8; 3] {
    [buzzer::MELODY, melody as u8, repeat as u8]
}

/// `[0x05, bpm_lo, bpm_hi, persist]`
pub const fn tempo(
    bpm: u16,
    persist: Persist,
) -> [u8; 4] {
    let [lo, hi] = bpm.to_le_bytes();
    [buzzer::SET_TEMPO, lo, hi, persist as u8]
}

/// `[0x06, sign, |delta|_lo, |delta|_hi, persist]`, sign is 1 when `delta >= 0`.
pub const fn change_tempo(
    delta: i16,
    persist: Persist,
) -> [u8; 5] {
    let sign = if delta >= 0 { 1 } else { 0 };
    let [lo, hi] = delta.unsigned_abs().to_le_bytes();
    [buzzer::CHANGE_TEMPO, sign, lo, hi, persist as u8]
}
