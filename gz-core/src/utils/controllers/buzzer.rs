//! Buzzer module driver.
//!
//! Plays tones and the module's built-in melodies and manages its tempo.
//! Commands arrive as `BuzzerCommand` values (see [`Buzzer::execute`]).

use embassy_time::Timer;
use serde::{Deserialize, Serialize};

use crate::utils::bus::{
    address,
    frames::{self, Melody, Persist, Repeat},
    le_u16, HubError, Transport,
};

/// Chromatic note frequencies (Hz) from C3 to B5.
pub const NOTES: [u16; 36] = [
    131, 139, 147, 156, 165, 175, 185, 196, 208, 220, 233, 247, // C3..B3
    262, 277, 294, 311, 330, 349, 370, 392, 415, 440, 466, 494, // C4..B4
    523, 555, 587, 622, 659, 698, 740, 784, 831, 880, 932, 988, // C5..B5
];

/// Fraction of a whole beat.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BeatFraction {
    #[default]
    Whole,
    Double,
    Quadruple,
    Octuple,
    Half,
    Quarter,
    Eighth,
    Sixteenth,
}

/// Length in milliseconds of `fraction` of a beat at `bpm`, truncated.
///
/// A tempo of 0 yields 0.
pub fn beat_duration(
    bpm: u16,
    fraction: BeatFraction,
) -> u32 {
    if bpm == 0 {
        return 0;
    }
    let (num, den) = match fraction {
        BeatFraction::Whole => (1, 1),
        BeatFraction::Double => (2, 1),
        BeatFraction::Quadruple => (4, 1),
        BeatFraction::Octuple => (8, 1),
        BeatFraction::Half => (1, 2),
        BeatFraction::Quarter => (1, 4),
        BeatFraction::Eighth => (1, 8),
        BeatFraction::Sixteenth => (1, 16),
    };
    60_000 * num / (bpm as u32 * den)
}

/// Buzzer command variants.
///
/// Serialized as JSON with tag `"bc"`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
#[serde(tag = "bc", rename_all = "snake_case")]
pub enum BuzzerCommand {
    /// Play frequency `f` for `ms` milliseconds.
    Tone { f: u16, ms: u16 },
    /// Play frequency `f` until stopped.
    Ring { f: u16 },
    Melody { m: Melody },
    Stop,
    /// Stop and stay silent for `ms` milliseconds.
    Rest { ms: u16 },
    Tempo { bpm: u16 },
    /// Change tempo by `d` beats per minute.
    ChangeTempo { d: i16 },
}

pub struct Buzzer<BUS> {
    bus: BUS,
}

impl<BUS: Transport> Buzzer<BUS> {
    pub fn new(bus: BUS) -> Self {
        Self { bus }
    }

    /// Play a tone and wait for it to finish.
    pub async fn play_tone(
        &mut self,
        frequency: u16,
        ms: u16,
    ) -> Result<(), HubError<BUS::Error>> {
        self.send(&frames::tone(frequency, ms))?;
        Timer::after_millis(ms.max(1) as u64).await;
        Ok(())
    }

    pub fn ring_tone(
        &mut self,
        frequency: u16,
    ) -> Result<(), HubError<BUS::Error>> {
        self.send(&frames::ring_tone(frequency))
    }

    pub fn play_melody(
        &mut self,
        melody: Melody,
    ) -> Result<(), HubError<BUS::Error>> {
        self.send(&frames::melody(melody, Repeat::Once))
    }

    pub fn stop(&mut self) -> Result<(), HubError<BUS::Error>> {
        self.send(&[frames::buzzer::STOP])
    }

    pub async fn rest(
        &mut self,
        ms: u16,
    ) -> Result<(), HubError<BUS::Error>> {
        self.stop()?;
        Timer::after_millis(ms as u64).await;
        Ok(())
    }

    pub fn set_tempo(
        &mut self,
        bpm: u16,
    ) -> Result<(), HubError<BUS::Error>> {
        self.send(&frames::tempo(bpm, Persist::Ram))
    }

    pub fn change_tempo_by(
        &mut self,
        delta: i16,
    ) -> Result<(), HubError<BUS::Error>> {
        self.send(&frames::change_tempo(delta, Persist::Ram))
    }

    /// Current tempo in beats per minute.
    pub fn tempo(&mut self) -> Result<u16, HubError<BUS::Error>> {
        let mut data = [0u8; 2];
        self.bus
            .send_byte(address::BUZZER, frames::buzzer::GET_TEMPO)
            .and_then(|()| self.bus.receive_bytes(address::BUZZER, &mut data))
            .map_err(HubError::Transport)?;
        Ok(le_u16(data))
    }

    /// Duration of `fraction` of a beat at the module's current tempo.
    pub fn beat(
        &mut self,
        fraction: BeatFraction,
    ) -> Result<u32, HubError<BUS::Error>> {
        Ok(beat_duration(self.tempo()?, fraction))
    }

    /// Execute an incoming `BuzzerCommand`.
    pub async fn execute(
        &mut self,
        command: BuzzerCommand,
    ) -> Result<(), HubError<BUS::Error>> {
        tracing::debug!(?command, "buzzer command");
        match command {
            BuzzerCommand::Tone { f, ms } => self.play_tone(f, ms).await,
            BuzzerCommand::Ring { f } => self.ring_tone(f),
            BuzzerCommand::Melody { m } => self.play_melody(m),
            BuzzerCommand::Stop => self.stop(),
            BuzzerCommand::Rest { ms } => self.rest(ms).await,
            BuzzerCommand::Tempo { bpm } => self.set_tempo(bpm),
            BuzzerCommand::ChangeTempo { d } => self.change_tempo_by(d),
        }
    }

    fn send(
        &mut self,
        frame: &[u8],
    ) -> Result<(), HubError<BUS::Error>> {
        self.bus
            .send_bytes(address::BUZZER, frame)
            .map_err(HubError::Transport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_beat_at_120_bpm() {
        assert_eq!(beat_duration(120, BeatFraction::Whole), 500);
        assert_eq!(beat_duration(120, BeatFraction::Half), 250);
        assert_eq!(beat_duration(120, BeatFraction::Sixteenth), 31);
        assert_eq!(beat_duration(120, BeatFraction::Octuple), 4000);
    }

    #[test]
    fn test_beat_truncates_after_scaling() {
        // 60000 / 9 = 6666.67 ms, doubled 13333.3 ms
        assert_eq!(beat_duration(9, BeatFraction::Double), 13_333);
        assert_eq!(beat_duration(9, BeatFraction::Whole), 6_666);
    }

    #[test]
    fn test_beat_zero_tempo() {
        assert_eq!(beat_duration(0, BeatFraction::Quarter), 0);
    }

    #[test]
    fn test_note_table_spans_three_octaves() {
        assert_eq!(NOTES[0], 131);
        assert_eq!(NOTES[21], 440);
        assert_eq!(NOTES[35], 988);
    }
}
