//! Direct sensor readings and settings.
//!
//! These are one-shot bus transactions on the hub's bus; they do not touch
//! the event sources or the status cache.

use embassy_sync::blocking_mutex::raw::RawMutex;
use serde::{Deserialize, Serialize};

use super::hub::SensorHub;
use crate::utils::{
    bus::{
        address,
        frames::{self, Persist, ThresholdLevel},
        le_u16, le_u24, HubError, Transport,
    },
    events::{EventDispatch, LineProbe},
};

/// Sensor command variants.
///
/// Serialized as JSON with tag `"sc"`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
#[serde(tag = "sc", rename_all = "snake_case")]
pub enum SensorCommand {
    /// Set the loud-sound (high) threshold, 0..=1023.
    SetThreshold { v: u16 },
    /// Read the current noise level.
    SoundLevel,
    /// Read the color module as `0xBBGGRR`.
    Color,
    /// Read one line follower probe (1 = line under it).
    Probe { p: LineProbe },
}

impl<M, BUS, D> SensorHub<M, BUS, D>
where
    M: RawMutex,
    BUS: Transport,
    D: EventDispatch,
{
    /// Noise level reported by the sound module.
    pub fn sound_level(&self) -> Result<u16, HubError<BUS::Error>> {
        let mut data = [0u8; 2];
        self.read_registers(address::SOUND, frames::sensor::SOUND_LEVEL, &mut data)?;
        Ok(le_u16(data))
    }

    /// Set the level above which the sound module reports a loud sound.
    pub fn set_sound_threshold(
        &self,
        value: u16,
    ) -> Result<(), HubError<BUS::Error>> {
        self.configure_sound_threshold(ThresholdLevel::High, value, Persist::Ram)
    }

    pub fn configure_sound_threshold(
        &self,
        level: ThresholdLevel,
        value: u16,
        persist: Persist,
    ) -> Result<(), HubError<BUS::Error>> {
        tracing::info!(?level, value, ?persist, "setting sound threshold");
        self.write(
            address::SOUND,
            &frames::sound_threshold(level, value, persist),
        )
    }

    /// Color module reading in R:G:B, as `r + g * 256 + b * 65536`.
    pub fn color(&self) -> Result<u32, HubError<BUS::Error>> {
        let mut data = [0u8; 4];
        self.read_registers(address::LINER, frames::sensor::COLOR_RGB, &mut data)?;
        Ok(le_u24(data))
    }

    /// Whether `probe` of the line follower currently sees a line.
    pub fn was_line_probe_triggered(
        &self,
        probe: LineProbe,
    ) -> Result<bool, HubError<BUS::Error>> {
        let probes = self.read_register(address::LINER, frames::sensor::LINE_PROBES)?;
        Ok(probes & probe.mask() != 0)
    }

    /// Execute a `SensorCommand`.
    ///
    /// Returns the reading for query commands or `None` for settings.
    pub fn execute_command(
        &self,
        command: SensorCommand,
    ) -> Result<Option<u32>, HubError<BUS::Error>> {
        match command {
            SensorCommand::SetThreshold { v } => {
                self.set_sound_threshold(v)?;
                Ok(None)
            }
            SensorCommand::SoundLevel => Ok(Some(self.sound_level()? as u32)),
            SensorCommand::Color => Ok(Some(self.color()?)),
            SensorCommand::Probe { p } => Ok(Some(self.was_line_probe_triggered(p)? as u32)),
        }
    }
}
