//! Module Exports
//!
//! This file exports the drivers built on the shared I2C bus.
//!
//! - `hub`: event source activation, status cache and subscribe/query API
//! - `poller`: polling task for modules without an event report
//! - `sensors`: one-shot sensor readings and settings
//! - `buzzer`: tones, melodies and tempo
//! - `status`: per-class bookkeeping used by the hub

pub mod buzzer;
pub mod hub;
pub mod poller;
pub mod sensors;
pub mod status;

use embassy_sync::{blocking_mutex::raw::RawMutex, channel::Receiver};
use serde::{Deserialize, Serialize};

use crate::utils::{
    bus::{HubError, Transport},
    events::EventDispatch,
};

pub use buzzer::{BeatFraction, Buzzer, BuzzerCommand};
pub use hub::SensorHub;
pub use poller::{PolledState, Poller};
pub use sensors::SensorCommand;
pub use status::{SourceRegistry, StatusCache};

#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
#[serde(tag = "ct", rename_all = "snake_case")] // ct = command type
pub enum SystemCommand {
    S(SensorCommand),
    B(BuzzerCommand),
}

/// Routes `SystemCommand`s to the sensor hub and the buzzer.
pub struct SystemController<'h, M: RawMutex, BUS, D, BZ> {
    pub hub: &'h SensorHub<M, BUS, D>,
    pub buzzer: Buzzer<BZ>,
}

impl<'h, M, BUS, D, BZ> SystemController<'h, M, BUS, D, BZ>
where
    M: RawMutex,
    BUS: Transport,
    D: EventDispatch,
    BZ: Transport<Error = BUS::Error>,
{
    pub fn new(
        hub: &'h SensorHub<M, BUS, D>,
        buzzer_bus: BZ,
    ) -> Self {
        SystemController {
            hub,
            buzzer: Buzzer::new(buzzer_bus),
        }
    }

    /// Execute one command, returning the reading of sensor queries.
    pub async fn execute(
        &mut self,
        command: SystemCommand,
    ) -> Result<Option<u32>, HubError<BUS::Error>> {
        match command {
            SystemCommand::S(cmd) => self.hub.execute_command(cmd),
            SystemCommand::B(cmd) => {
                self.buzzer.execute(cmd).await?;
                Ok(None)
            }
        }
    }

    /// Execute commands from `receiver` forever.
    pub async fn command_ch<CM: RawMutex, const N: usize>(
        &mut self,
        receiver: Receiver<'_, CM, SystemCommand, N>,
    ) -> ! {
        loop {
            let command = receiver.receive().await;
            tracing::info!("Received command: {:?}", command);
            match self.execute(command).await {
                Ok(Some(reading)) => tracing::info!(reading, "sensor reading"),
                Ok(None) => tracing::info!("command executed successfully"),
                Err(error) => tracing::error!(?error, "command failed"),
            }
        }
    }
}
